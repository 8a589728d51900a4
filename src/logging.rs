use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global `tracing` subscriber, writing to stderr.
///
/// RUST_LOG wins over `default_filter`; `verbose` raises the crate to debug.
pub fn init(default_filter: &str, verbose: bool) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if verbose {
            "mentor_ledger=debug".to_string()
        } else {
            default_filter.to_string()
        }
    });

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
