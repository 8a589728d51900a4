mod cli;

use anyhow::Result;
use clap::Parser;
use mentor_ledger::config::{self, StorageBackend};
use mentor_ledger::journal::Journal;
use mentor_ledger::{logging, LikeLedger, MentorProfileStore, PersistenceStore, ReactionLedger};
use std::cell::RefCell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mentor-ledger",
    about = "Inspect and maintain the mentoring platform's like, reaction and mentor ledgers"
)]
pub struct Args {
    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "MENTOR_LEDGER_DATA_DIR",
        help = "Directory holding persisted ledgers (implies the file backend)"
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "Keep every ledger in memory; nothing is persisted")]
    pub memory: bool,

    #[arg(long, help = "Append every mutation to this JSONL journal")]
    pub journal: Option<PathBuf>,

    #[arg(long, help = "Verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<cli::Command>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: failed to load config, using defaults: {}", e);
            config::Config::default()
        })
    };

    // CLI flags override config files
    if let Some(dir) = &args.data_dir {
        cfg.storage.backend = StorageBackend::File;
        cfg.storage.dir = Some(dir.clone());
    }
    if args.memory {
        cfg.storage.backend = StorageBackend::Memory;
        cfg.storage.dir = None;
    }

    if let Err(errors) = cfg.validate() {
        for error in &errors {
            eprintln!("Config error {}", error);
        }
        return Err(anyhow::anyhow!(
            "Invalid configuration ({} problem(s))",
            errors.len()
        ));
    }

    logging::init(&cfg.logging.filter, args.verbose);
    tracing::debug!(
        backend = cfg.storage.backend.as_str(),
        key = %cfg.likes.storage_key,
        "starting"
    );

    let store = PersistenceStore::from_boxed(cfg.storage.open_backend());
    let likes = LikeLedger::open_with_key(store, &cfg.likes.storage_key)?;
    let mentors = if cfg.mentors.seed_fixtures {
        MentorProfileStore::seeded()
    } else {
        MentorProfileStore::new()
    };

    let run_id = uuid::Uuid::new_v4().to_string();
    let journal = match &args.journal {
        Some(path) => Some(Journal::open(path, &run_id)?),
        None => None,
    };

    let command = args.command;
    let ctx = cli::Context {
        config: cfg,
        run_id,
        likes: RefCell::new(likes),
        reactions: RefCell::new(ReactionLedger::new()),
        mentors: RefCell::new(mentors),
        journal: RefCell::new(journal),
    };

    match command {
        None | Some(cli::Command::Shell) => cli::run_repl(&ctx),
        Some(command) => cli::run_once(&ctx, command),
    }
}
