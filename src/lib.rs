//! Ledgers behind the mentoring platform: article likes, admin session
//! reactions and mentor profiles, with pluggable key-value persistence.

pub mod config;
pub mod error;
pub mod fixtures;
pub mod journal;
pub mod likes;
pub mod logging;
pub mod mentors;
pub mod models;
pub mod reactions;
pub mod stats;
pub mod storage;

pub use error::{LedgerError, StoreError};
pub use likes::LikeLedger;
pub use mentors::MentorProfileStore;
pub use reactions::ReactionLedger;
pub use storage::PersistenceStore;
