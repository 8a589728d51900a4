use crate::likes::DEFAULT_STORAGE_KEY;
use crate::storage::{self, FileStore, KeyValueStore, MemoryStore, NullStore};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-user and per-project config directory
pub const CONFIG_DIR: &str = ".mentor-ledger";

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Which durable medium backs the persisted ledgers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
    None,
}

impl StorageBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "file" | "disk" => Some(Self::File),
            "memory" | "mem" => Some(Self::Memory),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory for the file backend; defaults to `~/.mentor-ledger/data`
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolved data directory for the file backend
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return dir.clone();
        }
        dirs::home_dir()
            .map(|home| home.join(CONFIG_DIR).join("data"))
            .unwrap_or_else(|| Path::new(CONFIG_DIR).join("data"))
    }

    /// Build the configured backend
    pub fn open_backend(&self) -> Box<dyn KeyValueStore> {
        match self.backend {
            StorageBackend::File => Box::new(FileStore::new(&self.data_dir())),
            StorageBackend::Memory => Box::new(MemoryStore::new()),
            StorageBackend::None => Box::new(NullStore),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LikesConfig {
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_top_limit")]
    pub top_limit: usize,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_top_limit() -> usize {
    5
}

impl Default for LikesConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            top_limit: default_top_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MentorsConfig {
    #[serde(default = "default_true")]
    pub seed_fixtures: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MentorsConfig {
    fn default() -> Self {
        Self {
            seed_fixtures: default_true(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when RUST_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "mentor_ledger=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub likes: LikesConfig,
    #[serde(default)]
    pub mentors: MentorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Same shape as [`Config`] but every field optional, so a layer only
/// overrides what it actually sets
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigLayer {
    #[serde(default)]
    storage: Option<StorageLayer>,
    #[serde(default)]
    likes: Option<LikesLayer>,
    #[serde(default)]
    mentors: Option<MentorsLayer>,
    #[serde(default)]
    logging: Option<LoggingLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StorageLayer {
    backend: Option<StorageBackend>,
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LikesLayer {
    storage_key: Option<String>,
    top_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MentorsLayer {
    seed_fixtures: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LoggingLayer {
    filter: Option<String>,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.mentor-ledger/config.local.toml) > project (.mentor-ledger/config.toml)
    /// > user (~/.mentor-ledger/config.toml) > built-in defaults
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(CONFIG_DIR).join("config.toml");
            if user_config.exists() {
                config.merge_file(&user_config)?;
            }
        }

        let project_config = Path::new(CONFIG_DIR).join("config.toml");
        if project_config.exists() {
            config.merge_file(&project_config)?;
        }

        // Should be gitignored
        let local_config = Path::new(CONFIG_DIR).join("config.local.toml");
        if local_config.exists() {
            config.merge_file(&local_config)?;
        }

        Ok(config)
    }

    /// Load configuration from a specific path, on top of the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge_file(path)?;
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let layer: ConfigLayer = toml::from_str(&content)?;
        self.merge(layer);
        tracing::debug!(path = %path.display(), "merged config layer");
        Ok(())
    }

    /// Merge a layer into this config (layer takes priority where set)
    fn merge(&mut self, other: ConfigLayer) {
        if let Some(storage) = other.storage {
            if let Some(backend) = storage.backend {
                self.storage.backend = backend;
            }
            if storage.dir.is_some() {
                self.storage.dir = storage.dir;
            }
        }
        if let Some(likes) = other.likes {
            if let Some(key) = likes.storage_key {
                self.likes.storage_key = key;
            }
            if let Some(limit) = likes.top_limit {
                self.likes.top_limit = limit;
            }
        }
        if let Some(mentors) = other.mentors {
            if let Some(seed) = mentors.seed_fixtures {
                self.mentors.seed_fixtures = seed;
            }
        }
        if let Some(logging) = other.logging {
            if let Some(filter) = logging.filter {
                self.logging.filter = filter;
            }
        }
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !storage::is_valid_key(&self.likes.storage_key) {
            errors.push(ValidationError {
                field: "likes.storage_key".to_string(),
                message: format!(
                    "Invalid key '{}', use letters, digits, '_', '-' or '.'",
                    self.likes.storage_key
                ),
            });
        }

        if self.likes.top_limit == 0 {
            errors.push(ValidationError {
                field: "likes.top_limit".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.storage.backend != StorageBackend::File && self.storage.dir.is_some() {
            errors.push(ValidationError {
                field: "storage.dir".to_string(),
                message: format!(
                    "Only used by the file backend, but backend is '{}'",
                    self.storage.backend.as_str()
                ),
            });
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.filter).is_err() {
            errors.push(ValidationError {
                field: "logging.filter".to_string(),
                message: format!("Invalid filter directive '{}'", self.logging.filter),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
