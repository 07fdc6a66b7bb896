use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::db::SqliteStore;
use crate::error::StoreError;
use crate::roster::RosterOptions;
use crate::schedule::{MonthRollover, DISPLAY_FORMAT};
use crate::store::{JsonFileStore, SnapshotStore, ROSTER_KEY};

/// Prefix of environment overrides, e.g. `ROSTER_BACKEND=json`
pub const ENV_PREFIX: &str = "ROSTER_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// `roster.db` with a key-value table
    Sqlite,
    /// `<storage_key>.json` files
    Json,
}

/// A model for describing configuration of the tool.
/// Consists of:
/// 1. Directory holding the roster storage (and the TUI log file)
/// 2. Storage backend and the key the snapshot lives under
/// 3. How due dates are computed and shown
/// 4. Whether a first run starts with the seed student
/// 5. Default log level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
    pub storage_key: String,
    pub date_format: String,
    pub month_rollover: MonthRollover,
    pub seed_on_first_run: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join("tutor-roster"))
            .unwrap_or_else(|| PathBuf::from(".tutor-roster"));

        Config {
            data_dir,
            backend: Backend::Sqlite,
            storage_key: ROSTER_KEY.to_string(),
            date_format: DISPLAY_FORMAT.to_string(),
            month_rollover: MonthRollover::Overflow,
            seed_on_first_run: true,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then the JSON file (if it exists), then `ROSTER_*` variables
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let defaults = Config::default();
        let file = config_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| defaults.data_dir.join("config.json"));

        Figment::from(Serialized::defaults(defaults))
            .merge(Json::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(config_file: Option<&Path>) -> Result<Config, figment::Error> {
        Self::figment(config_file).extract()
    }

    pub fn roster_options(&self) -> RosterOptions {
        RosterOptions {
            key: self.storage_key.clone(),
            seed_on_first_run: self.seed_on_first_run,
            rollover: self.month_rollover,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("roster.db")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("tutor-roster.log")
    }

    /// Open the configured key-value backend
    pub fn open_store(&self) -> Result<Box<dyn SnapshotStore>, StoreError> {
        Ok(match self.backend {
            Backend::Sqlite => Box::new(SqliteStore::open(&self.database_path())?),
            Backend::Json => Box::new(JsonFileStore::open(&self.data_dir)?),
        })
    }
}
