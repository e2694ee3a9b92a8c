use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;
use crate::export::csv::DEFAULT_FILENAME;
use crate::persistence::PersistMode;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted collection.
    pub storage_dir: PathBuf,
    /// Directory exported tables are saved into.
    pub export_dir: PathBuf,
    pub export_filename: String,
    /// Quiet period before an auto-save fires, in milliseconds.
    pub autosave_quiet_ms: u64,
    pub persist_mode: PersistMode,
    /// Extra font for scripts the built-in fonts cannot render.
    pub font_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("data"),
            export_dir: PathBuf::from("."),
            export_filename: DEFAULT_FILENAME.to_string(),
            autosave_quiet_ms: 1000,
            persist_mode: PersistMode::Scenes,
            font_path: None,
        }
    }
}

impl Config {
    pub fn autosave_quiet(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_ms)
    }
}

/// Reads `file_path`. A missing file yields the defaults; an unreadable or
/// invalid one is an error.
pub fn load_config_from_file(file_path: &str) -> Result<Config, ConfigError> {
    let contents = match fs::read_to_string(file_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("{} not found, using default configuration", file_path);
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: file_path.to_string(),
                source,
            })
        }
    };
    parse_config(file_path, &contents)
}

pub fn parse_config(file_path: &str, contents: &str) -> Result<Config, ConfigError> {
    let loaded_config = toml::from_str::<Config>(contents).map_err(|source| ConfigError::Parse {
        path: file_path.to_string(),
        source,
    })?;

    if loaded_config.autosave_quiet_ms == 0 {
        return Err(ConfigError::Invalid {
            path: file_path.to_string(),
            message: "autosave_quiet_ms must be greater than zero".to_string(),
        });
    }
    if loaded_config.export_filename.trim().is_empty() {
        return Err(ConfigError::Invalid {
            path: file_path.to_string(),
            message: "export_filename must not be empty".to_string(),
        });
    }
    Ok(loaded_config)
}
