use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::quiz::QuizSettings;
use crate::{Error, Result};

/// Name of the configuration file inside of the configuration path.
pub const CONFIG_FILE: &str = "config.toml";

/// Name of the database file used when the configuration does not set one.
pub const DATABASE_FILE: &str = "lessons.sqlite3";

/// Returns the configuration path for the application, and it even creates it
/// if it doesn't exist already.
pub fn get_config_path() -> Result<PathBuf> {
    let dir = match &std::env::var("XDG_CONFIG_HOME") {
        Ok(path) => PathBuf::from(path),
        Err(_) => match &std::env::var("HOME") {
            Ok(path) => Path::new(path).join(".config"),
            Err(_) => {
                return Err(Error::Config(String::from(
                    "cannot find a suitable path for the configuration",
                )))
            }
        },
    }
    .join("kotoba");

    std::fs::create_dir_all(&dir)?;

    Ok(dir)
}

/// Configuration object for this application. Obtain this via the
/// `configuration` function.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Path to the lessons database. Relative paths are taken from the
    /// configuration path.
    pub database: Option<PathBuf>,
    pub quiz: QuizSettings,
}

impl Configuration {
    /// Parse and validate the contents of a configuration file.
    pub fn from_toml(contents: &str) -> Result<Configuration> {
        let cfg: Configuration = toml::from_str(contents)?;
        cfg.quiz.validate()?;
        Ok(cfg)
    }

    /// Returns the path to the database, given the configuration path `base`.
    pub fn database_path_in(&self, base: &Path) -> PathBuf {
        match &self.database {
            Some(path) => base.join(path),
            None => base.join(DATABASE_FILE),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.database_path_in(&get_config_path()?))
    }
}

/// Reads the global configuration and returns a proper object for it. A
/// missing configuration file means that defaults are to be used.
pub fn configuration() -> Result<Configuration> {
    let path = get_config_path()?.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Configuration::default());
    }

    let contents = std::fs::read_to_string(&path)?;
    Configuration::from_toml(&contents)
}
