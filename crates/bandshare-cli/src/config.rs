use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;

/// Keys accepted by `config get` and `config set`.
pub const KEYS: &[&str] = &["database_path", "logging.level", "logging.coloured"];

pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Configuration for bandshare.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (BAND_* prefix)
/// 3. Config file (~/.config/bandshare/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: BAND_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/bandshare/bandshare.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of `LOG_LEVELS`.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_coloured")]
    pub coloured: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            coloured: default_coloured(),
        }
    }
}

impl Config {
    /// Load configuration from the config file and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `config_path` (when it exists) and the
    /// environment.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("band");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid logging.level {:?}; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            );
        }

        Ok(config)
    }

    /// Load configuration, overriding the database path (the --db flag).
    pub fn load_with_db_path(db_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load()?;
        if let Some(db_path) = db_path {
            config.database_path = db_path;
        }
        Ok(config)
    }

    /// The effective value of a dotted key, for `config get`.
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "database_path" => Ok(self.database_path.display().to_string()),
            "logging.level" => Ok(self.logging.level.clone()),
            "logging.coloured" => Ok(self.logging.coloured.to_string()),
            _ => Err(unknown_key(key)),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bandshare")
        .join("bandshare.db")
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_coloured() -> bool {
    true
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow::anyhow!("Unknown config key: {}\n\nValid keys: {}", key, KEYS.join(", "))
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/bandshare/config.toml
/// - macOS: ~/Library/Application Support/bandshare/config.toml
/// - Windows: %APPDATA%\bandshare\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bandshare")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Bandshare Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (BAND_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite database
#
# Can also be set via:
# - CLI: bandshare --db /custom/path.db migrate
# - Environment: BAND_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/bandshare.db"

[logging]
# One of: trace, debug, info, warn, error
level = "info"

# Colour log output on the terminal
coloured = true
"#
}

/// Create the config file from the example if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    ensure_config_file_at(&config_file_path())
}

pub fn ensure_config_file_at(config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

/// Set a dotted key in TOML text, keeping comments and layout.
pub fn set_value(contents: &str, key: &str, value: &str) -> Result<String> {
    let mut doc = contents
        .parse::<DocumentMut>()
        .context("Failed to parse config file")?;

    match key {
        "database_path" => {
            doc["database_path"] = toml_edit::value(value);
        }
        "logging.level" => {
            if !LOG_LEVELS.contains(&value) {
                anyhow::bail!(
                    "Invalid logging.level {:?}; expected one of: {}",
                    value,
                    LOG_LEVELS.join(", ")
                );
            }
            logging_table(&mut doc)["level"] = toml_edit::value(value);
        }
        "logging.coloured" => {
            let coloured: bool = value
                .parse()
                .with_context(|| format!("logging.coloured must be true or false, got {:?}", value))?;
            logging_table(&mut doc)["coloured"] = toml_edit::value(coloured);
        }
        _ => return Err(unknown_key(key)),
    }

    Ok(doc.to_string())
}

fn logging_table(doc: &mut DocumentMut) -> &mut toml_edit::Item {
    if !doc.contains_key("logging") {
        doc["logging"] = toml_edit::table();
    }
    &mut doc["logging"]
}
