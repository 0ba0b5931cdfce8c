use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for musia.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (MUSIA_* prefix)
/// 3. Config file (~/.config/musia/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: MUSIA_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/musia/musia.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Ollama-compatible `/api/embed` endpoint.
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,

    /// Embedding model name. Every stored vector must come from the same model.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Bearer token for hosted embedding endpoints.
    ///
    /// Can be set via:
    /// - ENV: MUSIA_EMBEDDING_API_KEY
    /// - Config: embedding_api_key = "..."
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_api_key: Option<String>,

    #[serde(default = "default_embedding_timeout_secs")]
    pub embedding_timeout_secs: u64,

    /// LRCLIB base URL.
    #[serde(default = "default_lyrics_url")]
    pub lyrics_url: String,

    #[serde(default = "default_lyrics_timeout_secs")]
    pub lyrics_timeout_secs: u64,

    /// Songs per generated playlist when `--songs` is not given.
    #[serde(default = "default_playlist_size")]
    pub default_playlist_size: usize,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output settings, applied once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_true")]
    pub coloured: bool,

    #[serde(default)]
    pub report_caller: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            coloured: true,
            report_caller: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            embedding_api_key: None,
            embedding_timeout_secs: default_embedding_timeout_secs(),
            lyrics_url: default_lyrics_url(),
            lyrics_timeout_secs: default_lyrics_timeout_secs(),
            default_playlist_size: default_playlist_size(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/musia/config.toml
    /// Reads environment variables with MUSIA_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("musia");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }

    /// Render the effective configuration as TOML, with secrets masked.
    pub fn to_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.embedding_api_key.is_some() {
            shown.embedding_api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).context("Failed to render configuration")
    }

    /// Look up one setting by its config-file key.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "database_path" => self.database_path.display().to_string(),
            "embedding_url" => self.embedding_url.clone(),
            "embedding_model" => self.embedding_model.clone(),
            "embedding_api_key" => self
                .embedding_api_key
                .clone()
                .unwrap_or_else(|| String::from("<not set>")),
            "embedding_timeout_secs" => self.embedding_timeout_secs.to_string(),
            "lyrics_url" => self.lyrics_url.clone(),
            "lyrics_timeout_secs" => self.lyrics_timeout_secs.to_string(),
            "default_playlist_size" => self.default_playlist_size.to_string(),
            "logging.level" => self.logging.level.clone(),
            "logging.coloured" => self.logging.coloured.to_string(),
            "logging.report_caller" => self.logging.report_caller.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// Keys accepted by `config get` and `config set`.
pub const KEYS: &[&str] = &[
    "database_path",
    "embedding_url",
    "embedding_model",
    "embedding_api_key",
    "embedding_timeout_secs",
    "lyrics_url",
    "lyrics_timeout_secs",
    "default_playlist_size",
    "logging.level",
    "logging.coloured",
    "logging.report_caller",
];

/// Get the default database path.
///
/// Returns: ~/.local/share/musia/musia.db (or platform equivalent)
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("musia")
        .join("musia.db")
}

fn default_embedding_url() -> String {
    String::from("http://localhost:11434/api/embed")
}

fn default_embedding_model() -> String {
    String::from("bge-m3")
}

fn default_embedding_timeout_secs() -> u64 {
    20
}

fn default_lyrics_url() -> String {
    String::from("https://lrclib.net")
}

fn default_lyrics_timeout_secs() -> u64 {
    10
}

fn default_playlist_size() -> usize {
    10
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_true() -> bool {
    true
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/musia/config.toml
/// - macOS: ~/Library/Application Support/musia/config.toml
/// - Windows: %APPDATA%\musia\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("musia")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Musia Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (MUSIA_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite database holding songs, lyrics vectors and playlists
#
# Can also be set via:
# - CLI: musia --db /custom/path.db song list
# - Environment: MUSIA_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/musia.db"

# Embedding endpoint (Ollama /api/embed or a compatible proxy)
embedding_url = "http://localhost:11434/api/embed"

# Embedding model. Changing it after songs were added makes new vectors
# incompatible with stored ones.
embedding_model = "bge-m3"

# Bearer token for hosted endpoints
# - Environment: MUSIA_EMBEDDING_API_KEY=your-key-here
#embedding_api_key = "your-key-here"

# Seconds before an embedding request is abandoned
embedding_timeout_secs = 20

# LRCLIB lyrics service
lyrics_url = "https://lrclib.net"
lyrics_timeout_secs = 10

# Songs per playlist when `musia playlist create` is run without --songs
default_playlist_size = 10

[logging]
# trace, debug, info, warn or error
level = "info"
coloured = true
report_caller = false
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
