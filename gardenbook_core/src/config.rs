use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

static DATA_DIR_NAME: &str = "gardenbook";
static GARDENBOOK_DB_NAME: &str = "gardenbook.sqlite";
static CONFIG_FILE_NAME: &str = "config.json";

pub static ENV_DATABASE_URL: &str = "GARDENBOOK_DATABASE_URL";
pub static ENV_BIND: &str = "GARDENBOOK_BIND";
pub static ENV_SITE_URL: &str = "GARDENBOOK_SITE_URL";
pub static ENV_MAIL_FROM: &str = "GARDENBOOK_MAIL_FROM";

// For now this directory structure should be like
// data_dir_path
// |- gardenbook
//    |- gardenbook.sqlite
//    |- config.json

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_site_url() -> String {
    "http://localhost:3000/".to_string()
}

fn default_mail_from() -> String {
    "from@example.com".to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to find a data directory on this platform")]
    NoDataDir,

    #[error("config io error")]
    Io(#[from] std::io::Error),

    #[error("malformed config file")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GardenBookConfig {
    pub database_path: PathBuf,

    /// Full connection string; wins over `database_path` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Address the HTTP server listens on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Public base URL, used for links in outgoing mail.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Sender address of outgoing mail.
    #[serde(default = "default_mail_from")]
    pub mail_from: String,
}

impl GardenBookConfig {
    /// Creates a new config with defaults rooted at the specified data directory
    pub fn new(data_dir: &Path) -> Self {
        GardenBookConfig {
            database_path: data_dir.join(GARDENBOOK_DB_NAME),
            database_url: None,
            bind: default_bind(),
            site_url: default_site_url(),
            mail_from: default_mail_from(),
        }
    }

    /// Config backed by a private in-memory database. Nothing touches disk.
    pub fn in_memory() -> Self {
        GardenBookConfig {
            database_url: Some("sqlite::memory:".to_string()),
            ..Self::new(Path::new("."))
        }
    }

    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.database_path.display()),
        }
    }

    /// Applies `GARDENBOOK_*` overrides from the given lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            info!(var = ENV_DATABASE_URL, "overriding database url");
            self.database_url = Some(url);
        }
        if let Some(bind) = lookup(ENV_BIND) {
            info!(var = ENV_BIND, %bind, "overriding bind address");
            self.bind = bind;
        }
        if let Some(site_url) = lookup(ENV_SITE_URL) {
            info!(var = ENV_SITE_URL, %site_url, "overriding site url");
            self.site_url = site_url;
        }
        if let Some(from) = lookup(ENV_MAIL_FROM) {
            info!(var = ENV_MAIL_FROM, %from, "overriding mail sender");
            self.mail_from = from;
        }
    }
}

/// Reads `config_path`, or writes a fresh default config there when missing.
pub async fn load_or_create(config_path: &Path) -> Result<GardenBookConfig, ConfigError> {
    let dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    // Create the gardenbook directory if it doesn't exist
    fs::create_dir_all(&dir).await?;

    if fs::try_exists(config_path).await? {
        // Read and deserialize existing config
        let mut file = fs::File::open(config_path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        let config: GardenBookConfig = serde_json::from_str(&contents)?;
        info!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else {
        let config = GardenBookConfig::new(&dir);

        // Serialize and write to file
        let json = serde_json::to_string_pretty(&config)?;
        let mut file = fs::File::create(config_path).await?;
        file.write_all(json.as_bytes()).await?;

        info!(path = %config_path.display(), "wrote default config");
        Ok(config)
    }
}

/// Gets the existing config or initializes a new one if it doesn't exist,
/// then applies environment overrides.
pub async fn get_or_init() -> Result<GardenBookConfig, ConfigError> {
    let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    let config_path = data_dir.join(DATA_DIR_NAME).join(CONFIG_FILE_NAME);

    let mut config = load_or_create(&config_path).await?;
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}
