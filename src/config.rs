use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::session::DEFAULT_COOKIE_NAME;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEV_SESSION_SECRET: &str = "dev-secret";

/// On-disk configuration (`vowmarket.toml`). Every field is optional;
/// unset fields fall back to environment variables and then defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MarketConfig {
    pub database: Option<String>,
    pub port: Option<u16>,
    pub cookie_name: Option<String>,
    pub session_secret: Option<String>,
    pub owner_open_id: Option<String>,
    pub static_dir: Option<String>,
}

/// Fully resolved settings the server and CLI run with.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: PathBuf,
    pub port: u16,
    pub cookie_name: String,
    pub session_secret: String,
    pub owner_open_id: Option<String>,
    pub static_dir: Option<PathBuf>,
}

impl Settings {
    pub fn uses_dev_secret(&self) -> bool {
        self.session_secret == DEV_SESSION_SECRET
    }
}

impl MarketConfig {
    /// Overlay `VOWMARKET_DATABASE`, `PORT`, `JWT_SECRET` and `OWNER_OPEN_ID`
    /// from the process environment.
    pub fn with_env(self) -> anyhow::Result<Self> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub fn with_env_from<F>(mut self, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(database) = lookup("VOWMARKET_DATABASE") {
            self.database = Some(database);
        }
        if let Some(port) = lookup("PORT") {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("PORT is not a valid port number: {}", port))?;
            self.port = Some(port);
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.session_secret = Some(secret);
        }
        if let Some(owner) = lookup("OWNER_OPEN_ID") {
            self.owner_open_id = Some(owner);
        }
        Ok(self)
    }

    pub fn resolve(self) -> Settings {
        Settings {
            database: self
                .database
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            port: self.port.unwrap_or(DEFAULT_PORT),
            cookie_name: self
                .cookie_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string()),
            session_secret: self
                .session_secret
                .filter(|secret| !secret.is_empty())
                .unwrap_or_else(|| DEV_SESSION_SECRET.to_string()),
            owner_open_id: self.owner_open_id.filter(|id| !id.is_empty()),
            static_dir: self.static_dir.map(PathBuf::from),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("vowmarket.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from(".vowmarket").join("vowmarket.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<MarketConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: MarketConfig = toml::from_str(&contents)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

/// Load the config file (if any), then apply environment overrides.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let config = load_config(path)?.unwrap_or_default().with_env()?;
    Ok(config.resolve())
}

pub fn write_config(path: &Path, config: &MarketConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
