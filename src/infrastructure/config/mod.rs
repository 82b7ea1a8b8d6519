//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;

/// Bot configuration
///
/// Every field has a default, so a partial file is fine and no file at
/// all still yields a runnable dev setup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub server: ServerConfig,
    pub bot: BotConfig,
    pub channels: Vec<String>,
    pub plugins: PluginsConfig,
    pub command_prefix: String,
    /// Milliseconds between tick events; 0 disables the tick.
    pub tick_interval_ms: u64,
    pub join_on_invite: bool,
    pub debug: bool,
}

/// An empty host selects the console transport instead of IRC.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Connection attempts before giving up for good.
    pub retry_count: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub nick: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginsConfig {
    pub directory: PathBuf,
    /// Plugin identifiers, loaded and dispatched in this order.
    pub load: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            bot: BotConfig::default(),
            channels: vec!["#ferric".to_string()],
            plugins: PluginsConfig::default(),
            command_prefix: "!".to_string(),
            tick_interval_ms: 60_000,
            join_on_invite: false,
            debug: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 6667,
            retry_count: 5,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            nick: "ferric".to_string(),
        }
    }
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./plugins"),
            load: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.into())?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Defaults with environment overrides, for running without a file.
    pub fn load_env() -> Self {
        let mut config = Config::default();

        if let Ok(host) = std::env::var("FERRIC_SERVER") {
            config.server.host = host;
        }
        if let Ok(nick) = std::env::var("FERRIC_NICK") {
            config.bot.nick = nick;
        }
        if let Ok(prefix) = std::env::var("FERRIC_PREFIX") {
            config.command_prefix = prefix;
        }

        config
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
