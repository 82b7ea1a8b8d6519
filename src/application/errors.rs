//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Transport closed: {0}")]
    TransportClosed(String),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),
}

/// Plugin lifecycle and handler errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("{0}")]
    Load(String),

    #[error("Library error: {0}")]
    Dylib(#[from] libloading::Error),

    #[error("{0}")]
    Handler(String),

    #[error("Reply delivery failed: {0}")]
    ReplyDelivery(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}
