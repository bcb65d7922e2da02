use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("broken fixture data: {0}")]
    Fixture(#[from] serde_json::Error),
}
