use thiserror::Error;

use crate::core::registry::DefinitionKind;
use crate::core::types::{AgentId, RegionId};

#[derive(Error, Debug)]
pub enum BlightError {
    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("Region not found: {0:?}")]
    RegionNotFound(RegionId),

    #[error("Missing definition: {0:?}")]
    MissingDefinition(DefinitionKind),

    #[error("Host refused: {0}")]
    HostRefused(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BlightError>;
