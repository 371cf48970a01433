//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from configuration, cover claims and extraction resolution
//! so clients can bubble them up with consistent context.
use thiserror::Error;

use tactics_core::{
    AgentId, ClaimError, ConfigError, ErrorSeverity, ExtractionError, Faction, TacticalError,
};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("agent {0} is not registered")]
    UnknownAgent(AgentId),

    #[error("agent {0} is already registered")]
    DuplicateAgent(AgentId),

    #[error("agent {agent} ({faction}) does not extract")]
    ExtractionNotAllowed { agent: AgentId, faction: Faction },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl TacticalError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownAgent(_) | Self::DuplicateAgent(_) | Self::ExtractionNotAllowed { .. } => {
                ErrorSeverity::Validation
            }
            Self::Config(e) => e.severity(),
            Self::Claim(e) => e.severity(),
            Self::Extraction(e) => e.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownAgent(_) => "RUNTIME_UNKNOWN_AGENT",
            Self::DuplicateAgent(_) => "RUNTIME_DUPLICATE_AGENT",
            Self::ExtractionNotAllowed { .. } => "RUNTIME_EXTRACTION_NOT_ALLOWED",
            Self::Config(e) => e.error_code(),
            Self::Claim(e) => e.error_code(),
            Self::Extraction(e) => e.error_code(),
        }
    }
}
