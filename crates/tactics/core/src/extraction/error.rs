use super::zone::ZoneId;
use crate::error::{ErrorSeverity, TacticalError};

/// Errors raised by the extraction resolver.
///
/// Both variants mean the caller invoked validation out of order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("{0} has no working position to validate")]
    PositionNotEstablished(ZoneId),

    #[error("{0} has not been stepped by the resolver")]
    NotTracked(ZoneId),
}

impl TacticalError for ExtractionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::PositionNotEstablished(_) => "EXTRACTION_NO_POSITION",
            Self::NotTracked(_) => "EXTRACTION_NOT_TRACKED",
        }
    }
}
