//! Common error infrastructure for tactics-core.
//!
//! Domain-specific errors (e.g., [`crate::extraction::ExtractionError`]) are
//! defined next to the operations that raise them. They all implement
//! [`TacticalError`] so callers can tell bad input from a logic bug.
//!
//! Most per-candidate failures are not errors at all: a rejected geometry or
//! an unreachable point is a normal `None`. Errors are reserved for invalid
//! configuration and for calls made in the wrong order.

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Invalid input that must be fixed before retrying.
    ///
    /// Examples: zero pool capacity, negative thresholds
    Validation,

    /// Call-ordering bug inside the caller.
    ///
    /// Examples: validating a path before an extraction position exists
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error indicates a bug in the caller.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for all tactics-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait TacticalError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
