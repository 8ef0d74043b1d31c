//! Validation error types.

use std::any::Any;

use thiserror::Error;

use super::FieldId;

/// Errors returned when a validation pass cannot commit its outcome.
///
/// Rule failures are never reported through this type; they are messages on
/// the [`ValidationEvent`](super::ValidationEvent).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A newer pass started for the field before this one settled.
    #[error("Validation pass for {field} was superseded by a newer pass")]
    Superseded {
        /// The field whose pass was discarded.
        field: FieldId,
    },

    /// The field is not registered with the context.
    #[error("Field {0} is not registered")]
    UnknownField(FieldId),
}

impl ValidationError {
    /// Check if this error means the pass was interrupted by a newer one.
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}

/// Extract a human-readable message from a panic payload.
///
/// Panics carry either a `&str` or a `String`; anything else gets a generic
/// message.
pub fn extract_panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Failure message recorded when a rule panics.
pub(crate) fn panic_failure(panic: &(dyn Any + Send)) -> String {
    format!("Validation rule panicked: {}", extract_panic_message(panic))
}
