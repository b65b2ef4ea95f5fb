use thiserror::Error;

use super::entry::Placement;
use super::kind::ModuleType;

/// Non-fatal registration failures
///
/// None of these abort startup. The registry logs each one and keeps it
/// as a notice so callers can inspect what did not get registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("{kind} module '{module}' already registered on page '{page}'")]
    Duplicate {
        kind: ModuleType,
        page: String,
        module: String,
    },

    #[error("{kind} module '{module}' deferred: marker '{marker}' not found on page '{page}'")]
    Deferred {
        kind: ModuleType,
        page: String,
        module: String,
        marker: String,
    },

    #[error(
        "failed to insert {kind} module '{module}' {placement} '{marker}' on page '{page}'"
    )]
    Unresolved {
        kind: ModuleType,
        page: String,
        module: String,
        marker: String,
        placement: Placement,
    },

    #[error(
        "cannot replace {kind} module '{target}' with '{replacement}' on page '{page}': name already taken"
    )]
    ReplacementTaken {
        kind: ModuleType,
        page: String,
        target: String,
        replacement: String,
    },
}

impl RegistrationError {
    /// Whether the module was permanently dropped
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RegistrationError::Deferred { .. })
    }
}
