//! Error types for the domain layer.

use thiserror::Error;

use crate::access::Route;
use crate::controls::Action;
use crate::validation::ValidationErrors;

/// Errors raised by domain rules, before anything reaches the network.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more form fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A role string was not one of `user`, `tech`, `admin`.
    #[error("unknown role: {0}")]
    InvalidRole(String),

    /// A rank string was not part of the rank enumeration.
    #[error("unknown rank: {0}")]
    InvalidRank(String),

    /// A non-admin tried to grant the admin role.
    #[error("only an admin can assign the admin role")]
    RoleEscalation,

    /// The signed-in user tried to delete their own account.
    #[error("cannot delete the currently signed-in user")]
    SelfDeletion,

    /// The route is not available to the current session.
    #[error("access to {0} denied")]
    Forbidden(Route),

    /// A lifecycle action is not currently allowed.
    #[error("{action} is unavailable: {reason}")]
    ActionUnavailable {
        /// The rejected action.
        action: Action,
        /// Why the gate is closed.
        reason: &'static str,
    },

    /// Reading an upload from disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, CoreError>;
