//! Error types for the CLI.

use std::fmt;

use cvt_client::ClientError;
use cvt_core::{CoreError, Lang};

/// Errors that can occur during CLI operations.
#[derive(Debug)]
pub enum CliError {
    /// The backend call failed.
    Client(ClientError),
    /// Input was rejected before anything was sent.
    Invalid(String),
    /// The command needs a signed-in session.
    NotSignedIn,
    /// Configuration or session file problem.
    Config(String),
    /// Output formatting failed.
    Format(String),
    /// A referenced record does not exist.
    NotFound {
        /// Kind of record.
        kind: &'static str,
        /// The id that was looked up.
        id: String,
    },
    /// I/O error.
    Io(std::io::Error),
}

impl CliError {
    /// Error for input rejected by client-side checks, localized.
    #[must_use]
    pub fn from_core(err: &CoreError, lang: Lang) -> Self {
        match err {
            CoreError::Validation(errors) => Self::Invalid(
                errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.localized(lang)))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            other => Self::Invalid(other.to_string()),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client(err) => write!(f, "{err}"),
            Self::Invalid(msg) => write!(f, "invalid input: {msg}"),
            Self::NotSignedIn => write!(f, "not signed in; run `cvt auth login` first"),
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Client(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Core(core) => Self::from_core(&core, Lang::En),
            ClientError::NotAuthenticated => Self::NotSignedIn,
            other => Self::Client(other),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::from_core(&err, Lang::En)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}
