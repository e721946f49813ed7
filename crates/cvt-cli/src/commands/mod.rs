//! CLI command implementations.
//!
//! Each submodule implements one page of the console:
//! - [`auth`] - Sign in, register, sign out
//! - [`dashboard`] - Navigation and team overview
//! - [`member`] / [`team`] - Personnel
//! - [`software`] / [`system`] - Catalog
//! - [`user`] - Account administration
//! - [`guide`] - Guide documents
//! - [`container`] - Containers, builds and logs

pub mod auth;
pub mod container;
pub mod dashboard;
pub mod guide;
pub mod member;
pub mod software;
pub mod system;
pub mod team;
pub mod user;

pub use auth::AuthCommand;
pub use container::ContainerCommand;
pub use dashboard::DashboardCommand;
pub use guide::GuideCommand;
pub use member::MemberCommand;
pub use software::SoftwareCommand;
pub use system::SystemCommand;
pub use team::TeamCommand;
pub use user::UserCommand;

use std::path::Path;

use cvt_client::{ApiClient, ClientConfig, ClientError, Notification, Notifier, Session};
use cvt_core::i18n::{self, Op, Subject};
use cvt_core::{Lang, UploadFile, User};
use tracing::debug;

use crate::cli::Cli;
use crate::error::CliError;
use crate::notify::TerminalNotifier;
use crate::output::MessageOutput;
use crate::session_file::{SessionFile, StoredSession};

/// Everything a command needs: the client, the session and where to keep it.
#[derive(Debug)]
pub struct Context {
    client: ApiClient,
    session: Session,
    lang: Lang,
    session_file: SessionFile,
}

impl Context {
    /// Build the client for `cli` and restore a saved session cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL is invalid or the session file
    /// cannot be read.
    pub fn connect(cli: &Cli) -> Result<Self, CliError> {
        let config = match &cli.api_url {
            Some(url) => ClientConfig::with_base_url(url)?,
            None => ClientConfig::for_environment(cli.environment),
        }
        .lang(cli.lang);
        let session_file = match &cli.session_file {
            Some(path) => SessionFile::new(path),
            None => SessionFile::default_location()?,
        };
        Self::new(ApiClient::new(config)?, session_file, cli.lang)
    }

    /// Wrap an existing client.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be read.
    pub fn new(client: ApiClient, session_file: SessionFile, lang: Lang) -> Result<Self, CliError> {
        if let Some(stored) = session_file.load()? {
            if stored.matches(client.config().base_url.as_str()) {
                client.restore_cookies(&stored.cookie);
                debug!(saved_at = %stored.saved_at, "restored session cookie");
            } else {
                debug!(url = %stored.base_url, "ignoring session for another backend");
            }
        }
        Ok(Self {
            session: Session::new(client.clone()),
            client,
            lang,
            session_file,
        })
    }

    /// The HTTP client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// The session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Message language.
    #[must_use]
    pub const fn lang(&self) -> Lang {
        self.lang
    }

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NotSignedIn`] without a session.
    pub fn current_user(&self) -> Result<User, CliError> {
        self.session.user().ok_or(CliError::NotSignedIn)
    }

    /// Persist the session cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn remember(&self) -> Result<(), CliError> {
        match self.client.cookie_header() {
            Some(cookie) => self.session_file.save(&StoredSession::new(
                self.client.config().base_url.as_str(),
                cookie,
            )),
            None => Ok(()),
        }
    }

    /// Drop the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    pub fn forget(&self) -> Result<(), CliError> {
        self.session_file.clear()
    }

    /// Localized success message for a mutation.
    #[must_use]
    pub fn done(&self, subject: Subject, op: Op) -> MessageOutput {
        MessageOutput::ok(i18n::notice(self.lang, subject, op, true))
    }

    /// Pass `result` through, announcing a backend failure the way the
    /// console does. Input errors are left to the caller's error output.
    ///
    /// # Errors
    ///
    /// Returns the converted error.
    pub fn report<T>(
        &self,
        subject: Subject,
        op: Op,
        result: Result<T, ClientError>,
    ) -> Result<T, CliError> {
        result.map_err(|err| {
            if !matches!(err, ClientError::Core(_)) {
                TerminalNotifier.notify(Notification::error(
                    i18n::notice(self.lang, subject, op, false),
                    err.to_string(),
                ));
            }
            match err {
                ClientError::Core(core) => CliError::from_core(&core, self.lang),
                other => other.into(),
            }
        })
    }
}

/// Read an upload from disk.
fn read_upload(path: &Path) -> Result<UploadFile, CliError> {
    UploadFile::from_path(path).map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
}

fn or_keep(value: Option<&String>, current: &str) -> String {
    value.map_or_else(|| current.to_string(), Clone::clone)
}
