//! Authentication command implementation.
//!
//! Handles login, registration, logout and whoami. A successful login
//! stores the session cookie so later invocations stay signed in.

use std::io::Write;

use cvt_core::forms::{LoginForm, RegisterForm};
use cvt_core::i18n::{Op, Subject};
use tracing::info;

use super::Context;
use crate::cli::AuthCommands;
use crate::error::CliError;
use crate::output::{MessageOutput, OutputFormat};

/// Handler for auth subcommands.
pub struct AuthCommand<'a> {
    ctx: &'a Context,
}

impl<'a> AuthCommand<'a> {
    /// Creates a new auth command handler.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Executes the auth subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &AuthCommands,
    ) -> Result<(), CliError> {
        match command {
            AuthCommands::Login { email, password } => {
                let form = LoginForm {
                    email: email.clone(),
                    password: password.clone(),
                };
                let result = self.ctx.session().login(&form).await;
                let user = self.ctx.report(Subject::Session, Op::Login, result)?;
                self.ctx.remember()?;
                info!(username = %user.username, "signed in");
                format.write(out, &self.ctx.done(Subject::Session, Op::Login).with_id(user.id))
            }
            AuthCommands::Register {
                full_name,
                email,
                username,
                password,
            } => {
                let form = RegisterForm {
                    full_name: full_name.clone(),
                    email: email.clone(),
                    username: username.clone(),
                    password: password.clone(),
                };
                let result = self.ctx.session().register(&form).await;
                let user = self.ctx.report(Subject::Session, Op::Register, result)?;
                self.ctx.remember()?;
                format.write(out, &self.ctx.done(Subject::Session, Op::Register).with_id(user.id))
            }
            AuthCommands::Logout => {
                let result = self.ctx.session().logout().await;
                // The local session goes away even if the backend call failed.
                self.ctx.forget()?;
                result?;
                format.write(out, &MessageOutput::ok("signed out"))
            }
            AuthCommands::Whoami => format.write(out, &self.ctx.current_user()?),
        }
    }
}
