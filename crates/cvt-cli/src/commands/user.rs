//! User administration command implementation.
//!
//! Editing never grants a role the editor lacks, and nobody may delete
//! their own account; both rules are checked before any request is sent.

use std::io::Write;

use cvt_core::User;
use cvt_core::forms::{EditUserForm, PasswordResetForm};
use cvt_core::i18n::{Op, Subject};

use super::Context;
use crate::cli::UserCommands;
use crate::error::CliError;
use crate::output::{MessageOutput, OutputFormat};

/// Handler for user subcommands.
pub struct UserCommand<'a> {
    ctx: &'a Context,
}

impl<'a> UserCommand<'a> {
    /// Creates a new user command handler.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Executes the user subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &UserCommands,
    ) -> Result<(), CliError> {
        let api = self.ctx.client().users();
        match command {
            UserCommands::List => format.write(out, &api.list().await?),
            UserCommands::Edit {
                id,
                full_name,
                username,
                role,
                active,
            } => {
                let target = find(&api.list().await?, id)?;
                let mut form = EditUserForm::from_user(&target);
                if let Some(full_name) = full_name {
                    form.full_name.clone_from(full_name);
                }
                if let Some(username) = username {
                    form.username.clone_from(username);
                }
                form.role = role.unwrap_or(form.role);
                form.active = active.unwrap_or(form.active);

                let editor = self.ctx.session().user();
                let result = api.update(&target.id, &form, editor.as_ref()).await;
                self.ctx.report(Subject::User, Op::Update, result)?;
                format.write(out, &self.ctx.done(Subject::User, Op::Update).with_id(target.id))
            }
            UserCommands::Remove { id } => {
                let current = self.ctx.session().user();
                let result = api.delete(id, current.as_ref()).await;
                self.ctx.report(Subject::User, Op::Delete, result)?;
                format.write(out, &self.ctx.done(Subject::User, Op::Delete).with_id(id))
            }
            UserCommands::ResetPassword { id, password } => {
                let form = PasswordResetForm {
                    new_password: password.clone(),
                };
                let result = api.reset_password(id, &form).await;
                self.ctx.report(Subject::User, Op::PasswordReset, result)?;
                format.write(
                    out,
                    &self.ctx.done(Subject::User, Op::PasswordReset).with_id(id),
                )
            }
            UserCommands::CopyId { query } => {
                let user = find(&api.list().await?, query)?;
                format.write(out, &MessageOutput::ok(user.id.clone()).with_id(user.id))
            }
        }
    }
}

/// Find a user by exact id, username, email or a unique id prefix.
fn find(users: &[User], query: &str) -> Result<User, CliError> {
    let exact = users
        .iter()
        .find(|u| u.id == query || u.username == query || u.email.eq_ignore_ascii_case(query));
    if let Some(user) = exact {
        return Ok(user.clone());
    }
    let mut prefixed = users.iter().filter(|u| u.id.starts_with(query));
    match (prefixed.next(), prefixed.next()) {
        (Some(user), None) => Ok(user.clone()),
        (Some(_), Some(_)) => Err(CliError::Invalid(format!("ambiguous user id prefix: {query}"))),
        _ => Err(CliError::NotFound {
            kind: "user",
            id: query.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cvt_core::Role;

    fn user(id: &str, username: &str) -> User {
        User {
            id: id.into(),
            full_name: username.to_uppercase(),
            email: format!("{username}@example.com"),
            username: username.into(),
            role: Role::User,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn find_by_username_email_and_prefix() {
        let users = [user("65f0a1b2c3", "dana"), user("65f0ffee00", "noa")];
        assert_eq!(find(&users, "dana").unwrap().id, "65f0a1b2c3");
        assert_eq!(find(&users, "NOA@example.com").unwrap().id, "65f0ffee00");
        assert_eq!(find(&users, "65f0a").unwrap().username, "dana");
    }

    #[test]
    fn ambiguous_prefix_is_rejected() {
        let users = [user("65f0a1b2c3", "dana"), user("65f0ffee00", "noa")];
        assert!(matches!(find(&users, "65f0"), Err(CliError::Invalid(_))));
        assert!(matches!(find(&users, "zz"), Err(CliError::NotFound { .. })));
    }
}
