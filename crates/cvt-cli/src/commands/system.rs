//! Systems catalog command implementation.

use std::io::Write;

use cvt_core::System;
use cvt_core::forms::SystemForm;
use cvt_core::i18n::{Op, Subject};

use super::{Context, or_keep, read_upload};
use crate::cli::{SystemArgs, SystemCommands};
use crate::error::CliError;
use crate::output::OutputFormat;

/// Handler for system subcommands.
pub struct SystemCommand<'a> {
    ctx: &'a Context,
}

impl<'a> SystemCommand<'a> {
    /// Creates a new system command handler.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Executes the system subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &SystemCommands,
    ) -> Result<(), CliError> {
        let api = self.ctx.client().systems();
        match command {
            SystemCommands::List => format.write(out, &api.list().await?),
            SystemCommands::Add(fields) => {
                let form = merge(fields, None)?;
                self.ctx.report(Subject::System, Op::Create, api.create(&form).await)?;
                format.write(out, &self.ctx.done(Subject::System, Op::Create))
            }
            SystemCommands::Update { id, fields } => {
                let current = api
                    .list()
                    .await?
                    .into_iter()
                    .find(|s| s.id == *id)
                    .ok_or_else(|| CliError::NotFound {
                        kind: "system",
                        id: id.clone(),
                    })?;
                let form = merge(fields, Some(&current))?;
                self.ctx.report(Subject::System, Op::Update, api.update(id, &form).await)?;
                format.write(out, &self.ctx.done(Subject::System, Op::Update).with_id(id))
            }
            SystemCommands::Remove { id } => {
                self.ctx.report(Subject::System, Op::Delete, api.delete(id).await)?;
                format.write(out, &self.ctx.done(Subject::System, Op::Delete).with_id(id))
            }
        }
    }
}

fn merge(fields: &SystemArgs, current: Option<&System>) -> Result<SystemForm, CliError> {
    let image = fields.image.as_deref().map(read_upload).transpose()?;
    let empty = String::new();
    let (title, description) = current.map_or((&empty, &empty), |s| (&s.title, &s.description));
    let contacts = match current {
        Some(s) if fields.contacts.is_empty() => s.contacts.clone(),
        _ => fields.contacts.clone(),
    };
    Ok(SystemForm {
        title: or_keep(fields.title.as_ref(), title),
        description: or_keep(fields.description.as_ref(), description),
        contacts,
        image,
    })
}
