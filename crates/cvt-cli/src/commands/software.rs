//! Software catalog command implementation.

use std::io::Write;

use cvt_core::forms::SoftwareForm;
use cvt_core::i18n::{Op, Subject};
use cvt_core::Software;

use super::{Context, or_keep, read_upload};
use crate::cli::{SoftwareArgs, SoftwareCommands};
use crate::error::CliError;
use crate::output::OutputFormat;

/// Handler for software subcommands.
pub struct SoftwareCommand<'a> {
    ctx: &'a Context,
}

impl<'a> SoftwareCommand<'a> {
    /// Creates a new software command handler.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Executes the software subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &SoftwareCommands,
    ) -> Result<(), CliError> {
        let api = self.ctx.client().software();
        match command {
            SoftwareCommands::List => format.write(out, &api.list().await?),
            SoftwareCommands::Add(fields) => {
                let form = merge(fields, None)?;
                self.ctx.report(Subject::Software, Op::Create, api.create(&form).await)?;
                format.write(out, &self.ctx.done(Subject::Software, Op::Create))
            }
            SoftwareCommands::Update { id, fields } => {
                let current = api
                    .list()
                    .await?
                    .into_iter()
                    .find(|s| s.id == *id)
                    .ok_or_else(|| CliError::NotFound {
                        kind: "software",
                        id: id.clone(),
                    })?;
                let form = merge(fields, Some(&current))?;
                self.ctx.report(Subject::Software, Op::Update, api.update(id, &form).await)?;
                format.write(out, &self.ctx.done(Subject::Software, Op::Update).with_id(id))
            }
            SoftwareCommands::Remove { id } => {
                self.ctx.report(Subject::Software, Op::Delete, api.delete(id).await)?;
                format.write(out, &self.ctx.done(Subject::Software, Op::Delete).with_id(id))
            }
        }
    }
}

fn merge(fields: &SoftwareArgs, current: Option<&Software>) -> Result<SoftwareForm, CliError> {
    let image = fields.image.as_deref().map(read_upload).transpose()?;
    Ok(match current {
        None => SoftwareForm {
            title: fields.title.clone().unwrap_or_default(),
            description: fields.description.clone().unwrap_or_default(),
            url: fields.url.clone().unwrap_or_default(),
            contacts: fields.contacts.clone(),
            image,
        },
        Some(sw) => SoftwareForm {
            title: or_keep(fields.title.as_ref(), &sw.title),
            description: or_keep(fields.description.as_ref(), &sw.description),
            url: or_keep(fields.url.as_ref(), &sw.url),
            contacts: if fields.contacts.is_empty() {
                sw.contacts.clone()
            } else {
                fields.contacts.clone()
            },
            image,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_replaces_contacts_only_when_given() {
        let current = Software {
            id: "sw-1".into(),
            title: "Radar UI".into(),
            description: "Operator console".into(),
            url: "https://radar.example.com".into(),
            contacts: vec!["ops@example.com".into()],
            image_id: "img-1".into(),
        };
        let kept = merge(&SoftwareArgs::default(), Some(&current)).unwrap();
        assert_eq!(kept.contacts, ["ops@example.com"]);
        assert_eq!(kept.title, "Radar UI");
        assert!(kept.validate_edit().is_ok());

        let fields = SoftwareArgs {
            contacts: vec!["noc@example.com".into()],
            ..SoftwareArgs::default()
        };
        let replaced = merge(&fields, Some(&current)).unwrap();
        assert_eq!(replaced.contacts, ["noc@example.com"]);
    }

    #[test]
    fn create_requires_an_image() {
        let fields = SoftwareArgs {
            title: Some("Radar UI".into()),
            description: Some("Operator console".into()),
            url: Some("https://radar.example.com".into()),
            contacts: vec!["ops@example.com".into()],
            image: None,
        };
        let form = merge(&fields, None).unwrap();
        assert!(form.validate_create().unwrap_err().has_field("image"));
    }

    #[test]
    fn unreadable_image_is_reported() {
        let fields = SoftwareArgs {
            image: Some("/nonexistent/home.png".into()),
            ..SoftwareArgs::default()
        };
        assert!(matches!(merge(&fields, None), Err(CliError::Config(_))));
    }
}
