//! Team command implementation.

use std::io::Write;

use cvt_client::People;
use cvt_core::forms::TeamForm;
use cvt_core::i18n::{Op, Subject};

use super::Context;
use crate::cli::TeamCommands;
use crate::error::CliError;
use crate::output::{OutputFormat, TeamRow, TeamTable};

/// Handler for team subcommands.
pub struct TeamCommand<'a> {
    ctx: &'a Context,
}

impl<'a> TeamCommand<'a> {
    /// Creates a new team command handler.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Executes the team subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &TeamCommands,
    ) -> Result<(), CliError> {
        let client = self.ctx.client();
        match command {
            TeamCommands::List => {
                let people = People::new(client.clone());
                people.load().await;
                if let Some(err) = people.teams().error() {
                    return Err(CliError::Config(format!("team list unavailable: {err}")));
                }
                let rows = people
                    .team_member_counts()
                    .into_iter()
                    .map(TeamRow::from)
                    .collect();
                format.write(out, &TeamTable(rows))
            }
            TeamCommands::Add { name, lead } => {
                let form = TeamForm {
                    name: name.clone(),
                    team_lead: lead.clone(),
                };
                let result = client.teams().create(&form).await;
                self.ctx.report(Subject::Team, Op::Create, result)?;
                format.write(out, &self.ctx.done(Subject::Team, Op::Create))
            }
            TeamCommands::Update { id, name, lead } => {
                let current = client.teams().get(id).await?;
                let form = TeamForm {
                    name: name.clone().unwrap_or(current.name),
                    team_lead: lead.clone().or(current.team_lead),
                };
                let result = client.teams().update(id, &form).await;
                self.ctx.report(Subject::Team, Op::Update, result)?;
                format.write(out, &self.ctx.done(Subject::Team, Op::Update).with_id(id))
            }
            TeamCommands::Remove { id } => {
                let result = client.teams().delete(id).await;
                self.ctx.report(Subject::Team, Op::Delete, result)?;
                format.write(out, &self.ctx.done(Subject::Team, Op::Delete).with_id(id))
            }
        }
    }
}
