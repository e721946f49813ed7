//! Dashboard: navigation entries and team overview.

use std::io::Write;

use cvt_client::People;
use cvt_core::i18n;
use tracing::warn;

use super::Context;
use crate::error::CliError;
use crate::output::{DashboardView, OutputFormat, TeamRow};

/// Handler for the dashboard command.
pub struct DashboardCommand<'a> {
    ctx: &'a Context,
}

impl<'a> DashboardCommand<'a> {
    /// Creates a new dashboard handler.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Render the dashboard.
    ///
    /// # Errors
    ///
    /// Returns error if writing fails. Failed reference lists only log.
    pub async fn execute<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let session = self.ctx.session();
        let lang = self.ctx.lang();

        let mut teams = Vec::new();
        if session.user().is_some() {
            let people = People::new(self.ctx.client().clone());
            people.load().await;
            if let Some(err) = people.teams().error() {
                warn!(error = err, "team list unavailable");
            }
            teams = people
                .team_member_counts()
                .into_iter()
                .map(TeamRow::from)
                .collect();
        }

        let view = DashboardView {
            user: session.user().map(|u| u.username),
            navigation: session.navigation(lang),
            teams,
            locked_hint: i18n::locked_hint(lang),
        };
        format.write(out, &view)
    }
}
