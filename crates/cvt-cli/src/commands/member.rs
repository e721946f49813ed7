//! Personnel command implementation.

use std::io::Write;

use cvt_core::forms::MemberForm;
use cvt_core::i18n::{Op, Subject};
use cvt_core::Member;

use super::{Context, or_keep};
use crate::cli::{MemberArgs, MemberCommands};
use crate::error::CliError;
use crate::output::{MemberRow, MemberTable, OutputFormat};

/// Handler for member subcommands.
pub struct MemberCommand<'a> {
    ctx: &'a Context,
}

impl<'a> MemberCommand<'a> {
    /// Creates a new member command handler.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Executes the member subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &MemberCommands,
    ) -> Result<(), CliError> {
        let client = self.ctx.client();
        match command {
            MemberCommands::List => {
                let (members_api, teams_api) = (client.members(), client.teams());
                let (members, teams) = tokio::try_join!(members_api.list(), teams_api.list())?;
                let rows = members
                    .iter()
                    .map(|m| MemberRow::resolve(m, &teams, self.ctx.lang()))
                    .collect();
                format.write(out, &MemberTable(rows))
            }
            MemberCommands::Get { id } => {
                let (members_api, teams_api) = (client.members(), client.teams());
                let (member, teams) = tokio::try_join!(members_api.get(id), teams_api.list())?;
                format.write(out, &MemberRow::resolve(&member, &teams, self.ctx.lang()))
            }
            MemberCommands::Add(fields) => {
                let form = merge(fields, None);
                let result = client.members().create(&form).await;
                self.ctx.report(Subject::Member, Op::Create, result)?;
                format.write(out, &self.ctx.done(Subject::Member, Op::Create))
            }
            MemberCommands::Update { id, fields } => {
                let current = client.members().get(id).await?;
                let form = merge(fields, Some(&current));
                let result = client.members().update(id, &form).await;
                self.ctx.report(Subject::Member, Op::Update, result)?;
                format.write(out, &self.ctx.done(Subject::Member, Op::Update).with_id(id))
            }
            MemberCommands::Remove { id } => {
                let result = client.members().delete(id).await;
                self.ctx.report(Subject::Member, Op::Delete, result)?;
                format.write(out, &self.ctx.done(Subject::Member, Op::Delete).with_id(id))
            }
        }
    }
}

/// Fill the dialog from `fields`, keeping `current` values for omitted ones.
fn merge(fields: &MemberArgs, current: Option<&Member>) -> MemberForm {
    let base = current.map_or_else(MemberForm::default, |m| MemberForm {
        name: m.name.clone(),
        email: m.email.clone(),
        phone_num: m.phone_num.clone(),
        ad: m.ad.clone(),
        rank: m.rank,
        team: m.team.clone(),
        leave_date: m.leave_date,
    });
    MemberForm {
        name: or_keep(fields.name.as_ref(), &base.name),
        email: or_keep(fields.email.as_ref(), &base.email),
        phone_num: or_keep(fields.phone.as_ref(), &base.phone_num),
        ad: or_keep(fields.ad.as_ref(), &base.ad),
        rank: fields.rank.or(base.rank),
        team: or_keep(fields.team.as_ref(), &base.team),
        leave_date: fields.leave_date.or(base.leave_date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cvt_core::Rank;

    fn existing() -> Member {
        Member {
            id: "m-1".into(),
            name: "Dana Levi".into(),
            email: "dana@example.com".into(),
            phone_num: "050-1234567".into(),
            ad: "1234567".into(),
            rank: Some(Rank::Sergeant),
            team: "Ops".into(),
            leave_date: NaiveDate::from_ymd_opt(2027, 3, 1),
        }
    }

    #[test]
    fn update_keeps_omitted_fields() {
        let fields = MemberArgs {
            team: Some("Infra".into()),
            rank: Some(Rank::StaffSergeant),
            ..MemberArgs::default()
        };
        let form = merge(&fields, Some(&existing()));
        assert_eq!(form.team, "Infra");
        assert_eq!(form.rank, Some(Rank::StaffSergeant));
        assert_eq!(form.name, "Dana Levi");
        assert_eq!(form.leave_date, NaiveDate::from_ymd_opt(2027, 3, 1));
        assert!(form.validate().is_ok());
    }

    #[test]
    fn add_without_fields_fails_validation() {
        let form = merge(&MemberArgs::default(), None);
        let errors = form.validate().unwrap_err();
        assert!(errors.has_field("name"));
        assert!(errors.has_field("rank"));
    }
}
