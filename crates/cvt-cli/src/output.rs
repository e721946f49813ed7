//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use chrono::{DateTime, Utc};
use cvt_core::build_log::LineKind;
use cvt_core::{
    BuildLog, ContainerRecord, Guides, Lang, Member, NavEntry, Software, System, Team, TranscriptLine,
    User, i18n,
};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

// ============================================================================
// Messages
// ============================================================================

/// Outcome of a mutation.
#[derive(Debug, Clone, Serialize)]
pub struct MessageOutput {
    /// Whether the command succeeded.
    pub success: bool,
    /// Localized message.
    pub message: String,
    /// Related identifier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MessageOutput {
    /// A success message.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: None,
        }
    }

    /// Attach an identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl TableDisplay for MessageOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let mark = if self.success { "✓" } else { "✗" };
        writeln!(writer, "{mark} {}", self.message)?;
        if let Some(id) = &self.id {
            writeln!(writer, "  ID: {id}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Identity and navigation
// ============================================================================

impl TableDisplay for User {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "User: {}", self.username)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "ID:        {}", self.id)?;
        writeln!(writer, "Name:      {}", self.full_name)?;
        writeln!(writer, "Email:     {}", self.email)?;
        writeln!(writer, "Role:      {}", self.role.as_str())?;
        writeln!(writer, "Active:    {}", if self.active { "yes" } else { "no" })?;
        writeln!(writer, "Joined:    {}", self.created_at.format("%Y-%m-%d"))?;
        Ok(())
    }
}

/// Dashboard overview: who is signed in, where they may go, team sizes.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    /// Signed-in username.
    pub user: Option<String>,
    /// Navigation entries.
    pub navigation: Vec<NavEntry>,
    /// Teams with member counts.
    pub teams: Vec<TeamRow>,
    /// Tooltip shown on locked entries.
    #[serde(skip)]
    pub locked_hint: &'static str,
}

impl TableDisplay for DashboardView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match &self.user {
            Some(name) => writeln!(writer, "Signed in as {name}")?,
            None => writeln!(writer, "Not signed in")?,
        }
        writeln!(writer)?;
        writeln!(writer, "Pages")?;
        writeln!(writer, "══════════════════════════════════")?;
        for entry in &self.navigation {
            if entry.locked {
                writeln!(writer, "  🔒 {:<24} ({})", entry.label, self.locked_hint)?;
            } else {
                writeln!(writer, "  {:<27} {}", entry.label, entry.route.path())?;
            }
        }
        if !self.teams.is_empty() {
            writeln!(writer)?;
            write_team_rows(writer, &self.teams)?;
        }
        Ok(())
    }
}

// ============================================================================
// Personnel
// ============================================================================

/// A member with team, rank and date resolved for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRow {
    /// Member ID.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone_num: String,
    /// Personal number.
    pub ad: String,
    /// Rank label or the unknown label.
    pub rank: String,
    /// Team name or the unknown label when no team carries it.
    pub team: String,
    /// Release date or the unknown label.
    pub leave_date: String,
}

impl MemberRow {
    /// Resolve `member` against the known `teams`.
    #[must_use]
    pub fn resolve(member: &Member, teams: &[Team], lang: Lang) -> Self {
        let unknown = i18n::unknown_label(lang);
        let rank = member.rank.map_or_else(
            || unknown.to_string(),
            |rank| match lang {
                Lang::He => rank.as_str().to_string(),
                Lang::En => rank.english().to_string(),
            },
        );
        let team = if cvt_core::people::has_known_team(member, teams) {
            member.team.clone()
        } else {
            unknown.to_string()
        };
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
            email: member.email.clone(),
            phone_num: member.phone_num.clone(),
            ad: member.ad.clone(),
            rank,
            team,
            leave_date: member
                .leave_date
                .map_or_else(|| unknown.to_string(), |d| d.format("%d/%m/%Y").to_string()),
        }
    }
}

/// Personnel table.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct MemberTable(pub Vec<MemberRow>);

impl TableDisplay for MemberTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.0.is_empty() {
            writeln!(writer, "No members found.")?;
            return Ok(());
        }
        writeln!(
            writer,
            "{:<26} {:<22} {:<9} {:<14} {:<16} {:<12}",
            "ID", "NAME", "AD", "RANK", "TEAM", "LEAVE"
        )?;
        writeln!(writer, "{}", "─".repeat(104))?;
        for row in &self.0 {
            writeln!(
                writer,
                "{:<26} {:<22} {:<9} {:<14} {:<16} {:<12}",
                truncate(&row.id, 26),
                truncate(&row.name, 22),
                row.ad,
                truncate(&row.rank, 14),
                truncate(&row.team, 16),
                row.leave_date
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} member(s)", self.0.len())?;
        Ok(())
    }
}

impl TableDisplay for MemberRow {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Member: {}", self.name)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "ID:         {}", self.id)?;
        writeln!(writer, "Email:      {}", self.email)?;
        writeln!(writer, "Phone:      {}", self.phone_num)?;
        writeln!(writer, "AD:         {}", self.ad)?;
        writeln!(writer, "Rank:       {}", self.rank)?;
        writeln!(writer, "Team:       {}", self.team)?;
        writeln!(writer, "Leave date: {}", self.leave_date)?;
        Ok(())
    }
}

/// A team with its member count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRow {
    /// Team ID.
    pub id: String,
    /// Team name.
    pub name: String,
    /// Team lead reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_lead: Option<String>,
    /// Members whose team field equals the name.
    pub members: usize,
}

impl From<(Team, usize)> for TeamRow {
    fn from((team, members): (Team, usize)) -> Self {
        Self {
            id: team.id,
            name: team.name,
            team_lead: team.team_lead,
            members,
        }
    }
}

/// Team table.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct TeamTable(pub Vec<TeamRow>);

impl TableDisplay for TeamTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.0.is_empty() {
            writeln!(writer, "No teams found.")?;
            return Ok(());
        }
        write_team_rows(writer, &self.0)
    }
}

fn write_team_rows<W: Write>(writer: &mut W, rows: &[TeamRow]) -> Result<(), CliError> {
    writeln!(writer, "{:<26} {:<24} {:<16} {:>8}", "ID", "TEAM", "LEAD", "MEMBERS")?;
    writeln!(writer, "{}", "─".repeat(77))?;
    for row in rows {
        writeln!(
            writer,
            "{:<26} {:<24} {:<16} {:>8}",
            truncate(&row.id, 26),
            truncate(&row.name, 24),
            truncate(row.team_lead.as_deref().unwrap_or("-"), 16),
            row.members
        )?;
    }
    writeln!(writer)?;
    writeln!(writer, "Total: {} team(s)", rows.len())?;
    Ok(())
}

// ============================================================================
// Catalog
// ============================================================================

impl TableDisplay for Vec<Software> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "No software found.")?;
            return Ok(());
        }
        writeln!(writer, "{:<26} {:<24} {:<36} CONTACTS", "ID", "TITLE", "URL")?;
        writeln!(writer, "{}", "─".repeat(104))?;
        for sw in self {
            writeln!(
                writer,
                "{:<26} {:<24} {:<36} {}",
                truncate(&sw.id, 26),
                truncate(&sw.title, 24),
                truncate(&sw.url, 36),
                sw.contacts.join(", ")
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} software entr{}", self.len(), plural_y(self.len()))?;
        Ok(())
    }
}

impl TableDisplay for Vec<System> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "No systems found.")?;
            return Ok(());
        }
        for system in self {
            writeln!(writer, "{} ({})", system.title, system.id)?;
            if !system.description.is_empty() {
                writeln!(writer, "  {}", truncate(&system.description, 96))?;
            }
            for contact in &system.contacts {
                writeln!(
                    writer,
                    "  • {:<20} {:<28} {}",
                    truncate(&contact.name, 20),
                    truncate(&contact.email, 28),
                    contact.phone_num
                )?;
            }
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} system(s)", self.len())?;
        Ok(())
    }
}

impl TableDisplay for Vec<User> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "No users found.")?;
            return Ok(());
        }
        writeln!(
            writer,
            "{:<12} {:<16} {:<22} {:<28} {:<6} {:<6}",
            "ID", "USERNAME", "NAME", "EMAIL", "ROLE", "ACTIVE"
        )?;
        writeln!(writer, "{}", "─".repeat(96))?;
        for user in self {
            writeln!(
                writer,
                "{:<12} {:<16} {:<22} {:<28} {:<6} {:<6}",
                short_id(&user.id),
                truncate(&user.username, 16),
                truncate(&user.full_name, 22),
                truncate(&user.email, 28),
                user.role.as_str(),
                if user.active { "yes" } else { "no" }
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} user(s)", self.len())?;
        Ok(())
    }
}

impl TableDisplay for Guides {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.files.is_empty() {
            writeln!(writer, "No guide files found.")?;
            return Ok(());
        }
        writeln!(writer, "{:<26} {:<40} {:>10} {:<10}", "ID", "NAME", "SIZE", "UPLOADED")?;
        writeln!(writer, "{}", "─".repeat(89))?;
        for file in &self.files {
            writeln!(
                writer,
                "{:<26} {:<40} {:>10} {:<10}",
                truncate(&file.id, 26),
                truncate(&file.original_name, 40),
                human_size(file.size),
                file.uploaded_at.format("%Y-%m-%d")
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} file(s)", self.total)?;
        Ok(())
    }
}

// ============================================================================
// Containers
// ============================================================================

impl TableDisplay for Vec<ContainerRecord> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.is_empty() {
            writeln!(writer, "No containers found.")?;
            return Ok(());
        }
        writeln!(
            writer,
            "{:<26} {:<20} {:<14} {:<16} {:<8} {:<10}",
            "ID", "NAME", "RUNTIME", "IMAGE", "PORT", "STATE"
        )?;
        writeln!(writer, "{}", "─".repeat(99))?;
        for record in self {
            writeln!(
                writer,
                "{:<26} {:<20} {:<14} {:<16} {:<8} {:<10}",
                truncate(&record.id, 26),
                truncate(record.display_name(), 20),
                record.runtime_id().map_or("-", short_id),
                truncate(&record.image, 16),
                record.host_port,
                record.state
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} container(s)", self.len())?;
        Ok(())
    }
}

/// Lifecycle state of one container.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    /// Runtime id.
    pub runtime_id: String,
    /// Raw backend value.
    pub state: String,
    /// Localized badge.
    pub label: String,
}

impl TableDisplay for StateView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}: {}", short_id(&self.runtime_id), self.label)?;
        Ok(())
    }
}

/// Transcript of the log viewer.
#[derive(Debug, Clone, Serialize)]
pub struct LogView {
    /// Container name or build id.
    pub target: String,
    /// Status badge.
    pub status: String,
    /// Footer label.
    pub footer: String,
    /// Collected lines.
    pub lines: Vec<TranscriptLine>,
}

impl LogView {
    /// Capture the viewer state.
    #[must_use]
    pub fn capture(log: &BuildLog) -> Self {
        Self {
            target: log.target().to_string(),
            status: log.status_badge(),
            footer: i18n::footer(log.lang(), log.footer_status()).to_string(),
            lines: log.transcript().to_vec(),
        }
    }
}

impl TableDisplay for LogView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{} [{}]", self.target, self.status)?;
        writeln!(writer, "{}", "─".repeat(60))?;
        for line in &self.lines {
            write_transcript_line(writer, line)?;
        }
        writeln!(writer, "{}", "─".repeat(60))?;
        writeln!(writer, "{}", self.footer)?;
        Ok(())
    }
}

/// One transcript line with its receive time.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_transcript_line<W: Write>(writer: &mut W, line: &TranscriptLine) -> Result<(), CliError> {
    let marker = match line.kind {
        LineKind::Output => ' ',
        LineKind::Status => '*',
    };
    writeln!(writer, "[{}]{marker}{}", clock(&line.at), line.text)?;
    Ok(())
}

fn clock(at: &DateTime<Utc>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// Truncate to `max_len` characters, marking the cut with `...`.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

/// First twelve characters of an id, the way docker prints them.
fn short_id(id: &str) -> &str {
    id.char_indices().nth(12).map_or(id, |(at, _)| &id[..at])
}

const fn plural_y(n: usize) -> &'static str {
    if n == 1 { "y" } else { "ies" }
}

#[allow(clippy::cast_precision_loss)]
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cvt_core::{ContainerState, Rank};

    fn member(team: &str, rank: Option<Rank>, leave: Option<NaiveDate>) -> Member {
        Member {
            id: "m-1".into(),
            name: "Dana Levi".into(),
            email: "dana@example.com".into(),
            phone_num: "050-1234567".into(),
            ad: "1234567".into(),
            rank,
            team: team.into(),
            leave_date: leave,
        }
    }

    fn team(name: &str) -> Team {
        Team {
            id: format!("t-{name}"),
            name: name.into(),
            team_lead: None,
        }
    }

    #[test]
    fn member_row_marks_unknown_fields() {
        let row = MemberRow::resolve(&member("Ghosts", None, None), &[team("Ops")], Lang::En);
        assert_eq!(row.team, "unknown");
        assert_eq!(row.rank, "unknown");
        assert_eq!(row.leave_date, "unknown");
    }

    #[test]
    fn member_row_keeps_known_fields() {
        let row = MemberRow::resolve(
            &member("Ops", Some(Rank::Captain), NaiveDate::from_ymd_opt(2027, 3, 1)),
            &[team("Ops")],
            Lang::He,
        );
        assert_eq!(row.team, "Ops");
        assert_eq!(row.rank, "סרן");
        assert_eq!(row.leave_date, "01/03/2027");
    }

    #[test]
    fn member_table_output() {
        let table = MemberTable(vec![MemberRow::resolve(
            &member("Ops", Some(Rank::Major), None),
            &[team("Ops")],
            Lang::En,
        )]);
        let output = OutputFormat::default().to_string(&table).unwrap();
        assert!(output.contains("Dana Levi"));
        assert!(output.contains("major"));
        assert!(output.contains("Total: 1 member(s)"));
    }

    #[test]
    fn empty_member_table() {
        let output = OutputFormat::default().to_string(&MemberTable(Vec::new())).unwrap();
        assert!(output.contains("No members found."));
    }

    #[test]
    fn team_table_json_is_a_plain_array() {
        let table = TeamTable(vec![TeamRow::from((team("Ops"), 3))]);
        let output = OutputFormat::new(Format::Json).to_string(&table).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["name"], "Ops");
        assert_eq!(parsed[0]["members"], 3);
    }

    #[test]
    fn container_table_shortens_runtime_id() {
        let record = ContainerRecord {
            id: "rec-1".into(),
            container_id: Some("abc123def4567890".into()),
            name: "api".into(),
            image: "alpine".into(),
            host_port: "8080".into(),
            environment_variables: Vec::new(),
            state: ContainerState::Running,
            build_id: "b-1".into(),
            project_id: "sw-1".into(),
        };
        let output = OutputFormat::default().to_string(&vec![record]).unwrap();
        assert!(output.contains("abc123def456 "));
        assert!(!output.contains("abc123def4567890"));
        assert!(output.contains("running"));
    }

    #[test]
    fn message_output_with_id() {
        let output = OutputFormat::default()
            .to_string(&MessageOutput::ok("done").with_id("b-1"))
            .unwrap();
        assert_eq!(output, "✓ done\n  ID: b-1\n");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("שלום עולם", 5), "של...");
        assert_eq!(truncate("hello", 3), "hel");
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
