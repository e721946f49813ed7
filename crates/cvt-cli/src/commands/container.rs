//! Container command implementation.
//!
//! Lifecycle actions and log viewing go through a [`ContainerConsole`], so
//! the same gating applies as in the interactive viewer: no actions while a
//! build runs, none without a runtime id, one action at a time.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cvt_client::{ContainerConsole, Notification, Notifier, TracingNotifier};
use cvt_core::forms::ContainerForm;
use cvt_core::i18n::{self, Op, Subject};
use cvt_core::{Action, BuildLog, ContainerRecord, ContainerState};
use tracing::{info, warn};

use super::{Context, read_upload};
use crate::cli::{ContainerCommands, CreateContainerArgs, LogsArgs};
use crate::error::CliError;
use crate::notify::TerminalNotifier;
use crate::output::{LogView, MessageOutput, OutputFormat, StateView, write_transcript_line};

/// How long an action waits for the first state poll.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Handler for container subcommands.
pub struct ContainerCommand<'a> {
    ctx: &'a Context,
}

impl<'a> ContainerCommand<'a> {
    /// Creates a new container command handler.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Executes the container subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &ContainerCommands,
    ) -> Result<(), CliError> {
        match command {
            ContainerCommands::List { watch: false } => {
                format.write(out, &self.ctx.client().containers().list().await?)
            }
            ContainerCommands::List { watch: true } => self.watch(out, format).await,
            ContainerCommands::Create(args) => self.create(out, format, args).await,
            ContainerCommands::State { id } => self.state(out, format, id).await,
            ContainerCommands::Start { id } => self.action(out, format, Action::Start, id).await,
            ContainerCommands::Stop { id } => self.action(out, format, Action::Stop, id).await,
            ContainerCommands::Restart { id } => self.action(out, format, Action::Restart, id).await,
            ContainerCommands::Remove { id } => self.action(out, format, Action::Remove, id).await,
            ContainerCommands::Logs(args) => {
                let record = self.resolve(&args.id).await?;
                self.logs(out, format, record, args).await
            }
        }
    }

    async fn watch<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let containers = self.ctx.client().containers();
        let period = self.ctx.client().config().list_poll_interval;
        loop {
            match containers.refetch().await {
                Ok(records) => {
                    if !format.is_json() {
                        writeln!(out, "── {} ──", chrono::Local::now().format("%H:%M:%S"))?;
                    }
                    format.write(out, &records)?;
                    out.flush()?;
                }
                Err(e) => warn!(error = %e, "container list refresh failed"),
            }
            tokio::select! {
                _ = tokio::signal::ctrl_c() => return Ok(()),
                () = tokio::time::sleep(period) => {}
            }
        }
    }

    async fn create<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &CreateContainerArgs,
    ) -> Result<(), CliError> {
        let mut form = ContainerForm::new();
        form.project_id.clone_from(&args.project);
        form.name.clone_from(&args.name);
        form.image.clone_from(&args.image);
        form.environment_variables.clone_from(&args.env_vars);
        form.host_port.clone_from(&args.port);
        form.content = vec![read_upload(&args.file)?];

        let containers = self.ctx.client().containers();
        self.ctx
            .report(Subject::Container, Op::Create, containers.create(&form).await)?;
        self.ctx
            .report(Subject::Container, Op::Build, containers.build(&form).await)?;
        info!(build_id = %form.build_id, "container build started");

        if !args.follow {
            return format.write(
                out,
                &self.ctx.done(Subject::Container, Op::Build).with_id(&form.build_id),
            );
        }
        let record = containers
            .refetch()
            .await?
            .into_iter()
            .find(|r| r.build_id == form.build_id)
            .ok_or_else(|| CliError::NotFound {
                kind: "container",
                id: form.build_id.clone(),
            })?;
        let follow = LogsArgs {
            id: record.id.clone(),
            follow: true,
            wait: 0,
            export: None,
        };
        self.logs(out, format, record, &follow).await
    }

    async fn state<W: Write>(&self, out: &mut W, format: &OutputFormat, query: &str) -> Result<(), CliError> {
        let record = self.resolve(query).await?;
        let runtime_id = runtime_id(&record)?;
        let raw = self.ctx.client().containers().state(&runtime_id).await?;
        let label = i18n::state_label(self.ctx.lang(), ContainerState::from_wire(&raw))
            .map_or_else(|| raw.clone(), str::to_string);
        format.write(
            out,
            &StateView {
                runtime_id,
                state: raw,
                label,
            },
        )
    }

    async fn action<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        action: Action,
        query: &str,
    ) -> Result<(), CliError> {
        let record = self.resolve(query).await?;
        let runtime_id = runtime_id(&record)?;
        let console = self.open(record);
        let settled = console.wait_until(|log| log.state().is_recognized() || log.building());
        if tokio::time::timeout(SETTLE_TIMEOUT, settled).await.is_err() {
            warn!(runtime_id, "container state still unknown");
        }
        console.run_action(action).await?;
        console.close();
        format.write(
            out,
            &MessageOutput::ok(i18n::action_result(self.ctx.lang(), action, true)).with_id(runtime_id),
        )
    }

    async fn logs<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        record: ContainerRecord,
        args: &LogsArgs,
    ) -> Result<(), CliError> {
        let console = self.open(record);
        if args.follow {
            follow(&console, out, format).await?;
        } else {
            let collect = async {
                console.wait_until(BuildLog::connected).await;
                console.wait_until(|log| !log.connected()).await;
            };
            let _ = tokio::time::timeout(Duration::from_secs(args.wait), collect).await;
            console.stop_tailing();
            format.write(out, &console.with_log(LogView::capture))?;
        }
        console.close();

        if let Some(path) = &args.export {
            let log = console.snapshot();
            let path = if path == Path::new("-") {
                PathBuf::from(log.export_file_name())
            } else {
                path.clone()
            };
            std::fs::write(&path, log.export())?;
            TerminalNotifier.notify(Notification::info(format!("transcript saved to {}", path.display())));
        }
        Ok(())
    }

    fn open(&self, record: ContainerRecord) -> ContainerConsole {
        ContainerConsole::open(self.ctx.client().clone(), record, Arc::new(TracingNotifier))
    }

    /// Find a record by id, build id, name or runtime id (prefix allowed).
    async fn resolve(&self, query: &str) -> Result<ContainerRecord, CliError> {
        let records = self.ctx.client().containers().refetch().await?;
        find(records, query).ok_or_else(|| CliError::NotFound {
            kind: "container",
            id: query.to_string(),
        })
    }
}

/// Print transcript lines as they arrive until interrupted.
async fn follow<W: Write>(console: &ContainerConsole, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
    let mut changes = console.subscribe();
    let mut printed = 0;
    loop {
        let fresh = console.with_log(|log| log.transcript().get(printed..).map(<[_]>::to_vec).unwrap_or_default());
        for line in &fresh {
            if format.is_json() {
                serde_json::to_writer(&mut *out, line)?;
                writeln!(out)?;
            } else {
                write_transcript_line(out, line)?;
            }
        }
        printed += fresh.len();
        out.flush()?;

        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            changed = changes.changed() => if changed.is_err() || !console.is_open() {
                return Ok(());
            },
        }
    }
}

fn runtime_id(record: &ContainerRecord) -> Result<String, CliError> {
    record
        .runtime_id()
        .map(str::to_string)
        .ok_or_else(|| CliError::Invalid(format!("{} has no runtime id yet", record.display_name())))
}

fn find(records: Vec<ContainerRecord>, query: &str) -> Option<ContainerRecord> {
    let exact = records.iter().position(|r| {
        r.id == query || r.build_id == query || r.name == query || r.runtime_id() == Some(query)
    });
    if let Some(at) = exact {
        return records.into_iter().nth(at);
    }
    let mut prefixed = records
        .into_iter()
        .filter(|r| r.runtime_id().is_some_and(|id| id.starts_with(query)));
    match (prefixed.next(), prefixed.next()) {
        (Some(record), None) => Some(record),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, runtime: Option<&str>) -> ContainerRecord {
        ContainerRecord {
            id: id.into(),
            container_id: runtime.map(str::to_string),
            name: name.into(),
            image: "alpine".into(),
            host_port: "8080".into(),
            environment_variables: Vec::new(),
            state: ContainerState::Unknown,
            build_id: format!("b-{id}"),
            project_id: "sw-1".into(),
        }
    }

    #[test]
    fn find_matches_ids_names_and_prefixes() {
        let records = vec![
            record("rec-1", "api", Some("abc123def456")),
            record("rec-2", "web", Some("abd999000111")),
        ];
        assert_eq!(find(records.clone(), "web").unwrap().id, "rec-2");
        assert_eq!(find(records.clone(), "b-rec-1").unwrap().id, "rec-1");
        assert_eq!(find(records.clone(), "abc1").unwrap().id, "rec-1");
        assert!(find(records.clone(), "ab").is_none());
        assert!(find(records, "zzz").is_none());
    }

    #[test]
    fn records_without_runtime_id_cannot_be_controlled() {
        let err = runtime_id(&record("rec-1", "api", Some(""))).unwrap_err();
        assert!(err.to_string().contains("api has no runtime id"));
    }
}
