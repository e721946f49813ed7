//! Container build/log viewer state machine.
//!
//! [`BuildLog`] folds the events of one log subscription into a transcript
//! plus a handful of flags (connected, building, running, lifecycle state,
//! runtime id). It performs no I/O: state reconciliation is requested by
//! returning [`Effect::Reconcile`] and the caller decides when to fetch.
//!
//! ```text
//!   Idle ──open──► Connecting ──[BUILD_START]──► Building
//!                      │                            │
//!                      │                  [BUILD_COMPLETE] / [BUILD_ERROR]
//!                      ▼                            ▼
//!               Settled(state) ◄──── state poll ────┘
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::controls::{Action, ControlGate};
use crate::error::Result;
use crate::i18n::{self, Lang};
use crate::types::{ContainerRecord, ContainerState};

/// Delay before reconciling after a completed build.
pub const BUILD_COMPLETE_RECONCILE: Duration = Duration::from_millis(1000);

/// Delay before reconciling after a container start or stop marker.
pub const CONTAINER_EVENT_RECONCILE: Duration = Duration::from_millis(500);

/// Characters of the runtime id shown in the transcript.
const SHORT_ID_LEN: usize = 12;

/// Marker prefix carrying the runtime container id.
const CONTAINER_ID_MARKER: &str = "ContainerId-";

/// Event delivered by a log subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The stream connected.
    Opened,
    /// One `data:` payload.
    Line(String),
    /// The transport failed.
    Error(String),
    /// The server ended the stream.
    Closed,
}

/// Out-of-band work requested by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the lifecycle state after the given delay.
    Reconcile(Duration),
}

/// Control lines emitted by the backend inside the log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentinel {
    /// `[BUILD_START]`
    BuildStart,
    /// `[BUILD_COMPLETE]`
    BuildComplete,
    /// `[BUILD_ERROR]`
    BuildError,
    /// `[CONTAINER_START]`
    ContainerStart,
    /// `[CONTAINER_STOP]`
    ContainerStop,
    /// `[CONTAINER_ERROR]`
    ContainerError,
    /// `[CONTAINER_ID]...` or `...ContainerId-<id>`; `None` when no id could be extracted.
    ContainerId(Option<String>),
}

impl Sentinel {
    /// Classify a trimmed line.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        match line {
            "[BUILD_START]" => return Some(Self::BuildStart),
            "[BUILD_COMPLETE]" => return Some(Self::BuildComplete),
            "[BUILD_ERROR]" => return Some(Self::BuildError),
            "[CONTAINER_START]" => return Some(Self::ContainerStart),
            "[CONTAINER_STOP]" => return Some(Self::ContainerStop),
            "[CONTAINER_ERROR]" => return Some(Self::ContainerError),
            _ => {}
        }
        if line.starts_with("[CONTAINER_ID]") || line.contains(CONTAINER_ID_MARKER) {
            return Some(Self::ContainerId(extract_container_id(line)));
        }
        None
    }
}

fn extract_container_id(line: &str) -> Option<String> {
    line.find(CONTAINER_ID_MARKER)
        .map(|at| &line[at + CONTAINER_ID_MARKER.len()..])
        .filter(|rest| !rest.is_empty())
        .or_else(|| line.split('-').nth(1))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn looks_like_build_output(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("building")
        || lower.contains("dockerfile")
        || line.contains("Step ")
        || line.contains("---> ")
}

/// A status note the viewer adds to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    /// Stream opened for the named target.
    Connecting(String),
    /// Build started.
    BuildStarted,
    /// Runtime id learned; carries the shortened id.
    ContainerId(String),
    /// Build finished.
    BuildComplete,
    /// Build failed.
    BuildFailed,
    /// Container is starting.
    ContainerStarting,
    /// Container stopped.
    ContainerStopped,
    /// Container reported an error.
    ContainerError,
    /// Build output detected without a start marker.
    BuildDetected,
    /// Stream dropped while a build ran.
    StreamLost,
    /// Tailing was stopped by the user.
    StoppedTailing,
}

/// Origin of a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Verbatim stream output.
    Output,
    /// Viewer status note.
    Status,
}

/// One transcript entry, timestamped on receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptLine {
    /// Receive time.
    pub at: DateTime<Utc>,
    /// Output or status note.
    pub kind: LineKind,
    /// Rendered text.
    pub text: String,
}

/// Coarse phase of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing known yet and no stream.
    Idle,
    /// Stream open, lifecycle state not yet known.
    Connecting,
    /// A build is running.
    Building,
    /// A recognized lifecycle state is known.
    Settled(ContainerState),
}

/// Banner shown above the controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    /// State not recognized and no build running.
    SearchingForUpdates,
    /// A build is running.
    BuildInProgress,
}

/// Footer status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterStatus {
    /// Building.
    Building,
    /// Running.
    Running,
    /// Stream connected.
    Connected,
    /// Stream not connected.
    Disconnected,
}

/// State of one container's log viewer.
#[derive(Debug, Clone)]
pub struct BuildLog {
    lang: Lang,
    target: String,
    transcript: Vec<TranscriptLine>,
    connected: bool,
    building: bool,
    running: bool,
    state: ContainerState,
    raw_state: String,
    runtime_id: Option<String>,
    in_flight: Option<String>,
}

impl BuildLog {
    /// A fresh viewer seeded from `record`.
    #[must_use]
    pub fn new(record: &ContainerRecord, lang: Lang) -> Self {
        let mut log = Self {
            lang,
            target: String::new(),
            transcript: Vec::new(),
            connected: false,
            building: false,
            running: false,
            state: ContainerState::Unknown,
            raw_state: String::new(),
            runtime_id: None,
            in_flight: None,
        };
        log.reset(record);
        log
    }

    /// Clear everything and re-seed the runtime id from `record`.
    pub fn reset(&mut self, record: &ContainerRecord) {
        self.target = record.display_name().to_string();
        self.transcript.clear();
        self.connected = false;
        self.building = false;
        self.running = false;
        self.state = ContainerState::Unknown;
        self.raw_state.clear();
        self.in_flight = None;
        self.runtime_id = record.runtime_id().map(str::to_string);
    }

    /// Fold one stream event into the state.
    pub fn apply(&mut self, event: StreamEvent) -> Vec<Effect> {
        match event {
            StreamEvent::Opened => {
                self.connected = true;
                let target = self.target.clone();
                self.note(Note::Connecting(target));
                Vec::new()
            }
            StreamEvent::Line(raw) => self.apply_line(&raw),
            StreamEvent::Error(reason) => {
                warn!(target = %self.target, %reason, "log stream error");
                self.disconnect();
                Vec::new()
            }
            StreamEvent::Closed => {
                debug!(target = %self.target, "log stream closed");
                self.disconnect();
                Vec::new()
            }
        }
    }

    fn disconnect(&mut self) {
        self.connected = false;
        if self.building {
            self.note(Note::StreamLost);
        }
    }

    fn apply_line(&mut self, raw: &str) -> Vec<Effect> {
        let line = raw.trim();
        if line.is_empty() {
            return Vec::new();
        }

        if let Some(sentinel) = Sentinel::parse(line) {
            return self.apply_sentinel(sentinel);
        }

        if !self.building && looks_like_build_output(line) {
            self.note(Note::BuildDetected);
            self.building = true;
            self.running = false;
        }
        self.push(LineKind::Output, line.to_string());
        Vec::new()
    }

    fn apply_sentinel(&mut self, sentinel: Sentinel) -> Vec<Effect> {
        match sentinel {
            Sentinel::BuildStart => {
                self.note(Note::BuildStarted);
                self.building = true;
                self.running = false;
                Vec::new()
            }
            Sentinel::ContainerId(Some(id)) => {
                let short: String = id.chars().take(SHORT_ID_LEN).collect();
                debug!(target = %self.target, container_id = %id, "runtime id captured");
                self.runtime_id = Some(id);
                self.note(Note::ContainerId(short));
                Vec::new()
            }
            Sentinel::ContainerId(None) => Vec::new(),
            Sentinel::BuildComplete => {
                self.note(Note::BuildComplete);
                self.building = false;
                vec![Effect::Reconcile(BUILD_COMPLETE_RECONCILE)]
            }
            Sentinel::BuildError => {
                self.note(Note::BuildFailed);
                self.building = false;
                Vec::new()
            }
            Sentinel::ContainerStart => {
                self.note(Note::ContainerStarting);
                vec![Effect::Reconcile(CONTAINER_EVENT_RECONCILE)]
            }
            Sentinel::ContainerStop => {
                self.note(Note::ContainerStopped);
                self.running = false;
                vec![Effect::Reconcile(CONTAINER_EVENT_RECONCILE)]
            }
            Sentinel::ContainerError => {
                self.note(Note::ContainerError);
                self.running = false;
                Vec::new()
            }
        }
    }

    /// Record a polled lifecycle state.
    pub fn apply_state(&mut self, raw: &str) {
        let raw = raw.trim();
        self.state = ContainerState::from_wire(raw);
        self.raw_state = raw.to_string();
        self.running = self.state == ContainerState::Running;
    }

    /// The user stopped tailing logs. No-op when not connected.
    pub fn stop_tailing(&mut self) {
        if self.connected {
            self.connected = false;
            self.note(Note::StoppedTailing);
        }
    }

    fn note(&mut self, note: Note) {
        let text = i18n::note(self.lang, &note);
        self.push(LineKind::Status, text);
    }

    fn push(&mut self, kind: LineKind, text: String) {
        self.transcript.push(TranscriptLine {
            at: Utc::now(),
            kind,
            text,
        });
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Transcript so far.
    #[must_use]
    pub fn transcript(&self) -> &[TranscriptLine] {
        &self.transcript
    }

    /// Whether the stream is connected.
    #[must_use]
    pub const fn connected(&self) -> bool {
        self.connected
    }

    /// Whether a build is running.
    #[must_use]
    pub const fn building(&self) -> bool {
        self.building
    }

    /// Whether the container is running.
    #[must_use]
    pub const fn running(&self) -> bool {
        self.running
    }

    /// Last known lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ContainerState {
        self.state
    }

    /// Runtime container id, once known.
    #[must_use]
    pub fn runtime_id(&self) -> Option<&str> {
        self.runtime_id.as_deref()
    }

    /// Runtime id an action is currently running against.
    #[must_use]
    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    /// Display name of the target.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Message language.
    #[must_use]
    pub const fn lang(&self) -> Lang {
        self.lang
    }

    /// Coarse phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        if self.building {
            Phase::Building
        } else if self.state.is_recognized() {
            Phase::Settled(self.state)
        } else if self.connected {
            Phase::Connecting
        } else {
            Phase::Idle
        }
    }

    /// Whether the state poller should run.
    #[must_use]
    pub const fn should_poll(&self, open: bool) -> bool {
        open && !self.building && self.runtime_id.is_some()
    }

    /// Gating of the lifecycle controls.
    #[must_use]
    pub fn gate(&self) -> ControlGate {
        ControlGate::new(
            self.building,
            self.runtime_id.as_deref(),
            self.state,
            self.running,
            self.in_flight.as_deref(),
        )
    }

    /// Take the in-flight lock for `action`, returning the runtime id to act on.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ActionUnavailable`] when the gate is closed.
    pub fn begin_action(&mut self, action: Action) -> Result<String> {
        self.gate().check(action)?;
        let id = self.runtime_id.clone().unwrap_or_default();
        self.in_flight = Some(id.clone());
        Ok(id)
    }

    /// Release the in-flight lock.
    pub fn finish_action(&mut self) {
        self.in_flight = None;
    }

    /// Status badge text.
    #[must_use]
    pub fn status_badge(&self) -> String {
        if self.building {
            return i18n::building_label(self.lang).to_string();
        }
        match i18n::state_label(self.lang, self.state) {
            Some(label) => label.to_string(),
            None if self.raw_state.is_empty() => i18n::unknown_label(self.lang).to_string(),
            None => self.raw_state.clone(),
        }
    }

    /// Banner to show above the controls, if any.
    #[must_use]
    pub const fn hint(&self) -> Option<Hint> {
        if self.building {
            Some(Hint::BuildInProgress)
        } else if !self.state.is_recognized() {
            Some(Hint::SearchingForUpdates)
        } else {
            None
        }
    }

    /// Footer status.
    #[must_use]
    pub const fn footer_status(&self) -> FooterStatus {
        if self.building {
            FooterStatus::Building
        } else if self.running {
            FooterStatus::Running
        } else if self.connected {
            FooterStatus::Connected
        } else {
            FooterStatus::Disconnected
        }
    }

    /// Transcript as plain text, one line per entry.
    #[must_use]
    pub fn export(&self) -> String {
        self.transcript
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Default file name for an exported transcript.
    #[must_use]
    pub fn export_file_name(&self) -> String {
        format!("{}-logs.txt", self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn record(container_id: Option<&str>) -> ContainerRecord {
        ContainerRecord {
            id: "rec-1".into(),
            container_id: container_id.map(str::to_string),
            name: "api".into(),
            image: "alpine".into(),
            host_port: "8080".into(),
            environment_variables: vec![],
            state: ContainerState::Unknown,
            build_id: "b-1".into(),
            project_id: "p-1".into(),
        }
    }

    fn feed(log: &mut BuildLog, lines: &[&str]) -> Vec<Effect> {
        lines
            .iter()
            .flat_map(|l| log.apply(StreamEvent::Line((*l).to_string())))
            .collect()
    }

    #[test]
    fn build_sequence_captures_id_and_reconciles_once() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        log.apply(StreamEvent::Opened);

        let effects = feed(&mut log, &["[BUILD_START]"]);
        assert!(log.building());
        assert!(effects.is_empty());

        let effects = feed(&mut log, &["Successfully built ContainerId-abc123"]);
        assert_eq!(log.runtime_id(), Some("abc123"));
        assert!(effects.is_empty());

        let effects = feed(&mut log, &["[BUILD_COMPLETE]"]);
        assert!(!log.building());
        assert_eq!(effects, vec![Effect::Reconcile(BUILD_COMPLETE_RECONCILE)]);
    }

    #[test]
    fn container_id_line_is_not_echoed() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        feed(&mut log, &["ContainerId-0123456789abcdef"]);
        assert_eq!(log.transcript().len(), 1);
        assert_eq!(log.transcript()[0].kind, LineKind::Status);
        assert!(log.transcript()[0].text.contains("0123456789ab..."));
        assert!(!log.export().contains("cdef"));
    }

    #[test_case("ContainerId-abc", Some("abc") ; "marker")]
    #[test_case("[CONTAINER_ID] ContainerId-x-y", Some("x-y") ; "marker keeps dashes")]
    #[test_case("[CONTAINER_ID]-def-ghi", Some("def") ; "fallback second segment")]
    #[test_case("[CONTAINER_ID]", None ; "no id")]
    fn container_id_extraction(line: &str, expected: Option<&str>) {
        assert_eq!(
            Sentinel::parse(line),
            Some(Sentinel::ContainerId(expected.map(str::to_string)))
        );
    }

    #[test]
    fn empty_and_whitespace_lines_are_ignored() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        feed(&mut log, &["", "   ", "\t"]);
        assert!(log.transcript().is_empty());
    }

    #[test]
    fn plain_lines_are_trimmed_and_echoed() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        feed(&mut log, &["  hello world  "]);
        assert_eq!(log.export(), "hello world");
    }

    #[test]
    fn build_error_stops_building_without_reconcile() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        let effects = feed(&mut log, &["[BUILD_START]", "[BUILD_ERROR]"]);
        assert!(!log.building());
        assert!(effects.is_empty());
    }

    #[test]
    fn container_start_and_stop_schedule_short_reconcile() {
        let mut log = BuildLog::new(&record(Some("c1")), Lang::En);
        log.apply_state("running");
        assert!(log.running());

        let effects = feed(&mut log, &["[CONTAINER_STOP]"]);
        assert!(!log.running());
        assert_eq!(effects, vec![Effect::Reconcile(CONTAINER_EVENT_RECONCILE)]);

        let effects = feed(&mut log, &["[CONTAINER_START]"]);
        assert_eq!(effects, vec![Effect::Reconcile(CONTAINER_EVENT_RECONCILE)]);
    }

    #[test]
    fn container_error_clears_running() {
        let mut log = BuildLog::new(&record(Some("c1")), Lang::En);
        log.apply_state("running");
        feed(&mut log, &["[CONTAINER_ERROR]"]);
        assert!(!log.running());
    }

    #[test]
    fn heuristic_detects_build_and_echoes_line() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        feed(&mut log, &["Step 1/4 : FROM alpine"]);
        assert!(log.building());
        let texts: Vec<_> = log.transcript().iter().map(|l| l.text.clone()).collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[1], "Step 1/4 : FROM alpine");

        feed(&mut log, &[" ---> abc"]);
        assert_eq!(log.transcript().len(), 3);
    }

    #[test_case("Building image" ; "building")]
    #[test_case("reading DOCKERFILE" ; "dockerfile uppercase")]
    #[test_case(" ---> Running in 1f2" ; "arrow")]
    fn heuristic_triggers(line: &str) {
        let mut log = BuildLog::new(&record(None), Lang::En);
        feed(&mut log, &[line]);
        assert!(log.building());
    }

    #[test]
    fn step_is_case_sensitive() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        feed(&mut log, &["next step is here"]);
        assert!(!log.building());
    }

    #[test]
    fn error_while_building_notes_lost_stream_and_keeps_transcript() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        log.apply(StreamEvent::Opened);
        feed(&mut log, &["[BUILD_START]", "output"]);
        let before = log.transcript().len();
        log.apply(StreamEvent::Error("reset by peer".into()));
        assert!(!log.connected());
        assert_eq!(log.transcript().len(), before + 1);
    }

    #[test]
    fn error_while_idle_adds_nothing() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        log.apply(StreamEvent::Opened);
        log.apply(StreamEvent::Error("gone".into()));
        assert_eq!(log.transcript().len(), 1);
    }

    #[test]
    fn stop_tailing_only_when_connected() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        log.stop_tailing();
        assert!(log.transcript().is_empty());
        log.apply(StreamEvent::Opened);
        log.stop_tailing();
        assert!(!log.connected());
        assert_eq!(log.transcript().len(), 2);
    }

    #[test]
    fn reset_clears_and_reseeds() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        feed(&mut log, &["[BUILD_START]", "ContainerId-zzz"]);
        log.reset(&record(Some("seed")));
        assert!(log.transcript().is_empty());
        assert!(!log.building());
        assert_eq!(log.runtime_id(), Some("seed"));
        assert_eq!(log.state(), ContainerState::Unknown);
    }

    #[test]
    fn polling_rules() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        assert!(!log.should_poll(true));
        feed(&mut log, &["ContainerId-abc"]);
        assert!(log.should_poll(true));
        assert!(!log.should_poll(false));
        feed(&mut log, &["[BUILD_START]"]);
        assert!(!log.should_poll(true));
    }

    #[test]
    fn phases() {
        let mut log = BuildLog::new(&record(Some("c1")), Lang::En);
        assert_eq!(log.phase(), Phase::Idle);
        log.apply(StreamEvent::Opened);
        assert_eq!(log.phase(), Phase::Connecting);
        feed(&mut log, &["[BUILD_START]"]);
        assert_eq!(log.phase(), Phase::Building);
        feed(&mut log, &["[BUILD_COMPLETE]"]);
        log.apply_state("exited");
        assert_eq!(log.phase(), Phase::Settled(ContainerState::Exited));
    }

    #[test]
    fn badge_and_hints() {
        let mut log = BuildLog::new(&record(Some("c1")), Lang::En);
        assert_eq!(log.status_badge(), "unknown");
        assert_eq!(log.hint(), Some(Hint::SearchingForUpdates));

        log.apply_state("removing");
        assert_eq!(log.status_badge(), "removing");

        log.apply_state("exited");
        assert_eq!(log.status_badge(), "stopped");
        assert_eq!(log.hint(), None);

        feed(&mut log, &["[BUILD_START]"]);
        assert_eq!(log.status_badge(), "building");
        assert_eq!(log.hint(), Some(Hint::BuildInProgress));
    }

    #[test]
    fn footer_priority() {
        let mut log = BuildLog::new(&record(Some("c1")), Lang::En);
        assert_eq!(log.footer_status(), FooterStatus::Disconnected);
        log.apply(StreamEvent::Opened);
        assert_eq!(log.footer_status(), FooterStatus::Connected);
        log.apply_state("running");
        assert_eq!(log.footer_status(), FooterStatus::Running);
        feed(&mut log, &["[BUILD_START]"]);
        assert_eq!(log.footer_status(), FooterStatus::Building);
    }

    #[test]
    fn in_flight_lock_blocks_second_action() {
        let mut log = BuildLog::new(&record(Some("c1")), Lang::En);
        log.apply_state("exited");
        assert_eq!(log.begin_action(Action::Start).ok().as_deref(), Some("c1"));
        assert!(log.begin_action(Action::Restart).is_err());
        log.finish_action();
        assert!(log.begin_action(Action::Restart).is_ok());
    }

    #[test]
    fn export_name_uses_name_then_build_id() {
        let log = BuildLog::new(&record(None), Lang::En);
        assert_eq!(log.export_file_name(), "api-logs.txt");

        let mut unnamed = record(None);
        unnamed.name.clear();
        let log = BuildLog::new(&unnamed, Lang::En);
        assert_eq!(log.export_file_name(), "b-1-logs.txt");
    }

    #[test]
    fn duplicate_completion_reconciles_again() {
        let mut log = BuildLog::new(&record(None), Lang::En);
        let effects = feed(&mut log, &["[BUILD_COMPLETE]", "[BUILD_COMPLETE]"]);
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn hebrew_notes_by_default_language() {
        let mut log = BuildLog::new(&record(None), Lang::He);
        feed(&mut log, &["[BUILD_START]"]);
        assert!(log.export().contains("מתחיל תהליך בנייה"));
    }
}
