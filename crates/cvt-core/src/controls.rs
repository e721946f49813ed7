//! Lifecycle actions and their gating.

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::types::ContainerState;

/// A lifecycle action on a running container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Start a stopped container.
    Start,
    /// Stop a running container.
    Stop,
    /// Restart.
    Restart,
    /// Remove the container.
    Remove,
}

impl Action {
    /// All actions in display order.
    pub const ALL: [Self; 4] = [Self::Start, Self::Stop, Self::Restart, Self::Remove];

    /// Endpoint path segment.
    #[must_use]
    pub const fn segment(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Remove => "remove",
        }
    }

    /// Whether the lifecycle state is re-polled after success.
    #[must_use]
    pub const fn refreshes_state(&self) -> bool {
        !matches!(self, Self::Remove)
    }

    /// Whether success closes the viewer.
    #[must_use]
    pub const fn closes_viewer(&self) -> bool {
        matches!(self, Self::Remove)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.segment().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown action: {s}"))
    }
}

/// Snapshot of the inputs that decide which actions are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlGate {
    building: bool,
    has_id: bool,
    recognized: bool,
    running: bool,
    busy: bool,
}

impl ControlGate {
    /// Build a gate from viewer state.
    #[must_use]
    pub fn new(
        building: bool,
        runtime_id: Option<&str>,
        state: ContainerState,
        running: bool,
        in_flight: Option<&str>,
    ) -> Self {
        Self {
            building,
            has_id: runtime_id.is_some(),
            recognized: state.is_recognized(),
            running,
            busy: runtime_id.is_some() && in_flight == runtime_id,
        }
    }

    /// Whether every action is disabled.
    #[must_use]
    pub const fn actions_disabled(&self) -> bool {
        self.building || !self.has_id || !self.recognized
    }

    /// Whether `action` is enabled.
    #[must_use]
    pub const fn allows(&self, action: Action) -> bool {
        self.blocker(action).is_none()
    }

    /// Enabled actions, in display order.
    #[must_use]
    pub fn enabled(&self) -> Vec<Action> {
        Action::ALL.into_iter().filter(|a| self.allows(*a)).collect()
    }

    /// Reject a disabled action.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ActionUnavailable`] naming why the gate is closed.
    pub fn check(&self, action: Action) -> Result<()> {
        match self.blocker(action) {
            None => Ok(()),
            Some(reason) => Err(CoreError::ActionUnavailable { action, reason }),
        }
    }

    const fn blocker(&self, action: Action) -> Option<&'static str> {
        if self.building {
            return Some("a build is in progress");
        }
        if !self.has_id {
            return Some("container id is not known yet");
        }
        if !self.recognized {
            return Some("container state is not known yet");
        }
        if self.busy {
            return Some("another action is in progress");
        }
        match action {
            Action::Start if self.running => Some("container is already running"),
            Action::Stop if !self.running => Some("container is not running"),
            _ => None,
        }
    }
}
