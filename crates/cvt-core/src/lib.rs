//! # cvt-core
//!
//! Domain layer of the CVT administrative console.
//!
//! This crate has no network dependencies. It provides:
//! - [`types`]: records exchanged with the backend (users, members, teams,
//!   software, systems, containers, guide files)
//! - [`validation`] and [`forms`]: schema checks run before any request
//! - [`access`]: route table, role gating and navigation
//! - [`people`]: cross-entity lookups such as team member counts
//! - [`build_log`] and [`controls`]: the container build/log state machine
//!   and the lifecycle-action gating derived from it
//! - [`i18n`]: the Hebrew and English message catalogues
//!
//! ```text
//! ┌──────────┐   forms / gating   ┌────────────┐    REST / SSE    ┌─────────┐
//! │ cvt-cli  │──────────────────►│ cvt-client │◄────────────────►│ backend │
//! └──────────┘                    └────────────┘                  └─────────┘
//!        ╲                              │
//!         ╲────────── cvt-core ◄────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
pub mod build_log;
pub mod controls;
mod error;
pub mod forms;
pub mod i18n;
pub mod people;
pub mod types;
pub mod validation;

pub use access::{NavEntry, Route};
pub use build_log::{BuildLog, Effect, Phase, Sentinel, StreamEvent, TranscriptLine};
pub use controls::{Action, ControlGate};
pub use error::{CoreError, Result};
pub use forms::UploadFile;
pub use i18n::Lang;
pub use types::{
    Contact, ContainerRecord, ContainerState, FileEntity, Guides, Member, Rank, Role, Software,
    System, Team, User,
};
pub use validation::{ValidationBuilder, ValidationError, ValidationErrorKind, ValidationErrors};
