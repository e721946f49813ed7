//! # cvt-cli
//!
//! Command-line front end of the CVT administrative console.
//!
//! ```text
//! ┌─────────┐  clap   ┌──────────┐  forms/gating  ┌────────────┐  REST/SSE  ┌─────────┐
//! │  shell  │───────►│ commands │──────────────►│ cvt-client │◄──────────►│ backend │
//! └─────────┘         └──────────┘                └────────────┘            └─────────┘
//!                          │
//!                          ▼
//!                  table / JSON output
//! ```
//!
//! Each page of the console maps to a subcommand group: `member`, `team`,
//! `software`, `system`, `user`, `guide` and `container`. The session cookie
//! survives between invocations in a small JSON file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod notify;
pub mod output;
pub mod session_file;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::{OutputFormat, TableDisplay};
pub use session_file::{SessionFile, StoredSession};
