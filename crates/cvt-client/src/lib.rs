//! # cvt-client
//!
//! Async client for the CVT backend.
//!
//! - [`ApiClient`]: cookie-carrying HTTP wrapper with read retries and a
//!   shared [`QueryCache`]
//! - endpoint groups reached through [`ApiClient::members`],
//!   [`ApiClient::containers`] and friends
//! - [`Session`]: the signed-in identity
//! - [`People`]: members and teams as reference data
//! - [`ContainerConsole`]: live build log, state polling and lifecycle
//!   actions for one container
//!
//! ## Example
//!
//! ```rust,ignore
//! use cvt_client::{ApiClient, ClientConfig, Environment, Session};
//!
//! let client = ApiClient::new(ClientConfig::for_environment(Environment::Development))?;
//! let session = Session::new(client.clone());
//! if session.refresh().await.is_some() {
//!     for member in client.members().list().await? {
//!         println!("{} ({})", member.name, member.team);
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod console;
mod error;
mod http;
pub mod notify;
pub mod people;
pub mod query;
pub mod session;
pub mod sse;

pub use config::{ClientConfig, Environment};
pub use console::ContainerConsole;
pub use error::{ClientError, Result};
pub use http::ApiClient;
pub use notify::{ChannelNotifier, Level, Notification, Notifier, TracingNotifier};
pub use people::{Loadable, People};
pub use query::{QueryCache, QueryKey};
pub use session::Session;
pub use sse::{SseDecoder, SseEvent};
