//! Current identity and sign-in flow.

use cvt_core::access::{self, NavEntry, Route};
use cvt_core::forms::{LoginForm, RegisterForm};
use cvt_core::{Lang, User};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::http::ApiClient;
use crate::query::QueryKey;

#[derive(Debug, Clone)]
struct State {
    user: Option<User>,
    loading: bool,
    last_error: Option<String>,
}

/// Who is signed in. Share it behind an `Arc`.
#[derive(Debug)]
pub struct Session {
    client: ApiClient,
    state: RwLock<State>,
    changes: watch::Sender<Option<User>>,
}

impl Session {
    /// A session that has not asked the backend yet; it reports loading
    /// until [`Self::refresh`] completes.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            client,
            state: RwLock::new(State {
                user: None,
                loading: true,
                last_error: None,
            }),
            changes,
        }
    }

    /// Ask the backend who is signed in. Failures, including a 401, leave
    /// the session signed out and are kept in [`Self::last_error`].
    pub async fn refresh(&self) -> Option<User> {
        self.state.write().loading = true;
        let result = self.client.auth().me().await;
        let user = {
            let mut state = self.state.write();
            state.loading = false;
            match result {
                Ok(user) => {
                    state.user = Some(user);
                    state.last_error = None;
                }
                Err(e) => {
                    debug!(error = %e, "no active session");
                    state.user = None;
                    state.last_error = Some(e.to_string());
                }
            }
            state.user.clone()
        };
        match &user {
            Some(u) => {
                self.client.cache().put(QueryKey::Me, u.clone());
                info!(user = %u.username, role = %u.role, "session active");
            }
            None => self.client.cache().invalidate(&QueryKey::Me),
        }
        self.changes.send_replace(user.clone());
        user
    }

    /// Sign in and load the identity.
    ///
    /// # Errors
    ///
    /// Returns the login failure, or [`ClientError::NotAuthenticated`] when
    /// the backend accepted the login but reports no identity.
    pub async fn login(&self, form: &LoginForm) -> Result<User> {
        self.client.auth().login(form).await?;
        info!(email = %form.email, "signed in");
        self.refresh().await.ok_or(ClientError::NotAuthenticated)
    }

    /// Register and load the new identity.
    ///
    /// # Errors
    ///
    /// Returns the registration failure, or [`ClientError::NotAuthenticated`]
    /// when no identity follows.
    pub async fn register(&self, form: &RegisterForm) -> Result<User> {
        self.client.auth().register(form).await?;
        info!(username = %form.username, "registered");
        self.refresh().await.ok_or(ClientError::NotAuthenticated)
    }

    /// Sign out, drop the cached identity and re-check the backend.
    ///
    /// # Errors
    ///
    /// Returns the logout request failure; local state is cleared regardless.
    pub async fn logout(&self) -> Result<()> {
        let result = self.client.auth().logout().await;
        self.state.write().user = None;
        self.changes.send_replace(None);
        info!("signed out");
        self.refresh().await;
        result
    }

    /// Signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    /// Whether the identity is still being fetched.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    /// Whether the user holds a staff role.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.state
            .read()
            .user
            .as_ref()
            .is_some_and(|u| u.role.is_staff())
    }

    /// Last failure to load the identity.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    /// Observe identity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.changes.subscribe()
    }

    /// Page actually shown for `requested`.
    #[must_use]
    pub fn guard(&self, requested: Route) -> Route {
        access::guard(requested, self.state.read().user.as_ref())
    }

    /// Navigation items for the current user.
    #[must_use]
    pub fn navigation(&self, lang: Lang) -> Vec<NavEntry> {
        let state = self.state.read();
        access::navigation(state.user.as_ref(), state.loading, lang)
    }

    /// Client the session signs in through.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }
}
