//! Routes, role gating and navigation.
//!
//! Gating is advisory: the backend enforces authorization on its own.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::CoreError;
use crate::i18n::{self, Lang};
use crate::types::{Role, User};

/// A console page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// `/`, members and teams.
    Dashboard,
    /// `/users`
    Users,
    /// `/guides`
    Guides,
    /// `/systems`
    Systems,
    /// `/software`
    Software,
    /// `/containers`
    Containers,
}

impl Route {
    /// Gated pages in navigation order.
    pub const NAVIGATION: [Self; 5] = [
        Self::Users,
        Self::Guides,
        Self::Systems,
        Self::Software,
        Self::Containers,
    ];

    /// URL path.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Dashboard => "/",
            Self::Users => "/users",
            Self::Guides => "/guides",
            Self::Systems => "/systems",
            Self::Software => "/software",
            Self::Containers => "/containers",
        }
    }

    /// Look up a route by path.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(Self::Dashboard);
        }
        Self::NAVIGATION.into_iter().find(|r| r.path() == trimmed)
    }

    /// Whether the page needs a staff role.
    #[must_use]
    pub const fn requires_staff(&self) -> bool {
        !matches!(self, Self::Dashboard)
    }

    /// Whether `user` may open the page.
    #[must_use]
    pub fn permits(&self, user: Option<&User>) -> bool {
        !self.requires_staff() || user.is_some_and(|u| u.role.is_staff())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_path(s).ok_or_else(|| format!("unknown route: {s}"))
    }
}

/// Resolve the page actually shown for `requested`; denied pages fall back to the dashboard.
#[must_use]
pub fn guard(requested: Route, user: Option<&User>) -> Route {
    if requested.permits(user) {
        requested
    } else {
        debug!(route = %requested, "redirecting to dashboard");
        Route::Dashboard
    }
}

/// Like [`guard`], but reports the denial.
///
/// # Errors
///
/// Returns [`CoreError::Forbidden`] when `user` may not open `requested`.
pub fn require(requested: Route, user: Option<&User>) -> Result<(), CoreError> {
    if requested.permits(user) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(requested))
    }
}

/// One navigation item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    /// Target page.
    pub route: Route,
    /// Localized label.
    pub label: &'static str,
    /// Shown locked with a hint instead of a link.
    pub locked: bool,
}

/// Navigation items for `user`. Empty while the session is loading.
#[must_use]
pub fn navigation(user: Option<&User>, loading: bool, lang: Lang) -> Vec<NavEntry> {
    if loading {
        return Vec::new();
    }
    Route::NAVIGATION
        .into_iter()
        .map(|route| NavEntry {
            route,
            label: i18n::nav_label(lang, route),
            locked: !route.permits(user),
        })
        .collect()
}

/// Whether `current` may delete `target`. Nobody can delete their own account.
#[must_use]
pub fn can_delete_user(current: Option<&User>, target: &User) -> bool {
    current.is_none_or(|me| me.id != target.id)
}

/// Whether `editor` may assign `role`. Only admins may grant admin.
#[must_use]
pub fn can_assign_role(editor: Option<&User>, role: Role) -> bool {
    role != Role::Admin || editor.is_some_and(|e| e.role == Role::Admin)
}
