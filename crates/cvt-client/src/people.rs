//! Members and teams as shared reference data.

use cvt_core::{Member, Team, people};
use parking_lot::RwLock;
use tracing::warn;

use crate::error::Result;
use crate::http::ApiClient;

/// Load state of one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Loadable<T> {
    /// Never requested.
    #[default]
    Idle,
    /// Request in flight.
    Loading,
    /// Loaded.
    Ready(T),
    /// The last request failed.
    Failed(String),
}

impl<T> Loadable<T> {
    /// The loaded value, if any.
    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Error of the last request.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    fn settle(result: &Result<T>) -> Self
    where
        T: Clone,
    {
        match result {
            Ok(value) => Self::Ready(value.clone()),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// Members and teams with independent load state.
#[derive(Debug)]
pub struct People {
    client: ApiClient,
    members: RwLock<Loadable<Vec<Member>>>,
    teams: RwLock<Loadable<Vec<Team>>>,
}

impl People {
    /// Nothing loaded yet.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            members: RwLock::new(Loadable::Idle),
            teams: RwLock::new(Loadable::Idle),
        }
    }

    /// Load both lists concurrently, using cached copies when present.
    pub async fn load(&self) {
        *self.members.write() = Loadable::Loading;
        *self.teams.write() = Loadable::Loading;
        let members_api = self.client.members();
        let teams_api = self.client.teams();
        let (members, teams) = tokio::join!(members_api.list(), teams_api.list());
        self.settle_members(&members);
        self.settle_teams(&teams);
    }

    /// Fetch the members again.
    ///
    /// # Errors
    ///
    /// Returns the request failure, also kept in the load state.
    pub async fn refetch_members(&self) -> Result<Vec<Member>> {
        *self.members.write() = Loadable::Loading;
        let result = self.client.members().refetch().await;
        self.settle_members(&result);
        result
    }

    /// Fetch the teams again.
    ///
    /// # Errors
    ///
    /// Returns the request failure, also kept in the load state.
    pub async fn refetch_teams(&self) -> Result<Vec<Team>> {
        *self.teams.write() = Loadable::Loading;
        let result = self.client.teams().refetch().await;
        self.settle_teams(&result);
        result
    }

    fn settle_members(&self, result: &Result<Vec<Member>>) {
        if let Err(e) = result {
            warn!(error = %e, "failed to load members");
        }
        *self.members.write() = Loadable::settle(result);
    }

    fn settle_teams(&self, result: &Result<Vec<Team>>) {
        if let Err(e) = result {
            warn!(error = %e, "failed to load teams");
        }
        *self.teams.write() = Loadable::settle(result);
    }

    /// Member list state.
    #[must_use]
    pub fn members(&self) -> Loadable<Vec<Member>> {
        self.members.read().clone()
    }

    /// Team list state.
    #[must_use]
    pub fn teams(&self) -> Loadable<Vec<Team>> {
        self.teams.read().clone()
    }

    /// Members of `team`; zero until members are loaded.
    #[must_use]
    pub fn team_member_count(&self, team: &str) -> usize {
        self.members
            .read()
            .ready()
            .map_or(0, |members| people::team_member_count(members, team))
    }

    /// Member count of every loaded team.
    #[must_use]
    pub fn team_member_counts(&self) -> Vec<(Team, usize)> {
        let members = self.members.read();
        let teams = self.teams.read();
        let members = members.ready().map_or(&[][..], Vec::as_slice);
        teams.ready().map_or_else(Vec::new, |teams| {
            people::team_member_counts(members, teams)
                .into_iter()
                .map(|(team, count)| (team.clone(), count))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn loadable_accessors() {
        let ready: Loadable<u8> = Loadable::Ready(3);
        assert_eq!(ready.ready(), Some(&3));
        assert!(Loadable::<u8>::Loading.is_loading());
        let failed: Loadable<u8> = Loadable::settle(&Err(ClientError::NotAuthenticated));
        assert_eq!(failed.error(), Some("not signed in"));
        assert_eq!(Loadable::<u8>::default(), Loadable::Idle);
    }
}
