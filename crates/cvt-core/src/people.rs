//! Lookups across members and teams.

use std::collections::HashMap;

use crate::types::{Member, Team};

/// Number of members whose team name equals `team` exactly.
#[must_use]
pub fn team_member_count(members: &[Member], team: &str) -> usize {
    members.iter().filter(|m| m.team == team).count()
}

/// Member count for every team, in team order.
#[must_use]
pub fn team_member_counts<'a>(members: &[Member], teams: &'a [Team]) -> Vec<(&'a Team, usize)> {
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for member in members {
        *by_name.entry(member.team.as_str()).or_default() += 1;
    }
    teams
        .iter()
        .map(|t| (t, by_name.get(t.name.as_str()).copied().unwrap_or(0)))
        .collect()
}

/// Whether `member.team` names one of `teams`.
#[must_use]
pub fn has_known_team(member: &Member, teams: &[Team]) -> bool {
    teams.iter().any(|t| t.name == member.team)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(team: &str) -> Member {
        Member {
            id: format!("m-{team}"),
            name: "Member".into(),
            email: String::new(),
            phone_num: String::new(),
            ad: String::new(),
            rank: None,
            team: team.into(),
            leave_date: None,
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
    fn count_is_case_sensitive() {
        let members = vec![member("Ops"), member("ops"), member("Ops"), member("Dev")];
        assert_eq!(team_member_count(&members, "Ops"), 2);
        assert_eq!(team_member_count(&members, "ops"), 1);
        assert_eq!(team_member_count(&members, "QA"), 0);
    }

    #[test]
    fn counts_follow_team_order() {
        let members = vec![member("Dev"), member("Ops"), member("Dev")];
        let teams = vec![team("Ops"), team("Dev"), team("QA")];
        let counts: Vec<_> = team_member_counts(&members, &teams)
            .into_iter()
            .map(|(t, n)| (t.name.as_str(), n))
            .collect();
        assert_eq!(counts, vec![("Ops", 1), ("Dev", 2), ("QA", 0)]);
    }

    #[test]
    fn known_team_lookup() {
        let teams = vec![team("Ops")];
        assert!(has_known_team(&member("Ops"), &teams));
        assert!(!has_known_team(&member("Gone"), &teams));
    }
}
