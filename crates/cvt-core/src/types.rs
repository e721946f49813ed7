//! Records exchanged with the backend.
//!
//! Every record carries a server-assigned `id`. Field names follow the
//! backend's camelCase JSON, including its spelling quirks.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

// ============================================================================
// Users
// ============================================================================

/// Access level of a console user.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user, limited to the dashboard.
    #[default]
    User,
    /// Technician, may manage every page but cannot grant admin.
    Tech,
    /// Administrator.
    Admin,
}

impl Role {
    /// All roles, lowest first.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::User, Self::Tech, Self::Admin]
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Tech => "tech",
            Self::Admin => "admin",
        }
    }

    /// Whether the role may open the management pages.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        !matches!(self, Self::User)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "tech" => Ok(Self::Tech),
            "admin" => Ok(Self::Admin),
            _ => Err(CoreError::InvalidRole(s.to_string())),
        }
    }
}

/// An authenticated console user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub full_name: String,
    /// Login email.
    pub email: String,
    /// Login handle.
    #[serde(default)]
    pub username: String,
    /// Access level.
    #[serde(default)]
    pub role: Role,
    /// Whether the account is enabled.
    #[serde(default)]
    pub active: bool,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Members and teams
// ============================================================================

/// Military rank of a member.
///
/// Serialized with the Hebrew strings the backend stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// טוראי
    #[serde(rename = "טוראי")]
    Private,
    /// רב"ט
    #[serde(rename = "רב\"ט")]
    Corporal,
    /// סמל
    #[serde(rename = "סמל")]
    Sergeant,
    /// סמ"ר
    #[serde(rename = "סמ\"ר")]
    StaffSergeant,
    /// רב סמל
    #[serde(rename = "רב סמל")]
    MasterSergeant,
    /// סגם
    #[serde(rename = "סגם")]
    SecondLieutenant,
    /// סגן
    #[serde(rename = "סגן")]
    Lieutenant,
    /// סרן
    #[serde(rename = "סרן")]
    Captain,
    /// רס"ן
    #[serde(rename = "רס\"ן")]
    Major,
    /// מילואים
    #[serde(rename = "מילואים")]
    Reserve,
}

impl Rank {
    /// All ranks in selection order.
    pub const ALL: [Self; 10] = [
        Self::Private,
        Self::Corporal,
        Self::Sergeant,
        Self::StaffSergeant,
        Self::MasterSergeant,
        Self::SecondLieutenant,
        Self::Lieutenant,
        Self::Captain,
        Self::Major,
        Self::Reserve,
    ];

    /// Wire (Hebrew) representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "טוראי",
            Self::Corporal => "רב\"ט",
            Self::Sergeant => "סמל",
            Self::StaffSergeant => "סמ\"ר",
            Self::MasterSergeant => "רב סמל",
            Self::SecondLieutenant => "סגם",
            Self::Lieutenant => "סגן",
            Self::Captain => "סרן",
            Self::Major => "רס\"ן",
            Self::Reserve => "מילואים",
        }
    }

    /// English identifier, accepted on the command line.
    #[must_use]
    pub const fn english(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Corporal => "corporal",
            Self::Sergeant => "sergeant",
            Self::StaffSergeant => "staff-sergeant",
            Self::MasterSergeant => "master-sergeant",
            Self::SecondLieutenant => "second-lieutenant",
            Self::Lieutenant => "lieutenant",
            Self::Captain => "captain",
            Self::Major => "major",
            Self::Reserve => "reserve",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|rank| rank.as_str() == needle || rank.english().eq_ignore_ascii_case(needle))
            .ok_or_else(|| CoreError::InvalidRank(s.to_string()))
    }
}

/// Personnel record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Server-assigned identifier.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Contact email.
    #[serde(default)]
    pub email: String,
    /// Contact phone.
    #[serde(default)]
    pub phone_num: String,
    /// Seven-digit personal number.
    #[serde(default)]
    pub ad: String,
    /// Rank, `None` when missing or not part of the enumeration.
    #[serde(default, deserialize_with = "lenient_rank")]
    pub rank: Option<Rank>,
    /// Team name, matched as free text against [`Team::name`].
    #[serde(default)]
    pub team: String,
    /// Release date, `None` when missing or unparseable.
    #[serde(default, deserialize_with = "lenient_date")]
    pub leave_date: Option<NaiveDate>,
}

/// A team of members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Server-assigned identifier.
    pub id: String,
    /// Team name.
    pub name: String,
    /// Optional reference to the team lead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_lead: Option<String>,
}

// ============================================================================
// Catalog
// ============================================================================

/// Software catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Software {
    /// Server-assigned identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// External URL.
    #[serde(default)]
    pub url: String,
    /// Contact emails.
    #[serde(default)]
    pub contacts: Vec<String>,
    /// Uploaded home-screen image.
    #[serde(default)]
    pub image_id: String,
}

/// A contact person of a system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone_num: String,
}

/// Systems record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct System {
    /// Server-assigned identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Description. The backend field is spelled `descripion`.
    #[serde(rename = "descripion", default)]
    pub description: String,
    /// Contact people.
    #[serde(default)]
    pub contacts: Vec<Contact>,
    /// Uploaded system image.
    #[serde(default)]
    pub image_id: String,
}

// ============================================================================
// Containers
// ============================================================================

/// Docker lifecycle state of a container.
///
/// Any state string outside the recognized set decodes to [`Self::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerState {
    /// Created, never started.
    Created,
    /// Running.
    Running,
    /// Stopped.
    Exited,
    /// Paused.
    Paused,
    /// Restarting.
    Restarting,
    /// Dead.
    Dead,
    /// Not reported yet or not recognized.
    #[default]
    Unknown,
}

impl ContainerState {
    /// The states that enable lifecycle controls.
    pub const RECOGNIZED: [Self; 6] = [
        Self::Running,
        Self::Exited,
        Self::Paused,
        Self::Restarting,
        Self::Dead,
        Self::Created,
    ];

    /// Decode a state string; unrecognized values become [`Self::Unknown`].
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            "created" => Self::Created,
            "running" => Self::Running,
            "exited" => Self::Exited,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Exited => "exited",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this is one of the six recognized states.
    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContainerState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContainerState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Self::Unknown, Self::from_wire))
    }
}

/// A container managed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    /// Server-assigned record identifier.
    pub id: String,
    /// Docker runtime identifier, present once the build completed.
    #[serde(default)]
    pub container_id: Option<String>,
    /// Container name.
    pub name: String,
    /// Base image reference.
    #[serde(default)]
    pub image: String,
    /// Published host port.
    #[serde(default)]
    pub host_port: String,
    /// `KEY=VALUE` environment entries.
    #[serde(default)]
    pub environment_variables: Vec<String>,
    /// Last known lifecycle state.
    #[serde(default)]
    pub state: ContainerState,
    /// Correlates the record with its build and log stream.
    #[serde(default)]
    pub build_id: String,
    /// Software entry the container belongs to.
    #[serde(default)]
    pub project_id: String,
}

impl ContainerRecord {
    /// Name used in transcripts and export file names.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.build_id
        } else {
            &self.name
        }
    }

    /// Runtime id, treating an empty string as absent.
    #[must_use]
    pub fn runtime_id(&self) -> Option<&str> {
        self.container_id.as_deref().filter(|id| !id.is_empty())
    }
}

// ============================================================================
// Guide files
// ============================================================================

/// An uploaded guide document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntity {
    /// Server-assigned identifier.
    pub id: String,
    /// Name of the file as uploaded.
    pub original_name: String,
    /// Stored file name.
    #[serde(default)]
    pub filename: String,
    /// Storage directory.
    #[serde(default)]
    pub destination: String,
    /// Storage path.
    #[serde(default)]
    pub path: String,
    /// MIME type.
    #[serde(default)]
    pub mimetype: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
}

/// Guide listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guides {
    /// Number of files on the server.
    pub total: u64,
    /// The files.
    pub files: Vec<FileEntity>,
}

// ============================================================================
// Lenient decoding
// ============================================================================

fn lenient_rank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Rank>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("user", Role::User ; "lowercase user")]
    #[test_case("TECH", Role::Tech ; "uppercase tech")]
    #[test_case(" admin ", Role::Admin ; "padded admin")]
    fn role_parse(input: &str, expected: Role) {
        assert_eq!(input.parse::<Role>().ok(), Some(expected));
    }

    #[test]
    fn role_parse_rejects_unknown() {
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_staff() {
        assert!(!Role::User.is_staff());
        assert!(Role::Tech.is_staff());
        assert!(Role::Admin.is_staff());
    }

    #[test]
    fn rank_parses_wire_and_english() {
        assert_eq!("סרן".parse::<Rank>().ok(), Some(Rank::Captain));
        assert_eq!("Captain".parse::<Rank>().ok(), Some(Rank::Captain));
        assert_eq!("staff-sergeant".parse::<Rank>().ok(), Some(Rank::StaffSergeant));
        assert!("general".parse::<Rank>().is_err());
    }

    #[test]
    fn rank_serializes_hebrew() {
        let json = serde_json::to_string(&Rank::Corporal).expect("serialize");
        assert_eq!(json, "\"רב\\\"ט\"");
    }

    #[test]
    fn member_decodes_leniently() {
        let json = r#"{
            "id": "m1",
            "name": "Dana Levi",
            "email": "dana@example.com",
            "phoneNum": "050-1234567",
            "ad": "1234567",
            "rank": "not-a-rank",
            "team": "Ops",
            "leaveDate": "garbage"
        }"#;
        let member: Member = serde_json::from_str(json).expect("decode");
        assert_eq!(member.rank, None);
        assert_eq!(member.leave_date, None);
        assert_eq!(member.team, "Ops");
    }

    #[test]
    fn member_decodes_rfc3339_leave_date() {
        let json = r#"{"id":"m2","name":"Noa","rank":"סגן","leaveDate":"2027-03-01T00:00:00.000Z"}"#;
        let member: Member = serde_json::from_str(json).expect("decode");
        assert_eq!(member.rank, Some(Rank::Lieutenant));
        assert_eq!(member.leave_date, NaiveDate::from_ymd_opt(2027, 3, 1));
    }

    #[test_case("running", ContainerState::Running ; "running")]
    #[test_case("exited", ContainerState::Exited ; "exited")]
    #[test_case("removing", ContainerState::Unknown ; "unrecognized")]
    #[test_case("", ContainerState::Unknown ; "empty")]
    fn container_state_from_wire(input: &str, expected: ContainerState) {
        assert_eq!(ContainerState::from_wire(input), expected);
    }

    #[test]
    fn container_record_decodes_unknown_state() {
        let json = r#"{"id":"c1","name":"api","state":"removing","buildId":"b1"}"#;
        let record: ContainerRecord = serde_json::from_str(json).expect("decode");
        assert_eq!(record.state, ContainerState::Unknown);
        assert_eq!(record.runtime_id(), None);
    }

    #[test]
    fn container_record_null_state() {
        let json = r#"{"id":"c1","name":"api","state":null,"containerId":""}"#;
        let record: ContainerRecord = serde_json::from_str(json).expect("decode");
        assert_eq!(record.state, ContainerState::Unknown);
        assert_eq!(record.runtime_id(), None);
    }

    #[test]
    fn display_name_falls_back_to_build_id() {
        let record = ContainerRecord {
            id: "c1".into(),
            container_id: None,
            name: String::new(),
            image: "alpine".into(),
            host_port: String::new(),
            environment_variables: Vec::new(),
            state: ContainerState::Unknown,
            build_id: "b-42".into(),
            project_id: "p1".into(),
        };
        assert_eq!(record.display_name(), "b-42");
    }

    #[test]
    fn system_uses_backend_spelling() {
        let system = System {
            id: "s1".into(),
            title: "Radar".into(),
            description: "Primary radar".into(),
            contacts: vec![],
            image_id: "img".into(),
        };
        let value = serde_json::to_value(&system).expect("serialize");
        assert_eq!(value["descripion"], "Primary radar");
        assert!(value.get("description").is_none());
    }

    #[test]
    fn user_ignores_password_hash() {
        let json = r#"{
            "id": "u1", "fullName": "Admin", "email": "a@example.com",
            "hash": "$2b$10$abc", "username": "admin", "role": "admin",
            "createdAt": "2025-01-01T10:00:00Z", "active": true
        }"#;
        let user: User = serde_json::from_str(json).expect("decode");
        assert_eq!(user.role, Role::Admin);
        let value = serde_json::to_value(&user).expect("serialize");
        assert!(value.get("hash").is_none());
    }
}
