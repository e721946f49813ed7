//! Form values and their request payloads.
//!
//! Each form validates itself before it is turned into a payload; the
//! payload shapes follow what the backend expects, spelling included.

use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::access;
use crate::error::{CoreError, Result};
use crate::types::{Contact, Rank, Role, User};
use crate::validation::{ARCHIVE_SUFFIXES, IMAGE_SUFFIXES, ValidationBuilder, ValidationErrors};

/// Image used when a container form leaves it blank.
pub const DEFAULT_IMAGE: &str = "alpine";

/// Password and username length bounds.
pub const CREDENTIAL_LENGTH: (usize, usize) = (2, 30);

// ============================================================================
// Uploads
// ============================================================================

/// A file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent to the server.
    pub file_name: String,
    /// MIME type.
    pub mime_type: String,
    /// File bytes.
    pub content: Vec<u8>,
}

impl UploadFile {
    /// Wrap in-memory bytes, guessing the MIME type from the name.
    #[must_use]
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = guess_mime(&file_name).to_string();
        Self {
            file_name,
            mime_type,
            content,
        }
    }

    /// Read a file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, content))
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.content.len())
            .finish()
    }
}

fn guess_mime(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("tar") => "application/x-tar",
        Some("txt") => "text/plain",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("pptx") => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// A text field.
    Text {
        /// Field name.
        name: &'static str,
        /// Field value.
        value: String,
    },
    /// A file field.
    File {
        /// Field name.
        name: &'static str,
        /// The file.
        file: UploadFile,
    },
}

// ============================================================================
// Members and teams
// ============================================================================

/// Values of the member dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberForm {
    /// Full name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone_num: String,
    /// Personal number.
    pub ad: String,
    /// Rank.
    pub rank: Option<Rank>,
    /// Team name.
    pub team: String,
    /// Release date.
    #[serde(serialize_with = "serialize_midnight_utc")]
    pub leave_date: Option<NaiveDate>,
}

impl MemberForm {
    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns all failed rules.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        ValidationBuilder::new()
            .validate_min_chars("name", &self.name, 4)
            .validate_email("email", &self.email)
            .validate_phone("phoneNum", &self.phone_num)
            .validate_personal_number("ad", &self.ad)
            .validate_selected("rank", self.rank.as_ref())
            .validate_not_empty("team", &self.team)
            .validate_selected("leaveDate", self.leave_date.as_ref())
            .finish()
    }
}

fn serialize_midnight_utc<S: Serializer>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match date {
        Some(d) => serializer.serialize_str(&format!("{}T00:00:00.000Z", d.format("%Y-%m-%d"))),
        None => serializer.serialize_none(),
    }
}

/// Values of the team dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamForm {
    /// Team name.
    pub name: String,
    /// Optional team lead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_lead: Option<String>,
}

impl TeamForm {
    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns all failed rules.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut builder = ValidationBuilder::new().validate_min_chars("name", &self.name, 1);
        if let Some(lead) = &self.team_lead {
            builder = builder.validate_min_chars("teamLead", lead, 1);
        }
        builder.finish()
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Values of the software dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareForm {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// External URL.
    pub url: String,
    /// Contact emails.
    pub contacts: Vec<String>,
    /// Home-screen image, only sent on create.
    #[serde(skip)]
    pub image: Option<UploadFile>,
}

impl SoftwareForm {
    fn common(&self) -> ValidationBuilder {
        let mut builder = ValidationBuilder::new()
            .validate_min_chars("title", &self.title, 2)
            .validate_min_chars("description", &self.description, 5)
            .validate_url("url", &self.url)
            .validate_non_empty_list("contacts", self.contacts.len());
        for (i, contact) in self.contacts.iter().enumerate() {
            builder = builder.validate_email(&format!("contacts.{i}"), contact);
        }
        builder
    }

    /// Validate for creation; the image is required.
    ///
    /// # Errors
    ///
    /// Returns all failed rules.
    pub fn validate_create(&self) -> std::result::Result<(), ValidationErrors> {
        self.common()
            .validate_file(
                "image",
                self.image.as_ref().map(|f| f.file_name.as_str()),
                IMAGE_SUFFIXES,
                false,
            )
            .finish()
    }

    /// Validate for editing; the image is ignored.
    ///
    /// # Errors
    ///
    /// Returns all failed rules.
    pub fn validate_edit(&self) -> std::result::Result<(), ValidationErrors> {
        self.common().finish()
    }

    /// JSON body of an update. Never carries the image.
    #[must_use]
    pub fn update_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Multipart body of a create. Contacts are comma-joined.
    #[must_use]
    pub fn create_parts(&self) -> Vec<FormPart> {
        let mut parts = vec![
            FormPart::Text {
                name: "title",
                value: self.title.clone(),
            },
            FormPart::Text {
                name: "description",
                value: self.description.clone(),
            },
            FormPart::Text {
                name: "url",
                value: self.url.clone(),
            },
            FormPart::Text {
                name: "contacts",
                value: self.contacts.join(","),
            },
        ];
        if let Some(image) = &self.image {
            parts.push(FormPart::File {
                name: "image",
                file: image.clone(),
            });
        }
        parts
    }
}

/// Values of the system dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemForm {
    /// Title.
    pub title: String,
    /// Description, sent as `descripion`.
    #[serde(rename = "descripion")]
    pub description: String,
    /// Contact people.
    pub contacts: Vec<Contact>,
    /// System image, only sent on create.
    #[serde(skip)]
    pub image: Option<UploadFile>,
}

impl SystemForm {
    fn common(&self) -> ValidationBuilder {
        let mut builder = ValidationBuilder::new()
            .validate_min_chars("title", &self.title, 1)
            .validate_min_chars("descripion", &self.description, 1)
            .validate_non_empty_list("contacts", self.contacts.len());
        for (i, contact) in self.contacts.iter().enumerate() {
            builder = builder
                .validate_min_chars(&format!("contacts.{i}.name"), &contact.name, 1)
                .validate_email(&format!("contacts.{i}.email"), &contact.email)
                .validate_min_chars(&format!("contacts.{i}.phoneNum"), &contact.phone_num, 5);
        }
        builder
    }

    /// Validate for creation; the image is required.
    ///
    /// # Errors
    ///
    /// Returns all failed rules.
    pub fn validate_create(&self) -> std::result::Result<(), ValidationErrors> {
        self.common()
            .validate_file(
                "image",
                self.image.as_ref().map(|f| f.file_name.as_str()),
                IMAGE_SUFFIXES,
                false,
            )
            .finish()
    }

    /// Validate for editing; the image is ignored.
    ///
    /// # Errors
    ///
    /// Returns all failed rules.
    pub fn validate_edit(&self) -> std::result::Result<(), ValidationErrors> {
        self.common().finish()
    }

    /// JSON body of an update. Never carries the image.
    #[must_use]
    pub fn update_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Multipart body of a create. Contacts travel as JSON text.
    #[must_use]
    pub fn create_parts(&self) -> Vec<FormPart> {
        let contacts = serde_json::to_string(&self.contacts).unwrap_or_else(|_| "[]".to_string());
        let mut parts = vec![
            FormPart::Text {
                name: "title",
                value: self.title.clone(),
            },
            FormPart::Text {
                name: "descripion",
                value: self.description.clone(),
            },
            FormPart::Text {
                name: "contacts",
                value: contacts,
            },
        ];
        if let Some(image) = &self.image {
            parts.push(FormPart::File {
                name: "image",
                file: image.clone(),
            });
        }
        parts
    }
}

// ============================================================================
// Containers
// ============================================================================

/// Values of the container creation dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerForm {
    /// Software entry the container belongs to.
    pub project_id: String,
    /// Container name.
    pub name: String,
    /// Base image.
    pub image: String,
    /// Free-text environment variables.
    pub environment_variables: String,
    /// Host port.
    pub host_port: String,
    /// Client-generated build id.
    pub build_id: String,
    /// Build content; sent separately from the record.
    #[serde(skip)]
    pub content: Vec<UploadFile>,
}

impl Default for ContainerForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerForm {
    /// An empty form with a fresh build id and the default image.
    #[must_use]
    pub fn new() -> Self {
        Self {
            project_id: String::new(),
            name: String::new(),
            image: DEFAULT_IMAGE.to_string(),
            environment_variables: String::new(),
            host_port: String::new(),
            build_id: Uuid::new_v4().to_string(),
            content: Vec::new(),
        }
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns all failed rules.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let builder = ValidationBuilder::new()
            .validate_not_empty("projectId", &self.project_id)
            .validate_min_chars("name", &self.name, 2)
            .validate_single_file("containerContent", self.content.len());
        let builder = match self.content.as_slice() {
            [file] => builder.validate_file(
                "containerContent",
                Some(&file.file_name),
                ARCHIVE_SUFFIXES,
                true,
            ),
            _ => builder,
        };
        builder.finish()
    }

    /// JSON body of the record creation. Never carries the content.
    #[must_use]
    pub fn create_payload(&self) -> serde_json::Value {
        let mut form = self.clone();
        if form.image.trim().is_empty() {
            form.image = DEFAULT_IMAGE.to_string();
        }
        serde_json::to_value(&form).unwrap_or_default()
    }

    /// Multipart body of the build upload.
    #[must_use]
    pub fn build_parts(&self) -> Vec<FormPart> {
        self.content
            .first()
            .map(|file| FormPart::File {
                name: "file",
                file: file.clone(),
            })
            .into_iter()
            .collect()
    }
}

// ============================================================================
// Users and auth
// ============================================================================

/// Registration values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// Display name.
    pub full_name: String,
    /// Email.
    pub email: String,
    /// Username.
    pub username: String,
    /// Password, sent as `hash`.
    #[serde(rename = "hash")]
    pub password: String,
}

impl RegisterForm {
    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns all failed rules.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let (min, max) = CREDENTIAL_LENGTH;
        ValidationBuilder::new()
            .validate_email("email", &self.email)
            .validate_length_between("username", &self.username, min, max)
            .validate_length_between("hash", &self.password, min, max)
            .finish()
    }
}

/// Sign-in values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginForm {
    /// Email.
    pub email: String,
    /// Password, sent as `hash`.
    #[serde(rename = "hash")]
    pub password: String,
}

impl LoginForm {
    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns all failed rules.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let (min, max) = CREDENTIAL_LENGTH;
        ValidationBuilder::new()
            .validate_email("email", &self.email)
            .validate_length_between("hash", &self.password, min, max)
            .finish()
    }
}

/// Values of the user edit dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUserForm {
    /// Display name.
    pub full_name: String,
    /// Username.
    pub username: String,
    /// Role.
    pub role: Role,
    /// Whether the account is enabled.
    pub active: bool,
}

impl EditUserForm {
    /// Pre-filled from an existing user.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            role: user.role,
            active: user.active,
        }
    }

    /// Reject a role the editor may not grant.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RoleEscalation`] when a non-admin assigns admin.
    pub fn authorize(&self, editor: Option<&User>) -> Result<()> {
        if access::can_assign_role(editor, self.role) {
            Ok(())
        } else {
            Err(CoreError::RoleEscalation)
        }
    }
}

/// Values of the password reset dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PasswordResetForm {
    /// New password; the backend field is spelled `newPassowrd`.
    #[serde(rename = "newPassowrd")]
    pub new_password: String,
}

impl PasswordResetForm {
    /// Check the password length.
    ///
    /// # Errors
    ///
    /// Returns all failed rules.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let (min, max) = CREDENTIAL_LENGTH;
        ValidationBuilder::new()
            .validate_length_between("newPassowrd", &self.new_password, min, max)
            .finish()
    }
}

// ============================================================================
// Guides
// ============================================================================

/// Files selected in the guide upload dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuideUpload {
    /// The files.
    pub files: Vec<UploadFile>,
}

impl GuideUpload {
    /// Require at least one file.
    ///
    /// # Errors
    ///
    /// Returns all failed rules.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        ValidationBuilder::new()
            .validate_non_empty_list("files", self.files.len())
            .finish()
    }

    /// Multipart body, one repeated `files` part per file.
    #[must_use]
    pub fn parts(&self) -> Vec<FormPart> {
        self.files
            .iter()
            .map(|file| FormPart::File {
                name: "files",
                file: file.clone(),
            })
            .collect()
    }
}
