//! Field validation for console forms.
//!
//! Every form is checked with a [`ValidationBuilder`] before a request is
//! sent. The builder collects one [`ValidationError`] per failing rule so a
//! form can show all problems at once.
//!
//! ```
//! use cvt_core::ValidationBuilder;
//!
//! let result = ValidationBuilder::new()
//!     .validate_min_chars("name", "Dana Levi", 4)
//!     .validate_email("email", "dana@example.com")
//!     .finish();
//!
//! assert!(result.is_ok());
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::i18n::{self, Lang};

/// Email addresses accepted by the backend forms.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._%+'-]*[A-Za-z0-9_%+'-])?@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .unwrap_or_else(|_| unreachable!())
});

/// Phone numbers with an optional country code and separators.
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?\d{1,3}?[-.\s]?(\(?\d{1,4}\)?)[-.\s]?\d{1,4}[-.\s]?\d{1,9}$")
        .unwrap_or_else(|_| unreachable!())
});

/// Length of a personal number.
pub const PERSONAL_NUMBER_LENGTH: usize = 7;

/// Image suffixes accepted for software and system uploads.
pub const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", "jpeg"];

/// Archive suffixes accepted for container build content.
pub const ARCHIVE_SUFFIXES: &[&str] = &[".tar", ".zip"];

/// The rule a field failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A required value was empty.
    Empty,
    /// The value is shorter than allowed.
    TooShort {
        /// Minimum length in characters.
        min: usize,
        /// Actual length in characters.
        actual: usize,
    },
    /// The value is longer than allowed.
    TooLong {
        /// Maximum length in characters.
        max: usize,
        /// Actual length in characters.
        actual: usize,
    },
    /// Not an email address.
    InvalidEmail,
    /// Not an absolute URL.
    InvalidUrl,
    /// Not a phone number.
    InvalidPhone,
    /// Not a seven-digit, non-zero personal number.
    InvalidPersonalNumber,
    /// Nothing was chosen from a fixed set.
    NotSelected,
    /// A file upload was required.
    FileRequired,
    /// The file name has an unsupported suffix.
    InvalidExtension {
        /// Accepted suffixes.
        allowed: Vec<String>,
    },
    /// A list needed at least one entry.
    NoItems,
    /// Exactly one file was expected.
    SingleFileExpected {
        /// Number of files supplied.
        actual: usize,
    },
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&i18n::validation_message(Lang::En, self))
    }
}

/// A failed rule on a named field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed for '{field}': {kind}")]
pub struct ValidationError {
    /// Field path, e.g. `email` or `contacts.0.phoneNum`.
    pub field: String,
    /// The failed rule.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    /// The message shown next to the field.
    #[must_use]
    pub fn localized(&self, lang: Lang) -> String {
        i18n::validation_message(lang, &self.kind)
    }
}

/// Every error collected for one form submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// Errors recorded for `field`.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.0.iter().filter(move |e| e.field == field)
    }

    /// Whether any error was recorded for `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.for_field(field).next().is_some()
    }

    /// Number of errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check an email address.
#[must_use]
pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// Check an absolute URL.
#[must_use]
pub fn is_url(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

/// Check a phone number.
#[must_use]
pub fn is_phone(value: &str) -> bool {
    PHONE_REGEX.is_match(value)
}

/// Check a personal number: seven ASCII digits, not all zero.
#[must_use]
pub fn is_personal_number(value: &str) -> bool {
    value.len() == PERSONAL_NUMBER_LENGTH
        && value.bytes().all(|b| b.is_ascii_digit())
        && value.bytes().any(|b| b != b'0')
}

/// Check a file name against accepted suffixes.
#[must_use]
pub fn has_suffix(name: &str, suffixes: &[&str], ignore_case: bool) -> bool {
    if ignore_case {
        let lower = name.to_lowercase();
        suffixes.iter().any(|s| lower.ends_with(&s.to_lowercase()))
    } else {
        suffixes.iter().any(|s| name.ends_with(s))
    }
}

/// Collects validation failures across a form.
#[derive(Debug, Default)]
pub struct ValidationBuilder {
    errors: Vec<ValidationError>,
}

impl ValidationBuilder {
    /// Create a new validation builder.
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add a custom check.
    #[must_use]
    pub fn validate<F>(mut self, check: F) -> Self
    where
        F: FnOnce() -> Result<(), ValidationError>,
    {
        if let Err(e) = check() {
            self.errors.push(e);
        }
        self
    }

    fn push(mut self, field: &str, kind: ValidationErrorKind) -> Self {
        self.errors.push(ValidationError::new(field, kind));
        self
    }

    /// Validate that a value is not blank.
    #[must_use]
    pub fn validate_not_empty(self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.push(field, ValidationErrorKind::Empty)
        } else {
            self
        }
    }

    /// Validate a minimum length in characters.
    #[must_use]
    pub fn validate_min_chars(self, field: &str, value: &str, min: usize) -> Self {
        let actual = value.chars().count();
        if actual < min {
            self.push(field, ValidationErrorKind::TooShort { min, actual })
        } else {
            self
        }
    }

    /// Validate an inclusive length range; reports at most one error.
    #[must_use]
    pub fn validate_length_between(self, field: &str, value: &str, min: usize, max: usize) -> Self {
        let actual = value.chars().count();
        if actual < min {
            self.push(field, ValidationErrorKind::TooShort { min, actual })
        } else if actual > max {
            self.push(field, ValidationErrorKind::TooLong { max, actual })
        } else {
            self
        }
    }

    /// Validate an email address.
    #[must_use]
    pub fn validate_email(self, field: &str, value: &str) -> Self {
        if is_email(value) {
            self
        } else {
            self.push(field, ValidationErrorKind::InvalidEmail)
        }
    }

    /// Validate an absolute URL.
    #[must_use]
    pub fn validate_url(self, field: &str, value: &str) -> Self {
        if is_url(value) {
            self
        } else {
            self.push(field, ValidationErrorKind::InvalidUrl)
        }
    }

    /// Validate a phone number.
    #[must_use]
    pub fn validate_phone(self, field: &str, value: &str) -> Self {
        if is_phone(value) {
            self
        } else {
            self.push(field, ValidationErrorKind::InvalidPhone)
        }
    }

    /// Validate a personal number. An empty value reports [`ValidationErrorKind::Empty`].
    #[must_use]
    pub fn validate_personal_number(self, field: &str, value: &str) -> Self {
        if value.is_empty() {
            self.push(field, ValidationErrorKind::Empty)
        } else if is_personal_number(value) {
            self
        } else {
            self.push(field, ValidationErrorKind::InvalidPersonalNumber)
        }
    }

    /// Validate that a choice was made.
    #[must_use]
    pub fn validate_selected<T>(self, field: &str, value: Option<&T>) -> Self {
        if value.is_some() {
            self
        } else {
            self.push(field, ValidationErrorKind::NotSelected)
        }
    }

    /// Validate a required file name against accepted suffixes.
    #[must_use]
    pub fn validate_file(
        self,
        field: &str,
        name: Option<&str>,
        suffixes: &[&str],
        ignore_case: bool,
    ) -> Self {
        match name {
            None => self.push(field, ValidationErrorKind::FileRequired),
            Some(name) if has_suffix(name, suffixes, ignore_case) => self,
            Some(_) => self.push(
                field,
                ValidationErrorKind::InvalidExtension {
                    allowed: suffixes.iter().map(|s| (*s).to_string()).collect(),
                },
            ),
        }
    }

    /// Validate that exactly one file was supplied.
    #[must_use]
    pub fn validate_single_file(self, field: &str, count: usize) -> Self {
        if count == 1 {
            self
        } else {
            self.push(field, ValidationErrorKind::SingleFileExpected { actual: count })
        }
    }

    /// Validate that a list has at least one entry.
    #[must_use]
    pub fn validate_non_empty_list(self, field: &str, len: usize) -> Self {
        if len == 0 {
            self.push(field, ValidationErrorKind::NoItems)
        } else {
            self
        }
    }

    /// Check if any errors have been collected.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the number of errors collected.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Finish validation, returning every collected error on failure.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test]
    fn builder_all_pass() {
        let result = ValidationBuilder::new()
            .validate_not_empty("name", "test")
            .validate_min_chars("name", "test", 4)
            .finish();
        assert!(result.is_ok());
    }

    #[test]
    fn builder_collects_every_failure() {
        let errors = ValidationBuilder::new()
            .validate_not_empty("name", "  ")
            .validate_email("email", "nope")
            .validate_phone("phoneNum", "abc")
            .finish()
            .unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.has_field("email"));
        assert!(!errors.has_field("ad"));
    }

    #[test]
    fn builder_has_errors() {
        let builder = ValidationBuilder::new().validate_not_empty("name", "");
        assert!(builder.has_errors());
        assert_eq!(builder.error_count(), 1);
    }

    #[test]
    fn min_chars_counts_characters_not_bytes() {
        assert!(ValidationBuilder::new()
            .validate_min_chars("name", "דנה לוי", 4)
            .finish()
            .is_ok());
    }

    #[test]
    fn length_between_reports_once() {
        let errors = ValidationBuilder::new()
            .validate_length_between("username", "a", 2, 30)
            .finish()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.0[0].kind,
            ValidationErrorKind::TooShort { min: 2, actual: 1 }
        );
    }

    #[test_case("050-1234567", true ; "local with dash")]
    #[test_case("+972 50 123 4567", true ; "international spaced")]
    #[test_case("(03) 1234567", true ; "area code in parens")]
    #[test_case("0501234567", true ; "digits only")]
    #[test_case("phone", false ; "letters")]
    #[test_case("", false ; "empty")]
    fn phone_pattern(input: &str, valid: bool) {
        assert_eq!(is_phone(input), valid);
    }

    #[test_case("1234567", true ; "seven digits")]
    #[test_case("0000001", true ; "leading zeros")]
    #[test_case("0000000", false ; "all zero")]
    #[test_case("123456", false ; "six digits")]
    #[test_case("12345678", false ; "eight digits")]
    #[test_case("12a4567", false ; "letter inside")]
    fn personal_number(input: &str, valid: bool) {
        assert_eq!(is_personal_number(input), valid);
    }

    #[test]
    fn empty_personal_number_is_reported_as_empty() {
        let errors = ValidationBuilder::new()
            .validate_personal_number("ad", "")
            .finish()
            .unwrap_err();
        assert_eq!(errors.0[0].kind, ValidationErrorKind::Empty);
    }

    #[test_case("https://example.com/app", true ; "https")]
    #[test_case("http://vm0099cvt:4000", true ; "host and port")]
    #[test_case("example.com", false ; "no scheme")]
    #[test_case("", false ; "empty")]
    fn url_check(input: &str, valid: bool) {
        assert_eq!(is_url(input), valid);
    }

    #[test_case("screen.png", true ; "png")]
    #[test_case("screen.jpeg", true ; "jpeg")]
    #[test_case("screenjpeg", true ; "jpeg without dot")]
    #[test_case("screen.PNG", false ; "uppercase is rejected")]
    #[test_case("screen.gif", false ; "gif")]
    fn image_suffix(name: &str, valid: bool) {
        assert_eq!(has_suffix(name, IMAGE_SUFFIXES, false), valid);
    }

    #[test]
    fn archive_suffix_ignores_case() {
        assert!(has_suffix("build.TAR", ARCHIVE_SUFFIXES, true));
        assert!(has_suffix("build.zip", ARCHIVE_SUFFIXES, true));
        assert!(!has_suffix("build.tar.gz", ARCHIVE_SUFFIXES, true));
    }

    #[test]
    fn missing_file_is_required() {
        let errors = ValidationBuilder::new()
            .validate_file("image", None, IMAGE_SUFFIXES, false)
            .finish()
            .unwrap_err();
        assert_eq!(errors.0[0].kind, ValidationErrorKind::FileRequired);
    }

    #[test]
    fn errors_display_joins_messages() {
        let errors = ValidationBuilder::new()
            .validate_not_empty("team", "")
            .validate_non_empty_list("contacts", 0)
            .finish()
            .unwrap_err();
        let text = errors.to_string();
        assert!(text.contains("'team'"));
        assert!(text.contains("'contacts'"));
        assert!(text.contains("; "));
    }

    #[test]
    fn localized_message_differs_per_language() {
        let err = ValidationError::new("email", ValidationErrorKind::InvalidEmail);
        assert_ne!(err.localized(Lang::He), err.localized(Lang::En));
    }

    proptest! {
        #[test]
        fn prop_simple_emails_pass(
            local in "[a-z][a-z0-9._]{0,15}[a-z0-9]",
            domain in "[a-z][a-z0-9-]{0,15}[a-z0-9]",
            tld in "[a-z]{2,6}"
        ) {
            let email = format!("{local}@{domain}.{tld}");
            prop_assert!(is_email(&email));
        }

        #[test]
        fn prop_emails_without_at_fail(value in "[a-z0-9.]{1,30}") {
            prop_assert!(!is_email(&value));
        }

        #[test]
        fn prop_seven_digit_numbers_pass(n in 1u32..10_000_000) {
            let ad = format!("{n:07}");
            prop_assert!(is_personal_number(&ad));
        }

        #[test]
        fn prop_min_chars_matches_count(value in "\\PC{0,40}", min in 0usize..40) {
            let ok = ValidationBuilder::new()
                .validate_min_chars("f", &value, min)
                .finish()
                .is_ok();
            prop_assert_eq!(ok, value.chars().count() >= min);
        }
    }
}
