//! Message catalogues.
//!
//! Hebrew is the console's native language and the default; English is
//! provided for operators and log output.

use std::fmt;
use std::str::FromStr;

use crate::access::Route;
use crate::build_log::{FooterStatus, Hint, Note};
use crate::controls::Action;
use crate::types::ContainerState;
use crate::validation::ValidationErrorKind;

/// Display language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Lang {
    /// Hebrew.
    #[default]
    He,
    /// English.
    En,
}

impl Lang {
    /// Language code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::He => "he",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "he" | "hebrew" => Ok(Self::He),
            "en" | "english" => Ok(Self::En),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Message for a failed validation rule.
#[must_use]
pub fn validation_message(lang: Lang, kind: &ValidationErrorKind) -> String {
    use ValidationErrorKind as K;
    match (lang, kind) {
        (Lang::He, K::Empty) => "שדה חובה".to_string(),
        (Lang::En, K::Empty) => "this field is required".to_string(),
        (Lang::He, K::TooShort { min, .. }) => format!("קצר מידי, נדרשים לפחות {min} תווים"),
        (Lang::En, K::TooShort { min, actual }) => {
            format!("too short: {actual} chars, at least {min} required")
        }
        (Lang::He, K::TooLong { max, .. }) => format!("ארוך מידי, מותרים עד {max} תווים"),
        (Lang::En, K::TooLong { max, actual }) => {
            format!("too long: {actual} chars, at most {max} allowed")
        }
        (Lang::He, K::InvalidEmail) => "כתובת מייל לא תקינה".to_string(),
        (Lang::En, K::InvalidEmail) => "invalid email address".to_string(),
        (Lang::He, K::InvalidUrl) => "כתובת URL לא תקינה".to_string(),
        (Lang::En, K::InvalidUrl) => "invalid URL".to_string(),
        (Lang::He, K::InvalidPhone) => "מספר טלפון לא תקין".to_string(),
        (Lang::En, K::InvalidPhone) => "invalid phone number".to_string(),
        (Lang::He, K::InvalidPersonalNumber) => "מספר אישי צריך להיות מורכב משבע ספרות".to_string(),
        (Lang::En, K::InvalidPersonalNumber) => {
            "personal number must be seven digits".to_string()
        }
        (Lang::He, K::NotSelected) => "יש לבחור ערך".to_string(),
        (Lang::En, K::NotSelected) => "a value must be selected".to_string(),
        (Lang::He, K::FileRequired) => "יש לעלות קובץ".to_string(),
        (Lang::En, K::FileRequired) => "a file is required".to_string(),
        (Lang::He, K::InvalidExtension { allowed }) => {
            format!("ניתן להעלות רק קבצים מסוג: {}", allowed.join(", "))
        }
        (Lang::En, K::InvalidExtension { allowed }) => {
            format!("only these file types are accepted: {}", allowed.join(", "))
        }
        (Lang::He, K::NoItems) => "נדרש לפחות פריט אחד".to_string(),
        (Lang::En, K::NoItems) => "at least one entry is required".to_string(),
        (Lang::He, K::SingleFileExpected { .. }) => "יש לעלות קובץ אחד בלבד".to_string(),
        (Lang::En, K::SingleFileExpected { actual }) => {
            format!("exactly one file expected, got {actual}")
        }
    }
}

// ============================================================================
// Build log viewer
// ============================================================================

/// Transcript note text.
#[must_use]
pub fn note(lang: Lang, note: &Note) -> String {
    match (lang, note) {
        (Lang::He, Note::Connecting(target)) => format!("🔗 מתחבר לקונטיינר {target}..."),
        (Lang::En, Note::Connecting(target)) => format!("🔗 connecting to container {target}..."),
        (Lang::He, Note::BuildStarted) => "🔨 מתחיל תהליך בנייה...".to_string(),
        (Lang::En, Note::BuildStarted) => "🔨 build started...".to_string(),
        (Lang::He, Note::ContainerId(short)) => format!("📋 מזהה קונטיינר: {short}..."),
        (Lang::En, Note::ContainerId(short)) => format!("📋 container id: {short}..."),
        (Lang::He, Note::BuildComplete) => "✅ תהליך הבנייה הושלם בהצלחה".to_string(),
        (Lang::En, Note::BuildComplete) => "✅ build completed".to_string(),
        (Lang::He, Note::BuildFailed) => "❌ תהליך הבנייה נכשל".to_string(),
        (Lang::En, Note::BuildFailed) => "❌ build failed".to_string(),
        (Lang::He, Note::ContainerStarting) => "🚀 הקונטיינר מתחיל לעבוד...".to_string(),
        (Lang::En, Note::ContainerStarting) => "🚀 container starting...".to_string(),
        (Lang::He, Note::ContainerStopped) => "⏹️ הקונטיינר נעצר".to_string(),
        (Lang::En, Note::ContainerStopped) => "⏹️ container stopped".to_string(),
        (Lang::He, Note::ContainerError) => "❌ שגיאה בקונטיינר".to_string(),
        (Lang::En, Note::ContainerError) => "❌ container error".to_string(),
        (Lang::He, Note::BuildDetected) => "🔨 זוהה תחילת תהליך בנייה...".to_string(),
        (Lang::En, Note::BuildDetected) => "🔨 build detected...".to_string(),
        (Lang::He, Note::StreamLost) => "⚠️ חיבור SSE נותק במהלך בנייה".to_string(),
        (Lang::En, Note::StreamLost) => "⚠️ log stream lost during build".to_string(),
        (Lang::He, Note::StoppedTailing) => "⏹️ הפסקת הצגת לוגים".to_string(),
        (Lang::En, Note::StoppedTailing) => "⏹️ stopped tailing logs".to_string(),
    }
}

/// Badge label for a recognized container state; `None` for [`ContainerState::Unknown`].
#[must_use]
pub const fn state_label(lang: Lang, state: ContainerState) -> Option<&'static str> {
    use ContainerState as S;
    match (lang, state) {
        (Lang::He, S::Running) => Some("פועל"),
        (Lang::He, S::Exited) => Some("נעצר"),
        (Lang::He, S::Paused) => Some("מושהה"),
        (Lang::He, S::Restarting) => Some("מתחיל מחדש"),
        (Lang::He, S::Dead) => Some("מת"),
        (Lang::He, S::Created) => Some("נוצר"),
        (Lang::En, S::Running) => Some("running"),
        (Lang::En, S::Exited) => Some("stopped"),
        (Lang::En, S::Paused) => Some("paused"),
        (Lang::En, S::Restarting) => Some("restarting"),
        (Lang::En, S::Dead) => Some("dead"),
        (Lang::En, S::Created) => Some("created"),
        (_, S::Unknown) => None,
    }
}

/// Label for a value that is missing or not recognized.
#[must_use]
pub const fn unknown_label(lang: Lang) -> &'static str {
    match lang {
        Lang::He => "לא ידוע",
        Lang::En => "unknown",
    }
}

/// Badge label while a build runs.
#[must_use]
pub const fn building_label(lang: Lang) -> &'static str {
    match lang {
        Lang::He => "בבנייה",
        Lang::En => "building",
    }
}

/// Title and detail of a viewer hint.
#[must_use]
pub const fn hint(lang: Lang, hint: Hint) -> (&'static str, &'static str) {
    match (lang, hint) {
        (Lang::He, Hint::SearchingForUpdates) => (
            "מחפש עדכונים..",
            "פעולות שליטה בקונטיינר אינן זמינות במהלך חיפוש עדכונים",
        ),
        (Lang::En, Hint::SearchingForUpdates) => (
            "searching for updates..",
            "container controls are unavailable while searching for updates",
        ),
        (Lang::He, Hint::BuildInProgress) => (
            "תהליך בנייה מתבצע כעת",
            "פעולות שליטה בקונטיינר אינן זמינות במהלך תהליך הבנייה",
        ),
        (Lang::En, Hint::BuildInProgress) => (
            "build in progress",
            "container controls are unavailable while the build runs",
        ),
    }
}

/// Footer status label.
#[must_use]
pub const fn footer(lang: Lang, status: FooterStatus) -> &'static str {
    match (lang, status) {
        (Lang::He, FooterStatus::Building) => "בבנייה",
        (Lang::He, FooterStatus::Running) => "פועל",
        (Lang::He, FooterStatus::Connected) => "מחובר",
        (Lang::He, FooterStatus::Disconnected) => "לא מחובר",
        (Lang::En, FooterStatus::Building) => "building",
        (Lang::En, FooterStatus::Running) => "running",
        (Lang::En, FooterStatus::Connected) => "connected",
        (Lang::En, FooterStatus::Disconnected) => "disconnected",
    }
}

/// Notification after a lifecycle action.
#[must_use]
pub const fn action_result(lang: Lang, action: Action, ok: bool) -> &'static str {
    match (lang, action, ok) {
        (Lang::He, Action::Start, true) => "קונטיינר התחיל לעבוד בהצלחה!",
        (Lang::He, Action::Start, false) => "נכשל בעת התחלת הקונטיינר",
        (Lang::He, Action::Stop, true) => "קונטיינר נעצר בהצלחה!",
        (Lang::He, Action::Stop, false) => "נכשל בעת עצירת הקונטיינר",
        (Lang::He, Action::Restart, true) => "קונטיינר אותחל בהצלחה!",
        (Lang::He, Action::Restart, false) => "נכשל באיתחול הקונטיינר",
        (Lang::He, Action::Remove, true) => "קונטיינר נמחק בהצלחה",
        (Lang::He, Action::Remove, false) => "נכשל במחיקת קונטיינר",
        (Lang::En, Action::Start, true) => "container started",
        (Lang::En, Action::Start, false) => "failed to start the container",
        (Lang::En, Action::Stop, true) => "container stopped",
        (Lang::En, Action::Stop, false) => "failed to stop the container",
        (Lang::En, Action::Restart, true) => "container restarted",
        (Lang::En, Action::Restart, false) => "failed to restart the container",
        (Lang::En, Action::Remove, true) => "container removed",
        (Lang::En, Action::Remove, false) => "failed to remove the container",
    }
}

// ============================================================================
// Navigation and notices
// ============================================================================

/// Navigation label of a route.
#[must_use]
pub const fn nav_label(lang: Lang, route: Route) -> &'static str {
    match (lang, route) {
        (Lang::He, Route::Dashboard) => "כוח אדם",
        (Lang::He, Route::Users) => "ניהול משתמשים",
        (Lang::He, Route::Guides) => "ספרות והדרכה",
        (Lang::He, Route::Systems) => "ניהול מערכות",
        (Lang::He, Route::Software) => "ניהול תוכנות",
        (Lang::He, Route::Containers) => "ניהול קונטיינרים",
        (Lang::En, Route::Dashboard) => "Personnel",
        (Lang::En, Route::Users) => "User management",
        (Lang::En, Route::Guides) => "Guides",
        (Lang::En, Route::Systems) => "Systems",
        (Lang::En, Route::Software) => "Software",
        (Lang::En, Route::Containers) => "Containers",
    }
}

/// Tooltip on a locked navigation item.
#[must_use]
pub const fn locked_hint(lang: Lang) -> &'static str {
    match lang {
        Lang::He => "יש להירשם כטכנאי או מנהל כדי לפתוח את החלון הזה",
        Lang::En => "sign in as a technician or admin to open this page",
    }
}

/// What a notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    /// A personnel record.
    Member,
    /// A team.
    Team,
    /// A software entry.
    Software,
    /// A systems record.
    System,
    /// A console user.
    User,
    /// Guide files.
    Guides,
    /// A container record.
    Container,
    /// The current session.
    Session,
}

/// The mutation a notice reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Create.
    Create,
    /// Update.
    Update,
    /// Delete.
    Delete,
    /// Upload.
    Upload,
    /// Build container content.
    Build,
    /// Password reset.
    PasswordReset,
    /// Sign in.
    Login,
    /// Register.
    Register,
}

/// Success or failure notice for a mutation.
#[must_use]
pub fn notice(lang: Lang, subject: Subject, op: Op, ok: bool) -> String {
    use Op as O;
    use Subject as S;
    let he = match (subject, op, ok) {
        (S::Member, O::Create, true) => Some("חייל נוסף לכוח אדם בהצלחה"),
        (S::Member, O::Create, false) => Some("נכשל בעת הוספת חייל לכוח אדם"),
        (S::Member, O::Update, true) => Some("פרטי החייל עודכנו בהצלחה"),
        (S::Member, O::Update, false) => Some("נכשל בלעדכן את פרטי החייל"),
        (S::Team, O::Create, true) => Some("הצוות נוצר בהצלחה"),
        (S::Team, O::Create, false) => Some("נכשל בעת יצירת צוות!"),
        (S::Team, O::Update, true) => Some("הצוות עודכן בהצלחה"),
        (S::Team, O::Update, false) => Some("נכשל בעת עדכון הצוות!"),
        (S::Team, O::Delete, true) => Some("צוות נמחק בהצלחה"),
        (S::Software, O::Create, false) => Some("יצירת תוכנה לא הצליחה"),
        (S::Software, O::Update, false) => Some("עדכון תוכנה לא הצליחה"),
        (S::Software, O::Delete, false) => Some("מחיקת תוכנה לא הצליחה"),
        (S::System, O::Create, true) => Some("מערכת נוצרה בהצלחה"),
        (S::System, O::Create, false) => Some("יצירת מערכת לא הצליחה"),
        (S::System, O::Update, true) => Some("מערכת עודכנה בהצלחה"),
        (S::System, O::Update, false) => Some("עדכון מערכת לא הצליח."),
        (S::System, O::Delete, true) => Some("מערכת נמחקה בהצלחה"),
        (S::System, O::Delete, false) => Some("מחיקת מערכת לא הצליחה."),
        (S::User, O::Update | O::PasswordReset, true) => Some("פרטי משתמש עודכנו בהצלחה!"),
        (S::User, O::Update | O::PasswordReset, false) => {
            Some("נכשל בעת עדכון פרטי משתמש, נסו שוב מאוחר יותר.")
        }
        (S::Guides, O::Upload, true) => Some("קבצים הועלו בהצלחה!"),
        (S::Guides, O::Upload, false) => Some("נכשל בעת העלאת הקבצים"),
        (S::Container, O::Create, true) => Some(
            "נוצר קונטיינר חדש! ניתן להיכנס לחלונית השליטה כדי לבצע פעולות ולהסתכל על תהליך הבנייה.",
        ),
        (S::Container, O::Create, false) => {
            Some("נכשל בעת יצירת הקונטיינר, יש לבדוק את הנתונים שהזנתם.")
        }
        (S::Container, O::Build, true) => {
            Some("הקונטיינר שלך בנוי! ניתן להריץ אותו כעת ולהתחיל את הפרויקט.")
        }
        (S::Container, O::Build, false) => {
            Some("נכשל בעת תהליך בניית הקונטיינר, בדוק רשומות של הקונטיינר כדי למצוא שגיאות.")
        }
        (S::Session, O::Login | O::Register, true) => Some("ברוך הבא!"),
        (S::Session, O::Login, false) => Some("נראה שלא הצלחת להתחבר"),
        (S::Session, O::Register, false) => Some("נראה שלא הצלחת ליצור משתמש"),
        _ => None,
    };
    match lang {
        Lang::He => he.map_or_else(
            || (if ok { "הפעולה הושלמה בהצלחה" } else { "הפעולה נכשלה" }).to_string(),
            ToString::to_string,
        ),
        Lang::En => english_notice(subject, op, ok),
    }
}

fn english_notice(subject: Subject, op: Op, ok: bool) -> String {
    match (op, ok) {
        (Op::Login | Op::Register, true) => return "welcome!".to_string(),
        (Op::Login, false) => return "sign-in failed".to_string(),
        (Op::Register, false) => return "registration failed".to_string(),
        _ => {}
    }
    let noun = match subject {
        Subject::Member => "member",
        Subject::Team => "team",
        Subject::Software => "software entry",
        Subject::System => "system",
        Subject::User => "user",
        Subject::Guides => "guide files",
        Subject::Container => "container",
        Subject::Session => "session",
    };
    let verb = match op {
        Op::Create => "create",
        Op::Update => "update",
        Op::Delete => "delete",
        Op::Upload => "upload",
        Op::Build => "build",
        Op::PasswordReset => "reset the password of",
        Op::Login | Op::Register => "sign in",
    };
    if ok {
        format!("{noun}: {verb} succeeded")
    } else {
        format!("failed to {verb} {noun}")
    }
}

/// Refusal shown when a technician tries to grant the admin role.
#[must_use]
pub const fn role_escalation(lang: Lang) -> &'static str {
    match lang {
        Lang::He => "נכשל, לא ניתן לסווג לרמת מנהל כאשר אתה טכנאי.",
        Lang::En => "only an admin can assign the admin role",
    }
}
