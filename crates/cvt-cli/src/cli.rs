//! Command-line argument parsing with clap.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cvt_client::Environment;
use cvt_core::{Contact, Lang, Rank, Role, Route};

/// CVT console - personnel, catalog and container administration.
#[derive(Parser, Debug, Clone)]
#[command(name = "cvt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Backend URL; overrides `--env`.
    #[arg(long, env = "CVT_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Deployment environment selecting the default backend.
    #[arg(long = "env", env = "CVT_ENV", default_value = "production", global = true)]
    pub environment: Environment,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Message language (he or en).
    #[arg(long, env = "CVT_LANG", default_value = "he", global = true)]
    pub lang: Lang,

    /// Where the session cookie is kept between runs.
    #[arg(long, env = "CVT_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Log requests and state changes to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in, sign out and identity.
    Auth {
        /// Auth subcommand to execute.
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Navigation and team overview.
    Dashboard,

    /// Personnel records.
    Member {
        /// Member subcommand to execute.
        #[command(subcommand)]
        command: MemberCommands,
    },

    /// Teams.
    Team {
        /// Team subcommand to execute.
        #[command(subcommand)]
        command: TeamCommands,
    },

    /// Software catalog.
    Software {
        /// Software subcommand to execute.
        #[command(subcommand)]
        command: SoftwareCommands,
    },

    /// Systems catalog.
    System {
        /// System subcommand to execute.
        #[command(subcommand)]
        command: SystemCommands,
    },

    /// User accounts.
    User {
        /// User subcommand to execute.
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Guide documents.
    Guide {
        /// Guide subcommand to execute.
        #[command(subcommand)]
        command: GuideCommands,
    },

    /// Containers, builds and logs.
    Container {
        /// Container subcommand to execute.
        #[command(subcommand)]
        command: ContainerCommands,
    },
}

impl Commands {
    /// Page of the console this command belongs to.
    #[must_use]
    pub const fn route(&self) -> Route {
        match self {
            Self::Auth { .. } | Self::Dashboard | Self::Member { .. } | Self::Team { .. } => {
                Route::Dashboard
            }
            Self::Software { .. } => Route::Software,
            Self::System { .. } => Route::Systems,
            Self::User { .. } => Route::Users,
            Self::Guide { .. } => Route::Guides,
            Self::Container { .. } => Route::Containers,
        }
    }
}

/// Auth subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommands {
    /// Sign in and keep the session cookie.
    Login {
        /// Account email.
        #[arg(short, long)]
        email: String,

        /// Account password.
        #[arg(short, long, env = "CVT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in.
    Register {
        /// Display name.
        #[arg(long)]
        full_name: String,

        /// Account email.
        #[arg(short, long)]
        email: String,

        /// Login handle.
        #[arg(short, long)]
        username: String,

        /// Account password.
        #[arg(short, long, env = "CVT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the session.
    Logout,

    /// Show the signed-in user.
    Whoami,
}

/// Member subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum MemberCommands {
    /// List personnel.
    #[command(alias = "ls")]
    List,

    /// Show one member.
    Get {
        /// Member ID.
        id: String,
    },

    /// Add a member.
    Add(MemberArgs),

    /// Update a member; omitted fields keep their value.
    Update {
        /// Member ID.
        id: String,

        /// New values.
        #[command(flatten)]
        fields: MemberArgs,
    },

    /// Delete a member.
    #[command(alias = "rm")]
    Remove {
        /// Member ID.
        id: String,
    },
}

/// Fields of the member dialog.
#[derive(Args, Debug, Clone, Default)]
pub struct MemberArgs {
    /// Full name.
    #[arg(long)]
    pub name: Option<String>,

    /// Contact email.
    #[arg(long)]
    pub email: Option<String>,

    /// Contact phone.
    #[arg(long)]
    pub phone: Option<String>,

    /// Seven-digit personal number.
    #[arg(long)]
    pub ad: Option<String>,

    /// Rank, Hebrew or English name (e.g. `sergeant`).
    #[arg(long)]
    pub rank: Option<Rank>,

    /// Team name.
    #[arg(long)]
    pub team: Option<String>,

    /// Release date (YYYY-MM-DD).
    #[arg(long)]
    pub leave_date: Option<NaiveDate>,
}

/// Team subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum TeamCommands {
    /// List teams with member counts.
    #[command(alias = "ls")]
    List,

    /// Create a team.
    Add {
        /// Team name.
        name: String,

        /// Team lead reference.
        #[arg(long)]
        lead: Option<String>,
    },

    /// Rename a team or change its lead.
    Update {
        /// Team ID.
        id: String,

        /// New name.
        #[arg(long)]
        name: Option<String>,

        /// New team lead reference.
        #[arg(long)]
        lead: Option<String>,
    },

    /// Delete a team.
    #[command(alias = "rm")]
    Remove {
        /// Team ID.
        id: String,
    },
}

/// Software subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SoftwareCommands {
    /// List software entries.
    #[command(alias = "ls")]
    List,

    /// Add a software entry; requires an image.
    Add(SoftwareArgs),

    /// Update a software entry; the image cannot be changed.
    Update {
        /// Software ID.
        id: String,

        /// New values.
        #[command(flatten)]
        fields: SoftwareArgs,
    },

    /// Delete a software entry.
    #[command(alias = "rm")]
    Remove {
        /// Software ID.
        id: String,
    },
}

/// Fields of the software dialog.
#[derive(Args, Debug, Clone, Default)]
pub struct SoftwareArgs {
    /// Title.
    #[arg(long)]
    pub title: Option<String>,

    /// Description.
    #[arg(long)]
    pub description: Option<String>,

    /// Address of the software.
    #[arg(long)]
    pub url: Option<String>,

    /// Contact email; repeat for several.
    #[arg(long = "contact")]
    pub contacts: Vec<String>,

    /// Image file (jpg, jpeg or png).
    #[arg(long)]
    pub image: Option<PathBuf>,
}

/// System subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SystemCommands {
    /// List systems.
    #[command(alias = "ls")]
    List,

    /// Add a system; requires an image.
    Add(SystemArgs),

    /// Update a system; the image cannot be changed.
    Update {
        /// System ID.
        id: String,

        /// New values.
        #[command(flatten)]
        fields: SystemArgs,
    },

    /// Delete a system.
    #[command(alias = "rm")]
    Remove {
        /// System ID.
        id: String,
    },
}

/// Fields of the system dialog.
#[derive(Args, Debug, Clone, Default)]
pub struct SystemArgs {
    /// Title.
    #[arg(long)]
    pub title: Option<String>,

    /// Description.
    #[arg(long)]
    pub description: Option<String>,

    /// Contact as `NAME,EMAIL,PHONE`; repeat for several.
    #[arg(long = "contact", value_parser = parse_contact)]
    pub contacts: Vec<Contact>,

    /// Image file (jpg, jpeg or png).
    #[arg(long)]
    pub image: Option<PathBuf>,
}

/// User subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum UserCommands {
    /// List accounts.
    #[command(alias = "ls")]
    List,

    /// Change an account; omitted fields keep their value.
    Edit {
        /// User ID.
        id: String,

        /// Display name.
        #[arg(long)]
        full_name: Option<String>,

        /// Login handle.
        #[arg(long)]
        username: Option<String>,

        /// Role (user, tech or admin).
        #[arg(long)]
        role: Option<Role>,

        /// Enable or disable the account.
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete an account other than your own.
    #[command(alias = "rm")]
    Remove {
        /// User ID.
        id: String,
    },

    /// Set a new password for an account.
    ResetPassword {
        /// User ID.
        id: String,

        /// New password.
        #[arg(short, long, env = "CVT_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Print the full ID of an account matched by ID prefix, username or email.
    CopyId {
        /// ID prefix, username or email.
        query: String,
    },
}

/// Guide subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum GuideCommands {
    /// List guide files.
    #[command(alias = "ls")]
    List,

    /// Upload one or more files.
    Upload {
        /// Files to upload.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Delete one or more files.
    #[command(alias = "rm")]
    Remove {
        /// File IDs.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Download one file.
    Download {
        /// File ID.
        id: String,

        /// Destination; defaults to the original file name.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download every file as one archive.
    DownloadAll {
        /// Destination.
        #[arg(short, long, default_value = "guides.zip")]
        output: PathBuf,

        /// Only print the archive address.
        #[arg(long)]
        url_only: bool,
    },

    /// Print the address that displays a file.
    ViewUrl {
        /// File ID.
        id: String,
    },
}

/// Container subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ContainerCommands {
    /// List containers.
    #[command(alias = "ls")]
    List {
        /// Refresh the list until interrupted.
        #[arg(short, long)]
        watch: bool,
    },

    /// Create a container record and upload its build content.
    Create(CreateContainerArgs),

    /// Show the lifecycle state of a container.
    State {
        /// Record ID, runtime ID or name.
        id: String,
    },

    /// Start a container.
    Start {
        /// Record ID, runtime ID or name.
        id: String,
    },

    /// Stop a container.
    Stop {
        /// Record ID, runtime ID or name.
        id: String,
    },

    /// Restart a container.
    Restart {
        /// Record ID, runtime ID or name.
        id: String,
    },

    /// Remove a container.
    #[command(alias = "rm")]
    Remove {
        /// Record ID, runtime ID or name.
        id: String,
    },

    /// Show the build and runtime log.
    Logs(LogsArgs),
}

/// Fields of the container creation dialog.
#[derive(Args, Debug, Clone)]
pub struct CreateContainerArgs {
    /// Software entry the container belongs to.
    #[arg(long)]
    pub project: String,

    /// Container name.
    #[arg(long)]
    pub name: String,

    /// Base image; empty means `alpine`.
    #[arg(long, default_value = "alpine")]
    pub image: String,

    /// Environment variables as free text.
    #[arg(long, default_value = "")]
    pub env_vars: String,

    /// Published host port.
    #[arg(long, default_value = "")]
    pub port: String,

    /// Build archive (zip, tar, gz or rar).
    #[arg(long)]
    pub file: PathBuf,

    /// Follow the build log after uploading.
    #[arg(long)]
    pub follow: bool,
}

/// Options of the log viewer.
#[derive(Args, Debug, Clone)]
pub struct LogsArgs {
    /// Record ID, runtime ID or name.
    pub id: String,

    /// Keep streaming until interrupted.
    #[arg(short = 'F', long)]
    pub follow: bool,

    /// Seconds to collect output when not following.
    #[arg(long, default_value_t = 5)]
    pub wait: u64,

    /// Write the transcript to a file; `-` picks the default name.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Parse `NAME,EMAIL,PHONE`.
fn parse_contact(raw: &str) -> Result<Contact, String> {
    let mut parts = raw.splitn(3, ',').map(str::trim);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(email), Some(phone)) => Ok(Contact {
            name: name.to_string(),
            email: email.to_string(),
            phone_num: phone.to_string(),
        }),
        _ => Err(format!("expected NAME,EMAIL,PHONE, got `{raw}`")),
    }
}
