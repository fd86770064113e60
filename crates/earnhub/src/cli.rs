//! Clap derive structures for the `earnhub` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// earnhub -- browse offers, track clicks, and check rewards
#[derive(Debug, Parser)]
#[command(
    name = "earnhub",
    version,
    about = "Browse EarnHub offers and track your rewards from the command line",
    long_about = "Command-line client for the EarnHub referral-reward platform.\n\n\
        Opening an offer registers a tracked click with the backend and prints\n\
        the provider link to visit. Completions arrive through the provider's\n\
        webhook, or through a client-side report for offers without one.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "EARNHUB_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, env = "EARNHUB_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "EARNHUB_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "EARNHUB_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "EARNHUB_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login(LoginArgs),

    /// Create an account (logs in when the backend issues a token)
    Register(RegisterArgs),

    /// Forget the stored session token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Browse and open offers
    #[command(alias = "o")]
    Offers(OffersArgs),

    /// Your tracking history
    #[command(alias = "t")]
    Trackings(TrackingsArgs),

    /// Your wallet balance
    #[command(alias = "w")]
    Wallet(WalletArgs),

    /// Administrator operations
    Admin(AdminArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (defaults to the profile's email, then a prompt)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Account email
    #[arg(long, short = 'e')]
    pub email: String,

    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Referral code of the inviting user
    #[arg(long)]
    pub referral_code: Option<String>,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

// ── Offers ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OffersArgs {
    #[command(subcommand)]
    pub command: OffersCommand,
}

#[derive(Debug, Subcommand)]
pub enum OffersCommand {
    /// List active offers with your tracking status
    #[command(alias = "ls")]
    List,

    /// Register a click on an offer and print the link to open
    Open {
        /// Offer ID
        offer_id: String,

        /// Keep running up to this many seconds until the offer completes
        #[arg(long, value_name = "SECS")]
        wait: Option<u64>,
    },
}

// ── Trackings ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TrackingsArgs {
    #[command(subcommand)]
    pub command: TrackingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TrackingsCommand {
    /// List your tracking records
    #[command(alias = "ls")]
    List {
        /// Only records with this status
        #[arg(long, short = 's')]
        status: Option<StatusFilter>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilter {
    Clicked,
    Started,
    Completed,
    Failed,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clicked => "clicked",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

// ── Wallet ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WalletArgs {
    #[command(subcommand)]
    pub command: WalletCommand,
}

#[derive(Debug, Subcommand)]
pub enum WalletCommand {
    /// Show balance, locked, and available amounts
    Show,
}

// ── Admin ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// User management
    Users(AdminUsersArgs),

    /// All tracking records
    Trackings(AdminTrackingsArgs),

    /// Offer management
    Offers(AdminOffersArgs),
}

/// Shared pagination arguments for admin list commands.
#[derive(Debug, Args)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Results per page
    #[arg(long, short = 'l', default_value = "25")]
    pub limit: u32,
}

#[derive(Debug, Args)]
pub struct AdminUsersArgs {
    #[command(subcommand)]
    pub command: AdminUsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum AdminUsersCommand {
    /// List users
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Search by name or email
        #[arg(long)]
        search: Option<String>,
    },

    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        name: String,

        #[arg(long, short = 'e')]
        email: String,

        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },
}

#[derive(Debug, Args)]
pub struct AdminTrackingsArgs {
    #[command(subcommand)]
    pub command: AdminTrackingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AdminTrackingsCommand {
    /// List tracking records across all users
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Only records with this status
        #[arg(long, short = 's')]
        status: Option<StatusFilter>,
    },
}

#[derive(Debug, Args)]
pub struct AdminOffersArgs {
    #[command(subcommand)]
    pub command: AdminOffersCommand,
}

#[derive(Debug, Subcommand)]
pub enum AdminOffersCommand {
    /// List all offers, including inactive ones
    #[command(alias = "ls")]
    List,

    /// Create an offer
    Create {
        #[arg(long)]
        name: String,

        /// Reward amount
        #[arg(long)]
        amount: rust_decimal::Decimal,

        #[arg(long)]
        description: Option<String>,

        /// Provider landing page
        #[arg(long)]
        provider_url: Option<String>,

        /// Per-offer redirect used when the backend returns no click URL
        #[arg(long)]
        posthook_url: Option<String>,

        /// Sort position
        #[arg(long, default_value = "0")]
        order: i64,

        /// Create the offer hidden from users
        #[arg(long)]
        inactive: bool,
    },

    /// Delete an offer
    Delete {
        /// Offer ID
        offer_id: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a value on the active profile
    Set {
        /// Key (api_url, email, insecure, timeout, ca_cert, completion_delay,
        /// fallback_completion, refresh_interval)
        key: String,

        /// Value
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
