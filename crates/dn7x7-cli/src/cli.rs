//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dn7x7_core::config::API_KEY_ENV;
use dn7x7_core::models::{NewsCategory, StatusFilter, TimeRange, DEFAULT_DAILY_LIMIT};

#[derive(Parser, Debug)]
#[command(name = "dn7x7")]
#[command(about = "DairyNews7x7 dashboard from the terminal")]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides config and DN7X7_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login {
        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// End the session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Create an account; an activation email follows
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        organization: Option<String>,
    },

    /// Activate an account with the uid and token from the activation email
    Activate { uid: String, token: String },

    /// Request a password reset email
    ResetPassword { email: String },

    /// Set a new password with the uid and token from the reset email
    ResetPasswordConfirm { uid: String, token: String },

    /// Change the password of the logged-in user
    SetPassword,

    /// Update name, organization or profile image
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        organization: Option<String>,
        /// Image file to upload (png, jpg, gif or webp)
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Show the credit balance
    Credits,

    /// Manage API keys
    Keys {
        #[command(subcommand)]
        command: KeysCommand,
    },

    /// Show recent API calls
    Logs {
        #[command(flatten)]
        filter: LogArgs,
    },

    /// Credits, keys and recent calls at a glance
    Overview,

    /// Staff-only user management
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },

    /// Read news with a partner API key
    News {
        /// API key (defaults to DN7X7_API_KEY)
        #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
        api_key: String,

        #[command(subcommand)]
        command: NewsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// List keys
    List,

    /// Create a key; the secret is shown once
    Create {
        name: String,
        #[arg(long, default_value_t = DEFAULT_DAILY_LIMIT)]
        daily_limit: u32,
    },

    /// Deactivate a key
    Revoke { id: i64 },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct LogArgs {
    /// 1h, 24h, 7d, 30d or all
    #[arg(long, default_value = "24h")]
    pub time_range: TimeRange,

    /// all, success or error
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// List users
    Users {
        /// Match name, email or organization
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one user
    User { id: i64 },

    /// Add purchased credits to a user
    AddCredits { id: i64, credits: i64 },

    /// Activate or deactivate a user
    ToggleActive { id: i64 },

    /// Grant or revoke staff status
    ToggleStaff { id: i64 },

    /// Delete a user
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show a user's recent API calls
    Logs {
        id: i64,
        #[arg(long, default_value = "24h")]
        time_range: TimeRange,
    },
}

#[derive(Subcommand, Debug)]
pub enum NewsCommand {
    /// List articles, newest first
    List {
        /// indian, global or blog
        #[arg(long)]
        category: Option<NewsCategory>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Show one article
    Get { id: i64 },
}
