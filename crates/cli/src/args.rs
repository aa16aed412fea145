//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// autoposter: fetch trending tech content, draft posts with an LLM, and
/// publish them to LinkedIn and X
#[derive(Parser, Debug)]
#[command(name = "autoposter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, generate, and publish one post per invocation
    Run(RunArgs),

    /// Obtain OAuth tokens for posting
    Auth(AuthArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Log would-be posts without publishing or touching the ledger
    #[arg(long)]
    pub dry_run: bool,

    /// Use built-in sample items instead of live fetching
    #[arg(long)]
    pub use_samples: bool,

    /// Number of pipeline invocations to run
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,

    /// Seconds to wait between invocations when repeating
    #[arg(long, default_value_t = 5)]
    pub interval_seconds: u64,

    /// Disable the Reddit source for this run
    #[arg(long)]
    pub no_reddit: bool,

    /// Disable the X search source for this run
    #[arg(long)]
    pub no_x: bool,
}

#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Print an X authorization URL and its PKCE verifier
    XUrl {
        /// Redirect URI registered with the X app (overrides config)
        #[arg(long)]
        redirect_uri: Option<String>,
    },

    /// Exchange an X authorization code for user tokens
    XExchange {
        /// Authorization code from the redirect
        #[arg(long)]
        code: String,

        /// PKCE verifier printed by `auth x-url`
        #[arg(long)]
        verifier: String,

        /// Redirect URI used in the authorization request (overrides config)
        #[arg(long)]
        redirect_uri: Option<String>,
    },

    /// Trade an X refresh token for a new access token
    XRefresh {
        /// Refresh token from a previous exchange
        #[arg(long)]
        refresh_token: String,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
