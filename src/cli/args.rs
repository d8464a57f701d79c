//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

/// Referral network engine: sponsor trees, team sizes and multi-level income
#[derive(Parser, Debug)]
#[command(name = "refnet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Directory holding a local .refnet.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Member store file (overrides store_path)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output switch shared by read commands.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a new member
    Register {
        /// Full name
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Mobile number
        #[arg(long)]
        mobile: String,
        #[arg(long, env = "REFNET_PASSWORD", hide_env_values = true)]
        password: String,
        /// Public id of the sponsor
        #[arg(long)]
        sponsor: Option<String>,
    },

    /// Show the public id the next registration would receive
    NextId,

    /// Sponsor checks
    Sponsor {
        #[command(subcommand)]
        command: SponsorCommands,
    },

    /// Show one member
    Member {
        /// Public id, e.g. REG1001
        #[arg(required_unless_present = "internal_id")]
        user_id: Option<String>,
        /// Look up by internal id instead
        #[arg(long, conflicts_with = "user_id")]
        internal_id: Option<u64>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List all members, oldest first
    Members {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List active direct referrals
    Referrals {
        user_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Count active team members below a member
    Team {
        user_id: String,
        /// Levels to descend (default: max_levels setting)
        #[arg(short, long)]
        levels: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Compute multi-level income
    Income {
        user_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Per-level member counts and income
    Levels {
        user_id: String,
        /// Levels to descend (default: max_levels setting)
        #[arg(short, long)]
        levels: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the referral tree
    Tree {
        user_id: String,
        /// Levels to descend (default: max_levels setting)
        #[arg(short, long)]
        levels: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Dashboard statistics
    Stats {
        user_id: String,
        /// Levels to descend (default: max_levels setting)
        #[arg(short, long)]
        levels: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Activate or deactivate a member
    Status {
        /// Internal id of the member
        internal_id: u64,
        #[arg(value_enum)]
        state: MemberState,
    },

    /// Set or clear the sponsor of an existing member
    Backfill {
        user_id: String,
        /// New sponsor; omit to clear
        sponsor: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum SponsorCommands {
    /// Check whether a sponsor id may be used for registration
    Check {
        /// Sponsor public id; blank means no sponsor
        sponsor: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Print a config template
    Template,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberState {
    Active,
    Inactive,
}

impl MemberState {
    pub fn is_active(self) -> bool {
        matches!(self, MemberState::Active)
    }
}
