//! CLI argument and configuration definitions using clap.
//!
//! Every global flag can also be supplied through its `USERBASE_*`
//! environment variable.

use clap::{Parser, Subcommand};
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Userbase - soft-delete user directory with paginated listing
#[derive(Parser, Debug)]
#[command(name = "userbase")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file
    #[arg(
        long,
        global = true,
        env = "USERBASE_DB_PATH",
        default_value = "userbase.sqlite3"
    )]
    pub db: PathBuf,

    /// Log level: trace|debug|info|warn|error (build-mode default when omitted)
    #[arg(long, global = true, env = "USERBASE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rotating log files (stderr when omitted)
    #[arg(long, global = true, env = "USERBASE_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Page size used when `list` gets no usable `--limit`
    #[arg(
        long,
        global = true,
        env = "USERBASE_DEFAULT_LIMIT",
        default_value = "10"
    )]
    pub default_limit: NonZeroU32,

    /// Largest page size `list` will serve
    #[arg(
        long,
        global = true,
        env = "USERBASE_MAX_LIMIT",
        default_value = "100"
    )]
    pub max_limit: NonZeroU32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a user
    Create {
        #[arg(long)]
        username: String,
    },

    /// Show one active user
    Get { id: String },

    /// Rename an active user
    Update {
        id: String,
        #[arg(long)]
        username: String,
    },

    /// Soft-delete an active user
    Delete { id: String },

    /// List active users, newest first
    List {
        /// Page size; invalid or non-positive values fall back to the default
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<String>,

        /// Rows to skip; invalid or negative values fall back to 0
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<String>,

        /// Navigation token from a previous listing, e.g. `limit=10&offset=20`
        #[arg(long, conflicts_with_all = ["limit", "offset"])]
        link: Option<String>,
    },

    /// Open the store and report readiness
    Health,

    /// Print the core version
    Version,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn list_accepts_raw_values_for_later_normalization() {
        let cli = Cli::try_parse_from([
            "userbase", "list", "--limit", "-3", "--offset", "abc",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::List {
                limit: Some("-3".to_string()),
                offset: Some("abc".to_string()),
                link: None,
            }
        );
    }

    #[test]
    fn link_conflicts_with_explicit_window() {
        let result = Cli::try_parse_from([
            "userbase",
            "list",
            "--link",
            "limit=10&offset=10",
            "--limit",
            "5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn default_limit_must_be_positive() {
        let result = Cli::try_parse_from(["userbase", "--default-limit", "0", "health"]);
        assert!(result.is_err());
        let result = Cli::try_parse_from(["userbase", "--max-limit", "-5", "health"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["userbase", "health"]).unwrap();
        assert_eq!(cli.default_limit.get(), 10);
        assert_eq!(cli.max_limit.get(), 100);
    }

    #[test]
    fn global_flags_are_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "userbase",
            "get",
            "some-id",
            "--db",
            "/tmp/users.sqlite3",
        ])
        .unwrap();
        assert_eq!(cli.db.to_str(), Some("/tmp/users.sqlite3"));
        assert_eq!(
            cli.command,
            Command::Get {
                id: "some-id".to_string()
            }
        );
    }
}
