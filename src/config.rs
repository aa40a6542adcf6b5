//! Command line and on-disk locations.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
pub const DATA_DIR_NAME: &str = ".library-manager";
/// SQLite file name stored inside the application data directory.
pub const DB_FILE_NAME: &str = "library.sqlite";
/// Log file written next to the database; the terminal UI owns stdout.
pub const LOG_FILE_NAME: &str = "library-manager.log";
/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "LIBRARY_MANAGER_LOG";

/// Library catalog, membership and lending manager
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the database and log file [default: ~/.library-manager]
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Log filter used when LIBRARY_MANAGER_LOG is unset
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Open the interactive browser (default)
    Browse,
    /// Insert a small demo catalog if the library is empty
    Seed,
    /// Print extent counts and outstanding loans
    Summary,
    /// Flag overdue loans and expire reservations as of today
    Sweep,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Browse)
    }

    /// Resolved data directory: the flag if given, otherwise `~/.library-manager`.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }
}

/// Resolve the default data directory inside the user's home.
pub fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browse_is_the_default_command() {
        let cli = Cli::parse_from(["library-manager"]);
        assert_eq!(cli.command(), Command::Browse);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn flags_and_subcommands_parse() {
        let cli = Cli::parse_from([
            "library-manager",
            "--data-dir",
            "/tmp/lib",
            "--log-level",
            "debug",
            "sweep",
        ]);
        assert_eq!(cli.command(), Command::Sweep);
        let dir = cli.data_dir().unwrap();
        assert_eq!(db_path(&dir), PathBuf::from("/tmp/lib/library.sqlite"));
        assert_eq!(log_path(&dir), PathBuf::from("/tmp/lib/library-manager.log"));
    }
}
