//! Command-line interface for clientflow.
//!
//! This module provides the CLI structure for the `clientflow` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    AddCommand, ClientFields, ConfigCommand, DeleteCommand, EditCommand, ListCommand,
    LocateArgs, LocateCommand, OutputFormat, ShowCommand, StatusCommand,
};

/// clientflow - Keep track of your clients
///
/// Add, edit, search and page through client contact records stored on
/// this machine.
#[derive(Debug, Parser)]
#[command(name = "clientflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a new client
    Add(AddCommand),

    /// Edit an existing client
    Edit(EditCommand),

    /// List clients with search, sort and pagination
    List(ListCommand),

    /// Show one client
    Show(ShowCommand),

    /// Delete a client
    Delete(DeleteCommand),

    /// Print the address at a position
    Locate(LocateCommand),

    /// Show store statistics
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortKey;
    use clap::CommandFactory;

    fn status_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "clientflow");
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(status_cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(status_cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(status_cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let args = vec![
            "clientflow",
            "add",
            "--full-name",
            "Ann Lee",
            "--email",
            "ann@x.com",
            "--gender",
            "female",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Add(add) => {
                assert_eq!(add.fields.full_name.as_deref(), Some("Ann Lee"));
                assert_eq!(add.fields.email.as_deref(), Some("ann@x.com"));
                assert!(add.fields.phone.is_none());
                assert!(!add.location.locate);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_add_with_negative_coordinates() {
        let args = vec![
            "clientflow", "add", "--locate", "--lat", "40.7", "--lon", "-74.0",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Add(add) => {
                assert!(add.location.locate);
                assert_eq!(add.location.lat, Some(40.7));
                assert_eq!(add.location.lon, Some(-74.0));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_lat_requires_lon() {
        let args = vec!["clientflow", "add", "--lat", "40.7"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_edit() {
        let args = vec!["clientflow", "edit", "abc123", "--address", "456 Oak Ave"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Edit(edit) => {
                assert_eq!(edit.id, "abc123");
                assert_eq!(edit.fields.address.as_deref(), Some("456 Oak Ave"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_list() {
        let args = vec![
            "clientflow", "list", "--search", "john", "--sort", "full-name", "--desc", "--page",
            "2",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::List(list) => {
                assert_eq!(list.search.as_deref(), Some("john"));
                assert_eq!(list.sort, Some(SortKey::FullName));
                assert!(list.desc);
                assert_eq!(list.page, 2);
                assert_eq!(list.format, OutputFormat::Table);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_list_rejects_unknown_sort_key() {
        let args = vec!["clientflow", "list", "--sort", "salary"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_desc_conflicts_with_asc() {
        let args = vec!["clientflow", "list", "--desc", "--asc"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_delete() {
        let args = vec!["clientflow", "delete", "abc123", "--yes"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Command::Delete(DeleteCommand { yes: true, .. })));
    }

    #[test]
    fn test_parse_status() {
        let args = vec!["clientflow", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Command::Status(_)));
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["clientflow", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose() {
        let args = vec!["clientflow", "-v", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_parse_with_quiet() {
        let args = vec!["clientflow", "-q", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.quiet);
    }
}
