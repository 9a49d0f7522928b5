//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::client::Client;
use crate::form::ClientForm;
use crate::location::FixedLocation;
use crate::query::{ListingState, SortConfig, SortDirection, SortKey};

/// Form fields accepted by `add` and `edit`.
///
/// Fields left out keep the value already in the form.
#[derive(Debug, Clone, Default, Args)]
pub struct ClientFields {
    /// Full name
    #[arg(long)]
    pub full_name: Option<String>,

    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Phone number (10 digits)
    #[arg(long)]
    pub phone: Option<String>,

    /// Postal address
    #[arg(long)]
    pub address: Option<String>,

    /// Gender (male, female or other)
    #[arg(long)]
    pub gender: Option<String>,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub dob: Option<String>,

    /// Avatar image file
    #[arg(long, value_name = "PATH")]
    pub avatar: Option<PathBuf>,
}

impl ClientFields {
    /// Overwrite the fields of `form` that were given on the command line.
    pub fn apply_to(&self, form: &mut ClientForm) {
        let text_fields = [
            (&self.full_name, &mut form.full_name),
            (&self.email, &mut form.email),
            (&self.phone, &mut form.phone),
            (&self.address, &mut form.address),
            (&self.gender, &mut form.gender),
            (&self.dob, &mut form.dob),
        ];
        for (given, slot) in text_fields {
            if let Some(value) = given {
                slot.clone_from(value);
            }
        }
        if let Some(path) = &self.avatar {
            form.avatar = Some(path.clone());
        }
    }
}

/// Fill the address from the current position.
#[derive(Debug, Clone, Default, Args)]
pub struct LocateArgs {
    /// Replace the address with the reverse-geocoded current position
    #[arg(long)]
    pub locate: bool,

    /// Latitude of the current position
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude of the current position
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,
}

impl LocateArgs {
    /// The position source described by these arguments.
    #[must_use]
    pub fn provider(&self) -> FixedLocation {
        FixedLocation::from_parts(self.lat, self.lon)
    }
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Field values
    #[command(flatten)]
    pub fields: ClientFields,

    /// Address lookup
    #[command(flatten)]
    pub location: LocateArgs,
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Client id (or a unique prefix of it)
    pub id: String,

    /// Field values to change
    #[command(flatten)]
    pub fields: ClientFields,

    /// Address lookup
    #[command(flatten)]
    pub location: LocateArgs,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show clients whose name, email or address contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Sort by this field
    #[arg(long, value_name = "KEY")]
    pub sort: Option<SortKey>,

    /// Sort descending
    #[arg(long, conflicts_with = "asc")]
    pub desc: bool,

    /// Sort ascending
    #[arg(long)]
    pub asc: bool,

    /// Page to show (1-based)
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Rows per page (defaults to the configured page size)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl ListCommand {
    /// Sort requested on the command line.
    ///
    /// Without `--sort` the newest clients come first. With `--sort` the
    /// direction is ascending unless `--desc` is given.
    #[must_use]
    pub fn sort_config(&self) -> SortConfig {
        let (key, default_direction) = match self.sort {
            Some(key) => (key, SortDirection::Asc),
            None => (SortKey::CreatedAt, SortDirection::Desc),
        };
        let direction = if self.desc {
            SortDirection::Desc
        } else if self.asc {
            SortDirection::Asc
        } else {
            default_direction
        };
        SortConfig::new(key, direction)
    }

    /// Listing state for these arguments over `clients`.
    ///
    /// The requested page is clamped to the pages the search yields.
    #[must_use]
    pub fn listing(&self, default_page_size: usize, clients: &[Client]) -> ListingState {
        let page_size = self.page_size.unwrap_or(default_page_size).max(1);
        let mut listing = ListingState::new(page_size);
        listing.set_search(self.search.clone().unwrap_or_default());
        listing.set_sort(self.sort_config());

        let total = listing.total_pages(clients);
        listing.go_to(self.page, total);
        listing
    }
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Client id (or a unique prefix of it)
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Client id (or a unique prefix of it)
    pub id: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Locate command arguments.
#[derive(Debug, Args)]
pub struct LocateCommand {
    /// Latitude of the position
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude of the position
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
