//! `clientflow` - A local contact manager for client records
//!
//! This library provides the client record store, the search/sort/paginate
//! pipeline behind listings, form validation and submission, and address
//! lookup from the current position.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod location;
pub mod logging;
pub mod query;
pub mod storage;

pub use client::{Client, Gender};
pub use config::Config;
pub use error::{Error, Result};
pub use form::{validate, ClientForm, FormSession, ValidationErrors};
pub use location::{locate_address, Coordinates, Geocoder, LocationError, LocationProvider};
pub use logging::init_logging;
pub use query::{ClientQuery, ListingState, SortConfig, SortDirection, SortKey};
pub use storage::{ClientStore, KeyValueStore, StorageStats};
