//! Error types for clientflow.
//!
//! This module defines the crate-wide error type. Location and geocoding
//! failures keep their own enums (see [`crate::location`]) and convert into
//! [`Error`] so callers can propagate them with `?`.

use std::path::PathBuf;
use thiserror::Error;

use crate::form::ValidationErrors;
use crate::location::{GeocodeError, LocationError};

/// The main error type for clientflow operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the `SQLite` slot database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Writing a slot to disk failed.
    #[error("failed to write {path}: {source}")]
    SlotWrite {
        /// Path of the slot file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// No client with the given id exists.
    #[error("client not found: {id}")]
    ClientNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// More than one client id starts with the given prefix.
    #[error("id prefix {prefix} matches {count} clients")]
    AmbiguousId {
        /// The prefix that was looked up.
        prefix: String,
        /// Number of matching clients.
        count: usize,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Form Errors ===
    /// One or more form fields failed validation.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The attached avatar image exceeds the size limit.
    #[error("Image too large (max {}MB).", whole_mib(.max_bytes))]
    AttachmentTooLarge {
        /// Size of the attached file in bytes.
        size: u64,
        /// Maximum accepted size in bytes.
        max_bytes: u64,
    },

    /// Reading the avatar file failed.
    #[error("failed to read attachment {path}: {source}")]
    AttachmentRead {
        /// Path of the attachment.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Location Errors ===
    /// Acquiring the current position failed.
    #[error(transparent)]
    Location(#[from] LocationError),

    /// Reverse geocoding failed.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

fn whole_mib(bytes: &u64) -> u64 {
    *bytes / (1024 * 1024)
}

/// A specialized Result type for clientflow operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a client-not-found error.
    #[must_use]
    pub fn client_not_found(id: impl Into<String>) -> Self {
        Self::ClientNotFound { id: id.into() }
    }

    /// Check if this error blocked a submission before anything was written.
    ///
    /// Validation failures and oversized attachments are recovered locally by
    /// the caller; everything else is an unexpected save failure.
    #[must_use]
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::AttachmentTooLarge { .. } | Self::AttachmentRead { .. }
        )
    }

    /// The message shown to the user for this error.
    ///
    /// Location failures map to their human-readable cause; unexpected
    /// failures collapse to a generic notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Location(err) => err.user_message().to_string(),
            Self::Geocode(err) => err.user_message().to_string(),
            Self::Validation(_)
            | Self::AttachmentTooLarge { .. }
            | Self::AttachmentRead { .. }
            | Self::ClientNotFound { .. }
            | Self::AmbiguousId { .. }
            | Self::ConfigLoad(_)
            | Self::ConfigValidation { .. } => self.to_string(),
            _ => "Error saving data.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{Field, FieldError};

    #[test]
    fn test_error_display() {
        let err = Error::client_not_found("abc");
        assert_eq!(err.to_string(), "client not found: abc");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_attachment_too_large_display() {
        let err = Error::AttachmentTooLarge {
            size: 3 * 1024 * 1024,
            max_bytes: 2 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "Image too large (max 2MB).");
        assert!(err.is_rejected_input());
    }

    #[test]
    fn test_validation_error_is_rejected_input() {
        let errors = ValidationErrors::from(vec![FieldError::new(
            Field::Email,
            "Email is required",
        )]);
        let err: Error = errors.into();
        assert!(err.is_rejected_input());
        assert!(err.to_string().contains("Email is required"));
    }

    #[test]
    fn test_user_message_for_location() {
        let err: Error = LocationError::Timeout.into();
        assert_eq!(err.user_message(), "Location request timed out.");
        assert!(!err.is_rejected_input());
    }

    #[test]
    fn test_user_message_for_unexpected_failure() {
        let io_err = std::io::Error::other("disk full");
        let err: Error = io_err.into();
        assert_eq!(err.user_message(), "Error saving data.");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "page_size must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_slot_write_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::SlotWrite {
            path: PathBuf::from("/root/forbidden/clientflow_data.json"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
