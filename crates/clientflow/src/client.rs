//! Core client record types for clientflow.
//!
//! A [`Client`] is the only entity the store knows about. Field names are
//! serialized in camelCase so the persisted collection keeps the
//! `fullName`/`createdAt` layout.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gender choices offered on the client form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Any other answer.
    Other,
}

impl Gender {
    /// All choices, in form order.
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    /// The lowercase text used for storage, display and sorting.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text is not one of the [`Gender`] choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGender(pub String);

impl fmt::Display for UnknownGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown gender: {}", self.0)
    }
}

impl std::error::Error for UnknownGender {}

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(UnknownGender(s.to_string())),
        }
    }
}

/// A stored client record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique identifier (hyphenated UUID v4).
    pub id: String,

    /// Full name, at least two characters.
    pub full_name: String,

    /// Contact email address.
    pub email: String,

    /// Ten-digit phone number.
    pub phone: String,

    /// Free-text postal address.
    pub address: String,

    /// Gender.
    pub gender: Gender,

    /// Date of birth as an ISO date (`YYYY-MM-DD`).
    pub dob: String,

    /// Avatar image as a `data:` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Creation time in epoch milliseconds. Never changes after creation.
    pub created_at: i64,
}

impl Client {
    /// First eight characters of the id, as shown in listings.
    #[must_use]
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    /// Whether the record carries an avatar image.
    #[must_use]
    pub fn has_avatar(&self) -> bool {
        self.avatar.is_some()
    }
}

/// Generate a fresh client id.
#[must_use]
pub fn new_client_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
pub(crate) fn sample_client(id: &str, full_name: &str, created_at: i64) -> Client {
    Client {
        id: id.to_string(),
        full_name: full_name.to_string(),
        email: format!("{}@example.com", full_name.to_lowercase().replace(' ', ".")),
        phone: "1234567890".to_string(),
        address: "123 Main St".to_string(),
        gender: Gender::Other,
        dob: "1990-01-01".to_string(),
        avatar: None,
        created_at,
    }
}
