//! Client form input and validation.
//!
//! [`ClientForm`] holds raw text exactly as entered. [`validate`] turns it
//! into a [`ValidClient`] or reports every failing field at once;
//! [`validate_field`] checks a single field, the way a form does when a
//! field loses focus.
//!
//! # Example
//!
//! ```
//! use clientflow::form::{validate, ClientForm, Field};
//!
//! let form = ClientForm {
//!     full_name: "A".to_string(),
//!     ..ClientForm::default()
//! };
//!
//! let errors = validate(&form).unwrap_err();
//! assert_eq!(
//!     errors.get(Field::FullName).map(|e| e.message.as_str()),
//!     Some("Must be at least 2 characters")
//! );
//! ```

mod avatar;
mod session;

pub use avatar::{encode_avatar, mime_for_path, to_data_uri};
pub use session::FormSession;

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::client::{Client, Gender};

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
const PHONE_PATTERN: &str = r"^[0-9]{10}$";
const MIN_NAME_CHARS: usize = 2;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern is valid"))
}

/// Raw form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientForm {
    /// Full name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Postal address.
    pub address: String,
    /// Gender as typed or selected; empty when nothing is selected.
    pub gender: String,
    /// Date of birth, `YYYY-MM-DD`.
    pub dob: String,
    /// Newly attached avatar image, if any.
    pub avatar: Option<PathBuf>,
}

impl ClientForm {
    /// Prefill a form from a stored client.
    ///
    /// The stored avatar is not a file, so `avatar` stays empty; the session
    /// keeps the stored image as its preview instead.
    #[must_use]
    pub fn from_client(client: &Client) -> Self {
        Self {
            full_name: client.full_name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            address: client.address.clone(),
            gender: client.gender.to_string(),
            dob: client.dob.clone(),
            avatar: None,
        }
    }
}

/// A validated form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidClient {
    /// Full name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Ten-digit phone number.
    pub phone: String,
    /// Postal address.
    pub address: String,
    /// Gender.
    pub gender: Gender,
    /// Date of birth, `YYYY-MM-DD`.
    pub dob: String,
}

/// A validated form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Full name.
    FullName,
    /// Email address.
    Email,
    /// Phone number.
    Phone,
    /// Date of birth.
    Dob,
    /// Postal address.
    Address,
    /// Gender.
    Gender,
}

impl Field {
    /// All fields, in form order.
    pub const ALL: [Self; 6] = [
        Self::FullName,
        Self::Email,
        Self::Phone,
        Self::Dob,
        Self::Address,
        Self::Gender,
    ];

    /// Field name as persisted.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Dob => "dob",
            Self::Address => "address",
            Self::Gender => "gender",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failing field and the message to show next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The failing field.
    pub field: Field,
    /// Message for the user.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every failing field of a form, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// The error for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.errors.iter().find(|err| err.field == field)
    }

    /// Iterate over the failing fields.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Check a single field.
#[must_use]
pub fn validate_field(field: Field, form: &ClientForm) -> Option<FieldError> {
    let message = match field {
        Field::FullName => {
            if form.full_name.is_empty() {
                Some("Full name is required")
            } else if form.full_name.chars().count() < MIN_NAME_CHARS {
                Some("Must be at least 2 characters")
            } else {
                None
            }
        }
        Field::Email => {
            if form.email.is_empty() {
                Some("Email is required")
            } else if !email_regex().is_match(&form.email) {
                Some("Invalid email address")
            } else {
                None
            }
        }
        Field::Phone => {
            if form.phone.is_empty() {
                Some("Phone number is required")
            } else if !phone_regex().is_match(&form.phone) {
                Some("Must be 10 digits")
            } else {
                None
            }
        }
        Field::Dob => {
            if form.dob.is_empty() {
                Some("Date of birth is required")
            } else if NaiveDate::parse_from_str(&form.dob, "%Y-%m-%d").is_err() {
                Some("Must be a valid date (YYYY-MM-DD)")
            } else {
                None
            }
        }
        Field::Address => form.address.is_empty().then_some("Address is required"),
        Field::Gender => form
            .gender
            .parse::<Gender>()
            .is_err()
            .then_some("Please select a gender"),
    };

    message.map(|message| FieldError::new(field, message))
}

/// Validate the whole form.
///
/// # Errors
///
/// Returns every failing field if any field is invalid.
pub fn validate(form: &ClientForm) -> Result<ValidClient, ValidationErrors> {
    let errors: Vec<FieldError> = Field::ALL
        .into_iter()
        .filter_map(|field| validate_field(field, form))
        .collect();

    // A bad gender is already among the errors
    match form.gender.parse::<Gender>() {
        Ok(gender) if errors.is_empty() => Ok(ValidClient {
            full_name: form.full_name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            address: form.address.clone(),
            gender,
            dob: form.dob.clone(),
        }),
        _ => Err(errors.into()),
    }
}

#[cfg(test)]
pub(crate) fn sample_form() -> ClientForm {
    ClientForm {
        full_name: "Ann Lee".to_string(),
        email: "ann@x.com".to_string(),
        phone: "1234567890".to_string(),
        address: "123 Main St".to_string(),
        gender: "female".to_string(),
        dob: "1990-01-01".to_string(),
        avatar: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(form: &ClientForm, field: Field) -> Option<String> {
        validate_field(field, form).map(|err| err.message)
    }

    #[test]
    fn test_valid_form() {
        let valid = validate(&sample_form()).unwrap();
        assert_eq!(valid.full_name, "Ann Lee");
        assert_eq!(valid.gender, Gender::Female);
        assert_eq!(valid.dob, "1990-01-01");
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let errors = validate(&ClientForm::default()).unwrap_err();
        assert_eq!(errors.len(), 6);

        let fields: Vec<Field> = errors.iter().map(|err| err.field).collect();
        assert_eq!(fields, Field::ALL.to_vec());
        assert_eq!(
            errors.get(Field::Gender).unwrap().message,
            "Please select a gender"
        );
    }

    #[test]
    fn test_full_name_rules() {
        let mut form = sample_form();
        form.full_name = String::new();
        assert_eq!(message(&form, Field::FullName).as_deref(), Some("Full name is required"));

        form.full_name = "A".to_string();
        assert_eq!(
            message(&form, Field::FullName).as_deref(),
            Some("Must be at least 2 characters")
        );

        form.full_name = "Jo".to_string();
        assert!(message(&form, Field::FullName).is_none());

        // Counted in characters, not bytes
        form.full_name = "É".to_string();
        assert!(message(&form, Field::FullName).is_some());
    }

    #[test]
    fn test_email_rules() {
        let mut form = sample_form();
        for bad in ["ann", "ann@", "ann@x", "ann@x.c", "a nn@x.com", "@x.com"] {
            form.email = bad.to_string();
            assert_eq!(
                message(&form, Field::Email).as_deref(),
                Some("Invalid email address"),
                "{bad} should be rejected"
            );
        }

        for good in ["ann@x.com", "first.last+tag@sub.example.org", "A_B%c@d-e.io"] {
            form.email = good.to_string();
            assert!(message(&form, Field::Email).is_none(), "{good} should pass");
        }

        form.email = String::new();
        assert_eq!(message(&form, Field::Email).as_deref(), Some("Email is required"));
    }

    #[test]
    fn test_phone_rules() {
        let mut form = sample_form();
        for bad in ["123456789", "12345678901", "123-456-7890", "abcdefghij", "1234567890\n"] {
            form.phone = bad.to_string();
            assert_eq!(message(&form, Field::Phone).as_deref(), Some("Must be 10 digits"));
        }

        form.phone = String::new();
        assert_eq!(
            message(&form, Field::Phone).as_deref(),
            Some("Phone number is required")
        );
    }

    #[test]
    fn test_dob_rules() {
        let mut form = sample_form();
        form.dob = String::new();
        assert_eq!(
            message(&form, Field::Dob).as_deref(),
            Some("Date of birth is required")
        );

        form.dob = "1990-02-30".to_string();
        assert!(message(&form, Field::Dob).is_some());

        form.dob = "01/01/1990".to_string();
        assert!(message(&form, Field::Dob).is_some());

        form.dob = "2000-02-29".to_string();
        assert!(message(&form, Field::Dob).is_none());
    }

    #[test]
    fn test_address_and_gender_rules() {
        let mut form = sample_form();
        form.address = String::new();
        form.gender = "unknown".to_string();

        let errors = validate(&form).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(Field::Address).unwrap().message, "Address is required");
        assert_eq!(errors.get(Field::Gender).unwrap().message, "Please select a gender");
    }

    #[test]
    fn test_validation_errors_display() {
        let mut form = sample_form();
        form.email = String::new();
        form.phone = "1".to_string();

        let errors = validate(&form).unwrap_err();
        assert_eq!(
            errors.to_string(),
            "email: Email is required; phone: Must be 10 digits"
        );
    }

    #[test]
    fn test_from_client_round_trips_through_validation() {
        let client = crate::client::sample_client("a", "Ann Lee", 1);
        let form = ClientForm::from_client(&client);

        let valid = validate(&form).unwrap();
        assert_eq!(valid.full_name, client.full_name);
        assert_eq!(valid.gender, client.gender);
        assert!(form.avatar.is_none());
    }
}
