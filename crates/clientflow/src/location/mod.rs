//! Current position and reverse geocoding.
//!
//! A [`LocationProvider`] yields the device position; a [`ReverseGeocoder`]
//! turns it into a postal address. [`locate_address`] chains the two, each
//! step bounded by the same timeout.

mod geocode;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub use geocode::{GeocodeError, Geocoder, ReverseGeocoder};

use crate::error::Result;

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    /// Latitude, north positive.
    pub latitude: f64,
    /// Longitude, east positive.
    pub longitude: f64,
}

impl Coordinates {
    /// Create a new coordinate pair.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Why the current position could not be obtained.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The user refused location access.
    #[error("location permission denied")]
    PermissionDenied,

    /// No position fix is available.
    #[error("location unavailable")]
    PositionUnavailable,

    /// No position arrived within the timeout.
    #[error("location request timed out")]
    Timeout,

    /// Any other failure reported by the provider.
    #[error("location error: {0}")]
    Other(String),
}

impl LocationError {
    /// The message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::PermissionDenied => {
                "Location permission denied. Please allow access in your settings."
            }
            Self::PositionUnavailable => {
                "Location unavailable. Please check your GPS or network connection."
            }
            Self::Timeout => "Location request timed out.",
            Self::Other(message) => message,
        }
    }
}

/// Source of the device's current position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Acquire the current position once.
    ///
    /// Implementations may honour `timeout` themselves; callers also bound
    /// the call externally.
    ///
    /// # Errors
    ///
    /// Returns a [`LocationError`] describing why no position is available.
    async fn current_position(
        &self,
        timeout: Duration,
    ) -> std::result::Result<Coordinates, LocationError>;
}

/// A provider that reports a position given up front.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedLocation {
    position: Option<Coordinates>,
}

impl FixedLocation {
    /// A provider that always returns `position`.
    #[must_use]
    pub fn new(position: Coordinates) -> Self {
        Self {
            position: Some(position),
        }
    }

    /// A provider with no fix.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { position: None }
    }

    /// Build from optional latitude and longitude; both must be present.
    #[must_use]
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(Coordinates::new(lat, lon)),
            _ => Self::unavailable(),
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(
        &self,
        _timeout: Duration,
    ) -> std::result::Result<Coordinates, LocationError> {
        self.position.ok_or(LocationError::PositionUnavailable)
    }
}

/// Acquire the current position and reverse-geocode it to an address.
///
/// # Errors
///
/// Returns [`Error::Location`](crate::Error::Location) if no position is
/// obtained within `timeout`, or [`Error::Geocode`](crate::Error::Geocode)
/// if the address lookup fails.
pub async fn locate_address<P, G>(provider: &P, geocoder: &G, timeout: Duration) -> Result<String>
where
    P: LocationProvider + ?Sized,
    G: ReverseGeocoder + ?Sized,
{
    let position = match tokio::time::timeout(timeout, provider.current_position(timeout)).await {
        Ok(Ok(position)) => position,
        Ok(Err(err)) => {
            warn!("Position lookup failed: {}", err);
            return Err(err.into());
        }
        Err(_) => {
            warn!("Position lookup timed out after {:?}", timeout);
            return Err(LocationError::Timeout.into());
        }
    };

    debug!("Current position: {}", position);

    match tokio::time::timeout(timeout, geocoder.reverse(position)).await {
        Ok(Ok(address)) => Ok(address),
        Ok(Err(err)) => {
            warn!("Reverse geocoding failed: {}", err);
            Err(err.into())
        }
        Err(_) => {
            warn!("Reverse geocoding timed out after {:?}", timeout);
            Err(GeocodeError::Timeout.into())
        }
    }
}
