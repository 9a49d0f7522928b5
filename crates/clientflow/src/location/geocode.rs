//! Reverse geocoding over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::Coordinates;
use crate::config::GeocodingConfig;

const REVERSE_PATH: &str = "/v1/geocode/reverse";

/// Why an address lookup failed.
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// The request could not be sent or the body could not be read.
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("geocoding service returned {status}")]
    Status {
        /// HTTP status code.
        status: StatusCode,
    },

    /// The response held no features.
    #[error("no address found for this position")]
    NoResults,

    /// No API key is configured.
    #[error("no geocoding API key configured")]
    MissingApiKey,

    /// The configured base URL is unusable.
    #[error("invalid geocoding URL: {0}")]
    InvalidUrl(String),

    /// No response arrived within the timeout.
    #[error("geocoding request timed out")]
    Timeout,
}

impl GeocodeError {
    /// The message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::MissingApiKey => {
                "No geocoding API key configured. Set geocoding.api_key in the config file."
            }
            _ => "Failed to retrieve address. Please check your network connection.",
        }
    }
}

/// Turns coordinates into a formatted address.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Look up the address nearest to `position`.
    ///
    /// # Errors
    ///
    /// Returns a [`GeocodeError`] if the lookup fails or finds nothing.
    async fn reverse(&self, position: Coordinates) -> Result<String, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    formatted: Option<String>,
}

/// HTTP client for a Geoapify-style reverse geocoding endpoint.
#[derive(Debug, Clone)]
pub struct Geocoder {
    base_url: String,
    api_key: Option<String>,
    language: String,
    client: HttpClient,
}

impl Geocoder {
    /// Create a geocoder for `base_url` (e.g. `https://api.geoapify.com`).
    #[must_use]
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(String::from),
            language: "en".to_string(),
            client: HttpClient::new(),
        }
    }

    /// Create a geocoder from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            client,
        })
    }

    /// Set the response language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// The base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn reverse_url(&self, position: Coordinates, api_key: &str) -> Result<Url, GeocodeError> {
        let mut url = Url::parse(&format!("{}{REVERSE_PATH}", self.base_url))
            .map_err(|err| GeocodeError::InvalidUrl(format!("{}: {err}", self.base_url)))?;

        url.query_pairs_mut()
            .append_pair("lat", &position.latitude.to_string())
            .append_pair("lon", &position.longitude.to_string())
            .append_pair("lang", &self.language)
            .append_pair("limit", "1")
            .append_pair("apiKey", api_key);

        Ok(url)
    }
}

#[async_trait]
impl ReverseGeocoder for Geocoder {
    async fn reverse(&self, position: Coordinates) -> Result<String, GeocodeError> {
        let api_key = self.api_key.as_deref().ok_or(GeocodeError::MissingApiKey)?;
        let url = self.reverse_url(position, api_key)?;

        debug!("Reverse geocoding {}", position);
        let response = self.client.get(url).send().await.map_err(from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status { status });
        }

        let body: FeatureCollection = response.json().await.map_err(from_transport)?;
        body.features
            .into_iter()
            .next()
            .and_then(|feature| feature.properties.formatted)
            .ok_or(GeocodeError::NoResults)
    }
}

fn from_transport(err: reqwest::Error) -> GeocodeError {
    if err.is_timeout() {
        GeocodeError::Timeout
    } else {
        GeocodeError::Http(err)
    }
}
