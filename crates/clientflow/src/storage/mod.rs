//! Storage layer for clientflow.
//!
//! The whole client collection lives as one JSON array under one key of a
//! [`KeyValueStore`]. Every operation is read-modify-write over the entire
//! collection; the collection is the unit of consistency.

mod backend;
mod file;
pub mod schema;
mod sqlite;

pub use backend::{KeyValueStore, MemoryStore};
pub use file::JsonFileStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::config::{Config, StorageBackend, DEFAULT_STORAGE_KEY};
use crate::error::{Error, Result};

/// Client collection persisted under a single key.
#[derive(Debug)]
pub struct ClientStore<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> ClientStore<S> {
    /// Create a store using the default key.
    #[must_use]
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    /// Create a store using a custom key.
    #[must_use]
    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// The underlying key-value backend.
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// The key holding the collection.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the full collection.
    ///
    /// An absent slot is an empty collection. An unreadable or corrupt slot is
    /// logged and also treated as empty; this never fails.
    #[must_use]
    pub fn list(&self) -> Vec<Client> {
        self.load().unwrap_or_else(|err| {
            warn!("Failed to load clients: {}", err);
            Vec::new()
        })
    }

    /// Load the collection for a read-modify-write.
    ///
    /// A corrupt blob still reads as empty, but a failed read of the slot is
    /// returned so the caller never overwrites data it could not see.
    fn load(&self) -> Result<Vec<Client>> {
        let Some(raw) = self.backend.get(&self.key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Client>>(&raw) {
            Ok(clients) => {
                debug!("Loaded {} clients", clients.len());
                Ok(clients)
            }
            Err(err) => {
                warn!("Failed to load clients: {}", err);
                Ok(Vec::new())
            }
        }
    }

    /// Find a client by id.
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<Client> {
        self.list().into_iter().find(|client| client.id == id)
    }

    /// Find a client by its full id or a unique id prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientNotFound`] if nothing matches, or
    /// [`Error::AmbiguousId`] if the prefix matches several clients.
    pub fn resolve(&self, id_or_prefix: &str) -> Result<Client> {
        let clients = self.list();

        if let Some(client) = clients.iter().find(|c| c.id == id_or_prefix) {
            return Ok(client.clone());
        }

        let mut matches: Vec<Client> = if id_or_prefix.is_empty() {
            Vec::new()
        } else {
            clients
                .into_iter()
                .filter(|c| c.id.starts_with(id_or_prefix))
                .collect()
        };

        match matches.len() {
            0 => Err(Error::client_not_found(id_or_prefix)),
            1 => Ok(matches.remove(0)),
            count => Err(Error::AmbiguousId {
                prefix: id_or_prefix.to_string(),
                count,
            }),
        }
    }

    /// Insert or replace a client.
    ///
    /// A client whose id is already stored replaces that entry in place.
    /// A new id is prepended so the newest record comes first.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be read, or if the collection
    /// cannot be serialized or written.
    pub fn upsert(&self, client: Client) -> Result<()> {
        let mut clients = self.load()?;

        if let Some(existing) = clients.iter_mut().find(|c| c.id == client.id) {
            debug!("Replacing client {}", client.id);
            *existing = client;
        } else {
            debug!("Inserting client {}", client.id);
            clients.insert(0, client);
        }

        self.write_all(&clients)
    }

    /// Delete a client by id.
    ///
    /// Returns `true` if a client was removed. Deleting an unknown id leaves
    /// the stored collection untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be read, or if the collection
    /// cannot be serialized or written.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut clients = self.load()?;
        let before = clients.len();
        clients.retain(|client| client.id != id);

        if clients.len() == before {
            debug!("No client {} to delete", id);
            return Ok(false);
        }

        self.write_all(&clients)?;
        info!("Deleted client {}", id);
        Ok(true)
    }

    /// Get collection statistics.
    #[must_use]
    pub fn stats(&self) -> StorageStats {
        let clients = self.list();
        let blob_bytes = self
            .backend
            .get(&self.key)
            .ok()
            .flatten()
            .map_or(0, |raw| raw.len());

        let oldest = clients.iter().map(|c| c.created_at).min();
        let newest = clients.iter().map(|c| c.created_at).max();

        StorageStats {
            total_clients: clients.len(),
            oldest_client: oldest.and_then(DateTime::from_timestamp_millis),
            newest_client: newest.and_then(DateTime::from_timestamp_millis),
            blob_bytes,
            location: self.backend.describe(),
        }
    }

    fn write_all(&self, clients: &[Client]) -> Result<()> {
        let raw = serde_json::to_string(clients)?;
        self.backend.set(&self.key, &raw)
    }
}

/// Open the backend selected by the configuration.
///
/// # Errors
///
/// Returns an error if the data directory or database cannot be opened.
pub fn open_configured(config: &Config) -> Result<ClientStore<Box<dyn KeyValueStore>>> {
    let backend: Box<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Json => Box::new(JsonFileStore::open(config.data_dir())?),
        StorageBackend::Sqlite => Box::new(SqliteStore::open(config.storage_path())?),
    };
    Ok(ClientStore::with_key(backend, config.storage.key.clone()))
}

/// Statistics about the stored collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored clients.
    pub total_clients: usize,
    /// Creation time of the oldest client.
    pub oldest_client: Option<DateTime<Utc>>,
    /// Creation time of the newest client.
    pub newest_client: Option<DateTime<Utc>>,
    /// Size of the serialized collection in bytes.
    pub blob_bytes: usize,
    /// Where the collection is stored.
    pub location: String,
}
