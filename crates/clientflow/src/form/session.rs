//! Create/edit form session and submission.

use std::cell::Cell;

use tracing::{info, warn};

use super::{encode_avatar, validate, ClientForm};
use crate::client::{new_client_id, now_millis, Client};
use crate::config::DEFAULT_AVATAR_MAX_BYTES;
use crate::error::Result;
use crate::storage::{ClientStore, KeyValueStore};

/// Clears the submitting flag however the submission ends.
struct SubmittingGuard<'a>(&'a Cell<bool>);

impl<'a> SubmittingGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// One visit to the client form, in create or edit mode.
#[derive(Debug)]
pub struct FormSession<'a, S> {
    store: &'a ClientStore<S>,
    edit_id: Option<String>,
    initial: ClientForm,
    preview_avatar: Option<String>,
    avatar_max_bytes: u64,
    submitting: Cell<bool>,
}

impl<'a, S: KeyValueStore> FormSession<'a, S> {
    /// Open an empty form that will create a new client.
    #[must_use]
    pub fn create(store: &'a ClientStore<S>) -> Self {
        Self {
            store,
            edit_id: None,
            initial: ClientForm::default(),
            preview_avatar: None,
            avatar_max_bytes: DEFAULT_AVATAR_MAX_BYTES,
            submitting: Cell::new(false),
        }
    }

    /// Open the form for client `id`, prefilled from the store.
    ///
    /// An unknown id opens an empty form; submitting it saves a new client
    /// under that id.
    #[must_use]
    pub fn edit(store: &'a ClientStore<S>, id: impl Into<String>) -> Self {
        let id = id.into();
        let mut session = Self::create(store);

        match store.get_by_id(&id) {
            Some(client) => {
                session.initial = ClientForm::from_client(&client);
                session.preview_avatar = client.avatar;
            }
            None => warn!("No stored client {}; the form starts empty", id),
        }

        session.edit_id = Some(id);
        session
    }

    /// Override the avatar size limit.
    #[must_use]
    pub fn with_avatar_limit(mut self, max_bytes: u64) -> Self {
        self.avatar_max_bytes = max_bytes;
        self
    }

    /// Whether this session edits an existing id.
    #[must_use]
    pub fn is_edit(&self) -> bool {
        self.edit_id.is_some()
    }

    /// The id being edited.
    #[must_use]
    pub fn edit_id(&self) -> Option<&str> {
        self.edit_id.as_deref()
    }

    /// The form contents when the session opened.
    #[must_use]
    pub fn initial_form(&self) -> &ClientForm {
        &self.initial
    }

    /// The avatar shown before any new image is attached.
    #[must_use]
    pub fn preview_avatar(&self) -> Option<&str> {
        self.preview_avatar.as_deref()
    }

    /// Whether a submission is in progress.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.get()
    }

    /// Validate the form, build the record and save it.
    ///
    /// Nothing is written when validation fails or the attached avatar is
    /// too large. The submitting flag is cleared on every exit path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`](crate::Error::Validation) with every
    /// failing field, [`Error::AttachmentTooLarge`](crate::Error::AttachmentTooLarge)
    /// for an oversized avatar, or the store's error if the write fails.
    pub fn submit(&self, form: &ClientForm) -> Result<Client> {
        let _guard = SubmittingGuard::engage(&self.submitting);

        let valid = validate(form)?;

        let avatar = match &form.avatar {
            Some(path) => Some(encode_avatar(path, self.avatar_max_bytes)?),
            None => self.preview_avatar.clone(),
        };

        let (id, created_at) = match &self.edit_id {
            Some(id) => {
                let created_at = self
                    .store
                    .get_by_id(id)
                    .map_or_else(now_millis, |existing| existing.created_at);
                (id.clone(), created_at)
            }
            None => (new_client_id(), now_millis()),
        };

        let client = Client {
            id,
            full_name: valid.full_name,
            email: valid.email,
            phone: valid.phone,
            address: valid.address,
            gender: valid.gender,
            dob: valid.dob,
            avatar,
            created_at,
        };

        self.store.upsert(client.clone())?;
        info!("Saved client {}", client.id);
        Ok(client)
    }
}
