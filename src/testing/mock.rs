//! Mock objects and fake implementations for testing
//!
//! This module provides mock implementations of the three external
//! boundaries for isolated unit testing: a scriptable session provider
//! with a pushable change-event stream, and recording record/asset stores
//! with failure injection.

use crate::providers::{
    AssetStore, AuthChangeHub, AuthChangeSubscription, ProviderError, RecordStore, SessionLookup,
    SessionProvider,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scriptable session provider with a pushable change-event stream
pub struct MockSessionProvider {
    lookup: Mutex<SessionLookup>,
    events: AuthChangeHub,
    sign_out_error: Mutex<Option<ProviderError>>,
    get_session_calls: AtomicUsize,
    get_user_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl MockSessionProvider {
    /// Provider whose lookups resolve to the given authenticated user
    #[must_use]
    pub fn signed_in(id: &str, email: &str) -> Self {
        Self::with_lookup(SessionLookup::authenticated(id, email))
    }

    /// Provider whose lookups resolve to an anonymous visitor
    #[must_use]
    pub fn anonymous() -> Self {
        Self::with_lookup(SessionLookup::anonymous())
    }

    /// Provider serving an explicit lookup result
    #[must_use]
    pub fn with_lookup(lookup: SessionLookup) -> Self {
        Self {
            lookup: Mutex::new(lookup),
            events: AuthChangeHub::new(),
            sign_out_error: Mutex::new(None),
            get_session_calls: AtomicUsize::new(0),
            get_user_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    /// Replace the lookup served by subsequent `get_session`/`get_user`
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    pub fn set_lookup(&self, lookup: SessionLookup) {
        *self.lookup.lock().unwrap() = lookup;
    }

    /// Make the next sign-out calls fail with the given error
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    pub fn set_sign_out_error(&self, error: Option<ProviderError>) {
        *self.sign_out_error.lock().unwrap() = error;
    }

    /// Deliver a session-change event to every live subscription
    pub fn push_event(&self, lookup: SessionLookup) {
        self.events.emit(&lookup);
    }

    /// Number of live change subscriptions (dead ones prune on emit)
    #[must_use]
    pub fn change_subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }

    #[must_use]
    pub fn get_session_calls(&self) -> usize {
        self.get_session_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn get_user_calls(&self) -> usize {
        self.get_user_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn get_session(&self) -> SessionLookup {
        self.get_session_calls.fetch_add(1, Ordering::Relaxed);
        self.lookup.lock().unwrap().clone()
    }

    async fn get_user(&self) -> SessionLookup {
        self.get_user_calls.fetch_add(1, Ordering::Relaxed);
        self.lookup.lock().unwrap().clone()
    }

    fn on_auth_state_change(&self) -> AuthChangeSubscription {
        self.events.subscribe()
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_out_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(error) = self.sign_out_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.set_lookup(SessionLookup::anonymous());
        self.events.emit(&SessionLookup::anonymous());
        Ok(())
    }
}

/// A single recorded record-store update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub table: String,
    pub key_column: String,
    pub key_value: String,
    pub fields: Value,
}

/// Recording record store with scriptable reads and failure injection
#[derive(Default)]
pub struct MockRecordStore {
    updates: Mutex<Vec<RecordUpdate>>,
    update_error: Mutex<Option<ProviderError>>,
    selects: Mutex<VecDeque<Result<Option<Value>, ProviderError>>>,
}

impl MockRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent updates fail with the given error
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    pub fn set_update_error(&self, error: Option<ProviderError>) {
        *self.update_error.lock().unwrap() = error;
    }

    /// Queue a result for the next select; defaults to `Ok(None)` when empty
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    pub fn push_select(&self, result: Result<Option<Value>, ProviderError>) {
        self.selects.lock().unwrap().push_back(result);
    }

    /// Updates recorded so far, in call order
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn recorded_updates(&self) -> Vec<RecordUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// Number of update calls that reached the store
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn update(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        fields: &Value,
    ) -> Result<(), ProviderError> {
        if let Some(error) = self.update_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.updates.lock().unwrap().push(RecordUpdate {
            table: table.to_string(),
            key_column: key_column.to_string(),
            key_value: key_value.to_string(),
            fields: fields.clone(),
        });
        Ok(())
    }

    async fn select(
        &self,
        _table: &str,
        _columns: &str,
        _key_column: &str,
        _key_value: &str,
    ) -> Result<Option<Value>, ProviderError> {
        self.selects
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }
}

/// A single recorded asset-store upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUploadCall {
    pub bucket: String,
    pub key: String,
    pub byte_size: usize,
    pub content_type: String,
    pub upsert: bool,
}

/// Recording asset store with failure injection
pub struct MockAssetStore {
    base_url: String,
    uploads: Mutex<Vec<AssetUploadCall>>,
    upload_error: Mutex<Option<ProviderError>>,
}

impl MockAssetStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: super::constants::TEST_ASSET_BASE_URL.to_string(),
            uploads: Mutex::new(Vec::new()),
            upload_error: Mutex::new(None),
        }
    }

    /// Make subsequent uploads fail with the given error
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    pub fn set_upload_error(&self, error: Option<ProviderError>) {
        *self.upload_error.lock().unwrap() = error;
    }

    /// Uploads recorded so far, in call order
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn recorded_uploads(&self) -> Vec<AssetUploadCall> {
        self.uploads.lock().unwrap().clone()
    }

    /// Number of upload calls that reached the store
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

impl Default for MockAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetStore for MockAssetStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), ProviderError> {
        if let Some(error) = self.upload_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.uploads.lock().unwrap().push(AssetUploadCall {
            bucket: bucket.to_string(),
            key: key.to_string(),
            byte_size: bytes.len(),
            content_type: content_type.to_string(),
            upsert,
        });
        Ok(())
    }

    fn get_public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{bucket}/{key}", self.base_url)
    }
}
