//! External persistence and identity boundaries
//!
//! This module defines the trait seams for the three remote collaborators
//! the crate consumes: the session provider (service of record for
//! authentication), the record store (structured profile fields), and the
//! asset store (binary files). All production and mock implementations
//! plug in behind these traits, enabling dependency injection throughout
//! the crate.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tokio::sync::mpsc;

pub mod rest;

pub use rest::RestProvider;

/// Raw user object returned by the session provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub id: String,
    pub email: String,
}

/// Error reported by the session provider for a session lookup
///
/// Provider errors always expose a human-readable `message` and may
/// expose a machine-readable `name` category. The two are independent
/// signals: the same underlying condition can arrive under either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAuthError {
    pub name: Option<String>,
    pub message: String,
}

impl ProviderAuthError {
    /// Create an error with both a category name and a message
    #[must_use]
    pub fn named(name: &str, message: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            message: message.to_string(),
        }
    }

    /// Create an error carrying only a message
    #[must_use]
    pub fn message_only(message: &str) -> Self {
        Self {
            name: None,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ProviderAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Result of a provider session lookup, before classification
///
/// Exactly one of `user`/`error` is normally populated; both absent is a
/// valid anonymous result. Turning this into an application-level value
/// is the job of [`crate::session::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLookup {
    pub user: Option<ProviderUser>,
    pub error: Option<ProviderAuthError>,
}

impl SessionLookup {
    /// Lookup that found an authenticated user
    #[must_use]
    pub fn authenticated(id: &str, email: &str) -> Self {
        Self {
            user: Some(ProviderUser {
                id: id.to_string(),
                email: email.to_string(),
            }),
            error: None,
        }
    }

    /// Lookup that found no session and no error (anonymous visitor)
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Lookup that failed with a provider error
    #[must_use]
    pub fn failed(error: ProviderAuthError) -> Self {
        Self {
            user: None,
            error: Some(error),
        }
    }
}

/// Error returned by record and asset store operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub message: String,
    /// HTTP status when the failure came off the wire
    pub status: Option<u16>,
}

impl ProviderError {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(message: &str, status: u16) -> Self {
        Self {
            message: message.to_string(),
            status: Some(status),
        }
    }

    /// Whether the message indicates the store rejected the payload size
    #[must_use]
    pub fn indicates_size_limit(&self) -> bool {
        let msg = self.message.to_lowercase();
        msg.contains("size") || msg.contains("limit") || msg.contains("too large")
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {status})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Cancellable handle on the provider's change-notification stream
///
/// A lazy, infinite, non-restartable sequence of session-change events,
/// consumed by exactly one listener. Dropping the handle releases the
/// subscription: the provider prunes senders whose receiver is gone, so
/// no further notifications are delivered to a dead consumer.
pub struct AuthChangeSubscription {
    receiver: mpsc::UnboundedReceiver<SessionLookup>,
}

impl AuthChangeSubscription {
    /// Wait for the next session-change event
    ///
    /// Returns `None` once the provider side has shut down.
    pub async fn next(&mut self) -> Option<SessionLookup> {
        self.receiver.recv().await
    }
}

/// Subscriber fan-out shared by provider implementations
///
/// Events are delivered to every live subscription in emit order; dead
/// subscriptions are pruned on the next emit.
#[derive(Default)]
pub struct AuthChangeHub {
    senders: std::sync::Mutex<Vec<mpsc::UnboundedSender<SessionLookup>>>,
}

impl AuthChangeHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new subscription on this hub
    ///
    /// # Panics
    /// Panics if the internal subscriber lock is poisoned.
    #[must_use]
    pub fn subscribe(&self) -> AuthChangeSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(tx);
        AuthChangeSubscription { receiver: rx }
    }

    /// Deliver a session-change event to every live subscriber
    ///
    /// # Panics
    /// Panics if the internal subscriber lock is poisoned.
    pub fn emit(&self, lookup: &SessionLookup) {
        self.senders
            .lock()
            .unwrap()
            .retain(|tx| tx.send(lookup.clone()).is_ok());
    }

    /// Number of live subscribers (dead ones may linger until the next emit)
    ///
    /// # Panics
    /// Panics if the internal subscriber lock is poisoned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.senders.lock().unwrap().len()
    }
}

/// Session provider boundary
///
/// The external service of record for authentication, reached through a
/// client library. Lookups never fail at the transport level from the
/// caller's perspective: transport problems are folded into the returned
/// [`SessionLookup`] as provider errors, keeping classification in one
/// place.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// One-shot lookup of the current session
    async fn get_session(&self) -> SessionLookup;

    /// Fresh lookup of the authenticated user
    ///
    /// Unlike `get_session`, implementations must not serve this from a
    /// local cache; mutating operations rely on it to detect a
    /// since-expired session.
    async fn get_user(&self) -> SessionLookup;

    /// Open a standing subscription to session-change events
    fn on_auth_state_change(&self) -> AuthChangeSubscription;

    /// Sign the current session out
    ///
    /// # Errors
    /// Returns an error if the provider rejects the sign-out. A
    /// session-missing response is not an error: signing out an already
    /// absent session is a no-op that succeeds.
    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// Record store boundary for structured profile fields
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Update fields on the row matching `key_column = key_value`
    ///
    /// # Errors
    /// Returns an error if the remote write is rejected.
    async fn update(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        fields: &Value,
    ) -> Result<(), ProviderError>;

    /// Select columns of the row matching `key_column = key_value`
    ///
    /// Returns `Ok(None)` when no row matches.
    ///
    /// # Errors
    /// Returns an error if the remote read is rejected.
    async fn select(
        &self,
        table: &str,
        columns: &str,
        key_column: &str,
        key_value: &str,
    ) -> Result<Option<Value>, ProviderError>;
}

/// Asset store boundary for binary files
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store bytes under `bucket/key`
    ///
    /// With `upsert` set, an existing object under the same key is
    /// overwritten in place rather than rejected.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write; the message may
    /// indicate a size violation.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), ProviderError>;

    /// Compute the public retrieval URL for `bucket/key`
    ///
    /// Pure derivation; performs no remote call.
    fn get_public_url(&self, bucket: &str, key: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_detects_size_limit_phrases() {
        for msg in [
            "Payload size exceeded",
            "object exceeds the configured limit",
            "file too large",
        ] {
            assert!(ProviderError::new(msg).indicates_size_limit(), "{msg}");
        }
        assert!(!ProviderError::new("permission denied").indicates_size_limit());
    }

    #[tokio::test]
    async fn hub_delivers_events_in_emit_order() {
        let hub = AuthChangeHub::new();
        let mut sub = hub.subscribe();

        hub.emit(&SessionLookup::authenticated("u1", "a@b.com"));
        hub.emit(&SessionLookup::anonymous());

        let first = sub.next().await.unwrap();
        assert_eq!(first.user.unwrap().id, "u1");
        let second = sub.next().await.unwrap();
        assert!(second.user.is_none());
    }

    #[tokio::test]
    async fn hub_prunes_dropped_subscriptions() {
        let hub = AuthChangeHub::new();
        let sub = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);

        drop(sub);
        hub.emit(&SessionLookup::anonymous());
        assert_eq!(hub.subscriber_count(), 0);
    }
}
