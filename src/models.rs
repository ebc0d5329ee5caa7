use serde::{Deserialize, Serialize};

pub mod error;

/// Authenticated principal recognized by the session provider
///
/// A read-only snapshot owned by the provider: created on successful
/// resolution, replaced on every resolution, absent after sign-out or
/// session expiry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// Opaque provider-assigned user id
    pub id: String,
    pub email: String,
}

/// Client-local authentication state published by the `AuthStateStore`
///
/// `loading` is `true` only until the first resolution completes;
/// thereafter it is always `false`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthState {
    pub identity: Option<Identity>,
    pub loading: bool,
}

impl AuthState {
    /// Check whether an authenticated identity is present
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }
}

/// Remotely persisted profile record, keyed by identity id
///
/// At most one record exists per identity id. `full_name` and
/// `avatar_url` may be empty.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct ProfileRecord {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// A pending file selected by the user, never persisted as-is
///
/// Validated and either promoted to a stored asset or discarded.
#[derive(Clone, Debug)]
pub struct UploadCandidate {
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadCandidate {
    /// Create a candidate from a file name, mime type, and raw bytes
    #[must_use]
    pub fn new(file_name: Option<&str>, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.map(ToString::to_string),
            mime_type: mime_type.map(ToString::to_string),
            bytes,
        }
    }

    /// Size of the pending file in bytes
    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}
