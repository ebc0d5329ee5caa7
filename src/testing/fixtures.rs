//! Test fixtures providing pre-built test objects
//!
//! Commonly used test data as static fixtures, so the same identities,
//! lookups, and upload candidates are not recreated in every test file.

use crate::models::{Identity, ProfileRecord, UploadCandidate};
use crate::providers::{ProviderAuthError, SessionLookup};
use crate::session::SESSION_MISSING_ERROR_NAME;

use super::constants::{TEST_EMAIL, TEST_FULL_NAME, TEST_USER_ID};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Standard authenticated identity
    #[must_use]
    pub fn identity() -> Identity {
        Identity {
            id: TEST_USER_ID.to_string(),
            email: TEST_EMAIL.to_string(),
        }
    }

    /// Lookup for the standard authenticated identity
    #[must_use]
    pub fn authenticated_lookup() -> SessionLookup {
        SessionLookup::authenticated(TEST_USER_ID, TEST_EMAIL)
    }

    /// Lookup carrying the provider's session-missing error name
    #[must_use]
    pub fn session_missing_lookup() -> SessionLookup {
        SessionLookup::failed(ProviderAuthError::named(
            SESSION_MISSING_ERROR_NAME,
            "Auth session missing",
        ))
    }

    /// Lookup carrying an unclassifiable provider error
    #[must_use]
    pub fn failed_lookup() -> SessionLookup {
        SessionLookup::failed(ProviderAuthError::message_only("Network error"))
    }

    /// Fully populated profile record for the standard identity
    #[must_use]
    pub fn profile_record() -> ProfileRecord {
        ProfileRecord {
            id: TEST_USER_ID.to_string(),
            email: TEST_EMAIL.to_string(),
            full_name: TEST_FULL_NAME.to_string(),
            avatar_url: String::new(),
        }
    }

    /// Small valid PNG upload candidate
    #[must_use]
    pub fn png_candidate() -> UploadCandidate {
        UploadCandidate::new(Some("avatar.png"), Some("image/png"), vec![0x89, 0x50, 0x4E, 0x47])
    }

    /// Upload candidate with a disallowed mime type
    #[must_use]
    pub fn text_candidate() -> UploadCandidate {
        UploadCandidate::new(Some("notes.txt"), Some("text/plain"), b"hello".to_vec())
    }

    /// Upload candidate without any file name
    #[must_use]
    pub fn nameless_candidate() -> UploadCandidate {
        UploadCandidate::new(None, Some("image/jpeg"), vec![0xFF, 0xD8])
    }
}
