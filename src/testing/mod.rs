//! Unified testing utilities for sessync
//!
//! This module consolidates the mock boundary implementations and test
//! fixtures used by unit and integration tests into a single location.
//!
//! ## Organization
//!
//! - [`mock`] - Mock session provider, record store, and asset store
//! - [`fixtures`] - Pre-built test data (identities, candidates, lookups)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sessync::testing::{fixtures::TestFixtures, mock::MockSessionProvider};
//!
//! let provider = MockSessionProvider::signed_in("u1", "a@b.com");
//! let candidate = TestFixtures::png_candidate();
//! ```

pub mod fixtures;
pub mod mock;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use mock::{MockAssetStore, MockRecordStore, MockSessionProvider};

/// Common test constants
pub mod constants {
    /// Default test user id
    pub const TEST_USER_ID: &str = "u1";

    /// Default test email address
    pub const TEST_EMAIL: &str = "test@example.com";

    /// Default test display name
    pub const TEST_FULL_NAME: &str = "Test User";

    /// Base URL the mock asset store serves public URLs from
    pub const TEST_ASSET_BASE_URL: &str = "https://assets.test";

    /// Bucket used for avatar assets in tests
    pub const TEST_AVATAR_BUCKET: &str = "avatars";
}
