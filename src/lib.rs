#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the sessync library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod models;
pub mod profile;
pub mod providers;
pub mod refresh;
pub mod session;
pub mod settings;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use models::{AuthState, Identity, ProfileRecord, UploadCandidate};
pub use profile::{format_display_name, ProfileMutator};
pub use providers::{AssetStore, RecordStore, RestProvider, SessionProvider};
pub use refresh::{RefreshSignal, ViewRefresher};
pub use session::{resolve, resolve_identity_once, AuthStateStore, SessionOutcome};
pub use settings::SessyncSettings;
