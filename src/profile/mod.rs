//! Profile Mutation Module
//!
//! Validated, idempotent writes to the signed-in user's profile record and
//! avatar asset, plus the pure display-name derivation used by headers.
//!
//! # Modules
//!
//! - [`mutator`] - Identity-gated profile and avatar write workflows
//! - [`avatar`] - Upload validation, storage keys, cache-busting URLs
//! - [`display_name`] - Human-readable label from name and email

pub mod avatar;
pub mod display_name;
pub mod mutator;

// Re-export commonly used items for convenience
pub use avatar::{AvatarPolicy, ALLOWED_IMAGE_TYPES};
pub use display_name::format_display_name;
pub use mutator::{AvatarUpload, ProfileMutator};
