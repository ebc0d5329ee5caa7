//! Session Resolution and Synchronization Module
//!
//! This module turns raw provider session lookups into application-level
//! identity values and keeps a client-local view of "who is signed in"
//! consistent with the provider over a page's lifetime.
//!
//! # Modules
//!
//! - [`resolver`] - Pure classification of provider lookups into outcomes
//! - [`store`] - Reactive auth-state store fed by provider notifications

pub mod resolver;
pub mod store;

// Re-export commonly used items for convenience
pub use resolver::{
    resolve, resolve_identity_once, SessionOutcome, SESSION_MISSING_ERROR_NAME,
    SESSION_MISSING_PHRASE,
};
pub use store::AuthStateStore;
