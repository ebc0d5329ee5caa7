//! Pure classification of provider session lookups
//!
//! Resolution is the act of turning a raw provider response into a
//! [`SessionOutcome`]. An anonymous visitor is a normal outcome, not an
//! error: the provider reports it either under a dedicated error name or
//! only as a message phrase, and either signal alone must classify as
//! [`SessionOutcome::Absent`].

use crate::models::error::ResolutionError;
use crate::models::Identity;
use crate::providers::{ProviderAuthError, SessionLookup, SessionProvider};

/// Error name the provider uses for a missing session
pub const SESSION_MISSING_ERROR_NAME: &str = "AuthSessionMissingError";

/// Message phrase indicating a missing session, matched case-insensitively
///
/// Provider error objects are not guaranteed to carry a stable
/// machine-readable category, so the message substring is an independent,
/// equally sufficient signal.
pub const SESSION_MISSING_PHRASE: &str = "auth session missing";

/// Tagged result of resolving a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// An authenticated identity is signed in
    Present(Identity),
    /// No active session; the caller is anonymous
    Absent,
    /// The provider failed in a way that is not a missing session
    Failed(ResolutionError),
}

impl SessionOutcome {
    /// The identity when the outcome is `Present`
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionOutcome::Present(identity) => Some(identity),
            SessionOutcome::Absent | SessionOutcome::Failed(_) => None,
        }
    }
}

/// Classify a provider lookup into a session outcome
///
/// Pure classification over its input; no side effects. A lookup with
/// neither user nor error is an anonymous visitor.
#[must_use]
pub fn resolve(lookup: &SessionLookup) -> SessionOutcome {
    if let Some(error) = &lookup.error {
        if is_session_missing(error) {
            return SessionOutcome::Absent;
        }
        return SessionOutcome::Failed(ResolutionError::from(error.clone()));
    }

    match &lookup.user {
        Some(user) => SessionOutcome::Present(Identity {
            id: user.id.clone(),
            email: user.email.clone(),
        }),
        None => SessionOutcome::Absent,
    }
}

/// Whether a provider error means "no active session"
///
/// The category name and the message substring are independent signals;
/// either one alone suffices.
fn is_session_missing(error: &ProviderAuthError) -> bool {
    if error.name.as_deref() == Some(SESSION_MISSING_ERROR_NAME) {
        return true;
    }
    error.message.to_lowercase().contains(SESSION_MISSING_PHRASE)
}

/// One-shot, server-side identity resolution
///
/// `Present` yields the identity, `Absent` yields `None`, and only
/// `Failed` surfaces an error for the caller to decide on.
///
/// # Errors
/// Returns a [`ResolutionError`] when the provider fails in a way that is
/// not a missing session.
pub async fn resolve_identity_once(
    provider: &dyn SessionProvider,
) -> Result<Option<Identity>, ResolutionError> {
    match resolve(&provider.get_user().await) {
        SessionOutcome::Present(identity) => Ok(Some(identity)),
        SessionOutcome::Absent => Ok(None),
        SessionOutcome::Failed(error) => Err(error),
    }
}
