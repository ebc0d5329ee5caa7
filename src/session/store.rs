//! Reactive client-side auth-state store
//!
//! `AuthStateStore` owns the client-local `{identity, loading}` pair for
//! one activation (one mounted view). It seeds itself with a one-shot
//! session lookup, then applies every provider change notification in
//! arrival order through the resolver. The store is lifecycle-scoped
//! rather than a module-wide singleton, so concurrent views and tests
//! stay isolated.

use crate::models::AuthState;
use crate::providers::{ProviderError, SessionProvider};
use crate::refresh::ViewRefresher;
use crate::session::resolver::{resolve, SessionOutcome};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Subscribable store tracking the current identity and loading flag
///
/// State is mutated only by the store itself: the single listener task
/// applies notifications in arrival order, and `sign_out` applies an
/// `Absent` that is idempotent with any later `Absent` notification.
pub struct AuthStateStore {
    provider: Arc<dyn SessionProvider>,
    refresher: Arc<dyn ViewRefresher>,
    state: Arc<watch::Sender<AuthState>>,
    listener: JoinHandle<()>,
}

impl AuthStateStore {
    /// Activate the store: seed initial state, then follow change events
    ///
    /// Exactly one standing subscription is opened per activation. The
    /// returned store publishes `loading = true` until the first lookup
    /// has been classified, and `loading = false` from then on.
    #[must_use]
    pub fn activate(
        provider: Arc<dyn SessionProvider>,
        refresher: Arc<dyn ViewRefresher>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        let state = Arc::new(state);

        let task_state = Arc::clone(&state);
        let task_provider = Arc::clone(&provider);
        let listener = tokio::spawn(async move {
            // Subscribe before the seed lookup so no change event slips
            // between the two.
            let mut subscription = task_provider.on_auth_state_change();

            let seed = task_provider.get_session().await;
            apply(&task_state, resolve(&seed));

            while let Some(lookup) = subscription.next().await {
                apply(&task_state, resolve(&lookup));
            }
        });

        Self {
            provider,
            refresher,
            state,
            listener,
        }
    }

    /// Snapshot of the current auth state
    #[must_use]
    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Subscribe to auth-state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Sign the current session out
    ///
    /// Applies `Absent` locally and raises the dependent-view refresh so
    /// server-rendered views re-resolve. Navigation to a public landing
    /// view is the UI layer's responsibility. Signing out a session that
    /// is already absent is a no-op that succeeds.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the sign-out.
    pub async fn sign_out(&self) -> Result<(), ProviderError> {
        self.provider.sign_out().await?;

        self.state.send_replace(AuthState {
            identity: None,
            loading: false,
        });
        self.refresher.refresh();
        Ok(())
    }
}

impl Drop for AuthStateStore {
    fn drop(&mut self) {
        // Deactivation: stop the listener so the provider subscription is
        // released and no notification reaches a dead consumer.
        self.listener.abort();
    }
}

/// Apply a classified outcome to the published state
///
/// `Present` sets the identity; `Absent` and `Failed` clear it. A failure
/// degrades to anonymous with a logged warning rather than poisoning the
/// store.
fn apply(state: &watch::Sender<AuthState>, outcome: SessionOutcome) {
    let identity = match outcome {
        SessionOutcome::Present(identity) => Some(identity),
        SessionOutcome::Absent => None,
        SessionOutcome::Failed(error) => {
            log::warn!("Session resolution failed; treating as anonymous: {error}");
            None
        }
    };
    state.send_replace(AuthState {
        identity,
        loading: false,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ProviderAuthError, SessionLookup};
    use crate::refresh::RefreshSignal;
    use crate::testing::mock::MockSessionProvider;
    use std::time::Duration;

    async fn settle(receiver: &mut watch::Receiver<AuthState>) -> AuthState {
        while receiver.borrow().loading {
            receiver.changed().await.unwrap();
        }
        receiver.borrow().clone()
    }

    #[tokio::test]
    async fn loading_is_true_only_before_the_first_lookup() {
        let provider = Arc::new(MockSessionProvider::anonymous());
        let store = AuthStateStore::activate(provider, Arc::new(RefreshSignal::new()));

        // The listener task has not run yet on this single-threaded runtime.
        assert!(store.current().loading);

        let mut receiver = store.subscribe();
        let state = settle(&mut receiver).await;
        assert!(!state.loading);
        assert!(state.identity.is_none());
    }

    #[tokio::test]
    async fn seed_lookup_sets_the_identity() {
        let provider = Arc::new(MockSessionProvider::signed_in("u1", "a@b.com"));
        let store = AuthStateStore::activate(provider, Arc::new(RefreshSignal::new()));

        let mut receiver = store.subscribe();
        let state = settle(&mut receiver).await;
        assert_eq!(state.identity.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn change_events_are_applied_in_arrival_order() {
        let provider = Arc::new(MockSessionProvider::anonymous());
        let store = AuthStateStore::activate(Arc::clone(&provider) as Arc<dyn SessionProvider>, Arc::new(RefreshSignal::new()));
        let mut receiver = store.subscribe();
        settle(&mut receiver).await;

        provider.push_event(SessionLookup::authenticated("u1", "a@b.com"));
        provider.push_event(SessionLookup::anonymous());
        provider.push_event(SessionLookup::authenticated("u2", "c@d.com"));

        let mut last = AuthState::default();
        while tokio::time::timeout(Duration::from_millis(50), receiver.changed())
            .await
            .is_ok()
        {
            last = receiver.borrow().clone();
        }
        assert_eq!(last.identity.unwrap().id, "u2");
        assert!(!last.loading);
    }

    #[tokio::test]
    async fn failed_lookup_clears_the_identity_and_stays_loaded() {
        let provider = Arc::new(MockSessionProvider::signed_in("u1", "a@b.com"));
        let store = AuthStateStore::activate(Arc::clone(&provider) as Arc<dyn SessionProvider>, Arc::new(RefreshSignal::new()));
        let mut receiver = store.subscribe();
        settle(&mut receiver).await;

        provider.push_event(SessionLookup::failed(ProviderAuthError::message_only(
            "provider exploded",
        )));
        receiver.changed().await.unwrap();

        let state = receiver.borrow().clone();
        assert!(state.identity.is_none());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn sign_out_clears_state_and_refreshes_dependent_views() {
        let provider = Arc::new(MockSessionProvider::signed_in("u1", "a@b.com"));
        let refresher = Arc::new(RefreshSignal::new());
        let store = AuthStateStore::activate(Arc::clone(&provider) as Arc<dyn SessionProvider>, Arc::clone(&refresher) as _);
        let mut receiver = store.subscribe();
        settle(&mut receiver).await;

        store.sign_out().await.unwrap();

        assert!(store.current().identity.is_none());
        assert_eq!(provider.sign_out_calls(), 1);
        assert_eq!(refresher.generation(), 1);
    }

    #[tokio::test]
    async fn signing_out_an_absent_session_succeeds() {
        let provider = Arc::new(MockSessionProvider::anonymous());
        let store = AuthStateStore::activate(Arc::clone(&provider) as Arc<dyn SessionProvider>, Arc::new(RefreshSignal::new()));
        let mut receiver = store.subscribe();
        settle(&mut receiver).await;

        store.sign_out().await.unwrap();
        store.sign_out().await.unwrap();
        assert!(store.current().identity.is_none());
    }

    #[tokio::test]
    async fn dropping_the_store_releases_the_subscription() {
        let provider = Arc::new(MockSessionProvider::anonymous());
        let store = AuthStateStore::activate(Arc::clone(&provider) as Arc<dyn SessionProvider>, Arc::new(RefreshSignal::new()));
        let mut receiver = store.subscribe();
        settle(&mut receiver).await;
        assert_eq!(provider.change_subscriber_count(), 1);

        drop(store);
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The next emit prunes the dead subscription.
        provider.push_event(SessionLookup::anonymous());
        assert_eq!(provider.change_subscriber_count(), 0);
    }
}
