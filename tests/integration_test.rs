// End-to-end coverage of session resolution, the auth-state store, and
// profile mutation, wired over the testing mocks.
use sessync::models::error::ProfileError;
use sessync::providers::{ProviderAuthError, SessionLookup, SessionProvider};
use sessync::session::SessionOutcome;
use sessync::testing::{MockAssetStore, MockRecordStore, MockSessionProvider, TestFixtures};
use sessync::{
    format_display_name, resolve, resolve_identity_once, AuthStateStore, ProfileMutator,
    RefreshSignal, UploadCandidate,
};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn resolution_classifies_the_documented_provider_shapes() {
    // No error, a user object: signed in
    let outcome = resolve(&SessionLookup::authenticated("u1", "a@b.com"));
    assert_eq!(outcome.identity().unwrap().id, "u1");
    assert_eq!(outcome.identity().unwrap().email, "a@b.com");

    // The provider's dedicated session-missing error name: anonymous
    let outcome = resolve(&SessionLookup::failed(ProviderAuthError::named(
        "AuthSessionMissingError",
        "",
    )));
    assert_eq!(outcome, SessionOutcome::Absent);

    // Anything else: a failure for the caller to decide on
    let outcome = resolve(&TestFixtures::failed_lookup());
    assert!(matches!(outcome, SessionOutcome::Failed(_)));
}

#[tokio::test]
async fn one_shot_resolution_only_errors_on_failure() {
    let provider = MockSessionProvider::with_lookup(TestFixtures::authenticated_lookup());
    let identity = resolve_identity_once(&provider).await.unwrap().unwrap();
    assert_eq!(identity, TestFixtures::identity());

    provider.set_lookup(TestFixtures::session_missing_lookup());
    assert_eq!(resolve_identity_once(&provider).await.unwrap(), None);

    provider.set_lookup(TestFixtures::failed_lookup());
    assert!(resolve_identity_once(&provider).await.is_err());
}

#[tokio::test]
async fn store_follows_a_full_session_lifecycle() {
    let provider = Arc::new(MockSessionProvider::anonymous());
    let refresher = Arc::new(RefreshSignal::new());
    let store = AuthStateStore::activate(
        Arc::clone(&provider) as Arc<dyn SessionProvider>,
        Arc::clone(&refresher) as _,
    );

    let mut states = store.subscribe();
    while states.borrow().loading {
        states.changed().await.unwrap();
    }
    assert!(store.current().identity.is_none());

    // The visitor signs in; the provider notifies subscribers.
    provider.push_event(TestFixtures::authenticated_lookup());
    states.changed().await.unwrap();
    assert_eq!(
        store.current().identity.unwrap(),
        TestFixtures::identity()
    );

    // Sign-out clears local state and refreshes dependent views.
    store.sign_out().await.unwrap();
    assert!(store.current().identity.is_none());
    assert!(!store.current().loading);
    assert_eq!(refresher.generation(), 1);
    assert_eq!(provider.sign_out_calls(), 1);

    // A second sign-out of the now-absent session still succeeds.
    store.sign_out().await.unwrap();
    assert_eq!(provider.sign_out_calls(), 2);
}

#[tokio::test]
async fn deactivated_stores_receive_no_further_notifications() {
    let provider = Arc::new(MockSessionProvider::anonymous());
    let store = AuthStateStore::activate(
        Arc::clone(&provider) as Arc<dyn SessionProvider>,
        Arc::new(RefreshSignal::new()),
    );

    let mut states = store.subscribe();
    while states.borrow().loading {
        states.changed().await.unwrap();
    }
    assert_eq!(provider.change_subscriber_count(), 1);

    drop(store);
    tokio::time::sleep(Duration::from_millis(10)).await;
    provider.push_event(TestFixtures::authenticated_lookup());
    assert_eq!(provider.change_subscriber_count(), 0);
}

fn profile_stack() -> (
    Arc<MockSessionProvider>,
    Arc<MockRecordStore>,
    Arc<MockAssetStore>,
    Arc<RefreshSignal>,
    ProfileMutator,
) {
    let provider = Arc::new(MockSessionProvider::with_lookup(
        TestFixtures::authenticated_lookup(),
    ));
    let records = Arc::new(MockRecordStore::new());
    let assets = Arc::new(MockAssetStore::new());
    let refresher = Arc::new(RefreshSignal::new());
    let mutator = ProfileMutator::new(
        Arc::clone(&provider) as Arc<dyn SessionProvider>,
        Arc::clone(&records) as _,
        Arc::clone(&assets) as _,
        Arc::clone(&refresher) as _,
    );
    (provider, records, assets, refresher, mutator)
}

#[tokio::test]
async fn profile_edits_flow_through_to_the_stores() {
    let (_provider, records, assets, refresher, mutator) = profile_stack();

    mutator.update_display_name("  Jane  ").await.unwrap();
    let first = mutator
        .upload_avatar(&TestFixtures::png_candidate())
        .await
        .unwrap();
    let second = mutator
        .upload_avatar(&TestFixtures::png_candidate())
        .await
        .unwrap();

    // Same stable key, overwritten in place, but never the same URL twice.
    assert_eq!(first.storage_key, second.storage_key);
    assert_ne!(first.avatar_url, second.avatar_url);
    assert_eq!(assets.upload_count(), 2);
    assert!(assets.recorded_uploads().iter().all(|call| call.upsert));

    let updates = records.recorded_updates();
    assert_eq!(updates.len(), 3);
    assert_eq!(updates[0].fields["full_name"], "Jane");
    assert_eq!(updates[2].fields["avatar_url"], second.avatar_url.as_str());

    // One refresh per successful mutation.
    assert_eq!(refresher.generation(), 3);
}

#[tokio::test]
async fn expired_sessions_block_mutations_after_validation() {
    let (provider, records, assets, _refresher, mutator) = profile_stack();
    provider.set_lookup(TestFixtures::session_missing_lookup());

    assert_eq!(
        mutator.update_display_name("Jane").await,
        Err(ProfileError::AuthRequired)
    );
    assert_eq!(
        mutator
            .upload_avatar(&TestFixtures::png_candidate())
            .await
            .unwrap_err(),
        ProfileError::AuthRequired
    );
    assert_eq!(records.update_count(), 0);
    assert_eq!(assets.upload_count(), 0);
}

#[tokio::test]
async fn invalid_uploads_never_touch_the_network() {
    let (provider, records, assets, _refresher, mutator) = profile_stack();

    let rejected = mutator
        .upload_avatar(&TestFixtures::text_candidate())
        .await;
    assert!(matches!(rejected, Err(ProfileError::Validation(_))));

    let no_mime = UploadCandidate::new(Some("avatar.png"), None, vec![1]);
    assert!(matches!(
        mutator.upload_avatar(&no_mime).await,
        Err(ProfileError::Validation(_))
    ));

    assert_eq!(provider.get_user_calls(), 0);
    assert_eq!(records.update_count(), 0);
    assert_eq!(assets.upload_count(), 0);
}

#[tokio::test]
async fn nameless_uploads_use_the_fallback_extension() {
    let (_provider, _records, assets, _refresher, mutator) = profile_stack();

    let upload = mutator
        .upload_avatar(&TestFixtures::nameless_candidate())
        .await
        .unwrap();
    assert_eq!(upload.storage_key, "u1/avatar.png");
    assert_eq!(assets.recorded_uploads()[0].content_type, "image/jpeg");
}

#[test]
fn display_names_degrade_from_name_to_email_local_part() {
    assert_eq!(format_display_name(Some("Jane Doe"), "jane@b.com"), "Jane Doe");
    assert_eq!(format_display_name(None, "admin@test.org"), "admin");
    assert_eq!(format_display_name(Some("  "), "no-at-sign"), "no-at-sign");
}
