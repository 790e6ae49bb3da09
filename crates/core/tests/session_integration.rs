//! Session manager behaviour against an in-memory backend

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use clearhold_common::KeyValueStore;
use clearhold_domain::{ClearHoldError, ProfileUpdate, SignInSource};
use support::{Harness, MockAuthBackend, BUFFER_MS, HOUR_MS, NOW_MS};

#[tokio::test]
async fn test_sign_in_persists_credential_and_profile() {
    let h = Harness::new();

    let snapshot = h.session.sign_in(Harness::email_password()).await.unwrap();

    assert!(snapshot.signed_in);
    assert_eq!(snapshot.subject_id.as_deref(), Some("user-1"));
    assert_eq!(snapshot.expires_at_epoch_ms, Some(NOW_MS + HOUR_MS));
    assert!(h.session.is_valid());
    assert!(h.session.refresh_scheduled());

    let stored_expiry = h.store.get("clearhold_token_expiry").await.unwrap().unwrap();
    assert_eq!(stored_expiry, (NOW_MS + HOUR_MS).to_string());
    assert!(h.store.get("clearhold_user_profile").await.unwrap().is_some());
}

#[tokio::test]
async fn test_invalid_input_never_reaches_backend() {
    let h = Harness::new();

    let err = h
        .session
        .sign_in(SignInSource::EmailPassword { email: "ada".into(), password: String::new() })
        .await
        .unwrap_err();

    assert!(matches!(err, ClearHoldError::Validation(_)));
    assert_eq!(h.backend.sign_in_calls.load(Ordering::SeqCst), 0);
    assert!(!h.session.snapshot().signed_in);
}

#[tokio::test]
async fn test_sign_in_sends_trimmed_email() {
    let h = Harness::new();

    h.session
        .sign_in(SignInSource::EmailPassword {
            email: "  ada@example.com \n".into(),
            password: " pw ".into(),
        })
        .await
        .unwrap();

    let sources = h.backend.sign_in_sources.lock().unwrap().clone();
    let expected =
        SignInSource::EmailPassword { email: "ada@example.com".into(), password: " pw ".into() };
    assert_eq!(sources, vec![expected]);
}

#[tokio::test]
async fn test_opaque_token_gets_default_lifetime() {
    let h = Harness::new();
    h.backend.opaque_tokens.store(true, Ordering::SeqCst);

    let snapshot = h.session.sign_in(Harness::email_password()).await.unwrap();

    assert_eq!(snapshot.expires_at_epoch_ms, Some(NOW_MS + HOUR_MS));
    assert_eq!(snapshot.subject_id.as_deref(), Some("user-1"));
}

#[tokio::test]
async fn test_validity_boundary_honours_buffer() {
    let h = Harness::new();
    h.session.sign_in(Harness::email_password()).await.unwrap();
    let refresh_at = NOW_MS + HOUR_MS - BUFFER_MS;

    h.clock.set_millis(refresh_at - 1);
    assert!(h.session.is_valid());

    h.clock.set_millis(refresh_at);
    assert!(!h.session.is_valid());

    h.clock.set_millis(NOW_MS + 2 * HOUR_MS);
    assert!(!h.session.is_valid());
}

#[tokio::test]
async fn test_concurrent_refresh_is_single_flight() {
    let h = Harness::with_backend(
        MockAuthBackend::default().with_refresh_delay(Duration::from_millis(50)),
    );
    h.session.sign_in(Harness::email_password()).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let session = h.session.clone();
        tasks.push(tokio::spawn(async move { session.refresh().await }));
    }

    let mut tokens = Vec::new();
    for task in tasks {
        tokens.push(task.await.unwrap().unwrap().access_token);
    }

    assert_eq!(h.backend.refresh_count(), 1);
    assert!(tokens.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(h.session.credential().unwrap().expires_at_epoch_ms, NOW_MS + 2 * HOUR_MS);

    // Completed flights are not reused
    h.session.refresh().await.unwrap();
    assert_eq!(h.backend.refresh_count(), 2);
}

#[tokio::test]
async fn test_concurrent_refresh_failure_is_shared_and_signs_out() {
    let h = Harness::with_backend(
        MockAuthBackend::default().with_refresh_delay(Duration::from_millis(30)),
    );
    h.session.sign_in(Harness::email_password()).await.unwrap();
    h.backend.refresh_fails.store(true, Ordering::SeqCst);

    let (a, b, c) =
        tokio::join!(h.session.refresh(), h.session.refresh(), h.session.refresh());

    assert_eq!(h.backend.refresh_count(), 1);
    let errors = [a.unwrap_err(), b.unwrap_err(), c.unwrap_err()];
    assert!(errors.iter().all(|e| e == &errors[0]));
    assert_eq!(errors[0].status(), Some(401));

    assert!(!h.session.snapshot().signed_in);
    assert!(!h.session.refresh_scheduled());
    assert!(h.store.get("clearhold_auth_token").await.unwrap().is_none());
}

#[tokio::test]
async fn test_access_token_refreshes_inside_buffer() {
    let h = Harness::new();
    assert_eq!(h.session.access_token().await.unwrap(), None);

    h.session.sign_in(Harness::email_password()).await.unwrap();
    let first = h.session.access_token().await.unwrap().unwrap();
    assert_eq!(h.backend.refresh_count(), 0);

    h.clock.set_millis(NOW_MS + HOUR_MS - BUFFER_MS + 1);
    let second = h.session.access_token().await.unwrap().unwrap();

    assert_eq!(h.backend.refresh_count(), 1);
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_sign_out_during_refresh_discards_result() {
    let h = Harness::with_backend(
        MockAuthBackend::default().with_refresh_delay(Duration::from_millis(100)),
    );
    h.session.sign_in(Harness::email_password()).await.unwrap();

    let pending = {
        let session = h.session.clone();
        tokio::spawn(async move { session.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.session.sign_out().await.unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(err, ClearHoldError::Auth("session ended during refresh".into()));
    assert!(h.session.credential().is_none());
    assert!(h.store.get("clearhold_auth_token").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sign_in_during_refresh_wins() {
    let h = Harness::with_backend(
        MockAuthBackend::default().with_refresh_delay(Duration::from_millis(100)),
    );
    h.session.sign_in(Harness::email_password()).await.unwrap();

    let pending = {
        let session = h.session.clone();
        tokio::spawn(async move { session.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.backend.sign_in_exp_ms.store(NOW_MS + 3 * HOUR_MS, Ordering::SeqCst);
    h.session.sign_in(Harness::email_password()).await.unwrap();

    let credential = pending.await.unwrap().unwrap();
    assert_eq!(credential.expires_at_epoch_ms, NOW_MS + 3 * HOUR_MS);
    assert_eq!(h.session.credential().unwrap(), credential);
}

#[tokio::test]
async fn test_abandoned_refresh_is_not_joined_by_next_session() {
    let h = Harness::with_backend(
        MockAuthBackend::default().with_refresh_delay(Duration::from_millis(100)),
    );
    h.session.sign_in(Harness::email_password()).await.unwrap();

    let gave_up = tokio::time::timeout(Duration::from_millis(10), h.session.refresh()).await;
    assert!(gave_up.is_err());
    assert_eq!(h.backend.refresh_count(), 1);

    h.session.sign_out().await.unwrap();
    h.session.sign_in(Harness::email_password()).await.unwrap();

    let credential = h.session.refresh().await.unwrap();

    assert_eq!(h.backend.refresh_count(), 2);
    assert_eq!(credential.expires_at_epoch_ms, NOW_MS + 2 * HOUR_MS);
    assert_eq!(h.session.credential().unwrap(), credential);
    assert!(h.session.refresh_scheduled());
}

#[tokio::test]
async fn test_sign_out_ignores_backend_failure() {
    let h = Harness::new();
    h.session.sign_in(Harness::email_password()).await.unwrap();
    h.backend.sign_out_fails.store(true, Ordering::SeqCst);

    h.session.sign_out().await.unwrap();

    assert_eq!(h.backend.sign_out_calls.load(Ordering::SeqCst), 1);
    assert!(!h.session.refresh_scheduled());
    assert!(h.session.profile().is_none());
    assert_eq!(h.session.access_token().await.unwrap(), None);
}

#[tokio::test]
async fn test_restore_after_restart() {
    let first = Harness::new();
    first.session.sign_in(Harness::email_password()).await.unwrap();

    let restarted = Harness::with_parts(Arc::clone(&first.backend), first.store.clone());
    let snapshot = restarted.session.restore().await.unwrap();

    assert!(snapshot.signed_in);
    assert_eq!(snapshot.profile.unwrap().uid, "user-1");
    assert!(restarted.session.is_valid());
    assert!(restarted.session.refresh_scheduled());
}

#[tokio::test]
async fn test_restore_ignores_unparseable_expiry() {
    let h = Harness::new();
    h.store.set("clearhold_auth_token", "tok").await.unwrap();
    h.store.set("clearhold_token_expiry", "soon").await.unwrap();

    let snapshot = h.session.restore().await.unwrap();

    assert!(!snapshot.signed_in);
    assert!(!h.session.refresh_scheduled());
}

#[tokio::test(start_paused = true)]
async fn test_timer_refreshes_before_expiry() {
    let backend = MockAuthBackend::default();
    backend.sign_in_exp_ms.store(NOW_MS + BUFFER_MS + 1_000, Ordering::SeqCst);
    let h = Harness::with_backend(backend);

    h.session.sign_in(Harness::email_password()).await.unwrap();
    assert_eq!(h.backend.refresh_count(), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(h.backend.refresh_count(), 1);
    assert_eq!(h.session.credential().unwrap().expires_at_epoch_ms, NOW_MS + 2 * HOUR_MS);
    assert!(h.session.refresh_scheduled());
}

#[tokio::test(start_paused = true)]
async fn test_restore_inside_buffer_refreshes_immediately() {
    let h = Harness::new();
    h.store.set("clearhold_auth_token", "opaque").await.unwrap();
    h.store.set("clearhold_token_expiry", &(NOW_MS + 60_000).to_string()).await.unwrap();

    h.session.restore().await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(h.backend.refresh_count(), 1);
    assert!(h.session.is_valid());
}

#[tokio::test]
async fn test_magic_link_round_trip_uses_stored_email() {
    let h = Harness::new();
    h.session.send_magic_link(" ada@example.com ").await.unwrap();
    assert_eq!(
        h.store.get("emailForSignIn").await.unwrap().as_deref(),
        Some("ada@example.com")
    );

    let snapshot = h
        .session
        .complete_magic_link("https://app.clearhold.app/auth?mode=signIn&oobCode=one-time", None)
        .await
        .unwrap();

    assert!(snapshot.signed_in);
    assert!(h.store.get("emailForSignIn").await.unwrap().is_none());
    let sources = h.backend.sign_in_sources.lock().unwrap().clone();
    assert_eq!(
        sources,
        vec![SignInSource::MagicLink { email: "ada@example.com".into(), code: "one-time".into() }]
    );
}

#[tokio::test]
async fn test_magic_link_rejects_bad_input() {
    let h = Harness::new();

    let not_a_link = h.session.complete_magic_link("https://app.clearhold.app/home", None).await;
    assert!(matches!(not_a_link, Err(ClearHoldError::Validation(_))));

    let no_email = h.session.complete_magic_link("/auth?mode=signIn&code=abc", None).await;
    assert!(matches!(no_email, Err(ClearHoldError::Validation(_))));

    assert!(h.session.send_magic_link("nope").await.is_err());
    assert!(h.backend.magic_link_emails.lock().unwrap().is_empty());
    assert_eq!(h.backend.sign_in_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_profile_sync() {
    let h = Harness::new();
    assert!(matches!(h.session.refresh_profile().await, Err(ClearHoldError::Auth(_))));

    h.session.sign_in(Harness::email_password()).await.unwrap();
    let updated = h
        .session
        .update_profile(ProfileUpdate { display_name: Some("Ada L.".into()), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(updated.display_name.as_deref(), Some("Ada L."));
    assert_eq!(h.session.profile().unwrap().display_name.as_deref(), Some("Ada L."));
    assert!(matches!(
        h.session.update_profile(ProfileUpdate::default()).await,
        Err(ClearHoldError::Validation(_))
    ));
}
