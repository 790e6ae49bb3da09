//! Shared test helpers for `clearhold-core` integration tests.
//!
//! Provides an in-memory identity backend and JWT-shaped token builders so
//! session tests can focus on behaviour instead of transport.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use clearhold_common::{MemoryKeyValueStore, MockClock};
use clearhold_core::{AuthBackend, SessionManager, SessionOptions};
use clearhold_domain::{
    AuthGrant, ClearHoldError, ProfileUpdate, Result as DomainResult, SignInSource, UserProfile,
};

/// Fixed "now" for every session test
pub const NOW_MS: i64 = 1_700_000_000_000;
pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const BUFFER_MS: i64 = 5 * 60 * 1000;

/// Build an unsigned JWT-shaped token expiring at `exp_ms`
pub fn token(sub: &str, exp_ms: i64, nonce: usize) -> String {
    let payload = serde_json::json!({ "sub": sub, "exp": exp_ms / 1000, "n": nonce });
    format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(payload.to_string()))
}

pub fn profile(uid: &str) -> UserProfile {
    UserProfile { uid: uid.into(), email: format!("{uid}@example.com"), ..Default::default() }
}

/// In-memory identity backend with call counters
pub struct MockAuthBackend {
    pub sign_in_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
    pub magic_link_emails: Mutex<Vec<String>>,
    pub sign_in_sources: Mutex<Vec<SignInSource>>,
    /// Expiry of tokens issued by `sign_in`
    pub sign_in_exp_ms: AtomicI64,
    /// Expiry of tokens issued by `refresh`
    pub refresh_exp_ms: AtomicI64,
    pub refresh_delay: Mutex<Duration>,
    pub refresh_fails: AtomicBool,
    pub sign_out_fails: AtomicBool,
    pub include_user: AtomicBool,
    /// Issue tokens without a readable payload
    pub opaque_tokens: AtomicBool,
    issued: AtomicUsize,
}

impl Default for MockAuthBackend {
    fn default() -> Self {
        Self {
            sign_in_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            magic_link_emails: Mutex::new(Vec::new()),
            sign_in_sources: Mutex::new(Vec::new()),
            sign_in_exp_ms: AtomicI64::new(NOW_MS + HOUR_MS),
            refresh_exp_ms: AtomicI64::new(NOW_MS + 2 * HOUR_MS),
            refresh_delay: Mutex::new(Duration::ZERO),
            refresh_fails: AtomicBool::new(false),
            sign_out_fails: AtomicBool::new(false),
            include_user: AtomicBool::new(true),
            opaque_tokens: AtomicBool::new(false),
            issued: AtomicUsize::new(0),
        }
    }
}

impl MockAuthBackend {
    pub fn with_refresh_delay(self, delay: Duration) -> Self {
        *self.refresh_delay.lock().unwrap() = delay;
        self
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn issue(&self, exp_ms: i64) -> AuthGrant {
        let nonce = self.issued.fetch_add(1, Ordering::SeqCst);
        let user = self.include_user.load(Ordering::SeqCst).then(|| profile("user-1"));
        let token = if self.opaque_tokens.load(Ordering::SeqCst) {
            format!("opaque-{nonce}")
        } else {
            token("user-1", exp_ms, nonce)
        };
        AuthGrant { token, user }
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn sign_in(&self, source: &SignInSource) -> DomainResult<AuthGrant> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        self.sign_in_sources.lock().unwrap().push(source.clone());
        Ok(self.issue(self.sign_in_exp_ms.load(Ordering::SeqCst)))
    }

    async fn refresh(&self, _access_token: &str) -> DomainResult<AuthGrant> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.refresh_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.refresh_fails.load(Ordering::SeqCst) {
            return Err(ClearHoldError::api(401, Some("TOKEN_EXPIRED".into()), "token expired"));
        }
        Ok(self.issue(self.refresh_exp_ms.load(Ordering::SeqCst)))
    }

    async fn sign_out(&self, _access_token: &str) -> DomainResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.sign_out_fails.load(Ordering::SeqCst) {
            return Err(ClearHoldError::Network("connection reset".into()));
        }
        Ok(())
    }

    async fn send_magic_link(&self, email: &str) -> DomainResult<()> {
        self.magic_link_emails.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn fetch_profile(&self, _access_token: &str) -> DomainResult<UserProfile> {
        Ok(profile("user-1"))
    }

    async fn update_profile(
        &self,
        _access_token: &str,
        update: &ProfileUpdate,
    ) -> DomainResult<UserProfile> {
        let mut updated = profile("user-1");
        update.apply_to(&mut updated);
        Ok(updated)
    }
}

/// Session wired to a mock backend, memory store and mock clock
pub struct Harness {
    pub backend: Arc<MockAuthBackend>,
    pub store: MemoryKeyValueStore,
    pub clock: MockClock,
    pub session: SessionManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_backend(MockAuthBackend::default())
    }

    pub fn with_backend(backend: MockAuthBackend) -> Self {
        Self::with_parts(Arc::new(backend), MemoryKeyValueStore::new())
    }

    /// Second session over the same store, as after an app restart
    pub fn with_parts(backend: Arc<MockAuthBackend>, store: MemoryKeyValueStore) -> Self {
        let clock = MockClock::at(NOW_MS);
        let session = SessionManager::new(
            backend.clone(),
            Arc::new(store.clone()),
            SessionOptions { refresh_buffer_ms: BUFFER_MS, clock: Arc::new(clock.clone()) },
        );
        Self { backend, store, clock, session }
    }

    pub fn email_password() -> SignInSource {
        SignInSource::EmailPassword { email: "ada@example.com".into(), password: "secret".into() }
    }
}
