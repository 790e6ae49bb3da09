//! Session manager and refresh scheduler
//!
//! Holds the current credential, persists it through [`TokenStore`] and renews
//! it `refresh_buffer_ms` before expiry.
//!
//! ## Concurrency
//!
//! - `refresh()` is single-flight: callers that arrive while a renewal is
//!   running await the same shared future and observe the same outcome.
//! - Every sign-in and sign-out bumps a generation counter. A renewal that
//!   finishes under a different generation discards its result instead of
//!   resurrecting a session the user already left.
//! - Credential writes happen under one async lock together with timer
//!   re-arming, so at most one refresh timer exists at any time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clearhold_common::auth::{decode_claims, expiry_or_default, TokenClaims};
use clearhold_common::storage::SharedStore;
use clearhold_common::time::{SharedClock, SystemClock};
use clearhold_common::validation::{EmailValidator, StringValidator, Validator};
use clearhold_domain::constants::{DEFAULT_TOKEN_LIFETIME_MS, REFRESH_BUFFER_MS};
use clearhold_domain::{
    AuthGrant, ClearHoldError, Credential, ProfileUpdate, Result, SessionSnapshot, SignInSource,
    UserProfile,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::magic_link::parse_callback;
use super::ports::{AccessTokenProvider, AuthBackend};
use super::token_store::TokenStore;

/// Lower bound for the timer armed right after a renewal, so a backend that
/// issues short-lived tokens cannot drive a tight refresh loop
const MIN_REARM_DELAY: Duration = Duration::from_secs(1);

type RefreshFuture = Shared<BoxFuture<'static, Result<Credential>>>;

struct InFlightRefresh {
    id: u64,
    /// Session generation the renewal started under
    generation: u64,
    future: RefreshFuture,
}

struct RefreshTimer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SessionState {
    credential: Option<Credential>,
    profile: Option<UserProfile>,
}

/// Session tuning
#[derive(Clone)]
pub struct SessionOptions {
    /// Renew this long before expiry
    pub refresh_buffer_ms: i64,
    pub clock: SharedClock,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { refresh_buffer_ms: REFRESH_BUFFER_MS, clock: Arc::new(SystemClock) }
    }
}

struct Inner {
    backend: Arc<dyn AuthBackend>,
    tokens: TokenStore,
    clock: SharedClock,
    refresh_buffer_ms: i64,
    state: RwLock<SessionState>,
    generation: AtomicU64,
    /// Serializes credential writes with their persistence
    commit_lock: tokio::sync::Mutex<()>,
    in_flight: Mutex<Option<InFlightRefresh>>,
    next_refresh_id: AtomicU64,
    timer: Mutex<Option<RefreshTimer>>,
}

/// Owns the signed-in session
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn AuthBackend>, store: SharedStore, options: SessionOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                tokens: TokenStore::new(store),
                clock: options.clock,
                refresh_buffer_ms: options.refresh_buffer_ms,
                state: RwLock::new(SessionState::default()),
                generation: AtomicU64::new(0),
                commit_lock: tokio::sync::Mutex::new(()),
                in_flight: Mutex::new(None),
                next_refresh_id: AtomicU64::new(0),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Load the persisted session at start-up and schedule its renewal
    ///
    /// Leaves the current state untouched when nothing is stored.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<SessionSnapshot> {
        let Some(credential) = self.inner.tokens.load().await? else {
            debug!("no stored session");
            return Ok(self.snapshot());
        };
        let profile = self.inner.tokens.load_profile().await?;

        {
            let _guard = self.inner.commit_lock.lock().await;
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            {
                let mut state = self.inner.state.write();
                state.credential = Some(credential);
                state.profile = profile;
            }
            self.inner.rearm_timer(Duration::ZERO);
        }

        let snapshot = self.snapshot();
        info!(subject_id = ?snapshot.subject_id, "session restored");
        Ok(snapshot)
    }

    /// Authenticate and start a new session
    ///
    /// Input is validated before any network call.
    #[instrument(skip(self, source), fields(kind = source.kind()))]
    pub async fn sign_in(&self, source: SignInSource) -> Result<SessionSnapshot> {
        let source = trim_email(source);
        validate_source(&source)?;
        let grant = self.inner.backend.sign_in(&source).await?;
        self.inner.establish(grant).await
    }

    /// Email a one-time sign-in link and remember the address for completion
    #[instrument(skip(self, email))]
    pub async fn send_magic_link(&self, email: &str) -> Result<()> {
        let email = email.trim();
        Validator::new()
            .check("email", email, &EmailValidator::new())
            .finish()
            .map_err(|err| ClearHoldError::Validation(err.to_string()))?;

        self.inner.backend.send_magic_link(email).await?;
        self.inner.tokens.set_email_hint(email).await?;
        info!("magic link sent");
        Ok(())
    }

    /// Finish a passwordless sign-in from the emailed callback URL
    ///
    /// `email` overrides the address remembered by [`Self::send_magic_link`].
    #[instrument(skip(self, link, email))]
    pub async fn complete_magic_link(
        &self,
        link: &str,
        email: Option<&str>,
    ) -> Result<SessionSnapshot> {
        let callback = parse_callback(link)
            .ok_or_else(|| ClearHoldError::Validation("link is not a sign-in link".into()))?;

        let email = match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) => email.to_string(),
            None => self.inner.tokens.email_hint().await?.ok_or_else(|| {
                ClearHoldError::Validation("email is required to complete sign-in".into())
            })?,
        };

        let snapshot = self.sign_in(SignInSource::MagicLink { email, code: callback.code }).await?;
        if let Err(err) = self.inner.tokens.clear_email_hint().await {
            warn!(error = %err, "failed to clear magic-link email hint");
        }
        Ok(snapshot)
    }

    /// Renew the credential
    ///
    /// Concurrent callers share one backend call. A renewal left behind by
    /// callers that gave up is only joined while its session is still
    /// current. On failure the session is cleared; there is no internal retry.
    pub async fn refresh(&self) -> Result<Credential> {
        let (id, future) = {
            let mut slot = self.inner.in_flight.lock();
            let generation = self.inner.generation.load(Ordering::SeqCst);
            let joinable = slot
                .as_ref()
                .filter(|in_flight| in_flight.generation == generation)
                .map(|in_flight| (in_flight.id, in_flight.future.clone()));
            match joinable {
                Some(joined) => {
                    debug!("joining in-flight refresh");
                    joined
                }
                None => {
                    if slot.is_some() {
                        debug!("replacing abandoned refresh from a previous session");
                    }
                    let id = self.inner.next_refresh_id.fetch_add(1, Ordering::SeqCst);
                    let future =
                        Arc::clone(&self.inner).run_refresh(generation).boxed().shared();
                    *slot = Some(InFlightRefresh { id, generation, future: future.clone() });
                    (id, future)
                }
            }
        };

        let result = future.await;

        let mut slot = self.inner.in_flight.lock();
        if slot.as_ref().is_some_and(|in_flight| in_flight.id == id) {
            *slot = None;
        }
        result
    }

    /// True while a credential exists and `now < expires_at - buffer`
    pub fn is_valid(&self) -> bool {
        self.inner.state.read().credential.as_ref().is_some_and(|c| self.inner.is_fresh(c))
    }

    /// Usable access token, renewing first when inside the buffer
    pub async fn access_token(&self) -> Result<Option<String>> {
        let credential = self.inner.state.read().credential.clone();
        match credential {
            None => Ok(None),
            Some(c) if self.inner.is_fresh(&c) => Ok(Some(c.access_token)),
            Some(_) => self.refresh().await.map(|c| Some(c.access_token)),
        }
    }

    /// End the session locally and, best-effort, on the backend
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        let (token, cleared) = {
            let _guard = self.inner.commit_lock.lock().await;
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            let token = self.inner.clear_memory();
            (token, self.inner.tokens.clear().await)
        };

        if let Some(token) = token {
            if let Err(err) = self.inner.backend.sign_out(&token).await {
                debug!(error = %err, "backend sign-out failed, ignoring");
            }
        }

        info!("signed out");
        cleared
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.state.read().profile.clone()
    }

    /// Re-fetch the profile from the backend and cache it
    #[instrument(skip(self))]
    pub async fn refresh_profile(&self) -> Result<UserProfile> {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        let token = self.require_token().await?;
        let profile = self.inner.backend.fetch_profile(&token).await?;
        self.inner.commit_profile(generation, &profile).await?;
        Ok(profile)
    }

    /// Send a partial update and cache the profile the backend returns
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile> {
        if update.is_empty() {
            return Err(ClearHoldError::Validation("profile update has no fields".into()));
        }
        let generation = self.inner.generation.load(Ordering::SeqCst);
        let token = self.require_token().await?;
        let profile = self.inner.backend.update_profile(&token, &update).await?;
        self.inner.commit_profile(generation, &profile).await?;
        Ok(profile)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.read();
        SessionSnapshot::from_parts(state.credential.as_ref(), state.profile.clone())
    }

    pub fn credential(&self) -> Option<Credential> {
        self.inner.state.read().credential.clone()
    }

    /// Whether a refresh timer is currently waiting
    pub fn refresh_scheduled(&self) -> bool {
        self.inner
            .timer
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.cancel.is_cancelled() && !timer.handle.is_finished())
    }

    async fn require_token(&self) -> Result<String> {
        self.access_token().await?.ok_or_else(|| ClearHoldError::Auth("not signed in".into()))
    }
}

#[async_trait]
impl AccessTokenProvider for SessionManager {
    async fn access_token(&self) -> Result<Option<String>> {
        SessionManager::access_token(self).await
    }
}

impl Inner {
    fn is_fresh(&self, credential: &Credential) -> bool {
        credential.is_valid_at(self.clock.now_millis(), self.refresh_buffer_ms)
    }

    async fn establish(self: &Arc<Self>, grant: AuthGrant) -> Result<SessionSnapshot> {
        let mut credential = self.credential_from_grant(&grant, None);

        let profile = match grant.user {
            Some(user) => Some(user),
            None => match self.backend.fetch_profile(&credential.access_token).await {
                Ok(profile) => Some(profile),
                Err(err) => {
                    warn!(error = %err, "signed in without a profile");
                    None
                }
            },
        };
        if credential.subject_id.is_empty() {
            if let Some(profile) = &profile {
                credential.subject_id.clone_from(&profile.uid);
            }
        }

        let persisted = {
            let _guard = self.commit_lock.lock().await;
            self.generation.fetch_add(1, Ordering::SeqCst);
            {
                let mut state = self.state.write();
                state.credential = Some(credential.clone());
                state.profile.clone_from(&profile);
            }
            self.rearm_timer(Duration::ZERO);
            self.persist(&credential, profile.as_ref()).await
        };

        info!(subject_id = %credential.subject_id, "signed in");
        persisted?;
        Ok(SessionSnapshot::from_parts(Some(&credential), profile))
    }

    async fn run_refresh(self: Arc<Self>, generation: u64) -> Result<Credential> {
        let current = self.state.read().credential.clone();
        let Some(current) = current else {
            return Err(ClearHoldError::Auth("not signed in".into()));
        };

        info!("refreshing access token");
        match self.backend.refresh(&current.access_token).await {
            Ok(grant) => {
                let credential = self.credential_from_grant(&grant, Some(&current.subject_id));

                let _guard = self.commit_lock.lock().await;
                if self.generation.load(Ordering::SeqCst) != generation {
                    return self.superseded();
                }
                {
                    let mut state = self.state.write();
                    state.credential = Some(credential.clone());
                    if grant.user.is_some() {
                        state.profile.clone_from(&grant.user);
                    }
                }
                self.rearm_timer(MIN_REARM_DELAY);
                if let Err(err) = self.persist(&credential, grant.user.as_ref()).await {
                    warn!(error = %err, "refreshed credential kept in memory only");
                }

                info!(expires_at = credential.expires_at_epoch_ms, "access token refreshed");
                Ok(credential)
            }
            Err(err) => {
                let _guard = self.commit_lock.lock().await;
                if self.generation.load(Ordering::SeqCst) != generation {
                    return self.superseded();
                }

                warn!(error = %err, "token refresh failed, ending session");
                self.generation.fetch_add(1, Ordering::SeqCst);
                self.clear_memory();
                if let Err(clear_err) = self.tokens.clear().await {
                    warn!(error = %clear_err, "failed to clear stored session");
                }
                Err(err)
            }
        }
    }

    /// Outcome for a refresh whose session was replaced or ended mid-flight
    fn superseded(&self) -> Result<Credential> {
        debug!("discarding refresh result from a previous session");
        self.state
            .read()
            .credential
            .clone()
            .ok_or_else(|| ClearHoldError::Auth("session ended during refresh".into()))
    }

    async fn commit_profile(&self, generation: u64, profile: &UserProfile) -> Result<()> {
        let _guard = self.commit_lock.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("session changed while fetching profile, not caching it");
            return Ok(());
        }
        self.state.write().profile = Some(profile.clone());
        self.tokens.save_profile(profile).await
    }

    fn credential_from_grant(
        &self,
        grant: &AuthGrant,
        fallback_subject: Option<&str>,
    ) -> Credential {
        let now = self.clock.now_millis();
        let claims = match decode_claims(&grant.token) {
            Ok(claims) => Some(claims),
            Err(err) => {
                debug!(error = %err, "access token claims unreadable, assuming default lifetime");
                None
            }
        };

        let expires_at = expiry_or_default(&grant.token, now, DEFAULT_TOKEN_LIFETIME_MS);
        let subject_id = claims
            .as_ref()
            .and_then(TokenClaims::subject)
            .map(str::to_string)
            .or_else(|| grant.user.as_ref().map(|u| u.uid.clone()).filter(|uid| !uid.is_empty()))
            .or_else(|| fallback_subject.map(str::to_string))
            .unwrap_or_default();

        Credential::new(grant.token.clone(), expires_at, subject_id)
    }

    async fn persist(&self, credential: &Credential, profile: Option<&UserProfile>) -> Result<()> {
        self.tokens.save(credential).await?;
        if let Some(profile) = profile {
            self.tokens.save_profile(profile).await?;
        }
        Ok(())
    }

    /// Drop in-memory state and cancel the timer; returns the old token
    fn clear_memory(&self) -> Option<String> {
        self.cancel_timer();
        let mut state = self.state.write();
        state.profile = None;
        state.credential.take().map(|c| c.access_token)
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.cancel.cancel();
        }
    }

    /// Replace any pending timer with one due at the current credential's
    /// renewal instant (at least `floor` from now)
    fn rearm_timer(self: &Arc<Self>, floor: Duration) {
        let mut slot = self.timer.lock();
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
        }

        let due_in_ms = {
            let state = self.state.read();
            let Some(credential) = state.credential.as_ref() else {
                return;
            };
            credential.millis_until_refresh(self.clock.now_millis(), self.refresh_buffer_ms)
        };
        let delay = Duration::from_millis(u64::try_from(due_in_ms).unwrap_or(0)).max(floor);
        debug!(delay_ms = delay.as_millis() as u64, "refresh timer armed");

        let cancel = CancellationToken::new();
        let cancelled = cancel.clone();
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    if let Err(err) = (SessionManager { inner }).refresh().await {
                        warn!(error = %err, "scheduled refresh failed");
                    }
                }
            }
        });

        *slot = Some(RefreshTimer { cancel, handle });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.cancel.cancel();
        }
    }
}

fn trim_email(source: SignInSource) -> SignInSource {
    match source {
        SignInSource::EmailPassword { email, password } => {
            SignInSource::EmailPassword { email: email.trim().to_string(), password }
        }
        SignInSource::MagicLink { email, code } => {
            SignInSource::MagicLink { email: email.trim().to_string(), code }
        }
        other @ SignInSource::IdToken { .. } => other,
    }
}

fn validate_source(source: &SignInSource) -> Result<()> {
    let required = StringValidator::new().not_empty();
    let result = match source {
        SignInSource::EmailPassword { email, password } => Validator::new()
            .check("email", email, &EmailValidator::new())
            .check("password", password, &required)
            .finish(),
        SignInSource::MagicLink { email, code } => Validator::new()
            .check("email", email, &EmailValidator::new())
            .check("code", code, &required)
            .finish(),
        SignInSource::IdToken { id_token } => {
            Validator::new().check("id_token", id_token, &required).finish()
        }
    };
    result.map_err(|err| ClearHoldError::Validation(err.to_string()))
}
