//! Application context - dependency injection container

use std::path::Path;
use std::sync::Arc;

use clearhold_common::{MemoryKeyValueStore, SharedStore, SystemClock};
use clearhold_core::{OfflineQueue, SessionManager, SessionOptions};
use clearhold_domain::{ClientConfig, Result};
use clearhold_infra::errors::to_domain;
use clearhold_infra::{
    config, ApiClient, ApiClientConfig, HttpAuthBackend, HttpClient, SqliteKeyValueStore,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Key read by the storage health probe; never written
const STORAGE_PROBE_KEY: &str = "clearhold_health_probe";

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: ClientConfig,
    pub store: SharedStore,
    pub session: SessionManager,
    pub api: Arc<ApiClient>,

    shutdown: CancellationToken,
    replay_worker: Mutex<Option<JoinHandle<()>>>,
}

impl AppContext {
    /// Build the context from `.env`, environment variables and config files
    ///
    /// Falls back to [`ClientConfig::default`] when no configuration source
    /// is found.
    pub async fn new() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => info!(path = %path.display(), "loaded .env"),
            Err(err) => debug!(error = %err, "no .env file loaded"),
        }

        let config = config::load().unwrap_or_else(|err| {
            warn!(error = %err, "no configuration found, using defaults");
            ClientConfig::default()
        });
        Self::new_with_config(config).await
    }

    /// Build the context from an explicit configuration
    ///
    /// Restores the persisted session and offline queue, then starts the
    /// reconnect replay worker. A corrupt persisted state is logged and
    /// skipped rather than failing start-up.
    pub async fn new_with_config(config: ClientConfig) -> Result<Self> {
        let store = open_store(config.storage_path.as_deref())?;
        let api_config = ApiClientConfig::from(&config);
        let http = HttpClient::new()?;

        let backend = Arc::new(HttpAuthBackend::new(http.clone(), &api_config));
        let options = SessionOptions {
            refresh_buffer_ms: config.refresh_buffer_ms,
            clock: Arc::new(SystemClock),
        };
        let session = SessionManager::new(backend, Arc::clone(&store), options);
        if let Err(err) = session.restore().await {
            warn!(error = %err, "stored session could not be restored");
        }

        let queue = Arc::new(OfflineQueue::with_store(Arc::clone(&store)));
        if let Err(err) = queue.restore().await {
            warn!(error = %err, "stored offline queue could not be restored");
        }

        let api = Arc::new(
            ApiClient::builder()
                .config(api_config)
                .auth(Arc::new(session.clone()))
                .queue(queue)
                .http_client(http)
                .build()?,
        );

        let shutdown = CancellationToken::new();
        let replay_worker = api.spawn_replay_on_reconnect(shutdown.clone());

        info!(
            base_url = api.base_url(),
            signed_in = session.snapshot().signed_in,
            pending = api.queue().len(),
            "application context ready"
        );

        Ok(Self {
            config,
            store,
            session,
            api,
            shutdown,
            replay_worker: Mutex::new(Some(replay_worker)),
        })
    }

    /// Check the backend, the store and connectivity
    pub async fn health_check(&self) -> HealthStatus {
        let backend = if self.api.is_online() {
            match self.api.health_check().await {
                Ok(true) => ComponentHealth::healthy("backend"),
                Ok(false) => ComponentHealth::unhealthy("backend", "backend reported unhealthy"),
                Err(err) => ComponentHealth::unhealthy("backend", err.to_string()),
            }
        } else {
            ComponentHealth::unhealthy("backend", "offline")
        };

        let storage = match self.store.get(STORAGE_PROBE_KEY).await {
            Ok(_) => ComponentHealth::healthy("storage"),
            Err(err) => ComponentHealth::unhealthy("storage", err.to_string()),
        };

        let connectivity = if self.api.is_online() {
            ComponentHealth::healthy("connectivity")
        } else {
            ComponentHealth::unhealthy("connectivity", "offline")
        };

        let status = HealthStatus::from_components(vec![backend, storage, connectivity]);
        if self.api.is_online() {
            status
        } else {
            status.with_message(format!("offline, {} request(s) queued", self.api.queue().len()))
        }
    }

    /// Stop background work and abort in-flight requests
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.api.cancel_all_requests();

        let worker = self.replay_worker.lock().take();
        if let Some(worker) = worker {
            if let Err(err) = worker.await {
                warn!(error = %err, "replay worker ended abnormally");
            }
            info!("application context shut down");
        }
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn open_store(path: Option<&str>) -> Result<SharedStore> {
    match path.filter(|p| !p.trim().is_empty()) {
        Some(path) => {
            let store = SqliteKeyValueStore::open(Path::new(path)).map_err(to_domain)?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("no storage path configured, session will not survive restarts");
            Ok(Arc::new(MemoryKeyValueStore::new()))
        }
    }
}
