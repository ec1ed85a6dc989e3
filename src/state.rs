use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{Config, ProgressConfig};
use crate::controller::TranslationController;
use crate::error::SessionLimitReached;
use crate::service::{TranslationService, TranslationServiceClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let service = Arc::new(TranslationServiceClient::new(
            config.api.api_url.clone(),
            config.request_timeout(),
        )?);
        info!("Translation service at {}", service.base_url());
        Ok(Self::with_service(config, service))
    }

    pub fn with_service(config: Config, service: Arc<dyn TranslationService>) -> Self {
        let sessions = Arc::new(SessionStore::new(
            service,
            config.progress.clone(),
            config.session_ttl(),
            config.session.max_sessions,
        ));
        Self {
            config: Arc::new(config),
            sessions,
        }
    }
}

struct SessionEntry {
    controller: Arc<TranslationController>,
    last_seen: DateTime<Utc>,
}

/// One controller per browser session, keyed by a random id in the URL.
pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
    service: Arc<dyn TranslationService>,
    progress: ProgressConfig,
    ttl: chrono::Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(
        service: Arc<dyn TranslationService>,
        progress: ProgressConfig,
        ttl: chrono::Duration,
        max_sessions: usize,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            service,
            progress,
            ttl,
            max_sessions,
        }
    }

    /// Open a fresh session, refusing once `max_sessions` are live.
    pub fn create(&self) -> Result<(String, Arc<TranslationController>), SessionLimitReached> {
        if self.is_full() {
            return Err(SessionLimitReached(self.max_sessions));
        }
        let id = Uuid::new_v4().to_string();
        let controller = Arc::new(TranslationController::new(
            Arc::clone(&self.service),
            self.progress.clone(),
        ));
        self.sessions.insert(
            id.clone(),
            SessionEntry {
                controller: Arc::clone(&controller),
                last_seen: Utc::now(),
            },
        );
        debug!("Created session {}", id);
        Ok((id, controller))
    }

    /// Look up a session and mark it as seen.
    pub fn get(&self, id: &str) -> Option<Arc<TranslationController>> {
        self.sessions.get_mut(id).map(|mut entry| {
            entry.last_seen = Utc::now();
            Arc::clone(&entry.controller)
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.sessions.len() >= self.max_sessions
    }

    /// Drop sessions idle since before `now - ttl`, aborting their attempts.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.ttl;
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().last_seen < cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for id in expired {
            // A request may have touched the session since it was collected.
            if let Some((_, entry)) = self.sessions.remove_if(&id, |_, e| e.last_seen < cutoff) {
                entry.controller.shutdown().await;
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Expired {} idle sessions", removed);
        }
        removed
    }

    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                store.sweep(Utc::now()).await;
            }
        })
    }
}
