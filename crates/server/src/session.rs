//! Session lifecycle.
//!
//! One `TravelAgent` per session, held in memory. Idle sessions are
//! reaped by a background task so abandoned conversations cannot pin
//! memory forever.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::watch;

use travel_agent_agent::TravelAgent;
use travel_agent_config::SessionSettings;
use travel_agent_llm::LlmBackend;
use travel_agent_tools::ToolExecutor;

use crate::ServerError;

/// One conversation and its bookkeeping
pub struct Session {
    pub id: String,
    pub agent: Arc<TravelAgent>,
    pub created_at: Instant,
    last_activity: RwLock<Instant>,
}

impl Session {
    fn new(id: String, agent: TravelAgent) -> Self {
        Self {
            id,
            agent: Arc::new(agent),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Whether the session has been idle longer than `ttl`
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.last_activity.read().elapsed() > ttl
    }
}

/// Creates, looks up, and expires sessions
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    llm: Arc<dyn LlmBackend>,
    tools: Arc<dyn ToolExecutor>,
    max_sessions: usize,
    session_ttl: Duration,
    cleanup_interval: Duration,
    max_history_turns: usize,
}

impl SessionManager {
    pub fn new(
        settings: &SessionSettings,
        llm: Arc<dyn LlmBackend>,
        tools: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            llm,
            tools,
            max_sessions: settings.max_sessions,
            session_ttl: Duration::from_secs(settings.ttl_secs),
            cleanup_interval: Duration::from_secs(settings.cleanup_interval_secs),
            max_history_turns: settings.max_history_turns,
        }
    }

    /// Create a new session
    pub fn create(&self) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            // Reclaim expired slots before refusing
            self.cleanup_expired_locked(&mut sessions);
            if sessions.len() >= self.max_sessions {
                return Err(ServerError::Capacity);
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let agent = TravelAgent::new(
            self.llm.clone(),
            self.tools.clone(),
            self.max_history_turns,
        );
        let session = Arc::new(Session::new(id.clone(), agent));
        sessions.insert(id.clone(), session.clone());

        tracing::info!(session_id = %id, sessions = sessions.len(), "created session");
        Ok(session)
    }

    /// Get a session by ID
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "removed session");
        }
        removed
    }

    /// Active session count
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether the LLM backend is reachable
    pub async fn llm_available(&self) -> bool {
        self.llm.is_available().await
    }

    /// Drop every session idle past its TTL
    pub fn cleanup_expired(&self) {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_locked(&mut sessions);
    }

    fn cleanup_expired_locked(&self, sessions: &mut HashMap<String, Arc<Session>>) {
        let ttl = self.session_ttl;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(ttl))
            .map(|(id, _)| id.clone())
            .collect();

        for id in expired {
            sessions.remove(&id);
            tracing::info!(session_id = %id, "expired session");
        }
    }

    /// Start the periodic cleanup task. The returned sender stops it.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let before = manager.count();
                        manager.cleanup_expired();
                        let after = manager.count();
                        if before != after {
                            tracing::info!(
                                removed = before - after,
                                remaining = after,
                                "session cleanup sweep"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}
