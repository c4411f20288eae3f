//! In-memory session store (non-persistent).
//!
//! Each session holds one [`AgentState`] behind its own async mutex, so
//! requests against the same session run one at a time while other
//! sessions proceed. Planning replaces a session's state wholesale. The
//! store holds at most a fixed number of sessions; planning under a new id
//! beyond that evicts the least recently planned one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::HeaderMap;
use tokio::sync::{Mutex, RwLock};

use crate::task::AgentState;

/// Header carrying the session id, echoed on every state response.
pub const SESSION_HEADER: &str = "x-session-id";

/// Session used when a request carries no usable id.
pub const DEFAULT_SESSION: &str = "default";

const MAX_SESSION_ID_LEN: usize = 128;

pub type SharedAgentState = Arc<Mutex<AgentState>>;

/// Session id from the request headers, or [`DEFAULT_SESSION`].
pub fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_SESSION_ID_LEN)
        .unwrap_or(DEFAULT_SESSION)
        .to_string()
}

struct Session {
    state: SharedAgentState,
    /// Plan sequence number; the smallest is evicted first.
    planned: u64,
}

/// Sessions by id, bounded to `max_sessions` entries.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    max_sessions: usize,
    next_plan: AtomicU64,
}

impl SessionStore {
    /// A zero capacity is treated as one.
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            next_plan: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, id: &str) -> Option<SharedAgentState> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|session| Arc::clone(&session.state))
    }

    /// Install `state` as the session's state, dropping any previous plan.
    ///
    /// When a new id would exceed the capacity, the least recently planned
    /// session is evicted.
    pub async fn replace(&self, id: &str, state: AgentState) -> SharedAgentState {
        let shared = Arc::new(Mutex::new(state));
        let mut sessions = self.sessions.write().await;
        let planned = self.next_plan.fetch_add(1, Ordering::Relaxed);

        if !sessions.contains_key(id) && sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, session)| session.planned)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                tracing::info!(
                    "Session limit {} reached; evicted '{}'",
                    self.max_sessions,
                    oldest
                );
            }
        }

        let previous = sessions.insert(
            id.to_string(),
            Session {
                state: Arc::clone(&shared),
                planned,
            },
        );
        if previous.is_some() {
            tracing::debug!("Session '{}' re-planned; previous state dropped", id);
        }
        shared
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::default_plan;
    use crate::llm::Provider;
    use crate::task::Mode;

    fn state(goal: &str) -> AgentState {
        AgentState::new(goal, Mode::Confirm, Provider::Mock, default_plan()).unwrap()
    }

    #[test]
    fn session_id_from_header_or_default() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id(&headers), DEFAULT_SESSION);

        headers.insert(SESSION_HEADER, " tab-1 ".parse().unwrap());
        assert_eq!(session_id(&headers), "tab-1");

        headers.insert(SESSION_HEADER, "".parse().unwrap());
        assert_eq!(session_id(&headers), DEFAULT_SESSION);
    }

    #[tokio::test]
    async fn replace_overwrites_only_that_session() {
        let store = SessionStore::new(8);
        assert!(store.get("a").await.is_none());

        store.replace("a", state("first")).await;
        store.replace("b", state("other")).await;
        store.replace("a", state("second")).await;

        let a = store.get("a").await.unwrap();
        assert_eq!(a.lock().await.goal(), "second");
        let b = store.get("b").await.unwrap();
        assert_eq!(b.lock().await.goal(), "other");
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn distinct_ids_never_grow_past_the_limit() {
        let store = SessionStore::new(3);
        for i in 0..50 {
            store.replace(&format!("tab-{}", i), state("goal")).await;
        }
        assert_eq!(store.len().await, 3);
        assert!(store.get("tab-0").await.is_none());
        assert!(store.get("tab-49").await.is_some());
    }

    #[tokio::test]
    async fn eviction_picks_least_recently_planned() {
        let store = SessionStore::new(2);
        store.replace("a", state("a1")).await;
        store.replace("b", state("b1")).await;
        // Re-planning "a" makes "b" the oldest.
        store.replace("a", state("a2")).await;
        assert_eq!(store.len().await, 2);

        store.replace("c", state("c1")).await;
        assert!(store.get("b").await.is_none());
        assert_eq!(store.get("a").await.unwrap().lock().await.goal(), "a2");
        assert!(store.get("c").await.is_some());
    }
}
