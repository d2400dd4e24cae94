//! Session Management
//!
//! Conversations keyed by an opaque id, each with its turn history and
//! auxiliary state. Every session sits behind its own async mutex: a caller
//! holds it for a whole exchange, so two messages for the same conversation
//! run one after the other while different conversations proceed in parallel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::Conversation;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Auxiliary per-conversation data
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Free-form user preferences supplied by the client
    #[serde(default)]
    pub preferences: Map<String, Value>,

    /// Latest successful payload of each tool, keyed by tool name
    #[serde(default)]
    pub trip_draft: Map<String, Value>,
}

impl SessionState {
    pub fn with_preferences(preferences: Map<String, Value>) -> Self {
        Self {
            preferences,
            trip_draft: Map::new(),
        }
    }

    /// Remember a tool's latest output
    pub fn record_tool_output(&mut self, tool: &str, data: Value) {
        self.trip_draft.insert(tool.to_string(), data);
    }

    pub fn clear(&mut self) {
        self.preferences.clear();
        self.trip_draft.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty() && self.trip_draft.is_empty()
    }
}

/// A complete agent session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Conversation history
    pub conversation: Conversation,

    /// Preferences and trip-in-progress
    pub state: SessionState,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create an empty session with a specific ID
    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            conversation: Conversation::new(),
            state: SessionState::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Discard history and state; the session itself lives on
    pub fn reset(&mut self) {
        self.conversation.clear();
        self.state.clear();
        self.touch();
    }

    /// Turn count
    pub fn turn_count(&self) -> usize {
        self.conversation.len()
    }
}

/// Shared, lockable session
pub type SessionHandle = Arc<Mutex<Session>>;

/// Session store trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Existing session, or a fresh one seeded with `preferences`
    fn get_or_create(
        &self,
        id: &SessionId,
        preferences: Option<Map<String, Value>>,
    ) -> Result<SessionHandle>;

    /// Existing session only
    fn get(&self, id: &SessionId) -> Result<Option<SessionHandle>>;

    /// Wipe one session's history and state, waiting for any exchange in flight.
    /// Unknown ids are a no-op; returns whether the session existed.
    async fn reset(&self, id: &SessionId) -> Result<bool>;

    /// Drop every session, returning how many there were.
    ///
    /// Does not wait for exchanges in flight. Their turns land on a detached
    /// session that is no longer reachable, and a later request for the same
    /// id starts a fresh session that is not serialized against them.
    fn clear_all(&self) -> Result<usize>;

    /// Ids of all sessions, sorted
    fn list_ids(&self) -> Result<Vec<SessionId>>;

    /// Number of sessions
    fn len(&self) -> Result<usize>;
}

/// In-memory session store, alive for the process lifetime
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<SessionId, SessionHandle>>> {
        self.sessions
            .read()
            .map_err(|_| AgentError::Session("session map lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<SessionId, SessionHandle>>> {
        self.sessions
            .write()
            .map_err(|_| AgentError::Session("session map lock poisoned".into()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn get_or_create(
        &self,
        id: &SessionId,
        preferences: Option<Map<String, Value>>,
    ) -> Result<SessionHandle> {
        if let Some(handle) = self.read()?.get(id) {
            return Ok(handle.clone());
        }

        let mut sessions = self.write()?;
        let handle = sessions.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(session = %id, "Creating session");
            let mut session = Session::with_id(id.clone());
            if let Some(preferences) = preferences {
                session.state = SessionState::with_preferences(preferences);
            }
            Arc::new(Mutex::new(session))
        });
        Ok(handle.clone())
    }

    fn get(&self, id: &SessionId) -> Result<Option<SessionHandle>> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn reset(&self, id: &SessionId) -> Result<bool> {
        let Some(handle) = self.get(id)? else {
            return Ok(false);
        };

        handle.lock().await.reset();
        tracing::info!(session = %id, "Session reset");
        Ok(true)
    }

    fn clear_all(&self) -> Result<usize> {
        let mut sessions = self.write()?;
        let cleared = sessions.len();
        sessions.clear();
        tracing::info!(cleared, "All sessions cleared");
        Ok(cleared)
    }

    fn list_ids(&self) -> Result<Vec<SessionId>> {
        let mut ids: Vec<SessionId> = self.read()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Turn;
    use serde_json::json;

    #[test]
    fn test_get_or_create_returns_same_session() {
        let store = MemorySessionStore::new();
        let id = SessionId::from_string("trip-1");

        let a = store.get_or_create(&id, None).unwrap();
        let b = store.get_or_create(&id, None).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_preferences_seed_only_on_creation() {
        let store = MemorySessionStore::new();
        let id = SessionId::from_string("trip-1");

        let mut prefs = Map::new();
        prefs.insert("accommodation".into(), json!("camping"));
        store.get_or_create(&id, Some(prefs)).unwrap();

        let mut other = Map::new();
        other.insert("accommodation".into(), json!("hotel"));
        let handle = store.get_or_create(&id, Some(other)).unwrap();

        let session = handle.lock().await;
        assert_eq!(session.state.preferences["accommodation"], json!("camping"));
    }

    #[tokio::test]
    async fn test_reset_populated_and_unknown() {
        let store = MemorySessionStore::new();
        let id = SessionId::from_string("populated");

        {
            let handle = store.get_or_create(&id, None).unwrap();
            let mut session = handle.lock().await;
            session.conversation.push(Turn::user("Hello"));
            session.state.record_tool_output("get_route", json!({"distance_km": 230}));
        }

        assert!(store.reset(&id).await.unwrap());
        let handle = store.get_or_create(&id, None).unwrap();
        let session = handle.lock().await;
        assert!(session.conversation.is_empty());
        assert!(session.state.is_empty());
        drop(session);

        let unseen = SessionId::from_string("never-seen");
        assert!(!store.reset(&unseen).await.unwrap());
        let handle = store.get_or_create(&unseen, None).unwrap();
        assert!(handle.lock().await.conversation.is_empty());
    }

    #[test]
    fn test_clear_all_and_list_ids() {
        let store = MemorySessionStore::new();
        for name in ["b", "a", "c"] {
            store.get_or_create(&SessionId::from_string(name), None).unwrap();
        }

        let ids: Vec<String> = store
            .list_ids()
            .unwrap()
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        assert_eq!(store.clear_all().unwrap(), 3);
        assert!(store.list_ids().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_waits_for_exchange_in_flight() {
        let store = Arc::new(MemorySessionStore::new());
        let id = SessionId::from_string("busy");
        let handle = store.get_or_create(&id, None).unwrap();

        let mut session = handle.lock().await;
        session.conversation.push(Turn::user("first"));

        let reset = tokio::spawn({
            let store = store.clone();
            let id = id.clone();
            async move { store.reset(&id).await }
        });
        tokio::task::yield_now().await;

        session.conversation.push(Turn::assistant("reply"));
        drop(session);

        assert!(reset.await.unwrap().unwrap());
        assert!(handle.lock().await.conversation.is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_detaches_exchange_in_flight() {
        let store = MemorySessionStore::new();
        let id = SessionId::from_string("busy");
        let handle = store.get_or_create(&id, None).unwrap();

        let mut session = handle.lock().await;
        assert_eq!(store.clear_all().unwrap(), 1);
        session.conversation.push(Turn::user("still running"));

        let fresh = store.get_or_create(&id, None).unwrap();
        assert!(!Arc::ptr_eq(&handle, &fresh));
        assert!(fresh.try_lock().is_ok());
        assert!(fresh.lock().await.conversation.is_empty());
        assert_eq!(session.conversation.len(), 1);
    }
}
