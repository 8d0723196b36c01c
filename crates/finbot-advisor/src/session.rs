//! Session Management
//!
//! Per-visitor state: an id and, once uploaded, the portfolio. Sessions
//! live in memory only, bounded by capacity and expired when idle.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::model::Holding;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(format!("session_{}", Uuid::new_v4().simple()))
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

/// One visitor's state
#[derive(Clone, Debug)]
pub struct Session {
    pub id: SessionId,

    /// Holdings from the last successful upload
    pub portfolio: Option<Arc<Vec<Holding>>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            portfolio: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_portfolio(&self) -> bool {
        self.portfolio.as_ref().is_some_and(|p| !p.is_empty())
    }
}

/// Session store trait for persistence
pub trait SessionStore: Send + Sync {
    /// Save a session, replacing any previous version
    fn save(&self, session: &Session) -> Result<()>;

    /// Load a session by ID
    fn load(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Delete a session
    fn delete(&self, id: &SessionId) -> Result<()>;

    /// Replace the session's portfolio, creating the session if unknown
    fn attach_portfolio(&self, id: &SessionId, holdings: Vec<Holding>) -> Result<Session> {
        let mut session = self.load(id)?.unwrap_or_else(|| Session::new(id.clone()));
        session.portfolio = Some(Arc::new(holdings));
        session.updated_at = Utc::now();
        self.save(&session)?;
        Ok(session)
    }

    /// Number of live sessions
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory session store with a capacity bound and idle expiry
pub struct MemorySessionStore {
    sessions: Cache<SessionId, Session>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(60 * 60))
    }
}

impl MemorySessionStore {
    pub fn new(capacity: u64, time_to_idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(time_to_idle)
                .build(),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.get(id))
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        self.sessions.invalidate(id);
        Ok(())
    }

    fn len(&self) -> u64 {
        self.sessions.run_pending_tasks();
        self.sessions.entry_count()
    }
}
