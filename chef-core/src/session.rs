//! # Sessions
//!
//! A [`Session`] bundles everything the assistant knows about one user:
//! preferences, pantry, approved plans and the plain-chat transcript.
//! Nothing here is persisted; [`SessionManager`] keeps sessions in memory
//! for the lifetime of the process.

use crate::history::MealHistory;
use crate::pantry::Pantry;
use crate::preferences::Preferences;
use chef_error::{Error, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Transcript lines kept per session; older lines are dropped first.
pub const MAX_CONVERSATION_LINES: usize = 48;

/// Per-user state passed into every pipeline operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Local>,
    pub preferences: Preferences,
    pub pantry: Pantry,
    pub history: MealHistory,
    /// "User: ..." / "Assistant: ..." lines from plain chat mode
    pub conversation: Vec<String>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Local::now(),
            preferences: Preferences::new(),
            pantry: Pantry::new(),
            history: MealHistory::new(),
            conversation: Vec::new(),
        }
    }

    /// Generate a unique session ID
    pub fn generate_id() -> String {
        format!("session_{:x}", Local::now().timestamp_millis())
    }

    /// Record one exchange of plain chat mode
    pub fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.conversation.push(format!("User: {}", user));
        self.conversation.push(format!("Assistant: {}", assistant));

        let excess = self.conversation.len().saturating_sub(MAX_CONVERSATION_LINES);
        if excess > 0 {
            self.conversation.drain(..excess);
        }
    }

    /// The last `window` transcript lines, oldest first
    pub fn recent_conversation(&self, window: usize) -> &[String] {
        let start = self.conversation.len().saturating_sub(window);
        &self.conversation[start..]
    }
}

/// In-memory registry of sessions keyed by id
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<String, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a session, creating it on first use
    pub fn get_or_create(&mut self, id: &str) -> &mut Session {
        self.sessions.entry(id.to_string()).or_insert_with(|| {
            debug!(session_id = id, "creating session");
            Session::new(id)
        })
    }

    pub fn get(&self, id: &str) -> Result<&Session> {
        self.sessions
            .get(id)
            .ok_or_else(|| Error::session_not_found(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Session> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| Error::session_not_found(id))
    }

    pub fn remove(&mut self, id: &str) -> Result<Session> {
        self.sessions
            .remove(id)
            .ok_or_else(|| Error::session_not_found(id))
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sessions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
