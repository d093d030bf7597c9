//! Session manager: owns every session's transcript and output preference.
//!
//! Each session carries two locks:
//!
//! - a FIFO *turn gate* (`tokio::sync::Mutex<()>`) held for the whole life of
//!   a query, so at most one query per session is in flight and queued
//!   queries proceed in arrival order;
//! - a short *state lock* (`std::sync::Mutex`) that guards the transcript and
//!   preference and is never held across an `.await`.
//!
//! Reads, clears and preference changes take only the state lock, so they
//! never wait on a slow language-model call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::MutexGuard as TurnGuard;
use voxchat_core::{OutputMode, Turn};

use crate::error::{poisoned, ChatError};
use crate::input::Query;
use crate::transcript::TranscriptStore;

/// Maximum session id length in characters.
const MAX_SESSION_ID_LENGTH: usize = 128;

// =============================================================================
// Session
// =============================================================================

pub(crate) struct SessionState {
    pub(crate) transcript: TranscriptStore,
    pub(crate) output_mode: OutputMode,
    pub(crate) last_active: DateTime<Utc>,
}

/// One conversation: an ordered transcript plus the user's output preference.
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    turn_gate: tokio::sync::Mutex<()>,
    state: Mutex<SessionState>,
}

impl Session {
    fn new(id: &str, output_mode: OutputMode) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            created_at: now,
            turn_gate: tokio::sync::Mutex::new(()),
            state: Mutex::new(SessionState {
                transcript: TranscriptStore::new(),
                output_mode,
                last_active: now,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Snapshot of the transcript in append order.
    pub fn turns(&self) -> Result<Vec<Turn>, ChatError> {
        self.with_state(|s| s.transcript.all().cloned().collect())
    }

    pub fn output_mode(&self) -> Result<OutputMode, ChatError> {
        self.with_state(|s| s.output_mode)
    }

    pub fn len(&self) -> Result<usize, ChatError> {
        self.with_state(|s| s.transcript.len())
    }

    pub fn is_empty(&self) -> Result<bool, ChatError> {
        self.with_state(|s| s.transcript.is_empty())
    }

    pub fn last_active(&self) -> Result<DateTime<Utc>, ChatError> {
        self.with_state(|s| s.last_active)
    }

    /// Wait for this session's turn. Waiters are served in arrival order.
    pub(crate) async fn acquire_turn(&self) -> TurnGuard<'_, ()> {
        self.turn_gate.lock().await
    }

    /// Run `f` under the state lock.
    pub(crate) fn with_state<R>(
        &self,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> Result<R, ChatError> {
        let mut state = self.state.lock().map_err(poisoned("session state"))?;
        Ok(f(&mut state))
    }

    /// Append `turn` and return the committed copy plus the transcript epoch
    /// it was committed in.
    pub(crate) fn append(&self, turn: Turn) -> Result<(Turn, u64), ChatError> {
        self.with_state(|s| -> Result<(Turn, u64), ChatError> {
            let committed = s.transcript.append(turn)?.clone();
            s.last_active = committed.timestamp();
            Ok((committed, s.transcript.epoch()))
        })?
    }

    /// Append `turn` only if the transcript has not been cleared since
    /// `epoch`. Returns `None` when it has.
    pub(crate) fn append_in_epoch(
        &self,
        epoch: u64,
        turn: Turn,
    ) -> Result<Option<Turn>, ChatError> {
        self.with_state(|s| -> Result<Option<Turn>, ChatError> {
            if s.transcript.epoch() != epoch {
                return Ok(None);
            }
            let committed = s.transcript.append(turn)?.clone();
            s.last_active = committed.timestamp();
            Ok(Some(committed))
        })?
    }

    /// Recent context for the language model, oldest first.
    pub(crate) fn context(&self, window: usize) -> Result<Vec<Turn>, ChatError> {
        self.with_state(|s| s.transcript.recent(window).to_vec())
    }

    fn touch(&self, now: DateTime<Utc>) -> Result<(), ChatError> {
        self.with_state(|s| {
            if now > s.last_active {
                s.last_active = now;
            }
        })
    }

    fn is_expired(&self, timeout: Option<Duration>, now: DateTime<Utc>) -> Result<bool, ChatError> {
        match timeout {
            Some(timeout) => Ok(now - self.last_active()? > timeout),
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Listing entry for a live session.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub turn_count: usize,
    pub output_mode: OutputMode,
}

// =============================================================================
// Manager
// =============================================================================

/// Owns all live sessions, keyed by client-chosen id.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    default_output: OutputMode,
    timeout: Option<Duration>,
}

impl SessionManager {
    /// `timeout_minutes == 0` disables idle expiry.
    pub fn new(default_output: OutputMode, timeout_minutes: u32) -> Self {
        let timeout = (timeout_minutes > 0).then(|| Duration::minutes(i64::from(timeout_minutes)));
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_output,
            timeout,
        }
    }

    /// Return the live session for `id`, creating an empty one if none
    /// exists or the existing one has expired.
    pub fn get_or_create(&self, id: &str) -> Result<Arc<Session>, ChatError> {
        self.get_or_create_at(id, Utc::now())
    }

    pub(crate) fn get_or_create_at(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Arc<Session>, ChatError> {
        validate_session_id(id)?;

        {
            let sessions = self.sessions.read().map_err(poisoned("session map"))?;
            if let Some(session) = sessions.get(id) {
                if !session.is_expired(self.timeout, now)? {
                    session.touch(now)?;
                    return Ok(Arc::clone(session));
                }
            }
        }

        let mut sessions = self.sessions.write().map_err(poisoned("session map"))?;
        // Re-check: another caller may have created it between the locks.
        if let Some(session) = sessions.get(id) {
            if !session.is_expired(self.timeout, now)? {
                session.touch(now)?;
                return Ok(Arc::clone(session));
            }
            tracing::info!(session_id = %id, "Session expired, starting a new one");
        }

        let session = Arc::new(Session::new(id, self.default_output));
        sessions.insert(id.to_string(), Arc::clone(&session));
        tracing::info!(session_id = %id, output_mode = %self.default_output, "Session created");
        Ok(session)
    }

    /// Live session for `id`, if any.
    pub fn get(&self, id: &str) -> Result<Option<Arc<Session>>, ChatError> {
        let sessions = self.sessions.read().map_err(poisoned("session map"))?;
        let Some(session) = sessions.get(id) else {
            return Ok(None);
        };
        if session.is_expired(self.timeout, Utc::now())? {
            return Ok(None);
        }
        Ok(Some(Arc::clone(session)))
    }

    fn require(&self, id: &str) -> Result<Arc<Session>, ChatError> {
        self.get(id)?
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))
    }

    /// Append `query` as a user turn, waiting behind any query already in
    /// flight for this session.
    pub async fn submit(&self, id: &str, query: &Query) -> Result<Turn, ChatError> {
        let session = self.get_or_create(id)?;
        let _turn = session.acquire_turn().await;
        let (turn, _) = self.commit_user_turn(&session, query)?;
        tracing::debug!(session_id = %id, seq = turn.seq(), "User turn submitted");
        Ok(turn)
    }

    /// Append `query` as a user turn of `session`, whose turn gate the
    /// caller holds. Fails with [`ChatError::SessionReset`] when the session
    /// was ended or replaced while the caller waited for its turn.
    pub(crate) fn commit_user_turn(
        &self,
        session: &Arc<Session>,
        query: &Query,
    ) -> Result<(Turn, u64), ChatError> {
        if !self.is_current(session)? {
            return Err(ChatError::SessionReset(session.id().to_string()));
        }
        session.append(Turn::user(query.text(), query.modality()))
    }

    /// Empty the transcript of `id`, keeping its output preference.
    pub fn clear(&self, id: &str) -> Result<(), ChatError> {
        let session = self.require(id)?;
        let dropped = session.with_state(|s| {
            let n = s.transcript.len();
            s.transcript.clear();
            s.last_active = Utc::now();
            n
        })?;
        tracing::info!(session_id = %id, dropped_turns = dropped, "Session cleared");
        Ok(())
    }

    /// Ordered transcript of `id`.
    pub fn history(&self, id: &str) -> Result<Vec<Turn>, ChatError> {
        self.require(id)?.turns()
    }

    /// Set the output preference, creating the session if needed.
    pub fn set_output_mode(&self, id: &str, mode: OutputMode) -> Result<(), ChatError> {
        let session = self.get_or_create(id)?;
        session.with_state(|s| s.output_mode = mode)?;
        tracing::info!(session_id = %id, output_mode = %mode, "Output mode changed");
        Ok(())
    }

    pub fn output_mode(&self, id: &str) -> Result<OutputMode, ChatError> {
        self.require(id)?.output_mode()
    }

    /// Summaries of every live session, oldest first.
    pub fn list(&self) -> Result<Vec<SessionSummary>, ChatError> {
        let now = Utc::now();
        let sessions = self.sessions.read().map_err(poisoned("session map"))?;
        let mut out = Vec::with_capacity(sessions.len());
        for session in sessions.values() {
            if session.is_expired(self.timeout, now)? {
                continue;
            }
            let summary = session.with_state(|s| SessionSummary {
                id: session.id.clone(),
                created_at: session.created_at,
                last_active: s.last_active,
                turn_count: s.transcript.len(),
                output_mode: s.output_mode,
            })?;
            out.push(summary);
        }
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    /// End the session. Returns whether it existed.
    pub fn remove(&self, id: &str) -> Result<bool, ChatError> {
        let mut sessions = self.sessions.write().map_err(poisoned("session map"))?;
        let existed = sessions.remove(id).is_some();
        if existed {
            tracing::info!(session_id = %id, "Session ended");
        }
        Ok(existed)
    }

    /// Drop every session idle for longer than the timeout. Returns how many
    /// were removed.
    pub fn purge_expired(&self) -> Result<usize, ChatError> {
        self.purge_expired_at(Utc::now())
    }

    pub(crate) fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<usize, ChatError> {
        if self.timeout.is_none() {
            return Ok(0);
        }
        let mut sessions = self.sessions.write().map_err(poisoned("session map"))?;
        let mut expired = Vec::new();
        for (id, session) in sessions.iter() {
            if session.is_expired(self.timeout, now)? {
                expired.push(id.clone());
            }
        }
        for id in &expired {
            sessions.remove(id);
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Purged expired sessions");
        }
        Ok(expired.len())
    }

    /// Whether `session` is still the live session registered under its id.
    pub(crate) fn is_current(&self, session: &Arc<Session>) -> Result<bool, ChatError> {
        let sessions = self.sessions.read().map_err(poisoned("session map"))?;
        Ok(sessions
            .get(session.id())
            .is_some_and(|live| Arc::ptr_eq(live, session)))
    }

    pub fn len(&self) -> Result<usize, ChatError> {
        Ok(self.sessions.read().map_err(poisoned("session map"))?.len())
    }

    pub fn is_empty(&self) -> Result<bool, ChatError> {
        Ok(self.len()? == 0)
    }
}

fn validate_session_id(id: &str) -> Result<(), ChatError> {
    if id.trim().is_empty() {
        return Err(ChatError::InvalidSessionId("session id cannot be empty".to_string()));
    }
    if id.chars().count() > MAX_SESSION_ID_LENGTH {
        return Err(ChatError::InvalidSessionId(format!(
            "session id exceeds {} characters",
            MAX_SESSION_ID_LENGTH
        )));
    }
    if id.chars().any(char::is_control) {
        return Err(ChatError::InvalidSessionId(
            "session id contains control characters".to_string(),
        ));
    }
    Ok(())
}
