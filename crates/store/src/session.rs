//! Authenticated session held by the record store client.
//!
//! The session lives in memory only. One writer at a time may replace it;
//! callers that observed an already-replaced session reuse the newer one
//! instead of logging in again.

use chrono::{DateTime, Utc};
use deskpilot_core::error::StoreError;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::debug;

/// An admin auth token plus bookkeeping.
#[derive(Clone)]
pub struct Session {
    token: String,
    /// Bumped on every successful login; lets stale holders detect replacement.
    pub generation: u64,
    pub obtained_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, generation: u64) -> Self {
        Self {
            token: token.into(),
            generation,
            obtained_at: Utc::now(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("generation", &self.generation)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Single-writer holder of the current session.
#[derive(Default)]
pub struct SessionManager {
    slot: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the held session, logging in first if there is none.
    pub async fn current<F, Fut>(&self, login: F) -> Result<Session, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, StoreError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }

        let session = Session::new(login().await?, 1);
        debug!(generation = session.generation, "Store session acquired");
        *slot = Some(session.clone());
        Ok(session)
    }

    /// Replace the session that was rejected upstream.
    ///
    /// If another caller already replaced `stale`, the newer session is
    /// returned without logging in.
    pub async fn refresh<F, Fut>(&self, stale: &Session, login: F) -> Result<Session, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, StoreError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(held) = slot.as_ref()
            && held.generation > stale.generation
        {
            return Ok(held.clone());
        }

        let generation = slot.as_ref().map_or(stale.generation, |s| s.generation) + 1;
        let session = Session::new(login().await?, generation);
        debug!(generation, "Store session refreshed");
        *slot = Some(session.clone());
        Ok(session)
    }

    /// Unconditionally log in and replace the held session.
    pub async fn replace<F, Fut>(&self, login: F) -> Result<Session, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, StoreError>>,
    {
        let mut slot = self.slot.lock().await;
        let generation = slot.as_ref().map_or(0, |s| s.generation) + 1;
        let session = Session::new(login().await?, generation);
        *slot = Some(session.clone());
        Ok(session)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}
