use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;

use crate::core::compat::compatible;
use crate::core::state::EngineState;
use crate::models::{EngineSnapshot, Profile, UserId};

/// Errors returned by engine operations
///
/// None of these are fatal; the dispatcher turns each into a notice for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("user {0} has no profile")]
    NoProfile(UserId),

    #[error("user {0} is already in a chat")]
    AlreadyPaired(UserId),

    #[error("user {0} is not in a chat")]
    NotInSession(UserId),

    #[error("user {0} already has a profile")]
    ProfileExists(UserId),
}

/// Outcome of a successful match request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Paired with the earliest compatible waiting user
    Matched { partner: UserId },
    /// No compatible partner; the user is (still) in the waiting pool
    Waiting { already_waiting: bool },
}

/// Outcome of a leave request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// An active chat was torn down
    LeftSession { partner: UserId },
    /// The user stopped waiting for a partner
    Withdrawn,
    /// Neither waiting nor paired; nothing changed
    NotInChat,
}

/// Pairing & relay engine
///
/// Owns the profile store, the waiting pool and the session table. Every
/// operation runs inside one critical section over all three, so a scan that
/// picks a partner can never interleave with that partner leaving or being
/// picked by someone else. No I/O happens while the lock is held.
#[derive(Debug, Clone, Default)]
pub struct PairingEngine {
    state: Arc<Mutex<EngineState>>,
}

impl PairingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a completed profile. Profiles cannot be replaced.
    pub async fn submit_profile(&self, user_id: UserId, profile: Profile) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        if state.profiles.contains_key(&user_id) {
            return Err(EngineError::ProfileExists(user_id));
        }
        state.profiles.insert(user_id, profile);
        tracing::debug!(user_id, "Profile stored");
        Ok(())
    }

    pub async fn has_profile(&self, user_id: UserId) -> bool {
        self.state.lock().await.profiles.contains_key(&user_id)
    }

    pub async fn profile(&self, user_id: UserId) -> Option<Profile> {
        self.state.lock().await.profiles.get(&user_id).cloned()
    }

    /// Pair `user_id` with the first compatible waiting user, or enqueue it
    ///
    /// The waiting pool is scanned in insertion order (first fit). A user never
    /// matches itself, and a repeated request while waiting changes nothing.
    pub async fn request_match(&self, user_id: UserId) -> Result<MatchOutcome, EngineError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let profile = state
            .profiles
            .get(&user_id)
            .ok_or(EngineError::NoProfile(user_id))?;

        if state.sessions.contains(user_id) {
            return Err(EngineError::AlreadyPaired(user_id));
        }

        let profiles = &state.profiles;
        let partner = state.waiting.find_first(|candidate| {
            candidate != user_id
                && profiles
                    .get(&candidate)
                    .is_some_and(|other| compatible(profile, other))
        });

        if let Some(partner) = partner {
            state.waiting.remove(partner);
            // Waiting and paired are exclusive.
            state.waiting.remove(user_id);
            state.sessions.pair(user_id, partner);
            tracing::info!(user_id, partner, "Users paired");
            return Ok(MatchOutcome::Matched { partner });
        }

        let already_waiting = !state.waiting.push(user_id, Instant::now());
        tracing::debug!(user_id, already_waiting, waiting = state.waiting.len(), "No compatible partner");
        Ok(MatchOutcome::Waiting { already_waiting })
    }

    /// Look up the partner a message from `user_id` should be forwarded to
    ///
    /// The forward itself happens outside the engine, through the transport.
    pub async fn relay(&self, user_id: UserId) -> Result<UserId, EngineError> {
        self.state
            .lock()
            .await
            .sessions
            .partner_of(user_id)
            .ok_or(EngineError::NotInSession(user_id))
    }

    /// Remove `user_id` from whichever state it is in
    pub async fn leave(&self, user_id: UserId) -> LeaveOutcome {
        let mut state = self.state.lock().await;

        if let Some(partner) = state.sessions.unpair(user_id) {
            tracing::info!(user_id, partner, "Session ended");
            return LeaveOutcome::LeftSession { partner };
        }

        if state.waiting.remove(user_id) {
            tracing::debug!(user_id, "Withdrawn from waiting pool");
            return LeaveOutcome::Withdrawn;
        }

        LeaveOutcome::NotInChat
    }

    /// Evict waiting users that have waited at least `ttl`
    pub async fn evict_stale(&self, ttl: Duration) -> Vec<UserId> {
        self.evict_stale_at(ttl, Instant::now()).await
    }

    pub(crate) async fn evict_stale_at(&self, ttl: Duration, now: Instant) -> Vec<UserId> {
        let evicted = self.state.lock().await.waiting.drain_older_than(ttl, now);
        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "Evicted stale waiting users");
        }
        evicted
    }

    pub async fn is_waiting(&self, user_id: UserId) -> bool {
        self.state.lock().await.waiting.contains(user_id)
    }

    pub async fn partner_of(&self, user_id: UserId) -> Option<UserId> {
        self.state.lock().await.sessions.partner_of(user_id)
    }

    /// Waiting users in insertion order
    pub async fn waiting_users(&self) -> Vec<UserId> {
        self.state.lock().await.waiting.user_ids().collect()
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Verify the pool/table invariants against the current state
    pub async fn check_invariants(&self) -> Result<(), String> {
        self.state.lock().await.check_invariants()
    }
}
