//! Shared engine state: profile store, waiting pool and session table.
//!
//! None of these types synchronise on their own. They are only ever touched
//! through [`EngineState`], which the engine keeps behind a single lock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::{EngineSnapshot, Profile, UserId};

/// A user seeking a partner
#[derive(Debug, Clone, Copy)]
pub struct WaitingEntry {
    pub user_id: UserId,
    pub since: Instant,
}

/// Insertion-ordered set of users seeking a partner
#[derive(Debug, Default)]
pub struct WaitingPool {
    entries: Vec<WaitingEntry>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.entries.iter().any(|e| e.user_id == user_id)
    }

    /// Append a user. Returns false if the user was already waiting.
    pub fn push(&mut self, user_id: UserId, now: Instant) -> bool {
        if self.contains(user_id) {
            return false;
        }
        self.entries.push(WaitingEntry { user_id, since: now });
        true
    }

    /// Remove a user. Returns false if the user was not waiting.
    pub fn remove(&mut self, user_id: UserId) -> bool {
        match self.entries.iter().position(|e| e.user_id == user_id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// First waiting user, in insertion order, that satisfies `pred`
    pub fn find_first<F>(&self, mut pred: F) -> Option<UserId>
    where
        F: FnMut(UserId) -> bool,
    {
        self.entries.iter().map(|e| e.user_id).find(|&id| pred(id))
    }

    /// Remove and return every entry that has waited at least `ttl`
    pub fn drain_older_than(&mut self, ttl: Duration, now: Instant) -> Vec<UserId> {
        let mut expired = Vec::new();
        self.entries.retain(|e| {
            let stale = now.saturating_duration_since(e.since) >= ttl;
            if stale {
                expired.push(e.user_id);
            }
            !stale
        });
        expired
    }

    pub fn user_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.entries.iter().map(|e| e.user_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Symmetric user -> partner map of active chats
#[derive(Debug, Default)]
pub struct SessionTable {
    partners: HashMap<UserId, UserId>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partner_of(&self, user_id: UserId) -> Option<UserId> {
        self.partners.get(&user_id).copied()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.partners.contains_key(&user_id)
    }

    /// Insert both directions of a pair. Neither user may already be paired.
    pub fn pair(&mut self, a: UserId, b: UserId) {
        debug_assert!(a != b, "self pairing");
        debug_assert!(!self.contains(a) && !self.contains(b), "already paired");
        self.partners.insert(a, b);
        self.partners.insert(b, a);
    }

    /// Remove both directions of the pair containing `user_id`
    pub fn unpair(&mut self, user_id: UserId) -> Option<UserId> {
        let partner = self.partners.remove(&user_id)?;
        self.partners.remove(&partner);
        Some(partner)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserId, UserId)> + '_ {
        self.partners.iter().map(|(&a, &b)| (a, b))
    }

    /// Number of paired users (twice the number of sessions)
    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }
}

/// Everything the pairing engine mutates, guarded as one unit
#[derive(Debug, Default)]
pub struct EngineState {
    pub profiles: HashMap<UserId, Profile>,
    pub waiting: WaitingPool,
    pub sessions: SessionTable,
}

impl EngineState {
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            profiles: self.profiles.len(),
            waiting: self.waiting.len(),
            paired_users: self.sessions.len(),
            sessions: self.sessions.len() / 2,
        }
    }

    /// Check the pool/table invariants. Used by tests.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (a, b) in self.sessions.iter() {
            if a == b {
                return Err(format!("user {} paired with itself", a));
            }
            if self.sessions.partner_of(b) != Some(a) {
                return Err(format!("asymmetric session {} -> {}", a, b));
            }
        }
        for id in self.waiting.user_ids() {
            if self.sessions.contains(id) {
                return Err(format!("user {} both waiting and paired", id));
            }
            if !self.profiles.contains_key(&id) {
                return Err(format!("user {} waiting without a profile", id));
            }
        }
        Ok(())
    }
}
