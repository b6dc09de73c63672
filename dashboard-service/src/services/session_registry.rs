//! Live token managers keyed by login session.
//!
//! Every request of one session must go through the same [`TokenManager`],
//! otherwise two requests could each spend the single-use refresh token.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::models::TokenPair;
use crate::services::identity::IdentityClient;
use crate::services::token_manager::TokenManager;

struct Entry {
    manager: Arc<TokenManager>,
    last_used: Instant,
}

pub struct SessionRegistry {
    identity: Arc<IdentityClient>,
    entries: DashMap<String, Entry>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(identity: Arc<IdentityClient>, idle_timeout: Duration) -> Self {
        Self {
            identity,
            entries: DashMap::new(),
            idle_timeout,
        }
    }

    /// Manager for `session_key`, seeded from `stored` the first time.
    ///
    /// An existing manager wins over the stored pair: it may hold a newer
    /// pair that has not been written back yet.
    pub fn manager(&self, session_key: &str, stored: TokenPair) -> Arc<TokenManager> {
        if let Some(mut entry) = self.entries.get_mut(session_key) {
            entry.last_used = Instant::now();
            return entry.manager.clone();
        }

        self.prune();

        self.entries
            .entry(session_key.to_string())
            .or_insert_with(|| {
                tracing::debug!("Creating token manager for session");
                Entry {
                    manager: Arc::new(TokenManager::new(self.identity.clone(), stored)),
                    last_used: Instant::now(),
                }
            })
            .manager
            .clone()
    }

    /// Forget a session's manager, returning it if it was live.
    pub fn remove(&self, session_key: &str) -> Option<Arc<TokenManager>> {
        self.entries
            .remove(session_key)
            .map(|(_, entry)| entry.manager)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop managers whose session has been idle past the session expiry.
    fn prune(&self) {
        let timeout = self.idle_timeout;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.last_used.elapsed() < timeout);
        let pruned = before.saturating_sub(self.entries.len());
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned idle token managers");
        }
    }
}
