use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use flagger_core::CommunityId;

#[derive(Debug, Default)]
/// Time of the last real moderator ping per community, in unix milliseconds.
///
/// Lives for the lifetime of the process; a restart forgets every ping.
pub struct LastPingLedger {
    pings: Mutex<HashMap<CommunityId, u64>>,
}

impl LastPingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CommunityId, u64>> {
        self.pings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `None` means the community was never pinged.
    pub fn last_ping(&self, community: &CommunityId) -> Option<u64> {
        self.lock().get(community).copied()
    }

    pub fn record(&self, community: &CommunityId, at_unix_ms: u64) {
        self.lock().insert(community.clone(), at_unix_ms);
    }

    pub fn reset(&self, community: &CommunityId) {
        self.lock().remove(community);
    }

    /// A community may be pinged once `min_between_ms` has passed since its
    /// last ping. Communities never pinged are always eligible.
    pub fn is_eligible(&self, community: &CommunityId, min_between_ms: u64, now_unix_ms: u64) -> bool {
        match self.last_ping(community) {
            Some(last) => last.saturating_add(min_between_ms) <= now_unix_ms,
            None => true,
        }
    }
}
