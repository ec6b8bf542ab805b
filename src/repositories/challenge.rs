use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::NaiveDateTime;

use crate::models::{account::Account, challenge::Challenge};

/// In-memory challenge table keyed by nonce, so an account can hold several live
/// challenges and issuing one never disturbs another.
#[derive(Clone, Debug)]
pub struct ChallengeDao {
    store: Arc<Mutex<HashMap<String, Challenge>>>,
    capacity: usize,
}

impl ChallengeDao {
    pub fn new(capacity: usize) -> Self {
        ChallengeDao {
            store: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    fn store(&self) -> MutexGuard<'_, HashMap<String, Challenge>> {
        // the map holds no cross-entry invariants, a poisoned lock is still usable
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores `challenge` unless the table is full of live entries. Expired entries are
    /// dropped first when the table is at capacity.
    pub fn add_challenge(&self, challenge: Challenge, now: NaiveDateTime) -> Option<Challenge> {
        let mut store = self.store();
        if store.len() >= self.capacity {
            store.retain(|_, c| !c.is_expired(now));
            if store.len() >= self.capacity {
                return None;
            }
        }
        store.insert(challenge.nonce.clone(), challenge.clone());
        Some(challenge)
    }

    /// Removes and returns the challenge for `nonce` only if it was issued to `address`,
    /// carries exactly `message` and has not expired. Anything else leaves it in place.
    pub fn take_matching(
        &self,
        nonce: &str,
        address: &Account,
        message: &str,
        now: NaiveDateTime,
    ) -> Option<Challenge> {
        let mut store = self.store();
        let matches = store.get(nonce).map_or(false, |c| {
            c.address == *address && c.message == message && !c.is_expired(now)
        });
        if matches {
            store.remove(nonce)
        } else {
            None
        }
    }

    pub fn purge_expired(&self, now: NaiveDateTime) -> usize {
        let mut store = self.store();
        let before = store.len();
        store.retain(|_, challenge| !challenge.is_expired(now));
        before - store.len()
    }

    pub fn len(&self) -> usize {
        self.store().len()
    }
}
