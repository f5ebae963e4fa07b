//! Per-user profiles, keyed by the client's token.
//!
//! Updates are explicit read-modify-write operations performed under the
//! store's lock, so concurrent skills never lose each other's changes.
//! Profiles live in memory only; once the store is full the least recently
//! used token is forgotten.

use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug)]
pub struct ProfileStore {
    profiles: Mutex<LruCache<String, UserProfile>>,
}

impl ProfileStore {
    /// Creates a store keeping at most `capacity` profiles.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            profiles: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the profile of `token`, or an empty one.
    pub fn get(&self, token: &str) -> UserProfile {
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set(&self, token: &str, profile: UserProfile) {
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(token.to_string(), profile);
    }

    /// Applies `update` to the profile of `token` while holding the lock and
    /// returns the updated profile.
    pub fn update<F>(&self, token: &str, update: F) -> UserProfile
    where
        F: FnOnce(&mut UserProfile),
    {
        let mut profiles = self.profiles.lock().unwrap_or_else(PoisonError::into_inner);
        let mut profile = profiles.pop(token).unwrap_or_default();
        update(&mut profile);
        profiles.put(token.to_string(), profile.clone());
        profile
    }

    pub fn len(&self) -> usize {
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_unknown_token_has_empty_profile() {
        let store = ProfileStore::new(16);
        assert_eq!(store.get("nobody"), UserProfile::default());
    }

    #[test]
    fn test_update_is_read_modify_write() {
        let store = Arc::new(ProfileStore::new(16));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.update("token", |p| p.name.push('a'));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.get("token").name.len(), 800);
    }

    #[test]
    fn test_least_recently_used_profile_is_forgotten() {
        let store = ProfileStore::new(2);
        store.update("ann", |p| p.name = "Ann".into());
        store.update("ben", |p| p.name = "Ben".into());
        assert_eq!(store.get("ann").name, "Ann");

        store.set("cal", UserProfile { name: "Cal".into() });
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("ben"), UserProfile::default());
        assert_eq!(store.get("ann").name, "Ann");
        assert_eq!(store.get("cal").name, "Cal");
    }
}
