use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{timeout, Instant};

/// How long a computed decision stays valid. Grant or relationship
/// changes inside this window are not reflected until expiry.
pub const DECISION_TTL: Duration = Duration::from_secs(300);

/// How long a caller waits on a concurrent in-flight computation
/// before degrading to an independent one.
pub const FLIGHT_WAIT: Duration = Duration::from_secs(5);

/// Process-wide cache of boolean authorization decisions, keyed by
/// session + permission + object id. Entries are evicted lazily on
/// lookup; there is no invalidation path tied to data mutation.
///
/// Concurrent misses for the same key are collapsed: the first caller
/// computes, the rest wait on a watch channel with a bounded timeout
/// and otherwise recompute independently. Overwrites are idempotent
/// since the decision is deterministic within the TTL window.
pub struct DecisionCache {
    ttl: Duration,
    max_wait: Duration,
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    flight_seq: AtomicU64,
}

enum Slot {
    Ready { value: bool, expires_at: Instant },
    Pending { flight: u64, rx: watch::Receiver<Option<bool>> },
}

/// Outcome of a cache lookup.
pub enum Lookup {
    Hit(bool),
    /// No usable entry; the caller owns the computation and must hand
    /// the result back via [`DecisionCache::complete`].
    Miss(Flight),
}

/// A claim on computing one cache key. Completing it publishes the
/// value to waiters; dropping it without completing releases the slot
/// so the next caller can take over.
pub struct Flight {
    key: String,
    id: u64,
    publisher: Option<watch::Sender<Option<bool>>>,
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    completed: bool,
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new(DECISION_TTL, FLIGHT_WAIT)
    }
}

impl DecisionCache {
    pub fn new(ttl: Duration, max_wait: Duration) -> Self {
        Self {
            ttl,
            max_wait,
            slots: Arc::new(Mutex::new(HashMap::new())),
            flight_seq: AtomicU64::new(1),
        }
    }

    pub async fn lookup(&self, key: &str) -> Lookup {
        enum Next {
            Hit(bool),
            Wait(watch::Receiver<Option<bool>>),
            Fly(Flight),
        }

        let next = {
            let mut slots = self.slots.lock().expect("decision cache lock poisoned");
            match slots.get(key) {
                Some(Slot::Ready { value, expires_at }) if Instant::now() < *expires_at => {
                    Next::Hit(*value)
                }
                Some(Slot::Pending { rx, .. }) => Next::Wait(rx.clone()),
                // Absent or expired: claim the slot.
                _ => {
                    let id = self.flight_seq.fetch_add(1, Ordering::Relaxed);
                    let (tx, rx) = watch::channel(None);
                    slots.insert(key.to_string(), Slot::Pending { flight: id, rx });
                    Next::Fly(self.new_flight(key, id, Some(tx)))
                }
            }
        };

        match next {
            Next::Hit(value) => Lookup::Hit(value),
            Next::Fly(flight) => Lookup::Miss(flight),
            Next::Wait(mut rx) => {
                match timeout(self.max_wait, rx.wait_for(|v| v.is_some())).await {
                    Ok(Ok(value)) => match *value {
                        Some(value) => Lookup::Hit(value),
                        None => Lookup::Miss(self.new_flight(key, 0, None)),
                    },
                    // Timed out, or the computing flight was dropped:
                    // compute independently rather than blocking on.
                    _ => Lookup::Miss(self.new_flight(key, 0, None)),
                }
            }
        }
    }

    /// Store the computed value under the flight's key and wake any
    /// waiters. Always overwrites (last writer wins).
    pub fn complete(&self, mut flight: Flight, value: bool) {
        let expires_at = Instant::now() + self.ttl;
        {
            let mut slots = self.slots.lock().expect("decision cache lock poisoned");
            slots.insert(flight.key.clone(), Slot::Ready { value, expires_at });
        }
        if let Some(tx) = flight.publisher.take() {
            let _ = tx.send(Some(value));
        }
        flight.completed = true;
    }

    fn new_flight(&self, key: &str, id: u64, publisher: Option<watch::Sender<Option<bool>>>) -> Flight {
        Flight {
            key: key.to_string(),
            id,
            publisher,
            slots: Arc::clone(&self.slots),
            completed: false,
        }
    }
}

impl Drop for Flight {
    fn drop(&mut self) {
        if self.completed || self.publisher.is_none() {
            return;
        }
        // Abandoned without a result: free the slot. Waiters notice
        // the closed channel and recompute on their own.
        let mut slots = self.slots.lock().expect("decision cache lock poisoned");
        if matches!(slots.get(&self.key), Some(Slot::Pending { flight, .. }) if *flight == self.id)
        {
            slots.remove(&self.key);
        }
    }
}

/// Cache key for one (session, permission, object) decision.
pub fn decision_key(session_uid: &str, permission: &str, object_id: Option<i64>) -> String {
    match object_id {
        Some(id) => format!("authz.{session_uid}.{permission}.{id}"),
        None => format!("authz.{session_uid}.{permission}.-"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;

    #[tokio::test]
    async fn miss_then_hit_after_complete() {
        let cache = DecisionCache::default();

        let flight = match cache.lookup("k").await {
            Lookup::Miss(flight) => flight,
            Lookup::Hit(_) => panic!("expected miss on empty cache"),
        };
        cache.complete(flight, true);

        match cache.lookup("k").await {
            Lookup::Hit(value) => assert!(value),
            Lookup::Miss(_) => panic!("expected hit after complete"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = DecisionCache::default();

        match cache.lookup("k").await {
            Lookup::Miss(flight) => cache.complete(flight, false),
            Lookup::Hit(_) => panic!("expected miss"),
        }

        tokio::time::advance(DECISION_TTL + Duration::from_secs(1)).await;

        assert!(matches!(cache.lookup("k").await, Lookup::Miss(_)));
    }

    #[tokio::test]
    async fn waiter_receives_published_value() {
        let cache = StdArc::new(DecisionCache::default());

        let flight = match cache.lookup("k").await {
            Lookup::Miss(flight) => flight,
            Lookup::Hit(_) => panic!("expected miss"),
        };

        let waiter = {
            let cache = StdArc::clone(&cache);
            tokio::spawn(async move {
                match cache.lookup("k").await {
                    Lookup::Hit(value) => value,
                    Lookup::Miss(_) => panic!("waiter should observe the published value"),
                }
            })
        };

        // Give the waiter time to park on the channel.
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.complete(flight, true);

        assert!(waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn waiter_degrades_to_independent_flight_on_timeout() {
        let cache = StdArc::new(DecisionCache::default());

        // Claim the key and never complete it.
        let stuck = match cache.lookup("k").await {
            Lookup::Miss(flight) => flight,
            Lookup::Hit(_) => panic!("expected miss"),
        };

        let waiter = {
            let cache = StdArc::clone(&cache);
            tokio::spawn(async move { cache.lookup("k").await })
        };

        // Paused time fast-forwards through the 5s wait.
        match waiter.await.unwrap() {
            Lookup::Miss(flight) => cache.complete(flight, true),
            Lookup::Hit(_) => panic!("expected timeout to degrade to a miss"),
        }

        match cache.lookup("k").await {
            Lookup::Hit(value) => assert!(value),
            Lookup::Miss(_) => panic!("independent completion should be cached"),
        }

        drop(stuck);
    }

    #[tokio::test]
    async fn dropped_flight_releases_the_slot() {
        let cache = DecisionCache::default();

        match cache.lookup("k").await {
            Lookup::Miss(flight) => drop(flight),
            Lookup::Hit(_) => panic!("expected miss"),
        }

        // The next caller claims a fresh flight instead of waiting on
        // the abandoned one.
        assert!(matches!(cache.lookup("k").await, Lookup::Miss(_)));
    }

    #[test]
    fn decision_keys_include_session_permission_and_id() {
        assert_eq!(decision_key("u1", "portfolio.view", Some(7)), "authz.u1.portfolio.view.7");
        assert_eq!(decision_key("u1", "portfolio.view", None), "authz.u1.portfolio.view.-");
    }
}
