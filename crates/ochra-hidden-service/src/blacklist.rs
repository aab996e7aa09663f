//! The DHT rediscovery blacklist: once a downloader has contacted a peer
//! discovered via DHT lookup, that `(service, peer)` pair is excluded from
//! rediscovery for 60 seconds so repeated lookups do not immediately
//! re-trigger a `create_key_request` against a peer already being handled.
//!
//! Cleanup is lazy: entries are pruned on [`DhtBlacklist::prune`], called
//! once per `on_dht_response`, rather than by a background timer.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::lookup::LookupId;
use crate::DHT_BLACKLIST_SECS;

#[derive(Default)]
pub struct DhtBlacklist {
    live: HashSet<(LookupId, SocketAddr)>,
    expirations: BinaryHeap<Reverse<(Instant, LookupId, SocketAddr)>>,
}

impl DhtBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blacklist `(lookup_id, peer)` for [`DHT_BLACKLIST_SECS`] from now.
    pub fn insert(&mut self, lookup_id: LookupId, peer: SocketAddr) {
        let deadline = Instant::now() + Duration::from_secs(DHT_BLACKLIST_SECS);
        self.live.insert((lookup_id, peer));
        self.expirations.push(Reverse((deadline, lookup_id, peer)));
    }

    /// Whether `(lookup_id, peer)` is currently blacklisted. Does not prune;
    /// call [`Self::prune`] first if an up-to-date answer matters.
    pub fn is_blacklisted(&self, lookup_id: &LookupId, peer: SocketAddr) -> bool {
        self.live.contains(&(*lookup_id, peer))
    }

    /// Remove every entry whose deadline has passed.
    pub fn prune(&mut self) {
        let now = Instant::now();
        while let Some(Reverse((deadline, lookup_id, peer))) = self.expirations.peek().copied() {
            if deadline > now {
                break;
            }
            self.expirations.pop();
            // A later `insert` of the same pair pushes a fresh heap entry
            // without removing the stale one, so only drop `live` if this
            // popped deadline is still the most recent one on record.
            if self
                .expirations
                .iter()
                .all(|Reverse((_, l, p))| *l != lookup_id || *p != peer)
            {
                self.live.remove(&(lookup_id, peer));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_insert_then_blacklisted() {
        let mut bl = DhtBlacklist::new();
        let lookup_id = [1u8; 20];
        let peer = addr(9000);

        assert!(!bl.is_blacklisted(&lookup_id, peer));
        bl.insert(lookup_id, peer);
        assert!(bl.is_blacklisted(&lookup_id, peer));
    }

    #[test]
    fn test_prune_removes_expired() {
        let mut bl = DhtBlacklist::new();
        let lookup_id = [2u8; 20];
        let peer = addr(9001);

        bl.expirations.push(Reverse((Instant::now() - Duration::from_secs(1), lookup_id, peer)));
        bl.live.insert((lookup_id, peer));

        bl.prune();
        assert!(!bl.is_blacklisted(&lookup_id, peer));
        assert!(bl.is_empty());
    }

    #[test]
    fn test_prune_keeps_live_entries() {
        let mut bl = DhtBlacklist::new();
        let lookup_id = [3u8; 20];
        let peer = addr(9002);

        bl.insert(lookup_id, peer);
        bl.prune();
        assert!(bl.is_blacklisted(&lookup_id, peer));
    }

    #[test]
    fn test_reinsert_survives_stale_pop() {
        let mut bl = DhtBlacklist::new();
        let lookup_id = [4u8; 20];
        let peer = addr(9003);

        // Simulate a stale heap entry left behind by an earlier insert.
        bl.expirations.push(Reverse((Instant::now() - Duration::from_secs(5), lookup_id, peer)));
        bl.insert(lookup_id, peer);

        bl.prune();
        assert!(bl.is_blacklisted(&lookup_id, peer), "fresh insert must survive pruning the stale entry");
    }
}
