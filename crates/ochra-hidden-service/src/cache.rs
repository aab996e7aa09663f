//! Request/response correlation cache.
//!
//! Every step of the protocol that expects a reply allocates a cache entry
//! under a random 32-bit id; the matching response is found by `(kind, id)`
//! and popped exactly once (invariant: at most one `pop` succeeds per entry).
//! Entries expire after a per-kind timeout; expiry is logged but never
//! surfaced to the caller, mirroring `ochra_dht::bep44::RecordStore`'s lazy
//! expiry more closely than a dedicated ticker task — there is no background
//! task here, just an opportunistic sweep on every `add`/`pop`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use rand::RngCore;

use crate::lookup::LookupId;
use crate::{CircuitId, Cookie, DEFAULT_CACHE_TIMEOUT_SECS, IP_RP_TIMEOUT_SECS};

/// Discriminant for a pending request cache entry. Kept separate from
/// [`PendingRequest`] so `(kind, id)` can be used as a lookup key without
/// pattern-matching the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKind {
    DhtRequest,
    KeyRequest,
    KeyRelay,
    CreateE2ERelay,
    E2ERequest,
    LinkRequest,
    IpRequest,
    RpRequest,
}

impl CacheKind {
    /// Per-kind cache timeout, per §4.1's recommendation: IP/RP establish
    /// 20s, everything else (key/e2e/link/DHT) 60s.
    fn timeout(self) -> Duration {
        match self {
            CacheKind::IpRequest | CacheKind::RpRequest => {
                Duration::from_secs(IP_RP_TIMEOUT_SECS)
            }
            _ => Duration::from_secs(DEFAULT_CACHE_TIMEOUT_SECS),
        }
    }
}

/// A rendezvous-point continuation: the information a seeder needs, once its
/// RP circuit comes up, to resume the Phase D `created-e2e` reply it owes the
/// downloader. This replaces the `finished_callback` closure from the
/// original design with an explicit cache entry, per the "callbacks as cache
/// continuations" design note.
#[derive(Clone, Debug)]
pub struct PendingCreateE2e {
    pub e2e_id: u32,
    pub e2e_circuit: CircuitId,
    pub info_hash: LookupId,
    pub peer_pub: [u8; 32],
    pub first_part: [u8; 32],
    pub cookie: Cookie,
}

/// A pending request cache entry. Each variant carries exactly the state
/// needed to resume the step it is suspended on.
///
/// No `Debug` derive: `E2ERequest` holds an `X25519StaticSecret`, which
/// deliberately does not implement `Debug` so a stray `{:?}` log line can
/// never print key material.
#[derive(Clone)]
pub enum PendingRequest {
    /// Outbound `dht-request` awaiting a `dht-response` from the exit node.
    DhtRequest { circuit: CircuitId, lookup_id: LookupId },

    /// Outbound `key-request` awaiting `key-response`.
    KeyRequest {
        circuit: CircuitId,
        sock_addr: SocketAddr,
        info_hash: LookupId,
    },

    /// Bridges the downloader-facing and seeder-facing legs of a `key-request`
    /// at the introduction point.
    KeyRelay {
        relay_circuit: CircuitId,
        original_id: u32,
        return_sock_addr: SocketAddr,
        info_hash: LookupId,
    },

    /// Bridges the two legs of a `create-e2e`/`created-e2e` exchange at the
    /// introduction point, mirroring `KeyRelay` for symmetry (see DESIGN.md:
    /// Open Question 1).
    CreateE2ERelay {
        relay_circuit: CircuitId,
        original_id: u32,
        return_sock_addr: SocketAddr,
        info_hash: LookupId,
    },

    /// Outbound `create-e2e` awaiting `created-e2e`. Holds the downloader's
    /// local ephemeral DH material so the reply's AUTH tag and session keys
    /// can be verified and derived once `dh_Y`/`AUTH` arrive.
    E2ERequest {
        info_hash: LookupId,
        circuit: CircuitId,
        local_secret: ochra_crypto::x25519::X25519StaticSecret,
        first_part: [u8; 32],
        peer_pub: [u8; 32],
        sock_addr: SocketAddr,
    },

    /// Outbound `link-e2e` awaiting `linked-e2e`.
    LinkRequest { circuit: CircuitId, info_hash: LookupId },

    /// Outbound `establish-intro` awaiting `intro-established`.
    IpRequest { circuit: CircuitId },

    /// Outbound `establish-rendezvous` awaiting `rendezvous-established`;
    /// carries the suspended `created-e2e` reply to resume on completion.
    RpRequest { pending: PendingCreateE2e },
}

impl PendingRequest {
    fn kind(&self) -> CacheKind {
        match self {
            PendingRequest::DhtRequest { .. } => CacheKind::DhtRequest,
            PendingRequest::KeyRequest { .. } => CacheKind::KeyRequest,
            PendingRequest::KeyRelay { .. } => CacheKind::KeyRelay,
            PendingRequest::CreateE2ERelay { .. } => CacheKind::CreateE2ERelay,
            PendingRequest::E2ERequest { .. } => CacheKind::E2ERequest,
            PendingRequest::LinkRequest { .. } => CacheKind::LinkRequest,
            PendingRequest::IpRequest { .. } => CacheKind::IpRequest,
            PendingRequest::RpRequest { .. } => CacheKind::RpRequest,
        }
    }
}

struct CacheEntry {
    request: PendingRequest,
    deadline: Instant,
}

/// The request/response correlation cache.
#[derive(Default)]
pub struct RequestCache {
    entries: HashMap<(CacheKind, u32), CacheEntry>,
}

impl RequestCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending request under a fresh random id, returning the
    /// id to embed in the outbound message.
    pub fn add(&mut self, request: PendingRequest) -> u32 {
        self.sweep_expired();

        let kind = request.kind();
        let mut id = rand::rngs::OsRng.next_u32();
        while self.entries.contains_key(&(kind, id)) {
            id = rand::rngs::OsRng.next_u32();
        }

        let deadline = Instant::now() + kind.timeout();
        self.entries.insert((kind, id), CacheEntry { request, deadline });
        id
    }

    /// Look up a pending request without removing it. Returns `None` if
    /// absent or expired.
    pub fn get(&self, kind: CacheKind, id: u32) -> Option<&PendingRequest> {
        self.entries.get(&(kind, id)).and_then(|entry| {
            if entry.deadline <= Instant::now() {
                None
            } else {
                Some(&entry.request)
            }
        })
    }

    /// Remove and return a pending request. Returns `None` if absent or
    /// expired (an expired entry is also removed here, not just skipped).
    pub fn pop(&mut self, kind: CacheKind, id: u32) -> Option<PendingRequest> {
        self.sweep_expired();
        self.entries.remove(&(kind, id)).map(|entry| entry.request)
    }

    /// Remove every cache entry referencing the given circuit, regardless of
    /// kind. Called from `remove_circuit` teardown so pending requests whose
    /// circuit disappeared do not linger until their timeout.
    pub fn drop_circuit(&mut self, circuit: CircuitId) {
        self.entries.retain(|_, entry| !request_references_circuit(&entry.request, circuit));
    }

    /// Remove all expired entries, logging how many were dropped.
    pub fn sweep_expired(&mut self) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.deadline > now);
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(removed, "expired hidden-service cache entries");
        }
    }

    /// Number of live (non-expired) entries. Exposed for tests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn request_references_circuit(request: &PendingRequest, circuit: CircuitId) -> bool {
    match request {
        PendingRequest::DhtRequest { circuit: c, .. } => *c == circuit,
        PendingRequest::KeyRequest { circuit: c, .. } => *c == circuit,
        PendingRequest::KeyRelay { relay_circuit, .. } => *relay_circuit == circuit,
        PendingRequest::CreateE2ERelay { relay_circuit, .. } => *relay_circuit == circuit,
        PendingRequest::E2ERequest { circuit: c, .. } => *c == circuit,
        PendingRequest::LinkRequest { circuit: c, .. } => *c == circuit,
        PendingRequest::IpRequest { circuit: c } => *c == circuit,
        PendingRequest::RpRequest { pending } => pending.e2e_circuit == circuit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:9000".parse().unwrap()
    }

    #[test]
    fn test_add_then_pop_succeeds_once() {
        let mut cache = RequestCache::new();
        let id = cache.add(PendingRequest::IpRequest { circuit: 1 });

        assert!(cache.pop(CacheKind::IpRequest, id).is_some());
        assert!(cache.pop(CacheKind::IpRequest, id).is_none(), "second pop must fail");
    }

    #[test]
    fn test_wrong_kind_does_not_match() {
        let mut cache = RequestCache::new();
        let id = cache.add(PendingRequest::IpRequest { circuit: 1 });
        assert!(cache.get(CacheKind::RpRequest, id).is_none());
    }

    #[test]
    fn test_distinct_ids_for_concurrent_adds() {
        let mut cache = RequestCache::new();
        let mut ids = std::collections::HashSet::new();
        for _ in 0..200 {
            let id = cache.add(PendingRequest::IpRequest { circuit: 1 });
            assert!(ids.insert(id), "ids must be unique within a kind");
        }
    }

    #[test]
    fn test_expiry_drops_entry() {
        let mut cache = RequestCache::new();
        let kind = CacheKind::IpRequest;
        let id = cache.add(PendingRequest::IpRequest { circuit: 1 });

        // Force expiry directly instead of sleeping 20 real seconds.
        let key = (kind, id);
        cache.entries.get_mut(&key).unwrap().deadline = Instant::now() - Duration::from_secs(1);

        assert!(cache.get(kind, id).is_none());
        assert!(cache.pop(kind, id).is_none());
    }

    #[test]
    fn test_drop_circuit_removes_matching_entries() {
        let mut cache = RequestCache::new();
        let id1 = cache.add(PendingRequest::IpRequest { circuit: 7 });
        let id2 = cache.add(PendingRequest::KeyRequest {
            circuit: 7,
            sock_addr: addr(),
            info_hash: [0u8; 20],
        });
        let id3 = cache.add(PendingRequest::IpRequest { circuit: 8 });

        cache.drop_circuit(7);

        assert!(cache.get(CacheKind::IpRequest, id1).is_none());
        assert!(cache.get(CacheKind::KeyRequest, id2).is_none());
        assert!(cache.get(CacheKind::IpRequest, id3).is_some());
    }

    #[test]
    fn test_sweep_expired_reports_len() {
        let mut cache = RequestCache::new();
        let id = cache.add(PendingRequest::IpRequest { circuit: 1 });
        assert_eq!(cache.len(), 1);

        let key = (CacheKind::IpRequest, id);
        cache.entries.get_mut(&key).unwrap().deadline = Instant::now() - Duration::from_secs(1);
        cache.sweep_expired();
        assert!(cache.is_empty());
    }
}
