//! Per-role bookkeeping tables.
//!
//! A node can simultaneously play more than one role for different services
//! (seeder for one, introduction point for another, downloader for a third),
//! so the engine keeps one table group per role rather than a single map
//! keyed by role. [Invariant] a `CircuitId` is live in at most one of
//! `ServiceTables::my_intro_points`, `DownloaderTables::my_download_points`,
//! `RelayTables::intro_point_for` values, `RelayTables::rendezvous_point_for`
//! values — a circuit never plays two roles at once.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::time::Instant;

use ochra_crypto::x25519::X25519StaticSecret;

use crate::lookup::LookupId;
use crate::session::SessionKeys;
use crate::{CircuitId, Cookie, ServiceCallback};

/// Tables owned by a node acting as a seeder (publishing its own service).
/// Also doubles as the downloader-side registration table for services this
/// node is *fetching*: `hops`/`callbacks` are populated by whichever of
/// `register_service`/`do_dht_lookup` runs first for a given `LookupId`, a
/// node can play both roles for different services at once.
#[derive(Default)]
pub struct ServiceTables {
    /// Hop count chosen per registered (or downloaded) service.
    pub hops: HashMap<LookupId, u8>,
    /// Long-lived per-service X25519 keypair, used as the `service_pubkey`
    /// input to `dh_verify_and_respond`. Only present on the seeder side.
    pub service_keys: HashMap<LookupId, X25519StaticSecret>,
    /// Circuits this node has established as introduction points for its own
    /// services, each tagged with every `LookupId` it was built for (a
    /// circuit is normally built for one service, but the map supports more
    /// than one in case of future fan-in).
    pub my_intro_points: HashMap<CircuitId, Vec<LookupId>>,
    /// Introduction-point circuits per service, with the time each was
    /// established — used to decide whether enough introduction points are
    /// already up before building more.
    pub infohash_ip_circuits: HashMap<LookupId, Vec<(CircuitId, Instant)>>,
    /// Callback invoked once a data path opens for this service, whichever
    /// side registered it.
    pub callbacks: HashMap<LookupId, ServiceCallback>,
    /// Peers this node has observed serving or downloading a service, handed
    /// back out as `key-response` PEX entries. Populated from `create-e2e`'s
    /// `node_pub` field, the first point in the exchange a peer's real
    /// public key becomes known.
    known_peers: HashMap<LookupId, HashSet<(SocketAddr, [u8; 32])>>,
}

impl ServiceTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly generated service, returning its `LookupId`.
    pub fn register(&mut self, lookup_id: LookupId, hops: u8, service_key: X25519StaticSecret) {
        self.hops.insert(lookup_id, hops);
        self.service_keys.insert(lookup_id, service_key);
    }

    /// Whether `lookup_id` has been registered locally (invariant 4:
    /// `service_keys[s]` exists iff `s` has been registered).
    pub fn is_registered(&self, lookup_id: &LookupId) -> bool {
        self.service_keys.contains_key(lookup_id)
    }

    /// Record that `cid` came up as an introduction-point circuit for
    /// `lookup_id`.
    pub fn record_intro_circuit(&mut self, cid: CircuitId, lookup_id: LookupId) {
        self.my_intro_points.entry(cid).or_default().push(lookup_id);
        self.infohash_ip_circuits
            .entry(lookup_id)
            .or_default()
            .push((cid, Instant::now()));
    }

    /// Scrub every entry referencing `cid`. Called from circuit teardown.
    pub fn drop_circuit(&mut self, cid: CircuitId) {
        self.my_intro_points.remove(&cid);
        for circuits in self.infohash_ip_circuits.values_mut() {
            circuits.retain(|(c, _)| *c != cid);
        }
    }

    /// Register (or replace) the callback fired once a data path opens for
    /// `lookup_id`.
    pub fn register_callback(&mut self, lookup_id: LookupId, cb: ServiceCallback) {
        self.callbacks.insert(lookup_id, cb);
    }

    /// Record `peer` as known to be involved with `lookup_id`, capped at
    /// `cap` distinct entries.
    pub fn record_pex_peer(&mut self, lookup_id: LookupId, peer: SocketAddr, pub_key: [u8; 32], cap: usize) {
        let set = self.known_peers.entry(lookup_id).or_default();
        if set.len() < cap {
            set.insert((peer, pub_key));
        }
    }

    pub fn pex_for(&self, lookup_id: &LookupId) -> impl Iterator<Item = &(SocketAddr, [u8; 32])> {
        self.known_peers.get(lookup_id).into_iter().flatten()
    }
}

/// Tables owned by a node acting as an introduction or rendezvous point for
/// someone else's service.
#[derive(Default)]
pub struct RelayTables {
    /// The circuit toward the seeder, for each service this node relays
    /// introductions for.
    pub intro_point_for: HashMap<LookupId, CircuitId>,
    /// The first-leg circuit awaiting a `link-e2e`, keyed by rendezvous
    /// cookie.
    pub rendezvous_point_for: HashMap<Cookie, CircuitId>,
}

impl RelayTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drop_circuit(&mut self, cid: CircuitId) {
        self.intro_point_for.retain(|_, c| *c != cid);
        self.rendezvous_point_for.retain(|_, c| *c != cid);
    }
}

/// Tables owned by a node acting as a downloader.
pub struct DownloaderTables {
    /// Spliced data circuits this node opened, with the service, hop count,
    /// and seeder socket address they serve.
    pub my_download_points: HashMap<CircuitId, (LookupId, u8, SocketAddr)>,
    /// Rendezvous circuits in progress or completed, per service.
    pub infohash_rp_circuits: HashMap<LookupId, Vec<CircuitId>>,
    /// Peer-exchange cache: addresses and public keys gossiped for a
    /// service, capped at `pex_cap` entries.
    infohash_pex: HashMap<LookupId, HashSet<(SocketAddr, [u8; 32])>>,
    /// Last time a DHT lookup was issued for a service, to rate-limit
    /// rediscovery.
    pub last_dht_lookup: HashMap<LookupId, Instant>,
    /// Session-key quad for each spliced download circuit, attached once
    /// `create_link_e2e` hands the circuit off to the data plane.
    session_keys_by_circuit: HashMap<CircuitId, SessionKeys>,
    pex_cap: usize,
}

impl DownloaderTables {
    pub fn new(pex_cap: usize) -> Self {
        Self {
            my_download_points: HashMap::new(),
            infohash_rp_circuits: HashMap::new(),
            infohash_pex: HashMap::new(),
            last_dht_lookup: HashMap::new(),
            session_keys_by_circuit: HashMap::new(),
            pex_cap,
        }
    }

    /// Add PEX entries for `lookup_id`, enforcing the per-service cap.
    /// Entries beyond the cap are dropped, oldest-insertion-order is not
    /// tracked (a `HashSet` has no order), so once at the cap, further
    /// inserts of genuinely new entries are simply refused until the set is
    /// pruned elsewhere (services this small are not expected to need
    /// eviction policy beyond the cap itself).
    pub fn add_pex(&mut self, lookup_id: LookupId, entries: impl IntoIterator<Item = (SocketAddr, [u8; 32])>) {
        let set = self.infohash_pex.entry(lookup_id).or_default();
        for entry in entries {
            if set.len() >= self.pex_cap {
                break;
            }
            set.insert(entry);
        }
    }

    pub fn pex_for(&self, lookup_id: &LookupId) -> impl Iterator<Item = &(SocketAddr, [u8; 32])> {
        self.infohash_pex.get(lookup_id).into_iter().flatten()
    }

    /// Whether `peer` already has an RP circuit tracked for this service —
    /// the guard that prevents redundant Phase D initiation for a peer
    /// already in progress or connected.
    pub fn has_rp_circuit_for_peer(&self, lookup_id: &LookupId, peer: SocketAddr) -> bool {
        self.my_download_points
            .values()
            .any(|(lid, _, addr)| lid == lookup_id && *addr == peer)
    }

    pub fn record_download_point(
        &mut self,
        cid: CircuitId,
        lookup_id: LookupId,
        hops: u8,
        seeder_addr: SocketAddr,
    ) {
        self.my_download_points.insert(cid, (lookup_id, hops, seeder_addr));
    }

    pub fn record_rp_circuit(&mut self, lookup_id: LookupId, cid: CircuitId) {
        self.infohash_rp_circuits.entry(lookup_id).or_default().push(cid);
    }

    /// Attach a session-key quad to a spliced download circuit.
    pub fn attach_session_keys(&mut self, cid: CircuitId, keys: SessionKeys) {
        self.session_keys_by_circuit.insert(cid, keys);
    }

    pub fn session_keys_for(&self, cid: CircuitId) -> Option<&SessionKeys> {
        self.session_keys_by_circuit.get(&cid)
    }

    pub fn drop_circuit(&mut self, cid: CircuitId) {
        self.my_download_points.remove(&cid);
        for circuits in self.infohash_rp_circuits.values_mut() {
            circuits.retain(|c| *c != cid);
        }
        self.session_keys_by_circuit.remove(&cid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_service_tables_register_sets_invariant_4() {
        let mut tables = ServiceTables::new();
        let lookup_id = [1u8; 20];
        assert!(!tables.is_registered(&lookup_id));

        tables.register(lookup_id, 1, X25519StaticSecret::random());
        assert!(tables.is_registered(&lookup_id));
    }

    #[test]
    fn test_service_tables_drop_circuit_scrubs_intro_points() {
        let mut tables = ServiceTables::new();
        let lookup_id = [2u8; 20];
        tables.record_intro_circuit(7, lookup_id);
        assert!(tables.my_intro_points.contains_key(&7));

        tables.drop_circuit(7);
        assert!(!tables.my_intro_points.contains_key(&7));
        assert!(tables.infohash_ip_circuits[&lookup_id].is_empty());
    }

    #[test]
    fn test_pex_cap_enforced() {
        let mut tables = DownloaderTables::new(3);
        let lookup_id = [3u8; 20];
        let entries: Vec<_> = (0..10).map(|i| (addr(9000 + i), [i as u8; 32])).collect();

        tables.add_pex(lookup_id, entries);
        assert_eq!(tables.pex_for(&lookup_id).count(), 3);
    }

    #[test]
    fn test_has_rp_circuit_for_peer() {
        let mut tables = DownloaderTables::new(50);
        let lookup_id = [4u8; 20];
        let peer = addr(8080);

        assert!(!tables.has_rp_circuit_for_peer(&lookup_id, peer));
        tables.record_download_point(11, lookup_id, 2, peer);
        assert!(tables.has_rp_circuit_for_peer(&lookup_id, peer));
    }

    #[test]
    fn test_downloader_drop_circuit_scrubs_both_maps() {
        let mut tables = DownloaderTables::new(50);
        let lookup_id = [5u8; 20];
        tables.record_download_point(1, lookup_id, 2, addr(1234));
        tables.record_rp_circuit(lookup_id, 1);

        tables.drop_circuit(1);
        assert!(!tables.my_download_points.contains_key(&1));
        assert!(tables.infohash_rp_circuits[&lookup_id].is_empty());
    }

    #[test]
    fn test_relay_tables_drop_circuit() {
        let mut tables = RelayTables::new();
        let lookup_id = [6u8; 20];
        let cookie = [0u8; 20];
        tables.intro_point_for.insert(lookup_id, 9);
        tables.rendezvous_point_for.insert(cookie, 9);

        tables.drop_circuit(9);
        assert!(tables.intro_point_for.is_empty());
        assert!(tables.rendezvous_point_for.is_empty());
    }
}
