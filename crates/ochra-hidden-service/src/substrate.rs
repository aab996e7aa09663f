//! The contracts this crate consumes rather than owns: an onion tunnel
//! substrate capable of opening/tearing down/splicing circuits, and a DHT
//! provider capable of looking up and announcing `LookupId`-keyed peer sets.
//!
//! Neither trait is implemented against `ochra_onion`/`ochra_dht` concrete
//! circuit types directly: `ochra_onion::circuit::Circuit` fixes
//! `CIRCUIT_HOPS = 3`, while this protocol needs circuits of varying hop
//! counts depending on role (an introduction-point circuit is one hop
//! shorter than a rendezvous circuit, per the original design). The daemon
//! wires a concrete `CircuitSubstrate` over its onion-tunnel manager; this
//! crate only ever sees the trait.

use std::net::SocketAddr;

use ochra_dht::kademlia::NodeId;

use crate::lookup::LookupId;
use crate::{CircuitId, Result};

/// The role a circuit plays, passed to [`CircuitSubstrate::create_circuit`]
/// so the substrate can size and route it appropriately (an introduction or
/// rendezvous circuit has different hop-count and exit-policy requirements
/// than a plain data circuit).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitRole {
    /// A general-purpose data circuit with no hidden-service role.
    Data,
    /// A circuit ending at an introduction point.
    Ip,
    /// A circuit ending at a rendezvous point, from the side that will
    /// request it to be established.
    Rp,
    /// A circuit ending at the same rendezvous point, from the side that
    /// will later be spliced onto it.
    Rendezvous,
}

/// The onion tunnel substrate this crate drives.
///
/// All methods are synchronous from the engine's point of view: circuit
/// creation is expected to be instantaneous bookkeeping (the substrate
/// queues the actual extend cells), and the engine finds out whether the
/// circuit came up through the corresponding `on_*_established` protocol
/// message, not through a blocking call here.
pub trait CircuitSubstrate {
    /// Request a new circuit of the given hop count and role. `required_exit`
    /// pins the final hop to a specific node (used when extending to a known
    /// introduction or rendezvous point); `info_hash` is advisory context the
    /// substrate may use for circuit selection/accounting.
    fn create_circuit(
        &mut self,
        hops: u8,
        role: CircuitRole,
        required_exit: Option<NodeId>,
        info_hash: Option<LookupId>,
    ) -> Result<CircuitId>;

    /// Tear down a circuit and release any substrate-side resources
    /// associated with it.
    fn remove_circuit(&mut self, cid: CircuitId);

    /// Send a hidden-service protocol cell down an existing circuit.
    fn send_cell(&mut self, cid: CircuitId, opcode: u8, payload: Vec<u8>) -> Result<()>;

    /// Send a cell through a circuit's exit hop onward to `dest`, used when
    /// relaying a message to a peer that is not itself an onion-routing
    /// participant on this circuit (e.g. a rendezvous relay forwarding to the
    /// other spliced leg's socket).
    fn tunnel_data(
        &mut self,
        cid: CircuitId,
        dest: SocketAddr,
        opcode: u8,
        payload: Vec<u8>,
    ) -> Result<()>;

    /// Whether this circuit's exit hop currently has a data-plane socket
    /// open. `None` if the circuit is unknown. Used to enforce the
    /// "exit socket busy" rejection before splicing.
    fn exit_socket_enabled(&self, cid: CircuitId) -> Option<bool>;

    /// The socket address this circuit's exit hop would tunnel traffic to,
    /// if any. `None` if the circuit is unknown or has no exit socket yet.
    fn circuit_sock_addr(&self, cid: CircuitId) -> Option<SocketAddr>;

    /// The node identity of this circuit's final hop, if the circuit is
    /// known. Used to recover `rp_info.last_hop_pubkey` once a rendezvous
    /// circuit the local node built comes up, and to pin a downloader's
    /// own rendezvous circuit to that same node via `required_exit`.
    fn circuit_exit_node_id(&self, cid: CircuitId) -> Option<NodeId>;

    /// Splice two circuits end to end so traffic flows transparently between
    /// them, completing Phase E.
    fn splice(&mut self, cid_in: CircuitId, cid_out: CircuitId) -> Result<()>;
}

/// The DHT provider this crate consumes for Phase B lookup/announce.
///
/// `lookup` returns the peer set published under `lookup_id` as
/// `(address, relay_epoch)` pairs; `announce` publishes or refreshes the
/// caller's own entry in that set. A provider may return `Ok(None)`/`Ok(())`
/// for a request it could not complete without that being a protocol error
/// (the DHT is best-effort); only [`DhtUnavailable`](crate::HiddenServiceError::DhtUnavailable)
/// models a configured-but-unreachable provider.
pub trait DhtProvider {
    /// Resolve the peer set announced under `lookup_id`, if any.
    fn lookup(&mut self, lookup_id: LookupId) -> Result<Option<Vec<(SocketAddr, [u8; 32])>>>;

    /// Publish or refresh the local introduction-point set under `lookup_id`.
    fn announce(&mut self, lookup_id: LookupId) -> Result<()>;
}

/// Production [`DhtProvider`] wiring a [`ochra_dht::kademlia::RoutingTable`]
/// and a [`ochra_dht::bep44::RecordStore`] together.
///
/// The peer set for a `lookup_id` is stored as a single BEP-44 mutable
/// record signed by this provider's own Ed25519 key, keyed the way
/// [`ochra_dht::bep44::DhtRecord::storage_key`] keys any mutable record:
/// `BLAKE3::hash(public_key || lookup_id)` with `lookup_id` as the salt —
/// mirroring how BitTorrent's mainline DHT stores a peer list under the
/// infohash, except here the "peer list" is a CBOR-encoded
/// `Vec<(SocketAddr, [u8; 32])>` instead of a compact peer list.
///
/// This wiring mediates a local record store and routing table; it does not
/// itself perform the network `FIND_NODE`/`GET`/`PUT` RPC round-trips that a
/// real distributed lookup needs (that belongs to the daemon's DHT
/// transport, which resolves remote peers into this store via the same
/// `RecordStore`/`RoutingTable` the daemon already runs for the base DHT
/// overlay). Within this crate's scope, `DhtKademliaProvider` is the
/// correct place for `lookup_id -> value` translation and signing.
pub struct DhtKademliaProvider {
    store: ochra_dht::bep44::RecordStore,
    routing: ochra_dht::kademlia::RoutingTable,
    signing_key: ochra_crypto::ed25519::SigningKey,
    self_addr: SocketAddr,
    seq: u64,
}

impl DhtKademliaProvider {
    /// Build a provider around a fresh record store and routing table rooted
    /// at `local_id`, announcing itself at `self_addr` and signing
    /// announcements with `signing_key`.
    pub fn new(
        local_id: NodeId,
        self_addr: SocketAddr,
        signing_key: ochra_crypto::ed25519::SigningKey,
    ) -> Self {
        Self {
            store: ochra_dht::bep44::RecordStore::new(),
            routing: ochra_dht::kademlia::RoutingTable::new(local_id),
            signing_key,
            self_addr,
            seq: 0,
        }
    }

    /// The key this provider's own records for `lookup_id` are stored and
    /// retrieved under: `blake3(public_key || lookup_id)`, matching
    /// `DhtRecord::storage_key`'s `blake3(public_key || salt)` with
    /// `salt = lookup_id` (the same salt `create_mutable_record` is called
    /// with below) — `RecordStore::put` indexes a mutable record by that
    /// formula, so `lookup` must compute the identical key or it can never
    /// find what `announce` stored.
    fn storage_key(&self, lookup_id: LookupId) -> [u8; 32] {
        let public_key = self.signing_key.verifying_key().to_bytes();
        let mut input = Vec::with_capacity(32 + lookup_id.len());
        input.extend_from_slice(&public_key);
        input.extend_from_slice(&lookup_id);
        ochra_crypto::blake3::hash(&input)
    }

    /// Expose the routing table for the daemon to feed with discovered
    /// peers (`add_node`) independently of the hidden-service lookups this
    /// provider mediates.
    pub fn routing_table_mut(&mut self) -> &mut ochra_dht::kademlia::RoutingTable {
        &mut self.routing
    }
}

impl DhtProvider for DhtKademliaProvider {
    fn lookup(&mut self, lookup_id: LookupId) -> Result<Option<Vec<(SocketAddr, [u8; 32])>>> {
        self.store.expire();
        let key = self.storage_key(lookup_id);
        let Some(record) = self.store.get(&key) else {
            return Ok(None);
        };

        let peers: Vec<(SocketAddr, [u8; 32])> =
            match ochra_transport::cbor::from_slice(record.value()) {
                Ok(peers) => peers,
                Err(e) => {
                    tracing::warn!(error = %e, "malformed hidden-service DHT record");
                    return Err(e.into());
                }
            };
        Ok(Some(peers))
    }

    fn announce(&mut self, lookup_id: LookupId) -> Result<()> {
        self.store.expire();
        let key = self.storage_key(lookup_id);

        let mut peers = match self.store.get(&key) {
            Some(record) => {
                ochra_transport::cbor::from_slice::<Vec<(SocketAddr, [u8; 32])>>(record.value())
                    .unwrap_or_default()
            }
            None => Vec::new(),
        };

        let self_entry = (self.self_addr, self.signing_key.verifying_key().to_bytes());
        peers.retain(|(addr, _)| *addr != self_entry.0);
        peers.push(self_entry);

        let value = ochra_transport::cbor::to_vec(&peers)
            .map_err(|e| ochra_transport::TransportError::Serialization(e.to_string()))?;

        self.seq += 1;
        let record = ochra_dht::bep44::create_mutable_record(
            &self.signing_key,
            &lookup_id,
            self.seq,
            value,
        )?;
        self.store.put(record)?;
        Ok(())
    }
}

#[cfg(test)]
mod dht_kademlia_provider_tests {
    use super::*;

    #[test]
    fn announce_then_lookup_round_trips() {
        let signing_key = ochra_crypto::ed25519::SigningKey::generate();
        let self_addr: SocketAddr = "10.0.0.1:9000".parse().unwrap();
        let mut provider = DhtKademliaProvider::new([1u8; 32], self_addr, signing_key);

        let lookup_id = [0x42u8; 20];
        assert_eq!(provider.lookup(lookup_id).unwrap(), None);

        provider.announce(lookup_id).unwrap();
        let peers = provider
            .lookup(lookup_id)
            .unwrap()
            .expect("a record announced under lookup_id must be found by lookup");
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].0, self_addr);
    }
}
