//! The hidden-service protocol state machine.
//!
//! `HiddenServiceEngine` drives the five phases described at the crate root
//! on top of a [`CircuitSubstrate`] and an optional [`DhtProvider`], both
//! generic so tests run against `substrate::test_support`'s in-memory
//! doubles instead of a real onion tunnel. The engine itself holds no
//! network I/O and no locks: every public method takes `&mut self` and the
//! caller (the embedding daemon's single dispatch task) is responsible for
//! serializing calls, mirroring how `ochra_onion`'s circuit manager expects
//! to be driven from one task.
//!
//! Inbound cells arrive through [`HiddenServiceEngine::dispatch`], tagged
//! with a [`MessageContext`] telling the handler whether the cell traveled
//! through a circuit this node terminates (`FromCircuit`) or arrived
//! directly over the raw UDP socket, relayed by the network but outside any
//! circuit this node is a party to (`FromSocket`) — the distinction the
//! introduction point's two `on_key_request` branches key off of.

use std::collections::HashSet;
use std::net::SocketAddr;

use ochra_dht::kademlia::NodeId;
use ochra_transport::messages::{
    HsCreateE2e, HsCreatedE2e, HsDhtRequest, HsDhtResponse, HsEstablishIntro,
    HsEstablishRendezvous, HsIntroEstablished, HsKeyRequest, HsKeyResponse, HsLinkE2e,
    HsLinkedE2e, HsPexPeer, HsRendezvousEstablished,
};

use crate::blacklist::DhtBlacklist;
use crate::cache::{CacheKind, PendingCreateE2e, PendingRequest, RequestCache};
use crate::lookup::{self, LookupId, ServiceId};
use crate::session::{self, SessionKeys};
use crate::substrate::{CircuitRole, CircuitSubstrate, DhtProvider};
use crate::tables::{DownloaderTables, RelayTables, ServiceTables};
use crate::{address, dht_mediator, CircuitId, Cookie, EngineConfig, HiddenServiceError, Result, ServiceCallback};

/// Local u8 opcodes for the hidden-service cell protocol, matching the
/// numbering `ochra_transport::messages`' `Hs*` doc comments annotate
/// (opcodes 11-22). Distinct from the `MSG_HS_*` u16 wire-envelope
/// discriminants: those identify a `TypedMessage` variant for the outer
/// transport layer, these are the cell-level opcode this engine dispatches
/// on once a cell has already been delivered to it.
pub mod opcodes {
    pub const ESTABLISH_INTRO: u8 = 11;
    pub const INTRO_ESTABLISHED: u8 = 12;
    pub const KEY_REQUEST: u8 = 13;
    pub const KEY_RESPONSE: u8 = 14;
    pub const ESTABLISH_RENDEZVOUS: u8 = 15;
    pub const RENDEZVOUS_ESTABLISHED: u8 = 16;
    pub const CREATE_E2E: u8 = 17;
    pub const CREATED_E2E: u8 = 18;
    pub const LINK_E2E: u8 = 19;
    pub const LINKED_E2E: u8 = 20;
    pub const DHT_REQUEST: u8 = 21;
    pub const DHT_RESPONSE: u8 = 22;
}

/// How an inbound cell reached this node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageContext {
    /// The cell arrived through a circuit this node terminates, whichever
    /// end of it this node happens to be.
    FromCircuit(CircuitId),
    /// The cell arrived directly over the UDP socket: relayed by the
    /// network, not wrapped inside any circuit this node is a party to.
    FromSocket,
}

/// Log a recovered-locally error at `warn` and drop the message. Used by
/// every handler whose failure mode is "ignore and let the peer's own
/// timeout/retry logic take over" rather than propagate to the caller.
pub fn log_and_drop(context: &str, err: &HiddenServiceError) {
    tracing::warn!(error = %err, context, "hidden-service message dropped");
}

/// The hidden-service protocol engine, generic over the onion substrate and
/// DHT provider it drives.
pub struct HiddenServiceEngine<S: CircuitSubstrate, D: DhtProvider> {
    substrate: S,
    dht: Option<D>,
    config: EngineConfig,
    /// This node's own identity, stamped into outbound `create-e2e`'s
    /// `node_id` field.
    node_id: NodeId,
    /// This node's own externally-reachable address, stamped into
    /// `rendezvous-established`'s `rp_addr` field when acting as an RP.
    self_addr: SocketAddr,

    service: ServiceTables,
    relay: RelayTables,
    downloader: DownloaderTables,
    cache: RequestCache,
    blacklist: DhtBlacklist,

    /// Closes the duplicate-e2e race: a second `create_e2e` for a peer
    /// already in flight for the same service is dropped rather than
    /// issuing a redundant DH exchange.
    in_flight_e2e: HashSet<(LookupId, [u8; 32])>,
}

impl<S: CircuitSubstrate, D: DhtProvider> HiddenServiceEngine<S, D> {
    pub fn new(substrate: S, dht: Option<D>, node_id: NodeId, self_addr: SocketAddr, config: EngineConfig) -> Self {
        let pex_cap = config.pex_cap;
        Self {
            substrate,
            dht,
            config,
            node_id,
            self_addr,
            service: ServiceTables::new(),
            relay: RelayTables::new(),
            downloader: DownloaderTables::new(pex_cap),
            cache: RequestCache::new(),
            blacklist: DhtBlacklist::new(),
            in_flight_e2e: HashSet::new(),
        }
    }

    fn send<T: serde::Serialize>(&mut self, cid: CircuitId, opcode: u8, msg: &T) -> Result<()> {
        let payload = ochra_transport::cbor::to_vec(msg)?;
        self.substrate.send_cell(cid, opcode, payload)
    }

    fn tunnel<T: serde::Serialize>(&mut self, cid: CircuitId, dest: SocketAddr, opcode: u8, msg: &T) -> Result<()> {
        let payload = ochra_transport::cbor::to_vec(msg)?;
        self.substrate.tunnel_data(cid, dest, opcode, payload)
    }

    // ---------------------------------------------------------------
    // Phase A: introduction-point establishment
    // ---------------------------------------------------------------

    /// Register a freshly chosen service, build `n_intros` introduction-point
    /// circuits of length `hops + 1`, and send `establish-intro` down each as
    /// it comes up. `cb` fires once a downloader's data path opens.
    pub fn register_service(
        &mut self,
        service_id: ServiceId,
        hops: u8,
        cb: ServiceCallback,
        n_intros: usize,
    ) -> Result<LookupId> {
        let lookup_id = lookup::service_id_to_lookup_id(&service_id);
        if !self.service.is_registered(&lookup_id) {
            self.service
                .register(lookup_id, hops, ochra_crypto::x25519::X25519StaticSecret::random());
        }
        self.service.register_callback(lookup_id, cb);

        for _ in 0..n_intros {
            match self.substrate.create_circuit(hops + 1, CircuitRole::Ip, None, Some(lookup_id)) {
                Ok(cid) => {
                    self.service.record_intro_circuit(cid, lookup_id);
                    let id = self.cache.add(PendingRequest::IpRequest { circuit: cid });
                    let msg = HsEstablishIntro { id, info_hash: lookup_id };
                    if let Err(e) = self.send(cid, opcodes::ESTABLISH_INTRO, &msg) {
                        log_and_drop("register_service: establish-intro send", &e);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to build an introduction-point circuit");
                }
            }
        }
        Ok(lookup_id)
    }

    /// Number of introduction points currently up for `lookup_id`. Used to
    /// decide whether a failed circuit needs replacing; this crate only
    /// tracks the bookkeeping, it does not re-establish automatically.
    pub fn intro_point_count(&self, lookup_id: &LookupId) -> usize {
        self.service
            .infohash_ip_circuits
            .get(lookup_id)
            .map_or(0, Vec::len)
    }

    /// At the IP: an `establish-intro` cell must arrive through the circuit
    /// the seeder built to us.
    fn on_establish_intro(&mut self, ctx: MessageContext, msg: HsEstablishIntro) -> Result<()> {
        let MessageContext::FromCircuit(cid) = ctx else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        self.relay.intro_point_for.insert(msg.info_hash, cid);
        let reply = HsIntroEstablished { id: msg.id };
        self.send(cid, opcodes::INTRO_ESTABLISHED, &reply)?;
        dht_mediator::dht_announce(self.dht.as_mut(), msg.info_hash)
    }

    /// At the seeder: confirm the `IpRequest` we issued matches the circuit
    /// the reply arrived on.
    fn on_intro_established(&mut self, ctx: MessageContext, msg: HsIntroEstablished) -> Result<()> {
        let MessageContext::FromCircuit(cid) = ctx else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        match self.cache.pop(CacheKind::IpRequest, msg.id) {
            Some(PendingRequest::IpRequest { circuit }) if circuit == cid => Ok(()),
            _ => Err(HiddenServiceError::UnknownIdentifier),
        }
    }

    /// Bookkeeping-only reaction to a failed or torn-down introduction-point
    /// circuit: scrubs the tables and logs if redundancy dropped below what
    /// `register_service` originally asked for. Does not rebuild anything —
    /// the caller decides whether to call `register_service` again.
    pub fn on_intro_circuit_failed(&mut self, cid: CircuitId, lookup_id: LookupId) {
        self.remove_circuit(cid);
        let remaining = self.intro_point_count(&lookup_id);
        if remaining < self.config.default_n_intros {
            tracing::warn!(
                remaining,
                wanted = self.config.default_n_intros,
                "introduction-point redundancy degraded"
            );
        }
    }

    // ---------------------------------------------------------------
    // Phase B: DHT lookup/announce
    // ---------------------------------------------------------------

    /// Look up `service_id` via the DHT, registering `hops`/`cb` for it if
    /// this is the first call for this service (a node downloading a
    /// service it does not itself seed still needs an entry in `hops` to
    /// size its own exit circuit, and a callback to fire once linked).
    pub fn do_dht_lookup(&mut self, service_id: ServiceId, hops: u8, cb: ServiceCallback) -> Result<LookupId> {
        let lookup_id = lookup::service_id_to_lookup_id(&service_id);
        self.service.hops.entry(lookup_id).or_insert(hops);
        self.service.register_callback(lookup_id, cb);
        self.downloader.last_dht_lookup.insert(lookup_id, std::time::Instant::now());

        let hop_count = *self.service.hops.get(&lookup_id).unwrap_or(&hops);
        let cid = self
            .substrate
            .create_circuit(hop_count, CircuitRole::Data, None, Some(lookup_id))?;
        let id = self.cache.add(PendingRequest::DhtRequest { circuit: cid, lookup_id });
        let msg = HsDhtRequest { id, info_hash: lookup_id };
        self.send(cid, opcodes::DHT_REQUEST, &msg)?;
        Ok(lookup_id)
    }

    /// At the circuit's exit: answer a `dht-request` from the provider, iff
    /// our exit socket for this circuit is still live (a late response to a
    /// torn-down circuit is simply dropped).
    fn on_dht_request(&mut self, ctx: MessageContext, msg: HsDhtRequest) -> Result<()> {
        let MessageContext::FromCircuit(cid) = ctx else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        let peers = dht_mediator::dht_lookup(self.dht.as_mut(), msg.info_hash)?.unwrap_or_default();
        if self.substrate.exit_socket_enabled(cid) != Some(true) {
            tracing::debug!(cid, "dht-response dropped, exit socket gone");
            return Ok(());
        }
        let peers = peers
            .into_iter()
            .map(|(addr, pub_key)| HsPexPeer { sock_addr: addr.to_string(), pub_key })
            .collect();
        let reply = HsDhtResponse { id: msg.id, info_hash: msg.info_hash, peers };
        self.send(cid, opcodes::DHT_RESPONSE, &reply)
    }

    /// At the downloader: for every freshly discovered, not-already-contacted
    /// peer, blacklist it against rediscovery and issue a `key-request`.
    fn on_dht_response(&mut self, ctx: MessageContext, msg: HsDhtResponse) -> Result<()> {
        let MessageContext::FromCircuit(cid) = ctx else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        let Some(PendingRequest::DhtRequest { circuit, lookup_id }) =
            self.cache.pop(CacheKind::DhtRequest, msg.id)
        else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        if circuit != cid || lookup_id != msg.info_hash {
            return Err(HiddenServiceError::UnknownIdentifier);
        }

        self.blacklist.prune();
        for peer in msg.peers {
            let Ok(addr) = peer.sock_addr.parse::<SocketAddr>() else {
                tracing::debug!(addr = %peer.sock_addr, "dht-response peer address unparsable, skipping");
                continue;
            };
            if self.downloader.has_rp_circuit_for_peer(&lookup_id, addr) {
                continue;
            }
            if self.blacklist.is_blacklisted(&lookup_id, addr) {
                continue;
            }
            self.blacklist.insert(lookup_id, addr);
            if let Err(e) = self.create_key_request(lookup_id, addr) {
                tracing::warn!(error = %e, "failed to issue key-request for discovered peer");
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Phase C: key request/response with peer exchange
    // ---------------------------------------------------------------

    /// Open a one-shot circuit to `sock_addr` (an introduction point's
    /// address) and tunnel a `key-request` through it.
    pub fn create_key_request(&mut self, info_hash: LookupId, sock_addr: SocketAddr) -> Result<()> {
        let hops = *self.service.hops.get(&info_hash).ok_or(HiddenServiceError::NoCircuitAvailable)?;
        let cid = self.substrate.create_circuit(hops, CircuitRole::Data, None, Some(info_hash))?;
        let id = self.cache.add(PendingRequest::KeyRequest { circuit: cid, sock_addr, info_hash });
        let msg = HsKeyRequest { id, info_hash };
        self.tunnel(cid, sock_addr, opcodes::KEY_REQUEST, &msg)
    }

    /// Dispatches on `ctx`: `FromSocket` means we are the introduction point
    /// relaying a downloader's raw request onward to the seeder; `FromCircuit`
    /// means we are the seeder, answering a request relayed to us.
    fn on_key_request(&mut self, ctx: MessageContext, source: SocketAddr, msg: HsKeyRequest) -> Result<()> {
        match ctx {
            MessageContext::FromSocket => {
                let Some(&relay_circuit) = self.relay.intro_point_for.get(&msg.info_hash) else {
                    return Err(HiddenServiceError::NotAnIntroPoint);
                };
                let new_id = self.cache.add(PendingRequest::KeyRelay {
                    relay_circuit,
                    original_id: msg.id,
                    return_sock_addr: source,
                    info_hash: msg.info_hash,
                });
                let forward = HsKeyRequest { id: new_id, info_hash: msg.info_hash };
                self.send(relay_circuit, opcodes::KEY_REQUEST, &forward)
            }
            MessageContext::FromCircuit(cid) => {
                if !self.service.is_registered(&msg.info_hash) {
                    return Err(HiddenServiceError::NotServing);
                }
                let pub_key = self
                    .service
                    .service_keys
                    .get(&msg.info_hash)
                    .map(|secret| secret.public_key().to_bytes())
                    .ok_or(HiddenServiceError::NotServing)?;
                let pex_peers: Vec<HsPexPeer> = self
                    .service
                    .pex_for(&msg.info_hash)
                    .take(self.config.pex_cap)
                    .map(|(addr, pub_key)| HsPexPeer { sock_addr: addr.to_string(), pub_key: *pub_key })
                    .collect();
                let reply = HsKeyResponse { id: msg.id, pub_key, pex_peers };
                self.send(cid, opcodes::KEY_RESPONSE, &reply)
            }
        }
    }

    /// Dispatches on whether a `KeyRelay` or plain `KeyRequest` cache entry
    /// matches `msg.id`: the former means we are the introduction point
    /// repacking the seeder's reply back out to the downloader, the latter
    /// means we are the downloader receiving the final answer.
    fn on_key_response(&mut self, ctx: MessageContext, msg: HsKeyResponse) -> Result<()> {
        let MessageContext::FromCircuit(_cid) = ctx else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };

        if let Some(PendingRequest::KeyRelay { relay_circuit, original_id, return_sock_addr, .. }) =
            self.cache.pop(CacheKind::KeyRelay, msg.id)
        {
            let repacked = HsKeyResponse { id: original_id, pub_key: msg.pub_key, pex_peers: msg.pex_peers };
            return self.tunnel(relay_circuit, return_sock_addr, opcodes::KEY_RESPONSE, &repacked);
        }

        let Some(PendingRequest::KeyRequest { circuit, sock_addr, info_hash }) =
            self.cache.pop(CacheKind::KeyRequest, msg.id)
        else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };

        let pex_entries: Vec<(SocketAddr, [u8; 32])> = msg
            .pex_peers
            .iter()
            .filter_map(|p| p.sock_addr.parse::<SocketAddr>().ok().map(|addr| (addr, p.pub_key)))
            .collect();
        self.downloader.add_pex(info_hash, pex_entries.iter().copied());
        self.downloader.add_pex(info_hash, std::iter::once((sock_addr, msg.pub_key)));

        // Phase D fans out over every pex peer not yet covered by an RP
        // circuit or an in-flight e2e attempt, not just the direct responder
        // — the gossiped entries above would otherwise never be dialed.
        let candidates: Vec<(SocketAddr, [u8; 32])> = self.downloader.pex_for(&info_hash).copied().collect();
        for (peer_addr, peer_pub) in candidates {
            if self.downloader.has_rp_circuit_for_peer(&info_hash, peer_addr) {
                continue;
            }
            if self.in_flight_e2e.contains(&(info_hash, peer_pub)) {
                continue;
            }
            if let Err(e) = self.create_e2e(circuit, peer_addr, info_hash, peer_pub) {
                tracing::warn!(error = %e, "failed to issue create-e2e for pex peer");
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Phase D: end-to-end Diffie-Hellman and rendezvous establishment
    // ---------------------------------------------------------------

    /// At the downloader: send a `create-e2e` through `circuit` toward
    /// `sock_addr` (the introduction point), carrying a fresh ephemeral
    /// DH share. Duplicate attempts for the same `(info_hash, peer_pub)`
    /// already in flight are dropped.
    pub fn create_e2e(
        &mut self,
        circuit: CircuitId,
        sock_addr: SocketAddr,
        info_hash: LookupId,
        peer_pub: [u8; 32],
    ) -> Result<()> {
        if !self.in_flight_e2e.insert((info_hash, peer_pub)) {
            tracing::debug!("duplicate create-e2e for peer already in flight, dropping");
            return Ok(());
        }

        let local_secret = ochra_crypto::x25519::X25519StaticSecret::random();
        let first_part = local_secret.public_key().to_bytes();
        let id = self.cache.add(PendingRequest::E2ERequest {
            info_hash,
            circuit,
            local_secret,
            first_part,
            peer_pub,
            sock_addr,
        });
        let msg = HsCreateE2e {
            id,
            info_hash,
            node_id: self.node_id,
            node_pub: first_part,
            dh_first_part: first_part,
        };
        self.tunnel(circuit, sock_addr, opcodes::CREATE_E2E, &msg)
    }

    /// Dispatches on `ctx`: `FromSocket` means we are the introduction point
    /// relaying toward the seeder; `FromCircuit` means we are the seeder,
    /// answering a request relayed to us through our own intro circuit.
    fn on_create_e2e(&mut self, ctx: MessageContext, source: SocketAddr, msg: HsCreateE2e) -> Result<()> {
        match ctx {
            MessageContext::FromSocket => {
                let Some(&relay_circuit) = self.relay.intro_point_for.get(&msg.info_hash) else {
                    return Err(HiddenServiceError::NotAnIntroPoint);
                };
                let new_id = self.cache.add(PendingRequest::CreateE2ERelay {
                    relay_circuit,
                    original_id: msg.id,
                    return_sock_addr: source,
                    info_hash: msg.info_hash,
                });
                let forward = HsCreateE2e { id: new_id, ..msg };
                self.send(relay_circuit, opcodes::CREATE_E2E, &forward)
            }
            MessageContext::FromCircuit(cid) => {
                let hops = *self
                    .service
                    .hops
                    .get(&msg.info_hash)
                    .ok_or(HiddenServiceError::NotServing)?;
                if !self.service.is_registered(&msg.info_hash) {
                    return Err(HiddenServiceError::NotServing);
                }
                self.service.record_pex_peer(msg.info_hash, source, msg.node_pub, self.config.pex_cap);

                let rp_cid = self
                    .substrate
                    .create_circuit(hops, CircuitRole::Rp, None, Some(msg.info_hash))?;
                let mut cookie = [0u8; 20];
                rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut cookie);

                let pending = PendingCreateE2e {
                    e2e_id: msg.id,
                    e2e_circuit: cid,
                    info_hash: msg.info_hash,
                    peer_pub: msg.node_pub,
                    first_part: msg.dh_first_part,
                    cookie,
                };
                let rp_id = self.cache.add(PendingRequest::RpRequest { pending });
                let establish = HsEstablishRendezvous { id: rp_id, cookie };
                self.send(rp_cid, opcodes::ESTABLISH_RENDEZVOUS, &establish)
            }
        }
    }

    /// At the seeder's rendezvous-point circuit: resume the `PendingCreateE2e`
    /// continuation, computing the DH response and encrypting `rp_info` now
    /// that the RP's address and node identity are known.
    fn on_rendezvous_established(&mut self, ctx: MessageContext, msg: HsRendezvousEstablished) -> Result<()> {
        let MessageContext::FromCircuit(cid) = ctx else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        let Some(PendingRequest::RpRequest { pending }) = self.cache.pop(CacheKind::RpRequest, msg.id) else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };

        let rp_sock: SocketAddr = msg
            .rp_addr
            .parse()
            .map_err(|_| HiddenServiceError::UnknownIdentifier)?;
        let SocketAddr::V4(rp_v4) = rp_sock else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        let last_hop_pubkey = self.substrate.circuit_exit_node_id(cid).unwrap_or([0u8; 32]);
        let rp_info = session::RpInfo { ip: *rp_v4.ip(), port: rp_v4.port(), last_hop_pubkey };

        let service_secret = self
            .service
            .service_keys
            .get(&pending.info_hash)
            .ok_or(HiddenServiceError::NotServing)?
            .clone();
        let first_part = ochra_crypto::x25519::X25519PublicKey::from_bytes(pending.first_part);
        let response = session::dh_verify_and_respond(&first_part, &service_secret.public_key());

        let rp_sock_addr_enc =
            session::encrypt_rp_info(&response.session_keys.exit_node, &rp_info, &pending.cookie)?;

        let reply = HsCreatedE2e {
            id: pending.e2e_id,
            dh_y: response.y.to_bytes(),
            auth: response.auth,
            rp_sock_addr_enc,
        };
        self.send(pending.e2e_circuit, opcodes::CREATED_E2E, &reply)
    }

    /// Dispatches on whether a `CreateE2ERelay` or plain `E2ERequest` cache
    /// entry matches `msg.id`: the former is the introduction point repacking
    /// the reply for the downloader, the latter is the downloader completing
    /// the DH exchange and building its rendezvous circuit.
    fn on_created_e2e(&mut self, ctx: MessageContext, msg: HsCreatedE2e) -> Result<()> {
        let MessageContext::FromCircuit(_cid) = ctx else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };

        if let Some(PendingRequest::CreateE2ERelay { relay_circuit, original_id, return_sock_addr, .. }) =
            self.cache.pop(CacheKind::CreateE2ERelay, msg.id)
        {
            let repacked = HsCreatedE2e {
                id: original_id,
                dh_y: msg.dh_y,
                auth: msg.auth,
                rp_sock_addr_enc: msg.rp_sock_addr_enc,
            };
            return self.tunnel(relay_circuit, return_sock_addr, opcodes::CREATED_E2E, &repacked);
        }

        let Some(PendingRequest::E2ERequest { info_hash, local_secret, first_part, peer_pub, sock_addr, .. }) =
            self.cache.pop(CacheKind::E2ERequest, msg.id)
        else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        self.in_flight_e2e.remove(&(info_hash, peer_pub));

        let first_part_pk = ochra_crypto::x25519::X25519PublicKey::from_bytes(first_part);
        let service_pubkey = ochra_crypto::x25519::X25519PublicKey::from_bytes(peer_pub);
        let y = ochra_crypto::x25519::X25519PublicKey::from_bytes(msg.dh_y);
        let session_keys =
            match session::dh_verify_response(&local_secret, &first_part_pk, &service_pubkey, &y, &msg.auth) {
                Ok(keys) => keys,
                Err(e) => {
                    log_and_drop("on_created_e2e: dh verification", &e);
                    return Ok(());
                }
            };

        let (rp_info, cookie) = session::decrypt_rp_info(&session_keys.exit_node, &msg.rp_sock_addr_enc)?;
        let hops = *self.service.hops.get(&info_hash).unwrap_or(&1);
        let rp_cid = self.substrate.create_circuit(
            hops + 1,
            CircuitRole::Rendezvous,
            Some(rp_info.last_hop_pubkey),
            Some(info_hash),
        )?;
        self.create_link_e2e(rp_cid, cookie, session_keys, info_hash, sock_addr)
    }

    // ---------------------------------------------------------------
    // Phase E: link and splice
    // ---------------------------------------------------------------

    /// At the downloader, once its rendezvous circuit lands on the same node
    /// the seeder's RP circuit did: attach the session keys, record the
    /// download point, and send `link-e2e`.
    pub fn create_link_e2e(
        &mut self,
        circuit: CircuitId,
        cookie: Cookie,
        session_keys: SessionKeys,
        info_hash: LookupId,
        sock_addr: SocketAddr,
    ) -> Result<()> {
        let hops = *self.service.hops.get(&info_hash).unwrap_or(&1);
        self.downloader.record_download_point(circuit, info_hash, hops, sock_addr);
        self.downloader.record_rp_circuit(info_hash, circuit);
        self.downloader.attach_session_keys(circuit, session_keys);

        let id = self.cache.add(PendingRequest::LinkRequest { circuit, info_hash });
        let msg = HsLinkE2e { id, cookie };
        self.send(circuit, opcodes::LINK_E2E, &msg)
    }

    /// At the rendezvous point: splice the downloader's and seeder's legs
    /// together once both sides' cookie-bearing circuits are known and
    /// neither already has a live data-plane exit socket.
    fn on_link_e2e(&mut self, ctx: MessageContext, msg: HsLinkE2e) -> Result<()> {
        let MessageContext::FromCircuit(cid_in) = ctx else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        let Some(&cid_out) = self.relay.rendezvous_point_for.get(&msg.cookie) else {
            return Err(HiddenServiceError::NotARendezvousPoint);
        };

        let in_busy = self.substrate.exit_socket_enabled(cid_in).unwrap_or(false);
        let out_busy = self.substrate.exit_socket_enabled(cid_out).unwrap_or(false);
        if in_busy || out_busy {
            return Err(HiddenServiceError::ExitSocketBusy);
        }

        self.substrate.splice(cid_in, cid_out)?;
        self.relay.rendezvous_point_for.remove(&msg.cookie);

        let reply = HsLinkedE2e { id: msg.id };
        self.send(cid_in, opcodes::LINKED_E2E, &reply)
    }

    /// At the RP, the first leg of Phase E: record the seeder's rendezvous
    /// circuit under its cookie and reply with our own address.
    fn on_establish_rendezvous(&mut self, ctx: MessageContext, msg: HsEstablishRendezvous) -> Result<()> {
        let MessageContext::FromCircuit(cid) = ctx else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        self.relay.rendezvous_point_for.insert(msg.cookie, cid);
        let reply = HsRendezvousEstablished { id: msg.id, rp_addr: self.self_addr.to_string() };
        self.send(cid, opcodes::RENDEZVOUS_ESTABLISHED, &reply)
    }

    /// At the downloader: the data path is open, invoke the service callback
    /// with the synthetic loopback endpoint for this circuit.
    fn on_linked_e2e(&mut self, ctx: MessageContext, msg: HsLinkedE2e) -> Result<()> {
        let MessageContext::FromCircuit(cid) = ctx else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        let Some(PendingRequest::LinkRequest { circuit, info_hash }) =
            self.cache.pop(CacheKind::LinkRequest, msg.id)
        else {
            return Err(HiddenServiceError::UnknownIdentifier);
        };
        if circuit != cid {
            return Err(HiddenServiceError::UnknownIdentifier);
        }

        let endpoint = address::circuit_id_to_endpoint(cid);
        if let Some(cb) = self.service.callbacks.get_mut(&info_hash) {
            cb(endpoint);
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Dispatch and teardown
    // ---------------------------------------------------------------

    /// Tear down `cid` at the substrate and scrub every table's reference
    /// to it.
    pub fn remove_circuit(&mut self, cid: CircuitId) {
        self.substrate.remove_circuit(cid);
        self.cache.drop_circuit(cid);
        self.service.drop_circuit(cid);
        self.relay.drop_circuit(cid);
        self.downloader.drop_circuit(cid);
    }

    /// Route an inbound cell to its handler by opcode, decoding its CBOR
    /// payload first. Decode or handler failures are logged and the cell is
    /// dropped — per the error-handling design, only the constructive
    /// operations above propagate a `Result` to their caller.
    pub fn dispatch(&mut self, source: SocketAddr, opcode: u8, payload: &[u8], ctx: MessageContext) {
        macro_rules! handle {
            ($ty:ty, $handler:ident) => {{
                match ochra_transport::cbor::from_slice::<$ty>(payload) {
                    Ok(msg) => {
                        if let Err(e) = self.$handler(ctx, msg) {
                            log_and_drop(stringify!($handler), &e);
                        }
                    }
                    Err(e) => log_and_drop(stringify!($handler), &e.into()),
                }
            }};
        }

        match opcode {
            opcodes::ESTABLISH_INTRO => handle!(HsEstablishIntro, on_establish_intro),
            opcodes::INTRO_ESTABLISHED => handle!(HsIntroEstablished, on_intro_established),
            opcodes::KEY_REQUEST => {
                match ochra_transport::cbor::from_slice::<HsKeyRequest>(payload) {
                    Ok(msg) => {
                        if let Err(e) = self.on_key_request(ctx, source, msg) {
                            log_and_drop("on_key_request", &e);
                        }
                    }
                    Err(e) => log_and_drop("on_key_request", &e.into()),
                }
            }
            opcodes::KEY_RESPONSE => handle!(HsKeyResponse, on_key_response),
            opcodes::ESTABLISH_RENDEZVOUS => handle!(HsEstablishRendezvous, on_establish_rendezvous),
            opcodes::RENDEZVOUS_ESTABLISHED => handle!(HsRendezvousEstablished, on_rendezvous_established),
            opcodes::CREATE_E2E => {
                match ochra_transport::cbor::from_slice::<HsCreateE2e>(payload) {
                    Ok(msg) => {
                        if let Err(e) = self.on_create_e2e(ctx, source, msg) {
                            log_and_drop("on_create_e2e", &e);
                        }
                    }
                    Err(e) => log_and_drop("on_create_e2e", &e.into()),
                }
            }
            opcodes::CREATED_E2E => handle!(HsCreatedE2e, on_created_e2e),
            opcodes::LINK_E2E => handle!(HsLinkE2e, on_link_e2e),
            opcodes::LINKED_E2E => handle!(HsLinkedE2e, on_linked_e2e),
            opcodes::DHT_REQUEST => handle!(HsDhtRequest, on_dht_request),
            opcodes::DHT_RESPONSE => handle!(HsDhtResponse, on_dht_response),
            other => tracing::debug!(opcode = other, "unknown hidden-service opcode, dropping"),
        }
    }
}
