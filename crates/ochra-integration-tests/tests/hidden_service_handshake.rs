//! Integration test: hidden-service introduction, key exchange, and
//! rendezvous splice across three independent engines (seeder, downloader,
//! rendezvous point).
//!
//! Exercises the five-phase hidden-service protocol end to end:
//! 1. Seeder registers a service and brings up an introduction-point circuit
//! 2. Downloader sends a key-request to the introduction point
//! 3. Seeder answers with its public key, triggering create-e2e
//! 4. Seeder builds a rendezvous-point circuit and replies with created-e2e
//! 5. Downloader builds its own rendezvous circuit and links it
//! 6. The rendezvous point splices both legs and the downloader's service
//!    callback fires with the synthetic circuit endpoint
//!
//! This test drives `ochra-hidden-service`'s public `HiddenServiceEngine` API
//! and `CircuitSubstrate` trait only, the same seam the daemon itself would
//! use to wire in `ochra-onion`. The introduction point's relay role is
//! collapsed into the seeder's own dispatch calls, mirroring the crate's own
//! `engine.rs` end-to-end test; the rendezvous point gets its own engine here
//! since splicing is the one phase no single peer can observe both sides of.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use ochra_hidden_service::engine::{opcodes, HiddenServiceEngine, MessageContext};
use ochra_hidden_service::substrate::{CircuitRole, CircuitSubstrate, DhtProvider};
use ochra_hidden_service::{CircuitId, EngineConfig};
use ochra_transport::messages::{
    HsCreateE2e, HsCreatedE2e, HsEstablishIntro, HsEstablishRendezvous, HsIntroEstablished,
    HsKeyRequest, HsKeyResponse, HsLinkE2e, HsLinkedE2e, HsRendezvousEstablished,
};

/// Shared recording state behind a `TestSubstrate`, kept in an `Arc<Mutex<_>>`
/// so the test can inspect what an engine sent after handing the substrate
/// itself to `HiddenServiceEngine::new` (which takes it by value).
#[derive(Default)]
struct Recorder {
    next_cid: CircuitId,
    exit_ids: HashMap<CircuitId, [u8; 32]>,
    sent: Vec<(CircuitId, u8, Vec<u8>)>,
    tunneled: Vec<(CircuitId, SocketAddr, u8, Vec<u8>)>,
    spliced: Vec<(CircuitId, CircuitId)>,
}

#[derive(Clone)]
struct TestSubstrate(Arc<Mutex<Recorder>>);

impl TestSubstrate {
    fn new() -> (Self, Arc<Mutex<Recorder>>) {
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        (TestSubstrate(recorder.clone()), recorder)
    }
}

impl CircuitSubstrate for TestSubstrate {
    fn create_circuit(
        &mut self,
        _hops: u8,
        _role: CircuitRole,
        required_exit: Option<[u8; 32]>,
        _info_hash: Option<[u8; 20]>,
    ) -> ochra_hidden_service::Result<CircuitId> {
        let mut rec = self.0.lock().unwrap();
        rec.next_cid += 1;
        let cid = rec.next_cid;
        let exit = required_exit.unwrap_or_else(|| {
            let mut id = [0u8; 32];
            id[..4].copy_from_slice(&cid.to_be_bytes());
            id
        });
        rec.exit_ids.insert(cid, exit);
        Ok(cid)
    }

    fn remove_circuit(&mut self, cid: CircuitId) {
        self.0.lock().unwrap().exit_ids.remove(&cid);
    }

    fn send_cell(&mut self, cid: CircuitId, opcode: u8, payload: Vec<u8>) -> ochra_hidden_service::Result<()> {
        self.0.lock().unwrap().sent.push((cid, opcode, payload));
        Ok(())
    }

    fn tunnel_data(
        &mut self,
        cid: CircuitId,
        dest: SocketAddr,
        opcode: u8,
        payload: Vec<u8>,
    ) -> ochra_hidden_service::Result<()> {
        self.0.lock().unwrap().tunneled.push((cid, dest, opcode, payload));
        Ok(())
    }

    fn exit_socket_enabled(&self, cid: CircuitId) -> Option<bool> {
        self.0.lock().unwrap().exit_ids.get(&cid).map(|_| false)
    }

    fn circuit_sock_addr(&self, _cid: CircuitId) -> Option<SocketAddr> {
        None
    }

    fn circuit_exit_node_id(&self, cid: CircuitId) -> Option<[u8; 32]> {
        self.0.lock().unwrap().exit_ids.get(&cid).copied()
    }

    fn splice(&mut self, cid_in: CircuitId, cid_out: CircuitId) -> ochra_hidden_service::Result<()> {
        self.0.lock().unwrap().spliced.push((cid_in, cid_out));
        Ok(())
    }
}

/// A `DhtProvider` that never resolves anything: this test hands the
/// downloader the introduction point's address out of band, the way PEX or a
/// prior DHT lookup would have, so only the "no DHT configured" degrade path
/// needs to exist here.
#[derive(Default)]
struct NoopDht;

impl DhtProvider for NoopDht {
    fn lookup(&mut self, _lookup_id: [u8; 20]) -> ochra_hidden_service::Result<Option<Vec<(SocketAddr, [u8; 32])>>> {
        Ok(None)
    }

    fn announce(&mut self, _lookup_id: [u8; 20]) -> ochra_hidden_service::Result<()> {
        Ok(())
    }
}

/// Simulate the underlying onion layer having already extended a circuit to
/// this node, the way a real `CircuitSubstrate` would populate a circuit
/// before the hidden-service engine ever sees a cell on it: the engine's own
/// handlers never call `create_circuit` for inbound legs, only for ones they
/// originate themselves.
fn admit_inbound_circuit(rec: &Arc<Mutex<Recorder>>, exit_node_id: [u8; 32]) -> CircuitId {
    let mut rec = rec.lock().unwrap();
    rec.next_cid += 1;
    let cid = rec.next_cid;
    rec.exit_ids.insert(cid, exit_node_id);
    cid
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> T {
    ochra_transport::cbor::from_slice(bytes).expect("valid cbor payload")
}

fn encode<T: serde::Serialize>(value: &T) -> Vec<u8> {
    ochra_transport::cbor::to_vec(value).expect("serializable payload")
}

#[test]
fn hidden_service_handshake_opens_a_data_path() {
    let seeder_addr: SocketAddr = "10.0.0.1:9000".parse().unwrap();
    let downloader_addr: SocketAddr = "10.0.0.2:9000".parse().unwrap();
    let rp_addr: SocketAddr = "10.0.0.3:9000".parse().unwrap();

    let (seeder_substrate, seeder_rec) = TestSubstrate::new();
    let mut seeder: HiddenServiceEngine<TestSubstrate, NoopDht> =
        HiddenServiceEngine::new(seeder_substrate, None, [0xAAu8; 32], seeder_addr, EngineConfig::default());

    let (downloader_substrate, downloader_rec) = TestSubstrate::new();
    let mut downloader: HiddenServiceEngine<TestSubstrate, NoopDht> = HiddenServiceEngine::new(
        downloader_substrate,
        None,
        [0xBBu8; 32],
        downloader_addr,
        EngineConfig::default(),
    );

    let (rp_substrate, rp_rec) = TestSubstrate::new();
    let mut rendezvous_point: HiddenServiceEngine<TestSubstrate, NoopDht> =
        HiddenServiceEngine::new(rp_substrate, None, [0xCCu8; 32], rp_addr, EngineConfig::default());

    let linked_endpoint: Arc<Mutex<Option<(std::net::Ipv4Addr, u16)>>> = Arc::new(Mutex::new(None));
    let linked_endpoint_cb = linked_endpoint.clone();

    // Phase A: the seeder registers a service; one IP circuit comes up and
    // an establish-intro cell goes out through it.
    let service_id = [0x99u8; 20];
    let lookup_id = seeder
        .register_service(service_id, 1, Box::new(|_| {}), 1)
        .expect("register_service must succeed");
    let (ip_cid, ip_opcode, ip_payload) = seeder_rec.lock().unwrap().sent.last().unwrap().clone();
    assert_eq!(ip_opcode, opcodes::ESTABLISH_INTRO);

    let establish_intro: HsEstablishIntro = decode(&ip_payload);
    seeder.dispatch(
        seeder_addr,
        opcodes::INTRO_ESTABLISHED,
        &encode(&HsIntroEstablished { id: establish_intro.id }),
        MessageContext::FromCircuit(ip_cid),
    );

    // The downloader learns of the same service (out of band, as DHT/PEX
    // would surface it) and issues a key-request straight to the IP.
    downloader
        .do_dht_lookup(service_id, 1, Box::new(move |ep| *linked_endpoint_cb.lock().unwrap() = Some(ep)))
        .expect("do_dht_lookup must succeed even with no DHT provider configured");
    assert_eq!(downloader_rec.lock().unwrap().sent.len(), 1, "do_dht_lookup issues one dht-request cell");

    downloader
        .create_key_request(lookup_id, seeder_addr)
        .expect("create_key_request must succeed");
    let (key_req_cid, _, key_req_payload) = downloader_rec.lock().unwrap().tunneled.last().unwrap().clone();
    let key_req: HsKeyRequest = decode(&key_req_payload);

    // Phase C: the seeder answers (the introduction point's relay hop is
    // collapsed into this single dispatch call).
    seeder.dispatch(
        seeder_addr,
        opcodes::KEY_REQUEST,
        &encode(&key_req),
        MessageContext::FromCircuit(ip_cid),
    );
    let (_, _, key_resp_payload) = seeder_rec.lock().unwrap().sent.last().unwrap().clone();
    let key_resp: HsKeyResponse = decode(&key_resp_payload);

    downloader.dispatch(
        seeder_addr,
        opcodes::KEY_RESPONSE,
        &encode(&key_resp),
        MessageContext::FromCircuit(key_req_cid),
    );
    let (_, _, _, create_e2e_payload) = downloader_rec.lock().unwrap().tunneled.last().unwrap().clone();
    let create_e2e: HsCreateE2e = decode(&create_e2e_payload);

    // Phase D: the seeder builds its rendezvous-point circuit and, once told
    // it landed, completes the DH exchange and hands back created-e2e.
    seeder.dispatch(
        seeder_addr,
        opcodes::CREATE_E2E,
        &encode(&create_e2e),
        MessageContext::FromCircuit(ip_cid),
    );
    let (seeder_rp_cid, _, establish_rv_payload) = seeder_rec.lock().unwrap().sent.last().unwrap().clone();
    let establish_rv: HsEstablishRendezvous = decode(&establish_rv_payload);

    seeder.dispatch(
        rp_addr,
        opcodes::RENDEZVOUS_ESTABLISHED,
        &encode(&HsRendezvousEstablished { id: establish_rv.id, rp_addr: rp_addr.to_string() }),
        MessageContext::FromCircuit(seeder_rp_cid),
    );
    let (_, _, created_e2e_payload) = seeder_rec.lock().unwrap().sent.last().unwrap().clone();
    let created_e2e: HsCreatedE2e = decode(&created_e2e_payload);

    // Phase E: the downloader's rendezvous circuit comes up (pinned, in a
    // real substrate, to the node `created_e2e`'s decrypted rp_info named)
    // and it sends link-e2e.
    downloader.dispatch(
        seeder_addr,
        opcodes::CREATED_E2E,
        &encode(&created_e2e),
        MessageContext::FromCircuit(key_req_cid),
    );
    let (downloader_rp_cid, _, link_payload) = downloader_rec.lock().unwrap().sent.last().unwrap().clone();
    let link: HsLinkE2e = decode(&link_payload);
    assert_eq!(link.cookie, establish_rv.cookie);

    // The rendezvous point sees both legs arrive as distinct circuits and
    // splices them once the cookie matches.
    let rp_seeder_leg = admit_inbound_circuit(&rp_rec, [0xAAu8; 32]);
    rendezvous_point.dispatch(
        seeder_addr,
        opcodes::ESTABLISH_RENDEZVOUS,
        &encode(&HsEstablishRendezvous { id: establish_rv.id, cookie: establish_rv.cookie }),
        MessageContext::FromCircuit(rp_seeder_leg),
    );

    let rp_downloader_leg = admit_inbound_circuit(&rp_rec, [0xBBu8; 32]);
    rendezvous_point.dispatch(
        downloader_addr,
        opcodes::LINK_E2E,
        &encode(&link),
        MessageContext::FromCircuit(rp_downloader_leg),
    );

    assert_eq!(rp_rec.lock().unwrap().spliced, vec![(rp_downloader_leg, rp_seeder_leg)]);
    let (_, _, linked_payload) = rp_rec.lock().unwrap().sent.last().unwrap().clone();
    let linked: HsLinkedE2e = decode(&linked_payload);

    downloader.dispatch(
        rp_addr,
        opcodes::LINKED_E2E,
        &encode(&linked),
        MessageContext::FromCircuit(downloader_rp_cid),
    );

    let endpoint = linked_endpoint.lock().unwrap().expect("downloader's service callback must have fired");
    assert_eq!(endpoint.1, ochra_hidden_service::CIRCUIT_ID_PORT);
}
