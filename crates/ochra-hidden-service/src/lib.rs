//! # ochra-hidden-service
//!
//! Hidden-service overlay for the Ochra P2P network: a seeder publishes a
//! service behind an opaque identifier, a downloader discovers and connects
//! to it through a rendezvous path such that neither end learns the other's
//! network address.
//!
//! This crate implements the five-phase hidden-service protocol on top of an
//! onion tunnel substrate and a DHT provider, both consumed through trait
//! contracts ([`substrate::CircuitSubstrate`], [`substrate::DhtProvider`])
//! rather than concrete dependencies on `ochra-onion`/`ochra-dht` internals:
//!
//! - [`lookup`] — `ServiceId`/`LookupId` and the SHA-1 derivation between them
//! - [`cache`] — request/response correlation cache, one entry per in-flight step
//! - [`session`] — per-service long-lived keypair and per-circuit session-key quads
//! - [`tables`] — service/relay/downloader bookkeeping tables
//! - [`blacklist`] — 60-second DHT rediscovery blacklist
//! - [`address`] — the `circuit_id <-> dotted-quad` loopback address encoding
//! - [`substrate`] — the consumed `CircuitSubstrate`/`DhtProvider` contracts
//!   plus an in-memory `DhtKademliaProvider` built on `ochra_dht`
//! - [`dht_mediator`] — thin lookup/announce wrapper around an optional
//!   [`substrate::DhtProvider`]
//! - [`engine`] — the protocol state machine itself
//!
//! ## Phases
//!
//! A: introduction-point establishment. B: DHT lookup/announce. C: key
//! request/response with peer exchange. D: end-to-end Diffie-Hellman and
//! rendezvous-point establishment. E: link and splice.

pub mod address;
pub mod blacklist;
pub mod cache;
pub mod dht_mediator;
pub mod engine;
pub mod lookup;
pub mod session;
pub mod substrate;
pub mod tables;

/// A substrate-assigned circuit identifier.
pub type CircuitId = u32;

/// A 20-byte rendezvous cookie, matching `ochra_invite::rendezvous::RendezvousCookie`
/// in shape but generalized here to drive a full circuit splice.
pub type Cookie = [u8; 20];

/// Invoked once a data path to a service opens, with the synthetic
/// `(ip, port)` endpoint upper layers can dial. Registered per `LookupId`
/// by whichever side is responsible for it: `engine::HiddenServiceEngine::register_service`
/// on the seeder's side, `engine::HiddenServiceEngine::do_dht_lookup` on the
/// downloader's.
pub type ServiceCallback = Box<dyn FnMut((std::net::Ipv4Addr, u16)) + Send>;

/// Number of peer-exchange entries carried in a single `key-response`, and the
/// cap enforced on the receiving side's per-service PEX set.
pub const PEX_CAP: usize = 50;

/// Window during which a contacted DHT peer is excluded from rediscovery.
pub const DHT_BLACKLIST_SECS: u64 = 60;

/// Timeout for `IPRequest`/`RPRequest` cache entries.
pub const IP_RP_TIMEOUT_SECS: u64 = 20;

/// Timeout for all other cache entry kinds (key/e2e/link/DHT).
pub const DEFAULT_CACHE_TIMEOUT_SECS: u64 = 60;

/// Fixed sentinel port used by [`address::circuit_id_to_ip`]'s synthetic
/// endpoint: upper layers address an open hidden-service data path as if it
/// were a normal socket at `(circuit_id_to_ip(cid), CIRCUIT_ID_PORT)`.
pub const CIRCUIT_ID_PORT: u16 = 7759;

/// Errors surfaced by the hidden-service engine.
///
/// Per the protocol's error-handling design, the overwhelming majority of
/// these are *recovered locally*: a handler that would otherwise return one
/// of these logs it via [`engine::log_and_drop`] and drops the message. Only
/// the handful of constructive, caller-initiated operations
/// (`register_service`, `do_dht_lookup`, `create_key_request`, `create_e2e`,
/// `create_link_e2e`) propagate a `Result` to their caller.
#[derive(Debug, thiserror::Error)]
pub enum HiddenServiceError {
    /// No circuit of the requested shape was available from the substrate.
    #[error("no circuit available")]
    NoCircuitAvailable,

    /// A `(kind, id)` pair referenced in an inbound message has no matching
    /// cache entry (stale, already popped, or never existed).
    #[error("unknown identifier")]
    UnknownIdentifier,

    /// The local node does not serve the referenced `info_hash`.
    #[error("not serving this service")]
    NotServing,

    /// The local node is not acting as an introduction point for this service.
    #[error("not an introduction point for this service")]
    NotAnIntroPoint,

    /// The local node is not acting as a rendezvous point for this cookie.
    #[error("not a rendezvous point for this cookie")]
    NotARendezvousPoint,

    /// Splicing failed because one of the two legs already has an active
    /// data-plane exit socket.
    #[error("exit socket busy, cannot splice")]
    ExitSocketBusy,

    /// No DHT provider is configured, or the provider reported unavailability.
    #[error("DHT unavailable")]
    DhtUnavailable,

    /// An end-to-end Diffie-Hellman MAC or ECIES authentication check failed.
    #[error("cryptographic verification failed")]
    CryptoVerificationFailed,

    /// Passthrough from the cryptography layer.
    #[error("crypto error: {0}")]
    Crypto(#[from] ochra_crypto::CryptoError),

    /// Passthrough from the wire/serialization layer.
    #[error("transport error: {0}")]
    Transport(#[from] ochra_transport::TransportError),

    /// Passthrough from the DHT provider's storage layer.
    #[error("dht error: {0}")]
    Dht(#[from] ochra_dht::DhtError),
}

/// Convenience result type for hidden-service operations.
pub type Result<T> = std::result::Result<T, HiddenServiceError>;

/// Tunable parameters for a [`engine::HiddenServiceEngine`].
///
/// No user-facing configuration is exposed by this crate; `EngineConfig` is
/// constructed by the embedding daemon, mirroring how `ochra-onion` exposes
/// its hop count and circuit lifetime as plain constants rather than runtime
/// knobs.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Maximum PEX entries carried per `key-response`, and enforced as a cap
    /// on the receiving side's per-service PEX set.
    pub pex_cap: usize,
    /// Default number of introduction points a freshly registered service
    /// establishes if the caller does not specify one.
    pub default_n_intros: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pex_cap: PEX_CAP,
            default_n_intros: 3,
        }
    }
}
