//! End-to-end Diffie-Hellman and the session-key quad it produces.
//!
//! Phase D establishes a shared secret between downloader and seeder without
//! either learning the other's network address: the downloader sends a
//! fresh X25519 public key (`first_part`) through the introduction point,
//! the seeder answers with its own ephemeral public key and a MAC over both,
//! and from the resulting shared secret both sides derive the same quad of
//! domain-separated half-keys used to encrypt the rest of the exchange.

use ochra_crypto::blake3::contexts;
use ochra_crypto::blake3::{derive_key, keyed_hash};
use ochra_crypto::chacha20;
use ochra_crypto::x25519::{X25519PublicKey, X25519StaticSecret};

use crate::{HiddenServiceError, Result};

/// The four domain-separated half-keys derived from an end-to-end shared
/// secret, mirroring the quad the original protocol uses for bidirectional
/// circuit-splice encryption.
#[derive(Clone)]
pub struct SessionKeys {
    /// Client-to-node half-key: downloader encrypts traffic to the seeder.
    pub client_node: [u8; 32],
    /// Client-to-relay half-key: downloader encrypts traffic to the rendezvous relay.
    pub client_relay: [u8; 32],
    /// Exit-node half-key: seeder encrypts `rp_info`/response traffic back.
    pub exit_node: [u8; 32],
    /// Exit-relay half-key: seeder's traffic to the rendezvous relay.
    pub exit_relay: [u8; 32],
}

impl SessionKeys {
    /// Derive the quad from a raw end-to-end shared secret.
    pub fn derive(shared: &[u8; 32]) -> Self {
        Self {
            client_node: derive_key(contexts::HS_E2E_C2S, shared),
            client_relay: derive_key(contexts::HS_E2E_S2C, shared),
            exit_node: derive_key(contexts::HS_E2E_EXIT_ENC, shared),
            exit_relay: derive_key(contexts::HS_E2E_EXIT_MAC, shared),
        }
    }
}

/// The outcome of the seeder's side of the end-to-end DH, computed by
/// [`dh_verify_and_respond`].
pub struct DhResponse {
    /// The seeder's fresh ephemeral public key, sent back as `Y`.
    pub y: X25519PublicKey,
    /// The MAC proving the seeder derived the same shared secret, sent back
    /// as `AUTH`.
    pub auth: [u8; 32],
    /// The derived session-key quad.
    pub session_keys: SessionKeys,
}

fn auth_key(shared: &[u8; 32], service_pubkey: &[u8; 32]) -> [u8; 32] {
    let mut material = Vec::with_capacity(64);
    material.extend_from_slice(shared);
    material.extend_from_slice(service_pubkey);
    derive_key(contexts::HS_E2E_AUTH, &material)
}

fn auth_tag(k_auth: &[u8; 32], first_part: &[u8; 32], y: &X25519PublicKey) -> [u8; 32] {
    let mut message = Vec::with_capacity(64);
    message.extend_from_slice(first_part);
    message.extend_from_slice(y.as_bytes());
    keyed_hash(k_auth, &message)
}

/// Seeder's side of the end-to-end DH: given the downloader's ephemeral
/// public key (`first_part`) and the service's long-lived X25519 keypair,
/// generate a fresh ephemeral keypair, compute the shared secret, and
/// authenticate the exchange.
///
/// `service_pubkey` is mixed into the AUTH key so a MAC computed for one
/// service cannot be replayed against another sharing the same ephemeral
/// material.
pub fn dh_verify_and_respond(
    first_part: &X25519PublicKey,
    service_pubkey: &X25519PublicKey,
) -> DhResponse {
    let ephemeral = X25519StaticSecret::random();
    let y = ephemeral.public_key();
    let shared = *ephemeral.diffie_hellman(first_part).as_bytes();

    let k_auth = auth_key(&shared, service_pubkey.as_bytes());
    let auth = auth_tag(&k_auth, first_part.as_bytes(), &y);

    DhResponse {
        y,
        auth,
        session_keys: SessionKeys::derive(&shared),
    }
}

/// Downloader's side: given its own ephemeral secret, the seeder's reply
/// `(Y, AUTH)`, and the service's long-lived public key, recompute the
/// shared secret and verify `AUTH` before trusting the session keys.
pub fn dh_verify_response(
    local_secret: &X25519StaticSecret,
    first_part: &X25519PublicKey,
    service_pubkey: &X25519PublicKey,
    y: &X25519PublicKey,
    auth: &[u8; 32],
) -> Result<SessionKeys> {
    let shared = *local_secret.diffie_hellman(y).as_bytes();
    let k_auth = auth_key(&shared, service_pubkey.as_bytes());
    let expected = auth_tag(&k_auth, first_part.as_bytes(), y);

    if !constant_time_eq(&expected, auth) {
        return Err(HiddenServiceError::CryptoVerificationFailed);
    }

    Ok(SessionKeys::derive(&shared))
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Rendezvous-point info handed from seeder to downloader, encrypted under
/// the `exit_node` half-key so only the downloader can read where the
/// seeder's RP circuit landed.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RpInfo {
    pub ip: std::net::Ipv4Addr,
    pub port: u16,
    pub last_hop_pubkey: [u8; 32],
}

/// Encrypt `(rp_info, cookie)` under the exit-node half-key.
///
/// Uses a fixed all-zero nonce: `exit_node` is a single-use key derived
/// fresh from a unique ephemeral DH exchange for this one message, so nonce
/// reuse under the same key cannot occur.
pub fn encrypt_rp_info(
    exit_node_key: &[u8; 32],
    rp_info: &RpInfo,
    cookie: &crate::Cookie,
) -> Result<Vec<u8>> {
    let plaintext = ochra_transport::cbor::to_vec(&(rp_info, cookie))?;
    let nonce = [0u8; chacha20::NONCE_SIZE];
    let ciphertext = chacha20::encrypt(exit_node_key, &nonce, &plaintext, b"hs-rp-info")?;
    Ok(ciphertext)
}

/// Decrypt `(rp_info, cookie)` previously produced by [`encrypt_rp_info`].
pub fn decrypt_rp_info(
    exit_node_key: &[u8; 32],
    ciphertext: &[u8],
) -> Result<(RpInfo, crate::Cookie)> {
    let nonce = [0u8; chacha20::NONCE_SIZE];
    let plaintext = chacha20::decrypt(exit_node_key, &nonce, ciphertext, b"hs-rp-info")?;
    let (rp_info, cookie) = ochra_transport::cbor::from_slice(&plaintext)?;
    Ok((rp_info, cookie))
}
