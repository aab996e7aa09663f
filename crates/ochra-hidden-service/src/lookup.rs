//! `ServiceId` and `LookupId`: the opaque service identifier and its
//! DHT/wire-visible derivative.
//!
//! `ServiceId` is a raw 20-byte identifier chosen by the seeder (the same
//! width as a BitTorrent infohash, since the on-wire DHT convention this
//! protocol piggybacks on is infohash-shaped). Every DHT record key and every
//! on-wire reference uses [`LookupId`] instead of the raw `ServiceId` — the
//! seeder never publishes the identifier a downloader entered directly, only
//! its SHA-1 derivative.

use sha1::{Digest, Sha1};

/// Opaque 20-byte service identifier, chosen by the seeder.
pub type ServiceId = [u8; 20];

/// SHA-1 derivative of a `ServiceId`, used in all DHT keys and on-wire fields.
pub type LookupId = [u8; 20];

/// The fixed domain-separation prefix mixed into every `LookupId` derivation.
const LOOKUP_PREFIX: &[u8] = b"tribler anonymous download";

/// Derive the `LookupId` for a `ServiceId`.
///
/// `LookupId = SHA1(b"tribler anonymous download" || hex(service_id))`, where
/// `hex(service_id)` is the lowercase hex encoding of the 20 raw bytes (40
/// ASCII characters). The hex step is not a typo carried over from the
/// original format: the prefix and the hex-encoded id are concatenated as
/// ASCII, not as raw bytes, so changing it would silently produce a
/// different `LookupId` for every existing service.
pub fn service_id_to_lookup_id(service_id: &ServiceId) -> LookupId {
    let hex_id = hex::encode(service_id);
    let mut hasher = Sha1::new();
    hasher.update(LOOKUP_PREFIX);
    hasher.update(hex_id.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_id_known_vector() {
        // S2: service = 0x41 repeated 20 times.
        let service_id = [0x41u8; 20];
        let lookup_id = service_id_to_lookup_id(&service_id);

        let hex_id = "41".repeat(20);
        let mut hasher = Sha1::new();
        hasher.update(LOOKUP_PREFIX);
        hasher.update(hex_id.as_bytes());
        let expected = hasher.finalize();

        assert_eq!(lookup_id.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_lookup_id_deterministic() {
        let service_id = [0x07u8; 20];
        assert_eq!(
            service_id_to_lookup_id(&service_id),
            service_id_to_lookup_id(&service_id)
        );
    }

    #[test]
    fn test_lookup_id_sensitive_to_input() {
        let a = service_id_to_lookup_id(&[0x01u8; 20]);
        let b = service_id_to_lookup_id(&[0x02u8; 20]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_lookup_id_length() {
        let lookup_id = service_id_to_lookup_id(&[0xAAu8; 20]);
        assert_eq!(lookup_id.len(), 20);
    }
}
