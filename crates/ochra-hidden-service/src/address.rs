//! The `circuit_id <-> dotted-quad` loopback address encoding.
//!
//! Once a hidden-service data path is spliced, upper layers address it as if
//! it were a normal socket: `(circuit_id_to_ip(cid), CIRCUIT_ID_PORT)`. This
//! lets application code that only knows how to open a TCP/UDP socket reuse
//! that code path against a circuit it has never heard of.

use std::net::Ipv4Addr;

use crate::CIRCUIT_ID_PORT;

/// Encode a 32-bit circuit id as a dotted-quad IPv4 address (big-endian).
pub fn circuit_id_to_ip(cid: u32) -> Ipv4Addr {
    Ipv4Addr::from(cid.to_be_bytes())
}

/// Decode a dotted-quad IPv4 address back into its circuit id.
pub fn ip_to_circuit_id(ip: Ipv4Addr) -> u32 {
    u32::from_be_bytes(ip.octets())
}

/// Build the synthetic `(ip, port)` endpoint passed to a service callback
/// once `on_linked_e2e` completes.
pub fn circuit_id_to_endpoint(cid: u32) -> (Ipv4Addr, u16) {
    (circuit_id_to_ip(cid), CIRCUIT_ID_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_various_ids() {
        for cid in [0u32, 1, 0xFFFF_FFFF, 0x0A00_0001, 0xC0A8_0101, 12345678] {
            let ip = circuit_id_to_ip(cid);
            assert_eq!(ip_to_circuit_id(ip), cid, "roundtrip failed for {cid}");
        }
    }

    #[test]
    fn test_known_encoding() {
        // 1 -> 0.0.0.1
        assert_eq!(circuit_id_to_ip(1), Ipv4Addr::new(0, 0, 0, 1));
        // 0x0A000001 -> 10.0.0.1
        assert_eq!(circuit_id_to_ip(0x0A00_0001), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_endpoint_uses_sentinel_port() {
        let (_, port) = circuit_id_to_endpoint(42);
        assert_eq!(port, CIRCUIT_ID_PORT);
    }
}
