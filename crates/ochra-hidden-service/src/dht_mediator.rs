//! Phase B's DHT mediator: `dht_lookup`/`dht_announce` delegate to a
//! [`DhtProvider`] if one is configured. Absence of a provider is logged, not
//! an error — the hidden-service protocol degrades to "discoverable only via
//! peer exchange" rather than failing outright when a node runs without DHT
//! access.

use crate::lookup::LookupId;
use crate::substrate::DhtProvider;
use crate::Result;
use std::net::SocketAddr;

/// Resolve the peer set announced under `lookup_id` through `provider`, if
/// any is configured.
pub fn dht_lookup<D: DhtProvider>(
    provider: Option<&mut D>,
    lookup_id: LookupId,
) -> Result<Option<Vec<(SocketAddr, [u8; 32])>>> {
    match provider {
        Some(provider) => provider.lookup(lookup_id),
        None => {
            tracing::debug!("dht lookup skipped, no provider configured");
            Ok(None)
        }
    }
}

/// Publish or refresh the local announcement for `lookup_id` through
/// `provider`, if any is configured.
pub fn dht_announce<D: DhtProvider>(provider: Option<&mut D>, lookup_id: LookupId) -> Result<()> {
    match provider {
        Some(provider) => provider.announce(lookup_id),
        None => {
            tracing::debug!("dht announce skipped, no provider configured");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::test_support::MockDht;

    fn addr() -> SocketAddr {
        "127.0.0.1:9001".parse().unwrap()
    }

    #[test]
    fn test_lookup_without_provider_returns_none() {
        let result = dht_lookup::<MockDht>(None, [1u8; 20]);
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_announce_without_provider_is_ok() {
        let result = dht_announce::<MockDht>(None, [1u8; 20]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_lookup_with_provider_delegates() {
        let mut dht = MockDht::new((addr(), [9u8; 32]));
        dht.announce([2u8; 20]).unwrap();

        let peers = dht_lookup(Some(&mut dht), [2u8; 20]).unwrap().unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].0, addr());
    }
}
