//! Epoch boundary processing (Section 18.6).
//!
//! All periodic operations execute at epoch boundaries (00:00 UTC).
//! This module manages the epoch scheduler.

use tracing::info;

/// Epoch duration in seconds (24 hours).
pub const EPOCH_DURATION_SECS: u64 = 24 * 60 * 60;

/// Relay epoch duration in seconds (1 hour).
pub const RELAY_EPOCH_DURATION_SECS: u64 = 60 * 60;

/// Get the current network epoch number.
pub fn current_epoch() -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    now / EPOCH_DURATION_SECS
}

/// Get the current relay epoch number.
pub fn current_relay_epoch() -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    now / RELAY_EPOCH_DURATION_SECS
}

/// Get seconds until the next epoch boundary.
#[allow(dead_code)]
pub fn seconds_until_next_epoch() -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    EPOCH_DURATION_SECS - (now % EPOCH_DURATION_SECS)
}

/// Get seconds until the next relay epoch boundary.
#[allow(dead_code)]
pub fn seconds_until_next_relay_epoch() -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    RELAY_EPOCH_DURATION_SECS - (now % RELAY_EPOCH_DURATION_SECS)
}

/// Epoch boundary operations to execute (Section 18.6).
///
/// These run in defined order at each epoch boundary:
/// 1. Relay key rotation
/// 2. PoSrv score calculation
/// 3. Service receipt batching
/// 4. Minting proof generation
/// 5. Nullifier set pruning
/// 6. VYS reward distribution
/// 7. DHT record republishing
/// 8. Circuit rotation
/// 9. ABR replication check
/// 10. Cover traffic rate adjustment
/// 11. Handle refresh
/// 12. Guardian heartbeat check
/// 13. Timelock expiry check
/// 14. Metrics aggregation
/// 15. Database WAL checkpoint
#[allow(dead_code)]
pub async fn run_epoch_boundary() {
    let epoch = current_epoch();
    info!(epoch, "Running epoch boundary operations");

    // Each step would invoke the appropriate subsystem.
    // For v1, these are stubs that will be connected as subsystems are built.

    info!(epoch, "Epoch boundary operations complete");
}
