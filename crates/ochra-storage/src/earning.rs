//! Earning levels for ABR storage allocation.
//!
//! Nodes participating in ABR storage contribute disk space to the network
//! and are rewarded based on their earning level. Each level specifies
//! a target storage allocation.

use serde::{Deserialize, Serialize};

/// Bytes per gigabyte.
const BYTES_PER_GB: u64 = 1_073_741_824;

/// Storage earning level.
///
/// Determines how much disk space a node allocates for ABR storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarningLevel {
    /// Low allocation: 5 GB.
    Low,
    /// Medium allocation: 25 GB.
    Medium,
    /// High allocation: 100 GB.
    High,
    /// Custom allocation in bytes.
    Custom(u64),
}

/// Get the storage allocation in bytes for a given earning level.
///
/// # Arguments
///
/// * `level` - The earning level.
///
/// # Returns
///
/// The number of bytes allocated for ABR storage.
pub fn get_allocation_bytes(level: &EarningLevel) -> u64 {
    match level {
        EarningLevel::Low => 5 * BYTES_PER_GB,
        EarningLevel::Medium => 25 * BYTES_PER_GB,
        EarningLevel::High => 100 * BYTES_PER_GB,
        EarningLevel::Custom(bytes) => *bytes,
    }
}

/// Get the storage allocation in gigabytes for a given earning level.
///
/// For custom levels, returns the allocation rounded down to whole gigabytes.
pub fn get_allocation_gb(level: &EarningLevel) -> u64 {
    get_allocation_bytes(level) / BYTES_PER_GB
}

/// Get a human-readable name for the earning level.
pub fn level_name(level: &EarningLevel) -> &'static str {
    match level {
        EarningLevel::Low => "Low (5 GB)",
        EarningLevel::Medium => "Medium (25 GB)",
        EarningLevel::High => "High (100 GB)",
        EarningLevel::Custom(_) => "Custom",
    }
}
