//! Decay, slash, and CR formula for VYS rewards.
//!
//! Unclaimed rewards decay over time to incentivize regular claiming.
//! Nodes that misbehave can be slashed, reducing their accumulated rewards.

use crate::accounting::VysAccumulator;

/// Decay rate per epoch (0.1% per epoch).
pub const DECAY_RATE_PER_EPOCH: f64 = 0.001;

/// Apply decay to an accumulator's rewards.
///
/// Reduces accumulated rewards by the given decay rate:
/// `new_rewards = rewards * (1 - decay_rate)`
///
/// # Arguments
///
/// * `accumulator` - The accumulator to decay
/// * `decay_rate` - The fraction to decay (e.g., 0.001 for 0.1%)
pub fn apply_decay(accumulator: &mut VysAccumulator, decay_rate: f64) {
    let current = accumulator.accumulated_rewards;
    let decay_amount = (current as f64 * decay_rate) as u64;
    accumulator.accumulated_rewards = current.saturating_sub(decay_amount);

    tracing::trace!(
        decay_amount,
        remaining = accumulator.accumulated_rewards,
        "VYS: applied decay"
    );
}

/// Apply a slash to an accumulator's rewards.
///
/// Reduces accumulated rewards by the given fraction:
/// `new_rewards = rewards * (1 - slash_fraction)`
///
/// # Arguments
///
/// * `accumulator` - The accumulator to slash
/// * `slash_fraction` - The fraction to slash (e.g., 0.5 for 50%)
pub fn apply_slash(accumulator: &mut VysAccumulator, slash_fraction: f64) {
    let current = accumulator.accumulated_rewards;
    let slash_amount = (current as f64 * slash_fraction.clamp(0.0, 1.0)) as u64;
    accumulator.accumulated_rewards = current.saturating_sub(slash_amount);

    tracing::warn!(
        slash_amount,
        slash_fraction,
        remaining = accumulator.accumulated_rewards,
        "VYS: applied slash"
    );
}

/// Apply the default per-epoch decay to an accumulator.
pub fn apply_epoch_decay(accumulator: &mut VysAccumulator) {
    apply_decay(accumulator, DECAY_RATE_PER_EPOCH);
}
