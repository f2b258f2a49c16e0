//! Percentage-of-capacity sizing for partitions and logical volumes

use crate::error::ProvisionError;
use host_config::Percentage;

/// Bytes kept back from every disk and volume group for partition-table overhead
pub const RESERVED_BYTES: u64 = 15_728_640;

/// Capacity left once the reservation is taken off
pub fn usable_capacity(capacity: u64) -> u64 {
    capacity.saturating_sub(RESERVED_BYTES)
}

/// `floor(percentage * (capacity - RESERVED_BYTES) / 100)`
pub fn scaled_size(percentage: Percentage, capacity: u64) -> u64 {
    let bytes = u128::from(percentage.value()) * u128::from(usable_capacity(capacity)) / 100;
    u64::try_from(bytes).unwrap_or(u64::MAX)
}

/// Parse a declared size and scale it against `capacity`
///
/// `entry` names the disk or volume the size belongs to.
pub fn size_for(entry: &str, size: &str, capacity: u64) -> Result<u64, ProvisionError> {
    let percentage = Percentage::parse(entry, size)?;
    Ok(scaled_size(percentage, capacity))
}
