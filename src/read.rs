//! Read-path validation, including cross-zone traversal.

use crate::config::Geometry;
use crate::error::{ZnsStatus, ZnsStatusCode};
use crate::zone::Zone;

/// Validates a read of `nlb` blocks starting at `lba` against the namespace's zones.
///
/// A read may span multiple zones only when the namespace was configured with
/// `cross_zone_read`; every zone touched by the range must be individually
/// readable (not OFFLINE), matching the per-zone state check the original
/// device performs while walking the traversed range.
pub fn validate_read(geometry: &Geometry, zones: &[Zone], lba: u64, nlb: u64) -> Result<(), ZnsStatus> {
    if nlb == 0 {
        return Ok(());
    }

    if nlb * geometry.lba_size as u64 > geometry.mdts_bytes {
        return Err(ZnsStatus::new(ZnsStatusCode::InvalidField));
    }

    let last_lba = lba + nlb - 1;
    if last_lba >= geometry.nsze {
        return Err(ZnsStatus::new(ZnsStatusCode::LbaRange));
    }

    let start_idx = geometry.zone_idx(lba) as usize;
    let end_idx = geometry.zone_idx(last_lba) as usize;

    if start_idx != end_idx && !geometry.cross_zone_read {
        return Err(ZnsStatus::new(ZnsStatusCode::ZoneBoundaryError));
    }

    for zone in &zones[start_idx..=end_idx] {
        if !zone.state.is_readable() {
            return Err(ZnsStatus::new(ZnsStatusCode::ZoneOffline));
        }
    }

    Ok(())
}
