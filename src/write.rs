//! Write and zone-append admission and finalization.
//!
//! Mirrors the original device's split between reservation and finalization:
//! a write is validated and admitted against `w_ptr` (advancing it immediately,
//! so a second concurrent write targeting the same zone sees the reservation),
//! then finalized against `wp` once the backend I/O actually completes. The gap
//! between the two is what [`crate::zone::Zone::has_in_flight_write`] detects.

use crate::aor::aor_check;
use crate::config::Geometry;
use crate::error::{ZnsStatus, ZnsStatusCode};
use crate::membership::ZoneLists;
use crate::zone::{Zone, ZoneState};

/// A validated write request, prior to admission.
#[derive(Debug, Clone, Copy)]
pub struct WriteRequest {
    /// Starting LBA as given by the host.
    pub lba: u64,
    /// Number of logical blocks to transfer.
    pub nlb: u64,
    /// True for Zone Append, false for a regular Write.
    pub append: bool,
}

/// The result of admitting a write: where the backend should actually place the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteAdmission {
    /// The LBA the backend store should write to (equals `request.lba` for a
    /// regular write; equals the zone's write pointer at admission time for append).
    pub target_lba: u64,
}

/// Validates `request` against `zone`'s current state and write pointer, admits it
/// by advancing `w_ptr`, and returns where the data should land.
///
/// Does not touch `wp` or the zone's state beyond the implicit EMPTY/CLOSED ->
/// *_OPEN transition that AOR accounting requires at admission time; call
/// [`finalize_write`] once the backend I/O completes.
pub fn admit_write(
    zone: &mut Zone,
    lists: &mut ZoneLists,
    geometry: &Geometry,
    request: WriteRequest,
) -> Result<WriteAdmission, ZnsStatus> {
    if zone.has_in_flight_write() {
        return Err(ZnsStatus::new(ZnsStatusCode::ZoneBusy));
    }

    let len_bytes = request.nlb * geometry.lba_size as u64;
    if len_bytes > geometry.mdts_bytes {
        return Err(ZnsStatus::new(ZnsStatusCode::InvalidField));
    }

    if !zone.state.is_writable() {
        let code = match zone.state {
            ZoneState::Full => ZnsStatusCode::ZoneFull,
            ZoneState::ReadOnly => ZnsStatusCode::ZoneReadOnly,
            ZoneState::Offline => ZnsStatusCode::ZoneOffline,
            _ => unreachable!("is_writable() false but no matching terminal state"),
        };
        return Err(ZnsStatus::new(code));
    }

    let target_lba = if request.append {
        if request.lba != zone.zslba {
            return Err(ZnsStatus::new(ZnsStatusCode::ZoneInvalidWrite));
        }
        if len_bytes > geometry.zasl_bytes() {
            return Err(ZnsStatus::new(ZnsStatusCode::InvalidField));
        }
        zone.w_ptr
    } else {
        if request.lba != zone.w_ptr {
            return Err(ZnsStatus::new(ZnsStatusCode::ZoneInvalidWrite));
        }
        request.lba
    };

    if target_lba + request.nlb > zone.write_boundary() {
        return Err(ZnsStatus::new(ZnsStatusCode::ZoneBoundaryError));
    }

    let was_empty = zone.state == ZoneState::Empty;
    let was_closed = zone.state == ZoneState::Closed;
    if was_empty {
        aor_check(geometry, lists, 1, 1)?;
    } else if was_closed {
        aor_check(geometry, lists, 0, 1)?;
    }

    if was_empty || was_closed {
        lists.transition(zone.idx, zone.state, ZoneState::ImplicitlyOpen);
        zone.state = ZoneState::ImplicitlyOpen;
    }

    zone.w_ptr += request.nlb;

    tracing::debug!(
        zone = zone.idx,
        target_lba,
        nlb = request.nlb,
        append = request.append,
        "write admitted"
    );

    Ok(WriteAdmission { target_lba })
}

/// Advances `wp` to catch up with an admitted write's reservation, and finishes
/// the zone if the write pointer reached the zone's writable boundary.
pub fn finalize_write(zone: &mut Zone, lists: &mut ZoneLists, nlb: u64) {
    zone.wp += nlb;
    debug_assert!(zone.wp <= zone.w_ptr, "write pointer overran reservation pointer");

    if zone.wp == zone.write_boundary() {
        lists.transition(zone.idx, zone.state, ZoneState::Full);
        zone.state = ZoneState::Full;
    }
}
