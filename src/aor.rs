//! Active-and-Open-Resource (AOR) admission control.

use crate::config::Geometry;
use crate::error::{ZnsStatus, ZnsStatusCode};
use crate::membership::ZoneLists;
use crate::zone::ZoneState;

/// Checks whether admitting a state change with the given active/open deltas
/// would exceed the namespace's configured limits.
///
/// A zero limit means unlimited, matching the geometry validation in
/// [`crate::config`] which allows `max_active_zones`/`max_open_zones` of 0.
/// Returns `Ok(())` when admission succeeds (after performing any needed
/// auto-eviction), or the status to report to the host otherwise.
pub fn aor_check(
    geometry: &Geometry,
    lists: &mut ZoneLists,
    act_delta: i32,
    opn_delta: i32,
) -> Result<(), ZnsStatus> {
    if act_delta > 0
        && geometry.max_active_zones != 0
        && lists.nr_active_zones() + act_delta as u32 > geometry.max_active_zones
    {
        return Err(ZnsStatus::new(ZnsStatusCode::ZoneTooManyActive));
    }

    if opn_delta > 0
        && geometry.max_open_zones != 0
        && lists.nr_open_zones() + opn_delta as u32 > geometry.max_open_zones
    {
        if auto_evict(lists) {
            tracing::debug!("auto-evicted implicitly open zone to admit new open zone");
        } else {
            return Err(ZnsStatus::new(ZnsStatusCode::ZoneTooManyOpen));
        }
    }

    Ok(())
}

/// Closes the least-recently-opened implicitly-open zone to make room for a new one.
///
/// Returns `false` when there is no implicitly-open zone to evict (every open zone
/// was explicitly opened, which per spec may not be auto-evicted).
fn auto_evict(lists: &mut ZoneLists) -> bool {
    match lists.first_implicitly_open() {
        Some(idx) => {
            lists.transition(idx, ZoneState::ImplicitlyOpen, ZoneState::Closed);
            true
        }
        None => false,
    }
}
