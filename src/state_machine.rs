//! Explicit zone-management state transitions: OPEN, CLOSE, FINISH, RESET,
//! OFFLINE, and SET_ZD_EXT.

use crate::aor::aor_check;
use crate::config::Geometry;
use crate::error::{ZnsStatus, ZnsStatusCode};
use crate::membership::ZoneLists;
use crate::zone::{Zone, ZoneState};

/// A zone-management action, as selected by the Zone Management Send command's
/// Zone Send Action field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneAction {
    /// Explicitly open a zone.
    Open,
    /// Close an open zone.
    Close,
    /// Finish a zone: mark it FULL and advance its write pointer to the boundary.
    Finish,
    /// Reset a zone to EMPTY, discarding all written data.
    Reset,
    /// Transition a READ_ONLY zone to OFFLINE.
    Offline,
    /// Mark the zone's descriptor extension slot valid.
    SetZdExt,
}

/// Applies `action` to `zone`, updating membership lists and AOR counters as needed.
///
/// A zone with an in-flight write (submitted but not yet finalized) rejects every
/// management action with [`ZnsStatusCode::ZoneBusy`]: none of these transitions are
/// safe to apply while `wp` and `w_ptr` disagree.
pub fn apply_action(
    zone: &mut Zone,
    lists: &mut ZoneLists,
    geometry: &Geometry,
    action: ZoneAction,
) -> Result<(), ZnsStatus> {
    if zone.has_in_flight_write() {
        return Err(ZnsStatus::new(ZnsStatusCode::ZoneBusy));
    }

    match action {
        ZoneAction::Open => open_zone(zone, lists, geometry),
        ZoneAction::Close => close_zone(zone, lists),
        ZoneAction::Finish => finish_zone(zone, lists),
        ZoneAction::Reset => reset_zone(zone, lists),
        ZoneAction::Offline => offline_zone(zone, lists),
        ZoneAction::SetZdExt => set_zd_ext(zone),
    }
}

fn invalid_transition() -> Result<(), ZnsStatus> {
    Err(ZnsStatus::new(ZnsStatusCode::ZoneInvalTransition))
}

fn open_zone(zone: &mut Zone, lists: &mut ZoneLists, geometry: &Geometry) -> Result<(), ZnsStatus> {
    match zone.state {
        ZoneState::ExplicitlyOpen => Ok(()),
        ZoneState::ImplicitlyOpen => {
            lists.transition(zone.idx, zone.state, ZoneState::ExplicitlyOpen);
            zone.state = ZoneState::ExplicitlyOpen;
            Ok(())
        }
        ZoneState::Empty => {
            aor_check(geometry, lists, 1, 1)?;
            lists.transition(zone.idx, zone.state, ZoneState::ExplicitlyOpen);
            zone.state = ZoneState::ExplicitlyOpen;
            Ok(())
        }
        ZoneState::Closed => {
            aor_check(geometry, lists, 0, 1)?;
            lists.transition(zone.idx, zone.state, ZoneState::ExplicitlyOpen);
            zone.state = ZoneState::ExplicitlyOpen;
            Ok(())
        }
        ZoneState::Full | ZoneState::ReadOnly | ZoneState::Offline => invalid_transition(),
    }
}

fn close_zone(zone: &mut Zone, lists: &mut ZoneLists) -> Result<(), ZnsStatus> {
    match zone.state {
        ZoneState::Closed => Ok(()),
        ZoneState::ImplicitlyOpen | ZoneState::ExplicitlyOpen => {
            lists.transition(zone.idx, zone.state, ZoneState::Closed);
            zone.state = ZoneState::Closed;
            Ok(())
        }
        ZoneState::Empty | ZoneState::Full | ZoneState::ReadOnly | ZoneState::Offline => {
            invalid_transition()
        }
    }
}

fn finish_zone(zone: &mut Zone, lists: &mut ZoneLists) -> Result<(), ZnsStatus> {
    match zone.state {
        ZoneState::Full => Ok(()),
        ZoneState::Empty | ZoneState::ImplicitlyOpen | ZoneState::ExplicitlyOpen | ZoneState::Closed => {
            lists.transition(zone.idx, zone.state, ZoneState::Full);
            zone.state = ZoneState::Full;
            zone.wp = zone.write_boundary();
            zone.w_ptr = zone.wp;
            Ok(())
        }
        ZoneState::ReadOnly | ZoneState::Offline => invalid_transition(),
    }
}

fn reset_zone(zone: &mut Zone, lists: &mut ZoneLists) -> Result<(), ZnsStatus> {
    match zone.state {
        ZoneState::Empty => Ok(()),
        ZoneState::ImplicitlyOpen | ZoneState::ExplicitlyOpen | ZoneState::Closed | ZoneState::Full => {
            lists.transition(zone.idx, zone.state, ZoneState::Empty);
            zone.state = ZoneState::Empty;
            zone.wp = zone.zslba;
            zone.w_ptr = zone.zslba;
            zone.za.clear();
            Ok(())
        }
        ZoneState::ReadOnly | ZoneState::Offline => invalid_transition(),
    }
}

fn offline_zone(zone: &mut Zone, lists: &mut ZoneLists) -> Result<(), ZnsStatus> {
    match zone.state {
        ZoneState::Offline => Ok(()),
        ZoneState::ReadOnly => {
            lists.transition(zone.idx, zone.state, ZoneState::Offline);
            zone.state = ZoneState::Offline;
            Ok(())
        }
        ZoneState::Empty
        | ZoneState::ImplicitlyOpen
        | ZoneState::ExplicitlyOpen
        | ZoneState::Closed
        | ZoneState::Full => invalid_transition(),
    }
}

/// Sets the zone descriptor extension's valid bit.
///
/// Permitted only on EMPTY or CLOSED zones. The extension bytes themselves are
/// copied into the namespace's extension buffer by the caller before this runs
/// (`Namespace::set_zone_descriptor_extension`); this function only flips the bit
/// once that copy has succeeded. Unlike the original device, this always returns
/// an unambiguous `Ok`/`Err` rather than silently no-opping on an unsupported state.
fn set_zd_ext(zone: &mut Zone) -> Result<(), ZnsStatus> {
    match zone.state {
        ZoneState::Empty | ZoneState::Closed => {
            zone.za.set_extension_valid();
            Ok(())
        }
        _ => invalid_transition(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry {
            lba_size: 4096,
            zone_size: 8,
            zone_capacity: 8,
            zone_size_log2: Some(3),
            num_zones: 4,
            nsze: 32,
            max_active_zones: 0,
            max_open_zones: 0,
            cross_zone_read: false,
            zd_extension_size: 0,
            zasl_log2: 1,
            page_size: 4096,
            mdts_bytes: 4096 * 32,
        }
    }

    #[test]
    fn test_open_from_empty() {
        let mut zone = Zone::new(0, 0, 8);
        let mut lists = ZoneLists::new(4);
        let geom = geometry();
        apply_action(&mut zone, &mut lists, &geom, ZoneAction::Open).unwrap();
        assert_eq!(zone.state, ZoneState::ExplicitlyOpen);
    }

    #[test]
    fn test_open_already_explicit_is_noop_ok() {
        let mut zone = Zone::new(0, 0, 8);
        let mut lists = ZoneLists::new(4);
        let geom = geometry();
        apply_action(&mut zone, &mut lists, &geom, ZoneAction::Open).unwrap();
        apply_action(&mut zone, &mut lists, &geom, ZoneAction::Open).unwrap();
        assert_eq!(zone.state, ZoneState::ExplicitlyOpen);
    }

    #[test]
    fn test_open_from_full_is_invalid() {
        let mut zone = Zone::new(0, 0, 8);
        let mut lists = ZoneLists::new(4);
        let geom = geometry();
        apply_action(&mut zone, &mut lists, &geom, ZoneAction::Finish).unwrap();
        let err = apply_action(&mut zone, &mut lists, &geom, ZoneAction::Open).unwrap_err();
        assert_eq!(err.code, ZnsStatusCode::ZoneInvalTransition);
    }

    #[test]
    fn test_close_from_implicitly_open() {
        let mut zone = Zone::new(0, 0, 8);
        let mut lists = ZoneLists::new(4);
        lists.transition(0, ZoneState::Empty, ZoneState::ImplicitlyOpen);
        zone.state = ZoneState::ImplicitlyOpen;
        let geom = geometry();
        apply_action(&mut zone, &mut lists, &geom, ZoneAction::Close).unwrap();
        assert_eq!(zone.state, ZoneState::Closed);
    }

    #[test]
    fn test_finish_advances_wp_to_boundary() {
        let mut zone = Zone::new(0, 0, 8);
        let mut lists = ZoneLists::new(4);
        let geom = geometry();
        apply_action(&mut zone, &mut lists, &geom, ZoneAction::Finish).unwrap();
        assert_eq!(zone.state, ZoneState::Full);
        assert_eq!(zone.wp, 8);
        assert_eq!(zone.w_ptr, 8);
    }

    #[test]
    fn test_reset_clears_wp_and_attributes() {
        let mut zone = Zone::new(0, 0, 8);
        let mut lists = ZoneLists::new(4);
        let geom = geometry();
        apply_action(&mut zone, &mut lists, &geom, ZoneAction::Finish).unwrap();
        apply_action(&mut zone, &mut lists, &geom, ZoneAction::Reset).unwrap();
        assert_eq!(zone.state, ZoneState::Empty);
        assert_eq!(zone.wp, 0);
        assert!(!zone.za.extension_valid());
    }

    #[test]
    fn test_reset_from_read_only_is_invalid() {
        let mut zone = Zone::new(0, 0, 8);
        let mut lists = ZoneLists::new(4);
        zone.state = ZoneState::ReadOnly;
        let geom = geometry();
        let err = apply_action(&mut zone, &mut lists, &geom, ZoneAction::Reset).unwrap_err();
        assert_eq!(err.code, ZnsStatusCode::ZoneInvalTransition);
    }

    #[test]
    fn test_offline_from_read_only() {
        let mut zone = Zone::new(0, 0, 8);
        let mut lists = ZoneLists::new(4);
        lists.transition(0, ZoneState::Empty, ZoneState::ReadOnly);
        zone.state = ZoneState::ReadOnly;
        let geom = geometry();
        apply_action(&mut zone, &mut lists, &geom, ZoneAction::Offline).unwrap();
        assert_eq!(zone.state, ZoneState::Offline);
    }

    #[test]
    fn test_offline_from_empty_is_invalid() {
        let mut zone = Zone::new(0, 0, 8);
        let mut lists = ZoneLists::new(4);
        let geom = geometry();
        let err = apply_action(&mut zone, &mut lists, &geom, ZoneAction::Offline).unwrap_err();
        assert_eq!(err.code, ZnsStatusCode::ZoneInvalTransition);
    }

    #[test]
    fn test_set_zd_ext_on_empty() {
        let mut zone = Zone::new(0, 0, 8);
        let mut lists = ZoneLists::new(4);
        let geom = geometry();
        apply_action(&mut zone, &mut lists, &geom, ZoneAction::SetZdExt).unwrap();
        assert!(zone.za.extension_valid());
    }

    #[test]
    fn test_set_zd_ext_on_full_is_invalid() {
        let mut zone = Zone::new(0, 0, 8);
        let mut lists = ZoneLists::new(4);
        let geom = geometry();
        apply_action(&mut zone, &mut lists, &geom, ZoneAction::Finish).unwrap();
        let err = apply_action(&mut zone, &mut lists, &geom, ZoneAction::SetZdExt).unwrap_err();
        assert_eq!(err.code, ZnsStatusCode::ZoneInvalTransition);
    }

    #[test]
    fn test_busy_zone_rejects_any_action() {
        let mut zone = Zone::new(0, 0, 8);
        zone.w_ptr = 4;
        let mut lists = ZoneLists::new(4);
        let geom = geometry();
        let err = apply_action(&mut zone, &mut lists, &geom, ZoneAction::Close).unwrap_err();
        assert_eq!(err.code, ZnsStatusCode::ZoneBusy);
    }
}
