//! Zone Management Send: dispatches a [`ZoneAction`] to one zone or to every
//! zone eligible for it.

use crate::config::Geometry;
use crate::error::{ZnsStatus, ZnsStatusCode};
use crate::membership::ZoneLists;
use crate::state_machine::{apply_action, ZoneAction};
use crate::zone::{Zone, ZoneState};

/// Which zones a Zone Management Send command targets.
#[derive(Debug, Clone, Copy)]
pub enum ZoneSendSelector {
    /// The single zone starting at this LBA.
    Single(u64),
    /// Every zone for which the action is applicable.
    All,
}

/// A per-zone failure encountered while applying a bulk [`ZoneSendSelector::All`]
/// action. Bulk operations are best-effort: one zone's rejection does not stop
/// the others from being processed.
#[derive(Debug, Clone, Copy)]
pub struct ZoneSendFailure {
    /// Index of the zone that rejected the action.
    pub zone_idx: usize,
    /// The status it rejected with.
    pub status: ZnsStatus,
}

/// States from which `action` is a meaningful, non-terminal transition; bulk
/// operations snapshot and apply only to zones currently in one of these states,
/// so that already-satisfied zones (e.g. an already-FULL zone under FINISH) are
/// silently skipped rather than re-processed.
fn applicable_states(action: ZoneAction) -> &'static [ZoneState] {
    match action {
        ZoneAction::Open => &[ZoneState::ImplicitlyOpen, ZoneState::Closed],
        ZoneAction::Close => &[ZoneState::ImplicitlyOpen, ZoneState::ExplicitlyOpen],
        ZoneAction::Finish => &[
            ZoneState::ImplicitlyOpen,
            ZoneState::ExplicitlyOpen,
            ZoneState::Closed,
        ],
        ZoneAction::Reset => &[
            ZoneState::ImplicitlyOpen,
            ZoneState::ExplicitlyOpen,
            ZoneState::Closed,
            ZoneState::Full,
        ],
        ZoneAction::Offline => &[ZoneState::ReadOnly],
        ZoneAction::SetZdExt => &[ZoneState::Empty, ZoneState::Closed],
    }
}

/// Applies `action` to a single zone addressed by its start LBA.
///
/// Returns [`ZnsStatusCode::InvalidField`] if `slba` does not exactly match a
/// zone's start LBA, matching the original device's strict-alignment requirement.
fn send_single(
    zones: &mut [Zone],
    lists: &mut ZoneLists,
    geometry: &Geometry,
    action: ZoneAction,
    slba: u64,
) -> Result<(), ZnsStatus> {
    let idx = geometry.zone_idx(slba) as usize;
    let zone = zones
        .get_mut(idx)
        .ok_or_else(|| ZnsStatus::new(ZnsStatusCode::LbaRange))?;
    if zone.zslba != slba {
        return Err(ZnsStatus::new(ZnsStatusCode::InvalidField));
    }
    apply_action(zone, lists, geometry, action)
}

fn send_all(
    zones: &mut [Zone],
    lists: &mut ZoneLists,
    geometry: &Geometry,
    action: ZoneAction,
) -> Vec<ZoneSendFailure> {
    let mut targets: Vec<usize> = applicable_states(action)
        .iter()
        .flat_map(|state| lists.snapshot(*state))
        .collect();
    targets.sort_unstable();

    let mut failures = Vec::new();
    for idx in targets {
        let zone = &mut zones[idx];
        if let Err(status) = apply_action(zone, lists, geometry, action) {
            failures.push(ZoneSendFailure { zone_idx: idx, status });
        }
    }
    failures
}

/// Dispatches a Zone Management Send command.
///
/// `Single` returns the action's own result directly. `All` never fails the
/// command outright; it returns the list of per-zone failures (empty on full
/// success), since a subset of zones rejecting a bulk action does not invalidate
/// the zones that accepted it.
pub fn zone_mgmt_send(
    zones: &mut [Zone],
    lists: &mut ZoneLists,
    geometry: &Geometry,
    action: ZoneAction,
    selector: ZoneSendSelector,
) -> Result<Vec<ZoneSendFailure>, ZnsStatus> {
    match selector {
        ZoneSendSelector::Single(slba) => {
            send_single(zones, lists, geometry, action, slba)?;
            Ok(Vec::new())
        }
        ZoneSendSelector::All => Ok(send_all(zones, lists, geometry, action)),
    }
}
