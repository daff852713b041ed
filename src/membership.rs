//! Per-state zone membership lists and active/open counters.
//!
//! The original device tracks zone membership with intrusive per-state
//! linked lists (QTAILQ) so that bulk zone-management operations can walk
//! "all open zones" without scanning the whole zone array. A `VecDeque<usize>`
//! per state is the direct idiomatic translation: O(1) push/pop at the ends,
//! and removal by value for the (rare) out-of-order transitions.

use std::collections::VecDeque;

use crate::zone::ZoneState;

/// Tracks which zones belong to which state, plus the AOR counters.
///
/// Counters are derived state: `nr_active_zones` is the total population of
/// the open lists (implicit + explicit) and the closed list, since CLOSED
/// zones are still "active" per the ZNS spec. `nr_open_zones` is the
/// population of the two open lists only.
#[derive(Debug, Default)]
pub struct ZoneLists {
    empty: VecDeque<usize>,
    implicitly_open: VecDeque<usize>,
    explicitly_open: VecDeque<usize>,
    closed: VecDeque<usize>,
    full: VecDeque<usize>,
    read_only: VecDeque<usize>,
    offline: VecDeque<usize>,
    nr_active_zones: u32,
    nr_open_zones: u32,
}

impl ZoneLists {
    /// Builds lists with all `num_zones` zones starting in the EMPTY list.
    pub fn new(num_zones: usize) -> Self {
        Self {
            empty: (0..num_zones).collect(),
            ..Default::default()
        }
    }

    fn list_mut(&mut self, state: ZoneState) -> &mut VecDeque<usize> {
        match state {
            ZoneState::Empty => &mut self.empty,
            ZoneState::ImplicitlyOpen => &mut self.implicitly_open,
            ZoneState::ExplicitlyOpen => &mut self.explicitly_open,
            ZoneState::Closed => &mut self.closed,
            ZoneState::Full => &mut self.full,
            ZoneState::ReadOnly => &mut self.read_only,
            ZoneState::Offline => &mut self.offline,
        }
    }

    /// Number of zones currently in the given state's list.
    pub fn count(&self, state: ZoneState) -> usize {
        match state {
            ZoneState::Empty => self.empty.len(),
            ZoneState::ImplicitlyOpen => self.implicitly_open.len(),
            ZoneState::ExplicitlyOpen => self.explicitly_open.len(),
            ZoneState::Closed => self.closed.len(),
            ZoneState::Full => self.full.len(),
            ZoneState::ReadOnly => self.read_only.len(),
            ZoneState::Offline => self.offline.len(),
        }
    }

    /// Number of zones with `state >= CLOSED` in AOR terms (open + closed).
    pub fn nr_active_zones(&self) -> u32 {
        self.nr_active_zones
    }

    /// Number of zones in either open state.
    pub fn nr_open_zones(&self) -> u32 {
        self.nr_open_zones
    }

    fn active_delta(state: ZoneState) -> i32 {
        matches!(
            state,
            ZoneState::ImplicitlyOpen | ZoneState::ExplicitlyOpen | ZoneState::Closed
        ) as i32
    }

    fn open_delta(state: ZoneState) -> i32 {
        matches!(
            state,
            ZoneState::ImplicitlyOpen | ZoneState::ExplicitlyOpen
        ) as i32
    }

    /// Removes `idx` from `from`'s list and appends it to `to`'s list, updating counters.
    ///
    /// Transitioning CLOSED -> {IMPLICITLY_OPEN, EXPLICITLY_OPEN} applies only the
    /// open-counter delta: the zone was already counted active while CLOSED, and
    /// double-counting it here was the original device's bug (spec-noted, fixed here).
    pub fn transition(&mut self, idx: usize, from: ZoneState, to: ZoneState) {
        let removed = remove_value(self.list_mut(from), idx);
        debug_assert!(removed, "zone {idx} was not present in its claimed state list");
        self.list_mut(to).push_back(idx);

        let from_was_closed_reopen = from == ZoneState::Closed
            && matches!(to, ZoneState::ImplicitlyOpen | ZoneState::ExplicitlyOpen);

        if from_was_closed_reopen {
            self.nr_open_zones = self.nr_open_zones.wrapping_add(1);
        } else {
            self.nr_active_zones = (self.nr_active_zones as i32 + Self::active_delta(to)
                - Self::active_delta(from)) as u32;
            self.nr_open_zones = (self.nr_open_zones as i32 + Self::open_delta(to)
                - Self::open_delta(from)) as u32;
        }

        tracing::debug!(
            idx,
            ?from,
            ?to,
            active = self.nr_active_zones,
            open = self.nr_open_zones,
            "zone membership transition"
        );
    }

    /// A snapshot of a state's membership, safe to iterate while mutating the lists
    /// through subsequent `transition` calls (bulk zone-management operations must
    /// not iterate a live list they are simultaneously draining).
    pub fn snapshot(&self, state: ZoneState) -> Vec<usize> {
        match state {
            ZoneState::Empty => self.empty.iter().copied().collect(),
            ZoneState::ImplicitlyOpen => self.implicitly_open.iter().copied().collect(),
            ZoneState::ExplicitlyOpen => self.explicitly_open.iter().copied().collect(),
            ZoneState::Closed => self.closed.iter().copied().collect(),
            ZoneState::Full => self.full.iter().copied().collect(),
            ZoneState::ReadOnly => self.read_only.iter().copied().collect(),
            ZoneState::Offline => self.offline.iter().copied().collect(),
        }
    }

    /// All zones in either open state, in no particular cross-list order.
    pub fn snapshot_open(&self) -> Vec<usize> {
        self.implicitly_open
            .iter()
            .chain(self.explicitly_open.iter())
            .copied()
            .collect()
    }

    /// First implicitly-open zone, if any, used by AOR auto-eviction.
    pub fn first_implicitly_open(&self) -> Option<usize> {
        self.implicitly_open.front().copied()
    }
}

fn remove_value(list: &mut VecDeque<usize>, value: usize) -> bool {
    if let Some(pos) = list.iter().position(|&v| v == value) {
        list.remove(pos);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_puts_all_zones_in_empty() {
        let lists = ZoneLists::new(4);
        assert_eq!(lists.count(ZoneState::Empty), 4);
        assert_eq!(lists.nr_active_zones(), 0);
        assert_eq!(lists.nr_open_zones(), 0);
    }

    #[test]
    fn test_empty_to_implicitly_open_counts_both() {
        let mut lists = ZoneLists::new(4);
        lists.transition(0, ZoneState::Empty, ZoneState::ImplicitlyOpen);
        assert_eq!(lists.count(ZoneState::Empty), 3);
        assert_eq!(lists.count(ZoneState::ImplicitlyOpen), 1);
        assert_eq!(lists.nr_active_zones(), 1);
        assert_eq!(lists.nr_open_zones(), 1);
    }

    #[test]
    fn test_open_to_closed_keeps_active_drops_open() {
        let mut lists = ZoneLists::new(4);
        lists.transition(0, ZoneState::Empty, ZoneState::ImplicitlyOpen);
        lists.transition(0, ZoneState::ImplicitlyOpen, ZoneState::Closed);
        assert_eq!(lists.nr_active_zones(), 1);
        assert_eq!(lists.nr_open_zones(), 0);
    }

    #[test]
    fn test_closed_reopen_does_not_double_count_active() {
        let mut lists = ZoneLists::new(4);
        lists.transition(0, ZoneState::Empty, ZoneState::ImplicitlyOpen);
        lists.transition(0, ZoneState::ImplicitlyOpen, ZoneState::Closed);
        lists.transition(0, ZoneState::Closed, ZoneState::ImplicitlyOpen);
        assert_eq!(lists.nr_active_zones(), 1);
        assert_eq!(lists.nr_open_zones(), 1);
    }

    #[test]
    fn test_active_drops_to_zero_on_full() {
        let mut lists = ZoneLists::new(4);
        lists.transition(0, ZoneState::Empty, ZoneState::ImplicitlyOpen);
        lists.transition(0, ZoneState::ImplicitlyOpen, ZoneState::Full);
        assert_eq!(lists.nr_active_zones(), 0);
        assert_eq!(lists.nr_open_zones(), 0);
        assert_eq!(lists.count(ZoneState::Full), 1);
    }

    #[test]
    fn test_snapshot_open_merges_both_open_lists() {
        let mut lists = ZoneLists::new(4);
        lists.transition(0, ZoneState::Empty, ZoneState::ImplicitlyOpen);
        lists.transition(1, ZoneState::Empty, ZoneState::ExplicitlyOpen);
        let mut open = lists.snapshot_open();
        open.sort_unstable();
        assert_eq!(open, vec![0, 1]);
    }

    #[test]
    fn test_snapshot_is_independent_of_later_mutation() {
        let mut lists = ZoneLists::new(4);
        lists.transition(0, ZoneState::Empty, ZoneState::ImplicitlyOpen);
        lists.transition(1, ZoneState::Empty, ZoneState::ImplicitlyOpen);
        let snap = lists.snapshot(ZoneState::ImplicitlyOpen);
        lists.transition(0, ZoneState::ImplicitlyOpen, ZoneState::Full);
        assert_eq!(snap.len(), 2);
        assert_eq!(lists.count(ZoneState::ImplicitlyOpen), 1);
    }

    #[test]
    fn test_first_implicitly_open_fifo_order() {
        let mut lists = ZoneLists::new(4);
        lists.transition(2, ZoneState::Empty, ZoneState::ImplicitlyOpen);
        lists.transition(0, ZoneState::Empty, ZoneState::ImplicitlyOpen);
        assert_eq!(lists.first_implicitly_open(), Some(2));
    }
}
