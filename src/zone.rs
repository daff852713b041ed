//! Zone record: state, geometry, and the dual write-pointer pair.

use serde::{Deserialize, Serialize};

/// State of a single zone, per the NVMe ZNS state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ZoneState {
    /// Zone has never been written (or was reset); write pointer at `zslba`.
    #[default]
    Empty,
    /// Zone was opened as a side effect of a write; evictable by AOR pressure.
    ImplicitlyOpen,
    /// Zone was opened by an explicit OPEN action; not evictable.
    ExplicitlyOpen,
    /// Zone was explicitly or automatically closed; write pointer mid-zone.
    Closed,
    /// Zone is completely written; write pointer at `zslba + zcap`.
    Full,
    /// Zone accepts reads only.
    ReadOnly,
    /// Zone is unavailable for reads or writes.
    Offline,
}

impl ZoneState {
    /// The nibble-coded state value used in report descriptors (`zs` field, high nibble).
    pub fn report_code(self) -> u8 {
        match self {
            ZoneState::Empty => 0x1,
            ZoneState::ImplicitlyOpen => 0x2,
            ZoneState::ExplicitlyOpen => 0x3,
            ZoneState::Closed => 0x4,
            ZoneState::Full => 0x5,
            ZoneState::ReadOnly => 0xD,
            ZoneState::Offline => 0xE,
        }
    }

    /// True if a zone in this state may accept a write or append.
    pub fn is_writable(self) -> bool {
        matches!(
            self,
            ZoneState::Empty
                | ZoneState::ImplicitlyOpen
                | ZoneState::ExplicitlyOpen
                | ZoneState::Closed
        )
    }

    /// True if a zone in this state may be read (cross-zone traversal still checks each zone).
    pub fn is_readable(self) -> bool {
        !matches!(self, ZoneState::Offline)
    }

    /// True if `wp` is meaningful for a zone in this state; READ_ONLY/OFFLINE report all-ones.
    pub fn wp_is_valid(self) -> bool {
        !matches!(self, ZoneState::ReadOnly | ZoneState::Offline)
    }
}

/// Attribute bits carried by a zone descriptor (`za` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneAttributes(u8);

const ZD_EXT_VALID: u8 = 0x01;

impl ZoneAttributes {
    /// True if this zone's descriptor extension slot holds host-written data.
    pub fn extension_valid(self) -> bool {
        self.0 & ZD_EXT_VALID != 0
    }

    /// Sets the extension-valid bit.
    pub fn set_extension_valid(&mut self) {
        self.0 |= ZD_EXT_VALID;
    }

    /// Clears all attribute bits (done on RESET and on any non-CLOSED insertion per the
    /// membership-assignment rule).
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Raw byte value as it appears on the wire.
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

/// A single zone's state and write-pointer pair.
///
/// `wp` is the host-visible write pointer, advanced at write *finalization*.
/// `w_ptr` is the reservation pointer, advanced at write *submission*. The two
/// coincide except while a write is in flight between submission and finalization;
/// collapsing them breaks the in-flight-write rejection semantics (§5/§9 of the spec).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    /// Index of this zone within the namespace's zone array.
    pub idx: usize,
    /// Zone start LBA. Immutable after namespace init.
    pub zslba: u64,
    /// Zone capacity in LBAs (writable prefix of the zone). Immutable after init.
    pub zcap: u64,
    /// Current zone state.
    pub state: ZoneState,
    /// Host-visible write pointer, in LBAs.
    pub wp: u64,
    /// Reservation write pointer, in LBAs.
    pub w_ptr: u64,
    /// Attribute bitset.
    pub za: ZoneAttributes,
}

impl Zone {
    /// Creates a new EMPTY zone with the given start LBA and capacity.
    pub fn new(idx: usize, zslba: u64, zcap: u64) -> Self {
        Self {
            idx,
            zslba,
            zcap,
            state: ZoneState::Empty,
            wp: zslba,
            w_ptr: zslba,
            za: ZoneAttributes::default(),
        }
    }

    /// The first LBA past the end of this zone's writable region (`zslba + zcap`).
    pub fn write_boundary(&self) -> u64 {
        self.zslba + self.zcap
    }

    /// The write pointer as it should appear in a report descriptor: all-ones when invalid.
    pub fn reported_wp(&self) -> u64 {
        if self.state.wp_is_valid() {
            self.wp
        } else {
            u64::MAX
        }
    }

    /// True while a write has been accepted (`w_ptr` advanced) but not yet finalized (`wp`
    /// has not caught up). Zone management may not act on a zone in this state (§5).
    pub fn has_in_flight_write(&self) -> bool {
        self.wp != self.w_ptr
    }
}
