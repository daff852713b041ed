//! Identify Namespace (ZNS command set) payload derivation.

use crate::config::Geometry;

/// Zone Operation Characteristics bits (`zoc` field). Always zero: this
/// namespace does not support variable zone capacity or the zone-active
/// excursions that field otherwise describes.
const ZOC_RESERVED: u16 = 0;

/// Optional ZNS Command Support bits (`ozcs` field).
const OZCS_READ_ACROSS_ZONE_BOUNDARIES: u16 = 0x1;

/// The fields of the ZNS-specific Identify Namespace data structure a host
/// reads during namespace bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifyZnsNamespace {
    /// Zone Operation Characteristics.
    pub zoc: u16,
    /// Optional ZNS Command Support.
    pub ozcs: u16,
    /// Maximum Active Resources: `max_active_zones - 1`, or `0xFFFF_FFFF` when unlimited.
    pub mar: u32,
    /// Maximum Open Resources: `max_open_zones - 1`, or `0xFFFF_FFFF` when unlimited.
    pub mor: u32,
    /// Zone Size, in LBAs.
    pub lbafe_zsze: u64,
    /// Zone Descriptor Extension Size, as a multiple of 64 bytes.
    pub lbafe_zdes: u8,
    /// Namespace size, in LBAs.
    pub nsze: u64,
    /// Namespace capacity, in LBAs (equals `nsze`: no thin provisioning).
    pub ncap: u64,
    /// Namespace utilization, in LBAs (equals `nsze` at bring-up: fully provisioned).
    pub nuse: u64,
}

fn resource_field(max: u32) -> u32 {
    max.wrapping_sub(1)
}

/// Derives the Identify Namespace payload from a validated [`Geometry`].
pub fn identify_namespace(geometry: &Geometry) -> IdentifyZnsNamespace {
    let ozcs = if geometry.cross_zone_read {
        OZCS_READ_ACROSS_ZONE_BOUNDARIES
    } else {
        0
    };

    IdentifyZnsNamespace {
        zoc: ZOC_RESERVED,
        ozcs,
        mar: resource_field(geometry.max_active_zones),
        mor: resource_field(geometry.max_open_zones),
        lbafe_zsze: geometry.zone_size,
        lbafe_zdes: (geometry.zd_extension_size / 64) as u8,
        nsze: geometry.nsze,
        ncap: geometry.nsze,
        nuse: geometry.nsze,
    }
}
