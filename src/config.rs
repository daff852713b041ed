//! Namespace configuration and zone geometry derivation.

use serde::{Deserialize, Serialize};

use crate::error::{ZnsError, ZnsResult};

const DEFAULT_ZONE_SIZE_BYTES: u64 = 128 * 1024 * 1024;

/// Host-supplied configuration for a zoned namespace.
///
/// Mirrors the FEMU `zns_init_zone_geometry` inputs: sizes are given in bytes
/// and converted to LBA units during validation, since the wire format and the
/// state machine both operate in LBAs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Total namespace size, in bytes.
    pub ns_size_bytes: u64,
    /// Logical block size, in bytes.
    pub lba_size: u32,
    /// Zone size, in bytes. Defaults to 128 MiB when zero.
    pub zone_size_bytes: u64,
    /// Zone capacity, in bytes. Defaults to `zone_size_bytes` when zero.
    pub zone_cap_bytes: u64,
    /// Maximum number of simultaneously active zones. Zero means unlimited.
    pub max_active_zones: u32,
    /// Maximum number of simultaneously open zones. Zero means unlimited.
    pub max_open_zones: u32,
    /// Whether a read may span multiple zones.
    pub cross_zone_read: bool,
    /// Per-zone descriptor extension size, in bytes. Must be a multiple of 64.
    pub zd_extension_size: u32,
    /// Zone append size limit, as log2 of page-size multiples (ZASL).
    pub zasl_log2: u32,
    /// Page size, in bytes, used with `zasl_log2` to bound append size.
    pub page_size: u32,
    /// Maximum data transfer size, as log2 of page-size multiples (MDTS).
    pub mdts_log2: u32,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            ns_size_bytes: 4 * DEFAULT_ZONE_SIZE_BYTES,
            lba_size: 4096,
            zone_size_bytes: 0,
            zone_cap_bytes: 0,
            max_active_zones: 0,
            max_open_zones: 0,
            cross_zone_read: false,
            zd_extension_size: 0,
            zasl_log2: 5,
            page_size: 4096,
            mdts_log2: 5,
        }
    }
}

/// Derived, validated zone geometry: the product of [`NamespaceConfig`] validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    /// Logical block size, in bytes.
    pub lba_size: u32,
    /// Zone size, in LBAs.
    pub zone_size: u64,
    /// Zone capacity, in LBAs.
    pub zone_capacity: u64,
    /// log2(zone_size) when zone_size is a power of two, else `None`.
    pub zone_size_log2: Option<u32>,
    /// Number of zones in the namespace.
    pub num_zones: u64,
    /// Namespace size, in LBAs (`num_zones * zone_size`).
    pub nsze: u64,
    /// Maximum number of simultaneously active zones (0 = unlimited).
    pub max_active_zones: u32,
    /// Maximum number of simultaneously open zones (0 = unlimited).
    pub max_open_zones: u32,
    /// Whether a read may span multiple zones.
    pub cross_zone_read: bool,
    /// Per-zone descriptor extension size, in bytes.
    pub zd_extension_size: u32,
    /// Zone append size limit, as log2 of page-size multiples.
    pub zasl_log2: u32,
    /// Page size, in bytes.
    pub page_size: u32,
    /// Maximum data transfer size in bytes (`page_size << mdts_log2`).
    pub mdts_bytes: u64,
}

impl Geometry {
    /// The byte offset of the LBA immediately past the namespace.
    pub fn nsze_bytes(&self) -> u64 {
        self.nsze * self.lba_size as u64
    }

    /// The per-append byte ceiling (`page_size << zasl_log2`).
    pub fn zasl_bytes(&self) -> u64 {
        (self.page_size as u64) << self.zasl_log2
    }

    /// Maps an LBA to its owning zone index using the log2 fast path when available.
    pub fn zone_idx(&self, lba: u64) -> u64 {
        match self.zone_size_log2 {
            Some(log2) => lba >> log2,
            None => lba / self.zone_size,
        }
    }
}

fn is_power_of_two(n: u64) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

impl NamespaceConfig {
    /// Validates this configuration and derives [`Geometry`].
    ///
    /// Mirrors `zns_init_zone_geometry` in the original FEMU source: every
    /// failure aborts bring-up with a descriptive, non-panicking error.
    pub fn validate(&self) -> ZnsResult<Geometry> {
        let lba_size = self.lba_size as u64;
        let zone_size_bytes = if self.zone_size_bytes != 0 {
            self.zone_size_bytes
        } else {
            DEFAULT_ZONE_SIZE_BYTES
        };
        let zone_cap_bytes = if self.zone_cap_bytes != 0 {
            self.zone_cap_bytes
        } else {
            zone_size_bytes
        };

        if zone_cap_bytes > zone_size_bytes {
            return Err(ZnsError::InvalidGeometry {
                reason: format!(
                    "zone capacity {zone_cap_bytes}B exceeds zone size {zone_size_bytes}B"
                ),
            });
        }
        if zone_size_bytes < lba_size {
            return Err(ZnsError::InvalidGeometry {
                reason: format!("zone size {zone_size_bytes}B smaller than LBA size {lba_size}B"),
            });
        }
        if zone_cap_bytes < lba_size {
            return Err(ZnsError::InvalidGeometry {
                reason: format!(
                    "zone capacity {zone_cap_bytes}B smaller than LBA size {lba_size}B"
                ),
            });
        }

        let zone_size = zone_size_bytes / lba_size;
        let zone_capacity = zone_cap_bytes / lba_size;
        let num_zones = self.ns_size_bytes / lba_size / zone_size;

        if self.max_open_zones as u64 > num_zones {
            return Err(ZnsError::LimitExceedsZones {
                limit_name: "max_open_zones",
                limit: self.max_open_zones,
                num_zones,
            });
        }
        if self.max_active_zones as u64 > num_zones {
            return Err(ZnsError::LimitExceedsZones {
                limit_name: "max_active_zones",
                limit: self.max_active_zones,
                num_zones,
            });
        }

        if self.zd_extension_size != 0 {
            if self.zd_extension_size % 64 != 0 {
                return Err(ZnsError::InvalidExtensionSize {
                    size: self.zd_extension_size,
                });
            }
            if self.zd_extension_size / 64 > 0xff {
                return Err(ZnsError::InvalidExtensionSize {
                    size: self.zd_extension_size,
                });
            }
        }

        let zone_size_log2 = is_power_of_two(zone_size).then(|| zone_size.trailing_zeros());

        tracing::info!(
            num_zones,
            zone_size,
            zone_capacity,
            max_active = self.max_active_zones,
            max_open = self.max_open_zones,
            "namespace geometry validated"
        );

        Ok(Geometry {
            lba_size: self.lba_size,
            zone_size,
            zone_capacity,
            zone_size_log2,
            num_zones,
            nsze: num_zones * zone_size,
            max_active_zones: self.max_active_zones,
            max_open_zones: self.max_open_zones,
            cross_zone_read: self.cross_zone_read,
            zd_extension_size: self.zd_extension_size,
            zasl_log2: self.zasl_log2,
            page_size: self.page_size,
            mdts_bytes: (self.page_size as u64) << self.mdts_log2,
        })
    }
}
