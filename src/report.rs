//! Zone Management Receive: the zone report as seen by the host.

use crate::config::Geometry;
use crate::error::{ZnsStatus, ZnsStatusCode};
use crate::zone::{Zone, ZoneState};

/// Zone type reported for every zone in this namespace: sequential-write-required.
pub const ZONE_TYPE_SEQWRITEREQ: u8 = 0x2;

/// A single zone's report descriptor, as it would be serialized onto the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneDescriptor {
    /// Always [`ZONE_TYPE_SEQWRITEREQ`] for this command set.
    pub zone_type: u8,
    /// Zone state, encoded in the high nibble per [`ZoneState::report_code`].
    pub zs: u8,
    /// Zone attribute bits.
    pub za: u8,
    /// Zone attribute information (reserved; always zero here).
    pub zai: u8,
    /// Zone capacity, in LBAs.
    pub zcap: u64,
    /// Zone start LBA.
    pub zslba: u64,
    /// Write pointer, or all-ones if not meaningful for this zone's state.
    pub wp: u64,
    /// Optional per-zone descriptor extension bytes, present when the namespace
    /// was configured with a nonzero extension size and the zone's extension is valid.
    pub extension: Vec<u8>,
}

impl ZoneDescriptor {
    fn from_zone(zone: &Zone, extension: &[u8]) -> Self {
        Self {
            zone_type: ZONE_TYPE_SEQWRITEREQ,
            zs: zone.state.report_code() << 4,
            za: zone.za.as_u8(),
            zai: 0,
            zcap: zone.zcap,
            zslba: zone.zslba,
            wp: zone.reported_wp(),
            extension: extension.to_vec(),
        }
    }
}

/// Zone state filter (Zone Receive Action Specific Field), selecting which
/// zones a report includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFilter {
    /// All zones, regardless of state.
    All,
    /// Only zones in the given state.
    State(ZoneState),
}

impl ReportFilter {
    fn matches(self, state: ZoneState) -> bool {
        match self {
            ReportFilter::All => true,
            ReportFilter::State(want) => want == state,
        }
    }
}

/// A Zone Management Receive request.
#[derive(Debug, Clone, Copy)]
pub struct ReportRequest {
    /// Starting LBA; the report begins at this LBA's zone.
    pub start_lba: u64,
    /// State filter applied to every zone from `start_lba` onward.
    pub filter: ReportFilter,
    /// Maximum number of descriptors the host's buffer can hold.
    pub max_zones: usize,
    /// Whether a result that would overflow `max_zones` should be truncated
    /// (true) or rejected outright (false).
    pub partial: bool,
    /// Whether this is a REPORT_EXTENDED request (Zone Receive Action `zra` bit):
    /// when true, a zone with a valid descriptor extension includes its extension
    /// bytes in the returned descriptor.
    pub extended: bool,
}

/// The result of a Zone Management Receive: the header's reported count plus
/// the descriptors that fit in the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneReport {
    /// Number of zones matching the filter from `start_lba` onward.
    pub num_zones: u64,
    /// The descriptors actually returned (possibly truncated to `max_zones`).
    pub descriptors: Vec<ZoneDescriptor>,
}

/// Builds a zone report.
///
/// Performs the count-then-emit pass the original device uses: first counts
/// every matching zone so `num_zones` is accurate even when truncated, then
/// emits descriptors up to `max_zones`. Returns [`ZnsStatusCode::InvalidField`]
/// when the match count exceeds `max_zones` and `partial` was not set.
pub fn zone_mgmt_recv(
    zones: &[Zone],
    geometry: &Geometry,
    zd_extensions: &[u8],
    request: ReportRequest,
) -> Result<ZoneReport, ZnsStatus> {
    let start_idx = geometry.zone_idx(request.start_lba) as usize;
    if start_idx >= zones.len() {
        return Err(ZnsStatus::new(ZnsStatusCode::LbaRange));
    }

    let matching: Vec<&Zone> = zones[start_idx..]
        .iter()
        .filter(|z| request.filter.matches(z.state))
        .collect();

    let num_zones = matching.len() as u64;
    if num_zones as usize > request.max_zones && !request.partial {
        return Err(ZnsStatus::new(ZnsStatusCode::InvalidField));
    }

    let ext_size = geometry.zd_extension_size as usize;
    let descriptors = matching
        .into_iter()
        .take(request.max_zones)
        .map(|zone| {
            let extension = if request.extended && ext_size > 0 && zone.za.extension_valid() {
                let offset = zone.idx * ext_size;
                &zd_extensions[offset..offset + ext_size]
            } else {
                &[][..]
            };
            ZoneDescriptor::from_zone(zone, extension)
        })
        .collect();

    Ok(ZoneReport { num_zones, descriptors })
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

    fn zones() -> Vec<Zone> {
        (0..4).map(|i| Zone::new(i, (i as u64) * 8, 8)).collect()
    }

    #[test]
    fn test_report_all_zones_from_start() {
        let geom = geometry();
        let zs = zones();
        let report = zone_mgmt_recv(
            &zs,
            &geom,
            &[],
            ReportRequest {
                start_lba: 0,
                filter: ReportFilter::All,
                max_zones: 16,
                partial: false,
                extended: false,
            },
        )
        .unwrap();
        assert_eq!(report.num_zones, 4);
        assert_eq!(report.descriptors.len(), 4);
    }

    #[test]
    fn test_report_from_middle_zone() {
        let geom = geometry();
        let zs = zones();
        let report = zone_mgmt_recv(
            &zs,
            &geom,
            &[],
            ReportRequest {
                start_lba: 16,
                filter: ReportFilter::All,
                max_zones: 16,
                partial: false,
                extended: false,
            },
        )
        .unwrap();
        assert_eq!(report.num_zones, 2);
    }

    #[test]
    fn test_report_filter_by_state() {
        let geom = geometry();
        let mut zs = zones();
        zs[2].state = ZoneState::Full;
        let report = zone_mgmt_recv(
            &zs,
            &geom,
            &[],
            ReportRequest {
                start_lba: 0,
                filter: ReportFilter::State(ZoneState::Full),
                max_zones: 16,
                partial: false,
                extended: false,
            },
        )
        .unwrap();
        assert_eq!(report.num_zones, 1);
        assert_eq!(report.descriptors[0].zslba, 16);
    }

    #[test]
    fn test_report_overflow_without_partial_errors() {
        let geom = geometry();
        let zs = zones();
        let err = zone_mgmt_recv(
            &zs,
            &geom,
            &[],
            ReportRequest {
                start_lba: 0,
                filter: ReportFilter::All,
                max_zones: 2,
                partial: false,
                extended: false,
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ZnsStatusCode::InvalidField);
    }

    #[test]
    fn test_report_overflow_with_partial_truncates() {
        let geom = geometry();
        let zs = zones();
        let report = zone_mgmt_recv(
            &zs,
            &geom,
            &[],
            ReportRequest {
                start_lba: 0,
                filter: ReportFilter::All,
                max_zones: 2,
                partial: true,
                extended: false,
            },
        )
        .unwrap();
        assert_eq!(report.num_zones, 4);
        assert_eq!(report.descriptors.len(), 2);
    }

    #[test]
    fn test_reported_wp_is_all_ones_for_read_only() {
        let geom = geometry();
        let mut zs = zones();
        zs[0].state = ZoneState::ReadOnly;
        let report = zone_mgmt_recv(
            &zs,
            &geom,
            &[],
            ReportRequest {
                start_lba: 0,
                filter: ReportFilter::All,
                max_zones: 16,
                partial: false,
                extended: false,
            },
        )
        .unwrap();
        assert_eq!(report.descriptors[0].wp, u64::MAX);
    }

    #[test]
    fn test_start_lba_past_namespace_is_rejected() {
        let geom = geometry();
        let zs = zones();
        let err = zone_mgmt_recv(
            &zs,
            &geom,
            &[],
            ReportRequest {
                start_lba: 1000,
                filter: ReportFilter::All,
                max_zones: 16,
                partial: false,
                extended: false,
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ZnsStatusCode::LbaRange);
    }

    #[test]
    fn test_extended_report_includes_extension_bytes_when_valid() {
        let geom = Geometry { zd_extension_size: 64, ..geometry() };
        let mut zs = zones();
        zs[1].za.set_extension_valid();
        let mut zd_extensions = vec![0u8; 64 * zs.len()];
        zd_extensions[64..128].copy_from_slice(&[0xAB; 64]);

        let report = zone_mgmt_recv(
            &zs,
            &geom,
            &zd_extensions,
            ReportRequest {
                start_lba: 0,
                filter: ReportFilter::All,
                max_zones: 16,
                partial: false,
                extended: true,
            },
        )
        .unwrap();
        assert_eq!(report.descriptors[1].extension, vec![0xAB; 64]);
        assert!(report.descriptors[0].extension.is_empty());
    }

    #[test]
    fn test_extended_report_omits_bytes_when_extension_not_valid() {
        let geom = Geometry { zd_extension_size: 64, ..geometry() };
        let zs = zones();
        let zd_extensions = vec![0xCDu8; 64 * zs.len()];

        let report = zone_mgmt_recv(
            &zs,
            &geom,
            &zd_extensions,
            ReportRequest {
                start_lba: 0,
                filter: ReportFilter::All,
                max_zones: 16,
                partial: false,
                extended: true,
            },
        )
        .unwrap();
        assert!(report.descriptors[0].extension.is_empty());
    }
}
