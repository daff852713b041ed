//! Top-level namespace handle: owns zone state and dispatches commands.

use std::sync::{Arc, Mutex};

use crate::adapter::ZnsCommand;
use crate::backend::{BackendStore, InMemoryBackend, TransferLimits};
use crate::config::{Geometry, NamespaceConfig};
use crate::error::{ZnsError, ZnsResult, ZnsStatus, ZnsStatusCode};
use crate::identify::{identify_namespace, IdentifyZnsNamespace};
use crate::membership::ZoneLists;
use crate::mgmt_send::{zone_mgmt_send, ZoneSendFailure, ZoneSendSelector};
use crate::read::validate_read;
use crate::report::{zone_mgmt_recv, ReportFilter, ZoneReport};
use crate::state_machine::{apply_action, ZoneAction};
use crate::write::{admit_write, finalize_write, WriteRequest};
use crate::zone::Zone;

struct NamespaceInner {
    geometry: Geometry,
    zones: Vec<Zone>,
    lists: ZoneLists,
    backend: Arc<dyn BackendStore>,
    zd_extensions: Vec<u8>,
}

/// A single zoned namespace: geometry, zone array, and the backend store
/// behind it, all guarded by one lock.
///
/// Mirrors the outer-handle/inner-state-behind-a-mutex shape used throughout
/// this crate's concurrency domain: callers hold a cheap `Namespace` handle
/// and every operation takes the lock only for the duration of that one
/// command, matching a single-queue device model (§5: no draining beyond
/// rejecting zone management on a zone with an in-flight write).
pub struct Namespace {
    inner: Mutex<NamespaceInner>,
}

impl Namespace {
    /// Validates `config`, builds zone geometry, and allocates a fresh
    /// in-memory backend sized for the namespace.
    pub fn new(config: &NamespaceConfig) -> ZnsResult<Self> {
        let geometry = config.validate()?;
        let backend = Arc::new(InMemoryBackend::new(geometry.nsze, geometry.lba_size));
        Self::with_backend(geometry, backend)
    }

    /// Builds a namespace against a caller-supplied backend, e.g. for tests
    /// that need to inspect or pre-seed backend contents.
    pub fn with_backend(geometry: Geometry, backend: Arc<dyn BackendStore>) -> ZnsResult<Self> {
        let num_zones = geometry.num_zones as usize;
        let zones = (0..num_zones)
            .map(|idx| Zone::new(idx, idx as u64 * geometry.zone_size, geometry.zone_capacity))
            .collect();
        let lists = ZoneLists::new(num_zones);
        let zd_extensions = vec![0u8; geometry.zd_extension_size as usize * num_zones];

        tracing::info!(num_zones, "namespace brought up");

        Ok(Self {
            inner: Mutex::new(NamespaceInner {
                geometry,
                zones,
                lists,
                backend,
                zd_extensions,
            }),
        })
    }

    /// This namespace's transfer-size limits, derived from its geometry.
    pub fn transfer_limits(&self) -> TransferLimits {
        let inner = self.lock();
        TransferLimits {
            mdts_bytes: inner.geometry.mdts_bytes,
            page_size: inner.geometry.page_size,
        }
    }

    /// The Identify Namespace payload for this namespace.
    pub fn identify(&self) -> IdentifyZnsNamespace {
        let inner = self.lock();
        identify_namespace(&inner.geometry)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NamespaceInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn zone_idx_for(geometry: &Geometry, lba: u64) -> ZnsResult<usize> {
        let idx = geometry.zone_idx(lba) as usize;
        if idx >= geometry.num_zones as usize {
            return Err(ZnsStatus::new(ZnsStatusCode::LbaRange).into());
        }
        Ok(idx)
    }

    /// Executes a regular write, performing admission, the backend I/O, and
    /// finalization in sequence.
    pub fn write(&self, request: WriteRequest) -> ZnsResult<()> {
        self.write_with_payload(request, None).map(|_| ())
    }

    /// Executes a zone append and returns the LBA the data actually landed at.
    pub fn append(&self, request: WriteRequest) -> ZnsResult<u64> {
        debug_assert!(request.append);
        self.write_with_payload(request, None)
    }

    /// Writes `request`, optionally with caller-supplied data; a `None` payload
    /// is zero-filled to `nlb` blocks, which is sufficient for tests that only
    /// exercise zone bookkeeping. Returns the LBA the data actually landed at.
    fn write_with_payload(&self, request: WriteRequest, payload: Option<&[u8]>) -> ZnsResult<u64> {
        let (idx, target_lba, backend, lba_size) = {
            let mut inner = self.lock();
            let idx = Self::zone_idx_for(&inner.geometry, request.lba)?;
            let geometry = inner.geometry.clone();
            let NamespaceInner { zones, lists, backend, .. } = &mut *inner;
            let admission = admit_write(&mut zones[idx], lists, &geometry, request)
                .map_err(ZnsError::from)?;
            (idx, admission.target_lba, backend.clone(), geometry.lba_size)
        };

        let owned;
        let bytes: &[u8] = match payload {
            Some(p) => p,
            None => {
                owned = vec![0u8; (request.nlb * lba_size as u64) as usize];
                &owned
            }
        };
        backend.write(target_lba, bytes)?;

        let mut inner = self.lock();
        let NamespaceInner { zones, lists, .. } = &mut *inner;
        finalize_write(&mut zones[idx], lists, request.nlb);
        Ok(target_lba)
    }

    /// Executes a read, validating zone state and cross-zone traversal rules
    /// before asking the backend for the data.
    pub fn read(&self, lba: u64, nlb: u64) -> ZnsResult<Vec<u8>> {
        let inner = self.lock();
        validate_read(&inner.geometry, &inner.zones, lba, nlb).map_err(ZnsError::from)?;
        let backend = inner.backend.clone();
        drop(inner);
        backend.read(lba, nlb)
    }

    /// Executes a Zone Management Send command.
    ///
    /// Rejects [`ZoneAction::SetZdExt`] outright: that action carries a host data
    /// buffer that this entry point has no way to receive, so real descriptor
    /// extension uploads must go through [`Namespace::set_zone_descriptor_extension`].
    pub fn management_send(
        &self,
        action: ZoneAction,
        selector: ZoneSendSelector,
    ) -> ZnsResult<Vec<ZoneSendFailure>> {
        if action == ZoneAction::SetZdExt {
            return Err(ZnsStatus::new(ZnsStatusCode::InvalidField).into());
        }
        let mut inner = self.lock();
        let NamespaceInner { zones, lists, geometry, .. } = &mut *inner;
        zone_mgmt_send(zones, lists, geometry, action, selector).map_err(ZnsError::from)
    }

    /// Uploads `data` as the zone descriptor extension for the zone starting at
    /// `slba`, then marks the extension valid. `data` must be exactly
    /// `zd_extension_size` bytes.
    pub fn set_zone_descriptor_extension(&self, slba: u64, data: &[u8]) -> ZnsResult<()> {
        let mut inner = self.lock();
        let idx = Self::zone_idx_for(&inner.geometry, slba)?;
        if inner.zones[idx].zslba != slba {
            return Err(ZnsStatus::new(ZnsStatusCode::InvalidField).into());
        }

        let ext_size = inner.geometry.zd_extension_size as usize;
        if ext_size == 0 || data.len() != ext_size {
            return Err(ZnsStatus::new(ZnsStatusCode::InvalidField).into());
        }

        let NamespaceInner { zones, lists, geometry, zd_extensions, .. } = &mut *inner;
        let offset = idx * ext_size;
        zd_extensions[offset..offset + ext_size].copy_from_slice(data);
        apply_action(&mut zones[idx], lists, geometry, ZoneAction::SetZdExt).map_err(ZnsError::from)
    }

    /// Executes a Zone Management Receive command. `extended` requests
    /// REPORT_EXTENDED: descriptor extension bytes are included for zones whose
    /// extension is valid.
    pub fn management_receive(
        &self,
        start_lba: u64,
        filter: ReportFilter,
        max_zones: usize,
        partial: bool,
        extended: bool,
    ) -> ZnsResult<ZoneReport> {
        let inner = self.lock();
        zone_mgmt_recv(
            &inner.zones,
            &inner.geometry,
            &inner.zd_extensions,
            crate::report::ReportRequest {
                start_lba,
                filter,
                max_zones,
                partial,
                extended,
            },
        )
        .map_err(ZnsError::from)
    }

    /// Dispatches an already-decoded host command. A thin convenience wrapper
    /// over the per-command methods above.
    pub fn dispatch(&self, command: ZnsCommand) -> ZnsResult<DispatchOutcome> {
        match command {
            ZnsCommand::Write(req) => self.write(req).map(|_| DispatchOutcome::Empty),
            ZnsCommand::Append(req) => self.append(req).map(DispatchOutcome::AppendedAt),
            ZnsCommand::Read { lba, nlb } => self.read(lba, nlb).map(DispatchOutcome::ReadData),
            ZnsCommand::ManagementSend { action, selector, .. } => self
                .management_send(action, selector)
                .map(DispatchOutcome::SendFailures),
            ZnsCommand::ManagementReceive { slba, filter, max_zones, partial, extended } => self
                .management_receive(slba, filter, max_zones, partial, extended)
                .map(DispatchOutcome::Report),
        }
    }

    /// Snapshot of the active/open zone counters, for diagnostics and tests.
    pub fn resource_counts(&self) -> (u32, u32) {
        let inner = self.lock();
        (inner.lists.nr_active_zones(), inner.lists.nr_open_zones())
    }

    /// Number of zones in this namespace.
    pub fn num_zones(&self) -> usize {
        self.lock().zones.len()
    }
}

/// The result of dispatching a [`ZnsCommand`].
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The command completed with no host-visible payload.
    Empty,
    /// A zone append completed; carries the LBA it landed at.
    AppendedAt(u64),
    /// A read completed; carries the data read.
    ReadData(Vec<u8>),
    /// A zone management send completed; carries any per-zone bulk failures.
    SendFailures(Vec<ZoneSendFailure>),
    /// A zone management receive completed; carries the report.
    Report(ZoneReport),
}
