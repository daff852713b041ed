//! Error types for the ZNS zone management core.

use thiserror::Error;

/// Result type alias for zone management operations.
pub type ZnsResult<T> = Result<T, ZnsError>;

/// Top-level error type for the ZNS emulator.
#[derive(Debug, Error)]
pub enum ZnsError {
    /// Namespace geometry configuration is invalid; bring-up aborted.
    #[error("invalid zone geometry: {reason}")]
    InvalidGeometry {
        /// Description of the failed validation rule.
        reason: String,
    },

    /// A resource limit (max active/open zones) exceeds the zone count.
    #[error("resource limit exceeds zone count: {limit_name} = {limit}, num_zones = {num_zones}")]
    LimitExceedsZones {
        /// Name of the limit that was out of range.
        limit_name: &'static str,
        /// The configured limit value.
        limit: u32,
        /// Total number of zones in the namespace.
        num_zones: u64,
    },

    /// Zone descriptor extension size is not a valid multiple of 64 bytes.
    #[error("invalid zone descriptor extension size: {size} bytes")]
    InvalidExtensionSize {
        /// The rejected extension size, in bytes.
        size: u32,
    },

    /// A command failed a zone-semantics check; carries the NVMe-equivalent status.
    #[error("command rejected: {0}")]
    Command(#[from] ZnsStatus),

    /// The backend store reported an I/O failure while servicing an accepted command.
    #[error("backend store error: {0}")]
    Backend(String),
}

/// NVMe ZNS command status, independent of the "do-not-retry" bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZnsStatusCode {
    /// Command completed successfully.
    Success,
    /// Opcode is not one this namespace understands.
    InvalidOpcode,
    /// A command field holds an unsupported or malformed value.
    InvalidField,
    /// The addressed LBA range falls outside the namespace.
    LbaRange,
    /// The addressed LBA range crosses a zone boundary it may not cross.
    ZoneBoundaryError,
    /// The zone is FULL and cannot accept further writes.
    ZoneFull,
    /// The zone is READ_ONLY and cannot accept writes.
    ZoneReadOnly,
    /// The zone is OFFLINE and cannot be read or written.
    ZoneOffline,
    /// A non-append write targeted an LBA other than the zone's write pointer.
    ZoneInvalidWrite,
    /// The requested state transition is not defined for the zone's current state.
    ZoneInvalTransition,
    /// Accepting the command would exceed the active-zone resource limit.
    ZoneTooManyActive,
    /// Accepting the command would exceed the open-zone resource limit.
    ZoneTooManyOpen,
    /// The zone has an in-flight (submitted, not yet finalized) write; management is rejected.
    ZoneBusy,
}

/// A command status together with the NVMe "do-not-retry" (DNR) bit.
///
/// Permanent failures (everything except a transient [`ZnsStatusCode::ZoneBusy`])
/// carry `dnr = true`, mirroring the "OR'ed with a do-not-retry bit" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{code:?} (dnr={dnr})")]
pub struct ZnsStatus {
    /// The underlying status code.
    pub code: ZnsStatusCode,
    /// Whether the host should refrain from retrying this command unmodified.
    pub dnr: bool,
}

impl ZnsStatus {
    /// Builds a status, setting `dnr` according to the usual permanent/transient split.
    pub fn new(code: ZnsStatusCode) -> Self {
        let dnr = !matches!(code, ZnsStatusCode::Success | ZnsStatusCode::ZoneBusy);
        Self { code, dnr }
    }

    /// The `SUCCESS` status.
    pub fn success() -> Self {
        Self::new(ZnsStatusCode::Success)
    }

    /// True iff this status represents successful completion.
    pub fn is_success(&self) -> bool {
        self.code == ZnsStatusCode::Success
    }
}

impl From<ZnsStatusCode> for ZnsStatus {
    fn from(code: ZnsStatusCode) -> Self {
        ZnsStatus::new(code)
    }
}
