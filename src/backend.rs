//! Backend storage collaborator: where accepted writes and reads actually land.

use std::sync::Mutex;

use crate::error::{ZnsError, ZnsResult};

/// Transfer-size limits a namespace enforces before handing data to the backend.
///
/// Stands in for the MDTS (Maximum Data Transfer Size) and ZASL (Zone Append
/// Size Limit) checks the host adapter performs ahead of admission; both are
/// expressed as byte ceilings derived from a page size and a log2 multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLimits {
    /// Maximum bytes in a single data transfer.
    pub mdts_bytes: u64,
    /// Page size backing the log2 multiplier, in bytes.
    pub page_size: u32,
}

impl TransferLimits {
    /// True if `len_bytes` fits within [`Self::mdts_bytes`].
    pub fn check(&self, len_bytes: u64) -> bool {
        len_bytes <= self.mdts_bytes
    }
}

/// Backing store for zone data: the in-process stand-in for the real block device.
///
/// A namespace issues reads and writes in LBA units; the backend owns the
/// mapping from LBA to byte offset via its configured LBA size.
pub trait BackendStore: Send {
    /// Reads `nlb` logical blocks starting at `lba`.
    fn read(&self, lba: u64, nlb: u64) -> ZnsResult<Vec<u8>>;

    /// Writes `data` starting at `lba`. `data.len()` must be a multiple of the
    /// backend's LBA size.
    fn write(&self, lba: u64, data: &[u8]) -> ZnsResult<()>;
}

/// An in-memory [`BackendStore`], backed by a flat byte buffer sized for the
/// whole namespace.
///
/// Grounded in the mock I/O engine pattern: no real device or file descriptor,
/// just enough state to make zone reads observe prior zone writes in tests.
pub struct InMemoryBackend {
    lba_size: u32,
    data: Mutex<Vec<u8>>,
}

impl InMemoryBackend {
    /// Allocates a backend covering `nsze` LBAs of `lba_size` bytes each, zero-filled.
    pub fn new(nsze: u64, lba_size: u32) -> Self {
        let len = (nsze * lba_size as u64) as usize;
        Self {
            lba_size,
            data: Mutex::new(vec![0u8; len]),
        }
    }

    fn byte_range(&self, lba: u64, nlb: u64) -> (usize, usize) {
        let start = lba * self.lba_size as u64;
        let end = start + nlb * self.lba_size as u64;
        (start as usize, end as usize)
    }
}

impl BackendStore for InMemoryBackend {
    fn read(&self, lba: u64, nlb: u64) -> ZnsResult<Vec<u8>> {
        let (start, end) = self.byte_range(lba, nlb);
        let guard = self
            .data
            .lock()
            .map_err(|_| ZnsError::Backend("backend store lock poisoned".into()))?;
        guard
            .get(start..end)
            .map(|slice| slice.to_vec())
            .ok_or_else(|| ZnsError::Backend(format!("read range {start}..{end} out of bounds")))
    }

    fn write(&self, lba: u64, data: &[u8]) -> ZnsResult<()> {
        let start = (lba * self.lba_size as u64) as usize;
        let end = start + data.len();
        let mut guard = self
            .data
            .lock()
            .map_err(|_| ZnsError::Backend("backend store lock poisoned".into()))?;
        let slice = guard
            .get_mut(start..end)
            .ok_or_else(|| ZnsError::Backend(format!("write range {start}..{end} out of bounds")))?;
        slice.copy_from_slice(data);
        Ok(())
    }
}
