//! Host command adapter: decodes already-parsed command words into the
//! structured requests the rest of the crate understands.
//!
//! PRP/SGL resolution and queue arbitration are a real host adapter's job and
//! stay out of scope here; this module starts from command dwords the way a
//! driver would hand them off after DMA mapping, not from raw queue entries.

use crate::error::{ZnsStatus, ZnsStatusCode};
use crate::mgmt_send::ZoneSendSelector;
use crate::report::ReportFilter;
use crate::state_machine::ZoneAction;
use crate::write::WriteRequest;
use crate::zone::ZoneState;

/// I/O command opcode values, as assigned by the NVMe ZNS Command Set.
pub mod opcode {
    /// Write.
    pub const WRITE: u8 = 0x01;
    /// Read.
    pub const READ: u8 = 0x02;
    /// Zone Management Send.
    pub const ZONE_MGMT_SEND: u8 = 0x79;
    /// Zone Management Receive.
    pub const ZONE_MGMT_RECEIVE: u8 = 0x7a;
    /// Zone Append.
    pub const ZONE_APPEND: u8 = 0x7d;
}

const ZSA_CLOSE: u8 = 0x1;
const ZSA_FINISH: u8 = 0x2;
const ZSA_OPEN: u8 = 0x3;
const ZSA_RESET: u8 = 0x4;
const ZSA_OFFLINE: u8 = 0x5;
const ZSA_SET_ZD_EXT: u8 = 0x10;

const SELECT_ALL_BIT: u32 = 1 << 8;

/// Zone Receive Action values (`zra` field, cdw13 bits 0:7).
const ZRA_LIST: u8 = 0x0;
const ZRA_EXTENDED: u8 = 0x1;

/// Partial-report bit, moved to bit 8 of cdw13 since bits 0:7 now hold `zra`.
const PARTIAL_BIT: u32 = 1 << 8;

/// A decoded, validated host command.
#[derive(Debug, Clone, Copy)]
pub enum ZnsCommand {
    /// A regular write.
    Write(WriteRequest),
    /// A zone append.
    Append(WriteRequest),
    /// A read.
    Read { lba: u64, nlb: u64 },
    /// A zone management send.
    ManagementSend {
        slba: u64,
        action: ZoneAction,
        selector: ZoneSendSelector,
    },
    /// A zone management receive.
    ManagementReceive {
        slba: u64,
        filter: ReportFilter,
        max_zones: usize,
        partial: bool,
        extended: bool,
    },
}

fn lba64(cdw10: u32, cdw11: u32) -> u64 {
    (cdw10 as u64) | ((cdw11 as u64) << 32)
}

/// Decodes a Write or Read command. `nlb` is zero-based per NVMe convention
/// (`cdw12` bits 0:15 hold `nlb - 1`).
pub fn decode_io(opcode: u8, cdw10: u32, cdw11: u32, cdw12: u32) -> Result<ZnsCommand, ZnsStatus> {
    let lba = lba64(cdw10, cdw11);
    let nlb = (cdw12 & 0xffff) as u64 + 1;

    match opcode {
        opcode::WRITE => Ok(ZnsCommand::Write(WriteRequest { lba, nlb, append: false })),
        opcode::ZONE_APPEND => Ok(ZnsCommand::Append(WriteRequest { lba, nlb, append: true })),
        opcode::READ => Ok(ZnsCommand::Read { lba, nlb }),
        _ => Err(ZnsStatus::new(ZnsStatusCode::InvalidOpcode)),
    }
}

fn decode_action(raw: u8) -> Result<ZoneAction, ZnsStatus> {
    match raw {
        ZSA_CLOSE => Ok(ZoneAction::Close),
        ZSA_FINISH => Ok(ZoneAction::Finish),
        ZSA_OPEN => Ok(ZoneAction::Open),
        ZSA_RESET => Ok(ZoneAction::Reset),
        ZSA_OFFLINE => Ok(ZoneAction::Offline),
        ZSA_SET_ZD_EXT => Ok(ZoneAction::SetZdExt),
        _ => Err(ZnsStatus::new(ZnsStatusCode::InvalidField)),
    }
}

/// Decodes a Zone Management Send command.
pub fn decode_mgmt_send(cdw10: u32, cdw11: u32, cdw13: u32) -> Result<ZnsCommand, ZnsStatus> {
    let slba = lba64(cdw10, cdw11);
    let action = decode_action((cdw13 & 0xff) as u8)?;
    let selector = if cdw13 & SELECT_ALL_BIT != 0 {
        ZoneSendSelector::All
    } else {
        ZoneSendSelector::Single(slba)
    };
    Ok(ZnsCommand::ManagementSend { slba, action, selector })
}

fn decode_filter(raw: u8) -> Result<ReportFilter, ZnsStatus> {
    match raw {
        0x00 => Ok(ReportFilter::All),
        0x01 => Ok(ReportFilter::State(ZoneState::Empty)),
        0x02 => Ok(ReportFilter::State(ZoneState::ImplicitlyOpen)),
        0x03 => Ok(ReportFilter::State(ZoneState::ExplicitlyOpen)),
        0x04 => Ok(ReportFilter::State(ZoneState::Closed)),
        0x05 => Ok(ReportFilter::State(ZoneState::Full)),
        0x0d => Ok(ReportFilter::State(ZoneState::ReadOnly)),
        0x0e => Ok(ReportFilter::State(ZoneState::Offline)),
        _ => Err(ZnsStatus::new(ZnsStatusCode::InvalidField)),
    }
}

fn decode_zra(raw: u8) -> Result<bool, ZnsStatus> {
    match raw {
        ZRA_LIST => Ok(false),
        ZRA_EXTENDED => Ok(true),
        _ => Err(ZnsStatus::new(ZnsStatusCode::InvalidField)),
    }
}

/// Decodes a Zone Management Receive command. `buffer_len` is the host buffer
/// size in bytes, already resolved from the command's data pointer.
pub fn decode_mgmt_receive(
    cdw10: u32,
    cdw11: u32,
    cdw12: u32,
    cdw13: u32,
    buffer_len: usize,
    descriptor_size: usize,
) -> Result<ZnsCommand, ZnsStatus> {
    let slba = lba64(cdw10, cdw11);
    let filter = decode_filter((cdw12 & 0xff) as u8)?;
    let extended = decode_zra((cdw13 & 0xff) as u8)?;
    let partial = cdw13 & PARTIAL_BIT != 0;
    let max_zones = buffer_len / descriptor_size;
    Ok(ZnsCommand::ManagementReceive {
        slba,
        filter,
        max_zones,
        partial,
        extended,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_write() {
        let cmd = decode_io(opcode::WRITE, 0, 0, 7).unwrap();
        match cmd {
            ZnsCommand::Write(req) => {
                assert_eq!(req.lba, 0);
                assert_eq!(req.nlb, 8);
                assert!(!req.append);
            }
            _ => panic!("expected Write"),
        }
    }

    #[test]
    fn test_decode_zone_append() {
        let cmd = decode_io(opcode::ZONE_APPEND, 16, 0, 3).unwrap();
        match cmd {
            ZnsCommand::Append(req) => {
                assert_eq!(req.lba, 16);
                assert_eq!(req.nlb, 4);
                assert!(req.append);
            }
            _ => panic!("expected Append"),
        }
    }

    #[test]
    fn test_decode_unknown_opcode() {
        let err = decode_io(0xff, 0, 0, 0).unwrap_err();
        assert_eq!(err.code, ZnsStatusCode::InvalidOpcode);
    }

    #[test]
    fn test_decode_lba_spans_both_dwords() {
        let cmd = decode_io(opcode::READ, 0xffffffff, 0x1, 0).unwrap();
        match cmd {
            ZnsCommand::Read { lba, .. } => assert_eq!(lba, 0x1_ffff_ffff),
            _ => panic!("expected Read"),
        }
    }

    #[test]
    fn test_decode_mgmt_send_single() {
        let cmd = decode_mgmt_send(8, 0, ZSA_OPEN as u32).unwrap();
        match cmd {
            ZnsCommand::ManagementSend { slba, action, selector } => {
                assert_eq!(slba, 8);
                assert_eq!(action, ZoneAction::Open);
                assert!(matches!(selector, ZoneSendSelector::Single(8)));
            }
            _ => panic!("expected ManagementSend"),
        }
    }

    #[test]
    fn test_decode_mgmt_send_all() {
        let cmd = decode_mgmt_send(0, 0, ZSA_CLOSE as u32 | SELECT_ALL_BIT).unwrap();
        match cmd {
            ZnsCommand::ManagementSend { selector, .. } => {
                assert!(matches!(selector, ZoneSendSelector::All));
            }
            _ => panic!("expected ManagementSend"),
        }
    }

    #[test]
    fn test_decode_mgmt_send_unknown_action() {
        let err = decode_mgmt_send(0, 0, 0xaa).unwrap_err();
        assert_eq!(err.code, ZnsStatusCode::InvalidField);
    }

    #[test]
    fn test_decode_mgmt_receive_partial_and_max_zones() {
        let cmd = decode_mgmt_receive(0, 0, 0x05, PARTIAL_BIT, 256, 64).unwrap();
        match cmd {
            ZnsCommand::ManagementReceive { filter, max_zones, partial, extended, .. } => {
                assert_eq!(filter, ReportFilter::State(ZoneState::Full));
                assert_eq!(max_zones, 4);
                assert!(partial);
                assert!(!extended);
            }
            _ => panic!("expected ManagementReceive"),
        }
    }

    #[test]
    fn test_decode_mgmt_receive_extended_zra() {
        let cmd = decode_mgmt_receive(0, 0, 0x00, ZRA_EXTENDED as u32, 256, 64).unwrap();
        match cmd {
            ZnsCommand::ManagementReceive { extended, partial, .. } => {
                assert!(extended);
                assert!(!partial);
            }
            _ => panic!("expected ManagementReceive"),
        }
    }

    #[test]
    fn test_decode_mgmt_receive_unknown_zra_rejected() {
        let err = decode_mgmt_receive(0, 0, 0x00, 0xaa, 256, 64).unwrap_err();
        assert_eq!(err.code, ZnsStatusCode::InvalidField);
    }
}
