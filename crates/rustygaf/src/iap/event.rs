//! Messages exchanged with the upper layer and the controller
//!
//! Commands sent to the controller carry a transaction id; the controller echoes
//! it in the matching completion so the manager can correlate both.

use super::constants::*;
use super::types::*;
use crate::codec::{Direction, DpConfig};
use crate::lid::Lid;
use crate::msg::{Message, Module, MsgCode, MsgKind, GAF_ERR_NO_ERROR};

/// Transaction identifier correlating a command with its completion
pub type Txn = u16;

/// CIS to establish when enabling a unicast group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CisSetup {
    pub stream_lid: Lid,
    pub cis_id: u8,
    pub con_lid: Lid,
    /// None when accepting a CIS requested by the remote central
    pub params: Option<StreamParams>,
}

/// Request for the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsoCommand {
    /// Set CIG parameters if needed and create or accept the listed CISes
    EnableUnicast {
        txn: Txn,
        group_lid: Lid,
        cig_id: u8,
        params: GroupParams,
        streams: Vec<CisSetup>,
    },
    /// Create a BIG, or synchronize with a remote one
    EnableBroadcast {
        txn: Txn,
        group_lid: Lid,
        big_id: u8,
        params: GroupParams,
        nb_streams: u8,
        code: Option<BroadcastCode>,
    },
    /// Disconnect the streams or terminate the BIG
    Disable {
        txn: Txn,
        group_lid: Lid,
        streams: Vec<Lid>,
    },
    /// Release controller resources of a removed group, no completion expected
    RemoveGroup { group_lid: Lid, kind: GroupKind, id: u8 },
    SetupDataPath {
        txn: Txn,
        stream_lid: Lid,
        direction: Direction,
        config: DpConfig,
    },
    RemoveDataPath {
        txn: Txn,
        stream_lid: Lid,
        direction: Direction,
    },
    ReadQuality { txn: Txn, stream_lid: Lid },
    TestModeStart {
        txn: Txn,
        stream_lid: Lid,
        transmit: bool,
        payload: TmPayload,
    },
    TestModeRead { txn: Txn, stream_lid: Lid },
    TestModeStop { txn: Txn, stream_lid: Lid },
}

impl IsoCommand {
    /// Transaction the completion will refer to
    pub fn txn(&self) -> Option<Txn> {
        match self {
            IsoCommand::EnableUnicast { txn, .. }
            | IsoCommand::EnableBroadcast { txn, .. }
            | IsoCommand::Disable { txn, .. }
            | IsoCommand::SetupDataPath { txn, .. }
            | IsoCommand::RemoveDataPath { txn, .. }
            | IsoCommand::ReadQuality { txn, .. }
            | IsoCommand::TestModeStart { txn, .. }
            | IsoCommand::TestModeRead { txn, .. }
            | IsoCommand::TestModeStop { txn, .. } => Some(*txn),
            IsoCommand::RemoveGroup { .. } => None,
        }
    }
}

/// Event reported by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsoControllerEvent {
    /// Completion of a command without return parameters
    Complete { txn: Txn, status: u8 },
    /// Completion of a group enable
    Enabled {
        txn: Txn,
        status: u8,
        config: Option<EnabledConfig>,
    },
    Quality {
        txn: Txn,
        status: u8,
        report: QualityReport,
    },
    TestCounters {
        txn: Txn,
        status: u8,
        counters: TmCounters,
    },
    /// A stream was disconnected without local request
    StreamLost { stream_lid: Lid, reason: DisableReason },
    /// A whole broadcast group was lost
    GroupLost { group_lid: Lid, reason: DisableReason },
}

/// Indication delivered to the upper layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IapEvent {
    GroupEnabled {
        group_lid: Lid,
        result: IapResult<EnabledConfig>,
    },
    GroupDisabled {
        group_lid: Lid,
        result: IapResult<()>,
    },
    StreamDisabled {
        group_lid: Lid,
        stream_lid: Lid,
        reason: DisableReason,
    },
    DataPathSetUp {
        stream_lid: Lid,
        direction: Direction,
        result: IapResult<()>,
    },
    DataPathRemoved {
        stream_lid: Lid,
        direction: Direction,
        result: IapResult<()>,
    },
    Quality {
        stream_lid: Lid,
        result: IapResult<QualityReport>,
    },
    TestModeStarted {
        stream_lid: Lid,
        result: IapResult<()>,
    },
    TestModeCounters {
        stream_lid: Lid,
        result: IapResult<TmCounters>,
    },
    TestModeStopped {
        stream_lid: Lid,
        result: IapResult<TmCounters>,
    },
}

fn status_of<T>(result: &IapResult<T>) -> u16 {
    match result {
        Ok(_) => GAF_ERR_NO_ERROR,
        Err(err) => err.code(),
    }
}

impl IapEvent {
    pub fn msg_code(&self) -> MsgCode {
        let offset = match self {
            IapEvent::GroupEnabled { .. } => IAP_IND_GROUP_ENABLED,
            IapEvent::GroupDisabled { .. } => IAP_IND_GROUP_DISABLED,
            IapEvent::StreamDisabled { .. } => IAP_IND_STREAM_DISABLED,
            IapEvent::DataPathSetUp { .. } => IAP_IND_DP_SETUP,
            IapEvent::DataPathRemoved { .. } => IAP_IND_DP_REMOVED,
            IapEvent::Quality { .. } => IAP_IND_QUALITY,
            IapEvent::TestModeStarted { .. } => IAP_IND_TM_STARTED,
            IapEvent::TestModeCounters { .. } => IAP_IND_TM_COUNTERS,
            IapEvent::TestModeStopped { .. } => IAP_IND_TM_STOPPED,
        };
        MsgCode::with_kind(Module::Iap, MsgKind::Indication, offset)
    }

    /// Encode as an indication message: status, then the local indexes concerned
    pub fn to_message(&self) -> Message {
        let (status, payload) = match self {
            IapEvent::GroupEnabled { group_lid, result } => {
                let mut payload = vec![*group_lid];
                if let Ok(cfg) = result {
                    payload.push(cfg.streams.len() as u8);
                    for stream in &cfg.streams {
                        payload.push(stream.stream_lid);
                        payload.extend_from_slice(&stream.conhdl.to_le_bytes());
                    }
                }
                (status_of(result), payload)
            }
            IapEvent::GroupDisabled { group_lid, result } => (status_of(result), vec![*group_lid]),
            IapEvent::StreamDisabled {
                group_lid,
                stream_lid,
                reason,
            } => (GAF_ERR_NO_ERROR, vec![*group_lid, *stream_lid, *reason as u8]),
            IapEvent::DataPathSetUp {
                stream_lid,
                direction,
                result,
            }
            | IapEvent::DataPathRemoved {
                stream_lid,
                direction,
                result,
            } => (status_of(result), vec![*stream_lid, *direction as u8]),
            IapEvent::Quality { stream_lid, result } => {
                let mut payload = vec![*stream_lid];
                if let Ok(report) = result {
                    for value in [
                        report.tx_unacked_packets,
                        report.tx_flushed_packets,
                        report.tx_last_subevent_packets,
                        report.retransmitted_packets,
                        report.crc_error_packets,
                        report.rx_unreceived_packets,
                        report.duplicate_packets,
                    ] {
                        payload.extend_from_slice(&value.to_le_bytes());
                    }
                }
                (status_of(result), payload)
            }
            IapEvent::TestModeStarted { stream_lid, result } => {
                (status_of(result), vec![*stream_lid])
            }
            IapEvent::TestModeCounters { stream_lid, result }
            | IapEvent::TestModeStopped { stream_lid, result } => {
                let mut payload = vec![*stream_lid];
                if let Ok(counters) = result {
                    for value in [counters.received, counters.missed, counters.failed] {
                        payload.extend_from_slice(&value.to_le_bytes());
                    }
                }
                (status_of(result), payload)
            }
        };
        Message::with_status(self.msg_code(), status, payload)
    }
}
