//! Indications delivered to the upper layer

use super::constants::*;
use super::types::*;
use crate::lid::Lid;
use crate::msg::{write_var16, Message, Module, MsgCode, MsgKind, MsgResult};

/// Outcome reported by the bearer server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TbsEvent {
    /// Characteristic value to send to a client that enabled notifications
    Notify {
        con_lid: Lid,
        bearer_lid: Lid,
        chr: TbsChar,
        value: Vec<u8>,
    },
    /// A client asked for a call action the telephony stack has to carry out
    CallRequest {
        con_lid: Lid,
        bearer_lid: Lid,
        call_id: Lid,
        opcode: CpOpcode,
    },
    /// A call was removed
    CallTerminated {
        bearer_lid: Lid,
        call_id: Lid,
        reason: TermReason,
    },
}

impl TbsEvent {
    pub fn msg_code(&self) -> MsgCode {
        let offset = match self {
            TbsEvent::Notify { .. } => TBS_IND_NOTIFY,
            TbsEvent::CallRequest { .. } => TBS_IND_CALL_REQUEST,
            TbsEvent::CallTerminated { .. } => TBS_IND_CALL_TERMINATED,
        };
        MsgCode::with_kind(Module::AccTbs, MsgKind::Indication, offset)
    }

    /// Encode as an indication message
    pub fn to_message(&self) -> MsgResult<Message> {
        let payload = match self {
            TbsEvent::Notify {
                con_lid,
                bearer_lid,
                chr,
                value,
            } => {
                let mut payload = vec![*con_lid, *bearer_lid, *chr as u8];
                write_var16(&mut payload, value)?;
                payload
            }
            TbsEvent::CallRequest {
                con_lid,
                bearer_lid,
                call_id,
                opcode,
            } => vec![*con_lid, *bearer_lid, *call_id, *opcode as u8],
            TbsEvent::CallTerminated {
                bearer_lid,
                call_id,
                reason,
            } => vec![*bearer_lid, *call_id, *reason as u8],
        };
        Ok(Message::new(self.msg_code(), payload))
    }
}
