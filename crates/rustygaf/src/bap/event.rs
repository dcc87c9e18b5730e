//! Indications delivered to the upper layer

use super::constants::*;
use super::types::BapRoles;
use crate::msg::{Message, Module, MsgCode, MsgKind};

/// Outcome reported by the basic audio profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BapEvent {
    /// Roles are set up and their modules may be used
    Configured { roles: BapRoles },
}

impl BapEvent {
    pub fn msg_code(&self) -> MsgCode {
        match self {
            BapEvent::Configured { .. } => {
                MsgCode::with_kind(Module::Bap, MsgKind::Indication, BAP_IND_CONFIGURED)
            }
        }
    }

    pub fn to_message(&self) -> Message {
        let payload = match self {
            BapEvent::Configured { roles } => vec![roles.bits()],
        };
        Message::new(self.msg_code(), payload)
    }
}
