//! Types shared by every GAF message

use super::constants::*;
use std::fmt;
use thiserror::Error;

/// Errors raised while encoding or decoding messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MsgError {
    #[error("Message too short: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Length field {declared} does not match {available} remaining bytes")]
    LengthMismatch { declared: usize, available: usize },

    #[error("Variable length field of {0} bytes exceeds 255")]
    FieldTooLong(usize),

    #[error("Unknown message code 0x{0:04x}")]
    UnknownCode(u16),
}

impl MsgError {
    /// 16-bit status carried in messages
    pub fn code(&self) -> u16 {
        let local = match self {
            MsgError::UnknownCode(_) => GAF_ERR_UNKNOWN_CODE,
            _ => GAF_ERR_INVALID_MESSAGE,
        };
        Layer::Common.status(local)
    }
}

/// Result type for message operations
pub type MsgResult<T> = Result<T, MsgError>;

/// GAF layer, stored in bits [15:12] of a message code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Common,
    Iap,
    Arc,
    Acc,
    Atc,
    Bap,
    Tmap,
    Hap,
    Cap,
    /// Nibble value with no assigned layer
    Reserved(u8),
}

impl Layer {
    /// Layer identifier as a 4-bit value
    pub fn id(&self) -> u8 {
        match self {
            Layer::Common => GAF_LAYER_COMMON,
            Layer::Iap => GAF_LAYER_IAP,
            Layer::Arc => GAF_LAYER_ARC,
            Layer::Acc => GAF_LAYER_ACC,
            Layer::Atc => GAF_LAYER_ATC,
            Layer::Bap => GAF_LAYER_BAP,
            Layer::Tmap => GAF_LAYER_TMAP,
            Layer::Hap => GAF_LAYER_HAP,
            Layer::Cap => GAF_LAYER_CAP,
            Layer::Reserved(value) => value & 0x0F,
        }
    }

    /// Layer from the low nibble of `value`. Every nibble maps to a layer.
    pub fn from_id(value: u8) -> Self {
        match value & 0x0F {
            GAF_LAYER_COMMON => Layer::Common,
            GAF_LAYER_IAP => Layer::Iap,
            GAF_LAYER_ARC => Layer::Arc,
            GAF_LAYER_ACC => Layer::Acc,
            GAF_LAYER_ATC => Layer::Atc,
            GAF_LAYER_BAP => Layer::Bap,
            GAF_LAYER_TMAP => Layer::Tmap,
            GAF_LAYER_HAP => Layer::Hap,
            GAF_LAYER_CAP => Layer::Cap,
            other => Layer::Reserved(other),
        }
    }

    /// Build a 16-bit status value for an error local to this layer
    pub fn status(&self, local_code: u8) -> u16 {
        ((self.id() as u16) << 8) | local_code as u16
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Reserved(value) => write!(f, "RSVD({})", value),
            other => write!(f, "{:?}", other),
        }
    }
}

/// GAF module, identified by its layer and a 4-bit module id within that layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    Common,
    Iap,
    AccMcs,
    AccMcc,
    AccTbs,
    AccTbc,
    AccOts,
    AccOtc,
    Bap,
    BapCapaSrv,
    BapCapaCli,
    BapUcSrv,
    BapUcCli,
    BapBcSrc,
    BapBcSink,
    BapBcAssist,
    BapBcDeleg,
}

impl Module {
    /// Layer owning the module
    pub fn layer(&self) -> Layer {
        match self {
            Module::Common => Layer::Common,
            Module::Iap => Layer::Iap,
            Module::AccMcs
            | Module::AccMcc
            | Module::AccTbs
            | Module::AccTbc
            | Module::AccOts
            | Module::AccOtc => Layer::Acc,
            _ => Layer::Bap,
        }
    }

    /// Module identifier within its layer
    pub fn id(&self) -> u8 {
        match self {
            Module::Common => GAF_MODULE_COMMON,
            Module::Iap => IAP_MODULE_IAP,
            Module::AccMcs => ACC_MODULE_MCS,
            Module::AccMcc => ACC_MODULE_MCC,
            Module::AccTbs => ACC_MODULE_TBS,
            Module::AccTbc => ACC_MODULE_TBC,
            Module::AccOts => ACC_MODULE_OTS,
            Module::AccOtc => ACC_MODULE_OTC,
            Module::Bap => BAP_MODULE_COMMON,
            Module::BapCapaSrv => BAP_MODULE_CAPA_SRV,
            Module::BapCapaCli => BAP_MODULE_CAPA_CLI,
            Module::BapUcSrv => BAP_MODULE_UC_SRV,
            Module::BapUcCli => BAP_MODULE_UC_CLI,
            Module::BapBcSrc => BAP_MODULE_BC_SRC,
            Module::BapBcSink => BAP_MODULE_BC_SINK,
            Module::BapBcAssist => BAP_MODULE_BC_ASSIST,
            Module::BapBcDeleg => BAP_MODULE_BC_DELEG,
        }
    }

    /// Look up a module from its layer and module id
    pub fn from_parts(layer: Layer, id: u8) -> Option<Self> {
        let module = match (layer, id) {
            (Layer::Common, GAF_MODULE_COMMON) => Module::Common,
            (Layer::Iap, IAP_MODULE_IAP) => Module::Iap,
            (Layer::Acc, ACC_MODULE_MCS) => Module::AccMcs,
            (Layer::Acc, ACC_MODULE_MCC) => Module::AccMcc,
            (Layer::Acc, ACC_MODULE_TBS) => Module::AccTbs,
            (Layer::Acc, ACC_MODULE_TBC) => Module::AccTbc,
            (Layer::Acc, ACC_MODULE_OTS) => Module::AccOts,
            (Layer::Acc, ACC_MODULE_OTC) => Module::AccOtc,
            (Layer::Bap, BAP_MODULE_COMMON) => Module::Bap,
            (Layer::Bap, BAP_MODULE_CAPA_SRV) => Module::BapCapaSrv,
            (Layer::Bap, BAP_MODULE_CAPA_CLI) => Module::BapCapaCli,
            (Layer::Bap, BAP_MODULE_UC_SRV) => Module::BapUcSrv,
            (Layer::Bap, BAP_MODULE_UC_CLI) => Module::BapUcCli,
            (Layer::Bap, BAP_MODULE_BC_SRC) => Module::BapBcSrc,
            (Layer::Bap, BAP_MODULE_BC_SINK) => Module::BapBcSink,
            (Layer::Bap, BAP_MODULE_BC_ASSIST) => Module::BapBcAssist,
            (Layer::Bap, BAP_MODULE_BC_DELEG) => Module::BapBcDeleg,
            _ => return None,
        };
        Some(module)
    }
}

/// Kind of message, derived from the range its index falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgKind {
    /// Command, answered by a command-complete
    Command,
    /// Request, answered synchronously by a response
    Request,
    /// Indication sent to the upper layer
    Indication,
    /// Request indication, the upper layer must confirm it
    RequestIndication,
}

impl MsgKind {
    /// First message index of the range
    pub fn base(&self) -> u8 {
        match self {
            MsgKind::Command => MSG_INDEX_CMD_BASE,
            MsgKind::Request => MSG_INDEX_REQ_BASE,
            MsgKind::Indication => MSG_INDEX_IND_BASE,
            MsgKind::RequestIndication => MSG_INDEX_REQ_IND_BASE,
        }
    }

    /// Kind of message for a given index
    pub fn of_index(index: u8) -> Self {
        match index {
            i if i >= MSG_INDEX_REQ_IND_BASE => MsgKind::RequestIndication,
            i if i >= MSG_INDEX_IND_BASE => MsgKind::Indication,
            i if i >= MSG_INDEX_REQ_BASE => MsgKind::Request,
            _ => MsgKind::Command,
        }
    }
}
