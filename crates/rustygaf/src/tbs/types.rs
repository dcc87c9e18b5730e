//! Type definitions for the Telephone Bearer Service server

use super::constants::*;
use crate::lid::Lid;
use crate::msg::Layer;
use bitflags::bitflags;
use std::fmt;
use thiserror::Error;

/// Errors reported to the upper layer by TBS operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TbsError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Command disallowed")]
    CommandDisallowed,

    #[error("Telephone bearer server not configured")]
    NotConfigured,

    #[error("Insufficient resources")]
    InsufficientResources,

    #[error("Bearer not found")]
    BearerNotFound,

    #[error("Call not found")]
    CallNotFound,

    #[error("Call state mismatch")]
    StateMismatch,

    #[error("Feature not supported by bearer")]
    FeatureNotSupported,

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Operation not possible")]
    OperationNotPossible,
}

impl TbsError {
    pub fn local_code(&self) -> u8 {
        match self {
            TbsError::InvalidParam(_) => TBS_ERR_INVALID_PARAM,
            TbsError::CommandDisallowed => TBS_ERR_COMMAND_DISALLOWED,
            TbsError::NotConfigured => TBS_ERR_NOT_CONFIGURED,
            TbsError::InsufficientResources => TBS_ERR_INSUFFICIENT_RESOURCES,
            TbsError::BearerNotFound => TBS_ERR_BEARER_NOT_FOUND,
            TbsError::CallNotFound => TBS_ERR_CALL_NOT_FOUND,
            TbsError::StateMismatch => TBS_ERR_STATE_MISMATCH,
            TbsError::FeatureNotSupported => TBS_ERR_FEATURE_NOT_SUPPORTED,
            TbsError::InvalidUri(_) => TBS_ERR_INVALID_URI,
            TbsError::OperationNotPossible => TBS_ERR_OPERATION_NOT_POSSIBLE,
        }
    }

    /// 16-bit status carried in messages
    pub fn code(&self) -> u16 {
        Layer::Acc.status(self.local_code())
    }
}

/// Result type for TBS operations
pub type TbsResult<T> = Result<T, TbsError>;

/// Call state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CallState {
    Incoming = TBS_CALL_STATE_INCOMING,
    Dialing = TBS_CALL_STATE_DIALING,
    Alerting = TBS_CALL_STATE_ALERTING,
    Active = TBS_CALL_STATE_ACTIVE,
    LocallyHeld = TBS_CALL_STATE_LOCALLY_HELD,
    RemotelyHeld = TBS_CALL_STATE_REMOTELY_HELD,
    LocallyAndRemotelyHeld = TBS_CALL_STATE_LOCALLY_AND_REMOTELY_HELD,
}

impl CallState {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            TBS_CALL_STATE_INCOMING => Some(CallState::Incoming),
            TBS_CALL_STATE_DIALING => Some(CallState::Dialing),
            TBS_CALL_STATE_ALERTING => Some(CallState::Alerting),
            TBS_CALL_STATE_ACTIVE => Some(CallState::Active),
            TBS_CALL_STATE_LOCALLY_HELD => Some(CallState::LocallyHeld),
            TBS_CALL_STATE_REMOTELY_HELD => Some(CallState::RemotelyHeld),
            TBS_CALL_STATE_LOCALLY_AND_REMOTELY_HELD => Some(CallState::LocallyAndRemotelyHeld),
            _ => None,
        }
    }
}

/// Reason a call was terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TermReason {
    /// Originating URI was malformed
    UriMalformed = TBS_TERM_REASON_URI,
    CallFail = TBS_TERM_REASON_CALL_FAIL,
    RemoteEnd = TBS_TERM_REASON_REMOTE_END,
    ServerEnd = TBS_TERM_REASON_SERVER_END,
    LineBusy = TBS_TERM_REASON_LINE_BUSY,
    NetworkCongestion = TBS_TERM_REASON_NETWORK_CONGESTION,
    ClientEnd = TBS_TERM_REASON_CLIENT_END,
    NoService = TBS_TERM_REASON_NO_SERVICE,
    NoAnswer = TBS_TERM_REASON_NO_ANSWER,
    Unspecified = TBS_TERM_REASON_UNSPECIFIED,
}

impl TermReason {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            TBS_TERM_REASON_URI => Some(TermReason::UriMalformed),
            TBS_TERM_REASON_CALL_FAIL => Some(TermReason::CallFail),
            TBS_TERM_REASON_REMOTE_END => Some(TermReason::RemoteEnd),
            TBS_TERM_REASON_SERVER_END => Some(TermReason::ServerEnd),
            TBS_TERM_REASON_LINE_BUSY => Some(TermReason::LineBusy),
            TBS_TERM_REASON_NETWORK_CONGESTION => Some(TermReason::NetworkCongestion),
            TBS_TERM_REASON_CLIENT_END => Some(TermReason::ClientEnd),
            TBS_TERM_REASON_NO_SERVICE => Some(TermReason::NoService),
            TBS_TERM_REASON_NO_ANSWER => Some(TermReason::NoAnswer),
            TBS_TERM_REASON_UNSPECIFIED => Some(TermReason::Unspecified),
            _ => None,
        }
    }
}

/// Call Control Point opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CpOpcode {
    Accept = TBS_OPCODE_ACCEPT,
    Terminate = TBS_OPCODE_TERMINATE,
    LocalHold = TBS_OPCODE_LOCAL_HOLD,
    LocalRetrieve = TBS_OPCODE_LOCAL_RETRIEVE,
    Originate = TBS_OPCODE_ORIGINATE,
    Join = TBS_OPCODE_JOIN,
}

impl CpOpcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            TBS_OPCODE_ACCEPT => Some(CpOpcode::Accept),
            TBS_OPCODE_TERMINATE => Some(CpOpcode::Terminate),
            TBS_OPCODE_LOCAL_HOLD => Some(CpOpcode::LocalHold),
            TBS_OPCODE_LOCAL_RETRIEVE => Some(CpOpcode::LocalRetrieve),
            TBS_OPCODE_ORIGINATE => Some(CpOpcode::Originate),
            TBS_OPCODE_JOIN => Some(CpOpcode::Join),
            _ => None,
        }
    }
}

/// Call Control Point result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CpResult {
    Success = TBS_CP_RESULT_SUCCESS,
    OpcodeNotSupported = TBS_CP_RESULT_OPCODE_NOT_SUPPORTED,
    OperationNotPossible = TBS_CP_RESULT_OP_NOT_POSSIBLE,
    InvalidCallIndex = TBS_CP_RESULT_INVALID_CALL_INDEX,
    StateMismatch = TBS_CP_RESULT_STATE_MISMATCH,
    LackOfResources = TBS_CP_RESULT_LACK_OF_RESOURCES,
    InvalidOutgoingUri = TBS_CP_RESULT_INVALID_OUTGOING_URI,
}

/// Call Control Point notification value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpNotification {
    /// Opcode as written by the client, possibly unknown
    pub opcode: u8,
    pub call_index: Lid,
    pub result: CpResult,
}

impl CpNotification {
    pub fn to_bytes(&self) -> [u8; 3] {
        [self.opcode, self.call_index, self.result as u8]
    }
}

/// Bearer technology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Technology {
    ThreeG = 0x01,
    FourG = 0x02,
    Lte = 0x03,
    WiFi = 0x04,
    FiveG = 0x05,
    Gsm = 0x06,
    Cdma = 0x07,
    TwoG = 0x08,
    Wcdma = 0x09,
}

impl Technology {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Technology::ThreeG),
            0x02 => Some(Technology::FourG),
            0x03 => Some(Technology::Lte),
            0x04 => Some(Technology::WiFi),
            0x05 => Some(Technology::FiveG),
            0x06 => Some(Technology::Gsm),
            0x07 => Some(Technology::Cdma),
            0x08 => Some(Technology::TwoG),
            0x09 => Some(Technology::Wcdma),
            _ => None,
        }
    }
}

bitflags! {
    /// Optional characteristics supported by a bearer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BearerCfg: u8 {
        const SIGNAL_STRENGTH = 0x01;
        const INCOMING_TARGET_URI = 0x02;
        const FRIENDLY_NAME = 0x04;
        /// URI schemes list changes are notified
        const URI_SCHEMES_NOTIFY = 0x08;
    }
}

bitflags! {
    /// Optional Call Control Point opcodes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OptOpcodes: u16 {
        const LOCAL_HOLD = 0x0001;
        const JOIN = 0x0002;
    }
}

bitflags! {
    /// Bearer status flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u16 {
        const INBAND_RINGTONE = 0x0001;
        const SILENT_MODE = 0x0002;
    }
}

bitflags! {
    /// Call flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CallFlags: u8 {
        const OUTGOING = 0x01;
        const WITHHELD_BY_SERVER = 0x02;
        const WITHHELD_BY_NETWORK = 0x04;
    }
}

/// Bearer characteristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TbsChar {
    ProviderName = 0,
    Uci = 1,
    Technology = 2,
    UriSchemes = 3,
    SignalStrength = 4,
    SignalStrengthIntv = 5,
    CurrentCalls = 6,
    Ccid = 7,
    StatusFlags = 8,
    IncomingTargetUri = 9,
    CallState = 10,
    CallControlPoint = 11,
    CpOptOpcodes = 12,
    TerminationReason = 13,
    IncomingCall = 14,
    FriendlyName = 15,
}

impl TbsChar {
    /// Whether the characteristic has a client configuration descriptor
    pub fn is_notifiable(&self) -> bool {
        !matches!(
            self,
            TbsChar::Uci | TbsChar::SignalStrengthIntv | TbsChar::Ccid | TbsChar::CpOptOpcodes
        )
    }

    /// Position of the characteristic in the client configuration bit field
    pub fn cfg_bit(&self) -> u32 {
        1 << (*self as u32)
    }
}

impl fmt::Display for TbsChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Server configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TbsConfig {
    /// Number of bearer instances
    pub nb_tbs: usize,
    /// Number of calls that can exist at the same time, all bearers together
    pub call_pool_size: usize,
    /// Longest URI a pooled call can store
    pub call_pool_uri_len: usize,
    /// Number of client connections tracked for client configuration
    pub nb_connections: usize,
}

impl Default for TbsConfig {
    fn default() -> Self {
        Self {
            nb_tbs: TBS_DEFAULT_NB_TBS,
            call_pool_size: TBS_DEFAULT_CALL_POOL_SIZE,
            call_pool_uri_len: TBS_DEFAULT_CALL_POOL_URI_LEN,
            nb_connections: TBS_DEFAULT_NB_CONNECTIONS,
        }
    }
}

impl TbsConfig {
    pub fn validate(&self) -> TbsResult<()> {
        let checks = [
            ("number of bearers", self.nb_tbs, 1, TBS_NB_TBS_MAX),
            ("call pool size", self.call_pool_size, 1, TBS_CALL_POOL_SIZE_MAX),
            ("URI length", self.call_pool_uri_len, TBS_URI_LEN_MIN, TBS_URI_LEN_MAX),
            ("number of connections", self.nb_connections, 1, TBS_NB_CONNECTIONS_MAX),
        ];
        for (name, value, min, max) in checks {
            if value < min || value > max {
                return Err(TbsError::InvalidParam(format!(
                    "{} {} outside [{}, {}]",
                    name, value, min, max
                )));
            }
        }
        Ok(())
    }
}

/// Parameters of a bearer instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerParam {
    pub cfg: BearerCfg,
    /// Content control ID
    pub ccid: u8,
    pub opt_opcodes: OptOpcodes,
    pub provider_name: String,
    /// Uniform caller identifier, e.g. "un000"
    pub uci: String,
    pub technology: Technology,
    /// Comma separated URI schemes, e.g. "tel,sip"
    pub uri_schemes: String,
    /// Signal strength reporting interval in seconds, 0 reports every change
    pub signal_strength_intv_s: u8,
}

impl Default for BearerParam {
    fn default() -> Self {
        Self {
            cfg: BearerCfg::empty(),
            ccid: 0,
            opt_opcodes: OptOpcodes::empty(),
            provider_name: String::from("Unknown"),
            uci: String::from("un000"),
            technology: Technology::Lte,
            uri_schemes: String::from("tel"),
            signal_strength_intv_s: 0,
        }
    }
}

/// Local action on a call requested by the upper layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallAction {
    Accept,
    Terminate(TermReason),
    Hold,
    Retrieve,
}
