//! Type definitions for the Isochronous Access Profile layer

use super::constants::*;
use crate::codec::types::{check_max, check_sdu_intv, check_tlatency};
use crate::codec::{CodecError, DpConfig, Framing, Packing, PhyBf, MAX_SDU_MAX, RTN_MAX};
use crate::lid::Lid;
use crate::msg::Layer;
use rand::RngCore;
use std::fmt;
use thiserror::Error;

/// Errors reported by IAP operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IapError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Command disallowed in current state")]
    CommandDisallowed,

    #[error("Insufficient resources")]
    InsufficientResources,

    #[error("No group available")]
    NoGroupAvailable,

    #[error("No stream available")]
    NoStreamAvailable,

    #[error("Group with ID {0} already exists")]
    GroupAlreadyExists(u8),

    #[error("Group not found")]
    GroupNotFound,

    #[error("Stream not found")]
    StreamNotFound,

    #[error("Interface not found")]
    InterfaceNotFound,

    #[error("Stream not enabled")]
    StreamNotEnabled,

    #[error("Data path not configured")]
    DpNotConfigured,

    #[error("Data path already set up")]
    DpSetup,

    #[error("Data path not set up")]
    DpNotSetup,

    #[error("Procedure already in progress")]
    Busy,

    #[error("Procedure cancelled")]
    Cancelled,

    #[error("Synchronization lost")]
    SyncLost,

    #[error("MIC failure")]
    MicError,

    #[error("Lower layer error 0x{0:02x}")]
    LlError(u8),
}

impl IapError {
    /// Error code local to the IAP layer
    pub fn local_code(&self) -> u8 {
        match self {
            IapError::InvalidParam(_) => IAP_ERR_INVALID_PARAM,
            IapError::CommandDisallowed => IAP_ERR_COMMAND_DISALLOWED,
            IapError::InsufficientResources => IAP_ERR_INSUFFICIENT_RESOURCES,
            IapError::NoGroupAvailable => IAP_ERR_NO_GROUP_AVAILABLE,
            IapError::NoStreamAvailable => IAP_ERR_NO_STREAM_AVAILABLE,
            IapError::GroupAlreadyExists(_) => IAP_ERR_GROUP_ALREADY_EXISTS,
            IapError::GroupNotFound => IAP_ERR_GROUP_NOT_FOUND,
            IapError::StreamNotFound => IAP_ERR_STREAM_NOT_FOUND,
            IapError::InterfaceNotFound => IAP_ERR_INTERFACE_NOT_FOUND,
            IapError::StreamNotEnabled => IAP_ERR_STREAM_NOT_ENABLED,
            IapError::DpNotConfigured => IAP_ERR_DP_NOT_CONFIGURED,
            IapError::DpSetup => IAP_ERR_DP_SETUP,
            IapError::DpNotSetup => IAP_ERR_DP_NOT_SETUP,
            IapError::Busy => IAP_ERR_BUSY,
            IapError::Cancelled => IAP_ERR_CANCELLED,
            IapError::SyncLost => IAP_ERR_SYNC_LOST,
            IapError::MicError => IAP_ERR_MIC_ERROR,
            IapError::LlError(_) => IAP_ERR_LL_ERROR,
        }
    }

    /// 16-bit status carried in messages
    pub fn code(&self) -> u16 {
        Layer::Iap.status(self.local_code())
    }

    /// Map a controller status to a result
    pub fn from_hci(status: u8) -> IapResult<()> {
        match status {
            HCI_SUCCESS => Ok(()),
            other => Err(IapError::LlError(other)),
        }
    }
}

impl From<CodecError> for IapError {
    fn from(err: CodecError) -> Self {
        IapError::InvalidParam(err.to_string())
    }
}

/// Result type for IAP operations
pub type IapResult<T> = Result<T, IapError>;

fn check_range<T: PartialOrd + fmt::Display>(name: &str, value: T, min: T, max: T) -> IapResult<()> {
    if value < min || value > max {
        return Err(IapError::InvalidParam(format!(
            "{} {} outside [{}, {}]",
            name, value, min, max
        )));
    }
    Ok(())
}

fn check_phy(name: &str, phy: PhyBf) -> IapResult<()> {
    if phy.is_empty() {
        return Err(IapError::InvalidParam(format!("{} has no PHY", name)));
    }
    Ok(())
}

pub(crate) fn check_group_id(kind: GroupKind, id: u8) -> IapResult<()> {
    match kind {
        GroupKind::Unicast => check_range("CIG ID", id, 0, IAP_CIG_ID_MAX),
        GroupKind::Broadcast => check_range("BIG ID", id, 0, IAP_BIG_ID_MAX),
    }
}

pub(crate) fn check_cis_id(id: u8) -> IapResult<()> {
    check_range("CIS ID", id, 0, IAP_CIS_ID_MAX)
}

/// Unicast group parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UgParam {
    /// SDU interval central to peripheral in microseconds
    pub sdu_intv_m2s_us: u32,
    /// SDU interval peripheral to central in microseconds
    pub sdu_intv_s2m_us: u32,
    pub packing: Packing,
    pub framing: Framing,
    /// Worst case sleep clock accuracy of all peripherals
    pub sca: u8,
    /// Maximum transport latency central to peripheral in milliseconds
    pub tlatency_m2s_ms: u16,
    /// Maximum transport latency peripheral to central in milliseconds
    pub tlatency_s2m_ms: u16,
}

impl UgParam {
    pub fn validate(&self) -> IapResult<()> {
        check_sdu_intv("SDU interval M2S", self.sdu_intv_m2s_us)?;
        check_sdu_intv("SDU interval S2M", self.sdu_intv_s2m_us)?;
        check_tlatency("transport latency M2S", self.tlatency_m2s_ms)?;
        check_tlatency("transport latency S2M", self.tlatency_s2m_ms)?;
        check_range("SCA", self.sca, 0, IAP_SCA_MAX)
    }
}

/// Unicast group parameters for test mode, expressed in link layer terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UgTestParam {
    pub sdu_intv_m2s_us: u32,
    pub sdu_intv_s2m_us: u32,
    /// Flush timeout central to peripheral, in ISO intervals
    pub ft_m2s: u8,
    /// Flush timeout peripheral to central, in ISO intervals
    pub ft_s2m: u8,
    /// ISO interval in units of 1.25 ms
    pub iso_intv_frames: u16,
    pub packing: Packing,
    pub framing: Framing,
    pub sca: u8,
}

impl UgTestParam {
    pub fn validate(&self) -> IapResult<()> {
        check_sdu_intv("SDU interval M2S", self.sdu_intv_m2s_us)?;
        check_sdu_intv("SDU interval S2M", self.sdu_intv_s2m_us)?;
        check_range("flush timeout M2S", self.ft_m2s, IAP_FT_MIN, u8::MAX)?;
        check_range("flush timeout S2M", self.ft_s2m, IAP_FT_MIN, u8::MAX)?;
        check_range(
            "ISO interval",
            self.iso_intv_frames,
            IAP_ISO_INTV_FRAMES_MIN,
            IAP_ISO_INTV_FRAMES_MAX,
        )?;
        check_range("SCA", self.sca, 0, IAP_SCA_MAX)
    }
}

/// Unicast stream parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsParam {
    pub max_sdu_m2s: u16,
    pub max_sdu_s2m: u16,
    pub phy_m2s: PhyBf,
    pub phy_s2m: PhyBf,
    /// Retransmission number central to peripheral
    pub rtn_m2s: u8,
    /// Retransmission number peripheral to central
    pub rtn_s2m: u8,
}

impl UsParam {
    pub fn validate(&self) -> IapResult<()> {
        check_max("max SDU M2S", self.max_sdu_m2s as u32, MAX_SDU_MAX as u32)?;
        check_max("max SDU S2M", self.max_sdu_s2m as u32, MAX_SDU_MAX as u32)?;
        check_phy("PHY M2S", self.phy_m2s)?;
        check_phy("PHY S2M", self.phy_s2m)?;
        check_range("retransmission number M2S", self.rtn_m2s, 0, RTN_MAX)?;
        check_range("retransmission number S2M", self.rtn_s2m, 0, RTN_MAX)
    }
}

/// Unicast stream parameters for test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsTestParam {
    /// Maximum number of subevents in each ISO event
    pub nse: u8,
    pub max_sdu_m2s: u16,
    pub max_sdu_s2m: u16,
    pub max_pdu_m2s: u16,
    pub max_pdu_s2m: u16,
    pub phy_m2s: PhyBf,
    pub phy_s2m: PhyBf,
    /// Burst number central to peripheral, 0 if no data in that direction
    pub bn_m2s: u8,
    /// Burst number peripheral to central, 0 if no data in that direction
    pub bn_s2m: u8,
}

impl UsTestParam {
    pub fn validate(&self) -> IapResult<()> {
        check_range("NSE", self.nse, IAP_NSE_MIN, IAP_NSE_MAX)?;
        check_max("max SDU M2S", self.max_sdu_m2s as u32, MAX_SDU_MAX as u32)?;
        check_max("max SDU S2M", self.max_sdu_s2m as u32, MAX_SDU_MAX as u32)?;
        check_range("max PDU M2S", self.max_pdu_m2s, 0, IAP_MAX_PDU_MAX)?;
        check_range("max PDU S2M", self.max_pdu_s2m, 0, IAP_MAX_PDU_MAX)?;
        check_phy("PHY M2S", self.phy_m2s)?;
        check_phy("PHY S2M", self.phy_s2m)?;
        check_range("BN M2S", self.bn_m2s, 0, IAP_BN_MAX)?;
        check_range("BN S2M", self.bn_s2m, 0, IAP_BN_MAX)
    }
}

/// Broadcast group parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BgParam {
    pub sdu_intv_us: u32,
    pub max_sdu: u16,
    pub max_tlatency_ms: u16,
    pub packing: Packing,
    pub framing: Framing,
    pub phy_bf: PhyBf,
    pub rtn: u8,
}

impl BgParam {
    pub fn validate(&self) -> IapResult<()> {
        check_sdu_intv("SDU interval", self.sdu_intv_us)?;
        check_range("max SDU", self.max_sdu, 1, MAX_SDU_MAX)?;
        check_tlatency("max transport latency", self.max_tlatency_ms)?;
        check_phy("PHY", self.phy_bf)?;
        check_range("retransmission number", self.rtn, 0, RTN_MAX)
    }
}

/// Broadcast group parameters for test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BgTestParam {
    pub sdu_intv_us: u32,
    pub iso_intv_frames: u16,
    pub nse: u8,
    pub max_sdu: u16,
    pub max_pdu: u16,
    pub phy_bf: PhyBf,
    pub packing: Packing,
    pub framing: Framing,
    /// Burst number
    pub bn: u8,
    /// Immediate repetition count
    pub irc: u8,
    /// Pre-transmission offset
    pub pto: u8,
}

impl BgTestParam {
    pub fn validate(&self) -> IapResult<()> {
        check_sdu_intv("SDU interval", self.sdu_intv_us)?;
        check_range(
            "ISO interval",
            self.iso_intv_frames,
            IAP_ISO_INTV_FRAMES_MIN,
            IAP_ISO_INTV_FRAMES_MAX,
        )?;
        check_range("NSE", self.nse, IAP_NSE_MIN, IAP_NSE_MAX)?;
        check_range("max SDU", self.max_sdu, 1, MAX_SDU_MAX)?;
        check_range("max PDU", self.max_pdu, 1, IAP_MAX_PDU_MAX)?;
        check_phy("PHY", self.phy_bf)?;
        check_range("BN", self.bn, IAP_BIG_BN_MIN, IAP_BIG_BN_MAX)?;
        check_range("IRC", self.irc, IAP_IRC_MIN, IAP_IRC_MAX)?;
        check_range("PTO", self.pto, 0, IAP_PTO_MAX)
    }
}

/// Parameters to synchronize with a remote broadcast group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgSyncParam {
    /// Periodic advertising synchronization handle carrying the BIGInfo
    pub sync_handle: u16,
    /// BIS indices to synchronize with
    pub bis_indices: Vec<u8>,
    /// Maximum subevents used to receive data, 0 lets the controller decide
    pub mse: u8,
    /// Synchronization timeout in units of 10 ms
    pub sync_timeout_10ms: u16,
    pub code: Option<BroadcastCode>,
}

impl BgSyncParam {
    pub fn validate(&self) -> IapResult<()> {
        check_range("sync handle", self.sync_handle, 0, IAP_SYNC_HANDLE_MAX)?;
        check_range(
            "number of BIS",
            self.bis_indices.len(),
            1,
            IAP_NB_STREAMS_PER_GROUP_MAX,
        )?;
        for (i, index) in self.bis_indices.iter().enumerate() {
            check_range("BIS index", *index, IAP_BIS_INDEX_MIN, IAP_BIS_INDEX_MAX)?;
            if self.bis_indices[..i].contains(index) {
                return Err(IapError::InvalidParam(format!("BIS index {} repeated", index)));
            }
        }
        check_range("MSE", self.mse, 0, IAP_MSE_MAX)?;
        check_range(
            "sync timeout",
            self.sync_timeout_10ms,
            IAP_SYNC_TIMEOUT_MIN,
            IAP_SYNC_TIMEOUT_MAX,
        )
    }
}

/// Broadcast code used to encrypt a broadcast group
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BroadcastCode(pub [u8; IAP_BROADCAST_CODE_LEN]);

impl BroadcastCode {
    /// Generate a random broadcast code
    pub fn random() -> Self {
        let mut bytes = [0u8; IAP_BROADCAST_CODE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        BroadcastCode(bytes)
    }

    /// Parse 32 hexadecimal digits
    pub fn from_hex(value: &str) -> IapResult<Self> {
        let mut bytes = [0u8; IAP_BROADCAST_CODE_LEN];
        hex::decode_to_slice(value.trim(), &mut bytes)
            .map_err(|e| IapError::InvalidParam(format!("broadcast code: {}", e)))?;
        Ok(BroadcastCode(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; IAP_BROADCAST_CODE_LEN] {
        &self.0
    }
}

impl fmt::Debug for BroadcastCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never log the code itself
        write!(f, "BroadcastCode(..)")
    }
}

impl fmt::Display for BroadcastCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Parameters a group was created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupParams {
    Unicast(UgParam),
    UnicastTest(UgTestParam),
    /// Group created on the peripheral side, timing is chosen by the remote central
    UnicastPeripheral,
    Broadcast(BgParam),
    BroadcastTest(BgTestParam),
    BroadcastSync(BgSyncParam),
}

impl GroupParams {
    pub fn kind(&self) -> GroupKind {
        match self {
            GroupParams::Unicast(_)
            | GroupParams::UnicastTest(_)
            | GroupParams::UnicastPeripheral => GroupKind::Unicast,
            _ => GroupKind::Broadcast,
        }
    }
}

/// Parameters a unicast stream was configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamParams {
    Unicast(UsParam),
    UnicastTest(UsTestParam),
}

/// Group kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Connected isochronous group
    Unicast,
    /// Broadcast isochronous group
    Broadcast,
}

/// Stream lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Parameters known, not bound to a connection
    Configured,
    /// Unicast stream bound to a connection by the central
    Bound,
    /// Unicast stream accepted on the peripheral side
    Prepared,
    Enabled,
    Disabled,
}

/// Data path state for one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DpState {
    #[default]
    NotConfigured,
    Configured,
    /// Setup requested, waiting for the controller
    SettingUp,
    SetUp,
    /// Removal requested, waiting for the controller
    Removing,
}

/// Reason a stream left the enabled state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DisableReason {
    UpperRequest = 0,
    PeerRequest = 1,
    SyncLost = 2,
    MicError = 3,
}

impl DisableReason {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DisableReason::UpperRequest),
            1 => Some(DisableReason::PeerRequest),
            2 => Some(DisableReason::SyncLost),
            3 => Some(DisableReason::MicError),
            _ => None,
        }
    }
}

/// Unicast group configuration returned by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UgConfig {
    /// CIG synchronization delay in microseconds
    pub sync_delay_us: u32,
    pub tlatency_m2s_us: u32,
    pub tlatency_s2m_us: u32,
    pub iso_intv_frames: u16,
}

/// Unicast stream configuration returned by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsConfig {
    /// CIS synchronization delay in microseconds
    pub sync_delay_us: u32,
    pub nse: u8,
    pub phy_m2s: u8,
    pub phy_s2m: u8,
    pub ft_m2s: u8,
    pub ft_s2m: u8,
    pub max_pdu_m2s: u16,
    pub max_pdu_s2m: u16,
}

/// Broadcast group configuration returned by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BgConfig {
    pub sync_delay_us: u32,
    pub tlatency_us: u32,
    pub iso_intv_frames: u16,
    pub nse: u8,
    pub bn: u8,
    pub pto: u8,
    pub irc: u8,
    pub max_pdu: u16,
    pub phy: u8,
}

/// Group configuration returned by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupConfig {
    Unicast(UgConfig),
    Broadcast(BgConfig),
}

/// Controller view of one enabled stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamEnabled {
    pub stream_lid: Lid,
    /// Connection handle allocated by the controller
    pub conhdl: u16,
    /// Unicast only
    pub config: Option<UsConfig>,
}

/// Payload of an enabled indication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledConfig {
    pub group: GroupConfig,
    pub streams: Vec<StreamEnabled>,
}

/// Link quality counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityReport {
    pub tx_unacked_packets: u32,
    pub tx_flushed_packets: u32,
    pub tx_last_subevent_packets: u32,
    pub retransmitted_packets: u32,
    pub crc_error_packets: u32,
    pub rx_unreceived_packets: u32,
    pub duplicate_packets: u32,
}

/// Test mode counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TmCounters {
    pub received: u32,
    pub missed: u32,
    pub failed: u32,
}

/// Payload type used in test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TmPayload {
    ZeroLength = 0,
    Variable = 1,
    Maximum = 2,
}

/// Data path per direction of a stream
#[derive(Debug, Clone, Default)]
pub struct DataPath {
    pub state: DpState,
    pub config: Option<DpConfig>,
}

/// Interface table sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IapConfig {
    pub nb_interfaces: usize,
    pub nb_groups: usize,
    pub nb_streams: usize,
}

impl Default for IapConfig {
    fn default() -> Self {
        Self {
            nb_interfaces: IAP_DEFAULT_NB_INTERFACES,
            nb_groups: IAP_DEFAULT_NB_GROUPS,
            nb_streams: IAP_DEFAULT_NB_STREAMS,
        }
    }
}

impl IapConfig {
    pub fn validate(&self) -> IapResult<()> {
        if self.nb_interfaces == 0 || self.nb_groups == 0 || self.nb_streams == 0 {
            return Err(IapError::InvalidParam("IAP tables cannot be empty".into()));
        }
        Ok(())
    }
}

