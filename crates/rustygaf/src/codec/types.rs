//! Value types shared by codec, QoS and data path configuration

use super::constants::*;
use crate::msg::{
    read_var_tail, write_var, Layer, MsgError, GAF_ERR_INVALID_MESSAGE, GAF_ERR_INVALID_PARAM,
};
use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

/// Errors raised while validating or decoding parameter structures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Invalid LTV length {0}")]
    InvalidLtvLength(u8),

    #[error("LTV record truncated: declared {declared} bytes, {available} available")]
    LtvTruncated { declared: usize, available: usize },

    #[error("Value of {0} bytes does not fit in an LTV record")]
    ValueTooLong(usize),

    #[error("Invalid value length {length} for LTV type 0x{ltv_type:02x}")]
    InvalidValueLength { ltv_type: u8, length: usize },

    #[error("Encoding error: {0}")]
    Encoding(#[from] MsgError),
}

impl CodecError {
    /// 16-bit status carried in messages
    pub fn code(&self) -> u16 {
        match self {
            CodecError::InvalidParam(_) => Layer::Common.status(GAF_ERR_INVALID_PARAM),
            CodecError::Encoding(err) => err.code(),
            _ => Layer::Common.status(GAF_ERR_INVALID_MESSAGE),
        }
    }
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

bitflags! {
    /// PHY bit field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PhyBf: u8 {
        const LE_1M = 0x01;
        const LE_2M = 0x02;
        const LE_CODED = 0x04;
    }
}

bitflags! {
    /// Audio location bit field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AudioLocation: u32 {
        const FRONT_LEFT = 0x0000_0001;
        const FRONT_RIGHT = 0x0000_0002;
        const FRONT_CENTER = 0x0000_0004;
        const LOW_FREQ_EFFECTS_1 = 0x0000_0008;
        const BACK_LEFT = 0x0000_0010;
        const BACK_RIGHT = 0x0000_0020;
        const FRONT_LEFT_OF_CENTER = 0x0000_0040;
        const FRONT_RIGHT_OF_CENTER = 0x0000_0080;
        const BACK_CENTER = 0x0000_0100;
        const LOW_FREQ_EFFECTS_2 = 0x0000_0200;
        const SIDE_LEFT = 0x0000_0400;
        const SIDE_RIGHT = 0x0000_0800;
    }
}

bitflags! {
    /// Audio context bit field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContextType: u16 {
        const UNSPECIFIED = 0x0001;
        const CONVERSATIONAL = 0x0002;
        const MEDIA = 0x0004;
        const GAME = 0x0008;
        const INSTRUCTIONAL = 0x0010;
        const VOICE_ASSISTANTS = 0x0020;
        const LIVE = 0x0040;
        const SOUND_EFFECTS = 0x0080;
        const NOTIFICATIONS = 0x0100;
        const RINGTONE = 0x0200;
        const ALERTS = 0x0400;
        const EMERGENCY_ALARM = 0x0800;
    }
}

/// Data path direction, seen from the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// Host to controller
    Input = 0,
    /// Controller to host
    Output = 1,
}

impl Direction {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Direction::Input),
            1 => Some(Direction::Output),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// SDU framing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Framing {
    #[default]
    Unframed = 0,
    Framed = 1,
}

impl Framing {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Framing::Unframed),
            1 => Some(Framing::Framed),
            _ => None,
        }
    }
}

/// Packing of streams within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Packing {
    #[default]
    Sequential = 0,
    Interleaved = 1,
}

/// Codec identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecId {
    /// Coding format
    pub format: u8,
    /// Company ID, vendor specific formats only
    pub company_id: u16,
    /// Vendor codec ID, vendor specific formats only
    pub vendor_id: u16,
}

impl CodecId {
    pub const LC3: CodecId = CodecId {
        format: CODEC_FORMAT_LC3,
        company_id: 0,
        vendor_id: 0,
    };

    pub const TRANSPARENT: CodecId = CodecId {
        format: CODEC_FORMAT_TRANSPARENT,
        company_id: 0,
        vendor_id: 0,
    };

    pub fn vendor(company_id: u16, vendor_id: u16) -> Self {
        Self {
            format: CODEC_FORMAT_VENDOR,
            company_id,
            vendor_id,
        }
    }

    pub fn is_lc3(&self) -> bool {
        self.format == CODEC_FORMAT_LC3
    }

    /// Company and vendor IDs are only allowed with the vendor specific format
    pub fn validate(&self) -> CodecResult<()> {
        if self.format != CODEC_FORMAT_VENDOR && (self.company_id != 0 || self.vendor_id != 0) {
            return Err(CodecError::InvalidParam(format!(
                "codec format 0x{:02x} cannot carry company/vendor id",
                self.format
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; CODEC_ID_LEN] {
        let mut result = [0u8; CODEC_ID_LEN];
        result[0] = self.format;
        result[1..3].copy_from_slice(&self.company_id.to_le_bytes());
        result[3..5].copy_from_slice(&self.vendor_id.to_le_bytes());
        result
    }

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < CODEC_ID_LEN {
            return None;
        }
        Some(Self {
            format: data[0],
            company_id: u16::from_le_bytes([data[1], data[2]]),
            vendor_id: u16::from_le_bytes([data[3], data[4]]),
        })
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            CODEC_FORMAT_LC3 => write!(f, "LC3"),
            CODEC_FORMAT_VENDOR => {
                write!(f, "vendor({:04x}:{:04x})", self.company_id, self.vendor_id)
            }
            other => write!(f, "format(0x{:02x})", other),
        }
    }
}

pub(crate) fn check_sdu_intv(name: &str, value: u32) -> CodecResult<()> {
    if !(SDU_INTV_MIN_US..=SDU_INTV_MAX_US).contains(&value) {
        return Err(CodecError::InvalidParam(format!(
            "{} {}us outside [{}, {}]",
            name, value, SDU_INTV_MIN_US, SDU_INTV_MAX_US
        )));
    }
    Ok(())
}

pub(crate) fn check_tlatency(name: &str, value: u16) -> CodecResult<()> {
    if !(TLATENCY_MIN_MS..=TLATENCY_MAX_MS).contains(&value) {
        return Err(CodecError::InvalidParam(format!(
            "{} {}ms outside [{}, {}]",
            name, value, TLATENCY_MIN_MS, TLATENCY_MAX_MS
        )));
    }
    Ok(())
}

pub(crate) fn check_max(name: &str, value: u32, max: u32) -> CodecResult<()> {
    if value > max {
        return Err(CodecError::InvalidParam(format!("{} {} above {}", name, value, max)));
    }
    Ok(())
}

/// Append the low three bytes of `value`, little-endian
fn push_u24(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes()[..3]);
}

/// QoS requirements exposed by an audio stream endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosReq {
    /// Unframed ISOAL PDUs not supported when `Framed`
    pub framing: Framing,
    /// Preferred PHYs
    pub pref_phy_bf: PhyBf,
    /// Preferred retransmission number
    pub pref_retx_nb: u8,
    /// Maximum transport latency in milliseconds
    pub max_tlatency_ms: u16,
    /// Presentation delay range in microseconds
    pub pres_delay_min_us: u32,
    pub pres_delay_max_us: u32,
    /// Preferred presentation delay range in microseconds, 0 for no preference
    pub pref_pres_delay_min_us: u32,
    pub pref_pres_delay_max_us: u32,
}

impl QosReq {
    pub fn validate(&self) -> CodecResult<()> {
        if self.pref_phy_bf.is_empty() {
            return Err(CodecError::InvalidParam("no preferred PHY".into()));
        }
        check_tlatency("max transport latency", self.max_tlatency_ms)?;
        check_max("presentation delay max", self.pres_delay_max_us, PRES_DELAY_MAX_US)?;
        if self.pres_delay_min_us > self.pres_delay_max_us {
            return Err(CodecError::InvalidParam(
                "presentation delay min above max".into(),
            ));
        }
        if self.pref_pres_delay_min_us != 0
            && (self.pref_pres_delay_min_us < self.pres_delay_min_us
                || self.pref_pres_delay_min_us > self.pres_delay_max_us)
        {
            return Err(CodecError::InvalidParam(
                "preferred presentation delay min outside range".into(),
            ));
        }
        if self.pref_pres_delay_max_us != 0 {
            if self.pref_pres_delay_max_us < self.pres_delay_min_us
                || self.pref_pres_delay_max_us > self.pres_delay_max_us
            {
                return Err(CodecError::InvalidParam(
                    "preferred presentation delay max outside range".into(),
                ));
            }
            if self.pref_pres_delay_min_us > self.pref_pres_delay_max_us {
                return Err(CodecError::InvalidParam(
                    "preferred presentation delay min above preferred max".into(),
                ));
            }
        }
        Ok(())
    }

    /// Check that a QoS configuration honours these requirements
    pub fn accepts(&self, cfg: &QosConfig) -> bool {
        (self.framing == Framing::Unframed || cfg.framing == Framing::Framed)
            && cfg.max_tlatency_ms <= self.max_tlatency_ms
            && (self.pres_delay_min_us..=self.pres_delay_max_us).contains(&cfg.pres_delay_us)
    }
}

/// QoS configuration applied to a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosConfig {
    /// SDU interval in microseconds
    pub sdu_intv_us: u32,
    pub framing: Framing,
    /// PHY, exactly one bit
    pub phy: PhyBf,
    /// Maximum SDU size in octets
    pub max_sdu: u16,
    /// Retransmission number
    pub retx_nb: u8,
    /// Maximum transport latency in milliseconds
    pub max_tlatency_ms: u16,
    /// Presentation delay in microseconds
    pub pres_delay_us: u32,
}

impl QosConfig {
    pub fn validate(&self) -> CodecResult<()> {
        check_sdu_intv("SDU interval", self.sdu_intv_us)?;
        if self.phy.bits().count_ones() != 1 {
            return Err(CodecError::InvalidParam(format!(
                "PHY {:?} must have exactly one bit",
                self.phy
            )));
        }
        check_max("max SDU", self.max_sdu as u32, MAX_SDU_MAX as u32)?;
        check_max("retransmission number", self.retx_nb as u32, RTN_MAX as u32)?;
        check_tlatency("max transport latency", self.max_tlatency_ms)?;
        check_max("presentation delay", self.pres_delay_us, PRES_DELAY_MAX_US)
    }

    /// Encode as carried in an ASE Config QoS operation, after CIG and CIS IDs
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(QOS_CONFIG_LEN);
        push_u24(&mut buf, self.sdu_intv_us);
        buf.push(self.framing as u8);
        buf.push(self.phy.bits());
        buf.extend_from_slice(&self.max_sdu.to_le_bytes());
        buf.push(self.retx_nb);
        buf.extend_from_slice(&self.max_tlatency_ms.to_le_bytes());
        push_u24(&mut buf, self.pres_delay_us);
        buf
    }

    pub fn parse(data: &[u8]) -> CodecResult<Self> {
        if data.len() != QOS_CONFIG_LEN {
            return Err(CodecError::InvalidParam(format!(
                "QoS configuration length {} instead of {}",
                data.len(),
                QOS_CONFIG_LEN
            )));
        }
        let mut cursor = Cursor::new(data);
        let truncated = |_| CodecError::InvalidParam("QoS configuration truncated".into());
        let sdu_intv_us = cursor.read_u24::<LittleEndian>().map_err(truncated)?;
        let framing = Framing::from_u8(cursor.read_u8().map_err(truncated)?)
            .ok_or_else(|| CodecError::InvalidParam("unknown framing".into()))?;
        let phy = PhyBf::from_bits(cursor.read_u8().map_err(truncated)?)
            .ok_or_else(|| CodecError::InvalidParam("unknown PHY bits".into()))?;
        let max_sdu = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let retx_nb = cursor.read_u8().map_err(truncated)?;
        let max_tlatency_ms = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let pres_delay_us = cursor.read_u24::<LittleEndian>().map_err(truncated)?;

        let cfg = Self {
            sdu_intv_us,
            framing,
            phy,
            max_sdu,
            retx_nb,
            max_tlatency_ms,
            pres_delay_us,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Data path configuration for one stream direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpConfig {
    /// Data path ID, 0 for HCI
    pub dp_id: u8,
    /// Controller delay in microseconds
    pub ctl_delay_us: u32,
    pub codec_id: CodecId,
    /// Codec configuration bytes handed to the controller
    pub codec_cfg: Vec<u8>,
}

impl DpConfig {
    /// Data path over HCI, no controller side codec
    pub fn hci() -> Self {
        Self {
            dp_id: DP_ID_HCI,
            ctl_delay_us: 0,
            codec_id: CodecId::TRANSPARENT,
            codec_cfg: Vec::new(),
        }
    }

    pub fn validate(&self) -> CodecResult<()> {
        if self.dp_id == DP_ID_DISABLED {
            return Err(CodecError::InvalidParam("data path 0xFF is disabled".into()));
        }
        check_max("controller delay", self.ctl_delay_us, CTL_DELAY_MAX_US)?;
        self.codec_id.validate()?;
        if self.codec_cfg.len() > u8::MAX as usize {
            return Err(CodecError::ValueTooLong(self.codec_cfg.len()));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(1 + 3 + CODEC_ID_LEN + 1 + self.codec_cfg.len());
        buf.push(self.dp_id);
        push_u24(&mut buf, self.ctl_delay_us);
        buf.extend_from_slice(&self.codec_id.to_bytes());
        write_var(&mut buf, &self.codec_cfg)?;
        Ok(buf)
    }

    pub fn parse(data: &[u8]) -> CodecResult<Self> {
        let header = 1 + 3 + CODEC_ID_LEN;
        if data.len() < header + 1 {
            return Err(CodecError::InvalidParam("data path configuration truncated".into()));
        }
        let mut cursor = Cursor::new(data);
        let dp_id = data[0];
        cursor.set_position(1);
        let ctl_delay_us = cursor
            .read_u24::<LittleEndian>()
            .map_err(|_| CodecError::InvalidParam("data path configuration truncated".into()))?;
        let codec_id = CodecId::parse(&data[4..]).ok_or_else(|| {
            CodecError::InvalidParam("data path configuration truncated".into())
        })?;
        cursor.set_position(header as u64);
        let codec_cfg = read_var_tail(&mut cursor)?;

        Ok(Self {
            dp_id,
            ctl_delay_us,
            codec_id,
            codec_cfg,
        })
    }
}

impl fmt::Display for DpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dp {} codec {} delay {}us cfg [{}]",
            self.dp_id,
            self.codec_id,
            self.ctl_delay_us,
            hex::encode(&self.codec_cfg)
        )
    }
}
