//! LC3 codec configuration, capabilities and metadata

use super::constants::*;
use super::ltv::{Ltv, LtvList};
use super::types::{AudioLocation, CodecError, CodecResult, ContextType};
use bitflags::bitflags;

/// Sampling frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SamplingFreq {
    Hz8000 = SAMPLING_FREQ_8000,
    Hz11025 = SAMPLING_FREQ_11025,
    Hz16000 = SAMPLING_FREQ_16000,
    Hz22050 = SAMPLING_FREQ_22050,
    Hz24000 = SAMPLING_FREQ_24000,
    Hz32000 = SAMPLING_FREQ_32000,
    Hz44100 = SAMPLING_FREQ_44100,
    Hz48000 = SAMPLING_FREQ_48000,
    Hz88200 = SAMPLING_FREQ_88200,
    Hz96000 = SAMPLING_FREQ_96000,
    Hz176400 = SAMPLING_FREQ_176400,
    Hz192000 = SAMPLING_FREQ_192000,
    Hz384000 = SAMPLING_FREQ_384000,
}

impl SamplingFreq {
    pub fn from_u8(value: u8) -> Option<Self> {
        let freq = match value {
            SAMPLING_FREQ_8000 => SamplingFreq::Hz8000,
            SAMPLING_FREQ_11025 => SamplingFreq::Hz11025,
            SAMPLING_FREQ_16000 => SamplingFreq::Hz16000,
            SAMPLING_FREQ_22050 => SamplingFreq::Hz22050,
            SAMPLING_FREQ_24000 => SamplingFreq::Hz24000,
            SAMPLING_FREQ_32000 => SamplingFreq::Hz32000,
            SAMPLING_FREQ_44100 => SamplingFreq::Hz44100,
            SAMPLING_FREQ_48000 => SamplingFreq::Hz48000,
            SAMPLING_FREQ_88200 => SamplingFreq::Hz88200,
            SAMPLING_FREQ_96000 => SamplingFreq::Hz96000,
            SAMPLING_FREQ_176400 => SamplingFreq::Hz176400,
            SAMPLING_FREQ_192000 => SamplingFreq::Hz192000,
            SAMPLING_FREQ_384000 => SamplingFreq::Hz384000,
            _ => return None,
        };
        Some(freq)
    }

    pub fn hz(&self) -> u32 {
        match self {
            SamplingFreq::Hz8000 => 8_000,
            SamplingFreq::Hz11025 => 11_025,
            SamplingFreq::Hz16000 => 16_000,
            SamplingFreq::Hz22050 => 22_050,
            SamplingFreq::Hz24000 => 24_000,
            SamplingFreq::Hz32000 => 32_000,
            SamplingFreq::Hz44100 => 44_100,
            SamplingFreq::Hz48000 => 48_000,
            SamplingFreq::Hz88200 => 88_200,
            SamplingFreq::Hz96000 => 96_000,
            SamplingFreq::Hz176400 => 176_400,
            SamplingFreq::Hz192000 => 192_000,
            SamplingFreq::Hz384000 => 384_000,
        }
    }

    /// Bit of this frequency in a supported sampling frequencies bit field
    pub fn supported_bit(&self) -> SamplingFreqs {
        SamplingFreqs::from_bits_retain(1 << (*self as u8 - 1))
    }
}

/// Frame duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameDuration {
    Ms7_5 = FRAME_DURATION_7_5MS,
    Ms10 = FRAME_DURATION_10MS,
}

impl FrameDuration {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            FRAME_DURATION_7_5MS => Some(FrameDuration::Ms7_5),
            FRAME_DURATION_10MS => Some(FrameDuration::Ms10),
            _ => None,
        }
    }

    pub fn us(&self) -> u32 {
        match self {
            FrameDuration::Ms7_5 => 7_500,
            FrameDuration::Ms10 => 10_000,
        }
    }
}

bitflags! {
    /// Supported sampling frequencies
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SamplingFreqs: u16 {
        const HZ_8000 = 0x0001;
        const HZ_11025 = 0x0002;
        const HZ_16000 = 0x0004;
        const HZ_22050 = 0x0008;
        const HZ_24000 = 0x0010;
        const HZ_32000 = 0x0020;
        const HZ_44100 = 0x0040;
        const HZ_48000 = 0x0080;
        const HZ_88200 = 0x0100;
        const HZ_96000 = 0x0200;
        const HZ_176400 = 0x0400;
        const HZ_192000 = 0x0800;
        const HZ_384000 = 0x1000;
    }
}

bitflags! {
    /// Supported frame durations
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrameDurations: u8 {
        const MS_7_5 = FRAME_DURATIONS_7_5MS;
        const MS_10 = FRAME_DURATIONS_10MS;
        const PREF_MS_7_5 = FRAME_DURATIONS_PREF_7_5MS;
        const PREF_MS_10 = FRAME_DURATIONS_PREF_10MS;
    }
}

/// LC3 codec specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodecConfig {
    pub sampling_freq: Option<SamplingFreq>,
    pub frame_dur: Option<FrameDuration>,
    /// Audio channel allocation, absent means mono without location
    pub location_bf: Option<AudioLocation>,
    pub frame_octets: Option<u16>,
    pub frames_sdu: Option<u8>,
    /// Records with types this layer does not interpret
    pub additional: LtvList,
}

impl CodecConfig {
    pub fn new(freq: SamplingFreq, dur: FrameDuration, frame_octets: u16) -> Self {
        Self {
            sampling_freq: Some(freq),
            frame_dur: Some(dur),
            frame_octets: Some(frame_octets),
            ..Default::default()
        }
    }

    pub fn parse(data: &[u8]) -> CodecResult<Self> {
        let mut cfg = Self::default();
        for record in LtvList::parse(data)?.iter() {
            match record.ltv_type() {
                LTV_CFG_SAMPLING_FREQ => {
                    let value = record.as_u8()?;
                    cfg.sampling_freq = Some(SamplingFreq::from_u8(value).ok_or_else(|| {
                        CodecError::InvalidParam(format!("sampling frequency 0x{:02x}", value))
                    })?);
                }
                LTV_CFG_FRAME_DURATION => {
                    let value = record.as_u8()?;
                    cfg.frame_dur = Some(FrameDuration::from_u8(value).ok_or_else(|| {
                        CodecError::InvalidParam(format!("frame duration 0x{:02x}", value))
                    })?);
                }
                LTV_CFG_AUDIO_CHANNEL_ALLOCATION => {
                    cfg.location_bf = Some(AudioLocation::from_bits_retain(record.as_u32()?));
                }
                LTV_CFG_OCTETS_PER_FRAME => cfg.frame_octets = Some(record.as_u16()?),
                LTV_CFG_FRAME_BLOCKS_PER_SDU => cfg.frames_sdu = Some(record.as_u8()?),
                _ => cfg.additional.push(record.clone()),
            }
        }
        Ok(cfg)
    }

    pub fn to_ltv(&self) -> LtvList {
        let mut list = LtvList::new();
        if let Some(freq) = self.sampling_freq {
            list.push(Ltv::from_u8(LTV_CFG_SAMPLING_FREQ, freq as u8));
        }
        if let Some(dur) = self.frame_dur {
            list.push(Ltv::from_u8(LTV_CFG_FRAME_DURATION, dur as u8));
        }
        if let Some(location) = self.location_bf {
            list.push(Ltv::from_u32(LTV_CFG_AUDIO_CHANNEL_ALLOCATION, location.bits()));
        }
        if let Some(octets) = self.frame_octets {
            list.push(Ltv::from_u16(LTV_CFG_OCTETS_PER_FRAME, octets));
        }
        if let Some(frames) = self.frames_sdu {
            list.push(Ltv::from_u8(LTV_CFG_FRAME_BLOCKS_PER_SDU, frames));
        }
        for record in self.additional.iter() {
            list.push(record.clone());
        }
        list
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_ltv().to_bytes()
    }

    /// Number of audio channels carried per stream
    pub fn nb_channels(&self) -> u32 {
        match self.location_bf {
            Some(location) if !location.is_empty() => location.bits().count_ones(),
            _ => 1,
        }
    }

    /// SDU size in octets implied by the configuration, if complete
    pub fn sdu_size(&self) -> Option<u32> {
        let octets = self.frame_octets? as u32;
        let frames = self.frames_sdu.unwrap_or(1) as u32;
        Some(octets * frames * self.nb_channels())
    }

    /// SDU interval in microseconds implied by the configuration, if complete
    pub fn sdu_intv_us(&self) -> Option<u32> {
        let dur = self.frame_dur?;
        Some(dur.us() * self.frames_sdu.unwrap_or(1) as u32)
    }
}

/// LC3 codec specific capabilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecCapabilities {
    pub sampling_freqs: SamplingFreqs,
    pub frame_durs: FrameDurations,
    /// Supported audio channel counts, bit n for n+1 channels
    pub channel_counts: Option<u8>,
    pub frame_octets_min: u16,
    pub frame_octets_max: u16,
    pub max_frames_sdu: Option<u8>,
}

impl CodecCapabilities {
    pub fn validate(&self) -> CodecResult<()> {
        if self.sampling_freqs.is_empty() || self.frame_durs.is_empty() {
            return Err(CodecError::InvalidParam(
                "capabilities need a sampling frequency and frame duration".into(),
            ));
        }
        if self.frame_octets_min > self.frame_octets_max {
            return Err(CodecError::InvalidParam("octets per frame min above max".into()));
        }
        Ok(())
    }

    pub fn to_ltv(&self) -> LtvList {
        let mut list = LtvList::new();
        list.push(Ltv::from_u16(LTV_CAPA_SUPP_SAMPLING_FREQS, self.sampling_freqs.bits()));
        list.push(Ltv::from_u8(LTV_CAPA_SUPP_FRAME_DURATIONS, self.frame_durs.bits()));
        if let Some(counts) = self.channel_counts {
            list.push(Ltv::from_u8(LTV_CAPA_SUPP_CHANNEL_COUNTS, counts));
        }
        let octets = (self.frame_octets_min as u32) | ((self.frame_octets_max as u32) << 16);
        list.push(Ltv::from_u32(LTV_CAPA_SUPP_OCTETS_PER_FRAME, octets));
        if let Some(frames) = self.max_frames_sdu {
            list.push(Ltv::from_u8(LTV_CAPA_SUPP_MAX_FRAMES_PER_SDU, frames));
        }
        list
    }

    pub fn parse(data: &[u8]) -> CodecResult<Self> {
        let list = LtvList::parse(data)?;
        let required = |ltv_type: u8| {
            list.get(ltv_type).ok_or_else(|| {
                CodecError::InvalidParam(format!("missing capability type 0x{:02x}", ltv_type))
            })
        };

        let octets = required(LTV_CAPA_SUPP_OCTETS_PER_FRAME)?.as_u32()?;
        let capa = Self {
            sampling_freqs: SamplingFreqs::from_bits_retain(
                required(LTV_CAPA_SUPP_SAMPLING_FREQS)?.as_u16()?,
            ),
            frame_durs: FrameDurations::from_bits_retain(
                required(LTV_CAPA_SUPP_FRAME_DURATIONS)?.as_u8()?,
            ),
            channel_counts: list
                .get(LTV_CAPA_SUPP_CHANNEL_COUNTS)
                .map(Ltv::as_u8)
                .transpose()?,
            frame_octets_min: (octets & 0xFFFF) as u16,
            frame_octets_max: (octets >> 16) as u16,
            max_frames_sdu: list
                .get(LTV_CAPA_SUPP_MAX_FRAMES_PER_SDU)
                .map(Ltv::as_u8)
                .transpose()?,
        };
        capa.validate()?;
        Ok(capa)
    }

    /// Whether a configuration falls within these capabilities
    pub fn supports(&self, cfg: &CodecConfig) -> bool {
        let freq_ok = cfg
            .sampling_freq
            .map_or(false, |freq| self.sampling_freqs.contains(freq.supported_bit()));
        let dur_ok = match cfg.frame_dur {
            Some(FrameDuration::Ms7_5) => self.frame_durs.contains(FrameDurations::MS_7_5),
            Some(FrameDuration::Ms10) => self.frame_durs.contains(FrameDurations::MS_10),
            None => false,
        };
        let octets_ok = cfg.frame_octets.map_or(false, |octets| {
            (self.frame_octets_min..=self.frame_octets_max).contains(&octets)
        });
        let channels_ok = self
            .channel_counts
            .map_or(cfg.nb_channels() == 1, |counts| {
                counts & (1 << (cfg.nb_channels() - 1).min(7)) != 0
            });
        freq_ok && dur_ok && octets_ok && channels_ok
    }
}

/// Audio stream metadata
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub pref_contexts: Option<ContextType>,
    pub streaming_contexts: Option<ContextType>,
    pub program_info: Option<String>,
    /// ISO 639-3 language code
    pub language: Option<[u8; LANGUAGE_CODE_LEN]>,
    pub ccid_list: Vec<u8>,
    pub additional: LtvList,
}

impl Metadata {
    pub fn parse(data: &[u8]) -> CodecResult<Self> {
        let mut meta = Self::default();
        for record in LtvList::parse(data)?.iter() {
            match record.ltv_type() {
                LTV_META_PREF_CONTEXTS => {
                    meta.pref_contexts = Some(ContextType::from_bits_retain(record.as_u16()?))
                }
                LTV_META_STREAMING_CONTEXTS => {
                    meta.streaming_contexts =
                        Some(ContextType::from_bits_retain(record.as_u16()?))
                }
                LTV_META_PROGRAM_INFO => {
                    let info = String::from_utf8(record.value().to_vec()).map_err(|_| {
                        CodecError::InvalidParam("program info is not UTF-8".into())
                    })?;
                    meta.program_info = Some(info);
                }
                LTV_META_LANGUAGE => {
                    if record.value().len() != LANGUAGE_CODE_LEN {
                        return Err(CodecError::InvalidValueLength {
                            ltv_type: record.ltv_type(),
                            length: record.value().len(),
                        });
                    }
                    let mut code = [0u8; LANGUAGE_CODE_LEN];
                    code.copy_from_slice(record.value());
                    meta.language = Some(code);
                }
                LTV_META_CCID_LIST => meta.ccid_list = record.value().to_vec(),
                _ => meta.additional.push(record.clone()),
            }
        }
        Ok(meta)
    }

    pub fn to_ltv(&self) -> CodecResult<LtvList> {
        let mut list = LtvList::new();
        if let Some(contexts) = self.pref_contexts {
            list.push(Ltv::from_u16(LTV_META_PREF_CONTEXTS, contexts.bits()));
        }
        if let Some(contexts) = self.streaming_contexts {
            list.push(Ltv::from_u16(LTV_META_STREAMING_CONTEXTS, contexts.bits()));
        }
        if let Some(info) = &self.program_info {
            list.push(Ltv::new(LTV_META_PROGRAM_INFO, info.as_bytes().to_vec())?);
        }
        if let Some(code) = self.language {
            list.push(Ltv::new(LTV_META_LANGUAGE, code.to_vec())?);
        }
        if !self.ccid_list.is_empty() {
            list.push(Ltv::new(LTV_META_CCID_LIST, self.ccid_list.clone())?);
        }
        for record in self.additional.iter() {
            list.push(record.clone());
        }
        Ok(list)
    }

    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        Ok(self.to_ltv()?.to_bytes())
    }
}
