//! Codec, QoS and LTV constants

// Codec formats
pub const CODEC_FORMAT_TRANSPARENT: u8 = 0x03;
pub const CODEC_FORMAT_LC3: u8 = 0x06;
pub const CODEC_FORMAT_VENDOR: u8 = 0xFF;
pub const CODEC_ID_LEN: usize = 5;

// LTV framing
pub const BAP_LTV_LENGTH_MIN: u8 = 1;
pub const BAP_LTV_HEADER_LEN: usize = 1;

// Codec specific configuration LTV types
pub const LTV_CFG_SAMPLING_FREQ: u8 = 0x01;
pub const LTV_CFG_FRAME_DURATION: u8 = 0x02;
pub const LTV_CFG_AUDIO_CHANNEL_ALLOCATION: u8 = 0x03;
pub const LTV_CFG_OCTETS_PER_FRAME: u8 = 0x04;
pub const LTV_CFG_FRAME_BLOCKS_PER_SDU: u8 = 0x05;

// Codec specific capabilities LTV types
pub const LTV_CAPA_SUPP_SAMPLING_FREQS: u8 = 0x01;
pub const LTV_CAPA_SUPP_FRAME_DURATIONS: u8 = 0x02;
pub const LTV_CAPA_SUPP_CHANNEL_COUNTS: u8 = 0x03;
pub const LTV_CAPA_SUPP_OCTETS_PER_FRAME: u8 = 0x04;
pub const LTV_CAPA_SUPP_MAX_FRAMES_PER_SDU: u8 = 0x05;

// Metadata LTV types
pub const LTV_META_PREF_CONTEXTS: u8 = 0x01;
pub const LTV_META_STREAMING_CONTEXTS: u8 = 0x02;
pub const LTV_META_PROGRAM_INFO: u8 = 0x03;
pub const LTV_META_LANGUAGE: u8 = 0x04;
pub const LTV_META_CCID_LIST: u8 = 0x05;
pub const LTV_META_PARENTAL_RATING: u8 = 0x06;
pub const LTV_META_PROGRAM_INFO_URI: u8 = 0x07;
pub const LTV_META_EXTENDED: u8 = 0xFE;
pub const LTV_META_VENDOR: u8 = 0xFF;
pub const LANGUAGE_CODE_LEN: usize = 3;

// Sampling frequency values
pub const SAMPLING_FREQ_8000: u8 = 0x01;
pub const SAMPLING_FREQ_11025: u8 = 0x02;
pub const SAMPLING_FREQ_16000: u8 = 0x03;
pub const SAMPLING_FREQ_22050: u8 = 0x04;
pub const SAMPLING_FREQ_24000: u8 = 0x05;
pub const SAMPLING_FREQ_32000: u8 = 0x06;
pub const SAMPLING_FREQ_44100: u8 = 0x07;
pub const SAMPLING_FREQ_48000: u8 = 0x08;
pub const SAMPLING_FREQ_88200: u8 = 0x09;
pub const SAMPLING_FREQ_96000: u8 = 0x0A;
pub const SAMPLING_FREQ_176400: u8 = 0x0B;
pub const SAMPLING_FREQ_192000: u8 = 0x0C;
pub const SAMPLING_FREQ_384000: u8 = 0x0D;

// Frame duration values
pub const FRAME_DURATION_7_5MS: u8 = 0x00;
pub const FRAME_DURATION_10MS: u8 = 0x01;

// Supported frame durations bit field
pub const FRAME_DURATIONS_7_5MS: u8 = 0x01;
pub const FRAME_DURATIONS_10MS: u8 = 0x02;
pub const FRAME_DURATIONS_PREF_7_5MS: u8 = 0x10;
pub const FRAME_DURATIONS_PREF_10MS: u8 = 0x20;

// Timing and size ranges
pub const SDU_INTV_MIN_US: u32 = 0x0000FF;
pub const SDU_INTV_MAX_US: u32 = 0xFFFFFF;
pub const TLATENCY_MIN_MS: u16 = 5;
pub const TLATENCY_MAX_MS: u16 = 4000;
pub const MAX_SDU_MAX: u16 = 0x0FFF;
pub const RTN_MAX: u8 = 15;
pub const PRES_DELAY_MAX_US: u32 = 0xFFFFFF;
pub const CTL_DELAY_MAX_US: u32 = 0x3D0900;

// Data path identifiers
pub const DP_ID_HCI: u8 = 0x00;
pub const DP_ID_DISABLED: u8 = 0xFF;

// Encoded QoS configuration length (CIG ID and CIS ID excluded)
pub const QOS_CONFIG_LEN: usize = 13;
