//! IAP constants

// Identifier ranges
pub const IAP_CIG_ID_MAX: u8 = 0xEF;
pub const IAP_CIS_ID_MAX: u8 = 0xEF;
pub const IAP_BIG_ID_MAX: u8 = 0xEF;

// Stream counts
pub const IAP_NB_STREAMS_PER_GROUP_MAX: usize = 31;
pub const IAP_BIS_INDEX_MIN: u8 = 1;
pub const IAP_BIS_INDEX_MAX: u8 = 31;

// Test mode timing and size ranges
pub const IAP_ISO_INTV_FRAMES_MIN: u16 = 0x0004;
pub const IAP_ISO_INTV_FRAMES_MAX: u16 = 0x0C80;
pub const IAP_FT_MIN: u8 = 1;
pub const IAP_NSE_MIN: u8 = 1;
pub const IAP_NSE_MAX: u8 = 31;
pub const IAP_BN_MAX: u8 = 15;
pub const IAP_BIG_BN_MIN: u8 = 1;
pub const IAP_BIG_BN_MAX: u8 = 7;
pub const IAP_MAX_PDU_MAX: u16 = 251;
pub const IAP_IRC_MIN: u8 = 1;
pub const IAP_IRC_MAX: u8 = 15;
pub const IAP_PTO_MAX: u8 = 15;
pub const IAP_SCA_MAX: u8 = 7;

// BIG synchronization
pub const IAP_SYNC_TIMEOUT_MIN: u16 = 0x000A;
pub const IAP_SYNC_TIMEOUT_MAX: u16 = 0x4000;
pub const IAP_MSE_MAX: u8 = 31;
pub const IAP_SYNC_HANDLE_MAX: u16 = 0x0EFF;
pub const IAP_BROADCAST_CODE_LEN: usize = 16;

// Default table sizes
pub const IAP_DEFAULT_NB_INTERFACES: usize = 2;
pub const IAP_DEFAULT_NB_GROUPS: usize = 4;
pub const IAP_DEFAULT_NB_STREAMS: usize = 8;

// Error codes local to the IAP layer
pub const IAP_ERR_INVALID_PARAM: u8 = 0x01;
pub const IAP_ERR_COMMAND_DISALLOWED: u8 = 0x02;
pub const IAP_ERR_INSUFFICIENT_RESOURCES: u8 = 0x03;
pub const IAP_ERR_NO_GROUP_AVAILABLE: u8 = 0x04;
pub const IAP_ERR_NO_STREAM_AVAILABLE: u8 = 0x05;
pub const IAP_ERR_GROUP_ALREADY_EXISTS: u8 = 0x06;
pub const IAP_ERR_GROUP_NOT_FOUND: u8 = 0x07;
pub const IAP_ERR_STREAM_NOT_FOUND: u8 = 0x08;
pub const IAP_ERR_INTERFACE_NOT_FOUND: u8 = 0x09;
pub const IAP_ERR_STREAM_NOT_ENABLED: u8 = 0x0A;
pub const IAP_ERR_DP_NOT_CONFIGURED: u8 = 0x0B;
pub const IAP_ERR_DP_SETUP: u8 = 0x0C;
pub const IAP_ERR_DP_NOT_SETUP: u8 = 0x0D;
pub const IAP_ERR_BUSY: u8 = 0x0E;
pub const IAP_ERR_CANCELLED: u8 = 0x0F;
pub const IAP_ERR_SYNC_LOST: u8 = 0x10;
pub const IAP_ERR_MIC_ERROR: u8 = 0x11;
pub const IAP_ERR_LL_ERROR: u8 = 0x20;

// HCI status reported by the controller on success
pub const HCI_SUCCESS: u8 = 0x00;

// Indication message offsets
pub const IAP_IND_GROUP_ENABLED: u8 = 0x00;
pub const IAP_IND_GROUP_DISABLED: u8 = 0x01;
pub const IAP_IND_STREAM_DISABLED: u8 = 0x02;
pub const IAP_IND_DP_SETUP: u8 = 0x03;
pub const IAP_IND_DP_REMOVED: u8 = 0x04;
pub const IAP_IND_QUALITY: u8 = 0x05;
pub const IAP_IND_TM_STARTED: u8 = 0x06;
pub const IAP_IND_TM_COUNTERS: u8 = 0x07;
pub const IAP_IND_TM_STOPPED: u8 = 0x08;
