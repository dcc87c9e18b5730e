//! Message code constants

// Message code bit layout
pub const MSG_CODE_LAYER_SHIFT: u16 = 12;
pub const MSG_CODE_MODULE_SHIFT: u16 = 8;
pub const MSG_CODE_LAYER_MASK: u16 = 0xF000;
pub const MSG_CODE_MODULE_MASK: u16 = 0x0F00;
pub const MSG_CODE_INDEX_MASK: u16 = 0x00FF;

// Layer identifiers
pub const GAF_LAYER_COMMON: u8 = 0x00;
pub const GAF_LAYER_IAP: u8 = 0x01;
pub const GAF_LAYER_ARC: u8 = 0x02;
pub const GAF_LAYER_ACC: u8 = 0x03;
pub const GAF_LAYER_ATC: u8 = 0x04;
pub const GAF_LAYER_BAP: u8 = 0x05;
pub const GAF_LAYER_TMAP: u8 = 0x06;
pub const GAF_LAYER_HAP: u8 = 0x07;
pub const GAF_LAYER_CAP: u8 = 0x08;

// Module identifiers (scoped to their layer)
pub const GAF_MODULE_COMMON: u8 = 0x00;
pub const IAP_MODULE_IAP: u8 = 0x00;
pub const ACC_MODULE_MCS: u8 = 0x00;
pub const ACC_MODULE_MCC: u8 = 0x01;
pub const ACC_MODULE_TBS: u8 = 0x02;
pub const ACC_MODULE_TBC: u8 = 0x03;
pub const ACC_MODULE_OTS: u8 = 0x04;
pub const ACC_MODULE_OTC: u8 = 0x05;
pub const BAP_MODULE_COMMON: u8 = 0x00;
pub const BAP_MODULE_CAPA_SRV: u8 = 0x01;
pub const BAP_MODULE_CAPA_CLI: u8 = 0x02;
pub const BAP_MODULE_UC_SRV: u8 = 0x03;
pub const BAP_MODULE_UC_CLI: u8 = 0x04;
pub const BAP_MODULE_BC_SRC: u8 = 0x05;
pub const BAP_MODULE_BC_SINK: u8 = 0x06;
pub const BAP_MODULE_BC_ASSIST: u8 = 0x07;
pub const BAP_MODULE_BC_DELEG: u8 = 0x08;

// Message index ranges within a module
pub const MSG_INDEX_CMD_BASE: u8 = 0x00;
pub const MSG_INDEX_REQ_BASE: u8 = 0x40;
pub const MSG_INDEX_IND_BASE: u8 = 0x80;
pub const MSG_INDEX_REQ_IND_BASE: u8 = 0xC0;

// Envelope sizes
pub const MSG_CODE_SIZE: usize = 2;
pub const MSG_STATUS_SIZE: usize = 2;

/// Status value carried by a successful response
pub const GAF_ERR_NO_ERROR: u16 = 0x0000;

// Error codes local to the common layer
pub const GAF_ERR_INVALID_PARAM: u8 = 0x01;
pub const GAF_ERR_INVALID_MESSAGE: u8 = 0x02;
pub const GAF_ERR_UNKNOWN_CODE: u8 = 0x03;
pub const GAF_ERR_FEATURE_DISABLED: u8 = 0x04;
