//! BAP constants

// ASE characteristic instances, per direction and in total
pub const BAP_NB_ASE_CHARS_MAX: u8 = 15;

// PAC records per direction
pub const BAP_NB_PACS_MAX: u8 = 15;

// Broadcast
pub const BAP_BC_NB_GROUPS_MAX: u8 = 4;
pub const BAP_BC_DELEG_NB_SRCS_MAX: u8 = 8;

// Attribute layout
pub const BAP_PREF_MTU_MIN: u16 = 64;
pub const BAP_DEFAULT_PREF_MTU: u16 = 64;

// Client procedure timeout in seconds
pub const BAP_TIMEOUT_MIN_S: u8 = 1;
pub const BAP_TIMEOUT_MAX_S: u8 = 30;
pub const BAP_DEFAULT_TIMEOUT_S: u8 = 10;

// Connections tracked by server roles
pub const BAP_NB_CONNECTIONS_MAX: u8 = 16;
pub const BAP_DEFAULT_NB_CONNECTIONS: u8 = 2;

// Error codes local to the BAP layer
pub const BAP_ERR_INVALID_PARAM: u8 = 0x01;
pub const BAP_ERR_COMMAND_DISALLOWED: u8 = 0x02;
pub const BAP_ERR_NOT_CONFIGURED: u8 = 0x03;
pub const BAP_ERR_ROLE_NOT_SUPPORTED: u8 = 0x04;

// Indication offsets
pub const BAP_IND_CONFIGURED: u8 = 0;
