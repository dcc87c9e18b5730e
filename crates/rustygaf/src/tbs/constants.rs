//! Constants for the Telephone Bearer Service server

// Call Control Point opcodes
pub const TBS_OPCODE_ACCEPT: u8 = 0x00;
pub const TBS_OPCODE_TERMINATE: u8 = 0x01;
pub const TBS_OPCODE_LOCAL_HOLD: u8 = 0x02;
pub const TBS_OPCODE_LOCAL_RETRIEVE: u8 = 0x03;
pub const TBS_OPCODE_ORIGINATE: u8 = 0x04;
pub const TBS_OPCODE_JOIN: u8 = 0x05;

// Call Control Point result codes
pub const TBS_CP_RESULT_SUCCESS: u8 = 0x00;
pub const TBS_CP_RESULT_OPCODE_NOT_SUPPORTED: u8 = 0x01;
pub const TBS_CP_RESULT_OP_NOT_POSSIBLE: u8 = 0x02;
pub const TBS_CP_RESULT_INVALID_CALL_INDEX: u8 = 0x03;
pub const TBS_CP_RESULT_STATE_MISMATCH: u8 = 0x04;
pub const TBS_CP_RESULT_LACK_OF_RESOURCES: u8 = 0x05;
pub const TBS_CP_RESULT_INVALID_OUTGOING_URI: u8 = 0x06;

// Call states
pub const TBS_CALL_STATE_INCOMING: u8 = 0x00;
pub const TBS_CALL_STATE_DIALING: u8 = 0x01;
pub const TBS_CALL_STATE_ALERTING: u8 = 0x02;
pub const TBS_CALL_STATE_ACTIVE: u8 = 0x03;
pub const TBS_CALL_STATE_LOCALLY_HELD: u8 = 0x04;
pub const TBS_CALL_STATE_REMOTELY_HELD: u8 = 0x05;
pub const TBS_CALL_STATE_LOCALLY_AND_REMOTELY_HELD: u8 = 0x06;

// Termination reasons
pub const TBS_TERM_REASON_URI: u8 = 0x00;
pub const TBS_TERM_REASON_CALL_FAIL: u8 = 0x01;
pub const TBS_TERM_REASON_REMOTE_END: u8 = 0x02;
pub const TBS_TERM_REASON_SERVER_END: u8 = 0x03;
pub const TBS_TERM_REASON_LINE_BUSY: u8 = 0x04;
pub const TBS_TERM_REASON_NETWORK_CONGESTION: u8 = 0x05;
pub const TBS_TERM_REASON_CLIENT_END: u8 = 0x06;
pub const TBS_TERM_REASON_NO_SERVICE: u8 = 0x07;
pub const TBS_TERM_REASON_NO_ANSWER: u8 = 0x08;
pub const TBS_TERM_REASON_UNSPECIFIED: u8 = 0x09;

// Signal strength
pub const TBS_SIGNAL_STRENGTH_MAX: u8 = 100;
pub const TBS_SIGNAL_STRENGTH_UNAVAILABLE: u8 = 255;

// Configuration limits
pub const TBS_NB_TBS_MAX: usize = 8;
pub const TBS_CALL_POOL_SIZE_MAX: usize = 32;
/// Smallest URI that can hold a scheme, the colon and one character
pub const TBS_URI_LEN_MIN: usize = 3;
/// A current calls item length byte covers index, state and flags before the URI
pub const TBS_URI_LEN_MAX: usize = 252;
pub const TBS_NB_CONNECTIONS_MAX: usize = 16;
/// Longest provider name, UCI or friendly name
pub const TBS_NAME_LEN_MAX: usize = 255;

// Default configuration
pub const TBS_DEFAULT_NB_TBS: usize = 1;
pub const TBS_DEFAULT_CALL_POOL_SIZE: usize = 4;
pub const TBS_DEFAULT_CALL_POOL_URI_LEN: usize = 64;
pub const TBS_DEFAULT_NB_CONNECTIONS: usize = 2;

// Error codes local to the ACC layer
pub const TBS_ERR_INVALID_PARAM: u8 = 0x01;
pub const TBS_ERR_COMMAND_DISALLOWED: u8 = 0x02;
pub const TBS_ERR_NOT_CONFIGURED: u8 = 0x03;
pub const TBS_ERR_INSUFFICIENT_RESOURCES: u8 = 0x04;
pub const TBS_ERR_BEARER_NOT_FOUND: u8 = 0x05;
pub const TBS_ERR_CALL_NOT_FOUND: u8 = 0x06;
pub const TBS_ERR_STATE_MISMATCH: u8 = 0x07;
pub const TBS_ERR_FEATURE_NOT_SUPPORTED: u8 = 0x08;
pub const TBS_ERR_INVALID_URI: u8 = 0x09;
pub const TBS_ERR_OPERATION_NOT_POSSIBLE: u8 = 0x0A;

// Indication offsets
pub const TBS_IND_NOTIFY: u8 = 0x00;
pub const TBS_IND_CALL_REQUEST: u8 = 0x01;
pub const TBS_IND_CALL_TERMINATED: u8 = 0x02;
