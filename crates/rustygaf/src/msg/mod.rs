//! GAF message code registry
//!
//! This module provides the packing of (layer, module, index) triples into 16-bit
//! message codes, the message envelope every API message is carried in, and the
//! helpers for length-prefixed variable fields.

pub mod constants;
pub mod types;
pub mod code;
pub mod message;

// Re-export the public API
pub use self::code::MsgCode;
pub use self::constants::*;
pub use self::message::{read_var, read_var_tail, remaining, write_var, write_var16, Message};
pub use self::types::{Layer, Module, MsgError, MsgKind, MsgResult};
