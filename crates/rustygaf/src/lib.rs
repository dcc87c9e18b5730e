//! RustyGAF - A Rust library for the LE Audio Generic Audio Framework
//!
//! This library provides the message and state layer of the Generic Audio
//! Framework: message code registry, codec and QoS parameter types, isochronous
//! group and stream management, the Telephone Bearer Service call state machine
//! and Basic Audio Profile role configuration.
//!
//! Every component is a plain state machine. Requests return synchronously,
//! lower layer work is queued as commands and outcomes are queued as events for
//! the caller to poll.

pub mod bap;
pub mod codec;
pub mod error;
pub mod event;
pub mod gaf;
pub mod iap;
pub mod lid;
pub mod msg;
pub mod tbs;

// Re-export common types for convenience
pub use bap::{Bap, BapConfig, BapError, BapEvent, BapRoles};
pub use codec::{CodecConfig, CodecError, CodecId, DpConfig, Ltv, LtvList, QosConfig, QosReq};
pub use error::{GafError, GafResult};
pub use event::EventQueue;
pub use gaf::{Features, Gaf, GafConfig};
pub use iap::{IapConfig, IapError, IapEvent, IapManager, IsoCommand, IsoControllerEvent};
pub use lid::{Lid, LidTable, GAF_INVALID_LID};
pub use msg::{Layer, Message, Module, MsgCode, MsgError, MsgKind};
pub use tbs::{BearerParam, CallState, TbsConfig, TbsError, TbsEvent, TbsServer};
