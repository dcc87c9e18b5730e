//! Telephone Bearer Service (TBS) server
//!
//! Bearers expose calls to clients. Calls are taken from a fixed pool shared by
//! every bearer and move through their states on local requests, remote party
//! events and Call Control Point writes.

pub mod constants;
pub mod types;
pub mod call;
pub mod bearer;
pub mod event;
pub mod server;
#[cfg(test)]
mod tests;

// Re-export the public API
pub use self::bearer::Bearer;
pub use self::call::Call;
pub use self::constants::*;
pub use self::event::TbsEvent;
pub use self::server::TbsServer;
pub use self::types::{
    BearerCfg, BearerParam, CallAction, CallFlags, CallState, CpNotification, CpOpcode, CpResult,
    OptOpcodes, StatusFlags, TbsChar, TbsConfig, TbsError, TbsResult, Technology, TermReason,
};
