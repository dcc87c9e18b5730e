//! Basic Audio Profile (BAP)
//!
//! Aggregates the supported roles (capabilities, unicast and broadcast, server
//! and client sides) behind a single configuration step.

pub mod constants;
pub mod types;
pub mod event;
pub mod manager;

// Re-export the public API
pub use self::constants::*;
pub use self::event::BapEvent;
pub use self::manager::Bap;
pub use self::types::{
    BapConfig, BapError, BapResult, BapRoles, BcAssistConfig, BcDelegConfig, BcSinkConfig,
    BcSrcConfig, CapaCliConfig, CapaSrvConfig, UcCliConfig, UcSrvConfig,
};
