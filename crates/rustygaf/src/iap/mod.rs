//! Isochronous Access Profile (IAP)
//!
//! This module manages isochronous groups and streams on top of the controller:
//! - Interfaces, unicast groups (CIG) and broadcast groups (BIG)
//! - The stream lifecycle from configuration to enabled and back
//! - Data path setup per stream direction
//! - Test mode and link quality reporting

pub mod constants;
pub mod types;
pub mod event;
pub mod manager;
#[cfg(test)]
mod tests;

// Re-export the public API
pub use self::constants::*;
pub use self::event::{CisSetup, IapEvent, IsoCommand, IsoControllerEvent, Txn};
pub use self::manager::IapManager;
pub use self::types::{
    BgConfig, BgParam, BgSyncParam, BgTestParam, BroadcastCode, DataPath, DisableReason, DpState,
    EnabledConfig, GroupConfig, GroupKind, GroupParams, IapConfig, IapError, IapResult,
    QualityReport, StreamEnabled, StreamParams, StreamState, TmCounters, TmPayload, UgConfig,
    UgParam, UgTestParam, UsConfig, UsParam, UsTestParam,
};
