//! Codec, QoS and data path parameter types
//!
//! Fixed layout value types exchanged between the upper layer and the stream
//! entities: codec identifiers, LTV encoded codec configuration, capabilities and
//! metadata, QoS requirements and configuration, and data path configuration.

pub mod constants;
pub mod types;
pub mod ltv;
pub mod lc3;
#[cfg(test)]
mod tests;

// Re-export the public API
pub use self::constants::*;
pub use self::lc3::{
    CodecCapabilities, CodecConfig, FrameDuration, FrameDurations, Metadata, SamplingFreq,
    SamplingFreqs,
};
pub use self::ltv::{Ltv, LtvList};
pub use self::types::{
    AudioLocation, CodecError, CodecId, CodecResult, ContextType, Direction, DpConfig, Framing,
    Packing, PhyBf, QosConfig, QosReq,
};
