//! Error types for the rustygaf library
//!
//! Each module reports its own error type. `GafError` wraps all of them for
//! callers that drive several modules.

use crate::bap::BapError;
use crate::codec::CodecError;
use crate::iap::IapError;
use crate::msg::{Layer, MsgError, GAF_ERR_FEATURE_DISABLED};
use crate::tbs::TbsError;
use thiserror::Error;

/// Errors returned by the GAF composition root
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GafError {
    #[error("Message error: {0}")]
    Msg(#[from] MsgError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("IAP error: {0}")]
    Iap(#[from] IapError),

    #[error("TBS error: {0}")]
    Tbs(#[from] TbsError),

    #[error("BAP error: {0}")]
    Bap(#[from] BapError),

    #[error("Feature {0} not enabled")]
    FeatureDisabled(&'static str),
}

impl GafError {
    /// 16-bit status carried in messages
    pub fn code(&self) -> u16 {
        match self {
            GafError::Msg(err) => err.code(),
            GafError::Codec(err) => err.code(),
            GafError::Iap(err) => err.code(),
            GafError::Tbs(err) => err.code(),
            GafError::Bap(err) => err.code(),
            GafError::FeatureDisabled(_) => Layer::Common.status(GAF_ERR_FEATURE_DISABLED),
        }
    }
}

/// Result type for operations spanning several modules
pub type GafResult<T> = Result<T, GafError>;
