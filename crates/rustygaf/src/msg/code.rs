//! 16-bit message code packing
//!
//! A message code packs the layer into bits [15:12], the module into bits [11:8]
//! and the message index into bits [7:0].

use super::constants::*;
use super::types::{Layer, Module, MsgKind};
use std::fmt;

/// A packed GAF message code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MsgCode(u16);

impl MsgCode {
    /// Pack a (layer, module, index) triple. Only the low nibble of `module` is kept.
    pub const fn encode(layer_id: u8, module: u8, index: u8) -> Self {
        MsgCode(
            (((layer_id & 0x0F) as u16) << MSG_CODE_LAYER_SHIFT)
                | (((module & 0x0F) as u16) << MSG_CODE_MODULE_SHIFT)
                | index as u16,
        )
    }

    /// Pack a code from a typed layer
    pub fn from_layer(layer: Layer, module: u8, index: u8) -> Self {
        Self::encode(layer.id(), module, index)
    }

    /// Pack a code for a known module
    pub fn new(module: Module, index: u8) -> Self {
        Self::encode(module.layer().id(), module.id(), index)
    }

    /// Pack a code for a message of a given kind, `offset` counted from the kind base
    pub fn with_kind(module: Module, kind: MsgKind, offset: u8) -> Self {
        Self::new(module, kind.base().wrapping_add(offset))
    }

    /// Split the code back into its (layer, module, index) triple
    pub fn decode(self) -> (Layer, u8, u8) {
        (self.layer(), self.module_id(), self.index())
    }

    pub fn layer(&self) -> Layer {
        Layer::from_id(((self.0 & MSG_CODE_LAYER_MASK) >> MSG_CODE_LAYER_SHIFT) as u8)
    }

    pub fn module_id(&self) -> u8 {
        ((self.0 & MSG_CODE_MODULE_MASK) >> MSG_CODE_MODULE_SHIFT) as u8
    }

    pub fn index(&self) -> u8 {
        (self.0 & MSG_CODE_INDEX_MASK) as u8
    }

    /// Module the code belongs to, if the layer/module pair is assigned
    pub fn module(&self) -> Option<Module> {
        Module::from_parts(self.layer(), self.module_id())
    }

    pub fn kind(&self) -> MsgKind {
        MsgKind::of_index(self.index())
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    pub fn from_value(value: u16) -> Self {
        MsgCode(value)
    }
}

impl From<u16> for MsgCode {
    fn from(value: u16) -> Self {
        MsgCode(value)
    }
}

impl From<MsgCode> for u16 {
    fn from(code: MsgCode) -> Self {
        code.0
    }
}

impl fmt::Display for MsgCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.module() {
            Some(module) => write!(f, "{:?}:0x{:02x}", module, self.index()),
            None => write!(f, "0x{:04x}", self.0),
        }
    }
}
