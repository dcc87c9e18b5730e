//! Bearer instance and its characteristic values

use super::call::Call;
use super::constants::*;
use super::types::*;
use crate::lid::Lid;

/// A telephone bearer exposed to clients
#[derive(Debug, Clone)]
pub struct Bearer {
    pub(super) param: BearerParam,
    pub(super) signal_strength: u8,
    pub(super) status_flags: StatusFlags,
    /// Last incoming call and its caller URI
    pub(super) incoming_call: Option<(Lid, String)>,
    pub(super) incoming_target: Option<(Lid, String)>,
    pub(super) friendly_name: Option<(Lid, String)>,
    pub(super) termination: Option<(Lid, TermReason)>,
    /// Client configuration bit field per connection
    pub(super) cli_cfg: Vec<u32>,
}

impl Bearer {
    pub(super) fn new(param: BearerParam, nb_connections: usize) -> Self {
        Self {
            param,
            signal_strength: TBS_SIGNAL_STRENGTH_UNAVAILABLE,
            status_flags: StatusFlags::empty(),
            incoming_call: None,
            incoming_target: None,
            friendly_name: None,
            termination: None,
            cli_cfg: vec![0; nb_connections],
        }
    }

    pub fn cfg(&self) -> BearerCfg {
        self.param.cfg
    }

    pub fn ccid(&self) -> u8 {
        self.param.ccid
    }

    pub fn opt_opcodes(&self) -> OptOpcodes {
        self.param.opt_opcodes
    }

    pub fn provider_name(&self) -> &str {
        &self.param.provider_name
    }

    pub fn uci(&self) -> &str {
        &self.param.uci
    }

    pub fn technology(&self) -> Technology {
        self.param.technology
    }

    pub fn uri_schemes(&self) -> &str {
        &self.param.uri_schemes
    }

    pub fn signal_strength(&self) -> u8 {
        self.signal_strength
    }

    pub fn signal_strength_intv(&self) -> u8 {
        self.param.signal_strength_intv_s
    }

    pub fn status_flags(&self) -> StatusFlags {
        self.status_flags
    }

    /// Characteristic exists on this bearer
    pub fn supports(&self, chr: TbsChar) -> bool {
        match chr {
            TbsChar::SignalStrength | TbsChar::SignalStrengthIntv => {
                self.param.cfg.contains(BearerCfg::SIGNAL_STRENGTH)
            }
            TbsChar::IncomingTargetUri => self.param.cfg.contains(BearerCfg::INCOMING_TARGET_URI),
            TbsChar::FriendlyName => self.param.cfg.contains(BearerCfg::FRIENDLY_NAME),
            _ => true,
        }
    }

    pub(super) fn is_enabled(&self, con_lid: Lid, chr: TbsChar) -> bool {
        self.cli_cfg
            .get(con_lid as usize)
            .map_or(false, |cfg| cfg & chr.cfg_bit() != 0)
    }

    /// Connections with notifications enabled for a characteristic
    pub(super) fn subscribers(&self, chr: TbsChar) -> Vec<Lid> {
        self.cli_cfg
            .iter()
            .enumerate()
            .filter(|(_, cfg)| *cfg & chr.cfg_bit() != 0)
            .map(|(con_lid, _)| con_lid as Lid)
            .collect()
    }

    /// Encode a characteristic value. `calls` are the calls of this bearer.
    pub fn value(&self, chr: TbsChar, calls: &[(Lid, &Call)]) -> Vec<u8> {
        let mut buf = Vec::new();
        match chr {
            TbsChar::ProviderName => buf.extend_from_slice(self.param.provider_name.as_bytes()),
            TbsChar::Uci => buf.extend_from_slice(self.param.uci.as_bytes()),
            TbsChar::Technology => buf.push(self.param.technology as u8),
            TbsChar::UriSchemes => buf.extend_from_slice(self.param.uri_schemes.as_bytes()),
            TbsChar::SignalStrength => buf.push(self.signal_strength),
            TbsChar::SignalStrengthIntv => buf.push(self.param.signal_strength_intv_s),
            TbsChar::CurrentCalls => {
                for (call_index, call) in calls {
                    // Item length covers index, state, flags and URI
                    buf.push((3 + call.uri.len()) as u8);
                    buf.push(*call_index);
                    buf.push(call.state as u8);
                    buf.push(call.flags.bits());
                    buf.extend_from_slice(call.uri.as_bytes());
                }
            }
            TbsChar::Ccid => buf.push(self.param.ccid),
            TbsChar::StatusFlags => {
                buf.extend_from_slice(&self.status_flags.bits().to_le_bytes());
            }
            TbsChar::IncomingTargetUri => {
                if let Some((call_index, uri)) = &self.incoming_target {
                    buf.push(*call_index);
                    buf.extend_from_slice(uri.as_bytes());
                }
            }
            TbsChar::CallState => {
                for (call_index, call) in calls {
                    buf.push(*call_index);
                    buf.push(call.state as u8);
                    buf.push(call.flags.bits());
                }
            }
            TbsChar::CallControlPoint => {}
            TbsChar::CpOptOpcodes => {
                buf.extend_from_slice(&self.param.opt_opcodes.bits().to_le_bytes());
            }
            TbsChar::TerminationReason => {
                if let Some((call_index, reason)) = self.termination {
                    buf.push(call_index);
                    buf.push(reason as u8);
                }
            }
            TbsChar::IncomingCall => {
                if let Some((call_index, uri)) = &self.incoming_call {
                    buf.push(*call_index);
                    buf.extend_from_slice(uri.as_bytes());
                }
            }
            TbsChar::FriendlyName => {
                if let Some((call_index, name)) = &self.friendly_name {
                    buf.push(*call_index);
                    buf.extend_from_slice(name.as_bytes());
                }
            }
        }
        buf
    }
}
