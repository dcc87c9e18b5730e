//! Type definitions for the Basic Audio Profile layer

use super::constants::*;
use crate::codec::{AudioLocation, ContextType};
use crate::msg::Layer;
use bitflags::bitflags;
use std::fmt;
use thiserror::Error;

/// Errors reported by BAP operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BapError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Command disallowed")]
    CommandDisallowed,

    #[error("Basic audio profile not configured")]
    NotConfigured,

    #[error("Role {0} not supported")]
    RoleNotSupported(BapRoles),
}

impl BapError {
    pub fn local_code(&self) -> u8 {
        match self {
            BapError::InvalidParam(_) => BAP_ERR_INVALID_PARAM,
            BapError::CommandDisallowed => BAP_ERR_COMMAND_DISALLOWED,
            BapError::NotConfigured => BAP_ERR_NOT_CONFIGURED,
            BapError::RoleNotSupported(_) => BAP_ERR_ROLE_NOT_SUPPORTED,
        }
    }

    /// 16-bit status carried in messages
    pub fn code(&self) -> u16 {
        Layer::Bap.status(self.local_code())
    }
}

/// Result type for BAP operations
pub type BapResult<T> = Result<T, BapError>;

bitflags! {
    /// Supported BAP roles
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BapRoles: u8 {
        /// Capabilities server (PACS)
        const CAPA_SRV = 0x01;
        const CAPA_CLI = 0x02;
        /// Unicast server (ASCS)
        const UC_SRV = 0x04;
        const UC_CLI = 0x08;
        const BC_SRC = 0x10;
        const BC_SINK = 0x20;
        const BC_ASSIST = 0x40;
        /// Broadcast delegator (BASS)
        const BC_DELEG = 0x80;
    }
}

impl fmt::Display for BapRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        write!(f, "{}", names.join("|"))
    }
}

fn check_range<T: PartialOrd + fmt::Display>(name: &str, value: T, min: T, max: T) -> BapResult<()> {
    if value < min || value > max {
        return Err(BapError::InvalidParam(format!(
            "{} {} outside [{}, {}]",
            name, value, min, max
        )));
    }
    Ok(())
}

fn check_mtu(pref_mtu: u16) -> BapResult<()> {
    if pref_mtu < BAP_PREF_MTU_MIN {
        return Err(BapError::InvalidParam(format!(
            "preferred MTU {} below {}",
            pref_mtu, BAP_PREF_MTU_MIN
        )));
    }
    Ok(())
}

/// Start handle of a service, `None` lets the attribute database pick one
fn check_shdl(shdl: Option<u16>) -> BapResult<()> {
    if shdl == Some(0) {
        return Err(BapError::InvalidParam("start handle 0".into()));
    }
    Ok(())
}

fn check_timeout(timeout_s: u8) -> BapResult<()> {
    check_range("timeout", timeout_s, BAP_TIMEOUT_MIN_S, BAP_TIMEOUT_MAX_S)
}

/// Capabilities server configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapaSrvConfig {
    /// Sink PAC characteristic instances
    pub nb_pacs_sink: u8,
    /// Source PAC characteristic instances
    pub nb_pacs_src: u8,
    pub location_sink: AudioLocation,
    pub location_src: AudioLocation,
    pub supp_context_sink: ContextType,
    pub supp_context_src: ContextType,
    pub pref_mtu: u16,
    pub shdl: Option<u16>,
}

impl Default for CapaSrvConfig {
    fn default() -> Self {
        Self {
            nb_pacs_sink: 1,
            nb_pacs_src: 0,
            location_sink: AudioLocation::FRONT_LEFT | AudioLocation::FRONT_RIGHT,
            location_src: AudioLocation::empty(),
            supp_context_sink: ContextType::UNSPECIFIED | ContextType::MEDIA,
            supp_context_src: ContextType::empty(),
            pref_mtu: BAP_DEFAULT_PREF_MTU,
            shdl: None,
        }
    }
}

impl CapaSrvConfig {
    pub fn validate(&self) -> BapResult<()> {
        check_range("sink PAC records", self.nb_pacs_sink, 0, BAP_NB_PACS_MAX)?;
        check_range("source PAC records", self.nb_pacs_src, 0, BAP_NB_PACS_MAX)?;
        if self.nb_pacs_sink == 0 && self.nb_pacs_src == 0 {
            return Err(BapError::InvalidParam("no PAC record".into()));
        }
        // A direction without records cannot advertise locations or contexts
        if self.nb_pacs_sink == 0
            && (!self.location_sink.is_empty() || !self.supp_context_sink.is_empty())
        {
            return Err(BapError::InvalidParam("sink capabilities without sink PAC".into()));
        }
        if self.nb_pacs_src == 0
            && (!self.location_src.is_empty() || !self.supp_context_src.is_empty())
        {
            return Err(BapError::InvalidParam(
                "source capabilities without source PAC".into(),
            ));
        }
        check_mtu(self.pref_mtu)?;
        check_shdl(self.shdl)
    }
}

/// Capabilities client configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapaCliConfig {
    pub pref_mtu: u16,
    pub timeout_s: u8,
}

impl Default for CapaCliConfig {
    fn default() -> Self {
        Self {
            pref_mtu: BAP_DEFAULT_PREF_MTU,
            timeout_s: BAP_DEFAULT_TIMEOUT_S,
        }
    }
}

impl CapaCliConfig {
    pub fn validate(&self) -> BapResult<()> {
        check_mtu(self.pref_mtu)?;
        check_timeout(self.timeout_s)
    }
}

/// Unicast server configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UcSrvConfig {
    /// Sink ASE characteristic instances
    pub nb_ase_chars_sink: u8,
    /// Source ASE characteristic instances
    pub nb_ase_chars_src: u8,
    /// ASE configurations shared by every connection
    pub nb_ases_cfg: u8,
    pub pref_mtu: u16,
    pub shdl: Option<u16>,
}

impl Default for UcSrvConfig {
    fn default() -> Self {
        Self {
            nb_ase_chars_sink: 2,
            nb_ase_chars_src: 1,
            nb_ases_cfg: 3,
            pref_mtu: BAP_DEFAULT_PREF_MTU,
            shdl: None,
        }
    }
}

impl UcSrvConfig {
    /// ASE characteristic instances, both directions
    pub fn nb_ase_chars(&self) -> u8 {
        self.nb_ase_chars_sink.saturating_add(self.nb_ase_chars_src)
    }

    pub fn validate(&self, nb_connections: u8) -> BapResult<()> {
        check_range("sink ASE characteristics", self.nb_ase_chars_sink, 0, BAP_NB_ASE_CHARS_MAX)?;
        check_range("source ASE characteristics", self.nb_ase_chars_src, 0, BAP_NB_ASE_CHARS_MAX)?;
        let nb_ase_chars = self.nb_ase_chars();
        check_range("ASE characteristics", nb_ase_chars, 1, BAP_NB_ASE_CHARS_MAX)?;
        let max_cfg = (nb_ase_chars as u16 * nb_connections as u16).min(u8::MAX as u16) as u8;
        check_range("ASE configurations", self.nb_ases_cfg, nb_ase_chars, max_cfg)?;
        check_mtu(self.pref_mtu)?;
        check_shdl(self.shdl)
    }
}

/// Unicast client configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UcCliConfig {
    pub pref_mtu: u16,
    pub timeout_s: u8,
}

impl Default for UcCliConfig {
    fn default() -> Self {
        Self {
            pref_mtu: BAP_DEFAULT_PREF_MTU,
            timeout_s: BAP_DEFAULT_TIMEOUT_S,
        }
    }
}

impl UcCliConfig {
    pub fn validate(&self) -> BapResult<()> {
        check_mtu(self.pref_mtu)?;
        check_timeout(self.timeout_s)
    }
}

/// Broadcast source configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcSrcConfig {
    /// Broadcast groups that can be started at the same time
    pub nb_groups: u8,
}

impl Default for BcSrcConfig {
    fn default() -> Self {
        Self { nb_groups: 1 }
    }
}

impl BcSrcConfig {
    pub fn validate(&self) -> BapResult<()> {
        check_range("broadcast groups", self.nb_groups, 1, BAP_BC_NB_GROUPS_MAX)
    }
}

/// Broadcast sink configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcSinkConfig {
    /// Broadcast groups that can be synchronized at the same time
    pub nb_groups: u8,
}

impl Default for BcSinkConfig {
    fn default() -> Self {
        Self { nb_groups: 1 }
    }
}

impl BcSinkConfig {
    pub fn validate(&self) -> BapResult<()> {
        check_range("broadcast groups", self.nb_groups, 1, BAP_BC_NB_GROUPS_MAX)
    }
}

/// Broadcast assistant configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcAssistConfig {
    pub pref_mtu: u16,
    pub timeout_s: u8,
}

impl Default for BcAssistConfig {
    fn default() -> Self {
        Self {
            pref_mtu: BAP_DEFAULT_PREF_MTU,
            timeout_s: BAP_DEFAULT_TIMEOUT_S,
        }
    }
}

impl BcAssistConfig {
    pub fn validate(&self) -> BapResult<()> {
        check_mtu(self.pref_mtu)?;
        check_timeout(self.timeout_s)
    }
}

/// Broadcast delegator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcDelegConfig {
    /// Broadcast Receive State characteristic instances
    pub nb_srcs: u8,
    pub pref_mtu: u16,
    pub shdl: Option<u16>,
}

impl Default for BcDelegConfig {
    fn default() -> Self {
        Self {
            nb_srcs: 1,
            pref_mtu: BAP_DEFAULT_PREF_MTU,
            shdl: None,
        }
    }
}

impl BcDelegConfig {
    pub fn validate(&self) -> BapResult<()> {
        check_range("broadcast sources", self.nb_srcs, 1, BAP_BC_DELEG_NB_SRCS_MAX)?;
        check_mtu(self.pref_mtu)?;
        check_shdl(self.shdl)
    }
}

/// Configuration of every supported role.
///
/// A role set in `roles` must come with its configuration. A configuration
/// without its role bit is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BapConfig {
    pub roles: BapRoles,
    /// Connections tracked by the server roles
    pub nb_connections: u8,
    pub capa_srv: Option<CapaSrvConfig>,
    pub capa_cli: Option<CapaCliConfig>,
    pub uc_srv: Option<UcSrvConfig>,
    pub uc_cli: Option<UcCliConfig>,
    pub bc_src: Option<BcSrcConfig>,
    pub bc_sink: Option<BcSinkConfig>,
    pub bc_assist: Option<BcAssistConfig>,
    pub bc_deleg: Option<BcDelegConfig>,
}

impl Default for BapConfig {
    fn default() -> Self {
        Self {
            roles: BapRoles::empty(),
            nb_connections: BAP_DEFAULT_NB_CONNECTIONS,
            capa_srv: None,
            capa_cli: None,
            uc_srv: None,
            uc_cli: None,
            bc_src: None,
            bc_sink: None,
            bc_assist: None,
            bc_deleg: None,
        }
    }
}

impl BapConfig {
    /// Configuration with every role enabled and default parameters
    pub fn all_roles() -> Self {
        Self {
            roles: BapRoles::all(),
            nb_connections: BAP_DEFAULT_NB_CONNECTIONS,
            capa_srv: Some(CapaSrvConfig::default()),
            capa_cli: Some(CapaCliConfig::default()),
            uc_srv: Some(UcSrvConfig::default()),
            uc_cli: Some(UcCliConfig::default()),
            bc_src: Some(BcSrcConfig::default()),
            bc_sink: Some(BcSinkConfig::default()),
            bc_assist: Some(BcAssistConfig::default()),
            bc_deleg: Some(BcDelegConfig::default()),
        }
    }

    fn check_role<T>(
        &self,
        role: BapRoles,
        cfg: Option<&T>,
        validate: impl FnOnce(&T) -> BapResult<()>,
    ) -> BapResult<()> {
        if !self.roles.contains(role) {
            return Ok(());
        }
        let cfg = cfg.ok_or_else(|| {
            BapError::InvalidParam(format!("role {} without configuration", role))
        })?;
        validate(cfg)
    }

    pub fn validate(&self) -> BapResult<()> {
        if self.roles.is_empty() {
            return Err(BapError::InvalidParam("no role".into()));
        }
        check_range(
            "number of connections",
            self.nb_connections,
            1,
            BAP_NB_CONNECTIONS_MAX,
        )?;

        let dependencies = [
            (BapRoles::UC_SRV, BapRoles::CAPA_SRV),
            (BapRoles::BC_SINK, BapRoles::CAPA_SRV),
            (BapRoles::BC_DELEG, BapRoles::BC_SINK),
        ];
        for (role, needed) in dependencies {
            if self.roles.contains(role) && !self.roles.contains(needed) {
                return Err(BapError::InvalidParam(format!(
                    "role {} requires role {}",
                    role, needed
                )));
            }
        }

        let nb_connections = self.nb_connections;
        self.check_role(BapRoles::CAPA_SRV, self.capa_srv.as_ref(), CapaSrvConfig::validate)?;
        self.check_role(BapRoles::CAPA_CLI, self.capa_cli.as_ref(), CapaCliConfig::validate)?;
        self.check_role(BapRoles::UC_SRV, self.uc_srv.as_ref(), |cfg| {
            cfg.validate(nb_connections)
        })?;
        self.check_role(BapRoles::UC_CLI, self.uc_cli.as_ref(), UcCliConfig::validate)?;
        self.check_role(BapRoles::BC_SRC, self.bc_src.as_ref(), BcSrcConfig::validate)?;
        self.check_role(BapRoles::BC_SINK, self.bc_sink.as_ref(), BcSinkConfig::validate)?;
        self.check_role(BapRoles::BC_ASSIST, self.bc_assist.as_ref(), BcAssistConfig::validate)?;
        self.check_role(BapRoles::BC_DELEG, self.bc_deleg.as_ref(), BcDelegConfig::validate)
    }
}
