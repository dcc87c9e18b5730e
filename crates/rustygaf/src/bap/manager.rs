//! Basic Audio Profile role aggregation
//!
//! Collects the configuration of every supported role in one step. The role
//! modules read their configuration from here once it is accepted.

use super::event::BapEvent;
use super::types::*;
use crate::event::EventQueue;
use log::{info, warn};

/// Basic Audio Profile
#[derive(Debug, Default)]
pub struct Bap {
    config: Option<BapConfig>,
    events: EventQueue<BapEvent>,
}

impl Bap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set up the supported roles. Allowed once.
    pub fn configure(&mut self, config: BapConfig) -> BapResult<()> {
        if self.config.is_some() {
            warn!("Basic audio profile already configured");
            return Err(BapError::CommandDisallowed);
        }
        config.validate()?;

        // Configuration of a role that is not supported is dropped
        let roles = config.roles;
        let keep = |role: BapRoles| roles.contains(role);
        let config = BapConfig {
            capa_srv: config.capa_srv.filter(|_| keep(BapRoles::CAPA_SRV)),
            capa_cli: config.capa_cli.filter(|_| keep(BapRoles::CAPA_CLI)),
            uc_srv: config.uc_srv.filter(|_| keep(BapRoles::UC_SRV)),
            uc_cli: config.uc_cli.filter(|_| keep(BapRoles::UC_CLI)),
            bc_src: config.bc_src.filter(|_| keep(BapRoles::BC_SRC)),
            bc_sink: config.bc_sink.filter(|_| keep(BapRoles::BC_SINK)),
            bc_assist: config.bc_assist.filter(|_| keep(BapRoles::BC_ASSIST)),
            bc_deleg: config.bc_deleg.filter(|_| keep(BapRoles::BC_DELEG)),
            ..config
        };

        info!("BAP configured with roles {}", roles);
        self.config = Some(config);
        self.events.push(BapEvent::Configured { roles });
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Supported roles, empty before configuration
    pub fn roles(&self) -> BapRoles {
        self.config
            .as_ref()
            .map_or(BapRoles::empty(), |config| config.roles)
    }

    pub fn supports(&self, role: BapRoles) -> bool {
        self.is_configured() && self.roles().contains(role)
    }

    pub fn config(&self) -> BapResult<&BapConfig> {
        self.config.as_ref().ok_or(BapError::NotConfigured)
    }

    fn role<'a, T>(
        &'a self,
        role: BapRoles,
        pick: impl FnOnce(&'a BapConfig) -> Option<&'a T>,
    ) -> BapResult<&'a T> {
        let config = self.config()?;
        pick(config).ok_or(BapError::RoleNotSupported(role))
    }

    pub fn capa_srv(&self) -> BapResult<&CapaSrvConfig> {
        self.role(BapRoles::CAPA_SRV, |c| c.capa_srv.as_ref())
    }

    pub fn capa_cli(&self) -> BapResult<&CapaCliConfig> {
        self.role(BapRoles::CAPA_CLI, |c| c.capa_cli.as_ref())
    }

    pub fn uc_srv(&self) -> BapResult<&UcSrvConfig> {
        self.role(BapRoles::UC_SRV, |c| c.uc_srv.as_ref())
    }

    pub fn uc_cli(&self) -> BapResult<&UcCliConfig> {
        self.role(BapRoles::UC_CLI, |c| c.uc_cli.as_ref())
    }

    pub fn bc_src(&self) -> BapResult<&BcSrcConfig> {
        self.role(BapRoles::BC_SRC, |c| c.bc_src.as_ref())
    }

    pub fn bc_sink(&self) -> BapResult<&BcSinkConfig> {
        self.role(BapRoles::BC_SINK, |c| c.bc_sink.as_ref())
    }

    pub fn bc_assist(&self) -> BapResult<&BcAssistConfig> {
        self.role(BapRoles::BC_ASSIST, |c| c.bc_assist.as_ref())
    }

    pub fn bc_deleg(&self) -> BapResult<&BcDelegConfig> {
        self.role(BapRoles::BC_DELEG, |c| c.bc_deleg.as_ref())
    }

    /// Next indication for the upper layer
    pub fn poll_event(&mut self) -> Option<BapEvent> {
        self.events.pop()
    }

    pub fn drain_events(&mut self) -> Vec<BapEvent> {
        self.events.drain()
    }
}
