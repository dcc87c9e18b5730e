//! Telephone Bearer Service server
//!
//! Keeps the bearers and the shared call pool, applies call state transitions
//! requested locally or through the Call Control Point, and queues the
//! notifications clients subscribed to.

use super::bearer::Bearer;
use super::call::{check_uri, joined_states, Call};
use super::constants::*;
use super::event::TbsEvent;
use super::types::*;
use crate::event::EventQueue;
use crate::lid::{Lid, LidTable};
use log::{debug, info, trace, warn};

/// Validated Call Control Point request
#[derive(Debug, Clone, PartialEq, Eq)]
enum CpAction {
    Accept(Lid),
    Terminate(Lid),
    Hold(Lid),
    Retrieve(Lid),
    Originate { call_index: Lid, uri: String },
    Join(Vec<Lid>),
}

impl CpAction {
    fn call_index(&self) -> Lid {
        match self {
            CpAction::Accept(lid)
            | CpAction::Terminate(lid)
            | CpAction::Hold(lid)
            | CpAction::Retrieve(lid) => *lid,
            CpAction::Originate { call_index, .. } => *call_index,
            CpAction::Join(lids) => lids.first().copied().unwrap_or_default(),
        }
    }
}

/// Call Control Point result matching a local error
fn cp_result(err: &TbsError) -> CpResult {
    match err {
        TbsError::CallNotFound => CpResult::InvalidCallIndex,
        TbsError::StateMismatch => CpResult::StateMismatch,
        TbsError::InsufficientResources => CpResult::LackOfResources,
        TbsError::InvalidUri(_) => CpResult::InvalidOutgoingUri,
        TbsError::FeatureNotSupported => CpResult::OpcodeNotSupported,
        _ => CpResult::OperationNotPossible,
    }
}

fn check_len(name: &str, value: &str, max: usize) -> TbsResult<()> {
    if value.len() > max {
        return Err(TbsError::InvalidParam(format!(
            "{} longer than {} bytes",
            name, max
        )));
    }
    Ok(())
}

fn check_uri_schemes(schemes: &str) -> TbsResult<()> {
    check_len("URI schemes", schemes, TBS_NAME_LEN_MAX)?;
    let valid = schemes.split(',').all(|scheme| {
        let scheme = scheme.trim();
        !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c))
    });
    if !valid {
        return Err(TbsError::InvalidParam(format!(
            "invalid URI schemes list '{}'",
            schemes
        )));
    }
    Ok(())
}

/// Telephone Bearer Service server
#[derive(Debug)]
pub struct TbsServer {
    config: Option<TbsConfig>,
    bearers: LidTable<Bearer>,
    /// Call pool shared by every bearer, the local index is the call index
    calls: LidTable<Call>,
    events: EventQueue<TbsEvent>,
}

impl Default for TbsServer {
    fn default() -> Self {
        Self::new()
    }
}

impl TbsServer {
    /// Create a server that still has to be configured
    pub fn new() -> Self {
        Self {
            config: None,
            bearers: LidTable::new(0),
            calls: LidTable::new(0),
            events: EventQueue::new(),
        }
    }

    /// Size the bearer table and the call pool. Allowed once.
    pub fn configure(&mut self, config: TbsConfig) -> TbsResult<()> {
        if self.config.is_some() {
            warn!("Telephone bearer server already configured");
            return Err(TbsError::CommandDisallowed);
        }
        config.validate()?;
        self.bearers = LidTable::new(config.nb_tbs);
        self.calls = LidTable::new(config.call_pool_size);
        self.config = Some(config);
        info!(
            "TBS configured: {} bearers, {} calls of {} bytes",
            config.nb_tbs, config.call_pool_size, config.call_pool_uri_len
        );
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> TbsResult<TbsConfig> {
        self.config.ok_or(TbsError::NotConfigured)
    }

    fn check_con(&self, con_lid: Lid) -> TbsResult<()> {
        let config = self.config()?;
        if con_lid as usize >= config.nb_connections {
            return Err(TbsError::InvalidParam(format!(
                "connection {} not tracked",
                con_lid
            )));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Bearers
    // ---------------------------------------------------------------------

    /// Add a bearer instance
    pub fn add(&mut self, param: BearerParam) -> TbsResult<Lid> {
        let config = self.config()?;
        check_len("provider name", &param.provider_name, TBS_NAME_LEN_MAX)?;
        check_len("UCI", &param.uci, TBS_NAME_LEN_MAX)?;
        if param.uci.is_empty() {
            return Err(TbsError::InvalidParam("empty UCI".into()));
        }
        check_uri_schemes(&param.uri_schemes)?;
        if self.bearers.find(|b| b.ccid() == param.ccid).is_some() {
            return Err(TbsError::InvalidParam(format!(
                "CCID {} already used",
                param.ccid
            )));
        }

        let ccid = param.ccid;
        let bearer_lid = self
            .bearers
            .insert(Bearer::new(param, config.nb_connections))
            .map_err(|_| TbsError::InsufficientResources)?;
        info!("Bearer {} added with CCID {}", bearer_lid, ccid);
        Ok(bearer_lid)
    }

    pub fn bearer(&self, bearer_lid: Lid) -> TbsResult<&Bearer> {
        self.config()?;
        self.bearers.get(bearer_lid).ok_or(TbsError::BearerNotFound)
    }

    fn bearer_mut(&mut self, bearer_lid: Lid) -> TbsResult<&mut Bearer> {
        self.config()?;
        self.bearers
            .get_mut(bearer_lid)
            .ok_or(TbsError::BearerNotFound)
    }

    pub fn set_provider_name(&mut self, bearer_lid: Lid, name: &str) -> TbsResult<()> {
        check_len("provider name", name, TBS_NAME_LEN_MAX)?;
        let bearer = self.bearer_mut(bearer_lid)?;
        if bearer.param.provider_name != name {
            bearer.param.provider_name = name.to_string();
            self.notify(bearer_lid, TbsChar::ProviderName);
        }
        Ok(())
    }

    pub fn set_uci(&mut self, bearer_lid: Lid, uci: &str) -> TbsResult<()> {
        check_len("UCI", uci, TBS_NAME_LEN_MAX)?;
        if uci.is_empty() {
            return Err(TbsError::InvalidParam("empty UCI".into()));
        }
        self.bearer_mut(bearer_lid)?.param.uci = uci.to_string();
        Ok(())
    }

    pub fn set_technology(&mut self, bearer_lid: Lid, technology: Technology) -> TbsResult<()> {
        let bearer = self.bearer_mut(bearer_lid)?;
        if bearer.param.technology != technology {
            bearer.param.technology = technology;
            self.notify(bearer_lid, TbsChar::Technology);
        }
        Ok(())
    }

    pub fn set_uri_schemes(&mut self, bearer_lid: Lid, schemes: &str) -> TbsResult<()> {
        check_uri_schemes(schemes)?;
        let bearer = self.bearer_mut(bearer_lid)?;
        bearer.param.uri_schemes = schemes.to_string();
        if bearer.param.cfg.contains(BearerCfg::URI_SCHEMES_NOTIFY) {
            self.notify(bearer_lid, TbsChar::UriSchemes);
        }
        Ok(())
    }

    /// Set the signal strength, 0 to 100 or 255 when unavailable
    pub fn set_signal_strength(&mut self, bearer_lid: Lid, value: u8) -> TbsResult<()> {
        if value > TBS_SIGNAL_STRENGTH_MAX && value != TBS_SIGNAL_STRENGTH_UNAVAILABLE {
            return Err(TbsError::InvalidParam(format!(
                "signal strength {} outside [0, {}]",
                value, TBS_SIGNAL_STRENGTH_MAX
            )));
        }
        let bearer = self.bearer_mut(bearer_lid)?;
        if !bearer.supports(TbsChar::SignalStrength) {
            return Err(TbsError::FeatureNotSupported);
        }
        if bearer.signal_strength != value {
            bearer.signal_strength = value;
            self.notify(bearer_lid, TbsChar::SignalStrength);
        }
        Ok(())
    }

    pub fn set_signal_strength_intv(&mut self, bearer_lid: Lid, intv_s: u8) -> TbsResult<()> {
        let bearer = self.bearer_mut(bearer_lid)?;
        if !bearer.supports(TbsChar::SignalStrengthIntv) {
            return Err(TbsError::FeatureNotSupported);
        }
        bearer.param.signal_strength_intv_s = intv_s;
        Ok(())
    }

    /// Set the status flags. Bits without meaning are rejected.
    pub fn set_status_flags(&mut self, bearer_lid: Lid, bits: u16) -> TbsResult<()> {
        let flags = StatusFlags::from_bits(bits)
            .ok_or_else(|| TbsError::InvalidParam(format!("status flags 0x{:04x}", bits)))?;
        let bearer = self.bearer_mut(bearer_lid)?;
        if bearer.status_flags != flags {
            bearer.status_flags = flags;
            self.notify(bearer_lid, TbsChar::StatusFlags);
        }
        Ok(())
    }

    /// Read the current value of a characteristic
    pub fn read(&self, bearer_lid: Lid, chr: TbsChar) -> TbsResult<Vec<u8>> {
        let bearer = self.bearer(bearer_lid)?;
        if !bearer.supports(chr) {
            return Err(TbsError::FeatureNotSupported);
        }
        if chr == TbsChar::CallControlPoint {
            return Err(TbsError::CommandDisallowed);
        }
        Ok(bearer.value(chr, &self.calls_of(bearer_lid)))
    }

    // ---------------------------------------------------------------------
    // Client configuration
    // ---------------------------------------------------------------------

    /// Enable or disable notifications of a characteristic for a connection
    pub fn set_cli_cfg(&mut self, con_lid: Lid, bearer_lid: Lid, chr: TbsChar, enable: bool) -> TbsResult<()> {
        self.check_con(con_lid)?;
        let bearer = self.bearer_mut(bearer_lid)?;
        if !chr.is_notifiable() || !bearer.supports(chr) {
            return Err(TbsError::InvalidParam(format!("{} cannot be notified", chr)));
        }
        let cfg = &mut bearer.cli_cfg[con_lid as usize];
        if enable {
            *cfg |= chr.cfg_bit();
        } else {
            *cfg &= !chr.cfg_bit();
        }
        debug!(
            "Connection {} {} notifications of {} on bearer {}",
            con_lid,
            if enable { "enabled" } else { "disabled" },
            chr,
            bearer_lid
        );
        Ok(())
    }

    /// Client configuration bit field of a connection for a bearer
    pub fn cli_cfg(&self, con_lid: Lid, bearer_lid: Lid) -> TbsResult<u32> {
        self.check_con(con_lid)?;
        let bearer = self.bearer(bearer_lid)?;
        Ok(bearer.cli_cfg[con_lid as usize])
    }

    /// Forget the client configuration of a disconnected client
    pub fn con_cleanup(&mut self, con_lid: Lid) -> TbsResult<()> {
        self.check_con(con_lid)?;
        for (_, bearer) in self.bearers.iter_mut() {
            bearer.cli_cfg[con_lid as usize] = 0;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Calls
    // ---------------------------------------------------------------------

    /// Report an incoming call. Returns the call index.
    pub fn call_incoming(
        &mut self,
        bearer_lid: Lid,
        uri: &str,
        target_uri: Option<&str>,
        friendly_name: Option<&str>,
    ) -> TbsResult<Lid> {
        let config = self.config()?;
        self.bearer(bearer_lid)?;
        check_uri(uri, None).map_err(TbsError::InvalidUri)?;
        check_len("URI", uri, config.call_pool_uri_len)?;
        if let Some(target) = target_uri {
            check_uri(target, None).map_err(TbsError::InvalidUri)?;
            check_len("target URI", target, config.call_pool_uri_len)?;
        }
        if let Some(name) = friendly_name {
            check_len("friendly name", name, config.call_pool_uri_len)?;
        }

        let mut call = Call::incoming(bearer_lid, uri);
        call.target_uri = target_uri.map(str::to_string);
        call.friendly_name = friendly_name.map(str::to_string);
        let call_id = self.alloc_call(call)?;

        if let Some(bearer) = self.bearers.get_mut(bearer_lid) {
            bearer.incoming_call = Some((call_id, uri.to_string()));
            if let Some(target) = target_uri {
                bearer.incoming_target = Some((call_id, target.to_string()));
            }
            if let Some(name) = friendly_name {
                bearer.friendly_name = Some((call_id, name.to_string()));
            }
        }

        self.notify(bearer_lid, TbsChar::IncomingCall);
        if target_uri.is_some() {
            self.notify(bearer_lid, TbsChar::IncomingTargetUri);
        }
        if friendly_name.is_some() {
            self.notify(bearer_lid, TbsChar::FriendlyName);
        }
        self.notify_calls(bearer_lid);
        Ok(call_id)
    }

    /// Report a call placed by the local user. Returns the call index.
    pub fn call_outgoing(
        &mut self,
        bearer_lid: Lid,
        uri: &str,
        friendly_name: Option<&str>,
    ) -> TbsResult<Lid> {
        let config = self.config()?;
        let bearer = self.bearer(bearer_lid)?;
        check_uri(uri, Some(bearer.uri_schemes())).map_err(TbsError::InvalidUri)?;
        check_len("URI", uri, config.call_pool_uri_len)?;
        if let Some(name) = friendly_name {
            check_len("friendly name", name, config.call_pool_uri_len)?;
        }

        let mut call = Call::outgoing(bearer_lid, uri);
        call.friendly_name = friendly_name.map(str::to_string);
        let call_id = self.alloc_call(call)?;

        if let Some(name) = friendly_name {
            if let Some(bearer) = self.bearers.get_mut(bearer_lid) {
                bearer.friendly_name = Some((call_id, name.to_string()));
            }
            self.notify(bearer_lid, TbsChar::FriendlyName);
        }
        self.notify_calls(bearer_lid);
        Ok(call_id)
    }

    /// Apply an action decided by the local user
    pub fn call_action(&mut self, call_id: Lid, action: CallAction) -> TbsResult<()> {
        match action {
            CallAction::Accept => self.transition(call_id, CallState::accept),
            CallAction::Hold => self.transition(call_id, CallState::local_hold),
            CallAction::Retrieve => self.transition(call_id, CallState::local_retrieve),
            CallAction::Terminate(reason) => {
                self.config()?;
                if !self.calls.contains(call_id) {
                    return Err(TbsError::CallNotFound);
                }
                self.terminate(call_id, reason);
                Ok(())
            }
        }
    }

    /// Remote party is being alerted for an outgoing call
    pub fn call_remote_alert(&mut self, call_id: Lid) -> TbsResult<()> {
        self.transition(call_id, CallState::remote_alert)
    }

    /// Remote party answered an outgoing call
    pub fn call_remote_answer(&mut self, call_id: Lid) -> TbsResult<()> {
        self.transition(call_id, CallState::remote_answer)
    }

    pub fn call_remote_hold(&mut self, call_id: Lid) -> TbsResult<()> {
        self.transition(call_id, CallState::remote_hold)
    }

    pub fn call_remote_retrieve(&mut self, call_id: Lid) -> TbsResult<()> {
        self.transition(call_id, CallState::remote_retrieve)
    }

    /// Join calls of one bearer, the first one listed stays in use
    pub fn call_join(&mut self, call_ids: &[Lid]) -> TbsResult<()> {
        self.config()?;
        let first = call_ids
            .first()
            .and_then(|id| self.calls.get(*id))
            .ok_or(TbsError::CallNotFound)?;
        let bearer_lid = first.bearer_lid;
        self.check_join(bearer_lid, call_ids)?;
        self.join(bearer_lid, call_ids);
        Ok(())
    }

    /// Set the withheld flags of a call, the direction cannot change
    pub fn set_call_flags(&mut self, call_id: Lid, flags: CallFlags) -> TbsResult<()> {
        self.config()?;
        if flags.contains(CallFlags::OUTGOING) {
            return Err(TbsError::InvalidParam("call direction is fixed".into()));
        }
        let call = self.calls.get_mut(call_id).ok_or(TbsError::CallNotFound)?;
        call.flags = (call.flags & CallFlags::OUTGOING) | flags;
        let bearer_lid = call.bearer_lid;
        self.notify_calls(bearer_lid);
        Ok(())
    }

    pub fn call(&self, call_id: Lid) -> Option<&Call> {
        self.calls.get(call_id)
    }

    pub fn call_state(&self, call_id: Lid) -> Option<CallState> {
        self.calls.get(call_id).map(|c| c.state)
    }

    /// Number of calls in the pool, all bearers together
    pub fn nb_calls(&self) -> usize {
        self.calls.len()
    }

    /// Call indexes of a bearer, in increasing order
    pub fn bearer_calls(&self, bearer_lid: Lid) -> Vec<Lid> {
        self.calls_of(bearer_lid)
            .into_iter()
            .map(|(call_id, _)| call_id)
            .collect()
    }

    // ---------------------------------------------------------------------
    // Call Control Point
    // ---------------------------------------------------------------------

    /// Process a Call Control Point write from a client.
    ///
    /// Exactly one result is produced per write. It is returned, and notified to
    /// the writing client when it enabled Call Control Point notifications.
    pub fn cp_write(&mut self, con_lid: Lid, bearer_lid: Lid, data: &[u8]) -> TbsResult<CpNotification> {
        self.check_con(con_lid)?;
        self.bearer(bearer_lid)?;
        let (&opcode, operands) = data
            .split_first()
            .ok_or_else(|| TbsError::InvalidParam("empty Call Control Point write".into()))?;

        let checked = self.cp_check(bearer_lid, opcode, operands);
        let notification = match &checked {
            Ok(action) => CpNotification {
                opcode,
                call_index: action.call_index(),
                result: CpResult::Success,
            },
            Err((call_index, result)) => CpNotification {
                opcode,
                call_index: *call_index,
                result: *result,
            },
        };
        debug!(
            "Connection {} wrote opcode 0x{:02x} on bearer {}: {:?}",
            con_lid, opcode, bearer_lid, notification.result
        );

        let enabled = self
            .bearers
            .get(bearer_lid)
            .map_or(false, |b| b.is_enabled(con_lid, TbsChar::CallControlPoint));
        if enabled {
            self.events.push(TbsEvent::Notify {
                con_lid,
                bearer_lid,
                chr: TbsChar::CallControlPoint,
                value: notification.to_bytes().to_vec(),
            });
        }

        if let Ok(action) = checked {
            self.cp_apply(con_lid, bearer_lid, action);
        }
        Ok(notification)
    }

    /// Validate a write without changing anything
    fn cp_check(&self, bearer_lid: Lid, opcode: u8, operands: &[u8]) -> Result<CpAction, (Lid, CpResult)> {
        let first = operands.first().copied().unwrap_or_default();
        let opt_opcodes = self
            .bearers
            .get(bearer_lid)
            .map(|b| b.opt_opcodes())
            .unwrap_or_else(OptOpcodes::empty);

        let op = CpOpcode::from_u8(opcode).ok_or((first, CpResult::OpcodeNotSupported))?;
        let supported = match op {
            CpOpcode::LocalHold | CpOpcode::LocalRetrieve => {
                opt_opcodes.contains(OptOpcodes::LOCAL_HOLD)
            }
            CpOpcode::Join => opt_opcodes.contains(OptOpcodes::JOIN),
            _ => true,
        };
        if !supported {
            return Err((first, CpResult::OpcodeNotSupported));
        }

        match op {
            CpOpcode::Accept | CpOpcode::Terminate | CpOpcode::LocalHold | CpOpcode::LocalRetrieve => {
                if operands.len() != 1 {
                    return Err((first, CpResult::OperationNotPossible));
                }
                let call = self
                    .calls
                    .get(first)
                    .filter(|c| c.bearer_lid == bearer_lid)
                    .ok_or((first, CpResult::InvalidCallIndex))?;
                let (next, action) = match op {
                    CpOpcode::Accept => (call.state.accept(), CpAction::Accept(first)),
                    CpOpcode::LocalHold => (call.state.local_hold(), CpAction::Hold(first)),
                    CpOpcode::LocalRetrieve => {
                        (call.state.local_retrieve(), CpAction::Retrieve(first))
                    }
                    _ => (Some(call.state), CpAction::Terminate(first)),
                };
                next.map(|_| action).ok_or((first, CpResult::StateMismatch))
            }
            CpOpcode::Originate => {
                let uri_len = self.config.map(|c| c.call_pool_uri_len).unwrap_or_default();
                let call_index = self.calls.next_free().ok_or((0, CpResult::LackOfResources))?;
                if operands.len() > uri_len {
                    return Err((0, CpResult::LackOfResources));
                }
                let uri = std::str::from_utf8(operands)
                    .map_err(|_| (0, CpResult::InvalidOutgoingUri))?;
                let schemes = self.bearers.get(bearer_lid).map(|b| b.uri_schemes());
                check_uri(uri, schemes).map_err(|_| (0, CpResult::InvalidOutgoingUri))?;
                Ok(CpAction::Originate {
                    call_index,
                    uri: uri.to_string(),
                })
            }
            CpOpcode::Join => {
                self.check_join(bearer_lid, operands)
                    .map_err(|err| (first, cp_result(&err)))?;
                Ok(CpAction::Join(operands.to_vec()))
            }
        }
    }

    fn cp_apply(&mut self, con_lid: Lid, bearer_lid: Lid, action: CpAction) {
        let call_id = action.call_index();
        let opcode = match action {
            CpAction::Accept(call_id) => {
                self.set_state(call_id, CallState::Active);
                CpOpcode::Accept
            }
            CpAction::Hold(call_id) => {
                if let Some(next) = self.call_state(call_id).and_then(CallState::local_hold) {
                    self.set_state(call_id, next);
                }
                CpOpcode::LocalHold
            }
            CpAction::Retrieve(call_id) => {
                if let Some(next) = self.call_state(call_id).and_then(CallState::local_retrieve) {
                    self.set_state(call_id, next);
                }
                CpOpcode::LocalRetrieve
            }
            CpAction::Terminate(call_id) => {
                self.terminate(call_id, TermReason::ClientEnd);
                CpOpcode::Terminate
            }
            CpAction::Originate { uri, .. } => {
                match self.alloc_call(Call::outgoing(bearer_lid, &uri)) {
                    Ok(_) => self.notify_calls(bearer_lid),
                    Err(err) => warn!("Originate on bearer {} failed: {}", bearer_lid, err),
                }
                CpOpcode::Originate
            }
            CpAction::Join(call_ids) => {
                self.join(bearer_lid, &call_ids);
                CpOpcode::Join
            }
        };

        self.events.push(TbsEvent::CallRequest {
            con_lid,
            bearer_lid,
            call_id,
            opcode,
        });
    }

    /// Next indication for the upper layer
    pub fn poll_event(&mut self) -> Option<TbsEvent> {
        self.events.pop()
    }

    pub fn drain_events(&mut self) -> Vec<TbsEvent> {
        self.events.drain()
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn calls_of(&self, bearer_lid: Lid) -> Vec<(Lid, &Call)> {
        self.calls
            .iter()
            .filter(|(_, call)| call.bearer_lid == bearer_lid)
            .collect()
    }

    fn alloc_call(&mut self, call: Call) -> TbsResult<Lid> {
        let bearer_lid = call.bearer_lid;
        let state = call.state;
        let call_id = self.calls.insert(call).map_err(|_| {
            warn!("Call pool exhausted");
            TbsError::InsufficientResources
        })?;
        info!("Call {} created on bearer {} in state {:?}", call_id, bearer_lid, state);
        Ok(call_id)
    }

    fn transition(&mut self, call_id: Lid, next: fn(CallState) -> Option<CallState>) -> TbsResult<()> {
        self.config()?;
        let state = self.call_state(call_id).ok_or(TbsError::CallNotFound)?;
        let next = next(state).ok_or(TbsError::StateMismatch)?;
        self.set_state(call_id, next);
        Ok(())
    }

    fn set_state(&mut self, call_id: Lid, state: CallState) {
        let Some(call) = self.calls.get_mut(call_id) else {
            return;
        };
        debug!("Call {}: {:?} -> {:?}", call_id, call.state, state);
        call.state = state;
        let bearer_lid = call.bearer_lid;
        self.notify_calls(bearer_lid);
    }

    fn check_join(&self, bearer_lid: Lid, call_ids: &[Lid]) -> TbsResult<()> {
        if call_ids.len() < 2 {
            return Err(TbsError::InvalidParam("at least two calls are joined".into()));
        }
        for (i, call_id) in call_ids.iter().enumerate() {
            if call_ids[..i].contains(call_id) {
                return Err(TbsError::InvalidParam(format!("call {} listed twice", call_id)));
            }
        }
        let mut states = Vec::with_capacity(call_ids.len());
        for call_id in call_ids {
            let call = self
                .calls
                .get(*call_id)
                .filter(|c| c.bearer_lid == bearer_lid)
                .ok_or(TbsError::CallNotFound)?;
            states.push(call.state);
        }
        if !states.iter().all(|s| s.is_joinable()) {
            return Err(TbsError::StateMismatch);
        }
        Ok(())
    }

    fn join(&mut self, bearer_lid: Lid, call_ids: &[Lid]) {
        let states: Vec<CallState> = call_ids
            .iter()
            .filter_map(|id| self.call_state(*id))
            .collect();
        for (call_id, state) in call_ids.iter().zip(joined_states(&states)) {
            if let Some(call) = self.calls.get_mut(*call_id) {
                call.state = state;
            }
        }
        debug!("Calls {:?} joined on bearer {}", call_ids, bearer_lid);
        self.notify_calls(bearer_lid);
    }

    fn terminate(&mut self, call_id: Lid, reason: TermReason) {
        let Some(call) = self.calls.remove(call_id) else {
            return;
        };
        let bearer_lid = call.bearer_lid;
        if let Some(bearer) = self.bearers.get_mut(bearer_lid) {
            bearer.termination = Some((call_id, reason));
            for entry in [
                &mut bearer.incoming_call,
                &mut bearer.incoming_target,
                &mut bearer.friendly_name,
            ] {
                if entry.as_ref().map_or(false, |(id, _)| *id == call_id) {
                    *entry = None;
                }
            }
        }
        info!("Call {} on bearer {} terminated: {:?}", call_id, bearer_lid, reason);

        self.notify(bearer_lid, TbsChar::TerminationReason);
        self.notify_calls(bearer_lid);
        self.events.push(TbsEvent::CallTerminated {
            bearer_lid,
            call_id,
            reason,
        });
    }

    fn notify_calls(&mut self, bearer_lid: Lid) {
        self.notify(bearer_lid, TbsChar::CurrentCalls);
        self.notify(bearer_lid, TbsChar::CallState);
    }

    /// Queue the value of a characteristic for every subscribed connection
    fn notify(&mut self, bearer_lid: Lid, chr: TbsChar) {
        let Some(bearer) = self.bearers.get(bearer_lid) else {
            return;
        };
        if !bearer.supports(chr) {
            return;
        }
        let subscribers = bearer.subscribers(chr);
        if subscribers.is_empty() {
            trace!("No subscriber for {} on bearer {}", chr, bearer_lid);
            return;
        }
        let value = bearer.value(chr, &self.calls_of(bearer_lid));
        for con_lid in subscribers {
            self.events.push(TbsEvent::Notify {
                con_lid,
                bearer_lid,
                chr,
                value: value.clone(),
            });
        }
    }
}
