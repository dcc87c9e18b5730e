//! Calls and their state transitions

use super::types::*;
use crate::lid::Lid;

/// A call on a bearer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub bearer_lid: Lid,
    pub state: CallState,
    pub flags: CallFlags,
    /// Caller URI for incoming calls, target URI for outgoing calls
    pub uri: String,
    /// URI the caller dialed to reach this bearer, incoming calls only
    pub target_uri: Option<String>,
    pub friendly_name: Option<String>,
}

impl Call {
    pub fn incoming(bearer_lid: Lid, uri: &str) -> Self {
        Self {
            bearer_lid,
            state: CallState::Incoming,
            flags: CallFlags::empty(),
            uri: uri.to_string(),
            target_uri: None,
            friendly_name: None,
        }
    }

    pub fn outgoing(bearer_lid: Lid, uri: &str) -> Self {
        Self {
            bearer_lid,
            state: CallState::Dialing,
            flags: CallFlags::OUTGOING,
            uri: uri.to_string(),
            target_uri: None,
            friendly_name: None,
        }
    }

    pub fn is_outgoing(&self) -> bool {
        self.flags.contains(CallFlags::OUTGOING)
    }
}

impl CallState {
    /// State after the call is answered on the server side
    pub fn accept(self) -> Option<Self> {
        match self {
            CallState::Incoming | CallState::Alerting => Some(CallState::Active),
            _ => None,
        }
    }

    pub fn local_hold(self) -> Option<Self> {
        match self {
            CallState::Active => Some(CallState::LocallyHeld),
            CallState::RemotelyHeld => Some(CallState::LocallyAndRemotelyHeld),
            _ => None,
        }
    }

    pub fn local_retrieve(self) -> Option<Self> {
        match self {
            CallState::LocallyHeld => Some(CallState::Active),
            CallState::LocallyAndRemotelyHeld => Some(CallState::RemotelyHeld),
            _ => None,
        }
    }

    /// Remote party is being alerted
    pub fn remote_alert(self) -> Option<Self> {
        match self {
            CallState::Dialing => Some(CallState::Alerting),
            _ => None,
        }
    }

    pub fn remote_answer(self) -> Option<Self> {
        match self {
            CallState::Dialing | CallState::Alerting => Some(CallState::Active),
            _ => None,
        }
    }

    pub fn remote_hold(self) -> Option<Self> {
        match self {
            CallState::Active => Some(CallState::RemotelyHeld),
            CallState::LocallyHeld => Some(CallState::LocallyAndRemotelyHeld),
            _ => None,
        }
    }

    pub fn remote_retrieve(self) -> Option<Self> {
        match self {
            CallState::RemotelyHeld => Some(CallState::Active),
            CallState::LocallyAndRemotelyHeld => Some(CallState::LocallyHeld),
            _ => None,
        }
    }

    pub fn is_remotely_held(self) -> bool {
        matches!(
            self,
            CallState::RemotelyHeld | CallState::LocallyAndRemotelyHeld
        )
    }

    /// Call is established and may take part in a join
    pub fn is_joinable(self) -> bool {
        matches!(
            self,
            CallState::Active
                | CallState::LocallyHeld
                | CallState::RemotelyHeld
                | CallState::LocallyAndRemotelyHeld
        )
    }
}

/// States of joined calls, in the order they were listed.
///
/// The first call becomes the active one; a remote hold on it is kept. Every other
/// call is held locally on top of any remote hold.
pub fn joined_states(states: &[CallState]) -> Vec<CallState> {
    states
        .iter()
        .enumerate()
        .map(|(i, state)| match (i, state.is_remotely_held()) {
            (0, false) => CallState::Active,
            (0, true) => CallState::RemotelyHeld,
            (_, false) => CallState::LocallyHeld,
            (_, true) => CallState::LocallyAndRemotelyHeld,
        })
        .collect()
}

/// Check a URI is `scheme:target`, optionally with the scheme in `schemes`.
///
/// `schemes` is the comma separated list of a bearer.
pub fn check_uri(uri: &str, schemes: Option<&str>) -> Result<(), String> {
    let (scheme, target) = uri
        .split_once(':')
        .ok_or_else(|| format!("'{}' has no scheme", uri))?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
        return Err(format!("'{}' has an invalid scheme", uri));
    }
    if target.is_empty() {
        return Err(format!("'{}' has no target", uri));
    }
    if let Some(schemes) = schemes {
        if !schemes.split(',').any(|s| s.trim() == scheme) {
            return Err(format!("scheme '{}' not supported", scheme));
        }
    }
    Ok(())
}
