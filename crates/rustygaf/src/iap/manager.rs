//! IAP manager
//!
//! Owns the interface, group and stream tables and drives the stream lifecycle:
//! - group and stream allocation
//! - enable/disable procedures and their completion
//! - data path setup and removal
//! - test mode and link quality procedures
//!
//! Controller round trips are asynchronous: requests are queued as
//! [`IsoCommand`]s and completed by [`IapManager::on_controller_event`].

use super::constants::*;
use super::event::*;
use super::types::*;
use crate::codec::{Direction, DpConfig};
use crate::event::EventQueue;
use crate::lid::{Lid, LidTable, GAF_INVALID_LID};
use log::{debug, info, trace, warn};
use std::collections::{HashMap, VecDeque};

/// HCI status used when the controller reports success without the expected parameters
const HCI_ERR_UNSPECIFIED: u8 = 0x1F;
/// HCI status for a link terminated by the remote user
const HCI_ERR_REMOTE_USER_TERMINATED: u8 = 0x13;

#[derive(Debug)]
struct Interface;

#[derive(Debug)]
struct Group {
    /// CIG ID or BIG handle
    id: u8,
    intf_lid: Lid,
    params: GroupParams,
    streams: Vec<Lid>,
    /// Connection the group was prepared for, peripheral side only
    con_lid: Option<Lid>,
    code: Option<BroadcastCode>,
    config: Option<GroupConfig>,
    busy: Option<Txn>,
}

impl Group {
    fn kind(&self) -> GroupKind {
        self.params.kind()
    }

    fn is_peripheral(&self) -> bool {
        matches!(self.params, GroupParams::UnicastPeripheral)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestMode {
    Off,
    Transmit,
    Receive,
}

#[derive(Debug)]
struct Stream {
    group_lid: Lid,
    /// CIS ID, or BIS index for broadcast streams
    id: u8,
    con_lid: Option<Lid>,
    params: Option<StreamParams>,
    state: StreamState,
    conhdl: Option<u16>,
    config: Option<UsConfig>,
    dp: [DataPath; 2],
    busy: Option<Txn>,
    test_mode: TestMode,
}

impl Stream {
    fn new(group_lid: Lid, id: u8, state: StreamState) -> Self {
        Self {
            group_lid,
            id,
            con_lid: None,
            params: None,
            state,
            conhdl: None,
            config: None,
            dp: [DataPath::default(), DataPath::default()],
            busy: None,
            test_mode: TestMode::Off,
        }
    }
}

/// Procedure waiting for a controller completion
#[derive(Debug, Clone)]
enum Procedure {
    Enable { group_lid: Lid, streams: Vec<Lid> },
    Disable { group_lid: Lid },
    DpSetup { stream_lid: Lid, direction: Direction },
    DpRemove { stream_lid: Lid, direction: Direction },
    Quality { stream_lid: Lid },
    TmStart { stream_lid: Lid, transmit: bool },
    TmRead { stream_lid: Lid },
    TmStop { stream_lid: Lid },
}

impl Procedure {
    fn group_lid(&self) -> Option<Lid> {
        match self {
            Procedure::Enable { group_lid, .. } | Procedure::Disable { group_lid } => {
                Some(*group_lid)
            }
            _ => None,
        }
    }

    fn stream_lid(&self) -> Option<Lid> {
        match self {
            Procedure::DpSetup { stream_lid, .. }
            | Procedure::DpRemove { stream_lid, .. }
            | Procedure::Quality { stream_lid }
            | Procedure::TmStart { stream_lid, .. }
            | Procedure::TmRead { stream_lid }
            | Procedure::TmStop { stream_lid } => Some(*stream_lid),
            _ => None,
        }
    }

    /// Terminal event reporting `err` for this procedure
    fn failed(&self, err: IapError) -> IapEvent {
        match self {
            Procedure::Enable { group_lid, .. } => IapEvent::GroupEnabled {
                group_lid: *group_lid,
                result: Err(err),
            },
            Procedure::Disable { group_lid } => IapEvent::GroupDisabled {
                group_lid: *group_lid,
                result: Err(err),
            },
            Procedure::DpSetup {
                stream_lid,
                direction,
            } => IapEvent::DataPathSetUp {
                stream_lid: *stream_lid,
                direction: *direction,
                result: Err(err),
            },
            Procedure::DpRemove {
                stream_lid,
                direction,
            } => IapEvent::DataPathRemoved {
                stream_lid: *stream_lid,
                direction: *direction,
                result: Err(err),
            },
            Procedure::Quality { stream_lid } => IapEvent::Quality {
                stream_lid: *stream_lid,
                result: Err(err),
            },
            Procedure::TmStart { stream_lid, .. } => IapEvent::TestModeStarted {
                stream_lid: *stream_lid,
                result: Err(err),
            },
            Procedure::TmRead { stream_lid } => IapEvent::TestModeCounters {
                stream_lid: *stream_lid,
                result: Err(err),
            },
            Procedure::TmStop { stream_lid } => IapEvent::TestModeStopped {
                stream_lid: *stream_lid,
                result: Err(err),
            },
        }
    }
}

/// Payload attached to a controller completion
enum Outcome {
    None,
    Enabled(Option<EnabledConfig>),
    Quality(QualityReport),
    Counters(TmCounters),
}

/// Isochronous group and stream manager
#[derive(Debug)]
pub struct IapManager {
    interfaces: LidTable<Interface>,
    groups: LidTable<Group>,
    streams: LidTable<Stream>,
    /// Procedures waiting for the controller, by transaction
    pending: HashMap<Txn, Procedure>,
    next_txn: Txn,
    commands: VecDeque<IsoCommand>,
    events: EventQueue<IapEvent>,
}

impl IapManager {
    /// Create a manager with the given table sizes
    pub fn new(config: IapConfig) -> IapResult<Self> {
        config.validate()?;
        Ok(Self {
            interfaces: LidTable::new(config.nb_interfaces),
            groups: LidTable::new(config.nb_groups),
            streams: LidTable::new(config.nb_streams),
            pending: HashMap::new(),
            next_txn: 0,
            commands: VecDeque::new(),
            events: EventQueue::new(),
        })
    }

    // ---------------------------------------------------------------------
    // Interfaces
    // ---------------------------------------------------------------------

    /// Allocate an interface
    pub fn intf_add(&mut self) -> IapResult<Lid> {
        let lid = self
            .interfaces
            .insert(Interface)
            .map_err(|_| IapError::InsufficientResources)?;
        info!("IAP interface {} added", lid);
        Ok(lid)
    }

    /// Free an interface no group is attached to
    pub fn intf_remove(&mut self, intf_lid: Lid) -> IapResult<()> {
        if !self.interfaces.contains(intf_lid) {
            return Err(IapError::InterfaceNotFound);
        }
        if self.groups.find(|g| g.intf_lid == intf_lid).is_some() {
            warn!("Interface {} still has groups attached", intf_lid);
            return Err(IapError::CommandDisallowed);
        }
        self.interfaces.remove(intf_lid);
        info!("IAP interface {} removed", intf_lid);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Unicast
    // ---------------------------------------------------------------------

    /// Add a unicast group
    pub fn ug_add(&mut self, intf_lid: Lid, cig_id: u8, param: &UgParam) -> IapResult<Lid> {
        param.validate()?;
        let (group_lid, _) = self.add_group(intf_lid, cig_id, GroupParams::Unicast(*param), None, &[])?;
        Ok(group_lid)
    }

    /// Add a unicast group with test parameters
    pub fn ug_test_add(&mut self, intf_lid: Lid, cig_id: u8, param: &UgTestParam) -> IapResult<Lid> {
        param.validate()?;
        let (group_lid, _) =
            self.add_group(intf_lid, cig_id, GroupParams::UnicastTest(*param), None, &[])?;
        Ok(group_lid)
    }

    /// Configure a stream in a unicast group
    pub fn us_config(&mut self, group_lid: Lid, cis_id: u8, param: &UsParam) -> IapResult<Lid> {
        param.validate()?;
        self.config_stream(group_lid, cis_id, StreamParams::Unicast(*param))
    }

    /// Configure a stream in a unicast group created for test mode
    pub fn us_test_config(&mut self, group_lid: Lid, cis_id: u8, param: &UsTestParam) -> IapResult<Lid> {
        param.validate()?;
        self.config_stream(group_lid, cis_id, StreamParams::UnicastTest(*param))
    }

    /// Bind a configured stream to a connection
    pub fn us_bind(&mut self, stream_lid: Lid, con_lid: Lid) -> IapResult<()> {
        if con_lid == GAF_INVALID_LID {
            return Err(IapError::InvalidParam("invalid connection index".into()));
        }
        self.check_stream_idle(stream_lid)?;
        let stream = self.streams.get_mut(stream_lid).ok_or(IapError::StreamNotFound)?;
        if stream.params.is_none() {
            return Err(IapError::CommandDisallowed);
        }
        match stream.state {
            StreamState::Configured | StreamState::Bound | StreamState::Disabled => {
                stream.con_lid = Some(con_lid);
                stream.state = StreamState::Bound;
                debug!("Stream {} bound to connection {}", stream_lid, con_lid);
                Ok(())
            }
            _ => Err(IapError::CommandDisallowed),
        }
    }

    /// Accept a CIS requested by a remote central.
    ///
    /// Returns the group and stream local indexes. A second request for the same
    /// (CIG, CIS, connection) is rejected without allocating anything.
    pub fn us_prepare(
        &mut self,
        intf_lid: Lid,
        cig_id: u8,
        cis_id: u8,
        con_lid: Lid,
    ) -> IapResult<(Lid, Lid)> {
        check_group_id(GroupKind::Unicast, cig_id)?;
        check_cis_id(cis_id)?;
        if con_lid == GAF_INVALID_LID {
            return Err(IapError::InvalidParam("invalid connection index".into()));
        }
        if !self.interfaces.contains(intf_lid) {
            return Err(IapError::InterfaceNotFound);
        }

        let existing = self
            .groups
            .find(|g| g.is_peripheral() && g.id == cig_id && g.con_lid == Some(con_lid));

        let group_lid = match existing {
            Some(group_lid) => {
                let group = self.groups.get(group_lid).ok_or(IapError::GroupNotFound)?;
                let duplicate = group
                    .streams
                    .iter()
                    .filter_map(|lid| self.streams.get(*lid))
                    .any(|s| s.id == cis_id);
                if duplicate {
                    warn!(
                        "CIS {} of CIG {} already prepared on connection {}",
                        cis_id, cig_id, con_lid
                    );
                    return Err(IapError::CommandDisallowed);
                }
                if group.busy.is_some() {
                    return Err(IapError::Busy);
                }
                if group.streams.len() >= IAP_NB_STREAMS_PER_GROUP_MAX
                    || self.streams.available() == 0
                {
                    return Err(IapError::NoStreamAvailable);
                }
                group_lid
            }
            None => {
                if self.groups.available() == 0 {
                    return Err(IapError::NoGroupAvailable);
                }
                if self.streams.available() == 0 {
                    return Err(IapError::NoStreamAvailable);
                }
                let group_lid = self
                    .groups
                    .insert(Group {
                        id: cig_id,
                        intf_lid,
                        params: GroupParams::UnicastPeripheral,
                        streams: Vec::new(),
                        con_lid: Some(con_lid),
                        code: None,
                        config: None,
                        busy: None,
                    })
                    .map_err(|_| IapError::NoGroupAvailable)?;
                info!("Peripheral group {} created for CIG {}", group_lid, cig_id);
                group_lid
            }
        };

        let mut stream = Stream::new(group_lid, cis_id, StreamState::Prepared);
        stream.con_lid = Some(con_lid);
        let stream_lid = self
            .streams
            .insert(stream)
            .map_err(|_| IapError::NoStreamAvailable)?;
        if let Some(group) = self.groups.get_mut(group_lid) {
            group.streams.push(stream_lid);
        }
        info!(
            "Stream {} prepared for CIS {} of CIG {} on connection {}",
            stream_lid, cis_id, cig_id, con_lid
        );
        Ok((group_lid, stream_lid))
    }

    /// Remove a stream that is not enabled from its unicast group
    pub fn us_release(&mut self, stream_lid: Lid) -> IapResult<()> {
        self.check_stream_idle(stream_lid)?;
        let stream = self.streams.get(stream_lid).ok_or(IapError::StreamNotFound)?;
        let group_lid = stream.group_lid;
        if stream.state == StreamState::Enabled {
            return Err(IapError::CommandDisallowed);
        }
        let group = self.groups.get_mut(group_lid).ok_or(IapError::GroupNotFound)?;
        if group.kind() != GroupKind::Unicast {
            return Err(IapError::CommandDisallowed);
        }

        group.streams.retain(|lid| *lid != stream_lid);
        group.config = None;
        let empty_peripheral = group.is_peripheral() && group.streams.is_empty();
        self.streams.remove(stream_lid);
        info!("Stream {} released from group {}", stream_lid, group_lid);

        if empty_peripheral {
            if let Some(group) = self.groups.remove(group_lid) {
                info!("Peripheral group {} removed", group_lid);
                self.commands.push_back(IsoCommand::RemoveGroup {
                    group_lid,
                    kind: GroupKind::Unicast,
                    id: group.id,
                });
            }
        }
        Ok(())
    }

    /// Enable every bound stream of a unicast group
    pub fn us_enable(&mut self, group_lid: Lid) -> IapResult<()> {
        self.enable_group(group_lid, GroupKind::Unicast)
    }

    /// Disable every enabled stream of a unicast group
    pub fn us_disable(&mut self, group_lid: Lid) -> IapResult<()> {
        self.disable_group(group_lid, GroupKind::Unicast)
    }

    /// Remove a unicast group and its streams
    pub fn ug_remove(&mut self, group_lid: Lid) -> IapResult<()> {
        self.remove_group(group_lid, GroupKind::Unicast)
    }

    // ---------------------------------------------------------------------
    // Broadcast
    // ---------------------------------------------------------------------

    /// Add a broadcast group with `nb_streams` streams
    pub fn bg_add(
        &mut self,
        intf_lid: Lid,
        big_id: u8,
        param: &BgParam,
        nb_streams: u8,
        code: Option<BroadcastCode>,
    ) -> IapResult<(Lid, Vec<Lid>)> {
        param.validate()?;
        let indexes = Self::bis_indexes(nb_streams)?;
        self.add_group(intf_lid, big_id, GroupParams::Broadcast(*param), code, &indexes)
    }

    /// Add a broadcast group with test parameters
    pub fn bg_test_add(
        &mut self,
        intf_lid: Lid,
        big_id: u8,
        param: &BgTestParam,
        nb_streams: u8,
        code: Option<BroadcastCode>,
    ) -> IapResult<(Lid, Vec<Lid>)> {
        param.validate()?;
        let indexes = Self::bis_indexes(nb_streams)?;
        self.add_group(intf_lid, big_id, GroupParams::BroadcastTest(*param), code, &indexes)
    }

    /// Add a group used to synchronize with a remote broadcast group
    pub fn bg_sync_add(
        &mut self,
        intf_lid: Lid,
        big_id: u8,
        param: &BgSyncParam,
    ) -> IapResult<(Lid, Vec<Lid>)> {
        param.validate()?;
        let indexes = param.bis_indices.clone();
        let code = param.code;
        self.add_group(intf_lid, big_id, GroupParams::BroadcastSync(param.clone()), code, &indexes)
    }

    /// Create the broadcast group, or synchronize with it
    pub fn bg_enable(&mut self, group_lid: Lid) -> IapResult<()> {
        self.enable_group(group_lid, GroupKind::Broadcast)
    }

    /// Terminate the broadcast group, or stop synchronization
    pub fn bg_disable(&mut self, group_lid: Lid) -> IapResult<()> {
        self.disable_group(group_lid, GroupKind::Broadcast)
    }

    /// Remove a broadcast group and its streams
    pub fn bg_remove(&mut self, group_lid: Lid) -> IapResult<()> {
        self.remove_group(group_lid, GroupKind::Broadcast)
    }

    fn bis_indexes(nb_streams: u8) -> IapResult<Vec<u8>> {
        if nb_streams == 0 || nb_streams as usize > IAP_NB_STREAMS_PER_GROUP_MAX {
            return Err(IapError::InvalidParam(format!(
                "number of streams {} outside [1, {}]",
                nb_streams, IAP_NB_STREAMS_PER_GROUP_MAX
            )));
        }
        Ok((IAP_BIS_INDEX_MIN..=nb_streams).collect())
    }

    // ---------------------------------------------------------------------
    // Data path
    // ---------------------------------------------------------------------

    /// Store the data path configuration for one direction of a stream
    pub fn dp_config(&mut self, stream_lid: Lid, direction: Direction, config: DpConfig) -> IapResult<()> {
        config.validate()?;
        self.check_stream_idle(stream_lid)?;
        let stream = self.streams.get_mut(stream_lid).ok_or(IapError::StreamNotFound)?;
        let dp = &mut stream.dp[direction.index()];
        match dp.state {
            DpState::NotConfigured | DpState::Configured => {
                debug!("Stream {} {:?} data path configured: {}", stream_lid, direction, config);
                dp.state = DpState::Configured;
                dp.config = Some(config);
                Ok(())
            }
            _ => Err(IapError::CommandDisallowed),
        }
    }

    /// Set up a configured data path on an enabled stream
    pub fn dp_setup(&mut self, stream_lid: Lid, direction: Direction) -> IapResult<()> {
        self.check_stream_idle(stream_lid)?;
        let stream = self.streams.get(stream_lid).ok_or(IapError::StreamNotFound)?;
        if stream.state != StreamState::Enabled {
            return Err(IapError::StreamNotEnabled);
        }
        let dp = &stream.dp[direction.index()];
        let config = match (dp.state, &dp.config) {
            (DpState::Configured, Some(config)) => config.clone(),
            (DpState::NotConfigured, _) | (DpState::Configured, None) => {
                return Err(IapError::DpNotConfigured)
            }
            (DpState::SetUp, _) => return Err(IapError::DpSetup),
            _ => return Err(IapError::Busy),
        };

        let txn = self.start(Procedure::DpSetup {
            stream_lid,
            direction,
        });
        if let Some(stream) = self.streams.get_mut(stream_lid) {
            stream.busy = Some(txn);
            stream.dp[direction.index()].state = DpState::SettingUp;
        }
        self.commands.push_back(IsoCommand::SetupDataPath {
            txn,
            stream_lid,
            direction,
            config,
        });
        Ok(())
    }

    /// Remove a data path that is set up
    pub fn dp_remove(&mut self, stream_lid: Lid, direction: Direction) -> IapResult<()> {
        self.check_stream_idle(stream_lid)?;
        let stream = self.streams.get(stream_lid).ok_or(IapError::StreamNotFound)?;
        if stream.dp[direction.index()].state != DpState::SetUp {
            return Err(IapError::DpNotSetup);
        }

        let txn = self.start(Procedure::DpRemove {
            stream_lid,
            direction,
        });
        if let Some(stream) = self.streams.get_mut(stream_lid) {
            stream.busy = Some(txn);
            stream.dp[direction.index()].state = DpState::Removing;
        }
        self.commands.push_back(IsoCommand::RemoveDataPath {
            txn,
            stream_lid,
            direction,
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Test mode and quality
    // ---------------------------------------------------------------------

    /// Start transmitting or receiving test packets on an enabled stream
    pub fn tm_start(&mut self, stream_lid: Lid, transmit: bool, payload: TmPayload) -> IapResult<()> {
        let stream = self.enabled_idle_stream(stream_lid)?;
        if stream.test_mode != TestMode::Off {
            return Err(IapError::CommandDisallowed);
        }
        // Test packets replace the data path in the tested direction
        let direction = if transmit { Direction::Input } else { Direction::Output };
        if stream.dp[direction.index()].state != DpState::NotConfigured
            && stream.dp[direction.index()].state != DpState::Configured
        {
            return Err(IapError::CommandDisallowed);
        }

        let txn = self.start(Procedure::TmStart {
            stream_lid,
            transmit,
        });
        self.mark_stream_busy(stream_lid, txn);
        self.commands.push_back(IsoCommand::TestModeStart {
            txn,
            stream_lid,
            transmit,
            payload,
        });
        Ok(())
    }

    /// Read the receive test counters
    pub fn tm_cnt_get(&mut self, stream_lid: Lid) -> IapResult<()> {
        let stream = self.enabled_idle_stream(stream_lid)?;
        if stream.test_mode != TestMode::Receive {
            return Err(IapError::CommandDisallowed);
        }
        let txn = self.start(Procedure::TmRead { stream_lid });
        self.mark_stream_busy(stream_lid, txn);
        self.commands.push_back(IsoCommand::TestModeRead { txn, stream_lid });
        Ok(())
    }

    /// Stop test mode, the completion carries the final counters
    pub fn tm_stop(&mut self, stream_lid: Lid) -> IapResult<()> {
        let stream = self.enabled_idle_stream(stream_lid)?;
        if stream.test_mode == TestMode::Off {
            return Err(IapError::CommandDisallowed);
        }
        let txn = self.start(Procedure::TmStop { stream_lid });
        self.mark_stream_busy(stream_lid, txn);
        self.commands.push_back(IsoCommand::TestModeStop { txn, stream_lid });
        Ok(())
    }

    /// Request the link quality counters of an enabled stream
    pub fn gen_get_quality(&mut self, stream_lid: Lid) -> IapResult<()> {
        self.enabled_idle_stream(stream_lid)?;
        let txn = self.start(Procedure::Quality { stream_lid });
        self.mark_stream_busy(stream_lid, txn);
        self.commands.push_back(IsoCommand::ReadQuality { txn, stream_lid });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Controller and upper layer queues
    // ---------------------------------------------------------------------

    /// Next command for the controller
    pub fn poll_command(&mut self) -> Option<IsoCommand> {
        self.commands.pop_front()
    }

    pub fn drain_commands(&mut self) -> Vec<IsoCommand> {
        self.commands.drain(..).collect()
    }

    /// Next indication for the upper layer
    pub fn poll_event(&mut self) -> Option<IapEvent> {
        self.events.pop()
    }

    pub fn drain_events(&mut self) -> Vec<IapEvent> {
        self.events.drain()
    }

    /// Process an event reported by the controller
    pub fn on_controller_event(&mut self, event: IsoControllerEvent) {
        trace!("Controller event: {:?}", event);
        match event {
            IsoControllerEvent::Complete { txn, status } => self.complete(txn, status, Outcome::None),
            IsoControllerEvent::Enabled {
                txn,
                status,
                config,
            } => self.complete(txn, status, Outcome::Enabled(config)),
            IsoControllerEvent::Quality {
                txn,
                status,
                report,
            } => self.complete(txn, status, Outcome::Quality(report)),
            IsoControllerEvent::TestCounters {
                txn,
                status,
                counters,
            } => self.complete(txn, status, Outcome::Counters(counters)),
            IsoControllerEvent::StreamLost { stream_lid, reason } => {
                self.on_stream_lost(stream_lid, reason)
            }
            IsoControllerEvent::GroupLost { group_lid, reason } => {
                self.on_group_lost(group_lid, reason)
            }
        }
    }

    /// Drop every group and interface. Procedures in flight are cancelled.
    pub fn reset(&mut self) {
        let mut txns: Vec<Txn> = self.pending.keys().copied().collect();
        txns.sort_unstable();
        for txn in txns {
            if let Some(procedure) = self.pending.remove(&txn) {
                self.events.push(procedure.failed(IapError::Cancelled));
            }
        }
        self.streams.clear();
        self.groups.clear();
        self.interfaces.clear();
        self.commands.clear();
        info!("IAP reset");
    }

    // ---------------------------------------------------------------------
    // Getters
    // ---------------------------------------------------------------------

    pub fn stream_state(&self, stream_lid: Lid) -> Option<StreamState> {
        self.streams.get(stream_lid).map(|s| s.state)
    }

    pub fn dp_state(&self, stream_lid: Lid, direction: Direction) -> Option<DpState> {
        self.streams
            .get(stream_lid)
            .map(|s| s.dp[direction.index()].state)
    }

    pub fn group_streams(&self, group_lid: Lid) -> Option<&[Lid]> {
        self.groups.get(group_lid).map(|g| g.streams.as_slice())
    }

    pub fn group_config(&self, group_lid: Lid) -> Option<GroupConfig> {
        self.groups.get(group_lid).and_then(|g| g.config)
    }

    pub fn group_kind(&self, group_lid: Lid) -> Option<GroupKind> {
        self.groups.get(group_lid).map(Group::kind)
    }

    pub fn stream_group(&self, stream_lid: Lid) -> Option<Lid> {
        self.streams.get(stream_lid).map(|s| s.group_lid)
    }

    pub fn stream_config(&self, stream_lid: Lid) -> Option<UsConfig> {
        self.streams.get(stream_lid).and_then(|s| s.config)
    }

    pub fn stream_conhdl(&self, stream_lid: Lid) -> Option<u16> {
        self.streams.get(stream_lid).and_then(|s| s.conhdl)
    }

    pub fn nb_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn nb_streams(&self) -> usize {
        self.streams.len()
    }

    /// Number of procedures waiting for the controller
    pub fn nb_pending(&self) -> usize {
        self.pending.len()
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn start(&mut self, procedure: Procedure) -> Txn {
        let mut txn = self.next_txn;
        while self.pending.contains_key(&txn) {
            txn = txn.wrapping_add(1);
        }
        self.next_txn = txn.wrapping_add(1);
        trace!("Transaction {} started: {:?}", txn, procedure);
        self.pending.insert(txn, procedure);
        txn
    }

    fn mark_stream_busy(&mut self, stream_lid: Lid, txn: Txn) {
        if let Some(stream) = self.streams.get_mut(stream_lid) {
            stream.busy = Some(txn);
        }
    }

    /// Stream exists and neither it nor its group has a procedure in flight
    fn check_stream_idle(&self, stream_lid: Lid) -> IapResult<()> {
        let stream = self.streams.get(stream_lid).ok_or(IapError::StreamNotFound)?;
        let group_busy = self
            .groups
            .get(stream.group_lid)
            .map_or(false, |g| g.busy.is_some());
        if stream.busy.is_some() || group_busy {
            return Err(IapError::Busy);
        }
        Ok(())
    }

    fn enabled_idle_stream(&self, stream_lid: Lid) -> IapResult<&Stream> {
        self.check_stream_idle(stream_lid)?;
        let stream = self.streams.get(stream_lid).ok_or(IapError::StreamNotFound)?;
        if stream.state != StreamState::Enabled {
            return Err(IapError::StreamNotEnabled);
        }
        Ok(stream)
    }

    fn add_group(
        &mut self,
        intf_lid: Lid,
        id: u8,
        params: GroupParams,
        code: Option<BroadcastCode>,
        stream_ids: &[u8],
    ) -> IapResult<(Lid, Vec<Lid>)> {
        let kind = params.kind();
        check_group_id(kind, id)?;
        if !self.interfaces.contains(intf_lid) {
            return Err(IapError::InterfaceNotFound);
        }
        if self
            .groups
            .find(|g| g.kind() == kind && !g.is_peripheral() && g.id == id)
            .is_some()
        {
            warn!("{:?} group ID {} already in use", kind, id);
            return Err(IapError::GroupAlreadyExists(id));
        }
        if self.groups.available() == 0 {
            return Err(IapError::NoGroupAvailable);
        }
        if self.streams.available() < stream_ids.len() {
            return Err(IapError::NoStreamAvailable);
        }

        let group_lid = self
            .groups
            .insert(Group {
                id,
                intf_lid,
                params,
                streams: Vec::with_capacity(stream_ids.len()),
                con_lid: None,
                code,
                config: None,
                busy: None,
            })
            .map_err(|_| IapError::NoGroupAvailable)?;

        let mut stream_lids = Vec::with_capacity(stream_ids.len());
        for stream_id in stream_ids {
            let stream_lid = self
                .streams
                .insert(Stream::new(group_lid, *stream_id, StreamState::Configured))
                .map_err(|_| IapError::NoStreamAvailable)?;
            stream_lids.push(stream_lid);
        }
        if let Some(group) = self.groups.get_mut(group_lid) {
            group.streams = stream_lids.clone();
        }

        info!(
            "{:?} group {} added with ID {} and {} streams",
            kind,
            group_lid,
            id,
            stream_lids.len()
        );
        Ok((group_lid, stream_lids))
    }

    fn config_stream(&mut self, group_lid: Lid, cis_id: u8, params: StreamParams) -> IapResult<Lid> {
        check_cis_id(cis_id)?;
        let group = self.groups.get(group_lid).ok_or(IapError::GroupNotFound)?;
        let matching = matches!(
            (&group.params, &params),
            (GroupParams::Unicast(_), StreamParams::Unicast(_))
                | (GroupParams::UnicastTest(_), StreamParams::UnicastTest(_))
        );
        if !matching {
            return Err(IapError::CommandDisallowed);
        }
        if group.busy.is_some() {
            return Err(IapError::Busy);
        }

        let mut streams = group.streams.iter().filter_map(|lid| self.streams.get(*lid));
        if streams.clone().any(|s| s.state == StreamState::Enabled) {
            return Err(IapError::CommandDisallowed);
        }
        if streams.any(|s| s.id == cis_id) {
            return Err(IapError::InvalidParam(format!(
                "CIS ID {} already used in group {}",
                cis_id, group_lid
            )));
        }
        if group.streams.len() >= IAP_NB_STREAMS_PER_GROUP_MAX {
            return Err(IapError::NoStreamAvailable);
        }

        let mut stream = Stream::new(group_lid, cis_id, StreamState::Configured);
        stream.params = Some(params);
        let stream_lid = self
            .streams
            .insert(stream)
            .map_err(|_| IapError::NoStreamAvailable)?;
        if let Some(group) = self.groups.get_mut(group_lid) {
            group.streams.push(stream_lid);
            // CIG parameters have to be set again
            group.config = None;
        }
        info!("Stream {} configured in group {} for CIS {}", stream_lid, group_lid, cis_id);
        Ok(stream_lid)
    }

    fn enable_group(&mut self, group_lid: Lid, kind: GroupKind) -> IapResult<()> {
        let group = self.groups.get(group_lid).ok_or(IapError::GroupNotFound)?;
        if group.kind() != kind {
            return Err(IapError::CommandDisallowed);
        }
        if group.busy.is_some() {
            return Err(IapError::Busy);
        }

        let members: Vec<(Lid, &Stream)> = group
            .streams
            .iter()
            .filter_map(|lid| self.streams.get(*lid).map(|s| (*lid, s)))
            .collect();
        if members.iter().any(|(_, s)| s.busy.is_some()) {
            return Err(IapError::Busy);
        }

        let command_streams: Vec<Lid>;
        let txn_command: Box<dyn FnOnce(Txn) -> IsoCommand>;
        match kind {
            GroupKind::Unicast => {
                let setups: Vec<CisSetup> = members
                    .iter()
                    .filter(|(_, s)| {
                        matches!(
                            s.state,
                            StreamState::Bound | StreamState::Prepared | StreamState::Disabled
                        )
                    })
                    .filter_map(|(lid, s)| {
                        s.con_lid.map(|con_lid| CisSetup {
                            stream_lid: *lid,
                            cis_id: s.id,
                            con_lid,
                            params: s.params,
                        })
                    })
                    .collect();
                if setups.is_empty() {
                    warn!("Group {} has no bound stream to enable", group_lid);
                    return Err(IapError::CommandDisallowed);
                }
                command_streams = setups.iter().map(|s| s.stream_lid).collect();
                let (cig_id, params) = (group.id, group.params.clone());
                txn_command = Box::new(move |txn| IsoCommand::EnableUnicast {
                    txn,
                    group_lid,
                    cig_id,
                    params,
                    streams: setups,
                });
            }
            GroupKind::Broadcast => {
                let ready = !members.is_empty()
                    && members.iter().all(|(_, s)| {
                        matches!(s.state, StreamState::Configured | StreamState::Disabled)
                    });
                if !ready {
                    return Err(IapError::CommandDisallowed);
                }
                command_streams = members.iter().map(|(lid, _)| *lid).collect();
                let (big_id, params, code) = (group.id, group.params.clone(), group.code);
                let nb_streams = command_streams.len() as u8;
                txn_command = Box::new(move |txn| IsoCommand::EnableBroadcast {
                    txn,
                    group_lid,
                    big_id,
                    params,
                    nb_streams,
                    code,
                });
            }
        }

        let txn = self.start(Procedure::Enable {
            group_lid,
            streams: command_streams,
        });
        if let Some(group) = self.groups.get_mut(group_lid) {
            group.busy = Some(txn);
        }
        self.commands.push_back(txn_command(txn));
        debug!("Enable of {:?} group {} requested", kind, group_lid);
        Ok(())
    }

    fn disable_group(&mut self, group_lid: Lid, kind: GroupKind) -> IapResult<()> {
        let group = self.groups.get(group_lid).ok_or(IapError::GroupNotFound)?;
        if group.kind() != kind {
            return Err(IapError::CommandDisallowed);
        }
        if group.busy.is_some() {
            return Err(IapError::Busy);
        }
        let enabled: Vec<Lid> = group
            .streams
            .iter()
            .copied()
            .filter(|lid| {
                self.streams
                    .get(*lid)
                    .map_or(false, |s| s.state == StreamState::Enabled)
            })
            .collect();
        if enabled.is_empty() {
            return Err(IapError::CommandDisallowed);
        }

        let txn = self.start(Procedure::Disable { group_lid });
        if let Some(group) = self.groups.get_mut(group_lid) {
            group.busy = Some(txn);
        }
        self.commands.push_back(IsoCommand::Disable {
            txn,
            group_lid,
            streams: enabled,
        });
        debug!("Disable of {:?} group {} requested", kind, group_lid);
        Ok(())
    }

    fn remove_group(&mut self, group_lid: Lid, kind: GroupKind) -> IapResult<()> {
        let group = self.groups.get(group_lid).ok_or(IapError::GroupNotFound)?;
        if group.kind() != kind {
            return Err(IapError::CommandDisallowed);
        }
        let any_enabled = group
            .streams
            .iter()
            .filter_map(|lid| self.streams.get(*lid))
            .any(|s| s.state == StreamState::Enabled);
        if any_enabled {
            warn!("Group {} has enabled streams, disable it first", group_lid);
            return Err(IapError::CommandDisallowed);
        }

        // Procedures still in flight on the group end here, their completion is discarded
        let members = group.streams.clone();
        let mut cancelled: Vec<Txn> = self
            .pending
            .iter()
            .filter(|(_, p)| {
                p.group_lid() == Some(group_lid)
                    || p.stream_lid().map_or(false, |lid| members.contains(&lid))
            })
            .map(|(txn, _)| *txn)
            .collect();
        cancelled.sort_unstable();
        for txn in cancelled {
            if let Some(procedure) = self.pending.remove(&txn) {
                debug!("Transaction {} cancelled by removal of group {}", txn, group_lid);
                self.events.push(procedure.failed(IapError::Cancelled));
            }
        }

        for stream_lid in &members {
            self.streams.remove(*stream_lid);
        }
        if let Some(group) = self.groups.remove(group_lid) {
            self.commands.push_back(IsoCommand::RemoveGroup {
                group_lid,
                kind,
                id: group.id,
            });
        }
        info!("{:?} group {} removed", kind, group_lid);
        Ok(())
    }

    /// Move an enabled stream to disabled and tear down what depended on it
    fn disable_stream(&mut self, stream_lid: Lid, reason: DisableReason) {
        let Some(stream) = self.streams.get_mut(stream_lid) else {
            return;
        };
        stream.state = StreamState::Disabled;
        stream.conhdl = None;
        stream.test_mode = TestMode::Off;
        for dp in stream.dp.iter_mut() {
            if dp.config.is_some() && dp.state != DpState::NotConfigured {
                dp.state = DpState::Configured;
            }
        }
        let group_lid = stream.group_lid;
        debug!("Stream {} disabled ({:?})", stream_lid, reason);
        self.events.push(IapEvent::StreamDisabled {
            group_lid,
            stream_lid,
            reason,
        });
    }

    fn complete(&mut self, txn: Txn, status: u8, outcome: Outcome) {
        let Some(procedure) = self.pending.remove(&txn) else {
            trace!("Discarding completion of unknown transaction {}", txn);
            return;
        };
        let result = IapError::from_hci(status);

        match procedure {
            Procedure::Enable { group_lid, streams } => {
                let config = match outcome {
                    Outcome::Enabled(config) => config,
                    _ => None,
                };
                self.complete_enable(group_lid, streams, result, config);
            }
            Procedure::Disable { group_lid } => {
                if let Some(group) = self.groups.get_mut(group_lid) {
                    group.busy = None;
                }
                if result.is_ok() {
                    let streams = self.group_streams(group_lid).map(<[Lid]>::to_vec);
                    for stream_lid in streams.unwrap_or_default() {
                        if self.stream_state(stream_lid) == Some(StreamState::Enabled) {
                            self.disable_stream(stream_lid, DisableReason::UpperRequest);
                        }
                    }
                }
                self.events.push(IapEvent::GroupDisabled { group_lid, result });
            }
            Procedure::DpSetup {
                stream_lid,
                direction,
            } => {
                let result = match self.streams.get_mut(stream_lid) {
                    Some(stream) => {
                        stream.busy = None;
                        let dp = &mut stream.dp[direction.index()];
                        if dp.state != DpState::SettingUp {
                            // Stream was disabled while the setup was in flight
                            Err(IapError::StreamNotEnabled)
                        } else if result.is_ok() {
                            dp.state = DpState::SetUp;
                            Ok(())
                        } else {
                            dp.state = DpState::Configured;
                            result
                        }
                    }
                    None => Err(IapError::StreamNotFound),
                };
                debug!("Stream {} {:?} data path setup: {:?}", stream_lid, direction, result);
                self.events.push(IapEvent::DataPathSetUp {
                    stream_lid,
                    direction,
                    result,
                });
            }
            Procedure::DpRemove {
                stream_lid,
                direction,
            } => {
                if let Some(stream) = self.streams.get_mut(stream_lid) {
                    stream.busy = None;
                    let dp = &mut stream.dp[direction.index()];
                    if dp.state == DpState::Removing {
                        dp.state = if result.is_ok() {
                            DpState::Configured
                        } else {
                            DpState::SetUp
                        };
                    }
                }
                self.events.push(IapEvent::DataPathRemoved {
                    stream_lid,
                    direction,
                    result,
                });
            }
            Procedure::Quality { stream_lid } => {
                self.clear_stream_busy(stream_lid);
                let result = match (result, outcome) {
                    (Ok(()), Outcome::Quality(report)) => Ok(report),
                    (Ok(()), _) => Err(IapError::LlError(HCI_ERR_UNSPECIFIED)),
                    (Err(err), _) => Err(err),
                };
                self.events.push(IapEvent::Quality { stream_lid, result });
            }
            Procedure::TmStart {
                stream_lid,
                transmit,
            } => {
                if let Some(stream) = self.streams.get_mut(stream_lid) {
                    stream.busy = None;
                    if result.is_ok() && stream.state == StreamState::Enabled {
                        stream.test_mode = if transmit {
                            TestMode::Transmit
                        } else {
                            TestMode::Receive
                        };
                    }
                }
                self.events.push(IapEvent::TestModeStarted { stream_lid, result });
            }
            Procedure::TmRead { stream_lid } => {
                self.clear_stream_busy(stream_lid);
                let result = match (result, outcome) {
                    (Ok(()), Outcome::Counters(counters)) => Ok(counters),
                    (Ok(()), _) => Err(IapError::LlError(HCI_ERR_UNSPECIFIED)),
                    (Err(err), _) => Err(err),
                };
                self.events.push(IapEvent::TestModeCounters { stream_lid, result });
            }
            Procedure::TmStop { stream_lid } => {
                if let Some(stream) = self.streams.get_mut(stream_lid) {
                    stream.busy = None;
                    if result.is_ok() {
                        stream.test_mode = TestMode::Off;
                    }
                }
                let result = result.map(|_| match outcome {
                    Outcome::Counters(counters) => counters,
                    _ => TmCounters::default(),
                });
                self.events.push(IapEvent::TestModeStopped { stream_lid, result });
            }
        }
    }

    fn clear_stream_busy(&mut self, stream_lid: Lid) {
        if let Some(stream) = self.streams.get_mut(stream_lid) {
            stream.busy = None;
        }
    }

    fn complete_enable(
        &mut self,
        group_lid: Lid,
        requested: Vec<Lid>,
        result: IapResult<()>,
        config: Option<EnabledConfig>,
    ) {
        if let Some(group) = self.groups.get_mut(group_lid) {
            group.busy = None;
        }

        let result = match (result, config) {
            (Err(err), _) => Err(err),
            (Ok(()), None) => {
                warn!("Group {} enabled without configuration", group_lid);
                Err(IapError::LlError(HCI_ERR_UNSPECIFIED))
            }
            (Ok(()), Some(config)) => Ok(config),
        };

        let result = result.map(|config| {
            let mut streams = Vec::with_capacity(requested.len());
            for stream_lid in &requested {
                let Some(stream) = self.streams.get_mut(*stream_lid) else {
                    continue;
                };
                let reported = config.streams.iter().find(|s| s.stream_lid == *stream_lid);
                if reported.is_none() {
                    warn!("Controller did not report stream {}", stream_lid);
                }
                stream.state = StreamState::Enabled;
                stream.conhdl = reported.map(|s| s.conhdl);
                stream.config = reported.and_then(|s| s.config);
                if let Some(entry) = reported {
                    streams.push(*entry);
                }
                debug!("Stream {} enabled", stream_lid);
            }
            if let Some(group) = self.groups.get_mut(group_lid) {
                group.config = Some(config.group);
            }
            EnabledConfig {
                group: config.group,
                streams,
            }
        });

        if let Err(err) = &result {
            warn!("Enable of group {} failed: {}", group_lid, err);
        }
        self.events.push(IapEvent::GroupEnabled { group_lid, result });
    }

    fn on_stream_lost(&mut self, stream_lid: Lid, reason: DisableReason) {
        match self.stream_state(stream_lid) {
            Some(StreamState::Enabled) => {
                info!("Stream {} lost: {:?}", stream_lid, reason);
                self.disable_stream(stream_lid, reason);
            }
            _ => trace!("Ignoring loss of stream {} that is not enabled", stream_lid),
        }
    }

    fn on_group_lost(&mut self, group_lid: Lid, reason: DisableReason) {
        let Some(group) = self.groups.get_mut(group_lid) else {
            trace!("Ignoring loss of unknown group {}", group_lid);
            return;
        };

        // Loss before establishment ends the pending enable
        if let Some(txn) = group.busy {
            if matches!(self.pending.get(&txn), Some(Procedure::Enable { .. })) {
                group.busy = None;
                if let Some(procedure) = self.pending.remove(&txn) {
                    let err = match reason {
                        DisableReason::SyncLost => IapError::SyncLost,
                        DisableReason::MicError => IapError::MicError,
                        DisableReason::PeerRequest => {
                            IapError::LlError(HCI_ERR_REMOTE_USER_TERMINATED)
                        }
                        DisableReason::UpperRequest => IapError::Cancelled,
                    };
                    warn!("Group {} lost before being enabled: {}", group_lid, err);
                    self.events.push(procedure.failed(err));
                }
                return;
            }
        }

        let streams = group.streams.clone();
        group.config = None;
        info!("Group {} lost: {:?}", group_lid, reason);
        for stream_lid in streams {
            if self.stream_state(stream_lid) == Some(StreamState::Enabled) {
                self.disable_stream(stream_lid, reason);
            }
        }
    }
}
