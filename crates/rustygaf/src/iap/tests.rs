//! Tests for the IAP group and stream state machine

use super::*;
use crate::codec::{CodecId, Direction, DpConfig, Framing, Packing, PhyBf};
use crate::lid::Lid;
use crate::msg::{Layer, MsgKind};

fn ug_param() -> UgParam {
    UgParam {
        sdu_intv_m2s_us: 10_000,
        sdu_intv_s2m_us: 10_000,
        packing: Packing::Sequential,
        framing: Framing::Unframed,
        sca: 0,
        tlatency_m2s_ms: 20,
        tlatency_s2m_ms: 20,
    }
}

fn us_param() -> UsParam {
    UsParam {
        max_sdu_m2s: 100,
        max_sdu_s2m: 100,
        phy_m2s: PhyBf::LE_2M,
        phy_s2m: PhyBf::LE_2M,
        rtn_m2s: 2,
        rtn_s2m: 2,
    }
}

fn bg_param() -> BgParam {
    BgParam {
        sdu_intv_us: 10_000,
        max_sdu: 100,
        max_tlatency_ms: 40,
        packing: Packing::Sequential,
        framing: Framing::Unframed,
        phy_bf: PhyBf::LE_2M,
        rtn: 4,
    }
}

fn lc3_dp() -> DpConfig {
    DpConfig {
        dp_id: 0,
        ctl_delay_us: 1_000,
        codec_id: CodecId::LC3,
        codec_cfg: vec![0x02, 0x01, 0x08],
    }
}

/// Controller double answering every command the manager queued
struct MockController {
    next_conhdl: u16,
}

impl MockController {
    fn new() -> Self {
        Self {
            next_conhdl: 0x0060,
        }
    }

    /// Complete every queued command with `status`, returns the commands seen
    fn run(&mut self, iap: &mut IapManager, status: u8) -> Vec<IsoCommand> {
        let commands = iap.drain_commands();
        for command in &commands {
            if let Some(event) = self.answer(command, status) {
                iap.on_controller_event(event);
            }
        }
        commands
    }

    fn answer(&mut self, command: &IsoCommand, status: u8) -> Option<IsoControllerEvent> {
        let event = match command {
            IsoCommand::EnableUnicast { txn, streams, .. } => IsoControllerEvent::Enabled {
                txn: *txn,
                status,
                config: Some(EnabledConfig {
                    group: GroupConfig::Unicast(UgConfig {
                        sync_delay_us: 1_500,
                        tlatency_m2s_us: 11_500,
                        tlatency_s2m_us: 11_500,
                        iso_intv_frames: 8,
                    }),
                    streams: streams
                        .iter()
                        .map(|s| StreamEnabled {
                            stream_lid: s.stream_lid,
                            conhdl: self.conhdl(),
                            config: Some(UsConfig {
                                nse: 2,
                                ft_m2s: 1,
                                ft_s2m: 1,
                                ..UsConfig::default()
                            }),
                        })
                        .collect(),
                }),
            },
            IsoCommand::EnableBroadcast { txn, .. } => IsoControllerEvent::Enabled {
                txn: *txn,
                status,
                config: Some(EnabledConfig {
                    group: GroupConfig::Broadcast(BgConfig::default()),
                    streams: Vec::new(),
                }),
            },
            IsoCommand::ReadQuality { txn, .. } => IsoControllerEvent::Quality {
                txn: *txn,
                status,
                report: QualityReport {
                    crc_error_packets: 3,
                    ..QualityReport::default()
                },
            },
            IsoCommand::TestModeRead { txn, .. } | IsoCommand::TestModeStop { txn, .. } => {
                IsoControllerEvent::TestCounters {
                    txn: *txn,
                    status,
                    counters: TmCounters {
                        received: 10,
                        missed: 1,
                        failed: 0,
                    },
                }
            }
            IsoCommand::RemoveGroup { .. } => return None,
            other => IsoControllerEvent::Complete {
                txn: other.txn()?,
                status,
            },
        };
        Some(event)
    }

    fn conhdl(&mut self) -> u16 {
        let conhdl = self.next_conhdl;
        self.next_conhdl += 1;
        conhdl
    }
}

fn manager() -> (IapManager, Lid) {
    let mut iap = IapManager::new(IapConfig::default()).unwrap();
    let intf_lid = iap.intf_add().unwrap();
    (iap, intf_lid)
}

/// One unicast group with one bound, enabled stream
fn enabled_stream(iap: &mut IapManager, ctrl: &mut MockController, intf_lid: Lid) -> (Lid, Lid) {
    let group_lid = iap.ug_add(intf_lid, 1, &ug_param()).unwrap();
    let stream_lid = iap.us_config(group_lid, 0, &us_param()).unwrap();
    iap.us_bind(stream_lid, 0).unwrap();
    iap.us_enable(group_lid).unwrap();
    ctrl.run(iap, HCI_SUCCESS);
    iap.drain_events();
    assert_eq!(iap.stream_state(stream_lid), Some(StreamState::Enabled));
    (group_lid, stream_lid)
}

#[test]
fn test_ug_add_rejects_short_sdu_interval() {
    let (mut iap, intf_lid) = manager();
    let param = UgParam {
        sdu_intv_m2s_us: 100,
        ..ug_param()
    };

    let err = iap.ug_add(intf_lid, 1, &param).unwrap_err();
    assert!(matches!(err, IapError::InvalidParam(_)));
    assert_eq!(err.code(), Layer::Iap.status(IAP_ERR_INVALID_PARAM));
    assert_eq!(iap.nb_groups(), 0);

    // Nothing leaked, the first valid group still takes index 0
    assert_eq!(iap.ug_add(intf_lid, 1, &ug_param()), Ok(0));
}

#[test]
fn test_ug_add_validation_order() {
    let (mut iap, _) = manager();

    // Parameters are checked before the interface
    let bad = UgParam {
        sca: 8,
        ..ug_param()
    };
    assert!(matches!(iap.ug_add(5, 1, &bad), Err(IapError::InvalidParam(_))));
    assert_eq!(iap.ug_add(5, 1, &ug_param()), Err(IapError::InterfaceNotFound));
    assert!(matches!(
        iap.ug_add(0, 0xF0, &ug_param()),
        Err(IapError::InvalidParam(_))
    ));
}

#[test]
fn test_ug_add_duplicate_and_exhaustion() {
    let mut iap = IapManager::new(IapConfig {
        nb_interfaces: 1,
        nb_groups: 2,
        nb_streams: 2,
    })
    .unwrap();
    let intf_lid = iap.intf_add().unwrap();
    assert_eq!(iap.intf_add(), Err(IapError::InsufficientResources));

    assert_eq!(iap.ug_add(intf_lid, 1, &ug_param()), Ok(0));
    assert_eq!(
        iap.ug_add(intf_lid, 1, &ug_param()),
        Err(IapError::GroupAlreadyExists(1))
    );
    assert_eq!(iap.ug_add(intf_lid, 2, &ug_param()), Ok(1));
    assert_eq!(
        iap.ug_add(intf_lid, 3, &ug_param()),
        Err(IapError::NoGroupAvailable)
    );

    // Same ID is fine for a broadcast group, but no slot is left
    assert_eq!(
        iap.bg_add(intf_lid, 1, &bg_param(), 1, None).map(|(g, _)| g),
        Err(IapError::NoGroupAvailable)
    );
}

#[test]
fn test_group_index_reused_after_remove() {
    let (mut iap, intf_lid) = manager();
    assert_eq!(iap.ug_add(intf_lid, 1, &ug_param()), Ok(0));
    assert_eq!(iap.ug_add(intf_lid, 2, &ug_param()), Ok(1));
    assert_eq!(iap.ug_add(intf_lid, 3, &ug_param()), Ok(2));

    iap.ug_remove(1).unwrap();
    assert_eq!(iap.ug_remove(1), Err(IapError::GroupNotFound));
    assert_eq!(iap.ug_add(intf_lid, 4, &ug_param()), Ok(1));

    let removed = iap
        .drain_commands()
        .into_iter()
        .filter(|c| matches!(c, IsoCommand::RemoveGroup { group_lid: 1, id: 2, .. }))
        .count();
    assert_eq!(removed, 1);
}

#[test]
fn test_intf_remove_with_groups() {
    let (mut iap, intf_lid) = manager();
    let group_lid = iap.ug_add(intf_lid, 1, &ug_param()).unwrap();

    assert_eq!(iap.intf_remove(intf_lid), Err(IapError::CommandDisallowed));
    iap.ug_remove(group_lid).unwrap();
    assert_eq!(iap.intf_remove(intf_lid), Ok(()));
    assert_eq!(iap.intf_remove(intf_lid), Err(IapError::InterfaceNotFound));
}

#[test]
fn test_us_config_duplicate_cis() {
    let (mut iap, intf_lid) = manager();
    let group_lid = iap.ug_add(intf_lid, 1, &ug_param()).unwrap();

    assert_eq!(iap.us_config(group_lid, 0, &us_param()), Ok(0));
    assert!(matches!(
        iap.us_config(group_lid, 0, &us_param()),
        Err(IapError::InvalidParam(_))
    ));
    assert_eq!(iap.us_config(group_lid, 1, &us_param()), Ok(1));
    assert_eq!(iap.us_config(7, 2, &us_param()), Err(IapError::GroupNotFound));
    assert_eq!(iap.group_streams(group_lid), Some(&[0, 1][..]));
}

#[test]
fn test_us_enable_requires_bound_stream() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();
    let group_lid = iap.ug_add(intf_lid, 1, &ug_param()).unwrap();
    let stream_lid = iap.us_config(group_lid, 0, &us_param()).unwrap();

    assert_eq!(iap.us_enable(group_lid), Err(IapError::CommandDisallowed));
    assert!(iap.drain_commands().is_empty());

    iap.us_bind(stream_lid, 0).unwrap();
    assert_eq!(iap.stream_state(stream_lid), Some(StreamState::Bound));
    assert_eq!(iap.us_enable(group_lid), Ok(()));

    // Second request while the first is in flight
    assert_eq!(iap.us_enable(group_lid), Err(IapError::Busy));

    let commands = ctrl.run(&mut iap, HCI_SUCCESS);
    assert_eq!(commands.len(), 1);
    match &commands[0] {
        IsoCommand::EnableUnicast {
            cig_id, streams, ..
        } => {
            assert_eq!(*cig_id, 1);
            assert_eq!(streams.len(), 1);
            assert_eq!(streams[0].cis_id, 0);
            assert_eq!(streams[0].con_lid, 0);
        }
        other => panic!("unexpected command {:?}", other),
    }

    let events = iap.drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        IapEvent::GroupEnabled {
            group_lid: lid,
            result: Ok(config),
        } => {
            assert_eq!(*lid, group_lid);
            assert!(matches!(config.group, GroupConfig::Unicast(_)));
            assert_eq!(config.streams.len(), 1);
            assert_eq!(config.streams[0].stream_lid, stream_lid);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(iap.stream_state(stream_lid), Some(StreamState::Enabled));
    assert_eq!(iap.stream_conhdl(stream_lid), Some(0x0060));
    assert!(iap.group_config(group_lid).is_some());
    assert_eq!(iap.nb_pending(), 0);

    // A repeated completion for the same transaction is discarded
    iap.on_controller_event(IsoControllerEvent::Complete { txn: 0, status: 0 });
    assert!(iap.poll_event().is_none());
}

#[test]
fn test_us_enable_failure_keeps_streams() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();
    let group_lid = iap.ug_add(intf_lid, 1, &ug_param()).unwrap();
    let stream_lid = iap.us_config(group_lid, 0, &us_param()).unwrap();
    iap.us_bind(stream_lid, 0).unwrap();
    iap.us_enable(group_lid).unwrap();

    ctrl.run(&mut iap, 0x3E);
    assert_eq!(
        iap.drain_events(),
        vec![IapEvent::GroupEnabled {
            group_lid,
            result: Err(IapError::LlError(0x3E)),
        }]
    );
    assert_eq!(iap.stream_state(stream_lid), Some(StreamState::Bound));

    // The group can be enabled again
    assert_eq!(iap.us_enable(group_lid), Ok(()));
}

#[test]
fn test_us_disable_emits_stream_disabled() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();
    let (group_lid, stream_lid) = enabled_stream(&mut iap, &mut ctrl, intf_lid);

    iap.dp_config(stream_lid, Direction::Input, lc3_dp()).unwrap();
    iap.dp_setup(stream_lid, Direction::Input).unwrap();
    ctrl.run(&mut iap, HCI_SUCCESS);
    iap.drain_events();

    assert_eq!(iap.ug_remove(group_lid), Err(IapError::CommandDisallowed));
    iap.us_disable(group_lid).unwrap();
    assert_eq!(iap.us_disable(group_lid), Err(IapError::Busy));
    ctrl.run(&mut iap, HCI_SUCCESS);

    assert_eq!(
        iap.drain_events(),
        vec![
            IapEvent::StreamDisabled {
                group_lid,
                stream_lid,
                reason: DisableReason::UpperRequest,
            },
            IapEvent::GroupDisabled {
                group_lid,
                result: Ok(()),
            },
        ]
    );
    assert_eq!(iap.stream_state(stream_lid), Some(StreamState::Disabled));
    assert_eq!(
        iap.dp_state(stream_lid, Direction::Input),
        Some(DpState::Configured)
    );
    assert_eq!(iap.stream_conhdl(stream_lid), None);

    // Nothing enabled anymore
    assert_eq!(iap.us_disable(group_lid), Err(IapError::CommandDisallowed));

    // Disabled streams keep their binding and can be enabled again
    assert_eq!(iap.us_enable(group_lid), Ok(()));
}

#[test]
fn test_dp_setup_sequence() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();
    let (_, stream_lid) = enabled_stream(&mut iap, &mut ctrl, intf_lid);

    assert_eq!(
        iap.dp_setup(stream_lid, Direction::Input),
        Err(IapError::DpNotConfigured)
    );

    iap.dp_config(stream_lid, Direction::Input, lc3_dp()).unwrap();
    assert_eq!(iap.dp_setup(stream_lid, Direction::Input), Ok(()));
    assert_eq!(
        iap.dp_state(stream_lid, Direction::Input),
        Some(DpState::SettingUp)
    );
    assert_eq!(iap.dp_setup(stream_lid, Direction::Input), Err(IapError::Busy));

    let commands = ctrl.run(&mut iap, HCI_SUCCESS);
    assert!(matches!(
        &commands[0],
        IsoCommand::SetupDataPath { direction: Direction::Input, config, .. } if *config == lc3_dp()
    ));
    assert_eq!(
        iap.drain_events(),
        vec![IapEvent::DataPathSetUp {
            stream_lid,
            direction: Direction::Input,
            result: Ok(()),
        }]
    );

    assert_eq!(
        iap.dp_setup(stream_lid, Direction::Input),
        Err(IapError::DpSetup)
    );
    // Reconfiguring a path in use is refused
    assert_eq!(
        iap.dp_config(stream_lid, Direction::Input, DpConfig::hci()),
        Err(IapError::CommandDisallowed)
    );

    // The other direction is independent
    assert_eq!(
        iap.dp_remove(stream_lid, Direction::Output),
        Err(IapError::DpNotSetup)
    );

    iap.dp_remove(stream_lid, Direction::Input).unwrap();
    ctrl.run(&mut iap, HCI_SUCCESS);
    assert_eq!(
        iap.dp_state(stream_lid, Direction::Input),
        Some(DpState::Configured)
    );
    assert_eq!(iap.dp_setup(stream_lid, Direction::Input), Ok(()));
}

#[test]
fn test_dp_setup_requires_enabled_stream() {
    let (mut iap, intf_lid) = manager();
    let group_lid = iap.ug_add(intf_lid, 1, &ug_param()).unwrap();
    let stream_lid = iap.us_config(group_lid, 0, &us_param()).unwrap();

    iap.dp_config(stream_lid, Direction::Output, DpConfig::hci()).unwrap();
    assert_eq!(
        iap.dp_setup(stream_lid, Direction::Output),
        Err(IapError::StreamNotEnabled)
    );
    assert_eq!(iap.dp_setup(9, Direction::Output), Err(IapError::StreamNotFound));

    let disabled = DpConfig {
        dp_id: 0xFF,
        ..DpConfig::hci()
    };
    assert!(matches!(
        iap.dp_config(stream_lid, Direction::Output, disabled),
        Err(IapError::InvalidParam(_))
    ));
}

#[test]
fn test_dp_setup_failure_returns_to_configured() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();
    let (_, stream_lid) = enabled_stream(&mut iap, &mut ctrl, intf_lid);

    iap.dp_config(stream_lid, Direction::Output, DpConfig::hci()).unwrap();
    iap.dp_setup(stream_lid, Direction::Output).unwrap();
    ctrl.run(&mut iap, 0x12);

    assert_eq!(
        iap.drain_events(),
        vec![IapEvent::DataPathSetUp {
            stream_lid,
            direction: Direction::Output,
            result: Err(IapError::LlError(0x12)),
        }]
    );
    assert_eq!(
        iap.dp_state(stream_lid, Direction::Output),
        Some(DpState::Configured)
    );
}

#[test]
fn test_remove_cancels_pending_procedure_once() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();
    let group_lid = iap.ug_add(intf_lid, 1, &ug_param()).unwrap();
    let stream_lid = iap.us_config(group_lid, 0, &us_param()).unwrap();
    iap.us_bind(stream_lid, 0).unwrap();
    iap.us_enable(group_lid).unwrap();

    let pending = iap.drain_commands();
    assert_eq!(iap.nb_pending(), 1);

    iap.ug_remove(group_lid).unwrap();
    assert_eq!(
        iap.drain_events(),
        vec![IapEvent::GroupEnabled {
            group_lid,
            result: Err(IapError::Cancelled),
        }]
    );
    assert_eq!(iap.nb_pending(), 0);
    assert_eq!(iap.nb_streams(), 0);

    // The late completion must not produce a second terminal event
    for command in &pending {
        if let Some(event) = ctrl.answer(command, HCI_SUCCESS) {
            iap.on_controller_event(event);
        }
    }
    assert!(iap.drain_events().is_empty());
    assert_eq!(iap.stream_state(stream_lid), None);
}

#[test]
fn test_us_prepare_peripheral_side() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();

    let (group_lid, stream_lid) = iap.us_prepare(intf_lid, 3, 0, 1).unwrap();
    assert_eq!(iap.stream_state(stream_lid), Some(StreamState::Prepared));
    assert_eq!(iap.group_kind(group_lid), Some(GroupKind::Unicast));

    // Same request twice allocates nothing
    assert_eq!(
        iap.us_prepare(intf_lid, 3, 0, 1),
        Err(IapError::CommandDisallowed)
    );
    assert_eq!(iap.nb_streams(), 1);

    // Another CIS of the same CIG joins the same group
    let (same_group, second) = iap.us_prepare(intf_lid, 3, 1, 1).unwrap();
    assert_eq!(same_group, group_lid);
    assert_ne!(second, stream_lid);

    // Same CIG ID on another connection is another group
    let (other_group, _) = iap.us_prepare(intf_lid, 3, 0, 2).unwrap();
    assert_ne!(other_group, group_lid);

    // A central CIG may reuse the ID
    assert!(iap.ug_add(intf_lid, 3, &ug_param()).is_ok());

    // Streams cannot be configured in a peripheral group
    assert_eq!(
        iap.us_config(group_lid, 5, &us_param()),
        Err(IapError::CommandDisallowed)
    );

    iap.us_enable(group_lid).unwrap();
    let commands = ctrl.run(&mut iap, HCI_SUCCESS);
    match &commands[0] {
        IsoCommand::EnableUnicast { streams, .. } => {
            assert_eq!(streams.len(), 2);
            assert!(streams.iter().all(|s| s.params.is_none()));
        }
        other => panic!("unexpected command {:?}", other),
    }
    assert_eq!(iap.stream_state(stream_lid), Some(StreamState::Enabled));
}

#[test]
fn test_us_release_last_peripheral_stream_removes_group() {
    let (mut iap, intf_lid) = manager();
    let (group_lid, stream_lid) = iap.us_prepare(intf_lid, 3, 0, 1).unwrap();

    iap.us_release(stream_lid).unwrap();
    assert_eq!(iap.stream_state(stream_lid), None);
    assert_eq!(iap.group_kind(group_lid), None);
    assert!(matches!(
        iap.poll_command(),
        Some(IsoCommand::RemoveGroup { id: 3, .. })
    ));
}

#[test]
fn test_stream_lost_and_ignored_loss() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();
    let (group_lid, stream_lid) = enabled_stream(&mut iap, &mut ctrl, intf_lid);

    iap.on_controller_event(IsoControllerEvent::StreamLost {
        stream_lid,
        reason: DisableReason::PeerRequest,
    });
    iap.on_controller_event(IsoControllerEvent::StreamLost {
        stream_lid,
        reason: DisableReason::PeerRequest,
    });

    assert_eq!(
        iap.drain_events(),
        vec![IapEvent::StreamDisabled {
            group_lid,
            stream_lid,
            reason: DisableReason::PeerRequest,
        }]
    );
    assert_eq!(iap.ug_remove(group_lid), Ok(()));
}

#[test]
fn test_broadcast_source_lifecycle() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();
    let code = BroadcastCode::random();

    let (group_lid, streams) = iap
        .bg_add(intf_lid, 0, &bg_param(), 2, Some(code))
        .unwrap();
    assert_eq!(streams, vec![0, 1]);
    assert_eq!(iap.group_kind(group_lid), Some(GroupKind::Broadcast));
    assert_eq!(iap.us_enable(group_lid), Err(IapError::CommandDisallowed));

    iap.bg_enable(group_lid).unwrap();
    let commands = ctrl.run(&mut iap, HCI_SUCCESS);
    assert!(matches!(
        &commands[0],
        IsoCommand::EnableBroadcast { nb_streams: 2, code: Some(c), .. } if *c == code
    ));
    assert!(streams
        .iter()
        .all(|s| iap.stream_state(*s) == Some(StreamState::Enabled)));
    assert_eq!(iap.bg_enable(group_lid), Err(IapError::CommandDisallowed));

    iap.bg_disable(group_lid).unwrap();
    ctrl.run(&mut iap, HCI_SUCCESS);
    let disabled = iap
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, IapEvent::StreamDisabled { .. }))
        .count();
    assert_eq!(disabled, 2);
    assert_eq!(iap.bg_remove(group_lid), Ok(()));
    assert_eq!(iap.nb_streams(), 0);
}

#[test]
fn test_bg_add_rejects_bad_stream_count() {
    let (mut iap, intf_lid) = manager();
    assert!(matches!(
        iap.bg_add(intf_lid, 0, &bg_param(), 0, None),
        Err(IapError::InvalidParam(_))
    ));
    assert_eq!(
        iap.bg_add(intf_lid, 0, &bg_param(), 9, None).map(|(g, _)| g),
        Err(IapError::NoStreamAvailable)
    );
    assert_eq!(iap.nb_groups(), 0);
}

#[test]
fn test_bg_add_checks_big_id() {
    let (mut iap, intf_lid) = manager();
    match iap.bg_add(intf_lid, IAP_BIG_ID_MAX + 1, &bg_param(), 1, None) {
        Err(IapError::InvalidParam(reason)) => assert!(reason.starts_with("BIG ID")),
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(iap.nb_groups(), 0);

    let (group_lid, streams) = iap
        .bg_add(intf_lid, IAP_BIG_ID_MAX, &bg_param(), 1, None)
        .unwrap();
    assert_eq!(iap.group_kind(group_lid), Some(GroupKind::Broadcast));
    assert_eq!(streams.len(), 1);
}

#[test]
fn test_bg_sync_lost_before_established() {
    let (mut iap, intf_lid) = manager();
    let param = BgSyncParam {
        sync_handle: 1,
        bis_indices: vec![1, 3],
        mse: 0,
        sync_timeout_10ms: 100,
        code: None,
    };
    let (group_lid, streams) = iap.bg_sync_add(intf_lid, 2, &param).unwrap();
    assert_eq!(streams.len(), 2);

    iap.bg_enable(group_lid).unwrap();
    iap.on_controller_event(IsoControllerEvent::GroupLost {
        group_lid,
        reason: DisableReason::SyncLost,
    });
    assert_eq!(
        iap.drain_events(),
        vec![IapEvent::GroupEnabled {
            group_lid,
            result: Err(IapError::SyncLost),
        }]
    );

    // The enable completion arriving afterwards is dropped
    let commands = iap.drain_commands();
    let mut ctrl = MockController::new();
    for command in &commands {
        if let Some(event) = ctrl.answer(command, HCI_SUCCESS) {
            iap.on_controller_event(event);
        }
    }
    assert!(iap.drain_events().is_empty());

    let repeated = BgSyncParam {
        bis_indices: vec![1, 1],
        ..param
    };
    assert!(matches!(
        iap.bg_sync_add(intf_lid, 3, &repeated),
        Err(IapError::InvalidParam(_))
    ));
}

#[test]
fn test_test_mode_and_quality() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();
    let (_, stream_lid) = enabled_stream(&mut iap, &mut ctrl, intf_lid);

    assert_eq!(iap.tm_cnt_get(stream_lid), Err(IapError::CommandDisallowed));
    assert_eq!(iap.tm_stop(stream_lid), Err(IapError::CommandDisallowed));

    iap.tm_start(stream_lid, false, TmPayload::Maximum).unwrap();
    ctrl.run(&mut iap, HCI_SUCCESS);
    assert_eq!(
        iap.tm_start(stream_lid, true, TmPayload::Maximum),
        Err(IapError::CommandDisallowed)
    );

    iap.tm_cnt_get(stream_lid).unwrap();
    ctrl.run(&mut iap, HCI_SUCCESS);
    iap.tm_stop(stream_lid).unwrap();
    ctrl.run(&mut iap, HCI_SUCCESS);

    let events = iap.drain_events();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        IapEvent::TestModeStarted {
            stream_lid,
            result: Ok(()),
        }
    );
    assert!(matches!(
        events[1],
        IapEvent::TestModeCounters { result: Ok(TmCounters { received: 10, .. }), .. }
    ));
    assert!(matches!(
        events[2],
        IapEvent::TestModeStopped { result: Ok(_), .. }
    ));

    iap.gen_get_quality(stream_lid).unwrap();
    ctrl.run(&mut iap, HCI_SUCCESS);
    match iap.poll_event() {
        Some(IapEvent::Quality {
            result: Ok(report), ..
        }) => assert_eq!(report.crc_error_packets, 3),
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_tm_start_conflicts_with_data_path() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();
    let (_, stream_lid) = enabled_stream(&mut iap, &mut ctrl, intf_lid);

    iap.dp_config(stream_lid, Direction::Input, DpConfig::hci()).unwrap();
    iap.dp_setup(stream_lid, Direction::Input).unwrap();
    ctrl.run(&mut iap, HCI_SUCCESS);

    assert_eq!(
        iap.tm_start(stream_lid, true, TmPayload::Variable),
        Err(IapError::CommandDisallowed)
    );
    assert_eq!(iap.tm_start(stream_lid, false, TmPayload::Variable), Ok(()));
}

#[test]
fn test_event_message_encoding() {
    let event = IapEvent::StreamDisabled {
        group_lid: 1,
        stream_lid: 4,
        reason: DisableReason::MicError,
    };
    assert_eq!(event.msg_code().kind(), MsgKind::Indication);

    let message = event.to_message();
    assert!(message.is_success());
    assert_eq!(message.payload, vec![1, 4, 3]);

    let failed = IapEvent::GroupDisabled {
        group_lid: 2,
        result: Err(IapError::Busy),
    };
    let message = failed.to_message();
    assert_eq!(message.status, Some(Layer::Iap.status(IAP_ERR_BUSY)));
}

#[test]
fn test_broadcast_code_hex() {
    let code = BroadcastCode::from_hex("000102030405060708090a0b0c0d0e0f").unwrap();
    assert_eq!(code.as_bytes()[15], 0x0F);
    assert_eq!(code.to_string(), "000102030405060708090a0b0c0d0e0f");
    assert_eq!(format!("{:?}", code), "BroadcastCode(..)");
    assert!(BroadcastCode::from_hex("0011").is_err());
}

#[test]
fn test_reset_cancels_everything() {
    let (mut iap, intf_lid) = manager();
    let mut ctrl = MockController::new();
    let (_, stream_lid) = enabled_stream(&mut iap, &mut ctrl, intf_lid);
    iap.gen_get_quality(stream_lid).unwrap();

    iap.reset();
    assert_eq!(
        iap.drain_events(),
        vec![IapEvent::Quality {
            stream_lid,
            result: Err(IapError::Cancelled),
        }]
    );
    assert_eq!(iap.nb_groups(), 0);
    assert_eq!(iap.intf_add(), Ok(0));
}
