//! Tests for the Telephone Bearer Service server

use super::*;
use crate::msg::{Layer, MsgKind};

fn server(call_pool_size: usize) -> TbsServer {
    let mut tbs = TbsServer::new();
    tbs.configure(TbsConfig {
        nb_tbs: 1,
        call_pool_size,
        call_pool_uri_len: 32,
        nb_connections: 2,
    })
    .unwrap();
    tbs
}

fn full_bearer() -> BearerParam {
    BearerParam {
        cfg: BearerCfg::all(),
        ccid: 1,
        opt_opcodes: OptOpcodes::LOCAL_HOLD | OptOpcodes::JOIN,
        provider_name: "Operator".into(),
        uri_schemes: "tel,sip".into(),
        ..BearerParam::default()
    }
}

#[test]
fn test_accept_incoming_call() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(BearerParam::default()).unwrap();
    assert_eq!(bearer_lid, 0);

    let call_id = tbs.call_incoming(bearer_lid, "tel:123", None, None).unwrap();
    assert_eq!(call_id, 0);
    assert_eq!(tbs.call_state(call_id), Some(CallState::Incoming));

    let ntf = tbs
        .cp_write(0, bearer_lid, &[TBS_OPCODE_ACCEPT, call_id])
        .unwrap();
    assert_eq!(ntf.result, CpResult::Success);
    assert_eq!(ntf.to_bytes(), [TBS_OPCODE_ACCEPT, 0, TBS_CP_RESULT_SUCCESS]);
    assert_eq!(tbs.call_state(call_id), Some(CallState::Active));
}

#[test]
fn test_accept_unknown_call() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(BearerParam::default()).unwrap();
    tbs.call_incoming(bearer_lid, "tel:123", None, None).unwrap();

    let ntf = tbs.cp_write(0, bearer_lid, &[TBS_OPCODE_ACCEPT, 5]).unwrap();
    assert_eq!(ntf.result, CpResult::InvalidCallIndex);
    assert_eq!(ntf.call_index, 5);
    assert_eq!(tbs.call_state(0), Some(CallState::Incoming));
}

#[test]
fn test_configure_once() {
    let mut tbs = TbsServer::new();
    assert_eq!(tbs.add(BearerParam::default()), Err(TbsError::NotConfigured));
    assert!(matches!(
        tbs.configure(TbsConfig {
            call_pool_size: 0,
            ..TbsConfig::default()
        }),
        Err(TbsError::InvalidParam(_))
    ));
    assert!(!tbs.is_configured());

    tbs.configure(TbsConfig::default()).unwrap();
    assert_eq!(
        tbs.configure(TbsConfig::default()),
        Err(TbsError::CommandDisallowed)
    );
    assert_eq!(tbs.add(BearerParam::default()), Ok(0));
    let second = BearerParam {
        ccid: 1,
        ..BearerParam::default()
    };
    assert_eq!(tbs.add(second), Err(TbsError::InsufficientResources));
}

#[test]
fn test_add_rejects_duplicate_ccid() {
    let mut tbs = TbsServer::new();
    tbs.configure(TbsConfig {
        nb_tbs: 2,
        ..TbsConfig::default()
    })
    .unwrap();
    tbs.add(BearerParam::default()).unwrap();
    assert!(matches!(
        tbs.add(BearerParam::default()),
        Err(TbsError::InvalidParam(_))
    ));
    let other = BearerParam {
        ccid: 2,
        uri_schemes: "tel,,sip".into(),
        ..BearerParam::default()
    };
    assert!(matches!(tbs.add(other), Err(TbsError::InvalidParam(_))));
}

#[test]
fn test_call_pool_exhaustion_and_reuse() {
    let mut tbs = server(2);
    let bearer_lid = tbs.add(BearerParam::default()).unwrap();

    assert_eq!(tbs.call_incoming(bearer_lid, "tel:1", None, None), Ok(0));
    assert_eq!(tbs.call_outgoing(bearer_lid, "tel:2", None), Ok(1));
    assert_eq!(
        tbs.call_incoming(bearer_lid, "tel:3", None, None),
        Err(TbsError::InsufficientResources)
    );
    assert_eq!(tbs.call(0).map(|c| c.uri.as_str()), Some("tel:1"));

    tbs.call_action(0, CallAction::Terminate(TermReason::RemoteEnd))
        .unwrap();
    assert_eq!(tbs.nb_calls(), 1);
    assert_eq!(tbs.call_incoming(bearer_lid, "tel:3", None, None), Ok(0));
    assert_eq!(
        tbs.call_incoming(bearer_lid, "tel:4", None, None),
        Err(TbsError::InsufficientResources)
    );

    // Remote originate hits the same limit
    let ntf = tbs.cp_write(0, bearer_lid, b"\x04tel:5").unwrap();
    assert_eq!(ntf.result, CpResult::LackOfResources);
}

#[test]
fn test_call_uri_checks() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(BearerParam::default()).unwrap();

    assert!(matches!(
        tbs.call_incoming(bearer_lid, "123", None, None),
        Err(TbsError::InvalidUri(_))
    ));
    assert!(matches!(
        tbs.call_outgoing(bearer_lid, "sip:bob@example.com", None),
        Err(TbsError::InvalidUri(_))
    ));
    let long = format!("tel:{}", "1".repeat(40));
    assert!(matches!(
        tbs.call_incoming(bearer_lid, &long, None, None),
        Err(TbsError::InvalidParam(_))
    ));
    assert_eq!(
        tbs.call_incoming(3, "tel:1", None, None),
        Err(TbsError::BearerNotFound)
    );
    assert_eq!(tbs.nb_calls(), 0);
}

#[test]
fn test_signal_strength_range() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(full_bearer()).unwrap();
    assert_eq!(
        tbs.bearer(bearer_lid).unwrap().signal_strength(),
        TBS_SIGNAL_STRENGTH_UNAVAILABLE
    );

    for value in [0u8, 1, 50, 100, 255] {
        assert_eq!(tbs.set_signal_strength(bearer_lid, value), Ok(()));
        assert_eq!(tbs.bearer(bearer_lid).unwrap().signal_strength(), value);
    }
    for value in 101u8..=254 {
        assert!(matches!(
            tbs.set_signal_strength(bearer_lid, value),
            Err(TbsError::InvalidParam(_))
        ));
    }
    assert_eq!(tbs.bearer(bearer_lid).unwrap().signal_strength(), 255);
}

#[test]
fn test_signal_strength_not_supported() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(BearerParam::default()).unwrap();

    assert_eq!(
        tbs.set_signal_strength(bearer_lid, 10),
        Err(TbsError::FeatureNotSupported)
    );
    assert_eq!(
        tbs.set_signal_strength_intv(bearer_lid, 10),
        Err(TbsError::FeatureNotSupported)
    );
    assert_eq!(
        tbs.read(bearer_lid, TbsChar::SignalStrength),
        Err(TbsError::FeatureNotSupported)
    );
}

#[test]
fn test_status_flags_only_known_bits() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(BearerParam::default()).unwrap();

    tbs.set_status_flags(bearer_lid, 0x0003).unwrap();
    assert_eq!(
        tbs.bearer(bearer_lid).unwrap().status_flags(),
        StatusFlags::INBAND_RINGTONE | StatusFlags::SILENT_MODE
    );
    assert!(matches!(
        tbs.set_status_flags(bearer_lid, 0x0004),
        Err(TbsError::InvalidParam(_))
    ));
    assert_eq!(
        tbs.read(bearer_lid, TbsChar::StatusFlags),
        Ok(vec![0x03, 0x00])
    );
}

#[test]
fn test_cp_results_are_deterministic() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(full_bearer()).unwrap();
    let call_id = tbs.call_incoming(bearer_lid, "tel:123", None, None).unwrap();

    let writes: [&[u8]; 5] = [
        &[TBS_OPCODE_LOCAL_RETRIEVE, call_id],
        &[TBS_OPCODE_LOCAL_HOLD, call_id],
        &[0x09, call_id],
        &[TBS_OPCODE_ACCEPT],
        &[TBS_OPCODE_JOIN, call_id, call_id],
    ];
    let expected = [
        CpResult::StateMismatch,
        CpResult::StateMismatch,
        CpResult::OpcodeNotSupported,
        CpResult::OperationNotPossible,
        CpResult::OperationNotPossible,
    ];
    for (data, result) in writes.iter().zip(expected) {
        for _ in 0..2 {
            assert_eq!(tbs.cp_write(0, bearer_lid, data).unwrap().result, result);
        }
    }
    assert_eq!(tbs.call_state(call_id), Some(CallState::Incoming));
    assert!(matches!(
        tbs.cp_write(0, bearer_lid, &[]),
        Err(TbsError::InvalidParam(_))
    ));
}

#[test]
fn test_cp_optional_opcodes() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(BearerParam::default()).unwrap();
    let call_id = tbs.call_incoming(bearer_lid, "tel:123", None, None).unwrap();
    tbs.call_action(call_id, CallAction::Accept).unwrap();

    let ntf = tbs
        .cp_write(0, bearer_lid, &[TBS_OPCODE_LOCAL_HOLD, call_id])
        .unwrap();
    assert_eq!(ntf.result, CpResult::OpcodeNotSupported);
    assert_eq!(tbs.call_state(call_id), Some(CallState::Active));

    // The server side may still hold the call
    tbs.call_action(call_id, CallAction::Hold).unwrap();
    assert_eq!(tbs.call_state(call_id), Some(CallState::LocallyHeld));
    assert_eq!(
        tbs.call_action(call_id, CallAction::Hold),
        Err(TbsError::StateMismatch)
    );
}

#[test]
fn test_cp_notification_needs_client_configuration() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(BearerParam::default()).unwrap();
    let call_id = tbs.call_incoming(bearer_lid, "tel:123", None, None).unwrap();

    tbs.cp_write(1, bearer_lid, &[TBS_OPCODE_ACCEPT, 7]).unwrap();
    assert!(tbs.drain_events().is_empty());

    tbs.set_cli_cfg(1, bearer_lid, TbsChar::CallControlPoint, true)
        .unwrap();
    assert_eq!(
        tbs.cli_cfg(1, bearer_lid),
        Ok(TbsChar::CallControlPoint.cfg_bit())
    );
    tbs.cp_write(1, bearer_lid, &[TBS_OPCODE_ACCEPT, call_id])
        .unwrap();

    let events = tbs.drain_events();
    assert_eq!(
        events[0],
        TbsEvent::Notify {
            con_lid: 1,
            bearer_lid,
            chr: TbsChar::CallControlPoint,
            value: vec![TBS_OPCODE_ACCEPT, call_id, TBS_CP_RESULT_SUCCESS],
        }
    );
    assert_eq!(
        events[1],
        TbsEvent::CallRequest {
            con_lid: 1,
            bearer_lid,
            call_id,
            opcode: CpOpcode::Accept,
        }
    );
    assert_eq!(events.len(), 2);

    // Connection 0 never subscribed
    tbs.cp_write(0, bearer_lid, &[TBS_OPCODE_TERMINATE, call_id])
        .unwrap();
    assert!(!tbs
        .drain_events()
        .iter()
        .any(|e| matches!(e, TbsEvent::Notify { con_lid: 0, .. })));

    assert!(matches!(
        tbs.set_cli_cfg(2, bearer_lid, TbsChar::CallState, true),
        Err(TbsError::InvalidParam(_))
    ));
    assert!(matches!(
        tbs.set_cli_cfg(0, bearer_lid, TbsChar::Ccid, true),
        Err(TbsError::InvalidParam(_))
    ));
}

#[test]
fn test_call_state_notifications() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(BearerParam::default()).unwrap();
    tbs.set_cli_cfg(0, bearer_lid, TbsChar::CallState, true)
        .unwrap();
    tbs.set_cli_cfg(0, bearer_lid, TbsChar::IncomingCall, true)
        .unwrap();

    let call_id = tbs.call_incoming(bearer_lid, "tel:123", None, None).unwrap();
    let events = tbs.drain_events();
    assert_eq!(
        events,
        vec![
            TbsEvent::Notify {
                con_lid: 0,
                bearer_lid,
                chr: TbsChar::IncomingCall,
                value: b"\x00tel:123".to_vec(),
            },
            TbsEvent::Notify {
                con_lid: 0,
                bearer_lid,
                chr: TbsChar::CallState,
                value: vec![call_id, TBS_CALL_STATE_INCOMING, 0],
            },
        ]
    );

    tbs.con_cleanup(0).unwrap();
    tbs.call_action(call_id, CallAction::Accept).unwrap();
    assert!(tbs.drain_events().is_empty());
}

#[test]
fn test_characteristic_values() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(full_bearer()).unwrap();
    let incoming = tbs
        .call_incoming(bearer_lid, "tel:123", Some("tel:999"), Some("Alice"))
        .unwrap();
    let outgoing = tbs.call_outgoing(bearer_lid, "sip:bob", None).unwrap();
    tbs.set_call_flags(incoming, CallFlags::WITHHELD_BY_NETWORK)
        .unwrap();

    let mut current_calls = vec![10, incoming, TBS_CALL_STATE_INCOMING, 0x04];
    current_calls.extend_from_slice(b"tel:123");
    current_calls.extend_from_slice(&[10, outgoing, TBS_CALL_STATE_DIALING, 0x01]);
    current_calls.extend_from_slice(b"sip:bob");
    assert_eq!(
        tbs.read(bearer_lid, TbsChar::CurrentCalls).unwrap(),
        current_calls
    );
    assert_eq!(
        tbs.read(bearer_lid, TbsChar::CallState).unwrap(),
        vec![incoming, 0x00, 0x04, outgoing, 0x01, 0x01]
    );
    assert_eq!(
        tbs.read(bearer_lid, TbsChar::IncomingTargetUri).unwrap(),
        b"\x00tel:999".to_vec()
    );
    assert_eq!(
        tbs.read(bearer_lid, TbsChar::FriendlyName).unwrap(),
        b"\x00Alice".to_vec()
    );
    assert_eq!(
        tbs.read(bearer_lid, TbsChar::CpOptOpcodes).unwrap(),
        vec![0x03, 0x00]
    );
    assert_eq!(
        tbs.read(bearer_lid, TbsChar::ProviderName).unwrap(),
        b"Operator".to_vec()
    );
    assert_eq!(
        tbs.read(bearer_lid, TbsChar::CallControlPoint),
        Err(TbsError::CommandDisallowed)
    );
    assert!(matches!(
        tbs.set_call_flags(incoming, CallFlags::OUTGOING),
        Err(TbsError::InvalidParam(_))
    ));

    tbs.call_action(incoming, CallAction::Terminate(TermReason::LineBusy))
        .unwrap();
    assert_eq!(
        tbs.read(bearer_lid, TbsChar::TerminationReason).unwrap(),
        vec![incoming, TBS_TERM_REASON_LINE_BUSY]
    );
    assert!(tbs
        .read(bearer_lid, TbsChar::IncomingCall)
        .unwrap()
        .is_empty());
}

#[test]
fn test_longest_uri_fits_current_calls_item() {
    let mut tbs = TbsServer::new();
    let too_long = TbsConfig {
        call_pool_uri_len: TBS_URI_LEN_MAX + 1,
        ..TbsConfig::default()
    };
    assert!(matches!(
        tbs.configure(too_long),
        Err(TbsError::InvalidParam(_))
    ));

    tbs.configure(TbsConfig {
        call_pool_uri_len: TBS_URI_LEN_MAX,
        ..TbsConfig::default()
    })
    .unwrap();
    let bearer_lid = tbs.add(BearerParam::default()).unwrap();
    let uri = format!("tel:{}", "5".repeat(TBS_URI_LEN_MAX - 4));
    let call_id = tbs.call_incoming(bearer_lid, &uri, None, None).unwrap();

    let value = tbs.read(bearer_lid, TbsChar::CurrentCalls).unwrap();
    assert_eq!(value[0], u8::MAX);
    assert_eq!(value.len(), 1 + u8::MAX as usize);
    assert_eq!(value[1], call_id);
    assert_eq!(&value[4..], uri.as_bytes());

    let longer = format!("{}5", uri);
    assert!(tbs.call_incoming(bearer_lid, &longer, None, None).is_err());
}

#[test]
fn test_outgoing_call_lifecycle() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(full_bearer()).unwrap();
    let call_id = tbs.call_outgoing(bearer_lid, "tel:555", None).unwrap();
    assert!(tbs.call(call_id).unwrap().is_outgoing());

    assert_eq!(tbs.call_remote_hold(call_id), Err(TbsError::StateMismatch));
    tbs.call_remote_alert(call_id).unwrap();
    assert_eq!(tbs.call_state(call_id), Some(CallState::Alerting));
    tbs.call_remote_answer(call_id).unwrap();
    assert_eq!(tbs.call_state(call_id), Some(CallState::Active));

    tbs.call_remote_hold(call_id).unwrap();
    let ntf = tbs
        .cp_write(0, bearer_lid, &[TBS_OPCODE_LOCAL_HOLD, call_id])
        .unwrap();
    assert_eq!(ntf.result, CpResult::Success);
    assert_eq!(
        tbs.call_state(call_id),
        Some(CallState::LocallyAndRemotelyHeld)
    );

    tbs.call_remote_retrieve(call_id).unwrap();
    assert_eq!(tbs.call_state(call_id), Some(CallState::LocallyHeld));
    tbs.cp_write(0, bearer_lid, &[TBS_OPCODE_LOCAL_RETRIEVE, call_id])
        .unwrap();
    assert_eq!(tbs.call_state(call_id), Some(CallState::Active));
    assert_eq!(tbs.call_remote_alert(9), Err(TbsError::CallNotFound));
}

#[test]
fn test_cp_originate_and_terminate() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(full_bearer()).unwrap();
    tbs.set_cli_cfg(0, bearer_lid, TbsChar::TerminationReason, true)
        .unwrap();

    let ntf = tbs.cp_write(0, bearer_lid, b"\x04sip:carol").unwrap();
    assert_eq!(ntf.result, CpResult::Success);
    assert_eq!(ntf.call_index, 0);
    assert_eq!(tbs.call_state(0), Some(CallState::Dialing));
    assert_eq!(
        tbs.drain_events(),
        vec![TbsEvent::CallRequest {
            con_lid: 0,
            bearer_lid,
            call_id: 0,
            opcode: CpOpcode::Originate,
        }]
    );

    let ntf = tbs.cp_write(0, bearer_lid, b"\x04mailto:carol").unwrap();
    assert_eq!(ntf.result, CpResult::InvalidOutgoingUri);
    let ntf = tbs.cp_write(0, bearer_lid, b"\x04\xff\xfe").unwrap();
    assert_eq!(ntf.result, CpResult::InvalidOutgoingUri);
    assert_eq!(tbs.nb_calls(), 1);

    tbs.cp_write(0, bearer_lid, &[TBS_OPCODE_TERMINATE, 0])
        .unwrap();
    assert_eq!(tbs.call_state(0), None);
    assert_eq!(
        tbs.drain_events(),
        vec![
            TbsEvent::Notify {
                con_lid: 0,
                bearer_lid,
                chr: TbsChar::TerminationReason,
                value: vec![0, TBS_TERM_REASON_CLIENT_END],
            },
            TbsEvent::CallTerminated {
                bearer_lid,
                call_id: 0,
                reason: TermReason::ClientEnd,
            },
            TbsEvent::CallRequest {
                con_lid: 0,
                bearer_lid,
                call_id: 0,
                opcode: CpOpcode::Terminate,
            },
        ]
    );
}

#[test]
fn test_cp_join() {
    let mut tbs = server(4);
    let bearer_lid = tbs.add(full_bearer()).unwrap();
    let first = tbs.call_incoming(bearer_lid, "tel:1", None, None).unwrap();
    let second = tbs.call_incoming(bearer_lid, "tel:2", None, None).unwrap();
    let third = tbs.call_incoming(bearer_lid, "tel:3", None, None).unwrap();

    // Incoming calls cannot be joined yet
    let ntf = tbs
        .cp_write(0, bearer_lid, &[TBS_OPCODE_JOIN, first, second])
        .unwrap();
    assert_eq!(ntf.result, CpResult::StateMismatch);
    let ntf = tbs
        .cp_write(0, bearer_lid, &[TBS_OPCODE_JOIN, first, 9])
        .unwrap();
    assert_eq!(ntf.result, CpResult::InvalidCallIndex);
    assert_eq!(ntf.call_index, first);

    tbs.call_action(first, CallAction::Accept).unwrap();
    tbs.call_action(first, CallAction::Hold).unwrap();
    tbs.call_action(second, CallAction::Accept).unwrap();
    tbs.call_action(third, CallAction::Accept).unwrap();
    tbs.call_remote_hold(third).unwrap();

    let ntf = tbs
        .cp_write(0, bearer_lid, &[TBS_OPCODE_JOIN, first, second, third])
        .unwrap();
    assert_eq!(ntf.result, CpResult::Success);
    assert_eq!(ntf.call_index, first);
    assert_eq!(tbs.call_state(first), Some(CallState::Active));
    assert_eq!(tbs.call_state(second), Some(CallState::LocallyHeld));
    assert_eq!(
        tbs.call_state(third),
        Some(CallState::LocallyAndRemotelyHeld)
    );

    // Local join keeps the same policy
    tbs.call_join(&[third, first]).unwrap();
    assert_eq!(tbs.call_state(third), Some(CallState::RemotelyHeld));
    assert_eq!(tbs.call_state(first), Some(CallState::LocallyHeld));
    assert!(matches!(
        tbs.call_join(&[third]),
        Err(TbsError::InvalidParam(_))
    ));
}

#[test]
fn test_event_message_encoding() {
    let event = TbsEvent::CallTerminated {
        bearer_lid: 0,
        call_id: 2,
        reason: TermReason::NoAnswer,
    };
    let message = event.to_message().unwrap();
    assert_eq!(message.code.kind(), MsgKind::Indication);
    assert_eq!(message.payload, vec![0, 2, TBS_TERM_REASON_NO_ANSWER]);

    let notify = TbsEvent::Notify {
        con_lid: 1,
        bearer_lid: 0,
        chr: TbsChar::SignalStrength,
        value: vec![42],
    };
    assert_eq!(notify.to_message().unwrap().payload, vec![1, 0, 4, 1, 0, 42]);

    // Current calls lists of several calls go past 255 bytes
    let long_list = TbsEvent::Notify {
        con_lid: 1,
        bearer_lid: 0,
        chr: TbsChar::CurrentCalls,
        value: vec![0; 300],
    };
    let payload = long_list.to_message().unwrap().payload;
    assert_eq!(&payload[3..5], &[0x2C, 0x01]);
    assert_eq!(payload.len(), 5 + 300);

    assert_eq!(
        TbsError::StateMismatch.code(),
        Layer::Acc.status(TBS_ERR_STATE_MISMATCH)
    );
}
