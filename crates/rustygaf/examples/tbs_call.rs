use rustygaf::tbs::{
    BearerCfg, BearerParam, CallAction, OptOpcodes, TbsChar, TbsConfig, TbsServer,
    TBS_OPCODE_ACCEPT, TBS_OPCODE_LOCAL_HOLD, TBS_OPCODE_TERMINATE,
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Create the server with room for four calls
    let mut tbs = TbsServer::new();
    tbs.configure(TbsConfig::default())?;

    let bearer_lid = tbs.add(BearerParam {
        cfg: BearerCfg::SIGNAL_STRENGTH | BearerCfg::FRIENDLY_NAME,
        opt_opcodes: OptOpcodes::LOCAL_HOLD | OptOpcodes::JOIN,
        provider_name: "RustyTel".into(),
        uri_schemes: "tel,sip".into(),
        ..BearerParam::default()
    })?;
    println!("Bearer {} added", bearer_lid);

    // Connection 0 follows the calls and the control point results
    tbs.set_cli_cfg(0, bearer_lid, TbsChar::CallState, true)?;
    tbs.set_cli_cfg(0, bearer_lid, TbsChar::CallControlPoint, true)?;
    tbs.set_signal_strength(bearer_lid, 80)?;

    let call_id = tbs.call_incoming(bearer_lid, "tel:+15551234", None, Some("Alice"))?;
    println!("Incoming call {}", call_id);

    // The client answers, holds and hangs up
    for data in [
        [TBS_OPCODE_ACCEPT, call_id],
        [TBS_OPCODE_LOCAL_HOLD, call_id],
        [TBS_OPCODE_TERMINATE, call_id],
    ] {
        let result = tbs.cp_write(0, bearer_lid, &data)?;
        println!(
            "Opcode 0x{:02x} on call {}: {:?}",
            result.opcode, result.call_index, result.result
        );
    }

    // A second call placed locally and ended by the network
    let call_id = tbs.call_outgoing(bearer_lid, "sip:bob@example.com", None)?;
    tbs.call_remote_alert(call_id)?;
    tbs.call_remote_answer(call_id)?;
    tbs.call_action(call_id, CallAction::Terminate(rustygaf::tbs::TermReason::RemoteEnd))?;

    for event in tbs.drain_events() {
        let message = event.to_message()?;
        println!(
            "{:?} -> code 0x{:04x} payload {}",
            event,
            message.code.value(),
            hex::encode(&message.payload)
        );
    }

    Ok(())
}
