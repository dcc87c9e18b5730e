use rustygaf::codec::{CodecId, Direction, DpConfig, Framing, Packing, PhyBf};
use rustygaf::iap::{
    EnabledConfig, GroupConfig, IapConfig, IapEvent, IapManager, IsoCommand, IsoControllerEvent,
    StreamEnabled, UgConfig, UgParam, UsParam,
};
use std::error::Error;

/// Answer a queued command the way a controller would
fn answer(command: &IsoCommand, next_conhdl: &mut u16) -> Option<IsoControllerEvent> {
    match command {
        IsoCommand::EnableUnicast { txn, streams, .. } => {
            let streams = streams
                .iter()
                .map(|cis| {
                    *next_conhdl += 1;
                    StreamEnabled {
                        stream_lid: cis.stream_lid,
                        conhdl: *next_conhdl,
                        config: None,
                    }
                })
                .collect();
            Some(IsoControllerEvent::Enabled {
                txn: *txn,
                status: 0,
                config: Some(EnabledConfig {
                    group: GroupConfig::Unicast(UgConfig {
                        sync_delay_us: 1_500,
                        tlatency_m2s_us: 10_000,
                        tlatency_s2m_us: 10_000,
                        iso_intv_frames: 8,
                    }),
                    streams,
                }),
            })
        }
        other => other
            .txn()
            .map(|txn| IsoControllerEvent::Complete { txn, status: 0 }),
    }
}

fn run_controller(iap: &mut IapManager, next_conhdl: &mut u16) {
    while let Some(command) = iap.poll_command() {
        println!("Controller <- {:?}", command);
        if let Some(event) = answer(&command, next_conhdl) {
            iap.on_controller_event(event);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut iap = IapManager::new(IapConfig::default())?;
    let mut next_conhdl = 0x0060;

    // One CIG with a single CIS towards connection 0
    let intf_lid = iap.intf_add()?;
    let group_lid = iap.ug_add(
        intf_lid,
        1,
        &UgParam {
            sdu_intv_m2s_us: 10_000,
            sdu_intv_s2m_us: 10_000,
            packing: Packing::Sequential,
            framing: Framing::Unframed,
            sca: 0,
            tlatency_m2s_ms: 20,
            tlatency_s2m_ms: 20,
        },
    )?;
    let stream_lid = iap.us_config(
        group_lid,
        0,
        &UsParam {
            max_sdu_m2s: 100,
            max_sdu_s2m: 100,
            phy_m2s: PhyBf::LE_2M,
            phy_s2m: PhyBf::LE_2M,
            rtn_m2s: 2,
            rtn_s2m: 2,
        },
    )?;
    iap.us_bind(stream_lid, 0)?;

    iap.us_enable(group_lid)?;
    run_controller(&mut iap, &mut next_conhdl);
    println!("Stream {} is {:?}", stream_lid, iap.stream_state(stream_lid));

    // Route LC3 audio from the host to the controller
    iap.dp_config(
        stream_lid,
        Direction::Input,
        DpConfig {
            dp_id: 0,
            ctl_delay_us: 1_000,
            codec_id: CodecId::LC3,
            codec_cfg: vec![0x02, 0x01, 0x08],
        },
    )?;
    iap.dp_setup(stream_lid, Direction::Input)?;
    run_controller(&mut iap, &mut next_conhdl);

    iap.us_disable(group_lid)?;
    run_controller(&mut iap, &mut next_conhdl);
    iap.ug_remove(group_lid)?;
    run_controller(&mut iap, &mut next_conhdl);

    for event in iap.drain_events() {
        if let IapEvent::GroupEnabled { result: Err(err), .. } = &event {
            eprintln!("Enable failed: {}", err);
        }
        println!("{:?}", event);
    }

    Ok(())
}
