//! Tests for codec, QoS and LTV types

use super::*;

fn lc3_48k() -> CodecConfig {
    CodecConfig {
        location_bf: Some(AudioLocation::FRONT_LEFT | AudioLocation::FRONT_RIGHT),
        frames_sdu: Some(1),
        ..CodecConfig::new(SamplingFreq::Hz48000, FrameDuration::Ms10, 100)
    }
}

#[test]
fn test_ltv_parse_records() {
    let data = [0x02, 0x01, 0x08, 0x02, 0x02, 0x01, 0x03, 0x04, 0x64, 0x00];
    let list = LtvList::parse(&data).unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list.get(LTV_CFG_SAMPLING_FREQ).unwrap().as_u8().unwrap(), 0x08);
    assert_eq!(list.get(LTV_CFG_OCTETS_PER_FRAME).unwrap().as_u16().unwrap(), 100);
    assert_eq!(list.to_bytes(), data.to_vec());
}

#[test]
fn test_ltv_zero_length_is_invalid() {
    assert_eq!(
        LtvList::parse(&[0x02, 0x01, 0x08, 0x00]),
        Err(CodecError::InvalidLtvLength(0))
    );
}

#[test]
fn test_ltv_truncated_record() {
    assert_eq!(
        LtvList::parse(&[0x05, 0x01, 0x08]),
        Err(CodecError::LtvTruncated { declared: 5, available: 2 })
    );
}

#[test]
fn test_ltv_set_replaces_same_type() {
    let mut list = LtvList::new();
    list.set(Ltv::from_u8(0x01, 1));
    list.set(Ltv::from_u8(0x02, 2));
    list.set(Ltv::from_u8(0x01, 3));
    assert_eq!(list.len(), 2);
    assert_eq!(list.get(0x01).unwrap().value(), &[3]);
    assert_eq!(list.to_string(), "01:03 02:02");
    assert!(Ltv::new(0x01, vec![0; 255]).is_err());
}

#[test]
fn test_ltv_longest_value_keeps_length_byte() {
    assert_eq!(
        Ltv::new(0x7F, vec![0xAB; 255]),
        Err(CodecError::ValueTooLong(255))
    );

    let mut list = LtvList::new();
    list.push(Ltv::new(0x7F, vec![0xAB; 254]).unwrap());
    let bytes = list.to_bytes();
    assert_eq!(bytes.len(), 256);
    assert_eq!(bytes[0], 0xFF);
    assert_eq!(bytes[1], 0x7F);

    let parsed = LtvList::parse(&bytes).unwrap();
    assert_eq!(parsed.get(0x7F).unwrap().value().len(), 254);
    assert_eq!(parsed, list);
}

#[test]
fn test_codec_config_ltv() {
    let cfg = lc3_48k();
    let bytes = cfg.to_bytes();
    assert_eq!(
        bytes,
        vec![
            0x02, 0x01, 0x08, // 48 kHz
            0x02, 0x02, 0x01, // 10 ms
            0x05, 0x03, 0x03, 0x00, 0x00, 0x00, // FL | FR
            0x03, 0x04, 0x64, 0x00, // 100 octets
            0x02, 0x05, 0x01, // 1 frame block
        ]
    );
    assert_eq!(CodecConfig::parse(&bytes).unwrap(), cfg);
    assert_eq!(cfg.nb_channels(), 2);
    assert_eq!(cfg.sdu_size(), Some(200));
    assert_eq!(cfg.sdu_intv_us(), Some(10_000));
}

#[test]
fn test_codec_config_keeps_unknown_types() {
    let data = [0x02, 0x01, 0x03, 0x03, 0x7F, 0xAA, 0xBB];
    let cfg = CodecConfig::parse(&data).unwrap();
    assert_eq!(cfg.sampling_freq, Some(SamplingFreq::Hz16000));
    assert_eq!(cfg.additional.get(0x7F).unwrap().value(), &[0xAA, 0xBB]);
    assert_eq!(cfg.to_bytes(), data.to_vec());
}

#[test]
fn test_codec_config_rejects_bad_values() {
    assert!(CodecConfig::parse(&[0x02, 0x01, 0x0E]).is_err());
    assert_eq!(
        CodecConfig::parse(&[0x03, 0x01, 0x08, 0x00]),
        Err(CodecError::InvalidValueLength { ltv_type: 0x01, length: 2 })
    );
}

#[test]
fn test_capabilities_support() {
    let capa = CodecCapabilities {
        sampling_freqs: SamplingFreqs::HZ_16000 | SamplingFreqs::HZ_48000,
        frame_durs: FrameDurations::MS_10,
        channel_counts: Some(0x03),
        frame_octets_min: 40,
        frame_octets_max: 120,
        max_frames_sdu: Some(1),
    };
    let parsed = CodecCapabilities::parse(&capa.to_ltv().to_bytes()).unwrap();
    assert_eq!(parsed, capa);

    assert!(capa.supports(&lc3_48k()));
    let mut cfg = lc3_48k();
    cfg.frame_dur = Some(FrameDuration::Ms7_5);
    assert!(!capa.supports(&cfg));
    let mut cfg = lc3_48k();
    cfg.frame_octets = Some(155);
    assert!(!capa.supports(&cfg));
    let mut cfg = lc3_48k();
    cfg.sampling_freq = Some(SamplingFreq::Hz24000);
    assert!(!capa.supports(&cfg));
}

#[test]
fn test_metadata_ltv() {
    let meta = Metadata {
        streaming_contexts: Some(ContextType::CONVERSATIONAL),
        program_info: Some("call".into()),
        language: Some(*b"eng"),
        ccid_list: vec![0x01],
        ..Default::default()
    };
    let bytes = meta.to_bytes().unwrap();
    assert_eq!(&bytes[..4], &[0x03, 0x02, 0x02, 0x00]);
    assert_eq!(Metadata::parse(&bytes).unwrap(), meta);
    assert!(Metadata::parse(&[0x03, 0x04, b'e', b'n']).is_err());
}

#[test]
fn test_qos_req_validation() {
    let mut req = QosReq {
        framing: Framing::Unframed,
        pref_phy_bf: PhyBf::LE_2M,
        pref_retx_nb: 2,
        max_tlatency_ms: 20,
        pres_delay_min_us: 20_000,
        pres_delay_max_us: 40_000,
        pref_pres_delay_min_us: 0,
        pref_pres_delay_max_us: 0,
    };
    assert!(req.validate().is_ok());

    req.max_tlatency_ms = 4;
    assert!(req.validate().is_err());
    req.max_tlatency_ms = 20;

    req.pref_pres_delay_min_us = 10_000;
    assert!(req.validate().is_err());
    req.pref_pres_delay_min_us = 30_000;
    req.pref_pres_delay_max_us = 25_000;
    assert!(req.validate().is_err());
    req.pref_pres_delay_max_us = 35_000;
    assert!(req.validate().is_ok());
}

#[test]
fn test_qos_config_encoding() {
    let cfg = QosConfig {
        sdu_intv_us: 10_000,
        framing: Framing::Unframed,
        phy: PhyBf::LE_2M,
        max_sdu: 100,
        retx_nb: 5,
        max_tlatency_ms: 20,
        pres_delay_us: 40_000,
    };
    let bytes = cfg.to_bytes();
    assert_eq!(bytes.len(), QOS_CONFIG_LEN);
    assert_eq!(&bytes[..3], &[0x10, 0x27, 0x00]);
    assert_eq!(QosConfig::parse(&bytes).unwrap(), cfg);

    let mut bad = cfg;
    bad.sdu_intv_us = 100;
    assert!(bad.validate().is_err());
    let mut bad = cfg;
    bad.phy = PhyBf::LE_1M | PhyBf::LE_2M;
    assert!(bad.validate().is_err());
    let mut bad = cfg;
    bad.retx_nb = 16;
    assert!(bad.validate().is_err());

    let req = QosReq {
        framing: Framing::Unframed,
        pref_phy_bf: PhyBf::LE_2M,
        pref_retx_nb: 5,
        max_tlatency_ms: 20,
        pres_delay_min_us: 20_000,
        pres_delay_max_us: 40_000,
        pref_pres_delay_min_us: 0,
        pref_pres_delay_max_us: 0,
    };
    assert!(req.accepts(&cfg));
}

#[test]
fn test_dp_config_encoding() {
    let cfg = DpConfig {
        dp_id: 0x01,
        ctl_delay_us: 1000,
        codec_id: CodecId::LC3,
        codec_cfg: lc3_48k().to_bytes(),
    };
    assert!(cfg.validate().is_ok());
    let bytes = cfg.to_bytes().unwrap();
    assert_eq!(bytes[0], 0x01);
    assert_eq!(&bytes[1..4], &[0xE8, 0x03, 0x00]);
    assert_eq!(bytes[4], CODEC_FORMAT_LC3);
    assert_eq!(bytes[9] as usize, cfg.codec_cfg.len());
    assert_eq!(DpConfig::parse(&bytes).unwrap(), cfg);

    let mut bad = cfg.clone();
    bad.ctl_delay_us = CTL_DELAY_MAX_US + 1;
    assert!(bad.validate().is_err());
    let mut bad = cfg;
    bad.codec_id.company_id = 0x0001;
    assert!(bad.validate().is_err());
    assert!(DpConfig::hci().validate().is_ok());
}
