use super::*;
use crate::hdr::coef::{ToneMapping, TransferLut};

fn ramp(n: usize) -> Vec<u32> {
    (0..n as u32).collect()
}

fn full_set() -> HdrCoefficientSet {
    HdrCoefficientSet {
        oetf: Some(TransferLut {
            x: ramp(OETF_LUT_VALUES),
            y: ramp(OETF_LUT_VALUES),
        }),
        eotf: Some(TransferLut {
            x: ramp(EOTF_LUT_VALUES),
            y: ramp(EOTF_LUT_VALUES),
        }),
        gamut: Some(ramp(GM_LUT_VALUES)),
        tone: Some(ToneMapping {
            x: ramp(TM_LUT_VALUES),
            y: ramp(TM_LUT_VALUES),
            coef: [1, 2, 3],
            range_x: [1, 2],
            range_y: [3, 4],
        }),
    }
}

fn library(layer_map: [u32; MAX_HDR_SET], sets: Vec<HdrCoefficientSet>) -> HdrLibrary {
    let mut lib = HdrLibrary::new();
    lib.set_coefficients(layer_map, sets).unwrap();
    lib
}

#[test]
fn empty_library_writes_nothing() {
    let mut out = Vec::new();
    assert_eq!(pack_library(&HdrLibrary::new(), &mut out).unwrap(), 0);
    assert!(out.is_empty());
}

#[test]
fn gamut_only_set() {
    let lib = library(
        [1, 0, 0, 0],
        vec![HdrCoefficientSet {
            gamut: Some(vec![0xFFFF_FFFF; GM_LUT_VALUES]),
            ..Default::default()
        }],
    );
    let mut out = Vec::new();
    let n = pack_library(&lib, &mut out).unwrap();
    assert_eq!(n, GM_LUT_VALUES + 1 + 1);
    assert_eq!(out[0], ExtraReg::new(0x339C, 0x7_FFFF));
    assert_eq!(out[8].offset, 0x339C + 8 * 4);
    assert_eq!(out[9], ExtraReg::new(MOD_CTRL, 1 << 2));
    assert_eq!(out[10], ExtraReg::new(COM_CTRL, 1));
}

#[test]
fn second_slot_is_offset_by_stride() {
    let gamut = HdrCoefficientSet {
        gamut: Some(ramp(GM_LUT_VALUES)),
        ..Default::default()
    };
    let lib = library([0, 1, 0, 0], vec![HdrCoefficientSet::default(), gamut]);
    let mut out = Vec::new();
    pack_library(&lib, &mut out).unwrap();
    assert_eq!(out[0].offset, 0x339C + SET_STRIDE);
    assert_eq!(out[9].offset, MOD_CTRL + SET_STRIDE);
}

#[test]
fn paired_tables_pack_low_half_first() {
    let lib = library([1, 0, 0, 0], vec![full_set()]);
    let mut out = Vec::new();
    pack_library(&lib, &mut out).unwrap();

    let oetf_x = HdrStage::Oetf.layout().x;
    assert_eq!(oetf_x.count, 17);
    assert_eq!(out[0], ExtraReg::new(oetf_x.base, 1 << 16));
    assert_eq!(out[16], ExtraReg::new(oetf_x.base + 16 * 4, 32));
    assert_eq!(out[17].offset, HdrStage::Oetf.layout().y.unwrap().base);
}

#[test]
fn tone_mapping_appends_range_and_weights() {
    let lib = library([1, 0, 0, 0], vec![full_set()]);
    let mut out = Vec::new();
    let n = pack_library(&lib, &mut out).unwrap();
    assert_eq!(n, (MAX_LIBRARY_REGS - 1) / MAX_HDR_SET + 1);

    let find = |offset| out.iter().find(|r| r.offset == offset).map(|r| r.value);
    assert_eq!(find(TM_RNGX), Some(0x2_0001));
    assert_eq!(find(TM_RNGY), Some((4 << 9) | 3));
    assert_eq!(find(TM_COEF), Some((3 << 20) | (2 << 10) | 1));
    assert_eq!(find(MOD_CTRL), Some(0b10_0111));
    assert_eq!(out.last(), Some(&ExtraReg::new(COM_CTRL, 1)));
}

#[test]
fn short_table_is_rejected_without_output() {
    let mut out = vec![ExtraReg::new(0x2000, 7)];
    let err = pack_axis(&mut out, &[1, 2, 3], HdrStage::Gamut.layout().x, 0).unwrap_err();
    assert!(matches!(err, G2dError::Config(_)));
    assert!(err.to_string().contains("expected 9"));
    assert_eq!(out.len(), 1);

    let odd = HdrStage::ToneMapping.layout().x;
    assert!(pack_axis(&mut Vec::new(), &ramp(TM_LUT_VALUES - 1), odd, 0).is_err());
}

#[test]
fn deserialized_library_is_validated() {
    let short = r#"{"layer_map":[1,0,0,0],"sets":[{"gamut":[1,2,3]},{},{},{}]}"#;
    assert!(serde_json::from_str::<HdrLibrary>(short).is_err());

    let gamut: Vec<String> = (0..GM_LUT_VALUES).map(|v| v.to_string()).collect();
    let json = format!(
        r#"{{"layer_map":[1,0,0,0],"sets":[{{"gamut":[{}]}}]}}"#,
        gamut.join(",")
    );
    let lib: HdrLibrary = serde_json::from_str(&json).unwrap();
    let mut out = Vec::new();
    assert_eq!(pack_library(&lib, &mut out).unwrap(), GM_LUT_VALUES + 1 + 1);

    let round: HdrLibrary = serde_json::from_str(&serde_json::to_string(&lib).unwrap()).unwrap();
    assert_eq!(round, lib);
}

#[test]
fn layer_commands_follow_the_map() {
    let lib = library(
        [0, 0b10, 0, 0],
        vec![
            HdrCoefficientSet::default(),
            HdrCoefficientSet {
                gamut: Some(ramp(GM_LUT_VALUES)),
                ..Default::default()
            },
        ],
    );
    let mut regs = vec![vec![0u32; SRC_HDRMODE + 1]; 2];
    set_layer_hdr_command(&lib, regs.iter_mut().map(|r| &mut r[..]), 0b11);
    assert_eq!(regs[0][SRC_HDRMODE], 0);
    assert_eq!(regs[0][SRC_COMMAND], 0);
    assert_eq!(regs[1][SRC_HDRMODE], 1 | HDRMODE_DEMULT_ALPHA);
    assert_eq!(regs[1][SRC_COMMAND], LayerCommand::PREMULT_ALPHA.bits());
}

#[test]
fn noop_writer_defers_to_library() {
    let mut writer = NoopHdrWriter;
    writer.set_target_info(Dataspace::UNKNOWN);
    writer.set_layer_image_info(0, PixelFormat::Rgba8888, true);
    assert!(writer.commands().unwrap().is_empty());
    assert_eq!(writer.layer_hdr_mode(0), None);
}
