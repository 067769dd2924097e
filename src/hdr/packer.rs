//! Serialization of HDR coefficient sets into register writes.
//!
//! Each configuration slot owns a 0x800-byte register window. Within a slot every enabled
//! stage writes its X table then its Y table; paired tables carry two coefficients per
//! register (low half first). Tone mapping appends its range and weight registers, and a
//! per-slot mode control register records the enabled stages. A single common control
//! register closes the stream when anything was written.

use crate::{
    foundation::{
        core::Dataspace,
        error::{G2dError, G2dResult},
    },
    format::catalog::PixelFormat,
    hdr::coef::{
        EOTF_LUT_VALUES, GM_LUT_VALUES, HdrCoefficientSet, HdrLibrary, MAX_HDR_SET,
        OETF_LUT_VALUES, TM_LUT_VALUES,
    },
    task::regs::{ExtraReg, HDRMODE_DEMULT_ALPHA, LayerCommand, SRC_COMMAND, SRC_HDRMODE},
};

const COM_CTRL: u32 = 0x3004;
const MOD_CTRL: u32 = 0x3008;
const TM_COEF: u32 = 0x3434;
const TM_RNGX: u32 = 0x3438;
const TM_RNGY: u32 = 0x343C;
const SET_STRIDE: u32 = 0x800;

const TM_COEF_BITS: u32 = 10;
const TM_RNGX_BITS: u32 = 16;
const TM_RNGY_BITS: u32 = 9;

const fn paired_count(values: usize) -> usize {
    values.div_ceil(2)
}

/// Processing stage of an HDR configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HdrStage {
    /// Opto-electrical transfer.
    Oetf,
    /// Electro-optical transfer.
    Eotf,
    /// Gamut mapping.
    Gamut,
    /// Tone mapping.
    ToneMapping,
}

/// Register layout of one coefficient table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisLayout {
    /// Coefficients consumed.
    pub values: usize,
    /// Registers written.
    pub count: usize,
    /// Significant bits per coefficient.
    pub bits: u32,
    /// Two coefficients per register.
    pub paired: bool,
    /// Offset of the first register in slot 0.
    pub base: u32,
}

/// Register layout of one stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageLayout {
    /// Bit in the mode control register.
    pub ctrl_bit: u32,
    /// X table.
    pub x: AxisLayout,
    /// Y table, absent for gamut mapping.
    pub y: Option<AxisLayout>,
}

impl HdrStage {
    /// Stages in packing order.
    pub const ALL: [Self; 4] = [Self::Oetf, Self::Eotf, Self::Gamut, Self::ToneMapping];

    /// Register layout of the stage.
    pub const fn layout(self) -> StageLayout {
        match self {
            Self::Oetf => StageLayout {
                ctrl_bit: 0,
                x: AxisLayout {
                    values: OETF_LUT_VALUES,
                    count: paired_count(OETF_LUT_VALUES),
                    bits: 16,
                    paired: true,
                    base: 0x300C,
                },
                y: Some(AxisLayout {
                    values: OETF_LUT_VALUES,
                    count: paired_count(OETF_LUT_VALUES),
                    bits: 10,
                    paired: true,
                    base: 0x3050,
                }),
            },
            Self::Eotf => StageLayout {
                ctrl_bit: 1,
                x: AxisLayout {
                    values: EOTF_LUT_VALUES,
                    count: paired_count(EOTF_LUT_VALUES),
                    bits: 10,
                    paired: true,
                    base: 0x3094,
                },
                y: Some(AxisLayout {
                    values: EOTF_LUT_VALUES,
                    count: EOTF_LUT_VALUES,
                    bits: 16,
                    paired: false,
                    base: 0x3198,
                }),
            },
            Self::Gamut => StageLayout {
                ctrl_bit: 2,
                x: AxisLayout {
                    values: GM_LUT_VALUES,
                    count: GM_LUT_VALUES,
                    bits: 19,
                    paired: false,
                    base: 0x339C,
                },
                y: None,
            },
            Self::ToneMapping => StageLayout {
                ctrl_bit: 5,
                x: AxisLayout {
                    values: TM_LUT_VALUES,
                    count: paired_count(TM_LUT_VALUES),
                    bits: 16,
                    paired: true,
                    base: 0x344C,
                },
                y: Some(AxisLayout {
                    values: TM_LUT_VALUES,
                    count: TM_LUT_VALUES,
                    bits: 20,
                    paired: false,
                    base: 0x3490,
                }),
            },
        }
    }

    fn tables(self, set: &HdrCoefficientSet) -> Option<(&[u32], &[u32])> {
        match self {
            Self::Oetf => set.oetf.as_ref().map(|l| (&l.x[..], &l.y[..])),
            Self::Eotf => set.eotf.as_ref().map(|l| (&l.x[..], &l.y[..])),
            Self::Gamut => set.gamut.as_ref().map(|g| (&g[..], &[][..])),
            Self::ToneMapping => set.tone.as_ref().map(|t| (&t.x[..], &t.y[..])),
        }
    }
}

/// Upper bound of registers [`pack_library`] can produce.
pub const MAX_LIBRARY_REGS: usize = {
    let per_set = 2 * paired_count(OETF_LUT_VALUES)
        + paired_count(EOTF_LUT_VALUES)
        + EOTF_LUT_VALUES
        + GM_LUT_VALUES
        + paired_count(TM_LUT_VALUES)
        + TM_LUT_VALUES
        + 3
        + 1;
    MAX_HDR_SET * per_set + 1
};

const fn coef(value: u32, bits: u32) -> u32 {
    value & ((1 << bits) - 1)
}

const fn couple(v0: u32, v1: u32, bits: u32) -> u32 {
    (coef(v1, bits) << 16) | coef(v0, bits)
}

fn pack_axis(
    out: &mut Vec<ExtraReg>,
    data: &[u32],
    layout: AxisLayout,
    slot: u32,
) -> G2dResult<()> {
    if data.len() != layout.values {
        return Err(G2dError::config(format!(
            "HDR table at {:#x} has {} coefficients, expected {}",
            layout.base,
            data.len(),
            layout.values
        )));
    }

    let mut offset = layout.base + slot * SET_STRIDE;
    let mut push = |value| {
        out.push(ExtraReg::new(offset, value));
        offset += 4;
    };

    if layout.paired {
        for pair in data.chunks(2) {
            push(couple(pair[0], pair.get(1).copied().unwrap_or(0), layout.bits));
        }
    } else {
        for &v in data {
            push(coef(v, layout.bits));
        }
    }
    Ok(())
}

fn pack_set(out: &mut Vec<ExtraReg>, set: &HdrCoefficientSet, slot: u32) -> G2dResult<()> {
    let mut mod_ctrl = 0;
    for stage in HdrStage::ALL {
        let Some((x, y)) = stage.tables(set) else {
            continue;
        };
        let layout = stage.layout();
        mod_ctrl |= 1 << layout.ctrl_bit;
        pack_axis(out, x, layout.x, slot)?;
        if let Some(y_layout) = layout.y {
            pack_axis(out, y, y_layout, slot)?;
        }
    }

    if let Some(tm) = &set.tone {
        let offset = |reg: u32| reg + slot * SET_STRIDE;
        out.push(ExtraReg::new(
            offset(TM_RNGX),
            couple(tm.range_x[0], tm.range_x[1], TM_RNGX_BITS),
        ));
        out.push(ExtraReg::new(
            offset(TM_RNGY),
            (coef(tm.range_y[1], TM_RNGY_BITS) << TM_RNGY_BITS) | coef(tm.range_y[0], TM_RNGY_BITS),
        ));
        out.push(ExtraReg::new(
            offset(TM_COEF),
            (coef(tm.coef[2], TM_COEF_BITS) << (2 * TM_COEF_BITS))
                | (coef(tm.coef[1], TM_COEF_BITS) << TM_COEF_BITS)
                | coef(tm.coef[0], TM_COEF_BITS),
        ));
    }

    out.push(ExtraReg::new(MOD_CTRL + slot * SET_STRIDE, mod_ctrl));
    Ok(())
}

/// Append the registers of every enabled library slot to `out`.
///
/// Returns the number of registers appended; zero when no slot is enabled. A table whose
/// length does not match its stage fails and leaves `out` as it was.
pub fn pack_library(library: &HdrLibrary, out: &mut Vec<ExtraReg>) -> G2dResult<usize> {
    let start = out.len();
    for (slot, set) in library.sets().iter().enumerate() {
        if set.is_enabled() {
            pack_set(out, set, slot as u32).inspect_err(|_| out.truncate(start))?;
        }
    }

    if out.len() == start {
        return Ok(0);
    }
    out.push(ExtraReg::new(COM_CTRL, 1));
    Ok(out.len() - start)
}

/// Write the library configuration index of each source into its HDR mode register.
///
/// `premultiplied` has bit `i` set for premultiplied source `i`; those sources are also
/// flagged for demultiply before processing.
pub fn set_layer_hdr_command<'r>(
    library: &HdrLibrary,
    sources: impl IntoIterator<Item = &'r mut [u32]>,
    premultiplied: u32,
) {
    for (i, regs) in sources.into_iter().enumerate() {
        let Some(set) = library.set_for_source(i) else {
            continue;
        };
        regs[SRC_HDRMODE] = set as u32;
        if premultiplied & (1 << i) != 0 {
            regs[SRC_COMMAND] |= LayerCommand::PREMULT_ALPHA.bits();
            regs[SRC_HDRMODE] |= HDRMODE_DEMULT_ALPHA;
        }
    }
}

/// Live HDR pipeline driven by caller-managed LUT data.
///
/// The compositor forwards per-layer and target information, then asks for register writes.
/// When [`HdrWriter::commands`] yields nothing the library coefficients are used instead.
/// Source indices count the synthesized background layer.
pub trait HdrWriter {
    /// Dataspace and mastering luminance of source `index`.
    fn set_layer_static_metadata(
        &mut self,
        _index: usize,
        _dataspace: Dataspace,
        _min_luminance: u32,
        _max_luminance: u32,
    ) {
    }

    /// Pixel format and alpha mode of source `index`.
    fn set_layer_image_info(&mut self, _index: usize, _format: PixelFormat, _premultiplied: bool) {}

    /// Opaque per-layer metadata of source `index`.
    fn set_layer_opaque_data(&mut self, _index: usize, _data: &[u8]) {}

    /// Target dataspace.
    fn set_target_info(&mut self, _dataspace: Dataspace) {}

    /// Luminance range of the target display.
    fn set_target_display_luminance(&mut self, _min: u32, _max: u32) {}

    /// Register writes for the current task.
    fn commands(&mut self) -> G2dResult<Vec<ExtraReg>> {
        Ok(Vec::new())
    }

    /// HDR mode register value for source `index`, if the writer configures it.
    fn layer_hdr_mode(&self, _index: usize) -> Option<u32> {
        None
    }

    /// The device accepted the task built from the last [`HdrWriter::commands`].
    fn complete(&mut self) {}
}

/// Writer without a live pipeline; every task falls back to the library.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHdrWriter;

impl HdrWriter for NoopHdrWriter {}

#[cfg(test)]
#[path = "../../tests/unit/hdr/packer.rs"]
mod tests;
