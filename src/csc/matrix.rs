use crate::{
    foundation::{
        core::{ColorStandard, Dataspace},
        error::{G2dError, G2dResult},
    },
    format::device::DeviceFormat,
    task::regs::{ExtraReg, YCBCRMODE_DITHER, YCBCRMODE_WIDE},
};

/// Registers per matrix.
pub const MATRIX_REGISTER_COUNT: usize = 9;
/// Source matrix slots available to one task.
pub const MAX_SOURCE_MATRICES: usize = 4;

const MATRIX_BYTES: u32 = (MATRIX_REGISTER_COUNT * 4) as u32;
const SRC_MATRIX_BASE: u32 = 0x2000;
const DST_MATRIX_BASE: u32 = 0x2100;

/// Color standards with their own coefficient rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatrixStandard {
    /// BT.601.
    Bt601 = 0,
    /// BT.709.
    Bt709 = 1,
    /// BT.2020.
    Bt2020 = 2,
    /// DCI-P3.
    DciP3 = 3,
}

impl MatrixStandard {
    /// Coefficient family used for a dataspace standard, if any.
    pub fn for_standard(standard: ColorStandard) -> Option<Self> {
        use ColorStandard::*;
        match standard {
            Unspecified | Bt709 | Film => Some(Self::Bt709),
            Bt601_625 | Bt601_625Unadjusted | Bt601_525 | Bt601_525Unadjusted => Some(Self::Bt601),
            Bt2020 | Bt2020ConstantLuminance => Some(Self::Bt2020),
            DciP3 => Some(Self::DciP3),
            Bt470M | AdobeRgb => None,
        }
    }
}

/// Row of the coefficient tables: standard times two plus one for full range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatrixIndex(usize);

impl MatrixIndex {
    /// Resolve the row for `dataspace`.
    pub fn for_dataspace(dataspace: Dataspace) -> G2dResult<Self> {
        let standard = dataspace
            .standard()
            .and_then(MatrixStandard::for_standard)
            .ok_or_else(|| {
                tracing::error!(dataspace = dataspace.0, "no CSC matrix for dataspace");
                G2dError::UnsupportedDataspace { dataspace }
            })?;
        Ok(Self(standard as usize * 2 + usize::from(dataspace.is_full_range())))
    }

    /// Table row.
    pub fn row(self) -> usize {
        self.0
    }
}

type Matrix = [u16; MATRIX_REGISTER_COUNT];

static YCBCR_TO_RGB: [Matrix; 8] = [
    [0x0254, 0x0000, 0x0331, 0x0254, 0xFF37, 0xFE60, 0x0254, 0x0409, 0x0000],
    [0x0200, 0x0000, 0x02BE, 0x0200, 0xFF54, 0xFE9B, 0x0200, 0x0377, 0x0000],
    [0x0254, 0x0000, 0x0396, 0x0254, 0xFF93, 0xFEEF, 0x0254, 0x043A, 0x0000],
    [0x0200, 0x0000, 0x0314, 0x0200, 0xFFA2, 0xFF16, 0x0200, 0x03A1, 0x0000],
    [0x0254, 0x0000, 0x035B, 0x0254, 0xFFA0, 0xFEB3, 0x0254, 0x0449, 0x0000],
    [0x0200, 0x0000, 0x02E2, 0x0200, 0xFFAE, 0xFEE2, 0x0200, 0x03AE, 0x0000],
    [0x0254, 0x0000, 0x03AE, 0x0254, 0xFF96, 0xFEEE, 0x0254, 0x0456, 0x0000],
    [0x0200, 0x0000, 0x0329, 0x0200, 0xFFA5, 0xFF15, 0x0200, 0x03B9, 0x0000],
];

// DCI-P3 has a single full-range encoding matrix.
static RGB_TO_YCBCR: [Matrix; 8] = [
    [0x0083, 0x0102, 0x0032, 0xFFB4, 0xFF6B, 0x00E1, 0x00E1, 0xFF44, 0xFFDB],
    [0x0099, 0x012D, 0x003A, 0xFFA8, 0xFF53, 0x0106, 0x0106, 0xFF25, 0xFFD5],
    [0x005D, 0x013A, 0x0020, 0xFFCC, 0xFF53, 0x00E1, 0x00E1, 0xFF34, 0xFFEB],
    [0x006D, 0x016E, 0x0025, 0xFFC4, 0xFF36, 0x0106, 0x0106, 0xFF12, 0xFFE8],
    [0x0074, 0x012A, 0x001A, 0xFFC1, 0xFF5A, 0x00E1, 0x00E1, 0xFF31, 0xFFEE],
    [0x0087, 0x015B, 0x001E, 0xFFB7, 0xFF43, 0x0106, 0x0106, 0xFF0F, 0xFFEB],
    [0x006B, 0x0171, 0x0023, 0xFFC6, 0xFF3A, 0x0100, 0x0100, 0xFF16, 0xFFEA],
    [0x006B, 0x0171, 0x0023, 0xFFC6, 0xFF3A, 0x0100, 0x0100, 0xFF16, 0xFFEA],
];

/// Per-task cache of color conversion matrices.
///
/// Each distinct (standard, range) pair among YCbCr sources gets one slot, in order of first
/// use. A YCbCr target reserves an extra encoding matrix written ahead of the source slots.
#[derive(Clone, Debug, Default)]
pub struct CscMatrixWriter {
    target: Option<MatrixIndex>,
    slots: Vec<MatrixIndex>,
}

impl CscMatrixWriter {
    /// Start a task whose target has color mode `format` and tag `dataspace`.
    ///
    /// Returns the writer and the target's YCbCr mode bits.
    pub fn for_target(format: DeviceFormat, dataspace: Dataspace) -> G2dResult<(Self, u32)> {
        let mut writer = Self::default();
        let mut mode = 0;
        if format.is_ycbcr() {
            writer.target = Some(MatrixIndex::for_dataspace(dataspace)?);
            if dataspace.is_full_range() {
                mode = YCBCRMODE_WIDE;
            }
        }
        Ok((writer, mode))
    }

    /// Assign a slot to a source with color mode `format` and tag `dataspace`.
    ///
    /// Returns the source's YCbCr mode register value; RGB sources get zero.
    pub fn configure(&mut self, format: DeviceFormat, dataspace: Dataspace) -> G2dResult<u32> {
        if !format.is_ycbcr() {
            return Ok(0);
        }

        let index = MatrixIndex::for_dataspace(dataspace)?;
        let mut mode = if dataspace.is_full_range() {
            YCBCRMODE_WIDE
        } else {
            0
        };
        if format.is_8p2() {
            mode |= YCBCRMODE_DITHER;
        }

        let slot = match self.slots.iter().position(|&m| m == index) {
            Some(slot) => slot,
            None if self.slots.len() == MAX_SOURCE_MATRICES => {
                tracing::error!("too many CSC requirements");
                return Err(G2dError::CscExhausted {
                    max: MAX_SOURCE_MATRICES,
                });
            }
            None => {
                self.slots.push(index);
                self.slots.len() - 1
            }
        };

        Ok(mode | slot as u32)
    }

    /// Source slots in use.
    pub fn slots(&self) -> &[MatrixIndex] {
        &self.slots
    }

    /// Whether a target encoding matrix is reserved.
    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Number of registers [`CscMatrixWriter::write`] appends.
    pub fn register_count(&self) -> usize {
        (self.slots.len() + usize::from(self.target.is_some())) * MATRIX_REGISTER_COUNT
    }

    /// Append the target matrix, then every source slot, to `out`.
    pub fn write(&self, out: &mut Vec<ExtraReg>) -> usize {
        let start = out.len();
        if let Some(target) = self.target {
            write_matrix(out, DST_MATRIX_BASE, &RGB_TO_YCBCR[target.row()]);
        }
        for (m, index) in self.slots.iter().enumerate() {
            write_matrix(
                out,
                SRC_MATRIX_BASE + m as u32 * MATRIX_BYTES,
                &YCBCR_TO_RGB[index.row()],
            );
        }
        out.len() - start
    }
}

fn write_matrix(out: &mut Vec<ExtraReg>, base: u32, matrix: &Matrix) {
    out.extend(
        matrix
            .iter()
            .zip((base..).step_by(4))
            .map(|(&v, offset)| ExtraReg::new(offset, u32::from(v))),
    );
}

#[cfg(test)]
#[path = "../../tests/unit/csc/matrix.rs"]
mod tests;
