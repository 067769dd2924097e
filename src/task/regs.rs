//! Register field indices of the per-image command buffers and the bit values written into them.
//!
//! Source and target buffers share the leading image fields; the remaining indices are
//! specific to each buffer kind.

use serde::{Deserialize, Serialize};

/// Stride in bytes of the first plane.
pub const IMG_STRIDE: usize = 0;
/// Color mode ([`crate::DeviceFormat`]).
pub const IMG_COLORMODE: usize = 1;
/// Image bound, left.
pub const IMG_LEFT: usize = 2;
/// Image bound, top.
pub const IMG_TOP: usize = 3;
/// Image bound, right (exclusive).
pub const IMG_RIGHT: usize = 4;
/// Image bound, bottom (exclusive).
pub const IMG_BOTTOM: usize = 5;
/// Image width.
pub const IMG_WIDTH: usize = 6;
/// Image height.
pub const IMG_HEIGHT: usize = 7;

/// Layer command ([`LayerCommand`]).
pub const SRC_COMMAND: usize = 8;
/// Layer input select.
pub const SRC_SELECT: usize = 9;
/// Rotation and flip.
pub const SRC_ROTATE: usize = 10;
/// Destination window, left.
pub const SRC_DSTLEFT: usize = 11;
/// Destination window, top.
pub const SRC_DSTTOP: usize = 12;
/// Destination window, right (exclusive).
pub const SRC_DSTRIGHT: usize = 13;
/// Destination window, bottom (exclusive).
pub const SRC_DSTBOTTOM: usize = 14;
/// Scaler filter control.
pub const SRC_SCALECONTROL: usize = 15;
/// Horizontal scale factor.
pub const SRC_XSCALE: usize = 16;
/// Vertical scale factor.
pub const SRC_YSCALE: usize = 17;
/// Horizontal initial phase.
pub const SRC_XPHASE: usize = 18;
/// Vertical initial phase.
pub const SRC_YPHASE: usize = 19;
/// Solid fill color, ARGB8888.
pub const SRC_COLOR: usize = 20;
/// Plane alpha replicated to four channels.
pub const SRC_ALPHA: usize = 21;
/// Blend operation.
pub const SRC_BLEND: usize = 22;
/// YCbCr decode mode and CSC matrix index.
pub const SRC_YCBCRMODE: usize = 23;
/// HDR configuration index.
pub const SRC_HDRMODE: usize = 24;
/// Luma header stride of block compressed images.
pub const SRC_Y_HEADER_STRIDE: usize = 25;
/// Chroma header stride of block compressed images.
pub const SRC_C_HEADER_STRIDE: usize = 26;
/// Luma payload stride of block compressed images.
pub const SRC_Y_PAYLOAD_STRIDE: usize = 27;
/// Chroma payload stride of block compressed images.
pub const SRC_C_PAYLOAD_STRIDE: usize = 28;
/// Lossy block compression info.
pub const SRC_SBWCINFO: usize = 29;
/// Number of source fields.
pub const SRC_FIELD_COUNT: usize = 30;

/// YCbCr encode mode of the target.
pub const DST_YCBCRMODE: usize = 8;
/// Luma header stride of a block compressed target.
pub const DST_Y_HEADER_STRIDE: usize = 9;
/// Chroma header stride of a block compressed target.
pub const DST_C_HEADER_STRIDE: usize = 10;
/// Luma payload stride of a block compressed target.
pub const DST_Y_PAYLOAD_STRIDE: usize = 11;
/// Chroma payload stride of a block compressed target.
pub const DST_C_PAYLOAD_STRIDE: usize = 12;
/// Lossy block compression info of the target.
pub const DST_SBWCINFO: usize = 13;
/// Number of target fields.
pub const DST_FIELD_COUNT: usize = 14;

/// Upper bound of source images in one task.
pub const MAX_IMAGES: usize = 16;

/// Fractional bits of the scale factor registers.
pub const SCALEFACTOR_FRACBITS: u32 = 16;

/// Input select value for a solid color fill.
pub const LAYERSEL_COLORFILL: u32 = 1;

/// Rotate 90 degrees counter-clockwise.
pub const ROTATEDIR_ROT90CCW: u32 = 1;
/// Shift of the flip bits in the rotate register.
pub const ROTATEDIR_FLIP_SHIFT: u32 = 4;

/// Bilinear scaling filter.
pub const SCALECONTROL_BILINEAR: u32 = 1;

/// No blending.
pub const BLEND_NONE: u32 = 0;
/// Source replaces destination.
pub const BLEND_SRCCOPY: u32 = 1;
/// Porter-Duff source-over.
pub const BLEND_SRCOVER: u32 = 2;

/// Full range YCbCr.
pub const YCBCRMODE_WIDE: u32 = 1 << 4;
/// Horizontal chroma siting offset.
pub const YCBCRMODE_OFFX: u32 = 1 << 8;
/// Vertical chroma siting offset.
pub const YCBCRMODE_OFFY: u32 = 1 << 9;
/// Dither 8-bit planes.
pub const YCBCRMODE_DITHER: u32 = 1 << 12;

/// Demultiply alpha before HDR processing.
pub const HDRMODE_DEMULT_ALPHA: u32 = 1 << 12;

/// Scale factor register value for a `from -> to` mapping.
///
/// `None` when `to` is zero or the ratio does not fit the register.
pub fn scale_factor(from: u32, to: u32) -> Option<u32> {
    let factor = (u64::from(from) << SCALEFACTOR_FRACBITS).checked_div(u64::from(to))?;
    u32::try_from(factor).ok()
}

/// Scale factor for an unscaled axis.
pub const UNITY_SCALE: u32 = 1 << SCALEFACTOR_FRACBITS;

bitflags::bitflags! {
    /// Per-layer command register bits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LayerCommand: u32 {
        /// Layer takes part in composition.
        const VALID = 1 << 0;
        /// Blend with the layers below.
        const ALPHABLEND = 1 << 1;
        /// Image colors are premultiplied.
        const PREMULT_ALPHA = 1 << 2;
        /// Premultiply by plane alpha on an opaque layer.
        const PREMULT_GLOBALALPHA = 1 << 3;
        /// Treat the layer as opaque.
        const OPAQUE = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Image descriptor flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ImageFlags: u32 {
        /// Wait on the acquire fence before reading or writing.
        const ACQUIRE_FENCE = 1 << 1;
        /// Buffer lives in protected memory.
        const SECURE = 1 << 2;
        /// Layer is a solid color fill without a buffer.
        const COLORFILL = 1 << 3;
        /// Planes use the video decoder's stride alignment.
        const MFC_STRIDE = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Task descriptor flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TaskFlags: u32 {
        /// Target is consumed on the fly by the display controller.
        const HWFC = 1 << 0;
        /// Return before the composition completes.
        const NONBLOCK = 1 << 1;
        /// Set by the device when composition failed.
        const ERROR = 1 << 4;
    }
}

/// Register write carried in the extra register stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraReg {
    /// Register offset in the device's address space.
    pub offset: u32,
    /// Value written.
    pub value: u32,
}

impl ExtraReg {
    /// Create a register write.
    pub const fn new(offset: u32, value: u32) -> Self {
        Self { offset, value }
    }
}
