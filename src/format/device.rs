//! Color-mode register encoding understood by the accelerator.
//!
//! Layout of the 32-bit color-mode value:
//!
//! | bits    | field                                               |
//! |---------|-----------------------------------------------------|
//! | 31..16  | channel swizzle, one nibble per channel (A,R,G,B)   |
//! | 12..8   | data format                                         |
//! | 7..4    | layout flags (AFBC, U-order, SBWC, 10-bit)          |
//! | 3..0    | YCbCr component order                               |

use serde::{Deserialize, Serialize};

/// Swizzle field mask.
pub const SWZ_MASK: u32 = 0xFFFF << 16;
/// Alpha nibble of the swizzle field.
pub const SWZ_ALPHA_MASK: u32 = 0xF << 28;
/// Alpha nibble value selecting a constant one.
pub const SWZ_ALPHA_ONE: u32 = 0x6 << 28;

/// Alpha, red, green, blue.
pub const SWZ_ARGB: u32 = 0x3210 << 16;
/// Alpha, blue, green, red.
pub const SWZ_ABGR: u32 = 0x3012 << 16;
/// Constant alpha, red, green, blue.
pub const SWZ_XRGB: u32 = 0x6210 << 16;
/// Constant alpha, blue, green, red.
pub const SWZ_XBGR: u32 = 0x6012 << 16;

/// Data format field mask.
pub const DATAFMT_MASK: u32 = 0x1F << 8;
/// 32-bit RGB with 8-bit channels.
pub const DATAFMT_8888: u32 = 0x00 << 8;
/// 16-bit RGB 5:6:5.
pub const DATAFMT_565: u32 = 0x01 << 8;
/// 24-bit packed RGB.
pub const DATAFMT_888: u32 = 0x03 << 8;
/// 32-bit RGB with 10-bit color channels.
pub const DATAFMT_2101010: u32 = 0x06 << 8;
/// First YCbCr data format.
pub const DATAFMT_YUV_MIN: u32 = 0x10 << 8;
/// 4:2:0 semi-planar.
pub const DATAFMT_YUV420SP: u32 = 0x10 << 8;
/// 4:2:0 three-plane.
pub const DATAFMT_YUV420P: u32 = 0x11 << 8;
/// 4:2:2 interleaved.
pub const DATAFMT_YUV422I: u32 = 0x12 << 8;
/// 4:2:2 semi-planar.
pub const DATAFMT_YUV422SP: u32 = 0x13 << 8;
/// 4:2:0 semi-planar, 8-bit planes followed by 2-bit planes (first generation code).
pub const DATAFMT_YUV420SP82_GEN1: u32 = 0x14 << 8;
/// 4:2:0 semi-planar, 16-bit container per sample (first generation code).
pub const DATAFMT_YUV420SP_P010_GEN1: u32 = 0x15 << 8;
/// 4:2:0 semi-planar, 8+2 layout (second generation code).
pub const DATAFMT_YUV420SP82_GEN2: u32 = 0x16 << 8;
/// 4:2:0 semi-planar, 16-bit container per sample (second generation code).
pub const DATAFMT_YUV420SP_P010_GEN2: u32 = 0x17 << 8;
/// Last YCbCr data format.
pub const DATAFMT_YUV_MAX: u32 = 0x1F << 8;

/// Frame-buffer compressed (AFBC) layout.
pub const DATAFORMAT_AFBC: u32 = 1 << 4;
/// U-order tiling.
pub const DATAFORMAT_UORDER: u32 = 1 << 5;
/// Block compressed header+payload layout.
pub const DATAFORMAT_SBWC: u32 = 1 << 6;
/// Samples carry 10 significant bits.
pub const DATAFORMAT_10BIT: u32 = 1 << 7;

/// Cb before Cr.
pub const YCBCR_ORDER_CBCR: u32 = 0;
/// Cr before Cb.
pub const YCBCR_ORDER_CRCB: u32 = 1;

/// Encoded accelerator color mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceFormat(pub u32);

impl DeviceFormat {
    /// 32-bit RGBA in memory order R,G,B,A.
    pub const ABGR8888: Self = Self(SWZ_ABGR | DATAFMT_8888);
    /// 32-bit RGBA in memory order B,G,R,A.
    pub const ARGB8888: Self = Self(SWZ_ARGB | DATAFMT_8888);
    /// 32-bit RGB with ignored alpha.
    pub const XBGR8888: Self = Self(SWZ_XBGR | DATAFMT_8888);
    /// 10-bit RGB with 2-bit alpha.
    pub const ABGR2101010: Self = Self(SWZ_ABGR | DATAFMT_2101010);
    /// 24-bit RGB.
    pub const RGB888: Self = Self(SWZ_XRGB | DATAFMT_888);
    /// 16-bit RGB.
    pub const RGB565: Self = Self(SWZ_XRGB | DATAFMT_565);
    /// 16-bit RGB with red and blue swapped.
    pub const BGR565: Self = Self(SWZ_XBGR | DATAFMT_565);
    /// Three-plane 4:2:0, V plane first.
    pub const YV12: Self = Self(DATAFMT_YUV420P | YCBCR_ORDER_CRCB);
    /// Semi-planar 4:2:0, CbCr.
    pub const NV12: Self = Self(DATAFMT_YUV420SP | YCBCR_ORDER_CBCR);
    /// Semi-planar 4:2:0, CrCb.
    pub const NV21: Self = Self(DATAFMT_YUV420SP | YCBCR_ORDER_CRCB);
    /// Semi-planar 4:2:2, CbCr.
    pub const NV16: Self = Self(DATAFMT_YUV422SP | YCBCR_ORDER_CBCR);
    /// Interleaved 4:2:2, Y0 Cb Y1 Cr.
    pub const YUYV: Self = Self(DATAFMT_YUV422I | YCBCR_ORDER_CBCR);
    /// Interleaved 4:2:2, Y0 Cr Y1 Cb.
    pub const YVYU: Self = Self(DATAFMT_YUV422I | YCBCR_ORDER_CRCB);
    /// 8+2 semi-planar, first generation encoding.
    pub const NV12_82_GEN1: Self = Self(DATAFMT_YUV420SP82_GEN1 | DATAFORMAT_10BIT);
    /// P010 semi-planar, first generation encoding.
    pub const NV12_P010_GEN1: Self = Self(DATAFMT_YUV420SP_P010_GEN1 | DATAFORMAT_10BIT);
    /// 8+2 semi-planar, second generation encoding.
    pub const NV12_82_GEN2: Self = Self(DATAFMT_YUV420SP82_GEN2 | DATAFORMAT_10BIT);
    /// P010 semi-planar, second generation encoding.
    pub const NV12_P010_GEN2: Self = Self(DATAFMT_YUV420SP_P010_GEN2 | DATAFORMAT_10BIT);
    /// Block compressed NV12, 8-bit.
    pub const NV12_SBWC: Self = Self(Self::NV12.0 | DATAFORMAT_SBWC);
    /// Block compressed NV12, 10-bit.
    pub const NV12_SBWC_10B: Self = Self(Self::NV12.0 | DATAFORMAT_SBWC | DATAFORMAT_10BIT);
    /// Block compressed NV21, 8-bit.
    pub const NV21_SBWC: Self = Self(Self::NV21.0 | DATAFORMAT_SBWC);
    /// Block compressed NV21, 10-bit.
    pub const NV21_SBWC_10B: Self = Self(Self::NV21.0 | DATAFORMAT_SBWC | DATAFORMAT_10BIT);

    /// Data format field.
    pub const fn data_format(self) -> u32 {
        self.0 & DATAFMT_MASK
    }

    /// Return `true` for YCbCr data formats.
    pub const fn is_ycbcr(self) -> bool {
        let f = self.data_format();
        DATAFMT_YUV_MIN <= f && f <= DATAFMT_YUV_MAX
    }

    /// Return `true` for block compressed header+payload layouts.
    pub const fn is_sbwc(self) -> bool {
        self.0 & DATAFORMAT_SBWC != 0
    }

    /// Return `true` when samples carry 10 significant bits.
    pub const fn is_10bit(self) -> bool {
        self.0 & DATAFORMAT_10BIT != 0
    }

    /// Return `true` for the 8+2 layout, whose 8-bit planes are dithered by the producer.
    pub const fn is_8p2(self) -> bool {
        let f = self.data_format();
        f == DATAFMT_YUV420SP82_GEN1 || f == DATAFMT_YUV420SP82_GEN2
    }

    /// Return `true` for RGB formats whose alpha channel is read from memory.
    pub fn carries_alpha(self) -> bool {
        self == Self::ABGR8888 || self == Self::ARGB8888 || self == Self::ABGR2101010
    }

    /// Replace the alpha source with a constant one.
    pub const fn with_opaque_alpha(self) -> Self {
        Self((self.0 & !SWZ_ALPHA_MASK) | SWZ_ALPHA_ONE)
    }
}

impl std::fmt::LowerHex for DeviceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::LowerHex::fmt(&self.0, f)
    }
}
