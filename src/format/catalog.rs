use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{G2dError, G2dResult},
    format::device::DeviceFormat,
};

/// Generic pixel format identifiers handed over by the window-compositing framework.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PixelFormat {
    /// 32-bit RGBA.
    Rgba8888,
    /// 32-bit BGRA.
    Bgra8888,
    /// 32-bit RGB, alpha ignored.
    Rgbx8888,
    /// 10-bit RGB, 2-bit alpha.
    Rgba1010102,
    /// 24-bit RGB.
    Rgb888,
    /// 16-bit RGB.
    Rgb565,
    /// Three-plane 4:2:0 in one buffer, V before U.
    Yv12,
    /// Three-plane 4:2:0, one buffer per plane.
    Yv12M,
    /// Semi-planar 4:2:0 CrCb in one buffer.
    YCrCb420Sp,
    /// Semi-planar 4:2:0 CrCb, one buffer per plane.
    YCrCb420SpM,
    /// Semi-planar 4:2:0 CrCb, one buffer per plane, full range.
    YCrCb420SpMFull,
    /// Semi-planar 4:2:0 CbCr in one buffer.
    YCbCr420Sp,
    /// Semi-planar 4:2:0 CbCr, one buffer per plane.
    YCbCr420SpM,
    /// Semi-planar 4:2:0 CbCr, decoder-aligned single buffer.
    YCbCr420Spn,
    /// 8+2 semi-planar, decoder-aligned single buffer.
    YCbCr420SpnS10b,
    /// 8+2 semi-planar, one buffer per plane.
    YCbCr420SpMS10b,
    /// P010 in one buffer.
    YCbCrP010,
    /// P010, one buffer per plane.
    YCbCrP010M,
    /// Interleaved 4:2:2 YUYV.
    YCbCr422I,
    /// Interleaved 4:2:2 YVYU.
    YCrCb422I,
    /// Semi-planar 4:2:2.
    YCbCr422Sp,
    /// Block compressed 8-bit NV12, one buffer per plane.
    YCbCr420SpMSbwc,
    /// Block compressed 8-bit NV12, single buffer.
    YCbCr420SpnSbwc,
    /// Block compressed 10-bit NV12, one buffer per plane.
    YCbCr420SpM10bSbwc,
    /// Block compressed 10-bit NV12, single buffer.
    YCbCr420Spn10bSbwc,
    /// Block compressed 8-bit NV21, one buffer per plane.
    YCrCb420SpMSbwc,
    /// Block compressed 10-bit NV21, one buffer per plane.
    YCrCb420SpM10bSbwc,
    /// Lossy block compressed 8-bit NV12 at 50%.
    YCbCr420SpMSbwcL50,
    /// Lossy block compressed 10-bit NV12 at 40%.
    YCbCr420SpM10bSbwcL40,
    /// Lossy block compressed 10-bit NV12 at 80%.
    YCbCr420SpM10bSbwcL80,
}

impl PixelFormat {
    /// Formats laid out with the video decoder's stride alignment.
    pub fn uses_decoder_stride(self) -> bool {
        use PixelFormat::*;
        matches!(
            self,
            YCbCr420Spn
                | YCbCr420SpnS10b
                | YCbCr420SpMS10b
                | YCbCr420SpMSbwc
                | YCbCr420SpnSbwc
                | YCbCr420SpM10bSbwc
                | YCbCr420Spn10bSbwc
                | YCrCb420SpMSbwc
                | YCrCb420SpM10bSbwc
        )
    }

    /// Fixed per-block byte budget of lossy block compressed formats.
    pub fn sbwc_lossy_block_bytes(self) -> Option<u32> {
        match self {
            Self::YCbCr420SpMSbwcL50 | Self::YCbCr420SpM10bSbwcL40 => Some(64),
            Self::YCbCr420SpM10bSbwcL80 => Some(128),
            _ => None,
        }
    }

    /// Average bits per pixel, used for bandwidth estimation.
    pub fn bits_per_pixel(self) -> u32 {
        use PixelFormat::*;
        match self {
            Rgba8888 | Bgra8888 | Rgbx8888 | Rgba1010102 => 32,
            Rgb888 => 24,
            Rgb565 | YCbCr422I | YCrCb422I | YCbCr422Sp => 16,
            YCbCr420SpnS10b | YCbCr420SpMS10b => 15,
            YCbCrP010 | YCbCrP010M => 24,
            Yv12 | Yv12M | YCrCb420Sp | YCrCb420SpM | YCrCb420SpMFull | YCbCr420Sp
            | YCbCr420SpM | YCbCr420Spn => 12,
            YCbCr420SpMSbwc | YCbCr420SpnSbwc | YCrCb420SpMSbwc | YCbCr420SpMSbwcL50 => 12,
            YCbCr420SpM10bSbwc | YCbCr420Spn10bSbwc | YCrCb420SpM10bSbwc
            | YCbCr420SpM10bSbwcL40 | YCbCr420SpM10bSbwcL80 => 15,
        }
    }
}

/// Hardware generation selecting one of the format table variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HwGeneration {
    /// First generation: no block compressed formats.
    Gen1,
    /// Second generation: renumbered 10-bit codes plus block compressed formats.
    #[default]
    Gen2,
}

/// One row of a format table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatEntry {
    /// Generic format.
    pub format: PixelFormat,
    /// Accelerator color mode.
    pub device: DeviceFormat,
    /// Number of buffers the image must provide.
    pub plane_count: u32,
    /// Bytes per pixel for packed RGB, zero otherwise.
    pub rgb_bytes_per_pixel: u32,
}

const fn entry(
    format: PixelFormat,
    device: DeviceFormat,
    plane_count: u32,
    rgb_bytes_per_pixel: u32,
) -> FormatEntry {
    FormatEntry {
        format,
        device,
        plane_count,
        rgb_bytes_per_pixel,
    }
}

use PixelFormat as P;

static GEN1_FORMATS: &[FormatEntry] = &[
    entry(P::Rgba8888, DeviceFormat::ABGR8888, 1, 4),
    entry(P::Bgra8888, DeviceFormat::ARGB8888, 1, 4),
    entry(P::Rgbx8888, DeviceFormat::XBGR8888, 1, 4),
    entry(P::Rgba1010102, DeviceFormat::ABGR2101010, 1, 4),
    entry(P::Rgb888, DeviceFormat::RGB888, 1, 3),
    entry(P::Rgb565, DeviceFormat::RGB565, 1, 2),
    entry(P::Yv12, DeviceFormat::YV12, 1, 0),
    entry(P::Yv12M, DeviceFormat::YV12, 3, 0),
    entry(P::YCrCb420Sp, DeviceFormat::NV21, 1, 0),
    entry(P::YCrCb420SpM, DeviceFormat::NV21, 2, 0),
    entry(P::YCrCb420SpMFull, DeviceFormat::NV21, 2, 0),
    entry(P::YCbCr420Sp, DeviceFormat::NV12, 1, 0),
    entry(P::YCbCr420SpM, DeviceFormat::NV12, 2, 0),
    entry(P::YCbCr420Spn, DeviceFormat::NV12, 1, 0),
    entry(P::YCbCr420SpnS10b, DeviceFormat::NV12_82_GEN1, 1, 0),
    entry(P::YCbCr420SpMS10b, DeviceFormat::NV12_82_GEN1, 2, 0),
    entry(P::YCbCrP010, DeviceFormat::NV12_P010_GEN1, 1, 0),
    entry(P::YCbCrP010M, DeviceFormat::NV12_P010_GEN1, 2, 0),
    entry(P::YCbCr422I, DeviceFormat::YUYV, 1, 0),
    entry(P::YCrCb422I, DeviceFormat::YVYU, 1, 0),
    entry(P::YCbCr422Sp, DeviceFormat::NV16, 1, 0),
];

static GEN2_FORMATS: &[FormatEntry] = &[
    entry(P::Rgba8888, DeviceFormat::ABGR8888, 1, 4),
    entry(P::Bgra8888, DeviceFormat::ARGB8888, 1, 4),
    entry(P::Rgbx8888, DeviceFormat::XBGR8888, 1, 4),
    entry(P::Rgba1010102, DeviceFormat::ABGR2101010, 1, 4),
    entry(P::Rgb888, DeviceFormat::RGB888, 1, 3),
    entry(P::Rgb565, DeviceFormat::RGB565, 1, 2),
    entry(P::Yv12, DeviceFormat::YV12, 1, 0),
    entry(P::Yv12M, DeviceFormat::YV12, 3, 0),
    entry(P::YCrCb420Sp, DeviceFormat::NV21, 1, 0),
    entry(P::YCrCb420SpM, DeviceFormat::NV21, 2, 0),
    entry(P::YCrCb420SpMFull, DeviceFormat::NV21, 2, 0),
    entry(P::YCbCr420Sp, DeviceFormat::NV12, 1, 0),
    entry(P::YCbCr420SpM, DeviceFormat::NV12, 2, 0),
    entry(P::YCbCr420Spn, DeviceFormat::NV12, 1, 0),
    entry(P::YCbCr420SpnS10b, DeviceFormat::NV12_82_GEN2, 1, 0),
    entry(P::YCbCr420SpMS10b, DeviceFormat::NV12_82_GEN2, 2, 0),
    entry(P::YCbCrP010, DeviceFormat::NV12_P010_GEN2, 1, 0),
    entry(P::YCbCrP010M, DeviceFormat::NV12_P010_GEN2, 2, 0),
    entry(P::YCbCr422I, DeviceFormat::YUYV, 1, 0),
    entry(P::YCrCb422I, DeviceFormat::YVYU, 1, 0),
    entry(P::YCbCr422Sp, DeviceFormat::NV16, 1, 0),
    entry(P::YCbCr420SpMSbwc, DeviceFormat::NV12_SBWC, 2, 0),
    entry(P::YCbCr420SpnSbwc, DeviceFormat::NV12_SBWC, 1, 0),
    entry(P::YCbCr420SpM10bSbwc, DeviceFormat::NV12_SBWC_10B, 2, 0),
    entry(P::YCbCr420Spn10bSbwc, DeviceFormat::NV12_SBWC_10B, 1, 0),
    entry(P::YCrCb420SpMSbwc, DeviceFormat::NV21_SBWC, 2, 0),
    entry(P::YCrCb420SpM10bSbwc, DeviceFormat::NV21_SBWC_10B, 2, 0),
    entry(P::YCbCr420SpMSbwcL50, DeviceFormat::NV12_SBWC, 2, 0),
    entry(P::YCbCr420SpM10bSbwcL40, DeviceFormat::NV12_SBWC_10B, 2, 0),
    entry(P::YCbCr420SpM10bSbwcL80, DeviceFormat::NV12_SBWC_10B, 2, 0),
];

/// Generic-to-device format mapping for one hardware generation.
#[derive(Clone, Copy, Debug)]
pub struct FormatCatalog {
    generation: HwGeneration,
    entries: &'static [FormatEntry],
}

impl FormatCatalog {
    /// Select the table for `generation`.
    pub fn new(generation: HwGeneration) -> Self {
        let entries = match generation {
            HwGeneration::Gen1 => GEN1_FORMATS,
            HwGeneration::Gen2 => GEN2_FORMATS,
        };
        Self {
            generation,
            entries,
        }
    }

    /// Hardware generation this catalog was built for.
    pub fn generation(&self) -> HwGeneration {
        self.generation
    }

    /// All supported formats.
    pub fn entries(&self) -> &'static [FormatEntry] {
        self.entries
    }

    /// Look up a format, returning `None` when the accelerator cannot handle it.
    pub fn find(&self, format: PixelFormat) -> Option<&'static FormatEntry> {
        self.entries.iter().find(|e| e.format == format)
    }

    /// Look up a format, failing the task when it is unmapped.
    pub fn map_format(&self, format: PixelFormat) -> G2dResult<&'static FormatEntry> {
        self.find(format).ok_or_else(|| {
            tracing::error!(?format, generation = ?self.generation, "no device format");
            G2dError::config(format!(
                "pixel format {format:?} is not supported by {:?} hardware",
                self.generation
            ))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/format/catalog.rs"]
mod tests;
