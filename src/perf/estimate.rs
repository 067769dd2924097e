use serde::{Deserialize, Serialize};

use crate::{
    foundation::{
        core::{Rect, Size, Transform},
        error::{G2dError, G2dResult},
    },
    format::catalog::PixelFormat,
};

/// Frames accepted in one reservation request.
pub const MAX_PERF_FRAMES: usize = 4;
/// Layers accepted per frame.
pub const MAX_PERF_LAYERS: usize = 16;

// Bandwidth is accumulated ×16 (or ×18 when scaling), in bits; the read total is
// normalized by 16 × 8 × 1024.
const READ_SHIFT: u32 = 17;
const WRITE_SHIFT: u32 = 13;

bitflags::bitflags! {
    /// Per-layer attributes reported with a reservation.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LayerAttr: u32 {
        /// Two-plane 4:2:0.
        const YUV2P = 1 << 0;
        /// Two-plane 4:2:0 in 8+2 layout.
        const YUV2P_82 = 1 << 1;
        /// Rotated by 90 degrees.
        const ROTATE = 1 << 2;
        /// Source and target extents differ.
        const SCALING = 1 << 3;
        /// Frame-buffer compressed.
        const COMPRESSED = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Per-frame attributes reported with a reservation.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FrameAttr: u32 {
        /// Two-plane 4:2:0 target.
        const YUV2P = 1 << 0;
        /// A solid background is composited.
        const SOLIDCOLORFILL = 1 << 1;
    }
}

/// One layer of a frame description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceLayer {
    /// Source pixel format.
    pub format: PixelFormat,
    /// Full source image extent.
    #[serde(default)]
    pub source_dimension: Size,
    /// Region read from the source.
    pub source_rect: Rect,
    /// Region written on the target.
    pub target_rect: Rect,
    /// Rotation and flip.
    #[serde(default)]
    pub transform: Transform,
    /// Frame-buffer compressed source.
    #[serde(default)]
    pub compressed: bool,
}

/// One frame to reserve bandwidth for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceFrame {
    /// Source layers.
    pub layers: Vec<PerformanceLayer>,
    /// Target extent.
    pub target_dimension: Size,
    /// Target pixel format.
    pub target_format: PixelFormat,
    /// Frames per second.
    pub frame_rate: u32,
    /// A solid background layer is composited.
    #[serde(default)]
    pub has_background: bool,
}

/// Batch of frames submitted as one reservation. An empty batch cancels.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRequest {
    /// Frames in the batch.
    pub frames: Vec<PerformanceFrame>,
}

/// Per-layer part of a reservation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LayerPerfData {
    /// Source width read.
    pub crop_width: u32,
    /// Source height read.
    pub crop_height: u32,
    /// Target width written.
    pub window_width: u32,
    /// Target height written.
    pub window_height: u32,
    /// Layer attributes.
    pub layer_attr: LayerAttr,
}

/// Per-frame part of a reservation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FramePerfData {
    /// Layers of the frame.
    pub layers: Vec<LayerPerfData>,
    /// Target pixel count.
    pub target_pixelcount: u32,
    /// Frames per second.
    pub frame_rate: u32,
    /// Read bandwidth in KiB/s.
    pub bandwidth_read: u32,
    /// Write bandwidth in KiB/s.
    pub bandwidth_write: u32,
    /// Frame attributes.
    pub frame_attr: FrameAttr,
}

impl FramePerfData {
    /// Number of layers of the frame.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
}

/// Reservation handed to the device; no frames means cancel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PerformanceData {
    /// Frames of the reservation.
    pub frames: Vec<FramePerfData>,
}

impl PerformanceData {
    /// Return `true` for a cancellation.
    pub fn is_cancel(&self) -> bool {
        self.frames.is_empty()
    }
}

fn saturate(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

struct LayerEstimate {
    data: LayerPerfData,
    weighted_bits: u64,
    yuv420: bool,
    rotated: bool,
}

fn estimate_layer(layer: &PerformanceLayer) -> LayerEstimate {
    let src = layer.source_rect.size;
    let dst = layer.target_rect.size;
    let pixelcount = src.area().max(dst.area());
    let bpp = layer.format.bits_per_pixel();

    let mut attr = LayerAttr::empty();
    let yuv420 = match bpp {
        12 => {
            attr |= LayerAttr::YUV2P;
            true
        }
        15 => {
            attr |= LayerAttr::YUV2P_82;
            true
        }
        _ => false,
    };

    let rotated = layer.transform.contains(Transform::ROT_90);
    let scaled_to = if rotated {
        attr |= LayerAttr::ROTATE;
        dst.swapped()
    } else {
        dst
    };

    let bits = pixelcount * u64::from(bpp);
    let weighted_bits = if src != scaled_to {
        attr |= LayerAttr::SCALING;
        bits * 18
    } else {
        bits * 16
    };

    if layer.compressed {
        attr |= LayerAttr::COMPRESSED;
    }

    LayerEstimate {
        data: LayerPerfData {
            crop_width: src.width,
            crop_height: src.height,
            window_width: dst.width,
            window_height: dst.height,
            layer_attr: attr,
        },
        weighted_bits,
        yuv420,
        rotated,
    }
}

/// Bandwidth estimate of one frame.
pub fn estimate_frame(frame: &PerformanceFrame) -> FramePerfData {
    let mut out = FramePerfData {
        frame_rate: frame.frame_rate,
        target_pixelcount: saturate(frame.target_dimension.area()),
        ..FramePerfData::default()
    };

    let mut read_bits = 0u64;
    let mut src_yuv420 = false;
    let mut src_rotate = false;
    for layer in &frame.layers {
        let est = estimate_layer(layer);
        read_bits = read_bits.saturating_add(est.weighted_bits);
        src_yuv420 |= est.yuv420;
        src_rotate |= est.rotated;
        out.layers.push(est.data);
    }

    let fps = u64::from(frame.frame_rate);
    out.bandwidth_read = saturate(read_bits.saturating_mul(fps) >> READ_SHIFT);

    let target_bpp = frame.target_format.bits_per_pixel();
    if target_bpp == 12 {
        out.frame_attr |= FrameAttr::YUV2P;
    }
    let write_bits = frame
        .target_dimension
        .area()
        .saturating_mul(fps)
        .saturating_mul(u64::from(target_bpp));
    let shift = if target_bpp == 12 && src_yuv420 && src_rotate {
        WRITE_SHIFT - 1
    } else {
        WRITE_SHIFT
    };
    out.bandwidth_write = saturate(write_bits >> shift);

    if frame.has_background {
        out.frame_attr |= FrameAttr::SOLIDCOLORFILL;
    }

    tracing::debug!(
        layers = out.num_layers(),
        read = out.bandwidth_read,
        write = out.bandwidth_write,
        fps = frame.frame_rate,
        "estimated frame bandwidth"
    );
    out
}

/// Bandwidth estimate of a whole request.
pub fn estimate(request: &PerformanceRequest) -> G2dResult<PerformanceData> {
    if request.frames.len() > MAX_PERF_FRAMES {
        return Err(G2dError::config(format!(
            "{} frames exceed the reservation limit of {MAX_PERF_FRAMES}",
            request.frames.len()
        )));
    }
    if let Some((i, frame)) = request
        .frames
        .iter()
        .enumerate()
        .find(|(_, f)| f.layers.len() > MAX_PERF_LAYERS)
    {
        return Err(G2dError::config(format!(
            "frame {i} has {} layers, the reservation limit is {MAX_PERF_LAYERS}",
            frame.layers.len()
        )));
    }

    Ok(PerformanceData {
        frames: request.frames.iter().map(estimate_frame).collect(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/perf/estimate.rs"]
mod tests;
