use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    foundation::core::{CompositingMode, Dataspace, Fence, Rect, Size, Transform},
    format::catalog::PixelFormat,
};

/// Memory backing one image plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Buffer {
    /// Shared DMA buffer.
    Dmabuf {
        /// File descriptor.
        fd: i32,
        /// Byte offset of the plane.
        offset: u32,
        /// Plane length in bytes.
        length: u32,
    },
    /// Process virtual address.
    Userptr {
        /// Start address.
        addr: u64,
        /// Plane length in bytes.
        length: u32,
    },
}

/// Up to three planes per image.
pub type Planes = SmallVec<[Buffer; 3]>;

/// Settings shared by the target canvas and source layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Pixel format.
    pub format: PixelFormat,
    /// Full image extent.
    pub dimension: Size,
    /// Backing planes; empty for images without memory.
    #[serde(default)]
    pub buffers: Planes,
    /// Dataspace tag.
    #[serde(default)]
    pub dataspace: Dataspace,
    /// Content is in protected memory.
    #[serde(default)]
    pub protected: bool,
    /// Frame-buffer compressed (AFBC) layout.
    #[serde(default)]
    pub compressed: bool,
    /// U-order tiled layout.
    #[serde(default)]
    pub uorder: bool,
    /// Acquire fence, consumed by a successful or failed submission.
    #[serde(default)]
    pub fence: Option<Fence>,
    /// Settings changed since the last successful submission.
    #[serde(default = "default_true")]
    pub setting_modified: bool,
}

fn default_true() -> bool {
    true
}

impl Image {
    /// Create an image without buffers.
    pub fn new(format: PixelFormat, dimension: Size) -> Self {
        Self {
            format,
            dimension,
            buffers: Planes::new(),
            dataspace: Dataspace::UNKNOWN,
            protected: false,
            compressed: false,
            uorder: false,
            fence: None,
            setting_modified: true,
        }
    }

    /// Attach backing planes.
    pub fn with_buffers(mut self, buffers: impl IntoIterator<Item = Buffer>) -> Self {
        self.buffers = buffers.into_iter().collect();
        self
    }

    /// Set the dataspace tag.
    pub fn with_dataspace(mut self, dataspace: Dataspace) -> Self {
        self.dataspace = dataspace;
        self
    }

    /// Set the acquire fence.
    pub fn with_fence(mut self, fence: Fence) -> Self {
        self.fence = Some(fence);
        self
    }

    pub(crate) fn consume(&mut self) {
        self.fence = None;
        self.setting_modified = false;
    }
}

/// Composition target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    /// Target image.
    #[serde(flatten)]
    pub image: Image,
    /// Output is consumed on the fly by the display controller.
    #[serde(default)]
    pub otf: bool,
}

impl Canvas {
    /// Create a target canvas.
    pub fn new(image: Image) -> Self {
        Self { image, otf: false }
    }
}

/// One source of the composition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Source image.
    #[serde(flatten)]
    pub image: Image,
    /// Region of the image to read.
    pub crop: Rect,
    /// Destination window on the canvas; zero area means the whole canvas.
    #[serde(default)]
    pub target: Rect,
    /// Rotation and flip.
    #[serde(default)]
    pub transform: Transform,
    /// Plane alpha, 255 is opaque.
    #[serde(default = "opaque_alpha")]
    pub plane_alpha: u8,
    /// Blending of this layer over the layers below.
    #[serde(default)]
    pub compositing: CompositingMode,
    /// Fill with an ARGB8888 color instead of reading the image.
    #[serde(default)]
    pub solid_color: Option<u32>,
    /// Stacking order; lower values are composited first.
    #[serde(default)]
    pub z_order: i32,
    /// Minimum mastering display luminance for HDR content.
    #[serde(default)]
    pub min_mastering_luminance: u32,
    /// Maximum mastering display luminance for HDR content.
    #[serde(default)]
    pub max_mastering_luminance: u32,
    /// Opaque per-layer metadata forwarded to the HDR writer.
    #[serde(default)]
    pub layer_data: Option<Vec<u8>>,
}

fn opaque_alpha() -> u8 {
    u8::MAX
}

impl Layer {
    /// Create an opaque layer reading `crop` from `image` into the whole canvas.
    pub fn new(image: Image, crop: Rect) -> Self {
        Self {
            image,
            crop,
            target: Rect::default(),
            transform: Transform::empty(),
            plane_alpha: u8::MAX,
            compositing: CompositingMode::None,
            solid_color: None,
            z_order: 0,
            min_mastering_luminance: 0,
            max_mastering_luminance: 0,
            layer_data: None,
        }
    }

    /// Create a layer covering its whole image.
    pub fn full(image: Image) -> Self {
        let crop = Rect::from_size(image.dimension);
        Self::new(image, crop)
    }

    /// Set the destination window.
    pub fn with_target(mut self, target: Rect) -> Self {
        self.target = target;
        self
    }

    /// Set the transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set plane alpha and compositing mode.
    pub fn with_blend(mut self, plane_alpha: u8, compositing: CompositingMode) -> Self {
        self.plane_alpha = plane_alpha;
        self.compositing = compositing;
        self
    }

    /// Set the stacking order.
    pub fn with_z_order(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    /// Return `true` when the layer is a solid color fill.
    pub fn is_solid_color(&self) -> bool {
        self.solid_color.is_some()
    }
}

/// Background color with 16 bits per channel; only the upper 8 bits reach the hardware.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundColor {
    /// Red.
    pub r: u16,
    /// Green.
    pub g: u16,
    /// Blue.
    pub b: u16,
    /// Alpha.
    pub a: u16,
}

impl BackgroundColor {
    /// Pack into ARGB8888.
    pub fn to_argb8888(self) -> u32 {
        (u32::from(self.a & 0xFF00) << 16)
            | (u32::from(self.r & 0xFF00) << 8)
            | u32::from(self.g & 0xFF00)
            | (u32::from(self.b & 0xFF00) >> 8)
    }
}

/// Everything composited by one task: a target canvas and its source layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Composition target.
    pub canvas: Canvas,
    /// Source layers in any order; sorted by `z_order` before encoding.
    pub layers: Vec<Layer>,
    /// Optional background fill below all layers.
    #[serde(default)]
    pub background: Option<BackgroundColor>,
    /// Target dataspace hint forwarded to the HDR writer.
    #[serde(default)]
    pub target_display_luminance: Option<(u32, u32)>,
}

impl Scene {
    /// Create a scene without layers.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            layers: Vec::new(),
            background: None,
            target_display_luminance: None,
        }
    }

    /// Append a layer.
    pub fn push(&mut self, layer: Layer) -> &mut Self {
        self.layers.push(layer);
        self
    }

    /// Drop every acquire fence; buffers are expired after a failed submission.
    pub fn invalidate_fences(&mut self) {
        self.canvas.image.fence = None;
        for layer in &mut self.layers {
            layer.image.fence = None;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/model.rs"]
mod tests;
