use crate::{
    foundation::{
        core::{CompositingMode, Rect, Size, Transform, align_up},
        error::{G2dError, G2dResult},
    },
    format::{
        catalog::{FormatCatalog, FormatEntry},
        device::{DATAFORMAT_AFBC, DATAFORMAT_UORDER, DeviceFormat},
    },
    layer::model::{BackgroundColor, Canvas, Image, Layer},
    task::{descriptor::ImageDescriptor, regs::*},
};

const SBWC_BLOCK_WIDTH: u32 = 32;
const SBWC_BLOCK_HEIGHT: u32 = 4;
const SBWC_HEADER_ALIGN: u32 = 16;
const SBWC_PAYLOAD_ALIGN: u32 = 32;

/// Which register set an image is written into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageRole {
    /// Composition target.
    Target,
    /// Source layer.
    Source,
}

/// Header/payload strides and lossy info of a block compressed image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SbwcStrides {
    /// Header stride for both planes.
    pub header: u32,
    /// Payload stride for both planes.
    pub payload: u32,
    /// Lossy block info, zero for lossless layouts.
    pub lossy_info: u32,
}

impl SbwcStrides {
    /// Strides of a lossless layout with `bits` per sample.
    pub fn lossless(width: u32, bits: u32) -> Self {
        let block_bytes = SBWC_BLOCK_WIDTH * SBWC_BLOCK_HEIGHT * bits / 8;
        Self {
            header: align_up(width / SBWC_BLOCK_WIDTH / 2, SBWC_HEADER_ALIGN),
            payload: align_up((width / SBWC_BLOCK_WIDTH) * block_bytes, SBWC_PAYLOAD_ALIGN),
            lossy_info: 0,
        }
    }

    /// Strides of a lossy layout with a fixed budget of `block_bytes` per block.
    pub fn lossy(width: u32, block_bytes: u32) -> Self {
        Self {
            header: 0,
            payload: align_up((width / SBWC_BLOCK_WIDTH) * block_bytes, SBWC_PAYLOAD_ALIGN),
            lossy_info: (block_bytes >> 1) | 1,
        }
    }

    fn write(self, regs: &mut [u32], role: ImageRole) {
        let [yh, ch, yp, cp, info] = match role {
            ImageRole::Target => [
                DST_Y_HEADER_STRIDE,
                DST_C_HEADER_STRIDE,
                DST_Y_PAYLOAD_STRIDE,
                DST_C_PAYLOAD_STRIDE,
                DST_SBWCINFO,
            ],
            ImageRole::Source => [
                SRC_Y_HEADER_STRIDE,
                SRC_C_HEADER_STRIDE,
                SRC_Y_PAYLOAD_STRIDE,
                SRC_C_PAYLOAD_STRIDE,
                SRC_SBWCINFO,
            ],
        };
        regs[yh] = self.header;
        regs[ch] = self.header;
        regs[yp] = self.payload;
        regs[cp] = self.payload;
        regs[info] = self.lossy_info;
    }
}

fn replicate_alpha(alpha: u8) -> u32 {
    u32::from_ne_bytes([alpha; 4])
}

fn blend_op(mode: CompositingMode) -> u32 {
    match mode {
        CompositingMode::Premultiplied => BLEND_SRCOVER,
        CompositingMode::Coverage => BLEND_NONE,
        CompositingMode::None => BLEND_SRCCOPY,
    }
}

fn stacking_command(index: usize, alpha: u8) -> LayerCommand {
    if index == 0 {
        let mut cmd = LayerCommand::OPAQUE;
        if alpha < u8::MAX {
            cmd |= LayerCommand::PREMULT_GLOBALALPHA;
        }
        cmd
    } else {
        LayerCommand::ALPHABLEND
    }
}

fn write_rect(regs: &mut [u32], fields: [usize; 4], rect: Rect) {
    regs[fields[0]] = rect.x;
    regs[fields[1]] = rect.y;
    regs[fields[2]] = rect.right();
    regs[fields[3]] = rect.bottom();
}

const IMG_BOUNDS: [usize; 4] = [IMG_LEFT, IMG_TOP, IMG_RIGHT, IMG_BOTTOM];
const DST_WINDOW: [usize; 4] = [SRC_DSTLEFT, SRC_DSTTOP, SRC_DSTRIGHT, SRC_DSTBOTTOM];

/// Destination window of a layer; a zero-area window covers the canvas.
pub fn resolve_window(target: Rect, canvas: Size) -> Rect {
    if target.is_empty() {
        Rect {
            size: canvas,
            ..target
        }
    } else {
        target
    }
}

/// Rotate register value and the window extent the scaler maps onto.
pub fn encode_transform(transform: Transform, window: Size) -> (u32, Size) {
    let flips = Transform::FLIP_H | Transform::FLIP_V;
    let mut flip = transform & flips;
    let mut rotate = 0;
    let mut window = window;

    if transform.contains(Transform::ROT_90) {
        window = window.swapped();
        rotate |= ROTATEDIR_ROT90CCW;
        if flip.is_empty() || flip == flips {
            flip = flip.symmetric_difference(flips);
        }
    }

    (rotate | (flip.bits() << ROTATEDIR_FLIP_SHIFT), window)
}

/// Per-layer register encoder.
#[derive(Clone, Copy, Debug)]
pub struct LayerEncoder<'a> {
    catalog: &'a FormatCatalog,
}

impl<'a> LayerEncoder<'a> {
    /// Encoder resolving formats through `catalog`.
    pub fn new(catalog: &'a FormatCatalog) -> Self {
        Self { catalog }
    }

    /// Fill the descriptor and image registers shared by targets and sources.
    ///
    /// Bounds cover the whole image; sources override them with their crop.
    pub fn prepare_image(
        &self,
        image: &Image,
        desc: &mut ImageDescriptor,
        regs: &mut [u32],
        role: ImageRole,
    ) -> G2dResult<&'static FormatEntry> {
        desc.reset();

        if let Some(fence) = image.fence {
            desc.flags |= ImageFlags::ACQUIRE_FENCE;
            desc.fence = fence.0;
        }
        if image.protected {
            desc.flags |= ImageFlags::SECURE;
        }

        let entry = self.catalog.map_format(image.format)?;

        if image.format.uses_decoder_stride() {
            desc.flags |= ImageFlags::MFC_STRIDE;
        }

        if !image.buffers.is_empty() {
            let required = entry.plane_count as usize;
            if image.buffers.len() < required {
                tracing::error!(
                    format = ?image.format,
                    required,
                    given = image.buffers.len(),
                    "not enough buffers"
                );
                return Err(G2dError::config(format!(
                    "{:?} requires {required} buffers but {} are given",
                    image.format,
                    image.buffers.len()
                )));
            }
            desc.set_planes(&image.buffers[..required]);
        }

        let dim = image.dimension;
        let mut colormode = entry.device.0;
        if image.uorder {
            colormode |= DATAFORMAT_UORDER;
        }

        let sbwc = entry.device.is_sbwc();
        if image.compressed {
            if entry.device == DeviceFormat::RGB565 {
                colormode = DeviceFormat::BGR565.0;
            }
            colormode |= DATAFORMAT_AFBC;
            regs[IMG_STRIDE] = 0;
        } else if sbwc {
            regs[IMG_STRIDE] = 0;
        } else {
            regs[IMG_STRIDE] = entry.rgb_bytes_per_pixel * dim.width;
        }
        regs[IMG_COLORMODE] = colormode;

        let strides = if !sbwc {
            SbwcStrides::default()
        } else if let Some(block) = image.format.sbwc_lossy_block_bytes() {
            SbwcStrides::lossy(dim.width, block)
        } else {
            let bits = if entry.device.is_10bit() { 10 } else { 8 };
            SbwcStrides::lossless(dim.width, bits)
        };
        strides.write(regs, role);

        write_rect(regs, IMG_BOUNDS, Rect::from_size(dim));
        regs[IMG_WIDTH] = dim.width;
        regs[IMG_HEIGHT] = dim.height;

        Ok(entry)
    }

    /// Encode source layer `index` (0 is the bottom) composited onto a canvas of `canvas` size.
    pub fn prepare_source(
        &self,
        layer: &Layer,
        desc: &mut ImageDescriptor,
        regs: &mut [u32],
        canvas: Size,
        index: usize,
    ) -> G2dResult<()> {
        if let Some(color) = layer.solid_color {
            prepare_solid_layer(layer, color, desc, regs, canvas, index);
            return Ok(());
        }

        self.prepare_image(&layer.image, desc, regs, ImageRole::Source)?;

        regs[SRC_SELECT] = 0;

        let crop = layer.crop;
        write_rect(regs, IMG_BOUNDS, crop);
        if layer.image.compressed {
            regs[IMG_RIGHT] = regs[IMG_RIGHT].saturating_sub(1);
            regs[IMG_BOTTOM] = regs[IMG_BOTTOM].saturating_sub(1);
        }

        let window = resolve_window(layer.target, canvas);
        write_rect(regs, DST_WINDOW, window);
        if window.is_empty() || crop.is_empty() {
            return Err(G2dError::config(format!(
                "layer {index} maps {}x{} onto {}x{}",
                crop.size.width, crop.size.height, window.size.width, window.size.height
            )));
        }

        let (rotate, scaled_to) = encode_transform(layer.transform, window.size);
        regs[SRC_ROTATE] = rotate;

        let (Some(xscale), Some(yscale)) = (
            scale_factor(crop.size.width, scaled_to.width),
            scale_factor(crop.size.height, scaled_to.height),
        ) else {
            return Err(G2dError::config(format!(
                "layer {index} scales {}x{} to {}x{}, beyond the scaler range",
                crop.size.width, crop.size.height, scaled_to.width, scaled_to.height
            )));
        };
        regs[SRC_XSCALE] = xscale;
        regs[SRC_YSCALE] = yscale;
        regs[SRC_SCALECONTROL] =
            if regs[SRC_XSCALE] != UNITY_SCALE || regs[SRC_YSCALE] != UNITY_SCALE {
                SCALECONTROL_BILINEAR
            } else {
                0
            };
        regs[SRC_XPHASE] = 0;
        regs[SRC_YPHASE] = 0;

        regs[SRC_ALPHA] = replicate_alpha(layer.plane_alpha);
        regs[SRC_BLEND] = blend_op(layer.compositing);
        if layer.compositing == CompositingMode::None {
            let mode = DeviceFormat(regs[IMG_COLORMODE]);
            if mode.carries_alpha() {
                regs[IMG_COLORMODE] = mode.with_opaque_alpha().0;
            }
        }

        regs[SRC_COMMAND] =
            (LayerCommand::VALID | stacking_command(index, layer.plane_alpha)).bits();
        regs[SRC_YCBCRMODE] = 0;
        regs[SRC_HDRMODE] = 0;

        Ok(())
    }

    /// Encode the synthesized background layer filling the whole canvas.
    pub fn prepare_background(
        &self,
        canvas: &Canvas,
        color: BackgroundColor,
        desc: &mut ImageDescriptor,
        regs: &mut [u32],
    ) {
        let dim = canvas.image.dimension;
        set_solid_layer(desc, regs, dim);

        regs[SRC_COLOR] = color.to_argb8888();
        write_rect(regs, IMG_BOUNDS, Rect::from_size(dim));
        write_rect(regs, DST_WINDOW, Rect::from_size(dim));
        regs[SRC_ALPHA] = 0;
        regs[SRC_BLEND] = BLEND_NONE;
    }
}

fn set_solid_layer(desc: &mut ImageDescriptor, regs: &mut [u32], dim: Size) {
    desc.reset();
    desc.flags = ImageFlags::COLORFILL;

    regs[IMG_COLORMODE] = DeviceFormat::ARGB8888.0;
    regs[IMG_STRIDE] = 4 * dim.width;
    regs[IMG_WIDTH] = dim.width;
    regs[IMG_HEIGHT] = dim.height;

    regs[SRC_SELECT] = LAYERSEL_COLORFILL;
    regs[SRC_COMMAND] = LayerCommand::VALID.bits();
    regs[SRC_ROTATE] = 0;
    regs[SRC_SCALECONTROL] = 0;
    regs[SRC_XSCALE] = UNITY_SCALE;
    regs[SRC_YSCALE] = UNITY_SCALE;
    regs[SRC_XPHASE] = 0;
    regs[SRC_YPHASE] = 0;
    regs[SRC_YCBCRMODE] = 0;
    regs[SRC_HDRMODE] = 0;
    SbwcStrides::default().write(regs, ImageRole::Source);
}

fn prepare_solid_layer(
    layer: &Layer,
    color: u32,
    desc: &mut ImageDescriptor,
    regs: &mut [u32],
    canvas: Size,
    index: usize,
) {
    set_solid_layer(desc, regs, layer.image.dimension);

    regs[SRC_COLOR] = color;
    write_rect(regs, IMG_BOUNDS, layer.crop);
    write_rect(regs, DST_WINDOW, resolve_window(layer.target, canvas));

    regs[SRC_ALPHA] = replicate_alpha(layer.plane_alpha);
    regs[SRC_BLEND] = blend_op(layer.compositing);
    regs[SRC_COMMAND] |= stacking_command(index, layer.plane_alpha).bits();
}

#[cfg(test)]
#[path = "../../tests/unit/layer/encoder.rs"]
mod tests;
