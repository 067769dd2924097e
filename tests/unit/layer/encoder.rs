use super::*;
use crate::{
    format::catalog::{HwGeneration, PixelFormat},
    foundation::core::Fence,
    layer::model::Buffer,
    task::descriptor::BufferType,
};

fn catalog() -> FormatCatalog {
    FormatCatalog::new(HwGeneration::Gen2)
}

fn image(format: PixelFormat, width: u32, height: u32) -> Image {
    Image::new(format, Size::new(width, height))
}

fn source(layer: &Layer, canvas: Size, index: usize) -> (ImageDescriptor, Vec<u32>) {
    let catalog = catalog();
    let mut desc = ImageDescriptor::default();
    let mut regs = vec![0; SRC_FIELD_COUNT];
    LayerEncoder::new(&catalog)
        .prepare_source(layer, &mut desc, &mut regs, canvas, index)
        .unwrap();
    (desc, regs)
}

#[test]
fn unity_and_downscale_factors() {
    let canvas = Size::new(100, 50);
    let layer = Layer::full(image(PixelFormat::Rgba8888, 100, 50));
    let (_, regs) = source(&layer, canvas, 0);
    assert_eq!(regs[SRC_XSCALE], UNITY_SCALE);
    assert_eq!(regs[SRC_YSCALE], UNITY_SCALE);
    assert_eq!(regs[SRC_SCALECONTROL], 0);
    assert_eq!(
        [regs[SRC_DSTLEFT], regs[SRC_DSTTOP], regs[SRC_DSTRIGHT], regs[SRC_DSTBOTTOM]],
        [0, 0, 100, 50]
    );

    let layer = layer.with_target(Rect::new(0, 0, 50, 50));
    let (_, regs) = source(&layer, canvas, 0);
    assert_eq!(regs[SRC_XSCALE], 0x2_0000);
    assert_eq!(regs[SRC_YSCALE], UNITY_SCALE);
    assert_eq!(regs[SRC_SCALECONTROL], SCALECONTROL_BILINEAR);
}

#[test]
fn scale_ratio_beyond_register_range_fails() {
    assert_eq!(scale_factor(65_535, 1), Some(0xFFFF_0000));
    assert_eq!(scale_factor(65_536, 1), None);
    assert_eq!(scale_factor(1, 0), None);

    let catalog = catalog();
    let layer =
        Layer::full(image(PixelFormat::Rgba8888, 70_000, 1)).with_target(Rect::new(0, 0, 1, 1));
    let mut desc = ImageDescriptor::default();
    let mut regs = vec![0; SRC_FIELD_COUNT];
    let err = LayerEncoder::new(&catalog)
        .prepare_source(&layer, &mut desc, &mut regs, Size::new(100, 50), 0)
        .unwrap_err();
    assert!(matches!(err, G2dError::Config(_)));
    assert!(err.to_string().contains("70000x1 to 1x1"));
}

#[test]
fn rotation_inverts_symmetric_flips() {
    let (rot, window) = encode_transform(Transform::ROT_90, Size::new(50, 100));
    assert_eq!(rot, ROTATEDIR_ROT90CCW | (3 << ROTATEDIR_FLIP_SHIFT));
    assert_eq!(window, Size::new(100, 50));

    let (rot, _) = encode_transform(Transform::ROT_270, Size::new(1, 1));
    assert_eq!(rot, ROTATEDIR_ROT90CCW);

    let (rot, _) = encode_transform(Transform::ROT_90 | Transform::FLIP_H, Size::new(1, 1));
    assert_eq!(rot, ROTATEDIR_ROT90CCW | (1 << ROTATEDIR_FLIP_SHIFT));

    let (rot, window) = encode_transform(Transform::FLIP_V, Size::new(4, 2));
    assert_eq!(rot, 2 << ROTATEDIR_FLIP_SHIFT);
    assert_eq!(window, Size::new(4, 2));
}

#[test]
fn rotated_layer_scales_against_swapped_window() {
    let canvas = Size::new(100, 100);
    let layer = Layer::full(image(PixelFormat::Rgba8888, 100, 50))
        .with_target(Rect::new(0, 0, 50, 100))
        .with_transform(Transform::ROT_90);
    let (_, regs) = source(&layer, canvas, 0);
    assert_eq!(regs[SRC_XSCALE], UNITY_SCALE);
    assert_eq!(regs[SRC_YSCALE], UNITY_SCALE);
    assert_eq!(regs[SRC_SCALECONTROL], 0);
}

#[test]
fn lossless_sbwc_target_strides() {
    let catalog = catalog();
    let mut desc = ImageDescriptor::default();
    let mut regs = vec![0; DST_FIELD_COUNT];
    let target = image(PixelFormat::YCbCr420SpM10bSbwc, 1920, 1080);
    let entry = LayerEncoder::new(&catalog)
        .prepare_image(&target, &mut desc, &mut regs, ImageRole::Target)
        .unwrap();
    assert_eq!(entry.device, DeviceFormat::NV12_SBWC_10B);
    assert_eq!(regs[IMG_STRIDE], 0);
    assert_eq!(regs[DST_Y_HEADER_STRIDE], 32);
    assert_eq!(regs[DST_C_HEADER_STRIDE], 32);
    assert_eq!(regs[DST_Y_PAYLOAD_STRIDE], 9600);
    assert_eq!(regs[DST_C_PAYLOAD_STRIDE], 9600);
    assert_eq!(regs[DST_SBWCINFO], 0);
    assert!(desc.flags.contains(ImageFlags::MFC_STRIDE));
}

#[test]
fn lossy_sbwc_strides() {
    let s = SbwcStrides::lossy(1920, 128);
    assert_eq!(s.header, 0);
    assert_eq!(s.payload, 7680);
    assert_eq!(s.lossy_info, 65);

    let s = SbwcStrides::lossless(1920, 8);
    assert_eq!(s.header, 32);
    assert_eq!(s.payload, 60 * 128);
}

#[test]
fn afbc_source_shrinks_bounds_and_swaps_565() {
    let mut img = image(PixelFormat::Rgb565, 64, 32);
    img.compressed = true;
    let (_, regs) = source(&Layer::full(img), Size::new(64, 32), 0);
    assert_eq!(regs[IMG_STRIDE], 0);
    assert_eq!(
        regs[IMG_COLORMODE],
        DeviceFormat::BGR565.0 | DATAFORMAT_AFBC
    );
    assert_eq!([regs[IMG_RIGHT], regs[IMG_BOTTOM]], [63, 31]);
}

#[test]
fn rgb_stride_and_crop_bounds() {
    let layer = Layer::new(image(PixelFormat::Rgb888, 10, 10), Rect::new(2, 3, 4, 5));
    let (_, regs) = source(&layer, Size::new(10, 10), 0);
    assert_eq!(regs[IMG_STRIDE], 30);
    assert_eq!(
        [regs[IMG_LEFT], regs[IMG_TOP], regs[IMG_RIGHT], regs[IMG_BOTTOM]],
        [2, 3, 6, 8]
    );
    assert_eq!([regs[IMG_WIDTH], regs[IMG_HEIGHT]], [10, 10]);
}

#[test]
fn missing_planes_are_rejected() {
    let catalog = catalog();
    let img = image(PixelFormat::Yv12M, 16, 16).with_buffers([
        Buffer::Dmabuf {
            fd: 1,
            offset: 0,
            length: 256,
        },
        Buffer::Dmabuf {
            fd: 2,
            offset: 0,
            length: 64,
        },
    ]);
    let mut desc = ImageDescriptor::default();
    let mut regs = vec![0; SRC_FIELD_COUNT];
    let err = LayerEncoder::new(&catalog)
        .prepare_image(&img, &mut desc, &mut regs, ImageRole::Source)
        .unwrap_err();
    assert!(matches!(err, G2dError::Config(_)));
}

#[test]
fn extra_planes_are_ignored() {
    let planes = (0..3).map(|fd| Buffer::Dmabuf {
        fd,
        offset: 0,
        length: 4096,
    });
    let img = image(PixelFormat::Rgba8888, 16, 16)
        .with_buffers(planes)
        .with_fence(Fence(5));
    let (desc, _) = source(&Layer::full(img), Size::new(16, 16), 0);
    assert_eq!(desc.num_buffers(), 1);
    assert_eq!(desc.buffer_type, BufferType::Dmabuf);
    assert!(desc.flags.contains(ImageFlags::ACQUIRE_FENCE));
    assert_eq!(desc.fence, 5);
}

#[test]
fn secure_images_are_flagged() {
    let mut img = image(PixelFormat::Rgba8888, 4, 4);
    img.protected = true;
    let (desc, _) = source(&Layer::full(img), Size::new(4, 4), 0);
    assert!(desc.flags.contains(ImageFlags::SECURE));
    assert!(!desc.flags.contains(ImageFlags::ACQUIRE_FENCE));
}

#[test]
fn src_copy_forces_opaque_alpha() {
    let canvas = Size::new(8, 8);
    let img = image(PixelFormat::Rgba8888, 8, 8);

    let (_, regs) = source(&Layer::full(img.clone()), canvas, 0);
    assert_eq!(regs[SRC_BLEND], BLEND_SRCCOPY);
    assert_eq!(regs[IMG_COLORMODE], DeviceFormat::XBGR8888.0);

    let premult = Layer::full(img.clone()).with_blend(255, CompositingMode::Premultiplied);
    let (_, regs) = source(&premult, canvas, 0);
    assert_eq!(regs[SRC_BLEND], BLEND_SRCOVER);
    assert_eq!(regs[IMG_COLORMODE], DeviceFormat::ABGR8888.0);

    let coverage = Layer::full(img).with_blend(255, CompositingMode::Coverage);
    let (_, regs) = source(&coverage, canvas, 0);
    assert_eq!(regs[SRC_BLEND], BLEND_NONE);
}

#[test]
fn bottom_layer_is_opaque_and_upper_layers_blend() {
    let canvas = Size::new(8, 8);
    let layer =
        Layer::full(image(PixelFormat::Rgba8888, 8, 8)).with_blend(0x80, CompositingMode::None);

    let (_, regs) = source(&layer, canvas, 0);
    let cmd = LayerCommand::from_bits_truncate(regs[SRC_COMMAND]);
    assert_eq!(
        cmd,
        LayerCommand::VALID | LayerCommand::OPAQUE | LayerCommand::PREMULT_GLOBALALPHA
    );
    assert_eq!(regs[SRC_ALPHA], 0x8080_8080);

    let (_, regs) = source(&layer, canvas, 1);
    let cmd = LayerCommand::from_bits_truncate(regs[SRC_COMMAND]);
    assert_eq!(cmd, LayerCommand::VALID | LayerCommand::ALPHABLEND);
}

#[test]
fn empty_window_is_rejected() {
    let catalog = catalog();
    let layer = Layer::full(image(PixelFormat::Rgba8888, 8, 8));
    let mut desc = ImageDescriptor::default();
    let mut regs = vec![0; SRC_FIELD_COUNT];
    let err = LayerEncoder::new(&catalog)
        .prepare_source(&layer, &mut desc, &mut regs, Size::new(0, 0), 0)
        .unwrap_err();
    assert!(matches!(err, G2dError::Config(_)));
}

#[test]
fn solid_layers_fill_without_memory() {
    let mut layer = Layer::full(image(PixelFormat::Rgba8888, 20, 10))
        .with_target(Rect::new(5, 5, 20, 10));
    layer.solid_color = Some(0xff00_ff00);
    let (desc, regs) = source(&layer, Size::new(40, 40), 2);
    assert_eq!(desc.flags, ImageFlags::COLORFILL);
    assert_eq!(desc.buffer_type, BufferType::Empty);
    assert_eq!(regs[SRC_SELECT], LAYERSEL_COLORFILL);
    assert_eq!(regs[SRC_COLOR], 0xff00_ff00);
    assert_eq!(regs[IMG_COLORMODE], DeviceFormat::ARGB8888.0);
    assert_eq!([regs[SRC_DSTRIGHT], regs[SRC_DSTBOTTOM]], [25, 15]);
    assert_eq!(
        LayerCommand::from_bits_truncate(regs[SRC_COMMAND]),
        LayerCommand::VALID | LayerCommand::ALPHABLEND
    );
}

#[test]
fn background_covers_the_canvas() {
    let catalog = catalog();
    let canvas = Canvas::new(image(PixelFormat::Rgba8888, 32, 16));
    let color = BackgroundColor {
        r: 0xff00,
        g: 0,
        b: 0,
        a: 0xff00,
    };
    let mut desc = ImageDescriptor::default();
    let mut regs = vec![0xdead; SRC_FIELD_COUNT];
    LayerEncoder::new(&catalog).prepare_background(&canvas, color, &mut desc, &mut regs);
    assert_eq!(desc.flags, ImageFlags::COLORFILL);
    assert_eq!(regs[SRC_COLOR], 0xffff_0000);
    assert_eq!(regs[SRC_COMMAND], LayerCommand::VALID.bits());
    assert_eq!(regs[SRC_BLEND], BLEND_NONE);
    assert_eq!(regs[SRC_ALPHA], 0);
    assert_eq!([regs[SRC_DSTRIGHT], regs[SRC_DSTBOTTOM]], [32, 16]);
    assert_eq!(regs[SRC_SBWCINFO], 0);
}
