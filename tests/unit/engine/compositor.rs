use super::*;
use crate::{
    device::loopback::LoopbackDevice,
    foundation::core::{Rect, Size},
    format::catalog::PixelFormat,
    layer::model::{BackgroundColor, Canvas, Image},
    perf::estimate::{PerformanceFrame, PerformanceLayer},
};

fn rgba(width: u32, height: u32) -> Image {
    Image::new(PixelFormat::Rgba8888, Size::new(width, height))
}

fn scene(layers: usize) -> Scene {
    let mut scene = Scene::new(Canvas::new(rgba(64, 64)));
    for _ in 0..layers {
        scene.push(Layer::full(rgba(64, 64)));
    }
    scene
}

fn compositor(opts: CompositorOpts) -> Compositor<LoopbackDevice> {
    Compositor::new(LoopbackDevice::new(), opts).unwrap()
}

#[test]
fn device_path_follows_layer_count() {
    let mut opts = CompositorOpts::default();
    assert_eq!(opts.device_path(), "/dev/g2d");
    opts.max_layer_count = 2;
    assert_eq!(opts.device_path(), "/dev/fimg2d");
    opts.device_path = Some("/dev/null".to_string());
    assert_eq!(opts.device_path(), "/dev/null");
}

#[test]
fn layer_limit_is_bounded_by_hardware() {
    for max_layer_count in [0, MAX_IMAGES + 1] {
        let opts = CompositorOpts {
            max_layer_count,
            ..Default::default()
        };
        let err = Compositor::new(LoopbackDevice::new(), opts).unwrap_err();
        assert!(matches!(err, G2dError::Config(_)));
    }
}

#[test]
fn failed_probe_falls_back_to_compat() {
    let mut dev = LoopbackDevice::new();
    dev.version = Err(Errno::ENOTTY);
    let c = Compositor::new(dev, CompositorOpts::default()).unwrap();
    assert_eq!(c.version(), 0);
    assert_eq!(c.protocol(), WireProtocol::Compat);
}

#[test]
fn scene_validation() {
    assert!(validate_scene(&scene(3), 3).is_ok());
    assert!(validate_scene(&scene(4), 3).is_err());

    let mut empty_canvas = scene(1);
    empty_canvas.canvas.image.dimension = Size::new(0, 64);
    assert!(validate_scene(&empty_canvas, 16).is_err());

    let mut empty_crop = scene(1);
    empty_crop.layers[0].crop = Rect::new(0, 0, 0, 8);
    assert!(validate_scene(&empty_crop, 16).is_err());

    let mut oversized_crop = scene(1);
    oversized_crop.layers[0].crop = Rect::new(8, 0, 64, 64);
    assert!(validate_scene(&oversized_crop, 16).is_err());

    let mut solid = oversized_crop.clone();
    solid.layers[0].solid_color = Some(0xff00_0000);
    assert!(validate_scene(&solid, 16).is_ok());

    let mut outside = scene(1);
    outside.layers[0].target = Rect::new(32, 32, 64, 64);
    assert!(validate_scene(&outside, 16).is_err());
}

#[test]
fn background_counts_against_the_limit() {
    let mut c = compositor(CompositorOpts {
        max_layer_count: 2,
        ..Default::default()
    });
    let mut s = scene(2);
    s.background = Some(BackgroundColor::default());
    let err = c.execute(&mut s, &HdrLibrary::new(), &mut []).unwrap_err();
    assert!(matches!(err, G2dError::Config(_)));
    assert!(c.device().submitted.is_empty());
}

#[test]
fn blocking_submission_clears_nonblock() {
    let mut c = compositor(CompositorOpts::default());
    let mut s = scene(1);
    c.execute_blocking(&mut s, &HdrLibrary::new()).unwrap();
    let task = c.device().last_task().unwrap();
    assert!(!task.header.flags.contains(TaskFlags::NONBLOCK));
    assert_eq!(task.header.num_release_fences, 0);
    assert_eq!(c.last_laptime_us(), 250);
}

#[test]
fn buffers_are_reused_across_tasks() {
    let mut c = compositor(CompositorOpts::default());
    let hdr = HdrLibrary::new();
    c.execute(&mut scene(3), &hdr, &mut []).unwrap();
    c.execute(&mut scene(1), &hdr, &mut []).unwrap();
    c.execute(&mut scene(2), &hdr, &mut []).unwrap();
    let stats = c.buffer_stats();
    assert_eq!(stats.capacity, 3);
    assert_eq!(stats.reallocations, 1);

    let last = c.device().last_task().unwrap();
    assert_eq!(last.allocated_slots, 3);
    assert_eq!(last.source_regs.len(), 2);
}

#[test]
fn layers_are_stacked_by_z_order() {
    let mut c = compositor(CompositorOpts::default());
    let mut s = Scene::new(Canvas::new(rgba(64, 64)));
    s.push(Layer::full(rgba(64, 64)).with_z_order(5))
        .push(Layer::full(Image::new(PixelFormat::Rgb565, Size::new(64, 64))).with_z_order(-1))
        .push(Layer::full(rgba(64, 64)).with_z_order(5));
    c.execute(&mut s, &HdrLibrary::new(), &mut []).unwrap();

    let task = c.device().last_task().unwrap();
    let stride = |i: usize| task.source_regs[i][crate::task::regs::IMG_STRIDE];
    assert_eq!([stride(0), stride(1), stride(2)], [128, 256, 256]);
    assert_eq!(s.layers[0].z_order, 5);
}

#[test]
fn priority_is_cached_unless_busy() {
    let mut c = compositor(CompositorOpts::default());
    assert_eq!(c.prioritize(-1).unwrap(), PriorityOutcome::Unchanged);
    assert_eq!(c.prioritize(2).unwrap(), PriorityOutcome::Applied);
    assert_eq!(c.prioritize(2).unwrap(), PriorityOutcome::Unchanged);

    c.device_mut().priority_error = Some(Errno::EBUSY);
    assert_eq!(c.prioritize(0).unwrap(), PriorityOutcome::Busy);
    assert_eq!(c.prioritize(0).unwrap(), PriorityOutcome::Busy);

    c.device_mut().priority_error = Some(Errno::EINVAL);
    let err = c.prioritize(1).unwrap_err();
    assert_eq!(err.errno(), Some(22));

    assert_eq!(
        c.device().priorities,
        vec![
            DevicePriority::High,
            DevicePriority::Low,
            DevicePriority::Low,
            DevicePriority::Medium
        ]
    );
}

#[test]
fn performance_requests_and_cancels() {
    let mut c = compositor(CompositorOpts::default());
    let size = Size::new(64, 64);
    let request = PerformanceRequest {
        frames: vec![PerformanceFrame {
            layers: vec![PerformanceLayer {
                format: PixelFormat::Rgba8888,
                source_dimension: size,
                source_rect: Rect::from_size(size),
                target_rect: Rect::from_size(size),
                transform: Default::default(),
                compressed: false,
            }],
            target_dimension: size,
            target_format: PixelFormat::Rgba8888,
            frame_rate: 60,
            has_background: false,
        }],
    };
    c.request_performance(Some(&request)).unwrap();
    c.request_performance(Some(&PerformanceRequest::default()))
        .unwrap();
    c.request_performance(None).unwrap();

    let reservations = &c.device().reservations;
    assert_eq!(reservations.len(), 3);
    assert_eq!(reservations[0].frames.len(), 1);
    assert!(reservations[1].is_cancel());
    assert!(reservations[2].is_cancel());

    c.device_mut().performance_error = Some(Errno::EIO);
    let err = c.request_performance(None).unwrap_err();
    assert!(err.to_string().contains("cancel_performance"));
}
