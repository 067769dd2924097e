//! Task composition for fixed-function 2D compositing accelerators.
//!
//! A [`Scene`] (target canvas plus source layers) is encoded into a task descriptor: per-image
//! register sets, color conversion matrices and HDR coefficients. The task is submitted through
//! a [`DeviceControl`] implementation and the results (release fences, error flag) are
//! reconciled back onto the scene.
//!
//! - Build a [`Scene`] from [`Canvas`] and [`Layer`] values
//! - Create a [`Compositor`] over a device
//! - [`Compositor::execute`] the scene, or reserve bandwidth with
//!   [`Compositor::request_performance`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Color space conversion matrices.
pub mod csc;
/// Device-control transport seam.
pub mod device;
/// Execution engine.
pub mod engine;
/// Pixel format negotiation.
pub mod format;
/// Shared primitives.
pub mod foundation;
/// HDR coefficient state and packing.
pub mod hdr;
/// Layer model and encoder.
pub mod layer;
/// Bandwidth estimation.
pub mod perf;
/// Task descriptors and storage.
pub mod task;

pub use crate::device::control::{DeviceControl, DevicePriority, Errno, WireProtocol};
pub use crate::device::loopback::{LoopbackDevice, SubmittedTask};
pub use crate::engine::compositor::{Compositor, CompositorOpts, ExecuteOpts, PriorityOutcome};
pub use crate::format::catalog::{FormatCatalog, FormatEntry, HwGeneration, PixelFormat};
pub use crate::format::device::DeviceFormat;
pub use crate::foundation::core::{
    ColorStandard, CompositingMode, Dataspace, Fence, Rect, Size, Transform,
};
pub use crate::foundation::error::{G2dError, G2dResult};
pub use crate::hdr::coef::{HdrCoefficientSet, HdrLibrary, MAX_HDR_SET, ToneMapping, TransferLut};
pub use crate::hdr::packer::{HdrWriter, NoopHdrWriter};
pub use crate::layer::model::{BackgroundColor, Buffer, Canvas, Image, Layer, Scene};
pub use crate::perf::estimate::{
    PerformanceData, PerformanceFrame, PerformanceLayer, PerformanceRequest,
};
pub use crate::task::regs::{ExtraReg, ImageFlags, LayerCommand, TaskFlags};
