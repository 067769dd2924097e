use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    csc::matrix::CscMatrixWriter,
    device::control::{DeviceControl, DevicePriority, Errno, WireProtocol},
    engine::dump,
    foundation::{
        core::Fence,
        error::{G2dError, G2dResult},
    },
    format::{
        catalog::{FormatCatalog, HwGeneration},
        device::DeviceFormat,
    },
    hdr::{
        coef::HdrLibrary,
        packer::{self, HdrWriter, NoopHdrWriter},
    },
    layer::{
        encoder::{ImageRole, LayerEncoder},
        model::{Layer, Scene},
    },
    perf::estimate::{self, PerformanceData, PerformanceRequest},
    task::{
        buffers::{TaskBufferStats, TaskBuffers},
        descriptor::{CompatTask, TaskDescriptor, TaskHeader},
        regs::{
            DST_YCBCRMODE, ExtraReg, IMG_COLORMODE, MAX_IMAGES, SRC_HDRMODE, SRC_YCBCRMODE,
            TaskFlags, YCBCRMODE_OFFX, YCBCRMODE_OFFY,
        },
    },
};

/// Compositor configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositorOpts {
    /// Most layers one task may carry, background included.
    pub max_layer_count: usize,
    /// Format table variant.
    pub generation: HwGeneration,
    /// Device node; derived from `max_layer_count` when unset.
    pub device_path: Option<String>,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            max_layer_count: MAX_IMAGES,
            generation: HwGeneration::default(),
            device_path: None,
        }
    }
}

impl CompositorOpts {
    /// Device node the compositor talks to.
    pub fn device_path(&self) -> &str {
        match &self.device_path {
            Some(p) => p,
            None if self.max_layer_count > 2 => "/dev/g2d",
            None => "/dev/fimg2d",
        }
    }
}

/// Per-call submission options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecuteOpts {
    /// Return before the composition completes; completion is signalled by release fences.
    pub nonblocking: bool,
}

/// Result of [`Compositor::prioritize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriorityOutcome {
    /// Already at the requested priority; no request was sent.
    Unchanged,
    /// Priority applied.
    Applied,
    /// The device answered busy but applied the priority. It is not remembered,
    /// so the next identical request is sent again.
    Busy,
}

/// Execution engine: encodes scenes into tasks and submits them to a device.
///
/// Not reentrant; the task buffers are reused in place across calls.
pub struct Compositor<D: DeviceControl> {
    device: D,
    opts: CompositorOpts,
    catalog: FormatCatalog,
    protocol: WireProtocol,
    version: u32,
    buffers: TaskBuffers,
    extra: Vec<ExtraReg>,
    priority: i32,
    hdr_writer: Box<dyn HdrWriter>,
    last_laptime_us: u32,
}

impl<D: DeviceControl> std::fmt::Debug for Compositor<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("opts", &self.opts)
            .field("protocol", &self.protocol)
            .field("version", &self.version)
            .field("buffers", &self.buffers.stats())
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

fn validate_scene(scene: &Scene, max_layers: usize) -> G2dResult<()> {
    if scene.layers.len() > max_layers {
        return Err(G2dError::config(format!(
            "{} layers exceed the maximum of {max_layers}",
            scene.layers.len()
        )));
    }

    let canvas = scene.canvas.image.dimension;
    if canvas.is_empty() {
        return Err(G2dError::config("canvas has no area"));
    }

    for (i, layer) in scene.layers.iter().enumerate() {
        if layer.crop.is_empty() {
            return Err(G2dError::config(format!("layer {i} has an empty crop")));
        }
        if !layer.is_solid_color() && !layer.crop.fits_in(layer.image.dimension) {
            return Err(G2dError::config(format!(
                "layer {i} crop {:?} exceeds its image {:?}",
                layer.crop, layer.image.dimension
            )));
        }
        if !layer.target.is_empty() && !layer.target.fits_in(canvas) {
            return Err(G2dError::config(format!(
                "layer {i} window {:?} exceeds the canvas {canvas:?}",
                layer.target
            )));
        }
    }
    Ok(())
}

fn submit_task<D: DeviceControl>(
    device: &mut D,
    protocol: WireProtocol,
    task: &mut TaskDescriptor<'_>,
) -> Result<(), Errno> {
    match protocol {
        WireProtocol::Direct => device.submit(task),
        WireProtocol::Compat => {
            let mut compat = CompatTask::from_task(task);
            device.submit_compat(&mut compat)?;
            compat.copy_back(&mut task.header);
            Ok(())
        }
    }
}

impl<D: DeviceControl> Compositor<D> {
    /// Create a compositor on `device`, probing its protocol version once.
    pub fn new(mut device: D, opts: CompositorOpts) -> G2dResult<Self> {
        if opts.max_layer_count == 0 || opts.max_layer_count > MAX_IMAGES {
            return Err(G2dError::config(format!(
                "max_layer_count must be within 1..={MAX_IMAGES}, got {}",
                opts.max_layer_count
            )));
        }

        let version = device.query_version().unwrap_or_else(|e| {
            tracing::warn!(errno = e.0, "failed to query the protocol version");
            0
        });
        let protocol = WireProtocol::from_version(version);
        tracing::info!(
            device = opts.device_path(),
            version,
            ?protocol,
            generation = ?opts.generation,
            "opened compositor"
        );

        Ok(Self {
            device,
            catalog: FormatCatalog::new(opts.generation),
            opts,
            protocol,
            version,
            buffers: TaskBuffers::new(),
            extra: Vec::new(),
            priority: -1,
            hdr_writer: Box::new(NoopHdrWriter),
            last_laptime_us: 0,
        })
    }

    /// Install a live HDR writer.
    pub fn with_hdr_writer(mut self, writer: Box<dyn HdrWriter>) -> Self {
        self.hdr_writer = writer;
        self
    }

    /// Underlying device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Underlying device, mutably.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Configuration in use.
    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    /// Format table in use.
    pub fn catalog(&self) -> &FormatCatalog {
        &self.catalog
    }

    /// Protocol version reported by the device, zero when the probe failed.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Wire shape used for submissions.
    pub fn protocol(&self) -> WireProtocol {
        self.protocol
    }

    /// Task buffer counters.
    pub fn buffer_stats(&self) -> TaskBufferStats {
        self.buffers.stats()
    }

    /// Device processing time of the last successful task.
    pub fn last_laptime_us(&self) -> u32 {
        self.last_laptime_us
    }

    /// Submit `scene` without waiting for completion.
    ///
    /// `fences` receives one release fence per slot, at most one per layer plus one for the
    /// target; extra slots are set to `None`.
    pub fn execute(
        &mut self,
        scene: &mut Scene,
        hdr: &HdrLibrary,
        fences: &mut [Option<Fence>],
    ) -> G2dResult<()> {
        self.execute_with(scene, hdr, fences, ExecuteOpts { nonblocking: true })
    }

    /// Submit `scene` and return once the device has finished it.
    pub fn execute_blocking(&mut self, scene: &mut Scene, hdr: &HdrLibrary) -> G2dResult<()> {
        self.execute_with(scene, hdr, &mut [], ExecuteOpts::default())
    }

    /// Submit `scene`.
    ///
    /// On any failure every acquire fence of the scene is dropped: the buffers are considered
    /// consumed and the scene must be configured again before retrying.
    #[tracing::instrument(skip(self, scene, hdr, fences), fields(layers = scene.layers.len()))]
    pub fn execute_with(
        &mut self,
        scene: &mut Scene,
        hdr: &HdrLibrary,
        fences: &mut [Option<Fence>],
        opts: ExecuteOpts,
    ) -> G2dResult<()> {
        let result = self.execute_task(scene, hdr, fences, opts);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "task failed; acquire fences invalidated");
            scene.invalidate_fences();
        }
        result
    }

    fn execute_task(
        &mut self,
        scene: &mut Scene,
        hdr: &HdrLibrary,
        fences: &mut [Option<Fence>],
        opts: ExecuteOpts,
    ) -> G2dResult<()> {
        validate_scene(scene, self.opts.max_layer_count)?;

        let layer_count = scene.layers.len();
        for slot in fences.iter_mut().skip(layer_count) {
            *slot = None;
        }
        let num_fences = fences.len().min(layer_count + 1);

        let sbwc_target = self
            .catalog
            .find(scene.canvas.image.format)
            .is_some_and(|e| e.device.is_sbwc());
        let background = match scene.background {
            Some(color) => Some(color),
            None if sbwc_target => Some(Default::default()),
            None => None,
        };
        let base = usize::from(background.is_some());
        let task_count = layer_count + base;
        if task_count > self.opts.max_layer_count {
            tracing::error!(layer_count, "too many layers with the background configured");
            return Err(G2dError::config(format!(
                "{layer_count} layers plus a background exceed the maximum of {}",
                self.opts.max_layer_count
            )));
        }

        self.buffers.reserve(task_count)?;

        let mut order: SmallVec<[usize; MAX_IMAGES]> = (0..layer_count).collect();
        order.sort_by_key(|&i| scene.layers[i].z_order);

        let encoder = LayerEncoder::new(&self.catalog);
        let canvas = &scene.canvas;
        let mut header = TaskHeader::default();

        let target_regs = self.buffers.target_regs_mut()?;
        encoder
            .prepare_image(&canvas.image, &mut header.target, target_regs, ImageRole::Target)
            .inspect_err(|_| tracing::error!("failed to configure the target image"))?;
        if canvas.otf {
            header.flags |= TaskFlags::HWFC;
        }

        let (mut csc, target_mode) = CscMatrixWriter::for_target(
            DeviceFormat(target_regs[IMG_COLORMODE]),
            canvas.image.dataspace,
        )?;
        target_regs[DST_YCBCRMODE] = target_mode | YCBCRMODE_OFFX | YCBCRMODE_OFFY;

        if let Some(color) = background {
            let (desc, regs) = self.buffers.source_mut(0)?;
            encoder.prepare_background(canvas, color, desc, regs);
        }

        let mut premultiplied = 0u32;
        for (pos, &li) in order.iter().enumerate() {
            let i = pos + base;
            let layer: &Layer = &scene.layers[li];
            let (desc, regs) = self.buffers.source_mut(i)?;

            encoder
                .prepare_source(layer, desc, regs, canvas.image.dimension, pos)
                .inspect_err(|e| {
                    tracing::error!(layer = pos, error = %e, "failed to configure source layer")
                })?;

            regs[SRC_YCBCRMODE] = csc
                .configure(DeviceFormat(regs[IMG_COLORMODE]), layer.image.dataspace)
                .inspect_err(|e| {
                    tracing::error!(layer = i, error = %e, "failed to configure CSC")
                })?;

            let premult = layer.compositing.is_premultiplied();
            if premult {
                premultiplied |= 1 << i;
            }

            let writer = &mut self.hdr_writer;
            writer.set_layer_static_metadata(
                i,
                layer.image.dataspace,
                layer.min_mastering_luminance,
                layer.max_mastering_luminance,
            );
            writer.set_layer_image_info(i, layer.image.format, premult);
            if let Some(data) = &layer.layer_data {
                writer.set_layer_opaque_data(i, data);
            }
        }

        let (min_lum, max_lum) = scene.target_display_luminance.unwrap_or_default();
        self.hdr_writer.set_target_info(canvas.image.dataspace);
        self.hdr_writer.set_target_display_luminance(min_lum, max_lum);
        let live_hdr = self.hdr_writer.commands()?;
        for (i, regs) in self.buffers.source_regs_mut(task_count).enumerate() {
            if let Some(mode) = self.hdr_writer.layer_hdr_mode(i) {
                regs[SRC_HDRMODE] = mode;
            }
        }

        self.extra.clear();
        csc.write(&mut self.extra);
        if !live_hdr.is_empty() {
            self.extra.extend(live_hdr);
        } else if hdr.is_active() {
            self.extra.reserve(packer::MAX_LIBRARY_REGS);
            packer::pack_library(hdr, &mut self.extra)
                .inspect_err(|e| tracing::error!(error = %e, "failed to pack HDR coefficients"))?;
            packer::set_layer_hdr_command(
                hdr,
                self.buffers.source_regs_mut(task_count),
                premultiplied,
            );
        }

        header.num_source = task_count as u32;
        if opts.nonblocking {
            header.flags |= TaskFlags::NONBLOCK;
        }
        header.num_release_fences = num_fences as u32;

        let mut task = TaskDescriptor {
            header,
            sources: self.buffers.images(task_count),
            target_regs: self.buffers.target_regs()?,
            source_regs: self.buffers.all_source_regs().collect(),
            extra: &self.extra,
        };
        tracing::debug!(
            sources = task_count,
            extra = task.extra.len(),
            flags = task.header.flags.bits(),
            "submitting task"
        );
        dump::debug_task(&task);

        if let Err(errno) = submit_task(&mut self.device, self.protocol, &mut task) {
            tracing::error!(errno = errno.0, "failed to process a task");
            dump::log_task(&task);
            return Err(G2dError::device("submit", errno.0));
        }

        self.hdr_writer.complete();

        if task.header.flags.contains(TaskFlags::ERROR) {
            tracing::error!("device reported an error while processing the task");
            dump::log_task(&task);
            return Err(G2dError::composition("device raised the task error flag"));
        }

        let header = task.header;
        self.last_laptime_us = header.laptime_us;

        scene.canvas.image.consume();
        for layer in &mut scene.layers {
            layer.image.consume();
        }
        for (slot, &raw) in fences.iter_mut().zip(&header.release_fences[..num_fences]) {
            *slot = Fence::from_raw(raw);
        }
        Ok(())
    }

    /// Change the priority of the device context.
    ///
    /// Levels below zero select the device default, 0 to 2 select low to high, anything
    /// above selects the highest priority.
    #[tracing::instrument(skip(self))]
    pub fn prioritize(&mut self, level: i32) -> G2dResult<PriorityOutcome> {
        if level == self.priority {
            return Ok(PriorityOutcome::Unchanged);
        }

        let priority = DevicePriority::from_level(level);
        match self.device.set_priority(priority) {
            Ok(()) => {
                self.priority = level;
                Ok(PriorityOutcome::Applied)
            }
            Err(Errno::EBUSY) => {
                tracing::debug!(level, ?priority, "device busy but priority applied");
                Ok(PriorityOutcome::Busy)
            }
            Err(e) => {
                tracing::error!(errno = e.0, "failed to set priority");
                Err(G2dError::device("set_priority", e.0))
            }
        }
    }

    /// Reserve bandwidth for `request`; `None` or a request without frames cancels the
    /// current reservation.
    #[tracing::instrument(skip(self, request))]
    pub fn request_performance(&mut self, request: Option<&PerformanceRequest>) -> G2dResult<()> {
        let data = match request {
            Some(r) if !r.frames.is_empty() => estimate::estimate(r)?,
            _ => PerformanceData::default(),
        };

        self.device.request_performance(&data).map_err(|e| {
            let op = if data.is_cancel() {
                "cancel_performance"
            } else {
                "request_performance"
            };
            tracing::error!(errno = e.0, op, "performance request failed");
            G2dError::device(op, e.0)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/compositor.rs"]
mod tests;
