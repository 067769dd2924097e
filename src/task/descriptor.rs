use serde::Serialize;
use smallvec::SmallVec;

use crate::{
    layer::model::{Buffer, Planes},
    task::regs::{DST_FIELD_COUNT, ExtraReg, ImageFlags, MAX_IMAGES, TaskFlags},
};

/// How the planes of an image are handed to the device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferType {
    /// No memory attached (solid fills, size-only targets).
    #[default]
    Empty,
    /// Shared DMA buffers.
    Dmabuf,
    /// Process virtual addresses.
    Userptr,
}

/// Per-image part of a task: flags, acquire fence and planes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ImageDescriptor {
    /// Image flags.
    pub flags: ImageFlags,
    /// Acquire fence, `-1` when absent.
    pub fence: i32,
    /// Kind of memory in `buffers`.
    pub buffer_type: BufferType,
    /// Planes handed to the device.
    pub buffers: Planes,
}

impl ImageDescriptor {
    /// Number of planes handed to the device.
    pub fn num_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub(crate) fn reset(&mut self) {
        self.flags = ImageFlags::empty();
        self.fence = -1;
        self.buffer_type = BufferType::Empty;
        self.buffers.clear();
    }

    pub(crate) fn set_planes(&mut self, planes: &[Buffer]) {
        self.buffer_type = match planes.first() {
            None => BufferType::Empty,
            Some(Buffer::Dmabuf { .. }) => BufferType::Dmabuf,
            Some(Buffer::Userptr { .. }) => BufferType::Userptr,
        };
        self.buffers = planes.iter().copied().collect();
    }
}

/// Fixed-size part of a task, shared verbatim by both wire shapes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskHeader {
    /// Task flags; the device may add [`TaskFlags::ERROR`].
    pub flags: TaskFlags,
    /// Number of source images in use.
    pub num_source: u32,
    /// Number of release fence slots the device should fill.
    pub num_release_fences: u32,
    /// Release fences written by the device.
    pub release_fences: [i32; MAX_IMAGES + 1],
    /// Processing time reported by the device, in microseconds.
    pub laptime_us: u32,
    /// Target image.
    pub target: ImageDescriptor,
}

impl Default for TaskHeader {
    fn default() -> Self {
        Self {
            flags: TaskFlags::empty(),
            num_source: 0,
            num_release_fences: 0,
            release_fences: [-1; MAX_IMAGES + 1],
            laptime_us: 0,
            target: ImageDescriptor::default(),
        }
    }
}

/// Task in the current wire shape: register buffers are referenced, not copied.
#[derive(Debug, Serialize)]
pub struct TaskDescriptor<'a> {
    /// Header, mutated by the device.
    pub header: TaskHeader,
    /// Source images in use, bottom first.
    pub sources: &'a [ImageDescriptor],
    /// Target register buffer.
    pub target_regs: &'a [u32],
    /// Register buffers of every allocated source slot.
    pub source_regs: SmallVec<[&'a [u32]; MAX_IMAGES]>,
    /// CSC and HDR register writes.
    pub extra: &'a [ExtraReg],
}

impl TaskDescriptor<'_> {
    /// Register buffers of the source images in use.
    pub fn active_source_regs(&self) -> &[&[u32]] {
        let n = (self.header.num_source as usize).min(self.source_regs.len());
        &self.source_regs[..n]
    }
}

/// Task in the legacy wire shape: the target registers are embedded and every
/// source slot is referenced from a fixed-size table.
#[derive(Debug, Serialize)]
pub struct CompatTask<'a> {
    /// Copy of the header.
    pub header: TaskHeader,
    /// Source images in use, bottom first.
    pub sources: &'a [ImageDescriptor],
    /// Embedded copy of the target register buffer.
    pub target_regs: [u32; DST_FIELD_COUNT],
    /// Source register buffers by slot.
    pub source_regs: [Option<&'a [u32]>; MAX_IMAGES],
    /// CSC and HDR register writes.
    pub extra: &'a [ExtraReg],
}

impl<'a> CompatTask<'a> {
    /// Build the legacy shape of `task`.
    pub fn from_task(task: &TaskDescriptor<'a>) -> Self {
        let mut target_regs = [0u32; DST_FIELD_COUNT];
        let n = task.target_regs.len().min(DST_FIELD_COUNT);
        target_regs[..n].copy_from_slice(&task.target_regs[..n]);

        let mut source_regs = [None; MAX_IMAGES];
        for (slot, regs) in source_regs.iter_mut().zip(task.source_regs.iter()) {
            *slot = Some(*regs);
        }

        Self {
            header: task.header.clone(),
            sources: task.sources,
            target_regs,
            source_regs,
            extra: task.extra,
        }
    }

    /// Copy the fields written by the device back into `header`.
    pub fn copy_back(&self, header: &mut TaskHeader) {
        header.flags = self.header.flags;
        header.laptime_us = self.header.laptime_us;
        let n = (header.num_release_fences as usize).min(header.release_fences.len());
        header.release_fences[..n].copy_from_slice(&self.header.release_fences[..n]);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/task/descriptor.rs"]
mod tests;
