use crate::{
    foundation::error::{G2dError, G2dResult},
    task::{
        descriptor::ImageDescriptor,
        regs::{DST_FIELD_COUNT, MAX_IMAGES, SRC_FIELD_COUNT},
    },
};

/// Allocation counters of a [`TaskBuffers`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskBufferStats {
    /// Allocated source slots.
    pub capacity: usize,
    /// Times the source slots were reallocated.
    pub reallocations: u64,
    /// Failed growth attempts.
    pub failed_reallocations: u64,
    /// Whether the target register buffer exists.
    pub target_allocated: bool,
}

/// Storage behind one task: the target register buffer plus per-source descriptors and
/// register buffers, addressed by source index.
///
/// Grows to the largest source count seen and never shrinks.
#[derive(Debug, Default)]
pub struct TaskBuffers {
    target: Option<Box<[u32]>>,
    images: Vec<ImageDescriptor>,
    regs: Vec<Box<[u32]>>,
    stats: TaskBufferStats,
}

fn zeroed(len: usize) -> G2dResult<Box<[u32]>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| G2dError::resource(format!("register buffer of {len} words: {e}")))?;
    v.resize(len, 0);
    Ok(v.into_boxed_slice())
}

impl TaskBuffers {
    /// Empty storage; nothing is allocated until [`TaskBuffers::reserve`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for diagnostics and tests.
    pub fn stats(&self) -> TaskBufferStats {
        self.stats.clone()
    }

    /// Allocated source slots.
    pub fn capacity(&self) -> usize {
        self.regs.len()
    }

    /// Make room for `count` sources.
    ///
    /// Newly allocated slots are zeroed. When any allocation fails the previous
    /// slots are kept untouched.
    pub fn reserve(&mut self, count: usize) -> G2dResult<()> {
        if count > MAX_IMAGES {
            return Err(G2dError::config(format!(
                "{count} source images exceed the device limit of {MAX_IMAGES}"
            )));
        }

        if self.target.is_none() {
            self.target = Some(zeroed(DST_FIELD_COUNT).inspect_err(|_| {
                tracing::error!("failed to allocate the target register buffer");
            })?);
            self.stats.target_allocated = true;
        }

        if self.capacity() >= count {
            return Ok(());
        }

        match Self::allocate_sources(count) {
            Ok((images, regs)) => {
                self.images = images;
                self.regs = regs;
                self.stats.capacity = count;
                self.stats.reallocations = self.stats.reallocations.saturating_add(1);
                tracing::debug!(capacity = count, "grew task buffers");
                Ok(())
            }
            Err(e) => {
                self.stats.failed_reallocations = self.stats.failed_reallocations.saturating_add(1);
                tracing::error!(count, error = %e, "failed to grow task buffers");
                Err(e)
            }
        }
    }

    fn allocate_sources(count: usize) -> G2dResult<(Vec<ImageDescriptor>, Vec<Box<[u32]>>)> {
        let mut images = Vec::new();
        images
            .try_reserve_exact(count)
            .map_err(|e| G2dError::resource(format!("{count} source descriptors: {e}")))?;
        images.resize_with(count, ImageDescriptor::default);

        let mut regs = Vec::new();
        regs.try_reserve_exact(count)
            .map_err(|e| G2dError::resource(format!("{count} source register tables: {e}")))?;
        for _ in 0..count {
            regs.push(zeroed(SRC_FIELD_COUNT)?);
        }

        Ok((images, regs))
    }

    /// Target register buffer.
    pub fn target_regs(&self) -> G2dResult<&[u32]> {
        self.target
            .as_deref()
            .ok_or_else(|| G2dError::resource("target register buffer is not allocated"))
    }

    /// Mutable target register buffer.
    pub fn target_regs_mut(&mut self) -> G2dResult<&mut [u32]> {
        self.target
            .as_deref_mut()
            .ok_or_else(|| G2dError::resource("target register buffer is not allocated"))
    }

    /// Descriptor and registers of source slot `index`.
    pub fn source_mut(&mut self, index: usize) -> G2dResult<(&mut ImageDescriptor, &mut [u32])> {
        let cap = self.capacity();
        match (self.images.get_mut(index), self.regs.get_mut(index)) {
            (Some(image), Some(regs)) => Ok((image, &mut regs[..])),
            _ => Err(G2dError::resource(format!(
                "source slot {index} is beyond the capacity of {cap}"
            ))),
        }
    }

    /// Register buffer of source slot `index`.
    pub fn source_regs(&self, index: usize) -> Option<&[u32]> {
        self.regs.get(index).map(|r| &r[..])
    }

    /// Mutable register buffers of the first `count` slots.
    pub fn source_regs_mut(&mut self, count: usize) -> impl Iterator<Item = &mut [u32]> {
        self.regs.iter_mut().take(count).map(|r| &mut r[..])
    }

    /// Descriptors of the first `count` slots.
    pub fn images(&self, count: usize) -> &[ImageDescriptor] {
        &self.images[..count.min(self.images.len())]
    }

    /// Register buffers of every allocated slot.
    pub fn all_source_regs(&self) -> impl Iterator<Item = &[u32]> {
        self.regs.iter().map(|r| &r[..])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/task/buffers.rs"]
mod tests;
