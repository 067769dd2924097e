use crate::task::descriptor::{ImageDescriptor, TaskDescriptor};

fn image_lines(out: &mut Vec<String>, title: &str, idx: usize, image: &ImageDescriptor) {
    out.push(format!(
        "{title}{idx}: flags {:#x}, fence {}, buffer_type {:?}, num_buffers {}",
        image.flags.bits(),
        image.fence,
        image.buffer_type,
        image.num_buffers()
    ));
    for (i, buf) in image.buffers.iter().enumerate() {
        out.push(format!("         buf[{i}] {buf:?}"));
    }
}

/// Human-readable listing of every field of `task`.
pub fn format_task(task: &TaskDescriptor<'_>) -> Vec<String> {
    let h = &task.header;
    let mut out = vec![format!(
        "source count {}, flags {:#x}, num_release_fences {}, laptime {}us",
        h.num_source,
        h.flags.bits(),
        h.num_release_fences,
        h.laptime_us
    )];

    image_lines(&mut out, "Target", 0, &h.target);
    for (i, image) in task.sources.iter().enumerate() {
        image_lines(&mut out, "Source", i, image);
    }

    for (i, v) in task.target_regs.iter().enumerate() {
        out.push(format!("DST[{i:02}]: {v:#010x}"));
    }
    for (idx, regs) in task.source_regs.iter().enumerate() {
        for (i, v) in regs.iter().enumerate() {
            out.push(format!("SRC[{idx:02}][{i:02}]: {v:#010x}"));
        }
    }
    for reg in task.extra {
        out.push(format!(
            "EXTRA: offset {:#010x}, value {:#010x}",
            reg.offset, reg.value
        ));
    }
    out
}

/// Dump `task` at WARN level; used on every failed submission.
pub fn log_task(task: &TaskDescriptor<'_>) {
    for line in format_task(task) {
        tracing::warn!(target: "g2d_compose::dump", "{line}");
    }
}

/// Dump `task` at DEBUG level before submission.
pub fn debug_task(task: &TaskDescriptor<'_>) {
    if tracing::enabled!(target: "g2d_compose::dump", tracing::Level::DEBUG) {
        for line in format_task(task) {
            tracing::debug!(target: "g2d_compose::dump", "{line}");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/dump.rs"]
mod tests;
