use serde::Serialize;

use crate::{
    device::control::{DeviceControl, DevicePriority, Errno, WireProtocol},
    perf::estimate::PerformanceData,
    task::{
        descriptor::{CompatTask, ImageDescriptor, TaskDescriptor, TaskHeader},
        regs::{ExtraReg, TaskFlags},
    },
};

/// Snapshot of a task as the device received it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubmittedTask {
    /// Wire shape used.
    pub protocol: WireProtocol,
    /// Header before the device wrote its results.
    pub header: TaskHeader,
    /// Source images in use.
    pub sources: Vec<ImageDescriptor>,
    /// Target registers.
    pub target_regs: Vec<u32>,
    /// Registers of the source images in use.
    pub source_regs: Vec<Vec<u32>>,
    /// Source slots referenced by the task, used or not.
    pub allocated_slots: usize,
    /// CSC and HDR register writes.
    pub extra: Vec<ExtraReg>,
}

/// In-memory device that records every request.
///
/// Release fences are numbered sequentially from `next_fence`. Failures are injected through
/// the public fields.
#[derive(Debug)]
pub struct LoopbackDevice {
    /// Version answered to the probe.
    pub version: Result<u32, Errno>,
    /// Next release fence handed out.
    pub next_fence: i32,
    /// Elapsed time reported for every task.
    pub laptime_us: u32,
    /// Fail every submission with this error.
    pub submit_error: Option<Errno>,
    /// Accept submissions but raise the task error flag.
    pub report_composition_error: bool,
    /// Fail priority changes with this error.
    pub priority_error: Option<Errno>,
    /// Fail reservations with this error.
    pub performance_error: Option<Errno>,

    /// Tasks received, in order.
    pub submitted: Vec<SubmittedTask>,
    /// Priorities applied, in order.
    pub priorities: Vec<DevicePriority>,
    /// Reservations received, in order; empty ones are cancellations.
    pub reservations: Vec<PerformanceData>,
}

impl Default for LoopbackDevice {
    fn default() -> Self {
        Self {
            version: Ok(WireProtocol::DIRECT_VERSION),
            next_fence: 100,
            laptime_us: 250,
            submit_error: None,
            report_composition_error: false,
            priority_error: None,
            performance_error: None,
            submitted: Vec::new(),
            priorities: Vec::new(),
            reservations: Vec::new(),
        }
    }
}

impl LoopbackDevice {
    /// Device speaking the direct protocol.
    pub fn new() -> Self {
        Self::default()
    }

    /// Device answering the probe with `version`.
    pub fn with_version(version: u32) -> Self {
        Self {
            version: Ok(version),
            ..Self::default()
        }
    }

    /// Last task received.
    pub fn last_task(&self) -> Option<&SubmittedTask> {
        self.submitted.last()
    }

    fn complete(&mut self, header: &mut TaskHeader) -> Result<(), Errno> {
        if let Some(errno) = self.submit_error {
            return Err(errno);
        }

        let n = (header.num_release_fences as usize).min(header.release_fences.len());
        for fence in &mut header.release_fences[..n] {
            *fence = self.next_fence;
            self.next_fence += 1;
        }
        header.laptime_us = self.laptime_us;
        if self.report_composition_error {
            header.flags |= TaskFlags::ERROR;
        }
        Ok(())
    }
}

impl DeviceControl for LoopbackDevice {
    fn query_version(&mut self) -> Result<u32, Errno> {
        self.version
    }

    fn submit(&mut self, task: &mut TaskDescriptor<'_>) -> Result<(), Errno> {
        self.submitted.push(SubmittedTask {
            protocol: WireProtocol::Direct,
            header: task.header.clone(),
            sources: task.sources.to_vec(),
            target_regs: task.target_regs.to_vec(),
            source_regs: task.active_source_regs().iter().map(|r| r.to_vec()).collect(),
            allocated_slots: task.source_regs.len(),
            extra: task.extra.to_vec(),
        });
        self.complete(&mut task.header)
    }

    fn submit_compat(&mut self, task: &mut CompatTask<'_>) -> Result<(), Errno> {
        let used = task.header.num_source as usize;
        self.submitted.push(SubmittedTask {
            protocol: WireProtocol::Compat,
            header: task.header.clone(),
            sources: task.sources.to_vec(),
            target_regs: task.target_regs.to_vec(),
            source_regs: task
                .source_regs
                .iter()
                .take(used)
                .map(|r| r.map(<[u32]>::to_vec).unwrap_or_default())
                .collect(),
            allocated_slots: task.source_regs.iter().filter(|r| r.is_some()).count(),
            extra: task.extra.to_vec(),
        });
        self.complete(&mut task.header)
    }

    fn set_priority(&mut self, priority: DevicePriority) -> Result<(), Errno> {
        self.priorities.push(priority);
        match self.priority_error {
            Some(errno) => Err(errno),
            None => Ok(()),
        }
    }

    fn request_performance(&mut self, data: &PerformanceData) -> Result<(), Errno> {
        if let Some(errno) = self.performance_error {
            return Err(errno);
        }
        self.reservations.push(data.clone());
        Ok(())
    }
}
