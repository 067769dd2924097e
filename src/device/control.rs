use serde::{Deserialize, Serialize};

use crate::{
    perf::estimate::PerformanceData,
    task::descriptor::{CompatTask, TaskDescriptor},
};

/// OS error code returned by a failed device-control call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Errno(pub i32);

impl Errno {
    /// I/O error.
    pub const EIO: Self = Self(5);
    /// Out of memory.
    pub const ENOMEM: Self = Self(12);
    /// Device or resource busy.
    pub const EBUSY: Self = Self(16);
    /// Invalid argument.
    pub const EINVAL: Self = Self(22);
    /// Request code not understood by the device.
    pub const ENOTTY: Self = Self(25);
}

impl std::fmt::Display for Errno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "errno {}", self.0)
    }
}

/// Scheduling priority of the device context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePriority {
    /// Device default.
    Default,
    /// Background work.
    Low,
    /// Normal work.
    Medium,
    /// Latency sensitive work.
    High,
    /// Display path.
    Highest,
}

impl DevicePriority {
    /// Map a caller priority level: negative is the default, 0..=2 are low to high,
    /// anything above is highest.
    pub fn from_level(level: i32) -> Self {
        match level {
            i32::MIN..=-1 => Self::Default,
            0 => Self::Low,
            1 => Self::Medium,
            2 => Self::High,
            _ => Self::Highest,
        }
    }
}

/// Wire shape used to submit tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireProtocol {
    /// Current shape, [`TaskDescriptor`].
    Direct,
    /// Legacy shape, [`CompatTask`].
    Compat,
}

impl WireProtocol {
    /// Protocol version spoken in the direct shape.
    pub const DIRECT_VERSION: u32 = 1;

    /// Select the shape for a queried protocol version.
    pub fn from_version(version: u32) -> Self {
        if version == Self::DIRECT_VERSION {
            Self::Direct
        } else {
            Self::Compat
        }
    }
}

/// Synchronous control interface of the compositing device.
///
/// Each call is a single request/response exchange. Callers sharing one device context
/// across threads must synchronize externally.
pub trait DeviceControl {
    /// Protocol version of the device.
    fn query_version(&mut self) -> Result<u32, Errno>;

    /// Submit a task in the current shape. The device fills in flags, elapsed time and
    /// release fences.
    fn submit(&mut self, task: &mut TaskDescriptor<'_>) -> Result<(), Errno>;

    /// Submit a task in the legacy shape.
    fn submit_compat(&mut self, task: &mut CompatTask<'_>) -> Result<(), Errno>;

    /// Change the priority of the device context.
    fn set_priority(&mut self, priority: DevicePriority) -> Result<(), Errno>;

    /// Reserve bandwidth, or cancel a reservation when `data` has no frames.
    fn request_performance(&mut self, data: &PerformanceData) -> Result<(), Errno>;
}

#[cfg(test)]
#[path = "../../tests/unit/device/control.rs"]
mod tests;
