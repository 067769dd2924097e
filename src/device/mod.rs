//! Device-control transport seam.

/// Control trait and request types.
pub mod control;
/// Recording in-memory device.
pub mod loopback;
