//! Bandwidth estimation for QoS reservations.

/// Per-frame bandwidth estimator.
pub mod estimate;
