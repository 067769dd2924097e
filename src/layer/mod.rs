//! Consumed layer model and the per-layer register encoder.

/// Per-layer register encoding.
pub mod encoder;
/// Canvas, layers and scenes.
pub mod model;
