//! Color space conversion matrices.

/// Per-task matrix slot cache.
pub mod matrix;
