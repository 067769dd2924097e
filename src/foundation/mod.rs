//! Shared primitives: geometry, dataspace tags and the error taxonomy.

/// Geometry, transform, fence and dataspace types.
pub mod core;
/// Error taxonomy.
pub mod error;
