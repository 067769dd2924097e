//! HDR coefficient state and its register packing.

/// Coefficient sets and the caller-managed library.
pub mod coef;
/// Register packing and the live writer seam.
pub mod packer;
