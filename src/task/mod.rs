//! Task descriptors and the storage behind them.

/// Growable per-source storage.
pub mod buffers;
/// Task descriptor wire shapes.
pub mod descriptor;
/// Register field indices and bit values.
pub mod regs;
