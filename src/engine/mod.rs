//! Task assembly, submission and result reconciliation.

/// Execution engine.
pub mod compositor;
/// Diagnostic task dumps.
pub mod dump;
