//! Pixel format negotiation between generic formats and accelerator color modes.

/// Generic-to-device format tables.
pub mod catalog;
/// Accelerator color-mode encoding.
pub mod device;
