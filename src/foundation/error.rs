use crate::foundation::core::Dataspace;

/// Convenience result type used across the crate.
pub type G2dResult<T> = Result<T, G2dError>;

/// Top-level error taxonomy for task composition and submission.
///
/// Every variant ends the current submission attempt. The caller-visible effect is the same
/// for all of them: acquire fences are invalidated and the scene must be configured again.
#[derive(thiserror::Error, Debug)]
pub enum G2dError {
    /// Invalid layer, canvas or library configuration detected before submission.
    #[error("configuration error: {0}")]
    Config(String),

    /// No conversion matrix exists for the color standard of a YCbCr image.
    #[error("unsupported dataspace {dataspace:#x}")]
    UnsupportedDataspace {
        /// Offending dataspace tag.
        dataspace: Dataspace,
    },

    /// More distinct CSC matrices are required than the hardware has slots for.
    #[error("too many CSC requirements (max {max})")]
    CscExhausted {
        /// Number of available source matrix slots.
        max: usize,
    },

    /// Command buffer allocation failed.
    #[error("resource error: {0}")]
    Resource(String),

    /// The device-control call returned an OS error.
    #[error("device error: {op} failed with errno {errno}")]
    Device {
        /// Request that failed.
        op: &'static str,
        /// Positive OS error code.
        errno: i32,
    },

    /// The device accepted the task but reported a composition error.
    #[error("composition error: {0}")]
    Composition(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl G2dError {
    /// Build a [`G2dError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`G2dError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`G2dError::Composition`] value.
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    /// Build a [`G2dError::Device`] value from a request name and an OS error code.
    pub fn device(op: &'static str, errno: i32) -> Self {
        Self::Device {
            op,
            errno: errno.abs(),
        }
    }

    /// Return `true` when the caller may retry after dropping the color-conversion requirement.
    pub fn is_retryable_without_capability(&self) -> bool {
        matches!(self, Self::UnsupportedDataspace { .. })
    }

    /// OS error code carried by device failures.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Device { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
