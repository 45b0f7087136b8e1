//! Process-level error type.
//!
//! Exit code conventions used across the crate:
//!
//! - `2` — usage/configuration errors (bad flags, bad ranges, bad files)
//! - `3` — insufficient data (empty dataset, no free parameters, too few points)
//! - `4` — numeric failures (no valid grid candidate, non-finite model output)

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Usage/configuration error (exit code 2).
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Insufficient data to attempt a fit (exit code 3).
    pub fn insufficient(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Numeric failure (exit code 4).
    pub fn numeric(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
