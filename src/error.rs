//! Process-level error type.
//!
//! Every fallible path in the tool funnels into [`AppError`], which carries
//! the message shown to the user and the process exit code. Exit codes group
//! failures by kind so shell callers can tell them apart:
//!
//! - `2` usage and input problems (bad flags, unreadable files, missing
//!   required columns)
//! - `3` dataset problems (no usable rows, fewer points than parameters)
//! - `4` math and fitting failures (non-convergence, domain errors,
//!   singular systems)

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

    /// Usage/input error: flags, files, schema.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Dataset error: the file parsed but the data cannot support a fit.
    pub fn data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Fitting/math error: the solver could not produce a valid result.
    pub fn fit(message: impl Into<String>) -> Self {
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
