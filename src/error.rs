use crate::alloc::AllocError;

/// Bad path, unreadable file, missing columns, invalid options.
pub const EXIT_USAGE: u8 = 2;
/// The input had no usable rows.
pub const EXIT_NO_DATA: u8 = 3;
/// Internal failures (allocation contract violations, terminal, serialization).
pub const EXIT_INTERNAL: u8 = 4;

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

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(EXIT_INTERNAL, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<AllocError> for AppError {
    fn from(err: AllocError) -> Self {
        let code = match err {
            AllocError::InvalidConfig(_) => EXIT_USAGE,
            AllocError::EmptyCohort => EXIT_NO_DATA,
            AllocError::NoCapacity { .. } => EXIT_INTERNAL,
        };
        Self::new(code, err.to_string())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_errors_map_to_exit_codes() {
        assert_eq!(AppError::from(AllocError::InvalidConfig("x".into())).exit_code(), EXIT_USAGE);
        assert_eq!(AppError::from(AllocError::EmptyCohort).exit_code(), EXIT_NO_DATA);
        let err = AppError::from(AllocError::NoCapacity { student: 3 });
        assert_eq!(err.exit_code(), EXIT_INTERNAL);
        assert!(err.to_string().contains("#3"));
    }
}
