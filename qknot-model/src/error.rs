use std::fmt::{self, Display};

/// Errors produced by model constructors and parsing routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    InvalidOptimizationLevel(u8),
    InvalidClosureMethod(String),
    EmptyIdentifier(&'static str),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidOptimizationLevel(level) => write!(
                f,
                "optimization level must be between 0 and 3, got {level}"
            ),
            ModelError::InvalidClosureMethod(raw) => write!(
                f,
                "closure method must be either 'trace' or 'plat', got '{raw}'"
            ),
            ModelError::EmptyIdentifier(kind) => {
                write!(f, "{kind} cannot be empty")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
