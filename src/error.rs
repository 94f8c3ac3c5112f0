/// Unified error type for the bitset engine
/// Allocation failure is the only runtime error category; contract
/// violations fail fast via assertions instead.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitsetError {
    /// Memory errors: the injected budget refused an allocation
    #[error("Memory error: {message}")]
    Memory {
        message: String,
        requested: Option<usize>,
    },
}

impl BitsetError {
    pub fn memory(message: impl Into<String>, requested: usize) -> Self {
        Self::Memory {
            message: message.into(),
            requested: Some(requested),
        }
    }
}

pub type Result<T> = std::result::Result<T, BitsetError>;
