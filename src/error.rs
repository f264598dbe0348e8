use crate::diagnostics::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DtausError {
    #[error("Index out of range: {index} (live transactions: {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Logical file index out of range: {index} (logical files: {count})")]
    FileIndexOutOfRange { index: usize, count: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Transaction limit reached: a logical file holds at most {0} transactions")]
    TransactionLimit(u64),

    #[error("Header replacement would remove {0} capability still used by stored transactions")]
    HeaderCapability(&'static str),

    #[error("Store contains invalid data ({} diagnostics)", .0.len())]
    Invalid(Vec<Diagnostic>),

    #[error("Unreadable record structure at block {0}")]
    CorruptRecord(u64),

    #[error("Operation cancelled by the progress monitor")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DtausError>;
