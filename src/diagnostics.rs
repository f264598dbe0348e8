//! Structured findings collected while reading a store
//!
//! Malformed field data never aborts a scan. Each finding is recorded here
//! with enough context (field id, category, absolute byte position, raw
//! bytes) for a caller to locate and repair the source file. Only findings
//! of [`Severity::Error`] make an open fail.

use serde::{Deserialize, Serialize};

/// Semantic class of a record field, used to pick the validation charset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldCategory {
    Numeric,
    Alphanumeric,
    Alphabetic,
    Constant,
    PackedPositive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One non-fatal finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Bytes at `position` do not form a valid value for `field`.
    IllegalData {
        field: u32,
        category: FieldCategory,
        position: u64,
        raw: Vec<u8>,
    },

    /// A code read from the store is structurally valid but not one this
    /// engine supports (unknown label, transaction-type key, currency).
    UnsupportedCode {
        field: u32,
        position: u64,
        code: String,
    },

    /// The stored checksum record disagrees with the recomputed sums.
    ChecksumMismatch {
        position: u64,
        stored: crate::records::Checksum,
        computed: crate::records::Checksum,
    },

    /// Store length is not a positive multiple of the block size.
    IllegalFileLength { length: u64, block_size: u64 },

    /// The leading bytes match neither the disk nor the tape profile.
    UnsupportedFormat { leader: Vec<u8> },

    /// Advisory note attached to an otherwise successful operation.
    Advisory { message: String },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::Advisory { .. } => Severity::Info,
            Diagnostic::ChecksumMismatch { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Accumulating recorder handed to every read path.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn get_all(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|d| d.severity() == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Drains all recorded findings, leaving the recorder empty.
    pub fn take_all(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.items)
    }
}
