//! DTAUS Payment File Engine
//!
//! A mutable engine for DTAUS interbank payment files, the block-structured
//! exchange format of the German banking industry.
//!
//! ## Features
//!
//! - **Two physical profiles**: 128-byte ASCII "disk" blocks and 150-byte
//!   EBCDIC "tape" blocks with packed-decimal and binary numerics
//! - **Logical file engine** with an ordinal index over transactions and an
//!   incrementally maintained checksum record
//! - **In-place mutation**: add, replace and remove transactions as whole-block
//!   insertions and deletions, no full rewrite
//! - **Recoverable reads**: corrupt field data becomes diagnostics, never a
//!   panic or an aborted scan
//! - **Format detection** from the leading bytes of a physical file
//!
//! ## Modules
//!
//! - [`error`] - Error type and crate-wide `Result`
//! - [`diagnostics`] - Recoverable findings collected while reading stores
//! - [`encoding`] - DIN-66003 ASCII and CP273 EBCDIC character tables
//! - [`fields`] - Field codecs: plain digits, packed decimal, binary, dates
//! - [`records`] - Header, transaction and checksum value types
//! - [`format`] - The disk and tape format profiles (field layout tables)
//! - [`validation`] - Contract checks for values handed to the write APIs
//! - [`store`] - Block store abstraction with memory and file backends
//! - [`logical`] - The logical file engine (index, checksum, scan)
//! - [`container`] - The physical file container over a block store
//! - [`factory`] - Format detection and container opening
//! - [`progress`] - Progress reporting and cancellation for long scans
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use dtaus::factory::{open_path, OpenOptions};
//! use dtaus::records::{BankAccount, Header, Label, Schedule, Transaction, TransactionType};
//! use dtaus::Format;
//!
//! # fn main() -> dtaus::Result<()> {
//! let options = OpenOptions::new().default_format(Format::Disk);
//! let mut container = open_path("payments.dta", &options)?;
//!
//! let header = Header {
//!     label: Label::CustomerCredit,
//!     recipient_bank_code: 37040044,
//!     sender_bank_code: 0,
//!     sender_name: "TESTFIRMA".into(),
//!     account: 1234567,
//!     reference: 0,
//!     schedule: Schedule::new(NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()),
//!     currency: '1',
//! };
//! let index = container.add_logical_file(&header)?;
//!
//! let mut file = container.file(index)?;
//! file.add_transaction(&Transaction {
//!     kind: TransactionType::new(51, 0),
//!     amount: 123_45,
//!     primary_bank_code: 0,
//!     target: BankAccount {
//!         bank_code: 37040044,
//!         account: 1111111111,
//!         name: "EMPFAENGER".into(),
//!     },
//!     executive: BankAccount {
//!         bank_code: 50010517,
//!         account: 2222222222,
//!         name: "AUFTRAGGEBER".into(),
//!     },
//!     target_ext: None,
//!     executive_ext: None,
//!     reference: 0,
//!     currency: '1',
//!     descriptions: vec!["RECHNUNG 42".into()],
//! })?;
//!
//! container.commit()?;
//! # Ok(())
//! # }
//! ```

pub mod container;
pub mod diagnostics;
pub mod encoding;
pub mod error;
pub mod factory;
pub mod fields;
pub mod format;
pub mod logical;
pub mod progress;
pub mod records;
pub mod store;
pub mod validation;

pub use container::{LogicalFileHandle, PhysicalFile};
pub use diagnostics::{Diagnostic, Diagnostics, FieldCategory, Severity};
pub use error::{DtausError, Result};
pub use factory::{detect_format, open_bytes, open_path, OpenOptions};
pub use format::Format;
pub use logical::ScanOutcome;
pub use progress::{NoProgress, ProgressMonitor};
pub use records::{
    BankAccount, Checksum, Header, Label, Schedule, Transaction, TransactionType,
};
pub use store::{BlockStore, FileStore, MemoryStore};
