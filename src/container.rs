//! Physical file container
//!
//! A physical file is a sequence of logical files laid out back to back
//! in one block store. The container owns the store and is the only
//! writer of logical-file positions: every mutation that grows or
//! shrinks a logical file reports its block delta here, and the
//! container shifts the positions of all files that follow.

use tracing::info;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{DtausError, Result};
use crate::format::{Format, FormatProfile};
use crate::logical::{LogicalFile, ScanOutcome};
use crate::progress::{NoProgress, ProgressMonitor};
use crate::records::{Checksum, Header, Transaction};
use crate::store::BlockStore;

/// Container over a block store holding zero or more logical files.
#[derive(Debug)]
pub struct PhysicalFile<S: BlockStore> {
    store: S,
    profile: &'static FormatProfile,
    files: Vec<LogicalFile>,
    diagnostics: Diagnostics,
    lenient: bool,
}

impl<S: BlockStore> PhysicalFile<S> {
    pub(crate) fn new(store: S, format: Format, lenient: bool) -> Self {
        PhysicalFile {
            store,
            profile: format.profile(),
            files: Vec::new(),
            diagnostics: Diagnostics::new(),
            lenient,
        }
    }

    pub fn format(&self) -> Format {
        self.profile.format
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Diagnostics recorded so far, opening scan included.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.get_all()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take_all()
    }

    /// Scans the whole store, rebuilding index and checksum state for
    /// every logical file found. Called once after opening.
    pub(crate) fn open_scan(&mut self, monitor: &mut dyn ProgressMonitor) -> Result<ScanOutcome> {
        let mut block = 0;
        while block < self.store.block_count() {
            let mut file = LogicalFile::new(block, block, self.lenient);
            let outcome = file.checksum_scan(
                self.profile,
                &mut self.store,
                &mut self.diagnostics,
                monitor,
            )?;
            match outcome {
                ScanOutcome::Complete => {
                    block = file.checksum_block() + 1;
                    self.files.push(file);
                }
                ScanOutcome::Cancelled | ScanOutcome::Corrupt => {
                    self.files.clear();
                    return Ok(outcome);
                }
            }
        }
        info!(
            files = self.files.len(),
            blocks = self.store.block_count(),
            "opened {} container",
            self.profile.format
        );
        Ok(ScanOutcome::Complete)
    }

    /// Appends an empty logical file (header and checksum record only)
    /// after the last existing one.
    pub fn add_logical_file(&mut self, header: &Header) -> Result<usize> {
        let position = self
            .files
            .last()
            .map(|file| file.checksum_block() + 1)
            .unwrap_or(0);
        self.store.insert_blocks(position, 2)?;
        let mut file = LogicalFile::new(position, position + 1, self.lenient);
        match file.write_initial(self.profile, &mut self.store, header) {
            Ok(()) => {}
            Err(e) => {
                // Roll the block insertion back so a rejected header
                // leaves the store unchanged.
                self.store.delete_blocks(position, 2)?;
                return Err(e);
            }
        }
        self.files.push(file);
        info!(index = self.files.len() - 1, "added logical file");
        Ok(self.files.len() - 1)
    }

    /// Removes the logical file at `index` with all its transactions.
    pub fn remove_logical_file(&mut self, index: usize) -> Result<()> {
        if index >= self.files.len() {
            return Err(DtausError::FileIndexOutOfRange {
                index,
                count: self.files.len(),
            });
        }
        let file = self.files.remove(index);
        let span = file.block_span();
        self.store.delete_blocks(file.header_block(), span)?;
        for later in &mut self.files[index..] {
            later.shift(-(span as i64));
        }
        self.store.flush()?;
        info!(index, blocks = span, "removed logical file");
        Ok(())
    }

    /// Borrows the logical file at `index` for reading and mutation.
    pub fn file(&mut self, index: usize) -> Result<LogicalFileHandle<'_, S>> {
        if index >= self.files.len() {
            return Err(DtausError::FileIndexOutOfRange {
                index,
                count: self.files.len(),
            });
        }
        Ok(LogicalFileHandle {
            container: self,
            index,
        })
    }

    /// Flushes and hands the store back to the caller.
    pub fn commit(mut self) -> Result<S> {
        self.store.flush()?;
        Ok(self.store)
    }

    fn apply_delta(&mut self, index: usize, delta: i64) {
        if delta != 0 {
            for later in &mut self.files[index + 1..] {
                later.shift(delta);
            }
        }
    }
}

/// Borrowed view of one logical file inside a container.
///
/// All mutations go through the handle so the container can keep the
/// positions of the following logical files in step.
pub struct LogicalFileHandle<'a, S: BlockStore> {
    container: &'a mut PhysicalFile<S>,
    index: usize,
}

impl<S: BlockStore> LogicalFileHandle<'_, S> {
    fn file(&self) -> &LogicalFile {
        &self.container.files[self.index]
    }

    pub fn header(&self) -> Result<Header> {
        self.file().header()
    }

    pub fn checksum(&self) -> Checksum {
        self.file().checksum()
    }

    pub fn transaction_count(&self) -> u64 {
        self.file().transaction_count()
    }

    pub fn transaction(&mut self, i: usize) -> Result<Transaction> {
        let container = &mut *self.container;
        container.files[self.index].transaction(
            container.profile,
            &mut container.store,
            &mut container.diagnostics,
            i,
        )
    }

    pub fn set_header(&mut self, header: &Header) -> Result<Header> {
        let container = &mut *self.container;
        container.files[self.index].set_header(container.profile, &mut container.store, header)
    }

    /// Appends a transaction, returning its ordinal.
    pub fn add_transaction(&mut self, transaction: &Transaction) -> Result<usize> {
        let container = &mut *self.container;
        let (ordinal, delta) = container.files[self.index].add_transaction(
            container.profile,
            &mut container.store,
            transaction,
        )?;
        container.apply_delta(self.index, delta);
        Ok(ordinal)
    }

    /// Replaces the transaction at ordinal `i`, returning the old value.
    pub fn set_transaction(&mut self, i: usize, transaction: &Transaction) -> Result<Transaction> {
        let container = &mut *self.container;
        let (old, delta) = container.files[self.index].set_transaction(
            container.profile,
            &mut container.store,
            &mut container.diagnostics,
            i,
            transaction,
        )?;
        container.apply_delta(self.index, delta);
        Ok(old)
    }

    /// Removes the transaction at ordinal `i`, returning it.
    pub fn remove_transaction(&mut self, i: usize) -> Result<Transaction> {
        let container = &mut *self.container;
        let (old, delta) = container.files[self.index].remove_transaction(
            container.profile,
            &mut container.store,
            &mut container.diagnostics,
            i,
        )?;
        container.apply_delta(self.index, delta);
        Ok(old)
    }

    /// Recomputes index and checksum from the stored blocks.
    pub fn rescan(&mut self) -> Result<ScanOutcome> {
        let container = &mut *self.container;
        container.files[self.index].checksum_scan(
            container.profile,
            &mut container.store,
            &mut container.diagnostics,
            &mut NoProgress,
        )
    }
}
