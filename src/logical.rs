//! Logical file engine
//!
//! One logical file is a header block, a run of transaction records and a
//! terminating checksum block inside a shared store. The engine keeps a
//! block index over the transactions and the running checksum, and applies
//! every mutation as insert/delete of whole blocks followed by an
//! incremental checksum update.
//!
//! Mutating operations return the block-count delta they caused; the
//! physical container applies that delta to the positions of the logical
//! files that follow. Instances are single-threaded by contract; the
//! scratch buffer is owned per instance and never shared.

use crate::diagnostics::{Diagnostic, Diagnostics, FieldCategory};
use crate::error::{DtausError, Result};
use crate::format::{field_ids, FormatProfile, RecordType};
use crate::progress::ProgressMonitor;
use crate::records::{Checksum, Header, Transaction, MAX_TRANSACTIONS};
use crate::store::BlockStore;
use crate::validation;

const INITIAL_INDEX: usize = 64;

/// Ordinal-to-block-offset index, offsets relative to the header block.
///
/// Grows by doubling up to the format's transaction maximum; unused slots
/// hold `-1`.
#[derive(Debug)]
pub struct TransactionIndex {
    offsets: Vec<i64>,
    count: usize,
}

impl TransactionIndex {
    pub fn new() -> Self {
        TransactionIndex {
            offsets: vec![-1; INITIAL_INDEX],
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, i: usize) -> Option<i64> {
        (i < self.count).then(|| self.offsets[i])
    }

    pub fn push(&mut self, offset: i64) -> Result<usize> {
        if self.count as u64 >= MAX_TRANSACTIONS {
            return Err(DtausError::TransactionLimit(MAX_TRANSACTIONS));
        }
        if self.count == self.offsets.len() {
            let grown = (self.offsets.len() * 2).min(MAX_TRANSACTIONS as usize);
            self.offsets.resize(grown, -1);
        }
        self.offsets[self.count] = offset;
        self.count += 1;
        Ok(self.count - 1)
    }

    /// Removes ordinal `i`, closing the gap. Offsets are not adjusted;
    /// callers follow up with [`shift_after`](Self::shift_after).
    pub fn remove(&mut self, i: usize) {
        self.offsets.copy_within(i + 1..self.count, i);
        self.offsets[self.count - 1] = -1;
        self.count -= 1;
    }

    /// Shifts the offsets of all ordinals after `i` by `delta` blocks.
    pub fn shift_after(&mut self, i: usize, delta: i64) {
        for offset in &mut self.offsets[i + 1..self.count] {
            *offset += delta;
        }
    }

    /// Shifts every live offset by `delta` blocks.
    pub fn shift_all(&mut self, delta: i64) {
        for offset in &mut self.offsets[..self.count] {
            *offset += delta;
        }
    }

    pub fn clear(&mut self) {
        self.offsets[..self.count].fill(-1);
        self.count = 0;
    }

    /// Entries beyond the live count, all expected to hold the sentinel.
    #[cfg(test)]
    pub fn spare_slots(&self) -> impl Iterator<Item = i64> + '_ {
        self.offsets[self.count..].iter().copied()
    }
}

impl Default for TransactionIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a full checksum scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Terminal checksum record reached; index and checksum rebuilt.
    Complete,
    /// The monitor requested cancellation; partial results were discarded.
    Cancelled,
    /// The block structure is unrecoverable (diagnostics describe why).
    Corrupt,
}

/// Engine state for one logical file.
#[derive(Debug)]
pub struct LogicalFile {
    header_block: u64,
    checksum_block: u64,
    cached_header: Option<Header>,
    cached_checksum: Checksum,
    debit_count: u64,
    credit_count: u64,
    index: TransactionIndex,
    scratch: Vec<u8>,
    lenient: bool,
}

impl LogicalFile {
    pub(crate) fn new(header_block: u64, checksum_block: u64, lenient: bool) -> Self {
        LogicalFile {
            header_block,
            checksum_block,
            cached_header: None,
            cached_checksum: Checksum::new(),
            debit_count: 0,
            credit_count: 0,
            index: TransactionIndex::new(),
            scratch: Vec::new(),
            lenient,
        }
    }

    pub fn header_block(&self) -> u64 {
        self.header_block
    }

    pub fn checksum_block(&self) -> u64 {
        self.checksum_block
    }

    /// Blocks this logical file occupies, header and checksum included.
    pub fn block_span(&self) -> u64 {
        self.checksum_block - self.header_block + 1
    }

    pub(crate) fn shift(&mut self, delta: i64) {
        self.header_block = (self.header_block as i64 + delta) as u64;
        self.checksum_block = (self.checksum_block as i64 + delta) as u64;
    }

    /// Defensive copy of the cached header.
    pub fn header(&self) -> Result<Header> {
        self.cached_header
            .clone()
            .ok_or_else(|| DtausError::CorruptRecord(self.header_block))
    }

    /// Defensive copy of the running checksum.
    pub fn checksum(&self) -> Checksum {
        self.cached_checksum
    }

    pub fn transaction_count(&self) -> u64 {
        self.index.len() as u64
    }

    // ----- record I/O helpers -----

    fn read_blocks<S: BlockStore>(
        &mut self,
        store: &mut S,
        first: u64,
        count: u64,
        block_size: u64,
    ) -> Result<()> {
        self.scratch.resize((count * block_size) as usize, 0);
        for i in 0..count {
            let start = (i * block_size) as usize;
            store.read_at(
                first + i,
                0,
                &mut self.scratch[start..start + block_size as usize],
            )?;
        }
        Ok(())
    }

    fn write_scratch<S: BlockStore>(
        &mut self,
        store: &mut S,
        first: u64,
        block_size: u64,
    ) -> Result<()> {
        let blocks = self.scratch.len() as u64 / block_size;
        for i in 0..blocks {
            let start = (i * block_size) as usize;
            store.write_at(first + i, 0, &self.scratch[start..start + block_size as usize])?;
        }
        Ok(())
    }

    /// Reads the transaction record starting at absolute block `abs`,
    /// returning the value and its block span.
    fn load_transaction<S: BlockStore>(
        &mut self,
        profile: &FormatProfile,
        store: &mut S,
        sink: &mut Diagnostics,
        abs: u64,
    ) -> Result<(Transaction, u64)> {
        let bs = profile.block_size;
        self.read_blocks(store, abs, profile.fixed_blocks, bs)?;
        let ext = profile.read_extension_count(&self.scratch, abs * bs, sink);
        if ext < 0 {
            return Err(DtausError::CorruptRecord(abs));
        }
        let blocks = profile.transaction_blocks(ext as usize);
        if blocks > profile.fixed_blocks {
            self.read_blocks(store, abs, blocks, bs)?;
        }
        let transaction = profile.read_transaction(&self.scratch, abs * bs, sink, self.lenient);
        Ok((transaction, blocks))
    }

    fn store_checksum<S: BlockStore>(
        &mut self,
        profile: &FormatProfile,
        store: &mut S,
    ) -> Result<()> {
        self.scratch.resize(profile.block_size as usize, 0);
        let checksum = self.cached_checksum;
        profile.write_checksum(&mut self.scratch, &checksum)?;
        self.write_scratch(store, self.checksum_block, profile.block_size)
    }

    fn record_counters(&mut self, transaction: &Transaction, delta: i64) {
        let counter = if transaction.kind.is_debit() {
            &mut self.debit_count
        } else {
            &mut self.credit_count
        };
        *counter = (*counter as i64 + delta) as u64;
    }

    // ----- public operations (driven through the container) -----

    pub(crate) fn write_initial<S: BlockStore>(
        &mut self,
        profile: &FormatProfile,
        store: &mut S,
        header: &Header,
    ) -> Result<()> {
        validation::validate_header(header)?;
        self.scratch.resize(profile.block_size as usize, 0);
        profile.write_header(&mut self.scratch, header)?;
        self.write_scratch(store, self.header_block, profile.block_size)?;
        self.cached_header = Some(header.clone());
        self.cached_checksum = Checksum::new();
        self.store_checksum(profile, store)?;
        store.flush()
    }

    /// Replaces the header. Rejected when the new label would drop a
    /// debit/credit capability that stored transactions still use.
    pub(crate) fn set_header<S: BlockStore>(
        &mut self,
        profile: &FormatProfile,
        store: &mut S,
        header: &Header,
    ) -> Result<Header> {
        validation::validate_header(header)?;
        let old = self.header()?;
        if self.debit_count > 0 && !header.label.allows_debit() {
            return Err(DtausError::HeaderCapability("debit"));
        }
        if self.credit_count > 0 && !header.label.allows_credit() {
            return Err(DtausError::HeaderCapability("credit"));
        }
        self.scratch.resize(profile.block_size as usize, 0);
        profile.write_header(&mut self.scratch, header)?;
        self.write_scratch(store, self.header_block, profile.block_size)?;
        self.cached_header = Some(header.clone());
        store.flush()?;
        Ok(old)
    }

    pub(crate) fn transaction<S: BlockStore>(
        &mut self,
        profile: &FormatProfile,
        store: &mut S,
        sink: &mut Diagnostics,
        i: usize,
    ) -> Result<Transaction> {
        let offset = self.index.get(i).ok_or(DtausError::IndexOutOfRange {
            index: i,
            count: self.index.len(),
        })?;
        let abs = (self.header_block as i64 + offset) as u64;
        let (transaction, _) = self.load_transaction(profile, store, sink, abs)?;
        Ok(transaction)
    }

    /// Appends a transaction before the checksum block. Returns the new
    /// ordinal and the block delta for the container's shift bookkeeping.
    pub(crate) fn add_transaction<S: BlockStore>(
        &mut self,
        profile: &FormatProfile,
        store: &mut S,
        transaction: &Transaction,
    ) -> Result<(usize, i64)> {
        validation::validate_transaction(transaction, &self.header()?)?;
        if self.index.len() as u64 >= MAX_TRANSACTIONS {
            return Err(DtausError::TransactionLimit(MAX_TRANSACTIONS));
        }
        let blocks = profile.transaction_blocks(transaction.extension_slots());
        let position = self.checksum_block;
        store.insert_blocks(position, blocks)?;

        self.scratch.resize((blocks * profile.block_size) as usize, 0);
        profile.write_transaction(&mut self.scratch, transaction)?;
        self.write_scratch(store, position, profile.block_size)?;

        let ordinal = self.index.push((position - self.header_block) as i64)?;
        self.cached_checksum.add(transaction);
        self.record_counters(transaction, 1);
        self.checksum_block += blocks;
        self.store_checksum(profile, store)?;
        store.flush()?;
        Ok((ordinal, blocks as i64))
    }

    /// Replaces the transaction at ordinal `i`, returning the previous
    /// value and the block delta.
    pub(crate) fn set_transaction<S: BlockStore>(
        &mut self,
        profile: &FormatProfile,
        store: &mut S,
        sink: &mut Diagnostics,
        i: usize,
        transaction: &Transaction,
    ) -> Result<(Transaction, i64)> {
        validation::validate_transaction(transaction, &self.header()?)?;
        let offset = self.index.get(i).ok_or(DtausError::IndexOutOfRange {
            index: i,
            count: self.index.len(),
        })?;
        let abs = (self.header_block as i64 + offset) as u64;
        let (old, old_blocks) = self.load_transaction(profile, store, sink, abs)?;

        let new_blocks = profile.transaction_blocks(transaction.extension_slots());
        let delta = new_blocks as i64 - old_blocks as i64;
        if delta > 0 {
            store.insert_blocks(abs + old_blocks, delta as u64)?;
        } else if delta < 0 {
            store.delete_blocks(abs + new_blocks, (-delta) as u64)?;
        }

        self.scratch
            .resize((new_blocks * profile.block_size) as usize, 0);
        profile.write_transaction(&mut self.scratch, transaction)?;
        self.write_scratch(store, abs, profile.block_size)?;

        self.index.shift_after(i, delta);
        self.cached_checksum.subtract(&old);
        self.cached_checksum.add(transaction);
        self.record_counters(&old, -1);
        self.record_counters(transaction, 1);
        self.checksum_block = (self.checksum_block as i64 + delta) as u64;
        self.store_checksum(profile, store)?;
        store.flush()?;
        Ok((old, delta))
    }

    /// Removes the transaction at ordinal `i`, returning it and the block
    /// delta (always negative).
    pub(crate) fn remove_transaction<S: BlockStore>(
        &mut self,
        profile: &FormatProfile,
        store: &mut S,
        sink: &mut Diagnostics,
        i: usize,
    ) -> Result<(Transaction, i64)> {
        let offset = self.index.get(i).ok_or(DtausError::IndexOutOfRange {
            index: i,
            count: self.index.len(),
        })?;
        let abs = (self.header_block as i64 + offset) as u64;
        let (old, blocks) = self.load_transaction(profile, store, sink, abs)?;

        store.delete_blocks(abs, blocks)?;
        self.index.remove(i);
        // After the gap closed, every entry from ordinal i on sits in a
        // shifted block.
        if i > 0 {
            self.index.shift_after(i - 1, -(blocks as i64));
        } else {
            self.index.shift_all(-(blocks as i64));
        }
        self.cached_checksum.subtract(&old);
        self.record_counters(&old, -1);
        self.checksum_block -= blocks;
        self.store_checksum(profile, store)?;
        store.flush()?;
        Ok((old, -(blocks as i64)))
    }

    /// Walks every block from the header forward, classifying records,
    /// rebuilding the index and recomputing the checksum. A stored
    /// checksum that disagrees with the recomputation is a diagnostic,
    /// not an abort.
    pub(crate) fn checksum_scan<S: BlockStore>(
        &mut self,
        profile: &FormatProfile,
        store: &mut S,
        sink: &mut Diagnostics,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<ScanOutcome> {
        let bs = profile.block_size;
        self.index.clear();
        self.debit_count = 0;
        self.credit_count = 0;

        self.read_blocks(store, self.header_block, 1, bs)?;
        if profile.record_type(&self.scratch) != Some(RecordType::Header) {
            sink.record(Diagnostic::IllegalData {
                field: field_ids::A_RECORD_TYPE,
                category: FieldCategory::Constant,
                position: self.header_block * bs + 4,
                raw: vec![self.scratch[4]],
            });
            return Ok(ScanOutcome::Corrupt);
        }
        self.cached_header =
            profile.read_header(&self.scratch, self.header_block * bs, sink, self.lenient);

        monitor.begin(store.block_count() - self.header_block);
        let mut computed = Checksum::new();
        let mut block = self.header_block + 1;
        loop {
            if block >= store.block_count() {
                sink.record(Diagnostic::IllegalData {
                    field: field_ids::E_RECORD_TYPE,
                    category: FieldCategory::Constant,
                    position: block * bs,
                    raw: Vec::new(),
                });
                self.discard_scan();
                return Ok(ScanOutcome::Corrupt);
            }
            self.read_blocks(store, block, 1, bs)?;
            match profile.record_type(&self.scratch) {
                Some(RecordType::Checksum) => {
                    let stored = profile.read_checksum(&self.scratch, block * bs, sink);
                    if !computed.matches_stored(&stored) {
                        sink.record(Diagnostic::ChecksumMismatch {
                            position: block * bs,
                            stored,
                            computed,
                        });
                    }
                    self.checksum_block = block;
                    self.cached_checksum = computed;
                    return Ok(ScanOutcome::Complete);
                }
                Some(RecordType::Transaction) => {
                    if monitor.cancelled() {
                        self.discard_scan();
                        return Ok(ScanOutcome::Cancelled);
                    }
                    let (transaction, blocks) =
                        match self.load_transaction(profile, store, sink, block) {
                            Ok(loaded) => loaded,
                            Err(DtausError::CorruptRecord(_)) => {
                                self.discard_scan();
                                return Ok(ScanOutcome::Corrupt);
                            }
                            // A record that claims blocks past the end of
                            // the store is a structural defect, not a
                            // caller mistake.
                            Err(DtausError::InvalidArgument(_)) => {
                                sink.record(Diagnostic::IllegalData {
                                    field: field_ids::C_RECORD_LENGTH,
                                    category: FieldCategory::Constant,
                                    position: block * bs,
                                    raw: Vec::new(),
                                });
                                self.discard_scan();
                                return Ok(ScanOutcome::Corrupt);
                            }
                            Err(other) => return Err(other),
                        };
                    self.index.push((block - self.header_block) as i64)?;
                    computed.add(&transaction);
                    self.record_counters(&transaction, 1);
                    monitor.advance(blocks);
                    block += blocks;
                }
                _ => {
                    sink.record(Diagnostic::IllegalData {
                        field: field_ids::E_RECORD_TYPE,
                        category: FieldCategory::Constant,
                        position: block * bs + 4,
                        raw: vec![self.scratch[4]],
                    });
                    self.discard_scan();
                    return Ok(ScanOutcome::Corrupt);
                }
            }
        }
    }

    fn discard_scan(&mut self) {
        self.index.clear();
        self.cached_checksum = Checksum::new();
        self.debit_count = 0;
        self.credit_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_push_and_get() {
        let mut index = TransactionIndex::new();
        assert_eq!(index.push(1).unwrap(), 0);
        assert_eq!(index.push(3).unwrap(), 1);
        assert_eq!(index.get(0), Some(1));
        assert_eq!(index.get(1), Some(3));
        assert_eq!(index.get(2), None);
    }

    #[test]
    fn test_index_grows_by_doubling() {
        let mut index = TransactionIndex::new();
        for i in 0..(INITIAL_INDEX * 2 + 1) {
            index.push(i as i64).unwrap();
        }
        assert_eq!(index.len(), INITIAL_INDEX * 2 + 1);
        assert_eq!(index.get(INITIAL_INDEX * 2), Some((INITIAL_INDEX * 2) as i64));
    }

    #[test]
    fn test_index_remove_and_shift() {
        let mut index = TransactionIndex::new();
        for offset in [1, 3, 6, 9] {
            index.push(offset).unwrap();
        }
        index.remove(1);
        index.shift_after(0, -3);
        assert_eq!(index.len(), 3);
        assert_eq!(index.get(0), Some(1));
        assert_eq!(index.get(1), Some(3));
        assert_eq!(index.get(2), Some(6));
        assert!(index.spare_slots().all(|slot| slot == -1));
    }

    #[test]
    fn test_index_enforces_transaction_limit() {
        let mut index = TransactionIndex::new();
        for i in 0..MAX_TRANSACTIONS {
            index.push(i as i64).unwrap();
        }
        assert!(matches!(
            index.push(0),
            Err(DtausError::TransactionLimit(MAX_TRANSACTIONS))
        ));
    }

    #[test]
    fn test_index_sentinel_after_clear() {
        let mut index = TransactionIndex::new();
        index.push(1).unwrap();
        index.push(2).unwrap();
        index.clear();
        assert!(index.is_empty());
        assert!(index.spare_slots().all(|slot| slot == -1));
    }
}
