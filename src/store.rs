//! Block-addressable storage backends
//!
//! The engine only ever touches storage through [`BlockStore`]. Insert and
//! delete preserve the relative order of blocks outside the affected range;
//! the container applies the resulting position shifts to its logical
//! files.

use crate::error::{DtausError, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Random-access store of fixed-size blocks.
pub trait BlockStore {
    fn block_size(&self) -> u64;

    fn block_count(&self) -> u64;

    /// Reads `buf.len()` bytes starting at `offset` within `block`.
    fn read_at(&mut self, block: u64, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Writes `buf` starting at `offset` within `block`.
    fn write_at(&mut self, block: u64, offset: u64, buf: &[u8]) -> Result<()>;

    /// Inserts `count` zeroed blocks before `before`; blocks at and after
    /// `before` move up by `count`.
    fn insert_blocks(&mut self, before: u64, count: u64) -> Result<()>;

    /// Deletes `count` blocks starting at `from`; later blocks move down.
    fn delete_blocks(&mut self, from: u64, count: u64) -> Result<()>;

    /// Persists pending writes.
    fn flush(&mut self) -> Result<()>;
}

fn check_window(
    block_size: u64,
    block_count: u64,
    block: u64,
    offset: u64,
    len: usize,
) -> Result<()> {
    if block >= block_count {
        return Err(DtausError::InvalidArgument(format!(
            "block {block} outside store of {block_count} blocks"
        )));
    }
    if offset + len as u64 > block_size {
        return Err(DtausError::InvalidArgument(format!(
            "window {offset}+{len} exceeds block size {block_size}"
        )));
    }
    Ok(())
}

/// In-memory store over a contiguous byte vector.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    data: Vec<u8>,
    block_size: u64,
}

impl MemoryStore {
    /// Wraps existing bytes; the length must be a multiple of `block_size`.
    pub fn new(data: Vec<u8>, block_size: u64) -> Result<Self> {
        if block_size == 0 || data.len() as u64 % block_size != 0 {
            return Err(DtausError::InvalidArgument(format!(
                "store length {} is not a multiple of block size {block_size}",
                data.len()
            )));
        }
        Ok(MemoryStore { data, block_size })
    }

    pub fn empty(block_size: u64) -> Self {
        MemoryStore {
            data: Vec::new(),
            block_size,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl BlockStore for MemoryStore {
    fn block_size(&self) -> u64 {
        self.block_size
    }

    fn block_count(&self) -> u64 {
        self.data.len() as u64 / self.block_size
    }

    fn read_at(&mut self, block: u64, offset: u64, buf: &mut [u8]) -> Result<()> {
        check_window(self.block_size, self.block_count(), block, offset, buf.len())?;
        let start = (block * self.block_size + offset) as usize;
        buf.copy_from_slice(&self.data[start..start + buf.len()]);
        Ok(())
    }

    fn write_at(&mut self, block: u64, offset: u64, buf: &[u8]) -> Result<()> {
        check_window(self.block_size, self.block_count(), block, offset, buf.len())?;
        let start = (block * self.block_size + offset) as usize;
        self.data[start..start + buf.len()].copy_from_slice(buf);
        Ok(())
    }

    fn insert_blocks(&mut self, before: u64, count: u64) -> Result<()> {
        if before > self.block_count() {
            return Err(DtausError::InvalidArgument(format!(
                "insert position {before} outside store of {} blocks",
                self.block_count()
            )));
        }
        let at = (before * self.block_size) as usize;
        let zeroes = vec![0u8; (count * self.block_size) as usize];
        self.data.splice(at..at, zeroes);
        Ok(())
    }

    fn delete_blocks(&mut self, from: u64, count: u64) -> Result<()> {
        if from + count > self.block_count() {
            return Err(DtausError::InvalidArgument(format!(
                "delete range {from}+{count} outside store of {} blocks",
                self.block_count()
            )));
        }
        let start = (from * self.block_size) as usize;
        let end = start + (count * self.block_size) as usize;
        self.data.drain(start..end);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Seek-based file store.
///
/// Insert and delete rewrite the tail of the file; DTAUS files are small
/// enough (a few MB at the transaction maximum) that this stays cheap.
pub struct FileStore {
    file: File,
    path: PathBuf,
    block_size: u64,
    block_count: u64,
}

impl FileStore {
    /// Creates a new empty store, truncating any existing file.
    pub fn create<P: AsRef<Path>>(path: P, block_size: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Ok(FileStore {
            file,
            path: path.as_ref().to_path_buf(),
            block_size,
            block_count: 0,
        })
    }

    /// Opens an existing file; the length must be a multiple of
    /// `block_size`.
    pub fn open<P: AsRef<Path>>(path: P, block_size: u64) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();
        if block_size == 0 || len % block_size != 0 {
            return Err(DtausError::InvalidArgument(format!(
                "file length {len} is not a multiple of block size {block_size}"
            )));
        }
        Ok(FileStore {
            file,
            path: path.as_ref().to_path_buf(),
            block_size,
            block_count: len / block_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_tail(&mut self, from_block: u64) -> Result<Vec<u8>> {
        let start = from_block * self.block_size;
        let len = (self.block_count - from_block) * self.block_size;
        let mut tail = vec![0u8; len as usize];
        self.file.seek(SeekFrom::Start(start))?;
        self.file.read_exact(&mut tail)?;
        Ok(tail)
    }
}

impl BlockStore for FileStore {
    fn block_size(&self) -> u64 {
        self.block_size
    }

    fn block_count(&self) -> u64 {
        self.block_count
    }

    fn read_at(&mut self, block: u64, offset: u64, buf: &mut [u8]) -> Result<()> {
        check_window(self.block_size, self.block_count, block, offset, buf.len())?;
        self.file
            .seek(SeekFrom::Start(block * self.block_size + offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, block: u64, offset: u64, buf: &[u8]) -> Result<()> {
        check_window(self.block_size, self.block_count, block, offset, buf.len())?;
        self.file
            .seek(SeekFrom::Start(block * self.block_size + offset))?;
        self.file.write_all(buf)?;
        Ok(())
    }

    fn insert_blocks(&mut self, before: u64, count: u64) -> Result<()> {
        if before > self.block_count {
            return Err(DtausError::InvalidArgument(format!(
                "insert position {before} outside store of {} blocks",
                self.block_count
            )));
        }
        let tail = self.read_tail(before)?;
        self.file
            .seek(SeekFrom::Start(before * self.block_size))?;
        self.file
            .write_all(&vec![0u8; (count * self.block_size) as usize])?;
        self.file.write_all(&tail)?;
        self.block_count += count;
        Ok(())
    }

    fn delete_blocks(&mut self, from: u64, count: u64) -> Result<()> {
        if from + count > self.block_count {
            return Err(DtausError::InvalidArgument(format!(
                "delete range {from}+{count} outside store of {} blocks",
                self.block_count
            )));
        }
        let tail = self.read_tail(from + count)?;
        self.file.seek(SeekFrom::Start(from * self.block_size))?;
        self.file.write_all(&tail)?;
        self.block_count -= count;
        self.file.set_len(self.block_count * self.block_size)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}
