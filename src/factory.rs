//! Format detection and container opening
//!
//! The first bytes of a physical file identify its format: the disk
//! profile starts every record with the ASCII block length `"0128"`,
//! the tape profile with a two-byte big-endian record length of 150.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::container::PhysicalFile;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{DtausError, Result};
use crate::format::Format;
use crate::logical::ScanOutcome;
use crate::progress::{NoProgress, ProgressMonitor};
use crate::store::{FileStore, MemoryStore};

/// Options controlling how a container is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    /// Format assumed for an empty store. An empty store with no
    /// default is an error.
    pub default_format: Option<Format>,
    /// Treat all-space numeric fields as zero instead of recording a
    /// diagnostic for them.
    pub spaces_as_zero: bool,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_format(mut self, format: Format) -> Self {
        self.default_format = Some(format);
        self
    }

    pub fn spaces_as_zero(mut self, yes: bool) -> Self {
        self.spaces_as_zero = yes;
        self
    }
}

/// Identifies the format from the leading bytes of a physical file.
///
/// Detection failures and length mismatches are recorded as
/// diagnostics; `None` means no profile matched.
pub fn detect_format(leader: &[u8], total_len: u64, sink: &mut Diagnostics) -> Option<Format> {
    if leader.len() < 4 || total_len < Format::Disk.block_size() {
        // Shorter than any block; 128 is the smaller profile block.
        sink.record(Diagnostic::IllegalFileLength {
            length: total_len,
            block_size: Format::Disk.block_size(),
        });
        return None;
    }
    let format = if &leader[..4] == b"0128" {
        Format::Disk
    } else if u16::from_be_bytes([leader[0], leader[1]]) == 150 {
        Format::Tape
    } else {
        sink.record(Diagnostic::UnsupportedFormat {
            leader: leader[..4].to_vec(),
        });
        return None;
    };
    let block_size = format.block_size();
    if total_len % block_size != 0 {
        sink.record(Diagnostic::IllegalFileLength {
            length: total_len,
            block_size,
        });
        return None;
    }
    Some(format)
}

fn scan_opened<S: crate::store::BlockStore>(
    mut container: PhysicalFile<S>,
    monitor: &mut dyn ProgressMonitor,
) -> Result<PhysicalFile<S>> {
    match container.open_scan(monitor)? {
        ScanOutcome::Complete => {
            // Warnings (a stale stored checksum) survive the open; data
            // errors do not.
            if container
                .diagnostics()
                .iter()
                .any(|d| d.severity() == crate::diagnostics::Severity::Error)
            {
                return Err(DtausError::Invalid(container.take_diagnostics()));
            }
            Ok(container)
        }
        ScanOutcome::Cancelled => Err(DtausError::Cancelled),
        ScanOutcome::Corrupt => Err(DtausError::Invalid(container.take_diagnostics())),
    }
}

/// Opens a container over in-memory bytes.
///
/// An empty byte vector starts a fresh container in the configured
/// default format.
pub fn open_bytes(bytes: Vec<u8>, options: &OpenOptions) -> Result<PhysicalFile<MemoryStore>> {
    open_bytes_with(bytes, options, &mut NoProgress)
}

pub fn open_bytes_with(
    bytes: Vec<u8>,
    options: &OpenOptions,
    monitor: &mut dyn ProgressMonitor,
) -> Result<PhysicalFile<MemoryStore>> {
    if bytes.is_empty() {
        let format = options
            .default_format
            .ok_or_else(|| DtausError::InvalidArgument("empty store and no default format".into()))?;
        info!("starting empty {format} container");
        let store = MemoryStore::empty(format.block_size());
        return Ok(PhysicalFile::new(store, format, options.spaces_as_zero));
    }

    let mut sink = Diagnostics::new();
    let format = detect_format(&bytes[..bytes.len().min(4)], bytes.len() as u64, &mut sink)
        .ok_or_else(|| DtausError::Invalid(sink.take_all()))?;
    let store = MemoryStore::new(bytes, format.block_size())?;
    scan_opened(
        PhysicalFile::new(store, format, options.spaces_as_zero),
        monitor,
    )
}

/// Opens a container backed by a file on disk.
///
/// A missing or empty file starts a fresh container in the configured
/// default format.
pub fn open_path<P: AsRef<Path>>(
    path: P,
    options: &OpenOptions,
) -> Result<PhysicalFile<FileStore>> {
    open_path_with(path, options, &mut NoProgress)
}

pub fn open_path_with<P: AsRef<Path>>(
    path: P,
    options: &OpenOptions,
    monitor: &mut dyn ProgressMonitor,
) -> Result<PhysicalFile<FileStore>> {
    let path = path.as_ref();
    let length = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(e) => return Err(e.into()),
    };
    if length == 0 {
        let format = options
            .default_format
            .ok_or_else(|| DtausError::InvalidArgument("empty store and no default format".into()))?;
        info!(path = %path.display(), "starting empty {format} container");
        let store = FileStore::create(path, format.block_size())?;
        return Ok(PhysicalFile::new(store, format, options.spaces_as_zero));
    }

    let mut leader = [0u8; 4];
    let read = {
        use std::io::Read;
        let mut file = fs::File::open(path)?;
        file.read(&mut leader)?
    };
    let mut sink = Diagnostics::new();
    let format = detect_format(&leader[..read], length, &mut sink)
        .ok_or_else(|| DtausError::Invalid(sink.take_all()))?;
    info!(path = %path.display(), "opening {format} container");
    let store = FileStore::open(path, format.block_size())?;
    scan_opened(
        PhysicalFile::new(store, format, options.spaces_as_zero),
        monitor,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_disk() {
        let mut sink = Diagnostics::new();
        assert_eq!(
            detect_format(b"0128", 256, &mut sink),
            Some(Format::Disk)
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_detect_tape() {
        let mut sink = Diagnostics::new();
        assert_eq!(
            detect_format(&[0x00, 0x96, 0x00, 0x00], 300, &mut sink),
            Some(Format::Tape)
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_detect_unknown_leader() {
        let mut sink = Diagnostics::new();
        assert_eq!(detect_format(b"XXXX", 128, &mut sink), None);
        assert!(matches!(
            sink.get_all()[0],
            Diagnostic::UnsupportedFormat { .. }
        ));
    }

    #[test]
    fn test_detect_length_not_block_multiple() {
        let mut sink = Diagnostics::new();
        assert_eq!(detect_format(b"0128", 257, &mut sink), None);
        assert!(matches!(
            sink.get_all()[0],
            Diagnostic::IllegalFileLength {
                length: 257,
                block_size: 128
            }
        ));
    }

    #[test]
    fn test_detect_short_leader() {
        let mut sink = Diagnostics::new();
        assert_eq!(detect_format(b"01", 2, &mut sink), None);
        assert!(matches!(
            sink.get_all()[0],
            Diagnostic::IllegalFileLength { length: 2, .. }
        ));
    }

    #[test]
    fn test_detect_below_one_block() {
        // Length wins over the leader: a sub-block store is an illegal
        // length even when the first bytes match no profile.
        let mut sink = Diagnostics::new();
        assert_eq!(detect_format(b"XXXX", 100, &mut sink), None);
        assert!(matches!(
            sink.get_all()[0],
            Diagnostic::IllegalFileLength {
                length: 100,
                block_size: 128
            }
        ));
    }

    #[test]
    fn test_open_empty_without_default_format() {
        let err = open_bytes(Vec::new(), &OpenOptions::new());
        assert!(matches!(err, Err(DtausError::InvalidArgument(_))));
    }
}
