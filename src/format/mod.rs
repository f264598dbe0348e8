//! Physical format profiles
//!
//! A [`FormatProfile`] is plain data: block size, encoding, and the field
//! tables for the three record layouts. Record encode/decode walks those
//! tables; nothing here talks to a store, the logical file engine hands in
//! a scratch buffer covering the record's blocks.

pub mod disk;
pub mod tape;

use crate::diagnostics::{Diagnostic, Diagnostics, FieldCategory};
use crate::encoding::Encoding;
use crate::error::Result;
use crate::fields;
use crate::records::{Checksum, Header, Label, Schedule, Transaction, TransactionType};
use serde::{Deserialize, Serialize};

pub use disk::DISK;
pub use tape::TAPE;

/// Field identifiers carried in diagnostics, numbered per record.
pub mod field_ids {
    pub const A_SELF_CHECK: u32 = 0xA1;
    pub const A_RECORD_TYPE: u32 = 0xA2;
    pub const A_LABEL: u32 = 0xA3;
    pub const A_RECIPIENT_BANK: u32 = 0xA4;
    pub const A_SENDER_BANK: u32 = 0xA5;
    pub const A_SENDER_NAME: u32 = 0xA6;
    pub const A_CREATE_DATE: u32 = 0xA7;
    pub const A_ACCOUNT: u32 = 0xA9;
    pub const A_REFERENCE: u32 = 0xAA;
    pub const A_EXECUTION_DATE: u32 = 0xAB;
    pub const A_CURRENCY: u32 = 0xAC;

    pub const C_RECORD_LENGTH: u32 = 0xC1;
    pub const C_RECORD_TYPE: u32 = 0xC2;
    pub const C_PRIMARY_BANK: u32 = 0xC3;
    pub const C_TARGET_BANK: u32 = 0xC4;
    pub const C_TARGET_ACCOUNT: u32 = 0xC5;
    pub const C_REFERENCE: u32 = 0xC6;
    pub const C_TYPE_KEY: u32 = 0xC7;
    pub const C_TYPE_EXT: u32 = 0xC8;
    pub const C_ZEROS: u32 = 0xC9;
    pub const C_EXECUTIVE_BANK: u32 = 0xCA;
    pub const C_EXECUTIVE_ACCOUNT: u32 = 0xCB;
    pub const C_AMOUNT: u32 = 0xCC;
    pub const C_TARGET_NAME: u32 = 0xCE;
    pub const C_EXECUTIVE_NAME: u32 = 0xCF;
    pub const C_DESCRIPTION: u32 = 0xD0;
    pub const C_CURRENCY: u32 = 0xD1;
    pub const C_EXT_COUNT: u32 = 0xD2;
    pub const C_EXT_TAG: u32 = 0xD3;
    pub const C_EXT_VALUE: u32 = 0xD4;

    pub const E_SELF_CHECK: u32 = 0xE1;
    pub const E_RECORD_TYPE: u32 = 0xE2;
    pub const E_COUNT: u32 = 0xE4;
    pub const E_ZEROS: u32 = 0xE5;
    pub const E_SUM_ACCOUNT: u32 = 0xE6;
    pub const E_SUM_BANK: u32 = 0xE7;
    pub const E_SUM_AMOUNT: u32 = 0xE8;
}

/// The two standardized physical formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    /// 128-byte blocks, ASCII, plain-digit numerics.
    Disk,
    /// 150-byte blocks, EBCDIC, packed-decimal and binary numerics.
    Tape,
}

impl Format {
    pub fn profile(&self) -> &'static FormatProfile {
        match self {
            Format::Disk => &DISK,
            Format::Tape => &TAPE,
        }
    }

    pub fn block_size(&self) -> u64 {
        self.profile().block_size
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Format::Disk => "disk",
            Format::Tape => "tape",
        })
    }
}

/// Record classification by the type tag at offset 4 of the first block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Header,
    Transaction,
    Checksum,
}

/// Wire representation of one numeric or text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain digits in the profile encoding.
    Digits,
    /// Packed decimal, no sign nibble.
    Packed,
    /// Packed decimal with a trailing positive sign nibble.
    PackedSigned,
    /// Big-endian raw binary.
    Binary,
}

/// One field row: identifier, position relative to the record start, width.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub id: u32,
    pub block: u64,
    pub offset: u64,
    pub len: usize,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(id: u32, block: u64, offset: u64, len: usize, kind: FieldKind) -> Self {
        Field {
            id,
            block,
            offset,
            len,
            kind,
        }
    }
}

/// Header ("A") record field table.
#[derive(Debug)]
pub struct HeaderLayout {
    pub self_check: Field,
    pub label: Field,
    pub recipient_bank: Field,
    pub sender_bank: Field,
    pub sender_name: Field,
    pub create_date: Field,
    pub account: Field,
    pub reference: Field,
    pub execution_date: Field,
    pub currency: Field,
}

/// Checksum ("E") record field table.
#[derive(Debug)]
pub struct ChecksumLayout {
    pub self_check: Field,
    pub count: Field,
    pub zeros: Field,
    pub sum_account: Field,
    pub sum_bank: Field,
    pub sum_amount: Field,
}

/// Transaction ("C") record fixed-part field table.
#[derive(Debug)]
pub struct TransactionLayout {
    pub record_length: Field,
    pub primary_bank: Field,
    pub target_bank: Field,
    pub target_account: Field,
    pub reference: Field,
    pub type_key: Field,
    pub type_ext: Field,
    pub zeros: Field,
    pub executive_bank: Field,
    pub executive_account: Field,
    pub amount: Field,
    pub target_name: Field,
    pub executive_name: Field,
    pub first_description: Field,
    pub currency: Field,
    pub ext_count: Field,
}

/// Extension-slot geometry: where slot `i` of a transaction lives.
///
/// Slots are `stride` bytes apart; the first `base_slots` sit in
/// `base_block` starting at `base_offset`, every following block holds
/// `follow_slots` starting at offset 0. A slot is a 1-digit type tag
/// followed by a 27-character value.
#[derive(Debug)]
pub struct ExtGeometry {
    pub base_block: u64,
    pub base_offset: u64,
    pub base_slots: usize,
    pub follow_slots: usize,
    pub stride: u64,
}

/// Highest extension-slot count a transaction may occupy.
pub const MAX_EXTENSION_SLOTS: usize = 15;

/// Characters per extension-slot value.
pub const EXT_VALUE_LEN: usize = 27;

/// Extension-slot type tags.
pub const EXT_TAG_UNUSED: u8 = 0;
pub const EXT_TAG_TARGET_NAME: u8 = 1;
pub const EXT_TAG_DESCRIPTION: u8 = 2;
pub const EXT_TAG_EXECUTIVE_NAME: u8 = 3;

/// Stored sums are truncated to their field widths on the wire.
pub const SUM_MODULUS: u64 = 100_000_000_000_000_000;
pub const AMOUNT_SUM_MODULUS: u64 = 10_000_000_000_000;

/// Per-format constant tables plus the record codec built on them.
#[derive(Debug)]
pub struct FormatProfile {
    pub format: Format,
    pub block_size: u64,
    pub encoding: &'static Encoding,
    /// Blocks of the transaction fixed part (extension count included).
    pub fixed_blocks: u64,
    pub header: HeaderLayout,
    pub checksum: ChecksumLayout,
    pub transaction: TransactionLayout,
    pub ext: ExtGeometry,
    /// Extension-slot count to physical block count, monotonic.
    pub block_table: [u64; MAX_EXTENSION_SLOTS + 1],
}

impl ExtGeometry {
    /// (block, offset) of extension slot `i` relative to the record start.
    pub fn slot_position(&self, i: usize) -> (u64, u64) {
        if i < self.base_slots {
            (self.base_block, self.base_offset + self.stride * i as u64)
        } else {
            let j = i - self.base_slots;
            (
                self.base_block + 1 + (j / self.follow_slots) as u64,
                self.stride * (j % self.follow_slots) as u64,
            )
        }
    }

    /// Slots whose tag must be zero-filled when only `used` are occupied:
    /// every remaining slot position of the occupied blocks, the spare
    /// positions past the slot maximum included.
    pub fn padding_slots(&self, used: usize, blocks: u64) -> std::ops::Range<usize> {
        if blocks <= self.base_block {
            return used..used;
        }
        let follow_blocks = (blocks - self.base_block - 1) as usize;
        used..self.base_slots + follow_blocks * self.follow_slots
    }
}

impl FormatProfile {
    fn field_pos(&self, f: &Field) -> usize {
        (f.block * self.block_size + f.offset) as usize
    }

    fn slice<'a>(&self, buf: &'a [u8], f: &Field) -> &'a [u8] {
        let start = self.field_pos(f);
        &buf[start..start + f.len]
    }

    fn slice_mut<'a>(&self, buf: &'a mut [u8], f: &Field) -> &'a mut [u8] {
        let start = self.field_pos(f);
        &mut buf[start..start + f.len]
    }

    /// Reads one numeric field; `-1` marks illegal data (already recorded).
    fn read_num(
        &self,
        buf: &[u8],
        f: &Field,
        base: u64,
        sink: &mut Diagnostics,
        lenient: bool,
    ) -> i64 {
        let pos = base + self.field_pos(f) as u64;
        let s = self.slice(buf, f);
        match f.kind {
            FieldKind::Digits => fields::read_number(f.id, self.encoding, s, pos, sink, lenient),
            FieldKind::Packed => fields::read_packed(f.id, s, pos, sink, false),
            FieldKind::PackedSigned => fields::read_packed(f.id, s, pos, sink, true),
            // Lengths come from the constant tables, always 1-8 bytes.
            FieldKind::Binary => s.iter().fold(0i64, |v, &b| (v << 8) | i64::from(b)),
        }
    }

    fn write_num(&self, buf: &mut [u8], f: &Field, value: u64) -> Result<()> {
        let enc = self.encoding;
        let s = self.slice_mut(buf, f);
        match f.kind {
            FieldKind::Digits => fields::write_number(f.id, enc, s, value),
            FieldKind::Packed => fields::write_packed(f.id, s, value, false),
            FieldKind::PackedSigned => fields::write_packed(f.id, s, value, true),
            FieldKind::Binary => fields::write_binary(s, value),
        }
    }

    fn read_text(
        &self,
        buf: &[u8],
        f: &Field,
        base: u64,
        category: FieldCategory,
        sink: &mut Diagnostics,
    ) -> Option<String> {
        let pos = base + self.field_pos(f) as u64;
        fields::read_string(f.id, self.encoding, self.slice(buf, f), pos, category, sink)
    }

    fn write_text(&self, buf: &mut [u8], f: &Field, text: &str) -> Result<()> {
        let enc = self.encoding;
        fields::write_string(f.id, enc, self.slice_mut(buf, f), text)
    }

    /// Verifies a constant field (self-check, record length) and records an
    /// illegal-data diagnostic on mismatch.
    fn check_const(
        &self,
        buf: &[u8],
        f: &Field,
        expected: u64,
        base: u64,
        sink: &mut Diagnostics,
    ) {
        let mut probe = Diagnostics::new();
        let got = self.read_num(buf, f, base, &mut probe, false);
        if got != expected as i64 {
            sink.record(Diagnostic::IllegalData {
                field: f.id,
                category: FieldCategory::Constant,
                position: base + self.field_pos(f) as u64,
                raw: self.slice(buf, f).to_vec(),
            });
        }
    }

    /// Classifies a record by the type tag at offset 4 of its first block.
    pub fn record_type(&self, first_block: &[u8]) -> Option<RecordType> {
        match self.encoding.decode_char(first_block[4]) {
            Some('A') => Some(RecordType::Header),
            Some('C') => Some(RecordType::Transaction),
            Some('E') => Some(RecordType::Checksum),
            _ => None,
        }
    }

    fn write_record_type(&self, buf: &mut [u8], tag: char) {
        // The tags are plain uppercase letters, always encodable.
        if let Some(byte) = self.encoding.encode_char(tag) {
            buf[4] = byte;
        }
    }

    fn check_record_type(
        &self,
        buf: &[u8],
        id: u32,
        expected: RecordType,
        base: u64,
        sink: &mut Diagnostics,
    ) -> bool {
        if self.record_type(buf) == Some(expected) {
            return true;
        }
        sink.record(Diagnostic::IllegalData {
            field: id,
            category: FieldCategory::Constant,
            position: base + 4,
            raw: vec![buf[4]],
        });
        false
    }

    // ----- header -----

    /// Decodes a header record from `buf` (one block).
    ///
    /// Field-level corruption is recorded and replaced by a sentinel; the
    /// record is only unusable (`None`) when the label or create date
    /// cannot be recovered.
    pub fn read_header(
        &self,
        buf: &[u8],
        base: u64,
        sink: &mut Diagnostics,
        lenient: bool,
    ) -> Option<Header> {
        let t = &self.header;
        self.check_const(buf, &t.self_check, self.block_size, base, sink);
        self.check_record_type(buf, field_ids::A_RECORD_TYPE, RecordType::Header, base, sink);

        let label_text = self.read_text(buf, &t.label, base, FieldCategory::Alphabetic, sink);
        let label = match label_text {
            Some(ref code) => match Label::parse(code) {
                Some(label) => Some(label),
                None => {
                    sink.record(Diagnostic::UnsupportedCode {
                        field: t.label.id,
                        position: base + self.field_pos(&t.label) as u64,
                        code: code.clone(),
                    });
                    None
                }
            },
            None => None,
        };

        let recipient_bank = sentinel(self.read_num(buf, &t.recipient_bank, base, sink, false));
        let sender_bank = sentinel(self.read_num(buf, &t.sender_bank, base, sink, false));
        let sender_name = self
            .read_text(buf, &t.sender_name, base, FieldCategory::Alphanumeric, sink)
            .unwrap_or_default();

        let create_date = {
            let pos = base + self.field_pos(&t.create_date) as u64;
            fields::read_short_date(
                t.create_date.id,
                self.encoding,
                self.slice(buf, &t.create_date),
                pos,
                sink,
            )
        };

        let account = sentinel(self.read_num(buf, &t.account, base, sink, lenient));
        let reference = sentinel(self.read_num(buf, &t.reference, base, sink, lenient));

        let execution_date = {
            let pos = base + self.field_pos(&t.execution_date) as u64;
            fields::read_long_date(
                t.execution_date.id,
                self.encoding,
                self.slice(buf, &t.execution_date),
                pos,
                sink,
            )
        };

        let currency = self.read_currency(buf, &t.currency, base, sink);

        Some(Header {
            label: label?,
            recipient_bank_code: recipient_bank,
            sender_bank_code: sender_bank,
            sender_name,
            account,
            reference,
            schedule: Schedule {
                create_date: create_date?,
                execution_date,
            },
            currency,
        })
    }

    /// Encodes a header record into `buf` (one zeroed block).
    pub fn write_header(&self, buf: &mut [u8], header: &Header) -> Result<()> {
        let t = &self.header;
        buf.fill(self.encoding.space);
        self.write_self_check(buf, &t.self_check)?;
        self.write_record_type(buf, 'A');
        self.write_text(buf, &t.label, header.label.code())?;
        self.write_num(buf, &t.recipient_bank, header.recipient_bank_code)?;
        self.write_num(buf, &t.sender_bank, header.sender_bank_code)?;
        self.write_text(buf, &t.sender_name, &header.sender_name)?;
        fields::write_short_date(
            t.create_date.id,
            self.encoding,
            self.slice_mut(buf, &t.create_date),
            Some(header.schedule.create_date),
        )?;
        self.write_num(buf, &t.account, header.account)?;
        self.write_num(buf, &t.reference, header.reference)?;
        fields::write_long_date(
            t.execution_date.id,
            self.encoding,
            self.slice_mut(buf, &t.execution_date),
            header.schedule.execution_date,
        )?;
        self.write_currency(buf, &t.currency, header.currency)?;
        Ok(())
    }

    // ----- checksum -----

    /// Decodes a checksum record from `buf` (one block). Corrupt sum
    /// fields become zero with a diagnostic attached.
    pub fn read_checksum(&self, buf: &[u8], base: u64, sink: &mut Diagnostics) -> Checksum {
        let t = &self.checksum;
        self.check_const(buf, &t.self_check, self.block_size, base, sink);
        self.check_record_type(buf, field_ids::E_RECORD_TYPE, RecordType::Checksum, base, sink);
        Checksum {
            transaction_count: sentinel(self.read_num(buf, &t.count, base, sink, false)),
            sum_target_account: sentinel(self.read_num(buf, &t.sum_account, base, sink, false)),
            sum_target_bank: sentinel(self.read_num(buf, &t.sum_bank, base, sink, false)),
            sum_amount: sentinel(self.read_num(buf, &t.sum_amount, base, sink, false)),
        }
    }

    /// Encodes a checksum record; sums wider than their fields are
    /// truncated to the field width.
    pub fn write_checksum(&self, buf: &mut [u8], checksum: &Checksum) -> Result<()> {
        let t = &self.checksum;
        buf.fill(self.encoding.space);
        self.write_self_check(buf, &t.self_check)?;
        self.write_record_type(buf, 'E');
        self.write_num(buf, &t.count, checksum.transaction_count)?;
        self.write_num(buf, &t.zeros, 0)?;
        self.write_num(
            buf,
            &t.sum_account,
            checksum.sum_target_account % SUM_MODULUS,
        )?;
        self.write_num(buf, &t.sum_bank, checksum.sum_target_bank % SUM_MODULUS)?;
        self.write_num(buf, &t.sum_amount, checksum.sum_amount % AMOUNT_SUM_MODULUS)?;
        Ok(())
    }

    // ----- transaction -----

    /// Physical blocks a transaction with `slots` extension slots occupies.
    pub fn transaction_blocks(&self, slots: usize) -> u64 {
        self.block_table[slots.min(MAX_EXTENSION_SLOTS)]
    }

    /// Reads the extension count from a transaction's fixed part and maps
    /// it to the record's block span. `-1` marks an unreadable count.
    pub fn read_extension_count(&self, buf: &[u8], base: u64, sink: &mut Diagnostics) -> i64 {
        let count = self.read_num(buf, &self.transaction.ext_count, base, sink, false);
        if count > MAX_EXTENSION_SLOTS as i64 {
            sink.record(Diagnostic::IllegalData {
                field: self.transaction.ext_count.id,
                category: FieldCategory::Numeric,
                position: base + self.field_pos(&self.transaction.ext_count) as u64,
                raw: self.slice(buf, &self.transaction.ext_count).to_vec(),
            });
            return -1;
        }
        count
    }

    /// Decodes a transaction record from `buf` (all of its blocks).
    /// Corrupt fields are replaced by sentinels with diagnostics attached;
    /// the record itself is always produced.
    pub fn read_transaction(
        &self,
        buf: &[u8],
        base: u64,
        sink: &mut Diagnostics,
        lenient: bool,
    ) -> Transaction {
        let t = &self.transaction;
        let blocks = buf.len() as u64 / self.block_size;
        self.check_const(
            buf,
            &t.record_length,
            blocks * self.block_size,
            base,
            sink,
        );
        self.check_record_type(
            buf,
            field_ids::C_RECORD_TYPE,
            RecordType::Transaction,
            base,
            sink,
        );

        let key = sentinel(self.read_num(buf, &t.type_key, base, sink, false));
        let extension = sentinel(self.read_num(buf, &t.type_ext, base, sink, false));
        let kind = TransactionType::new(key as u8, extension as u16);
        if !kind.is_supported() {
            sink.record(Diagnostic::UnsupportedCode {
                field: t.type_key.id,
                position: base + self.field_pos(&t.type_key) as u64,
                code: format!("{key:02}/{extension:03}"),
            });
        }

        let target = crate::records::BankAccount {
            bank_code: sentinel(self.read_num(buf, &t.target_bank, base, sink, false)),
            account: sentinel(self.read_num(buf, &t.target_account, base, sink, false)),
            name: self
                .read_text(buf, &t.target_name, base, FieldCategory::Alphanumeric, sink)
                .unwrap_or_default(),
        };
        let executive = crate::records::BankAccount {
            bank_code: sentinel(self.read_num(buf, &t.executive_bank, base, sink, false)),
            account: sentinel(self.read_num(buf, &t.executive_account, base, sink, false)),
            name: self
                .read_text(buf, &t.executive_name, base, FieldCategory::Alphanumeric, sink)
                .unwrap_or_default(),
        };

        let mut descriptions = Vec::new();
        if let Some(first) =
            self.read_text(buf, &t.first_description, base, FieldCategory::Alphanumeric, sink)
        {
            if !first.is_empty() {
                descriptions.push(first);
            }
        }

        let ext_count = self.read_extension_count(buf, base, sink);
        let mut target_ext = None;
        let mut executive_ext = None;
        if ext_count >= 0 {
            self.read_slots(
                buf,
                base,
                ext_count as usize,
                sink,
                &mut target_ext,
                &mut executive_ext,
                &mut descriptions,
            );
        }

        Transaction {
            kind,
            amount: sentinel(self.read_num(buf, &t.amount, base, sink, false)),
            primary_bank_code: sentinel(self.read_num(buf, &t.primary_bank, base, sink, false)),
            target,
            executive,
            target_ext,
            executive_ext,
            reference: sentinel(self.read_num(buf, &t.reference, base, sink, lenient)),
            currency: self.read_currency(buf, &t.currency, base, sink),
            descriptions,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn read_slots(
        &self,
        buf: &[u8],
        base: u64,
        count: usize,
        sink: &mut Diagnostics,
        target_ext: &mut Option<String>,
        executive_ext: &mut Option<String>,
        descriptions: &mut Vec<String>,
    ) {
        for i in 0..count {
            let (block, offset) = self.ext.slot_position(i);
            let tag_pos = (block * self.block_size + offset) as usize;
            let tag_byte = buf[tag_pos];
            let value_field = Field::new(
                field_ids::C_EXT_VALUE,
                block,
                offset + 1,
                EXT_VALUE_LEN,
                FieldKind::Digits,
            );
            match self.encoding.digit_value(tag_byte) {
                Some(EXT_TAG_UNUSED) => {}
                Some(tag @ (EXT_TAG_TARGET_NAME | EXT_TAG_EXECUTIVE_NAME)) => {
                    let value = self
                        .read_text(buf, &value_field, base, FieldCategory::Alphanumeric, sink)
                        .unwrap_or_default();
                    let slot = if tag == EXT_TAG_TARGET_NAME {
                        &mut *target_ext
                    } else {
                        &mut *executive_ext
                    };
                    if slot.is_some() {
                        sink.record(Diagnostic::IllegalData {
                            field: field_ids::C_EXT_TAG,
                            category: FieldCategory::Constant,
                            position: base + tag_pos as u64,
                            raw: vec![tag_byte],
                        });
                    } else {
                        *slot = Some(value);
                    }
                }
                Some(EXT_TAG_DESCRIPTION) => {
                    let value = self
                        .read_text(buf, &value_field, base, FieldCategory::Alphanumeric, sink)
                        .unwrap_or_default();
                    descriptions.push(value);
                }
                _ => {
                    sink.record(Diagnostic::IllegalData {
                        field: field_ids::C_EXT_TAG,
                        category: FieldCategory::Constant,
                        position: base + tag_pos as u64,
                        raw: vec![tag_byte],
                    });
                }
            }
        }
    }

    /// Encodes a transaction into `buf`, which must span exactly
    /// `transaction_blocks(t.extension_slots())` blocks. Unused slots of
    /// the last block are zero-filled so stale bytes can never be re-read
    /// as extensions.
    pub fn write_transaction(&self, buf: &mut [u8], transaction: &Transaction) -> Result<()> {
        let t = &self.transaction;
        let slots = transaction.extension_slots();
        let blocks = self.transaction_blocks(slots);
        debug_assert_eq!(buf.len() as u64, blocks * self.block_size);

        buf.fill(self.encoding.space);
        self.write_num(buf, &t.record_length, blocks * self.block_size)?;
        self.write_record_type(buf, 'C');
        self.write_num(buf, &t.primary_bank, transaction.primary_bank_code)?;
        self.write_num(buf, &t.target_bank, transaction.target.bank_code)?;
        self.write_num(buf, &t.target_account, transaction.target.account)?;
        self.write_num(buf, &t.reference, transaction.reference)?;
        self.write_num(buf, &t.type_key, u64::from(transaction.kind.key))?;
        self.write_num(buf, &t.type_ext, u64::from(transaction.kind.extension))?;
        self.write_num(buf, &t.zeros, 0)?;
        self.write_num(buf, &t.executive_bank, transaction.executive.bank_code)?;
        self.write_num(buf, &t.executive_account, transaction.executive.account)?;
        self.write_num(buf, &t.amount, transaction.amount)?;
        self.write_text(buf, &t.target_name, &transaction.target.name)?;
        self.write_text(buf, &t.executive_name, &transaction.executive.name)?;
        self.write_text(
            buf,
            &t.first_description,
            transaction.descriptions.first().map(String::as_str).unwrap_or(""),
        )?;
        self.write_currency(buf, &t.currency, transaction.currency)?;
        self.write_num(buf, &t.ext_count, slots as u64)?;

        let mut slot = 0;
        if let Some(ref ext) = transaction.target_ext {
            self.write_slot(buf, slot, EXT_TAG_TARGET_NAME, ext)?;
            slot += 1;
        }
        for line in transaction.descriptions.iter().skip(1) {
            self.write_slot(buf, slot, EXT_TAG_DESCRIPTION, line)?;
            slot += 1;
        }
        if let Some(ref ext) = transaction.executive_ext {
            self.write_slot(buf, slot, EXT_TAG_EXECUTIVE_NAME, ext)?;
            slot += 1;
        }
        for i in self.ext.padding_slots(slot, blocks) {
            self.write_slot(buf, i, EXT_TAG_UNUSED, "")?;
        }
        Ok(())
    }

    fn write_slot(&self, buf: &mut [u8], i: usize, tag: u8, value: &str) -> Result<()> {
        let (block, offset) = self.ext.slot_position(i);
        let pos = (block * self.block_size + offset) as usize;
        buf[pos] = self.encoding.digit(tag);
        let value_field = Field::new(
            field_ids::C_EXT_VALUE,
            block,
            offset + 1,
            EXT_VALUE_LEN,
            FieldKind::Digits,
        );
        self.write_text(buf, &value_field, value)
    }

    // ----- shared helpers -----

    fn write_self_check(&self, buf: &mut [u8], f: &Field) -> Result<()> {
        self.write_num(buf, f, self.block_size)
    }

    fn read_currency(&self, buf: &[u8], f: &Field, base: u64, sink: &mut Diagnostics) -> char {
        let byte = self.slice(buf, f)[0];
        let pos = base + self.field_pos(f) as u64;
        match self.encoding.decode_char(byte) {
            Some(c) => {
                if c != '1' {
                    sink.record(Diagnostic::UnsupportedCode {
                        field: f.id,
                        position: pos,
                        code: c.to_string(),
                    });
                }
                c
            }
            None => {
                sink.record(Diagnostic::IllegalData {
                    field: f.id,
                    category: FieldCategory::Alphanumeric,
                    position: pos,
                    raw: vec![byte],
                });
                ' '
            }
        }
    }

    fn write_currency(&self, buf: &mut [u8], f: &Field, currency: char) -> Result<()> {
        self.write_text(buf, f, &currency.to_string())
    }
}

/// Maps the read sentinel (-1) to zero for storage in a value type; the
/// diagnostic recorded alongside keeps the information.
fn sentinel(value: i64) -> u64 {
    if value < 0 {
        0
    } else {
        value as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_tables_are_monotonic() {
        for profile in [&DISK, &TAPE] {
            let mut last = 0;
            for &blocks in &profile.block_table {
                assert!(blocks >= last, "{:?}", profile.format);
                last = blocks;
            }
        }
    }

    #[test]
    fn test_block_tables_match_slot_geometry() {
        for profile in [&DISK, &TAPE] {
            for slots in 0..=MAX_EXTENSION_SLOTS {
                let blocks = profile.transaction_blocks(slots);
                if slots > 0 {
                    let (block, offset) = profile.ext.slot_position(slots - 1);
                    assert!(
                        block < blocks,
                        "{:?}: slot {} outside {} blocks",
                        profile.format,
                        slots - 1,
                        blocks
                    );
                    assert!(offset + 1 + EXT_VALUE_LEN as u64 <= profile.block_size);
                }
            }
        }
    }

    #[test]
    fn test_fields_stay_inside_blocks() {
        for profile in [&DISK, &TAPE] {
            let h = &profile.header;
            let c = &profile.checksum;
            let t = &profile.transaction;
            let all = [
                &h.self_check,
                &h.label,
                &h.recipient_bank,
                &h.sender_bank,
                &h.sender_name,
                &h.create_date,
                &h.account,
                &h.reference,
                &h.execution_date,
                &h.currency,
                &c.self_check,
                &c.count,
                &c.zeros,
                &c.sum_account,
                &c.sum_bank,
                &c.sum_amount,
                &t.record_length,
                &t.primary_bank,
                &t.target_bank,
                &t.target_account,
                &t.reference,
                &t.type_key,
                &t.type_ext,
                &t.zeros,
                &t.executive_bank,
                &t.executive_account,
                &t.amount,
                &t.target_name,
                &t.executive_name,
                &t.first_description,
                &t.currency,
                &t.ext_count,
            ];
            for f in all {
                assert!(
                    f.offset + f.len as u64 <= profile.block_size,
                    "{:?} field {:X} crosses its block boundary",
                    profile.format,
                    f.id
                );
                assert!(f.block < profile.fixed_blocks);
            }
        }
    }

    #[test]
    fn test_record_type_classifier() {
        let mut block = vec![0u8; 128];
        block[4] = b'A';
        assert_eq!(DISK.record_type(&block), Some(RecordType::Header));
        block[4] = b'C';
        assert_eq!(DISK.record_type(&block), Some(RecordType::Transaction));
        block[4] = b'E';
        assert_eq!(DISK.record_type(&block), Some(RecordType::Checksum));
        block[4] = b'X';
        assert_eq!(DISK.record_type(&block), None);

        let mut block = vec![0u8; 150];
        block[4] = 0xC1; // EBCDIC 'A'
        assert_eq!(TAPE.record_type(&block), Some(RecordType::Header));
    }
}
