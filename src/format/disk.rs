//! Disk profile: 128-byte blocks, ASCII, plain-digit numeric fields
//!
//! The transaction fixed part spans two blocks; the second block also
//! carries the first two extension slots, every following block four more.

use super::field_ids as id;
use super::{
    ChecksumLayout, ExtGeometry, Field, FieldKind::Digits, Format, FormatProfile, HeaderLayout,
    TransactionLayout,
};
use crate::encoding::ASCII;

pub static DISK: FormatProfile = FormatProfile {
    format: Format::Disk,
    block_size: 128,
    encoding: &ASCII,
    fixed_blocks: 2,
    header: HeaderLayout {
        self_check: Field::new(id::A_SELF_CHECK, 0, 0, 4, Digits),
        label: Field::new(id::A_LABEL, 0, 5, 2, Digits),
        recipient_bank: Field::new(id::A_RECIPIENT_BANK, 0, 7, 8, Digits),
        sender_bank: Field::new(id::A_SENDER_BANK, 0, 15, 8, Digits),
        sender_name: Field::new(id::A_SENDER_NAME, 0, 23, 27, Digits),
        create_date: Field::new(id::A_CREATE_DATE, 0, 50, 6, Digits),
        account: Field::new(id::A_ACCOUNT, 0, 60, 10, Digits),
        reference: Field::new(id::A_REFERENCE, 0, 70, 10, Digits),
        execution_date: Field::new(id::A_EXECUTION_DATE, 0, 95, 8, Digits),
        currency: Field::new(id::A_CURRENCY, 0, 127, 1, Digits),
    },
    checksum: ChecksumLayout {
        self_check: Field::new(id::E_SELF_CHECK, 0, 0, 4, Digits),
        count: Field::new(id::E_COUNT, 0, 10, 7, Digits),
        zeros: Field::new(id::E_ZEROS, 0, 17, 13, Digits),
        sum_account: Field::new(id::E_SUM_ACCOUNT, 0, 30, 17, Digits),
        sum_bank: Field::new(id::E_SUM_BANK, 0, 47, 17, Digits),
        sum_amount: Field::new(id::E_SUM_AMOUNT, 0, 64, 13, Digits),
    },
    transaction: TransactionLayout {
        record_length: Field::new(id::C_RECORD_LENGTH, 0, 0, 4, Digits),
        primary_bank: Field::new(id::C_PRIMARY_BANK, 0, 5, 8, Digits),
        target_bank: Field::new(id::C_TARGET_BANK, 0, 13, 8, Digits),
        target_account: Field::new(id::C_TARGET_ACCOUNT, 0, 21, 10, Digits),
        reference: Field::new(id::C_REFERENCE, 0, 31, 11, Digits),
        type_key: Field::new(id::C_TYPE_KEY, 0, 44, 2, Digits),
        type_ext: Field::new(id::C_TYPE_EXT, 0, 46, 3, Digits),
        zeros: Field::new(id::C_ZEROS, 0, 50, 11, Digits),
        executive_bank: Field::new(id::C_EXECUTIVE_BANK, 0, 61, 8, Digits),
        executive_account: Field::new(id::C_EXECUTIVE_ACCOUNT, 0, 69, 10, Digits),
        amount: Field::new(id::C_AMOUNT, 0, 79, 11, Digits),
        target_name: Field::new(id::C_TARGET_NAME, 0, 93, 27, Digits),
        executive_name: Field::new(id::C_EXECUTIVE_NAME, 1, 0, 27, Digits),
        first_description: Field::new(id::C_DESCRIPTION, 1, 27, 27, Digits),
        currency: Field::new(id::C_CURRENCY, 1, 54, 1, Digits),
        ext_count: Field::new(id::C_EXT_COUNT, 1, 57, 2, Digits),
    },
    ext: ExtGeometry {
        base_block: 1,
        base_offset: 59,
        base_slots: 2,
        follow_slots: 4,
        stride: 28,
    },
    block_table: [2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 6],
};
