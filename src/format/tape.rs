//! Tape profile: 150-byte blocks, EBCDIC, packed and binary numerics
//!
//! The transaction fixed part fits one block; every following block holds
//! five extension slots. Record-length and self-check fields are 2-byte
//! big-endian binary, bank codes, accounts and sums are packed decimal, the
//! amount carries a positive sign nibble.

use super::field_ids as id;
use super::{
    ChecksumLayout, ExtGeometry, Field,
    FieldKind::{Binary, Digits, Packed, PackedSigned},
    Format, FormatProfile, HeaderLayout, TransactionLayout,
};
use crate::encoding::EBCDIC;

pub static TAPE: FormatProfile = FormatProfile {
    format: Format::Tape,
    block_size: 150,
    encoding: &EBCDIC,
    fixed_blocks: 1,
    header: HeaderLayout {
        self_check: Field::new(id::A_SELF_CHECK, 0, 0, 2, Binary),
        label: Field::new(id::A_LABEL, 0, 5, 2, Digits),
        recipient_bank: Field::new(id::A_RECIPIENT_BANK, 0, 7, 4, Packed),
        sender_bank: Field::new(id::A_SENDER_BANK, 0, 11, 4, Packed),
        sender_name: Field::new(id::A_SENDER_NAME, 0, 15, 27, Digits),
        create_date: Field::new(id::A_CREATE_DATE, 0, 42, 6, Digits),
        account: Field::new(id::A_ACCOUNT, 0, 52, 5, Packed),
        reference: Field::new(id::A_REFERENCE, 0, 57, 5, Packed),
        execution_date: Field::new(id::A_EXECUTION_DATE, 0, 77, 8, Digits),
        currency: Field::new(id::A_CURRENCY, 0, 149, 1, Digits),
    },
    checksum: ChecksumLayout {
        self_check: Field::new(id::E_SELF_CHECK, 0, 0, 2, Binary),
        count: Field::new(id::E_COUNT, 0, 10, 4, Packed),
        zeros: Field::new(id::E_ZEROS, 0, 14, 7, Packed),
        sum_account: Field::new(id::E_SUM_ACCOUNT, 0, 21, 9, Packed),
        sum_bank: Field::new(id::E_SUM_BANK, 0, 30, 9, Packed),
        sum_amount: Field::new(id::E_SUM_AMOUNT, 0, 39, 7, Packed),
    },
    transaction: TransactionLayout {
        record_length: Field::new(id::C_RECORD_LENGTH, 0, 0, 2, Binary),
        primary_bank: Field::new(id::C_PRIMARY_BANK, 0, 5, 4, Packed),
        target_bank: Field::new(id::C_TARGET_BANK, 0, 9, 4, Packed),
        target_account: Field::new(id::C_TARGET_ACCOUNT, 0, 13, 5, Packed),
        reference: Field::new(id::C_REFERENCE, 0, 18, 6, Packed),
        type_key: Field::new(id::C_TYPE_KEY, 0, 24, 2, Digits),
        type_ext: Field::new(id::C_TYPE_EXT, 0, 26, 2, Packed),
        zeros: Field::new(id::C_ZEROS, 0, 29, 6, Packed),
        executive_bank: Field::new(id::C_EXECUTIVE_BANK, 0, 35, 4, Packed),
        executive_account: Field::new(id::C_EXECUTIVE_ACCOUNT, 0, 39, 5, Packed),
        amount: Field::new(id::C_AMOUNT, 0, 44, 6, PackedSigned),
        target_name: Field::new(id::C_TARGET_NAME, 0, 53, 27, Digits),
        executive_name: Field::new(id::C_EXECUTIVE_NAME, 0, 80, 27, Digits),
        first_description: Field::new(id::C_DESCRIPTION, 0, 107, 27, Digits),
        currency: Field::new(id::C_CURRENCY, 0, 134, 1, Digits),
        ext_count: Field::new(id::C_EXT_COUNT, 0, 148, 2, Digits),
    },
    ext: ExtGeometry {
        base_block: 1,
        base_offset: 0,
        base_slots: 5,
        follow_slots: 5,
        stride: 28,
    },
    block_table: [1, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_positions() {
        assert_eq!(TAPE.ext.slot_position(0), (1, 0));
        assert_eq!(TAPE.ext.slot_position(4), (1, 112));
        assert_eq!(TAPE.ext.slot_position(5), (2, 0));
        assert_eq!(TAPE.ext.slot_position(14), (3, 112));
    }

    #[test]
    fn test_padding_on_single_block_record() {
        // Without extensions there is no extension block to pad.
        assert_eq!(TAPE.ext.padding_slots(0, 1), 0..0);
        assert_eq!(TAPE.ext.padding_slots(1, 2), 1..5);
        assert_eq!(TAPE.ext.padding_slots(15, 4), 15..15);
    }
}
