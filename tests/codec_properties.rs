//! Property-based tests for the field codecs
//!
//! Uses proptest to verify that every writable value reads back
//! unchanged through both character encodings.

use chrono::NaiveDate;
use dtaus::diagnostics::Diagnostics;
use dtaus::encoding::{ASCII, EBCDIC};
use dtaus::fields;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_number_round_trip_ascii(value in 0u64..10_000_000_000) {
        let mut buf = [0u8; 10];
        fields::write_number(0xC5, &ASCII, &mut buf, value).unwrap();
        let mut sink = Diagnostics::new();
        let read = fields::read_number(0xC5, &ASCII, &buf, 0, &mut sink, false);
        prop_assert_eq!(read, value as i64);
        prop_assert!(sink.is_empty());
    }

    #[test]
    fn prop_number_round_trip_ebcdic(value in 0u64..10_000_000_000) {
        let mut buf = [0u8; 10];
        fields::write_number(0xC5, &EBCDIC, &mut buf, value).unwrap();
        let mut sink = Diagnostics::new();
        let read = fields::read_number(0xC5, &EBCDIC, &buf, 0, &mut sink, false);
        prop_assert_eq!(read, value as i64);
        prop_assert!(sink.is_empty());
    }

    #[test]
    fn prop_number_rejects_overflow(value in 100u64..10_000) {
        let mut buf = [0u8; 2];
        prop_assert!(fields::write_number(0xC7, &ASCII, &mut buf, value).is_err());
    }

    #[test]
    fn prop_packed_unsigned_round_trip(value in 0u64..10_000_000_000) {
        let mut buf = [0u8; 5];
        fields::write_packed(0xC5, &mut buf, value, false).unwrap();
        let mut sink = Diagnostics::new();
        let read = fields::read_packed(0xC5, &buf, 0, &mut sink, false);
        prop_assert_eq!(read, value as i64);
        prop_assert!(sink.is_empty());
    }

    #[test]
    fn prop_packed_signed_round_trip(value in 0u64..1_000_000_000) {
        // Signed fields spend one nibble on the sign.
        let mut buf = [0u8; 5];
        fields::write_packed(0xCC, &mut buf, value, true).unwrap();
        let mut sink = Diagnostics::new();
        let read = fields::read_packed(0xCC, &buf, 0, &mut sink, true);
        prop_assert_eq!(read, value as i64);
        prop_assert!(sink.is_empty());
    }

    #[test]
    fn prop_binary_round_trip(value in any::<u32>()) {
        let mut buf = [0u8; 4];
        fields::write_binary(&mut buf, value as u64).unwrap();
        prop_assert_eq!(fields::read_binary(&buf).unwrap(), value as u64);
    }

    #[test]
    fn prop_short_date_round_trip(
        year in 1980i32..=2079,
        month in 1u32..=12,
        day in 1u32..=28,
    ) {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        for enc in [&ASCII, &EBCDIC] {
            let mut buf = [0u8; 6];
            fields::write_short_date(0xA7, enc, &mut buf, Some(date)).unwrap();
            let mut sink = Diagnostics::new();
            let read = fields::read_short_date(0xA7, enc, &buf, 0, &mut sink);
            prop_assert_eq!(read, Some(date));
            prop_assert!(sink.is_empty());
        }
    }

    #[test]
    fn prop_long_date_round_trip(
        year in 1980i32..=2079,
        month in 1u32..=12,
        day in 1u32..=28,
    ) {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        let mut buf = [0u8; 8];
        fields::write_long_date(0xAB, &ASCII, &mut buf, Some(date)).unwrap();
        let mut sink = Diagnostics::new();
        let read = fields::read_long_date(0xAB, &ASCII, &buf, 0, &mut sink);
        prop_assert_eq!(read, Some(date));
        prop_assert!(sink.is_empty());
    }

    #[test]
    fn prop_string_round_trip(text in "[A-Z][A-Z0-9 ]{0,25}[A-Z0-9]") {
        for enc in [&ASCII, &EBCDIC] {
            let mut buf = vec![0u8; 27];
            fields::write_string(0xCE, enc, &mut buf, &text).unwrap();
            let mut sink = Diagnostics::new();
            let read = fields::read_string(
                0xCE,
                enc,
                &buf,
                0,
                dtaus::FieldCategory::Alphanumeric,
                &mut sink,
            );
            prop_assert_eq!(read.as_deref(), Some(text.as_str()));
            prop_assert!(sink.is_empty());
        }
    }
}
