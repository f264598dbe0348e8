//! Full round trips through both physical profiles
//!
//! Builds a container in memory, commits it to bytes and reopens it,
//! verifying that headers, transactions and checksums survive the
//! disk (ASCII) and tape (EBCDIC packed/binary) encodings unchanged.

use chrono::NaiveDate;
use dtaus::factory::{open_bytes, OpenOptions};
use dtaus::records::{BankAccount, Header, Label, Schedule, Transaction, TransactionType};
use dtaus::Format;

fn sample_header(label: Label) -> Header {
    Header {
        label,
        recipient_bank_code: 37040044,
        sender_bank_code: 0,
        sender_name: "TESTFIRMA GMBH".into(),
        account: 1234567,
        reference: 99,
        schedule: Schedule::new(NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()),
        currency: '1',
    }
}

fn sample_transaction(key: u8, amount: u64) -> Transaction {
    Transaction {
        kind: TransactionType::new(key, 0),
        amount,
        primary_bank_code: 0,
        target: BankAccount {
            bank_code: 37040044,
            account: 1111111111,
            name: "MUSTERMANN ERIKA".into(),
        },
        executive: BankAccount {
            bank_code: 50010517,
            account: 2222222222,
            name: "TESTFIRMA GMBH".into(),
        },
        target_ext: None,
        executive_ext: None,
        reference: 7,
        currency: '1',
        descriptions: vec!["RECHNUNG 42".into()],
    }
}

fn round_trip(format: Format) {
    let options = OpenOptions::new().default_format(format);
    let mut container = open_bytes(Vec::new(), &options).unwrap();

    let header = sample_header(Label::CustomerCredit);
    let index = container.add_logical_file(&header).unwrap();

    let first = sample_transaction(51, 12345);
    let second = sample_transaction(53, 999_999);
    {
        let mut file = container.file(index).unwrap();
        file.add_transaction(&first).unwrap();
        file.add_transaction(&second).unwrap();
        assert_eq!(file.transaction_count(), 2);
    }

    let bytes = container.commit().unwrap().into_bytes();
    assert_eq!(bytes.len() as u64 % format.block_size(), 0);

    let mut reopened = open_bytes(bytes, &options).unwrap();
    assert_eq!(reopened.format(), format);
    assert_eq!(reopened.file_count(), 1);
    assert!(reopened.diagnostics().is_empty());

    let mut file = reopened.file(0).unwrap();
    assert_eq!(file.header().unwrap(), header);
    assert_eq!(file.transaction(0).unwrap(), first);
    assert_eq!(file.transaction(1).unwrap(), second);

    let checksum = file.checksum();
    assert_eq!(checksum.transaction_count, 2);
    assert_eq!(checksum.sum_amount, 12345 + 999_999);
    assert_eq!(checksum.sum_target_account, 2 * 1111111111);
    assert_eq!(checksum.sum_target_bank, 2 * 37040044);
}

#[test]
fn test_disk_round_trip() {
    round_trip(Format::Disk);
}

#[test]
fn test_tape_round_trip() {
    round_trip(Format::Tape);
}

#[test]
fn test_disk_leader_is_block_length() {
    let options = OpenOptions::new().default_format(Format::Disk);
    let mut container = open_bytes(Vec::new(), &options).unwrap();
    container
        .add_logical_file(&sample_header(Label::CustomerCredit))
        .unwrap();
    let bytes = container.commit().unwrap().into_bytes();
    assert_eq!(&bytes[..4], b"0128");
}

#[test]
fn test_tape_leader_is_binary_record_length() {
    let options = OpenOptions::new().default_format(Format::Tape);
    let mut container = open_bytes(Vec::new(), &options).unwrap();
    container
        .add_logical_file(&sample_header(Label::CustomerCredit))
        .unwrap();
    let bytes = container.commit().unwrap().into_bytes();
    assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), 150);
}

#[test]
fn test_execution_date_round_trip() {
    let options = OpenOptions::new().default_format(Format::Disk);
    let mut container = open_bytes(Vec::new(), &options).unwrap();

    let mut header = sample_header(Label::CustomerCredit);
    header.schedule = Schedule::with_execution(
        NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
        NaiveDate::from_ymd_opt(2026, 9, 10).unwrap(),
    );
    container.add_logical_file(&header).unwrap();

    let bytes = container.commit().unwrap().into_bytes();
    let mut reopened = open_bytes(bytes, &options).unwrap();
    let read_back = reopened.file(0).unwrap().header().unwrap();
    assert_eq!(read_back.schedule, header.schedule);
}

#[test]
fn test_umlauts_survive_both_encodings() {
    for format in [Format::Disk, Format::Tape] {
        let options = OpenOptions::new().default_format(format);
        let mut container = open_bytes(Vec::new(), &options).unwrap();

        let mut header = sample_header(Label::CustomerCredit);
        header.sender_name = "MÜLLER & SÖHNE".into();
        container.add_logical_file(&header).unwrap();

        let mut transaction = sample_transaction(51, 500);
        transaction.target.name = "GRÄFIN ÄBÖÜ".into();
        container
            .file(0)
            .unwrap()
            .add_transaction(&transaction)
            .unwrap();

        let bytes = container.commit().unwrap().into_bytes();
        let mut reopened = open_bytes(bytes, &options).unwrap();
        let mut file = reopened.file(0).unwrap();
        assert_eq!(file.header().unwrap().sender_name, "MÜLLER & SÖHNE");
        assert_eq!(file.transaction(0).unwrap().target.name, "GRÄFIN ÄBÖÜ");
    }
}
