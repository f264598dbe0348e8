//! Container lifecycle over the file-backed store
//!
//! Creates a fresh container on disk, mutates it, commits, and reopens
//! the same path to verify the persisted image.

use chrono::NaiveDate;
use dtaus::factory::{open_path, OpenOptions};
use dtaus::records::{BankAccount, Header, Label, Schedule, Transaction, TransactionType};
use dtaus::{DtausError, Format};
use tempfile::tempdir;

fn options() -> OpenOptions {
    OpenOptions::new().default_format(Format::Disk)
}

fn sample_header() -> Header {
    Header {
        label: Label::CustomerCredit,
        recipient_bank_code: 37040044,
        sender_bank_code: 0,
        sender_name: "TESTFIRMA".into(),
        account: 1234567,
        reference: 0,
        schedule: Schedule::new(NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()),
        currency: '1',
    }
}

fn sample_transaction(amount: u64) -> Transaction {
    Transaction {
        kind: TransactionType::new(51, 0),
        amount,
        primary_bank_code: 0,
        target: BankAccount {
            bank_code: 37040044,
            account: 1111111111,
            name: "EMPFAENGER".into(),
        },
        executive: BankAccount {
            bank_code: 50010517,
            account: 2222222222,
            name: "AUFTRAGGEBER".into(),
        },
        target_ext: None,
        executive_ext: None,
        reference: 0,
        currency: '1',
        descriptions: vec!["ZWECK".into()],
    }
}

#[test]
fn test_create_commit_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("payments.dta");

    let mut container = open_path(&path, &options()).unwrap();
    assert_eq!(container.file_count(), 0);
    container.add_logical_file(&sample_header()).unwrap();
    {
        let mut file = container.file(0).unwrap();
        file.add_transaction(&sample_transaction(100)).unwrap();
        file.add_transaction(&sample_transaction(250)).unwrap();
    }
    container.commit().unwrap();

    let mut reopened = open_path(&path, &options()).unwrap();
    assert!(reopened.diagnostics().is_empty());
    assert_eq!(reopened.file_count(), 1);
    let mut file = reopened.file(0).unwrap();
    assert_eq!(file.transaction_count(), 2);
    assert_eq!(file.checksum().sum_amount, 350);
    assert_eq!(file.transaction(1).unwrap().amount, 250);
}

#[test]
fn test_mutations_persist_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("payments.dta");

    let mut container = open_path(&path, &options()).unwrap();
    container.add_logical_file(&sample_header()).unwrap();
    {
        let mut file = container.file(0).unwrap();
        file.add_transaction(&sample_transaction(100)).unwrap();
        file.add_transaction(&sample_transaction(200)).unwrap();
        file.add_transaction(&sample_transaction(300)).unwrap();
    }
    container.commit().unwrap();

    // Second session: replace one, remove one.
    let mut container = open_path(&path, &options()).unwrap();
    {
        let mut file = container.file(0).unwrap();
        file.set_transaction(1, &sample_transaction(999)).unwrap();
        file.remove_transaction(0).unwrap();
    }
    container.commit().unwrap();

    let mut reopened = open_path(&path, &options()).unwrap();
    assert!(reopened.diagnostics().is_empty());
    let mut file = reopened.file(0).unwrap();
    assert_eq!(file.transaction_count(), 2);
    assert_eq!(file.transaction(0).unwrap().amount, 999);
    assert_eq!(file.transaction(1).unwrap().amount, 300);
    assert_eq!(file.checksum().sum_amount, 999 + 300);
}

#[test]
fn test_file_length_must_be_block_multiple() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("payments.dta");

    let mut container = open_path(&path, &options()).unwrap();
    container.add_logical_file(&sample_header()).unwrap();
    container.commit().unwrap();

    // Chop a few bytes off the tail.
    let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(2 * 128 - 5).unwrap();
    drop(file);

    let err = open_path(&path, &options());
    assert!(matches!(err, Err(DtausError::Invalid(_))));
}

#[test]
fn test_missing_path_starts_empty_container() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("does-not-exist-yet.dta");
    let container = open_path(&path, &options()).unwrap();
    assert_eq!(container.file_count(), 0);
}

#[test]
fn test_detected_format_overrides_default() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("payments.dta");

    let tape_options = OpenOptions::new().default_format(Format::Tape);
    let mut container = open_path(&path, &tape_options).unwrap();
    container.add_logical_file(&sample_header()).unwrap();
    container.commit().unwrap();

    // Reopening with a disk default still detects the tape profile.
    let reopened = open_path(&path, &options()).unwrap();
    assert_eq!(reopened.format(), Format::Tape);
}
