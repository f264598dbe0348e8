//! Progress reporting and cooperative cancellation of the opening scan

use chrono::NaiveDate;
use dtaus::factory::{open_bytes, open_bytes_with, OpenOptions};
use dtaus::records::{BankAccount, Header, Label, Schedule, Transaction, TransactionType};
use dtaus::{DtausError, Format, ProgressMonitor};

#[derive(Default)]
struct RecordingMonitor {
    total: u64,
    advanced: u64,
    cancel_after: Option<u64>,
}

impl ProgressMonitor for RecordingMonitor {
    fn begin(&mut self, total: u64) {
        self.total = total;
    }

    fn advance(&mut self, units: u64) {
        self.advanced += units;
    }

    fn cancelled(&self) -> bool {
        matches!(self.cancel_after, Some(limit) if self.advanced >= limit)
    }
}

fn build_bytes(transactions: usize) -> Vec<u8> {
    let options = OpenOptions::new().default_format(Format::Disk);
    let mut container = open_bytes(Vec::new(), &options).unwrap();
    container
        .add_logical_file(&Header {
            label: Label::CustomerCredit,
            recipient_bank_code: 37040044,
            sender_bank_code: 0,
            sender_name: "TESTFIRMA".into(),
            account: 1234567,
            reference: 0,
            schedule: Schedule::new(NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()),
            currency: '1',
        })
        .unwrap();
    let mut file = container.file(0).unwrap();
    for i in 0..transactions {
        file.add_transaction(&Transaction {
            kind: TransactionType::new(51, 0),
            amount: 100 + i as u64,
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
        })
        .unwrap();
    }
    drop(file);
    container.commit().unwrap().into_bytes()
}

#[test]
fn test_monitor_sees_all_transaction_blocks() {
    let bytes = build_bytes(5);
    let options = OpenOptions::new().default_format(Format::Disk);
    let mut monitor = RecordingMonitor::default();
    let container = open_bytes_with(bytes, &options, &mut monitor).unwrap();
    assert_eq!(container.file_count(), 1);
    // Five plain transactions at two disk blocks each.
    assert_eq!(monitor.advanced, 10);
    assert!(monitor.total >= monitor.advanced);
}

#[test]
fn test_cancelled_open_reports_cancellation() {
    let bytes = build_bytes(5);
    let options = OpenOptions::new().default_format(Format::Disk);
    let mut monitor = RecordingMonitor {
        cancel_after: Some(2),
        ..RecordingMonitor::default()
    };
    let err = open_bytes_with(bytes, &options, &mut monitor);
    assert!(matches!(err, Err(DtausError::Cancelled)));
    assert!(monitor.advanced < 10);
}
