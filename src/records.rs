//! Logical data model: header, transaction and checksum records
//!
//! These are plain values; all byte-layout knowledge lives in the format
//! profiles and all mutation rules in the logical file engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Highest transaction count a logical file may hold (7-digit count field).
pub const MAX_TRANSACTIONS: u64 = 9_999_999;

/// Maximum description lines per transaction.
pub const MAX_DESCRIPTIONS: usize = 14;

/// Exclusive upper bound for account numbers (10 digits).
pub const MAX_ACCOUNT: u64 = 10_000_000_000;

/// Exclusive upper bound for amounts in minor currency units (11 digits).
pub const MAX_AMOUNT: u64 = 100_000_000_000;

/// Exclusive upper bound for bank codes; the all-nines values are reserved
/// sentinels and never valid codes.
pub const MAX_BANK_CODE: u64 = 99_999_999;

/// Header label: who may send the file and whether it carries debits or
/// credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    /// "LK" - debit orders submitted by a bank customer.
    CustomerDebit,
    /// "GK" - credit transfers submitted by a bank customer.
    CustomerCredit,
    /// "LB" - debit orders exchanged between banks.
    BankDebit,
    /// "GB" - credit transfers exchanged between banks.
    BankCredit,
}

impl Label {
    pub fn code(&self) -> &'static str {
        match self {
            Label::CustomerDebit => "LK",
            Label::CustomerCredit => "GK",
            Label::BankDebit => "LB",
            Label::BankCredit => "GB",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "LK" => Some(Label::CustomerDebit),
            "GK" => Some(Label::CustomerCredit),
            "LB" => Some(Label::BankDebit),
            "GB" => Some(Label::BankCredit),
            _ => None,
        }
    }

    pub fn allows_debit(&self) -> bool {
        matches!(self, Label::CustomerDebit | Label::BankDebit)
    }

    pub fn allows_credit(&self) -> bool {
        matches!(self, Label::CustomerCredit | Label::BankCredit)
    }
}

/// File schedule: creation date plus an optional execution date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub create_date: NaiveDate,
    pub execution_date: Option<NaiveDate>,
}

impl Schedule {
    pub fn new(create_date: NaiveDate) -> Self {
        Schedule {
            create_date,
            execution_date: None,
        }
    }

    pub fn with_execution(create_date: NaiveDate, execution_date: NaiveDate) -> Self {
        Schedule {
            create_date,
            execution_date: Some(execution_date),
        }
    }
}

/// "A" record contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub label: Label,
    /// Bank code of the institution receiving the file.
    pub recipient_bank_code: u64,
    /// Bank code of the sender; zero for customer-submitted files.
    pub sender_bank_code: u64,
    pub sender_name: String,
    pub account: u64,
    pub reference: u64,
    pub schedule: Schedule,
    /// Single-character currency indicator; '1' is the Euro.
    pub currency: char,
}

/// Transaction type: a two-part key selecting debit/credit and purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionType {
    pub key: u8,
    pub extension: u16,
}

impl TransactionType {
    pub const DEBIT_KEYS: [u8; 3] = [4, 5, 6];
    pub const CREDIT_KEYS: [u8; 7] = [51, 53, 54, 56, 67, 68, 69];

    pub fn new(key: u8, extension: u16) -> Self {
        TransactionType { key, extension }
    }

    pub fn is_debit(&self) -> bool {
        Self::DEBIT_KEYS.contains(&self.key)
    }

    pub fn is_credit(&self) -> bool {
        Self::CREDIT_KEYS.contains(&self.key)
    }

    pub fn is_supported(&self) -> bool {
        (self.is_debit() || self.is_credit()) && self.extension < 1000
    }
}

/// One party of a payment: bank code, account number, holder name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub bank_code: u64,
    pub account: u64,
    pub name: String,
}

/// "C" record contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionType,
    /// Amount in minor currency units.
    pub amount: u64,
    /// Bank code of the first involved institution; zero if unused.
    pub primary_bank_code: u64,
    /// The party money moves to (credit) or from (debit).
    pub target: BankAccount,
    /// The ordering party.
    pub executive: BankAccount,
    /// Overflow for a target name longer than the fixed name field.
    pub target_ext: Option<String>,
    /// Overflow for the executive name.
    pub executive_ext: Option<String>,
    pub reference: u64,
    pub currency: char,
    /// 0..=14 purpose lines; the first occupies the fixed record part.
    pub descriptions: Vec<String>,
}

impl Transaction {
    /// Number of extension slots this transaction occupies beyond the
    /// fixed record part.
    pub fn extension_slots(&self) -> usize {
        let desc = self.descriptions.len().saturating_sub(1);
        usize::from(self.target_ext.is_some())
            + desc
            + usize::from(self.executive_ext.is_some())
    }
}

/// "E" record contents: running sums over the stored transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Checksum {
    pub transaction_count: u64,
    pub sum_target_account: u64,
    pub sum_target_bank: u64,
    pub sum_amount: u64,
}

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one transaction into the sums.
    pub fn add(&mut self, t: &Transaction) {
        self.transaction_count += 1;
        self.sum_target_account = self.sum_target_account.wrapping_add(t.target.account);
        self.sum_target_bank = self.sum_target_bank.wrapping_add(t.target.bank_code);
        self.sum_amount = self.sum_amount.wrapping_add(t.amount);
    }

    /// Reverses a previous `add` of the same transaction.
    pub fn subtract(&mut self, t: &Transaction) {
        self.transaction_count -= 1;
        self.sum_target_account = self.sum_target_account.wrapping_sub(t.target.account);
        self.sum_target_bank = self.sum_target_bank.wrapping_sub(t.target.bank_code);
        self.sum_amount = self.sum_amount.wrapping_sub(t.amount);
    }

    /// Compares against a checksum read from a store. Stored sums are
    /// truncated to their field widths, so both sides are reduced before
    /// comparing.
    pub fn matches_stored(&self, stored: &Checksum) -> bool {
        const SUM17: u64 = 100_000_000_000_000_000;
        const SUM13: u64 = 10_000_000_000_000;
        self.transaction_count == stored.transaction_count
            && self.sum_target_account % SUM17 == stored.sum_target_account % SUM17
            && self.sum_target_bank % SUM17 == stored.sum_target_bank % SUM17
            && self.sum_amount % SUM13 == stored.sum_amount % SUM13
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transaction(amount: u64) -> Transaction {
        Transaction {
            kind: TransactionType::new(51, 0),
            amount,
            primary_bank_code: 0,
            target: BankAccount {
                bank_code: 37040044,
                account: 1234567890,
                name: "MUSTERMANN".into(),
            },
            executive: BankAccount {
                bank_code: 50010517,
                account: 987654321,
                name: "FIRMA GMBH".into(),
            },
            target_ext: None,
            executive_ext: None,
            reference: 0,
            currency: '1',
            descriptions: vec!["RECHNUNG 42".into()],
        }
    }

    #[test]
    fn test_label_codes() {
        for label in [
            Label::CustomerDebit,
            Label::CustomerCredit,
            Label::BankDebit,
            Label::BankCredit,
        ] {
            assert_eq!(Label::parse(label.code()), Some(label));
        }
        assert_eq!(Label::parse("XX"), None);
    }

    #[test]
    fn test_label_capabilities() {
        assert!(Label::CustomerDebit.allows_debit());
        assert!(!Label::CustomerDebit.allows_credit());
        assert!(Label::BankCredit.allows_credit());
        assert!(!Label::BankCredit.allows_debit());
    }

    #[test]
    fn test_type_keys() {
        assert!(TransactionType::new(5, 0).is_debit());
        assert!(TransactionType::new(51, 0).is_credit());
        assert!(!TransactionType::new(51, 0).is_debit());
        assert!(!TransactionType::new(99, 0).is_supported());
        assert!(!TransactionType::new(51, 1000).is_supported());
    }

    #[test]
    fn test_extension_slot_count() {
        let mut t = sample_transaction(100);
        assert_eq!(t.extension_slots(), 0);

        t.descriptions = (0..14).map(|i| format!("LINE {i}")).collect();
        t.target_ext = Some("EXT".into());
        t.executive_ext = Some("EXT".into());
        assert_eq!(t.extension_slots(), 15);

        t.descriptions.clear();
        assert_eq!(t.extension_slots(), 2);
    }

    #[test]
    fn test_checksum_add_subtract() {
        let mut sum = Checksum::new();
        let a = sample_transaction(100);
        let b = sample_transaction(250);

        sum.add(&a);
        sum.add(&b);
        assert_eq!(sum.transaction_count, 2);
        assert_eq!(sum.sum_amount, 350);
        assert_eq!(sum.sum_target_account, 2 * 1234567890);

        sum.subtract(&a);
        assert_eq!(sum.transaction_count, 1);
        assert_eq!(sum.sum_amount, 250);
    }

    #[test]
    fn test_checksum_matches_modulo_field_width() {
        let live = Checksum {
            transaction_count: 1,
            sum_target_account: 100_000_000_000_000_007,
            sum_target_bank: 7,
            sum_amount: 10_000_000_000_042,
        };
        let stored = Checksum {
            transaction_count: 1,
            sum_target_account: 7,
            sum_target_bank: 7,
            sum_amount: 42,
        };
        assert!(live.matches_stored(&stored));
    }
}
