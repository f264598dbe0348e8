//! Structural validation for values handed to the write APIs
//!
//! These checks guard the programming contract: a header or transaction
//! that fails here is rejected before any block is touched. Recoverable
//! findings in data read *from* a store go through the diagnostics
//! recorder instead.

use crate::encoding::is_dtaus_char;
use crate::error::{DtausError, Result};
use crate::fields::{MAX_YEAR, MIN_YEAR};
use crate::records::{
    Header, Transaction, MAX_ACCOUNT, MAX_AMOUNT, MAX_BANK_CODE, MAX_DESCRIPTIONS,
};
use chrono::{Datelike, Days};

/// Widest text field (holder names, sender name, description lines).
pub const MAX_TEXT: usize = 27;

/// Latest allowed execution date, in days after the create date.
pub const MAX_SCHEDULE_DAYS: u64 = 15;

fn check_text(what: &str, text: &str, mandatory: bool) -> Result<()> {
    if mandatory && text.is_empty() {
        return Err(DtausError::InvalidArgument(format!("{what} is mandatory")));
    }
    if text.chars().count() > MAX_TEXT {
        return Err(DtausError::InvalidArgument(format!(
            "{what} exceeds {MAX_TEXT} characters"
        )));
    }
    if let Some(c) = text.chars().find(|&c| !is_dtaus_char(c)) {
        return Err(DtausError::InvalidArgument(format!(
            "{what} contains {c:?}, not a DTAUS character"
        )));
    }
    Ok(())
}

fn check_bank_code(what: &str, code: u64, mandatory: bool) -> Result<()> {
    if code == 0 {
        if mandatory {
            return Err(DtausError::InvalidArgument(format!("{what} is mandatory")));
        }
        return Ok(());
    }
    if code >= MAX_BANK_CODE {
        return Err(DtausError::InvalidArgument(format!(
            "{what} {code} outside the valid bank code range"
        )));
    }
    Ok(())
}

fn check_account(what: &str, account: u64) -> Result<()> {
    if account == 0 || account >= MAX_ACCOUNT {
        return Err(DtausError::InvalidArgument(format!(
            "{what} {account} outside 1..{MAX_ACCOUNT}"
        )));
    }
    Ok(())
}

pub fn validate_header(header: &Header) -> Result<()> {
    check_text("sender name", &header.sender_name, true)?;
    check_bank_code("recipient bank code", header.recipient_bank_code, true)?;
    // Bank-submitted files carry the sender's bank code; customer files
    // leave it zero.
    check_bank_code("sender bank code", header.sender_bank_code, false)?;
    check_account("account", header.account)?;
    if header.reference >= MAX_ACCOUNT {
        return Err(DtausError::InvalidArgument(format!(
            "reference {} exceeds 10 digits",
            header.reference
        )));
    }
    if header.currency != '1' {
        return Err(DtausError::InvalidArgument(format!(
            "currency {:?} is not supported",
            header.currency
        )));
    }

    let create = header.schedule.create_date;
    if !(MIN_YEAR..=MAX_YEAR).contains(&create.year()) {
        return Err(DtausError::InvalidArgument(format!(
            "create date year {} outside {MIN_YEAR}-{MAX_YEAR}",
            create.year()
        )));
    }
    if let Some(execution) = header.schedule.execution_date {
        if !(MIN_YEAR..=MAX_YEAR).contains(&execution.year()) {
            return Err(DtausError::InvalidArgument(format!(
                "execution date year {} outside {MIN_YEAR}-{MAX_YEAR}",
                execution.year()
            )));
        }
        let latest = create
            .checked_add_days(Days::new(MAX_SCHEDULE_DAYS))
            .ok_or_else(|| DtausError::InvalidArgument("create date out of range".into()))?;
        if execution < create || execution > latest {
            return Err(DtausError::InvalidArgument(format!(
                "execution date {execution} outside {create}..{latest}"
            )));
        }
    }
    Ok(())
}

pub fn validate_transaction(transaction: &Transaction, header: &Header) -> Result<()> {
    let kind = &transaction.kind;
    if !kind.is_supported() {
        return Err(DtausError::InvalidArgument(format!(
            "transaction type {:02}/{:03} is not supported",
            kind.key, kind.extension
        )));
    }
    if kind.is_debit() && !header.label.allows_debit() {
        return Err(DtausError::InvalidArgument(format!(
            "label {} does not permit debit transactions",
            header.label.code()
        )));
    }
    if kind.is_credit() && !header.label.allows_credit() {
        return Err(DtausError::InvalidArgument(format!(
            "label {} does not permit credit transactions",
            header.label.code()
        )));
    }

    check_bank_code("primary bank code", transaction.primary_bank_code, false)?;
    check_bank_code("target bank code", transaction.target.bank_code, true)?;
    check_bank_code("executive bank code", transaction.executive.bank_code, true)?;
    check_account("target account", transaction.target.account)?;
    check_account("executive account", transaction.executive.account)?;

    if transaction.amount == 0 || transaction.amount >= MAX_AMOUNT {
        return Err(DtausError::InvalidArgument(format!(
            "amount {} outside 1..{MAX_AMOUNT}",
            transaction.amount
        )));
    }
    if transaction.reference >= MAX_ACCOUNT {
        return Err(DtausError::InvalidArgument(format!(
            "reference {} exceeds 10 digits",
            transaction.reference
        )));
    }
    if transaction.currency != '1' {
        return Err(DtausError::InvalidArgument(format!(
            "currency {:?} is not supported",
            transaction.currency
        )));
    }

    check_text("target name", &transaction.target.name, true)?;
    check_text("executive name", &transaction.executive.name, true)?;
    if let Some(ref ext) = transaction.target_ext {
        check_text("target name extension", ext, false)?;
    }
    if let Some(ref ext) = transaction.executive_ext {
        check_text("executive name extension", ext, false)?;
    }

    if transaction.descriptions.len() > MAX_DESCRIPTIONS {
        return Err(DtausError::InvalidArgument(format!(
            "{} description lines exceed the maximum of {MAX_DESCRIPTIONS}",
            transaction.descriptions.len()
        )));
    }
    for line in &transaction.descriptions {
        // An empty line is not representable on the wire: the first line
        // writes as spaces and reads back as no line at all.
        if line.is_empty() {
            return Err(DtausError::InvalidArgument(
                "description lines must not be empty".into(),
            ));
        }
        check_text("description line", line, false)?;
    }
    Ok(())
}
