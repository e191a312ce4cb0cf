use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tag 28/28C statement numbering.
#[derive(Serialize, Deserialize, Clone, Default, Debug, PartialEq, Eq)]
pub struct StatementNumber {
    pub statement: String,
    pub sequence: Option<String>,
    /// Sub-sub number, only sent by some banks.
    pub section: Option<String>,
}

/// Tag 32A of MT900/MT910 notifications: value date, currency and amount.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DateCurrencyAmount {
    pub date: NaiveDate,
    pub currency: String,
    pub amount: Decimal,
}

/// Tag 50a, the customer that originated the transaction.
#[derive(Serialize, Deserialize, Clone, Default, Debug, PartialEq, Eq)]
pub struct OrderingCustomer {
    pub account: Option<String>,
    pub identifier_code: Option<String>,
    pub name_and_address: Vec<String>,
}

/// A raw envelope block (`{1:...}`, `{2:...}`) carried through untouched.
#[derive(Serialize, Deserialize, Clone, Default, Debug, PartialEq, Eq)]
pub struct MessageBlock {
    pub value: String,
}

pub type MessageBlocks = HashMap<String, MessageBlock>;
