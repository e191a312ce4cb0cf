use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A statement line (tag 61) together with its details (tag 86).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub entry_date: Option<NaiveDate>,
    pub funds_code: Option<String>,
    /// Signed: debits and reversed credits are negative.
    pub amount: Decimal,
    pub is_reversal: bool,
    pub currency: Option<String>,
    pub transaction_type: String,
    pub customer_reference: String,
    pub bank_reference: Option<String>,
    pub extra_details: Option<String>,
    pub details: String,
}

impl Transaction {
    pub fn is_credit(&self) -> bool {
        self.amount.is_sign_positive()
    }

    pub fn is_debit(&self) -> bool {
        !self.is_credit()
    }
}
