use crate::transaction::Transaction;
use crate::types::{DateCurrencyAmount, MessageBlocks, OrderingCustomer, StatementNumber};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use serde::Serialize;

/// Every field a statement message can carry, as handed over by a parser.
///
/// The field set is consumed by [`Statement::new`], so nested data (message
/// blocks, ordering customer, transactions) moves into the statement and the
/// caller keeps no handle on it.
#[derive(Clone, Default, Debug)]
pub struct StatementFields {
    pub transaction_reference: String,
    pub related_reference: String,
    pub account_identification: String,
    pub number: Option<StatementNumber>,
    /// Day precision for MT940, minute precision for MT942.
    pub statement_date: NaiveDateTime,
    pub opening_balance_date: Option<NaiveDate>,
    pub closing_balance_date: Option<NaiveDate>,
    pub closing_available_balance_date: Option<NaiveDate>,
    pub forward_available_balance_date: Option<NaiveDate>,
    pub currency: Option<String>,
    pub opening_balance: Option<Decimal>,
    pub closing_balance: Option<Decimal>,
    pub closing_available_balance: Option<Decimal>,
    pub forward_available_balance: Option<Decimal>,
    pub information_to_account_owner: Option<String>,
    pub message_blocks: Option<MessageBlocks>,
    pub date_currency_amount: Option<DateCurrencyAmount>,
    pub ordering_institution: Option<String>,
    pub sender_to_receiver_information: Option<String>,
    pub ordering_customer: Option<OrderingCustomer>,
    pub intermediary: Option<String>,
    pub transactions: Vec<Transaction>,
}

/// A single MT940/MT942 statement or MT900/MT910 notification.
///
/// Construction fills in the closing available (tag 64) and forward
/// available (tag 65) balances from the closing balance when the message
/// left them out. Nothing else is checked: references, date ordering,
/// currency codes and the balance/transaction reconciliation are left to
/// the parser and to downstream consumers.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Statement {
    transaction_reference: String,
    related_reference: String,
    account_identification: String,
    number: Option<StatementNumber>,
    statement_date: NaiveDateTime,
    opening_balance_date: Option<NaiveDate>,
    closing_balance_date: Option<NaiveDate>,
    closing_available_balance_date: Option<NaiveDate>,
    forward_available_balance_date: Option<NaiveDate>,
    currency: Option<String>,
    opening_balance: Option<Decimal>,
    closing_balance: Option<Decimal>,
    closing_available_balance: Option<Decimal>,
    forward_available_balance: Option<Decimal>,
    information_to_account_owner: Option<String>,
    message_blocks: Option<MessageBlocks>,
    date_currency_amount: Option<DateCurrencyAmount>,
    ordering_institution: Option<String>,
    sender_to_receiver_information: Option<String>,
    ordering_customer: Option<OrderingCustomer>,
    intermediary: Option<String>,
    transactions: Vec<Transaction>,
}

impl Statement {
    pub fn new(fields: StatementFields) -> Self {
        let mut statement = Statement {
            transaction_reference: fields.transaction_reference,
            related_reference: fields.related_reference,
            account_identification: fields.account_identification,
            number: fields.number,
            statement_date: fields.statement_date,
            opening_balance_date: fields.opening_balance_date,
            closing_balance_date: fields.closing_balance_date,
            closing_available_balance_date: fields.closing_available_balance_date,
            forward_available_balance_date: fields.forward_available_balance_date,
            currency: fields.currency,
            opening_balance: fields.opening_balance,
            closing_balance: fields.closing_balance,
            closing_available_balance: fields.closing_available_balance,
            forward_available_balance: fields.forward_available_balance,
            information_to_account_owner: fields.information_to_account_owner,
            message_blocks: fields.message_blocks,
            date_currency_amount: fields.date_currency_amount,
            ordering_institution: fields.ordering_institution,
            sender_to_receiver_information: fields.sender_to_receiver_information,
            ordering_customer: fields.ordering_customer,
            intermediary: fields.intermediary,
            transactions: fields.transactions,
        };
        statement.derive_available_balances();
        statement
    }

    // The forward pair must be derived from the closing available pair as it
    // stands after the first step, not from the closing balance.
    fn derive_available_balances(&mut self) {
        if self.closing_balance.is_none() {
            return;
        }

        if self.closing_available_balance_date.is_none() {
            self.closing_available_balance_date = self.closing_balance_date;
            self.closing_available_balance = self.closing_balance;
        }

        if self.forward_available_balance_date.is_none() {
            self.forward_available_balance_date = self.closing_available_balance_date;
            self.forward_available_balance = self.closing_available_balance;
        }
    }

    pub fn transaction_reference(&self) -> &str {
        &self.transaction_reference
    }

    pub fn related_reference(&self) -> &str {
        &self.related_reference
    }

    pub fn account_identification(&self) -> &str {
        &self.account_identification
    }

    pub fn number(&self) -> Option<&StatementNumber> {
        self.number.as_ref()
    }

    pub fn statement_date(&self) -> NaiveDateTime {
        self.statement_date
    }

    pub fn opening_balance_date(&self) -> Option<NaiveDate> {
        self.opening_balance_date
    }

    pub fn closing_balance_date(&self) -> Option<NaiveDate> {
        self.closing_balance_date
    }

    pub fn closing_available_balance_date(&self) -> Option<NaiveDate> {
        self.closing_available_balance_date
    }

    pub fn forward_available_balance_date(&self) -> Option<NaiveDate> {
        self.forward_available_balance_date
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn opening_balance(&self) -> Option<Decimal> {
        self.opening_balance
    }

    pub fn closing_balance(&self) -> Option<Decimal> {
        self.closing_balance
    }

    pub fn closing_available_balance(&self) -> Option<Decimal> {
        self.closing_available_balance
    }

    pub fn forward_available_balance(&self) -> Option<Decimal> {
        self.forward_available_balance
    }

    pub fn information_to_account_owner(&self) -> Option<&str> {
        self.information_to_account_owner.as_deref()
    }

    pub fn message_blocks(&self) -> Option<&MessageBlocks> {
        self.message_blocks.as_ref()
    }

    pub fn date_currency_amount(&self) -> Option<&DateCurrencyAmount> {
        self.date_currency_amount.as_ref()
    }

    pub fn ordering_institution(&self) -> Option<&str> {
        self.ordering_institution.as_deref()
    }

    pub fn sender_to_receiver_information(&self) -> Option<&str> {
        self.sender_to_receiver_information.as_deref()
    }

    pub fn ordering_customer(&self) -> Option<&OrderingCustomer> {
        self.ordering_customer.as_ref()
    }

    pub fn intermediary(&self) -> Option<&str> {
        self.intermediary.as_deref()
    }

    /// Transactions in message order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

impl From<StatementFields> for Statement {
    fn from(fields: StatementFields) -> Self {
        Statement::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::{Statement, StatementFields};
    use crate::types::{MessageBlock, MessageBlocks};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn closing(amount: Decimal, on: Option<NaiveDate>) -> StatementFields {
        StatementFields {
            closing_balance: Some(amount),
            closing_balance_date: on,
            ..StatementFields::default()
        }
    }

    #[test]
    fn derives_available_balances_from_closing_balance() {
        let statement = Statement::new(closing(Decimal::new(10000, 2), Some(date(2024, 3, 1))));

        assert_eq!(statement.closing_available_balance(), Some(Decimal::new(10000, 2)));
        assert_eq!(statement.closing_available_balance_date(), Some(date(2024, 3, 1)));
        assert_eq!(statement.forward_available_balance(), Some(Decimal::new(10000, 2)));
        assert_eq!(statement.forward_available_balance_date(), Some(date(2024, 3, 1)));
        assert_eq!(
            statement.closing_available_balance().unwrap().to_string(),
            "100.00"
        );
    }

    #[test]
    fn derived_dates_stay_absent_without_closing_date() {
        let statement = Statement::new(closing(Decimal::new(-550, 1), None));

        assert_eq!(statement.closing_available_balance(), Some(Decimal::new(-550, 1)));
        assert_eq!(statement.closing_available_balance_date(), None);
        assert_eq!(statement.forward_available_balance(), Some(Decimal::new(-550, 1)));
        assert_eq!(statement.forward_available_balance_date(), None);
    }

    #[test]
    fn forward_balance_cascades_from_supplied_closing_available() {
        let statement = Statement::new(StatementFields {
            closing_available_balance: Some(Decimal::new(9000, 2)),
            closing_available_balance_date: Some(date(2024, 3, 2)),
            ..closing(Decimal::new(10000, 2), Some(date(2024, 3, 1)))
        });

        assert_eq!(statement.closing_available_balance(), Some(Decimal::new(9000, 2)));
        assert_eq!(statement.closing_available_balance_date(), Some(date(2024, 3, 2)));
        assert_eq!(statement.forward_available_balance(), Some(Decimal::new(9000, 2)));
        assert_eq!(statement.forward_available_balance_date(), Some(date(2024, 3, 2)));
    }

    #[test]
    fn supplied_forward_balance_is_kept() {
        let statement = Statement::new(StatementFields {
            forward_available_balance: Some(Decimal::new(12000, 2)),
            forward_available_balance_date: Some(date(2024, 3, 5)),
            ..closing(Decimal::new(10000, 2), Some(date(2024, 3, 1)))
        });

        assert_eq!(statement.closing_available_balance(), Some(Decimal::new(10000, 2)));
        assert_eq!(statement.forward_available_balance(), Some(Decimal::new(12000, 2)));
        assert_eq!(statement.forward_available_balance_date(), Some(date(2024, 3, 5)));
    }

    #[test]
    fn closing_available_amount_without_date_is_replaced() {
        let statement = Statement::new(StatementFields {
            closing_available_balance: Some(Decimal::new(1, 0)),
            ..closing(Decimal::new(10000, 2), Some(date(2024, 3, 1)))
        });

        assert_eq!(statement.closing_available_balance(), Some(Decimal::new(10000, 2)));
        assert_eq!(statement.closing_available_balance_date(), Some(date(2024, 3, 1)));
    }

    #[test]
    fn zero_closing_balance_still_derives() {
        let statement = Statement::new(closing(Decimal::ZERO, Some(date(2024, 1, 31))));

        assert_eq!(statement.forward_available_balance(), Some(Decimal::ZERO));
        assert_eq!(statement.forward_available_balance_date(), Some(date(2024, 1, 31)));
    }

    #[test]
    fn nothing_derived_without_closing_balance() {
        let statement = Statement::new(StatementFields::default());

        assert_eq!(statement.closing_available_balance(), None);
        assert_eq!(statement.closing_available_balance_date(), None);
        assert_eq!(statement.forward_available_balance(), None);
        assert_eq!(statement.forward_available_balance_date(), None);
    }

    #[test]
    fn supplied_tertiary_fields_pass_through_without_closing_balance() {
        let statement = Statement::new(StatementFields {
            closing_available_balance_date: Some(date(2024, 3, 2)),
            forward_available_balance: Some(Decimal::new(7, 0)),
            ..StatementFields::default()
        });

        assert_eq!(statement.closing_available_balance(), None);
        assert_eq!(statement.closing_available_balance_date(), Some(date(2024, 3, 2)));
        assert_eq!(statement.forward_available_balance(), Some(Decimal::new(7, 0)));
        assert_eq!(statement.forward_available_balance_date(), None);
    }

    #[test]
    fn derived_date_is_independent_of_closing_date() {
        let statement = Statement::new(closing(Decimal::new(10000, 2), Some(date(2024, 3, 1))));

        let mut derived = statement.closing_available_balance_date().unwrap();
        derived = derived.succ_opt().unwrap();

        assert_eq!(derived, date(2024, 3, 2));
        assert_eq!(statement.closing_balance_date(), Some(date(2024, 3, 1)));
        assert_eq!(statement.closing_available_balance_date(), Some(date(2024, 3, 1)));
    }

    #[test]
    fn other_fields_are_moved_in_unchanged() {
        let mut blocks = MessageBlocks::new();
        blocks.insert(
            "1".to_string(),
            MessageBlock {
                value: "F01BANKBEBBAXXX0000000000".to_string(),
            },
        );

        let statement: Statement = StatementFields {
            transaction_reference: "REF-1".to_string(),
            account_identification: "NL00BANK0123456789".to_string(),
            currency: Some("EUR".to_string()),
            opening_balance: Some(Decimal::new(5, 0)),
            message_blocks: Some(blocks.clone()),
            ..StatementFields::default()
        }
        .into();

        assert_eq!(statement.transaction_reference(), "REF-1");
        assert_eq!(statement.related_reference(), "");
        assert_eq!(statement.account_identification(), "NL00BANK0123456789");
        assert_eq!(statement.currency(), Some("EUR"));
        assert_eq!(statement.opening_balance(), Some(Decimal::new(5, 0)));
        assert_eq!(statement.message_blocks(), Some(&blocks));
        assert!(statement.transactions().is_empty());
    }
}
