use crate::error::{Error, Result};
use crate::statement::{Statement, StatementFields};
use crate::transaction::Transaction;
use crate::types::{DateCurrencyAmount, MessageBlock, MessageBlocks, OrderingCustomer, StatementNumber};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;
use tracing::{debug, trace, warn};

use nom::branch::alt;
use nom::bytes::complete::*;
use nom::character::complete::{char, line_ending, multispace0, not_line_ending, one_of};
use nom::combinator::{all_consuming, map, map_res, opt, recognize, value, verify};
use nom::multi::many0;
use nom::sequence::*;
use nom::IResult;

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// One `:TAG:content` field of a message text block.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
	pub tag: String,
	pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
struct Balance {
	date: NaiveDate,
	currency: String,
	amount: Decimal,
}

/// Reads every statement contained in `reader`.
pub fn read_statements<R: Read>(mut reader: R) -> Result<Vec<Statement>> {
	let mut input = String::new();
	reader.read_to_string(&mut input)?;
	parse_statements(&input)
}

/// Parses MT940, MT942, MT900 and MT910 messages, with or without the SWIFT
/// `{1:}{2:}{4:...-}` envelope. Several messages may follow each other.
pub fn parse_statements(input: &str) -> Result<Vec<Statement>> {
	let text = input.replace("\r\n", "\n");
	let mut statements = Vec::new();
	let mut remaining = text.trim_start();

	while !remaining.is_empty() {
		let (body, blocks, rest) = if remaining.starts_with('{') {
			let (rest, blocks) = envelope(remaining)
				.map_err(|_| Error::Parse(format!("malformed message envelope near {:?}", first_line(remaining))))?;
			let (body, blocks) = split_text_block(blocks)?;
			(body, Some(blocks), rest)
		} else {
			(remaining, None, "")
		};

		let records = parse_records(body)?;
		for group in split_messages(records) {
			debug!("parsing statement {:?} ({} records)", group[0].message, group.len());
			statements.push(build_statement(group, blocks.clone())?);
		}

		remaining = rest.trim_start();
	}

	Ok(statements)
}

/// Splits a message text block into its tagged records.
pub fn parse_records(body: &str) -> Result<Vec<Record>> {
	let (remaining, records) = records(body)
		.map_err(|_| Error::Parse(format!("malformed message text near {:?}", first_line(body))))?;

	let remaining = remaining.trim();
	if !remaining.is_empty() {
		return Err(Error::Parse(format!("unexpected content {:?}", first_line(remaining))));
	}

	Ok(records)
}

fn first_line(input: &str) -> &str {
	input.lines().next().unwrap_or_default()
}

pub(crate) fn records(input: &str) -> IResult<&str, Vec<Record>> {
	let (input, records) = many0(preceded(
		multispace0,
		alt((map(record, Some), value(None, char('-')))),
	))(input)?;
	Ok((input, records.into_iter().flatten().collect()))
}

pub(crate) fn record(input: &str) -> IResult<&str, Record> {
	let (input, tag) = record_tag(input)?;
	let (input, first) = not_line_ending(input)?;
	let (input, rest) = many0(continuation_line)(input)?;

	let mut message = first.to_string();
	for line in rest {
		message.push('\n');
		message.push_str(line);
	}
	trace!("record :{}: {:?}", tag, message);

	Ok((
		input,
		Record {
			tag: tag.to_string(),
			message: message.trim_end().to_string(),
		},
	))
}

fn record_tag(input: &str) -> IResult<&str, &str> {
	delimited(
		char(':'),
		recognize(pair(take_while_m_n(2, 2, |c: char| c.is_ascii_digit()), opt(one_of(UPPERCASE)))),
		char(':'),
	)(input)
}

fn continuation_line(input: &str) -> IResult<&str, &str> {
	preceded(
		line_ending,
		verify(not_line_ending, |line: &str| !line.starts_with(':') && line.trim_end() != "-"),
	)(input)
}

// Blocks up to and including the text block, plus an optional `{5:}` trailer.
fn envelope(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
	let mut blocks = Vec::new();
	let mut input = input;
	loop {
		let (rest, (name, content)) = preceded(multispace0, block)(input)?;
		blocks.push((name, content));
		input = rest;
		if name == "4" {
			break;
		}
	}

	let (input, trailer) = opt(preceded(
		multispace0,
		verify(block, |(name, _): &(&str, &str)| *name == "5"),
	))(input)?;
	blocks.extend(trailer);
	Ok((input, blocks))
}

fn block(input: &str) -> IResult<&str, (&str, &str)> {
	delimited(
		char('{'),
		pair(terminated(take_while1(|c: char| c.is_ascii_alphanumeric()), char(':')), block_content),
		char('}'),
	)(input)
}

// Block 3 nests its own `{108:...}` fields.
fn block_content(input: &str) -> IResult<&str, &str> {
	recognize(many0(alt((
		is_not("{}"),
		recognize(delimited(char('{'), block_content, char('}'))),
	))))(input)
}

fn split_text_block<'a>(blocks: Vec<(&str, &'a str)>) -> Result<(&'a str, MessageBlocks)> {
	let mut body = None;
	let mut message_blocks = MessageBlocks::new();

	for (name, content) in blocks {
		if name == "4" {
			body = Some(content.trim_end().trim_end_matches('-'));
		} else {
			message_blocks.insert(
				name.to_string(),
				MessageBlock {
					value: content.to_string(),
				},
			);
		}
	}

	match body {
		Some(body) => Ok((body, message_blocks)),
		None => Err(Error::MissingField("text block {4:}")),
	}
}

fn split_messages(records: Vec<Record>) -> Vec<Vec<Record>> {
	let mut messages: Vec<Vec<Record>> = Vec::new();
	for record in records {
		if record.tag == "20" || messages.is_empty() {
			messages.push(vec![record]);
		} else if let Some(current) = messages.last_mut() {
			current.push(record);
		}
	}
	messages
}

fn build_statement(records: Vec<Record>, message_blocks: Option<MessageBlocks>) -> Result<Statement> {
	let mut fields = StatementFields {
		message_blocks,
		..StatementFields::default()
	};
	let mut statement_date: Option<NaiveDateTime> = None;
	let mut opening: Option<Balance> = None;
	let mut closing: Option<Balance> = None;
	let mut details_for_transaction = false;

	for record in records {
		let after_transaction = details_for_transaction;
		details_for_transaction = false;
		let message = record.message;

		match record.tag.as_str() {
			"20" => fields.transaction_reference = message,
			"21" => fields.related_reference = message,
			"25" => fields.account_identification = message,
			"28" | "28C" => fields.number = Some(parse_number(&message)),
			"13D" => statement_date = Some(parse_date_time(&message)?),
			"60F" | "60M" => opening = Some(parse_field(&record.tag, &message, balance)?),
			"62F" | "62M" => closing = Some(parse_field(&record.tag, &message, balance)?),
			"64" => {
				let available = parse_field(&record.tag, &message, balance)?;
				fields.closing_available_balance_date = Some(available.date);
				fields.closing_available_balance = Some(available.amount);
			}
			"65" => {
				let forward = parse_field(&record.tag, &message, balance)?;
				fields.forward_available_balance_date = Some(forward.date);
				fields.forward_available_balance = Some(forward.amount);
			}
			"61" => {
				fields.transactions.push(parse_transaction(&message)?);
				details_for_transaction = true;
			}
			"86" => match fields.transactions.last_mut() {
				Some(transaction) if after_transaction => transaction.details = message,
				_ => {
					fields.information_to_account_owner = Some(match fields.information_to_account_owner.take() {
						Some(existing) => format!("{}\n{}", existing, message),
						None => message,
					})
				}
			},
			"32A" => {
				let (date, currency, amount) = parse_field(
					&record.tag,
					&message,
					tuple((short_date, currency_code, amount)),
				)?;
				fields.date_currency_amount = Some(DateCurrencyAmount {
					date,
					currency: currency.to_string(),
					amount,
				});
			}
			"50A" | "50F" | "50K" => {
				fields.ordering_customer = Some(parse_ordering_customer(&record.tag, &message))
			}
			"52A" | "52D" => fields.ordering_institution = Some(message),
			"56A" | "56D" => fields.intermediary = Some(message),
			"72" => fields.sender_to_receiver_information = Some(message),
			other => debug!("skipping unsupported tag :{}:", other),
		}
	}

	if fields.transaction_reference.is_empty() {
		return Err(Error::MissingField("transaction reference (tag 20)"));
	}
	if fields.account_identification.is_empty() {
		return Err(Error::MissingField("account identification (tag 25)"));
	}

	fields.currency = opening
		.as_ref()
		.or_else(|| closing.as_ref())
		.map(|b| b.currency.clone())
		.or_else(|| fields.date_currency_amount.as_ref().map(|d| d.currency.clone()));

	fields.statement_date = statement_date
		.or_else(|| closing.as_ref().map(|b| midnight(b.date)))
		.or_else(|| fields.date_currency_amount.as_ref().map(|d| midnight(d.date)))
		.ok_or(Error::MissingField("statement date (tag 13D, 62a or 32A)"))?;

	if let Some(opening) = opening {
		fields.opening_balance_date = Some(opening.date);
		fields.opening_balance = Some(opening.amount);
	}
	if let Some(closing) = closing {
		fields.closing_balance_date = Some(closing.date);
		fields.closing_balance = Some(closing.amount);
	}

	for transaction in fields.transactions.iter_mut() {
		transaction.currency = fields.currency.clone();
	}

	Ok(Statement::new(fields))
}

fn parse_field<'a, O, F>(tag: &str, message: &'a str, parser: F) -> Result<O>
where
	F: Fn(&'a str) -> IResult<&'a str, O>,
{
	all_consuming(parser)(message.trim())
		.map(|(_, output)| output)
		.map_err(|_| Error::Parse(format!("invalid :{}: field {:?}", tag, message)))
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
	date.and_hms_opt(0, 0, 0).unwrap_or_default()
}

fn parse_number(message: &str) -> StatementNumber {
	let mut parts = message.trim().splitn(3, '/').map(str::to_string);
	StatementNumber {
		statement: parts.next().unwrap_or_default(),
		sequence: parts.next(),
		section: parts.next(),
	}
}

fn parse_date_time(message: &str) -> Result<NaiveDateTime> {
	DateTime::parse_from_str(message.trim(), "%y%m%d%H%M%z")
		.map(|date_time| date_time.naive_utc())
		.map_err(|e| Error::Parse(format!("invalid :13D: field {:?}: {}", message, e)))
}

fn parse_ordering_customer(tag: &str, message: &str) -> OrderingCustomer {
	let mut lines = message.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();
	let account = if lines.peek().map_or(false, |line| line.starts_with('/')) {
		lines.next().map(|line| line[1..].to_string())
	} else {
		None
	};

	if tag == "50A" {
		OrderingCustomer {
			account,
			identifier_code: lines.next().map(str::to_string),
			name_and_address: lines.map(str::to_string).collect(),
		}
	} else {
		OrderingCustomer {
			account,
			identifier_code: None,
			name_and_address: lines.map(str::to_string).collect(),
		}
	}
}

fn parse_decimal(input: &str) -> std::result::Result<Decimal, rust_decimal::Error> {
	let normalised = input.replacen(',', ".", 1);
	Decimal::from_str(normalised.trim_end_matches('.'))
}

fn amount(input: &str) -> IResult<&str, Decimal> {
	map_res(take_while1(|c: char| c.is_ascii_digit() || c == ','), parse_decimal)(input)
}

fn short_date(input: &str) -> IResult<&str, NaiveDate> {
	map_res(take_while_m_n(6, 6, |c: char| c.is_ascii_digit()), |s: &str| {
		NaiveDate::parse_from_str(s, "%y%m%d")
	})(input)
}

fn currency_code(input: &str) -> IResult<&str, &str> {
	take_while_m_n(3, 3, |c: char| c.is_ascii_uppercase())(input)
}

fn balance(input: &str) -> IResult<&str, Balance> {
	let (input, (mark, date, currency, amount)) = tuple((one_of("CD"), short_date, currency_code, amount))(input)?;

	Ok((
		input,
		Balance {
			date,
			currency: currency.to_string(),
			amount: if mark == 'D' { -amount } else { amount },
		},
	))
}

// :61: 240301 0301 RC R 100,00 NTRF customer//bank
struct StatementLine<'a> {
	date: NaiveDate,
	entry_date: Option<&'a str>,
	mark: &'a str,
	funds_code: Option<char>,
	amount: Decimal,
	transaction_type: &'a str,
	references: &'a str,
}

fn statement_line(input: &str) -> IResult<&str, StatementLine> {
	let (input, (date, entry_date, mark, funds_code, amount, transaction_type, references)) = tuple((
		short_date,
		opt(take_while_m_n(4, 4, |c: char| c.is_ascii_digit())),
		alt((tag("RC"), tag("RD"), tag("C"), tag("D"))),
		opt(one_of(UPPERCASE)),
		amount,
		recognize(pair(one_of("NFS"), take(3usize))),
		not_line_ending,
	))(input)?;

	Ok((
		input,
		StatementLine {
			date,
			entry_date,
			mark,
			funds_code,
			amount,
			transaction_type,
			references,
		},
	))
}

fn parse_transaction(message: &str) -> Result<Transaction> {
	let mut lines = message.splitn(2, '\n');
	let first = lines.next().unwrap_or_default();
	let extra_details = lines.next().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string);

	let line = parse_field("61", first, statement_line)?;

	let entry_date = line.entry_date.and_then(|mmdd| {
		let resolved = resolve_entry_date(line.date, mmdd);
		if resolved.is_none() {
			warn!("ignoring invalid entry date {:?} in :61: field {:?}", mmdd, first);
		}
		resolved
	});

	let mut references = line.references.splitn(2, "//");
	let customer_reference = references.next().unwrap_or_default().trim().to_string();
	let bank_reference = references.next().map(str::trim).filter(|r| !r.is_empty()).map(str::to_string);

	let amount = match line.mark {
		"D" | "RC" => -line.amount,
		_ => line.amount,
	};

	Ok(Transaction {
		date: line.date,
		entry_date,
		funds_code: line.funds_code.map(String::from),
		amount,
		is_reversal: line.mark.starts_with('R'),
		currency: None,
		transaction_type: line.transaction_type.to_string(),
		customer_reference,
		bank_reference,
		extra_details,
		details: String::new(),
	})
}

// The entry date carries no year; it may fall across a year end from the value date.
fn resolve_entry_date(value_date: NaiveDate, mmdd: &str) -> Option<NaiveDate> {
	let month: u32 = mmdd.get(..2)?.parse().ok()?;
	let day: u32 = mmdd.get(2..)?.parse().ok()?;
	let year = match (value_date.month(), month) {
		(12, 1) => value_date.year() + 1,
		(1, 12) => value_date.year() - 1,
		_ => value_date.year(),
	};
	NaiveDate::from_ymd_opt(year, month, day)
}
