// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Field values and their lenient parsers.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

pub const MIN_AMOUNT: f64 = 5.0;
pub const MAX_AMOUNT: f64 = 1_000_000.0;
pub const DEFAULT_NUMBER_OF_CARDS: i64 = 1;
pub const MAX_NUMBER_OF_CARDS: i64 = 100_000;
pub const CUSTOM_MESSAGE_MAX_CHARS: usize = 255;
pub const DEFAULT_EXPIRY_MONTHS: u32 = 12;

/// Wire format of the expiry date input.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Form field names, as used for error keys and constraint reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Amount,
    #[serde(rename = "PaymentMethodId")]
    PaymentMethodId,
    ExpiryDate,
    LimitedToHostCollectiveIds,
    LimitedToCollectiveIds,
    Emails,
    CustomMessage,
    NumberOfVirtualCards,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Amount => "amount",
            Field::PaymentMethodId => "PaymentMethodId",
            Field::ExpiryDate => "expiryDate",
            Field::LimitedToHostCollectiveIds => "limitedToHostCollectiveIds",
            Field::LimitedToCollectiveIds => "limitedToCollectiveIds",
            Field::Emails => "emails",
            Field::CustomMessage => "customMessage",
            Field::NumberOfVirtualCards => "numberOfVirtualCards",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current content of every input on the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValues {
    /// Card value in major units, as typed.
    pub amount: f64,
    pub emails: Vec<String>,
    pub custom_message: String,
    /// Only meaningful in manual delivery mode.
    pub number_of_virtual_cards: i64,
    pub limited_to_host_collective_ids: Vec<u64>,
    pub limited_to_collective_ids: Vec<u64>,
    /// `YYYY-MM-DD`, kept verbatim so a half-typed date survives.
    pub expiry_date: String,
    /// `None` until the user picks one; submission falls back to the first
    /// available method.
    pub payment_method_id: Option<u64>,
}

impl FormValues {
    /// Values shown when the form mounts on `today`.
    pub fn initial(today: NaiveDate) -> Self {
        Self {
            amount: MIN_AMOUNT,
            emails: Vec::new(),
            custom_message: String::new(),
            number_of_virtual_cards: DEFAULT_NUMBER_OF_CARDS,
            limited_to_host_collective_ids: Vec::new(),
            limited_to_collective_ids: Vec::new(),
            expiry_date: default_expiry_date(today).format(DATE_FORMAT).to_string(),
            payment_method_id: None,
        }
    }
}

pub fn default_expiry_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_months(Months::new(DEFAULT_EXPIRY_MONTHS))
        .unwrap_or(NaiveDate::MAX)
}

/// Earliest expiry date accepted on `today`.
pub fn min_expiry_date(today: NaiveDate) -> NaiveDate {
    today.succ_opt().unwrap_or(NaiveDate::MAX)
}

/// Parse an amount the way a number input reports it: the longest leading
/// decimal prefix wins, anything unparseable becomes [`MIN_AMOUNT`].
pub fn parse_amount(raw: &str) -> f64 {
    parse_leading_decimal(raw)
        .filter(|v| v.is_finite())
        .unwrap_or(MIN_AMOUNT)
}

/// Parse a card count: leading integer prefix, fractions truncated,
/// anything unparseable becomes [`DEFAULT_NUMBER_OF_CARDS`].
pub fn parse_number_of_cards(raw: &str) -> i64 {
    parse_leading_integer(raw).unwrap_or(DEFAULT_NUMBER_OF_CARDS)
}

fn sign_len(s: &str) -> usize {
    match s.as_bytes().first() {
        Some(b'+') | Some(b'-') => 1,
        _ => 0,
    }
}

fn digits_len(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

fn parse_leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let sign = sign_len(s);
    let digits = digits_len(&s[sign..]);
    if digits == 0 {
        return None;
    }
    s[..sign + digits].parse::<i64>().ok()
}

fn parse_leading_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let mut end = sign_len(s);
    let int_digits = digits_len(&s[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if s[end..].starts_with('.') {
        frac_digits = digits_len(&s[end + 1..]);
        if frac_digits > 0 || int_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    // Optional exponent, only consumed when followed by digits.
    let rest = &s[end..];
    if rest.starts_with('e') || rest.starts_with('E') {
        let exp_sign = sign_len(&rest[1..]);
        let exp_digits = digits_len(&rest[1 + exp_sign..]);
        if exp_digits > 0 {
            end += 1 + exp_sign + exp_digits;
        }
    }

    s[..end].parse::<f64>().ok()
}
