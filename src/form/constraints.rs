// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Declarative per-field constraints checked right before submission.
//!
//! Each field carries an ordered rule list; evaluation reports at most one
//! violation per field (the first rule that fails), in declaration order.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use validator::{ValidateLength, ValidateRange, ValidateRequired};

use super::values::{
    min_expiry_date, Field, FormValues, CUSTOM_MESSAGE_MAX_CHARS, DATE_FORMAT, MAX_AMOUNT,
    MAX_NUMBER_OF_CARDS, MIN_AMOUNT,
};
use crate::models::DeliveryMode;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "rule", content = "limit")]
pub enum Rule {
    Required,
    Min(f64),
    Max(f64),
    MaxLength(usize),
    /// Value must parse as a `YYYY-MM-DD` date.
    DatePattern,
    /// Date must not be earlier than the given day.
    NotBefore(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldConstraint {
    pub field: Field,
    pub rules: Vec<Rule>,
}

impl FieldConstraint {
    fn new(field: Field, rules: impl Into<Vec<Rule>>) -> Self {
        Self {
            field,
            rules: rules.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintViolation {
    pub field: Field,
    pub rule: Rule,
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            Rule::Required => write!(f, "{} is required", self.field),
            Rule::Min(min) => write!(f, "{} must be at least {min}", self.field),
            Rule::Max(max) => write!(f, "{} must be at most {max}", self.field),
            Rule::MaxLength(max) => {
                write!(f, "{} must be at most {max} characters", self.field)
            }
            Rule::DatePattern => write!(f, "{} must be a date (YYYY-MM-DD)", self.field),
            Rule::NotBefore(day) => {
                write!(f, "{} must be {} or later", self.field, day.format(DATE_FORMAT))
            }
        }
    }
}

/// Rules for the fields visible in `mode` on `today`.
pub fn constraints_for(mode: DeliveryMode, today: NaiveDate) -> Vec<FieldConstraint> {
    let mut list = vec![
        FieldConstraint::new(
            Field::Amount,
            [Rule::Required, Rule::Min(MIN_AMOUNT), Rule::Max(MAX_AMOUNT)],
        ),
        FieldConstraint::new(Field::PaymentMethodId, [Rule::Required]),
        FieldConstraint::new(
            Field::ExpiryDate,
            [
                Rule::Required,
                Rule::DatePattern,
                Rule::NotBefore(min_expiry_date(today)),
            ],
        ),
    ];

    match mode {
        DeliveryMode::Email => list.push(FieldConstraint::new(
            Field::CustomMessage,
            [Rule::MaxLength(CUSTOM_MESSAGE_MAX_CHARS)],
        )),
        DeliveryMode::Manual => list.push(FieldConstraint::new(
            Field::NumberOfVirtualCards,
            [
                Rule::Required,
                Rule::Min(1.0),
                Rule::Max(MAX_NUMBER_OF_CARDS as f64),
            ],
        )),
    }

    list
}

enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
    Choice(Option<u64>),
    Ids,
}

fn value_of(values: &FormValues, field: Field, payment_method_id: Option<u64>) -> FieldValue<'_> {
    match field {
        Field::Amount => FieldValue::Number(values.amount),
        Field::NumberOfVirtualCards => FieldValue::Number(values.number_of_virtual_cards as f64),
        Field::ExpiryDate => FieldValue::Text(&values.expiry_date),
        Field::CustomMessage => FieldValue::Text(&values.custom_message),
        Field::PaymentMethodId => FieldValue::Choice(payment_method_id),
        Field::Emails | Field::LimitedToHostCollectiveIds | Field::LimitedToCollectiveIds => {
            FieldValue::Ids
        }
    }
}

fn passes(rule: Rule, value: &FieldValue<'_>) -> bool {
    match (rule, value) {
        (Rule::Required, FieldValue::Number(n)) => n.is_finite(),
        (Rule::Required, FieldValue::Text(s)) => s.trim().validate_length(Some(1), None, None),
        (Rule::Required, FieldValue::Choice(choice)) => choice.validate_required(),
        (Rule::Min(min), FieldValue::Number(n)) => n.validate_range(Some(min), None, None, None),
        (Rule::Max(max), FieldValue::Number(n)) => n.validate_range(None, Some(max), None, None),
        (Rule::MaxLength(max), FieldValue::Text(s)) => {
            s.validate_length(None, Some(max as u64), None)
        }
        (Rule::DatePattern, FieldValue::Text(s)) => {
            s.trim().is_empty() || NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).is_ok()
        }
        (Rule::NotBefore(day), FieldValue::Text(s)) => {
            match NaiveDate::parse_from_str(s.trim(), DATE_FORMAT) {
                Ok(date) => date >= day,
                Err(_) => true,
            }
        }
        _ => true,
    }
}

/// Check `values` against `constraints`.
///
/// `payment_method_id` is the effective selection, i.e. the user's choice or
/// the catalog default.
pub fn check(
    constraints: &[FieldConstraint],
    values: &FormValues,
    payment_method_id: Option<u64>,
) -> Vec<ConstraintViolation> {
    constraints
        .iter()
        .filter_map(|constraint| {
            let value = value_of(values, constraint.field, payment_method_id);
            constraint
                .rules
                .iter()
                .find(|rule| !passes(**rule, &value))
                .map(|rule| ConstraintViolation {
                    field: constraint.field,
                    rule: *rule,
                })
        })
        .collect()
}
