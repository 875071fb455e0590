// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Form state snapshot. Only [`super::reducer::reduce`] produces new ones.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::values::{Field, FormValues};
use crate::models::{CreatedCard, DeliveryMode};

/// Per-field lists of rejected entries, keyed by field name.
///
/// Each list mirrors the order its input produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(BTreeMap<Field, Vec<String>>);

impl ValidationErrors {
    pub fn get(&self, field: Field) -> &[String] {
        self.0.get(&field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_errors(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }

    pub(crate) fn set(&mut self, field: Field, entries: Vec<String>) {
        self.0.insert(field, entries);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "camelCase")]
pub enum SubmissionState {
    #[default]
    Idle,
    /// A creation request is in flight. The message of a previous failure
    /// stays visible until this attempt resolves.
    Submitting { last_error: Option<String> },
    Succeeded(Vec<CreatedCard>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub values: FormValues,
    pub delivery_mode: DeliveryMode,
    pub errors: ValidationErrors,
    /// Raw text of the recipient editor, restored when it reopens.
    pub recipients_draft: Option<String>,
    pub submission: SubmissionState,
}

impl FormState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            values: FormValues::initial(today),
            delivery_mode: DeliveryMode::Email,
            errors: ValidationErrors::default(),
            recipients_draft: None,
            submission: SubmissionState::Idle,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.submission, SubmissionState::Submitting { .. })
    }

    /// Cards returned by a successful submission.
    pub fn created_cards(&self) -> Option<&[CreatedCard]> {
        match &self.submission {
            SubmissionState::Succeeded(cards) => Some(cards),
            _ => None,
        }
    }

    /// Message of the last failed submission, if not yet overwritten.
    pub fn server_error(&self) -> Option<&str> {
        match &self.submission {
            SubmissionState::Failed(message) => Some(message),
            SubmissionState::Submitting { last_error } => last_error.as_deref(),
            _ => None,
        }
    }

    /// Whether the gate lets a submission through.
    ///
    /// Amount, expiry and payment method are left to the constraint check
    /// run at submit time.
    pub fn can_submit(&self) -> bool {
        match self.delivery_mode {
            DeliveryMode::Email => {
                !self.values.emails.is_empty() && !self.errors.has_errors(Field::Emails)
            }
            DeliveryMode::Manual => self.values.number_of_virtual_cards != 0,
        }
    }

    /// Number of cards the submit button announces.
    pub fn pending_card_count(&self) -> i64 {
        match self.delivery_mode {
            DeliveryMode::Email => self.values.emails.len() as i64,
            DeliveryMode::Manual => self.values.number_of_virtual_cards,
        }
    }
}
