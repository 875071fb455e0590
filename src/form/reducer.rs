// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pure state transitions for the issuance form.
//!
//! `reduce` consumes the current [`FormState`] and one [`Event`] and returns
//! the next state together with the [`Effect`]s the host must carry out.
//! It performs no I/O: the creation call, scrolling and constraint reporting
//! are all described as effects.
//!
//! Transition rules:
//!   * Field edits and mode switches are ignored while a submission is in
//!     flight (the values are frozen).
//!   * `Submit` is a no-op while submitting, after success, when the gate is
//!     closed, or when a constraint fails (the violations are handed back as
//!     a report effect and the submission state is untouched).
//!   * Completion events are ignored unless a submission is in flight.

use chrono::NaiveDate;

use super::constraints::{check, constraints_for, ConstraintViolation};
use super::emails::RecipientList;
use super::state::{FormState, SubmissionState};
use super::values::{parse_amount, parse_number_of_cards, Field, FormValues};
use crate::models::{CardDelivery, CreateVirtualCardsRequest, CreatedCard, DeliveryMode};

/// A single raw input change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Raw text of the amount input.
    Amount(String),
    /// Raw text of the card count input.
    NumberOfVirtualCards(String),
    Emails(RecipientList),
    CustomMessage(String),
    ExpiryDate(String),
    PaymentMethodId(u64),
    LimitedToHostCollectiveIds(Vec<u64>),
    LimitedToCollectiveIds(Vec<u64>),
}

/// Facts from outside the form needed at submit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitContext {
    pub today: NaiveDate,
    /// First available payment method, used when none was picked.
    pub default_payment_method_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    FieldChanged(FieldUpdate),
    /// The recipient editor closed; keep its raw text for next time.
    RecipientsDraftSaved(Option<String>),
    DeliveryModeChanged(DeliveryMode),
    Submit(SubmitContext),
    CreationSucceeded(Vec<CreatedCard>),
    CreationFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call the creation operation with this payload.
    CreateCards(CreateVirtualCardsRequest),
    ScrollToTop,
    /// Submission was blocked by these violations.
    ReportViolations(Vec<ConstraintViolation>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: FormState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: FormState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with_effect(state: FormState, effect: Effect) -> Self {
        Self {
            state,
            effects: vec![effect],
        }
    }
}

pub fn reduce(state: FormState, event: Event) -> Transition {
    match event {
        Event::FieldChanged(update) => {
            if state.is_submitting() {
                return Transition::unchanged(state);
            }
            Transition::unchanged(apply_field_update(state, update))
        }
        Event::RecipientsDraftSaved(draft) => Transition::unchanged(FormState {
            recipients_draft: draft,
            ..state
        }),
        Event::DeliveryModeChanged(mode) => {
            if state.is_submitting() {
                return Transition::unchanged(state);
            }
            Transition::unchanged(change_delivery_mode(state, mode))
        }
        Event::Submit(ctx) => submit(state, ctx),
        Event::CreationSucceeded(cards) => {
            if !state.is_submitting() {
                return Transition::unchanged(state);
            }
            Transition::with_effect(
                FormState {
                    submission: SubmissionState::Succeeded(cards),
                    ..state
                },
                Effect::ScrollToTop,
            )
        }
        Event::CreationFailed(message) => {
            if !state.is_submitting() {
                return Transition::unchanged(state);
            }
            Transition::unchanged(FormState {
                submission: SubmissionState::Failed(message),
                ..state
            })
        }
    }
}

fn apply_field_update(mut state: FormState, update: FieldUpdate) -> FormState {
    let values = &mut state.values;
    match update {
        FieldUpdate::Amount(raw) => values.amount = parse_amount(&raw),
        FieldUpdate::NumberOfVirtualCards(raw) => {
            values.number_of_virtual_cards = parse_number_of_cards(&raw)
        }
        FieldUpdate::Emails(RecipientList { emails, invalids }) => {
            values.emails = emails;
            state.errors.set(Field::Emails, invalids);
        }
        FieldUpdate::CustomMessage(message) => values.custom_message = message,
        FieldUpdate::ExpiryDate(date) => values.expiry_date = date,
        FieldUpdate::PaymentMethodId(id) => values.payment_method_id = Some(id),
        FieldUpdate::LimitedToHostCollectiveIds(ids) => {
            values.limited_to_host_collective_ids = ids
        }
        FieldUpdate::LimitedToCollectiveIds(ids) => values.limited_to_collective_ids = ids,
    }
    state
}

/// Email -> Manual pre-fills the count with the recipient count; the other
/// direction carries nothing over.
fn change_delivery_mode(mut state: FormState, mode: DeliveryMode) -> FormState {
    if state.delivery_mode == DeliveryMode::Email
        && mode == DeliveryMode::Manual
        && !state.values.emails.is_empty()
    {
        state.values.number_of_virtual_cards = state.values.emails.len() as i64;
    }
    state.delivery_mode = mode;
    state
}

fn submit(state: FormState, ctx: SubmitContext) -> Transition {
    let blocked = matches!(
        state.submission,
        SubmissionState::Submitting { .. } | SubmissionState::Succeeded(_)
    );
    if blocked || !state.can_submit() {
        return Transition::unchanged(state);
    }

    let payment_method_id = state
        .values
        .payment_method_id
        .or(ctx.default_payment_method_id);
    let violations = check(
        &constraints_for(state.delivery_mode, ctx.today),
        &state.values,
        payment_method_id,
    );
    if !violations.is_empty() {
        return Transition::with_effect(state, Effect::ReportViolations(violations));
    }
    let Some(payment_method_id) = payment_method_id else {
        return Transition::unchanged(state);
    };

    let request = build_request(&state.values, state.delivery_mode, payment_method_id);
    let last_error = state.server_error().map(str::to_string);
    Transition::with_effect(
        FormState {
            submission: SubmissionState::Submitting { last_error },
            ..state
        },
        Effect::CreateCards(request),
    )
}

/// Convert a major-unit amount to minor units, rounding half away from zero.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn build_request(
    values: &FormValues,
    mode: DeliveryMode,
    payment_method_id: u64,
) -> CreateVirtualCardsRequest {
    let delivery = match mode {
        DeliveryMode::Email => CardDelivery::Email {
            emails: values.emails.clone(),
            custom_message: Some(values.custom_message.clone()).filter(|m| !m.is_empty()),
        },
        DeliveryMode::Manual => CardDelivery::Manual {
            number_of_virtual_cards: values.number_of_virtual_cards,
        },
    };

    CreateVirtualCardsRequest {
        amount: to_minor_units(values.amount),
        payment_method_id,
        limited_to_host_collective_ids: values.limited_to_host_collective_ids.clone(),
        limited_to_collective_ids: values.limited_to_collective_ids.clone(),
        expiry_date: values.expiry_date.clone(),
        delivery,
    }
}
