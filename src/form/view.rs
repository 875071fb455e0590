// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Render selection: which of the five views to show, and the derived
//! properties of each. Owns no state.

use crate::catalog::CatalogState;
use crate::models::{CreatedCard, DeliveryMode, HostCollective, PaymentMethod};

use super::state::FormState;
use super::values::Field;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    /// Cards the button announces ("Create {count} gift cards").
    pub count: i64,
    pub disabled: bool,
    pub loading: bool,
}

impl SubmitButton {
    pub fn label(&self) -> String {
        format!("Create {} gift cards", self.count)
    }
}

/// A selectable entry in a scope picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOption {
    pub id: u64,
    pub label: String,
}

impl From<&HostCollective> for PickerOption {
    fn from(host: &HostCollective) -> Self {
        Self {
            id: host.id,
            label: host.name.clone(),
        }
    }
}

/// Map a picker selection to the id list stored in the form.
pub fn options_to_ids(options: Option<&[PickerOption]>) -> Vec<u64> {
    options
        .map(|opts| opts.iter().map(|o| o.id).collect())
        .unwrap_or_default()
}

/// Placeholder of the collective picker for the number of selected hosts.
pub fn collectives_placeholder(selected_hosts: usize) -> &'static str {
    match selected_hosts {
        0 => "All collectives",
        1 => "All collectives under the selected host",
        _ => "All collectives under the selected hosts",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormView<'a> {
    pub delivery_mode: DeliveryMode,
    /// Currency shown next to the amount input.
    pub currency: &'a str,
    pub inputs_disabled: bool,
    pub submit: SubmitButton,
    pub server_error: Option<&'a str>,
    pub email_errors: &'a [String],
    pub payment_methods: &'a [PaymentMethod],
    pub default_payment_method: Option<&'a PaymentMethod>,
    pub host_options: Vec<PickerOption>,
    pub host_picker_disabled: bool,
    pub preload_collectives: bool,
    pub collectives_placeholder: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuccessView<'a> {
    pub cards: &'a [CreatedCard],
    pub delivery_mode: DeliveryMode,
    pub collective_slug: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum View<'a> {
    Loading,
    Error(&'a str),
    /// Prompt linking to the account's payment method settings.
    MissingPaymentMethod { settings_path: String },
    Form(FormView<'a>),
    Success(SuccessView<'a>),
}

pub fn payment_methods_settings_path(collective_slug: &str) -> String {
    format!("/{collective_slug}/edit/payment-methods")
}

/// Pick the view for the current catalog and form state.
///
/// Checked in order: loading, load error, no payment method, succeeded,
/// otherwise the form.
pub fn select_view<'a>(
    catalog: &'a CatalogState,
    form: &'a FormState,
    collective_slug: &'a str,
    currency: &'a str,
) -> View<'a> {
    let catalog = match catalog {
        CatalogState::Loading => return View::Loading,
        CatalogState::Failed(message) => return View::Error(message),
        CatalogState::Ready(catalog) => catalog,
    };

    if catalog.payment_methods.is_empty() {
        return View::MissingPaymentMethod {
            settings_path: payment_methods_settings_path(collective_slug),
        };
    }

    if let Some(cards) = form.created_cards() {
        return View::Success(SuccessView {
            cards,
            delivery_mode: form.delivery_mode,
            collective_slug,
        });
    }

    let submitting = form.is_submitting();
    let selected_hosts = form.values.limited_to_host_collective_ids.len();
    View::Form(FormView {
        delivery_mode: form.delivery_mode,
        currency,
        inputs_disabled: submitting,
        submit: SubmitButton {
            count: form.pending_card_count(),
            disabled: !submitting && !form.can_submit(),
            loading: submitting,
        },
        server_error: form.server_error(),
        email_errors: form.errors.get(Field::Emails),
        payment_methods: &catalog.payment_methods,
        default_payment_method: catalog.default_payment_method(),
        host_options: catalog.hosts.iter().map(PickerOption::from).collect(),
        host_picker_disabled: catalog.hosts.is_empty(),
        preload_collectives: selected_hosts > 0,
        collectives_placeholder: collectives_placeholder(selected_hosts),
    })
}
