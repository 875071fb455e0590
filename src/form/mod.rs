// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Card Issuance Form
//!
//! The form is an immutable [`FormState`] plus a pure [`reduce`] function.
//!
//! - `values` - field values, defaults and lenient numeric parsing
//! - `emails` - multi-recipient splitting and deduplication
//! - `constraints` - declarative per-field rules checked at submit time
//! - `state` - the state snapshot and the submission gate
//! - `reducer` - events, effects and transitions
//! - `view` - render selection

pub mod constraints;
pub mod emails;
pub mod reducer;
pub mod state;
pub mod values;
pub mod view;

pub use constraints::{ConstraintViolation, Rule};
pub use emails::{split_recipients, RecipientList};
pub use reducer::{reduce, Effect, Event, FieldUpdate, SubmitContext, Transition};
pub use state::{FormState, SubmissionState, ValidationErrors};
pub use values::{Field, FormValues, MAX_AMOUNT, MIN_AMOUNT};
pub use view::{select_view, View};
