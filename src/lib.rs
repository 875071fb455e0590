// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Virtual Cards Form - gift card issuance for a collective
//!
//! The form state machine is pure: every user action is an [`form::Event`]
//! folded into a [`form::FormState`] by [`form::reduce`], which returns the
//! effects to run. [`session::IssuanceSession`] drives it against a
//! [`providers::CardIssuer`].
//!
//! ## Modules
//!
//! - `form` - state, validation, reducer and view selection
//! - `catalog` - payment methods and hosts loaded before the form renders
//! - `providers` - collaborator traits and the GraphQL client
//! - `session` - async controller around the reducer
//! - `config` - environment configuration
//! - `logging` - tracing subscriber setup

pub mod catalog;
pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod models;
pub mod providers;
pub mod session;
