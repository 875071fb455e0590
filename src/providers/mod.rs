// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Remote collaborators of the issuance form.
//!
//! The form only depends on these two traits; [`graphql::GraphQlClient`]
//! implements both against the card API.

use std::future::Future;

use crate::error::IssuerError;
use crate::models::{Catalog, CreateVirtualCardsRequest, CreatedCard};

pub mod graphql;

/// The "create cards" operation.
pub trait CardIssuer: Send + Sync {
    fn create_cards(
        &self,
        request: CreateVirtualCardsRequest,
    ) -> impl Future<Output = Result<Vec<CreatedCard>, IssuerError>> + Send;
}

/// Read-only source of payment methods and eligible hosts.
pub trait CatalogSource: Send + Sync {
    fn fetch_catalog(&self) -> impl Future<Output = Result<Catalog, IssuerError>> + Send;
}
