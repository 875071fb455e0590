// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! One-shot catalog load: payment methods and eligible hosts.

use tracing::{info, warn};

use crate::models::Catalog;
use crate::providers::CatalogSource;

/// Lifecycle of the catalog fetch as seen by the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CatalogState {
    #[default]
    Loading,
    Failed(String),
    Ready(Catalog),
}

impl CatalogState {
    pub fn catalog(&self) -> Option<&Catalog> {
        match self {
            CatalogState::Ready(catalog) => Some(catalog),
            _ => None,
        }
    }

    pub fn default_payment_method_id(&self) -> Option<u64> {
        self.catalog()
            .and_then(Catalog::default_payment_method)
            .map(|pm| pm.id)
    }
}

/// Fetch the catalog once and fold the outcome into a [`CatalogState`].
pub async fn load_catalog<S: CatalogSource>(source: &S) -> CatalogState {
    match source.fetch_catalog().await {
        Ok(catalog) => {
            info!(
                payment_methods = catalog.payment_methods.len(),
                hosts = catalog.hosts.len(),
                "Card catalog loaded"
            );
            CatalogState::Ready(catalog)
        }
        Err(e) => {
            warn!(error = %e, "Card catalog failed to load");
            CatalogState::Failed(e.to_string())
        }
    }
}
