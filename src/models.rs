// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Records exchanged with the card API. Field names follow the GraphQL
//! schema (camelCase on the wire).
//!
//! ## Model Categories
//!
//! - **Catalog**: source payment methods and eligible hosts, fetched once
//! - **Issuance**: the creation payload and the cards it returns

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Catalog Models
// =============================================================================

/// A payment method that can fund new gift cards.
///
/// Only credit cards and prepaid methods with a positive balance qualify.
/// Another gift card can never be a source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: u64,
    #[serde(default)]
    pub uuid: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Remaining balance in minor units.
    #[serde(default)]
    pub balance: Option<i64>,
    pub currency: String,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

/// A fiscal host that card redemption can be restricted to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostCollective {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Everything the form needs from the data source before it can render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub payment_methods: Vec<PaymentMethod>,
    pub hosts: Vec<HostCollective>,
}

impl Catalog {
    /// The method used when the user never touched the payment method picker.
    pub fn default_payment_method(&self) -> Option<&PaymentMethod> {
        self.payment_methods.first()
    }
}

// =============================================================================
// Issuance Models
// =============================================================================

/// How generated cards reach their holders.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Cards are emailed to a list of recipients.
    #[default]
    Email,
    /// Anonymous redemption codes are handed out by the issuer.
    Manual,
}

/// Mode-specific part of the creation payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CardDelivery {
    #[serde(rename_all = "camelCase")]
    Email {
        emails: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        custom_message: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Manual { number_of_virtual_cards: i64 },
}

/// Variables sent to the `createVirtualCards` mutation.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateVirtualCardsRequest {
    /// Value of each card in minor units.
    pub amount: i64,
    #[serde(rename = "PaymentMethodId")]
    pub payment_method_id: u64,
    pub limited_to_host_collective_ids: Vec<u64>,
    pub limited_to_collective_ids: Vec<u64>,
    pub expiry_date: String,
    #[serde(flatten)]
    pub delivery: CardDelivery,
}

impl CreateVirtualCardsRequest {
    /// Number of cards this request will create.
    pub fn card_count(&self) -> i64 {
        match &self.delivery {
            CardDelivery::Email { emails, .. } => emails.len() as i64,
            CardDelivery::Manual {
                number_of_virtual_cards,
            } => *number_of_virtual_cards,
        }
    }
}

/// A card returned by the creation operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCard {
    pub id: u64,
    pub uuid: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub initial_balance: Option<i64>,
    #[serde(default)]
    pub monthly_limit_per_member: Option<i64>,
    pub currency: String,
    #[serde(default)]
    pub expiry_date: Option<String>,
}
