// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Issuance Session
//!
//! Runs the form reducer against a real [`CardIssuer`]. The form and catalog
//! state live behind `tokio` locks so a renderer can read snapshots while a
//! creation request is in flight.
//!
//! Only one creation request is outstanding at a time: the reducer moves the
//! form to `Submitting` under the write lock, and the lock is released before
//! the issuer is awaited, so a concurrent submit observes `Submitting` and is
//! dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::catalog::{self, CatalogState};
use crate::config::{IssuerConfig, DEFAULT_CURRENCY};
use crate::form::{reduce, select_view, Effect, Event, FormState, SubmitContext, View};
use crate::models::CreateVirtualCardsRequest;
use crate::providers::{CardIssuer, CatalogSource};

pub struct IssuanceSession<I> {
    issuer: I,
    collective_slug: String,
    currency: String,
    form: Arc<RwLock<FormState>>,
    catalog: Arc<RwLock<CatalogState>>,
}

impl<I: CardIssuer> IssuanceSession<I> {
    /// A fresh form mounted on `today`, waiting for its catalog.
    pub fn new(issuer: I, collective_slug: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            issuer,
            collective_slug: collective_slug.into(),
            currency: DEFAULT_CURRENCY.to_string(),
            form: Arc::new(RwLock::new(FormState::new(today))),
            catalog: Arc::new(RwLock::new(CatalogState::Loading)),
        }
    }

    pub fn from_config(issuer: I, config: &IssuerConfig, today: NaiveDate) -> Self {
        let mut session = Self::new(issuer, config.collective_slug.clone(), today);
        session.currency = config.currency.clone();
        session
    }

    pub fn issuer(&self) -> &I {
        &self.issuer
    }

    pub async fn load_catalog<S: CatalogSource>(&self, source: &S) {
        let loaded = catalog::load_catalog(source).await;
        *self.catalog.write().await = loaded;
    }

    pub async fn set_catalog(&self, state: CatalogState) {
        *self.catalog.write().await = state;
    }

    pub async fn snapshot(&self) -> FormState {
        self.form.read().await.clone()
    }

    /// Render the current view through `render` while holding read locks.
    pub async fn render<R>(&self, render: impl FnOnce(View<'_>) -> R) -> R {
        let catalog = self.catalog.read().await;
        let form = self.form.read().await;
        render(select_view(
            &catalog,
            &form,
            &self.collective_slug,
            &self.currency,
        ))
    }

    /// Submit the form, defaulting the payment method to the catalog's first.
    pub async fn submit(&self, today: NaiveDate) -> Vec<Effect> {
        let default_payment_method_id = self.catalog.read().await.default_payment_method_id();
        self.dispatch(Event::Submit(SubmitContext {
            today,
            default_payment_method_id,
        }))
        .await
    }

    /// Apply `event` and run any creation request it triggers to completion.
    ///
    /// Returns the effects the host has to carry out itself (scrolling,
    /// constraint reports).
    pub async fn dispatch(&self, event: Event) -> Vec<Effect> {
        let mut pending = VecDeque::from([event]);
        let mut host_effects = Vec::new();

        while let Some(event) = pending.pop_front() {
            for effect in self.apply(event).await {
                match effect {
                    Effect::CreateCards(request) => pending.push_back(self.create(request).await),
                    other => host_effects.push(other),
                }
            }
        }

        host_effects
    }

    async fn apply(&self, event: Event) -> Vec<Effect> {
        let mut form = self.form.write().await;
        let transition = reduce(form.clone(), event);
        *form = transition.state;
        transition.effects
    }

    async fn create(&self, request: CreateVirtualCardsRequest) -> Event {
        let count = request.card_count();
        info!(
            collective = %self.collective_slug,
            count,
            amount = request.amount,
            payment_method_id = request.payment_method_id,
            "Creating gift cards"
        );

        match self.issuer.create_cards(request).await {
            Ok(cards) => {
                info!(
                    collective = %self.collective_slug,
                    created = cards.len(),
                    "Gift cards created"
                );
                Event::CreationSucceeded(cards)
            }
            Err(e) => {
                warn!(
                    collective = %self.collective_slug,
                    count,
                    error = %e,
                    "Gift card creation failed"
                );
                Event::CreationFailed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use tokio::sync::Notify;
    use uuid::Uuid;

    use crate::error::IssuerError;
    use crate::form::{split_recipients, Field, FieldUpdate, SubmissionState};
    use crate::models::{Catalog, CreatedCard, DeliveryMode, PaymentMethod};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
    }

    fn card(request: &CreateVirtualCardsRequest) -> CreatedCard {
        CreatedCard {
            id: 1,
            uuid: Uuid::new_v4(),
            name: None,
            initial_balance: Some(request.amount),
            monthly_limit_per_member: None,
            currency: "USD".to_string(),
            expiry_date: Some(request.expiry_date.clone()),
        }
    }

    fn catalog() -> CatalogState {
        CatalogState::Ready(Catalog {
            payment_methods: vec![PaymentMethod {
                id: 31,
                uuid: None,
                name: Some("Visa 4242".to_string()),
                service: Some("stripe".to_string()),
                kind: Some("creditcard".to_string()),
                balance: None,
                currency: "USD".to_string(),
                expiry_date: None,
            }],
            hosts: Vec::new(),
        })
    }

    fn ready_without_payment_methods() -> CatalogState {
        CatalogState::Ready(Catalog::default())
    }

    /// Records every request and answers with a fixed outcome.
    #[derive(Default)]
    struct RecordingIssuer {
        requests: Mutex<Vec<CreateVirtualCardsRequest>>,
        failure: Option<String>,
    }

    impl CardIssuer for RecordingIssuer {
        async fn create_cards(
            &self,
            request: CreateVirtualCardsRequest,
        ) -> Result<Vec<CreatedCard>, IssuerError> {
            self.requests.lock().expect("lock").push(request.clone());
            match &self.failure {
                Some(message) => Err(IssuerError::graphql(message.clone())),
                None => Ok((0..request.card_count()).map(|_| card(&request)).collect()),
            }
        }
    }

    /// Blocks inside the creation call until released.
    #[derive(Default)]
    struct GatedIssuer {
        calls: AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    impl CardIssuer for GatedIssuer {
        async fn create_cards(
            &self,
            request: CreateVirtualCardsRequest,
        ) -> Result<Vec<CreatedCard>, IssuerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(vec![card(&request)])
        }
    }

    struct FixedCatalog;

    impl CatalogSource for FixedCatalog {
        async fn fetch_catalog(&self) -> Result<Catalog, IssuerError> {
            Ok(catalog().catalog().cloned().unwrap_or_default())
        }
    }

    async fn with_recipients<I: CardIssuer>(session: &IssuanceSession<I>, raw: &str) {
        session
            .dispatch(Event::FieldChanged(FieldUpdate::Emails(split_recipients(raw))))
            .await;
    }

    #[tokio::test]
    async fn successful_submission_shows_success_view() {
        let session = IssuanceSession::new(RecordingIssuer::default(), "acme", today());
        session.load_catalog(&FixedCatalog).await;
        with_recipients(&session, "a@example.com b@example.com").await;
        session
            .dispatch(Event::FieldChanged(FieldUpdate::Amount("19.999".to_string())))
            .await;

        let effects = session.submit(today()).await;
        assert_eq!(effects, vec![Effect::ScrollToTop]);

        let requests = session.issuer().requests.lock().expect("lock").clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount, 2000);
        assert_eq!(requests[0].payment_method_id, 31);

        let created = session
            .render(|view| match view {
                View::Success(success) => success.cards.len(),
                other => panic!("expected success view, got {other:?}"),
            })
            .await;
        assert_eq!(created, 2);
    }

    #[tokio::test]
    async fn failed_submission_keeps_form_with_message() {
        let issuer = RecordingIssuer {
            failure: Some("Not enough balance".to_string()),
            ..Default::default()
        };
        let session = IssuanceSession::new(issuer, "acme", today());
        session.set_catalog(catalog()).await;
        with_recipients(&session, "a@example.com").await;

        let effects = session.submit(today()).await;
        assert!(effects.is_empty());

        let state = session.snapshot().await;
        assert_eq!(
            state.submission,
            SubmissionState::Failed("Not enough balance".to_string())
        );
        assert_eq!(state.values.emails, vec!["a@example.com"]);

        let (error, loading) = session
            .render(|view| match view {
                View::Form(form) => (form.server_error.map(str::to_string), form.submit.loading),
                other => panic!("expected form view, got {other:?}"),
            })
            .await;
        assert_eq!(error.as_deref(), Some("Not enough balance"));
        assert!(!loading);
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_issuer() {
        let session = IssuanceSession::new(RecordingIssuer::default(), "acme", today());
        session.set_catalog(catalog()).await;
        with_recipients(&session, "a@example.com").await;
        session
            .dispatch(Event::FieldChanged(FieldUpdate::ExpiryDate(
                "2026-10-19".to_string(),
            )))
            .await;

        let effects = session.submit(today()).await;
        assert!(matches!(
            effects.as_slice(),
            [Effect::ReportViolations(v)] if v[0].field == Field::ExpiryDate
        ));
        assert!(session.issuer().requests.lock().expect("lock").is_empty());
        assert_eq!(session.snapshot().await.submission, SubmissionState::Idle);
    }

    #[tokio::test]
    async fn manual_mode_submits_count() {
        let session = IssuanceSession::new(RecordingIssuer::default(), "acme", today());
        session.set_catalog(catalog()).await;
        with_recipients(&session, "a@example.com b@example.com c@example.com").await;
        session
            .dispatch(Event::DeliveryModeChanged(DeliveryMode::Manual))
            .await;

        session.submit(today()).await;
        let requests = session.issuer().requests.lock().expect("lock").clone();
        assert_eq!(requests[0].card_count(), 3);
    }

    #[tokio::test]
    async fn concurrent_submit_is_dropped_while_in_flight() {
        let session = Arc::new(IssuanceSession::new(
            GatedIssuer::default(),
            "acme",
            today(),
        ));
        session.set_catalog(catalog()).await;
        with_recipients(&session, "a@example.com").await;

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit(today()).await }
        });

        session.issuer().entered.notified().await;
        assert!(session.snapshot().await.is_submitting());
        let loading = session
            .render(|view| matches!(view, View::Form(form) if form.submit.loading))
            .await;
        assert!(loading);

        let second = session.submit(today()).await;
        assert!(second.is_empty());

        session.issuer().release.notify_one();
        let effects = first.await.expect("submit task joins");
        assert_eq!(effects, vec![Effect::ScrollToTop]);
        assert_eq!(session.issuer().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn session_from_config_uses_collective_currency() {
        let config = IssuerConfig::from_lookup(|name| match name {
            "CARDS_COLLECTIVE_ID" => Some("42".to_string()),
            "CARDS_COLLECTIVE_SLUG" => Some("webpack".to_string()),
            "CARDS_CURRENCY" => Some("eur".to_string()),
            _ => None,
        })
        .expect("config loads");
        let session = IssuanceSession::from_config(RecordingIssuer::default(), &config, today());
        session.set_catalog(catalog()).await;

        let currency = session
            .render(|view| match view {
                View::Form(form) => form.currency.to_string(),
                other => panic!("expected form view, got {other:?}"),
            })
            .await;
        assert_eq!(currency, "EUR");

        session.set_catalog(ready_without_payment_methods()).await;
        let settings_path = session
            .render(|view| match view {
                View::MissingPaymentMethod { settings_path } => settings_path,
                other => panic!("expected payment method prompt, got {other:?}"),
            })
            .await;
        assert_eq!(settings_path, "/webpack/edit/payment-methods");
    }

    #[tokio::test]
    async fn view_is_loading_until_catalog_arrives() {
        let session = IssuanceSession::new(RecordingIssuer::default(), "acme", today());
        assert!(session.render(|view| view == View::Loading).await);

        session.set_catalog(CatalogState::Failed("boom".to_string())).await;
        assert!(session.render(|view| view == View::Error("boom")).await);
    }
}
