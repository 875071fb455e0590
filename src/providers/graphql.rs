// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GraphQL-over-HTTP client for the card API.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use super::{CardIssuer, CatalogSource};
use crate::config::IssuerConfig;
use crate::error::IssuerError;
use crate::models::{
    Catalog, CreateVirtualCardsRequest, CreatedCard, HostCollective, PaymentMethod,
};

const API_KEY_HEADER: &str = "Api-Key";

/// Source payment methods of a collective. Gift cards are excluded by type:
/// a gift card can never fund another one.
const CATALOG_QUERY: &str = r#"
query Collective($id: Int) {
  Collective(id: $id) {
    id
    paymentMethods(types: ["creditcard", "prepaid"], hasBalanceAboveZero: true) {
      id
      uuid
      name
      service
      type
      balance
      currency
      expiryDate
    }
  }
  allHosts(limit: 100, onlyOpenHosts: false, minNbCollectivesHosted: 1) {
    collectives {
      id
      type
      name
      slug
      imageUrl
    }
  }
}
"#;

const CREATE_VIRTUAL_CARDS_MUTATION: &str = r#"
mutation createVirtualCards(
  $CollectiveId: Int!
  $amount: Int
  $PaymentMethodId: Int
  $emails: [String]
  $customMessage: String
  $numberOfVirtualCards: Int
  $limitedToHostCollectiveIds: [Int]
  $limitedToCollectiveIds: [Int]
  $expiryDate: String
) {
  createVirtualCards(
    CollectiveId: $CollectiveId
    amount: $amount
    PaymentMethodId: $PaymentMethodId
    emails: $emails
    customMessage: $customMessage
    numberOfVirtualCards: $numberOfVirtualCards
    limitedToHostCollectiveIds: $limitedToHostCollectiveIds
    limitedToCollectiveIds: $limitedToCollectiveIds
    expiryDate: $expiryDate
  ) {
    id
    uuid
    name
    initialBalance
    monthlyLimitPerMember
    currency
    expiryDate
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogData {
    #[serde(rename = "Collective")]
    collective: Option<CollectiveNode>,
    all_hosts: Option<HostsNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectiveNode {
    #[serde(default)]
    payment_methods: Vec<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
struct HostsNode {
    #[serde(default)]
    collectives: Vec<HostCollective>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCardsData {
    create_virtual_cards: Option<Vec<CreatedCard>>,
}

#[derive(Debug, Clone)]
pub struct GraphQlClient {
    endpoint: Url,
    api_key: Option<String>,
    collective_id: u64,
    http: Client,
}

impl GraphQlClient {
    pub fn new(config: &IssuerConfig) -> Result<Self, IssuerError> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| IssuerError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: config.api_url.clone(),
            api_key: config.api_key.clone(),
            collective_id: config.collective_id,
            http,
        })
    }

    pub fn from_env() -> Result<Self, IssuerError> {
        Self::new(&IssuerConfig::from_env()?)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, IssuerError> {
        let body = json!({
            "operationName": operation,
            "query": query,
            "variables": variables,
        });

        debug!(operation, endpoint = %self.endpoint, "Sending GraphQL request");

        let mut request = self.http.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IssuerError::Request(format!("{operation} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| IssuerError::Request(format!("{operation} body read failed: {e}")))?;

        // GraphQL servers may report resolver errors with a 4xx/5xx status;
        // prefer their message over the raw body when one is present.
        match serde_json::from_str::<Value>(&text) {
            Ok(payload) if status.is_success() || payload.get("errors").is_some() => {
                into_data(payload)
            }
            Err(e) if status.is_success() => Err(IssuerError::invalid_response(format!(
                "{operation} returned invalid JSON: {e}"
            ))),
            _ => Err(IssuerError::http(status.as_u16(), &text)),
        }
    }
}

/// Unwrap a GraphQL response envelope.
fn into_data<T: DeserializeOwned>(payload: Value) -> Result<T, IssuerError> {
    let response: GraphQlResponse<T> = serde_json::from_value(payload)
        .map_err(|e| IssuerError::invalid_response(format!("unexpected shape: {e}")))?;

    if !response.errors.is_empty() {
        let message = response
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(IssuerError::graphql(message));
    }

    response
        .data
        .ok_or_else(|| IssuerError::invalid_response("response has neither data nor errors"))
}

fn created_cards(data: CreateCardsData) -> Result<Vec<CreatedCard>, IssuerError> {
    data.create_virtual_cards
        .ok_or_else(|| IssuerError::invalid_response("createVirtualCards returned no cards"))
}

fn create_variables(
    collective_id: u64,
    request: &CreateVirtualCardsRequest,
) -> Result<Value, IssuerError> {
    let mut variables = serde_json::to_value(request)
        .map_err(|e| IssuerError::invalid_response(format!("serialize variables failed: {e}")))?;
    if let Value::Object(map) = &mut variables {
        map.insert("CollectiveId".to_string(), json!(collective_id));
    }
    Ok(variables)
}

impl CatalogSource for GraphQlClient {
    async fn fetch_catalog(&self) -> Result<Catalog, IssuerError> {
        let data: CatalogData = self
            .execute(
                "Collective",
                CATALOG_QUERY,
                json!({ "id": self.collective_id }),
            )
            .await?;

        let collective = data.collective.ok_or_else(|| {
            IssuerError::graphql(format!("Collective {} not found", self.collective_id))
        })?;

        Ok(Catalog {
            payment_methods: collective.payment_methods,
            hosts: data.all_hosts.map(|h| h.collectives).unwrap_or_default(),
        })
    }
}

impl CardIssuer for GraphQlClient {
    async fn create_cards(
        &self,
        request: CreateVirtualCardsRequest,
    ) -> Result<Vec<CreatedCard>, IssuerError> {
        let variables = create_variables(self.collective_id, &request)?;
        let data: CreateCardsData = self
            .execute(
                "createVirtualCards",
                CREATE_VIRTUAL_CARDS_MUTATION,
                variables,
            )
            .await?;

        let cards = created_cards(data)?;
        info!(
            collective_id = self.collective_id,
            requested = request.card_count(),
            created = cards.len(),
            "createVirtualCards completed"
        );
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardDelivery;

    #[test]
    fn into_data_returns_data_when_no_errors() {
        let payload = json!({
            "data": {
                "Collective": {
                    "id": 1,
                    "paymentMethods": [
                        { "id": 5, "type": "prepaid", "balance": 4000, "currency": "EUR" }
                    ]
                },
                "allHosts": { "collectives": [
                    { "id": 11, "type": "ORGANIZATION", "name": "Open Source Collective", "slug": "opensource" }
                ]}
            }
        });
        let data: CatalogData = into_data(payload).expect("data parses");
        let collective = data.collective.expect("collective present");
        assert_eq!(collective.payment_methods[0].id, 5);
        assert_eq!(data.all_hosts.expect("hosts present").collectives[0].slug, "opensource");
    }

    #[test]
    fn into_data_joins_graphql_error_messages() {
        let payload = json!({
            "data": null,
            "errors": [
                { "message": "Not enough balance", "path": ["createVirtualCards"] },
                { "message": "Try a smaller amount" }
            ]
        });
        let err = into_data::<CreateCardsData>(payload).unwrap_err();
        assert_eq!(err.to_string(), "Not enough balance; Try a smaller amount");
    }

    #[test]
    fn into_data_rejects_empty_envelope() {
        let err = into_data::<CreateCardsData>(json!({})).unwrap_err();
        assert!(matches!(err, IssuerError::InvalidResponse(_)));
    }

    #[test]
    fn created_cards_parse_from_mutation_result() {
        let payload = json!({
            "data": { "createVirtualCards": [{
                "id": 9,
                "uuid": "3f4d6542-b8ce-4226-93d3-80d6f14d6db2",
                "name": null,
                "initialBalance": 2000,
                "monthlyLimitPerMember": null,
                "currency": "USD",
                "expiryDate": "2027-10-19T00:00:00.000Z"
            }]}
        });
        let data: CreateCardsData = into_data(payload).expect("data parses");
        let cards = data.create_virtual_cards.expect("cards present");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].initial_balance, Some(2000));
    }

    #[test]
    fn null_mutation_result_is_an_error() {
        let payload = json!({ "data": { "createVirtualCards": null } });
        let data: CreateCardsData = into_data(payload).expect("envelope parses");
        let err = created_cards(data).unwrap_err();
        assert!(matches!(err, IssuerError::InvalidResponse(_)));
        assert_eq!(
            err.to_string(),
            "API response was invalid: createVirtualCards returned no cards"
        );
    }

    #[test]
    fn create_variables_add_owning_collective() {
        let request = CreateVirtualCardsRequest {
            amount: 1000,
            payment_method_id: 4,
            limited_to_host_collective_ids: vec![],
            limited_to_collective_ids: vec![2],
            expiry_date: "2027-10-19".to_string(),
            delivery: CardDelivery::Manual {
                number_of_virtual_cards: 3,
            },
        };
        let variables = create_variables(42, &request).expect("serializes");
        assert_eq!(variables["CollectiveId"], json!(42));
        assert_eq!(variables["PaymentMethodId"], json!(4));
        assert_eq!(variables["numberOfVirtualCards"], json!(3));
        assert_eq!(variables["limitedToCollectiveIds"], json!([2]));
    }

    /// Answer a single HTTP request with `response` verbatim, then hang up.
    fn serve_once(response: String) -> Url {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).expect("read request");
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).expect("write response");
        });
        Url::parse(&format!("http://{addr}/graphql")).expect("valid url")
    }

    fn client_for(endpoint: Url) -> GraphQlClient {
        GraphQlClient::new(&IssuerConfig {
            api_url: endpoint,
            api_key: None,
            collective_id: 42,
            collective_slug: "webpack".to_string(),
            currency: "USD".to_string(),
            http_timeout: std::time::Duration::from_secs(5),
        })
        .expect("client builds")
    }

    #[tokio::test]
    async fn truncated_body_is_a_request_error() {
        let endpoint = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 64\r\n\r\n{\"data\""
                .to_string(),
        );
        let err = client_for(endpoint).fetch_catalog().await.unwrap_err();
        match err {
            IssuerError::Request(message) => assert!(message.contains("body read failed")),
            other => panic!("expected request error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn html_error_page_is_reported_as_excerpt() {
        let page = format!("<html>{}</html>", "oops ".repeat(400));
        let endpoint = serve_once(format!(
            "HTTP/1.1 502 Bad Gateway\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{page}",
            page.len()
        ));
        let err = client_for(endpoint).fetch_catalog().await.unwrap_err();
        match err {
            IssuerError::Http { status, body } => {
                assert_eq!(status, 502);
                assert!(body.len() < page.len());
                assert!(body.ends_with('…'));
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
    }

    #[test]
    fn client_builds_from_config() {
        let config = IssuerConfig {
            api_url: Url::parse("https://api.example.com/graphql").expect("valid url"),
            api_key: Some("key".to_string()),
            collective_id: 42,
            collective_slug: "webpack".to_string(),
            currency: "USD".to_string(),
            http_timeout: std::time::Duration::from_secs(5),
        };
        let client = GraphQlClient::new(&config).expect("client builds");
        assert_eq!(client.collective_id, 42);
        assert_eq!(client.endpoint.as_str(), "https://api.example.com/graphql");
    }
}
