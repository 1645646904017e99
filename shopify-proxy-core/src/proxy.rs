// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Proxy Dispatcher
//!
//! Forwards a GraphQL request to the Storefront or Admin API at the resolved version
//! and normalizes the outcome into a [`ProxyResult`].
//!
//! `success` reflects the upstream HTTP status only. A 200 reply carrying a GraphQL
//! `errors` array is still a success; callers inspect `payload.errors` themselves.
//!
//! | Condition                                   | status        |
//! |---------------------------------------------|---------------|
//! | Admin API disabled                          | 403           |
//! | Missing token or store domain               | 500           |
//! | Admin version could not be resolved         | 500           |
//! | Network failure                             | 502           |
//! | 2xx reply that is not JSON                  | 502           |
//! | Any other upstream reply                    | passed through|

use crate::config::ShopifyConfig;
use crate::error::{ConfigError, UpstreamError};
use crate::surface::ApiSurface;
use crate::upstream::{
    admin_endpoint, admin_guard, storefront_endpoint, Endpoint, UpstreamClient, UpstreamResponse,
};
use crate::version::VersionResolver;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Target used for the admin audit log
pub const AUDIT_TARGET: &str = "audit";

const UNKNOWN_OPERATION: &str = "UnknownOperation";

static OPERATION_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?:query|mutation)\s*(\w+)").ok());

/// Best-effort operation name for audit logging
pub fn operation_name(query: &str) -> &str {
    OPERATION_NAME
        .as_ref()
        .and_then(|re| re.captures(query))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(UNKNOWN_OPERATION)
}

/// A GraphQL request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub variables: Value,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Value::Null,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    fn body(query: &str, variables: &Value) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), Value::String(query.to_string()));
        if !variables.is_null() {
            body.insert("variables".to_string(), variables.clone());
        }
        Value::Object(body)
    }
}

/// Normalized upstream outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResult {
    pub success: bool,
    pub status_code: u16,
    pub payload: Value,
}

impl ProxyResult {
    /// Failure with a synthesized `{"errors": [{"message": ...}]}` payload
    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code,
            payload: json!({ "errors": [{ "message": message.into() }] }),
        }
    }

    fn from_response(surface: ApiSurface, response: UpstreamResponse) -> Self {
        match response.json() {
            Ok(payload) => Self {
                success: response.is_success(),
                status_code: response.status,
                payload,
            },
            Err(_) if !response.is_success() => Self::failure(
                response.status,
                format!("Shopify {} API returned HTTP {}", label(surface), response.status),
            ),
            Err(e) => {
                error!(%surface, status = response.status, error = %e, "Upstream reply is not JSON");
                Self::failure(502, format!("Invalid response from Shopify {} API.", label(surface)))
            }
        }
    }

    /// `payload.errors` when present and non-empty
    pub fn graphql_errors(&self) -> Option<&Vec<Value>> {
        self.payload
            .get("errors")
            .and_then(Value::as_array)
            .filter(|errors| !errors.is_empty())
    }

    /// Message of the first error in the payload
    pub fn first_error_message(&self) -> Option<&str> {
        self.graphql_errors()?
            .first()?
            .get("message")?
            .as_str()
    }
}

fn admin_refusal(error: ConfigError) -> ProxyResult {
    match error {
        ConfigError::AdminDisabled => {
            warn!("Attempted to use Admin API while it is disabled");
            ProxyResult::failure(403, "Admin API access is disabled.")
        }
        other => {
            error!(error = %other, "Admin request refused");
            ProxyResult::failure(
                500,
                "Admin API configuration error: Missing token or store domain.",
            )
        }
    }
}

fn label(surface: ApiSurface) -> &'static str {
    match surface {
        ApiSurface::Storefront => "Storefront",
        ApiSurface::Admin => "Admin",
    }
}

pub struct ProxyDispatcher {
    config: Arc<ShopifyConfig>,
    resolver: Arc<VersionResolver>,
    client: UpstreamClient,
}

impl ProxyDispatcher {
    pub fn new(config: Arc<ShopifyConfig>, resolver: Arc<VersionResolver>, client: UpstreamClient) -> Self {
        Self {
            config,
            resolver,
            client,
        }
    }

    pub async fn proxy(&self, surface: ApiSurface, query: &str, variables: &Value) -> ProxyResult {
        match surface {
            ApiSurface::Storefront => self.proxy_storefront(query, variables).await,
            ApiSurface::Admin => self.proxy_admin(query, variables).await,
        }
    }

    pub async fn proxy_request(&self, surface: ApiSurface, request: &GraphqlRequest) -> ProxyResult {
        self.proxy(surface, &request.query, &request.variables).await
    }

    pub async fn proxy_storefront(&self, query: &str, variables: &Value) -> ProxyResult {
        let surface = ApiSurface::Storefront;
        let version = self.resolver.resolve_storefront().await;

        let endpoint = match storefront_endpoint(&self.config, &version) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                error!(%surface, error = %e, "Storefront request refused");
                return ProxyResult::failure(500, "Internal Server Configuration Error");
            }
        };

        debug!(%surface, %version, url = %endpoint.url, "Proxying request");
        match self.send(&endpoint, query, variables).await {
            Ok(result) => result,
            Err(e) => {
                error!(%surface, error = %e, "Storefront API network error");
                ProxyResult::failure(
                    502,
                    format!("Failed to proxy request to Shopify Storefront API. {}", e),
                )
            }
        }
    }

    pub async fn proxy_admin(&self, query: &str, variables: &Value) -> ProxyResult {
        let surface = ApiSurface::Admin;

        // Guards run before version resolution so a refused call never reaches the network.
        if let Err(e) = admin_guard(&self.config) {
            return admin_refusal(e);
        }

        let Some(version) = self.resolver.resolve_admin().await else {
            error!(%surface, "Admin API version could not be resolved");
            return ProxyResult::failure(
                500,
                "Internal Server Error: Could not resolve Admin API version.",
            );
        };

        let endpoint = match admin_endpoint(&self.config, &version) {
            Ok(endpoint) => endpoint,
            Err(e) => return admin_refusal(e),
        };

        info!(
            target: AUDIT_TARGET,
            operation = operation_name(query),
            store = self.config.store_domain.as_deref().unwrap_or_default(),
            %version,
            "Admin API call"
        );

        match self.send(&endpoint, query, variables).await {
            Ok(result) => result,
            Err(e) => {
                error!(%surface, error = %e, "Admin API network error");
                ProxyResult::failure(502, "Failed to communicate with Shopify Admin API.")
            }
        }
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        query: &str,
        variables: &Value,
    ) -> Result<ProxyResult, UpstreamError> {
        let body = GraphqlRequest::body(query, variables);
        let response = self.client.post_graphql(endpoint, &body).await?;

        if !response.is_success() {
            warn!(surface = %endpoint.surface, status = response.status, "Upstream returned HTTP error");
        }
        Ok(ProxyResult::from_response(endpoint.surface, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_name() {
        assert_eq!(operation_name("query GetShop { shop { name } }"), "GetShop");
        assert_eq!(
            operation_name("mutation productCreate($input: ProductInput!) { x }"),
            "productCreate"
        );
        assert_eq!(operation_name("{ shop { name } }"), UNKNOWN_OPERATION);
    }

    #[test]
    fn test_request_body_omits_null_variables() {
        assert_eq!(
            GraphqlRequest::body("{ shop { name } }", &Value::Null),
            json!({ "query": "{ shop { name } }" })
        );
        assert_eq!(
            GraphqlRequest::body("q", &json!({ "id": "1" })),
            json!({ "query": "q", "variables": { "id": "1" } })
        );
    }

    #[test]
    fn test_result_wire_format_and_error_helpers() {
        let result = ProxyResult::failure(403, "Admin API access is disabled.");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "success": false,
                "statusCode": 403,
                "payload": { "errors": [{ "message": "Admin API access is disabled." }] }
            })
        );
        assert_eq!(result.first_error_message(), Some("Admin API access is disabled."));

        let ok = ProxyResult {
            success: true,
            status_code: 200,
            payload: json!({ "data": {}, "errors": [] }),
        };
        assert!(ok.graphql_errors().is_none());
    }

    #[test]
    fn test_non_json_error_reply_keeps_status() {
        let response = UpstreamResponse {
            status: 503,
            text: "<html>unavailable</html>".to_string(),
        };
        let result = ProxyResult::from_response(ApiSurface::Storefront, response);
        assert!(!result.success);
        assert_eq!(result.status_code, 503);

        let response = UpstreamResponse {
            status: 200,
            text: "not json".to_string(),
        };
        let result = ProxyResult::from_response(ApiSurface::Admin, response);
        assert_eq!(result.status_code, 502);
    }
}
