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

//! Upstream endpoint construction and the shared HTTP client.
//!
//! Endpoint layout:
//!
//! ```text
//! storefront  POST {mock-shop | https://store}/api/{version}/graphql.json
//! admin       POST https://store/admin/api/{version}/graphql.json
//! ```
//!
//! Both surfaces take `{query, variables}` JSON bodies. Requests are never cached.

use crate::config::ShopifyConfig;
use crate::error::{ConfigError, UpstreamError};
use crate::surface::ApiSurface;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde_json::Value;

/// Storefront token header, sent only to real stores
pub const STOREFRONT_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Admin token header. `X-Shopify-Admin-API-Access-Token` is not part of the
/// platform's contract and is never sent.
pub const ADMIN_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Version segment used when listing versions before one is resolved
pub const DISCOVERY_VERSION: &str = "unstable";

/// A resolved upstream target: URL plus auth headers.
#[derive(Clone)]
pub struct Endpoint {
    pub surface: ApiSurface,
    pub url: String,
    headers: Vec<(&'static str, String)>,
}

impl Endpoint {
    fn new(surface: ApiSurface, url: String) -> Self {
        Self {
            surface,
            url,
            headers: Vec::new(),
        }
    }

    fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    /// Header names attached to this endpoint (values are secrets)
    pub fn header_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.headers.iter().map(|(name, _)| *name)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("surface", &self.surface)
            .field("url", &self.url)
            .field("headers", &self.header_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Storefront endpoint for `version`: mock shop, or the real store with its token
pub fn storefront_endpoint(config: &ShopifyConfig, version: &str) -> Result<Endpoint, ConfigError> {
    if config.is_mock_shop() {
        let url = format!("{}/api/{}/graphql.json", config.mock_shop_origin(), version);
        return Ok(Endpoint::new(ApiSurface::Storefront, url));
    }

    match (config.store_origin(), config.storefront_access_token.as_deref()) {
        (Some(origin), Some(token)) => {
            let url = format!("{}/api/{}/graphql.json", origin, version);
            Ok(Endpoint::new(ApiSurface::Storefront, url).with_header(STOREFRONT_TOKEN_HEADER, token))
        }
        _ => Err(ConfigError::Missing {
            surface: ApiSurface::Storefront,
            what: "store domain or access token",
        }),
    }
}

/// Checks that the Admin API is enabled and fully configured
pub fn admin_guard(config: &ShopifyConfig) -> Result<(), ConfigError> {
    if !config.admin.enabled {
        return Err(ConfigError::AdminDisabled);
    }
    if config.store_domain.is_none() || config.admin.access_token.is_none() {
        return Err(ConfigError::Missing {
            surface: ApiSurface::Admin,
            what: "token or store domain",
        });
    }
    Ok(())
}

/// Admin endpoint for `version`; refuses when the Admin API is disabled or incomplete
pub fn admin_endpoint(config: &ShopifyConfig, version: &str) -> Result<Endpoint, ConfigError> {
    admin_guard(config)?;

    match (config.store_origin(), config.admin.access_token.as_deref()) {
        (Some(origin), Some(token)) => {
            let url = format!("{}/admin/api/{}/graphql.json", origin, version);
            Ok(Endpoint::new(ApiSurface::Admin, url).with_header(ADMIN_TOKEN_HEADER, token))
        }
        _ => Err(ConfigError::Missing {
            surface: ApiSurface::Admin,
            what: "token or store domain",
        }),
    }
}

/// Endpoint for a surface at a given version
pub fn endpoint_for(
    config: &ShopifyConfig,
    surface: ApiSurface,
    version: &str,
) -> Result<Endpoint, ConfigError> {
    match surface {
        ApiSurface::Storefront => storefront_endpoint(config, version),
        ApiSurface::Admin => admin_endpoint(config, version),
    }
}

/// Endpoint used to list available versions.
///
/// Storefront falls back to the mock shop unless both store domain and token are set.
pub fn discovery_endpoint(
    config: &ShopifyConfig,
    surface: ApiSurface,
) -> Result<Endpoint, ConfigError> {
    let version = config.pinned_version(surface).unwrap_or(DISCOVERY_VERSION);
    match surface {
        ApiSurface::Storefront => {
            if config.store_domain.is_some() && config.storefront_access_token.is_some() {
                storefront_endpoint(config, version)
            } else {
                let url = format!(
                    "{}/api/{}/graphql.json",
                    config.mock_shop_origin(),
                    DISCOVERY_VERSION
                );
                Ok(Endpoint::new(ApiSurface::Storefront, url))
            }
        }
        ApiSurface::Admin => admin_endpoint(config, version),
    }
}

/// Raw upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub text: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, UpstreamError> {
        serde_json::from_str(&self.text).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

/// Thin wrapper over a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// POST a GraphQL body to `endpoint`
    pub async fn post_graphql(
        &self,
        endpoint: &Endpoint,
        body: &Value,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let mut request = self
            .http
            .post(&endpoint.url)
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-store")
            .json(body);

        for (name, value) in &endpoint.headers {
            request = request.header(*name, value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(UpstreamResponse { status, text })
    }
}
