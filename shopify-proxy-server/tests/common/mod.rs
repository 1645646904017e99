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

// Shared fixtures for the server integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use shopify_proxy_core::{schema_path, AdminApiConfig, ApiSurface, ProxyContext, ShopifyConfig};
use shopify_proxy_server::{build_router, config::ServerConfig, mcp::default_registry};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const VERSION: &str = "2025-01";
pub const STOREFRONT_PATH: &str = "/api/2025-01/graphql.json";
pub const ADMIN_PATH: &str = "/admin/api/2025-01/graphql.json";

pub const STOREFRONT_SDL: &str = r#"schema {
  query: QueryRoot
}

type QueryRoot {
  shop: Shop!
  product(id: ID!): Product
}

type Shop {
  name: String!
  description: String
  paymentSettings: PaymentSettings!
}

type PaymentSettings {
  currencyCode: String!
}

type Product {
  id: ID!
  title: String!
  descriptionHtml: String!
  vendor: String!
}
"#;

pub const ADMIN_SDL: &str = r#"schema {
  query: QueryRoot
}

type QueryRoot {
  shop: Shop!
  customer(id: ID!): Customer
}

type Shop {
  name: String!
}

type Customer {
  id: ID!
  email: String
  firstName: String
  lastName: String
  phone: String
}
"#;

/// Local upstream plus a schema directory seeded for [`VERSION`]
pub struct Fixture {
    pub server: ServerGuard,
    pub dir: TempDir,
    pub config: ServerConfig,
    _versions: Vec<Mock>,
}

impl Fixture {
    pub async fn new(admin: bool) -> Self {
        let mut server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();

        let mut versions = vec![versions_mock(&mut server, "/api/unstable/graphql.json").await];
        std::fs::write(
            schema_path(dir.path(), ApiSurface::Storefront, VERSION),
            STOREFRONT_SDL,
        )
        .unwrap();

        let mut config = ServerConfig::default();
        config.shopify = ShopifyConfig {
            store_domain: Some(server.url()),
            storefront_access_token: Some("sf-token".to_string()),
            schema_dir: dir.path().to_path_buf(),
            mock_shop_url: server.url(),
            ..ShopifyConfig::default()
        };

        if admin {
            versions.push(versions_mock(&mut server, "/admin/api/unstable/graphql.json").await);
            std::fs::write(
                schema_path(dir.path(), ApiSurface::Admin, VERSION),
                ADMIN_SDL,
            )
            .unwrap();
            config.shopify.admin = AdminApiConfig {
                enabled: true,
                access_token: Some("admin-token".to_string()),
                api_version: None,
            };
        }

        Self {
            server,
            dir,
            config,
            _versions: versions,
        }
    }

    pub fn proxy(&self) -> ProxyContext {
        ProxyContext::new(self.config.shopify.clone())
    }

    pub fn app(&self) -> Router {
        build_router(
            self.proxy(),
            Arc::new(default_registry().unwrap()),
            &self.config,
        )
    }
}

async fn versions_mock(server: &mut ServerGuard, path: &str) -> Mock {
    server
        .mock("POST", path)
        .match_body(Matcher::Regex("publicApiVersions".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": {
                    "publicApiVersions": [
                        { "handle": "2024-10", "displayName": "2024-10", "supported": true },
                        { "handle": VERSION, "displayName": VERSION, "supported": true }
                    ]
                }
            })
            .to_string(),
        )
        .create_async()
        .await
}

pub fn rpc(id: i64, method: &str, params: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }).to_string()
}

pub fn tool_call(id: i64, name: &str, arguments: Value) -> String {
    rpc(id, "tools/call", json!({ "name": name, "arguments": arguments }))
}

/// POST `body` to `uri` and decode the reply (`Null` for an empty body)
pub async fn post(app: Router, uri: &str, body: impl Into<String>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.into()))
                .unwrap(),
        )
        .await
        .unwrap();
    decode(response).await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    decode(response).await
}

async fn decode(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
