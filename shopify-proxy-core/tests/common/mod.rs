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

// Shared fixtures for the integration tests

#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use shopify_proxy_core::ShopifyConfig;
use std::path::Path;

pub const STOREFRONT_TOKEN: &str = "sf-token";
pub const ADMIN_TOKEN: &str = "admin-token";

/// Real-store configuration pointing at a local mock server
pub fn store_config(server: &ServerGuard, schema_dir: &Path) -> ShopifyConfig {
    ShopifyConfig {
        store_domain: Some(server.url()),
        storefront_access_token: Some(STOREFRONT_TOKEN.to_string()),
        schema_dir: schema_dir.to_path_buf(),
        mock_shop_url: server.url(),
        ..ShopifyConfig::default()
    }
}

/// Same as [`store_config`] with the Admin API enabled
pub fn admin_config(server: &ServerGuard, schema_dir: &Path) -> ShopifyConfig {
    let mut config = store_config(server, schema_dir);
    config.admin.enabled = true;
    config.admin.access_token = Some(ADMIN_TOKEN.to_string());
    config
}

pub fn versions_body(versions: &[(&str, bool)]) -> String {
    let list: Vec<Value> = versions
        .iter()
        .map(|(handle, supported)| {
            json!({ "handle": handle, "displayName": handle, "supported": supported })
        })
        .collect();
    json!({ "data": { "publicApiVersions": list } }).to_string()
}

/// Mock answering `publicApiVersions` on `path`
pub async fn mock_versions(
    server: &mut ServerGuard,
    path: &str,
    versions: &[(&str, bool)],
    hits: usize,
) -> Mock {
    server
        .mock("POST", path)
        .match_body(Matcher::Regex("publicApiVersions".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(versions_body(versions))
        .expect(hits)
        .create_async()
        .await
}

/// Mock answering the introspection query on `path`
pub async fn mock_introspection(server: &mut ServerGuard, path: &str, hits: usize) -> Mock {
    server
        .mock("POST", path)
        .match_body(Matcher::Regex("__schema".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "data": introspection_data() }).to_string())
        .expect(hits)
        .create_async()
        .await
}

fn named(kind: &str, name: &str) -> Value {
    json!({ "kind": kind, "name": name, "ofType": null })
}

fn non_null(inner: Value) -> Value {
    json!({ "kind": "NON_NULL", "name": null, "ofType": inner })
}

fn field(name: &str, ty: Value, args: Vec<Value>) -> Value {
    json!({
        "name": name,
        "description": null,
        "args": args,
        "type": ty,
        "isDeprecated": false,
        "deprecationReason": null
    })
}

fn arg(name: &str, ty: Value) -> Value {
    json!({ "name": name, "description": null, "type": ty, "defaultValue": null })
}

fn object(name: &str, fields: Vec<Value>) -> Value {
    json!({
        "kind": "OBJECT",
        "name": name,
        "description": null,
        "fields": fields,
        "inputFields": null,
        "interfaces": [],
        "enumValues": null,
        "possibleTypes": null
    })
}

/// A small storefront-like schema: `shop { name }` and `product(id:) { id title }`
pub fn introspection_data() -> Value {
    json!({
        "__schema": {
            "queryType": { "name": "QueryRoot" },
            "mutationType": null,
            "subscriptionType": null,
            "directives": [],
            "types": [
                object("QueryRoot", vec![
                    field("shop", non_null(named("OBJECT", "Shop")), vec![]),
                    field(
                        "product",
                        named("OBJECT", "Product"),
                        vec![arg("id", non_null(named("SCALAR", "ID")))]
                    ),
                ]),
                object("Shop", vec![field("name", non_null(named("SCALAR", "String")), vec![])]),
                object("Product", vec![
                    field("id", non_null(named("SCALAR", "ID")), vec![]),
                    field("title", non_null(named("SCALAR", "String")), vec![]),
                ]),
                {
                    "kind": "SCALAR", "name": "String", "description": null, "fields": null,
                    "inputFields": null, "interfaces": null, "enumValues": null, "possibleTypes": null
                }
            ]
        }
    })
}
