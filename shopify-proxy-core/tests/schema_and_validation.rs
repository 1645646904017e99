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

mod common;

use common::{admin_config, mock_introspection, mock_versions, store_config};
use mockito::Matcher;
use shopify_proxy_core::{
    schema_path, ApiSurface, ProxyContext, SchemaError, UpstreamClient, VersionKeyedCache,
};
use std::sync::Arc;
use tempfile::TempDir;

const LIST: &[(&str, bool)] = &[("2024-10", true), ("2025-01", true)];
const STOREFRONT_PATH: &str = "/api/2025-01/graphql.json";
const ADMIN_PATH: &str = "/admin/api/2025-01/graphql.json";

#[tokio::test]
async fn test_schema_is_generated_once_and_persisted() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let _versions = mock_versions(&mut server, "/api/unstable/graphql.json", LIST, 2).await;
    let introspection = mock_introspection(&mut server, STOREFRONT_PATH, 1).await;

    let ctx = ProxyContext::new(store_config(&server, dir.path()));
    let first = ctx.schemas().get_storefront_schema().await.unwrap();
    let cached = ctx.schemas().get_storefront_schema().await.unwrap();
    assert_eq!(first, cached);

    let path = schema_path(dir.path(), ApiSurface::Storefront, "2025-01");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), &*first);

    // A fresh process reads the file instead of introspecting again.
    let restarted = ProxyContext::new(store_config(&server, dir.path()));
    let reloaded = restarted.schemas().get_storefront_schema().await.unwrap();
    assert_eq!(reloaded, first);

    introspection.assert_async().await;
    assert_eq!(ctx.schemas().introspection_count(), 1);
    assert_eq!(restarted.schemas().introspection_count(), 0);
}

#[tokio::test]
async fn test_existing_file_is_used_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let _versions = mock_versions(&mut server, "/api/unstable/graphql.json", LIST, 1).await;
    let introspection = mock_introspection(&mut server, STOREFRONT_PATH, 0).await;

    let sdl = "type Query {\n  hello: String\n}\n";
    std::fs::write(
        schema_path(dir.path(), ApiSurface::Storefront, "2025-01"),
        sdl,
    )
    .unwrap();

    let ctx = ProxyContext::new(store_config(&server, dir.path()));
    let schema = ctx.schemas().get_schema(ApiSurface::Storefront).await.unwrap();

    assert_eq!(schema.as_deref(), Some(sdl));
    introspection.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_cold_loads_introspect_once() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let _versions = mock_versions(&mut server, "/api/unstable/graphql.json", LIST, 2).await;
    let introspection = mock_introspection(&mut server, STOREFRONT_PATH, 1).await;

    let ctx = ProxyContext::new(store_config(&server, dir.path()));
    let (a, b) = tokio::join!(
        ctx.schemas().get_storefront_schema(),
        ctx.schemas().get_storefront_schema()
    );

    assert_eq!(a.unwrap(), b.unwrap());
    introspection.assert_async().await;
}

#[tokio::test]
async fn test_storefront_introspection_failure_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let _versions = mock_versions(&mut server, "/api/unstable/graphql.json", LIST, 1).await;
    let _introspection = server
        .mock("POST", STOREFRONT_PATH)
        .match_body(Matcher::Regex("__schema".to_string()))
        .with_status(200)
        .with_body(r#"{"errors":[{"message":"Access denied"}]}"#)
        .create_async()
        .await;

    let ctx = ProxyContext::new(store_config(&server, dir.path()));
    let result = ctx.schemas().get_schema(ApiSurface::Storefront).await;

    assert!(matches!(result, Err(SchemaError::IntrospectionFailed { .. })));
    assert!(!schema_path(dir.path(), ApiSurface::Storefront, "2025-01").exists());
}

#[tokio::test]
async fn test_admin_introspection_failure_is_absent() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let _versions = mock_versions(&mut server, "/admin/api/unstable/graphql.json", LIST, 1).await;
    let _introspection = server
        .mock("POST", ADMIN_PATH)
        .match_body(Matcher::Regex("__schema".to_string()))
        .with_status(401)
        .with_body(r#"{"errors":"Invalid API key or access token"}"#)
        .create_async()
        .await;

    let ctx = ProxyContext::new(admin_config(&server, dir.path()));

    assert!(ctx.schemas().get_schema(ApiSurface::Admin).await.unwrap().is_none());
    assert!(ctx.schemas().get_admin_schema().await.is_none());
}

#[tokio::test]
async fn test_admin_schema_is_introspected_with_admin_token() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let _versions = mock_versions(&mut server, "/admin/api/unstable/graphql.json", LIST, 1).await;
    let introspection = server
        .mock("POST", ADMIN_PATH)
        .match_header("x-shopify-access-token", common::ADMIN_TOKEN)
        .match_body(Matcher::Regex("__schema".to_string()))
        .with_status(200)
        .with_body(serde_json::json!({ "data": common::introspection_data() }).to_string())
        .expect(1)
        .create_async()
        .await;

    let ctx = ProxyContext::new(admin_config(&server, dir.path()));

    assert!(ctx.schemas().get_admin_schema().await.is_some());
    assert!(schema_path(dir.path(), ApiSurface::Admin, "2025-01").exists());
    introspection.assert_async().await;
}

#[tokio::test]
async fn test_version_keyed_cache_can_be_substituted() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let _versions = mock_versions(&mut server, "/api/unstable/graphql.json", LIST, 1).await;
    let _introspection = mock_introspection(&mut server, STOREFRONT_PATH, 1).await;

    let ctx = ProxyContext::with_schema_cache(
        store_config(&server, dir.path()),
        UpstreamClient::new(),
        Arc::new(VersionKeyedCache::new()),
    );

    assert!(ctx.schemas().get_storefront_schema().await.is_ok());
    assert!(ctx.schemas().get_storefront_schema().await.is_ok());
    assert_eq!(ctx.schemas().introspection_count(), 1);
}

#[tokio::test]
async fn test_admin_validation_is_skipped_when_disabled() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let any = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let ctx = ProxyContext::new(store_config(&server, dir.path()));
    let outcome = ctx
        .validator()
        .validate("this is { not graphql", ApiSurface::Admin)
        .await;

    assert!(outcome.valid);
    any.assert_async().await;
}

#[tokio::test]
async fn test_storefront_queries_are_validated() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let _versions = mock_versions(&mut server, "/api/unstable/graphql.json", LIST, 3).await;
    let _introspection = mock_introspection(&mut server, STOREFRONT_PATH, 1).await;

    let ctx = ProxyContext::new(store_config(&server, dir.path()));
    let validator = ctx.validator();

    assert!(validator.validate("{ shop { name } }", ApiSurface::Storefront).await.valid);

    let unknown = validator
        .validate("{ shop { email } }", ApiSurface::Storefront)
        .await;
    assert!(!unknown.valid);
    assert!(unknown.errors.iter().any(|e| e.message.contains("email")));

    let missing_arg = validator
        .validate("{ product { title } }", ApiSurface::Storefront)
        .await;
    assert!(!missing_arg.valid);
}

#[tokio::test]
async fn test_storefront_schema_failure_fails_validation() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let _versions = mock_versions(&mut server, "/api/unstable/graphql.json", LIST, 1).await;
    let _introspection = server
        .mock("POST", STOREFRONT_PATH)
        .with_status(500)
        .create_async()
        .await;

    let ctx = ProxyContext::new(store_config(&server, dir.path()));
    let outcome = ctx
        .validator()
        .validate("{ shop { name } }", ApiSurface::Storefront)
        .await;

    assert!(!outcome.valid);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0]
        .message
        .starts_with("Internal error during query validation:"));
}
