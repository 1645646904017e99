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

use common::{rpc, tool_call, Fixture, ADMIN_PATH, STOREFRONT_SDL};
use mockito::Matcher;
use serde_json::{json, Value};
use shopify_proxy_core::{ProxyContext, ShopifyConfig};
use shopify_proxy_server::mcp::{
    default_registry, serve, BufferTransport, JsonRpcId, JsonRpcResponse, McpHandler,
    SERVER_NAME,
};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing_subscriber::fmt::MakeWriter;

fn handler(fixture: &Fixture, validate: bool) -> McpHandler {
    McpHandler::new(fixture.proxy(), Arc::new(default_registry().unwrap()), validate)
}

fn result(response: &JsonRpcResponse) -> &Value {
    response.result.as_ref().expect("expected a result")
}

#[tokio::test]
async fn test_session_over_buffer_transport() {
    let fixture = Fixture::new(false).await;
    let handler = handler(&fixture, false);

    let (in_tx, in_rx) = mpsc::channel(8);
    let (out_tx, mut out_rx) = mpsc::channel(8);
    let mut transport = BufferTransport::new(in_rx, out_tx);
    let session = tokio::spawn(async move { serve(&mut transport, &handler).await });

    in_tx.send(rpc(1, "initialize", json!({}))).await.unwrap();
    in_tx
        .send(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#.to_string())
        .await
        .unwrap();
    in_tx.send("   ".to_string()).await.unwrap();
    in_tx.send(rpc(2, "tools/list", json!({}))).await.unwrap();
    in_tx.send("garbage".to_string()).await.unwrap();
    drop(in_tx);

    session.await.unwrap().unwrap();

    let mut responses = HashMap::new();
    while let Some(response) = out_rx.recv().await {
        responses.insert(response.id.clone(), response);
    }
    assert_eq!(responses.len(), 3);

    let init = result(&responses[&JsonRpcId::Number(1)]);
    assert_eq!(init["serverInfo"]["name"], SERVER_NAME);
    assert_eq!(init["versions"]["storefront"], common::VERSION);
    assert_eq!(init["versions"]["admin"], Value::Null);
    assert_eq!(init["adminApiEnabled"], false);

    let tools = result(&responses[&JsonRpcId::Number(2)])["tools"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(tools.len(), 10);
    assert!(tools.iter().all(|tool| tool["annotations"].is_object()));

    let garbage = responses[&JsonRpcId::Null].error.as_ref().unwrap();
    assert_eq!(garbage.code, -32700);
}

#[tokio::test]
async fn test_slow_tool_call_does_not_block_ping() {
    // Upstream that accepts connections and never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let config = ShopifyConfig {
        store_domain: Some(format!("http://{}", addr)),
        storefront_access_token: Some("sf-token".to_string()),
        ..ShopifyConfig::default()
    };
    let handler = McpHandler::new(
        ProxyContext::new(config),
        Arc::new(default_registry().unwrap()),
        false,
    );

    let (in_tx, in_rx) = mpsc::channel(8);
    let (out_tx, mut out_rx) = mpsc::channel(8);
    let mut transport = BufferTransport::new(in_rx, out_tx);
    tokio::spawn(async move { serve(&mut transport, &handler).await });

    in_tx
        .send(tool_call(1, "getShopInfo", json!({})))
        .await
        .unwrap();
    in_tx.send(rpc(2, "ping", json!({}))).await.unwrap();

    let response = timeout(Duration::from_secs(5), out_rx.recv())
        .await
        .expect("ping should be answered while the tool call is pending")
        .unwrap();
    assert_eq!(response.id, JsonRpcId::Number(2));
    assert_eq!(result(&response), &json!({}));
}

#[tokio::test]
async fn test_notification_with_params_gets_no_response() {
    let fixture = Fixture::new(false).await;
    let handler = handler(&fixture, false);

    let message = json!({
        "jsonrpc": "2.0",
        "method": "resources/read",
        "params": { "uri": "shopify://schemas/storefront" }
    });
    assert!(handler.handle_text(&message.to_string()).await.is_none());

    let with_null_id = json!({ "jsonrpc": "2.0", "method": "ping", "id": null });
    let response = handler
        .handle_text(&with_null_id.to_string())
        .await
        .expect("a request with a null id is answered");
    assert_eq!(response.id, JsonRpcId::Null);
    assert_eq!(result(&response), &json!({}));
}

#[tokio::test]
async fn test_admin_tool_is_refused_when_disabled() {
    let fixture = Fixture::new(false).await;
    let handler = handler(&fixture, true);

    let response = handler
        .handle_text(&tool_call(1, "adminQuery", json!({ "query": "{ shop { name } }" })))
        .await
        .unwrap();

    let error = response.error.unwrap();
    assert_eq!(error.code, -32603);
    assert_eq!(
        error.message,
        "Tool 'adminQuery' requires Admin API, which is disabled."
    );
}

#[tokio::test]
async fn test_stdio_skips_validation_by_default() {
    let mut fixture = Fixture::new(true).await;
    let upstream = fixture
        .server
        .mock("POST", ADMIN_PATH)
        .match_body(Matcher::Regex("bogus".to_string()))
        .with_status(200)
        .with_body(r#"{"errors":[{"message":"Field 'bogus' doesn't exist on type 'Shop'"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let response = handler(&fixture, false)
        .handle_text(&tool_call(1, "adminQuery", json!({ "query": "{ shop { bogus } }" })))
        .await
        .unwrap();

    // A 200 reply with GraphQL errors is still a successful tool call.
    let text = result(&response)["content"][0]["text"].as_str().unwrap().to_string();
    assert!(text.contains("bogus"));
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_validation_gate_blocks_invalid_admin_query() {
    let mut fixture = Fixture::new(true).await;
    let upstream = fixture
        .server
        .mock("POST", ADMIN_PATH)
        .match_body(Matcher::Regex("bogus".to_string()))
        .expect(0)
        .create_async()
        .await;

    let response = handler(&fixture, true)
        .handle_text(&tool_call(1, "adminQuery", json!({ "query": "{ shop { bogus } }" })))
        .await
        .unwrap();

    let error = response.error.unwrap();
    assert_eq!(error.code, -32602);
    assert_eq!(error.message, "GraphQL query validation failed");
    assert!(!error.data.unwrap().as_array().unwrap().is_empty());
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_admin_tool_dispatches_once() {
    let mut fixture = Fixture::new(true).await;
    let upstream = fixture
        .server
        .mock("POST", ADMIN_PATH)
        .match_header("x-shopify-access-token", "admin-token")
        .match_body(Matcher::PartialJson(json!({
            "variables": { "id": "gid://shopify/Customer/9" }
        })))
        .with_status(200)
        .with_body(r#"{"data":{"customer":{"id":"gid://shopify/Customer/9","email":"a@b.c"}}}"#)
        .expect(1)
        .create_async()
        .await;

    let response = handler(&fixture, true)
        .handle_text(&tool_call(
            1,
            "getCustomerById",
            json!({ "customerId": "gid://shopify/Customer/9" }),
        ))
        .await
        .unwrap();

    assert!(response.error.is_none());
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_resources_expose_schema_text() {
    let fixture = Fixture::new(false).await;
    let handler = handler(&fixture, false);

    let list = handler
        .handle_text(&rpc(1, "resources/list", json!({})))
        .await
        .unwrap();
    let resources = result(&list)["resources"].as_array().unwrap().clone();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["uri"], "shopify://schemas/storefront");

    let read = handler
        .handle_text(&rpc(
            2,
            "resources/read",
            json!({ "uri": "shopify://schemas/storefront" }),
        ))
        .await
        .unwrap();
    assert_eq!(result(&read)["contents"][0]["text"], STOREFRONT_SDL);

    let admin = handler
        .handle_text(&rpc(3, "resources/read", json!({ "uri": "shopify://schemas/admin" })))
        .await
        .unwrap();
    assert_eq!(admin.error.unwrap().code, -32602);
}

#[tokio::test]
async fn test_ping_and_admin_initialize() {
    let fixture = Fixture::new(true).await;
    let handler = handler(&fixture, false);

    let ping = handler.handle_text(&rpc(1, "ping", json!({}))).await.unwrap();
    assert_eq!(result(&ping), &json!({}));

    let init = handler
        .handle_text(&rpc(2, "initialize", json!({})))
        .await
        .unwrap();
    assert_eq!(result(&init)["versions"]["admin"], common::VERSION);
    assert_eq!(result(&init)["adminApiEnabled"], true);

    let tools = handler.handle_text(&rpc(3, "tools/list", json!({}))).await.unwrap();
    assert_eq!(result(&tools)["tools"].as_array().unwrap().len(), 13);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_admin_tool_call_is_audited_once() {
    let mut fixture = Fixture::new(true).await;
    let _upstream = fixture
        .server
        .mock("POST", ADMIN_PATH)
        .match_body(Matcher::Regex("customer".to_string()))
        .with_status(200)
        .with_body(r#"{"data":{"customer":null}}"#)
        .create_async()
        .await;

    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let response = handler(&fixture, false)
        .handle_text(&tool_call(
            1,
            "getCustomerById",
            json!({ "customerId": "gid://shopify/Customer/9" }),
        ))
        .await
        .unwrap();
    assert!(response.error.is_none());

    let text = logs.text();
    let audit_lines = text.lines().filter(|line| line.contains(" audit:")).count();
    assert_eq!(audit_lines, 1, "{}", text);
}
