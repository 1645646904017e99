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

//! Shopify GraphQL proxy server
//!
//! HTTP front-end (MCP JSON-RPC plus GraphQL pass-through routes) and stdio MCP front-end
//! over the shared [`ProxyContext`].

pub mod api;
pub mod config;
pub mod mcp;

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::AppState;
use config::ServerConfig;
use mcp::{default_registry, McpHandler, McpServer, StdioTransport, ToolRegistry};
use shopify_proxy_core::ProxyContext;

/// Initialize tracing. Output goes to stderr; stdout belongs to the stdio transport.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shopify_proxy_server=info,shopify_proxy_core=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Validate configuration and build the shared proxy context
pub fn build_context(config: &ServerConfig) -> Result<ProxyContext> {
    config.validate()?;
    config.shopify.log_summary();
    Ok(ProxyContext::new(config.shopify.clone()))
}

/// Full HTTP application: `/mcp`, `/api/graphql`, `/api/admin/graphql` and `/health`
pub fn build_router(
    proxy: ProxyContext,
    registry: Arc<ToolRegistry>,
    config: &ServerConfig,
) -> Router {
    let mcp = McpServer::new(McpHandler::new(proxy.clone(), registry, true));

    let app = Router::new()
        .merge(api::router(AppState::new(proxy)))
        .merge(mcp.router());

    let app = if config.http.enable_cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}

async fn log_resolved_versions(proxy: &ProxyContext) {
    let storefront = proxy.versions().resolve_storefront().await;
    let admin = proxy.versions().resolve_admin().await;
    tracing::info!(
        storefront = %storefront,
        admin = admin.as_deref().unwrap_or("disabled"),
        "Resolved API versions"
    );
}

pub async fn run_http_server(config: ServerConfig) -> Result<()> {
    tracing::info!("Starting Shopify proxy HTTP server");

    let proxy = build_context(&config)?;
    let registry = Arc::new(default_registry()?);
    log_resolved_versions(&proxy).await;

    let addr = config.socket_addr()?;
    let app = build_router(proxy, registry, &config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

pub async fn run_stdio_server(config: ServerConfig) -> Result<()> {
    let proxy = build_context(&config)?;
    let registry = Arc::new(default_registry()?);
    log_resolved_versions(&proxy).await;

    let validate = config.mcp.validate_stdio_queries;
    let handler = McpHandler::new(proxy, registry, validate);
    tracing::info!(validate, "{} running on stdio", mcp::SERVER_NAME);

    let mut transport = StdioTransport::new();
    mcp::serve(&mut transport, &handler).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
