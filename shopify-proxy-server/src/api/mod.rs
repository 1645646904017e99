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

//! REST surface: GraphQL pass-through routes and health.

pub mod graphql;
pub mod health;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shopify_proxy_core::{ProxyContext, ValidationOutcome};
use thiserror::Error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub proxy: ProxyContext,
}

impl AppState {
    pub fn new(proxy: ProxyContext) -> Self {
        Self { proxy }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("GraphQL query validation failed")]
    Validation(ValidationOutcome),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::BadRequest(message) => json!({ "errors": [{ "message": message }] }),
            ApiError::Validation(outcome) => json!({ "errors": outcome.errors }),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/graphql", post(graphql::storefront_graphql))
        .route("/api/admin/graphql", post(graphql::admin_graphql))
        .with_state(state)
}
