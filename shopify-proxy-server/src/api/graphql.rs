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

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use shopify_proxy_core::{ApiSurface, GraphqlRequest};
use tracing::debug;

use crate::api::{ApiError, AppState};

/// POST /api/graphql - Storefront API pass-through
pub async fn storefront_graphql(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    forward(&state, ApiSurface::Storefront, &body).await
}

/// POST /api/admin/graphql - Admin API pass-through
pub async fn admin_graphql(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    forward(&state, ApiSurface::Admin, &body).await
}

async fn forward(state: &AppState, surface: ApiSurface, body: &[u8]) -> Result<Response, ApiError> {
    let request = parse_body(body)?;
    debug!(%surface, "GraphQL pass-through request");

    let result = state
        .proxy
        .execute(surface, &request, true)
        .await
        .map_err(ApiError::Validation)?;

    let status = StatusCode::from_u16(result.status_code).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(result.payload)).into_response())
}

fn parse_body(body: &[u8]) -> Result<GraphqlRequest, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::BadRequest("Invalid JSON body".to_string()))?;

    let query = value
        .get("query")
        .and_then(Value::as_str)
        .filter(|query| !query.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing GraphQL query in request body".to_string()))?;

    let variables = value.get("variables").cloned().unwrap_or(Value::Null);
    Ok(GraphqlRequest::new(query).with_variables(variables))
}
