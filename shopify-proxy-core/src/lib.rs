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

//! Shopify GraphQL proxy core
//!
//! Version resolution, schema management, query validation and request dispatch
//! for the Storefront and Admin APIs.
//!
//! ```text
//! front-end ──► QueryValidator ──► SchemaManager ──► VersionResolver
//!          └──► ProxyDispatcher ───────────────────► VersionResolver
//!                      │
//!                      ▼
//!               Storefront / Admin API
//! ```
//!
//! [`ProxyContext`] owns every cache; build one per process (or per test).

pub mod config;
pub mod context;
pub mod error;
pub mod proxy;
pub mod schema;
pub mod surface;
pub mod upstream;
pub mod validation;
pub mod version;

pub use config::{AdminApiConfig, ShopifyConfig};
pub use context::ProxyContext;
pub use error::{ConfigError, SchemaError, UpstreamError};
pub use proxy::{operation_name, GraphqlRequest, ProxyDispatcher, ProxyResult, AUDIT_TARGET};
pub use schema::{
    schema_path, SchemaCache, SchemaManager, SingleSlotCache, VersionKeyedCache,
    INTROSPECTION_QUERY,
};
pub use surface::ApiSurface;
pub use upstream::UpstreamClient;
pub use validation::{QueryValidator, SourceLocation, ValidationError, ValidationOutcome};
pub use version::{
    ApiVersionInfo, VersionCache, VersionCacheStats, VersionResolver,
    FALLBACK_STOREFRONT_VERSION, PUBLIC_API_VERSIONS_QUERY,
};
