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

//! Shared handle that owns every cache and wires the components together.

use crate::config::ShopifyConfig;
use crate::proxy::{GraphqlRequest, ProxyDispatcher, ProxyResult};
use crate::schema::{SchemaCache, SchemaManager, SingleSlotCache};
use crate::surface::ApiSurface;
use crate::upstream::UpstreamClient;
use crate::validation::{QueryValidator, ValidationOutcome};
use crate::version::{VersionCache, VersionCacheStats, VersionResolver};
use std::sync::Arc;

/// Cheap to clone; every clone shares the same caches.
#[derive(Clone)]
pub struct ProxyContext {
    config: Arc<ShopifyConfig>,
    versions: Arc<VersionResolver>,
    schemas: Arc<SchemaManager>,
    validator: Arc<QueryValidator>,
    dispatcher: Arc<ProxyDispatcher>,
}

impl ProxyContext {
    pub fn new(config: ShopifyConfig) -> Self {
        Self::with_client(config, UpstreamClient::new())
    }

    pub fn with_client(config: ShopifyConfig, client: UpstreamClient) -> Self {
        Self::with_schema_cache(config, client, Arc::new(SingleSlotCache::new()))
    }

    pub fn with_schema_cache(
        config: ShopifyConfig,
        client: UpstreamClient,
        schema_cache: Arc<dyn SchemaCache>,
    ) -> Self {
        let config = Arc::new(config);
        let version_cache = Arc::new(VersionCache::new(config.discovery_ttl()));
        let versions = Arc::new(VersionResolver::new(
            config.clone(),
            client.clone(),
            version_cache,
        ));
        let schemas = Arc::new(SchemaManager::with_cache(
            config.clone(),
            versions.clone(),
            client.clone(),
            schema_cache,
        ));
        let validator = Arc::new(QueryValidator::new(schemas.clone()));
        let dispatcher = Arc::new(ProxyDispatcher::new(config.clone(), versions.clone(), client));

        Self {
            config,
            versions,
            schemas,
            validator,
            dispatcher,
        }
    }

    pub fn config(&self) -> &ShopifyConfig {
        &self.config
    }

    pub fn versions(&self) -> &VersionResolver {
        &self.versions
    }

    pub fn schemas(&self) -> &SchemaManager {
        &self.schemas
    }

    pub fn validator(&self) -> &QueryValidator {
        &self.validator
    }

    pub fn dispatcher(&self) -> &ProxyDispatcher {
        &self.dispatcher
    }

    pub fn version_cache_stats(&self) -> VersionCacheStats {
        self.versions.cache().stats()
    }

    /// Optionally validate, then dispatch. A failed validation never reaches the upstream.
    pub async fn execute(
        &self,
        surface: ApiSurface,
        request: &GraphqlRequest,
        validate: bool,
    ) -> Result<ProxyResult, ValidationOutcome> {
        if validate {
            let outcome = self.validator.validate(&request.query, surface).await;
            if !outcome.valid {
                return Err(outcome);
            }
        }
        Ok(self.dispatcher.proxy_request(surface, request).await)
    }
}
