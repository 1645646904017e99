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

//! Error types for the proxy core.

use crate::surface::ApiSurface;
use thiserror::Error;

/// Configuration problems detected before any network access.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Admin API is disabled")]
    AdminDisabled,

    #[error("{surface} API configuration error: missing {what}")]
    Missing {
        surface: ApiSurface,
        what: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures while talking to the upstream platform.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON in upstream response: {0}")]
    Decode(String),
}

/// Failures while producing a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to generate {surface} schema version {version} via introspection")]
    IntrospectionFailed {
        surface: ApiSurface,
        version: String,
    },

    #[error("Failed to build schema from introspection result: {0}")]
    Build(String),

    #[error("Failed to load {surface} schema version {version} from {path}: {source}")]
    Read {
        surface: ApiSurface,
        version: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write schema file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
