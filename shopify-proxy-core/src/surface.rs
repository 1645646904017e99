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

//! API surfaces exposed by the platform.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two GraphQL APIs the proxy fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiSurface {
    /// Public, customer-facing API (real store or mock shop)
    Storefront,
    /// Privileged API, only reachable when explicitly enabled
    Admin,
}

impl ApiSurface {
    pub const ALL: [ApiSurface; 2] = [ApiSurface::Storefront, ApiSurface::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiSurface::Storefront => "storefront",
            ApiSurface::Admin => "admin",
        }
    }
}

impl fmt::Display for ApiSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiSurface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "storefront" => Ok(ApiSurface::Storefront),
            "admin" => Ok(ApiSurface::Admin),
            other => Err(format!("Unknown API surface: {}", other)),
        }
    }
}
