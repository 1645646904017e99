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

//! Tool catalog exposed over MCP.

pub mod admin;
mod args;
pub mod registry;
pub mod storefront;

pub use registry::{McpTool, RegistrationError, ToolContext, ToolError, ToolRegistry};

/// Registry holding every Storefront and Admin tool
pub fn default_registry() -> Result<ToolRegistry, RegistrationError> {
    let registry = ToolRegistry::new();
    for tool in storefront::tools().into_iter().chain(admin::tools()) {
        registry.register(tool)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_hides_admin_tools() {
        let registry = default_registry().unwrap();

        let storefront_only = registry.list(false);
        assert_eq!(storefront_only.len(), 10);
        assert!(storefront_only.iter().all(|tool| tool.name != "adminQuery"));

        let everything = registry.list(true);
        assert_eq!(everything.len(), 13);
        assert!(everything.iter().any(|tool| tool.name == "getCustomerById"));
    }
}
