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

//! Typed access to tool arguments after schema validation.

use super::registry::ToolError;
use serde_json::Value;

/// Present and non-null argument
pub fn optional<'a>(args: &'a Value, name: &str) -> Option<&'a Value> {
    args.get(name).filter(|value| !value.is_null())
}

pub fn str_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    optional(args, name)
        .ok_or_else(|| ToolError::InvalidParams(format!("'{}' is required", name)))?
        .as_str()
        .ok_or_else(|| ToolError::InvalidParams(format!("'{}' must be a string", name)))
}

pub fn bool_arg(args: &Value, name: &str, default: bool) -> Result<bool, ToolError> {
    match optional(args, name) {
        None => Ok(default),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| ToolError::InvalidParams(format!("'{}' must be a boolean", name))),
    }
}

pub fn uint_arg(args: &Value, name: &str, default: u64) -> Result<u64, ToolError> {
    match optional(args, name) {
        None => Ok(default),
        Some(value) => value.as_u64().ok_or_else(|| {
            ToolError::InvalidParams(format!("'{}' must be a non-negative integer", name))
        }),
    }
}
