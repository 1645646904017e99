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

use anyhow::Result;
use clap::{Parser, Subcommand};
use shopify_proxy_server::{config::ServerConfig, init_tracing, run_http_server, run_stdio_server};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve MCP and GraphQL pass-through routes over HTTP
    Http {
        /// HTTP listen address (overrides config file and environment)
        #[arg(long)]
        listen: Option<String>,
    },
    /// Serve MCP over stdin/stdout
    Stdio {
        /// Validate tool queries against the schema before dispatch
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    // Load configuration
    let mut config = ServerConfig::load(args.config)?;

    // Apply CLI overrides
    match args.command {
        Command::Http { listen } => {
            if let Some(addr) = listen {
                config.http.listen_addr = addr;
            }
            run_http_server(config).await
        }
        Command::Stdio { validate } => {
            if validate {
                config.mcp.validate_stdio_queries = true;
            }
            run_stdio_server(config).await
        }
    }
}
