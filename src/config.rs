//! Resolves runtime configuration from CLI flags, environment variables, an
//! optional `.env` file, and hard-coded defaults, in that ascending
//! precedence order.

use crate::error::{Error, Result};
use clap::Parser;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8765;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Parser)]
#[command(name = "mcp-runtime", about = "WebSocket tool-call RPC runtime")]
struct Cli {
    #[arg(long, env = "PYMCP_HOST")]
    host: Option<String>,

    #[arg(long, env = "PYMCP_PORT")]
    port: Option<u16>,

    /// Repeatable. Also settable via PYMCP_TOOL_REPOS as a comma-separated list.
    #[arg(long = "tool-repo")]
    tool_repo: Vec<PathBuf>,

    #[arg(long, env = "PYMCP_LOG_LEVEL")]
    log_level: Option<String>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Always includes the bundled core-tools repo ahead of any user repos;
    /// that entry is not itself configurable.
    pub tool_repos: Vec<PathBuf>,
    pub log_level: String,
}

impl Config {
    /// Resolves configuration for the `mcp-runtime` binary: loads an
    /// optional `.env` file, then parses CLI flags (which `clap`'s `env`
    /// attribute already folds environment variables into), applying
    /// defaults for anything left unset.
    pub fn from_env_and_args() -> Result<Self> {
        // Missing .env is not an error; a malformed one is surfaced by dotenvy.
        match dotenvy::dotenv() {
            Ok(_) | Err(dotenvy::Error::Io(_)) => {}
            Err(e) => return Err(Error::Configuration(format!("failed to load .env: {}", e))),
        }

        let cli = Cli::parse();
        Self::from_cli(cli)
    }

    fn from_cli(cli: Cli) -> Result<Self> {
        let host = cli.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.unwrap_or(DEFAULT_PORT);
        let log_level = cli.log_level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let mut tool_repos = cli.tool_repo;
        if tool_repos.is_empty() {
            if let Ok(raw) = std::env::var("PYMCP_TOOL_REPOS") {
                tool_repos = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
        }

        if port == 0 {
            return Err(Error::Configuration("port must be non-zero".into()));
        }

        Ok(Config {
            host,
            port,
            tool_repos,
            log_level,
        })
    }
}
