//! CLI entry point: resolve configuration, initialize logging, run the
//! server until `Ctrl-C`, then shut down gracefully.

use mcp_runtime::config::Config;
use mcp_runtime::logging;
use mcp_runtime::server::ServerHandle;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env_and_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return ExitCode::from(1);
        }
    };

    logging::init(&config.log_level);

    let handle = match ServerHandle::start(config) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            return ExitCode::from(1);
        }
    };

    let interrupted = tokio::signal::ctrl_c().await.is_ok();
    if interrupted {
        tracing::info!("received interrupt, shutting down");
    }
    handle.stop();

    match handle.wait_closed().await {
        Ok(()) => {
            if interrupted {
                ExitCode::from(130)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "server exited with an error");
            ExitCode::from(1)
        }
    }
}
