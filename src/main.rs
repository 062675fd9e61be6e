//! `cpmodel-server` - constraint model server over stdio.
//!
//! Reads length-prefixed JSON requests on stdin and writes responses on
//! stdout. Logs go to stderr.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;

use u_cpmodel::config::{ServerConfig, DEFAULT_MAX_FRAME_BYTES};
use u_cpmodel::protocol::{serve, Dispatcher};
use u_cpmodel::session::SolvingSession;
use u_cpmodel::telemetry::init_tracing;

#[derive(Parser)]
#[command(name = "cpmodel-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Constraint model translation server (length-prefixed JSON over stdio)", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set
    #[arg(long, env = "CPMODEL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit JSON-formatted log lines
    #[arg(long, env = "CPMODEL_LOG_JSON")]
    log_json: bool,

    /// Time limit in seconds for solves that do not set one
    #[arg(long, env = "CPMODEL_DEFAULT_TIMEOUT")]
    default_timeout: Option<f64>,

    /// Largest accepted request frame in bytes
    #[arg(long, env = "CPMODEL_MAX_FRAME_BYTES", default_value_t = DEFAULT_MAX_FRAME_BYTES)]
    max_frame_bytes: usize,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        ServerConfig::default()
            .with_log_level(self.log_level)
            .with_log_json(self.log_json)
            .with_default_timeout(self.default_timeout)
            .with_max_frame_bytes(self.max_frame_bytes)
    }
}

fn main() -> Result<()> {
    let config = Cli::parse().into_config();
    init_tracing(config.log_json, &config.log_level);

    let time_limit = config
        .default_time_limit()
        .context("invalid --default-timeout")?;
    let dispatcher =
        Dispatcher::new(SolvingSession::new().with_default_time_limit(time_limit));

    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&dispatcher, stdin.lock(), stdout.lock(), config.max_frame_bytes)
        .context("stdio transport failed")?;
    Ok(())
}
