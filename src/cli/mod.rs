//! cli
//!
//! Command-line interface layer for tfi.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Layer flags over configuration files into [`RunOptions`]
//! - Hand the run to the engine
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`crate::engine`] for execution. No file is read or written here apart
//! from configuration loading.

pub mod args;

pub use args::Cli;

use anyhow::Result;
use tracing::debug;

use crate::core::config::Config;
use crate::engine::{self, RunContext, RunError, RunOptions, Services};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`, which parses the
/// arguments first so logging can be configured from them.
pub fn run(cli: &Cli) -> Result<()> {
    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    let options = resolve_options(cli, &ctx)?;
    debug!(
        var_file = %options.var_file.display(),
        region = %options.region,
        backend_mode = %options.backend_mode,
        "resolved run options"
    );

    let services = Services::from_env(&options);
    let run_ctx = RunContext::new(options, services);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| RunError::Io(format!("cannot start async runtime: {}", e)))?;
    let report = runtime.block_on(engine::run(&run_ctx))?;

    debug!(
        environment = %report.environment,
        written = report.merge.written.len(),
        "run complete"
    );
    Ok(())
}

/// Load configuration for the working directory and apply flags over it.
pub fn resolve_options(cli: &Cli, ctx: &engine::Context) -> Result<RunOptions, RunError> {
    let workdir = ctx.workdir()?;
    let config = Config::load(Some(&workdir))?;
    cli.to_options(&config, &workdir)
}
