//! div-demo: runs the example divisions.
//!
//! ```text
//! div-demo start                 # start every division, clean up on Ctrl+C
//! div-demo div hello greet Ann   # run a division command
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use division_runtime::{run_division_cli, start_divisions, CleanupOrder, DivisionsOptions};
use division_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "div-demo")]
#[command(about = "Run the example divisions", long_about = None)]
#[command(version)]
struct Cli {
    /// Divisions directory (defaults to the bundled examples)
    #[arg(long, env = "DIVISIONS_PATH")]
    divisions: Option<PathBuf>,

    /// Env file merged under the process environment
    #[arg(long, env = "DIVISIONS_ENV_PATH")]
    env_file: Option<PathBuf>,

    /// Cleanup order: forward or reverse
    #[arg(long, env = "DIVISIONS_CLEANUP_ORDER", default_value = "forward")]
    cleanup_order: CleanupOrder,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Start every division and wait for Ctrl+C or SIGTERM
    Start,
    /// Run a command exposed by a division
    Div {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

impl Cli {
    fn options(&self) -> DivisionsOptions {
        let mut options = DivisionsOptions::new()
            .with_divisions_path(
                self.divisions
                    .clone()
                    .unwrap_or_else(division_demo::divisions_dir),
            )
            .with_cleanup_order(self.cleanup_order);

        if let Some(env_file) = &self.env_file {
            options = options.with_env_path(env_file);
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _telemetry = init_telemetry(&TelemetryConfig::from_env())?;

    let catalog = division_demo::catalog();
    let options = cli.options();

    match cli.command {
        Mode::Start => {
            let running = start_divisions(options, &catalog).await?;
            info!("Divisions running. Press Ctrl+C to stop.");
            let signal = running.wait_for_shutdown().await?;
            info!(?signal, "Divisions stopped");
            // Report the signal the way a default handler would have
            Ok(ExitCode::from(signal.exit_status()))
        }
        Mode::Div { args } => {
            let argv = std::iter::once("div".to_string()).chain(args);
            run_division_cli(options, &catalog, argv).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
