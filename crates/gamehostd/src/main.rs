//! Game-hosting orchestrator daemon.
//!
//! Reads console commands from stdin and runs the event loop until
//! `stop` is entered or stdin closes.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin gamehostd
//! cargo run --bin gamehostd -- --workers 8 --save-dir /srv/gamehost/save
//! ```

mod logger;
mod transport;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gamehost::{DaemonBuilder, DaemonConfig, DaemonHandle, GamehostError, ProcessRunner, ScriptRunner};
use gamehost_transport::Transport;

use crate::logger::setup_logger;
use crate::transport::LogTransport;

#[derive(Parser, Debug)]
#[command(name = "gamehostd")]
#[command(about = "Orchestrates a pool of game-hosting worker processes", long_about = None)]
struct Args {
    /// Number of worker slots
    #[arg(short = 'w', long = "workers", default_value_t = 5)]
    worker_count: usize,

    /// Directory for users.save, servers.save and games.save
    #[arg(long, default_value = "save")]
    save_dir: PathBuf,

    /// Directory of *.game template files
    #[arg(long, default_value = "games")]
    games_dir: PathBuf,

    /// Maps and play modes
    #[arg(long, default_value = "config/worlds.yml")]
    worlds_file: PathBuf,

    /// Player id to name cache
    #[arg(long, default_value = "config/players.json")]
    names_file: PathBuf,

    /// Directory holding the setup, start and liveness scripts
    #[arg(long, default_value = "script")]
    script_dir: PathBuf,

    /// Per-worker run directories are created below this one
    #[arg(long, default_value = "run")]
    run_dir: PathBuf,

    /// Worker N listens on base-port + N
    #[arg(long, default_value_t = 2600)]
    base_port: u16,

    /// Worker N is the endpoint <prefix>N
    #[arg(long, default_value = "game")]
    endpoint_prefix: String,

    /// Main loop poll interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_ms: u64,

    /// How long the `sleep` console command pauses, in seconds
    #[arg(long, default_value_t = 10)]
    sleep_secs: u64,

    /// Default log level (overridden by RUST_LOG)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

impl From<Args> for DaemonConfig {
    fn from(args: Args) -> Self {
        Self {
            worker_count: args.worker_count,
            save_dir: args.save_dir,
            games_dir: args.games_dir,
            worlds_file: args.worlds_file,
            names_file: args.names_file,
            script_dir: args.script_dir,
            run_dir: args.run_dir,
            base_port: args.base_port,
            endpoint_prefix: args.endpoint_prefix,
            poll_interval: Duration::from_millis(args.poll_ms),
            sleep_duration: Duration::from_secs(args.sleep_secs),
        }
    }
}

/// Feeds input lines to the console until input closes or the loop goes
/// away, then asks the loop to stop. Runs on its own thread because every
/// command blocks until the loop has executed it.
fn console_reader<T: Transport, P: ProcessRunner>(
    handle: DaemonHandle<T, P>,
    input: impl BufRead,
    mut output: impl Write,
) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "console input failed");
                break;
            }
        };
        match handle.console_blocking(&line) {
            Ok(lines) => {
                for out in lines {
                    let _ = writeln!(output, "{out}");
                }
                let _ = output.flush();
            }
            Err(e) => {
                tracing::debug!(error = %e, "main loop gone");
                return;
            }
        }
    }
    tracing::info!("console input closed; stopping daemon");
    if let Err(e) = handle.stop() {
        tracing::debug!(error = %e, "main loop already gone");
    }
}

#[tokio::main]
async fn main() -> Result<(), GamehostError> {
    let args = Args::parse();
    setup_logger(&args.log_level);

    let config = DaemonConfig::from(args);
    let runner = Arc::new(ScriptRunner::new(config.script_dir.clone()));
    let daemon = DaemonBuilder::new()
        .config(config)
        .build(Arc::new(LogTransport), runner);

    let handle = daemon.handle();
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || console_reader(handle, std::io::stdin().lock(), std::io::stdout()))
        .map_err(|source| gamehost::ProcessError::Spawn {
            program: "console reader".to_string(),
            source,
        })?;

    daemon.run().await
}
