//! airtouch-engine - replay hand-tracking frames through the interaction engine.
//!
//! Reads one s-expression message per line and prints one s-expression
//! per pointer event. Logs go to stderr.

use airtouch_engine::protocol::{self, EventPrinter, Message};
use airtouch_engine::{sexp, Engine, EngineConfig};
use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "airtouch-engine", about = "Touchless pointer engine frame replay")]
struct Cli {
    /// Frame stream to replay (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Engine configuration file (s-expression plist)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the engine status after the stream ends
    #[arg(long)]
    status: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = EngineConfig::from_sexp(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    info!("loaded config from {}", path.display());
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("airtouch-engine {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing; stdout carries the event stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airtouch_engine=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    info!("airtouch-engine v{} starting", env!("CARGO_PKG_VERSION"));

    let mut engine = Engine::new(load_config(cli.config.as_ref())?)?;

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut printer = EventPrinter::new(stdout.lock());
    let mut frames = 0u64;
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("reading input")?;
        let line = line.trim();
        // Blank lines and `;` comments are skipped.
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        match protocol::parse_message(line, engine.config()) {
            Ok(Message::Frame(frame)) => {
                engine.submit_frame_to(&frame, &mut printer);
                printer.take_error().context("writing events")?;
                frames += 1;
            }
            Ok(Message::Config(config)) => {
                let response = match engine.queue_config(config) {
                    Ok(()) => sexp::ok_response(),
                    Err(e) => sexp::error_response(&e.to_string()),
                };
                printer.write_line(&response)?;
            }
            Ok(Message::Status) => printer.write_line(&protocol::status_response(&engine))?,
            Err(e) => {
                warn!("line {}: {}", index + 1, e);
                printer.write_line(&sexp::error_response(&e.to_string()))?;
            }
        }
    }

    if cli.status {
        printer.write_line(&protocol::status_response(&engine))?;
    }
    info!("replayed {} frames, {} events", frames, printer.written());
    Ok(())
}
