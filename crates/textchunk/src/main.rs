//! Main entry point for the textchunk command-line tool

// Internal modules
mod cli;
mod logging;

// Internal imports (std, crate)
use crate::cli::Args;
use std::io::Write;
use std::process::ExitCode;

// External imports (alphabetized)
use anyhow::{Context, Result};
use clap::Parser;
use textchunk_common::{CommonError, ErrorKind, initialize_environment};
use textchunk_config::ConfigError;
use textchunk_parsing::{ChunkOutput, ChunkingService, ParsingError, StructuredTable};
use tracing::{debug, error};

fn main() -> ExitCode {
    initialize_environment();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args
        .load_config()
        .context("Failed to load configuration")?;

    // Guards flush the non-blocking writers when dropped at the end of run()
    let _guards = logging::init_logging(&config.logging)?;
    debug!(?config, "Loaded configuration");

    let text = read_input(args)?;
    let service = ChunkingService::new(config.chunking)?;
    let output = service.chunk(&text).inspect_err(|e| error!("Chunking failed: {e}"))?;

    write_output(&output, args.pretty)
}

/// Input text, rendered from a JSON table when `--table-json` is set
fn read_input(args: &Args) -> Result<String> {
    let raw = match args.input_path() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?,
        None => std::io::read_to_string(std::io::stdin().lock()).context("Failed to read stdin")?,
    };
    if !args.table_json {
        return Ok(raw);
    }

    let value: serde_json::Value =
        serde_json::from_str(&raw).context("Table input is not valid JSON")?;
    let table = StructuredTable::from_json(&value)?;
    debug!(rows = table.rows.len(), "Rendered JSON table as markdown");
    Ok(table.to_markdown())
}

fn write_output(output: &ChunkOutput, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").context("Failed to write output")?;
    Ok(())
}

/// Process exit code for a failure, by the kind of its root error
fn exit_code(err: &anyhow::Error) -> u8 {
    let kind = if let Some(e) = err.downcast_ref::<ParsingError>() {
        e.kind()
    } else if let Some(e) = err.downcast_ref::<ConfigError>() {
        e.kind()
    } else if err.downcast_ref::<serde_json::Error>().is_some() {
        ErrorKind::InvalidInput
    } else if err.downcast_ref::<std::io::Error>().is_some() {
        ErrorKind::Io
    } else {
        ErrorKind::Internal
    };
    kind.exit_code()
}
