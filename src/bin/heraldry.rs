//! Command-line front end for the codec and the static catalog.
//!
//! `decode` reads an NDJSON stream (or a JSON array), decodes each value with
//! the builtin types plus an optional catalog, and prints it re-encoded.
//! `catalog` loads a catalog document and prints every member as tagged JSON.
//! `check` validates encoded values against the wire schema.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use heraldry::{
    CodecOptions, Datum, Encoder, StaticRegistry, TypeRegistry, TypeSource, WireSchema,
    decode_json_stream, load_catalog_from_path, parse_json_stream,
};
use serde_json::Value;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, debug, warn};
use tracing_subscriber::EnvFilter;

/// Self-describing JSON codec.
#[derive(Parser)]
#[command(name = "heraldry", about = "Self-describing JSON codec", version)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a stream and print each value re-encoded.
    Decode(DecodeArgs),
    /// Load a catalog document and print its members.
    Catalog {
        /// Catalog document to load.
        #[arg(long)]
        file: PathBuf,
    },
    /// Validate encoded values against the wire schema.
    Check {
        /// Input file; stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Args)]
struct DecodeArgs {
    /// Input file; stdin when omitted.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Keys are snake_case on the wire; skip camelCase conversion.
    #[arg(long)]
    snake_keys: bool,

    /// Print values without `$module`/`$type` tags.
    #[arg(long)]
    no_tags: bool,

    /// Catalog document whose members may appear in the stream.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    match run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("heraldry={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command) -> Result<i32> {
    match command {
        Command::Decode(args) => run_decode(args),
        Command::Catalog { file } => run_catalog(&file),
        Command::Check { file } => run_check(file.as_deref()),
    }
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("reading stdin")?;
            Ok(input)
        }
    }
}

fn run_decode(args: DecodeArgs) -> Result<i32> {
    let mut options = CodecOptions::from_env();
    if args.snake_keys {
        options = options.snake_keys();
    }

    let mut types = TypeRegistry::with_builtins();
    if let Some(path) = &args.catalog {
        let catalog = Arc::new(StaticRegistry::new());
        let categories = load_catalog_from_path(path, &catalog, &options)?;
        debug!(categories = categories.len(), "catalog loaded");
        types.attach(catalog as Arc<dyn TypeSource>);
    }

    let input = read_input(args.file.as_deref())?;
    let values = decode_json_stream(&input, &types, &options)?;

    let output_options = if args.no_tags {
        options.untagged()
    } else {
        options
    };
    let mut encoder = Encoder::new(output_options);
    print_encoded(&mut encoder, &values)?;
    Ok(0)
}

fn run_catalog(file: &Path) -> Result<i32> {
    let options = CodecOptions::from_env();
    let registry = Arc::new(StaticRegistry::new());
    load_catalog_from_path(file, &registry, &options)?;

    let members: Vec<Datum> = registry
        .categories()
        .iter()
        .flat_map(|category| category.members())
        .map(Datum::Member)
        .collect();
    if members.is_empty() {
        warn!(file = %file.display(), "catalog defines no members");
    }
    let mut encoder = Encoder::new(options);
    print_encoded(&mut encoder, &members)?;
    Ok(0)
}

fn run_check(file: Option<&Path>) -> Result<i32> {
    let schema = WireSchema::load()?;
    let input = read_input(file)?;
    let values = parse_json_stream(&input)?;

    let mut failures = 0usize;
    for (idx, value) in values.iter().enumerate() {
        if let Err(violations) = schema.validate(value) {
            failures += 1;
            for violation in violations {
                println!("value {}: {violation}", idx + 1);
            }
        }
    }
    if failures > 0 {
        eprintln!(
            "{failures} of {} values failed {}",
            values.len(),
            schema.schema_version
        );
        return Ok(1);
    }
    debug!(values = values.len(), "all values passed the wire schema");
    Ok(0)
}

fn print_encoded(encoder: &mut Encoder, values: &[Datum]) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for datum in values {
        let value: Value = encoder.encode(datum)?;
        serde_json::to_writer(&mut out, &value)?;
        writeln!(out)?;
    }
    for diagnostic in encoder.take_diagnostics() {
        eprintln!("warning: {}", diagnostic.message);
    }
    Ok(())
}
