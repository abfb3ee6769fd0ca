use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pathxml::Config;

#[derive(Debug, Parser)]
#[command(
    name = "pathxml",
    version,
    about = "Stream XML as path events or built JSON values"
)]
struct Args {
    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Print one value per occurrence of this dotted path
    #[arg(short, long, value_name = "PATH", conflicts_with = "events")]
    path: Option<String>,
    /// Print the normalized path events instead of built values
    #[arg(short, long)]
    events: bool,
    /// Pretty-print each JSON value
    #[arg(long)]
    pretty: bool,
    /// Trim surrounding whitespace from element text
    #[arg(long)]
    trim: bool,
    /// Keep whitespace-only element text
    #[arg(long)]
    keep_blank: bool,
    /// Maximum element nesting depth (0 means unlimited)
    #[arg(long, value_name = "N", default_value_t = Config::default().max_depth)]
    max_depth: u16,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> Config {
        Config::new(self.max_depth, 0)
            .with_trim_text(self.trim)
            .with_keep_blank_text(self.keep_blank)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();
    let input = read_input(&args.input)?;
    let source = args
        .input
        .as_ref()
        .map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string());
    let config = args.config();
    debug!(len = input.len(), ?config, "read input");

    let mut out = open_output(&args.output)?;
    if args.events {
        for event in pathxml::parse_with_config(&input, config) {
            let event = event
                .with_context(|| format!("failed to read path events from {source}"))?;
            write_json(&mut out, &event, args.pretty)?;
        }
    } else if let Some(path) = &args.path {
        for item in pathxml::items_with_config(&input, path, config) {
            let item = item
                .with_context(|| format!("failed to build item {path} from {source}"))?;
            write_json(&mut out, &item, args.pretty)?;
        }
    } else {
        let events = pathxml::parse_with_config(&input, config);
        let value = pathxml::build::<pathxml::MapBuilder, _>(events)
            .map(pathxml::Value::Object)
            .with_context(|| format!("failed to build document from {source}"))?;
        write_json(&mut out, &value, args.pretty)?;
    }
    out.flush().context("failed to flush output")?;
    Ok(())
}

fn read_input(path: &Option<PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.iter().all(u8::is_ascii_whitespace) {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn open_output(path: &Option<PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to write output file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)
    } else {
        serde_json::to_writer(&mut *out, value)
    }
    .context("failed to encode JSON")?;
    writeln!(out).context("failed to write output")
}
