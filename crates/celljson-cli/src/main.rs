//! `cellj` CLI — validate, canonicalize, pretty-print and inspect JSON
//! documents from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Validate a world save (stdin → stdout)
//! cat world.json | cellj check
//!
//! # Re-emit canonical compact bytes, file to file
//! cellj canon -i world.json -o world.min.json
//!
//! # Indented output for reading
//! cellj pretty -i world.json
//!
//! # Node counts per kind and nesting depth
//! cellj stats -i world.json
//!
//! # Allow deeper documents than the default bound of 7
//! cellj --max-depth 16 check -i deep.json
//! ```
//!
//! Set `RUST_LOG=debug` to see load/save events on stderr.

use anyhow::{Context, Result};
use celljson::{Kind, ParseOptions, Value, MAX_DEPTH};
use clap::{Parser, Subcommand};
use std::io::{self, Read, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cellj",
    version,
    about = "Depth-bounded JSON validator and canonicalizer"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Maximum container nesting accepted by the parser (at most 256; the
    /// parser recurses once per level)
    #[arg(long, global = true, default_value_t = MAX_DEPTH, value_parser = parse_max_depth)]
    max_depth: usize,
}

/// Upper bound for `--max-depth`, keeping parser recursion well inside the
/// main thread's stack.
const DEPTH_LIMIT: usize = 256;

fn parse_max_depth(arg: &str) -> std::result::Result<usize, String> {
    let depth: usize = arg.parse().map_err(|e| format!("{e}"))?;
    if depth > DEPTH_LIMIT {
        return Err(format!("must be at most {DEPTH_LIMIT}"));
    }
    Ok(depth)
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the input and report its root kind and node count
    Check {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Re-emit the input as canonical compact JSON
    Canon {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Re-emit the input as indented JSON
    Pretty {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show size, node counts per kind and maximum nesting depth
    Stats {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let options = ParseOptions::default().with_max_depth(cli.max_depth);

    match cli.command {
        Commands::Check { input } => {
            let bytes = read_input(input.as_deref())?;
            let doc = parse_input(&bytes, options, input.as_deref())?;
            let stats = Stats::of(&doc);
            println!("ok: {} with {} nodes", doc.kind(), stats.nodes());
        }
        Commands::Canon { input, output } => {
            let bytes = read_input(input.as_deref())?;
            let doc = parse_input(&bytes, options, input.as_deref())?;
            let canonical = celljson::to_vec(&doc).context("Failed to serialize document")?;
            write_output(output.as_deref(), &canonical)?;
        }
        Commands::Pretty { input, output } => {
            let bytes = read_input(input.as_deref())?;
            let doc = parse_input(&bytes, options, input.as_deref())?;
            let mut pretty =
                serde_json::to_string_pretty(&doc).context("Failed to pretty-print document")?;
            pretty.push('\n');
            write_output(output.as_deref(), pretty.as_bytes())?;
        }
        Commands::Stats { input } => {
            let bytes = read_input(input.as_deref())?;
            let doc = parse_input(&bytes, options, input.as_deref())?;
            let stats = Stats::of(&doc);
            println!("Input size:     {} bytes", bytes.len());
            println!("Canonical size: {} bytes", celljson::size(&doc));
            println!("Max depth:      {}", stats.max_depth);
            for (kind, count) in stats.by_kind() {
                println!("{:<15} {}", format!("{kind}:"), count);
            }
        }
    }

    Ok(())
}

/// Node counts per kind plus the deepest container nesting seen.
#[derive(Debug, Default, PartialEq)]
struct Stats {
    null: usize,
    boolean: usize,
    integer: usize,
    real: usize,
    string: usize,
    array: usize,
    object: usize,
    max_depth: usize,
}

impl Stats {
    fn of(value: &Value) -> Self {
        let mut stats = Stats::default();
        stats.visit(value, 0);
        stats
    }

    fn visit(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.null += 1,
            Value::Boolean(_) => self.boolean += 1,
            Value::Integer(_) => self.integer += 1,
            Value::Real(_) => self.real += 1,
            Value::String(_) => self.string += 1,
            Value::Array(items) => {
                self.array += 1;
                self.max_depth = self.max_depth.max(depth + 1);
                for item in items {
                    self.visit(item, depth + 1);
                }
            }
            Value::Object(members) => {
                self.object += 1;
                self.max_depth = self.max_depth.max(depth + 1);
                for (_, member) in members {
                    self.visit(member, depth + 1);
                }
            }
        }
    }

    fn by_kind(&self) -> [(Kind, usize); 7] {
        [
            (Kind::Null, self.null),
            (Kind::Boolean, self.boolean),
            (Kind::Integer, self.integer),
            (Kind::Real, self.real),
            (Kind::String, self.string),
            (Kind::Array, self.array),
            (Kind::Object, self.object),
        ]
    }

    fn nodes(&self) -> usize {
        self.by_kind().iter().map(|(_, n)| n).sum()
    }
}

fn parse_input(bytes: &[u8], options: ParseOptions, path: Option<&str>) -> Result<Value> {
    let source = path.unwrap_or("<stdin>");
    let doc = celljson::parse_with(bytes, options)
        .with_context(|| format!("Failed to parse {source}"))?;
    debug!(source, bytes = bytes.len(), kind = %doc.kind(), "parsed document");
    Ok(doc)
}

fn read_input(path: Option<&str>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read file: {path}")),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {path}"))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(content)
                .and_then(|()| stdout.flush())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
