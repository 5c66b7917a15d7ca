//! ingot-import: load hierarchical JSON records into a relational database.
//!
//! Usage:
//!   # JSON array of {"data": ...} envelopes into SQLite
//!   ingot-import records.json --model model.json --table words --system sqlite --path words.db
//!
//!   # NDJSON into Postgres
//!   ingot-import --ndjson records.jsonl --model model.json --table words \
//!       --system postgres --host localhost --user ingot --password secret --database dict
//!
//! The derived tables are dropped and recreated on every run; an import
//! replaces whatever a previous run left behind.

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use ingot::{
    import_records, ConnectionOptions, ImportOptions, Model, RecordEnvelope, DEFAULT_BATCH_SIZE,
};
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ingot-import")]
#[command(about = "Import hierarchical JSON records into a relational database", long_about = None)]
struct Args {
    /// Records file: a JSON array of {"data": ...} envelopes (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Treat input as newline-delimited JSON (one envelope per line)
    #[arg(long)]
    ndjson: bool,

    /// Path to the declarative model JSON file
    #[arg(long, short = 'm')]
    model: String,

    /// Base table name
    #[arg(long, short = 't')]
    table: String,

    /// Database system: sqlite, mysql/maria, or postgres/pg
    #[arg(long)]
    system: String,

    /// Database file path (SQLite)
    #[arg(long)]
    path: Option<String>,

    /// Server host (MySQL/Postgres)
    #[arg(long)]
    host: Option<String>,

    /// Server port (MySQL; defaults to 3306)
    #[arg(long)]
    port: Option<u16>,

    /// Server user
    #[arg(long)]
    user: Option<String>,

    /// Server password
    #[arg(long)]
    password: Option<String>,

    /// Database name
    #[arg(long)]
    database: Option<String>,

    /// Rows per insert batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");

    let args = Args::parse();

    let model_file = std::fs::File::open(&args.model)
        .with_context(|| format!("Failed to open model file: {}", args.model))?;
    let model: Model = serde_json::from_reader(std::io::BufReader::new(model_file))
        .context("Failed to parse model")?;

    let records = read_records(args.input.as_deref(), args.ndjson)?;
    tracing::info!(records = records.len(), "records loaded");

    let connection = ConnectionOptions {
        system: args.system,
        path: args.path,
        host: args.host,
        port: args.port,
        user: args.user,
        password: args.password,
        database: args.database,
    };
    let options = ImportOptions {
        batch_size: args.batch_size,
    };

    import_records(&records, &model, &args.table, &connection, &options).await?;
    tracing::info!("import complete");
    Ok(())
}

/// Global subscriber with an env filter; `RUST_LOG` overrides the default.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Read the records file with SIMD-accelerated parsing when the content is
/// a single JSON document, falling back to line-by-line parsing for NDJSON.
fn read_records(input: Option<&str>, ndjson: bool) -> Result<Vec<RecordEnvelope>> {
    let mut content = Vec::new();
    match input {
        Some(path) => {
            std::fs::File::open(path)
                .with_context(|| format!("Failed to open records file: {path}"))?
                .read_to_end(&mut content)?;
        }
        None => {
            std::io::stdin().read_to_end(&mut content)?;
        }
    }

    if ndjson {
        return parse_ndjson(&content);
    }

    // Try SIMD parsing first (faster); simd-json mutates its input, so give
    // it a scratch copy and keep the original for the NDJSON fallback
    let mut scratch = content.clone();
    match simd_json::from_slice::<Vec<RecordEnvelope>>(&mut scratch) {
        Ok(records) => Ok(records),
        Err(_) => parse_ndjson(&content),
    }
}

fn parse_ndjson(content: &[u8]) -> Result<Vec<RecordEnvelope>> {
    let text = String::from_utf8_lossy(content);
    let mut records = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let envelope: RecordEnvelope =
            serde_json::from_str(line).context("Failed to parse record line")?;
        records.push(envelope);
    }
    Ok(records)
}
