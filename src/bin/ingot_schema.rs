//! ingot-schema: print the DDL an import would execute, without connecting.
//!
//! Usage:
//!   ingot-schema --model model.json --table words --system postgres

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ingot::db::{create_table_sql, drop_table_sql};
use ingot::{compile_schema, Dialect, Model};

#[derive(Parser, Debug)]
#[command(name = "ingot-schema")]
#[command(about = "Print the DDL derived from a declarative model", long_about = None)]
struct Args {
    /// Path to the declarative model JSON file
    #[arg(long, short = 'm')]
    model: String,

    /// Base table name
    #[arg(long, short = 't')]
    table: String,

    /// Dialect to render for: sqlite, mysql/maria, or postgres/pg
    #[arg(long, default_value = "sqlite")]
    system: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let Some(dialect) = Dialect::from_key(&args.system) else {
        bail!("unknown database system `{}`", args.system);
    };

    let model_file = std::fs::File::open(&args.model)
        .with_context(|| format!("Failed to open model file: {}", args.model))?;
    let model: Model = serde_json::from_reader(std::io::BufReader::new(model_file))
        .context("Failed to parse model")?;

    let schema = compile_schema(&args.table, &model)?;

    let tables = std::iter::once(&schema.base).chain(schema.joins.iter().map(|join| &join.table));
    for table in tables {
        println!("{};", drop_table_sql(table, dialect));
        println!("{};", create_table_sql(table, dialect));
        println!();
    }
    Ok(())
}
