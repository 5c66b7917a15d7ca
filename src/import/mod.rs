//! The import orchestrator and its batched write pipeline.
//!
//! [`import_records`] owns the backend connection for the whole run and
//! sequences the phases: derive the schema, rebuild the tables, insert base
//! rows batch by batch while queueing dependent rows, then flush the queues
//! into the join tables. Any failure aborts the remaining phases; the
//! connection is released on every exit path. Only relational output is
//! supported.

pub mod pipeline;

pub use pipeline::{to_batches, WriteQueues};

use serde::Deserialize;
use serde_json::Value;

use crate::db::{Backend, ConnectionOptions};
use crate::error::{ImportError, Result};
use crate::model::Model;
use crate::schema::compile_schema;

/// Records and rows are written in fixed-size chunks of this many items
/// unless the caller overrides it.
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// One raw hierarchical record as delivered by the reader collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordEnvelope {
    pub data: Value,
}

/// Per-import tuning.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Chunk size applied to both insertion phases. Must be at least 1.
    pub batch_size: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Run a complete import: derive the schema from `model`, rebuild the
/// tables, and load `records` in two batched phases.
///
/// All-or-nothing from the caller's perspective: the first error aborts the
/// remaining phases and propagates unchanged. The run is not wrapped in a
/// backend transaction, so a failure mid-import leaves the freshly rebuilt
/// tables partially populated.
pub async fn import_records(
    records: &[RecordEnvelope],
    model: &Model,
    table_name: &str,
    connection: &ConnectionOptions,
    options: &ImportOptions,
) -> Result<()> {
    if options.batch_size == 0 {
        return Err(ImportError::Validation(
            "batch size must be greater than zero".into(),
        ));
    }

    // both of these fail before any backend I/O
    let resolved = connection.resolve()?;
    let schema = compile_schema(table_name, model)?;

    let backend = Backend::connect(&resolved).await?;
    let result = pipeline::run(&backend, &schema, model, records, options.batch_size).await;
    backend.close().await;
    result
}
