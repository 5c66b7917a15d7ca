//! The two write phases and their batching discipline.
//!
//! Base rows are inserted batch by batch, strictly in input order across
//! batches; dependent rows accumulate in per-entity queues and are only
//! flushed once every base row of the whole import has an identifier.

use futures::future;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use super::RecordEnvelope;
use crate::db::Backend;
use crate::error::Result;
use crate::flatten::{flatten, flatten_many, FlatRow};
use crate::model::Model;
use crate::schema::CompiledSchema;

/// Partition `items` into contiguous chunks of at most `size`, preserving
/// order. The final chunk may be short. `size` must be non-zero.
pub fn to_batches<T>(items: &[T], size: usize) -> Vec<&[T]> {
    items.chunks(size).collect()
}

/// Per-import staging for dependent rows: one ordered queue per entity,
/// filled during the base phase and drained only by the flush phase.
///
/// Owning the queues here (instead of any process-wide state) keeps imports
/// re-entrant: two concurrent imports cannot see each other's rows.
pub struct WriteQueues {
    fk_column: String,
    queues: IndexMap<String, Vec<FlatRow>>,
}

impl WriteQueues {
    /// One (empty) queue per join table, so an entity with zero occurrences
    /// across the whole input still has a well-defined, no-op flush.
    pub fn new(schema: &CompiledSchema) -> Self {
        WriteQueues {
            fk_column: format!("{}_id", schema.base.name),
            queues: schema
                .joins
                .iter()
                .map(|join| (join.entity.clone(), Vec::new()))
                .collect(),
        }
    }

    /// Append one record's dependent rows, stamping each with the base
    /// row's generated identifier. Call order defines flush order.
    pub fn enqueue(&mut self, base_id: i64, by_entity: IndexMap<String, Vec<FlatRow>>) {
        for (entity, rows) in by_entity {
            let Some(queue) = self.queues.get_mut(&entity) else {
                continue;
            };
            for mut row in rows {
                row.shift_insert(0, self.fk_column.clone(), Value::from(base_id));
                queue.push(row);
            }
        }
    }

    /// Drain the queue for one entity.
    pub fn take(&mut self, entity: &str) -> Vec<FlatRow> {
        self.queues
            .get_mut(entity)
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

/// Drive the three phases against a connected backend.
///
/// The flush phase is a hard barrier behind the base phase: join rows need
/// the identifiers the base phase generates.
pub(super) async fn run(
    backend: &Backend,
    schema: &CompiledSchema,
    model: &Model,
    records: &[RecordEnvelope],
    batch_size: usize,
) -> Result<()> {
    // schema phase: drop-and-recreate base first, then every join table
    backend.recreate_table(&schema.base).await?;
    for join in &schema.joins {
        backend.recreate_table(&join.table).await?;
    }
    info!(base = %schema.base.name, joins = schema.joins.len(), "schema created");

    // base-insertion phase: outer batches run strictly sequentially;
    // records inside one batch fan out concurrently, and the ordered join
    // keeps queue appends in input order regardless of completion order
    let mut queues = WriteQueues::new(schema);
    let batches = to_batches(records, batch_size);
    let batch_count = batches.len();
    for (index, batch) in batches.into_iter().enumerate() {
        info!(batch = index + 1, total = batch_count, "processing batch");
        let ids = future::try_join_all(batch.iter().map(|envelope| async move {
            let row = flatten(&envelope.data, &model.single);
            backend.insert_returning_id(&schema.base, &row).await
        }))
        .await?;
        for (envelope, id) in batch.iter().zip(ids) {
            queues.enqueue(id, flatten_many(&envelope.data, &model.multiple));
        }
    }

    // flush phase: per entity, in the same batch-size chunks
    for join in &schema.joins {
        let rows = queues.take(&join.entity);
        if rows.is_empty() {
            debug!(entity = %join.entity, "no dependent rows queued");
            continue;
        }
        info!(
            entity = %join.entity,
            rows = rows.len(),
            table = %join.table.name,
            "inserting dependent rows"
        );
        for chunk in rows.chunks(batch_size) {
            backend.insert_batch(&join.table, chunk).await?;
        }
    }

    Ok(())
}
