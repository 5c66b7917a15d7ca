//! Flattens one hierarchical record against the model into the flat rows
//! the write pipeline inserts.
//!
//! Two paths: [`flatten`] produces the single base-table row for a record's
//! single-valued attributes, and [`flatten_many`] produces the dependent
//! rows for each multi-valued entity. Both are pure; the foreign key on
//! dependent rows is attached later by the pipeline, once the base row's
//! generated identifier exists.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::model::{join_path, sanitize, AttributeTree};

/// A flat row: sanitized column name to scalar value. Attributes absent
/// from the record are omitted entirely, never nulled.
pub type FlatRow = IndexMap<String, Value>;

/// Flatten a record's single-valued attributes into one base-table row.
pub fn flatten(entry: &Value, attrs: &IndexMap<String, AttributeTree>) -> FlatRow {
    let mut row = FlatRow::new();
    fill_attrs(entry, attrs, "", &mut row);
    row
}

/// Flatten a record's multi-valued entities into per-entity dependent rows.
///
/// The record value under each entity name is treated as a collection; a
/// single non-collection value is coerced to a one-element collection.
/// Object elements flatten against the entity's attribute tree; a bare
/// scalar element lands under the tree's sole top-level attribute.
pub fn flatten_many(
    entry: &Value,
    multiple: &IndexMap<String, AttributeTree>,
) -> IndexMap<String, Vec<FlatRow>> {
    let mut out: IndexMap<String, Vec<FlatRow>> = IndexMap::new();
    let Value::Object(obj) = entry else {
        return out;
    };

    for (entity, tree) in multiple {
        let AttributeTree::Node(attrs) = tree else {
            continue;
        };
        let Some(value) = obj.get(entity) else {
            continue;
        };

        let elements: Vec<&Value> = match value {
            Value::Array(elements) => elements.iter().collect(),
            single => vec![single],
        };

        let rows = out.entry(entity.clone()).or_default();
        for element in elements {
            match element {
                Value::Object(_) => {
                    let mut row = FlatRow::new();
                    fill_attrs(element, attrs, "", &mut row);
                    rows.push(row);
                }
                Value::Array(_) | Value::Null => {}
                scalar => {
                    if let (1, Some((attr, _))) = (attrs.len(), attrs.first()) {
                        let mut row = FlatRow::new();
                        row.insert(sanitize(attr), scalar.clone());
                        rows.push(row);
                    } else {
                        // no unambiguous column for a bare value
                        debug!(entity = %entity, "skipping scalar element for multi-column entity");
                    }
                }
            }
        }
    }
    out
}

/// Depth-first, existence-checked walk of one object against a set of
/// named subtrees.
fn fill_attrs(
    entry: &Value,
    attrs: &IndexMap<String, AttributeTree>,
    prefix: &str,
    row: &mut FlatRow,
) {
    let Value::Object(obj) = entry else { return };
    for (attr, sub) in attrs {
        let Some(item) = obj.get(attr) else { continue };
        fill(item, sub, &join_path(prefix, attr), row);
    }
}

fn fill(entry: &Value, tree: &AttributeTree, prefix: &str, row: &mut FlatRow) {
    match entry {
        Value::Object(_) => {
            if let AttributeTree::Node(attrs) = tree {
                fill_attrs(entry, attrs, prefix, row);
            }
        }
        // collections are the multi-valued path's business, and a null
        // carries no column value
        Value::Array(_) | Value::Null => {}
        scalar => {
            if !prefix.is_empty() {
                row.insert(sanitize(prefix), scalar.clone());
            }
        }
    }
}
