//! Compiles the declarative model into table definitions.

use indexmap::IndexMap;

use super::{ColumnDef, ColumnType, CompiledSchema, ForeignKey, JoinTable, TableSchema};
use crate::error::{ImportError, Result};
use crate::model::{join_path, sanitize, AttributeTree, Model, MAPPING_KEY};

/// Parse a `"<type>[:<length>]"` spec. `integer` may omit the length
/// (a given length is ignored); `string` requires one.
pub fn parse_type_spec(spec: &str) -> Result<ColumnType> {
    let (ty, length) = match spec.split_once(':') {
        Some((ty, length)) => (ty, Some(length)),
        None => (spec, None),
    };
    match ty {
        "integer" => Ok(ColumnType::Integer),
        "string" => {
            let length = length
                .and_then(|l| l.trim().parse::<u32>().ok())
                .filter(|l| *l > 0)
                .ok_or_else(|| {
                    ImportError::Schema(format!("string column requires a length: `{spec}`"))
                })?;
            Ok(ColumnType::String { length })
        }
        other => Err(ImportError::Schema(format!(
            "unsupported column type `{other}`"
        ))),
    }
}

/// Compile the model into a base table plus one join table per entity.
///
/// Join tables are named `{base}_{entity}` (both parts sanitized) and carry
/// a `{base}_id` foreign-key column referencing the base table's primary
/// key. Leaves under a `mapping` subtree compile to unique columns.
pub fn compile_schema(base_name: &str, model: &Model) -> Result<CompiledSchema> {
    let safe_base = sanitize(base_name);

    let mut base_columns = Vec::new();
    collect_columns(&model.single, "", false, &mut base_columns)?;
    let base = TableSchema {
        name: safe_base.clone(),
        columns: base_columns,
        foreign_key: None,
    };

    let mut joins = Vec::with_capacity(model.multiple.len());
    for (entity, tree) in &model.multiple {
        let attrs = match tree {
            AttributeTree::Node(attrs) => attrs,
            AttributeTree::Leaf(_) => {
                return Err(ImportError::Schema(format!(
                    "entity `{entity}` must map to an attribute tree, not a bare type spec"
                )));
            }
        };

        let fk_column = format!("{safe_base}_id");
        let mut columns = vec![ColumnDef {
            name: fk_column.clone(),
            ty: ColumnType::Integer,
            unique: false,
        }];
        collect_columns(attrs, "", false, &mut columns)?;

        joins.push(JoinTable {
            entity: entity.clone(),
            table: TableSchema {
                name: format!("{safe_base}_{}", sanitize(entity)),
                columns,
                foreign_key: Some(ForeignKey {
                    column: fk_column,
                    parent_table: safe_base.clone(),
                }),
            },
        });
    }

    Ok(CompiledSchema { base, joins })
}

/// Depth-first walk over one attribute tree, pushing a column per leaf.
fn collect_columns(
    attrs: &IndexMap<String, AttributeTree>,
    prefix: &str,
    unique: bool,
    out: &mut Vec<ColumnDef>,
) -> Result<()> {
    for (attr, node) in attrs {
        let path = join_path(prefix, attr);
        match node {
            AttributeTree::Node(children) => {
                collect_columns(children, &path, unique || attr == MAPPING_KEY, out)?;
            }
            AttributeTree::Leaf(spec) => {
                out.push(ColumnDef {
                    name: sanitize(&path),
                    ty: parse_type_spec(spec)?,
                    unique,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(value: serde_json::Value) -> Model {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_one_table_per_entity_plus_base() {
        let model = model(json!({
            "single": {"literal": "string:1"},
            "multiple": {
                "readings": {"reading": "string:50"},
                "meanings": {"meaning": "string:100"}
            }
        }));

        let schema = compile_schema("words", &model).unwrap();
        assert_eq!(schema.table_count(), 3);
        assert_eq!(schema.base.name, "words");
        assert_eq!(schema.joins[0].table.name, "words_readings");
        assert_eq!(schema.joins[1].table.name, "words_meanings");
    }

    #[test]
    fn test_column_count_matches_leaves() {
        let model = model(json!({
            "single": {
                "literal": "string:1",
                "misc": {"grade": "integer", "stroke_count": "integer"}
            },
            "multiple": {"readings": {"reading": "string:50", "kind": "string:10"}}
        }));

        let schema = compile_schema("words", &model).unwrap();
        assert_eq!(schema.base.columns.len(), 3);
        // entity leaves plus the foreign key
        assert_eq!(schema.joins[0].table.columns.len(), 3);
    }

    #[test]
    fn test_nested_paths_become_sanitized_columns() {
        let model = model(json!({
            "single": {"misc": {"stroke count": "integer"}}
        }));

        let schema = compile_schema("Words!", &model).unwrap();
        assert_eq!(schema.base.name, "words_");
        assert_eq!(schema.base.columns[0].name, "misc_stroke_count");
    }

    #[test]
    fn test_join_table_foreign_key() {
        let model = model(json!({
            "multiple": {"tags": {"tag": "string:20"}}
        }));

        let schema = compile_schema("base", &model).unwrap();
        let join = &schema.joins[0];
        assert_eq!(join.entity, "tags");
        assert_eq!(join.table.columns[0].name, "base_id");
        let fk = join.table.foreign_key.as_ref().unwrap();
        assert_eq!(fk.column, "base_id");
        assert_eq!(fk.parent_table, "base");
    }

    #[test]
    fn test_mapping_subtree_leaves_are_unique() {
        let model = model(json!({
            "single": {
                "literal": "string:1",
                "codepoint": {"mapping": {"ucs": "string:8"}}
            }
        }));

        let schema = compile_schema("words", &model).unwrap();
        let literal = &schema.base.columns[0];
        let ucs = &schema.base.columns[1];
        assert!(!literal.unique);
        assert_eq!(ucs.name, "codepoint_mapping_ucs");
        assert!(ucs.unique);
    }

    #[test]
    fn test_type_spec_parsing() {
        assert_eq!(parse_type_spec("integer").unwrap(), ColumnType::Integer);
        assert_eq!(parse_type_spec("integer:10").unwrap(), ColumnType::Integer);
        assert_eq!(
            parse_type_spec("string:50").unwrap(),
            ColumnType::String { length: 50 }
        );
    }

    #[test]
    fn test_unsupported_type_spec_is_schema_error() {
        let model = model(json!({"single": {"flag": "boolean"}}));
        let err = compile_schema("words", &model).unwrap_err();
        assert!(matches!(err, ImportError::Schema(_)));
        assert!(err.to_string().contains("unsupported column type"));
    }

    #[test]
    fn test_string_without_length_is_schema_error() {
        let err = parse_type_spec("string").unwrap_err();
        assert!(matches!(err, ImportError::Schema(_)));
    }

    #[test]
    fn test_bare_leaf_entity_is_schema_error() {
        let model = model(json!({"multiple": {"tags": "string:20"}}));
        let err = compile_schema("words", &model).unwrap_err();
        assert!(matches!(err, ImportError::Schema(_)));
    }
}
