//! The declarative import model: which attributes are single-valued columns
//! on the base table, which are multi-valued entities with join tables of
//! their own, and how raw attribute names become safe SQL identifiers.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Characters that may not appear in a table or column identifier.
static UNSAFE_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]").unwrap());

/// Reserved attribute key: leaves under a subtree with this name get a
/// uniqueness constraint.
pub const MAPPING_KEY: &str = "mapping";

/// Normalize an arbitrary attribute or table name into the safe identifier
/// alphabet `[a-z0-9_]`: lower-case, then replace everything else with `_`.
///
/// Idempotent: sanitizing an already-safe name returns it unchanged.
pub fn sanitize(name: &str) -> String {
    UNSAFE_IDENT
        .replace_all(&name.to_lowercase(), "_")
        .into_owned()
}

/// Join a parent path and an attribute name with `.` before sanitization, so
/// distinct attribute paths always map to distinct column names.
pub fn join_path(prefix: &str, attr: &str) -> String {
    if prefix.is_empty() {
        attr.to_string()
    } else {
        format!("{prefix}.{attr}")
    }
}

/// One node of an attribute tree.
///
/// A leaf holds the raw `"<type>[:<length>]"` spec string as written in the
/// model file; it is validated during schema compilation, not at parse time.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AttributeTree {
    Leaf(String),
    Node(IndexMap<String, AttributeTree>),
}

impl AttributeTree {
    /// Number of leaf columns this subtree contributes.
    pub fn leaf_count(&self) -> usize {
        match self {
            AttributeTree::Leaf(_) => 1,
            AttributeTree::Node(children) => children.values().map(AttributeTree::leaf_count).sum(),
        }
    }
}

/// The import model: every leaf of `single` becomes a base-table column,
/// every entry of `multiple` becomes a join table keyed back to the base row.
///
/// Attribute order is preserved from the model file, so column order in the
/// derived schema is deterministic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub single: IndexMap<String, AttributeTree>,
    #[serde(default)]
    pub multiple: IndexMap<String, AttributeTree>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_alphabet() {
        for input in ["reading.ja_on", "Meaning (en)", "r@d!ng", "漢字", "a b\tc"] {
            let out = sanitize(input);
            assert!(
                out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "sanitize({input:?}) produced unsafe output {out:?}"
            );
        }
    }

    #[test]
    fn test_sanitize_safe_input_unchanged() {
        assert_eq!(sanitize("already_safe_123"), "already_safe_123");
    }

    #[test]
    fn test_sanitize_case_folds() {
        assert_eq!(sanitize("Literal"), "literal");
    }

    #[test]
    fn test_sanitize_idempotent() {
        let once = sanitize("codepoint.ucs-16!");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "literal"), "literal");
        assert_eq!(join_path("reading", "ja_on"), "reading.ja_on");
    }

    #[test]
    fn test_model_from_json() {
        let model: Model = serde_json::from_value(json!({
            "single": {
                "literal": "string:1",
                "misc": {"grade": "integer", "stroke_count": "integer"}
            },
            "multiple": {
                "readings": {"reading": "string:50"}
            }
        }))
        .unwrap();

        assert_eq!(model.single.len(), 2);
        assert!(matches!(model.single["literal"], AttributeTree::Leaf(_)));
        assert!(matches!(model.single["misc"], AttributeTree::Node(_)));
        assert_eq!(model.single["misc"].leaf_count(), 2);
        assert_eq!(model.multiple.len(), 1);
    }

    #[test]
    fn test_model_sections_default_empty() {
        let model: Model = serde_json::from_value(json!({})).unwrap();
        assert!(model.single.is_empty());
        assert!(model.multiple.is_empty());
    }
}
