//! # Ingot - model-driven relational import
//!
//! A library for melting hierarchical JSON records into a relational schema
//! derived on the fly from a declarative model, then bulk-loading the rows
//! in fixed-size batches: base rows first, dependent join rows once their
//! foreign keys are known.
//!
//! ## Modules
//!
//! - **model**: the declarative attribute model and identifier sanitizer
//! - **schema**: compiles the model into table definitions
//! - **flatten**: flattens one record into base and join rows
//! - **db**: dialect selection, connection handling, SQL generation
//! - **import**: the batched two-phase write pipeline and its orchestrator
//!
//! ## Quick Start
//!
//! ### Schema compilation
//!
//! ```rust
//! use ingot::{compile_schema, Model};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let model: Model = serde_json::from_value(json!({
//!     "single": {"name": "string:50"},
//!     "multiple": {"tags": {"tag": "string:20"}}
//! }))?;
//!
//! let schema = compile_schema("base", &model)?;
//! assert_eq!(schema.base.name, "base");
//! assert_eq!(schema.joins[0].table.name, "base_tags");
//! # Ok(())
//! # }
//! ```
//!
//! ### Importing
//!
//! ```rust,no_run
//! use ingot::{import_records, ConnectionOptions, ImportOptions, Model, RecordEnvelope};
//! use serde_json::json;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let model: Model = serde_json::from_value(json!({
//!     "single": {"name": "string:50"},
//!     "multiple": {"tags": {"tag": "string:20"}}
//! }))?;
//! let records = vec![RecordEnvelope {
//!     data: json!({"name": "fox", "tags": ["quick", "brown"]}),
//! }];
//!
//! let connection = ConnectionOptions {
//!     system: "sqlite".into(),
//!     path: Some("import.db".into()),
//!     ..Default::default()
//! };
//! import_records(&records, &model, "base", &connection, &ImportOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod error;
pub mod flatten;
pub mod import;
pub mod model;
pub mod schema;

// Re-export commonly used types for convenience
pub use db::{Backend, ConnectionOptions, Dialect};
pub use error::ImportError;
pub use flatten::{flatten, flatten_many, FlatRow};
pub use import::{import_records, ImportOptions, RecordEnvelope, DEFAULT_BATCH_SIZE};
pub use model::{sanitize, AttributeTree, Model};
pub use schema::{compile_schema, CompiledSchema, TableSchema};
