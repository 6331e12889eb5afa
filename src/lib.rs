//! Diki Records
//!
//! Schema-validated assembly of records scraped from a bilingual dictionary.
//! Page walkers hand field values to a [`Builder`] one at a time as they
//! find them; the builder checks each value against the record's
//! [`Schema`] and only produces a [`Record`] once every required field is
//! in place.
//!
//! ## Features
//!
//! - **Write-once scalars**: a second write to a scalar field is an error,
//!   never a silent replacement
//! - **Ordered lists and de-duplicated sets** per field cardinality
//! - **Empty-value suppression**: empty text and empty collections are
//!   ignored instead of polluting optional fields
//! - **Catalogs**: the built-in dictionary record types, or schemas loaded
//!   from TOML/JSON files
//! - **Ingestion**: stored JSON records re-validated against a catalog
//!
//! ## Example
//!
//! ```
//! use diki_records::{dictionary, Value};
//!
//! let catalog = dictionary::catalog().unwrap();
//! let mut term = catalog.builder(dictionary::TERM).unwrap();
//! term.put("value", "do").unwrap();
//! let record = term.build().unwrap();
//! assert_eq!(record.get("value"), Some(&Value::from("do")));
//! ```

pub mod builder;
pub mod catalog;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod ingest;
pub mod lint;
pub mod schema;
pub mod value;

pub use builder::Builder;
pub use catalog::Catalog;
pub use config::RecordsConfig;
pub use error::{BuildError, Error, IngestError, Result, SchemaError};
pub use ingest::Ingestor;
pub use schema::{Cardinality, FieldDecl, FieldSpec, Primitive, Schema, ShapeDescriptor, TypeDecl};
pub use value::{Record, Value, ValueKind};
