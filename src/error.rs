//! Error types for schema definition, record assembly and ingestion

use thiserror::Error;

use crate::value::ValueKind;

/// Result type for catalog and ingestion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while assembling a single record.
///
/// None of these are recovered inside the builder. A rejected `put` leaves
/// the builder untouched, so the caller decides whether to carry on, drop
/// the record or start over.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("key {field} is not defined for schema {schema}")]
    UnknownField { schema: String, field: String },

    #[error("wrong type of value supplied for {schema}.{field}: expected one of [{expected}], got {actual}")]
    TypeMismatch {
        schema: String,
        field: String,
        expected: String,
        actual: ValueKind,
    },

    #[error("field {schema}.{field} is already set, overwriting is not allowed")]
    Overwrite { schema: String, field: String },

    #[error("missing {field} in {schema} builder, cannot build the record")]
    MissingRequiredField { schema: String, field: String },
}

impl BuildError {
    /// The field the error refers to
    pub fn field(&self) -> &str {
        match self {
            BuildError::UnknownField { field, .. }
            | BuildError::TypeMismatch { field, .. }
            | BuildError::Overwrite { field, .. }
            | BuildError::MissingRequiredField { field, .. } => field,
        }
    }
}

/// Misconfigured schema declarations, detected when a schema is defined
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unsupported container {wrapper}<..> on {schema}.{field}, only list and set are allowed")]
    UnsupportedContainer {
        schema: String,
        field: String,
        wrapper: String,
    },

    #[error("empty union declared on {schema}.{field}")]
    EmptyUnion { schema: String, field: String },

    #[error("field {field} declared twice in schema {schema}")]
    DuplicateField { schema: String, field: String },

    #[error("schema {0} is already defined in the catalog")]
    DuplicateSchema(String),

    #[error("{schema}.{field} references undefined schema {reference}")]
    UnknownReference {
        schema: String,
        field: String,
        reference: String,
    },

    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("invalid type expression: {0:?}")]
    InvalidType(String),
}

/// Errors raised while turning a stored document back into a record
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("at {path}: {source}")]
    Build {
        path: String,
        #[source]
        source: BuildError,
    },

    #[error("at {path}: unsupported JSON value ({kind})")]
    UnsupportedJson { path: String, kind: &'static str },

    #[error("at {path}: expected a JSON object for schema {schema}")]
    NotAnObject { path: String, schema: String },

    #[error("schema not found: {0}")]
    UnknownSchema(String),

    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema not found: {0}")]
    UnknownSchema(String),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Unsupported catalog file: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}
