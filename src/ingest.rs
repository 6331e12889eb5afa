//! Re-validate stored JSON documents against a catalog
//!
//! Stored records are plain JSON, so an array could be a list field or a
//! set field and an object could be any record. The schema settles it:
//! arrays on collection fields are put one element at a time, objects on
//! fields with nested shapes are built against those schemas. Anything
//! else is converted as-is and left to the builder's type check.

use serde_json::Value as Json;
use tracing::debug;

use crate::builder::Builder;
use crate::catalog::Catalog;
use crate::error::IngestError;
use crate::schema::{Cardinality, FieldSpec, ShapeDescriptor};
use crate::value::{Record, Value};

/// Walks JSON documents into records of a catalog
pub struct Ingestor<'c> {
    catalog: &'c Catalog,
}

impl<'c> Ingestor<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Build a `schema` record from a JSON object
    pub fn ingest(&self, schema: &str, doc: &Json) -> Result<Record, IngestError> {
        self.ingest_at(schema, doc, "$")
    }

    pub fn ingest_str(&self, schema: &str, content: &str) -> Result<Record, IngestError> {
        let doc: Json = serde_json::from_str(content)?;
        self.ingest(schema, &doc)
    }

    fn ingest_at(&self, schema_name: &str, doc: &Json, path: &str) -> Result<Record, IngestError> {
        let schema = self
            .catalog
            .get(schema_name)
            .ok_or_else(|| IngestError::UnknownSchema(schema_name.to_string()))?;
        let object = doc.as_object().ok_or_else(|| IngestError::NotAnObject {
            path: path.to_string(),
            schema: schema_name.to_string(),
        })?;

        let mut builder = Builder::new(schema);
        for (key, json) in object {
            let field_path = format!("{}.{}", path, key);
            let spec = schema.field(key);

            match (spec, json) {
                (Some(spec), Json::Array(items)) if spec.cardinality != Cardinality::Scalar => {
                    for (i, item) in items.iter().enumerate() {
                        let item_path = format!("{}[{}]", field_path, i);
                        let value = self.convert(spec, item, &item_path)?;
                        put(&mut builder, key, value, &item_path)?;
                    }
                }
                (Some(spec), json) => {
                    let value = self.convert(spec, json, &field_path)?;
                    put(&mut builder, key, value, &field_path)?;
                }
                // unknown key: let the builder report it
                (None, json) => {
                    let value = structural(json, &field_path)?;
                    put(&mut builder, key, value, &field_path)?;
                }
            }
        }

        debug!(schema = schema_name, path, "ingested document");
        builder.build().map_err(|source| IngestError::Build {
            path: path.to_string(),
            source,
        })
    }

    fn convert(&self, spec: &FieldSpec, json: &Json, path: &str) -> Result<Value, IngestError> {
        // `{}` stays an empty record so `put` suppresses it like any empty value
        if json.as_object().is_some_and(|object| object.is_empty()) {
            return Ok(Value::Record(Record::default()));
        }
        if json.is_object() {
            let mut failure = None;
            for shape in &spec.allowed {
                if let ShapeDescriptor::Nested(name) = shape {
                    match self.ingest_at(name, json, path) {
                        Ok(record) => return Ok(Value::Record(record)),
                        Err(err) => failure = Some(err),
                    }
                }
            }
            if let Some(err) = failure {
                return Err(err);
            }
        }
        structural(json, path)
    }
}

fn put(builder: &mut Builder<'_>, field: &str, value: Value, path: &str) -> Result<(), IngestError> {
    builder.put(field, value).map_err(|source| IngestError::Build {
        path: path.to_string(),
        source,
    })
}

/// Schema-less conversion
fn structural(json: &Json, path: &str) -> Result<Value, IngestError> {
    Ok(match json {
        Json::Null => {
            return Err(IngestError::UnsupportedJson {
                path: path.to_string(),
                kind: "null",
            })
        }
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => match n.as_i64() {
            Some(n) => Value::Integer(n),
            None => {
                return Err(IngestError::UnsupportedJson {
                    path: path.to_string(),
                    kind: if n.is_u64() {
                        "integer out of range"
                    } else {
                        "non-integer number"
                    },
                })
            }
        },
        Json::String(s) => Value::Text(s.clone()),
        Json::Array(items) => Value::List(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| structural(item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Json::Object(object) => Value::Record(
            object
                .iter()
                .map(|(key, item)| -> Result<(String, Value), IngestError> {
                    Ok((key.clone(), structural(item, &format!("{}.{}", path, key))?))
                })
                .collect::<Result<Record, IngestError>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;
    use crate::error::BuildError;
    use serde_json::json;

    #[test]
    fn test_ingest_nested_lists() {
        let catalog = dictionary::catalog().unwrap();
        let ingestor = Ingestor::new(&catalog);
        let doc = json!({
            "type": "synonym",
            "terms": [
                { "value": "make" },
                { "value": "perform", "recordings_and_transcriptions": {
                    "recordings": [{ "lang": "en", "url": "perform.mp3" }]
                } }
            ]
        });

        let record = ingestor.ingest(dictionary::REF, &doc).unwrap();
        let terms = record.get("terms").and_then(Value::as_list).unwrap();
        assert_eq!(terms.len(), 2);
        let second = terms[1].as_record().unwrap();
        assert!(second.contains("recordings_and_transcriptions"));
    }

    #[test]
    fn test_ingest_reports_path_of_missing_field() {
        let catalog = dictionary::catalog().unwrap();
        let ingestor = Ingestor::new(&catalog);
        let doc = json!({
            "type": "synonym",
            "terms": [
                { "value": "make" },
                { "recordings_and_transcriptions": { "transcriptions": ["make.png"] } }
            ]
        });

        let err = ingestor.ingest(dictionary::REF, &doc).unwrap_err();
        match err {
            IngestError::Build { path, source } => {
                assert_eq!(path, "$.terms[1]");
                assert!(matches!(source, BuildError::MissingRequiredField { ref field, .. } if field == "value"));
            }
            other => panic!("Expected Build error, got {:?}", other),
        }
    }

    #[test]
    fn test_ingest_rejects_unknown_key() {
        let catalog = dictionary::catalog().unwrap();
        let ingestor = Ingestor::new(&catalog);
        let doc = json!({ "value": "do", "colour": "red" });

        let err = ingestor.ingest(dictionary::TERM, &doc).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Build { source: BuildError::UnknownField { .. }, .. }
        ));
    }

    #[test]
    fn test_ingest_type_mismatch_and_unsupported() {
        let catalog = dictionary::catalog().unwrap();
        let ingestor = Ingestor::new(&catalog);

        let err = ingestor
            .ingest(dictionary::ADDITIONAL_INFORMATION, &json!({ "popularity": "high" }))
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Build { source: BuildError::TypeMismatch { .. }, .. }
        ));

        let err = ingestor
            .ingest(dictionary::ADDITIONAL_INFORMATION, &json!({ "popularity": 2.5 }))
            .unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedJson { kind: "non-integer number", .. }));

        let err = ingestor
            .ingest(dictionary::ADDITIONAL_INFORMATION, &json!({ "popularity": u64::MAX }))
            .unwrap_err();
        match err {
            IngestError::UnsupportedJson { path, kind } => {
                assert_eq!(path, "$.popularity");
                assert_eq!(kind, "integer out of range");
            }
            other => panic!("Expected UnsupportedJson error, got {:?}", other),
        }
    }

    #[test]
    fn test_ingest_scalar_field_given_array() {
        let catalog = dictionary::catalog().unwrap();
        let ingestor = Ingestor::new(&catalog);
        let err = ingestor
            .ingest(dictionary::TERM, &json!({ "value": ["do", "make"] }))
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Build { source: BuildError::TypeMismatch { actual: crate::value::ValueKind::List, .. }, .. }
        ));
    }

    #[test]
    fn test_ingest_drops_empty_records() {
        let catalog = dictionary::catalog().unwrap();
        let ingestor = Ingestor::new(&catalog);
        let record = ingestor
            .ingest(dictionary::TERM, &json!({ "value": "do", "recordings_and_transcriptions": {} }))
            .unwrap();
        assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["value"]);
    }

    #[test]
    fn test_ingest_empty_object_skipped_even_with_required_fields() {
        let catalog = dictionary::catalog().unwrap();
        let ingestor = Ingestor::new(&catalog);
        let doc = json!({ "type": "synonym", "terms": [{ "value": "make" }, {}] });

        let record = ingestor.ingest(dictionary::REF, &doc).unwrap();
        let terms = record.get("terms").and_then(Value::as_list).unwrap();
        assert_eq!(terms.len(), 1);

        // same as putting an empty record directly
        let mut builder = catalog.builder(dictionary::REF).unwrap();
        builder.put("terms", Record::default()).unwrap();
        assert!(!builder.is_set("terms"));
    }
}
