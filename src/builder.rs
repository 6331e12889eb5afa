//! Incremental, schema-validated record assembly
//!
//! One [`Builder`] per record. Producers call [`Builder::put`] as they
//! discover values and [`Builder::build`] once at the end. Every `put` is
//! checked against the schema before anything changes:
//!
//! 1. empty text, lists, sets and records are dropped silently
//! 2. the field must exist in the schema
//! 3. the value must have one of the field's allowed shapes
//! 4. scalar fields are written once; list fields append; set fields
//!    insert, ignoring duplicates
//!
//! `build` consumes the builder, so a record can only be finalized once.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::error::BuildError;
use crate::schema::{Cardinality, Schema};
use crate::value::{Record, Value};

#[derive(Debug, Clone)]
enum Slot {
    Scalar(Value),
    List(Vec<Value>),
    Set(BTreeSet<Value>),
}

impl Slot {
    fn into_value(self) -> Value {
        match self {
            Slot::Scalar(value) => value,
            Slot::List(items) => Value::List(items),
            Slot::Set(items) => Value::Set(items),
        }
    }
}

/// Assembly context for a single record
#[derive(Debug, Clone)]
pub struct Builder<'s> {
    schema: &'s Schema,
    /// Indexed by field position in the schema
    state: Vec<Option<Slot>>,
}

impl<'s> Builder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            state: vec![None; schema.len()],
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Add `value` under `field`.
    ///
    /// A rejected call leaves the builder exactly as it was.
    pub fn put(&mut self, field: &str, value: impl Into<Value>) -> Result<(), BuildError> {
        let value = value.into();
        if value.is_empty() {
            trace!(schema = %self.schema.name(), field, "skipping empty value");
            return Ok(());
        }

        let schema = self.schema;
        let (position, spec) = schema.resolve(field)?;
        if !spec.accepts(&value) {
            return Err(BuildError::TypeMismatch {
                schema: schema.name().to_string(),
                field: field.to_string(),
                expected: spec.expected(),
                actual: value.kind(),
            });
        }

        let slot = &mut self.state[position];
        match spec.cardinality {
            Cardinality::List => match slot {
                Some(Slot::List(items)) => items.push(value),
                _ => *slot = Some(Slot::List(vec![value])),
            },
            Cardinality::Set => match slot {
                Some(Slot::Set(items)) => {
                    items.insert(value);
                }
                _ => *slot = Some(Slot::Set(BTreeSet::from([value]))),
            },
            Cardinality::Scalar => {
                if slot.is_some() {
                    return Err(BuildError::Overwrite {
                        schema: schema.name().to_string(),
                        field: field.to_string(),
                    });
                }
                *slot = Some(Slot::Scalar(value));
            }
        }

        trace!(schema = %self.schema.name(), field, "put");
        Ok(())
    }

    /// Whether `field` currently holds a value
    pub fn is_set(&self, field: &str) -> bool {
        self.schema
            .resolve(field)
            .map(|(position, _)| self.state[position].is_some())
            .unwrap_or(false)
    }

    /// Required fields that have not been set yet, in declaration order
    pub fn missing_required(&self) -> Vec<&'s str> {
        let schema = self.schema;
        schema
            .fields()
            .zip(&self.state)
            .filter(|((_, spec), slot)| spec.required && slot.is_none())
            .map(|((name, _), _)| name)
            .collect()
    }

    /// Finalize the record.
    ///
    /// Every required field in the schema is checked, including ones no
    /// `put` ever targeted. The first one missing, in declaration order, is
    /// reported.
    pub fn build(self) -> Result<Record, BuildError> {
        if let Some(field) = self.missing_required().first() {
            return Err(BuildError::MissingRequiredField {
                schema: self.schema.name().to_string(),
                field: field.to_string(),
            });
        }

        let schema = self.schema;
        let fields: Vec<(String, Value)> = self
            .state
            .into_iter()
            .enumerate()
            .filter_map(|(position, slot)| {
                slot.map(|slot| (schema.field_name(position).to_string(), slot.into_value()))
            })
            .collect();

        debug!(schema = %schema.name(), fields = fields.len(), "built record");
        Ok(Record::from_ordered(fields))
    }
}
