//! Schema declarations and field resolution
//!
//! A [`Schema`] is defined once from a list of [`FieldDecl`]s and shared
//! read-only by every builder of that record type. Each declaration is
//! resolved up front into a [`FieldSpec`]: its cardinality, whether it is
//! required, and the flattened set of shapes a value may take.
//!
//! ## Type syntax (catalog files)
//!
//! ```text
//! text | integer | boolean     primitives
//! Recording                    a nested record schema
//! text | integer               closed union
//! list<Term>                   ordered, duplicates allowed
//! set<text>                    de-duplicated, unordered
//! ```
//!
//! Any other `wrapper<T>` parses, but is refused when the schema is defined.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{BuildError, SchemaError};
use crate::value::Value;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

fn container_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*<(.*)>$").unwrap())
}

/// Scalar value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Text,
    Integer,
    Boolean,
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Text => "text",
            Primitive::Integer => "integer",
            Primitive::Boolean => "boolean",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Primitive::Text),
            "integer" => Some(Primitive::Integer),
            "boolean" => Some(Primitive::Boolean),
            _ => None,
        }
    }
}

/// A permitted value shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeDescriptor {
    Primitive(Primitive),
    /// Another schema, by name. Values are only checked to be records.
    Nested(String),
    Union(Vec<ShapeDescriptor>),
}

impl ShapeDescriptor {
    pub const TEXT: ShapeDescriptor = ShapeDescriptor::Primitive(Primitive::Text);
    pub const INTEGER: ShapeDescriptor = ShapeDescriptor::Primitive(Primitive::Integer);
    pub const BOOLEAN: ShapeDescriptor = ShapeDescriptor::Primitive(Primitive::Boolean);

    pub fn nested(schema: impl Into<String>) -> Self {
        ShapeDescriptor::Nested(schema.into())
    }

    pub fn union(members: impl IntoIterator<Item = ShapeDescriptor>) -> Self {
        ShapeDescriptor::Union(members.into_iter().collect())
    }

    /// Whether `value` has this shape.
    ///
    /// Nested schemas match any record; their contents are not inspected.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (ShapeDescriptor::Primitive(Primitive::Text), Value::Text(_))
            | (ShapeDescriptor::Primitive(Primitive::Integer), Value::Integer(_))
            | (ShapeDescriptor::Primitive(Primitive::Boolean), Value::Boolean(_))
            | (ShapeDescriptor::Nested(_), Value::Record(_)) => true,
            (ShapeDescriptor::Union(members), value) => members.iter().any(|m| m.matches(value)),
            _ => false,
        }
    }

    /// Flatten unions into their non-union members, in declaration order
    fn flatten_into(&self, out: &mut Vec<ShapeDescriptor>) {
        match self {
            ShapeDescriptor::Union(members) => {
                for member in members {
                    member.flatten_into(out);
                }
            }
            shape => {
                if !out.contains(shape) {
                    out.push(shape.clone());
                }
            }
        }
    }

    fn parse(expr: &str) -> Result<Self, SchemaError> {
        let parts = split_top_level(expr, '|');
        if parts.len() > 1 {
            return parts
                .into_iter()
                .map(ShapeDescriptor::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(ShapeDescriptor::Union);
        }

        let expr = expr.trim();
        if let Some(primitive) = Primitive::from_name(expr) {
            return Ok(ShapeDescriptor::Primitive(primitive));
        }
        if identifier_re().is_match(expr) {
            return Ok(ShapeDescriptor::Nested(expr.to_string()));
        }
        Err(SchemaError::InvalidType(expr.to_string()))
    }
}

impl fmt::Display for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeDescriptor::Primitive(p) => f.write_str(p.name()),
            ShapeDescriptor::Nested(name) => f.write_str(name),
            ShapeDescriptor::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}

/// Split on `sep`, ignoring separators nested inside `<...>`
fn split_top_level(expr: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&expr[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}

/// A field's declared type, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDecl {
    Shape(ShapeDescriptor),
    List(ShapeDescriptor),
    Set(ShapeDescriptor),
    /// Any other container wrapper; refused when the schema is defined
    Container {
        wrapper: String,
        inner: ShapeDescriptor,
    },
}

impl TypeDecl {
    /// Parse the textual type syntax used by catalog files
    pub fn parse(expr: &str) -> Result<Self, SchemaError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(SchemaError::InvalidType(expr.to_string()));
        }

        // containers may not appear inside a union: `list<A> | text` is refused below
        if split_top_level(trimmed, '|').len() == 1 {
            if let Some(caps) = container_re().captures(trimmed) {
                let wrapper = caps[1].to_string();
                let inner_expr = &caps[2];
                if container_re().is_match(inner_expr.trim()) {
                    return Err(SchemaError::InvalidType(expr.to_string()));
                }
                let inner = ShapeDescriptor::parse(inner_expr)?;
                return Ok(match wrapper.as_str() {
                    "list" => TypeDecl::List(inner),
                    "set" => TypeDecl::Set(inner),
                    _ => TypeDecl::Container { wrapper, inner },
                });
            }
        }

        if trimmed.contains('<') || trimmed.contains('>') {
            return Err(SchemaError::InvalidType(expr.to_string()));
        }
        ShapeDescriptor::parse(trimmed).map(TypeDecl::Shape)
    }
}

impl From<ShapeDescriptor> for TypeDecl {
    fn from(shape: ShapeDescriptor) -> Self {
        TypeDecl::Shape(shape)
    }
}

impl fmt::Display for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDecl::Shape(shape) => write!(f, "{}", shape),
            TypeDecl::List(shape) => write!(f, "list<{}>", shape),
            TypeDecl::Set(shape) => write!(f, "set<{}>", shape),
            TypeDecl::Container { wrapper, inner } => write!(f, "{}<{}>", wrapper, inner),
        }
    }
}

/// A field declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeDecl,
    pub required: bool,
}

impl FieldDecl {
    pub fn required(name: impl Into<String>, ty: impl Into<TypeDecl>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, ty: impl Into<TypeDecl>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            required: false,
        }
    }
}

/// How many values a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// At most one value, written once
    Scalar,
    /// Insertion ordered, duplicates allowed
    List,
    /// De-duplicated by value equality
    Set,
}

/// A resolved field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub cardinality: Cardinality,
    pub required: bool,
    /// Flattened union members; never contains a `Union`
    pub allowed: Vec<ShapeDescriptor>,
}

impl FieldSpec {
    pub fn accepts(&self, value: &Value) -> bool {
        self.allowed.iter().any(|shape| shape.matches(value))
    }

    /// The allowed shapes, for diagnostics
    pub fn expected(&self) -> String {
        self.allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Back to the declaration syntax
    pub fn type_expr(&self) -> String {
        let shapes = self
            .allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        match self.cardinality {
            Cardinality::Scalar => shapes,
            Cardinality::List => format!("list<{}>", shapes),
            Cardinality::Set => format!("set<{}>", shapes),
        }
    }
}

/// A named record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    fields: Vec<(String, FieldSpec)>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Define a schema, resolving every field declaration.
    ///
    /// Unsupported containers, empty unions and duplicate or malformed names
    /// are rejected here rather than on first use.
    pub fn new(
        name: impl Into<String>,
        decls: impl IntoIterator<Item = FieldDecl>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if !identifier_re().is_match(&name) || Primitive::from_name(&name).is_some() {
            return Err(SchemaError::InvalidName(name));
        }

        let mut fields = Vec::new();
        let mut index = HashMap::new();
        for decl in decls {
            if !identifier_re().is_match(&decl.name) {
                return Err(SchemaError::InvalidName(decl.name));
            }
            if index.contains_key(&decl.name) {
                return Err(SchemaError::DuplicateField {
                    schema: name,
                    field: decl.name,
                });
            }

            let spec = resolve_decl(&name, &decl)?;
            index.insert(decl.name.clone(), fields.len());
            fields.push((decl.name, spec));
        }

        debug!(schema = %name, fields = fields.len(), "defined schema");
        Ok(Self {
            name,
            fields,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| &self.fields[i].1)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.as_str())
    }

    /// Names of the nested schemas this schema refers to
    pub fn references(&self) -> BTreeSet<&str> {
        self.fields
            .iter()
            .flat_map(|(_, spec)| spec.allowed.iter())
            .filter_map(|shape| match shape {
                ShapeDescriptor::Nested(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Look up a field's position and spec
    pub(crate) fn resolve(&self, field: &str) -> Result<(usize, &FieldSpec), BuildError> {
        self.index
            .get(field)
            .map(|&i| (i, &self.fields[i].1))
            .ok_or_else(|| BuildError::UnknownField {
                schema: self.name.clone(),
                field: field.to_string(),
            })
    }

    pub(crate) fn field_name(&self, position: usize) -> &str {
        &self.fields[position].0
    }
}

fn resolve_decl(schema: &str, decl: &FieldDecl) -> Result<FieldSpec, SchemaError> {
    let (cardinality, shape) = match &decl.ty {
        TypeDecl::Shape(shape) => (Cardinality::Scalar, shape),
        TypeDecl::List(shape) => (Cardinality::List, shape),
        TypeDecl::Set(shape) => (Cardinality::Set, shape),
        TypeDecl::Container { wrapper, .. } => {
            return Err(SchemaError::UnsupportedContainer {
                schema: schema.to_string(),
                field: decl.name.clone(),
                wrapper: wrapper.clone(),
            })
        }
    };

    let mut allowed = Vec::new();
    shape.flatten_into(&mut allowed);
    // a reference named like a primitive would read back as the primitive
    if let Some(ShapeDescriptor::Nested(reference)) = allowed
        .iter()
        .find(|shape| matches!(shape, ShapeDescriptor::Nested(n) if Primitive::from_name(n).is_some()))
    {
        return Err(SchemaError::InvalidName(reference.clone()));
    }
    if allowed.is_empty() {
        return Err(SchemaError::EmptyUnion {
            schema: schema.to_string(),
            field: decl.name.clone(),
        });
    }

    Ok(FieldSpec {
        cardinality,
        required: decl.required,
        allowed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    #[test]
    fn test_parse_primitives_and_nested() {
        assert_eq!(TypeDecl::parse("text").unwrap(), TypeDecl::Shape(ShapeDescriptor::TEXT));
        assert_eq!(
            TypeDecl::parse(" Recording ").unwrap(),
            TypeDecl::Shape(ShapeDescriptor::nested("Recording"))
        );
    }

    #[test]
    fn test_parse_containers() {
        assert_eq!(
            TypeDecl::parse("list<Term>").unwrap(),
            TypeDecl::List(ShapeDescriptor::nested("Term"))
        );
        assert_eq!(
            TypeDecl::parse("set<text | integer>").unwrap(),
            TypeDecl::Set(ShapeDescriptor::union([
                ShapeDescriptor::TEXT,
                ShapeDescriptor::INTEGER
            ]))
        );
        assert_eq!(
            TypeDecl::parse("map<text>").unwrap(),
            TypeDecl::Container {
                wrapper: "map".to_string(),
                inner: ShapeDescriptor::TEXT
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TypeDecl::parse("").is_err());
        assert!(TypeDecl::parse("list<list<text>>").is_err());
        assert!(TypeDecl::parse("list<text").is_err());
        assert!(TypeDecl::parse("text |").is_err());
        assert!(TypeDecl::parse("9lives").is_err());
    }

    #[test]
    fn test_resolve_cardinality() {
        let schema = Schema::new(
            "Meaning",
            [
                FieldDecl::required("id", ShapeDescriptor::TEXT),
                FieldDecl::required("terms", TypeDecl::List(ShapeDescriptor::TEXT)),
                FieldDecl::optional("tags", TypeDecl::Set(ShapeDescriptor::TEXT)),
            ],
        )
        .unwrap();

        assert_eq!(schema.field("id").unwrap().cardinality, Cardinality::Scalar);
        assert_eq!(schema.field("terms").unwrap().cardinality, Cardinality::List);
        assert_eq!(schema.field("tags").unwrap().cardinality, Cardinality::Set);
        assert_eq!(schema.required_fields().collect::<Vec<_>>(), vec!["id", "terms"]);
    }

    #[test]
    fn test_union_members_flattened() {
        let schema = Schema::new(
            "Note",
            [FieldDecl::optional(
                "body",
                ShapeDescriptor::union([
                    ShapeDescriptor::TEXT,
                    ShapeDescriptor::union([ShapeDescriptor::INTEGER, ShapeDescriptor::TEXT]),
                ]),
            )],
        )
        .unwrap();

        let spec = schema.field("body").unwrap();
        assert_eq!(spec.allowed, vec![ShapeDescriptor::TEXT, ShapeDescriptor::INTEGER]);
        assert_eq!(spec.expected(), "text, integer");
    }

    #[test]
    fn test_unsupported_container_fails_at_definition() {
        let err = Schema::new(
            "Broken",
            [FieldDecl::required("pairs", TypeDecl::parse("tuple<text>").unwrap())],
        )
        .unwrap_err();

        assert!(matches!(err, SchemaError::UnsupportedContainer { ref wrapper, .. } if wrapper == "tuple"));
    }

    #[test]
    fn test_empty_union_and_duplicates() {
        let err = Schema::new(
            "Broken",
            [FieldDecl::required("x", ShapeDescriptor::Union(vec![]))],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::EmptyUnion { .. }));

        let err = Schema::new(
            "Broken",
            [
                FieldDecl::required("x", ShapeDescriptor::TEXT),
                FieldDecl::optional("x", ShapeDescriptor::INTEGER),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn test_primitive_names_are_reserved() {
        let err = Schema::new("text", [FieldDecl::required("value", ShapeDescriptor::TEXT)]).unwrap_err();
        assert_eq!(err, SchemaError::InvalidName("text".to_string()));

        let err = Schema::new(
            "Holder",
            [FieldDecl::optional(
                "inner",
                TypeDecl::List(ShapeDescriptor::union([
                    ShapeDescriptor::nested("Term"),
                    ShapeDescriptor::nested("integer"),
                ])),
            )],
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::InvalidName("integer".to_string()));

        // any other casing is an ordinary schema name
        assert!(Schema::new("Text", [FieldDecl::required("value", ShapeDescriptor::TEXT)]).is_ok());
    }

    #[test]
    fn test_nested_matches_any_record() {
        let shape = ShapeDescriptor::nested("Recording");
        let unrelated: Record = [("anything", Value::from(1))].into_iter().collect();
        assert!(shape.matches(&Value::from(unrelated)));
        assert!(!shape.matches(&Value::from("Recording")));
    }

    #[test]
    fn test_references_and_type_expr() {
        let schema = Schema::new(
            "Ref",
            [
                FieldDecl::required("type", ShapeDescriptor::TEXT),
                FieldDecl::required("terms", TypeDecl::parse("list<Term>").unwrap()),
            ],
        )
        .unwrap();

        assert_eq!(schema.references().into_iter().collect::<Vec<_>>(), vec!["Term"]);
        assert_eq!(schema.field("terms").unwrap().type_expr(), "list<Term>");
    }
}
