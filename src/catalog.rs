//! Named sets of schemas
//!
//! Catalogs can be built in code (see [`crate::dictionary`]) or read from
//! TOML/JSON files:
//!
//! ```toml
//! [[schema]]
//! name = "Recording"
//!
//! [[schema.field]]
//! name = "url"
//! type = "text"
//! required = false
//!
//! [[schema.field]]
//! name = "lang"
//! type = "text"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::builder::Builder;
use crate::error::{Error, Result, SchemaError};
use crate::schema::{FieldDecl, Schema, ShapeDescriptor, TypeDecl};

/// On-disk catalog layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default, rename = "schema")]
    pub schemas: Vec<SchemaFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    pub name: String,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFile {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

impl SchemaFile {
    fn into_schema(self) -> std::result::Result<Schema, SchemaError> {
        let decls = self
            .fields
            .into_iter()
            .map(|field| -> std::result::Result<FieldDecl, SchemaError> {
                Ok(FieldDecl {
                    ty: TypeDecl::parse(&field.ty)?,
                    name: field.name,
                    required: field.required,
                })
            })
            .collect::<std::result::Result<Vec<_>, SchemaError>>()?;
        Schema::new(self.name, decls)
    }
}

/// Schemas by name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    schemas: BTreeMap<String, Schema>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema; names are unique within a catalog
    pub fn insert(&mut self, schema: Schema) -> std::result::Result<(), SchemaError> {
        if self.schemas.contains_key(schema.name()) {
            return Err(SchemaError::DuplicateSchema(schema.name().to_string()));
        }
        self.schemas.insert(schema.name().to_string(), schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Schemas sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// A fresh builder for the named schema
    pub fn builder(&self, name: &str) -> Result<Builder<'_>> {
        self.get(name)
            .map(Builder::new)
            .ok_or_else(|| Error::UnknownSchema(name.to_string()))
    }

    /// Every nested shape must name a schema in this catalog
    pub fn validate_references(&self) -> std::result::Result<(), SchemaError> {
        for schema in self.schemas.values() {
            for (field, spec) in schema.fields() {
                for shape in &spec.allowed {
                    if let ShapeDescriptor::Nested(reference) = shape {
                        if !self.schemas.contains_key(reference) {
                            return Err(SchemaError::UnknownReference {
                                schema: schema.name().to_string(),
                                field: field.to_string(),
                                reference: reference.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Build a catalog from its file representation
    pub fn from_file(file: CatalogFile) -> std::result::Result<Self, SchemaError> {
        let mut catalog = Self::new();
        catalog.extend_from_file(file)?;
        catalog.validate_references()?;
        Ok(catalog)
    }

    fn extend_from_file(&mut self, file: CatalogFile) -> std::result::Result<(), SchemaError> {
        for schema in file.schemas {
            self.insert(schema.into_schema()?)?;
        }
        Ok(())
    }

    /// The file representation of this catalog
    pub fn to_file(&self) -> CatalogFile {
        CatalogFile {
            schemas: self
                .schemas
                .values()
                .map(|schema| SchemaFile {
                    name: schema.name().to_string(),
                    fields: schema
                        .fields()
                        .map(|(name, spec)| FieldFile {
                            name: name.to_string(),
                            ty: spec.type_expr(),
                            required: spec.required,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Ok(Self::from_file(file)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content)?;
        Ok(Self::from_file(file)?)
    }

    /// Load a single `.toml` or `.json` catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = read_catalog_file(path.as_ref())?;
        Ok(Self::from_file(file)?)
    }

    /// Load and merge every catalog file under `dir`.
    ///
    /// References are checked once all files are in, so schemas may refer
    /// to schemas declared in sibling files.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut catalog = Self::new();
        for entry in WalkDir::new(dir.as_ref()).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || catalog_format(path).is_none() {
                continue;
            }
            debug!(path = %path.display(), "loading catalog file");
            catalog.extend_from_file(read_catalog_file(path)?)?;
        }
        catalog.validate_references()?;
        info!(schemas = catalog.len(), dir = %dir.as_ref().display(), "loaded catalog");
        Ok(catalog)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogFormat {
    Toml,
    Json,
}

fn catalog_format(path: &Path) -> Option<CatalogFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Some(CatalogFormat::Toml),
        Some("json") => Some(CatalogFormat::Json),
        _ => None,
    }
}

fn read_catalog_file(path: &Path) -> Result<CatalogFile> {
    let format = catalog_format(path)
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
    let content = fs::read_to_string(path)?;
    Ok(match format {
        CatalogFormat::Toml => toml::from_str(&content)?,
        CatalogFormat::Json => serde_json::from_str(&content)?,
    })
}
