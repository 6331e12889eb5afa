//! Catalog Linting
//!
//! Schemas that define fine can still be sloppy. The linter flags what
//! `Catalog::validate_references` would refuse, plus naming and structure
//! smells that make scraped records awkward to consume.
//!
//! ## Lints
//! 1. **Unknown Reference** (error): a nested shape names a schema the
//!    catalog lacks
//! 2. **Naming**: fields should be snake_case, schemas PascalCase
//! 3. **Unreferenced Schema**: nothing nests it and it is not a root

use regex::Regex;
use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::schema::{Schema, ShapeDescriptor};

/// Result of linting a schema
#[derive(Debug, Default)]
pub struct LintResult {
    pub schema_id: String,
    pub errors: Vec<LintError>,
    pub warnings: Vec<LintWarning>,
}

impl LintResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug)]
pub struct LintError {
    pub code: &'static str,
    pub message: String,
    pub path: String,
}

#[derive(Debug)]
pub struct LintWarning {
    pub code: &'static str,
    pub message: String,
    pub path: String,
}

/// The catalog linter
pub struct CatalogLinter {
    snake_case: Regex,
    pascal_case: Regex,
    /// Schemas allowed to stand alone
    roots: HashSet<String>,
}

impl Default for CatalogLinter {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl CatalogLinter {
    pub fn new<S: Into<String>>(roots: impl IntoIterator<Item = S>) -> Self {
        Self {
            snake_case: Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$").unwrap(),
            pascal_case: Regex::new(r"^[A-Z][a-zA-Z0-9]*$").unwrap(),
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Lint every schema; only results with findings are returned
    pub fn lint(&self, catalog: &Catalog) -> Vec<LintResult> {
        let referenced: HashSet<&str> = catalog
            .iter()
            .flat_map(|schema| schema.references())
            .collect();

        catalog
            .iter()
            .map(|schema| {
                let mut result = self.lint_schema(catalog, schema);
                if !referenced.contains(schema.name()) && !self.roots.contains(schema.name()) {
                    result.warnings.push(LintWarning {
                        code: "UNREFERENCED_SCHEMA",
                        message: format!(
                            "Schema '{}' is neither nested anywhere nor a configured root.",
                            schema.name()
                        ),
                        path: schema.name().to_string(),
                    });
                }
                result
            })
            .filter(|result| !result.is_clean() || result.has_warnings())
            .collect()
    }

    fn lint_schema(&self, catalog: &Catalog, schema: &Schema) -> LintResult {
        let mut result = LintResult {
            schema_id: schema.name().to_string(),
            ..Default::default()
        };

        if !self.pascal_case.is_match(schema.name()) {
            result.warnings.push(LintWarning {
                code: "NON_PASCAL_CASE_SCHEMA",
                message: format!("Schema name '{}' should be PascalCase.", schema.name()),
                path: schema.name().to_string(),
            });
        }

        for (field, spec) in schema.fields() {
            let path = format!("{}.{}", schema.name(), field);

            if !self.snake_case.is_match(field) {
                result.warnings.push(LintWarning {
                    code: "NON_SNAKE_CASE_FIELD",
                    message: format!("Field '{}' should be snake_case.", field),
                    path: path.clone(),
                });
            }

            for shape in &spec.allowed {
                if let ShapeDescriptor::Nested(reference) = shape {
                    if catalog.get(reference).is_none() {
                        result.errors.push(LintError {
                            code: "UNKNOWN_REFERENCE",
                            message: format!("Field refers to undefined schema '{}'.", reference),
                            path: path.clone(),
                        });
                    }
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;
    use crate::schema::FieldDecl;

    #[test]
    fn test_dictionary_catalog_is_clean() {
        let catalog = dictionary::catalog().unwrap();
        let linter = CatalogLinter::new([dictionary::DICTIONARY_ENTITY]);
        assert!(linter.lint(&catalog).is_empty());
    }

    #[test]
    fn test_unreferenced_schema() {
        let catalog = dictionary::catalog().unwrap();
        let results = CatalogLinter::default().lint(&catalog);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].schema_id, "DictionaryEntity");
        assert!(results[0].warnings.iter().any(|w| w.code == "UNREFERENCED_SCHEMA"));
    }

    #[test]
    fn test_unknown_reference_and_naming() {
        let mut catalog = Catalog::new();
        catalog
            .insert(
                Schema::new(
                    "example_sentence",
                    [
                        FieldDecl::required("Sentence", ShapeDescriptor::TEXT),
                        FieldDecl::optional("audio", ShapeDescriptor::nested("Recording")),
                    ],
                )
                .unwrap(),
            )
            .unwrap();

        let results = CatalogLinter::new(["example_sentence"]).lint(&catalog);
        let result = &results[0];
        assert!(!result.is_clean());
        assert!(result.errors.iter().any(|e| e.code == "UNKNOWN_REFERENCE"));
        assert!(result.warnings.iter().any(|w| w.code == "NON_SNAKE_CASE_FIELD"));
        assert!(result.warnings.iter().any(|w| w.code == "NON_PASCAL_CASE_SCHEMA"));
    }
}
