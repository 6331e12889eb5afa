//! Built-in record types for scraped bilingual dictionary entries
//!
//! ```text
//! DictionaryEntity
//! ├── headers: list<Header>
//! │   ├── additional_information: AdditionalInformation
//! │   └── recordings_and_transcriptions: RecordingsAndTranscriptions
//! │       └── recordings: list<Recording>
//! └── meaning_groups: list<MeaningGroup>
//!     ├── irregular_forms: list<Form>
//!     └── meanings: list<Meaning>
//!         ├── example_sentences: list<ExampleSentence>
//!         └── refs: list<Ref>
//!             └── terms: list<Term>
//! ```

use crate::catalog::Catalog;
use crate::error::SchemaError;
use crate::schema::{FieldDecl, Schema, ShapeDescriptor, TypeDecl};

pub const RECORDING: &str = "Recording";
pub const RECORDINGS_AND_TRANSCRIPTIONS: &str = "RecordingsAndTranscriptions";
pub const TERM: &str = "Term";
pub const REF: &str = "Ref";
pub const EXAMPLE_SENTENCE: &str = "ExampleSentence";
pub const ADDITIONAL_INFORMATION: &str = "AdditionalInformation";
pub const MEANING: &str = "Meaning";
pub const FORM: &str = "Form";
pub const HEADER: &str = "Header";
pub const MEANING_GROUP: &str = "MeaningGroup";
pub const DICTIONARY_ENTITY: &str = "DictionaryEntity";

fn text() -> TypeDecl {
    TypeDecl::Shape(ShapeDescriptor::TEXT)
}

fn list_of_text() -> TypeDecl {
    TypeDecl::List(ShapeDescriptor::TEXT)
}

fn nested(schema: &str) -> TypeDecl {
    TypeDecl::Shape(ShapeDescriptor::nested(schema))
}

fn list_of(schema: &str) -> TypeDecl {
    TypeDecl::List(ShapeDescriptor::nested(schema))
}

/// Every dictionary schema, leaves first
pub fn schemas() -> Result<Vec<Schema>, SchemaError> {
    Ok(vec![
        Schema::new(
            RECORDING,
            [
                FieldDecl::optional("url", text()),
                FieldDecl::required("lang", text()),
            ],
        )?,
        Schema::new(
            RECORDINGS_AND_TRANSCRIPTIONS,
            [
                FieldDecl::optional("recordings", list_of(RECORDING)),
                FieldDecl::optional("transcriptions", list_of_text()),
            ],
        )?,
        Schema::new(
            TERM,
            [
                FieldDecl::required("value", text()),
                FieldDecl::optional(
                    "recordings_and_transcriptions",
                    nested(RECORDINGS_AND_TRANSCRIPTIONS),
                ),
            ],
        )?,
        Schema::new(
            REF,
            [
                FieldDecl::required("type", text()),
                FieldDecl::required("terms", list_of(TERM)),
            ],
        )?,
        Schema::new(
            EXAMPLE_SENTENCE,
            [
                FieldDecl::required("sentence", text()),
                FieldDecl::required("translation", text()),
                FieldDecl::optional(
                    "recordings_and_transcriptions",
                    nested(RECORDINGS_AND_TRANSCRIPTIONS),
                ),
            ],
        )?,
        Schema::new(
            ADDITIONAL_INFORMATION,
            [
                FieldDecl::optional("language_register", list_of_text()),
                FieldDecl::optional("language_variety", text()),
                FieldDecl::optional("other", text()),
                FieldDecl::optional("popularity", ShapeDescriptor::INTEGER),
            ],
        )?,
        Schema::new(
            MEANING,
            [
                FieldDecl::required("id", text()),
                FieldDecl::required("terms", list_of_text()),
                FieldDecl::required("not_for_children", ShapeDescriptor::BOOLEAN),
                FieldDecl::optional("additional_information", nested(ADDITIONAL_INFORMATION)),
                FieldDecl::optional("grammar_tags", list_of_text()),
                FieldDecl::optional("mf", text()),
                FieldDecl::optional("example_sentences", list_of(EXAMPLE_SENTENCE)),
                FieldDecl::optional("thematic_dictionaries", list_of_text()),
                FieldDecl::optional("note", text()),
                FieldDecl::optional("refs", list_of(REF)),
                FieldDecl::optional("copyright", text()),
            ],
        )?,
        Schema::new(
            FORM,
            [
                FieldDecl::required("term", text()),
                FieldDecl::required("type", text()),
                FieldDecl::optional(
                    "recordings_and_transcriptions",
                    nested(RECORDINGS_AND_TRANSCRIPTIONS),
                ),
            ],
        )?,
        Schema::new(
            HEADER,
            [
                FieldDecl::required("title", text()),
                FieldDecl::required("less_popular", ShapeDescriptor::BOOLEAN),
                FieldDecl::optional("additional_information", nested(ADDITIONAL_INFORMATION)),
                FieldDecl::optional(
                    "recordings_and_transcriptions",
                    nested(RECORDINGS_AND_TRANSCRIPTIONS),
                ),
            ],
        )?,
        Schema::new(
            MEANING_GROUP,
            [
                FieldDecl::required("meanings", list_of(MEANING)),
                FieldDecl::optional("irregular_forms", list_of(FORM)),
                FieldDecl::optional("part_of_speech", text()),
            ],
        )?,
        Schema::new(
            DICTIONARY_ENTITY,
            [
                FieldDecl::required("headers", list_of(HEADER)),
                FieldDecl::required("meaning_groups", list_of(MEANING_GROUP)),
                FieldDecl::optional("note", text()),
                FieldDecl::optional("pictures", list_of_text()),
            ],
        )?,
    ])
}

/// The dictionary catalog, with every nested reference checked
pub fn catalog() -> Result<Catalog, SchemaError> {
    let mut catalog = Catalog::new();
    for schema in schemas()? {
        catalog.insert(schema)?;
    }
    catalog.validate_references()?;
    Ok(catalog)
}
