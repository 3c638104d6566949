//! JSON envelope for whole-document export/import.
//!
//! Export wraps the document in a versioned envelope with counts in
//! `metadata`. Import accepts the same shape but only requires the
//! `entities` and `relationships` arrays — `version`/`created`/`title`/
//! `metadata` are ignored on read. Shape is validated before anything
//! replaces the live document.

use crate::model::{Document, Entity, Relationship};
use serde::Serialize;
use std::fmt;

pub const ENVELOPE_VERSION: &str = "1.0";
pub const DOCUMENT_TITLE: &str = "Business Domain Model";

#[derive(Serialize)]
struct Envelope<'a> {
    version: &'static str,
    created: &'a str,
    title: &'static str,
    entities: &'a [Entity],
    relationships: &'a [Relationship],
    metadata: Metadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    entity_count: usize,
    relationship_count: usize,
}

/// Serialize the document into the export envelope as pretty-printed JSON.
///
/// `created` is an ISO-8601 timestamp supplied by the caller — the shell
/// owns the clock, the gateway stays pure.
pub fn export_document(document: &Document, created: &str) -> String {
    let envelope = Envelope {
        version: ENVELOPE_VERSION,
        created,
        title: DOCUMENT_TITLE,
        entities: &document.entities,
        relationships: &document.relationships,
        metadata: Metadata {
            entity_count: document.entity_count(),
            relationship_count: document.relationship_count(),
        },
    };
    serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| "{}".to_string())
}

/// Suggested file name for a JSON export. `date` is `YYYY-MM-DD`.
pub fn json_file_name(date: &str) -> String {
    format!("business-model-{date}.json")
}

/// Suggested file name for a canvas snapshot image. `date` is `YYYY-MM-DD`.
pub fn snapshot_file_name(date: &str) -> String {
    format!("business-model-{date}.png")
}

// ─── Import ──────────────────────────────────────────────────────────────

/// Why an import was rejected. No document or history state changes when
/// any of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The bytes are not valid JSON.
    Malformed(String),
    /// The top-level value is not an object.
    NotAnObject,
    /// `entities` is missing or not an array.
    MissingEntities,
    /// `relationships` is missing or not an array.
    MissingRelationships,
    /// An entity or relationship element could not be read.
    BadElement(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(detail) => write!(f, "file is not valid JSON: {detail}"),
            Self::NotAnObject => write!(f, "top-level value must be an object"),
            Self::MissingEntities => write!(f, "`entities` is missing or not an array"),
            Self::MissingRelationships => {
                write!(f, "`relationships` is missing or not an array")
            }
            Self::BadElement(detail) => {
                write!(f, "unreadable entity or relationship: {detail}")
            }
        }
    }
}

impl std::error::Error for ImportError {}

/// Parse raw bytes into a [`Document`].
///
/// Validation is structural only: the top level must be an object carrying
/// `entities` and `relationships` arrays. Element fields beyond that are
/// lenient — anything missing takes its default.
pub fn import_document(raw: &str) -> Result<Document, ImportError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ImportError::Malformed(e.to_string()))?;
    let object = value.as_object().ok_or(ImportError::NotAnObject)?;

    let entities = object
        .get("entities")
        .filter(|v| v.is_array())
        .ok_or(ImportError::MissingEntities)?;
    let relationships = object
        .get("relationships")
        .filter(|v| v.is_array())
        .ok_or(ImportError::MissingRelationships)?;

    let entities: Vec<Entity> = serde_json::from_value(entities.clone())
        .map_err(|e| ImportError::BadElement(e.to_string()))?;
    let relationships: Vec<Relationship> = serde_json::from_value(relationships.clone())
        .map_err(|e| ImportError::BadElement(e.to_string()))?;

    Ok(Document {
        entities,
        relationships,
    })
}
