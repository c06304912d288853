//! A cross-collection reference, recognized on decode when a document matches
//! the `$ref`/`$id` shape.

use crate::{bson::Bson, document::Document};

/// A database reference.
///
/// The deserializer rewrites any document whose keys are exactly `$ref` (a
/// string), `$id` (any value), and optionally `$db` (a string) into this type,
/// carrying any additional non-`$` keys in `extra`. A document containing any
/// other `$`-prefixed key is left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct DbRef {
    /// The name of the collection the referenced value lives in.
    pub collection: String,

    /// The value of the referenced document's `_id`.
    pub id: Box<Bson>,

    /// The database the referenced collection lives in, if any.
    pub db: Option<String>,

    /// Any keys beyond the reference triple that the source document carried.
    pub extra: Document,
}

impl DbRef {
    /// Creates a new [`DbRef`] with no extra fields.
    pub fn new(collection: impl Into<String>, id: Bson, db: impl Into<Option<String>>) -> Self {
        DbRef {
            collection: collection.into(),
            id: Box::new(id),
            db: db.into(),
            extra: Document::new(),
        }
    }
}
