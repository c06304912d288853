//! Encoding and decoding support for BSON and Extended JSON.
//!
//! This crate implements the two halves of working with BSON bytes in a
//! textual world:
//!
//! - **Decoding**: [`de::from_slice`] parses a BSON byte buffer in a single
//!   pass into a tree of [`Bson`] values held by an insertion-ordered
//!   [`Document`], with strict structural validation, configurable value
//!   promotion, an opt-out UTF-8 validation policy, and recognition of the
//!   [`DbRef`](dbref::DbRef) document shape.
//! - **Encoding**: [`ser::stringify`] and [`ser::Stringifier`] render a
//!   [`Bson`] tree as canonical or relaxed
//!   [Extended JSON](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/),
//!   either as one string or as a lazy sequence of chunks whose concatenation
//!   is byte-identical to the one-string form.
//!
//! ```rust
//! let doc = ejson::de::from_slice(b"\x12\x00\x00\x00\x12age\x00\x2a\x00\x00\x00\x00\x00\x00\x00\x00")?;
//! assert_eq!(doc.get_i64("age")?, 42);
//!
//! let json = ejson::ser::stringify(&ejson::Bson::Document(doc))?;
//! assert_eq!(json, r#"{"age":42}"#);
//! # Ok::<(), ejson::Error>(())
//! ```
//!
//! Serializing a document tree back to BSON bytes is out of scope for this
//! crate.

#![allow(clippy::cognitive_complexity, clippy::derive_partial_eq_without_eq)]

#[doc(inline)]
pub use self::{
    binary::Binary,
    bson::{Array, Bson, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    datetime::DateTime,
    dbref::DbRef,
    de::{from_slice, from_slice_with_options, DecodeOptions, Utf8Validation},
    decimal128::Decimal128,
    document::Document,
    error::{Error, ErrorKind, Result, ValueAccessErrorKind},
    oid::ObjectId,
    ser::{stringify, stringify_with_options, Stringifier, StringifyOptions},
    uuid::Uuid,
};

#[macro_use]
mod macros;
mod base64;
pub mod binary;
mod bson;
pub mod datetime;
pub mod dbref;
pub mod de;
pub mod decimal128;
pub mod document;
pub mod error;
pub mod oid;
pub mod ser;
pub mod spec;
pub mod uuid;

#[cfg(test)]
mod tests;
