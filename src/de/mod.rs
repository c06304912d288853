//! Deserializer

mod raw;

use std::collections::HashSet;

use crate::{
    document::Document,
    error::{Error, Result},
};

pub(crate) const MIN_BSON_DOCUMENT_SIZE: i32 = 4 + 1; // 4 bytes for length, one byte for null terminator
pub(crate) const MIN_BSON_STRING_SIZE: i32 = 4 + 1; // 4 bytes for length, one byte for null terminator
pub(crate) const MIN_CODE_WITH_SCOPE_SIZE: i32 = 4 + MIN_BSON_STRING_SIZE + MIN_BSON_DOCUMENT_SIZE;

/// Which keys UTF-8 validation applies to.
///
/// Validated strings fail with [`ErrorKind::Utf8Encoding`](crate::ErrorKind)
/// on invalid bytes; unvalidated strings are decoded lossily, replacing
/// invalid sequences with U+FFFD.
#[derive(Clone, Debug)]
pub enum Utf8Validation {
    /// Validate everything (`All(true)`, the default) or nothing (`All(false)`).
    All(bool),
    /// Validate only the subtrees under the listed top-level keys.
    Only(HashSet<String>),
    /// Validate everything except the subtrees under the listed top-level keys.
    Except(HashSet<String>),
}

impl Default for Utf8Validation {
    fn default() -> Self {
        Utf8Validation::All(true)
    }
}

impl Utf8Validation {
    /// Resolve the setting for a top-level key. The result is inherited by the
    /// entire subtree under that key.
    pub(crate) fn validate_key(&self, key: &str) -> bool {
        match self {
            Utf8Validation::All(on) => *on,
            Utf8Validation::Only(keys) => keys.contains(key),
            Utf8Validation::Except(keys) => !keys.contains(key),
        }
    }
}

/// Options used to configure decoding of BSON bytes.
///
/// ```rust
/// use ejson::de::DecodeOptions;
///
/// let options = DecodeOptions::default()
///     .promote_values(false)
///     .bson_regexp(true);
/// assert!(!options.promote_values);
/// ```
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    /// When `true`, 64-bit integers are surfaced as native integers
    /// unconditionally. Conflicts with disabling either `promote_longs` or
    /// `promote_values`.
    pub use_big_int64: bool,

    /// When `true` (the default), 64-bit integers in the safe integer range
    /// are narrowed to plain numbers. [`Bson::Int64`](crate::Bson) is exact
    /// over the full range, so this setting is observable only through its
    /// conflict rules.
    pub promote_longs: bool,

    /// When `true`, binary payloads are surfaced as raw
    /// [`Bson::Bytes`](crate::Bson) rather than wrapped in
    /// [`Binary`](crate::Binary). Requires `promote_values`.
    pub promote_buffers: bool,

    /// When `true` (the default), deprecated wrapper types are surfaced as
    /// their plain equivalents: symbols decode as strings. Disabling this also
    /// disables buffer promotion.
    pub promote_values: bool,

    /// Arrays stored under the listed keys yield their embedded documents as
    /// unparsed [`Bson::Bytes`](crate::Bson) slices.
    pub fields_as_raw: HashSet<String>,

    /// When `true`, regular expressions keep their original option string.
    /// When `false` (the default), options are translated the way a JavaScript
    /// host would consume them: `m` and `i` are kept, `s` becomes `g`, and any
    /// other option is dropped.
    pub bson_regexp: bool,

    /// When `true`, the input buffer is allowed to extend past the declared
    /// document size; by default the document must span the entire buffer.
    pub allow_object_smaller_than_buffer_size: bool,

    /// Offset into the input buffer at which the document starts.
    pub index: usize,

    /// When `true`, embedded documents and arrays are returned as unparsed
    /// [`Bson::Bytes`](crate::Bson) slices (copied out of the input buffer).
    pub raw: bool,

    /// UTF-8 validation policy for keys and string payloads.
    pub utf8_validation: Utf8Validation,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            use_big_int64: false,
            promote_longs: true,
            promote_buffers: false,
            promote_values: true,
            fields_as_raw: HashSet::new(),
            bson_regexp: false,
            allow_object_smaller_than_buffer_size: false,
            index: 0,
            raw: false,
            utf8_validation: Utf8Validation::default(),
        }
    }
}

impl DecodeOptions {
    /// Set whether 64-bit integers are surfaced as native integers.
    pub fn use_big_int64(mut self, value: bool) -> Self {
        self.use_big_int64 = value;
        self
    }

    /// Set whether safe-range 64-bit integers are narrowed.
    pub fn promote_longs(mut self, value: bool) -> Self {
        self.promote_longs = value;
        self
    }

    /// Set whether binary payloads are surfaced as raw bytes.
    pub fn promote_buffers(mut self, value: bool) -> Self {
        self.promote_buffers = value;
        self
    }

    /// Set whether deprecated wrapper types are surfaced as plain values.
    pub fn promote_values(mut self, value: bool) -> Self {
        self.promote_values = value;
        self
    }

    /// Set the keys whose arrays yield unparsed documents.
    pub fn fields_as_raw(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields_as_raw = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set whether regular expression options are preserved verbatim.
    pub fn bson_regexp(mut self, value: bool) -> Self {
        self.bson_regexp = value;
        self
    }

    /// Set whether the buffer may extend past the declared document size.
    pub fn allow_object_smaller_than_buffer_size(mut self, value: bool) -> Self {
        self.allow_object_smaller_than_buffer_size = value;
        self
    }

    /// Set the starting offset into the input buffer.
    pub fn index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Set whether embedded documents are returned unparsed.
    pub fn raw(mut self, value: bool) -> Self {
        self.raw = value;
        self
    }

    /// Set the UTF-8 validation policy.
    pub fn utf8_validation(mut self, validation: Utf8Validation) -> Self {
        self.utf8_validation = validation;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.use_big_int64 && !self.promote_values {
            return Err(Error::invalid_options(
                "use_big_int64 cannot be combined with promote_values=false",
            ));
        }
        if self.use_big_int64 && !self.promote_longs {
            return Err(Error::invalid_options(
                "use_big_int64 cannot be combined with promote_longs=false",
            ));
        }
        match &self.utf8_validation {
            Utf8Validation::Only(keys) | Utf8Validation::Except(keys) if keys.is_empty() => {
                Err(Error::invalid_options(
                    "UTF-8 validation key set cannot be empty",
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Decode a [`Document`] from BSON bytes with the default options.
///
/// The entire buffer must hold exactly one document; see
/// [`DecodeOptions::allow_object_smaller_than_buffer_size`] and
/// [`DecodeOptions::index`] for decoding out of a larger buffer.
///
/// ```rust
/// let doc = ejson::de::from_slice(b"\x05\x00\x00\x00\x00")?;
/// assert!(doc.is_empty());
/// # Ok::<(), ejson::Error>(())
/// ```
pub fn from_slice(buf: &[u8]) -> Result<Document> {
    from_slice_with_options(buf, &DecodeOptions::default())
}

/// Decode a [`Document`] from BSON bytes.
pub fn from_slice_with_options(buf: &[u8], options: &DecodeOptions) -> Result<Document> {
    options.validate()?;
    raw::deserialize(buf, options)
}
