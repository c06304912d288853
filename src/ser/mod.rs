//! Streaming Extended JSON serializer.
//!
//! The serializer walks a [`Bson`] tree and produces its [Extended JSON](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/)
//! rendering as a lazy sequence of string chunks, so arbitrarily large
//! documents can be encoded without materializing the full output. The
//! concatenation of the chunks is byte-identical to the non-streaming
//! encoding; [`stringify`] is implemented as exactly that concatenation.
//!
//! ```rust
//! use ejson::{doc, ser, Bson};
//!
//! let value = Bson::Document(doc! { "a": 1, "b": "hello", "c": true });
//! assert_eq!(ser::stringify(&value)?, r#"{"a":1,"b":"hello","c":true}"#);
//! # Ok::<(), ejson::Error>(())
//! ```

mod stream;

pub use stream::Chunks;

use crate::{bson::Bson, error::Result};

/// Options used to configure Extended JSON output.
#[derive(Clone, Copy, Debug)]
pub struct StringifyOptions {
    /// When `true` (the default), common numeric and date values render as
    /// plain JSON for readability. This is lossy: the exact numeric BSON type
    /// cannot be recovered from relaxed output.
    pub relaxed: bool,

    /// When `true`, binary values and regular expressions use the legacy
    /// Extended JSON v1 shapes (`{"$binary": "...", "$type": "..."}` and
    /// `{"$regex": "...", "$options": "..."}`).
    pub legacy: bool,
}

impl Default for StringifyOptions {
    fn default() -> Self {
        StringifyOptions {
            relaxed: true,
            legacy: false,
        }
    }
}

impl StringifyOptions {
    /// Set whether output is relaxed rather than canonical.
    pub fn relaxed(mut self, value: bool) -> Self {
        self.relaxed = value;
        self
    }

    /// Set whether legacy projections are used.
    pub fn legacy(mut self, value: bool) -> Self {
        self.legacy = value;
        self
    }
}

/// Indentation for Extended JSON output.
#[derive(Clone, Debug, Default)]
pub enum Indent {
    /// Compact output with no whitespace.
    #[default]
    None,
    /// Indent each level by the given number of spaces, capped at 10.
    Spaces(usize),
    /// Indent each level by the given string, used verbatim.
    Literal(String),
}

impl Indent {
    fn unit(&self) -> String {
        match self {
            Indent::None => String::new(),
            Indent::Spaces(n) => " ".repeat((*n).min(10)),
            Indent::Literal(s) => s.clone(),
        }
    }
}

impl From<usize> for Indent {
    fn from(n: usize) -> Self {
        Indent::Spaces(n)
    }
}

impl From<&str> for Indent {
    fn from(s: &str) -> Self {
        Indent::Literal(s.to_owned())
    }
}

impl From<String> for Indent {
    fn from(s: String) -> Self {
        Indent::Literal(s)
    }
}

/// Filters and rewrites entries before they are projected.
pub enum Replacer {
    /// Restrict document keys to those listed. Entries keep their original
    /// insertion order; the list does not apply to array elements.
    Keys(Vec<String>),

    /// Invoked once per document entry and array element before projection.
    /// Returning `None` omits the entry from a document and emits `null` for
    /// an array element; array elements see their decimal index as the key.
    Function(Box<dyn FnMut(&str, &Bson) -> Option<Bson>>),
}

impl Replacer {
    /// An allow-list replacer.
    pub fn keys(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Replacer::Keys(keys.into_iter().map(Into::into).collect())
    }

    /// A function replacer.
    pub fn function(f: impl FnMut(&str, &Bson) -> Option<Bson> + 'static) -> Self {
        Replacer::Function(Box::new(f))
    }
}

/// A configurable Extended JSON encoding of a single value.
///
/// ```rust
/// use ejson::{doc, ser::Stringifier, Bson};
///
/// let value = Bson::Document(doc! { "a": [1, 2] });
/// let pretty = Stringifier::new(&value).indent(2).into_string()?;
/// assert_eq!(pretty, "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
/// # Ok::<(), ejson::Error>(())
/// ```
pub struct Stringifier<'a> {
    root: &'a Bson,
    options: StringifyOptions,
    indent: Indent,
    replacer: Option<Replacer>,
}

impl<'a> Stringifier<'a> {
    /// Creates a new [`Stringifier`] for the given value with default options.
    pub fn new(root: &'a Bson) -> Self {
        Stringifier {
            root,
            options: StringifyOptions::default(),
            indent: Indent::None,
            replacer: None,
        }
    }

    /// Replace the full options record.
    pub fn options(mut self, options: StringifyOptions) -> Self {
        self.options = options;
        self
    }

    /// Set whether output is relaxed rather than canonical.
    pub fn relaxed(mut self, value: bool) -> Self {
        self.options.relaxed = value;
        self
    }

    /// Set whether legacy projections are used.
    pub fn legacy(mut self, value: bool) -> Self {
        self.options.legacy = value;
        self
    }

    /// Set the indentation.
    pub fn indent(mut self, indent: impl Into<Indent>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Set the replacer.
    pub fn replacer(mut self, replacer: Replacer) -> Self {
        self.replacer = Some(replacer);
        self
    }

    /// Returns the lazy chunk sequence for this encoding.
    ///
    /// The sequence is finite and non-restartable; after yielding an error it
    /// is exhausted. Concatenating the chunks of a successful encoding yields
    /// the same bytes as [`Stringifier::into_string`].
    pub fn chunks(self) -> Chunks<'a> {
        Chunks::new(self.root, self.options, self.indent.unit(), self.replacer)
    }

    /// Encodes the value into a single string.
    pub fn into_string(self) -> Result<String> {
        let mut out = String::new();
        for chunk in self.chunks() {
            out.push_str(&chunk?);
        }
        Ok(out)
    }
}

/// Encode a value as Extended JSON with the default options.
pub fn stringify(value: &Bson) -> Result<String> {
    Stringifier::new(value).into_string()
}

/// Encode a value as Extended JSON.
pub fn stringify_with_options(value: &Bson, options: StringifyOptions) -> Result<String> {
    Stringifier::new(value).options(options).into_string()
}
