//! Contains the error-related types for the `ejson` crate.

use thiserror::Error;

/// The result type for all methods that can return an error in the `ejson` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `ejson` crate.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// An optional message describing the error.
    pub message: Option<String>,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The array index associated with the error, if any.
    pub index: Option<usize>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BSON error")?;

        if let Some(key) = self.key.as_deref() {
            write!(f, " at key \"{key}\"")?;
        } else if let Some(index) = self.index {
            write!(f, " at array index {index}")?;
        }

        write!(f, ". Kind: {}", self.kind)?;
        if let Some(ref message) = self.message {
            write!(f, ". Message: {}", message)?;
        }

        write!(f, ".")
    }
}

/// The types of errors that can occur in the `ejson` crate.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An error related to the [`DateTime`](crate::DateTime) type occurred.
    #[error("A DateTime-related error occurred")]
    #[non_exhaustive]
    DateTime {},

    /// Malformed BSON bytes were encountered: framing, terminator, or length violations.
    #[error("Malformed BSON bytes")]
    #[non_exhaustive]
    MalformedBytes {},

    /// A length-prefixed string did not match its declared length or terminator.
    #[error("Malformed length-prefixed string")]
    #[non_exhaustive]
    MalformedString {},

    /// Invalid UTF-8 bytes were encountered while validation was enabled.
    #[error("Invalid UTF-8")]
    #[non_exhaustive]
    Utf8Encoding {},

    /// An unrecognized element type tag was encountered.
    #[error("Unrecognized element type {element_type:#04x}")]
    #[non_exhaustive]
    UnrecognizedElementType {
        /// The unrecognized type tag.
        element_type: u8,
    },

    /// The provided options were self-contradictory or malformed.
    #[error("Invalid options")]
    #[non_exhaustive]
    InvalidOptions {},

    /// An object or array appeared in its own ancestor chain during encoding.
    #[error("Circular reference")]
    #[non_exhaustive]
    CircularReference {},

    /// An error occurred when attempting to access a value in a document.
    #[error("An error occurred when attempting to access a document value: {kind}")]
    #[non_exhaustive]
    ValueAccess {
        /// The kind of error that occurred.
        kind: ValueAccessErrorKind,
    },
}

/// The types of errors that can occur when attempting to access a value in a document.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ValueAccessErrorKind {
    /// No value for the specified key was present in the document.
    #[error("the key was not present in the document")]
    NotPresent,

    /// The type of the value in the document did not match the requested type.
    #[error("expected type {expected:?}, got type {actual:?}")]
    #[non_exhaustive]
    UnexpectedType {
        /// The actual type of the value.
        actual: crate::spec::ElementType,

        /// The expected type of the value.
        expected: crate::spec::ElementType,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            index: None,
            message: None,
        }
    }
}

impl Error {
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub(crate) fn with_message(mut self, message: impl ToString) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub(crate) fn datetime(message: impl ToString) -> Self {
        Self::from(ErrorKind::DateTime {}).with_message(message)
    }

    pub(crate) fn malformed_bytes(message: impl ToString) -> Self {
        Self::from(ErrorKind::MalformedBytes {}).with_message(message)
    }

    pub(crate) fn malformed_string(message: impl ToString) -> Self {
        Self::from(ErrorKind::MalformedString {}).with_message(message)
    }

    pub(crate) fn utf8_encoding(message: impl ToString) -> Self {
        Self::from(ErrorKind::Utf8Encoding {}).with_message(message)
    }

    pub(crate) fn unrecognized_element_type(element_type: u8) -> Self {
        ErrorKind::UnrecognizedElementType { element_type }.into()
    }

    pub(crate) fn invalid_options(message: impl ToString) -> Self {
        Self::from(ErrorKind::InvalidOptions {}).with_message(message)
    }

    pub(crate) fn circular_reference() -> Self {
        Self::from(ErrorKind::CircularReference {})
            .with_message("Converting circular structure to Extended JSON")
    }

    pub(crate) fn value_access_not_present() -> Self {
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::NotPresent,
        }
        .into()
    }

    pub(crate) fn value_access_unexpected_type(
        actual: crate::spec::ElementType,
        expected: crate::spec::ElementType,
    ) -> Self {
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::UnexpectedType { actual, expected },
        }
        .into()
    }

    #[cfg(test)]
    pub(crate) fn is_malformed_bytes(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedBytes { .. })
    }
}
