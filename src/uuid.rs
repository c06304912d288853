//! A UUID type for BSON documents, surfaced by the decoder for well-formed
//! binary values with subtype 0x04.

use std::fmt;

use crate::error::{Error, Result};

/// A struct modeling a BSON UUID value (i.e. a Binary value with subtype 4).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uuid {
    uuid: uuid::Uuid,
}

impl Uuid {
    /// Creates a random UUID version 4 value.
    pub fn new() -> Self {
        Self {
            uuid: uuid::Uuid::new_v4(),
        }
    }

    /// Creates a [`Uuid`] from the provided hex string.
    pub fn parse_str(input: impl AsRef<str>) -> Result<Self> {
        let uuid = uuid::Uuid::parse_str(input.as_ref())
            .map_err(|e| Error::malformed_string(format!("invalid UUID string: {}", e)))?;
        Ok(Self { uuid })
    }

    /// Creates a [`Uuid`] from the provided bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self {
            uuid: uuid::Uuid::from_bytes(bytes),
        }
    }

    /// Returns the underlying bytes of this [`Uuid`].
    pub const fn bytes(self) -> [u8; 16] {
        *self.uuid.as_bytes()
    }
}

impl Default for Uuid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.uuid.hyphenated())
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Uuid").field(&self.uuid).finish()
    }
}

impl From<uuid::Uuid> for Uuid {
    fn from(uuid: uuid::Uuid) -> Self {
        Self { uuid }
    }
}

impl From<Uuid> for uuid::Uuid {
    fn from(uuid: Uuid) -> Self {
        uuid.uuid
    }
}
