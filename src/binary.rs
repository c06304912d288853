//! Module containing functionality related to BSON binary values.

use std::fmt::{self, Display};

use crate::{base64, error::{Error, Result}, spec::BinarySubtype, uuid::Uuid};

/// Represents a BSON binary value.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Binary {
    /// The subtype of the bytes.
    pub subtype: BinarySubtype,

    /// The binary bytes.
    pub bytes: Vec<u8>,
}

impl Display for Binary {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Binary({:#x}, {})",
            u8::from(self.subtype),
            base64::encode(&self.bytes)
        )
    }
}

impl Binary {
    /// Creates a [`Binary`] from a base64 string and optional [`BinarySubtype`]. If the
    /// `subtype` argument is [`None`], the [`Binary`] constructed will default to
    /// [`BinarySubtype::Generic`].
    pub fn from_base64(
        input: impl AsRef<str>,
        subtype: impl Into<Option<BinarySubtype>>,
    ) -> Result<Self> {
        let bytes = base64::decode(input.as_ref())
            .map_err(|e| Error::malformed_string(format!("invalid base64: {}", e)))?;
        let subtype = match subtype.into() {
            Some(s) => s,
            None => BinarySubtype::Generic,
        };
        Ok(Binary { subtype, bytes })
    }

    /// Converts this [`Binary`] to a [`Uuid`] if it has subtype
    /// [`BinarySubtype::Uuid`] and exactly 16 bytes of data.
    pub fn to_uuid(&self) -> Option<Uuid> {
        if self.subtype != BinarySubtype::Uuid {
            return None;
        }
        let bytes: [u8; 16] = self.bytes.as_slice().try_into().ok()?;
        Some(Uuid::from_bytes(bytes))
    }
}

impl From<Uuid> for Binary {
    fn from(uuid: Uuid) -> Self {
        Binary {
            subtype: BinarySubtype::Uuid,
            bytes: uuid.bytes().to_vec(),
        }
    }
}
