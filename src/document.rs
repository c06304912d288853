//! A BSON document represented as an associative map with insertion ordering.

use std::{
    fmt::{self, Debug, Display, Formatter},
    iter::{Extend, FromIterator},
};

use indexmap::IndexMap;
pub use indexmap::map::{Entry, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};

use crate::{
    binary::Binary,
    bson::{Array, Bson, Timestamp},
    datetime::DateTime,
    decimal128::Decimal128,
    error::{Error, Result},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
};

/// A BSON document represented as an associative map with insertion ordering.
///
/// Entries iterate in the order they were inserted, which for decoded
/// documents is the order the elements appear on the wire.
#[derive(Clone, PartialEq, Default)]
pub struct Document {
    inner: IndexMap<String, Bson>,
}

impl Display for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str("{")?;

        let mut first = true;
        for (k, v) in self {
            if first {
                first = false;
                fmt.write_str(" ")?;
            } else {
                fmt.write_str(", ")?;
            }

            write!(fmt, "{}: {}", k, v)?;
        }

        write!(fmt, "{}}}", if !first { " " } else { "" })
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Document({:?})", self.inner)
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = IntoIter<String, Bson>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Bson);
    type IntoIter = Iter<'a, String, Bson>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<'a> IntoIterator for &'a mut Document {
    type Item = (&'a String, &'a mut Bson);
    type IntoIter = IterMut<'a, String, Bson>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter_mut()
    }
}

impl FromIterator<(String, Bson)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Bson)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl Extend<(String, Bson)> for Document {
    fn extend<T: IntoIterator<Item = (String, Bson)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl From<IndexMap<String, Bson>> for Document {
    fn from(tree: IndexMap<String, Bson>) -> Document {
        Document { inner: tree }
    }
}

impl Document {
    /// Creates a new empty Document.
    pub fn new() -> Document {
        Document {
            inner: IndexMap::new(),
        }
    }

    /// Gets an iterator over the entries of the map.
    pub fn iter(&self) -> Iter<'_, String, Bson> {
        self.into_iter()
    }

    /// Gets an iterator over the entries of the map with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, String, Bson> {
        self.into_iter()
    }

    /// Clears the document, removing all values.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns a reference to the Bson corresponding to the key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Bson> {
        self.inner.get(key.as_ref())
    }

    /// Gets a mutable reference to the Bson corresponding to the key.
    pub fn get_mut(&mut self, key: impl AsRef<str>) -> Option<&mut Bson> {
        self.inner.get_mut(key.as_ref())
    }

    fn get_with<'a, T>(
        &'a self,
        key: impl AsRef<str>,
        expected_type: ElementType,
        f: impl FnOnce(&'a Bson) -> Option<T>,
    ) -> Result<T> {
        let key = key.as_ref();
        let bson = self
            .get(key)
            .ok_or_else(Error::value_access_not_present)
            .map_err(|e| e.with_key(key))?;
        match f(bson) {
            Some(t) => Ok(t),
            None => Err(
                Error::value_access_unexpected_type(bson.element_type(), expected_type)
                    .with_key(key),
            ),
        }
    }

    /// Get a floating point value for this key if it exists and has the correct type.
    pub fn get_f64(&self, key: impl AsRef<str>) -> Result<f64> {
        self.get_with(key, ElementType::Double, Bson::as_f64)
    }

    /// Get a string slice for this key if it exists and has the correct type.
    pub fn get_str(&self, key: impl AsRef<str>) -> Result<&str> {
        self.get_with(key, ElementType::String, Bson::as_str)
    }

    /// Get a reference to an array for this key if it exists and has the correct type.
    pub fn get_array(&self, key: impl AsRef<str>) -> Result<&Array> {
        self.get_with(key, ElementType::Array, Bson::as_array)
    }

    /// Get a reference to a document for this key if it exists and has the correct type.
    pub fn get_document(&self, key: impl AsRef<str>) -> Result<&Document> {
        self.get_with(key, ElementType::EmbeddedDocument, Bson::as_document)
    }

    /// Get a bool value for this key if it exists and has the correct type.
    pub fn get_bool(&self, key: impl AsRef<str>) -> Result<bool> {
        self.get_with(key, ElementType::Boolean, Bson::as_bool)
    }

    /// Returns whether this key has a null value.
    pub fn is_null(&self, key: impl AsRef<str>) -> bool {
        self.get(key) == Some(&Bson::Null)
    }

    /// Get an i32 value for this key if it exists and has the correct type.
    pub fn get_i32(&self, key: impl AsRef<str>) -> Result<i32> {
        self.get_with(key, ElementType::Int32, Bson::as_i32)
    }

    /// Get an i64 value for this key if it exists and has the correct type.
    pub fn get_i64(&self, key: impl AsRef<str>) -> Result<i64> {
        self.get_with(key, ElementType::Int64, Bson::as_i64)
    }

    /// Get a timestamp value for this key if it exists and has the correct type.
    pub fn get_timestamp(&self, key: impl AsRef<str>) -> Result<Timestamp> {
        self.get_with(key, ElementType::Timestamp, Bson::as_timestamp)
    }

    /// Get a reference to a generic binary value for this key if it exists and
    /// has the correct type.
    pub fn get_binary_generic(&self, key: impl AsRef<str>) -> Result<&Vec<u8>> {
        self.get_with(key, ElementType::Binary, |bson| match bson {
            Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            }) => Some(bytes),
            _ => None,
        })
    }

    /// Get a reference to a Decimal128 value for this key if it exists and has
    /// the correct type.
    pub fn get_decimal128(&self, key: impl AsRef<str>) -> Result<&Decimal128> {
        self.get_with(key, ElementType::Decimal128, |bson| match bson {
            Bson::Decimal128(d) => Some(d),
            _ => None,
        })
    }

    /// Get an object id value for this key if it exists and has the correct type.
    pub fn get_object_id(&self, key: impl AsRef<str>) -> Result<ObjectId> {
        self.get_with(key, ElementType::ObjectId, Bson::as_object_id)
    }

    /// Get a reference to a UTC datetime value for this key if it exists and
    /// has the correct type.
    pub fn get_datetime(&self, key: impl AsRef<str>) -> Result<&DateTime> {
        self.get_with(key, ElementType::DateTime, Bson::as_datetime)
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    /// Gets a collection of all keys in the document.
    pub fn keys(&self) -> Keys<'_, String, Bson> {
        self.inner.keys()
    }

    /// Gets a collection of all values in the document.
    pub fn values(&self) -> Values<'_, String, Bson> {
        self.inner.values()
    }

    /// Returns the number of elements in the document.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the document contains no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Sets the value of the entry with the given key, and returns the entry's
    /// old value if any. Accepts any type that can be converted into Bson.
    pub fn insert<KT: Into<String>, BT: Into<Bson>>(&mut self, key: KT, val: BT) -> Option<Bson> {
        self.inner.insert(key.into(), val.into())
    }

    /// Takes the value of the entry out of the document, and returns it.
    ///
    /// This preserves the order of the remaining entries.
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Bson> {
        self.inner.shift_remove(key.as_ref())
    }

    /// Gets the given key's corresponding entry in the map for in-place manipulation.
    pub fn entry(&mut self, k: impl Into<String>) -> Entry<'_, String, Bson> {
        self.inner.entry(k.into())
    }
}

#[cfg(test)]
mod test {
    use crate::{doc, Bson, ErrorKind, ValueAccessErrorKind};
    use assert_matches::assert_matches;

    #[test]
    fn ordered_insertion_is_preserved() {
        let mut doc = crate::Document::new();
        doc.insert("one", 1i32);
        doc.insert("two", "2");
        doc.insert("three", true);

        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["one", "two", "three"]);
    }

    #[test]
    fn remove_preserves_order() {
        let mut doc = doc! { "a": 1, "b": 2, "c": 3 };
        doc.remove("b");
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn typed_getters() {
        let doc = doc! { "n": 5i32, "s": "hi" };
        assert_eq!(doc.get_i32("n").unwrap(), 5);
        assert_eq!(doc.get_str("s").unwrap(), "hi");

        let err = doc.get_str("n").unwrap_err();
        assert_matches!(
            err.kind,
            ErrorKind::ValueAccess {
                kind: ValueAccessErrorKind::UnexpectedType { .. }
            }
        );
        assert_eq!(err.key.as_deref(), Some("n"));

        let err = doc.get_bool("missing").unwrap_err();
        assert_matches!(
            err.kind,
            ErrorKind::ValueAccess {
                kind: ValueAccessErrorKind::NotPresent
            }
        );
    }

    #[test]
    fn duplicate_keys_are_last_write_wins() {
        let mut doc = crate::Document::new();
        doc.insert("k", 1i32);
        doc.insert("k", 2i32);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get("k"), Some(&Bson::Int32(2)));
    }
}
