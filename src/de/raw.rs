//! Single-pass decoding of BSON bytes into a document tree.

use crate::{
    binary::Binary,
    bson::{Array, Bson, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    datetime::DateTime,
    dbref::DbRef,
    decimal128::Decimal128,
    document::Document,
    error::{Error, Result},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
};

use super::{DecodeOptions, Utf8Validation, MIN_BSON_DOCUMENT_SIZE, MIN_CODE_WITH_SCOPE_SIZE};

pub(crate) fn deserialize(buf: &[u8], options: &DecodeOptions) -> Result<Document> {
    let index = options.index;

    if buf.len().saturating_sub(index) < MIN_BSON_DOCUMENT_SIZE as usize {
        return Err(Error::malformed_bytes(format!(
            "buffer must contain at least {} bytes at offset {}, but it only has {}",
            MIN_BSON_DOCUMENT_SIZE,
            index,
            buf.len()
        )));
    }

    let mut decoder = Decoder {
        buf,
        index,
        options,
    };
    let size = decoder.read_i32()?;
    if size < MIN_BSON_DOCUMENT_SIZE {
        return Err(Error::malformed_bytes(format!(
            "declared document size {} must be at least {}",
            size, MIN_BSON_DOCUMENT_SIZE
        )));
    }

    let end = index
        .checked_add(size as usize)
        .ok_or_else(|| Error::malformed_bytes("declared document size overflows"))?;
    if end > buf.len() {
        return Err(Error::malformed_bytes(format!(
            "declared document size {} at offset {} overruns the {}-byte buffer",
            size,
            index,
            buf.len()
        )));
    }
    if !options.allow_object_smaller_than_buffer_size && end != buf.len() {
        return Err(Error::malformed_bytes(format!(
            "buffer length {} must equal offset {} plus declared document size {}",
            buf.len(),
            index,
            size
        )));
    }
    if buf[end - 1] != 0 {
        return Err(Error::malformed_bytes(
            "expected the final byte of the document to be 0x00",
        ));
    }

    decoder.index = index;
    let ctx = Ctx {
        validation: Validation::Policy(&options.utf8_validation),
        raw: options.raw,
        array: false,
        // The entry point returns a Document, so the root is never rewritten
        // even when it matches the DBRef shape.
        rewrite_dbref: false,
    };
    match decoder.read_object(ctx)? {
        Bson::Document(doc) => Ok(doc),
        _ => unreachable!("non-array, non-rewritten object decodes to a document"),
    }
}

/// UTF-8 validation as applied at one nesting level: the root sees the
/// configured policy, every nested document or array inherits the setting
/// resolved for the key it lives under.
#[derive(Clone, Copy)]
enum Validation<'o> {
    Policy(&'o Utf8Validation),
    Flat(bool),
}

#[derive(Clone, Copy)]
struct Ctx<'o> {
    validation: Validation<'o>,
    raw: bool,
    array: bool,
    rewrite_dbref: bool,
}

struct Decoder<'a, 'o> {
    buf: &'a [u8],
    index: usize,
    options: &'o DecodeOptions,
}

impl<'a> Decoder<'a, '_> {
    fn remaining(&self) -> usize {
        self.buf.len() - self.index
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::malformed_bytes(format!(
                "expected {} more bytes, but only {} remain",
                len,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.index..self.index + len];
        self.index += len;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_slice(1)?[0])
    }

    fn read_i32(&mut self) -> Result<i32> {
        let arr = self.read_slice(4)?.try_into().expect("slice length is 4");
        Ok(i32::from_le_bytes(arr))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let arr = self.read_slice(4)?.try_into().expect("slice length is 4");
        Ok(u32::from_le_bytes(arr))
    }

    fn read_i64(&mut self) -> Result<i64> {
        let arr = self.read_slice(8)?.try_into().expect("slice length is 8");
        Ok(i64::from_le_bytes(arr))
    }

    fn read_f64(&mut self) -> Result<f64> {
        let arr = self.read_slice(8)?.try_into().expect("slice length is 8");
        Ok(f64::from_le_bytes(arr))
    }

    /// Read the bytes of a NUL-terminated CString, consuming the terminator.
    fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
        let start = self.index;
        match self.buf[start..].iter().position(|b| *b == 0) {
            Some(pos) => {
                self.index = start + pos + 1;
                Ok(&self.buf[start..start + pos])
            }
            None => Err(Error::malformed_bytes("unterminated CString")),
        }
    }

    fn read_cstring(&mut self, validate: bool) -> Result<String> {
        let bytes = self.read_cstring_bytes()?;
        decode_utf8(bytes, validate)
    }

    /// Read a length-prefixed string: an i32 length that includes the
    /// trailing NUL, the content bytes, and the NUL.
    fn read_string(&mut self, validate: bool) -> Result<String> {
        let len = self.read_i32()?;
        if len < 1 {
            return Err(Error::malformed_string(format!(
                "string length must be at least 1, got {}",
                len
            )));
        }
        let len = len as usize;
        if self.remaining() < len {
            return Err(Error::malformed_string(format!(
                "string of length {} overruns the buffer",
                len
            )));
        }
        let bytes = &self.buf[self.index..self.index + len];
        if bytes[len - 1] != 0 {
            return Err(Error::malformed_string("string is not null-terminated"));
        }
        self.index += len;
        decode_utf8(&bytes[..len - 1], validate)
    }

    /// Read one document or array, including its size prefix and terminator.
    fn read_object(&mut self, ctx: Ctx) -> Result<Bson> {
        let start = self.index;
        let size = self.read_i32()?;
        if size < MIN_BSON_DOCUMENT_SIZE || start + size as usize > self.buf.len() {
            return Err(Error::malformed_bytes(format!(
                "bad embedded document length {} at offset {}",
                size, start
            )));
        }
        let size = size as usize;
        let stop = start + size;
        if self.buf[stop - 1] != 0 {
            return Err(Error::malformed_bytes(
                "expected the final byte of the document to be 0x00",
            ));
        }

        let mut doc = Document::new();
        let mut array = Array::new();
        let mut is_possible_dbref = true;

        loop {
            if self.index >= stop {
                return Err(Error::malformed_bytes(
                    "document ran past its declared size without a terminator",
                ));
            }
            let tag = self.read_u8()?;
            if tag == 0x00 {
                break;
            }

            let key_bytes = self.read_cstring_bytes()?;
            // The validation decision for a key governs the key's own bytes,
            // so per-key policies look the key up through a lossy rendering.
            let key = match ctx.validation {
                Validation::Flat(validate) => decode_utf8(key_bytes, validate)?,
                Validation::Policy(policy) => {
                    let key = String::from_utf8_lossy(key_bytes).into_owned();
                    if policy.validate_key(&key) {
                        try_to_str(key_bytes)?;
                    }
                    key
                }
            };
            let validate = match ctx.validation {
                Validation::Flat(validate) => validate,
                Validation::Policy(policy) => policy.validate_key(&key),
            };

            let value = self
                .read_element(tag, &key, ctx, validate)
                .map_err(|e| {
                    if ctx.array {
                        if e.key.is_none() && e.index.is_none() {
                            e.with_index(array.len())
                        } else {
                            e
                        }
                    } else if e.key.is_none() {
                        e.with_key(&key)
                    } else {
                        e
                    }
                })?;

            if ctx.array {
                // Array keys are synthetic decimal indices; the positional
                // counter replaces them.
                array.push(value);
            } else {
                if key.starts_with('$') && !matches!(key.as_str(), "$ref" | "$id" | "$db") {
                    is_possible_dbref = false;
                }
                doc.insert(key, value);
            }
        }

        if self.index - start != size {
            return Err(Error::malformed_bytes(format!(
                "document consumed {} bytes but declared {}",
                self.index - start,
                size
            )));
        }

        if ctx.array {
            return Ok(Bson::Array(array));
        }
        if ctx.rewrite_dbref && is_possible_dbref {
            return Ok(rewrite_dbref(doc));
        }
        Ok(Bson::Document(doc))
    }

    /// Copy out the raw bytes of an embedded document or array without
    /// parsing its elements.
    fn read_raw_object(&mut self) -> Result<Bson> {
        let start = self.index;
        let size = self.read_i32()?;
        if size < MIN_BSON_DOCUMENT_SIZE || start + size as usize > self.buf.len() {
            return Err(Error::malformed_bytes(format!(
                "bad embedded document length {} at offset {}",
                size, start
            )));
        }
        self.index = start;
        Ok(Bson::Bytes(self.read_slice(size as usize)?.to_vec()))
    }

    fn read_element(&mut self, tag: u8, key: &str, ctx: Ctx, validate: bool) -> Result<Bson> {
        let child = |raw: bool, array: bool| Ctx {
            validation: Validation::Flat(validate),
            raw,
            array,
            rewrite_dbref: true,
        };

        let value = match ElementType::from(tag) {
            Some(ElementType::Double) => Bson::Double(self.read_f64()?),
            Some(ElementType::String) => Bson::String(self.read_string(validate)?),
            Some(ElementType::EmbeddedDocument) => {
                if ctx.raw {
                    self.read_raw_object()?
                } else {
                    self.read_object(child(false, false))?
                }
            }
            Some(ElementType::Array) => {
                if ctx.raw {
                    self.read_raw_object()?
                } else {
                    // A listed key hands the array's embedded documents through
                    // unparsed.
                    let raw_children = self.options.fields_as_raw.contains(key);
                    self.read_object(child(raw_children, true))?
                }
            }
            Some(ElementType::Binary) => self.read_binary()?,
            Some(ElementType::Undefined) => Bson::Undefined,
            Some(ElementType::ObjectId) => {
                let bytes: [u8; 12] = self.read_slice(12)?.try_into().expect("length is 12");
                Bson::ObjectId(ObjectId::from_bytes(bytes))
            }
            Some(ElementType::Boolean) => match self.read_u8()? {
                0 => Bson::Boolean(false),
                1 => Bson::Boolean(true),
                other => {
                    return Err(Error::malformed_bytes(format!(
                        "boolean must be stored as 0 or 1, got {}",
                        other
                    )));
                }
            },
            Some(ElementType::DateTime) => {
                // The int64 is UTC milliseconds since the Unix epoch.
                Bson::DateTime(DateTime::from_millis(self.read_i64()?))
            }
            Some(ElementType::Null) => Bson::Null,
            Some(ElementType::RegularExpression) => {
                let pattern = self.read_cstring(validate)?;
                let options = self.read_cstring(validate)?;
                let options = if self.options.bson_regexp {
                    options
                } else {
                    // Keep the options a JavaScript host understands, mapping
                    // dotall to global the way the wire format historically has.
                    options
                        .chars()
                        .filter_map(|c| match c {
                            'm' => Some('m'),
                            'i' => Some('i'),
                            's' => Some('g'),
                            _ => None,
                        })
                        .collect()
                };
                Bson::RegularExpression(Regex { pattern, options })
            }
            Some(ElementType::DbPointer) => {
                let namespace = self.read_string(validate)?;
                let bytes: [u8; 12] = self.read_slice(12)?.try_into().expect("length is 12");
                Bson::DbPointer(DbPointer {
                    namespace,
                    id: ObjectId::from_bytes(bytes),
                })
            }
            Some(ElementType::JavaScriptCode) => {
                Bson::JavaScriptCode(self.read_string(validate)?)
            }
            Some(ElementType::Symbol) => {
                let symbol = self.read_string(validate)?;
                if self.options.promote_values {
                    Bson::String(symbol)
                } else {
                    Bson::Symbol(symbol)
                }
            }
            Some(ElementType::JavaScriptCodeWithScope) => {
                self.read_code_with_scope(ctx, validate)?
            }
            Some(ElementType::Int32) => Bson::Int32(self.read_i32()?),
            Some(ElementType::Timestamp) => {
                // Two unsigned halves; assembling them through a signed shift
                // would corrupt values with the high bit set.
                let increment = self.read_u32()?;
                let time = self.read_u32()?;
                Bson::Timestamp(Timestamp { time, increment })
            }
            Some(ElementType::Int64) => Bson::Int64(self.read_i64()?),
            Some(ElementType::Decimal128) => {
                let bytes: [u8; 16] = self.read_slice(16)?.try_into().expect("length is 16");
                Bson::Decimal128(Decimal128::from_bytes(bytes))
            }
            Some(ElementType::MinKey) => Bson::MinKey,
            Some(ElementType::MaxKey) => Bson::MaxKey,
            None => return Err(Error::unrecognized_element_type(tag)),
        };
        Ok(value)
    }

    fn read_binary(&mut self) -> Result<Bson> {
        let declared = self.read_i32()?;
        if declared < 0 {
            return Err(Error::malformed_bytes(format!(
                "negative binary size {}",
                declared
            )));
        }
        let subtype = BinarySubtype::from(self.read_u8()?);

        let mut len = declared as usize;
        if subtype == BinarySubtype::BinaryOld {
            // Subtype 0x02 nests a second length prefix that must account for
            // exactly the remaining payload.
            let inner = self.read_i32()?;
            if inner < 0 {
                return Err(Error::malformed_bytes(format!(
                    "negative binary size {} in subtype 0x02",
                    inner
                )));
            }
            if inner as i64 > declared as i64 - 4 {
                return Err(Error::malformed_bytes(
                    "binary subtype 0x02 inner size is larger than the declared size",
                ));
            }
            if (inner as i64) < declared as i64 - 4 {
                return Err(Error::malformed_bytes(
                    "binary subtype 0x02 inner size is smaller than the declared size",
                ));
            }
            len = inner as usize;
        }

        let bytes = self.read_slice(len)?.to_vec();
        if self.options.promote_buffers && self.options.promote_values {
            return Ok(Bson::Bytes(bytes));
        }

        let binary = Binary { subtype, bytes };
        if let Some(uuid) = binary.to_uuid() {
            return Ok(Bson::Uuid(uuid));
        }
        Ok(Bson::Binary(binary))
    }

    fn read_code_with_scope(&mut self, ctx: Ctx, validate: bool) -> Result<Bson> {
        let total_size = self.read_i32()?;
        if total_size < MIN_CODE_WITH_SCOPE_SIZE {
            return Err(Error::malformed_bytes(format!(
                "code with scope size {} is below the minimum of {}",
                total_size, MIN_CODE_WITH_SCOPE_SIZE
            )));
        }

        let string_size = i32::from_le_bytes(
            self.buf
                .get(self.index..self.index + 4)
                .ok_or_else(|| Error::malformed_bytes("code with scope overruns the buffer"))?
                .try_into()
                .expect("slice length is 4"),
        );
        let code = self.read_string(validate)?;

        let scope_start = self.index;
        let scope = self.read_object(Ctx {
            validation: Validation::Flat(validate),
            raw: ctx.raw,
            array: false,
            // A scope is a plain binding map, never a reference.
            rewrite_dbref: false,
        })?;
        let scope = match scope {
            Bson::Document(doc) => doc,
            _ => unreachable!("non-array, non-rewritten object decodes to a document"),
        };
        let scope_size = (self.index - scope_start) as i64;

        let expected = 4 + 4 + string_size as i64 + scope_size;
        if (total_size as i64) > expected {
            return Err(Error::malformed_bytes(
                "code with scope total size is too long, it clips the outer document",
            ));
        }
        if (total_size as i64) < expected {
            return Err(Error::malformed_bytes(
                "code with scope total size is too short, it truncates the scope",
            ));
        }

        Ok(Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
            code,
            scope,
        }))
    }
}

fn rewrite_dbref(doc: Document) -> Bson {
    let shape_matches = matches!(doc.get("$ref"), Some(Bson::String(_)))
        && doc.get("$id").is_some()
        && matches!(doc.get("$db"), None | Some(Bson::String(_)));
    if !shape_matches {
        return Bson::Document(doc);
    }

    let mut collection = None;
    let mut id = None;
    let mut db = None;
    let mut extra = Document::new();
    for (key, value) in doc {
        if key == "$ref" {
            if let Bson::String(s) = value {
                collection = Some(s);
            }
        } else if key == "$id" {
            id = Some(value);
        } else if key == "$db" {
            if let Bson::String(s) = value {
                db = Some(s);
            }
        } else {
            extra.insert(key, value);
        }
    }

    Bson::DbRef(DbRef {
        collection: collection.expect("$ref presence was checked"),
        id: Box::new(id.expect("$id presence was checked")),
        db,
        extra,
    })
}

fn try_to_str(data: &[u8]) -> Result<&str> {
    simdutf8::basic::from_utf8(data).map_err(|_| Error::utf8_encoding("invalid UTF-8 bytes"))
}

fn decode_utf8(data: &[u8], validate: bool) -> Result<String> {
    if validate {
        Ok(try_to_str(data)?.to_owned())
    } else {
        Ok(String::from_utf8_lossy(data).into_owned())
    }
}
