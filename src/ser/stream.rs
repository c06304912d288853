//! The chunk-producing encoder: an explicit stack of container frames and a
//! `next_chunk` that advances to the next chunk boundary.

use std::borrow::Cow;

use ahash::AHashSet;

use crate::{
    bson::Bson,
    document::{Document, Iter},
    error::{Error, Result},
};

use super::{Replacer, StringifyOptions};

/// Soft output-buffer threshold. The buffer is yielded at the first element
/// boundary at which it has grown past this size.
const CHUNK_SIZE: usize = 64 * 1024;

/// The largest integer a 64-bit float represents exactly.
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// The lazy chunk sequence produced by a
/// [`Stringifier`](crate::ser::Stringifier).
pub struct Chunks<'a> {
    machine: Option<Machine<'a>>,
}

impl<'a> Chunks<'a> {
    pub(super) fn new(
        root: &'a Bson,
        options: StringifyOptions,
        indent_unit: String,
        replacer: Option<Replacer>,
    ) -> Self {
        Chunks {
            machine: Some(Machine {
                root: Some(root),
                stack: Vec::new(),
                seen: AHashSet::new(),
                buf: String::new(),
                options,
                indent_unit,
                replacer,
            }),
        }
    }
}

impl Iterator for Chunks<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let machine = self.machine.as_mut()?;
        match machine.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.machine = None;
                None
            }
            Err(e) => {
                self.machine = None;
                Some(Err(e))
            }
        }
    }
}

enum Frame<'a> {
    Doc {
        iter: Iter<'a, String, Bson>,
        first: bool,
        addr: usize,
    },
    Arr {
        iter: std::slice::Iter<'a, Bson>,
        first: bool,
        index: usize,
        addr: usize,
    },
}

enum Pulled<'a> {
    DocEntry {
        key: &'a str,
        value: &'a Bson,
        was_first: bool,
    },
    ArrEntry {
        key: String,
        value: &'a Bson,
        was_first: bool,
    },
    Close {
        bracket: char,
        empty: bool,
        addr: usize,
    },
}

enum Decision<'v> {
    /// Entry is omitted entirely.
    Omit,
    /// Array element replaced by `null`.
    Null,
    Borrowed(&'v Bson),
    Owned(Bson),
}

struct Machine<'a> {
    /// The value to encode; taken on the first `next_chunk` call.
    root: Option<&'a Bson>,
    stack: Vec<Frame<'a>>,
    /// Addresses of the containers currently on the stack.
    seen: AHashSet<usize>,
    buf: String,
    options: StringifyOptions,
    indent_unit: String,
    replacer: Option<Replacer>,
}

impl<'a> Machine<'a> {
    fn next_chunk(&mut self) -> Result<Option<String>> {
        if let Some(root) = self.root.take() {
            self.begin_value(root)?;
        }

        while !self.stack.is_empty() && self.buf.len() < CHUNK_SIZE {
            self.advance()?;
        }

        if self.buf.is_empty() {
            Ok(None)
        } else {
            Ok(Some(std::mem::take(&mut self.buf)))
        }
    }

    /// Process one entry (or closer) of the innermost open container.
    fn advance(&mut self) -> Result<()> {
        let pulled = match self.stack.last_mut().expect("advance requires an open frame") {
            Frame::Doc { iter, first, addr } => match iter.next() {
                Some((key, value)) => Pulled::DocEntry {
                    key: key.as_str(),
                    value,
                    was_first: *first,
                },
                None => Pulled::Close {
                    bracket: '}',
                    empty: *first,
                    addr: *addr,
                },
            },
            Frame::Arr {
                iter,
                first,
                index,
                addr,
            } => match iter.next() {
                Some(value) => {
                    let key = index.to_string();
                    *index += 1;
                    Pulled::ArrEntry {
                        key,
                        value,
                        was_first: *first,
                    }
                }
                None => Pulled::Close {
                    bracket: ']',
                    empty: *first,
                    addr: *addr,
                },
            },
        };

        match pulled {
            Pulled::Close {
                bracket,
                empty,
                addr,
            } => {
                self.stack.pop();
                self.seen.remove(&addr);
                if !empty {
                    self.newline_indent(self.stack.len());
                }
                self.buf.push(bracket);
            }
            Pulled::DocEntry {
                key,
                value,
                was_first,
            } => match self.apply_replacer(key, value, false) {
                Decision::Omit | Decision::Null => {}
                Decision::Borrowed(value) => {
                    self.begin_entry(Some(key), was_first);
                    self.begin_value(value)?;
                }
                Decision::Owned(value) => {
                    self.begin_entry(Some(key), was_first);
                    let depth = self.stack.len();
                    self.write_value(&value, depth)?;
                }
            },
            Pulled::ArrEntry {
                key,
                value,
                was_first,
            } => match self.apply_replacer(&key, value, true) {
                Decision::Omit | Decision::Null => {
                    self.begin_entry(None, was_first);
                    self.buf.push_str("null");
                }
                Decision::Borrowed(value) => {
                    self.begin_entry(None, was_first);
                    self.begin_value(value)?;
                }
                Decision::Owned(value) => {
                    self.begin_entry(None, was_first);
                    let depth = self.stack.len();
                    self.write_value(&value, depth)?;
                }
            },
        }

        Ok(())
    }

    /// Write the separator, indentation, and (for documents) the key of the
    /// next emitted entry, and clear the enclosing frame's first-entry flag.
    fn begin_entry(&mut self, key: Option<&str>, was_first: bool) {
        if !was_first {
            self.buf.push(',');
        }
        self.newline_indent(self.stack.len());
        if let Some(key) = key {
            push_json_string(&mut self.buf, key);
            self.buf.push(':');
            if !self.indent_unit.is_empty() {
                self.buf.push(' ');
            }
        }
        match self.stack.last_mut() {
            Some(Frame::Doc { first, .. }) | Some(Frame::Arr { first, .. }) => *first = false,
            None => {}
        }
    }

    /// Start encoding a value from the live tree. Containers open a frame so
    /// that their entries become suspension points; everything else is
    /// written atomically.
    fn begin_value(&mut self, value: &'a Bson) -> Result<()> {
        match value {
            Bson::Document(doc) => {
                self.enter(value)?;
                self.buf.push('{');
                self.stack.push(Frame::Doc {
                    iter: doc.iter(),
                    first: true,
                    addr: addr_of(value),
                });
                Ok(())
            }
            Bson::Array(arr) => {
                self.enter(value)?;
                self.buf.push('[');
                self.stack.push(Frame::Arr {
                    iter: arr.iter(),
                    first: true,
                    index: 0,
                    addr: addr_of(value),
                });
                Ok(())
            }
            other => {
                let depth = self.stack.len();
                self.write_value(other, depth)
            }
        }
    }

    fn enter(&mut self, value: &Bson) -> Result<()> {
        if !self.seen.insert(addr_of(value)) {
            return Err(Error::circular_reference());
        }
        Ok(())
    }

    fn apply_replacer<'v>(&mut self, key: &str, value: &'v Bson, in_array: bool) -> Decision<'v> {
        match &mut self.replacer {
            None => Decision::Borrowed(value),
            Some(Replacer::Keys(keys)) => {
                if in_array || keys.iter().any(|k| k == key) {
                    Decision::Borrowed(value)
                } else {
                    Decision::Omit
                }
            }
            Some(Replacer::Function(f)) => match f(key, value) {
                None if in_array => Decision::Null,
                None => Decision::Omit,
                Some(replaced) if replaced == *value => Decision::Borrowed(value),
                Some(replaced) => Decision::Owned(replaced),
            },
        }
    }

    /// Write a value in full, without suspension points. Used for scalars and
    /// typed wrappers everywhere, and for whole containers when they were
    /// produced by a replacer or live inside a typed wrapper.
    fn write_value(&mut self, value: &Bson, depth: usize) -> Result<()> {
        match value {
            Bson::Document(doc) => self.write_document(doc, depth),
            Bson::Array(arr) => self.write_array(arr, depth),
            other => {
                let json = project(other, self.options);
                self.write_json(&json, depth)
            }
        }
    }

    fn write_document(&mut self, doc: &Document, depth: usize) -> Result<()> {
        self.buf.push('{');
        let mut first = true;
        for (key, value) in doc {
            let decision = self.apply_replacer(key, value, false);
            let (value, owned);
            match decision {
                Decision::Omit | Decision::Null => continue,
                Decision::Borrowed(v) => value = v,
                Decision::Owned(v) => {
                    owned = v;
                    value = &owned;
                }
            }

            if !first {
                self.buf.push(',');
            }
            first = false;
            self.newline_indent(depth + 1);
            push_json_string(&mut self.buf, key);
            self.buf.push(':');
            if !self.indent_unit.is_empty() {
                self.buf.push(' ');
            }
            self.write_value(value, depth + 1)?;
        }
        if !first {
            self.newline_indent(depth);
        }
        self.buf.push('}');
        Ok(())
    }

    fn write_array(&mut self, arr: &[Bson], depth: usize) -> Result<()> {
        self.buf.push('[');
        let mut first = true;
        for (index, element) in arr.iter().enumerate() {
            if !first {
                self.buf.push(',');
            }
            first = false;
            self.newline_indent(depth + 1);

            let key = index.to_string();
            let decision = self.apply_replacer(&key, element, true);
            let (value, owned);
            match decision {
                Decision::Omit | Decision::Null => {
                    self.buf.push_str("null");
                    continue;
                }
                Decision::Borrowed(v) => value = v,
                Decision::Owned(v) => {
                    owned = v;
                    value = &owned;
                }
            }
            self.write_value(value, depth + 1)?;
        }
        if !first {
            self.newline_indent(depth);
        }
        self.buf.push(']');
        Ok(())
    }

    fn write_json(&mut self, json: &Json<'_>, depth: usize) -> Result<()> {
        match json {
            Json::Lit(token) => {
                self.buf.push_str(token);
                Ok(())
            }
            Json::Str(s) => {
                push_json_string(&mut self.buf, s);
                Ok(())
            }
            Json::Obj(entries) => {
                self.buf.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.buf.push(',');
                    }
                    self.newline_indent(depth + 1);
                    push_json_string(&mut self.buf, key);
                    self.buf.push(':');
                    if !self.indent_unit.is_empty() {
                        self.buf.push(' ');
                    }
                    self.write_json(value, depth + 1)?;
                }
                if !entries.is_empty() {
                    self.newline_indent(depth);
                }
                self.buf.push('}');
                Ok(())
            }
            Json::Bson(value) => self.write_value(value, depth),
            Json::Doc(doc) => self.write_document(doc, depth),
        }
    }

    fn newline_indent(&mut self, depth: usize) {
        if self.indent_unit.is_empty() {
            return;
        }
        self.buf.push('\n');
        for _ in 0..depth {
            self.buf.push_str(&self.indent_unit);
        }
    }
}

fn addr_of(value: &Bson) -> usize {
    value as *const Bson as usize
}

/// The projected shape of a non-container value: raw tokens, strings to be
/// escaped, wrapper objects, and re-entry points into the live tree for
/// wrapper interiors such as scopes.
enum Json<'v> {
    Lit(String),
    Str(Cow<'v, str>),
    Obj(Vec<(Cow<'v, str>, Json<'v>)>),
    Bson(&'v Bson),
    Doc(&'v Document),
}

fn obj1<'v>(key: &'static str, value: Json<'v>) -> Json<'v> {
    Json::Obj(vec![(Cow::Borrowed(key), value)])
}

fn project(value: &Bson, options: StringifyOptions) -> Json<'_> {
    match value {
        Bson::Double(v) => {
            if options.relaxed && v.is_finite() {
                Json::Lit(v.to_string())
            } else {
                obj1("$numberDouble", Json::Str(canonical_double(*v).into()))
            }
        }
        Bson::Int32(v) => {
            if options.relaxed {
                Json::Lit(v.to_string())
            } else {
                obj1("$numberInt", Json::Str(v.to_string().into()))
            }
        }
        Bson::Int64(v) => {
            if options.relaxed && v.unsigned_abs() <= MAX_SAFE_INTEGER as u64 {
                Json::Lit(v.to_string())
            } else {
                obj1("$numberLong", Json::Str(v.to_string().into()))
            }
        }
        Bson::String(s) => Json::Str(Cow::Borrowed(s)),
        Bson::Boolean(b) => Json::Lit(if *b { "true" } else { "false" }.to_owned()),
        Bson::Null => Json::Lit("null".to_owned()),
        Bson::Undefined => obj1("$undefined", Json::Lit("true".to_owned())),
        Bson::ObjectId(oid) => obj1("$oid", Json::Str(oid.to_hex().into())),
        Bson::DateTime(dt)
            if options.relaxed
                && dt.timestamp_millis() >= 0
                && dt.to_time_opt().is_some_and(|t| t.year() <= 9999) =>
        {
            // Unwrap safety: timestamps in the guarded range can always be
            // formatted.
            obj1(
                "$date",
                Json::Str(dt.try_to_rfc3339_string().unwrap().into()),
            )
        }
        Bson::DateTime(dt) => obj1(
            "$date",
            obj1(
                "$numberLong",
                Json::Str(dt.timestamp_millis().to_string().into()),
            ),
        ),
        Bson::Timestamp(ts) => obj1(
            "$timestamp",
            Json::Obj(vec![
                (Cow::Borrowed("t"), Json::Lit(ts.time.to_string())),
                (Cow::Borrowed("i"), Json::Lit(ts.increment.to_string())),
            ]),
        ),
        Bson::Binary(binary) => {
            binary_json(binary.subtype.into(), &binary.bytes, options.legacy)
        }
        Bson::Bytes(bytes) => binary_json(0x00, bytes, options.legacy),
        Bson::Uuid(uuid) => binary_json(0x04, &uuid.bytes(), options.legacy),
        Bson::RegularExpression(regex) => {
            if options.legacy {
                Json::Obj(vec![
                    (Cow::Borrowed("$regex"), Json::Str(Cow::Borrowed(&regex.pattern))),
                    (
                        Cow::Borrowed("$options"),
                        Json::Str(Cow::Borrowed(&regex.options)),
                    ),
                ])
            } else {
                // Options render in alphabetical order.
                let mut chars: Vec<_> = regex.options.chars().collect();
                chars.sort_unstable();
                let options: String = chars.into_iter().collect();

                obj1(
                    "$regularExpression",
                    Json::Obj(vec![
                        (
                            Cow::Borrowed("pattern"),
                            Json::Str(Cow::Borrowed(&regex.pattern)),
                        ),
                        (Cow::Borrowed("options"), Json::Str(options.into())),
                    ]),
                )
            }
        }
        Bson::JavaScriptCode(code) => obj1("$code", Json::Str(Cow::Borrowed(code))),
        Bson::JavaScriptCodeWithScope(code_w_scope) => Json::Obj(vec![
            (
                Cow::Borrowed("$code"),
                Json::Str(Cow::Borrowed(&code_w_scope.code)),
            ),
            (Cow::Borrowed("$scope"), Json::Doc(&code_w_scope.scope)),
        ]),
        Bson::Symbol(s) => obj1("$symbol", Json::Str(Cow::Borrowed(s))),
        Bson::Decimal128(d) => obj1("$numberDecimal", Json::Str(d.to_string().into())),
        Bson::MinKey => obj1("$minKey", Json::Lit("1".to_owned())),
        Bson::MaxKey => obj1("$maxKey", Json::Lit("1".to_owned())),
        Bson::DbPointer(pointer) => obj1(
            "$dbPointer",
            Json::Obj(vec![
                (
                    Cow::Borrowed("$ref"),
                    Json::Str(Cow::Borrowed(&pointer.namespace)),
                ),
                (
                    Cow::Borrowed("$id"),
                    obj1("$oid", Json::Str(pointer.id.to_hex().into())),
                ),
            ]),
        ),
        Bson::DbRef(dbref) => {
            let mut entries = vec![
                (
                    Cow::Borrowed("$ref"),
                    Json::Str(Cow::Borrowed(dbref.collection.as_str())),
                ),
                (Cow::Borrowed("$id"), Json::Bson(&dbref.id)),
            ];
            if let Some(db) = &dbref.db {
                entries.push((Cow::Borrowed("$db"), Json::Str(Cow::Borrowed(db.as_str()))));
            }
            for (key, value) in &dbref.extra {
                entries.push((Cow::Borrowed(key.as_str()), Json::Bson(value)));
            }
            Json::Obj(entries)
        }
        // Containers never reach projection; they are handled structurally.
        Bson::Document(_) | Bson::Array(_) => Json::Bson(value),
    }
}

fn binary_json<'v>(subtype: u8, bytes: &[u8], legacy: bool) -> Json<'v> {
    let base64 = crate::base64::encode(bytes);
    let subtype = hex::encode([subtype]);
    if legacy {
        Json::Obj(vec![
            (Cow::Borrowed("$binary"), Json::Str(base64.into())),
            (Cow::Borrowed("$type"), Json::Str(subtype.into())),
        ])
    } else {
        obj1(
            "$binary",
            Json::Obj(vec![
                (Cow::Borrowed("base64"), Json::Str(base64.into())),
                (Cow::Borrowed("subType"), Json::Str(subtype.into())),
            ]),
        )
    }
}

fn canonical_double(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_owned();
    }
    if v.is_infinite() {
        return if v.is_sign_negative() {
            "-Infinity"
        } else {
            "Infinity"
        }
        .to_owned();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0.0" } else { "0.0" }.to_owned();
    }

    let mut s = v.to_string();
    if !s.contains(['.', 'e', 'E']) {
        s.push_str(".0");
    }
    s
}

fn push_json_string(buf: &mut String, s: &str) {
    buf.push('"');
    let mut last = 0;
    for (i, ch) in s.char_indices() {
        let escaped: Option<Cow<'static, str>> = match ch {
            '"' => Some("\\\"".into()),
            '\\' => Some("\\\\".into()),
            '\u{0008}' => Some("\\b".into()),
            '\t' => Some("\\t".into()),
            '\n' => Some("\\n".into()),
            '\u{000C}' => Some("\\f".into()),
            '\r' => Some("\\r".into()),
            c if c < '\u{0020}' => Some(format!("\\u{:04x}", c as u32).into()),
            _ => None,
        };

        if let Some(escaped) = escaped {
            buf.push_str(&s[last..i]);
            buf.push_str(&escaped);
            last = i + ch.len_utf8();
        }
    }
    buf.push_str(&s[last..]);
    buf.push('"');
}
