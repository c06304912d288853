use pretty_assertions::assert_eq;
use serde_json::json;

use super::{doc_bytes, elem, string_payload};
use crate::{
    bson,
    de::from_slice,
    doc,
    oid::ObjectId,
    ser::{stringify, stringify_with_options, Replacer, Stringifier, StringifyOptions},
    spec::BinarySubtype,
    Binary, Bson, DateTime, DbPointer, DbRef, Decimal128, JavaScriptCodeWithScope, Regex,
    Timestamp, Uuid,
};

fn relaxed(value: &Bson) -> String {
    stringify(value).unwrap()
}

fn canonical(value: &Bson) -> String {
    stringify_with_options(value, StringifyOptions::default().relaxed(false)).unwrap()
}

fn legacy(value: &Bson) -> String {
    stringify_with_options(value, StringifyOptions::default().legacy(true)).unwrap()
}

fn oid() -> ObjectId {
    ObjectId::parse_str("53e37d08776f724e42000000").unwrap()
}

#[test]
fn simple_document() {
    let value = bson!({ "a": 1, "b": "hello", "c": true });
    assert_eq!(relaxed(&value), r#"{"a":1,"b":"hello","c":true}"#);
}

#[test]
fn empty_containers() {
    assert_eq!(relaxed(&bson!({})), "{}");
    assert_eq!(relaxed(&bson!([])), "[]");
    assert_eq!(relaxed(&bson!({ "d": {}, "a": [] })), r#"{"d":{},"a":[]}"#);
}

#[test]
fn int32_projection() {
    let value = bson!({ "v": 42 });
    assert_eq!(relaxed(&value), r#"{"v":42}"#);
    assert_eq!(canonical(&value), r#"{"v":{"$numberInt":"42"}}"#);
}

#[test]
fn int64_projection() {
    let value = bson!({ "v": 5i64 });
    assert_eq!(relaxed(&value), r#"{"v":5}"#);
    assert_eq!(canonical(&value), r#"{"v":{"$numberLong":"5"}}"#);

    // Outside the safe integer range even relaxed output keeps the wrapper.
    let value = bson!({ "v": 9_007_199_254_740_992i64 });
    assert_eq!(relaxed(&value), r#"{"v":{"$numberLong":"9007199254740992"}}"#);
    let value = bson!({ "v": -9_007_199_254_740_992i64 });
    assert_eq!(relaxed(&value), r#"{"v":{"$numberLong":"-9007199254740992"}}"#);
}

#[test]
fn double_projection() {
    assert_eq!(relaxed(&bson!({ "v": 10.5 })), r#"{"v":10.5}"#);
    assert_eq!(relaxed(&bson!({ "v": 42.0 })), r#"{"v":42}"#);
    assert_eq!(
        canonical(&bson!({ "v": 42.0 })),
        r#"{"v":{"$numberDouble":"42.0"}}"#
    );
    assert_eq!(
        canonical(&bson!({ "v": 10.5 })),
        r#"{"v":{"$numberDouble":"10.5"}}"#
    );
    assert_eq!(
        relaxed(&bson!({ "v": f64::NAN })),
        r#"{"v":{"$numberDouble":"NaN"}}"#
    );
    assert_eq!(
        relaxed(&bson!({ "v": f64::INFINITY })),
        r#"{"v":{"$numberDouble":"Infinity"}}"#
    );
    assert_eq!(
        canonical(&bson!({ "v": f64::NEG_INFINITY })),
        r#"{"v":{"$numberDouble":"-Infinity"}}"#
    );
}

#[test]
fn date_projection() {
    let value = bson!({ "date": DateTime::from_millis(1_672_531_200_000) });
    assert_eq!(
        relaxed(&value),
        r#"{"date":{"$date":"2023-01-01T00:00:00Z"}}"#
    );
    assert_eq!(
        canonical(&value),
        r#"{"date":{"$date":{"$numberLong":"1672531200000"}}}"#
    );

    // Dates before the epoch or beyond year 9999 render canonically even in
    // relaxed mode.
    let value = bson!({ "date": DateTime::from_millis(-1) });
    assert_eq!(relaxed(&value), r#"{"date":{"$date":{"$numberLong":"-1"}}}"#);
    let value = bson!({ "date": DateTime::from_millis(i64::MAX) });
    assert_eq!(
        relaxed(&value),
        format!(r#"{{"date":{{"$date":{{"$numberLong":"{}"}}}}}}"#, i64::MAX)
    );
}

#[test]
fn wrapper_projections() {
    assert_eq!(
        relaxed(&bson!({ "v": oid() })),
        r#"{"v":{"$oid":"53e37d08776f724e42000000"}}"#
    );

    assert_eq!(
        relaxed(&bson!({ "v": Timestamp { time: 1234, increment: 5678 } })),
        r#"{"v":{"$timestamp":{"t":1234,"i":5678}}}"#
    );
    assert_eq!(
        relaxed(&bson!({ "v": Timestamp { time: u32::MAX, increment: u32::MAX } })),
        r#"{"v":{"$timestamp":{"t":4294967295,"i":4294967295}}}"#
    );

    assert_eq!(relaxed(&bson!({ "v": Bson::MinKey })), r#"{"v":{"$minKey":1}}"#);
    assert_eq!(relaxed(&bson!({ "v": Bson::MaxKey })), r#"{"v":{"$maxKey":1}}"#);
    assert_eq!(
        relaxed(&bson!({ "v": Bson::Undefined })),
        r#"{"v":{"$undefined":true}}"#
    );
    assert_eq!(
        relaxed(&bson!({ "v": Bson::Symbol("sym".to_owned()) })),
        r#"{"v":{"$symbol":"sym"}}"#
    );
    assert_eq!(
        relaxed(&bson!({ "v": Bson::JavaScriptCode("function() {}".to_owned()) })),
        r#"{"v":{"$code":"function() {}"}}"#
    );

    let dec = {
        let mut b = [0u8; 16];
        b[0] = 1;
        b[14] = 0x3e;
        b[15] = 0x30;
        Decimal128::from_bytes(b)
    };
    assert_eq!(
        relaxed(&bson!({ "v": dec })),
        r#"{"v":{"$numberDecimal":"0.1"}}"#
    );

    assert_eq!(
        relaxed(&bson!({ "v": DbPointer { namespace: "db.coll".to_owned(), id: oid() } })),
        r#"{"v":{"$dbPointer":{"$ref":"db.coll","$id":{"$oid":"53e37d08776f724e42000000"}}}}"#
    );
}

#[test]
fn binary_projections() {
    let binary = Binary {
        subtype: BinarySubtype::Generic,
        bytes: vec![1, 2, 3],
    };
    let value = bson!({ "v": binary });
    assert_eq!(
        relaxed(&value),
        r#"{"v":{"$binary":{"base64":"AQID","subType":"00"}}}"#
    );
    assert_eq!(
        legacy(&value),
        r#"{"v":{"$binary":"AQID","$type":"00"}}"#
    );

    let value = bson!({ "v": Bson::Bytes(vec![1, 2, 3]) });
    assert_eq!(
        relaxed(&value),
        r#"{"v":{"$binary":{"base64":"AQID","subType":"00"}}}"#
    );

    let uuid = Uuid::parse_str("73ffd264-44b3-4c69-90e8-e7d1dfc035d4").unwrap();
    let value = bson!({ "v": uuid });
    assert_eq!(
        relaxed(&value),
        r#"{"v":{"$binary":{"base64":"c//SZESzTGmQ6OfR38A11A==","subType":"04"}}}"#
    );
}

#[test]
fn regex_projections() {
    let value = bson!({ "v": Regex { pattern: "ab+c".to_owned(), options: "mi".to_owned() } });
    // Options render alphabetized.
    assert_eq!(
        relaxed(&value),
        r#"{"v":{"$regularExpression":{"pattern":"ab+c","options":"im"}}}"#
    );
    assert_eq!(
        legacy(&value),
        r#"{"v":{"$regex":"ab+c","$options":"mi"}}"#
    );
}

#[test]
fn code_with_scope_projection() {
    let value = bson!({ "v": JavaScriptCodeWithScope {
        code: "function() {}".to_owned(),
        scope: doc! { "x": 1 },
    } });
    assert_eq!(
        relaxed(&value),
        r#"{"v":{"$code":"function() {}","$scope":{"x":1}}}"#
    );
    assert_eq!(
        canonical(&value),
        r#"{"v":{"$code":"function() {}","$scope":{"x":{"$numberInt":"1"}}}}"#
    );
}

#[test]
fn dbref_projection() {
    let mut dbref = DbRef::new("coll", Bson::ObjectId(oid()), Some("mydb".to_owned()));
    dbref.extra.insert("note", 5i32);
    let value = bson!({ "v": dbref });
    assert_eq!(
        relaxed(&value),
        r#"{"v":{"$ref":"coll","$id":{"$oid":"53e37d08776f724e42000000"},"$db":"mydb","note":5}}"#
    );
}

#[test]
fn string_escaping() {
    let value = bson!({ "quote\"key": "line1\nline2\t\"quoted\"\\" });
    assert_eq!(
        relaxed(&value),
        r#"{"quote\"key":"line1\nline2\t\"quoted\"\\"}"#
    );

    let value = bson!({ "ctl": "\u{0001}" });
    assert_eq!(relaxed(&value), "{\"ctl\":\"\\u0001\"}");
}

#[test]
fn indentation() {
    let value = bson!({ "a": 1, "b": [true, null], "e": {} });
    let pretty = Stringifier::new(&value).indent(2).into_string().unwrap();
    assert_eq!(
        pretty,
        "{\n  \"a\": 1,\n  \"b\": [\n    true,\n    null\n  ],\n  \"e\": {}\n}"
    );

    let tabs = Stringifier::new(&value).indent("\t").into_string().unwrap();
    assert_eq!(
        tabs,
        "{\n\t\"a\": 1,\n\t\"b\": [\n\t\ttrue,\n\t\tnull\n\t],\n\t\"e\": {}\n}"
    );
}

#[test]
fn indentation_applies_inside_wrappers() {
    let value = bson!({ "a": 1 });
    let pretty = Stringifier::new(&value)
        .relaxed(false)
        .indent(2)
        .into_string()
        .unwrap();
    assert_eq!(pretty, "{\n  \"a\": {\n    \"$numberInt\": \"1\"\n  }\n}");
}

#[test]
fn space_indent_is_capped_at_ten() {
    let value = bson!({ "a": 1 });
    let pretty = Stringifier::new(&value).indent(100).into_string().unwrap();
    assert_eq!(pretty, "{\n          \"a\": 1\n}");
}

#[test]
fn keys_replacer_restricts_in_insertion_order() {
    let value = bson!({ "a": 1, "b": 2, "c": 3 });
    let out = Stringifier::new(&value)
        .replacer(Replacer::keys(["c", "a"]))
        .into_string()
        .unwrap();
    assert_eq!(out, r#"{"a":1,"c":3}"#);
}

#[test]
fn keys_replacer_applies_to_nested_documents_but_not_arrays() {
    let value = bson!({ "a": 1, "sub": { "a": 2, "x": 3 }, "arr": [{ "a": 4, "x": 5 }] });
    let out = Stringifier::new(&value)
        .replacer(Replacer::keys(["a", "sub", "arr"]))
        .into_string()
        .unwrap();
    assert_eq!(out, r#"{"a":1,"sub":{"a":2},"arr":[{"a":4}]}"#);
}

#[test]
fn function_replacer_omits_and_nulls() {
    let value = bson!({ "keep": 1, "secret": 2, "arr": [1, 2, 3] });
    let out = Stringifier::new(&value)
        .replacer(Replacer::function(|key, value| {
            if key == "secret" || matches!(value, Bson::Int32(2)) {
                None
            } else {
                Some(value.clone())
            }
        }))
        .into_string()
        .unwrap();
    assert_eq!(out, r#"{"keep":1,"arr":[1,null,3]}"#);
}

#[test]
fn function_replacer_rewrites_values() {
    let value = bson!({ "n": 1, "doc": { "x": 2 } });
    let out = Stringifier::new(&value)
        .replacer(Replacer::function(|key, value| match key {
            "n" => Some(Bson::Int32(99)),
            "doc" => Some(bson!({ "replaced": true })),
            _ => Some(value.clone()),
        }))
        .into_string()
        .unwrap();
    assert_eq!(out, r#"{"n":99,"doc":{"replaced":true}}"#);
}

#[test]
fn function_replacer_sees_array_indices_as_keys() {
    use std::{cell::RefCell, rc::Rc};

    let value = bson!({ "arr": ["x", "y"] });
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let out = Stringifier::new(&value)
        .replacer(Replacer::function(move |key, value| {
            sink.borrow_mut().push(key.to_owned());
            Some(value.clone())
        }))
        .into_string()
        .unwrap();
    assert_eq!(out, r#"{"arr":["x","y"]}"#);
    assert_eq!(*seen.borrow(), vec!["arr", "0", "1"]);
}

#[test]
fn streaming_matches_non_streaming() {
    let value = bson!({
        "nums": [1, 2.5, 3i64],
        "doc": { "nested": { "deep": "value" } },
        "oid": oid(),
        "date": DateTime::from_millis(1_356_351_330_501i64),
        "ts": Timestamp { time: 1, increment: 2 },
    });

    for options in [
        StringifyOptions::default(),
        StringifyOptions::default().relaxed(false),
        StringifyOptions::default().legacy(true),
    ] {
        let whole = stringify_with_options(&value, options).unwrap();
        let chunks: Vec<String> = Stringifier::new(&value)
            .options(options)
            .chunks()
            .map(|c| c.unwrap())
            .collect();
        assert!(!chunks.is_empty());
        assert_eq!(chunks.concat(), whole);
    }

    let pretty_whole = Stringifier::new(&value).indent(4).into_string().unwrap();
    let pretty_chunks: Vec<String> = Stringifier::new(&value)
        .indent(4)
        .chunks()
        .map(|c| c.unwrap())
        .collect();
    assert_eq!(pretty_chunks.concat(), pretty_whole);
}

#[test]
fn large_document_yields_multiple_chunks() {
    let mut doc = crate::Document::new();
    for i in 0..100_000 {
        doc.insert(i.to_string(), i);
    }
    let value = Bson::Document(doc);

    let chunks: Vec<String> = Stringifier::new(&value)
        .chunks()
        .map(|c| c.unwrap())
        .collect();
    assert!(chunks.len() > 1, "got {} chunk(s)", chunks.len());

    let joined = chunks.concat();
    assert_eq!(joined, stringify(&value).unwrap());

    let parsed: serde_json::Value = serde_json::from_str(&joined).unwrap();
    assert_eq!(parsed.as_object().unwrap().len(), 100_000);
    assert_eq!(parsed["99999"], json!(99999));
}

#[test]
fn large_array_yields_multiple_chunks() {
    let value = Bson::Array((0..100_000).map(Bson::Int32).collect());
    let chunks: Vec<String> = Stringifier::new(&value)
        .chunks()
        .map(|c| c.unwrap())
        .collect();
    assert!(chunks.len() > 1);

    let parsed: serde_json::Value = serde_json::from_str(&chunks.concat()).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 100_000);
}

#[test]
fn deep_nesting_is_not_reported_as_a_cycle() {
    let mut value = bson!({ "leaf": true });
    for _ in 0..1_000 {
        value = bson!({ "next": value });
    }
    let out = stringify(&value).unwrap();
    assert!(out.starts_with(r#"{"next":{"next":"#));
}

#[test]
fn repeated_subtrees_are_not_cycles() {
    let shared = bson!({ "s": 1 });
    let value = bson!({ "a": shared.clone(), "b": shared });
    assert_eq!(relaxed(&value), r#"{"a":{"s":1},"b":{"s":1}}"#);
}

#[test]
fn circular_reference_error_message() {
    let err = crate::Error::circular_reference();
    assert!(err.to_string().contains("Converting circular structure"));
}

#[test]
fn decode_then_encode_round_trip() {
    let inner = doc_bytes(&[elem(0x10, "x", &7i32.to_le_bytes())]);
    let array = doc_bytes(&[
        elem(0x01, "0", &1.5f64.to_le_bytes()),
        elem(0x08, "1", &[0]),
    ]);
    let bytes = doc_bytes(&[
        elem(0x10, "i", &1i32.to_le_bytes()),
        elem(0x02, "s", &string_payload("hello")),
        elem(0x03, "doc", &inner),
        elem(0x04, "arr", &array),
        elem(0x09, "when", &1_672_531_200_000i64.to_le_bytes()),
    ]);

    let doc = from_slice(&bytes).unwrap();
    let relaxed_out = stringify(&Bson::Document(doc.clone())).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&relaxed_out).unwrap();
    assert_eq!(
        parsed,
        json!({
            "i": 1,
            "s": "hello",
            "doc": { "x": 7 },
            "arr": [1.5, false],
            "when": { "$date": "2023-01-01T00:00:00Z" },
        })
    );

    let canonical_out = canonical(&Bson::Document(doc));
    let parsed: serde_json::Value = serde_json::from_str(&canonical_out).unwrap();
    assert_eq!(
        parsed,
        json!({
            "i": { "$numberInt": "1" },
            "s": "hello",
            "doc": { "x": { "$numberInt": "7" } },
            "arr": [{ "$numberDouble": "1.5" }, false],
            "when": { "$date": { "$numberLong": "1672531200000" } },
        })
    );
}

#[test]
fn decoded_dbref_round_trips_textually() {
    let inner = doc_bytes(&[
        elem(0x02, "$ref", &string_payload("coll")),
        elem(0x10, "$id", &7i32.to_le_bytes()),
    ]);
    let bytes = doc_bytes(&[elem(0x03, "ref", &inner)]);

    let doc = from_slice(&bytes).unwrap();
    assert_eq!(
        relaxed(&Bson::Document(doc)),
        r#"{"ref":{"$ref":"coll","$id":7}}"#
    );
}

#[test]
fn root_scalar_values_encode() {
    assert_eq!(relaxed(&Bson::Int32(5)), "5");
    assert_eq!(relaxed(&Bson::String("hi".to_owned())), r#""hi""#);
    assert_eq!(canonical(&Bson::Int64(5)), r#"{"$numberLong":"5"}"#);
}
