mod ser;

/// Assemble a BSON document from pre-encoded elements: length prefix, element
/// bytes, terminator.
pub(crate) fn doc_bytes(elements: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = elements.concat();
    let size = (body.len() + 5) as i32;
    let mut out = size.to_le_bytes().to_vec();
    out.extend(body);
    out.push(0);
    out
}

/// One element: type tag, key CString, payload.
pub(crate) fn elem(tag: u8, key: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend(key.as_bytes());
    out.push(0);
    out.extend(payload);
    out
}

/// A length-prefixed string payload, length inclusive of the trailing NUL.
pub(crate) fn string_payload(s: &str) -> Vec<u8> {
    let mut out = ((s.len() + 1) as i32).to_le_bytes().to_vec();
    out.extend(s.as_bytes());
    out.push(0);
    out
}
