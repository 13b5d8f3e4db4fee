use crate::DecodeError;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

pub type QueryMap = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathQuery {
    /// Percent-decoded path segments, empty leading/trailing segments from
    /// the surrounding slashes discarded. An escaped slash decodes to a
    /// literal slash and is split on like any other.
    pub segments: Vec<String>,
    /// Query keys in first-seen order, each mapped to an ordered array of
    /// string values appended in encounter order.
    pub query: QueryMap,
}

/// Splits a raw URL path into percent-decoded segments and a multi-valued
/// query mapping.
///
/// The result is always a best-effort parse: a malformed escape sequence is
/// reported through the second tuple element but left verbatim in the
/// output, so strict callers can reject while permissive callers keep the
/// raw rendition.
pub fn parse_path_and_query(raw: &str) -> (PathQuery, Option<DecodeError>) {
    let (path_part, query_part) = match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw, None),
    };

    let mut error = check_escapes(path_part);

    let decoded = match percent_decode_str(path_part).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(utf8_error) => {
            if error.is_none() {
                error = Some(DecodeError::InvalidEscape(format!(
                    "path decodes to invalid UTF-8: {utf8_error}"
                )));
            }
            percent_decode_str(path_part).decode_utf8_lossy().into_owned()
        }
    };

    let trimmed = decoded.trim_matches('/');
    let segments = if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').map(str::to_string).collect()
    };

    let mut query = QueryMap::new();
    if let Some(query_part) = query_part {
        if error.is_none() {
            error = check_escapes(query_part);
        }
        for (key, value) in form_urlencoded::parse(query_part.as_bytes()) {
            let values = query
                .entry(key.into_owned())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(values) = values {
                values.push(Value::String(value.into_owned()));
            }
        }
    }

    (PathQuery { segments, query }, error)
}

fn check_escapes(raw: &str) -> Option<DecodeError> {
    let bytes = raw.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let valid = bytes.len() >= index + 3
                && bytes[index + 1].is_ascii_hexdigit()
                && bytes[index + 2].is_ascii_hexdigit();
            if !valid {
                return Some(DecodeError::InvalidEscape(format!(
                    "truncated or non-hex escape at byte {index}"
                )));
            }
            index += 3;
        } else {
            index += 1;
        }
    }
    None
}
