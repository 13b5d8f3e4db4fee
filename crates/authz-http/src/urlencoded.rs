use crate::path_query::QueryMap;
use crate::DecodeError;
use serde_json::Value;

/// Decodes an `application/x-www-form-urlencoded` body into a mapping of
/// key to ordered list of string values, same multi-value semantics as the
/// query-string parser.
pub fn decode_urlencoded_body(payload: &[u8]) -> Result<Value, DecodeError> {
    if let Some(error) = check_payload_escapes(payload) {
        return Err(error);
    }

    let mut form = QueryMap::new();
    for (key, value) in form_urlencoded::parse(payload) {
        let values = form
            .entry(key.into_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = values {
            values.push(Value::String(value.into_owned()));
        }
    }

    Ok(Value::Object(form))
}

fn check_payload_escapes(payload: &[u8]) -> Option<DecodeError> {
    let mut index = 0;
    while index < payload.len() {
        if payload[index] == b'%' {
            let valid = payload.len() >= index + 3
                && payload[index + 1].is_ascii_hexdigit()
                && payload[index + 2].is_ascii_hexdigit();
            if !valid {
                return Some(DecodeError::BodyParse(format!(
                    "invalid percent escape in form body at byte {index}"
                )));
            }
            index += 3;
        } else {
            index += 1;
        }
    }
    None
}
