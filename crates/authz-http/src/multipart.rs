use crate::json_body::decode_json_body;
use crate::path_query::QueryMap;
use crate::DecodeError;
use serde_json::Value;

/// Extracts the boundary parameter from a `multipart/form-data` content-type
/// value. Parameter names match case-insensitively; quoted and bare tokens
/// are both accepted.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    header_param(content_type, "boundary")
}

/// Decodes a MIME multipart body into a mapping of part name to ordered list
/// of values. A part whose own content-type is JSON contributes its decoded
/// value; every other part contributes its raw text. Repeated part names
/// aggregate in encounter order, so text and JSON values can share a list.
pub fn decode_multipart_body(payload: &str, boundary: &str) -> Result<Value, DecodeError> {
    let delimiter = format!("--{boundary}");
    let close_delimiter = format!("--{boundary}--");

    // Both CRLF and bare LF line endings appear in the wild; the trailing
    // carriage return is stripped per line.
    let mut lines = payload
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line));

    let mut closed = false;
    let mut found_delimiter = false;
    for line in lines.by_ref() {
        let line = line.trim_end();
        if line == delimiter {
            found_delimiter = true;
            break;
        }
        if line == close_delimiter {
            found_delimiter = true;
            closed = true;
            break;
        }
    }
    if !found_delimiter {
        // No boundary anywhere in the payload; a clean end with no parts.
        closed = true;
    }

    let mut parts = QueryMap::new();
    while !closed {
        let mut disposition: Option<String> = None;
        let mut content_type: Option<String> = None;
        let mut saw_blank = false;

        for line in lines.by_ref() {
            if line.is_empty() {
                saw_blank = true;
                break;
            }
            let Some((name, value)) = line.split_once(':') else {
                return Err(DecodeError::BodyParse(format!(
                    "malformed multipart part header: {line}"
                )));
            };
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-disposition") {
                disposition = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("content-type") {
                content_type = Some(value.to_string());
            }
        }
        if !saw_blank {
            return Err(DecodeError::BodyParse(
                "unterminated multipart part headers".to_string(),
            ));
        }

        let mut content_lines: Vec<&str> = Vec::new();
        let mut saw_delimiter = false;
        for line in lines.by_ref() {
            let trimmed = line.trim_end();
            if trimmed == delimiter {
                saw_delimiter = true;
                break;
            }
            if trimmed == close_delimiter {
                saw_delimiter = true;
                closed = true;
                break;
            }
            content_lines.push(line);
        }
        if !saw_delimiter {
            return Err(DecodeError::BodyParse(
                "multipart body missing closing boundary".to_string(),
            ));
        }

        let Some(name) = form_part_name(disposition.as_deref()) else {
            continue;
        };

        let content = content_lines.join("\n");
        let value = match content_type {
            Some(part_type) if part_type.to_ascii_lowercase().contains("application/json") => {
                decode_json_body(content.as_bytes())?
            }
            _ => Value::String(content),
        };

        let values = parts
            .entry(name)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = values {
            values.push(value);
        }
    }

    Ok(Value::Object(parts))
}

/// A part only carries a form field when its disposition is `form-data` and
/// names the field; anything else is skipped.
fn form_part_name(disposition: Option<&str>) -> Option<String> {
    let disposition = disposition?;
    let kind = disposition.split(';').next().unwrap_or("").trim();
    if !kind.eq_ignore_ascii_case("form-data") {
        return None;
    }
    header_param(disposition, "name")
}

fn header_param(value: &str, param: &str) -> Option<String> {
    for segment in value.split(';').skip(1) {
        let Some((name, raw)) = segment.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case(param) {
            continue;
        }
        let raw = raw.trim();
        let unquoted = raw
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(raw);
        if unquoted.is_empty() {
            return None;
        }
        return Some(unquoted.to_string());
    }
    None
}
