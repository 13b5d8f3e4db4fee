use crate::grpc_frame::decode_grpc_body;
use crate::json_body::decode_json_body;
use crate::multipart::{boundary_from_content_type, decode_multipart_body};
use crate::truncation::{body_truncated, declared_content_length};
use crate::urlencoded::decode_urlencoded_body;
use crate::{header_value, DecodeError, DecodeLimits, DecodeOutcome, HeaderMap};
use authz_schema::SchemaRegistry;

/// Routes a request body to the decoder selected by its content-type.
///
/// The content-type value is matched case-insensitively with parameters
/// ignored, except that multipart decoding reads the boundary parameter.
/// Content-types with no applicable decoder, and requests with no
/// content-type at all, yield `Absent`. The truncation check runs against
/// the payload actually selected, before any parsing.
pub fn parse_body(
    headers: &HeaderMap,
    body: &str,
    raw_body: &[u8],
    parsed_path: &[String],
    registry: Option<&SchemaRegistry>,
    limits: &DecodeLimits,
) -> Result<DecodeOutcome, DecodeError> {
    let Some(content_type) = header_value(headers, "content-type") else {
        tracing::debug!("no content-type header; body left unparsed");
        return Ok(DecodeOutcome::Absent);
    };
    let media_type = content_type.to_ascii_lowercase();

    if media_type.contains("application/json") {
        let Some(payload) = select_payload(body, raw_body) else {
            return Ok(DecodeOutcome::Absent);
        };
        if body_truncated(declared_content_length(headers)?, payload.len()) {
            return Ok(DecodeOutcome::Truncated);
        }
        return decode_json_body(payload).map(DecodeOutcome::Parsed);
    }

    if media_type.contains("application/grpc") {
        let Some(registry) = registry else {
            tracing::debug!("no schema registry loaded; gRPC body left unparsed");
            return Ok(DecodeOutcome::Absent);
        };
        // The check can arrive without the raw body when the proxy was not
        // configured to buffer it.
        if raw_body.is_empty() {
            tracing::debug!("gRPC check request carried no raw body");
            return Ok(DecodeOutcome::Absent);
        }
        return decode_grpc_body(raw_body, parsed_path, registry, limits);
    }

    if media_type.contains("application/x-www-form-urlencoded") {
        let Some(payload) = select_payload(body, raw_body) else {
            return Ok(DecodeOutcome::Absent);
        };
        if body_truncated(declared_content_length(headers)?, payload.len()) {
            return Ok(DecodeOutcome::Truncated);
        }
        return decode_urlencoded_body(payload).map(DecodeOutcome::Parsed);
    }

    if media_type.contains("multipart/form-data") {
        let Some(payload) = select_payload(body, raw_body) else {
            return Ok(DecodeOutcome::Absent);
        };
        if body_truncated(declared_content_length(headers)?, payload.len()) {
            return Ok(DecodeOutcome::Truncated);
        }
        // The boundary token is case-sensitive; it is read from the header
        // value as received, not the lowercased media type.
        let Some(boundary) = boundary_from_content_type(content_type) else {
            tracing::debug!("multipart content-type without boundary parameter");
            return Ok(DecodeOutcome::Absent);
        };
        let payload = String::from_utf8_lossy(payload);
        return decode_multipart_body(&payload, &boundary).map(DecodeOutcome::Parsed);
    }

    tracing::debug!(content_type = %content_type, "content-type has no decoder");
    Ok(DecodeOutcome::Absent)
}

/// The textual body is preferred; the raw byte body is the fallback. An
/// empty pair means there is nothing to decode.
fn select_payload<'a>(body: &'a str, raw_body: &'a [u8]) -> Option<&'a [u8]> {
    if !body.is_empty() {
        Some(body.as_bytes())
    } else if !raw_body.is_empty() {
        Some(raw_body)
    } else {
        None
    }
}
