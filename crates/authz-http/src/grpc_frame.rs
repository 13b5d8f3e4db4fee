use crate::proto_decode::decode_message;
use crate::{DecodeError, DecodeLimits, DecodeOutcome};
use authz_schema::SchemaRegistry;
use serde_json::{Map, Value};
use std::io::Read;

enum FrameRead<'a> {
    Message { flag: u8, payload: &'a [u8] },
    Truncated,
}

/// Decodes the first gRPC frame of a request body against the schema
/// registry.
///
/// Path-shape violations are the only hard failure on this path; every other
/// irregularity degrades to `Absent` so the authorization decision can still
/// evaluate on headers and path. Streams carrying more than one frame have
/// only their first frame decoded.
pub fn decode_grpc_body(
    raw_body: &[u8],
    parsed_path: &[String],
    registry: &SchemaRegistry,
    limits: &DecodeLimits,
) -> Result<DecodeOutcome, DecodeError> {
    // A method call is a POST to /<service>/<method>; any other shape means
    // the request is not something the registry can resolve.
    let [service, method] = parsed_path else {
        return Err(DecodeError::InvalidPath);
    };
    if service.is_empty() || method.is_empty() {
        return Err(DecodeError::InvalidPath);
    }

    let Some(descriptor) = registry.lookup_method(service, method) else {
        tracing::debug!(service = %service, method = %method, "method not in schema registry");
        return Ok(DecodeOutcome::Absent);
    };

    if raw_body.is_empty() {
        return Ok(DecodeOutcome::Parsed(Value::Object(Map::new())));
    }

    let (flag, payload) = match read_frame(raw_body) {
        FrameRead::Message { flag, payload } => (flag, payload),
        FrameRead::Truncated => return Ok(DecodeOutcome::Truncated),
    };

    if payload.len() > limits.max_message_len {
        tracing::debug!(
            payload_len = payload.len(),
            "gRPC frame exceeds message length bound"
        );
        return Ok(DecodeOutcome::Absent);
    }

    let decompressed;
    let payload = match flag {
        0 => payload,
        1 => match decompress_gzip(payload, limits.max_decompressed_len) {
            Ok(bytes) => {
                decompressed = bytes;
                &decompressed
            }
            Err(detail) => {
                tracing::debug!(detail = %detail, "compressed gRPC frame not decodable");
                return Ok(DecodeOutcome::Absent);
            }
        },
        other => {
            tracing::debug!(flag = other, "invalid gRPC compression flag");
            return Ok(DecodeOutcome::Absent);
        }
    };

    match decode_message(payload, descriptor, registry, limits) {
        Ok(value) => Ok(DecodeOutcome::Parsed(value)),
        Err(code) => {
            tracing::debug!(
                service = %service,
                method = %method,
                code = code.as_str(),
                "schema-driven protobuf decode failed"
            );
            Ok(DecodeOutcome::Absent)
        }
    }
}

/// The first 5 bytes are gRPC framing: a compression flag and a big-endian
/// payload length. Anything shorter than the frame it declares is truncated;
/// reads are bounded by the bytes actually present.
fn read_frame(bytes: &[u8]) -> FrameRead<'_> {
    if bytes.len() < 5 {
        return FrameRead::Truncated;
    }
    let flag = bytes[0];
    let declared = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    let rest = &bytes[5..];
    if rest.len() < declared {
        return FrameRead::Truncated;
    }
    FrameRead::Message {
        flag,
        payload: &rest[..declared],
    }
}

fn decompress_gzip(input: &[u8], max_len: usize) -> Result<Vec<u8>, String> {
    let mut decoder = flate2::read::GzDecoder::new(input).take(max_len as u64 + 1);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|error| format!("gzip decode failed: {error}"))?;
    if out.len() > max_len {
        return Err(format!("decompressed payload exceeds {max_len} bytes"));
    }
    Ok(out)
}
