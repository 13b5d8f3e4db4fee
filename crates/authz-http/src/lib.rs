use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

mod dispatch;
mod grpc_frame;
mod json_body;
mod multipart;
mod path_query;
mod proto_decode;
mod truncation;
mod urlencoded;

pub use dispatch::parse_body;
pub use grpc_frame::decode_grpc_body;
pub use json_body::decode_json_body;
pub use multipart::{boundary_from_content_type, decode_multipart_body};
pub use path_query::{parse_path_and_query, PathQuery, QueryMap};
pub use proto_decode::{decode_message, ProtoDecodeErrorCode};
pub use truncation::{body_truncated, declared_content_length};
pub use urlencoded::decode_urlencoded_body;

pub type HeaderMap = BTreeMap<String, String>;

/// Result of one body-decode attempt.
///
/// `Truncated` and `Absent` are ordinary outcomes, not errors; a `Parsed`
/// JSON `null` is a successfully decoded value and must never be collapsed
/// into `Absent`. Hard failures travel separately as [`DecodeError`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Parsed(Value),
    Truncated,
    Absent,
}

impl DecodeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed(_) => "parsed",
            Self::Truncated => "truncated",
            Self::Absent => "absent",
        }
    }

    /// Project into the `(parsed_body, truncated_body)` pair carried by the
    /// normalized input document.
    pub fn into_parts(self) -> (Option<Value>, bool) {
        match self {
            Self::Parsed(value) => (Some(value), false),
            Self::Truncated => (None, true),
            Self::Absent => (None, false),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("gRPC request path must contain exactly a service and a method")]
    InvalidPath,
    #[error("malformed request body: {0}")]
    BodyParse(String),
    #[error("invalid content-length header: {0}")]
    ContentLength(String),
    #[error("invalid percent escape: {0}")]
    InvalidEscape(String),
}

/// Work bounds applied to untrusted payloads. Every decoder is bounded by
/// actual bytes received, never by a declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_message_len: usize,
    pub max_decompressed_len: usize,
    pub max_message_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_message_len: 16 * 1024 * 1024,
            max_decompressed_len: 16 * 1024 * 1024,
            max_message_depth: 64,
        }
    }
}

pub(crate) fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
