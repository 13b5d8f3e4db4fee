use authz_http::HeaderMap;
use bytes::Bytes;

/// One inbound "check this request" call, as delivered by the transport.
/// The core never mutates it.
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    pub http: HttpAttributes,
    pub source: SourcePeer,
    /// Pre-computed path segments supplied by the caller; when present they
    /// replace the segments parsed from `http.path`.
    pub parsed_path_override: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct HttpAttributes {
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub headers: HeaderMap,
    /// Body delivered as text. Preferred over `raw_body` when non-empty.
    pub body: String,
    /// Body delivered as raw bytes, already transport-decoded.
    pub raw_body: Bytes,
}

/// Peer identity of the downstream connection. Proto3-style presence: an
/// empty string means the field was not provided.
#[derive(Debug, Clone, Default)]
pub struct SourcePeer {
    pub service: String,
    pub principal: String,
    pub certificate: String,
}
