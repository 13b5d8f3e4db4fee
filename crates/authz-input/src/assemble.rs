use crate::check_request::CheckRequest;
use authz_http::{parse_body, parse_path_and_query, DecodeError, DecodeLimits, HeaderMap, QueryMap};
use authz_schema::SchemaRegistry;
use serde::Serialize;
use serde_json::Value;

/// The policy-consumable view of one request. Built once per check and
/// immutable afterwards; owned solely by the caller that receives it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedInput {
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub headers: HeaderMap,
    pub parsed_path: Vec<String>,
    pub parsed_query: QueryMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_body: Option<Value>,
    pub truncated_body: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_principal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_certificate: Option<String>,
}

impl NormalizedInput {
    /// Renders the document as the mapping the policy engine consumes.
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).expect("normalized input always serializes")
    }
}

/// Assembles the normalized input document for one check request.
///
/// Header keys are lower-cased; the path and query are percent-decoded with
/// multi-value semantics; the body is decoded per content-type and projected
/// into `parsed_body`/`truncated_body`; source peer identity fields are
/// copied verbatim when provided. `skip_body_parse` bypasses body decoding
/// for deployments that evaluate on headers and path alone.
pub fn request_to_input(
    req: &CheckRequest,
    registry: Option<&SchemaRegistry>,
    limits: &DecodeLimits,
    skip_body_parse: bool,
) -> Result<NormalizedInput, DecodeError> {
    let headers: HeaderMap = req
        .http
        .headers
        .iter()
        .map(|(key, value)| (key.to_ascii_lowercase(), value.clone()))
        .collect();

    let (path_query, escape_error) = parse_path_and_query(&req.http.path);
    if let Some(error) = escape_error {
        // Permissive by design: the best-effort parse keeps the malformed
        // escape verbatim so path-based rules can still evaluate.
        tracing::debug!(error = %error, path = %req.http.path, "percent-decoding failed; using best-effort path and query");
    }

    let parsed_path = match &req.parsed_path_override {
        Some(segments) => segments.clone(),
        None => path_query.segments,
    };

    let (parsed_body, truncated_body) = if skip_body_parse {
        (None, false)
    } else {
        parse_body(
            &headers,
            &req.http.body,
            &req.http.raw_body,
            &parsed_path,
            registry,
            limits,
        )?
        .into_parts()
    };

    Ok(NormalizedInput {
        method: req.http.method.clone(),
        path: req.http.path.clone(),
        protocol: req.http.protocol.clone(),
        headers,
        parsed_path,
        parsed_query: path_query.query,
        parsed_body,
        truncated_body,
        source_principal: present(&req.source.principal),
        source_service: present(&req.source.service),
        source_certificate: present(&req.source.certificate),
    })
}

fn present(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
