use crate::DecodeError;
use serde_json::Value;

/// Decodes a JSON body into the generic value model.
///
/// Numbers keep their exact textual form instead of being coerced through
/// f64, so large integers and precise decimals survive the round trip into
/// policy evaluation. A top-level `null` is a successfully parsed value.
pub fn decode_json_body(payload: &[u8]) -> Result<Value, DecodeError> {
    serde_json::from_slice(payload).map_err(|error| DecodeError::BodyParse(error.to_string()))
}
