mod assemble;
mod check_request;

pub use assemble::{request_to_input, NormalizedInput};
pub use check_request::{CheckRequest, HttpAttributes, SourcePeer};

pub use authz_http::{DecodeError, DecodeLimits, DecodeOutcome};
