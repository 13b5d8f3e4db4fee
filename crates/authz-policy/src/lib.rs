use serde_json::Value;

/// Verdict returned by the policy engine for one authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDecision {
    pub verdict: Verdict,
    pub reason: String,
    /// Engine-specific metadata forwarded alongside the verdict, e.g. header
    /// mutations or an obligation set. Opaque to the normalization core.
    pub metadata: Option<Value>,
}

impl PolicyDecision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Allow,
            reason: reason.into(),
            metadata: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Deny,
            reason: reason.into(),
            metadata: None,
        }
    }
}

/// The policy engine consumes the normalized input document as a mapping and
/// returns an allow/deny decision. Evaluation itself lives outside this
/// workspace; this trait is the seam the transport wires the engine through.
pub trait PolicyEngine: Send + Sync {
    fn evaluate(&self, input: &Value) -> PolicyDecision;
}

/// Engine that returns a fixed verdict, for wiring and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPolicyEngine {
    pub deny_all: bool,
}

impl PolicyEngine for StaticPolicyEngine {
    fn evaluate(&self, _input: &Value) -> PolicyDecision {
        if self.deny_all {
            PolicyDecision::deny("static deny-all engine")
        } else {
            PolicyDecision::allow("static allow-all engine")
        }
    }
}
