use crate::descriptor::{MessageDescriptor, MethodDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema bundle is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate message descriptor: {0}")]
    DuplicateMessage(String),
    #[error("duplicate method descriptor: {service}/{method}")]
    DuplicateMethod { service: String, method: String },
    #[error("method {service}/{method} references unknown input message {input_message}")]
    UnknownInputMessage {
        service: String,
        method: String,
        input_message: String,
    },
}

/// Serde-loadable form of the schema registry, provisioned out-of-band from
/// a compiled descriptor-set artifact.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SchemaBundle {
    pub version: Option<String>,
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

/// Read-only index of message and method descriptors.
///
/// Constructed once at process start; lookups never mutate, so a shared
/// reference is safe for unbounded concurrent readers.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    messages: HashMap<String, MessageDescriptor>,
    methods: HashMap<(String, String), String>,
}

impl SchemaRegistry {
    pub fn from_bundle(bundle: SchemaBundle) -> Result<Self, SchemaError> {
        let mut messages = HashMap::with_capacity(bundle.messages.len());
        for message in bundle.messages {
            if messages
                .insert(message.name.to_ascii_lowercase(), message.clone())
                .is_some()
            {
                return Err(SchemaError::DuplicateMessage(message.name));
            }
        }

        let mut methods = HashMap::with_capacity(bundle.methods.len());
        for method in bundle.methods {
            let input = method.input_message.to_ascii_lowercase();
            if !messages.contains_key(&input) {
                return Err(SchemaError::UnknownInputMessage {
                    service: method.service,
                    method: method.method,
                    input_message: method.input_message,
                });
            }
            let key = (
                method.service.to_ascii_lowercase(),
                method.method.to_ascii_lowercase(),
            );
            if methods.insert(key, input).is_some() {
                return Err(SchemaError::DuplicateMethod {
                    service: method.service,
                    method: method.method,
                });
            }
        }

        Ok(Self { messages, methods })
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, SchemaError> {
        let bundle: SchemaBundle = serde_json::from_slice(bytes)?;
        Self::from_bundle(bundle)
    }

    /// Resolve the input-message descriptor of a fully-qualified
    /// service/method pair. Lookups are ASCII-case-insensitive.
    pub fn lookup_method(&self, service: &str, method: &str) -> Option<&MessageDescriptor> {
        let key = (service.to_ascii_lowercase(), method.to_ascii_lowercase());
        let input = self.methods.get(&key)?;
        self.messages.get(input)
    }

    pub fn message(&self, name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(&name.to_ascii_lowercase())
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}
