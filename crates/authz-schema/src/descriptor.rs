use serde::{Deserialize, Serialize};

/// Scalar or composite kind of a protobuf field, as declared by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Enum,
    Message,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Enum => "enum",
            Self::Message => "message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldDescriptor {
    pub number: u32,
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub repeated: bool,
    /// Fully-qualified message name, set when `kind` is `Message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageDescriptor {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    pub fn field(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.number == number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MethodDescriptor {
    pub service: String,
    pub method: String,
    pub input_message: String,
}

#[cfg(test)]
mod tests {
    use super::{FieldDescriptor, FieldKind, MessageDescriptor};

    #[test]
    fn field_lookup_is_by_number() {
        let descriptor = MessageDescriptor {
            name: "test.Message".to_string(),
            fields: vec![
                FieldDescriptor {
                    number: 1,
                    name: "author".to_string(),
                    kind: FieldKind::String,
                    repeated: false,
                    message: None,
                },
                FieldDescriptor {
                    number: 3,
                    name: "pages".to_string(),
                    kind: FieldKind::Int32,
                    repeated: true,
                    message: None,
                },
            ],
        };

        assert_eq!(
            descriptor.field(3).map(|field| field.name.as_str()),
            Some("pages")
        );
        assert!(descriptor.field(2).is_none());
    }
}
