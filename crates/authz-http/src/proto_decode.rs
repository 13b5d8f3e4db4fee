use crate::DecodeLimits;
use authz_schema::{FieldDescriptor, FieldKind, MessageDescriptor, SchemaRegistry};
use base64::Engine as _;
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoDecodeErrorCode {
    TruncatedVarint,
    TruncatedField,
    InvalidFieldNumber,
    InvalidWireType,
    WireTypeMismatch,
    InvalidUtf8String,
    NonFiniteNumber,
    UnknownNestedMessage,
    DepthLimitExceeded,
}

impl ProtoDecodeErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TruncatedVarint => "truncated_varint",
            Self::TruncatedField => "truncated_field",
            Self::InvalidFieldNumber => "invalid_field_number",
            Self::InvalidWireType => "invalid_wire_type",
            Self::WireTypeMismatch => "wire_type_mismatch",
            Self::InvalidUtf8String => "invalid_utf8_string",
            Self::NonFiniteNumber => "non_finite_number",
            Self::UnknownNestedMessage => "unknown_nested_message",
            Self::DepthLimitExceeded => "depth_limit_exceeded",
        }
    }
}

/// Schema-driven decode of protobuf wire bytes into the generic value model.
///
/// Walks tag/length/value triples and renders each field under its
/// descriptor-declared name: scalars as native values, repeated fields as
/// ordered lists, nested messages recursively as mappings. No generated code
/// is involved; the descriptor is the only source of shape. Unknown fields
/// are skipped. Work is bounded by the payload length and
/// `limits.max_message_depth`.
pub fn decode_message(
    payload: &[u8],
    descriptor: &MessageDescriptor,
    registry: &SchemaRegistry,
    limits: &DecodeLimits,
) -> Result<Value, ProtoDecodeErrorCode> {
    decode_message_at(payload, descriptor, registry, limits, 0)
}

fn decode_message_at(
    payload: &[u8],
    descriptor: &MessageDescriptor,
    registry: &SchemaRegistry,
    limits: &DecodeLimits,
    depth: usize,
) -> Result<Value, ProtoDecodeErrorCode> {
    if depth >= limits.max_message_depth {
        return Err(ProtoDecodeErrorCode::DepthLimitExceeded);
    }

    let mut out = Map::new();
    let mut cursor = 0_usize;

    while cursor < payload.len() {
        let (tag, advance) =
            read_varint(&payload[cursor..]).ok_or(ProtoDecodeErrorCode::TruncatedVarint)?;
        cursor += advance;

        let field_number = (tag >> 3) as u32;
        let wire_type = (tag & 0x07) as u8;
        if field_number == 0 {
            return Err(ProtoDecodeErrorCode::InvalidFieldNumber);
        }

        let Some(field) = descriptor.field(field_number) else {
            cursor += skip_field(wire_type, &payload[cursor..])?;
            continue;
        };

        match wire_type {
            0 => {
                let (raw, advance) = read_varint(&payload[cursor..])
                    .ok_or(ProtoDecodeErrorCode::TruncatedVarint)?;
                cursor += advance;
                store(&mut out, field, varint_value(field, raw)?);
            }
            1 => {
                let bytes = take(&payload[cursor..], 8)?;
                cursor += 8;
                let raw = u64::from_le_bytes(bytes.try_into().expect("slice length checked"));
                store(&mut out, field, fixed64_value(field, raw)?);
            }
            5 => {
                let bytes = take(&payload[cursor..], 4)?;
                cursor += 4;
                let raw = u32::from_le_bytes(bytes.try_into().expect("slice length checked"));
                store(&mut out, field, fixed32_value(field, raw)?);
            }
            2 => {
                let (len, advance) = read_varint(&payload[cursor..])
                    .ok_or(ProtoDecodeErrorCode::TruncatedVarint)?;
                cursor += advance;
                let bytes = take(&payload[cursor..], len as usize)?;
                cursor += len as usize;

                match field.kind {
                    FieldKind::String => {
                        let text = std::str::from_utf8(bytes)
                            .map_err(|_| ProtoDecodeErrorCode::InvalidUtf8String)?;
                        store(&mut out, field, Value::String(text.to_string()));
                    }
                    FieldKind::Bytes => {
                        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                        store(&mut out, field, Value::String(encoded));
                    }
                    FieldKind::Message => {
                        let nested = field
                            .message
                            .as_deref()
                            .and_then(|name| registry.message(name))
                            .ok_or(ProtoDecodeErrorCode::UnknownNestedMessage)?;
                        let value =
                            decode_message_at(bytes, nested, registry, limits, depth + 1)?;
                        store(&mut out, field, value);
                    }
                    _ if field.repeated => {
                        for value in decode_packed(bytes, field)? {
                            store(&mut out, field, value);
                        }
                    }
                    _ => return Err(ProtoDecodeErrorCode::WireTypeMismatch),
                }
            }
            _ => return Err(ProtoDecodeErrorCode::InvalidWireType),
        }
    }

    Ok(Value::Object(out))
}

/// Repeated fields accumulate in encounter order; a singular field seen more
/// than once keeps the last occurrence, per proto3 merge semantics.
fn store(out: &mut Map<String, Value>, field: &FieldDescriptor, value: Value) {
    if field.repeated {
        let entry = out
            .entry(field.name.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = entry {
            values.push(value);
        }
    } else {
        out.insert(field.name.clone(), value);
    }
}

fn varint_value(field: &FieldDescriptor, raw: u64) -> Result<Value, ProtoDecodeErrorCode> {
    let value = match field.kind {
        FieldKind::Bool => Value::Bool(raw != 0),
        FieldKind::Int32 | FieldKind::Int64 => Value::Number(Number::from(raw as i64)),
        FieldKind::Uint32 | FieldKind::Uint64 => Value::Number(Number::from(raw)),
        FieldKind::Sint32 | FieldKind::Sint64 => Value::Number(Number::from(zigzag(raw))),
        FieldKind::Enum => Value::Number(Number::from(raw as i64)),
        _ => return Err(ProtoDecodeErrorCode::WireTypeMismatch),
    };
    Ok(value)
}

fn fixed64_value(field: &FieldDescriptor, raw: u64) -> Result<Value, ProtoDecodeErrorCode> {
    let value = match field.kind {
        FieldKind::Fixed64 => Value::Number(Number::from(raw)),
        FieldKind::Sfixed64 => Value::Number(Number::from(raw as i64)),
        FieldKind::Double => float_number(f64::from_bits(raw))?,
        _ => return Err(ProtoDecodeErrorCode::WireTypeMismatch),
    };
    Ok(value)
}

fn fixed32_value(field: &FieldDescriptor, raw: u32) -> Result<Value, ProtoDecodeErrorCode> {
    let value = match field.kind {
        FieldKind::Fixed32 => Value::Number(Number::from(raw)),
        FieldKind::Sfixed32 => Value::Number(Number::from(raw as i32)),
        FieldKind::Float => float_number(f64::from(f32::from_bits(raw)))?,
        _ => return Err(ProtoDecodeErrorCode::WireTypeMismatch),
    };
    Ok(value)
}

fn float_number(value: f64) -> Result<Value, ProtoDecodeErrorCode> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or(ProtoDecodeErrorCode::NonFiniteNumber)
}

/// Packed encoding of a repeated scalar: the length-delimited payload is a
/// back-to-back run of elements with no tags.
fn decode_packed(
    bytes: &[u8],
    field: &FieldDescriptor,
) -> Result<Vec<Value>, ProtoDecodeErrorCode> {
    let mut values = Vec::new();
    let mut cursor = 0_usize;
    while cursor < bytes.len() {
        match field.kind {
            FieldKind::Double | FieldKind::Fixed64 | FieldKind::Sfixed64 => {
                let chunk = take(&bytes[cursor..], 8)?;
                cursor += 8;
                let raw = u64::from_le_bytes(chunk.try_into().expect("slice length checked"));
                values.push(fixed64_value(field, raw)?);
            }
            FieldKind::Float | FieldKind::Fixed32 | FieldKind::Sfixed32 => {
                let chunk = take(&bytes[cursor..], 4)?;
                cursor += 4;
                let raw = u32::from_le_bytes(chunk.try_into().expect("slice length checked"));
                values.push(fixed32_value(field, raw)?);
            }
            FieldKind::Bool
            | FieldKind::Int32
            | FieldKind::Int64
            | FieldKind::Uint32
            | FieldKind::Uint64
            | FieldKind::Sint32
            | FieldKind::Sint64
            | FieldKind::Enum => {
                let (raw, advance) = read_varint(&bytes[cursor..])
                    .ok_or(ProtoDecodeErrorCode::TruncatedVarint)?;
                cursor += advance;
                values.push(varint_value(field, raw)?);
            }
            FieldKind::String | FieldKind::Bytes | FieldKind::Message => {
                return Err(ProtoDecodeErrorCode::WireTypeMismatch)
            }
        }
    }
    Ok(values)
}

fn skip_field(wire_type: u8, bytes: &[u8]) -> Result<usize, ProtoDecodeErrorCode> {
    match wire_type {
        0 => read_varint(bytes)
            .map(|(_, advance)| advance)
            .ok_or(ProtoDecodeErrorCode::TruncatedVarint),
        1 => {
            take(bytes, 8)?;
            Ok(8)
        }
        2 => {
            let (len, advance) =
                read_varint(bytes).ok_or(ProtoDecodeErrorCode::TruncatedVarint)?;
            take(&bytes[advance..], len as usize)?;
            Ok(advance + len as usize)
        }
        5 => {
            take(bytes, 4)?;
            Ok(4)
        }
        _ => Err(ProtoDecodeErrorCode::InvalidWireType),
    }
}

fn take(bytes: &[u8], len: usize) -> Result<&[u8], ProtoDecodeErrorCode> {
    if bytes.len() < len {
        return Err(ProtoDecodeErrorCode::TruncatedField);
    }
    Ok(&bytes[..len])
}

fn read_varint(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0_u64;
    let mut shift = 0_u32;

    for (index, byte) in bytes.iter().enumerate() {
        let part = (byte & 0x7f) as u64;
        value |= part << shift;
        if byte & 0x80 == 0 {
            return Some((value, index + 1));
        }
        shift += 7;
        if shift > 63 {
            return None;
        }
    }

    None
}

fn zigzag(raw: u64) -> i64 {
    ((raw >> 1) as i64) ^ -((raw & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::{decode_message, ProtoDecodeErrorCode};
    use crate::DecodeLimits;
    use authz_schema::{
        FieldDescriptor, FieldKind, MessageDescriptor, MethodDescriptor, SchemaBundle,
        SchemaRegistry,
    };
    use serde_json::json;

    fn field(number: u32, name: &str, kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor {
            number,
            name: name.to_string(),
            kind,
            repeated: false,
            message: None,
        }
    }

    fn repeated(number: u32, name: &str, kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor {
            repeated: true,
            ..field(number, name, kind)
        }
    }

    fn registry_with(messages: Vec<MessageDescriptor>) -> SchemaRegistry {
        let entry = messages[0].name.clone();
        SchemaRegistry::from_bundle(SchemaBundle {
            version: None,
            messages,
            methods: vec![MethodDescriptor {
                service: "test.Service".to_string(),
                method: "Call".to_string(),
                input_message: entry,
            }],
        })
        .expect("valid bundle")
    }

    fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
        loop {
            if value < 0x80 {
                out.push(value as u8);
                break;
            }
            out.push(((value & 0x7f) as u8) | 0x80);
            value >>= 7;
        }
    }

    fn encode_tag(field_number: u32, wire_type: u8, out: &mut Vec<u8>) {
        encode_varint(((field_number as u64) << 3) | wire_type as u64, out);
    }

    fn encode_len_delimited(field_number: u32, bytes: &[u8], out: &mut Vec<u8>) {
        encode_tag(field_number, 2, out);
        encode_varint(bytes.len() as u64, out);
        out.extend_from_slice(bytes);
    }

    #[test]
    fn decodes_string_field_under_descriptor_name() {
        let registry = registry_with(vec![MessageDescriptor {
            name: "test.Request".to_string(),
            fields: vec![field(1, "author", FieldKind::String)],
        }]);
        let descriptor = registry.message("test.Request").expect("message");

        let mut payload = Vec::new();
        encode_len_delimited(1, b"John", &mut payload);

        let value = decode_message(&payload, descriptor, &registry, &DecodeLimits::default())
            .expect("decodes");
        assert_eq!(value, json!({"author": "John"}));
    }

    #[test]
    fn decodes_scalars_repeated_and_nested_messages() {
        let registry = registry_with(vec![
            MessageDescriptor {
                name: "test.Outer".to_string(),
                fields: vec![
                    FieldDescriptor {
                        number: 1,
                        name: "meta".to_string(),
                        kind: FieldKind::Message,
                        repeated: false,
                        message: Some("test.Meta".to_string()),
                    },
                    repeated(2, "tags", FieldKind::String),
                    field(3, "count", FieldKind::Int64),
                    field(4, "enabled", FieldKind::Bool),
                ],
            },
            MessageDescriptor {
                name: "test.Meta".to_string(),
                fields: vec![
                    field(1, "severity_text", FieldKind::String),
                    field(2, "severity_number", FieldKind::Sint32),
                ],
            },
        ]);
        let descriptor = registry.message("test.Outer").expect("message");

        let mut meta = Vec::new();
        encode_len_delimited(1, b"ERROR", &mut meta);
        encode_tag(2, 0, &mut meta);
        encode_varint(zigzag_encode(-3), &mut meta);

        let mut payload = Vec::new();
        encode_len_delimited(1, &meta, &mut payload);
        encode_len_delimited(2, b"first", &mut payload);
        encode_len_delimited(2, b"second", &mut payload);
        encode_tag(3, 0, &mut payload);
        encode_varint(7, &mut payload);
        encode_tag(4, 0, &mut payload);
        encode_varint(1, &mut payload);

        let value = decode_message(&payload, descriptor, &registry, &DecodeLimits::default())
            .expect("decodes");
        assert_eq!(
            value,
            json!({
                "meta": {"severity_text": "ERROR", "severity_number": -3},
                "tags": ["first", "second"],
                "count": 7,
                "enabled": true,
            })
        );
    }

    #[test]
    fn packed_repeated_varints_expand_to_a_list() {
        let registry = registry_with(vec![MessageDescriptor {
            name: "test.Request".to_string(),
            fields: vec![repeated(1, "ids", FieldKind::Uint32)],
        }]);
        let descriptor = registry.message("test.Request").expect("message");

        let mut packed = Vec::new();
        for id in [3_u64, 270, 86942] {
            encode_varint(id, &mut packed);
        }
        let mut payload = Vec::new();
        encode_len_delimited(1, &packed, &mut payload);

        let value = decode_message(&payload, descriptor, &registry, &DecodeLimits::default())
            .expect("decodes");
        assert_eq!(value, json!({"ids": [3, 270, 86942]}));
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let registry = registry_with(vec![MessageDescriptor {
            name: "test.Request".to_string(),
            fields: vec![field(2, "kept", FieldKind::String)],
        }]);
        let descriptor = registry.message("test.Request").expect("message");

        let mut payload = Vec::new();
        encode_len_delimited(9, b"dropped", &mut payload);
        encode_tag(8, 0, &mut payload);
        encode_varint(99, &mut payload);
        encode_len_delimited(2, b"kept value", &mut payload);

        let value = decode_message(&payload, descriptor, &registry, &DecodeLimits::default())
            .expect("decodes");
        assert_eq!(value, json!({"kept": "kept value"}));
    }

    #[test]
    fn bytes_fields_render_as_base64() {
        let registry = registry_with(vec![MessageDescriptor {
            name: "test.Request".to_string(),
            fields: vec![field(1, "blob", FieldKind::Bytes)],
        }]);
        let descriptor = registry.message("test.Request").expect("message");

        let mut payload = Vec::new();
        encode_len_delimited(1, &[0xde, 0xad, 0xbe, 0xef], &mut payload);

        let value = decode_message(&payload, descriptor, &registry, &DecodeLimits::default())
            .expect("decodes");
        assert_eq!(value, json!({"blob": "3q2+7w=="}));
    }

    #[test]
    fn truncated_length_delimited_field_fails() {
        let registry = registry_with(vec![MessageDescriptor {
            name: "test.Request".to_string(),
            fields: vec![field(1, "author", FieldKind::String)],
        }]);
        let descriptor = registry.message("test.Request").expect("message");

        // Declares 10 bytes but carries 4.
        let mut payload = Vec::new();
        encode_tag(1, 2, &mut payload);
        encode_varint(10, &mut payload);
        payload.extend_from_slice(b"John");

        let err = decode_message(&payload, descriptor, &registry, &DecodeLimits::default())
            .expect_err("must fail");
        assert_eq!(err, ProtoDecodeErrorCode::TruncatedField);
    }

    #[test]
    fn nesting_beyond_the_depth_limit_fails() {
        let registry = registry_with(vec![MessageDescriptor {
            name: "test.Recursive".to_string(),
            fields: vec![FieldDescriptor {
                number: 1,
                name: "next".to_string(),
                kind: FieldKind::Message,
                repeated: false,
                message: Some("test.Recursive".to_string()),
            }],
        }]);
        let descriptor = registry.message("test.Recursive").expect("message");
        let limits = DecodeLimits {
            max_message_depth: 4,
            ..DecodeLimits::default()
        };

        let mut payload = Vec::new();
        for _ in 0..8 {
            let mut wrapped = Vec::new();
            encode_len_delimited(1, &payload, &mut wrapped);
            payload = wrapped;
        }

        let err =
            decode_message(&payload, descriptor, &registry, &limits).expect_err("must fail");
        assert_eq!(err, ProtoDecodeErrorCode::DepthLimitExceeded);
    }

    #[test]
    fn singular_field_repeated_on_the_wire_keeps_the_last_value() {
        let registry = registry_with(vec![MessageDescriptor {
            name: "test.Request".to_string(),
            fields: vec![field(1, "author", FieldKind::String)],
        }]);
        let descriptor = registry.message("test.Request").expect("message");

        let mut payload = Vec::new();
        encode_len_delimited(1, b"first", &mut payload);
        encode_len_delimited(1, b"last", &mut payload);

        let value = decode_message(&payload, descriptor, &registry, &DecodeLimits::default())
            .expect("decodes");
        assert_eq!(value, json!({"author": "last"}));
    }

    fn zigzag_encode(value: i64) -> u64 {
        ((value << 1) ^ (value >> 63)) as u64
    }
}
