#![no_main]

use authz_http::{decode_grpc_body, DecodeLimits};
use authz_schema::{
    FieldDescriptor, FieldKind, MessageDescriptor, MethodDescriptor, SchemaBundle, SchemaRegistry,
};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

fn registry() -> &'static SchemaRegistry {
    static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        SchemaRegistry::from_bundle(SchemaBundle {
            version: None,
            messages: vec![MessageDescriptor {
                name: "fuzz.Request".to_string(),
                fields: vec![
                    FieldDescriptor {
                        number: 1,
                        name: "text".to_string(),
                        kind: FieldKind::String,
                        repeated: false,
                        message: None,
                    },
                    FieldDescriptor {
                        number: 2,
                        name: "count".to_string(),
                        kind: FieldKind::Int64,
                        repeated: true,
                        message: None,
                    },
                ],
            }],
            methods: vec![MethodDescriptor {
                service: "fuzz.Service".to_string(),
                method: "Call".to_string(),
                input_message: "fuzz.Request".to_string(),
            }],
        })
        .expect("valid bundle")
    })
}

fuzz_target!(|data: &[u8]| {
    let path = vec!["fuzz.Service".to_string(), "Call".to_string()];
    let _ = decode_grpc_body(data, &path, registry(), &DecodeLimits::default());
});
