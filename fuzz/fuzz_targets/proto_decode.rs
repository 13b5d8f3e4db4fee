#![no_main]

use authz_http::{decode_message, DecodeLimits};
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
            messages: vec![
                MessageDescriptor {
                    name: "fuzz.Node".to_string(),
                    fields: vec![
                        FieldDescriptor {
                            number: 1,
                            name: "child".to_string(),
                            kind: FieldKind::Message,
                            repeated: true,
                            message: Some("fuzz.Node".to_string()),
                        },
                        FieldDescriptor {
                            number: 2,
                            name: "label".to_string(),
                            kind: FieldKind::String,
                            repeated: false,
                            message: None,
                        },
                        FieldDescriptor {
                            number: 3,
                            name: "weights".to_string(),
                            kind: FieldKind::Double,
                            repeated: true,
                            message: None,
                        },
                        FieldDescriptor {
                            number: 4,
                            name: "flags".to_string(),
                            kind: FieldKind::Bool,
                            repeated: true,
                            message: None,
                        },
                    ],
                },
            ],
            methods: vec![MethodDescriptor {
                service: "fuzz.Service".to_string(),
                method: "Walk".to_string(),
                input_message: "fuzz.Node".to_string(),
            }],
        })
        .expect("valid bundle")
    })
}

fuzz_target!(|data: &[u8]| {
    let registry = registry();
    let descriptor = registry.message("fuzz.Node").expect("message registered");
    let _ = decode_message(data, descriptor, registry, &DecodeLimits::default());
});
