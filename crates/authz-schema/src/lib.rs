mod descriptor;
mod registry;

pub use descriptor::{FieldDescriptor, FieldKind, MessageDescriptor, MethodDescriptor};
pub use registry::{SchemaBundle, SchemaError, SchemaRegistry};
