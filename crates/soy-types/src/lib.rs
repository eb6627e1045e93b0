//! The Soy type system.
//!
//! - [`SoyTypeRegistry`]: builtin names, provider lookup and structural interning
//! - [`SoyType`]: the type model, shared as [`SoyTypeRef`]
//! - [`TypeNode`] / [`parse_type_expression`]: type annotations as written
//! - [`TypeNodeConverter`]: resolves annotations to canonical types, reporting
//!   problems to an [`ErrorReporter`](soy_core::ErrorReporter)

mod converter;
mod interner;
mod parser;
mod provider;
mod registry;
mod suggest;
mod type_ast;
mod types;

pub use converter::{GenericType, TypeNodeConverter};
pub use parser::{MAX_NESTING_DEPTH, parse_type_expression};
pub use provider::{SchemaTypeProvider, TypeProvider, UnknownTypeProvider};
pub use registry::{BUILTIN_TYPE_NAMES, SoyTypeRegistry};
pub use suggest::{closest_name, did_you_mean};
pub use type_ast::{RecordProperty, TypeNode};
pub use types::{
    ListType, MapType, RecordField, RecordType, SanitizedKind, SoyType, SoyTypeKind, SoyTypeRef,
    UnionType, primitives,
};
