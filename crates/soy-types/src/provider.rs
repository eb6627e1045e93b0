//! External type providers.
//!
//! A [`SoyTypeRegistry`] consults its providers, in order, for any name that
//! is not a builtin. Providers must hand out the same instance for the same
//! name for the lifetime of the registry.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::SoyTypeRegistry;
use crate::types::{SoyType, SoyTypeRef, primitives};

/// Supplies named types beyond the builtin table.
pub trait TypeProvider: Send + Sync {
    /// Look up a fully-qualified type name.
    fn get_type(&self, name: &str, registry: &SoyTypeRegistry) -> Option<SoyTypeRef>;

    /// Every name this provider can resolve. Only used for suggestions and
    /// namespace search.
    fn all_type_names(&self) -> Vec<String>;
}

/// Serves message and enum types declared by a schema (for example, the
/// protos imported by a file set).
#[derive(Debug, Default)]
pub struct SchemaTypeProvider {
    types: FxHashMap<String, SoyTypeRef>,
}

impl SchemaTypeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a message type.
    pub fn with_message(mut self, full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let ty = Arc::new(SoyType::Proto(full_name.clone()));
        self.types.insert(full_name, ty);
        self
    }

    /// Declare an enum type.
    pub fn with_enum(mut self, full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let ty = Arc::new(SoyType::ProtoEnum(full_name.clone()));
        self.types.insert(full_name, ty);
        self
    }
}

impl TypeProvider for SchemaTypeProvider {
    fn get_type(&self, name: &str, _registry: &SoyTypeRegistry) -> Option<SoyTypeRef> {
        self.types.get(name).cloned()
    }

    fn all_type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }
}

/// Resolves every name to `?`.
///
/// Backs [`SoyTypeRegistry::default_unknown`] for tools that compile
/// templates without any schema information.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnknownTypeProvider;

impl TypeProvider for UnknownTypeProvider {
    fn get_type(&self, _name: &str, _registry: &SoyTypeRegistry) -> Option<SoyTypeRef> {
        Some(primitives::UNKNOWN.clone())
    }

    fn all_type_names(&self) -> Vec<String> {
        Vec::new()
    }
}
