//! SoyTypeRegistry - canonical storage for the types of one compilation.
//!
//! # Lookup
//!
//! [`SoyTypeRegistry::get_type`] checks the builtin table first, then each
//! [`TypeProvider`] in the order they were given; the first hit wins.
//!
//! # Interning
//!
//! Compound types are interned per registry: asking twice for `list<int>`
//! returns the same `Arc`. Each compound kind has its own store, and every
//! store is safe to use from several single-file workers at once.
//!
//! # Example
//!
//! ```
//! use soy_types::{SoyTypeRegistry, primitives};
//! use std::sync::Arc;
//!
//! let registry = SoyTypeRegistry::new();
//! let a = registry.get_or_create_list_type(primitives::INT.clone());
//! let b = registry.get_or_create_list_type(primitives::INT.clone());
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use soy_core::ErrorReporter;

use crate::converter::TypeNodeConverter;
use crate::interner::TypeInterner;
use crate::parser::parse_type_expression;
use crate::provider::{TypeProvider, UnknownTypeProvider};
use crate::type_ast::TypeNode;
use crate::types::{
    ListType, MapType, RecordField, RecordType, SoyType, SoyTypeRef, UnionFold, UnionType,
    primitives,
};

/// Names resolved by the registry itself, before any provider is asked.
pub const BUILTIN_TYPE_NAMES: [&str; 14] = [
    "?",
    "any",
    "null",
    "bool",
    "int",
    "float",
    "string",
    "number",
    "html",
    "attributes",
    "css",
    "uri",
    "trusted_resource_url",
    "js",
];

fn builtin_type(name: &str) -> Option<SoyTypeRef> {
    let ty = match name {
        "?" => &primitives::UNKNOWN,
        "any" => &primitives::ANY,
        "null" => &primitives::NULL,
        "bool" => &primitives::BOOL,
        "int" => &primitives::INT,
        "float" => &primitives::FLOAT,
        "string" => &primitives::STRING,
        "number" => &primitives::NUMBER,
        "html" => &primitives::HTML,
        "attributes" => &primitives::ATTRIBUTES,
        "css" => &primitives::CSS,
        "uri" => &primitives::URI,
        "trusted_resource_url" => &primitives::TRUSTED_RESOURCE_URI,
        "js" => &primitives::JS,
        _ => return None,
    };
    Some(Arc::clone(ty))
}

/// Registry of types which can be looked up by name.
pub struct SoyTypeRegistry {
    providers: Vec<Arc<dyn TypeProvider>>,
    lists: TypeInterner,
    maps: TypeInterner,
    legacy_object_maps: TypeInterner,
    unions: TypeInterner,
    records: TypeInterner,
    /// Builtin and provider names, sorted. Computed on first use.
    sorted_type_names: OnceLock<Vec<String>>,
}

impl SoyTypeRegistry {
    /// A registry with only the builtin types.
    pub fn new() -> Self {
        Self::with_providers(Vec::new())
    }

    /// A registry consulting `providers` in order. Passing the same provider
    /// twice has no effect beyond the first.
    pub fn with_providers(providers: impl IntoIterator<Item = Arc<dyn TypeProvider>>) -> Self {
        let mut unique: Vec<Arc<dyn TypeProvider>> = Vec::new();
        for provider in providers {
            if !unique.iter().any(|existing| Arc::ptr_eq(existing, &provider)) {
                unique.push(provider);
            }
        }
        Self {
            providers: unique,
            lists: TypeInterner::new(),
            maps: TypeInterner::new(),
            legacy_object_maps: TypeInterner::new(),
            unions: TypeInterner::new(),
            records: TypeInterner::new(),
            sorted_type_names: OnceLock::new(),
        }
    }

    /// A registry that resolves every non-builtin name to `?`.
    pub fn default_unknown() -> Self {
        Self::with_providers([Arc::new(UnknownTypeProvider) as Arc<dyn TypeProvider>])
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Look up a type by its fully-qualified name.
    pub fn get_type(&self, name: &str) -> Option<SoyTypeRef> {
        if let Some(ty) = builtin_type(name) {
            return Some(ty);
        }
        self.providers
            .iter()
            .find_map(|provider| provider.get_type(name, self))
    }

    /// The first name, in sorted order, inside the namespace `prefix`.
    ///
    /// Used to suggest an import when a bare namespace is referenced.
    pub fn find_type_with_matching_namespace(&self, prefix: &str) -> Option<&str> {
        let prefix = format!("{prefix}.");
        self.all_sorted_type_names()
            .iter()
            .find(|name| name.starts_with(&prefix))
            .map(String::as_str)
    }

    /// Every builtin and provider name, sorted and de-duplicated.
    ///
    /// Sorting keeps suggestions deterministic. The list is built once; the
    /// provider set is fixed at construction so it can never go stale.
    pub fn all_sorted_type_names(&self) -> &[String] {
        self.sorted_type_names.get_or_init(|| {
            // Names from every provider are accumulated. An earlier revision of
            // this lookup kept only the last provider's names.
            let mut names: Vec<String> = BUILTIN_TYPE_NAMES.iter().map(|s| s.to_string()).collect();
            for provider in &self.providers {
                names.extend(provider.all_type_names());
            }
            names.sort();
            names.dedup();
            names
        })
    }

    // ==========================================================================
    // Structural constructors
    // ==========================================================================

    pub fn get_or_create_list_type(&self, element: SoyTypeRef) -> SoyTypeRef {
        self.lists.intern(SoyType::List(ListType { element }))
    }

    pub fn get_or_create_map_type(&self, key: SoyTypeRef, value: SoyTypeRef) -> SoyTypeRef {
        self.maps.intern(SoyType::Map(MapType { key, value }))
    }

    pub fn get_or_create_legacy_object_map_type(
        &self,
        key: SoyTypeRef,
        value: SoyTypeRef,
    ) -> SoyTypeRef {
        self.legacy_object_maps
            .intern(SoyType::LegacyObjectMap(MapType { key, value }))
    }

    /// Union of `members`, flattened and de-duplicated.
    ///
    /// When only one distinct member remains, that member is returned as is
    /// and nothing is interned.
    pub fn get_or_create_union_type(
        &self,
        members: impl IntoIterator<Item = SoyTypeRef>,
    ) -> SoyTypeRef {
        match UnionType::fold(members) {
            UnionFold::Collapsed(ty) => ty,
            UnionFold::Union(union) => self.unions.intern(SoyType::Union(union)),
        }
    }

    /// Record with the given fields, in order. A repeated name keeps its first type.
    pub fn get_or_create_record_type(
        &self,
        fields: impl IntoIterator<Item = RecordField>,
    ) -> SoyTypeRef {
        self.records.intern(SoyType::Record(RecordType::new(fields)))
    }

    /// Number of distinct compound types interned so far.
    pub fn interned_count(&self) -> usize {
        self.lists.len()
            + self.maps.len()
            + self.legacy_object_maps.len()
            + self.unions.len()
            + self.records.len()
    }

    // ==========================================================================
    // Type expressions
    // ==========================================================================

    /// Convert a parsed type expression. A missing expression means `?`.
    ///
    /// Problems are reported to `reporter` and resolve to the error type.
    pub fn get_or_create_type(
        &self,
        node: Option<&TypeNode>,
        reporter: &ErrorReporter,
    ) -> SoyTypeRef {
        match node {
            Some(node) => TypeNodeConverter::new(self, reporter).convert(node),
            None => primitives::UNKNOWN.clone(),
        }
    }

    /// Parse and convert a type written as text.
    pub fn resolve_type_string(&self, text: &str, reporter: &ErrorReporter) -> SoyTypeRef {
        match parse_type_expression(text) {
            Ok(node) => self.get_or_create_type(Some(&node), reporter),
            Err(error) => {
                reporter.report(error);
                primitives::ERROR.clone()
            }
        }
    }
}

impl Default for SoyTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SoyTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoyTypeRegistry")
            .field("providers", &self.providers.len())
            .field("interned", &self.interned_count())
            .finish()
    }
}
