//! Type-expression conversion.
//!
//! [`TypeNodeConverter`] walks a [`TypeNode`] and produces a canonical type
//! from the registry. Malformed input never fails the conversion: each problem
//! is reported and the offending expression resolves to the error type, so
//! later passes can keep going.

use std::cell::Cell;

use soy_core::{ErrorReporter, SoyError, Span};

use crate::parser::MAX_NESTING_DEPTH;
use crate::registry::SoyTypeRegistry;
use crate::suggest::did_you_mean;
use crate::type_ast::{RecordProperty, TypeNode};
use crate::types::{RecordField, SoyTypeKind, SoyTypeRef, primitives};

/// The generic type constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericType {
    List,
    LegacyObjectMap,
    /// `map<K, V>` is still an alias for `legacy_object_map<K, V>`.
    Map,
    ExperimentalMap,
}

/// Key kinds accepted by `experimental_map`.
const ALLOWED_MAP_KEY_KINDS: [SoyTypeKind; 4] = [
    SoyTypeKind::Bool,
    SoyTypeKind::Int,
    SoyTypeKind::String,
    SoyTypeKind::ProtoEnum,
];

impl GenericType {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "list" => Some(GenericType::List),
            "legacy_object_map" => Some(GenericType::LegacyObjectMap),
            "map" => Some(GenericType::Map),
            "experimental_map" => Some(GenericType::ExperimentalMap),
            _ => None,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            GenericType::List => 1,
            GenericType::LegacyObjectMap | GenericType::Map | GenericType::ExperimentalMap => 2,
        }
    }

    /// Report anything wrong with the converted arguments.
    fn check_permissible(
        self,
        args: &[SoyTypeRef],
        nodes: &[TypeNode],
        reporter: &ErrorReporter,
    ) {
        if self != GenericType::ExperimentalMap {
            return;
        }
        let key = &args[0];
        // An unresolved key is reported again here, so the map itself fails.
        if ALLOWED_MAP_KEY_KINDS.contains(&key.kind()) {
            return;
        }
        reporter.report(SoyError::BadMapKeyType {
            key_type: key.to_string(),
            span: nodes[0].span(),
        });
    }

    fn create(self, registry: &SoyTypeRegistry, args: &[SoyTypeRef]) -> SoyTypeRef {
        match self {
            GenericType::List => registry.get_or_create_list_type(args[0].clone()),
            GenericType::LegacyObjectMap | GenericType::Map => {
                registry.get_or_create_legacy_object_map_type(args[0].clone(), args[1].clone())
            }
            GenericType::ExperimentalMap => {
                registry.get_or_create_map_type(args[0].clone(), args[1].clone())
            }
        }
    }
}

/// Resolves type expressions against one registry, reporting to one sink.
pub struct TypeNodeConverter<'a> {
    registry: &'a SoyTypeRegistry,
    reporter: &'a ErrorReporter,
    depth: Cell<usize>,
}

impl<'a> TypeNodeConverter<'a> {
    pub fn new(registry: &'a SoyTypeRegistry, reporter: &'a ErrorReporter) -> Self {
        Self {
            registry,
            reporter,
            depth: Cell::new(0),
        }
    }

    /// Trees deeper than the parser accepts resolve to the error type.
    pub fn convert(&self, node: &TypeNode) -> SoyTypeRef {
        let depth = self.depth.get();
        if depth == MAX_NESTING_DEPTH {
            self.reporter.report(SoyError::Syntax {
                message: format!("type expression nested deeper than {MAX_NESTING_DEPTH} levels"),
                span: node.span(),
            });
            return primitives::ERROR.clone();
        }
        self.depth.set(depth + 1);
        let ty = self.convert_node(node);
        self.depth.set(depth);
        ty
    }

    fn convert_node(&self, node: &TypeNode) -> SoyTypeRef {
        match node {
            TypeNode::Named { name, span } => self.convert_named(name, *span),
            TypeNode::Generic {
                name,
                arguments,
                span,
                close,
            } => self.convert_generic(name, arguments, *span, *close),
            TypeNode::Union { candidates, .. } => {
                let members: Vec<SoyTypeRef> =
                    candidates.iter().map(|node| self.convert(node)).collect();
                self.registry.get_or_create_union_type(members)
            }
            TypeNode::Record { properties, .. } => self.convert_record(properties),
        }
    }

    fn convert_named(&self, name: &str, span: Span) -> SoyTypeRef {
        if let Some(ty) = self.registry.get_type(name) {
            return ty;
        }
        let error = match GenericType::lookup(name) {
            Some(generic) => SoyError::MissingGenericTypeParameters {
                name: name.to_string(),
                arity: generic.arity(),
                span,
            },
            None => SoyError::UnknownType {
                name: name.to_string(),
                suggestion: did_you_mean(self.registry.all_sorted_type_names(), name),
                span,
            },
        };
        self.reporter.report(error);
        primitives::ERROR.clone()
    }

    fn convert_generic(
        &self,
        name: &str,
        arguments: &[TypeNode],
        span: Span,
        close: Span,
    ) -> SoyTypeRef {
        let Some(generic) = GenericType::lookup(name) else {
            self.reporter.report(SoyError::NotAGenericType {
                name: name.to_string(),
                span,
            });
            return primitives::ERROR.clone();
        };

        let arity = generic.arity();
        if arguments.len() < arity {
            self.reporter.report(SoyError::ExpectedTypeParameter {
                name: name.to_string(),
                arity,
                span: close,
            });
            return primitives::ERROR.clone();
        }
        if arguments.len() > arity {
            self.reporter.report(SoyError::UnexpectedTypeParameter {
                name: name.to_string(),
                arity,
                span: arguments[arity].span(),
            });
            return primitives::ERROR.clone();
        }

        let args: Vec<SoyTypeRef> = arguments.iter().map(|node| self.convert(node)).collect();
        let checkpoint = self.reporter.checkpoint();
        generic.check_permissible(&args, arguments, self.reporter);
        if self.reporter.errors_since(checkpoint) {
            return primitives::ERROR.clone();
        }
        generic.create(self.registry, &args)
    }

    fn convert_record(&self, properties: &[RecordProperty]) -> SoyTypeRef {
        let mut fields: Vec<RecordField> = Vec::with_capacity(properties.len());
        for property in properties {
            let ty = self.convert(&property.ty);
            if fields.iter().any(|field| field.name == property.name) {
                self.reporter.report(SoyError::DuplicateRecordField {
                    name: property.name.clone(),
                    span: property.name_span,
                });
                continue;
            }
            fields.push(RecordField::new(property.name.clone(), ty));
        }
        self.registry.get_or_create_record_type(fields)
    }
}
