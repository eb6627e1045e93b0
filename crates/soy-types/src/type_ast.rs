//! Parsed type expressions, before resolution against a registry.

use soy_core::Span;

/// A type annotation as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    /// `int`, `example.Person`, `?`
    Named { name: String, span: Span },
    /// `list<int>`, `map<string, ?>`. The span runs through the closing `>`.
    Generic {
        name: String,
        arguments: Vec<TypeNode>,
        span: Span,
        /// The closing `>`, which may sit on a later line than the name.
        close: Span,
    },
    /// `int|string`
    Union { candidates: Vec<TypeNode>, span: Span },
    /// `[a: int, b: string]`. Repeated names are kept; the converter reports them.
    Record {
        properties: Vec<RecordProperty>,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordProperty {
    pub name: String,
    pub name_span: Span,
    pub ty: TypeNode,
}

impl TypeNode {
    pub fn named(name: impl Into<String>, span: Span) -> Self {
        TypeNode::Named {
            name: name.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeNode::Named { span, .. }
            | TypeNode::Generic { span, .. }
            | TypeNode::Union { span, .. }
            | TypeNode::Record { span, .. } => *span,
        }
    }
}
