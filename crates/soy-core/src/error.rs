//! User-facing diagnostics.
//!
//! These are problems in the templates being compiled, not in the compiler.
//! They are accumulated on an [`ErrorReporter`](crate::ErrorReporter) and never
//! unwind the pass pipeline; misassembled pipelines are reported through a
//! separate fatal error type in `soy-passes`.

use thiserror::Error;

use crate::Span;

/// Formats a generic arity the way diagnostics print it: `1 type parameter`,
/// `2 type parameters`.
pub fn type_params(arity: &usize) -> String {
    if *arity > 1 {
        format!("{arity} type parameters")
    } else {
        format!("{arity} type parameter")
    }
}

/// Errors reported while resolving template source against the type system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoyError {
    /// A type name matched neither a builtin nor any provider.
    #[error("at {span}: Unknown type '{name}'.{suggestion}")]
    UnknownType {
        name: String,
        /// Either empty or a leading-space "Did you mean ..." hint.
        suggestion: String,
        span: Span,
    },

    /// A generic constructor was written without `<...>`.
    #[error("at {span}: '{name}' is a generic type, expected {}.", type_params(.arity))]
    MissingGenericTypeParameters {
        name: String,
        arity: usize,
        span: Span,
    },

    /// Too few arguments; reported at the closing `>`.
    #[error("at {span}: Expected a type parameter: '{name}' has {}", type_params(.arity))]
    ExpectedTypeParameter {
        name: String,
        arity: usize,
        span: Span,
    },

    /// Too many arguments; reported at the first excess argument.
    #[error("at {span}: Unexpected type parameter: '{name}' only has {}", type_params(.arity))]
    UnexpectedTypeParameter {
        name: String,
        arity: usize,
        span: Span,
    },

    /// `name<...>` where `name` has no generic constructor.
    #[error("at {span}: '{name}' is not a generic type, expected 'list' or 'map'.")]
    NotAGenericType { name: String, span: Span },

    /// Map key type outside the permitted kinds.
    #[error(
        "at {span}: '{key_type}' is not allowed as a map key type. Allowed map key types: bool, int, string, proto_enum."
    )]
    BadMapKeyType { key_type: String, span: Span },

    /// The same field name appeared twice in one record literal type.
    #[error("at {span}: Duplicate field '{name}' in record declaration.")]
    DuplicateRecordField { name: String, span: Span },

    /// A type expression could not be parsed.
    #[error("at {span}: {message}")]
    Syntax { message: String, span: Span },
}

impl SoyError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            SoyError::UnknownType { span, .. } => *span,
            SoyError::MissingGenericTypeParameters { span, .. } => *span,
            SoyError::ExpectedTypeParameter { span, .. } => *span,
            SoyError::UnexpectedTypeParameter { span, .. } => *span,
            SoyError::NotAGenericType { span, .. } => *span,
            SoyError::BadMapKeyType { span, .. } => *span,
            SoyError::DuplicateRecordField { span, .. } => *span,
            SoyError::Syntax { span, .. } => *span,
        }
    }
}
