//! Shared building blocks for the Soy compiler front end.
//!
//! - [`Span`]: source positions attached to diagnostics
//! - [`NodeId`] / [`IdGenerator`]: identifiers for template tree nodes
//! - [`SoyError`]: user-facing diagnostics
//! - [`ErrorReporter`]: the shared, thread-safe diagnostic sink

mod diagnostics;
mod error;
mod ids;
mod span;

pub use diagnostics::{Checkpoint, Diagnostic, DiagnosticKind, ErrorReporter};
pub use error::{SoyError, type_params};
pub use ids::{IdGenerator, NodeId};
pub use span::Span;
