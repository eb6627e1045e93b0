//! Soy template compiler front end.
//!
//! - [`types`]: the structural type system and its registry
//! - [`passes`]: the phased pass pipeline
//! - [`CompilationUnit`]: runs the pipeline over a set of files
//!
//! The most used items are re-exported at the crate root.

mod unit;

pub use unit::{CompilationUnit, CompileError, CompiledFileSet};

pub use soy_core::{
    Checkpoint, Diagnostic, DiagnosticKind, ErrorReporter, IdGenerator, NodeId, SoyError, Span,
};

pub mod types {
    pub use soy_types::*;
}

pub mod passes {
    pub use soy_passes::*;
}

pub use soy_passes::{
    PassContinuationRule, PassId, PassManager, PassManagerBuilder, PipelineError, SoyFileNode,
    SoyFileSetNode, TemplateNode, TemplateRegistry,
};
pub use soy_types::{SoyType, SoyTypeRef, SoyTypeRegistry};
