//! The Soy compiler pass pipeline.
//!
//! A [`PassManagerBuilder`] runs a fixed, hand-ordered script that places
//! passes into three phases:
//!
//! 1. single-file passes, run per file (optionally in parallel)
//! 2. partial-registry passes, run over the file set with dependency metadata
//! 3. cross-template passes, run over the file set with a complete registry
//!
//! The resulting [`PassManager`] verifies every pass's declared ordering
//! constraints before it can run anything.
//!
//! ```
//! use std::sync::Arc;
//! use soy_core::ErrorReporter;
//! use soy_passes::{PassId, PassManagerBuilder};
//! use soy_types::SoyTypeRegistry;
//!
//! let manager = PassManagerBuilder::new()
//!     .type_registry(Arc::new(SoyTypeRegistry::new()))
//!     .error_reporter(Arc::new(ErrorReporter::new()))
//!     .print_directives(Vec::new())
//!     .build()
//!     .unwrap();
//! assert!(manager.partial_registry_pass_ids().contains(&PassId::RESOLVE_NAMES));
//! ```

mod builder;
mod catalog;
mod config;
mod error;
mod factory;
mod manager;
mod pass;
mod resolve_param_types;
mod tree;

pub use builder::{ENABLE_NON_NULL_ASSERTION_OPERATOR, PassManagerBuilder};
pub use catalog::{PassDescriptor, PassScope, catalog, descriptor};
pub use config::{
    ConformanceConfig, CssRegistry, GeneralOptions, LoggingConfig, PassContinuationRule,
    PipelineFlags, PluginResolutionMode, PluginResolver, PrintDirective, TriState,
};
pub use error::PipelineError;
pub use factory::{DeclaredPass, DeclaredPassFactory, PassContext, PassFactory, StandardPassFactory};
pub use manager::{PassManager, Pipeline};
pub use pass::{CompilerPass, FilePass, FilePassShim, FileSetPass, Pass, PassId, PassResult, Phase};
pub use resolve_param_types::ResolveTemplateParamTypesPass;
pub use tree::{
    SoyFileNode, SoyFileSetNode, TemplateMetadata, TemplateNode, TemplateParam, TemplateRegistry,
    Visibility,
};
