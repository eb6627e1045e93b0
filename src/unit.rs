//! Compilation unit API.
//!
//! A [`CompilationUnit`] owns the pieces one compilation shares: the type
//! registry, the error reporter and the pass manager. Callers add parsed
//! files and dependency metadata, then [`compile`](CompilationUnit::compile)
//! runs the three phases.
//!
//! # Example
//!
//! ```
//! use soy::{CompilationUnit, IdGenerator, SoyFileNode, TemplateNode};
//!
//! let mut unit = CompilationUnit::new().unwrap();
//! let ids = IdGenerator::new();
//! unit.add_file(
//!     SoyFileNode::new(ids.gen_id(), "main.soy", "ns")
//!         .with_template(TemplateNode::new(ids.gen_id(), "ns.main")),
//! );
//! let compiled = unit.compile().unwrap();
//! assert_eq!(compiled.template_registry.len(), 1);
//! ```

use std::sync::Arc;

use soy_core::{ErrorReporter, IdGenerator, SoyError};
use soy_passes::{
    PassManager, PassManagerBuilder, PassResult, Phase, PipelineError, SoyFileNode,
    SoyFileSetNode, TemplateMetadata, TemplateRegistry,
};
use soy_types::SoyTypeRegistry;

/// Files and dependency metadata compiled together.
pub struct CompilationUnit {
    type_registry: Arc<SoyTypeRegistry>,
    error_reporter: Arc<ErrorReporter>,
    manager: PassManager,
    files: Vec<SoyFileNode>,
    dependencies: Vec<TemplateMetadata>,
    next_id: u32,
}

/// Result of a successful compile.
#[derive(Debug)]
pub struct CompiledFileSet {
    pub file_set: SoyFileSetNode,
    pub template_registry: TemplateRegistry,
    /// The phase a pass stopped early, if any.
    pub stopped_in: Option<Phase>,
}

impl CompilationUnit {
    /// A unit with the default pipeline and a builtin-only type registry.
    pub fn new() -> Result<Self, PipelineError> {
        let type_registry = Arc::new(SoyTypeRegistry::new());
        let error_reporter = Arc::new(ErrorReporter::new());
        let builder = PassManagerBuilder::new()
            .type_registry(Arc::clone(&type_registry))
            .error_reporter(Arc::clone(&error_reporter))
            .print_directives(Vec::new());
        Self::with_builder(builder, type_registry, error_reporter)
    }

    /// A unit running the pipeline `builder` describes.
    ///
    /// `builder` gets `type_registry` and `error_reporter` set on it, so the
    /// passes and the unit share them.
    pub fn with_builder(
        builder: PassManagerBuilder,
        type_registry: Arc<SoyTypeRegistry>,
        error_reporter: Arc<ErrorReporter>,
    ) -> Result<Self, PipelineError> {
        let manager = builder
            .type_registry(Arc::clone(&type_registry))
            .error_reporter(Arc::clone(&error_reporter))
            .build()?;
        Ok(Self {
            type_registry,
            error_reporter,
            manager,
            files: Vec::new(),
            dependencies: Vec::new(),
            next_id: 0,
        })
    }

    /// Add a parsed file. Node ids for synthesized nodes start after the
    /// largest id seen in any added file. An id of `u32::MAX` pins the
    /// generator there instead of wrapping.
    pub fn add_file(&mut self, file: SoyFileNode) {
        let largest = file
            .templates
            .iter()
            .map(|t| t.id.index())
            .chain(std::iter::once(file.id.index()))
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(largest.saturating_add(1));
        self.files.push(file);
    }

    /// Metadata for a template compiled elsewhere.
    pub fn add_dependency(&mut self, metadata: TemplateMetadata) {
        self.dependencies.push(metadata);
    }

    pub fn type_registry(&self) -> &Arc<SoyTypeRegistry> {
        &self.type_registry
    }

    pub fn error_reporter(&self) -> &Arc<ErrorReporter> {
        &self.error_reporter
    }

    pub fn pass_manager(&self) -> &PassManager {
        &self.manager
    }

    pub fn source_count(&self) -> usize {
        self.files.len()
    }

    /// Run every phase over the added files.
    ///
    /// Errors reported by any pass fail the compile, but only after every
    /// phase that was reached has run.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&mut self) -> Result<CompiledFileSet, CompileError> {
        if self.files.is_empty() {
            return Err(CompileError::NoSources);
        }

        let id_generator = IdGenerator::starting_at(self.next_id);
        let mut files = std::mem::take(&mut self.files);
        self.manager
            .run_single_file_passes_parallel(&mut files, &id_generator);

        let mut file_set = SoyFileSetNode::new(id_generator);
        for file in files {
            file_set.add_file(file);
        }

        let mut partial = TemplateRegistry::partial();
        for dependency in &self.dependencies {
            partial.register(dependency.clone());
        }
        let mut stopped_in = None;
        if self
            .manager
            .run_partial_template_registry_passes(&mut file_set, &partial)
            == PassResult::Stop
        {
            stopped_in = Some(Phase::PartialRegistry);
        }

        let mut complete = TemplateRegistry::complete();
        for dependency in &self.dependencies {
            complete.register(dependency.clone());
        }
        let complete = complete.with_files(file_set.files());
        if stopped_in.is_none()
            && self
                .manager
                .run_whole_fileset_passes(&mut file_set, &complete)
                == PassResult::Stop
        {
            stopped_in = Some(Phase::CrossTemplate);
        }

        if self.error_reporter.has_errors() {
            return Err(CompileError::Diagnostics(self.error_reporter.errors()));
        }
        Ok(CompiledFileSet {
            file_set,
            template_registry: complete,
            stopped_in,
        })
    }
}

/// Errors from [`CompilationUnit::compile`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompileError {
    #[error("No sources added to unit")]
    NoSources,

    #[error("Compilation failed with {} error(s)", .0.len())]
    Diagnostics(Vec<SoyError>),
}

impl CompileError {
    /// The reported diagnostics, empty for other variants.
    pub fn diagnostics(&self) -> &[SoyError] {
        match self {
            CompileError::Diagnostics(errors) => errors,
            CompileError::NoSources => &[],
        }
    }
}
