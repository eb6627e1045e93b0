//! The pass capability model.
//!
//! Every pass has a stable [`PassId`] and declares which passes must already
//! have run ([`CompilerPass::run_after`]) and which must not have run yet
//! ([`CompilerPass::run_before`]). A pass then implements one of two
//! capabilities:
//!
//! - [`FilePass`]: works on one file at a time and only touches that file
//! - [`FileSetPass`]: works on the whole file set and may stop its phase
//!
//! A file pass placed in a file-set phase is wrapped in a [`FilePassShim`],
//! which keeps the wrapped pass's identity for ordering and continuation
//! lookups.

use std::fmt;
use std::sync::Arc;

use soy_core::IdGenerator;

use crate::catalog;
use crate::tree::{SoyFileNode, TemplateRegistry};

/// Stable identity of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(&'static str);

impl PassId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Outcome of a file-set pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassResult {
    Continue,
    /// Skip the rest of the current phase. Diagnostics already reported stand.
    Stop,
}

/// The three pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    SingleFile,
    /// File-set passes whose template registry may lack dependency signatures.
    PartialRegistry,
    /// File-set passes with a complete template registry.
    CrossTemplate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::SingleFile => f.write_str("single-file"),
            Phase::PartialRegistry => f.write_str("partial-registry"),
            Phase::CrossTemplate => f.write_str("cross-template"),
        }
    }
}

/// Identity and ordering constraints shared by every pass.
///
/// The constraints default to what the pass catalog declares for the pass's
/// identity.
pub trait CompilerPass: Send + Sync {
    fn id(&self) -> PassId;

    /// Passes that must have executed before this one.
    fn run_after(&self) -> &'static [PassId] {
        match catalog::descriptor(self.id()) {
            Some(descriptor) => descriptor.run_after,
            None => &[],
        }
    }

    /// Passes that must not have executed before this one.
    fn run_before(&self) -> &'static [PassId] {
        match catalog::descriptor(self.id()) {
            Some(descriptor) => descriptor.run_before,
            None => &[],
        }
    }
}

/// A pass over a single file.
pub trait FilePass: CompilerPass {
    fn run(&self, file: &mut SoyFileNode, id_generator: &IdGenerator);
}

/// A pass over the whole file set.
pub trait FileSetPass: CompilerPass {
    fn run(
        &self,
        files: &mut [SoyFileNode],
        id_generator: &IdGenerator,
        registry: &TemplateRegistry,
    ) -> PassResult;
}

/// Runs a file pass over every file of a set.
pub struct FilePassShim {
    delegate: Arc<dyn FilePass>,
}

impl FilePassShim {
    pub fn new(delegate: Arc<dyn FilePass>) -> Self {
        Self { delegate }
    }

    pub fn delegate(&self) -> &Arc<dyn FilePass> {
        &self.delegate
    }
}

impl CompilerPass for FilePassShim {
    fn id(&self) -> PassId {
        self.delegate.id()
    }

    fn run_after(&self) -> &'static [PassId] {
        self.delegate.run_after()
    }

    fn run_before(&self) -> &'static [PassId] {
        self.delegate.run_before()
    }
}

impl FileSetPass for FilePassShim {
    fn run(
        &self,
        files: &mut [SoyFileNode],
        id_generator: &IdGenerator,
        _registry: &TemplateRegistry,
    ) -> PassResult {
        for file in files {
            self.delegate.run(file, id_generator);
        }
        PassResult::Continue
    }
}

/// A pass of either capability.
#[derive(Clone)]
pub enum Pass {
    File(Arc<dyn FilePass>),
    FileSet(Arc<dyn FileSetPass>),
}

impl Pass {
    pub fn id(&self) -> PassId {
        match self {
            Pass::File(pass) => pass.id(),
            Pass::FileSet(pass) => pass.id(),
        }
    }

    pub fn run_after(&self) -> &'static [PassId] {
        match self {
            Pass::File(pass) => pass.run_after(),
            Pass::FileSet(pass) => pass.run_after(),
        }
    }

    pub fn run_before(&self) -> &'static [PassId] {
        match self {
            Pass::File(pass) => pass.run_before(),
            Pass::FileSet(pass) => pass.run_before(),
        }
    }

    /// This pass as a file-set pass, wrapping file passes in a shim.
    pub fn into_file_set(self) -> Arc<dyn FileSetPass> {
        match self {
            Pass::File(pass) => Arc::new(FilePassShim::new(pass)),
            Pass::FileSet(pass) => pass,
        }
    }
}

impl fmt::Debug for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::File(pass) => write!(f, "File({})", pass.id()),
            Pass::FileSet(pass) => write!(f, "FileSet({})", pass.id()),
        }
    }
}
