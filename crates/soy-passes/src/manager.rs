//! PassManager - validates pass ordering once, then runs the phases.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use soy_core::IdGenerator;

use crate::error::PipelineError;
use crate::pass::{CompilerPass, FilePass, FileSetPass, Pass, PassId, PassResult};
use crate::tree::{SoyFileNode, SoyFileSetNode, TemplateRegistry};

/// The three ordered phases of a pipeline.
///
/// Usually assembled by [`PassManagerBuilder`](crate::PassManagerBuilder);
/// building one by hand is mostly useful for tests.
#[derive(Default, Clone)]
pub struct Pipeline {
    single_file: Vec<Arc<dyn FilePass>>,
    partial_registry: Vec<Arc<dyn FileSetPass>>,
    cross_template: Vec<Arc<dyn FileSetPass>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_single_file(&mut self, pass: Arc<dyn FilePass>) {
        self.single_file.push(pass);
    }

    /// File passes are wrapped so they run over every file.
    pub fn push_partial_registry(&mut self, pass: Pass) {
        self.partial_registry.push(pass.into_file_set());
    }

    pub fn push_cross_template(&mut self, pass: Pass) {
        self.cross_template.push(pass.into_file_set());
    }

    pub fn single_file_len(&self) -> usize {
        self.single_file.len()
    }

    pub fn partial_registry_len(&self) -> usize {
        self.partial_registry.len()
    }

    pub fn cross_template_len(&self) -> usize {
        self.cross_template.len()
    }
}

/// Runs the passes of a validated [`Pipeline`].
///
/// Immutable once built, so one manager can serve many compilations.
pub struct PassManager {
    pipeline: Pipeline,
}

impl PassManager {
    /// Validate `pipeline`'s ordering constraints.
    ///
    /// Walking the three phases in order, every pass's `run_after` set must
    /// already have run and none of its `run_before` set may have.
    pub fn new(pipeline: Pipeline) -> Result<Self, PipelineError> {
        check_ordering(&pipeline)?;
        Ok(Self { pipeline })
    }

    pub fn builder() -> crate::PassManagerBuilder {
        crate::PassManagerBuilder::new()
    }

    /// Run every single-file pass on `file`. Diagnostics from one pass never
    /// stop the next.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run_single_file_passes(&self, file: &mut SoyFileNode, id_generator: &IdGenerator) {
        for pass in &self.pipeline.single_file {
            tracing::debug!(pass = %pass.id(), file = %file.path, "running single-file pass");
            pass.run(file, id_generator);
        }
    }

    /// [`run_single_file_passes`](Self::run_single_file_passes) over many
    /// files on the rayon pool. Each file is handled by exactly one worker.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run_single_file_passes_parallel(
        &self,
        files: &mut [SoyFileNode],
        id_generator: &IdGenerator,
    ) {
        files
            .par_iter_mut()
            .for_each(|file| self.run_single_file_passes(file, id_generator));
    }

    /// Run the passes that only need dependency metadata. `registry` may be
    /// missing signatures for forward or external dependencies.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run_partial_template_registry_passes(
        &self,
        file_set: &mut SoyFileSetNode,
        registry: &TemplateRegistry,
    ) -> PassResult {
        run_file_set_phase(&self.pipeline.partial_registry, file_set, registry)
    }

    /// Run the cross-template passes, including autoescaping and the final
    /// simplifications. `registry` must be complete.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run_whole_fileset_passes(
        &self,
        file_set: &mut SoyFileSetNode,
        registry: &TemplateRegistry,
    ) -> PassResult {
        run_file_set_phase(&self.pipeline.cross_template, file_set, registry)
    }

    pub fn single_file_pass_ids(&self) -> Vec<PassId> {
        self.pipeline.single_file.iter().map(|p| p.id()).collect()
    }

    pub fn partial_registry_pass_ids(&self) -> Vec<PassId> {
        self.pipeline.partial_registry.iter().map(|p| p.id()).collect()
    }

    pub fn cross_template_pass_ids(&self) -> Vec<PassId> {
        self.pipeline.cross_template.iter().map(|p| p.id()).collect()
    }
}

impl fmt::Debug for PassManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassManager")
            .field("single_file", &self.single_file_pass_ids())
            .field("partial_registry", &self.partial_registry_pass_ids())
            .field("cross_template", &self.cross_template_pass_ids())
            .finish()
    }
}

fn run_file_set_phase(
    passes: &[Arc<dyn FileSetPass>],
    file_set: &mut SoyFileSetNode,
    registry: &TemplateRegistry,
) -> PassResult {
    let (files, id_generator) = file_set.split_mut();
    for pass in passes {
        tracing::debug!(pass = %pass.id(), "running file-set pass");
        if pass.run(files, id_generator, registry) == PassResult::Stop {
            tracing::debug!(pass = %pass.id(), "pass stopped its phase");
            return PassResult::Stop;
        }
    }
    PassResult::Continue
}

/// Insertion-ordered set of executed passes.
#[derive(Default)]
struct Executed {
    order: Vec<PassId>,
    seen: FxHashSet<PassId>,
}

impl Executed {
    fn contains(&self, id: &PassId) -> bool {
        self.seen.contains(id)
    }

    fn insert(&mut self, id: PassId) {
        if self.seen.insert(id) {
            self.order.push(id);
        }
    }

    fn prepare_to_run(
        &mut self,
        pass: PassId,
        run_after: &[PassId],
        run_before: &[PassId],
    ) -> Result<(), PipelineError> {
        let missing: Vec<PassId> = run_after
            .iter()
            .filter(|id| !self.contains(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::DependencyNotRun {
                pass,
                missing,
                executed: self.order.clone(),
            });
        }

        let conflicts: Vec<PassId> = run_before
            .iter()
            .filter(|id| self.contains(id))
            .copied()
            .collect();
        if !conflicts.is_empty() {
            return Err(PipelineError::RunBeforeViolated {
                pass,
                conflicts,
                executed: self.order.clone(),
            });
        }

        self.insert(pass);
        Ok(())
    }
}

fn check_ordering(pipeline: &Pipeline) -> Result<(), PipelineError> {
    let mut executed = Executed::default();
    for pass in &pipeline.single_file {
        executed.prepare_to_run(pass.id(), pass.run_after(), pass.run_before())?;
    }
    for pass in pipeline.partial_registry.iter().chain(&pipeline.cross_template) {
        executed.prepare_to_run(pass.id(), pass.run_after(), pass.run_before())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::DeclaredPass;

    struct Constrained {
        id: PassId,
        after: &'static [PassId],
        before: &'static [PassId],
    }

    impl CompilerPass for Constrained {
        fn id(&self) -> PassId {
            self.id
        }

        fn run_after(&self) -> &'static [PassId] {
            self.after
        }

        fn run_before(&self) -> &'static [PassId] {
            self.before
        }
    }

    impl FileSetPass for Constrained {
        fn run(
            &self,
            _files: &mut [SoyFileNode],
            _id_generator: &IdGenerator,
            _registry: &TemplateRegistry,
        ) -> PassResult {
            PassResult::Continue
        }
    }

    const A: PassId = PassId::new("A");
    const B: PassId = PassId::new("B");

    fn pass(id: PassId, after: &'static [PassId], before: &'static [PassId]) -> Pass {
        Pass::FileSet(Arc::new(Constrained { id, after, before }))
    }

    #[test]
    fn run_after_is_enforced() {
        let mut pipeline = Pipeline::new();
        pipeline.push_partial_registry(pass(A, &[B], &[]));
        pipeline.push_partial_registry(pass(B, &[], &[]));
        let err = PassManager::new(pipeline).err().unwrap();
        assert_eq!(
            err,
            PipelineError::DependencyNotRun {
                pass: A,
                missing: vec![B],
                executed: vec![],
            }
        );

        let mut pipeline = Pipeline::new();
        pipeline.push_partial_registry(pass(B, &[], &[]));
        pipeline.push_cross_template(pass(A, &[B], &[]));
        assert!(PassManager::new(pipeline).is_ok());
    }

    #[test]
    fn run_before_is_enforced() {
        let mut pipeline = Pipeline::new();
        pipeline.push_single_file(Arc::new(DeclaredPass::new(B)));
        pipeline.push_partial_registry(pass(A, &[], &[B]));
        let err = PassManager::new(pipeline).err().unwrap();
        assert_eq!(
            err,
            PipelineError::RunBeforeViolated {
                pass: A,
                conflicts: vec![B],
                executed: vec![B],
            }
        );
    }

    #[test]
    fn repeated_pass_is_recorded_once() {
        let mut executed = Executed::default();
        executed.insert(A);
        executed.insert(A);
        executed.insert(B);
        assert_eq!(executed.order, [A, B]);
    }
}
