//! Creating the concrete passes the pipeline script asks for.
//!
//! The script only names passes by [`PassId`]. A [`PassFactory`] turns each
//! name into a runnable [`Pass`], with the builder's configuration available
//! through [`PassContext`].

use std::sync::Arc;

use soy_core::{ErrorReporter, IdGenerator};
use soy_types::SoyTypeRegistry;

use crate::catalog::{self, PassScope};
use crate::config::{
    ConformanceConfig, CssRegistry, GeneralOptions, LoggingConfig, PipelineFlags, PluginResolver,
    PrintDirective,
};
use crate::pass::{CompilerPass, FilePass, FileSetPass, Pass, PassId, PassResult, Phase};
use crate::resolve_param_types::ResolveTemplateParamTypesPass;
use crate::tree::{SoyFileNode, TemplateRegistry};

/// Configuration handed to a [`PassFactory`].
#[derive(Clone, Copy)]
pub struct PassContext<'a> {
    pub type_registry: &'a Arc<SoyTypeRegistry>,
    pub error_reporter: &'a Arc<ErrorReporter>,
    pub plugin_resolver: &'a PluginResolver,
    pub print_directives: &'a [PrintDirective],
    pub general_options: &'a GeneralOptions,
    pub css_registry: Option<&'a CssRegistry>,
    pub conformance_config: &'a ConformanceConfig,
    pub logging_config: &'a LoggingConfig,
    pub flags: &'a PipelineFlags,
}

/// Supplies the pass behind each scripted [`PassId`].
///
/// The returned pass must report `id` as its identity. It may be a file pass
/// for any phase; file-set passes are only accepted outside
/// [`Phase::SingleFile`].
pub trait PassFactory: Send + Sync {
    fn create(&self, id: PassId, phase: Phase, cx: &PassContext<'_>) -> Pass;
}

/// A pass that only carries its identity and declared constraints.
#[derive(Debug, Clone, Copy)]
pub struct DeclaredPass {
    id: PassId,
}

impl DeclaredPass {
    pub fn new(id: PassId) -> Self {
        Self { id }
    }
}

impl CompilerPass for DeclaredPass {
    fn id(&self) -> PassId {
        self.id
    }
}

impl FilePass for DeclaredPass {
    fn run(&self, _file: &mut SoyFileNode, _id_generator: &IdGenerator) {}
}

impl FileSetPass for DeclaredPass {
    fn run(
        &self,
        _files: &mut [SoyFileNode],
        _id_generator: &IdGenerator,
        _registry: &TemplateRegistry,
    ) -> PassResult {
        PassResult::Continue
    }
}

/// Builds a [`DeclaredPass`] of the catalogued capability for every id.
///
/// Uncatalogued ids become file passes in the single-file phase and file-set
/// passes elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredPassFactory;

impl PassFactory for DeclaredPassFactory {
    fn create(&self, id: PassId, phase: Phase, _cx: &PassContext<'_>) -> Pass {
        let scope = match catalog::descriptor(id) {
            Some(descriptor) => descriptor.scope,
            None if phase == Phase::SingleFile => PassScope::File,
            None => PassScope::FileSet,
        };
        let pass = DeclaredPass::new(id);
        match scope {
            PassScope::File => Pass::File(Arc::new(pass)),
            PassScope::FileSet => Pass::FileSet(Arc::new(pass)),
        }
    }
}

/// The default factory: template parameter types are resolved for real,
/// everything else is declared only.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardPassFactory;

impl PassFactory for StandardPassFactory {
    fn create(&self, id: PassId, phase: Phase, cx: &PassContext<'_>) -> Pass {
        if id == PassId::RESOLVE_TEMPLATE_PARAM_TYPES {
            return Pass::FileSet(Arc::new(ResolveTemplateParamTypesPass::new(
                Arc::clone(cx.type_registry),
                Arc::clone(cx.error_reporter),
                cx.flags.disable_all_type_checking,
            )));
        }
        DeclaredPassFactory.create(id, phase, cx)
    }
}
