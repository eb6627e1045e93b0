//! Resolves declared template parameter types against the type registry.

use std::sync::Arc;

use soy_core::{ErrorReporter, IdGenerator};
use soy_types::{SoyTypeRegistry, primitives};

use crate::pass::{CompilerPass, FileSetPass, PassId, PassResult};
use crate::tree::{SoyFileNode, TemplateRegistry};

/// Fills in [`TemplateParam::ty`](crate::TemplateParam::ty) for every
/// parameter of every template.
///
/// With type checking disabled every parameter is `?`, and nothing is reported.
pub struct ResolveTemplateParamTypesPass {
    registry: Arc<SoyTypeRegistry>,
    reporter: Arc<ErrorReporter>,
    disable_all_type_checking: bool,
}

impl ResolveTemplateParamTypesPass {
    pub fn new(
        registry: Arc<SoyTypeRegistry>,
        reporter: Arc<ErrorReporter>,
        disable_all_type_checking: bool,
    ) -> Self {
        Self {
            registry,
            reporter,
            disable_all_type_checking,
        }
    }
}

impl CompilerPass for ResolveTemplateParamTypesPass {
    fn id(&self) -> PassId {
        PassId::RESOLVE_TEMPLATE_PARAM_TYPES
    }
}

impl FileSetPass for ResolveTemplateParamTypesPass {
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn run(
        &self,
        files: &mut [SoyFileNode],
        _id_generator: &IdGenerator,
        _registry: &TemplateRegistry,
    ) -> PassResult {
        for file in files {
            for template in &mut file.templates {
                for param in &mut template.params {
                    let ty = if self.disable_all_type_checking {
                        primitives::UNKNOWN.clone()
                    } else {
                        self.registry
                            .get_or_create_type(param.declared_type.as_ref(), &self.reporter)
                    };
                    param.ty = Some(ty);
                }
            }
        }
        PassResult::Continue
    }
}
