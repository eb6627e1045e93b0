//! The template tree the passes run over.
//!
//! Only what the pipeline itself touches is modelled here: files, their
//! templates, and the declared parameter types that type resolution fills in.
//! Template bodies belong to the individual passes.

use rustc_hash::FxHashMap;
use soy_core::{IdGenerator, NodeId};
use soy_types::{SoyTypeRef, TypeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// A `{@param}` declaration.
#[derive(Debug, Clone)]
pub struct TemplateParam {
    pub name: String,
    /// The annotation as written; `None` when the parameter is inferred.
    pub declared_type: Option<TypeNode>,
    /// Filled in by type resolution.
    pub ty: Option<SoyTypeRef>,
}

impl TemplateParam {
    pub fn new(name: impl Into<String>, declared_type: Option<TypeNode>) -> Self {
        Self {
            name: name.into(),
            declared_type,
            ty: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateNode {
    pub id: NodeId,
    /// Fully-qualified name, `namespace.template`.
    pub name: String,
    pub visibility: Visibility,
    pub params: Vec<TemplateParam>,
}

impl TemplateNode {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visibility: Visibility::Public,
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: TemplateParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// One source file.
#[derive(Debug, Clone)]
pub struct SoyFileNode {
    pub id: NodeId,
    pub path: String,
    pub namespace: String,
    pub templates: Vec<TemplateNode>,
}

impl SoyFileNode {
    pub fn new(id: NodeId, path: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            namespace: namespace.into(),
            templates: Vec::new(),
        }
    }

    pub fn with_template(mut self, template: TemplateNode) -> Self {
        self.templates.push(template);
        self
    }
}

/// Every file of one compilation, plus the id source shared by all of them.
#[derive(Debug, Default)]
pub struct SoyFileSetNode {
    id_generator: IdGenerator,
    files: Vec<SoyFileNode>,
}

impl SoyFileSetNode {
    pub fn new(id_generator: IdGenerator) -> Self {
        Self {
            id_generator,
            files: Vec::new(),
        }
    }

    pub fn add_file(&mut self, file: SoyFileNode) {
        self.files.push(file);
    }

    pub fn id_generator(&self) -> &IdGenerator {
        &self.id_generator
    }

    pub fn files(&self) -> &[SoyFileNode] {
        &self.files
    }

    /// Mutable files alongside the shared generator, for running passes.
    pub fn split_mut(&mut self) -> (&mut [SoyFileNode], &IdGenerator) {
        (&mut self.files, &self.id_generator)
    }
}

/// What a caller needs to know about a template without its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMetadata {
    pub name: String,
    pub file_path: String,
    pub visibility: Visibility,
    pub param_names: Vec<String>,
}

impl TemplateMetadata {
    pub fn from_node(template: &TemplateNode, file_path: &str) -> Self {
        Self {
            name: template.name.clone(),
            file_path: file_path.to_string(),
            visibility: template.visibility,
            param_names: template.params.iter().map(|p| p.name.clone()).collect(),
        }
    }
}

/// Templates by fully-qualified name.
///
/// A partial registry is built before the file set has been analysed and may
/// lack signatures for forward or external dependencies. A complete registry
/// covers every template the compilation can call.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: FxHashMap<String, TemplateMetadata>,
    complete: bool,
}

impl TemplateRegistry {
    pub fn partial() -> Self {
        Self::default()
    }

    pub fn complete() -> Self {
        Self {
            templates: FxHashMap::default(),
            complete: true,
        }
    }

    /// Register every template in `files`.
    pub fn with_files(mut self, files: &[SoyFileNode]) -> Self {
        for file in files {
            for template in &file.templates {
                self.register(TemplateMetadata::from_node(template, &file.path));
            }
        }
        self
    }

    /// Register a template, replacing any earlier entry with the same name.
    pub fn register(&mut self, metadata: TemplateMetadata) {
        self.templates.insert(metadata.name.clone(), metadata);
    }

    pub fn get(&self, name: &str) -> Option<&TemplateMetadata> {
        self.templates.get(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
