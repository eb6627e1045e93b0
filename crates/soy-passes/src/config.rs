//! Builder configuration.
//!
//! These are the options the pipeline script branches on, plus the opaque
//! collaborator objects handed through to the passes that need them.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

/// Three-valued option, unset by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    #[default]
    Unset,
    Enabled,
    Disabled,
}

impl TriState {
    pub fn from_bool(value: bool) -> Self {
        if value {
            TriState::Enabled
        } else {
            TriState::Disabled
        }
    }

    pub fn is_set(self) -> bool {
        self != TriState::Unset
    }
}

/// Compile options shared by every backend.
#[derive(Debug, Clone, Default)]
pub struct GeneralOptions {
    pub experimental_features: FxHashSet<String>,
    pub compile_time_globals: FxHashMap<String, String>,
    pub allow_external_calls: TriState,
}

impl GeneralOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_experimental_feature(mut self, feature: impl Into<String>) -> Self {
        self.experimental_features.insert(feature.into());
        self
    }

    pub fn with_compile_time_global(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.compile_time_globals.insert(name.into(), value.into());
        self
    }

    pub fn with_allow_external_calls(mut self, allow: bool) -> Self {
        self.allow_external_calls = TriState::from_bool(allow);
        self
    }

    pub fn has_experimental_feature(&self, feature: &str) -> bool {
        self.experimental_features.contains(feature)
    }
}

/// What to do when a template calls a function no plugin provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PluginResolutionMode {
    /// Report an error.
    #[default]
    Require,
    /// Report a warning.
    Warn,
    /// Accept silently. Used by tools that only parse.
    Allow,
}

/// Resolves plugin function names referenced from templates.
#[derive(Debug, Clone, Default)]
pub struct PluginResolver {
    mode: PluginResolutionMode,
    functions: FxHashSet<String>,
}

impl PluginResolver {
    pub fn new(mode: PluginResolutionMode) -> Self {
        Self {
            mode,
            functions: FxHashSet::default(),
        }
    }

    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.functions.insert(name.into());
        self
    }

    pub fn mode(&self) -> PluginResolutionMode {
        self.mode
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }
}

/// A print directive such as `|escapeHtml`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrintDirective {
    pub name: String,
}

impl PrintDirective {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Known CSS class names, for package-relative name resolution.
#[derive(Debug, Clone, Default)]
pub struct CssRegistry {
    names: FxHashSet<String>,
}

impl CssRegistry {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Validated conformance rules. Empty by default.
#[derive(Debug, Clone, Default)]
pub struct ConformanceConfig {
    rules: Vec<String>,
}

impl ConformanceConfig {
    pub fn new(rules: impl IntoIterator<Item = String>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Validated logging config: names of loggable elements. Empty by default.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    elements: Vec<String>,
}

impl LoggingConfig {
    pub fn new(elements: impl IntoIterator<Item = String>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
        }
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Stops the builder at a pass. Intended for tests and partial compilations,
/// e.g. conformance-only runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassContinuationRule {
    StopBeforePass,
    StopAfterPass,
}

impl fmt::Display for PassContinuationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassContinuationRule::StopBeforePass => f.write_str("stop before"),
            PassContinuationRule::StopAfterPass => f.write_str("stop after"),
        }
    }
}

/// The boolean switches of the pipeline script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineFlags {
    pub allow_unknown_globals: bool,
    pub allow_v1_expression: bool,
    pub allow_unknown_js_globals: bool,
    /// Skips every pass that enforces or relies on type information.
    pub disable_all_type_checking: bool,
    pub desugar_html_and_state_nodes: bool,
    pub optimize: bool,
    pub insert_escaping_directives: bool,
    pub add_html_attributes_for_debugging: bool,
}

impl Default for PipelineFlags {
    fn default() -> Self {
        Self {
            allow_unknown_globals: false,
            allow_v1_expression: false,
            allow_unknown_js_globals: false,
            disable_all_type_checking: false,
            desugar_html_and_state_nodes: true,
            optimize: true,
            insert_escaping_directives: true,
            add_html_attributes_for_debugging: true,
        }
    }
}
