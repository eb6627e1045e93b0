//! PassManagerBuilder - assembles the three phases from a fixed script.
//!
//! The script below is the pipeline. It is hand ordered and gated by
//! configuration flags; there is no dependency solver. Ordering constraints
//! declared by the passes are verified afterwards by [`PassManager::new`].
//!
//! # Continuation rules
//!
//! A rule registered for a pass stops the builder before or after that pass.
//! Once stopped, every later step of the script is a no-op, but rules for
//! those later passes are still consumed. A rule left unconsumed at the end
//! names a pass the script never reached, which is an error.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use soy_core::ErrorReporter;
use soy_types::SoyTypeRegistry;

use crate::config::{
    ConformanceConfig, CssRegistry, GeneralOptions, LoggingConfig, PassContinuationRule,
    PipelineFlags, PluginResolver, PrintDirective, TriState,
};
use crate::error::PipelineError;
use crate::factory::{PassContext, PassFactory, StandardPassFactory};
use crate::manager::{PassManager, Pipeline};
use crate::pass::{Pass, PassId, Phase};

/// Experimental feature that permits the `!` non-null assertion operator.
pub const ENABLE_NON_NULL_ASSERTION_OPERATOR: &str = "enableNonNullAssertionOperator";

/// Configures and builds a [`PassManager`].
pub struct PassManagerBuilder {
    type_registry: Option<Arc<SoyTypeRegistry>>,
    error_reporter: Option<Arc<ErrorReporter>>,
    print_directives: Option<Vec<PrintDirective>>,
    plugin_resolver: PluginResolver,
    general_options: GeneralOptions,
    css_registry: Option<CssRegistry>,
    conformance_config: ConformanceConfig,
    logging_config: LoggingConfig,
    flags: PipelineFlags,
    continuation_rules: FxHashMap<PassId, PassContinuationRule>,
    pass_factory: Arc<dyn PassFactory>,
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PassManagerBuilder {
    pub fn new() -> Self {
        Self {
            type_registry: None,
            error_reporter: None,
            print_directives: None,
            plugin_resolver: PluginResolver::default(),
            general_options: GeneralOptions::default(),
            css_registry: None,
            conformance_config: ConformanceConfig::default(),
            logging_config: LoggingConfig::default(),
            flags: PipelineFlags::default(),
            continuation_rules: FxHashMap::default(),
            pass_factory: Arc::new(StandardPassFactory),
        }
    }

    pub fn type_registry(mut self, registry: Arc<SoyTypeRegistry>) -> Self {
        self.type_registry = Some(registry);
        self
    }

    pub fn error_reporter(mut self, reporter: Arc<ErrorReporter>) -> Self {
        self.error_reporter = Some(reporter);
        self
    }

    pub fn print_directives(mut self, directives: Vec<PrintDirective>) -> Self {
        self.print_directives = Some(directives);
        self
    }

    pub fn plugin_resolver(mut self, resolver: PluginResolver) -> Self {
        self.plugin_resolver = resolver;
        self
    }

    pub fn general_options(mut self, options: GeneralOptions) -> Self {
        self.general_options = options;
        self
    }

    pub fn css_registry(mut self, registry: Option<CssRegistry>) -> Self {
        self.css_registry = registry;
        self
    }

    /// Allow references to globals that are never defined. Only for legacy
    /// JS-only templates and parse-info generation.
    pub fn allow_unknown_globals(mut self) -> Self {
        self.flags.allow_unknown_globals = true;
        self
    }

    pub fn allow_v1_expression(mut self) -> Self {
        self.flags.allow_v1_expression = true;
        self
    }

    pub fn allow_unknown_js_globals(mut self) -> Self {
        self.flags.allow_unknown_js_globals = true;
        self
    }

    /// Skip every pass that enforces or relies on type information, e.g. for
    /// message extraction without a real type registry.
    pub fn disable_all_type_checking(mut self) -> Self {
        self.flags.disable_all_type_checking = true;
        self
    }

    /// Turn html and state nodes back into raw text before code generation.
    /// Defaults to `true`.
    pub fn desugar_html_and_state_nodes(mut self, desugar: bool) -> Self {
        self.flags.desugar_html_and_state_nodes = desugar;
        self
    }

    /// Defaults to `true`.
    pub fn optimize(mut self, optimize: bool) -> Self {
        self.flags.optimize = optimize;
        self
    }

    /// Defaults to `true`.
    pub fn insert_escaping_directives(mut self, insert: bool) -> Self {
        self.flags.insert_escaping_directives = insert;
        self
    }

    /// Defaults to `true`.
    pub fn add_html_attributes_for_debugging(mut self, add: bool) -> Self {
        self.flags.add_html_attributes_for_debugging = add;
        self
    }

    pub fn conformance_config(mut self, config: ConformanceConfig) -> Self {
        self.conformance_config = config;
        self
    }

    pub fn logging_config(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self
    }

    /// Stop building before or after `pass`. Replaces any earlier rule for
    /// the same pass.
    pub fn add_pass_continuation_rule(mut self, pass: PassId, rule: PassContinuationRule) -> Self {
        self.continuation_rules.insert(pass, rule);
        self
    }

    pub fn pass_factory(mut self, factory: Arc<dyn PassFactory>) -> Self {
        self.pass_factory = factory;
        self
    }

    /// Run the pipeline script and validate the result.
    pub fn build(mut self) -> Result<PassManager, PipelineError> {
        let rules = std::mem::take(&mut self.continuation_rules);
        let type_registry = self
            .type_registry
            .as_ref()
            .ok_or(PipelineError::MissingConfiguration {
                field: "type_registry",
            })?;
        let error_reporter = self
            .error_reporter
            .as_ref()
            .ok_or(PipelineError::MissingConfiguration {
                field: "error_reporter",
            })?;
        let print_directives =
            self.print_directives
                .as_deref()
                .ok_or(PipelineError::MissingConfiguration {
                    field: "print_directives",
                })?;

        let cx = PassContext {
            type_registry,
            error_reporter,
            plugin_resolver: &self.plugin_resolver,
            print_directives,
            general_options: &self.general_options,
            css_registry: self.css_registry.as_ref(),
            conformance_config: &self.conformance_config,
            logging_config: &self.logging_config,
            flags: &self.flags,
        };
        let mut assembler = PipelineAssembler::new(self.pass_factory.as_ref(), cx, rules);
        run_script(&mut assembler, &self.flags, &self.general_options)?;
        let pipeline = assembler.finish()?;

        tracing::info!(
            single_file = pipeline.single_file_len(),
            partial_registry = pipeline.partial_registry_len(),
            cross_template = pipeline.cross_template_len(),
            "pipeline assembled"
        );
        PassManager::new(pipeline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    Accepting,
    /// A continuation rule fired; later passes are dropped.
    Halted,
}

/// Places scripted passes into their phases until a continuation rule halts it.
struct PipelineAssembler<'a> {
    factory: &'a dyn PassFactory,
    cx: PassContext<'a>,
    rules: FxHashMap<PassId, PassContinuationRule>,
    state: BuildState,
    pipeline: Pipeline,
}

impl<'a> PipelineAssembler<'a> {
    fn new(
        factory: &'a dyn PassFactory,
        cx: PassContext<'a>,
        rules: FxHashMap<PassId, PassContinuationRule>,
    ) -> Self {
        Self {
            factory,
            cx,
            rules,
            state: BuildState::Accepting,
            pipeline: Pipeline::default(),
        }
    }

    fn add(&mut self, phase: Phase, id: PassId) -> Result<(), PipelineError> {
        // Consumed even when halted, so only never-reached passes are unmatched.
        let rule = self.rules.remove(&id);
        if self.state == BuildState::Halted {
            return Ok(());
        }
        match rule {
            None => self.place(phase, id),
            Some(PassContinuationRule::StopAfterPass) => {
                self.place(phase, id)?;
                self.halt(id, PassContinuationRule::StopAfterPass);
                Ok(())
            }
            Some(PassContinuationRule::StopBeforePass) => {
                self.halt(id, PassContinuationRule::StopBeforePass);
                Ok(())
            }
        }
    }

    fn place(&mut self, phase: Phase, id: PassId) -> Result<(), PipelineError> {
        let pass = self.factory.create(id, phase, &self.cx);
        match (phase, pass) {
            (Phase::SingleFile, Pass::File(pass)) => self.pipeline.push_single_file(pass),
            (Phase::SingleFile, Pass::FileSet(pass)) => {
                return Err(PipelineError::IncompatiblePass {
                    pass: pass.id(),
                    phase,
                });
            }
            (Phase::PartialRegistry, pass) => self.pipeline.push_partial_registry(pass),
            (Phase::CrossTemplate, pass) => self.pipeline.push_cross_template(pass),
        }
        Ok(())
    }

    fn halt(&mut self, id: PassId, rule: PassContinuationRule) {
        tracing::debug!(pass = %id, %rule, "continuation rule halted pipeline assembly");
        self.state = BuildState::Halted;
    }

    fn finish(self) -> Result<Pipeline, PipelineError> {
        if !self.rules.is_empty() {
            let mut rules: Vec<_> = self.rules.into_iter().collect();
            rules.sort_by_key(|(id, _)| *id);
            return Err(PipelineError::UnmatchedContinuationRules { rules });
        }
        Ok(self.pipeline)
    }
}

/// The pipeline, in execution order.
fn run_script(
    p: &mut PipelineAssembler<'_>,
    flags: &PipelineFlags,
    options: &GeneralOptions,
) -> Result<(), PipelineError> {
    use Phase::{CrossTemplate, PartialRegistry, SingleFile};

    let type_checking = !flags.disable_all_type_checking;

    // Single-file passes rewrite the tree and run every check that needs no
    // callee information. They all run even after errors, to report as much
    // as possible per compile.
    if !options.has_experimental_feature(ENABLE_NON_NULL_ASSERTION_OPERATOR) {
        p.add(SingleFile, PassId::BAN_NON_NULL_ASSERTION_OPERATOR)?;
    }
    p.add(SingleFile, PassId::DESUGAR_GROUP_NODES)?;
    p.add(SingleFile, PassId::CONTENT_SECURITY_POLICY_NONCE_INJECTION)?;
    p.add(SingleFile, PassId::BASIC_HTML_VALIDATION)?;
    // Placeholders are built from the html tag nodes.
    p.add(SingleFile, PassId::INSERT_MSG_PLACEHOLDER_NODES)?;
    p.add(SingleFile, PassId::CHECK_ESCAPING_SANITY_FILE)?;
    // Also needed here: if another file fails to parse, the file-set phases
    // never run, but data="all" calls still need resolved names.
    p.add(SingleFile, PassId::RESOLVE_TEMPLATE_NAMES)?;

    // File-set passes over a registry that may only hold dependencies.
    p.add(PartialRegistry, PassId::RESOLVE_PROTO_IMPORTS)?;
    p.add(PartialRegistry, PassId::RESOLVE_TEMPLATE_IMPORTS_FROM_DEPS)?;
    p.add(PartialRegistry, PassId::RESOLVE_TEMPLATE_NAMES)?;
    // Header compilation needs the template metadata this produces.
    p.add(PartialRegistry, PassId::RESOLVE_TEMPLATE_PARAM_TYPES)?;
    p.add(PartialRegistry, PassId::RESOLVE_PLUGINS)?;
    p.add(PartialRegistry, PassId::REWRITE_REMAINDERS)?;
    p.add(PartialRegistry, PassId::REWRITE_GENDER_MSGS)?;
    // After everything that touches msg placeholders.
    p.add(PartialRegistry, PassId::CALCULATE_MSG_SUBSTITUTION_INFO)?;
    p.add(PartialRegistry, PassId::CHECK_NON_EMPTY_MSG_NODES)?;
    // Removes some globals, so it precedes the globals rewrite.
    p.add(PartialRegistry, PassId::VE_REWRITE)?;
    p.add(PartialRegistry, PassId::REWRITE_GLOBALS)?;
    p.add(PartialRegistry, PassId::XID)?;
    p.add(PartialRegistry, PassId::V1_EXPRESSION)?;
    p.add(PartialRegistry, PassId::UNKNOWN_JS_GLOBAL)?;
    p.add(PartialRegistry, PassId::RESOLVE_NAMES)?;
    p.add(PartialRegistry, PassId::MSG_WITH_ID_FUNCTION)?;
    p.add(PartialRegistry, PassId::STRICT_HTML_VALIDATION)?;
    if flags.add_html_attributes_for_debugging {
        // Inserts expressions, so it precedes expression typing.
        p.add(PartialRegistry, PassId::ADD_DEBUG_ATTRIBUTES)?;
    }
    if type_checking {
        p.add(PartialRegistry, PassId::CHECK_DECLARED_TYPES)?;
        p.add(PartialRegistry, PassId::NULL_SAFE_ACCESS)?;
        p.add(PartialRegistry, PassId::RESOLVE_EXPRESSION_TYPES)?;
        p.add(PartialRegistry, PassId::SIMPLIFY_ASSERT_NON_NULL)?;
        p.add(PartialRegistry, PassId::VALIDATE_PRINT_EXPRESSION_TYPES)?;
        p.add(PartialRegistry, PassId::ENFORCE_EXPERIMENTAL_FEATURES)?;
        p.add(PartialRegistry, PassId::VE_LOG_REWRITE)?;
        if !flags.allow_unknown_globals {
            p.add(PartialRegistry, PassId::GET_EXTENSION_REWRITE_PARAM)?;
        }
    }
    // Conformance-only compiles stop right after this pass, so the tree must
    // be complete by now.
    p.add(PartialRegistry, PassId::SOY_CONFORMANCE)?;
    p.add(PartialRegistry, PassId::RESOLVE_PACKAGE_RELATIVE_CSS_NAMES)?;
    if !flags.allow_unknown_globals {
        p.add(PartialRegistry, PassId::CHECK_GLOBALS)?;
    }
    p.add(PartialRegistry, PassId::VALIDATE_ALIASES)?;
    p.add(PartialRegistry, PassId::KEY_COMMAND)?;
    p.add(PartialRegistry, PassId::VALIDATE_SKIP_NODES)?;
    p.add(PartialRegistry, PassId::SOY_ELEMENT)?;
    p.add(PartialRegistry, PassId::CALL_ANNOTATION)?;
    if type_checking {
        p.add(PartialRegistry, PassId::VE_LOG_VALIDATION)?;
    }

    // Cross-template passes see every signature. Their results can't be
    // cached per file, so keep this list short.
    p.add(CrossTemplate, PassId::RESOLVE_TEMPLATE_IMPORTS_FROM_FILE_SET)?;
    p.add(CrossTemplate, PassId::RESOLVE_TEMPLATE_NAMES)?;
    p.add(CrossTemplate, PassId::CHECK_TEMPLATE_HEADER_VARS)?;
    if type_checking {
        p.add(CrossTemplate, PassId::UPGRADE_TEMPLATE_TYPES)?;
        p.add(CrossTemplate, PassId::CHECK_NO_NAMED_TEMPLATE_TYPES)?;
        p.add(CrossTemplate, PassId::TEMPLATE_TYPE_VALIDATION)?;
        p.add(CrossTemplate, PassId::CHECK_TEMPLATE_CALLS)?;
    }
    p.add(CrossTemplate, PassId::CHECK_TEMPLATE_VISIBILITY)?;
    p.add(CrossTemplate, PassId::CHECK_DELEGATES)?;
    if options.allow_external_calls == TriState::Disabled {
        p.add(CrossTemplate, PassId::STRICT_DEPS)?;
    }
    p.add(CrossTemplate, PassId::COMBINE_CONSECUTIVE_RAW_TEXT_NODES)?;
    p.add(CrossTemplate, PassId::AUTOESCAPER)?;
    if type_checking && flags.insert_escaping_directives {
        p.add(CrossTemplate, PassId::CHECK_BAD_CONTEXTUAL_USAGE)?;
    }

    // Simplification for code generation.
    if flags.desugar_html_and_state_nodes {
        p.add(CrossTemplate, PassId::DESUGAR_HTML_NODES)?;
        p.add(CrossTemplate, PassId::DESUGAR_STATE_NODES)?;
    }
    if flags.optimize {
        p.add(CrossTemplate, PassId::OPTIMIZATION)?;
    }
    // Desugaring and optimization both leave adjacent raw text behind.
    p.add(CrossTemplate, PassId::COMBINE_CONSECUTIVE_RAW_TEXT_NODES)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PassManagerBuilder {
        PassManagerBuilder::new()
            .type_registry(Arc::new(SoyTypeRegistry::new()))
            .error_reporter(Arc::new(ErrorReporter::new()))
            .print_directives(Vec::new())
    }

    #[test]
    fn requires_registry_reporter_and_directives() {
        let err = PassManagerBuilder::new().build().unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingConfiguration {
                field: "type_registry"
            }
        );

        let err = PassManagerBuilder::new()
            .type_registry(Arc::new(SoyTypeRegistry::new()))
            .error_reporter(Arc::new(ErrorReporter::new()))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingConfiguration {
                field: "print_directives"
            }
        );
    }

    #[test]
    fn later_rule_replaces_earlier() {
        let manager = builder()
            .add_pass_continuation_rule(PassId::RESOLVE_NAMES, PassContinuationRule::StopBeforePass)
            .add_pass_continuation_rule(PassId::RESOLVE_NAMES, PassContinuationRule::StopAfterPass)
            .build()
            .unwrap();
        assert_eq!(
            manager.partial_registry_pass_ids().last(),
            Some(&PassId::RESOLVE_NAMES)
        );
    }

    #[test]
    fn stop_before_first_pass_leaves_pipeline_empty() {
        let manager = builder()
            .add_pass_continuation_rule(
                PassId::BAN_NON_NULL_ASSERTION_OPERATOR,
                PassContinuationRule::StopBeforePass,
            )
            .build()
            .unwrap();
        assert!(manager.single_file_pass_ids().is_empty());
        assert!(manager.partial_registry_pass_ids().is_empty());
        assert!(manager.cross_template_pass_ids().is_empty());
    }

    #[test]
    fn rules_after_halt_are_consumed() {
        let result = builder()
            .add_pass_continuation_rule(PassId::SOY_CONFORMANCE, PassContinuationRule::StopAfterPass)
            .add_pass_continuation_rule(PassId::OPTIMIZATION, PassContinuationRule::StopBeforePass)
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn non_null_assertion_feature_drops_ban() {
        let manager = builder()
            .general_options(
                GeneralOptions::new().with_experimental_feature(ENABLE_NON_NULL_ASSERTION_OPERATOR),
            )
            .build()
            .unwrap();
        assert!(
            !manager
                .single_file_pass_ids()
                .contains(&PassId::BAN_NON_NULL_ASSERTION_OPERATOR)
        );
    }

    #[test]
    fn strict_deps_only_when_external_calls_disabled() {
        let default = builder().build().unwrap();
        assert!(!default.cross_template_pass_ids().contains(&PassId::STRICT_DEPS));

        let strict = builder()
            .general_options(GeneralOptions::new().with_allow_external_calls(false))
            .build()
            .unwrap();
        assert!(strict.cross_template_pass_ids().contains(&PassId::STRICT_DEPS));
    }
}
