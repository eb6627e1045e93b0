//! Integration tests for pipeline assembly, ordering validation and execution.

use std::sync::{Arc, Mutex};

use soy::passes::{
    CompilerPass, DeclaredPassFactory, FilePass, FileSetPass, GeneralOptions, Pass, PassContext,
    PassContinuationRule, PassFactory, PassId, PassManagerBuilder, PassResult, PassScope, Phase,
    PipelineError, SoyFileNode, SoyFileSetNode, TemplateNode, TemplateParam, TemplateRegistry,
    descriptor,
};
use soy::types::{SoyTypeRegistry, parse_type_expression};
use soy::{ErrorReporter, IdGenerator, NodeId, SoyError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn builder() -> PassManagerBuilder {
    PassManagerBuilder::new()
        .type_registry(Arc::new(SoyTypeRegistry::new()))
        .error_reporter(Arc::new(ErrorReporter::new()))
        .print_directives(Vec::new())
}

fn file_set(count: u32) -> SoyFileSetNode {
    let mut set = SoyFileSetNode::new(IdGenerator::starting_at(count * 2));
    for i in 0..count {
        set.add_file(
            SoyFileNode::new(NodeId::new(i * 2), format!("f{i}.soy"), "ns")
                .with_template(TemplateNode::new(NodeId::new(i * 2 + 1), format!("ns.t{i}"))),
        );
    }
    set
}

// =============================================================================
// Recording passes
// =============================================================================

#[derive(Default)]
struct Recorder {
    runs: Mutex<Vec<(PassId, String)>>,
    stop_at: Option<PassId>,
}

impl Recorder {
    fn stopping_at(id: PassId) -> Self {
        Self {
            stop_at: Some(id),
            ..Self::default()
        }
    }

    fn record(&self, id: PassId, target: &str) {
        self.runs.lock().unwrap().push((id, target.to_string()));
    }

    fn ids(&self) -> Vec<PassId> {
        self.runs.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }
}

struct RecordingPass {
    id: PassId,
    recorder: Arc<Recorder>,
}

impl CompilerPass for RecordingPass {
    fn id(&self) -> PassId {
        self.id
    }
}

impl FilePass for RecordingPass {
    fn run(&self, file: &mut SoyFileNode, _id_generator: &IdGenerator) {
        self.recorder.record(self.id, &file.path);
    }
}

impl FileSetPass for RecordingPass {
    fn run(
        &self,
        _files: &mut [SoyFileNode],
        _id_generator: &IdGenerator,
        _registry: &TemplateRegistry,
    ) -> PassResult {
        self.recorder.record(self.id, "*");
        if self.recorder.stop_at == Some(self.id) {
            PassResult::Stop
        } else {
            PassResult::Continue
        }
    }
}

struct RecordingFactory(Arc<Recorder>);

impl PassFactory for RecordingFactory {
    fn create(&self, id: PassId, _phase: Phase, _cx: &PassContext<'_>) -> Pass {
        let pass = Arc::new(RecordingPass {
            id,
            recorder: Arc::clone(&self.0),
        });
        match descriptor(id).map(|d| d.scope) {
            Some(PassScope::File) => Pass::File(pass),
            _ => Pass::FileSet(pass),
        }
    }
}

// =============================================================================
// Assembly
// =============================================================================

#[test]
fn test_default_pipeline_phases() {
    init_tracing();
    let manager = builder().build().unwrap();

    assert_eq!(
        manager.single_file_pass_ids(),
        [
            PassId::BAN_NON_NULL_ASSERTION_OPERATOR,
            PassId::DESUGAR_GROUP_NODES,
            PassId::CONTENT_SECURITY_POLICY_NONCE_INJECTION,
            PassId::BASIC_HTML_VALIDATION,
            PassId::INSERT_MSG_PLACEHOLDER_NODES,
            PassId::CHECK_ESCAPING_SANITY_FILE,
            PassId::RESOLVE_TEMPLATE_NAMES,
        ]
    );

    let partial = manager.partial_registry_pass_ids();
    assert_eq!(partial.len(), 35);
    assert_eq!(partial[2], PassId::RESOLVE_TEMPLATE_NAMES);
    assert_eq!(partial.last(), Some(&PassId::VE_LOG_VALIDATION));

    let cross = manager.cross_template_pass_ids();
    assert_eq!(cross.len(), 16);
    assert_eq!(cross.first(), Some(&PassId::RESOLVE_TEMPLATE_IMPORTS_FROM_FILE_SET));
    assert_eq!(cross.last(), Some(&PassId::COMBINE_CONSECUTIVE_RAW_TEXT_NODES));
    assert!(!cross.contains(&PassId::STRICT_DEPS));
}

#[test]
fn test_every_flag_combination_builds() {
    for bits in 0u32..256 {
        let on = |bit: u32| bits & (1 << bit) != 0;
        let mut options = GeneralOptions::new();
        if on(6) {
            options = options.with_allow_external_calls(false);
        }
        if on(7) {
            options = options.with_experimental_feature("enableNonNullAssertionOperator");
        }
        let mut b = builder()
            .desugar_html_and_state_nodes(on(2))
            .optimize(on(3))
            .insert_escaping_directives(on(4))
            .add_html_attributes_for_debugging(on(5))
            .general_options(options);
        if on(0) {
            b = b.allow_unknown_globals();
        }
        if on(1) {
            b = b.disable_all_type_checking();
        }
        if let Err(err) = b.build() {
            panic!("flags {bits:08b} failed: {err}");
        }
    }
}

#[test]
fn test_disable_all_type_checking_drops_typed_passes() {
    let manager = builder().disable_all_type_checking().build().unwrap();
    let partial = manager.partial_registry_pass_ids();
    let cross = manager.cross_template_pass_ids();
    for typed in [
        PassId::RESOLVE_EXPRESSION_TYPES,
        PassId::CHECK_DECLARED_TYPES,
        PassId::VE_LOG_VALIDATION,
    ] {
        assert!(!partial.contains(&typed), "{typed} still scheduled");
    }
    assert!(!cross.contains(&PassId::UPGRADE_TEMPLATE_TYPES));
    assert!(!cross.contains(&PassId::CHECK_BAD_CONTEXTUAL_USAGE));
    assert!(partial.contains(&PassId::SOY_CONFORMANCE));
}

#[test]
fn test_optional_passes_follow_flags() {
    let manager = builder()
        .optimize(false)
        .desugar_html_and_state_nodes(false)
        .add_html_attributes_for_debugging(false)
        .allow_unknown_globals()
        .build()
        .unwrap();
    let partial = manager.partial_registry_pass_ids();
    let cross = manager.cross_template_pass_ids();
    assert!(!partial.contains(&PassId::ADD_DEBUG_ATTRIBUTES));
    assert!(!partial.contains(&PassId::CHECK_GLOBALS));
    assert!(!partial.contains(&PassId::GET_EXTENSION_REWRITE_PARAM));
    assert!(!cross.contains(&PassId::OPTIMIZATION));
    assert!(!cross.contains(&PassId::DESUGAR_HTML_NODES));
    assert!(cross.contains(&PassId::AUTOESCAPER));
}

// =============================================================================
// Continuation rules
// =============================================================================

#[test]
fn test_stop_after_conformance() {
    init_tracing();
    let manager = builder()
        .add_pass_continuation_rule(PassId::SOY_CONFORMANCE, PassContinuationRule::StopAfterPass)
        .build()
        .unwrap();
    assert_eq!(
        manager.partial_registry_pass_ids().last(),
        Some(&PassId::SOY_CONFORMANCE)
    );
    assert!(manager.cross_template_pass_ids().is_empty());
}

#[test]
fn test_stop_before_pass() {
    let manager = builder()
        .add_pass_continuation_rule(PassId::AUTOESCAPER, PassContinuationRule::StopBeforePass)
        .build()
        .unwrap();
    let cross = manager.cross_template_pass_ids();
    assert!(!cross.contains(&PassId::AUTOESCAPER));
    assert_eq!(cross.last(), Some(&PassId::COMBINE_CONSECUTIVE_RAW_TEXT_NODES));
}

#[test]
fn test_rule_matches_first_occurrence_of_repeated_pass() {
    let manager = builder()
        .add_pass_continuation_rule(
            PassId::RESOLVE_TEMPLATE_NAMES,
            PassContinuationRule::StopAfterPass,
        )
        .build()
        .unwrap();
    assert_eq!(
        manager.single_file_pass_ids().last(),
        Some(&PassId::RESOLVE_TEMPLATE_NAMES)
    );
    assert!(manager.partial_registry_pass_ids().is_empty());
}

#[test]
fn test_rule_for_gated_off_pass_is_unmatched() {
    let err = builder()
        .disable_all_type_checking()
        .add_pass_continuation_rule(
            PassId::RESOLVE_EXPRESSION_TYPES,
            PassContinuationRule::StopAfterPass,
        )
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::UnmatchedContinuationRules {
            rules: vec![(
                PassId::RESOLVE_EXPRESSION_TYPES,
                PassContinuationRule::StopAfterPass
            )],
        }
    );
}

#[test]
fn test_rule_for_unknown_pass_is_unmatched() {
    let err = builder()
        .add_pass_continuation_rule(PassId::new("NotAPass"), PassContinuationRule::StopBeforePass)
        .build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnmatchedContinuationRules { .. }));
    assert!(err.to_string().contains("NotAPass (stop before)"));
}

// =============================================================================
// Ordering validation
// =============================================================================

/// Gives one pass a constraint that contradicts the script order.
struct MisorderingFactory;

struct Misordered;

impl CompilerPass for Misordered {
    fn id(&self) -> PassId {
        PassId::DESUGAR_GROUP_NODES
    }

    fn run_after(&self) -> &'static [PassId] {
        &[PassId::OPTIMIZATION]
    }
}

impl FilePass for Misordered {
    fn run(&self, _file: &mut SoyFileNode, _id_generator: &IdGenerator) {}
}

impl PassFactory for MisorderingFactory {
    fn create(&self, id: PassId, phase: Phase, cx: &PassContext<'_>) -> Pass {
        if id == PassId::DESUGAR_GROUP_NODES {
            return Pass::File(Arc::new(Misordered));
        }
        DeclaredPassFactory.create(id, phase, cx)
    }
}

#[test]
fn test_inconsistent_constraints_fail_build() {
    let err = builder()
        .pass_factory(Arc::new(MisorderingFactory))
        .build()
        .unwrap_err();
    let PipelineError::DependencyNotRun {
        pass,
        missing,
        executed,
    } = err
    else {
        panic!("expected DependencyNotRun, got {err}");
    };
    assert_eq!(pass, PassId::DESUGAR_GROUP_NODES);
    assert_eq!(missing, [PassId::OPTIMIZATION]);
    assert_eq!(executed, [PassId::BAN_NON_NULL_ASSERTION_OPERATOR]);
}

#[test]
fn test_file_set_pass_rejected_in_single_file_phase() {
    struct FileSetOnly;
    impl PassFactory for FileSetOnly {
        fn create(&self, id: PassId, _phase: Phase, _cx: &PassContext<'_>) -> Pass {
            Pass::FileSet(Arc::new(soy::passes::DeclaredPass::new(id)))
        }
    }

    let err = builder()
        .pass_factory(Arc::new(FileSetOnly))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::IncompatiblePass {
            pass: PassId::BAN_NON_NULL_ASSERTION_OPERATOR,
            phase: Phase::SingleFile,
        }
    );
}

// =============================================================================
// Execution
// =============================================================================

#[test]
fn test_execution_follows_pipeline_order() {
    init_tracing();
    let recorder = Arc::new(Recorder::default());
    let manager = builder()
        .pass_factory(Arc::new(RecordingFactory(recorder.clone())))
        .build()
        .unwrap();

    let mut set = file_set(1);
    {
        let (files, ids) = set.split_mut();
        manager.run_single_file_passes(&mut files[0], ids);
    }
    let partial = TemplateRegistry::partial();
    assert_eq!(
        manager.run_partial_template_registry_passes(&mut set, &partial),
        PassResult::Continue
    );
    let complete = TemplateRegistry::complete().with_files(set.files());
    assert_eq!(
        manager.run_whole_fileset_passes(&mut set, &complete),
        PassResult::Continue
    );

    let mut expected = manager.single_file_pass_ids();
    expected.extend(manager.partial_registry_pass_ids());
    expected.extend(manager.cross_template_pass_ids());
    assert_eq!(recorder.ids(), expected);
}

#[test]
fn test_stop_skips_rest_of_phase() {
    let recorder = Arc::new(Recorder::stopping_at(PassId::CHECK_DECLARED_TYPES));
    let manager = builder()
        .pass_factory(Arc::new(RecordingFactory(recorder.clone())))
        .build()
        .unwrap();

    let mut set = file_set(1);
    let result = manager.run_partial_template_registry_passes(&mut set, &TemplateRegistry::partial());
    assert_eq!(result, PassResult::Stop);

    let ran = recorder.ids();
    assert_eq!(ran.last(), Some(&PassId::CHECK_DECLARED_TYPES));
    assert!(!ran.contains(&PassId::RESOLVE_EXPRESSION_TYPES));
}

#[test]
fn test_shimmed_file_pass_visits_every_file() {
    let recorder = Arc::new(Recorder::default());
    let manager = builder()
        .pass_factory(Arc::new(RecordingFactory(recorder.clone())))
        .build()
        .unwrap();
    let mut set = file_set(3);
    manager.run_whole_fileset_passes(&mut set, &TemplateRegistry::complete());

    let runs = recorder.runs.lock().unwrap();
    let visits: Vec<&str> = runs
        .iter()
        .filter(|(id, _)| *id == PassId::DESUGAR_HTML_NODES)
        .map(|(_, target)| target.as_str())
        .collect();
    assert_eq!(visits, ["f0.soy", "f1.soy", "f2.soy"]);
}

#[test]
fn test_parallel_single_file_passes_run_every_pass_on_every_file() {
    let recorder = Arc::new(Recorder::default());
    let manager = builder()
        .pass_factory(Arc::new(RecordingFactory(recorder.clone())))
        .build()
        .unwrap();
    let pass_count = manager.single_file_pass_ids().len();

    let mut set = file_set(16);
    let (files, ids) = set.split_mut();
    manager.run_single_file_passes_parallel(files, ids);

    let runs = recorder.runs.lock().unwrap();
    assert_eq!(runs.len(), 16 * pass_count);
    for i in 0..16 {
        let path = format!("f{i}.soy");
        let per_file: Vec<PassId> = runs
            .iter()
            .filter(|(_, target)| *target == path)
            .map(|(id, _)| *id)
            .collect();
        // Passes on one file keep their order even when files interleave.
        assert_eq!(per_file, manager.single_file_pass_ids());
    }
}

#[test]
fn test_param_types_resolved_by_partial_phase() {
    let registry = Arc::new(SoyTypeRegistry::new());
    let reporter = Arc::new(ErrorReporter::new());
    let manager = PassManagerBuilder::new()
        .type_registry(registry.clone())
        .error_reporter(reporter.clone())
        .print_directives(Vec::new())
        .build()
        .unwrap();

    let mut set = SoyFileSetNode::new(IdGenerator::starting_at(2));
    set.add_file(
        SoyFileNode::new(NodeId::new(0), "a.soy", "ns").with_template(
            TemplateNode::new(NodeId::new(1), "ns.a")
                .with_param(TemplateParam::new(
                    "names",
                    Some(parse_type_expression("list<string>").unwrap()),
                ))
                .with_param(TemplateParam::new(
                    "bad",
                    Some(parse_type_expression("strng").unwrap()),
                )),
        ),
    );
    manager.run_partial_template_registry_passes(&mut set, &TemplateRegistry::partial());

    let params = &set.files()[0].templates[0].params;
    let names = params[0].ty.clone().unwrap();
    assert!(Arc::ptr_eq(
        &names,
        &registry.get_or_create_list_type(soy::types::primitives::STRING.clone())
    ));
    assert!(params[1].ty.as_ref().unwrap().is_error());
    assert!(matches!(
        reporter.errors()[..],
        [SoyError::UnknownType { ref suggestion, .. }] if suggestion == " Did you mean 'string'?"
    ));
}
