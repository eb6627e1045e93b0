//! Every pass the pipeline script knows about.
//!
//! Each entry records the pass's capability and the ordering constraints it
//! declares. The constraints are checked, never solved: the script in
//! [`PassManagerBuilder`](crate::PassManagerBuilder) fixes the order, and
//! [`PassManager::new`](crate::PassManager::new) verifies it.

use crate::pass::PassId;

impl PassId {
    // Single-file phase
    pub const BAN_NON_NULL_ASSERTION_OPERATOR: PassId = PassId::new("BanNonNullAssertionOperator");
    pub const DESUGAR_GROUP_NODES: PassId = PassId::new("DesugarGroupNodes");
    pub const CONTENT_SECURITY_POLICY_NONCE_INJECTION: PassId =
        PassId::new("ContentSecurityPolicyNonceInjection");
    pub const BASIC_HTML_VALIDATION: PassId = PassId::new("BasicHtmlValidation");
    pub const INSERT_MSG_PLACEHOLDER_NODES: PassId = PassId::new("InsertMsgPlaceholderNodes");
    pub const CHECK_ESCAPING_SANITY_FILE: PassId = PassId::new("CheckEscapingSanityFile");
    pub const RESOLVE_TEMPLATE_NAMES: PassId = PassId::new("ResolveTemplateNames");

    // Partial-registry phase
    pub const RESOLVE_PROTO_IMPORTS: PassId = PassId::new("ResolveProtoImports");
    pub const RESOLVE_TEMPLATE_IMPORTS_FROM_DEPS: PassId =
        PassId::new("ResolveTemplateImportsFromDeps");
    pub const RESOLVE_TEMPLATE_PARAM_TYPES: PassId = PassId::new("ResolveTemplateParamTypes");
    pub const RESOLVE_PLUGINS: PassId = PassId::new("ResolvePlugins");
    pub const REWRITE_REMAINDERS: PassId = PassId::new("RewriteRemainders");
    pub const REWRITE_GENDER_MSGS: PassId = PassId::new("RewriteGenderMsgs");
    pub const CALCULATE_MSG_SUBSTITUTION_INFO: PassId =
        PassId::new("CalculateMsgSubstitutionInfo");
    pub const CHECK_NON_EMPTY_MSG_NODES: PassId = PassId::new("CheckNonEmptyMsgNodes");
    pub const VE_REWRITE: PassId = PassId::new("VeRewrite");
    pub const REWRITE_GLOBALS: PassId = PassId::new("RewriteGlobals");
    pub const XID: PassId = PassId::new("Xid");
    pub const V1_EXPRESSION: PassId = PassId::new("V1Expression");
    pub const UNKNOWN_JS_GLOBAL: PassId = PassId::new("UnknownJsGlobal");
    pub const RESOLVE_NAMES: PassId = PassId::new("ResolveNames");
    pub const MSG_WITH_ID_FUNCTION: PassId = PassId::new("MsgWithIdFunction");
    pub const STRICT_HTML_VALIDATION: PassId = PassId::new("StrictHtmlValidation");
    pub const ADD_DEBUG_ATTRIBUTES: PassId = PassId::new("AddDebugAttributes");
    pub const CHECK_DECLARED_TYPES: PassId = PassId::new("CheckDeclaredTypes");
    pub const NULL_SAFE_ACCESS: PassId = PassId::new("NullSafeAccess");
    pub const RESOLVE_EXPRESSION_TYPES: PassId = PassId::new("ResolveExpressionTypes");
    pub const SIMPLIFY_ASSERT_NON_NULL: PassId = PassId::new("SimplifyAssertNonNull");
    pub const VALIDATE_PRINT_EXPRESSION_TYPES: PassId =
        PassId::new("ValidatePrintExpressionTypes");
    pub const ENFORCE_EXPERIMENTAL_FEATURES: PassId = PassId::new("EnforceExperimentalFeatures");
    pub const VE_LOG_REWRITE: PassId = PassId::new("VeLogRewrite");
    pub const GET_EXTENSION_REWRITE_PARAM: PassId = PassId::new("GetExtensionRewriteParam");
    pub const SOY_CONFORMANCE: PassId = PassId::new("SoyConformance");
    pub const RESOLVE_PACKAGE_RELATIVE_CSS_NAMES: PassId =
        PassId::new("ResolvePackageRelativeCssNames");
    pub const CHECK_GLOBALS: PassId = PassId::new("CheckGlobals");
    pub const VALIDATE_ALIASES: PassId = PassId::new("ValidateAliases");
    pub const KEY_COMMAND: PassId = PassId::new("KeyCommand");
    pub const VALIDATE_SKIP_NODES: PassId = PassId::new("ValidateSkipNodes");
    pub const SOY_ELEMENT: PassId = PassId::new("SoyElement");
    pub const CALL_ANNOTATION: PassId = PassId::new("CallAnnotation");
    pub const VE_LOG_VALIDATION: PassId = PassId::new("VeLogValidation");

    // Cross-template phase
    pub const RESOLVE_TEMPLATE_IMPORTS_FROM_FILE_SET: PassId =
        PassId::new("ResolveTemplateImportsFromFileSet");
    pub const CHECK_TEMPLATE_HEADER_VARS: PassId = PassId::new("CheckTemplateHeaderVars");
    pub const UPGRADE_TEMPLATE_TYPES: PassId = PassId::new("UpgradeTemplateTypes");
    pub const CHECK_NO_NAMED_TEMPLATE_TYPES: PassId = PassId::new("CheckNoNamedTemplateTypes");
    pub const TEMPLATE_TYPE_VALIDATION: PassId = PassId::new("TemplateTypeValidation");
    pub const CHECK_TEMPLATE_CALLS: PassId = PassId::new("CheckTemplateCalls");
    pub const CHECK_TEMPLATE_VISIBILITY: PassId = PassId::new("CheckTemplateVisibility");
    pub const CHECK_DELEGATES: PassId = PassId::new("CheckDelegates");
    pub const STRICT_DEPS: PassId = PassId::new("StrictDeps");
    pub const COMBINE_CONSECUTIVE_RAW_TEXT_NODES: PassId =
        PassId::new("CombineConsecutiveRawTextNodes");
    pub const AUTOESCAPER: PassId = PassId::new("Autoescaper");
    pub const CHECK_BAD_CONTEXTUAL_USAGE: PassId = PassId::new("CheckBadContextualUsage");
    pub const DESUGAR_HTML_NODES: PassId = PassId::new("DesugarHtmlNodes");
    pub const DESUGAR_STATE_NODES: PassId = PassId::new("DesugarStateNodes");
    pub const OPTIMIZATION: PassId = PassId::new("Optimization");
}

/// Which capability a catalogued pass implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassScope {
    File,
    FileSet,
}

#[derive(Debug, Clone, Copy)]
pub struct PassDescriptor {
    pub id: PassId,
    pub scope: PassScope,
    pub run_after: &'static [PassId],
    pub run_before: &'static [PassId],
}

const fn file(id: PassId) -> PassDescriptor {
    PassDescriptor {
        id,
        scope: PassScope::File,
        run_after: &[],
        run_before: &[],
    }
}

const fn file_set(id: PassId) -> PassDescriptor {
    PassDescriptor {
        id,
        scope: PassScope::FileSet,
        run_after: &[],
        run_before: &[],
    }
}

impl PassDescriptor {
    const fn after(mut self, run_after: &'static [PassId]) -> Self {
        self.run_after = run_after;
        self
    }

    const fn before(mut self, run_before: &'static [PassId]) -> Self {
        self.run_before = run_before;
        self
    }
}

static CATALOG: &[PassDescriptor] = &[
    // Single-file phase
    file(PassId::BAN_NON_NULL_ASSERTION_OPERATOR).before(&[PassId::RESOLVE_EXPRESSION_TYPES]),
    file(PassId::DESUGAR_GROUP_NODES).before(&[PassId::INSERT_MSG_PLACEHOLDER_NODES]),
    file(PassId::CONTENT_SECURITY_POLICY_NONCE_INJECTION).before(&[
        PassId::RESOLVE_NAMES,
        PassId::RESOLVE_TEMPLATE_PARAM_TYPES,
        PassId::AUTOESCAPER,
    ]),
    file(PassId::BASIC_HTML_VALIDATION),
    file(PassId::INSERT_MSG_PLACEHOLDER_NODES),
    file(PassId::CHECK_ESCAPING_SANITY_FILE),
    file(PassId::RESOLVE_TEMPLATE_NAMES),
    // Partial-registry phase
    file_set(PassId::RESOLVE_PROTO_IMPORTS),
    file_set(PassId::RESOLVE_TEMPLATE_IMPORTS_FROM_DEPS),
    file_set(PassId::RESOLVE_TEMPLATE_PARAM_TYPES),
    file_set(PassId::RESOLVE_PLUGINS).before(&[PassId::SOY_CONFORMANCE]),
    file_set(PassId::REWRITE_REMAINDERS).after(&[PassId::RESOLVE_PLUGINS]),
    file(PassId::REWRITE_GENDER_MSGS),
    file_set(PassId::CALCULATE_MSG_SUBSTITUTION_INFO).after(&[
        PassId::INSERT_MSG_PLACEHOLDER_NODES,
        PassId::REWRITE_GENDER_MSGS,
        PassId::REWRITE_REMAINDERS,
    ]),
    file(PassId::CHECK_NON_EMPTY_MSG_NODES),
    file_set(PassId::VE_REWRITE).before(&[PassId::REWRITE_GLOBALS]),
    file_set(PassId::REWRITE_GLOBALS),
    file(PassId::XID).after(&[PassId::REWRITE_GLOBALS]),
    file_set(PassId::V1_EXPRESSION).before(&[PassId::RESOLVE_NAMES]),
    file_set(PassId::UNKNOWN_JS_GLOBAL),
    file(PassId::RESOLVE_NAMES),
    file_set(PassId::MSG_WITH_ID_FUNCTION).after(&[PassId::RESOLVE_NAMES]),
    file(PassId::STRICT_HTML_VALIDATION).after(&[PassId::RESOLVE_NAMES]),
    file_set(PassId::ADD_DEBUG_ATTRIBUTES)
        .after(&[PassId::CALCULATE_MSG_SUBSTITUTION_INFO])
        .before(&[PassId::RESOLVE_EXPRESSION_TYPES]),
    file_set(PassId::CHECK_DECLARED_TYPES),
    file_set(PassId::NULL_SAFE_ACCESS).before(&[PassId::RESOLVE_EXPRESSION_TYPES]),
    file_set(PassId::RESOLVE_EXPRESSION_TYPES)
        .after(&[PassId::RESOLVE_NAMES, PassId::RESOLVE_TEMPLATE_PARAM_TYPES]),
    file_set(PassId::SIMPLIFY_ASSERT_NON_NULL).after(&[PassId::RESOLVE_EXPRESSION_TYPES]),
    file_set(PassId::VALIDATE_PRINT_EXPRESSION_TYPES).after(&[PassId::RESOLVE_EXPRESSION_TYPES]),
    file_set(PassId::ENFORCE_EXPERIMENTAL_FEATURES).after(&[PassId::RESOLVE_EXPRESSION_TYPES]),
    file_set(PassId::VE_LOG_REWRITE),
    file_set(PassId::GET_EXTENSION_REWRITE_PARAM).before(&[PassId::CHECK_GLOBALS]),
    file_set(PassId::SOY_CONFORMANCE),
    file_set(PassId::RESOLVE_PACKAGE_RELATIVE_CSS_NAMES),
    file_set(PassId::CHECK_GLOBALS).after(&[PassId::REWRITE_GLOBALS, PassId::RESOLVE_NAMES]),
    file_set(PassId::VALIDATE_ALIASES),
    file(PassId::KEY_COMMAND),
    file(PassId::VALIDATE_SKIP_NODES),
    file_set(PassId::SOY_ELEMENT).after(&[PassId::STRICT_HTML_VALIDATION]),
    file_set(PassId::CALL_ANNOTATION),
    file_set(PassId::VE_LOG_VALIDATION)
        .after(&[PassId::RESOLVE_EXPRESSION_TYPES, PassId::VE_LOG_REWRITE]),
    // Cross-template phase
    file_set(PassId::RESOLVE_TEMPLATE_IMPORTS_FROM_FILE_SET),
    file_set(PassId::CHECK_TEMPLATE_HEADER_VARS),
    file_set(PassId::UPGRADE_TEMPLATE_TYPES),
    file_set(PassId::CHECK_NO_NAMED_TEMPLATE_TYPES).after(&[PassId::UPGRADE_TEMPLATE_TYPES]),
    file_set(PassId::TEMPLATE_TYPE_VALIDATION).after(&[PassId::UPGRADE_TEMPLATE_TYPES]),
    file_set(PassId::CHECK_TEMPLATE_CALLS)
        .after(&[PassId::RESOLVE_EXPRESSION_TYPES, PassId::UPGRADE_TEMPLATE_TYPES]),
    file_set(PassId::CHECK_TEMPLATE_VISIBILITY),
    file_set(PassId::CHECK_DELEGATES),
    file_set(PassId::STRICT_DEPS),
    file(PassId::COMBINE_CONSECUTIVE_RAW_TEXT_NODES),
    file_set(PassId::AUTOESCAPER)
        .after(&[PassId::COMBINE_CONSECUTIVE_RAW_TEXT_NODES])
        .before(&[PassId::DESUGAR_HTML_NODES, PassId::OPTIMIZATION]),
    file_set(PassId::CHECK_BAD_CONTEXTUAL_USAGE)
        .after(&[PassId::AUTOESCAPER, PassId::RESOLVE_EXPRESSION_TYPES]),
    file(PassId::DESUGAR_HTML_NODES),
    file(PassId::DESUGAR_STATE_NODES),
    file_set(PassId::OPTIMIZATION).after(&[PassId::AUTOESCAPER]),
];

/// All catalogued passes, in script order.
pub fn catalog() -> &'static [PassDescriptor] {
    CATALOG
}

pub fn descriptor(id: PassId) -> Option<&'static PassDescriptor> {
    CATALOG.iter().find(|descriptor| descriptor.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn identities_are_unique() {
        let mut seen = FxHashSet::default();
        for descriptor in catalog() {
            assert!(seen.insert(descriptor.id), "duplicate {}", descriptor.id);
        }
    }

    #[test]
    fn constraints_reference_catalogued_passes() {
        for entry in catalog() {
            for id in entry.run_after.iter().chain(entry.run_before) {
                assert!(descriptor(*id).is_some(), "{} names unknown {id}", entry.id);
            }
        }
    }

    #[test]
    fn catalog_order_satisfies_constraints() {
        let mut executed = FxHashSet::default();
        for descriptor in catalog() {
            for id in descriptor.run_after {
                assert!(executed.contains(id), "{} needs {id}", descriptor.id);
            }
            for id in descriptor.run_before {
                assert!(!executed.contains(id), "{} must precede {id}", descriptor.id);
            }
            executed.insert(descriptor.id);
        }
    }

    #[test]
    fn lookup() {
        let resolve = descriptor(PassId::RESOLVE_EXPRESSION_TYPES).unwrap();
        assert_eq!(resolve.scope, PassScope::FileSet);
        assert!(resolve.run_after.contains(&PassId::RESOLVE_NAMES));
        assert!(descriptor(PassId::new("NoSuchPass")).is_none());
    }
}
