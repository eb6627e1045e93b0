//! Fatal pipeline errors.
//!
//! These mean the compiler itself is misassembled. They are returned before
//! any file is compiled and are never shown as template diagnostics.

use thiserror::Error;

use crate::config::PassContinuationRule;
use crate::pass::{PassId, Phase};

fn join(ids: &[PassId]) -> String {
    ids.iter()
        .map(|id| id.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_rules(rules: &[(PassId, PassContinuationRule)]) -> String {
    rules
        .iter()
        .map(|(id, rule)| format!("{id} ({rule})"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("missing required configuration: {field}")]
    MissingConfiguration { field: &'static str },

    #[error(
        "attempted to execute pass {pass} but its dependencies ({}) haven't run yet. Passes executed so far: {}",
        join(.missing),
        join(.executed)
    )]
    DependencyNotRun {
        pass: PassId,
        missing: Vec<PassId>,
        executed: Vec<PassId>,
    },

    #[error(
        "attempted to execute pass {pass} but it should always run before ({}), which already ran. Passes executed so far: {}",
        join(.conflicts),
        join(.executed)
    )]
    RunBeforeViolated {
        pass: PassId,
        conflicts: Vec<PassId>,
        executed: Vec<PassId>,
    },

    #[error("the following continuation rules don't match any pass: {}", join_rules(.rules))]
    UnmatchedContinuationRules {
        rules: Vec<(PassId, PassContinuationRule)>,
    },

    #[error("pass {pass} cannot be placed in the {phase} phase")]
    IncompatiblePass { pass: PassId, phase: Phase },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_before_message_names_conflicts() {
        let err = PipelineError::RunBeforeViolated {
            pass: PassId::AUTOESCAPER,
            conflicts: vec![PassId::OPTIMIZATION],
            executed: vec![PassId::RESOLVE_NAMES, PassId::OPTIMIZATION],
        };
        assert_eq!(
            err.to_string(),
            "attempted to execute pass Autoescaper but it should always run before (Optimization), \
             which already ran. Passes executed so far: ResolveNames, Optimization"
        );
    }

    #[test]
    fn unmatched_rules_message() {
        let err = PipelineError::UnmatchedContinuationRules {
            rules: vec![(PassId::STRICT_DEPS, PassContinuationRule::StopAfterPass)],
        };
        assert_eq!(
            err.to_string(),
            "the following continuation rules don't match any pass: StrictDeps (stop after)"
        );
    }
}
