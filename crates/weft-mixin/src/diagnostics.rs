use weft_core::Diagnostic;

use crate::declaration::MixinDeclaration;
use crate::resolve::{most_specific, ClassFailure, FailureReason, ResolutionOutcome, Resolver};
use crate::scanner::Mode;

pub const INVALID_SELECTOR: &str = "invalid-selector";
pub const UNRESOLVED_TARGET: &str = "unresolved-target";
pub const AMBIGUOUS_TARGET: &str = "ambiguous-target";
pub const FILTERED_TARGET: &str = "filtered-target";
pub const NO_TARGET_CLASSES: &str = "no-target-classes";
/// Warning: resolved in some target classes but not in others.
pub const PARTIALLY_RESOLVED_TARGET: &str = "partially-resolved-target";

impl Resolver<'_> {
    /// Whether `selector` resolves on `declaration`; `None` when it does in
    /// every target class.
    pub fn check(&self, selector: &str, declaration: &MixinDeclaration) -> Option<Diagnostic> {
        let outcome = match self.resolve(selector, declaration, Mode::Exact) {
            Ok(outcome) => outcome,
            Err(err) => return Some(Diagnostic::error(INVALID_SELECTOR, err.to_string(), None)),
        };

        let reason = match outcome {
            ResolutionOutcome::Resolved { failures, .. } => {
                let failure = most_specific(&failures)?;
                return Some(Diagnostic::warning(
                    PARTIALLY_RESOLVED_TARGET,
                    format!(
                        "`{selector}` does not resolve in {} ({failure})",
                        classes(&failures, |_| true)
                    ),
                    None,
                ));
            }
            ResolutionOutcome::Candidates(_) => return None,
            ResolutionOutcome::Unresolved(reason) => reason,
        };

        Some(match reason {
            FailureReason::NoTargetClasses => Diagnostic::error(
                NO_TARGET_CLASSES,
                format!("`{}` has no target classes", declaration.name),
                None,
            ),
            FailureReason::Ambiguous { candidates, .. } => {
                let listed: Vec<&str> = candidates.iter().map(|c| c.label.as_str()).collect();
                Diagnostic::error(
                    AMBIGUOUS_TARGET,
                    format!(
                        "`{selector}` matches {} members: {}",
                        candidates.len(),
                        listed.join(", ")
                    ),
                    None,
                )
            }
            FailureReason::NotFound {
                failures,
                blame: Some(filter),
            } => Diagnostic::error(
                FILTERED_TARGET,
                format!(
                    "`{selector}` matches in {}, but none remain after {filter}",
                    classes(&failures, |f| f.filter.is_some())
                ),
                None,
            ),
            FailureReason::NotFound {
                failures,
                blame: None,
            } => {
                let detail = most_specific(&failures)
                    .map(|f| format!(" ({f})"))
                    .unwrap_or_default();
                Diagnostic::error(
                    UNRESOLVED_TARGET,
                    format!(
                        "cannot resolve `{selector}` in {}{detail}",
                        classes(&failures, |_| true)
                    ),
                    None,
                )
            }
        })
    }
}

fn classes(failures: &[ClassFailure], keep: impl Fn(&ClassFailure) -> bool) -> String {
    let names: Vec<String> = failures
        .iter()
        .filter(|f| keep(f))
        .map(|f| f.class.to_string())
        .collect();
    names.join(", ")
}
