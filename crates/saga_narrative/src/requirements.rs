//! Advisory check of mandatory constraints against a scene plan.

use saga_core::{RequirementCheck, RequirementSpec};

/// Report which salient tokens of each requirement appear in the plan.
///
/// Containment is case-insensitive substring matching. The result is advisory:
/// it is logged and recorded in the run metadata but never stops a run.
///
/// # Examples
///
/// ```
/// use saga_core::RequirementSpec;
/// use saga_narrative::check_requirements;
///
/// let requirements = [RequirementSpec::new("The lighthouse must burn down before winter.")];
/// let checks = check_requirements(&requirements, "Scene 4: The Lighthouse burns; winter arrives");
///
/// assert_eq!(checks[0].found, ["lighthouse", "burn", "winter"]);
/// assert_eq!(checks[0].missing, ["down"]);
/// ```
pub fn check_requirements(requirements: &[RequirementSpec], plan_text: &str) -> Vec<RequirementCheck> {
    let haystack = plan_text.to_lowercase();
    requirements
        .iter()
        .map(|spec| {
            let (found, missing): (Vec<String>, Vec<String>) = spec
                .tokens()
                .iter()
                .cloned()
                .partition(|token| haystack.contains(token.as_str()));
            let check = RequirementCheck {
                requirement: spec.text().to_string(),
                found,
                missing,
            };
            if check.is_satisfied() {
                tracing::info!(requirement = %check.requirement, "Requirement reflected in plan");
            } else {
                tracing::warn!(
                    requirement = %check.requirement,
                    missing = ?check.missing,
                    "Requirement may be missing from plan"
                );
            }
            check
        })
        .collect()
}
