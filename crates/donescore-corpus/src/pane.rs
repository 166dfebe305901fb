//! Pane readiness: required headings and header fields, per artifact.

use crate::extract::ArtifactExtract;
use crate::patterns::Patterns;
use crate::profile::PaneSpec;
use donescore_kernel::StructuralGate;

pub const PANE_READINESS: &str = "pane-readiness";

/// A field counts only when it carries a non-placeholder value.
pub fn check_pane(
    extract: &ArtifactExtract,
    spec: &PaneSpec,
    patterns: &Patterns,
) -> StructuralGate {
    let mut missing: Vec<String> = spec
        .required_headings
        .iter()
        .filter(|heading| !extract.has_heading(heading))
        .map(|heading| format!("## {heading}"))
        .collect();
    missing.extend(
        spec.required_fields
            .iter()
            .filter(|field| {
                extract
                    .header_field(field)
                    .is_none_or(|value| patterns.is_placeholder(value))
            })
            .map(|field| format!("{field}:")),
    );
    StructuralGate {
        name: PANE_READINESS.to_string(),
        subject: extract.artifact_id.clone(),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractContext, extract_artifact};
    use crate::profile::{CorpusConfig, proposition_profile};

    fn gate_for(doc: &str) -> StructuralGate {
        let profile = proposition_profile();
        let patterns = Patterns::compile(&CorpusConfig::default()).expect("defaults compile");
        let ctx = ExtractContext {
            artifact_id: "PROP-0001",
            profile: &profile,
            patterns: &patterns,
        };
        check_pane(&extract_artifact(doc, &ctx), &profile.pane, &patterns)
    }

    #[test]
    fn complete_artifact_passes() {
        let gate = gate_for("**Persona:** PER-0001\n\n## Summary\n\n## Boosters\n\n## Relievers\n");
        assert!(gate.passed(), "unexpected missing: {:?}", gate.missing);
        assert_eq!(gate.subject, "PROP-0001");
    }

    #[test]
    fn missing_heading_and_placeholder_field_are_reported() {
        let gate = gate_for("Persona: TBD\n\n## Summary\n\n## Boosters\n");
        assert_eq!(gate.missing, vec!["## Relievers", "Persona:"]);
    }
}
