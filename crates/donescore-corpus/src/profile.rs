//! Corpus configuration: ID grammar, placeholder and token-dump heuristics,
//! and the per-domain profiles that describe where substance lives.
//!
//! Everything here is tunable. The metric bounds the kernel normalizes
//! against are not; see `donescore_kernel::ScoringConfig`.

use crate::error::CorpusError;
use donescore_kernel::TargetSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const DEFAULT_ID_PATTERN: &str = r"\b[A-Z]{1,6}-\d{4}(?:-[A-Z]{1,3}\d{1,3})?\b";
pub const DEFAULT_DOMAIN: &str = "proposition";

const DEFAULT_PLACEHOLDER_PATTERNS: &[&str] = &[
    r"^\[.*\]$",
    r"^<.*>$",
    r"(?i)^(?:tbd|tbc|todo|n/?a|none|-+|\.\.\.|…)$",
    r"(?i)^the system shall\s*(?:\.\.\.|…|\[.*\]|<.*>)?\s*\.?$",
    r"(?i)^(?:describe|enter|insert|add)\b.*(?:here|\.\.\.|…)$",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TokenDumpConfig {
    /// Dumpy tokens a span needs before it is dropped.
    pub min_run: usize,
    /// Longest token (in chars) that still counts as short.
    pub max_token_len: usize,
    /// Minimum share of dumpy tokens within the trimmed span.
    pub min_density: f64,
}

impl Default for TokenDumpConfig {
    fn default() -> Self {
        Self {
            min_run: 6,
            max_token_len: 12,
            min_density: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TableSpec {
    /// Level-2 heading the table lives under.
    pub section: String,
    pub id_column: String,
    pub content_columns: Vec<String>,
    #[serde(default)]
    pub reference_columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeftScope {
    /// Edges leave from the owning artifact.
    Artifact,
    /// Edges leave from the table row that carries the reference.
    Row,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RightPool {
    /// Artifacts of the upstream domain; targets collapse to artifact IDs.
    Upstream,
    /// Row IDs of this corpus's tables under the named sections.
    Rows { sections: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LinkSpec {
    pub relation: String,
    pub left: LeftScope,
    pub right: RightPool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetBasis {
    CorpusArtifacts,
    UpstreamArtifacts,
    UpstreamWords,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TargetRule {
    pub basis: TargetBasis,
    #[serde(flatten)]
    pub spec: TargetSpec,
}

impl TargetRule {
    pub const fn new(basis: TargetBasis, coefficient: f64, floor: usize, ceiling: usize) -> Self {
        Self {
            basis,
            spec: TargetSpec::new(coefficient, floor, ceiling),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TargetRules {
    pub words: TargetRule,
    pub rows: TargetRule,
    pub edges: TargetRule,
}

/// Unscored structural requirements, checked per artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PaneSpec {
    pub required_headings: Vec<String>,
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DomainProfile {
    pub name: String,
    /// Directory under the docs root holding this domain's artifacts.
    pub dir: String,
    /// Artifact ID prefix; files match `<PREFIX>-####*.md`.
    pub prefix: String,
    #[serde(default)]
    pub upstream: Option<String>,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub tables: Vec<TableSpec>,
    /// Header fields whose values carry ID references.
    #[serde(default)]
    pub reference_fields: Vec<String>,
    pub link: LinkSpec,
    pub targets: TargetRules,
    #[serde(default)]
    pub pane: PaneSpec,
}

impl DomainProfile {
    pub fn table_for(&self, heading: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|table| table.section.eq_ignore_ascii_case(heading))
    }

    pub fn is_prose_section(&self, heading: &str) -> bool {
        self.sections
            .iter()
            .any(|section| section.eq_ignore_ascii_case(heading))
    }

    pub fn is_reference_field(&self, field: &str) -> bool {
        self.reference_fields
            .iter()
            .any(|name| name.eq_ignore_ascii_case(field))
    }

    pub fn file_pattern(&self) -> String {
        format!("{}-####*.md", self.prefix)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn table(section: &str, content: &[&str], references: &[&str]) -> TableSpec {
    TableSpec {
        section: section.to_string(),
        id_column: "ID".to_string(),
        content_columns: strings(content),
        reference_columns: strings(references),
    }
}

pub fn persona_profile() -> DomainProfile {
    DomainProfile {
        name: "persona".to_string(),
        dir: "personas".to_string(),
        prefix: "PER".to_string(),
        upstream: None,
        sections: strings(&["Profile", "Context"]),
        tables: vec![
            table("Jobs", &["Job", "Context"], &[]),
            table("Pains", &["Pain"], &["Job"]),
            table("Gains", &["Gain"], &["Job"]),
        ],
        reference_fields: Vec::new(),
        link: LinkSpec {
            relation: "addresses".to_string(),
            left: LeftScope::Row,
            right: RightPool::Rows {
                sections: strings(&["Jobs"]),
            },
        },
        targets: TargetRules {
            words: TargetRule::new(TargetBasis::CorpusArtifacts, 350.0, 300, 8000),
            rows: TargetRule::new(TargetBasis::CorpusArtifacts, 9.0, 9, 180),
            edges: TargetRule::new(TargetBasis::CorpusArtifacts, 6.0, 6, 120),
        },
        pane: PaneSpec {
            required_headings: strings(&["Profile", "Jobs", "Pains", "Gains"]),
            required_fields: strings(&["Segment"]),
        },
    }
}

pub fn proposition_profile() -> DomainProfile {
    DomainProfile {
        name: "proposition".to_string(),
        dir: "propositions".to_string(),
        prefix: "PROP".to_string(),
        upstream: Some("persona".to_string()),
        sections: strings(&["Summary", "Rationale", "Tradeoffs"]),
        tables: vec![
            table("Boosters", &["Booster", "Rationale"], &["Mapped Gain"]),
            table("Relievers", &["Reliever", "Rationale"], &["Mapped Pain"]),
        ],
        reference_fields: strings(&["Persona"]),
        link: LinkSpec {
            relation: "serves".to_string(),
            left: LeftScope::Artifact,
            right: RightPool::Upstream,
        },
        targets: TargetRules {
            words: TargetRule::new(TargetBasis::UpstreamWords, 1.2, 400, 12000),
            rows: TargetRule::new(TargetBasis::UpstreamArtifacts, 6.0, 6, 120),
            edges: TargetRule::new(TargetBasis::UpstreamArtifacts, 2.0, 2, 80),
        },
        pane: PaneSpec {
            required_headings: strings(&["Summary", "Boosters", "Relievers"]),
            required_fields: strings(&["Persona"]),
        },
    }
}

pub fn requirements_profile() -> DomainProfile {
    DomainProfile {
        name: "requirements".to_string(),
        dir: "requirements".to_string(),
        prefix: "REQ".to_string(),
        upstream: Some("proposition".to_string()),
        sections: strings(&["Scope", "Notes"]),
        tables: vec![table(
            "Requirements",
            &["Requirement", "Rationale"],
            &["Proposition"],
        )],
        reference_fields: Vec::new(),
        link: LinkSpec {
            relation: "implements".to_string(),
            left: LeftScope::Row,
            right: RightPool::Upstream,
        },
        targets: TargetRules {
            words: TargetRule::new(TargetBasis::UpstreamWords, 0.8, 300, 10000),
            rows: TargetRule::new(TargetBasis::UpstreamArtifacts, 2.0, 8, 60),
            edges: TargetRule::new(TargetBasis::UpstreamArtifacts, 2.0, 8, 60),
        },
        pane: PaneSpec {
            required_headings: strings(&["Scope", "Requirements"]),
            required_fields: Vec::new(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CorpusConfig {
    pub id_patterns: Vec<String>,
    pub placeholder_patterns: Vec<String>,
    pub token_dump: TokenDumpConfig,
    pub domains: Vec<DomainProfile>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            id_patterns: vec![DEFAULT_ID_PATTERN.to_string()],
            placeholder_patterns: strings(DEFAULT_PLACEHOLDER_PATTERNS),
            token_dump: TokenDumpConfig::default(),
            domains: vec![
                persona_profile(),
                proposition_profile(),
                requirements_profile(),
            ],
        }
    }
}

/// Partial configuration as written in a TOML override file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverride {
    id_patterns: Option<Vec<String>>,
    placeholder_patterns: Option<Vec<String>>,
    token_dump: Option<TokenDumpConfig>,
    #[serde(default)]
    domains: Vec<DomainProfile>,
}

impl CorpusConfig {
    pub fn domain(&self, name: &str) -> Result<&DomainProfile, CorpusError> {
        self.domains
            .iter()
            .find(|domain| domain.name == name)
            .ok_or_else(|| CorpusError::UnknownDomain {
                name: name.to_string(),
                known: self.domain_names().join(", "),
            })
    }

    pub fn upstream_of(
        &self,
        profile: &DomainProfile,
    ) -> Result<Option<&DomainProfile>, CorpusError> {
        profile
            .upstream
            .as_deref()
            .map(|name| self.domain(name))
            .transpose()
    }

    pub fn domain_names(&self) -> Vec<String> {
        self.domains.iter().map(|domain| domain.name.clone()).collect()
    }

    /// Built-in defaults overlaid with a TOML file. Domains replace the
    /// built-in profile of the same name; new names are appended.
    pub fn load_with_overrides(path: &Path) -> Result<Self, CorpusError> {
        let text = fs::read_to_string(path).map_err(|error| CorpusError::io(path, error))?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, CorpusError> {
        let overrides: ConfigOverride =
            toml::from_str(text).map_err(|error| CorpusError::config(origin, error.to_string()))?;

        let mut config = Self::default();
        if let Some(patterns) = overrides.id_patterns {
            config.id_patterns = patterns;
        }
        if let Some(patterns) = overrides.placeholder_patterns {
            config.placeholder_patterns = patterns;
        }
        if let Some(token_dump) = overrides.token_dump {
            config.token_dump = token_dump;
        }
        for domain in overrides.domains {
            match config.domains.iter_mut().find(|row| row.name == domain.name) {
                Some(existing) => *existing = domain,
                None => config.domains.push(domain),
            }
        }
        config.validate(origin)?;
        Ok(config)
    }

    pub fn validate(&self, origin: &str) -> Result<(), CorpusError> {
        if self.id_patterns.is_empty() {
            return Err(CorpusError::config(origin, "id_patterns must not be empty"));
        }
        if self.token_dump.min_run == 0 || self.token_dump.max_token_len == 0 {
            return Err(CorpusError::config(
                origin,
                "token_dump.min_run and token_dump.max_token_len must be >= 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.token_dump.min_density) {
            return Err(CorpusError::config(
                origin,
                "token_dump.min_density must be within [0, 1]",
            ));
        }

        let mut names = BTreeSet::new();
        for domain in &self.domains {
            if !names.insert(domain.name.as_str()) {
                return Err(CorpusError::config(
                    origin,
                    format!("duplicate domain `{}`", domain.name),
                ));
            }
            if domain.prefix.is_empty()
                || domain.prefix.len() > 6
                || !domain.prefix.chars().all(|ch| ch.is_ascii_uppercase())
            {
                return Err(CorpusError::config(
                    origin,
                    format!(
                        "domain `{}`: prefix must be 1-6 uppercase ASCII letters",
                        domain.name
                    ),
                ));
            }
            for rule in [domain.targets.words, domain.targets.rows, domain.targets.edges] {
                rule.spec.validate().map_err(|error| {
                    CorpusError::config(origin, format!("domain `{}`: {error}", domain.name))
                })?;
            }
            if domain.link.right == RightPool::Upstream && domain.upstream.is_none() {
                return Err(CorpusError::config(
                    origin,
                    format!(
                        "domain `{}`: upstream link requires an upstream domain",
                        domain.name
                    ),
                ));
            }
        }

        for domain in &self.domains {
            let mut seen = BTreeSet::from([domain.name.as_str()]);
            let mut cursor = domain.upstream.as_deref();
            while let Some(name) = cursor {
                let Some(next) = self.domains.iter().find(|row| row.name == name) else {
                    return Err(CorpusError::config(
                        origin,
                        format!("domain `{}`: unknown upstream `{name}`", domain.name),
                    ));
                };
                if !seen.insert(next.name.as_str()) {
                    return Err(CorpusError::config(
                        origin,
                        format!("domain `{}`: upstream cycle through `{name}`", domain.name),
                    ));
                }
                cursor = next.upstream.as_deref();
            }
        }
        Ok(())
    }
}
