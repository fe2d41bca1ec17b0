//! Citation completeness checks.
//!
//! Every generated item is a claim. A claim with no citations yields one
//! [`Verdict::MissingCitations`] finding; cited claims yield nothing. The
//! other verdicts exist in the pack format but are never produced here.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::models::{Claim, DocumentPack, Verdict};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub missing_citations: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub claims: Vec<Claim>,
    pub summary: ValidationSummary,
}

/// Findings for every item of every populated artifact family.
pub fn validate(pack: &DocumentPack) -> ValidationReport {
    let claims: Vec<Claim> = pack
        .artifacts
        .claim_refs()
        .into_iter()
        .filter(|r| r.citations.is_empty())
        .map(|r| Claim {
            id: r.id,
            verdict: Verdict::MissingCitations,
            message: format!("Missing citations ({}).", r.family),
            citations: None,
        })
        .collect();

    let missing_citations = claims
        .iter()
        .filter(|c| c.verdict == Verdict::MissingCitations)
        .count();
    ValidationReport {
        summary: ValidationSummary {
            total: claims.len(),
            missing_citations,
        },
        claims,
    }
}

/// When `validate --fail-on` turns findings into a failing exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPolicy {
    /// Any finding at all.
    ErrorOnAny,
    /// Any finding with this verdict.
    ErrorOnVerdict(Verdict),
}

impl Default for FailPolicy {
    fn default() -> Self {
        FailPolicy::ErrorOnVerdict(Verdict::MissingCitations)
    }
}

impl FailPolicy {
    pub fn should_fail(&self, report: &ValidationReport) -> bool {
        match self {
            FailPolicy::ErrorOnAny => !report.claims.is_empty(),
            FailPolicy::ErrorOnVerdict(verdict) => {
                report.claims.iter().any(|c| c.verdict == *verdict)
            }
        }
    }
}

impl FromStr for FailPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(FailPolicy::ErrorOnAny),
            other => other.parse::<Verdict>().map(FailPolicy::ErrorOnVerdict),
        }
    }
}

impl fmt::Display for FailPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailPolicy::ErrorOnAny => f.write_str("error"),
            FailPolicy::ErrorOnVerdict(verdict) => write!(f, "{}", verdict),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{fixtures, generate_all};
    use crate::models::{Outline, OutlineNode};

    #[test]
    fn fully_cited_pack_has_no_findings() {
        let mut pack = fixtures::sectioned(&[
            ("intro", "Intro", "Welcome. Read on."),
            ("steps", "Steps", "1. Stop the service\n2. Start it"),
        ]);
        generate_all(&mut pack);
        let report = validate(&pack);
        assert_eq!(report.summary.total, 0);
        assert!(!FailPolicy::default().should_fail(&report));
        assert!(!FailPolicy::ErrorOnAny.should_fail(&report));
    }

    #[test]
    fn empty_pages_are_reported_per_family() {
        let mut pack = fixtures::paged(&["Some text.", ""]);
        generate_all(&mut pack);
        let report = validate(&pack);
        let ids: Vec<_> = report.claims.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["outline_page_2", "pages_table_row_1", "qa_page_2"]);
        assert_eq!(report.claims[0].message, "Missing citations (outline).");
        assert_eq!(report.summary.missing_citations, 3);
    }

    #[test]
    fn claim_ids_are_unique_across_families() {
        let mut pack = fixtures::sectioned(&[("intro", "Intro", ""), ("steps", "Steps", "")]);
        generate_all(&mut pack);
        let report = validate(&pack);
        let ids: Vec<_> = report.claims.iter().map(|c| c.id.as_str()).collect();
        assert!(ids.contains(&"outline_intro"), "{:?}", ids);
        assert!(ids.contains(&"flow_intro"), "{:?}", ids);
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len(), "{:?}", ids);
    }

    #[test]
    fn unpopulated_families_are_skipped() {
        let mut pack = fixtures::paged(&[""]);
        pack.artifacts.outline = Some(Outline {
            nodes: vec![OutlineNode {
                id: "n".into(),
                title: "N".into(),
                citations: vec![],
            }],
        });
        let report = validate(&pack);
        assert_eq!(report.claims.len(), 1);
        assert_eq!(report.claims[0].verdict, Verdict::MissingCitations);
    }

    #[test]
    fn fail_policy_parsing_and_triggering() {
        assert_eq!("error".parse::<FailPolicy>().unwrap(), FailPolicy::ErrorOnAny);
        assert_eq!(
            "unclear".parse::<FailPolicy>().unwrap(),
            FailPolicy::ErrorOnVerdict(Verdict::Unclear)
        );
        assert!("nope".parse::<FailPolicy>().is_err());

        let report = ValidationReport {
            claims: vec![Claim {
                id: "x".into(),
                verdict: Verdict::MissingCitations,
                message: String::new(),
                citations: None,
            }],
            summary: ValidationSummary {
                total: 1,
                missing_citations: 1,
            },
        };
        assert!(FailPolicy::ErrorOnAny.should_fail(&report));
        assert!(FailPolicy::default().should_fail(&report));
        assert!(!FailPolicy::ErrorOnVerdict(Verdict::Unsupported).should_fail(&report));
    }
}
