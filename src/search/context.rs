/// Clinical-context scoring for candidate re-ranking
///
/// The context score is an additive sum of independent, fixed-weight rules
/// measuring overlap between the structured CaseProfile and one candidate's
/// payload. Each rule is a pure function over a pre-extracted CandidateText
/// view, registered in a declarative table so the rule set stays auditable
/// and independently testable.
///
/// Contributions: sex match +0.1, age within 5y +0.1 (within 10y +0.05),
/// primary-diagnosis substring +0.3, chief-complaint token overlap up to
/// +0.2, and +0.1 per confirmed finding keyword (consolidation, edema,
/// effusion). Practical ceiling is 0.6; theoretical maximum 1.0.
///
/// All scoring is total: missing or malformed fields (non-numeric age,
/// absent payload sections) contribute zero and never raise.

use serde_json::Value;

use crate::profile::{flag_is_yes, CaseProfile};

/// Flattened view of one candidate payload, extracted once per candidate
/// so every rule works over the same text.
#[derive(Debug, Clone)]
pub struct CandidateText {
    /// Lowercased payload gender field ("" when absent)
    pub gender: String,
    /// Payload age, if present and numeric (numeric strings accepted)
    pub age: Option<f64>,
    /// Lowercased concatenation of diagnosis + summary + case_text
    pub case_desc: String,
}

/// One named re-ranking rule. `apply` returns the rule's full contribution
/// (already weighted), so capped rules like chief-complaint overlap fit the
/// same shape as fixed-weight ones.
pub struct ContextRule {
    pub name: &'static str,
    pub apply: fn(&CandidateText, &CaseProfile) -> f64,
}

/// The full rule set, evaluated in order and summed.
pub const CONTEXT_RULES: &[ContextRule] = &[
    ContextRule {
        name: "sex_match",
        apply: sex_match,
    },
    ContextRule {
        name: "age_closeness",
        apply: age_closeness,
    },
    ContextRule {
        name: "diagnosis_substring",
        apply: diagnosis_substring,
    },
    ContextRule {
        name: "chief_complaint_overlap",
        apply: chief_complaint_overlap,
    },
    ContextRule {
        name: "finding_consolidation",
        apply: |c, p| finding_keyword(c, flag_is_yes(p.findings.lungs.consolidation_present), "consolidation"),
    },
    ContextRule {
        name: "finding_edema",
        apply: |c, p| finding_keyword(c, flag_is_yes(p.findings.lungs.edema_present), "edema"),
    },
    ContextRule {
        name: "finding_effusion",
        apply: |c, p| finding_keyword(c, flag_is_yes(p.findings.pleura.effusion_present), "effusion"),
    },
];

/// Compute the context score for one candidate payload.
///
/// Returns 0.0 when no profile was supplied.
pub fn score_context(payload: &Value, profile: Option<&CaseProfile>) -> f64 {
    let Some(profile) = profile else {
        return 0.0;
    };
    let text = CandidateText::from_payload(payload);
    CONTEXT_RULES
        .iter()
        .map(|rule| (rule.apply)(&text, profile))
        .sum()
}

impl CandidateText {
    pub fn from_payload(payload: &Value) -> Self {
        let case_desc = format!(
            "{} {} {}",
            value_text(payload.get("diagnosis")),
            value_text(payload.get("summary")),
            value_text(payload.get("case_text")),
        )
        .to_lowercase();

        CandidateText {
            gender: value_text(payload.get("gender")).to_lowercase(),
            age: payload.get("age").and_then(value_number),
            case_desc,
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// +0.1 when the first letters of profile sex and payload gender agree
/// (so "F" matches "female").
fn sex_match(candidate: &CandidateText, profile: &CaseProfile) -> f64 {
    let Some(sex) = profile.patient.sex.as_deref() else {
        return 0.0;
    };
    let p_initial = sex.to_lowercase().chars().next();
    let c_initial = candidate.gender.chars().next();
    match (p_initial, c_initial) {
        (Some(p), Some(c)) if p == c => 0.1,
        _ => 0.0,
    }
}

/// +0.1 when ages are within 5 years, +0.05 within 10.
fn age_closeness(candidate: &CandidateText, profile: &CaseProfile) -> f64 {
    let (Some(p_age), Some(c_age)) = (profile.patient.age_years, candidate.age) else {
        return 0.0;
    };
    let diff = (p_age - c_age).abs();
    if diff <= 5.0 {
        0.1
    } else if diff <= 10.0 {
        0.05
    } else {
        0.0
    }
}

/// +0.3 when the lowercased primary diagnosis occurs as a substring of the
/// candidate's descriptive text.
fn diagnosis_substring(candidate: &CandidateText, profile: &CaseProfile) -> f64 {
    match profile.assessment.diagnosis_primary.as_deref() {
        Some(diag) if !diag.is_empty() && candidate.case_desc.contains(&diag.to_lowercase()) => 0.3,
        _ => 0.0,
    }
}

/// +0.05 per distinct chief-complaint token (longer than 3 chars) found in
/// the candidate text, capped at +0.2.
fn chief_complaint_overlap(candidate: &CandidateText, profile: &CaseProfile) -> f64 {
    let Some(cc) = profile.presentation.chief_complaint.as_deref() else {
        return 0.0;
    };
    let lowered = cc.to_lowercase().replace(',', "");
    let mut words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|w| w.len() > 3)
        .collect();
    words.sort_unstable();
    words.dedup();

    let match_count = words
        .iter()
        .filter(|w| candidate.case_desc.contains(*w))
        .count();
    (match_count as f64 * 0.05).min(0.2)
}

/// +0.1 when the profile asserts a finding and its keyword appears in the
/// candidate text.
fn finding_keyword(candidate: &CandidateText, asserted: bool, keyword: &str) -> f64 {
    if asserted && candidate.case_desc.contains(keyword) {
        0.1
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Payload helpers
// ---------------------------------------------------------------------------

/// Render a loosely-typed payload value as text. Strings pass through;
/// nested objects are rendered as JSON so substring rules still see their
/// inner text; null and missing become empty.
fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Accept numbers and numeric strings; anything else is skipped.
fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
