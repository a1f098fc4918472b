/// Mapping ranked candidates to the external match schema
///
/// Candidate payloads come in two generations: the current nested schema
/// (assessment/summary/provenance/patient/study sections) and a legacy flat
/// one (top-level diagnosis/summary/case_text/hospital). Every output field
/// resolves through a prioritized fallback chain — structured field first,
/// then legacy field, then a default — via one shared dot-path lookup, so a
/// malformed payload degrades that candidate's display fields and never
/// aborts the batch.
///
/// The displayed `score` is the RAW visual similarity percentage, not the
/// fused ranking key: fusion decides the position in the list, the
/// percentage reflects visual similarity alone.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fusion::ScoredCandidate;

/// Externally-shaped match record, serialized to the frontend as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchItem {
    /// Integer percentage of the raw visual score
    pub score: i64,
    pub diagnosis: String,
    pub summary: String,
    pub facility: String,
    pub outcome: String,
    #[serde(rename = "outcomeVariant")]
    pub outcome_variant: String,
    pub image_url: String,
    pub age: Option<Value>,
    pub gender: Option<String>,
    pub pmc_id: Option<String>,
    pub article_title: Option<String>,
    pub journal: Option<String>,
    pub year: Option<Value>,
    pub radiology_view: String,
    pub case_text: String,
}

/// Map one ranked candidate to its display record.
pub fn to_match(scored: &ScoredCandidate) -> MatchItem {
    let payload = scored.payload();
    let raw = scored.raw_score();

    let diagnosis = resolve_str(
        payload,
        &[
            "assessment.diagnosis_primary",
            "diagnosis",
            "provenance.article_title",
        ],
    )
    .map(|d| truncate_chars(&d, 80))
    .unwrap_or_else(|| "Unknown".to_string());

    let case_text = resolve_str(payload, &["presentation.hpi", "case_text"]).unwrap_or_default();
    let summary = resolve_summary(payload, &case_text);
    let (outcome, outcome_variant) = resolve_outcome(payload, raw);

    MatchItem {
        score: (raw * 100.0).round() as i64,
        diagnosis,
        summary,
        facility: resolve_str(payload, &["provenance.dataset_name", "hospital"])
            .unwrap_or_else(|| "Unknown".to_string()),
        outcome,
        outcome_variant,
        image_url: resolve_str(payload, &["image_url"]).unwrap_or_default(),
        age: resolve(payload, &["patient.age_years"]).cloned(),
        gender: resolve_str(payload, &["patient.sex"]),
        pmc_id: resolve_str(payload, &["provenance.pmc_id"]),
        article_title: resolve_str(payload, &["provenance.article_title"]),
        journal: resolve_str(payload, &["provenance.journal"]),
        year: resolve(payload, &["provenance.year"]).cloned(),
        radiology_view: resolve_str(payload, &["study.view_position"])
            .unwrap_or_else(|| "Frontal".to_string()),
        case_text,
    }
}

/// Summary chain: structured one-liner (or legacy flat string) → truncated
/// case text → fixed default.
fn resolve_summary(payload: &Value, case_text: &str) -> String {
    let structured = match resolve(payload, &["summary"]) {
        Some(Value::Object(obj)) => obj
            .get("one_liner")
            .and_then(Value::as_str)
            .map(str::to_string),
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
    .filter(|s| !s.is_empty());

    if let Some(summary) = structured {
        return summary;
    }
    if !case_text.is_empty() {
        return if case_text.chars().count() > 120 {
            format!("{}…", truncate_chars(case_text, 120))
        } else {
            case_text.to_string()
        };
    }
    "No case summary available.".to_string()
}

/// Outcome label and variant.
///
/// Base rule: outcome.success "yes" → Favorable/success, "no" →
/// Unfavorable/neutral, otherwise the capitalized view position (default
/// "Frontal") with warning above raw 0.6. The score-tier override is applied
/// AFTER the base rule and always wins: raw ≥ 0.8 forces "success", raw ≥
/// 0.6 forces "warning". Order matters and is relied on by the frontend.
fn resolve_outcome(payload: &Value, raw_score: f64) -> (String, String) {
    let success = resolve_str(payload, &["outcome.success"]);
    let (label, mut variant) = match success.as_deref() {
        Some("yes") => ("Favorable".to_string(), "success".to_string()),
        Some("no") => ("Unfavorable".to_string(), "neutral".to_string()),
        _ => {
            let view = resolve_str(payload, &["study.view_position"])
                .unwrap_or_else(|| "Frontal".to_string());
            let variant = if raw_score >= 0.6 { "warning" } else { "neutral" };
            (capitalize(&view), variant.to_string())
        }
    };

    if raw_score >= 0.8 {
        variant = "success".to_string();
    } else if raw_score >= 0.6 {
        variant = "warning".to_string();
    }
    (label, variant)
}

// ---------------------------------------------------------------------------
// Prioritized payload lookup
// ---------------------------------------------------------------------------

/// Walk dot-separated paths left to right and return the first present,
/// non-null value.
pub fn resolve<'a>(payload: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths.iter().find_map(|path| {
        let mut current = payload;
        for key in path.split('.') {
            current = current.get(key)?;
        }
        if current.is_null() {
            None
        } else {
            Some(current)
        }
    })
}

/// Like `resolve`, but only accepts non-empty string values.
pub fn resolve_str(payload: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| {
        let mut current = payload;
        for key in path.split('.') {
            current = current.get(key)?;
        }
        match current.as_str() {
            Some(s) if !s.is_empty() => Some(s.to_string()),
            _ => None,
        }
    })
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// First letter uppercased, remainder lowercased ("PA" → "Pa").
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CandidateRecord;
    use serde_json::json;

    fn scored(raw: f64, payload: Value) -> ScoredCandidate {
        ScoredCandidate {
            candidate: CandidateRecord {
                id: "test".to_string(),
                score: raw,
                payload,
            },
            visual_score: 1.0,
            context_score: 0.0,
            fused_score: 1.0,
        }
    }

    #[test]
    fn test_score_uses_raw_not_normalized() {
        // visual_score is 1.0 here but the displayed percentage must come
        // from the raw store score
        let item = to_match(&scored(0.81, json!({})));
        assert_eq!(item.score, 81);
    }

    #[test]
    fn test_diagnosis_prefers_structured() {
        let item = to_match(&scored(0.5, json!({
            "assessment": {"diagnosis_primary": "scimitar syndrome"},
            "diagnosis": "legacy label"
        })));
        assert_eq!(item.diagnosis, "scimitar syndrome");
    }

    #[test]
    fn test_diagnosis_legacy_fallback() {
        let item = to_match(&scored(0.5, json!({"diagnosis": "pleural effusion"})));
        assert_eq!(item.diagnosis, "pleural effusion");
    }

    #[test]
    fn test_diagnosis_article_title_fallback() {
        let item = to_match(&scored(0.5, json!({
            "provenance": {"article_title": "A rare presentation of scimitar syndrome"}
        })));
        assert_eq!(item.diagnosis, "A rare presentation of scimitar syndrome");
    }

    #[test]
    fn test_diagnosis_default_and_truncation() {
        let item = to_match(&scored(0.5, json!({})));
        assert_eq!(item.diagnosis, "Unknown");

        let long = "x".repeat(200);
        let item = to_match(&scored(0.5, json!({"diagnosis": long})));
        assert_eq!(item.diagnosis.chars().count(), 80);
    }

    #[test]
    fn test_summary_one_liner_wins() {
        let item = to_match(&scored(0.5, json!({
            "summary": {"one_liner": "58F with CAP."},
            "case_text": "a much longer narrative"
        })));
        assert_eq!(item.summary, "58F with CAP.");
    }

    #[test]
    fn test_summary_legacy_string() {
        let item = to_match(&scored(0.5, json!({"summary": "flat summary text"})));
        assert_eq!(item.summary, "flat summary text");
    }

    #[test]
    fn test_summary_truncates_case_text_with_ellipsis() {
        let long = "w".repeat(150);
        let item = to_match(&scored(0.5, json!({"case_text": long})));
        assert_eq!(item.summary.chars().count(), 121);
        assert!(item.summary.ends_with('…'));
    }

    #[test]
    fn test_summary_short_case_text_untouched() {
        let item = to_match(&scored(0.5, json!({"case_text": "brief note"})));
        assert_eq!(item.summary, "brief note");
    }

    #[test]
    fn test_summary_default() {
        let item = to_match(&scored(0.5, json!({})));
        assert_eq!(item.summary, "No case summary available.");
    }

    #[test]
    fn test_outcome_favorable_no_override_below_threshold() {
        // 0.5 is below both override thresholds, so the base rule's
        // variant survives
        let item = to_match(&scored(0.5, json!({"outcome": {"success": "yes"}})));
        assert_eq!(item.outcome, "Favorable");
        assert_eq!(item.outcome_variant, "success");
    }

    #[test]
    fn test_outcome_unfavorable() {
        let item = to_match(&scored(0.5, json!({"outcome": {"success": "no"}})));
        assert_eq!(item.outcome, "Unfavorable");
        assert_eq!(item.outcome_variant, "neutral");
    }

    #[test]
    fn test_outcome_view_position_label() {
        let item = to_match(&scored(0.5, json!({"study": {"view_position": "PA"}})));
        assert_eq!(item.outcome, "Pa");
        assert_eq!(item.outcome_variant, "neutral");
    }

    #[test]
    fn test_outcome_warning_tier_without_success_field() {
        let item = to_match(&scored(0.65, json!({})));
        assert_eq!(item.outcome, "Frontal");
        assert_eq!(item.outcome_variant, "warning");
    }

    #[test]
    fn test_variant_override_success_always_wins() {
        // raw >= 0.8 forces "success" even when outcome.success = "no"
        let item = to_match(&scored(0.85, json!({"outcome": {"success": "no"}})));
        assert_eq!(item.outcome, "Unfavorable");
        assert_eq!(item.outcome_variant, "success");
    }

    #[test]
    fn test_variant_override_warning_tier() {
        let item = to_match(&scored(0.7, json!({"outcome": {"success": "no"}})));
        assert_eq!(item.outcome, "Unfavorable");
        assert_eq!(item.outcome_variant, "warning");
    }

    #[test]
    fn test_facility_chain() {
        let item = to_match(&scored(0.5, json!({
            "provenance": {"dataset_name": "PMC Open Access"},
            "hospital": "General Hospital"
        })));
        assert_eq!(item.facility, "PMC Open Access");

        let item = to_match(&scored(0.5, json!({"hospital": "General Hospital"})));
        assert_eq!(item.facility, "General Hospital");

        let item = to_match(&scored(0.5, json!({})));
        assert_eq!(item.facility, "Unknown");
    }

    #[test]
    fn test_passthrough_fields() {
        let item = to_match(&scored(0.5, json!({
            "patient": {"age_years": 58, "sex": "female"},
            "provenance": {
                "pmc_id": "PMC10034413",
                "article_title": "Case report",
                "journal": "Radiology Cases",
                "year": 2023
            },
            "study": {"view_position": "AP"},
            "presentation": {"hpi": "Two weeks of cough."},
            "image_url": "https://example.org/img.webp"
        })));
        assert_eq!(item.age, Some(json!(58)));
        assert_eq!(item.gender.as_deref(), Some("female"));
        assert_eq!(item.pmc_id.as_deref(), Some("PMC10034413"));
        assert_eq!(item.journal.as_deref(), Some("Radiology Cases"));
        assert_eq!(item.year, Some(json!(2023)));
        assert_eq!(item.radiology_view, "AP");
        assert_eq!(item.case_text, "Two weeks of cough.");
        assert_eq!(item.image_url, "https://example.org/img.webp");
    }

    #[test]
    fn test_case_text_prefers_hpi() {
        let item = to_match(&scored(0.5, json!({
            "presentation": {"hpi": "structured narrative"},
            "case_text": "legacy narrative"
        })));
        assert_eq!(item.case_text, "structured narrative");
    }

    #[test]
    fn test_outcome_variant_serializes_camel_case() {
        let item = to_match(&scored(0.9, json!({})));
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["outcomeVariant"], "success");
        assert!(v.get("outcome_variant").is_none());
    }

    #[test]
    fn test_resolve_skips_null() {
        let payload = json!({"diagnosis": null, "provenance": {"article_title": "Title"}});
        assert_eq!(
            resolve_str(&payload, &["diagnosis", "provenance.article_title"]).as_deref(),
            Some("Title")
        );
    }
}
