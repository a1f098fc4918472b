/// Deterministic regex-based CaseProfile extraction from clinical notes
///
/// Builds a structured profile from free-text notes without any LLM call:
/// keyword tables for comorbidities and diagnoses, anchored patterns for
/// demographics and the chief complaint, and finding flags from radiology
/// vocabulary. All patterns are matched case-insensitively. Extraction is
/// total — unrecognized notes simply leave fields unset.

use regex::Regex;
use uuid::Uuid;

use crate::profile::{CaseProfile, Flag};

/// Comorbidity keyword table: (pattern, canonical label).
const COMORBIDITY_PATTERNS: &[(&str, &str)] = &[
    (r"(?i)hypertension|HTN", "hypertension"),
    (r"(?i)type 2 diabet|T2DM|DM2", "type 2 diabetes"),
    (r"(?i)type 1 diabet|T1DM|DM1", "type 1 diabetes"),
    (r"(?i)atrial fibrillation|AF\b|AFib", "atrial fibrillation"),
    (r"(?i)heart failure|CHF", "heart failure"),
    (r"(?i)COPD|chronic obstructive", "COPD"),
    (r"(?i)asthma", "asthma"),
    (r"(?i)cirrhosis|liver cirrhosis", "liver cirrhosis"),
    (r"(?i)hepatocellular carcinoma|HCC", "hepatocellular carcinoma"),
    (r"(?i)chronic kidney|CKD", "chronic kidney disease"),
    (r"(?i)coronary artery disease|CAD", "coronary artery disease"),
    (r"(?i)obesity", "obesity"),
];

/// Primary diagnosis keyword table, first match wins.
const DIAGNOSIS_PATTERNS: &[(&str, &str)] = &[
    (r"(?i)scimitar", "scimitar syndrome"),
    (r"(?i)pneumonia", "community-acquired pneumonia"),
    (r"(?i)pulmonary embolism|PE\b", "pulmonary embolism"),
    (r"(?i)lung malignancy|lung cancer|NSCLC|SCLC", "lung malignancy"),
    (r"(?i)stroke|ischemic", "acute ischemic stroke"),
    (r"(?i)heart failure|pulmonary edema", "heart failure"),
    (r"(?i)pneumothorax", "pneumothorax"),
    (r"(?i)pleural effusion", "pleural effusion"),
    (r"(?i)aortic dissection", "aortic dissection"),
];

/// Extract a structured CaseProfile from free-text clinical notes.
pub fn extract_profile(notes: &str) -> CaseProfile {
    let mut profile = CaseProfile::default();

    let case_id = Uuid::new_v4().to_string();
    let image_id = Uuid::new_v4().to_string();
    profile.profile_id = Some(format!("{}:{}", case_id, image_id));
    profile.case_id = Some(case_id);
    profile.image_id = Some(image_id);

    extract_patient(&mut profile, notes);
    extract_presentation(&mut profile, notes);
    extract_study(&mut profile, notes);
    extract_assessment(&mut profile, notes);
    extract_findings(&mut profile, notes);
    compose_summary(&mut profile);

    profile
}

fn matches(pattern: &str, text: &str) -> bool {
    Regex::new(pattern)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

fn capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn extract_patient(profile: &mut CaseProfile, notes: &str) {
    if let Some(age) = capture(r"(?i)(\d{1,3})\s*[- ]?(?:year|yr)s?[- ]?old", notes) {
        profile.patient.age_years = age.parse::<f64>().ok();
    }

    if matches(r"(?i)\bfemale\b|\bwoman\b", notes) {
        profile.patient.sex = Some("female".to_string());
    } else if matches(r"(?i)\bmale\b|\bman\b", notes) {
        profile.patient.sex = Some("male".to_string());
    }

    if matches(r"(?i)immunocompromised|immunosuppressed", notes) {
        profile.patient.immunocompromised = Some(Flag::Yes);
    } else if !notes.trim().is_empty() {
        profile.patient.immunocompromised = Some(Flag::No);
    }

    profile.patient.comorbidities = COMORBIDITY_PATTERNS
        .iter()
        .filter(|(pattern, _)| matches(pattern, notes))
        .map(|(_, label)| label.to_string())
        .collect();

    if matches(r"(?i)no known allerg", notes) {
        profile.patient.allergies = Some("no known allergies".to_string());
    }
}

fn extract_presentation(profile: &mut CaseProfile, notes: &str) {
    profile.presentation.chief_complaint = capture(
        r"(?i)(?:present(?:ing)? with|complaint of|admitted for|scheduled for)\s+([^.!?\n]{5,120})",
        notes,
    );

    profile.presentation.symptom_duration = capture(
        r"(?i)(?:for|over|duration of)\s+((?:\d+\s*)?(?:day|week|month|year)s?)",
        notes,
    );

    if notes.len() > 40 {
        profile.presentation.hpi = Some(notes.chars().take(600).collect());
    }

    if !profile.patient.comorbidities.is_empty() {
        profile.presentation.pmh = Some(profile.patient.comorbidities.join(", "));
    }
}

fn extract_study(profile: &mut CaseProfile, notes: &str) {
    let study = &mut profile.study;
    if matches(r"(?i)\bct\b|computed tomography", notes) {
        study.modality = Some("CT".to_string());
        study.image_type = Some("radiology".to_string());
        study.image_subtype = Some("ct".to_string());
    } else if matches(r"(?i)\bmri\b", notes) {
        study.modality = Some("MRI".to_string());
        study.image_type = Some("radiology".to_string());
        study.image_subtype = Some("mri".to_string());
    } else if matches(r"(?i)x[- ]?ray|cxr|chest x", notes) {
        study.modality = Some("CXR".to_string());
        study.image_type = Some("radiology".to_string());
        study.image_subtype = Some("x_ray".to_string());
    }

    if matches(r"(?i)thorax|chest|pulmonary|lung", notes) {
        study.body_region = Some("thorax".to_string());
    } else if matches(r"(?i)abdomen|abdominal|liver", notes) {
        study.body_region = Some("abdomen".to_string());
    } else if matches(r"(?i)brain|head|neuro", notes) {
        study.body_region = Some("head".to_string());
    }

    if matches(r"(?i)\bPA\b|posteroanterior", notes) {
        study.view_position = Some("PA".to_string());
    } else if matches(r"(?i)\bAP\b|anteroposterior", notes) {
        study.view_position = Some("AP".to_string());
    }
}

fn extract_assessment(profile: &mut CaseProfile, notes: &str) {
    for (pattern, diagnosis) in DIAGNOSIS_PATTERNS {
        if matches(pattern, notes) {
            profile.assessment.diagnosis_primary = Some(diagnosis.to_string());
            let mut suspected = vec![diagnosis.to_string()];
            suspected.extend(profile.patient.comorbidities.iter().take(2).cloned());
            profile.assessment.suspected_primary = suspected;
            break;
        }
    }

    if matches(r"(?i)urgent|emergency|stat", notes) {
        profile.assessment.urgency = Some("emergent".to_string());
    } else if matches(r"(?i)routine|elective|scheduled", notes) {
        profile.assessment.urgency = Some("routine".to_string());
    } else if !notes.trim().is_empty() {
        profile.assessment.urgency = Some("semi-urgent".to_string());
    }

    profile.assessment.infectious_concern =
        Some(if matches(r"(?i)infection|sepsis|pneumonia|fever", notes) {
            Flag::Yes
        } else {
            Flag::No
        });
    profile.assessment.icu_candidate =
        Some(if matches(r"(?i)icu|intensive care|critical", notes) {
            Flag::Yes
        } else {
            Flag::No
        });
}

fn extract_findings(profile: &mut CaseProfile, notes: &str) {
    let yes_no = |hit: bool| Some(if hit { Flag::Yes } else { Flag::No });

    let lungs = &mut profile.findings.lungs;
    lungs.consolidation_present = yes_no(matches(r"(?i)consolidat", notes));
    lungs.atelectasis_present = yes_no(matches(r"(?i)atelectasis|collapse", notes));
    lungs.edema_present = yes_no(matches(r"(?i)edema", notes));

    let pleura = &mut profile.findings.pleura;
    pleura.effusion_present = yes_no(matches(r"(?i)effusion|pleural fluid", notes));
    pleura.pneumothorax_present = yes_no(matches(r"(?i)pneumothorax", notes));

    profile.findings.cardiomediastinal.cardiomegaly =
        yes_no(matches(r"(?i)cardiomegaly|enlarged heart", notes));
}

/// Compose the one-liner only when enough identifying fields are present.
fn compose_summary(profile: &mut CaseProfile) {
    let age = profile.patient.age_years;
    let sex = profile.patient.sex.clone();
    let diagnosis = profile.assessment.diagnosis_primary.clone();
    let complaint = profile.presentation.chief_complaint.clone();

    if let (Some(age), Some(sex)) = (age, sex) {
        if diagnosis.is_some() || complaint.is_some() {
            let comorbs = if profile.patient.comorbidities.is_empty() {
                "multiple comorbidities".to_string()
            } else {
                profile
                    .patient
                    .comorbidities
                    .iter()
                    .take(3)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let presenting = complaint.or(diagnosis.clone()).unwrap_or_default();
            profile.summary.one_liner = Some(format!(
                "{}-year-old {} with {} presenting with {}.",
                age as i64, sex, comorbs, presenting
            ));
        }
    }

    if let Some(diag) = diagnosis {
        profile.summary.key_points = vec![format!("Primary finding: {}", diag)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::flag_is_yes;

    const NOTES: &str = "62-year-old woman with hypertension and COPD presenting with \
        productive cough and fever for 5 days. Chest X-ray shows dense consolidation \
        in the right lower lobe with a small pleural effusion. Concern for pneumonia. \
        No known allergies.";

    #[test]
    fn test_demographics() {
        let profile = extract_profile(NOTES);
        assert_eq!(profile.patient.age_years, Some(62.0));
        assert_eq!(profile.patient.sex.as_deref(), Some("female"));
        assert_eq!(
            profile.patient.allergies.as_deref(),
            Some("no known allergies")
        );
    }

    #[test]
    fn test_comorbidities() {
        let profile = extract_profile(NOTES);
        assert_eq!(
            profile.patient.comorbidities,
            vec!["hypertension".to_string(), "COPD".to_string()]
        );
        assert_eq!(
            profile.presentation.pmh.as_deref(),
            Some("hypertension, COPD")
        );
    }

    #[test]
    fn test_chief_complaint_and_duration() {
        let profile = extract_profile(NOTES);
        assert_eq!(
            profile.presentation.chief_complaint.as_deref(),
            Some("productive cough and fever for 5 days")
        );
        assert_eq!(profile.presentation.symptom_duration.as_deref(), Some("5 days"));
    }

    #[test]
    fn test_study_fields() {
        let profile = extract_profile(NOTES);
        assert_eq!(profile.study.modality.as_deref(), Some("CXR"));
        assert_eq!(profile.study.image_subtype.as_deref(), Some("x_ray"));
        assert_eq!(profile.study.body_region.as_deref(), Some("thorax"));
    }

    #[test]
    fn test_diagnosis_and_suspected() {
        let profile = extract_profile(NOTES);
        assert_eq!(
            profile.assessment.diagnosis_primary.as_deref(),
            Some("community-acquired pneumonia")
        );
        assert_eq!(
            profile.assessment.suspected_primary,
            vec![
                "community-acquired pneumonia".to_string(),
                "hypertension".to_string(),
                "COPD".to_string()
            ]
        );
        assert!(flag_is_yes(profile.assessment.infectious_concern));
    }

    #[test]
    fn test_finding_flags() {
        let profile = extract_profile(NOTES);
        assert!(flag_is_yes(profile.findings.lungs.consolidation_present));
        assert!(flag_is_yes(profile.findings.pleura.effusion_present));
        assert!(!flag_is_yes(profile.findings.lungs.edema_present));
        assert!(!flag_is_yes(profile.findings.pleura.pneumothorax_present));
    }

    #[test]
    fn test_one_liner_composed() {
        let profile = extract_profile(NOTES);
        let one_liner = profile.summary.one_liner.unwrap();
        assert_eq!(
            one_liner,
            "62-year-old female with hypertension, COPD presenting with \
             productive cough and fever for 5 days."
        );
        assert_eq!(
            profile.summary.key_points,
            vec!["Primary finding: community-acquired pneumonia".to_string()]
        );
    }

    #[test]
    fn test_view_position() {
        let profile = extract_profile("Chest X-ray, PA view, unremarkable.");
        assert_eq!(profile.study.view_position.as_deref(), Some("PA"));
    }

    #[test]
    fn test_urgency_tiers() {
        assert_eq!(
            extract_profile("STAT portable chest film requested.")
                .assessment
                .urgency
                .as_deref(),
            Some("emergent")
        );
        assert_eq!(
            extract_profile("Routine follow-up chest x-ray.")
                .assessment
                .urgency
                .as_deref(),
            Some("routine")
        );
        assert_eq!(
            extract_profile("Mild shortness of breath.")
                .assessment
                .urgency
                .as_deref(),
            Some("semi-urgent")
        );
    }

    #[test]
    fn test_empty_notes_leave_fields_unset() {
        let profile = extract_profile("");
        assert!(profile.patient.age_years.is_none());
        assert!(profile.patient.sex.is_none());
        assert!(profile.patient.immunocompromised.is_none());
        assert!(profile.assessment.urgency.is_none());
        assert!(profile.summary.one_liner.is_none());
        // Identifiers are always generated
        assert!(profile.case_id.is_some());
        let pid = profile.profile_id.unwrap();
        assert!(pid.contains(':'));
    }

    #[test]
    fn test_short_notes_skip_hpi() {
        let profile = extract_profile("Cough, 3 days.");
        assert!(profile.presentation.hpi.is_none());
    }

    #[test]
    fn test_hpi_truncated_to_600_chars() {
        let long_notes = "chest pain ".repeat(100);
        let profile = extract_profile(&long_notes);
        assert_eq!(profile.presentation.hpi.unwrap().chars().count(), 600);
    }
}
