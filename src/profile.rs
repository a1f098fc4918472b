/// Structured clinical case profile
///
/// The typed form of the CaseProfile the frontend sends alongside a query
/// image, and the output shape of the notes extractor. Every clinical field
/// is optional — a profile assembled from sparse notes is still valid, and
/// the context scorer treats any missing field as a zero contribution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Yes/no finding flag, serialized as lowercase "yes"/"no".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    Yes,
    No,
}

impl Flag {
    pub fn is_yes(self) -> bool {
        self == Flag::Yes
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Yes => write!(f, "yes"),
            Flag::No => write!(f, "no"),
        }
    }
}

/// Returns true only when an optional flag is explicitly "yes".
pub fn flag_is_yes(flag: Option<Flag>) -> bool {
    flag.map(Flag::is_yes).unwrap_or(false)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseProfile {
    pub profile_id: Option<String>,
    pub case_id: Option<String>,
    pub image_id: Option<String>,
    pub patient: Patient,
    pub presentation: Presentation,
    pub study: Study,
    pub assessment: Assessment,
    pub findings: Findings,
    pub summary: ProfileSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Patient {
    pub age_years: Option<f64>,
    pub sex: Option<String>,
    pub immunocompromised: Option<Flag>,
    pub comorbidities: Vec<String>,
    pub allergies: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Presentation {
    pub chief_complaint: Option<String>,
    pub symptom_duration: Option<String>,
    /// History of present illness (free text, truncated upstream)
    pub hpi: Option<String>,
    /// Past medical history
    pub pmh: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Study {
    pub modality: Option<String>,
    pub body_region: Option<String>,
    pub view_position: Option<String>,
    pub image_type: Option<String>,
    pub image_subtype: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Assessment {
    pub diagnosis_primary: Option<String>,
    pub suspected_primary: Vec<String>,
    pub urgency: Option<String>,
    pub infectious_concern: Option<Flag>,
    pub icu_candidate: Option<Flag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Findings {
    pub lungs: LungFindings,
    pub pleura: PleuraFindings,
    pub cardiomediastinal: CardiomediastinalFindings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LungFindings {
    pub consolidation_present: Option<Flag>,
    pub atelectasis_present: Option<Flag>,
    pub edema_present: Option<Flag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PleuraFindings {
    pub effusion_present: Option<Flag>,
    pub pneumothorax_present: Option<Flag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardiomediastinalFindings {
    pub cardiomegaly: Option<Flag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSummary {
    pub one_liner: Option<String>,
    pub key_points: Vec<String>,
}
