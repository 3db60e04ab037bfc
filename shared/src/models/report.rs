//! Community case report models

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Case report as submitted from the reporting form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    #[validate(length(min = 1, message = "Barangay is required"))]
    pub barangay: String,

    // Patient details
    #[validate(length(min = 1, message = "Patient name is required"))]
    pub name: String,
    pub age: String,
    pub sex: String,
    pub address: String,

    // Report information
    pub date_reported: String,
    pub time_reported: String,
    pub reported_by: String,

    // Presenting symptoms
    #[serde(default)]
    pub fever: bool,
    #[serde(default)]
    pub headache: bool,
    #[serde(default)]
    pub muscle_pain: bool,
    #[serde(default)]
    pub rash: bool,
    #[serde(default)]
    pub nausea: bool,
    #[serde(default)]
    pub abdominal_pain: bool,
    #[serde(default)]
    pub bleeding: bool,

    #[serde(default)]
    pub symptom_onset_date: Option<String>,

    // Risk classification
    #[serde(default)]
    pub risk_red: bool,
    #[serde(default)]
    pub risk_yellow: bool,
    #[serde(default)]
    pub risk_green: bool,

    // Action taken
    #[serde(default)]
    pub referred_to_facility: bool,
    #[serde(default)]
    pub advised_monitoring: bool,
    #[serde(default)]
    pub notified_family: bool,

    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Symptoms {
    pub fever: bool,
    pub headache: bool,
    pub muscle_pain: bool,
    pub rash: bool,
    pub nausea: bool,
    pub abdominal_pain: bool,
    pub bleeding: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskClassification {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActionTaken {
    pub referred_to_facility: bool,
    pub advised_monitoring: bool,
    pub notified_family: bool,
}

/// Case report as persisted to the reports log.
///
/// `id` is optional so that logs written before ids were introduced still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredCaseReport {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub barangay: String,
    pub name: String,
    pub age: String,
    pub sex: String,
    pub address: String,
    pub date_reported: String,
    pub time_reported: String,
    pub reported_by: String,
    #[serde(default)]
    pub symptoms: Symptoms,
    pub symptom_onset_date: Option<String>,
    #[serde(default)]
    pub risk_classification: RiskClassification,
    #[serde(default)]
    pub action_taken: ActionTaken,
    pub remarks: Option<String>,
    #[serde(rename = "reported_at", default)]
    pub reported_at: String,
}

impl StoredCaseReport {
    /// Build the persisted form of a submitted report
    pub fn from_report(report: CaseReport, id: Uuid, reported_at: String) -> Self {
        Self {
            id: Some(id),
            barangay: report.barangay,
            name: report.name,
            age: report.age,
            sex: report.sex,
            address: report.address,
            date_reported: report.date_reported,
            time_reported: report.time_reported,
            reported_by: report.reported_by,
            symptoms: Symptoms {
                fever: report.fever,
                headache: report.headache,
                muscle_pain: report.muscle_pain,
                rash: report.rash,
                nausea: report.nausea,
                abdominal_pain: report.abdominal_pain,
                bleeding: report.bleeding,
            },
            symptom_onset_date: non_blank(report.symptom_onset_date),
            risk_classification: RiskClassification {
                red: report.risk_red,
                yellow: report.risk_yellow,
                green: report.risk_green,
            },
            action_taken: ActionTaken {
                referred_to_facility: report.referred_to_facility,
                advised_monitoring: report.advised_monitoring,
                notified_family: report.notified_family,
            },
            remarks: non_blank(report.remarks),
            reported_at,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
