use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::engine::{JobCategory, Platform, SortOrder};
use crate::storage::{AttemptStatus, NewAttempt};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialRequest {
    pub platform: String,
    pub username: String,
    pub password: String,
}

/// `criteria` of a start request. Category flags sit next to the named
/// fields, in either their English or legacy Portuguese spelling.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default)]
    pub max_applications: Option<u32>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub distance_km: Option<u32>,
    #[serde(default)]
    pub sort: Option<SortOrder>,
    #[serde(flatten)]
    pub flags: BTreeMap<String, serde_json::Value>,
}

impl Criteria {
    /// Categories whose flag is `true`. Unknown keys are ignored.
    pub fn categories(&self) -> BTreeSet<JobCategory> {
        self.flags
            .iter()
            .filter(|(_, v)| v.as_bool() == Some(true))
            .filter_map(|(k, _)| {
                serde_json::from_value::<JobCategory>(serde_json::Value::String(k.clone())).ok()
            })
            .collect()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StartAutomationRequest {
    #[serde(default)]
    pub platforms: BTreeMap<String, bool>,
    #[serde(default)]
    pub criteria: Criteria,
}

impl StartAutomationRequest {
    pub fn platforms(&self) -> BTreeSet<Platform> {
        self.platforms
            .iter()
            .filter(|(_, on)| **on)
            .filter_map(|(k, _)| Platform::from_key(k))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckDuplicateRequest {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub job_url: Option<String>,
    #[serde(default)]
    pub days: Option<i64>,
}

/// Manual attempt record. A terminal `status` opens and closes the row in one go.
#[derive(Debug, Deserialize)]
pub struct CreateAttemptRequest {
    #[serde(flatten)]
    pub attempt: NewAttempt,
    #[serde(default)]
    pub status: Option<AttemptStatus>,
    #[serde(default, alias = "session_id")]
    pub run_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateAttemptRequest {
    pub status: AttemptStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub questions_answered: Option<serde_json::Value>,
    #[serde(default)]
    pub screenshot_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeTextRequest {
    #[serde(default)]
    pub text: Option<String>,
}
