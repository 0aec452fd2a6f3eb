use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResumeSort {
    #[default]
    LastUpdatedAt,
    CreatedAt,
    Name,
}

impl ResumeSort {
    pub fn as_str(self) -> &'static str {
        match self {
            ResumeSort::LastUpdatedAt => "lastUpdatedAt",
            ResumeSort::CreatedAt => "createdAt",
            ResumeSort::Name => "name",
        }
    }
}

/// One row of the dashboard resume list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A resume with its document. `data` is opaque to this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDetail {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub has_password: bool,
}

/// View/download counters. Missing fields from the backend read as zero/never.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeStatistics {
    pub is_public: bool,
    pub views: u64,
    pub downloads: u64,
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub last_downloaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedResume {
    pub id: String,
}

/// Body for creating a resume.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResume {
    pub name: String,
    pub slug: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Partial update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}
