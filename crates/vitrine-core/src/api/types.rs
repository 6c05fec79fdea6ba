use serde::{Deserialize, Serialize};

/// Lifecycle stage of a listed project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectStatus {
    Started,
    Completed,
    Approval,
}

impl ProjectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Started => "Started",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Approval => "Approval",
        }
    }
}

/// A single listed project. Identity is the `id` field; everything else is
/// display-only. Older backend revisions emitted `_id`, so deserialization
/// accepts it as an alias; the canonical name is `id` everywhere past this
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub status: Option<ProjectStatus>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

/// Fields sent when creating or updating a project. No client-side validation
/// happens here; the editing surface owns that.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// The list endpoint has shipped both a bare array and a wrapped object.
/// Callers never see the difference.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProjectListPayload {
    Wrapped { projects: Vec<ProjectRecord> },
    Bare(Vec<ProjectRecord>),
}

impl From<ProjectListPayload> for Vec<ProjectRecord> {
    fn from(payload: ProjectListPayload) -> Self {
        match payload {
            ProjectListPayload::Wrapped { projects } => projects,
            ProjectListPayload::Bare(projects) => projects,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadedImage {
    #[serde(rename = "fileUrl", alias = "url")]
    pub file_url: String,
    #[serde(rename = "fileName", default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub message: String,
    pub recaptcha_token: String,
}

/// Contact endpoint verdict. A `success: false` body is a refusal, not a
/// transport error.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ContactOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error payload shape used by the backend for non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
