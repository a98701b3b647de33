use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ids;

#[derive(Debug, Serialize)]
pub(crate) struct UsernamePassword<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(deserialize_with = "ids::id")]
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredUser {
    #[serde(deserialize_with = "ids::id")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(deserialize_with = "ids::id")]
    pub id: String,
    #[serde(default, deserialize_with = "ids::optional_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, deserialize_with = "ids::optional_id")]
    pub id: Option<String>,
    /// `user` or `assistant`.
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
    pub conversation_id: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    #[serde(default, deserialize_with = "ids::optional_id")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(deserialize_with = "ids::id")]
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub upload_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub summary: Option<String>,
}

pub const MAX_FILENAME_CHARS: usize = 255;
pub const MAX_SUMMARY_CHARS: usize = 2000;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl DocumentUpdate {
    /// Mirrors the backend's field limits so obviously bad edits fail locally.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(filename) = &self.filename {
            let len = filename.chars().count();
            if len == 0 || len > MAX_FILENAME_CHARS {
                return Err(format!(
                    "filename must be between 1 and {MAX_FILENAME_CHARS} characters"
                ));
            }
        }
        if let Some(summary) = &self.summary {
            if summary.chars().count() > MAX_SUMMARY_CHARS {
                return Err(format!("summary cannot exceed {MAX_SUMMARY_CHARS} characters"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestAccepted {
    #[serde(default)]
    pub message: Option<String>,
    pub job_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionJob {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub total_files: u32,
    #[serde(default)]
    pub processed_files: u32,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatistics {
    pub total_users: u64,
    pub total_conversations: u64,
    pub total_messages: u64,
    pub total_documents: u64,
    pub active_conversations24h: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub my_conversations: u64,
    pub my_messages: u64,
    pub total_messages: u64,
    pub total_documents: u64,
    pub my_active_conversations24h: u64,
    pub my_total_tokens: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn toggled(self) -> Self {
        match self {
            UserStatus::Active => UserStatus::Inactive,
            UserStatus::Inactive => UserStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantUser {
    #[serde(deserialize_with = "ids::id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub status: UserStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_response_accepts_numeric_user_id() {
        let parsed: LoginResponse = serde_json::from_value(json!({
            "token": "T1",
            "refreshToken": "R1",
            "userId": 17,
            "username": "alice",
            "roles": ["USER"]
        }))
        .unwrap();
        assert_eq!(parsed.user_id, "17");
        assert_eq!(parsed.refresh_token.as_deref(), Some("R1"));
    }

    #[test]
    fn conversation_parses_backend_timestamps() {
        let parsed: Conversation = serde_json::from_value(json!({
            "id": 3,
            "userId": "u-1",
            "title": "Quarterly report",
            "createdAt": "2024-05-01T09:30:00",
            "updatedAt": "2024-05-01T09:45:12.123"
        }))
        .unwrap();
        assert_eq!(parsed.id, "3");
        assert_eq!(parsed.user_id.as_deref(), Some("u-1"));
        assert!(parsed.updated_at.is_some());
    }

    #[test]
    fn unknown_job_status_is_tolerated() {
        let parsed: IngestionJob = serde_json::from_value(json!({
            "jobId": "job-1",
            "status": "QUEUED_FOR_RETRY",
            "totalFiles": 2,
            "processedFiles": 1
        }))
        .unwrap();
        assert_eq!(parsed.status, JobStatus::Unknown);
        assert!(!parsed.status.is_terminal());
    }

    #[test]
    fn user_update_omits_unset_fields() {
        let update = UserUpdate {
            status: Some(UserStatus::Active.toggled()),
            ..UserUpdate::default()
        };
        assert_eq!(serde_json::to_value(update).unwrap(), json!({ "status": "INACTIVE" }));
    }

    #[test]
    fn document_update_limits() {
        let empty_name = DocumentUpdate {
            filename: Some(String::new()),
            summary: None,
        };
        assert!(empty_name.validate().is_err());

        let long_summary = DocumentUpdate {
            filename: None,
            summary: Some("x".repeat(MAX_SUMMARY_CHARS + 1)),
        };
        assert!(long_summary.validate().is_err());

        let fine = DocumentUpdate {
            filename: Some("notes.pdf".into()),
            summary: Some("short".into()),
        };
        assert!(fine.validate().is_ok());
    }
}
