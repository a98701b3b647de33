use http::StatusCode;
use serde::Deserialize;

/// Shape of the backend's problem responses (RFC 7807 plus a few extension
/// members). Every field is optional because gateways and proxies in front of
/// the backend answer with plain text or empty bodies too.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ProblemBody {
    #[serde(rename = "type")] problem_type: Option<String>,
    title: Option<String>,
    detail: Option<String>,
    message: Option<String>,
    path: Option<String>,
    retry_after: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    QuotaExceeded,
    Unavailable,
    Server,
    Other,
}

impl ProblemKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ProblemKind::BadRequest,
            StatusCode::UNAUTHORIZED => ProblemKind::Unauthorized,
            StatusCode::FORBIDDEN => ProblemKind::Forbidden,
            StatusCode::NOT_FOUND => ProblemKind::NotFound,
            StatusCode::TOO_MANY_REQUESTS => ProblemKind::QuotaExceeded,
            StatusCode::SERVICE_UNAVAILABLE => ProblemKind::Unavailable,
            s if s.is_server_error() => ProblemKind::Server,
            _ => ProblemKind::Other,
        }
    }
}

/// Application error reported by a business endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiProblem {
    pub status: StatusCode,
    pub kind: ProblemKind,
    pub title: Option<String>,
    pub detail: Option<String>,
    pub problem_type: Option<String>,
    pub path: Option<String>,
    pub retry_after: Option<String>,
}

impl ApiProblem {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            kind: ProblemKind::from_status(status),
            title: None,
            detail: None,
            problem_type: None,
            path: None,
            retry_after: None,
        }
    }

    /// Decode a response body. Non-JSON bodies become the `detail` text.
    pub fn from_body(status: StatusCode, body: &[u8]) -> Self {
        let mut problem = Self::new(status);
        match serde_json::from_slice::<ProblemBody>(body) {
            Ok(parsed) => {
                problem.title = parsed.title;
                problem.detail = parsed.detail.or(parsed.message);
                problem.problem_type = parsed.problem_type;
                problem.path = parsed.path;
                problem.retry_after = parsed.retry_after.and_then(|value| match value {
                    serde_json::Value::String(text) => Some(text),
                    serde_json::Value::Number(number) => Some(number.to_string()),
                    _ => None,
                });
            }
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                if !text.is_empty() {
                    problem.detail = Some(text);
                }
            }
        }
        problem
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.kind == ProblemKind::QuotaExceeded
    }

    /// Text suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> String {
        if self.is_quota_exceeded() {
            let retry = self.retry_after.as_deref().unwrap_or("a few moments");
            return format!("API quota exceeded. Please retry in: {retry}");
        }
        if let Some(detail) = self.detail.as_deref().filter(|text| !text.is_empty()) {
            return detail.to_string();
        }
        if let Some(title) = self.title.as_deref().filter(|text| !text.is_empty()) {
            return title.to_string();
        }
        format!("Request failed with status {}", self.status.as_u16())
    }
}

impl std::fmt::Display for ApiProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}: {}", self.status.as_u16(), self.user_message())
    }
}

impl std::error::Error for ApiProblem {}
