use common_auth::{ApiResponse, GatewayError};
use common_http_errors::ApiProblem;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Api(#[from] ApiProblem),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("not signed in")]
    NotSignedIn,
}

impl ClientError {
    /// Message for the person at the keyboard.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api(problem) => problem.user_message(),
            ClientError::Gateway(err) if err.is_authorization_failure() => {
                "Your session has ended. Please sign in again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub(crate) fn expect_success(response: ApiResponse) -> ClientResult<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ApiProblem::from_body(response.status(), &response.body).into())
    }
}

pub(crate) fn decode<T: DeserializeOwned>(response: ApiResponse) -> ClientResult<T> {
    expect_success(response)?
        .json()
        .map_err(|err| ClientError::Decode(err.to_string()))
}
