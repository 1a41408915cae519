use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Function execution failed: {0}")]
    ExecutionError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Failure of a single Microsoft Graph call. "Nothing found" is not an error,
/// adapter methods report it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Microsoft Graph request failed ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("Microsoft Graph request could not be sent: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid Microsoft Graph url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unexpected Microsoft Graph response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;

impl From<GraphError> for AgentError {
    fn from(err: GraphError) -> Self {
        AgentError::ExecutionError(err.to_string())
    }
}
