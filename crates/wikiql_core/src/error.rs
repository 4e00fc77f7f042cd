use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry of the `errors` array in a GraphQL response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlErrorEntry {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid page id: {0}")]
    InvalidIdentifier(String),

    #[error("a page path is required")]
    MissingPath,

    #[error("path contains invalid characters (< > : \" | ? *): {0}")]
    InvalidPathCharacters(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// The remote reported application-level errors. Order and count are kept.
    #[error("{}", join_messages(.errors))]
    Graphql { errors: Vec<GraphqlErrorEntry> },

    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The remote answered but `responseResult.succeeded` was false.
    #[error("{message}")]
    MutationFailed {
        operation: &'static str,
        error_code: Option<i64>,
        message: String,
    },

    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    pub(crate) fn transport(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            context: context.into(),
            source,
        }
    }

    /// True for input validation failures detected before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier(_) | Self::MissingPath | Self::InvalidPathCharacters(_)
        )
    }

    /// Whether repeating the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            Self::HttpStatus { status, .. } => matches!(*status, 408 | 429 | 500..=599),
            _ => false,
        }
    }

    pub fn graphql_messages(&self) -> Vec<&str> {
        match self {
            Self::Graphql { errors } => errors.iter().map(|entry| entry.message.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

fn join_messages(errors: &[GraphqlErrorEntry]) -> String {
    errors
        .iter()
        .map(|entry| entry.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ClientResult<T> = Result<T, ClientError>;
