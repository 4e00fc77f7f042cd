use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{ClientError, ClientResult};

/// Absent and `null` both decode to the field type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `responseResult` block returned by every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub succeeded: bool,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl OperationResult {
    /// A missing result block counts as a failure.
    pub fn ensure(self, operation: &'static str, fallback: &str) -> ClientResult<()> {
        if self.succeeded {
            return Ok(());
        }
        let message = self
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        warn!(operation, error_code = ?self.error_code, %message, "mutation rejected");
        Err(ClientError::MutationFailed {
            operation,
            error_code: self.error_code,
            message,
        })
    }
}

/// Partial page projection returned by list-style queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locale: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

/// Full page snapshot. Tags are flattened to bare strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: u64,
    pub path: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub rendered_content: String,
    pub locale: String,
    pub editor: String,
    pub created_at: String,
    pub updated_at: String,
    pub author_name: String,
    pub tags: Vec<String>,
    pub is_published: bool,
    pub is_private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PageSummary>>,
}
