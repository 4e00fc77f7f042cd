use std::collections::VecDeque;

use serde_json::{Value, json};

use crate::client::{GraphqlApi, UploadRequest};
use crate::error::{ClientError, ClientResult};

/// Scripted `GraphqlApi`: replies in order and records every operation sent.
#[derive(Default)]
pub(crate) struct MockApi {
    replies: VecDeque<ClientResult<Value>>,
    pub operations: Vec<String>,
    pub uploads: Vec<UploadRequest>,
    upload_reply: Option<Value>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, data: Value) -> Self {
        self.replies.push_back(Ok(data));
        self
    }

    pub fn fail(mut self, error: ClientError) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    pub fn upload_reply(mut self, body: Value) -> Self {
        self.upload_reply = Some(body);
        self
    }

    pub fn last_operation(&self) -> &str {
        self.operations.last().map(String::as_str).unwrap_or("")
    }
}

impl GraphqlApi for MockApi {
    fn execute(&mut self, operation: &str) -> ClientResult<Value> {
        self.operations.push(operation.to_string());
        self.replies.pop_front().unwrap_or_else(|| {
            Err(ClientError::InvalidResponse(format!(
                "no scripted reply for: {operation}"
            )))
        })
    }

    fn upload(&mut self, request: &UploadRequest) -> ClientResult<Value> {
        self.uploads.push(request.clone());
        Ok(self.upload_reply.clone().unwrap_or(Value::Null))
    }

    fn request_count(&self) -> usize {
        self.operations.len() + self.uploads.len()
    }
}

pub(crate) fn page_list(pages: Value) -> Value {
    json!({ "pages": { "list": pages } })
}

pub(crate) fn mutation_reply(field: &str, result: Value, extra: Option<(&str, Value)>) -> Value {
    let mut payload = serde_json::Map::new();
    payload.insert("responseResult".to_string(), result);
    if let Some((key, value)) = extra {
        payload.insert(key.to_string(), value);
    }
    wrap("pages", field, Value::Object(payload))
}

pub(crate) fn wrap(root: &str, field: &str, value: Value) -> Value {
    let mut inner = serde_json::Map::new();
    inner.insert(field.to_string(), value);
    let mut outer = serde_json::Map::new();
    outer.insert(root.to_string(), Value::Object(inner));
    Value::Object(outer)
}
