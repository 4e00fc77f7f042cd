use std::fs::File;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Instant;

use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::{ConnectionSettings, WikiConfig, load_config};
use crate::error::{ClientError, ClientResult, GraphqlErrorEntry};

const MAX_ERROR_BODY_CHARS: usize = 512;
const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";
const UPLOAD_FIELD: &str = "mediaUpload";

/// The single outbound seam used by every resource operation.
pub trait GraphqlApi {
    /// Send operation text and return the envelope's `data` member.
    fn execute(&mut self, operation: &str) -> ClientResult<Value>;
    /// Multipart asset upload. Returns the raw decoded response body.
    fn upload(&mut self, request: &UploadRequest) -> ClientResult<Value>;
    fn request_count(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_path: PathBuf,
    pub file_name: String,
    pub folder_id: Option<u64>,
}

pub struct GraphqlClient {
    http: Client,
    settings: ConnectionSettings,
    last_request_at: Option<Instant>,
    request_count: usize,
}

impl GraphqlClient {
    pub fn new(settings: ConnectionSettings) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|error| ClientError::transport("failed to build HTTP client", error))?;
        Ok(Self {
            http,
            settings,
            last_request_at: None,
            request_count: 0,
        })
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    fn apply_rate_limit(&mut self) {
        if let (Some(interval), Some(last)) = (self.settings.rate_limit, self.last_request_at) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                let wait = interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "rate limit delay");
                sleep(wait);
            }
        }
        self.last_request_at = Some(Instant::now());
        self.request_count += 1;
    }
}

impl GraphqlApi for GraphqlClient {
    fn execute(&mut self, operation: &str) -> ClientResult<Value> {
        self.apply_rate_limit();
        let endpoint = self.settings.graphql_endpoint();
        debug!(%endpoint, bytes = operation.len(), "sending GraphQL operation");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.settings.api_token)
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "query": operation }))
            .send()
            .map_err(|error| ClientError::transport("GraphQL request failed", error))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|error| ClientError::transport("failed to read GraphQL response", error))?;
        unwrap_envelope(status, &body)
    }

    fn upload(&mut self, request: &UploadRequest) -> ClientResult<Value> {
        self.apply_rate_limit();
        let endpoint = self.settings.upload_endpoint();
        let io_error = |source| ClientError::Io {
            path: request.file_path.clone(),
            source,
        };
        let file = File::open(&request.file_path).map_err(io_error)?;
        let length = file.metadata().map_err(io_error)?.len();
        let part = Part::reader_with_length(file, length)
            .file_name(request.file_name.clone())
            .mime_str(UPLOAD_CONTENT_TYPE)
            .map_err(|error| ClientError::transport("invalid upload content type", error))?;

        let mut form = Form::new();
        if let Some(folder_id) = request.folder_id {
            form = form.text(UPLOAD_FIELD, json!({ "folderId": folder_id }).to_string());
        }
        form = form.part(UPLOAD_FIELD, part);

        debug!(%endpoint, file = %request.file_name, "uploading asset");
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.settings.api_token)
            .multipart(form)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|error| ClientError::transport("asset upload failed", error))?;
        let body = response
            .text()
            .map_err(|error| ClientError::transport("failed to read upload response", error))?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlErrorEntry>>,
}

/// Classify a response body. GraphQL errors win over the HTTP status, so an
/// error envelope delivered with a 4xx/5xx still surfaces every message.
pub fn unwrap_envelope(status: u16, body: &str) -> ClientResult<Value> {
    let success = (200..300).contains(&status);
    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => {
            let errors = envelope.errors.unwrap_or_default();
            if !errors.is_empty() {
                warn!(status, count = errors.len(), "GraphQL endpoint reported errors");
                return Err(ClientError::Graphql { errors });
            }
            if !success {
                return Err(http_status(status, body));
            }
            Ok(envelope.data.unwrap_or(Value::Null))
        }
        Err(_) if !success => Err(http_status(status, body)),
        Err(error) => Err(ClientError::InvalidResponse(format!(
            "failed to decode GraphQL envelope: {error}"
        ))),
    }
}

fn http_status(status: u16, body: &str) -> ClientError {
    ClientError::HttpStatus {
        status,
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

/// Decode a `data` payload into a typed response shape. A `null` payload
/// decodes like an empty object.
pub(crate) fn decode<T: DeserializeOwned>(data: Value, what: &str) -> ClientResult<T> {
    let data = if data.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        data
    };
    serde_json::from_value(data)
        .map_err(|error| ClientError::InvalidResponse(format!("failed to decode {what}: {error}")))
}

#[derive(Debug, Clone)]
pub enum ConfigSource {
    File(PathBuf),
    Inline(WikiConfig),
    Resolved(ConnectionSettings),
}

/// Process-wide connection context. Configuration is resolved once and the
/// HTTP client is built on first use; `invalidate` drops both.
pub struct Session {
    source: ConfigSource,
    env_lookup: Option<fn(&str) -> Option<String>>,
    settings: Option<ConnectionSettings>,
    client: Option<GraphqlClient>,
}

impl Session {
    pub fn new(source: ConfigSource) -> Self {
        Self {
            source,
            env_lookup: None,
            settings: None,
            client: None,
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(ConfigSource::File(path.into()))
    }

    pub fn from_config(config: WikiConfig) -> Self {
        Self::new(ConfigSource::Inline(config))
    }

    /// Replace process environment lookups during settings resolution.
    pub fn with_env_lookup(mut self, lookup: fn(&str) -> Option<String>) -> Self {
        self.env_lookup = Some(lookup);
        self
    }

    pub fn settings(&mut self) -> ClientResult<&ConnectionSettings> {
        let settings = match self.settings.take() {
            Some(settings) => settings,
            None => self.load_settings()?,
        };
        Ok(self.settings.insert(settings))
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn invalidate(&mut self) {
        debug!("invalidating session configuration and client");
        self.settings = None;
        self.client = None;
    }

    fn client(&mut self) -> ClientResult<&mut GraphqlClient> {
        let client = match self.client.take() {
            Some(client) => client,
            None => GraphqlClient::new(self.settings()?.clone())?,
        };
        Ok(self.client.insert(client))
    }

    fn load_settings(&self) -> ClientResult<ConnectionSettings> {
        let config = match &self.source {
            ConfigSource::Resolved(settings) => return Ok(settings.clone()),
            ConfigSource::Inline(config) => config.clone(),
            ConfigSource::File(path) => load_config(path)
                .map_err(|error| ClientError::Config(format!("{error:#}")))?,
        };
        match self.env_lookup {
            Some(lookup) => ConnectionSettings::resolve_with_lookup(&config, lookup),
            None => ConnectionSettings::resolve(&config),
        }
    }
}

impl GraphqlApi for Session {
    fn execute(&mut self, operation: &str) -> ClientResult<Value> {
        self.client()?.execute(operation)
    }

    fn upload(&mut self, request: &UploadRequest) -> ClientResult<Value> {
        self.client()?.upload(request)
    }

    fn request_count(&self) -> usize {
        self.client
            .as_ref()
            .map(|client| client.request_count())
            .unwrap_or(0)
    }
}
