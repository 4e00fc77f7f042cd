use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

const INVALID_PATH_CHARS: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

/// Positive integer id of a remote entity (page, asset, version).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(u64);

impl Identifier {
    pub fn new(value: i64) -> ClientResult<Self> {
        if value < 1 {
            return Err(ClientError::InvalidIdentifier(value.to_string()));
        }
        Ok(Self(value.unsigned_abs()))
    }

    pub fn parse(raw: &str) -> ClientResult<Self> {
        validate_identifier(raw)
    }

    /// Wrap an id reported by the remote; `0` is not an id.
    pub fn from_remote(value: u64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Page path with the leading `/` removed and no reserved characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PagePath(String);

impl PagePath {
    pub fn parse(raw: &str) -> ClientResult<Self> {
        validate_path(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A page lookup key: numeric id or path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRef {
    Id(Identifier),
    Path(PagePath),
}

impl PageRef {
    /// All-digit input is an id, anything else is treated as a path.
    pub fn parse(raw: &str) -> ClientResult<Self> {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return validate_identifier(trimmed).map(Self::Id);
        }
        validate_path(raw).map(Self::Path)
    }
}

impl From<Identifier> for PageRef {
    fn from(value: Identifier) -> Self {
        Self::Id(value)
    }
}

impl From<PagePath> for PageRef {
    fn from(value: PagePath) -> Self {
        Self::Path(value)
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Path(path) => write!(f, "{path}"),
        }
    }
}

/// Permissive integer parse: the leading numeric prefix wins, so `"12abc"`
/// yields 12. Non-numeric input and values below 1 are rejected.
pub fn validate_identifier(raw: &str) -> ClientResult<Identifier> {
    let invalid = || ClientError::InvalidIdentifier(raw.to_string());
    let trimmed = raw.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = unsigned
        .bytes()
        .take_while(|byte| byte.is_ascii_digit())
        .count();
    if digits_len == 0 {
        return Err(invalid());
    }
    let value = unsigned[..digits_len].parse::<u64>().map_err(|_| invalid())?;
    if negative || value < 1 {
        return Err(invalid());
    }
    Ok(Identifier(value))
}

pub fn validate_path(raw: &str) -> ClientResult<PagePath> {
    if raw.is_empty() {
        return Err(ClientError::MissingPath);
    }
    let cleaned = raw.strip_prefix('/').unwrap_or(raw);
    if cleaned.is_empty() {
        return Err(ClientError::MissingPath);
    }
    if cleaned.contains(INVALID_PATH_CHARS) {
        return Err(ClientError::InvalidPathCharacters(cleaned.to_string()));
    }
    Ok(PagePath(cleaned.to_string()))
}
