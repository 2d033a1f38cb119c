use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier the provider API uses to look up a shared file set.
///
/// Always holds the API-facing form, i.e. with the leading version digit
/// already removed. Construct through `shortlink::extract_short_id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortLinkId(String);

impl ShortLinkId {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        ShortLinkId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortLinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const SESSION_COOKIE_PREFIX: &str = "ndus=";

/// A validated check built from the query parameters of one inbound request.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckRequest {
    pub url: String,
    /// Session cookie, always in `ndus=<value>` form.
    pub cookie: String,
    /// API host the lookup is sent to.
    pub host: String,
}

impl CheckRequest {
    /// Callers may pass the bare session value; it is prefixed with `ndus=` here.
    pub fn new(url: impl Into<String>, cookie: &str, host: impl Into<String>) -> Self {
        let cookie = if cookie.starts_with(SESSION_COOKIE_PREFIX) {
            cookie.to_string()
        } else {
            format!("{SESSION_COOKIE_PREFIX}{cookie}")
        };

        CheckRequest {
            url: url.into(),
            cookie,
            host: host.into(),
        }
    }
}

/// Share listing as returned by both the primary and the fallback endpoint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SharePayload {
    #[serde(default)]
    pub errno: Option<i64>,
    #[serde(default)]
    pub errmsg: Option<String>,
    #[serde(default)]
    pub list: Option<Vec<RawFileEntry>>,
}

impl SharePayload {
    pub fn into_entries(self) -> Vec<RawFileEntry> {
        self.list.unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawFileEntry {
    #[serde(default)]
    pub server_filename: Option<String>,
    #[serde(default)]
    pub size: Value,
    #[serde(default)]
    pub isdir: Value,
}

/// One file of a share, in provider order.
///
/// `size` and `isdir` are forwarded exactly as the provider sent them and are
/// left out of the output when the provider omitted them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub size: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub isdir: Value,
}

impl From<RawFileEntry> for FileEntry {
    fn from(raw: RawFileEntry) -> Self {
        FileEntry {
            name: raw.server_filename.unwrap_or_default(),
            size: raw.size,
            isdir: raw.isdir,
        }
    }
}

/// The only shape returned by the check endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckResult {
    Listing {
        exists: bool,
        total_files: usize,
        files: Vec<FileEntry>,
    },
    Failed {
        exists: bool,
        error: String,
    },
}

impl CheckResult {
    pub fn listing(files: Vec<FileEntry>) -> Self {
        CheckResult::Listing {
            exists: !files.is_empty(),
            total_files: files.len(),
            files,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        CheckResult::Failed {
            exists: false,
            error: error.into(),
        }
    }

    pub fn exists(&self) -> bool {
        match self {
            CheckResult::Listing { exists, .. } | CheckResult::Failed { exists, .. } => *exists,
        }
    }
}
