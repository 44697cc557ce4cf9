//! Wire types for the pipeline and search services

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Document record returned by the pipeline's info endpoint.
///
/// Only `status` and `chunk_count` drive progress; the rest is carried for
/// display. Every field tolerates absence because the backend's payload is
/// loosely specified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub book_title: String,
    /// Raw, loosely-defined status string
    #[serde(default = "unknown_status", deserialize_with = "status_or_unknown")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pdf_available: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text_available: bool,
    #[serde(default, rename = "chunks_count", deserialize_with = "null_as_default")]
    pub chunk_count: u64,
}

fn unknown_status() -> String {
    "unknown".to_string()
}

// A null or empty status reads as "unknown".
fn status_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let status = Option::<String>::deserialize(deserializer)?;
    Ok(status.filter(|s| !s.is_empty()).unwrap_or_else(unknown_status))
}

// Fields the backend has not filled in yet arrive as null.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl DocumentStatus {
    /// Minimal record with only the fields the engine reads.
    pub fn new(status: impl Into<String>, chunk_count: u64) -> Self {
        Self {
            status: status.into(),
            chunk_count,
            ..Self::default()
        }
    }
}

/// Response of the resolve endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResolveResponse {
    pub download_id: String,
}

/// Response of the search endpoint used as a readiness probe.
///
/// Only the number of hits matters, so their contents are never decoded.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SearchResults {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<IgnoredAny>,
}
