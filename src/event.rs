//! Invocation payload and response types.
//!
//! Field names mirror the external event contract exactly, so payloads
//! produced by the triggering side deserialize without translation.

use serde::{Deserialize, Serialize};

/// One unit of work: which archive to unpack, and where the entries go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnzipEvent {
    /// Bucket holding the source archive.
    #[serde(rename = "originBucket")]
    pub origin_bucket: String,

    /// Key of the source archive within `origin_bucket`.
    #[serde(rename = "filePath")]
    pub archive_key: String,

    /// Bucket the unpacked entries are written to.
    #[serde(rename = "targetBucket")]
    pub target_bucket: String,

    /// Key prefix joined with each entry's name to form its destination key.
    #[serde(rename = "targetFilePath")]
    pub target_prefix: String,
}

/// Result reported back to the trigger.
///
/// `success` reflects that the pipeline ran to completion, not that every
/// entry made it; `count` is the number of entries found in the archive.
/// Entries that failed individually are listed in `failed`, which is left
/// out of the serialized form entirely when there are none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnzipResponse {
    #[serde(rename = "Success")]
    pub success: bool,

    #[serde(rename = "Message")]
    pub message: String,

    #[serde(rename = "S3Bucket")]
    pub bucket: String,

    #[serde(rename = "S3Key")]
    pub prefix: String,

    #[serde(rename = "Count")]
    pub count: usize,

    #[serde(rename = "Failed", default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
}
