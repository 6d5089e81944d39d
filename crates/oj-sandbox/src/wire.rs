//! Wire shapes for the sandbox's `POST /run` contract (§6). Kept private to
//! this crate; [`crate::client::SandboxClient`] translates to and from the
//! neutral [`crate::RunResult`]/[`crate::CompileOutcome`] types so no other
//! module in the workspace needs to know this shape exists.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(crate) struct RunRequest {
    pub cmd: Vec<CmdSpec>,
}

#[derive(Serialize)]
pub(crate) struct CmdSpec {
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub files: Vec<FileSpec>,
    #[serde(rename = "cpuLimit")]
    pub cpu_limit: u64,
    #[serde(rename = "memoryLimit")]
    pub memory_limit: u64,
    #[serde(rename = "procLimit")]
    pub proc_limit: u64,
    #[serde(rename = "copyIn")]
    pub copy_in: HashMap<String, FileSpec>,
    #[serde(rename = "copyOutCached")]
    pub copy_out_cached: Vec<String>,
}

/// One of stdin/stdout/stderr (by position) or a `copyIn` entry.
#[derive(Serialize)]
#[serde(untagged)]
pub(crate) enum FileSpec {
    /// Inline content, used for stdin and for uploading freshly written
    /// source files.
    Content { content: String },
    /// A pipe collector with a max size, used for stdout/stderr.
    Collector { name: String, max: u64 },
    /// A previously cached artifact, referenced by the id the sandbox
    /// returned from an earlier `copyOutCached`.
    Cached { #[serde(rename = "fileId")] file_id: String },
}

#[derive(Deserialize, Debug)]
pub(crate) struct RunResultWire {
    pub status: String,
    pub time: u64,
    pub memory: u64,
    #[serde(rename = "exitStatus")]
    pub exit_status: i32,
    pub error: Option<String>,
    #[serde(default)]
    pub files: HashMap<String, String>,
    #[serde(rename = "fileIds", default)]
    pub file_ids: HashMap<String, String>,
}
