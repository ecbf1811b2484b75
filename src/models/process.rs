// Process snapshot models

use serde::{Deserialize, Serialize};

/// Raw process data as enumerated by the process provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub memory_bytes: u64,
}

/// One display row of the process view. Snapshot-only: the whole list is
/// replaced on each invocation, rows are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRow {
    pub process_name: String,
    pub footprint_mb: u64,
    pub pid: u32,
}
