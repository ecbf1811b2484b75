// Process snapshot: enumerate, compute MB footprint, sort descending.

use std::sync::Arc;

use crate::models::{BYTES_PER_MEGABYTE, ProcessRecord, ProcessRow};
use crate::providers::{ProcessProvider, ProviderError};

/// Stateless per call: each snapshot replaces the whole process list.
pub struct ProcessSnapshotter {
    provider: Arc<dyn ProcessProvider>,
}

impl ProcessSnapshotter {
    pub fn new(provider: Arc<dyn ProcessProvider>) -> Self {
        Self { provider }
    }

    /// Current process list, sorted descending by resident footprint.
    /// Ties keep provider order (the sort is stable).
    pub async fn snapshot(&self) -> Result<Vec<ProcessRow>, ProviderError> {
        let records = self.provider.processes().await?;
        let mut rows: Vec<ProcessRow> = records.into_iter().map(to_row).collect();
        rows.sort_by(|a, b| b.footprint_mb.cmp(&a.footprint_mb));
        Ok(rows)
    }
}

fn to_row(record: ProcessRecord) -> ProcessRow {
    ProcessRow {
        process_name: record.name,
        footprint_mb: record.memory_bytes / BYTES_PER_MEGABYTE,
        pid: record.pid,
    }
}
