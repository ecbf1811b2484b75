// Row-replace event payload sent to the presentation shell

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::{InventoryRow, MetricSample, ProcessRow};
use crate::sort::{Columns, SortSpec, sort_rows};

/// One row-replace event: the full new content of the display surface.
/// Whatever the shell was rendering is replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "rows", rename_all = "camelCase")]
pub enum RowSet {
    Metrics(Vec<MetricSample>),
    Inventory(Vec<InventoryRow>),
    Processes(Vec<ProcessRow>),
}

impl RowSet {
    pub fn len(&self) -> usize {
        match self {
            RowSet::Metrics(rows) => rows.len(),
            RowSet::Inventory(rows) => rows.len(),
            RowSet::Processes(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply a column sort in place, whichever row kind is current.
    pub fn sort(&mut self, spec: SortSpec) {
        match self {
            RowSet::Metrics(rows) => sort_rows(rows, spec),
            RowSet::Inventory(rows) => sort_rows(rows, spec),
            RowSet::Processes(rows) => sort_rows(rows, spec),
        }
    }
}

// Column layout as rendered by the shell. Numeric columns deliberately
// render as text: the sort comparison is ordinal on the cell text.

impl Columns for MetricSample {
    fn column(&self, index: usize) -> Cow<'_, str> {
        match index {
            0 => Cow::Borrowed(self.label.as_str()),
            1 => Cow::Borrowed(self.formatted_value.as_str()),
            _ => Cow::Borrowed(""),
        }
    }
}

impl Columns for InventoryRow {
    fn column(&self, index: usize) -> Cow<'_, str> {
        match index {
            0 => Cow::Borrowed(self.group.as_str()),
            1 => Cow::Borrowed(self.property_name.as_str()),
            2 => Cow::Borrowed(self.property_value.as_str()),
            _ => Cow::Borrowed(""),
        }
    }
}

impl Columns for ProcessRow {
    fn column(&self, index: usize) -> Cow<'_, str> {
        match index {
            0 => Cow::Borrowed(self.process_name.as_str()),
            1 => Cow::Owned(self.footprint_mb.to_string()),
            2 => Cow::Owned(self.pid.to_string()),
            _ => Cow::Borrowed(""),
        }
    }
}
