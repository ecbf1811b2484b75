// Domain models: metric rows, inventory property bags, process rows

mod inventory;
mod metrics;
mod process;
mod rows;

pub use inventory::{InventoryInstance, InventoryRow, PropertyValue};
pub use metrics::{MetricSample, VolumeState};
pub use process::{ProcessRecord, ProcessRow};
pub use rows::RowSet;

/// MB divisor for byte counts (integer division, truncating).
pub const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;
