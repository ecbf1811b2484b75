// Live-metric row and volume models

use serde::{Deserialize, Serialize};

/// One display row of the live-metrics view. `key` is the stable identity
/// used to replace the prior row of the same key on every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub key: String,
    pub label: String,
    pub formatted_value: String,
}

/// A fixed volume discovered at startup. Capacity is captured once and never
/// re-read; only the free-space reading is taken per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeState {
    pub name: String,
    pub total_mb: u64,
}
