// Inventory aggregation: query a hardware class, flatten instances to rows.

use std::sync::Arc;

use crate::models::{InventoryInstance, InventoryRow};
use crate::providers::{InventoryProvider, ProviderError};

/// Flattens inventory instances into grouped display rows. Owns only the
/// most recently produced row set; every query discards the previous one.
pub struct InventoryAggregator {
    provider: Arc<dyn InventoryProvider>,
    rows: Vec<InventoryRow>,
}

impl InventoryAggregator {
    pub fn new(provider: Arc<dyn InventoryProvider>) -> Self {
        Self {
            provider,
            rows: Vec::new(),
        }
    }

    /// One provider request for all instances of `class`. Rows come out in
    /// property order per instance, instances in provider order. Absent or
    /// empty values produce no row. A provider failure is surfaced to the
    /// caller and leaves the row set empty.
    pub async fn query(&mut self, class: &str) -> Result<&[InventoryRow], ProviderError> {
        self.rows.clear();
        let instances = self.provider.query_class(class).await?;
        for instance in &instances {
            let group = group_label(instance);
            for (name, value) in &instance.properties {
                let text = value.normalize();
                if text.is_empty() {
                    continue;
                }
                self.rows.push(InventoryRow {
                    group: group.clone(),
                    property_name: name.clone(),
                    property_value: text,
                });
            }
        }
        Ok(&self.rows)
    }

    pub fn rows(&self) -> &[InventoryRow] {
        &self.rows
    }
}

/// Display bucket for an instance: its first non-empty `Name` property, or
/// the instance's own textual identity when no usable name exists. Labels
/// need not be unique; duplicate names stay separate row groups.
fn group_label(instance: &InventoryInstance) -> String {
    instance
        .properties
        .iter()
        .find(|(name, _)| name == "Name")
        .map(|(_, value)| value.normalize())
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| instance.identity.clone())
}
