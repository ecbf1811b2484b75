// Inventory property bags and flattened display rows

use serde::{Deserialize, Serialize};

/// A dynamically-typed inventory property value. One variant per value shape
/// the hardware-description backend can return; each carries its own
/// normalization to display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    TextArray(Vec<String>),
    UintArray(Vec<u16>),
    Empty,
}

impl PropertyValue {
    /// Display text for the value. Arrays are joined with a single space;
    /// scalars use their default textual form. `Empty` (and an empty text)
    /// normalizes to "" and is dropped by the aggregator.
    pub fn normalize(&self) -> String {
        match self {
            PropertyValue::Text(s) => s.clone(),
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Real(r) => r.to_string(),
            PropertyValue::Boolean(b) => b.to_string(),
            PropertyValue::TextArray(parts) => parts.join(" "),
            PropertyValue::UintArray(values) => values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            PropertyValue::Empty => String::new(),
        }
    }
}

/// One returned object from an inventory query: an ordered property bag plus
/// the provider-supplied textual identity (used as the group-label fallback
/// when no usable `Name` property is present).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInstance {
    pub identity: String,
    pub properties: Vec<(String, PropertyValue)>,
}

impl InventoryInstance {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            properties: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.properties.push((name.into(), value));
    }
}

/// One flattened display row: instance group label, property name, and the
/// normalized (never empty) property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub group: String,
    pub property_name: String,
    pub property_value: String,
}
