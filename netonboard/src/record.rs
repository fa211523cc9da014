//! Normalized device and interface records.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Interface classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    /// Physical or otherwise unclassified interface.
    #[default]
    Other,

    /// Link-aggregation group.
    Lag,

    /// Virtual interface (SVI, loopback, tunnel).
    Virtual,
}

impl InterfaceType {
    /// Name as stored in inventory.
    pub fn as_str(self) -> &'static str {
        match self {
            InterfaceType::Other => "other",
            InterfaceType::Lag => "lag",
            InterfaceType::Virtual => "virtual",
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One address observed on an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    pub address: String,
    pub prefix_length: String,
}

impl IpAddress {
    pub fn new(address: impl Into<String>, prefix_length: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            prefix_length: prefix_length.into(),
        }
    }
}

/// Normalized description of one interface.
///
/// Each attribute is a scalar when exactly one observation contributed it
/// and a list, in observation order, when two or more did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InterfaceRecord {
    /// Aggregated attributes, in mapping order.
    #[serde(flatten)]
    pub attributes: IndexMap<String, Value>,

    /// Addresses, always a list. `None` when the mapping defines no address source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_addresses: Option<Vec<IpAddress>>,

    /// Interface classification.
    #[serde(rename = "type")]
    pub kind: InterfaceType,
}

impl InterfaceRecord {
    /// Get an attribute value.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }
}

/// Normalized description of one device.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceRecord {
    /// Device-level fields, in mapping order.
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,

    /// Interfaces keyed by name, in first-seen order. `None` when the
    /// mapping has no interface group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<IndexMap<String, InterfaceRecord>>,
}

impl DeviceRecord {
    /// Get a device-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get an interface by name.
    pub fn interface(&self, name: &str) -> Option<&InterfaceRecord> {
        self.interfaces.as_ref()?.get(name)
    }

    /// Render the record as one JSON value, the form handed to persistence.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
