//! Per-host identity and feature toggles.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::path::Variables;

/// Optional data sets an operator can opt out of per host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    /// VLAN detail (device VLAN tables, tagged/untagged interface VLANs).
    Vlans,

    /// VRF detail (VRF tables, interface VRF membership).
    Vrfs,
}

/// Identity and toggles for one host being onboarded.
///
/// Besides gating mapping entries, the context feeds `{{ name }}`
/// placeholders in path expressions:
///
/// - `host` / `original_host`: the address the host was reached at
/// - `name`: the inventory name
/// - `platform`: the platform identifier, when known
/// - any custom variable added with [`HostContext::with_var`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostContext {
    /// Inventory name of the host.
    pub name: String,

    /// Address used to reach the host.
    pub host: String,

    /// Platform identifier (e.g., "cisco_ios"), if already known.
    #[serde(default)]
    pub platform: Option<String>,

    /// Collect VLAN detail.
    #[serde(default)]
    pub sync_vlans: bool,

    /// Collect VRF detail.
    #[serde(default)]
    pub sync_vrfs: bool,

    /// Extra interpolation variables.
    #[serde(default)]
    pub vars: IndexMap<String, String>,
}

impl HostContext {
    /// Create a context for a host reached at `host`. Toggles default to off.
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            platform: None,
            sync_vlans: false,
            sync_vrfs: false,
            vars: IndexMap::new(),
        }
    }

    /// Set the platform identifier.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Enable or disable a toggle.
    pub fn with_toggle(mut self, toggle: Toggle, enabled: bool) -> Self {
        match toggle {
            Toggle::Vlans => self.sync_vlans = enabled,
            Toggle::Vrfs => self.sync_vrfs = enabled,
        }
        self
    }

    /// Add an interpolation variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Check whether a toggle is on.
    pub fn is_enabled(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Vlans => self.sync_vlans,
            Toggle::Vrfs => self.sync_vrfs,
        }
    }

    /// Check whether an entry gated by `requires` should be evaluated.
    pub fn allows(&self, requires: Option<Toggle>) -> bool {
        requires.is_none_or(|toggle| self.is_enabled(toggle))
    }
}

impl Variables for HostContext {
    fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "host" | "original_host" => Some(self.host.clone()),
            "name" => Some(self.name.clone()),
            "platform" => self.platform.clone(),
            _ => self.vars.get(name).cloned(),
        }
    }
}
