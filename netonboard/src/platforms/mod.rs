//! Built-in platform mappings.
//!
//! Each supported platform ships as a YAML mapping document embedded in the
//! crate. Documents are validated when loaded, never at extraction time.

mod registry;

pub use registry::MappingRegistry;

use crate::error::MappingError;
use crate::mapping::PlatformMapping;

pub(crate) const CISCO_IOS: &str = include_str!("cisco_ios.yml");
pub(crate) const ARISTA_EOS: &str = include_str!("arista_eos.yml");

/// Mapping documents shipped with the crate, as `(platform, document)`.
pub const BUILTIN: &[(&str, &str)] = &[("cisco_ios", CISCO_IOS), ("arista_eos", ARISTA_EOS)];

/// Cisco IOS mapping over TextFSM-parsed output.
pub fn cisco_ios() -> Result<PlatformMapping, MappingError> {
    PlatformMapping::from_yaml_str("cisco_ios", CISCO_IOS)
}

/// Arista EOS mapping over `| json` output.
pub fn arista_eos() -> Result<PlatformMapping, MappingError> {
    PlatformMapping::from_yaml_str("arista_eos", ARISTA_EOS)
}
