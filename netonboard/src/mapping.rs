//! Field-mapping specifications.
//!
//! A platform mapping is a YAML document that tells the engine, for every
//! output field, which command to read, which parser produced the output,
//! which path to query and what shape the result should take:
//!
//! ```yaml
//! sync_devices:
//!   hostname:
//!     command: show version
//!     parser: textfsm
//!     path: "[*].hostname"
//!     shape: string
//!   serial:
//!     command: show version
//!     parser: textfsm
//!     path: "[0].serial"
//!     fallback_commands:
//!       - command: show inventory
//!         parser: textfsm
//!         path: "[0].sn"
//! sync_network_data:
//!   vlans:
//!     requires: vlans
//!     command: show vlan
//!     parser: textfsm
//!     path: "[*]"
//!   interfaces:
//!     sources:
//!       - command: show interfaces
//!         parser: textfsm
//!         path: "[*]"
//!         name_key: interface
//!       - command: show interfaces | json
//!         path: interfaces
//!         keyed: true
//!     attributes:
//!       mtu:
//!         path: mtu
//!     ip_addresses:
//!       address: ip_address
//!       prefix_length: prefix_length
//!     type_rules:
//!       - pattern: "^Port-channel"
//!         type: lag
//! ```
//!
//! Documents are validated once, when loaded: every path is parsed and every
//! pattern compiled, so a bad platform definition fails before any host is
//! processed.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MappingError;
use crate::host::{HostContext, Toggle};
use crate::path::PathExpr;
use crate::record::InterfaceType;
use crate::value::{Cast, Pick, Shape};

/// Backend that turned device text into the value the engine reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parser {
    /// Pattern-based text parser (TextFSM templates).
    #[serde(rename = "textfsm", alias = "pattern-text")]
    TextFsm,

    /// No parser; the raw output is used, typically JSON text.
    #[default]
    #[serde(rename = "none", alias = "raw")]
    None,
}

/// A command the connectivity layer must collect for a host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CommandRequest {
    pub command: String,
    pub parser: Parser,
}

/// Which mapping section a job evaluates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Section {
    /// Device identity fields.
    #[default]
    SyncDevices,

    /// Identity plus interfaces, VLANs and VRFs.
    SyncNetworkData,
}

impl Section {
    /// Key of this section in a mapping document.
    pub fn as_str(self) -> &'static str {
        match self {
            Section::SyncDevices => "sync_devices",
            Section::SyncNetworkData => "sync_network_data",
        }
    }
}

/// One (command, parser, path) source for a field.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub command: String,
    pub parser: Parser,
    pub path: PathExpr,
}

/// Mapping entry for one device-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Output field name.
    pub name: String,

    /// Primary source.
    pub source: CommandSpec,

    /// Sources tried in order when the primary yields an empty value.
    pub fallback_commands: Vec<CommandSpec>,

    /// Requested shape of the coerced value.
    pub shape: Shape,

    /// Element picked when a list is reduced to a scalar.
    pub pick: Pick,

    /// Conversion applied to the final value.
    pub cast: Option<Cast>,

    /// Toggle that must be on for this field to be evaluated.
    pub requires: Option<Toggle>,
}

impl FieldSpec {
    /// The primary source followed by the fallbacks, in order.
    pub fn candidates(&self) -> impl Iterator<Item = &CommandSpec> {
        std::iter::once(&self.source).chain(self.fallback_commands.iter())
    }
}

/// How an observation record names its interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceNaming {
    /// Record attribute holding the interface name, or a list of names.
    Key(String),

    /// The path selects a mapping keyed by interface name; each value is a record.
    MapKeys,
}

/// A command contributing per-interface observations.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceSource {
    /// Command and path selecting the observation records.
    pub spec: CommandSpec,

    /// Where each record's interface name comes from.
    pub naming: InterfaceNaming,

    /// Toggle that must be on for this source to be read.
    pub requires: Option<Toggle>,
}

/// Mapping entry for one interface attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    /// Output attribute name.
    pub name: String,

    /// Path relative to each observation record.
    pub path: PathExpr,

    /// Requested shape of each observed value.
    pub shape: Shape,

    /// Element picked when a list is reduced to a scalar.
    pub pick: Pick,

    /// Conversion applied to each observed value after `map`.
    pub cast: Option<Cast>,

    /// Toggle that must be on for this attribute to be evaluated.
    pub requires: Option<Toggle>,

    /// Commands this attribute reads from; empty means every source.
    pub sources: Vec<String>,

    /// Translation of observed scalar values.
    pub map: IndexMap<String, Value>,

    /// Value for observed scalars missing from `map`.
    pub default: Option<Value>,
}

impl AttributeSpec {
    /// Check whether observations from `command` feed this attribute.
    pub fn reads(&self, command: &str) -> bool {
        reads(&self.sources, command)
    }

    /// Apply the value map to one observed value.
    pub fn translate(&self, value: Value) -> Value {
        if self.map.is_empty() && self.default.is_none() {
            return value;
        }
        let key = match &value {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
        match key {
            Some(key) => match self.map.get(&key) {
                Some(mapped) => mapped.clone(),
                None => self.default.clone().unwrap_or(value),
            },
            None => value,
        }
    }
}

/// Where interface addresses come from.
#[derive(Debug, Clone, PartialEq)]
pub struct IpAddressSpec {
    /// Commands carrying addresses; empty means every source.
    pub sources: Vec<String>,

    /// Path to the address (or list of addresses) in each record.
    pub address: PathExpr,

    /// Path to the prefix length (or list of lengths) in each record.
    pub prefix_length: PathExpr,
}

impl IpAddressSpec {
    /// Check whether observations from `command` carry addresses.
    pub fn reads(&self, command: &str) -> bool {
        reads(&self.sources, command)
    }
}

/// Classification from a dedicated source attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAttribute {
    pub path: PathExpr,
    pub sources: Vec<String>,
    pub values: IndexMap<String, InterfaceType>,
}

impl TypeAttribute {
    pub fn reads(&self, command: &str) -> bool {
        reads(&self.sources, command)
    }
}

/// Name-pattern classification rule.
#[derive(Debug, Clone)]
pub struct TypeRule {
    pub pattern: Regex,
    pub kind: InterfaceType,
}

impl PartialEq for TypeRule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.as_str() == other.pattern.as_str() && self.kind == other.kind
    }
}

/// Mapping entry for the repeated interface record group.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceGroupSpec {
    /// Contributing commands, in evaluation order.
    pub sources: Vec<InterfaceSource>,

    /// Attributes built per interface, in output order.
    pub attributes: IndexMap<String, AttributeSpec>,

    /// Address extraction, if the platform reports addresses.
    pub ip_addresses: Option<IpAddressSpec>,

    /// Attribute-based classification, consulted before the name rules.
    pub type_attribute: Option<TypeAttribute>,

    /// Name-based classification rules, first match wins.
    pub type_rules: Vec<TypeRule>,
}

/// Mapping for one record type (one document section).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMapping {
    /// Device-level fields, in output order.
    pub fields: IndexMap<String, FieldSpec>,

    /// Interface group, if the section builds interfaces.
    pub interfaces: Option<InterfaceGroupSpec>,
}

impl RecordMapping {
    /// Parse a single section from YAML.
    pub fn from_yaml_str(name: &str, text: &str) -> Result<Self, MappingError> {
        let raw: RawRecordMapping =
            serde_yaml::from_str(text).map_err(|source| MappingError::Parse {
                platform: name.to_string(),
                source,
            })?;
        raw.compile()
    }

    /// Commands a host needs collected, deduplicated, in mapping order.
    ///
    /// Entries gated by a toggle the host has disabled are left out.
    pub fn commands(&self, ctx: &HostContext) -> Vec<CommandRequest> {
        let mut requests: Vec<CommandRequest> = Vec::new();
        let mut push = |spec: &CommandSpec| {
            if !requests
                .iter()
                .any(|r| r.command == spec.command && r.parser == spec.parser)
            {
                requests.push(CommandRequest {
                    command: spec.command.clone(),
                    parser: spec.parser,
                });
            }
        };

        for field in self.fields.values() {
            if ctx.allows(field.requires) {
                field.candidates().for_each(&mut push);
            }
        }
        if let Some(group) = &self.interfaces {
            for source in &group.sources {
                if ctx.allows(source.requires) {
                    push(&source.spec);
                }
            }
        }
        requests
    }
}

/// Validated mapping for one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformMapping {
    /// Platform name (e.g., "cisco_ios").
    pub platform: String,

    /// Device identity section.
    pub devices: RecordMapping,

    /// Network data section, if the platform supports it.
    pub network_data: Option<RecordMapping>,
}

impl PlatformMapping {
    /// Parse and validate a platform document.
    pub fn from_yaml_str(platform: &str, text: &str) -> Result<Self, MappingError> {
        let raw: RawPlatformDocument =
            serde_yaml::from_str(text).map_err(|source| MappingError::Parse {
                platform: platform.to_string(),
                source,
            })?;

        Ok(Self {
            platform: raw.platform.unwrap_or_else(|| platform.to_string()),
            devices: raw.sync_devices.compile()?,
            network_data: raw.sync_network_data.map(RawRecordMapping::compile).transpose()?,
        })
    }

    /// Load a platform document from a file.
    ///
    /// The platform name is the file stem unless the document sets `platform`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_yaml_str(&stem, &text)
    }

    /// Get a section.
    pub fn section(&self, section: Section) -> Option<&RecordMapping> {
        match section {
            Section::SyncDevices => Some(&self.devices),
            Section::SyncNetworkData => self.network_data.as_ref(),
        }
    }
}

/// Interface record keys filled by the engine itself.
const RESERVED_ATTRIBUTES: &[&str] = &["ip_addresses", "type"];

fn reads(sources: &[String], command: &str) -> bool {
    sources.is_empty() || sources.iter().any(|s| s == command)
}

// Raw document structures, as deserialized before validation.

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPlatformDocument {
    #[serde(default)]
    platform: Option<String>,
    sync_devices: RawRecordMapping,
    #[serde(default)]
    sync_network_data: Option<RawRecordMapping>,
}

#[derive(Debug, Deserialize)]
struct RawRecordMapping {
    #[serde(default)]
    interfaces: Option<RawInterfaceGroup>,
    #[serde(flatten)]
    fields: IndexMap<String, RawField>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    command: String,
    #[serde(default)]
    parser: Parser,
    path: String,
    #[serde(default)]
    shape: Shape,
    #[serde(default)]
    pick: Pick,
    #[serde(default)]
    cast: Option<Cast>,
    #[serde(default)]
    requires: Option<Toggle>,
    #[serde(default)]
    fallback_commands: Vec<RawCommand>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCommand {
    command: String,
    #[serde(default)]
    parser: Parser,
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInterfaceGroup {
    sources: Vec<RawInterfaceSource>,
    #[serde(default)]
    attributes: IndexMap<String, RawAttribute>,
    #[serde(default)]
    ip_addresses: Option<RawIpAddresses>,
    #[serde(default)]
    type_attribute: Option<RawTypeAttribute>,
    #[serde(default)]
    type_rules: Vec<RawTypeRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInterfaceSource {
    command: String,
    #[serde(default)]
    parser: Parser,
    path: String,
    #[serde(default)]
    name_key: Option<String>,
    #[serde(default)]
    keyed: bool,
    #[serde(default)]
    requires: Option<Toggle>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAttribute {
    path: String,
    #[serde(default)]
    shape: Shape,
    #[serde(default)]
    pick: Pick,
    #[serde(default)]
    cast: Option<Cast>,
    #[serde(default)]
    requires: Option<Toggle>,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    map: IndexMap<String, Value>,
    #[serde(default)]
    default: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIpAddresses {
    #[serde(default)]
    sources: Vec<String>,
    address: String,
    prefix_length: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTypeAttribute {
    path: String,
    #[serde(default)]
    sources: Vec<String>,
    values: IndexMap<String, InterfaceType>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTypeRule {
    pattern: String,
    #[serde(rename = "type")]
    kind: InterfaceType,
}

fn compile_path(field: &str, path: &str) -> Result<PathExpr, MappingError> {
    PathExpr::parse(path).map_err(|source| MappingError::InvalidPath {
        field: field.to_string(),
        path: path.to_string(),
        source,
    })
}

fn compile_command(
    field: &str,
    command: String,
    parser: Parser,
    path: &str,
) -> Result<CommandSpec, MappingError> {
    if command.trim().is_empty() {
        return Err(MappingError::InvalidField {
            field: field.to_string(),
            message: "command must not be empty".to_string(),
        });
    }
    Ok(CommandSpec {
        command,
        parser,
        path: compile_path(field, path)?,
    })
}

fn check_sources(
    field: &str,
    sources: &[String],
    known: &[InterfaceSource],
) -> Result<(), MappingError> {
    for source in sources {
        if !known.iter().any(|s| &s.spec.command == source) {
            return Err(MappingError::InvalidField {
                field: field.to_string(),
                message: format!("'{}' is not an interface source command", source),
            });
        }
    }
    Ok(())
}

fn check_cast(field: &str, shape: Shape, cast: Option<Cast>) -> Result<(), MappingError> {
    if shape == Shape::Mapping && cast.is_some() {
        return Err(MappingError::InvalidField {
            field: field.to_string(),
            message: "cast does not apply to mapping values".to_string(),
        });
    }
    Ok(())
}

impl RawRecordMapping {
    fn compile(self) -> Result<RecordMapping, MappingError> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for (name, raw) in self.fields {
            check_cast(&name, raw.shape, raw.cast)?;
            let source = compile_command(&name, raw.command, raw.parser, &raw.path)?;
            let fallback_commands = raw
                .fallback_commands
                .into_iter()
                .map(|fb| compile_command(&name, fb.command, fb.parser, &fb.path))
                .collect::<Result<Vec<_>, _>>()?;
            fields.insert(
                name.clone(),
                FieldSpec {
                    name,
                    source,
                    fallback_commands,
                    shape: raw.shape,
                    pick: raw.pick,
                    cast: raw.cast,
                    requires: raw.requires,
                },
            );
        }

        let interfaces = self.interfaces.map(RawInterfaceGroup::compile).transpose()?;

        Ok(RecordMapping { fields, interfaces })
    }
}

impl RawInterfaceGroup {
    fn compile(self) -> Result<InterfaceGroupSpec, MappingError> {
        if self.sources.is_empty() {
            return Err(MappingError::InvalidField {
                field: "interfaces".to_string(),
                message: "at least one source is required".to_string(),
            });
        }

        let mut sources = Vec::with_capacity(self.sources.len());
        for raw in self.sources {
            let label = format!("interfaces.sources[{}]", raw.command);
            let naming = match (raw.name_key, raw.keyed) {
                (Some(key), false) if !key.trim().is_empty() => InterfaceNaming::Key(key),
                (None, true) => InterfaceNaming::MapKeys,
                _ => {
                    return Err(MappingError::InvalidField {
                        field: label,
                        message: "exactly one of a non-empty name_key or keyed: true is required"
                            .to_string(),
                    });
                }
            };
            sources.push(InterfaceSource {
                spec: compile_command(&label, raw.command, raw.parser, &raw.path)?,
                naming,
                requires: raw.requires,
            });
        }

        let mut attributes = IndexMap::with_capacity(self.attributes.len());
        for (name, raw) in self.attributes {
            let label = format!("interfaces.{}", name);
            if RESERVED_ATTRIBUTES.contains(&name.as_str()) {
                return Err(MappingError::InvalidField {
                    field: label,
                    message: "name is reserved".to_string(),
                });
            }
            check_sources(&label, &raw.sources, &sources)?;
            check_cast(&label, raw.shape, raw.cast)?;
            attributes.insert(
                name.clone(),
                AttributeSpec {
                    path: compile_path(&label, &raw.path)?,
                    name,
                    shape: raw.shape,
                    pick: raw.pick,
                    cast: raw.cast,
                    requires: raw.requires,
                    sources: raw.sources,
                    map: raw.map,
                    default: raw.default,
                },
            );
        }

        let ip_addresses = match self.ip_addresses {
            Some(raw) => {
                let label = "interfaces.ip_addresses";
                check_sources(label, &raw.sources, &sources)?;
                Some(IpAddressSpec {
                    address: compile_path(label, &raw.address)?,
                    prefix_length: compile_path(label, &raw.prefix_length)?,
                    sources: raw.sources,
                })
            }
            None => None,
        };

        let type_attribute = match self.type_attribute {
            Some(raw) => {
                let label = "interfaces.type_attribute";
                check_sources(label, &raw.sources, &sources)?;
                Some(TypeAttribute {
                    path: compile_path(label, &raw.path)?,
                    sources: raw.sources,
                    values: raw.values,
                })
            }
            None => None,
        };

        let type_rules = self
            .type_rules
            .into_iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|pattern| TypeRule {
                        pattern,
                        kind: rule.kind,
                    })
                    .map_err(|source| MappingError::InvalidPattern {
                        pattern: rule.pattern,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InterfaceGroupSpec {
            sources,
            attributes,
            ip_addresses,
            type_attribute,
            type_rules,
        })
    }
}
