//! Record aggregation.
//!
//! [`build_device_record`] turns one host's collected command results into a
//! [`DeviceRecord`] by evaluating every entry of a [`RecordMapping`]:
//!
//! - device fields run the extraction primitive against their command, then
//!   against each fallback until one produces a non-empty value
//! - interface sources are split into per-interface observations, grouped by
//!   interface name across all commands, and every attribute is collected
//!   over the observations of its bucket
//!
//! Collected interface attributes follow the collapse rule: one observed
//! value is stored as a scalar, two or more are stored as the ordered list
//! (command order, then record order), identical values included.

use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde_json::Value;

use crate::error::HostError;
use crate::extract::{coerce, extract_with};
use crate::host::HostContext;
use crate::mapping::{
    CommandSpec, FieldSpec, InterfaceGroupSpec, InterfaceNaming, InterfaceSource, IpAddressSpec,
    RecordMapping,
};
use crate::record::{DeviceRecord, InterfaceRecord, InterfaceType, IpAddress};
use crate::value::{Cast, CommandResults, Normalized, Shape, scalar_text};

/// Build the normalized record of one host.
///
/// Missing command results read as empty, so absent data only ever yields
/// empty values. The only failure is raw data the engine cannot interpret,
/// such as an interface named by a mapping or a boolean.
pub fn build_device_record(
    ctx: &HostContext,
    mapping: &RecordMapping,
    results: &CommandResults,
) -> Result<DeviceRecord, HostError> {
    let mut fields = IndexMap::with_capacity(mapping.fields.len());
    for field in mapping.fields.values() {
        if !ctx.allows(field.requires) {
            debug!("{}: skipping gated field '{}'", ctx.name, field.name);
            continue;
        }
        let value = evaluate_field(ctx, field, results);
        debug!("{}: {} = {}", ctx.name, field.name, value);
        fields.insert(field.name.clone(), value);
    }

    let interfaces = match &mapping.interfaces {
        Some(group) => Some(build_interfaces(ctx, group, results)?),
        None => None,
    };

    Ok(DeviceRecord { fields, interfaces })
}

fn evaluate_field(ctx: &HostContext, field: &FieldSpec, results: &CommandResults) -> Value {
    cast(field.cast, lookup_field(ctx, field, results))
}

fn lookup_field(ctx: &HostContext, field: &FieldSpec, results: &CommandResults) -> Value {
    let run = |spec: &CommandSpec| {
        let raw = results.get(&spec.command);
        extract_with(raw, &spec.path, ctx, field.shape, field.pick)
    };

    if field.fallback_commands.is_empty() {
        return run(&field.source).coerced;
    }

    for spec in field.candidates() {
        let extraction = run(spec);
        if !extraction.is_empty() {
            return extraction.coerced;
        }
        debug!(
            "{}: '{}' found nothing in '{}', trying next source",
            ctx.name, field.name, spec.command
        );
    }
    field.shape.empty()
}

/// One record contributed by one command for one interface.
#[derive(Debug)]
struct Observation<'a> {
    command: &'a str,
    record: Value,
}

/// Observations plus the interface buckets indexing into them.
#[derive(Debug, Default)]
struct Buckets<'a> {
    observations: Vec<Observation<'a>>,
    by_name: IndexMap<String, Vec<usize>>,
}

impl<'a> Buckets<'a> {
    fn push(&mut self, command: &'a str, names: Vec<String>, record: Value) {
        let index = self.observations.len();
        self.observations.push(Observation { command, record });
        for name in names {
            self.by_name.entry(name).or_default().push(index);
        }
    }

    fn bucket(&self, indices: &[usize]) -> impl Iterator<Item = &Observation<'a>> + Clone {
        indices
            .iter()
            .filter_map(move |&i| self.observations.get(i))
    }
}

fn build_interfaces(
    ctx: &HostContext,
    group: &InterfaceGroupSpec,
    results: &CommandResults,
) -> Result<IndexMap<String, InterfaceRecord>, HostError> {
    let mut buckets = Buckets::default();
    for source in &group.sources {
        if !ctx.allows(source.requires) {
            debug!(
                "{}: skipping gated source '{}'",
                ctx.name, source.spec.command
            );
            continue;
        }
        collect_observations(ctx, source, results, &mut buckets)?;
    }

    let mut interfaces = IndexMap::with_capacity(buckets.by_name.len());
    for (name, indices) in &buckets.by_name {
        let bucket = buckets.bucket(indices);
        trace!(
            "{}: interface {} has {} observation(s)",
            ctx.name,
            name,
            indices.len()
        );

        let mut attributes = IndexMap::with_capacity(group.attributes.len());
        for spec in group.attributes.values() {
            if !ctx.allows(spec.requires) {
                continue;
            }
            let values: Vec<Value> = bucket
                .clone()
                .filter(|obs| spec.reads(obs.command))
                .filter_map(|obs| match spec.path.evaluate(&obs.record, ctx) {
                    Value::Null => None,
                    matched => {
                        let value = spec.translate(coerce(&matched, spec.shape, spec.pick));
                        Some(cast(spec.cast, value))
                    }
                })
                .collect();
            attributes.insert(spec.name.clone(), collapse(values, spec.shape));
        }

        let ip_addresses = group
            .ip_addresses
            .as_ref()
            .map(|spec| collect_addresses(ctx, spec, bucket.clone()));

        let kind = classify(ctx, group, name, bucket);

        interfaces.insert(
            name.clone(),
            InterfaceRecord {
                attributes,
                ip_addresses,
                kind,
            },
        );
    }

    debug!("{}: built {} interface(s)", ctx.name, interfaces.len());
    Ok(interfaces)
}

fn collect_observations<'a>(
    ctx: &HostContext,
    source: &'a InterfaceSource,
    results: &CommandResults,
    buckets: &mut Buckets<'a>,
) -> Result<(), HostError> {
    let command = source.spec.command.as_str();
    let data = match results.get(command).normalize() {
        Normalized::Data(data) => data,
        Normalized::Empty => return Ok(()),
        Normalized::Plain => {
            debug!(
                "{}: '{}' returned unstructured text, no interfaces read",
                ctx.name, command
            );
            return Ok(());
        }
    };

    let selected = source.spec.path.evaluate(&data, ctx);
    match &source.naming {
        InterfaceNaming::Key(key) => {
            let records = match selected {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                record @ Value::Object(_) => vec![record],
                other => {
                    warn!(
                        "{}: '{}' path '{}' selected {} instead of records",
                        ctx.name, command, source.spec.path, other
                    );
                    Vec::new()
                }
            };
            for record in records {
                if !record.is_object() {
                    warn!(
                        "{}: skipping non-record entry in '{}': {}",
                        ctx.name, command, record
                    );
                    continue;
                }
                let names = interface_names(ctx, command, key, record.get(key.as_str()))?;
                if !names.is_empty() {
                    buckets.push(command, names, record);
                }
            }
        }
        InterfaceNaming::MapKeys => match selected {
            Value::Object(map) => {
                for (name, record) in map {
                    if name.is_empty() || !record.is_object() {
                        warn!("{}: skipping entry '{}' in '{}'", ctx.name, name, command);
                        continue;
                    }
                    buckets.push(command, vec![name], record);
                }
            }
            Value::Null => {}
            other => warn!(
                "{}: '{}' path '{}' selected {} instead of a keyed mapping",
                ctx.name,
                command,
                source.spec.path,
                type_name(&other)
            ),
        },
    }
    Ok(())
}

/// Interface names held under a record's name key.
///
/// A list of names (e.g. aggregate members) files the record under each
/// distinct name once.
fn interface_names(
    ctx: &HostContext,
    command: &str,
    key: &str,
    value: Option<&Value>,
) -> Result<Vec<String>, HostError> {
    let invalid = |found: &Value| HostError::InvalidInterfaceName {
        host: ctx.name.clone(),
        command: command.to_string(),
        name_key: key.to_string(),
        found: found.to_string(),
    };

    let mut names = Vec::new();
    match value {
        None | Some(Value::Null) => {
            warn!(
                "{}: record in '{}' has no '{}', skipped",
                ctx.name, command, key
            );
        }
        Some(Value::Array(items)) => {
            for item in items {
                let name = match item {
                    Value::String(s) if !s.is_empty() => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::String(_) | Value::Null => continue,
                    other => return Err(invalid(other)),
                };
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Some(Value::String(s)) if s.is_empty() => {
            warn!(
                "{}: record in '{}' has an empty '{}', skipped",
                ctx.name, command, key
            );
        }
        Some(Value::String(s)) => names.push(s.clone()),
        Some(Value::Number(n)) => names.push(n.to_string()),
        Some(other) => return Err(invalid(other)),
    }
    Ok(names)
}

fn cast(cast: Option<Cast>, value: Value) -> Value {
    match cast {
        Some(cast) => cast.apply(value),
        None => value,
    }
}

/// Apply the collapse rule.
fn collapse(mut values: Vec<Value>, shape: Shape) -> Value {
    match values.len() {
        0 => shape.empty(),
        1 => values.pop().unwrap_or_else(|| shape.empty()),
        _ => Value::Array(values),
    }
}

fn collect_addresses<'o, 'a: 'o>(
    ctx: &HostContext,
    spec: &IpAddressSpec,
    bucket: impl Iterator<Item = &'o Observation<'a>>,
) -> Vec<IpAddress> {
    let mut addresses: Vec<IpAddress> = Vec::new();
    for obs in bucket.filter(|obs| spec.reads(obs.command)) {
        let address = spec.address.evaluate(&obs.record, ctx);
        let prefix = spec.prefix_length.evaluate(&obs.record, ctx);

        let pairs: Vec<(&Value, &Value)> = match (&address, &prefix) {
            (Value::Array(addrs), Value::Array(prefixes)) => addrs
                .iter()
                .enumerate()
                .map(|(i, a)| (a, prefixes.get(i).unwrap_or(&Value::Null)))
                .collect(),
            (Value::Array(addrs), prefix) => addrs.iter().map(|a| (a, prefix)).collect(),
            (address, prefix) => vec![(address, prefix)],
        };

        for (address, prefix) in pairs {
            let (Some(address), Some(prefix_length)) = (scalar_text(address), scalar_text(prefix))
            else {
                warn!(
                    "{}: ignoring non-scalar address data in '{}'",
                    ctx.name, obs.command
                );
                continue;
            };
            if address.is_empty() {
                continue;
            }
            let entry = IpAddress {
                address,
                prefix_length,
            };
            if !addresses.contains(&entry) {
                addresses.push(entry);
            }
        }
    }
    addresses
}

/// Classify an interface: the type attribute first, then the name rules.
fn classify<'o, 'a: 'o>(
    ctx: &HostContext,
    group: &InterfaceGroupSpec,
    name: &str,
    bucket: impl Iterator<Item = &'o Observation<'a>>,
) -> InterfaceType {
    if let Some(attr) = &group.type_attribute {
        for obs in bucket.filter(|obs| attr.reads(obs.command)) {
            let found = attr.path.evaluate(&obs.record, ctx);
            if let Some(kind) = scalar_text(&found).and_then(|text| attr.values.get(&text)) {
                return *kind;
            }
        }
    }
    group
        .type_rules
        .iter()
        .find(|rule| rule.pattern.is_match(name))
        .map(|rule| rule.kind)
        .unwrap_or_default()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Toggle;
    use crate::mapping::PlatformMapping;
    use crate::platforms::{ARISTA_EOS, CISCO_IOS};
    use serde_json::json;

    const CISCO_RESULTS: &str = include_str!("../testdata/cisco_ios/command_results.json");
    const ARISTA_RESULTS: &str = include_str!("../testdata/arista_eos/command_results.json");

    fn cisco() -> (PlatformMapping, CommandResults) {
        (
            PlatformMapping::from_yaml_str("cisco_ios", CISCO_IOS).unwrap(),
            serde_json::from_str(CISCO_RESULTS).unwrap(),
        )
    }

    fn arista() -> (PlatformMapping, CommandResults) {
        (
            PlatformMapping::from_yaml_str("arista_eos", ARISTA_EOS).unwrap(),
            serde_json::from_str(ARISTA_RESULTS).unwrap(),
        )
    }

    fn host() -> HostContext {
        HostContext::new("10.255.0.16", "10.255.0.16").with_platform("cisco_ios")
    }

    #[test]
    fn test_sync_devices_end_to_end() {
        let (mapping, results) = cisco();
        let record = build_device_record(&host(), &mapping.devices, &results).unwrap();

        assert_eq!(
            record.to_value(),
            json!({
                "hostname": "dummy_rtr",
                "serial": "CAT1451S15C",
                "device_type": "WS-C4948E",
                "mgmt_interface": "Vlan1",
                "mask_length": 16,
            })
        );
        assert!(record.interfaces.is_none());
    }

    #[test]
    fn test_sync_network_data_interfaces() {
        let (mapping, results) = cisco();
        let section = mapping.network_data.as_ref().unwrap();
        let record = build_device_record(&host(), section, &results).unwrap();

        assert_eq!(record.get("serial"), Some(&json!("CAT1451S15C")));
        let names: Vec<&String> = record.interfaces.as_ref().unwrap().keys().collect();
        assert_eq!(
            names,
            vec![
                "GigabitEthernet0/0",
                "GigabitEthernet0/1",
                "GigabitEthernet0/2",
                "GigabitEthernet0/3",
                "GigabitEthernet1/0",
                "Loopback0",
                "Port-channel1",
                "Port-channel3",
                "Vlan1",
            ]
        );

        let g01 = record.interface("GigabitEthernet0/1").unwrap();
        assert_eq!(
            serde_json::to_value(g01).unwrap(),
            json!({
                "mac_address": "fa16.3e4f.41cc",
                "mtu": "1500",
                "description": "to iosvl2-2",
                "link_status": true,
                "802.1Q_mode": "tagged-all",
                "lag": "Port-channel1",
                "ip_addresses": [],
                "type": "other",
            })
        );

        let g02 = record.interface("GigabitEthernet0/2").unwrap();
        assert_eq!(
            g02.get("description"),
            Some(&json!(["to iosvl2-4", "Port"]))
        );
        assert_eq!(
            g02.get("mac_address"),
            Some(&json!(["fa16.3ea3.3e49", "78da.6eaf.3b82"]))
        );
        assert_eq!(g02.get("mtu"), Some(&json!(["1500", "1500"])));
        assert_eq!(g02.get("802.1Q_mode"), Some(&json!("access")));
        assert_eq!(g02.get("lag"), Some(&json!("Port-channel1")));

        let g00 = record.interface("GigabitEthernet0/0").unwrap();
        assert_eq!(g00.get("link_status"), Some(&json!(false)));
        assert_eq!(g00.get("802.1Q_mode"), Some(&json!("")));
        assert_eq!(g00.get("lag"), Some(&json!([])));

        let lo = record.interface("Loopback0").unwrap();
        assert_eq!(lo.get("mac_address"), Some(&json!("")));
        assert_eq!(lo.get("mtu"), Some(&json!("1514")));
        assert_eq!(lo.kind, InterfaceType::Other);

        assert_eq!(
            record.interface("Port-channel1").unwrap().kind,
            InterfaceType::Lag
        );
        assert_eq!(
            record.interface("GigabitEthernet1/0").unwrap().get("lag"),
            Some(&json!("Port-channel3"))
        );

        let vlan1 = record.interface("Vlan1").unwrap();
        assert_eq!(vlan1.kind, InterfaceType::Virtual);
        assert_eq!(
            vlan1.ip_addresses,
            Some(vec![IpAddress::new("10.255.0.16", "16")])
        );
    }

    #[test]
    fn test_toggles_gate_fields_and_attributes() {
        let (mapping, results) = cisco();
        let section = mapping.network_data.as_ref().unwrap();

        let record = build_device_record(&host(), section, &results).unwrap();
        assert!(record.get("vlans").is_none());
        assert!(record.get("vrfs").is_none());
        let g02 = record.interface("GigabitEthernet0/2").unwrap();
        assert!(g02.get("untagged_vlan").is_none());
        assert!(g02.get("vrf").is_none());

        let ctx = host()
            .with_toggle(Toggle::Vlans, true)
            .with_toggle(Toggle::Vrfs, true);
        let record = build_device_record(&ctx, section, &results).unwrap();
        assert_eq!(
            record.get("vlans").unwrap().as_array().map(Vec::len),
            Some(2)
        );
        let g02 = record.interface("GigabitEthernet0/2").unwrap();
        assert_eq!(g02.get("untagged_vlan"), Some(&json!("20")));
        assert_eq!(g02.get("tagged_vlans"), Some(&json!(["ALL"])));
        assert_eq!(g02.get("vrf"), Some(&json!("")));
        assert_eq!(
            record.interface("GigabitEthernet0/0").unwrap().get("vrf"),
            Some(&json!("MGMT"))
        );
    }

    #[test]
    fn test_fallback_commands() {
        let (mapping, _) = cisco();
        let results = CommandResults::new()
            .with(
                "show version",
                json!([{"hostname": "dummy_rtr", "serial": ""}]),
            )
            .with("show inventory", json!([{"sn": "FOC1234X0AB"}]));
        let record = build_device_record(&host(), &mapping.devices, &results).unwrap();
        assert_eq!(record.get("serial"), Some(&json!("FOC1234X0AB")));

        let results =
            CommandResults::new().with("show version", json!([{"hostname": "dummy_rtr"}]));
        let record = build_device_record(&host(), &mapping.devices, &results).unwrap();
        assert_eq!(record.get("serial"), Some(&json!([])));
    }

    #[test]
    fn test_missing_results_degrade_to_empty() {
        let (mapping, _) = cisco();
        let section = mapping.network_data.as_ref().unwrap();
        let record = build_device_record(&host(), section, &CommandResults::new()).unwrap();
        assert_eq!(record.get("serial"), Some(&json!([])));
        assert_eq!(record.interfaces, Some(IndexMap::new()));

        let record =
            build_device_record(&host(), &mapping.devices, &CommandResults::new()).unwrap();
        assert_eq!(record.get("hostname"), Some(&json!("")));
        assert_eq!(record.get("mgmt_interface"), Some(&json!("")));
    }

    #[test]
    fn test_collapse_rule() {
        let mapping = RecordMapping::from_yaml_str(
            "collapse",
            r#"
interfaces:
  sources:
    - command: a
      path: "[*]"
      name_key: name
    - command: b
      path: "[*]"
      name_key: name
  attributes:
    description:
      path: description
      shape: string
"#,
        )
        .unwrap();
        let results = CommandResults::new()
            .with(
                "a",
                json!([{"name": "Gi1", "description": "up"}, {"name": "Gi2", "description": "x"}]),
            )
            .with(
                "b",
                json!([{"name": "Gi2", "description": "x"}, {"name": "Gi3"}]),
            );
        let record = build_device_record(&host(), &mapping, &results).unwrap();

        let description = |name: &str| record.interface(name).unwrap().get("description");
        assert_eq!(description("Gi1"), Some(&json!("up")));
        // duplicates still make a list
        assert_eq!(description("Gi2"), Some(&json!(["x", "x"])));
        assert_eq!(description("Gi3"), Some(&json!("")));
        assert!(record.interface("Gi1").unwrap().ip_addresses.is_none());
    }

    #[test]
    fn test_repeated_member_names_count_once() {
        let mapping = RecordMapping::from_yaml_str(
            "members",
            r#"
interfaces:
  sources:
    - command: show etherchannel summary
      path: "[*]"
      name_key: members
  attributes:
    lag:
      path: bundle
"#,
        )
        .unwrap();
        let results = CommandResults::new().with(
            "show etherchannel summary",
            json!([{"bundle": "Po1", "members": ["Gi1", "Gi1", "Gi2"]}]),
        );
        let record = build_device_record(&host(), &mapping, &results).unwrap();

        let names: Vec<&String> = record.interfaces.as_ref().unwrap().keys().collect();
        assert_eq!(names, vec!["Gi1", "Gi2"]);
        assert_eq!(
            record.interface("Gi1").unwrap().get("lag"),
            Some(&json!("Po1"))
        );
        assert_eq!(
            record.interface("Gi2").unwrap().get("lag"),
            Some(&json!("Po1"))
        );
    }

    #[test]
    fn test_cast_applies_to_fields_and_attributes() {
        let mapping = RecordMapping::from_yaml_str(
            "cast",
            r#"
mask_length:
  command: a
  path: "[0].prefix_length"
  shape: string
  cast: int
interfaces:
  sources:
    - command: a
      path: "[*]"
      name_key: name
    - command: b
      path: "[*]"
      name_key: name
  attributes:
    mtu:
      path: mtu
      shape: string
      cast: int
    enabled:
      path: enabled
      shape: string
      map:
        up: "yes"
      default: "no"
      cast: bool
"#,
        )
        .unwrap();
        let results = CommandResults::new()
            .with(
                "a",
                json!([{"name": "Gi1", "prefix_length": "24", "mtu": "1500", "enabled": "up"}]),
            )
            .with(
                "b",
                json!([{"name": "Gi1", "mtu": "auto", "enabled": "down"}]),
            );
        let record = build_device_record(&host(), &mapping, &results).unwrap();

        assert_eq!(record.get("mask_length"), Some(&json!(24)));
        let gi1 = record.interface("Gi1").unwrap();
        assert_eq!(gi1.get("mtu"), Some(&json!([1500, "auto"])));
        assert_eq!(gi1.get("enabled"), Some(&json!([true, false])));

        // nothing found keeps the shaped empty value
        let record = build_device_record(&host(), &mapping, &CommandResults::new()).unwrap();
        assert_eq!(record.get("mask_length"), Some(&json!("")));
    }

    #[test]
    fn test_invalid_interface_name() {
        let mapping = RecordMapping::from_yaml_str(
            "bad",
            "interfaces:\n  sources:\n    - command: a\n      path: \"[*]\"\n      name_key: name\n",
        )
        .unwrap();
        let results = CommandResults::new().with("a", json!([{"name": {"nested": true}}]));
        let err = build_device_record(&host(), &mapping, &results).unwrap_err();
        assert!(matches!(err, HostError::InvalidInterfaceName { .. }));

        // unnamed records are skipped, not fatal
        let results =
            CommandResults::new().with("a", json!([{"mtu": "1500"}, {"name": ""}, "text"]));
        let record = build_device_record(&host(), &mapping, &results).unwrap();
        assert_eq!(record.interfaces, Some(IndexMap::new()));
    }

    #[test]
    fn test_json_text_platform() {
        let (mapping, results) = arista();
        let ctx = HostContext::new("leaf1", "192.0.2.10").with_toggle(Toggle::Vlans, true);

        let devices = build_device_record(&ctx, &mapping.devices, &results).unwrap();
        assert_eq!(devices.get("hostname"), Some(&json!("leaf1")));
        assert_eq!(devices.get("serial"), Some(&json!("JPE15201234")));
        assert_eq!(devices.get("device_type"), Some(&json!("DCS-7050TX-64")));
        assert_eq!(devices.get("mgmt_interface"), Some(&json!("Management1")));
        assert_eq!(devices.get("mask_length"), Some(&json!(24)));

        let section = mapping.network_data.as_ref().unwrap();
        let record = build_device_record(&ctx, section, &results).unwrap();
        assert_eq!(
            record.get("vlans").and_then(|v| v.get("20")),
            Some(&json!({"name": "users", "status": "active"}))
        );

        let eth1 = record.interface("Ethernet1").unwrap();
        assert_eq!(eth1.get("mtu"), Some(&json!(9214)));
        assert_eq!(eth1.get("link_status"), Some(&json!(true)));
        assert_eq!(eth1.get("802.1Q_mode"), Some(&json!("tagged-all")));
        assert_eq!(eth1.get("tagged_vlans"), Some(&json!("10,20")));
        assert_eq!(eth1.ip_addresses, Some(Vec::new()));
        assert_eq!(eth1.kind, InterfaceType::Other);

        let eth2 = record.interface("Ethernet2").unwrap();
        assert_eq!(eth2.get("untagged_vlan"), Some(&json!(20)));
        assert_eq!(eth2.get("link_status"), Some(&json!(false)));

        assert_eq!(
            record.interface("Port-Channel10").unwrap().kind,
            InterfaceType::Lag
        );
        let lo = record.interface("Loopback0").unwrap();
        assert_eq!(lo.kind, InterfaceType::Virtual);
        assert_eq!(lo.get("mac_address"), Some(&json!("")));
        assert_eq!(
            lo.ip_addresses,
            Some(vec![IpAddress::new("10.0.0.1", "32")])
        );
        assert_eq!(
            record.interface("Vlan20").unwrap().kind,
            InterfaceType::Virtual
        );
    }

    #[test]
    fn test_address_lists_are_paired() {
        let mapping = RecordMapping::from_yaml_str(
            "addrs",
            r#"
interfaces:
  sources:
    - command: a
      path: "[*]"
      name_key: name
  ip_addresses:
    address: "addrs[*].ip"
    prefix_length: "addrs[*].len"
"#,
        )
        .unwrap();
        let results = CommandResults::new().with(
            "a",
            json!([
                {
                    "name": "Vlan10",
                    "addrs": [{"ip": "10.0.0.1", "len": 24}, {"ip": "10.0.1.1", "len": 24}]
                },
                {"name": "Vlan10", "addrs": [{"ip": "10.0.0.1", "len": 24}]},
            ]),
        );
        let record = build_device_record(&host(), &mapping, &results).unwrap();
        assert_eq!(
            record.interface("Vlan10").unwrap().ip_addresses,
            Some(vec![
                IpAddress::new("10.0.0.1", "24"),
                IpAddress::new("10.0.1.1", "24"),
            ])
        );
    }
}
