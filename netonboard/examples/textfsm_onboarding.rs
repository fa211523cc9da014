//! TextFSM Onboarding Example
//!
//! This example parses captured Cisco IOS CLI output with textfsm-rust and
//! feeds the records to the built-in `cisco_ios` mapping, the way a
//! connectivity layer would after running the commands on a device.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example textfsm_onboarding
//! ```

use std::collections::HashMap;

use netonboard::platforms::MappingRegistry;
use netonboard::{CommandResults, HostContext, OnboardingJob, Section};
use serde_json::{Map, Value};
use textfsm_rust::Template;

/// Holds a command, its captured output and the template that parses it
struct CapturedCommand {
    command: &'static str,
    output: &'static str,
    template: &'static str,
}

const SHOW_VERSION_TEMPLATE: &str = r"Value hostname (\S+)
Value hardware (\S+)
Value serial (\S+)

Start
  ^\s*${hostname}\s+uptime\s+is
  ^[Cc]isco\s+${hardware}\s+\(.+\)\s+processor
  ^[Pp]rocessor\s+board\s+ID\s+${serial}
  ^[Cc]onfiguration\s+register -> Record
";

const SHOW_VERSION_OUTPUT: &str = "Cisco IOS Software, Catalyst 4500 L3 Switch Software (cat4500e-ENTSERVICESK9-M), Version 15.2(4)E10
dummy_rtr uptime is 2 weeks, 3 days, 1 hour, 12 minutes
System returned to ROM by reload
cisco WS-C4948E (MPC8572) processor (revision 11) with 2097152K bytes of memory.
Processor board ID CAT1451S15C
Configuration register is 0x2102
";

const SHOW_INTERFACES_TEMPLATE: &str = r"Value Required interface (\S+)
Value link_status (.+?)
Value mac_address ([a-fA-F0-9]{4}\.[a-fA-F0-9]{4}\.[a-fA-F0-9]{4})
Value description (.+)
Value ip_address (\d+\.\d+\.\d+\.\d+)
Value prefix_length (\d+)
Value mtu (\d+)

Start
  ^\S+\s+is\s+.+,\s+line\s+protocol -> Continue.Record
  ^${interface}\s+is\s+${link_status},\s+line\s+protocol\s+is
  ^\s+Hardware\s+is\s+.+address\s+is\s+${mac_address}
  ^\s+Description:\s+${description}
  ^\s+Internet\s+address\s+is\s+${ip_address}\/${prefix_length}
  ^\s+MTU\s+${mtu}\s+bytes
";

const SHOW_INTERFACES_OUTPUT: &str = "GigabitEthernet0/1 is up, line protocol is up (connected)
  Hardware is Gigabit Ethernet Port, address is fa16.3e4f.41cc (bia fa16.3e4f.41cc)
  Description: to iosvl2-2
  MTU 1500 bytes, BW 1000000 Kbit/sec, DLY 10 usec,
Vlan1 is up, line protocol is up
  Hardware is Ethernet SVI, address is fa16.3e57.8001 (bia fa16.3e57.8001)
  Description: OOB Management
  Internet address is 10.255.0.16/16
  MTU 1500 bytes, BW 1000000 Kbit/sec, DLY 10 usec,
";

const CAPTURED: &[CapturedCommand] = &[
    CapturedCommand {
        command: "show version",
        output: SHOW_VERSION_OUTPUT,
        template: SHOW_VERSION_TEMPLATE,
    },
    CapturedCommand {
        command: "show interfaces",
        output: SHOW_INTERFACES_OUTPUT,
        template: SHOW_INTERFACES_TEMPLATE,
    },
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for field-level traces)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut results = CommandResults::new();
    for captured in CAPTURED {
        let records = parse_with_textfsm(captured.output, captured.template)?;
        println!("{}: {} record(s)", captured.command, records.len());
        results.insert(captured.command, to_value(records));
    }
    // Commands the device never answered read as empty output
    results.insert("show inventory", "");

    let job = OnboardingJob::builder(MappingRegistry::builtin()?)
        .section(Section::SyncDevices)
        .build();

    let host = HostContext::new("dummy_rtr", "10.255.0.16").with_platform("cisco_ios");
    println!("\nCommands needed for {}:", host.name);
    for request in job.commands(&host)? {
        println!("  {} ({:?})", request.command, request.parser);
    }

    let report = job.process_batch(&[(host, results)]);
    println!("\n--- Report ---\n");
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Parse text output using a TextFSM template
fn parse_with_textfsm(
    output: &str,
    template_str: &str,
) -> Result<Vec<HashMap<String, String>>, Box<dyn std::error::Error>> {
    let template = Template::parse_str(template_str)?;
    let mut parser = template.parser();
    let records = parser.parse_text_to_dicts(output)?;
    Ok(records)
}

/// Turn parsed records into the list-of-mappings value the engine reads.
fn to_value(records: Vec<HashMap<String, String>>) -> Value {
    records
        .into_iter()
        .map(|record| {
            record
                .into_iter()
                .map(|(key, value)| (key.to_lowercase(), Value::String(value)))
                .collect::<Map<String, Value>>()
        })
        .map(Value::Object)
        .collect()
}
