//! # netonboard
//!
//! Declarative extraction and normalization of network device command output
//! for inventory onboarding.
//!
//! A per-platform mapping document says, for each inventory field, which
//! command to read, which path to query in its (parsed) output and what shape
//! the value should take. The engine applies the mapping to the command
//! results collected from one host and produces a normalized
//! [`DeviceRecord`].
//!
//! ## Features
//!
//! - Tolerant extraction: empty output, plain text and unmatched paths
//!   degrade to empty values instead of errors
//! - A small path-query language with wildcards, filters and `{{ host }}`
//!   interpolation
//! - Interface aggregation across several commands with a predictable
//!   collapse rule
//! - Built-in Cisco IOS and Arista EOS mappings, plus YAML documents loaded
//!   from disk
//! - Batch jobs over many hosts with per-host failure isolation
//!
//! ## Quick Start
//!
//! ```rust
//! use netonboard::{CommandResults, HostContext, build_device_record};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), netonboard::Error> {
//! let mapping = netonboard::platforms::cisco_ios()?;
//! let host = HostContext::new("rtr1", "10.255.0.16");
//!
//! let results = CommandResults::new().with(
//!     "show version",
//!     json!([{"hostname": "dummy_rtr", "serial": "CAT1451S15C", "hardware": "WS-C4948E"}]),
//! );
//!
//! let record = build_device_record(&host, &mapping.devices, &results)?;
//! assert_eq!(record.get("serial"), Some(&json!("CAT1451S15C")));
//! assert_eq!(record.get("hostname"), Some(&json!("dummy_rtr")));
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod extract;
pub mod host;
pub mod job;
pub mod mapping;
pub mod path;
pub mod platforms;
pub mod record;
pub mod value;

// Re-export main types for convenience
pub use engine::build_device_record;
pub use error::{CollectError, Error, HostError, MappingError, Result};
pub use extract::{Extraction, extract};
pub use host::{HostContext, Toggle};
pub use job::{
    BatchReport, CancelToken, CommandRunner, FailReason, HostOutcome, OnboardingJob,
    OnboardingStatus,
};
pub use mapping::{CommandRequest, Parser, PlatformMapping, RecordMapping, Section};
pub use path::PathExpr;
pub use record::{DeviceRecord, InterfaceRecord, InterfaceType, IpAddress};
pub use value::{Cast, CommandResults, Pick, RawResult, Shape};
