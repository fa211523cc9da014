//! Batch onboarding jobs.
//!
//! A job runs the aggregation engine once per host. Command output is
//! collected by a [`CommandRunner`] (the connectivity layer), or supplied
//! already collected to [`OnboardingJob::process_batch`]. Every host ends
//! with a [`HostOutcome`]; one host failing never stops the others.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use netonboard::job::{CommandRunner, OnboardingJob};
//! use netonboard::platforms::MappingRegistry;
//! use netonboard::{CollectError, CommandRequest, CommandResults, HostContext, Section};
//!
//! struct Collector;
//!
//! impl CommandRunner for Collector {
//!     async fn run_commands(
//!         &self,
//!         _host: &HostContext,
//!         _commands: &[CommandRequest],
//!     ) -> Result<CommandResults, CollectError> {
//!         Ok(CommandResults::new())
//!     }
//! }
//!
//! # async fn example() -> Result<(), netonboard::Error> {
//! let job = OnboardingJob::builder(MappingRegistry::builtin()?)
//!     .section(Section::SyncNetworkData)
//!     .max_concurrency(16)
//!     .build();
//!
//! let hosts = vec![HostContext::new("rtr1", "10.255.0.16").with_platform("cisco_ios")];
//! let report = job.run(Arc::new(Collector), hosts).await;
//! for outcome in report.failed() {
//!     println!("{}: {:?}", outcome.name, outcome.reason);
//! }
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::engine::build_device_record;
use crate::error::{CollectError, Error, HostError, Result};
use crate::host::HostContext;
use crate::mapping::{CommandRequest, PlatformMapping, RecordMapping, Section};
use crate::platforms::MappingRegistry;
use crate::record::DeviceRecord;
use crate::value::CommandResults;

/// Why a host could not be onboarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailReason {
    /// Authentication was rejected.
    #[serde(rename = "fail-login")]
    Login,

    /// Platform or mapping configuration is missing or invalid.
    #[serde(rename = "fail-config")]
    Config,

    /// The host could not be reached.
    #[serde(rename = "fail-connect")]
    Connect,

    /// A command failed or timed out.
    #[serde(rename = "fail-execute")]
    Execute,

    /// Anything else.
    #[serde(rename = "fail-general")]
    General,

    /// The host name did not resolve.
    #[serde(rename = "fail-dns")]
    Dns,
}

impl FailReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailReason::Login => "fail-login",
            FailReason::Config => "fail-config",
            FailReason::Connect => "fail-connect",
            FailReason::Execute => "fail-execute",
            FailReason::General => "fail-general",
            FailReason::Dns => "fail-dns",
        }
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of one host in a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnboardingStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl OnboardingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OnboardingStatus::Pending => "pending",
            OnboardingStatus::Running => "running",
            OnboardingStatus::Succeeded => "succeeded",
            OnboardingStatus::Failed => "failed",
            OnboardingStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for OnboardingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connectivity layer: runs commands on a host and returns their output.
///
/// Session failures are reported as [`CollectError`]s tagged with a
/// [`FailReason`]; they never reach the engine as raw results.
pub trait CommandRunner: Send + Sync {
    /// Run every requested command and return the results keyed by command.
    ///
    /// Commands that produce nothing may be left out of the results.
    fn run_commands(
        &self,
        host: &HostContext,
        commands: &[CommandRequest],
    ) -> impl Future<Output = std::result::Result<CommandResults, CollectError>> + Send;
}

/// Cooperative cancellation flag shared between a job and its caller.
///
/// Cancellation takes effect between hosts: a host whose extraction has
/// started always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Final state of one host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostOutcome {
    /// Inventory name of the host.
    pub name: String,

    pub status: OnboardingStatus,

    /// Set when the host failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailReason>,

    /// Failure or skip detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The normalized record, when the host succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<DeviceRecord>,
}

impl HostOutcome {
    pub fn succeeded(name: impl Into<String>, record: DeviceRecord) -> Self {
        Self {
            name: name.into(),
            status: OnboardingStatus::Succeeded,
            reason: None,
            message: None,
            record: Some(record),
        }
    }

    pub fn failed(name: impl Into<String>, reason: FailReason, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: OnboardingStatus::Failed,
            reason: Some(reason),
            message: Some(message.into()),
            record: None,
        }
    }

    pub fn skipped(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: OnboardingStatus::Skipped,
            reason: None,
            message: Some(message.into()),
            record: None,
        }
    }

    /// Record an error against a host.
    pub fn from_error(name: impl Into<String>, err: &Error) -> Self {
        let name = name.into();
        warn!("{}: onboarding failed: {}", name, err);
        Self::failed(name, err.fail_reason(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status == OnboardingStatus::Succeeded
    }
}

/// Outcomes of a whole batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<HostOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &HostOutcome> {
        self.with_status(OnboardingStatus::Succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &HostOutcome> {
        self.with_status(OnboardingStatus::Failed)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &HostOutcome> {
        self.with_status(OnboardingStatus::Skipped)
    }

    fn with_status(&self, status: OnboardingStatus) -> impl Iterator<Item = &HostOutcome> {
        self.outcomes.iter().filter(move |o| o.status == status)
    }

    /// Records of the hosts that succeeded, keyed by host name.
    pub fn records(&self) -> IndexMap<&str, &DeviceRecord> {
        self.outcomes
            .iter()
            .filter_map(|o| o.record.as_ref().map(|r| (o.name.as_str(), r)))
            .collect()
    }

    /// Check whether every host succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(HostOutcome::is_success)
    }
}

/// Runs the engine over a batch of hosts.
///
/// Cloning is cheap; clones share the registry and the cancel token.
#[derive(Debug, Clone)]
pub struct OnboardingJob {
    registry: Arc<MappingRegistry>,
    section: Section,
    max_concurrency: usize,
    default_platform: Option<String>,
    cancel: CancelToken,
}

impl OnboardingJob {
    /// Start building a job over a registry.
    pub fn builder(registry: MappingRegistry) -> OnboardingJobBuilder {
        OnboardingJobBuilder::new(registry)
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// The token that cancels this job.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Resolve the mapping for a host's platform.
    pub fn platform_for(&self, host: &HostContext) -> Result<Arc<PlatformMapping>> {
        let name = host
            .platform
            .as_deref()
            .or(self.default_platform.as_deref())
            .ok_or_else(|| HostError::NoPlatform {
                host: host.name.clone(),
            })?;
        Ok(self.registry.resolve(name)?)
    }

    /// Commands the connectivity layer must collect for a host.
    pub fn commands(&self, host: &HostContext) -> Result<Vec<CommandRequest>> {
        let mapping = self.platform_for(host)?;
        Ok(self.record_mapping(&mapping, host)?.commands(host))
    }

    /// Build one host's record from already collected results.
    pub fn extract(&self, host: &HostContext, results: &CommandResults) -> Result<DeviceRecord> {
        let mapping = self.platform_for(host)?;
        let section = self.record_mapping(&mapping, host)?;
        Ok(build_device_record(host, section, results)?)
    }

    /// Process one host, turning any error into a failed outcome.
    pub fn process_host(&self, host: &HostContext, results: &CommandResults) -> HostOutcome {
        match self.extract(host, results) {
            Ok(record) => {
                info!("{}: onboarding data extracted", host.name);
                HostOutcome::succeeded(host.name.clone(), record)
            }
            Err(err) => HostOutcome::from_error(host.name.clone(), &err),
        }
    }

    /// Process hosts whose results were collected beforehand, in parallel.
    ///
    /// Hosts not yet started when the job is cancelled are skipped. A panic
    /// while processing one host fails that host only.
    pub fn process_batch(&self, batch: &[(HostContext, CommandResults)]) -> BatchReport {
        info!(
            "Processing {} host(s) for {}",
            batch.len(),
            self.section.as_str()
        );
        let outcomes = batch
            .par_iter()
            .map(|(host, results)| {
                if self.cancel.is_cancelled() {
                    return HostOutcome::skipped(host.name.clone(), "job cancelled");
                }
                isolate(&host.name, || self.process_host(host, results))
            })
            .collect();
        BatchReport { outcomes }
    }

    /// Collect and process hosts, at most `max_concurrency` at a time.
    ///
    /// Collection runs on the async runtime; extraction runs on the
    /// blocking pool since it is CPU-bound.
    pub async fn run<R>(&self, runner: Arc<R>, hosts: Vec<HostContext>) -> BatchReport
    where
        R: CommandRunner + 'static,
    {
        info!(
            "Onboarding {} host(s) for {} (concurrency {})",
            hosts.len(),
            self.section.as_str(),
            self.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let names: Vec<String> = hosts.iter().map(|h| h.name.clone()).collect();
        let mut tasks = JoinSet::new();

        for (index, host) in hosts.into_iter().enumerate() {
            let job = self.clone();
            let runner = Arc::clone(&runner);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, HostOutcome::skipped(host.name, "job shut down"));
                };
                (index, job.run_host(runner.as_ref(), host).await)
            });
        }

        let mut slots: Vec<Option<HostOutcome>> = names.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
                Err(err) => warn!("Onboarding task ended abnormally: {}", err),
            }
        }

        let outcomes = slots
            .into_iter()
            .zip(names)
            .map(|(slot, name)| {
                slot.unwrap_or_else(|| {
                    HostOutcome::failed(name, FailReason::General, "task aborted")
                })
            })
            .collect();
        BatchReport { outcomes }
    }

    async fn run_host<R: CommandRunner>(&self, runner: &R, host: HostContext) -> HostOutcome {
        if self.cancel.is_cancelled() {
            debug!("{}: skipped, job cancelled", host.name);
            return HostOutcome::skipped(host.name, "job cancelled");
        }

        let commands = match self.commands(&host) {
            Ok(commands) => commands,
            Err(err) => return HostOutcome::from_error(host.name, &err),
        };

        debug!("{}: collecting {} command(s)", host.name, commands.len());
        let results = match runner.run_commands(&host, &commands).await {
            Ok(results) => results,
            Err(err) => return HostOutcome::from_error(host.name, &Error::from(err)),
        };

        let job = self.clone();
        let name = host.name.clone();
        match tokio::task::spawn_blocking(move || job.process_host(&host, &results)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let err = Error::from(HostError::Aborted {
                    host: name.clone(),
                    message: err.to_string(),
                });
                HostOutcome::from_error(name, &err)
            }
        }
    }

    fn record_mapping<'m>(
        &self,
        mapping: &'m PlatformMapping,
        host: &HostContext,
    ) -> std::result::Result<&'m RecordMapping, HostError> {
        mapping
            .section(self.section)
            .ok_or_else(|| HostError::MissingSection {
                host: host.name.clone(),
                platform: mapping.platform.clone(),
                section: self.section.as_str(),
            })
    }
}

/// Run one host's processing, turning a panic into a failed outcome.
fn isolate(name: &str, process: impl FnOnce() -> HostOutcome) -> HostOutcome {
    panic::catch_unwind(AssertUnwindSafe(process)).unwrap_or_else(|payload| {
        let err = Error::from(HostError::Aborted {
            host: name.to_string(),
            message: panic_message(&*payload),
        });
        HostOutcome::from_error(name, &err)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}

/// Builder for [`OnboardingJob`].
pub struct OnboardingJobBuilder {
    registry: MappingRegistry,
    section: Section,
    max_concurrency: usize,
    default_platform: Option<String>,
    cancel: Option<CancelToken>,
}

impl OnboardingJobBuilder {
    /// Create a new builder over a registry.
    pub fn new(registry: MappingRegistry) -> Self {
        Self {
            registry,
            section: Section::SyncDevices,
            max_concurrency: 10,
            default_platform: None,
            cancel: None,
        }
    }

    /// Set the mapping section to evaluate (default: `sync_devices`).
    pub fn section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }

    /// Set how many hosts are collected at once (default: 10, minimum 1).
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Set the platform used for hosts that don't name one.
    pub fn default_platform(mut self, platform: impl Into<String>) -> Self {
        self.default_platform = Some(platform.into());
        self
    }

    /// Use an existing cancel token.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build(self) -> OnboardingJob {
        OnboardingJob {
            registry: Arc::new(self.registry),
            section: self.section,
            max_concurrency: self.max_concurrency,
            default_platform: self.default_platform,
            cancel: self.cancel.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use serde_json::json;

    const CISCO_RESULTS: &str = include_str!("../testdata/cisco_ios/command_results.json");

    fn cisco_results() -> CommandResults {
        serde_json::from_str(CISCO_RESULTS).unwrap()
    }

    fn job(section: Section) -> OnboardingJob {
        OnboardingJob::builder(MappingRegistry::builtin().unwrap())
            .section(section)
            .build()
    }

    fn cisco_host(name: &str) -> HostContext {
        HostContext::new(name, "10.255.0.16").with_platform("cisco_ios")
    }

    /// Runner answering from canned results and recording what it was asked.
    #[derive(Default)]
    struct MockRunner {
        responses: IndexMap<String, std::result::Result<CommandResults, CollectError>>,
        requested: Mutex<Vec<(String, Vec<String>)>>,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MockRunner {
        fn with(
            mut self,
            host: &str,
            response: std::result::Result<CommandResults, CollectError>,
        ) -> Self {
            self.responses.insert(host.to_string(), response);
            self
        }
    }

    impl CommandRunner for MockRunner {
        async fn run_commands(
            &self,
            host: &HostContext,
            commands: &[CommandRequest],
        ) -> std::result::Result<CommandResults, CollectError> {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(active, Ordering::SeqCst);
            self.requested.lock().unwrap().push((
                host.name.clone(),
                commands.iter().map(|c| c.command.clone()).collect(),
            ));
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            let unreachable = || Err(CollectError::new(FailReason::Connect, "host unreachable"));
            self.responses
                .get(&host.name)
                .cloned()
                .unwrap_or_else(unreachable)
        }
    }

    #[test]
    fn test_fail_reason_names() {
        assert_eq!(FailReason::Login.to_string(), "fail-login");
        assert_eq!(FailReason::Dns.as_str(), "fail-dns");
        assert_eq!(
            serde_json::to_value(FailReason::Config).unwrap(),
            json!("fail-config")
        );
        let reason: FailReason = serde_json::from_value(json!("fail-execute")).unwrap();
        assert_eq!(reason, FailReason::Execute);
        assert_eq!(OnboardingStatus::default(), OnboardingStatus::Pending);
        assert_eq!(OnboardingStatus::Skipped.to_string(), "skipped");
    }

    #[test]
    fn test_error_fail_reasons() {
        let err = Error::from(CollectError::new(FailReason::Login, "bad password"));
        assert_eq!(err.fail_reason(), FailReason::Login);
        assert_eq!(err.to_string(), "Collect error: fail-login: bad password");

        let err = Error::from(crate::error::MappingError::UnknownPlatform {
            name: "x".to_string(),
        });
        assert_eq!(err.fail_reason(), FailReason::Config);

        let err = Error::from(HostError::Aborted {
            host: "h".to_string(),
            message: "panic".to_string(),
        });
        assert_eq!(err.fail_reason(), FailReason::General);
    }

    #[test]
    fn test_process_batch_isolates_failures() {
        let job = job(Section::SyncDevices);
        let batch = vec![
            (cisco_host("rtr1"), cisco_results()),
            (HostContext::new("rtr2", "10.0.0.2").with_platform("vendor_x"), cisco_results()),
            (HostContext::new("rtr3", "10.0.0.3"), cisco_results()),
            (cisco_host("rtr4"), CommandResults::new()),
        ];

        let report = job.process_batch(&batch);
        let names: Vec<&str> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["rtr1", "rtr2", "rtr3", "rtr4"]);

        assert!(report.outcomes[0].is_success());
        assert_eq!(
            report.outcomes[0].record.as_ref().unwrap().get("serial"),
            Some(&json!("CAT1451S15C"))
        );
        assert_eq!(report.outcomes[1].reason, Some(FailReason::Config));
        assert_eq!(report.outcomes[2].reason, Some(FailReason::Config));
        // no data is not a failure
        assert!(report.outcomes[3].is_success());

        assert_eq!(report.succeeded().count(), 2);
        assert_eq!(report.failed().count(), 2);
        assert!(!report.is_success());
        let succeeded: Vec<&str> = report.records().keys().copied().collect();
        assert_eq!(succeeded, vec!["rtr1", "rtr4"]);
    }

    #[test]
    fn test_default_platform() {
        let job = OnboardingJob::builder(MappingRegistry::builtin().unwrap())
            .default_platform("cisco_ios")
            .build();
        let host = HostContext::new("rtr3", "10.255.0.16");
        assert_eq!(job.platform_for(&host).unwrap().platform, "cisco_ios");
        assert!(job.process_host(&host, &cisco_results()).is_success());
    }

    #[test]
    fn test_missing_section() {
        let mut registry = MappingRegistry::new();
        registry
            .register(
                PlatformMapping::from_yaml_str(
                    "lab_os",
                    "sync_devices:\n  hostname:\n    command: show version\n    path: hostname\n",
                )
                .unwrap(),
            )
            .unwrap();
        let job = OnboardingJob::builder(registry)
            .section(Section::SyncNetworkData)
            .build();
        let host = HostContext::new("lab1", "192.0.2.1").with_platform("lab_os");
        let err = job.commands(&host).unwrap_err();
        assert!(matches!(err, Error::Host(HostError::MissingSection { .. })));
        assert_eq!(err.fail_reason(), FailReason::Config);
    }

    #[test]
    fn test_panicking_host_fails_alone() {
        let outcome = isolate("rtr9", || panic!("unexpected record layout"));
        assert_eq!(outcome.status, OnboardingStatus::Failed);
        assert_eq!(outcome.reason, Some(FailReason::General));
        assert_eq!(
            outcome.message.as_deref(),
            Some("Host error: Host 'rtr9': extraction aborted: unexpected record layout")
        );

        let outcome = isolate("rtr1", || HostOutcome::skipped("rtr1", "not started"));
        assert_eq!(outcome.status, OnboardingStatus::Skipped);
        assert_eq!(panic_message(&String::from("boom")), "boom");
        assert_eq!(panic_message(&7_u8), "panicked");
    }

    #[test]
    fn test_cancelled_batch_is_skipped() {
        let job = job(Section::SyncDevices);
        job.cancel_token().cancel();
        let report = job.process_batch(&[(cisco_host("rtr1"), cisco_results())]);
        assert_eq!(report.skipped().count(), 1);
        assert!(report.outcomes[0].record.is_none());
    }

    #[tokio::test]
    async fn test_run_collects_and_extracts() {
        let login_failed = CollectError::new(FailReason::Login, "authentication failed");
        let runner = Arc::new(
            MockRunner::default()
                .with("rtr1", Ok(cisco_results()))
                .with("rtr2", Err(login_failed)),
        );
        let job = job(Section::SyncNetworkData);
        let hosts = vec![cisco_host("rtr1"), cisco_host("rtr2"), cisco_host("rtr3")];

        let report = job.run(Arc::clone(&runner), hosts).await;

        assert_eq!(report.outcomes.len(), 3);
        let rtr1 = &report.outcomes[0];
        assert!(rtr1.is_success());
        let record = rtr1.record.as_ref().unwrap();
        assert_eq!(
            record.interface("GigabitEthernet0/2").unwrap().get("mtu"),
            Some(&json!(["1500", "1500"]))
        );

        assert_eq!(report.outcomes[1].reason, Some(FailReason::Login));
        assert_eq!(report.outcomes[2].reason, Some(FailReason::Connect));

        let requested = runner.requested.lock().unwrap();
        let (_, commands) = requested.iter().find(|(name, _)| name == "rtr1").unwrap();
        assert!(commands.contains(&"show etherchannel summary".to_string()));
        assert!(!commands.contains(&"show vlan".to_string()));
    }

    #[tokio::test]
    async fn test_run_respects_concurrency_limit() {
        let mut runner = MockRunner::default();
        let mut hosts = Vec::new();
        for i in 0..8 {
            let name = format!("rtr{}", i);
            runner = runner.with(&name, Ok(CommandResults::new()));
            hosts.push(cisco_host(&name));
        }
        let runner = Arc::new(runner);
        let job = OnboardingJob::builder(MappingRegistry::builtin().unwrap())
            .max_concurrency(2)
            .build();

        let report = job.run(Arc::clone(&runner), hosts).await;
        assert!(report.is_success());
        assert!(runner.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_run_after_cancel() {
        let token = CancelToken::new();
        let job = OnboardingJob::builder(MappingRegistry::builtin().unwrap())
            .cancel_token(token.clone())
            .build();
        token.cancel();

        let runner = Arc::new(MockRunner::default().with("rtr1", Ok(cisco_results())));
        let report = tokio_test::block_on(job.run(Arc::clone(&runner), vec![cisco_host("rtr1")]));

        assert_eq!(report.outcomes[0].status, OnboardingStatus::Skipped);
        assert!(runner.requested.lock().unwrap().is_empty());
    }
}
