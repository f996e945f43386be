//! Health checker: builds descriptors from instructions and aggregates results

use crate::config::{CheckerConfig, ExecutionMode};
use crate::descriptor::CheckDescriptor;
use crate::executor::execute;
use crate::preprocess::{Environment, ProcessEnvironment};
use crate::registry::CheckRegistry;
use crate::report::HealthReport;
use checkup_core::{Error, Result};
use futures::future::join_all;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Top-level key holding the check set
pub const HEALTH_CHECKS_KEY: &str = "health_checks";

/// A validated, ready to run set of checks
///
/// Construction performs every fallible step (shape validation, environment
/// substitution); [`HealthChecker::run`] itself cannot fail.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    checks: BTreeMap<String, CheckDescriptor>,
    registry: CheckRegistry,
    config: CheckerConfig,
}

impl HealthChecker {
    /// Build from a normalized instruction mapping using the process
    /// environment and any `settings` in the instructions
    pub fn from_instructions(instructions: &Value, registry: CheckRegistry) -> Result<Self> {
        Self::builder(registry).build(instructions)
    }

    /// Start a builder to override configuration or environment
    pub fn builder(registry: CheckRegistry) -> HealthCheckerBuilder {
        HealthCheckerBuilder::new(registry)
    }

    /// Build from descriptors directly; a repeated name replaces the earlier
    /// descriptor
    pub fn from_descriptors<I>(
        descriptors: I,
        registry: CheckRegistry,
        config: CheckerConfig,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = CheckDescriptor>,
    {
        config.validate()?;

        let mut checks = BTreeMap::new();
        for descriptor in descriptors {
            let name = descriptor.name().to_string();
            if checks.insert(name.clone(), descriptor).is_some() {
                warn!(check = %name, "Duplicate check name, keeping the last declaration");
            }
        }

        if checks.is_empty() {
            return Err(Error::malformed("no health checks declared"));
        }

        Ok(Self {
            checks,
            registry,
            config,
        })
    }

    /// Run every check once and aggregate the results
    pub async fn run(&self) -> HealthReport {
        let start = Instant::now();
        let timeout = self.config.timeout;

        let results = match self.config.mode {
            ExecutionMode::Sequential => {
                let mut results = Vec::with_capacity(self.checks.len());
                for (name, descriptor) in &self.checks {
                    let result = execute(descriptor, &self.registry, timeout).await;
                    results.push((name.clone(), result));
                }
                results
            }
            ExecutionMode::Concurrent => {
                join_all(self.checks.iter().map(|(name, descriptor)| async move {
                    (
                        name.clone(),
                        execute(descriptor, &self.registry, timeout).await,
                    )
                }))
                .await
            }
        };

        let report = HealthReport::from_results(results);

        info!(
            status = report.status,
            passed = report.passed().len(),
            failed = report.failed().len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Health check run completed"
        );

        report
    }

    /// Run on a fresh tokio runtime, for callers outside async code
    ///
    /// Returns [`Error::Runtime`] when called from within a tokio runtime;
    /// async callers use [`HealthChecker::run`].
    pub fn run_blocking(&self) -> Result<HealthReport> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Error::Runtime(
                "run_blocking called from within an async runtime".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime(format!("Failed to start runtime: {e}")))?;
        Ok(runtime.block_on(self.run()))
    }

    /// Number of declared checks
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Always `false` for a constructed checker
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Declared check names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.checks.keys().map(String::as_str).collect()
    }

    /// Descriptor for a named check
    pub fn descriptor(&self, name: &str) -> Option<&CheckDescriptor> {
        self.checks.get(name)
    }

    /// Iterate over descriptors in name order
    pub fn descriptors(&self) -> impl Iterator<Item = &CheckDescriptor> {
        self.checks.values()
    }

    /// Active configuration
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }
}

/// Builder for [`HealthChecker`]
#[derive(Debug)]
pub struct HealthCheckerBuilder {
    registry: CheckRegistry,
    config: Option<CheckerConfig>,
    environment: Arc<dyn Environment>,
}

impl HealthCheckerBuilder {
    /// Create a builder reading the process environment
    pub fn new(registry: CheckRegistry) -> Self {
        Self {
            registry,
            config: None,
            environment: Arc::new(ProcessEnvironment),
        }
    }

    /// Use this configuration instead of the instructions' `settings`
    pub fn config(mut self, config: CheckerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Resolve `$NAME` parameters against this environment
    pub fn environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Arc::new(environment);
        self
    }

    /// Validate the instructions and build every descriptor
    ///
    /// Fails without running anything when the instructions are malformed or
    /// a parameter names an undefined environment variable.
    pub fn build(self, instructions: &Value) -> Result<HealthChecker> {
        let nodes = health_check_nodes(instructions)?;

        let config = match self.config {
            Some(config) => {
                config.validate()?;
                config
            }
            None => CheckerConfig::from_instructions(instructions)?,
        };

        let descriptors = nodes
            .iter()
            .map(|(name, attributes)| {
                CheckDescriptor::from_attributes(
                    name,
                    attributes,
                    self.environment.as_ref(),
                    config.strict,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(checks = descriptors.len(), "Health checker constructed");

        HealthChecker::from_descriptors(descriptors, self.registry, config)
    }
}

/// Validate the top-level shape and return the check set
pub fn health_check_nodes(instructions: &Value) -> Result<&Map<String, Value>> {
    let root = instructions
        .as_object()
        .ok_or_else(|| Error::malformed("instructions must be a mapping"))?;

    if root.is_empty() {
        return Err(Error::malformed("instructions are empty"));
    }

    match root.get(HEALTH_CHECKS_KEY) {
        Some(Value::Object(nodes)) if !nodes.is_empty() => Ok(nodes),
        Some(Value::Object(_)) => Err(Error::malformed(format!(
            "'{HEALTH_CHECKS_KEY}' declares no checks"
        ))),
        Some(_) => Err(Error::malformed(format!(
            "'{HEALTH_CHECKS_KEY}' must be a mapping"
        ))),
        None => Err(Error::malformed(format!(
            "missing '{HEALTH_CHECKS_KEY}'"
        ))),
    }
}

/// Build a checker from `instructions` and run it once
pub async fn check_health(instructions: &Value, registry: &CheckRegistry) -> Result<HealthReport> {
    let checker = HealthChecker::from_instructions(instructions, registry.clone())?;
    Ok(checker.run().await)
}
