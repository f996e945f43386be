//! Per-check results and the composite health report

use checkup_core::CheckFailure;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of one check
///
/// Serializes as `{"status": true}` or
/// `{"status": false, "exception": "<kind> <message>", "desc": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// Check completed without failure
    Passed,
    /// Check, or resolution of its reference, failed
    Failed(CheckFailure),
}

impl CheckResult {
    /// `true` iff the check passed
    pub fn status(&self) -> bool {
        matches!(self, CheckResult::Passed)
    }

    /// The failure, if any
    pub fn failure(&self) -> Option<&CheckFailure> {
        match self {
            CheckResult::Passed => None,
            CheckResult::Failed(failure) => Some(failure),
        }
    }

    /// `"<kind> <message>"`, present iff failed
    pub fn exception(&self) -> Option<String> {
        self.failure().map(CheckFailure::exception)
    }

    /// Failure message alone, present iff failed
    pub fn desc(&self) -> Option<&str> {
        self.failure().map(|f| f.message.as_str())
    }
}

impl From<Result<(), CheckFailure>> for CheckResult {
    fn from(result: Result<(), CheckFailure>) -> Self {
        match result {
            Ok(()) => CheckResult::Passed,
            Err(failure) => CheckResult::Failed(failure),
        }
    }
}

impl Serialize for CheckResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CheckResult::Passed => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("status", &true)?;
                map.end()
            }
            CheckResult::Failed(failure) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("status", &false)?;
                map.serialize_entry("exception", &failure.exception())?;
                map.serialize_entry("desc", &failure.message)?;
                map.end()
            }
        }
    }
}

/// Composite report over every check of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// `true` iff every check passed
    pub status: bool,
    /// Results keyed by check name
    pub checks: BTreeMap<String, CheckResult>,
}

impl HealthReport {
    /// Aggregate named results; a repeated name keeps the last result
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = (String, CheckResult)>,
    {
        let checks: BTreeMap<String, CheckResult> = results.into_iter().collect();
        let status = checks.values().all(CheckResult::status);
        Self { status, checks }
    }

    /// Whether every check passed
    pub fn is_healthy(&self) -> bool {
        self.status
    }

    /// Names of passing checks
    pub fn passed(&self) -> Vec<&str> {
        self.names_where(true)
    }

    /// Names of failing checks
    pub fn failed(&self) -> Vec<&str> {
        self.names_where(false)
    }

    /// Result for a single check
    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.checks.get(name)
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether the report holds no results
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    fn names_where(&self, status: bool) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, result)| result.status() == status)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
