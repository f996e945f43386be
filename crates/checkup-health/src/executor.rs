//! Check execution
//!
//! [`execute`] never fails: resolution errors, check failures, panics and
//! timeouts all become a [`CheckResult::Failed`].

use crate::descriptor::CheckDescriptor;
use crate::registry::CheckRegistry;
use crate::report::CheckResult;
use checkup_core::{CheckFailure, Parameters};
use std::any::Any;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tracing::{debug, warn};

/// Failure kind for a check that exceeded its deadline
pub const TIMEOUT_KIND: &str = "Timeout";
/// Failure kind for a check that panicked
pub const PANIC_KIND: &str = "Panic";
/// Failure kind for a check whose task was cancelled
pub const CANCELLED_KIND: &str = "Cancelled";

/// Resolve and run one check
///
/// The check runs in its own task so a panic stays contained. With a
/// `timeout`, an overrunning task is aborted.
pub async fn execute(
    descriptor: &CheckDescriptor,
    registry: &CheckRegistry,
    timeout: Option<Duration>,
) -> CheckResult {
    let name = descriptor.name();
    let start = Instant::now();

    let check = match descriptor
        .parsed_reference()
        .and_then(|reference| registry.resolve_reference(&reference))
    {
        Ok(check) => check,
        Err(e) => {
            warn!(check = %name, error = %e, "Failed to resolve check");
            return CheckResult::Failed(e.into());
        }
    };

    debug!(check = %name, reference = ?descriptor.reference(), "Running check");

    let params = descriptor.parameters().cloned().unwrap_or_else(Parameters::new);
    let mut handle = tokio::spawn(async move { check.call(&params).await });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                warn!(check = %name, timeout_ms = limit.as_millis() as u64, "Check timed out");
                return CheckResult::Failed(CheckFailure::new(
                    TIMEOUT_KIND,
                    format!("check did not complete within {limit:?}"),
                ));
            }
        },
        None => handle.await,
    };

    let result = match joined {
        Ok(outcome) => CheckResult::from(outcome),
        Err(e) => CheckResult::Failed(join_failure(e)),
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    match result.failure() {
        None => debug!(check = %name, duration_ms, "Check passed"),
        Some(failure) => warn!(
            check = %name,
            duration_ms,
            kind = %failure.kind,
            message = %failure.message,
            "Check failed"
        ),
    }

    result
}

fn join_failure(err: JoinError) -> CheckFailure {
    if err.is_panic() {
        CheckFailure::new(PANIC_KIND, panic_message(err.into_panic()))
    } else {
        CheckFailure::new(CANCELLED_KIND, "check task was cancelled")
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "check panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{async_check_fn, check_fn};
    use serde_json::json;

    fn registry() -> CheckRegistry {
        let registry = CheckRegistry::new();
        registry.register("pkg.always_pass", check_fn(|_| Ok(()))).unwrap();
        registry
            .register(
                "pkg.always_fail",
                check_fn(|_| Err(CheckFailure::new("RuntimeError", "boom"))),
            )
            .unwrap();
        registry
            .register(
                "pkg.echo_host",
                check_fn(|params| match params.get("host") {
                    Some(host) if host == "localhost" => Ok(()),
                    other => Err(CheckFailure::new("UnexpectedHost", format!("{other:?}"))),
                }),
            )
            .unwrap();
        registry
            .register("pkg.panics", check_fn(|_| panic!("kaboom")))
            .unwrap();
        registry
            .register(
                "pkg.hangs",
                async_check_fn(|_| async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok::<(), CheckFailure>(())
                }),
            )
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_passing_check() {
        let descriptor = CheckDescriptor::new("ok", "pkg.always_pass");
        let result = execute(&descriptor, &registry(), None).await;
        assert_eq!(result, CheckResult::Passed);
    }

    #[tokio::test]
    async fn test_failing_check() {
        let descriptor = CheckDescriptor::new("bad", "pkg.always_fail");
        let result = execute(&descriptor, &registry(), None).await;
        assert!(!result.status());
        assert_eq!(result.exception().as_deref(), Some("RuntimeError boom"));
        assert_eq!(result.desc(), Some("boom"));
    }

    #[tokio::test]
    async fn test_parameters_are_passed() {
        let mut params = Parameters::new();
        params.insert("host".to_string(), json!("localhost"));
        let descriptor = CheckDescriptor::new("host", "pkg.echo_host").with_parameters(params);

        assert!(execute(&descriptor, &registry(), None).await.status());
    }

    #[tokio::test]
    async fn test_resolution_failure_is_contained() {
        let descriptor = CheckDescriptor::new("missing", "nowhere.check");
        let result = execute(&descriptor, &registry(), None).await;

        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, "ModuleNotFound");
        assert!(!failure.message.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_reference_is_contained() {
        let descriptor = CheckDescriptor::new("malformed", "no_separator");
        let result = execute(&descriptor, &registry(), None).await;
        assert_eq!(result.failure().unwrap().kind, "InvalidReference");
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let descriptor = CheckDescriptor::new("panics", "pkg.panics");
        let result = execute(&descriptor, &registry(), None).await;

        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, PANIC_KIND);
        assert_eq!(failure.message, "kaboom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let descriptor = CheckDescriptor::new("hangs", "pkg.hangs");
        let result = execute(&descriptor, &registry(), Some(Duration::from_millis(50))).await;
        assert_eq!(result.failure().unwrap().kind, TIMEOUT_KIND);
    }
}
