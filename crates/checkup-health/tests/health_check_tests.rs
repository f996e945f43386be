//! Integration tests for the health check engine

use checkup_core::{CheckFailure, Error, Parameters, ParametersExt};
use checkup_health::{
    builtin, check_fn, check_health, CheckModule, CheckRegistry, CheckerConfig, ExecutionMode,
    HealthChecker,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
struct AccessDenied(String);

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for AccessDenied {}

/// Registry mirroring an application's own check module, recording the
/// parameters each call received
fn app_registry(calls: Arc<Mutex<Vec<Parameters>>>) -> CheckRegistry {
    let registry = builtin::registry();

    let module = CheckModule::new()
        .with_check("always_pass", check_fn(|_| Ok(())))
        .with_check(
            "always_fail",
            check_fn(|_| Err(CheckFailure::from_error(&AccessDenied("boom".to_string())))),
        )
        .with_check(
            "verify_fileaccess",
            check_fn(move |params| {
                calls.lock().unwrap().push(params.clone());
                let user = params.get_str("user")?;
                let passwd = params.get_str("passwd")?;
                if user == "root" && passwd == "dummy_pass" {
                    Ok(())
                } else {
                    Err(CheckFailure::new("AccessDenied", format!("bad credentials for {user}")))
                }
            }),
        );
    registry.register_module("app.checks", module);
    registry
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_pass_and_fail_report() {
    let registry = app_registry(Arc::default());
    let instructions = json!({
        "health_checks": {
            "ok": {"callable": "app.checks.always_pass"},
            "bad": {"callable": "app.checks.always_fail"}
        }
    });

    let report = check_health(&instructions, &registry).await.unwrap();

    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({
            "status": false,
            "checks": {
                "ok": {"status": true},
                "bad": {"status": false, "exception": "AccessDenied boom", "desc": "boom"}
            }
        })
    );
}

#[tokio::test]
async fn test_env_variable_reaches_check() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let registry = app_registry(calls.clone());
    let instructions = json!({
        "health_checks": {
            "check_redis_connection": {
                "callable": "app.checks.verify_fileaccess",
                "parameters": {"host": "localhost", "user": "root", "passwd": "$PASSWORD"}
            }
        }
    });

    let report = HealthChecker::builder(registry)
        .environment(env(&[("PASSWORD", "dummy_pass")]))
        .build(&instructions)
        .unwrap()
        .run()
        .await;

    assert!(report.is_healthy());
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["host"], json!("localhost"));
    assert_eq!(calls[0]["user"], json!("root"));
    assert_eq!(calls[0]["passwd"], json!("dummy_pass"));
}

#[test]
fn test_missing_env_variable_fails_construction() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let instructions = json!({
        "health_checks": {
            "unrelated": {"callable": "app.checks.always_pass"},
            "check_redis_connection": {
                "callable": "app.checks.verify_fileaccess",
                "parameters": {"user": "root", "passwd": "$PASSWORD"}
            }
        }
    });

    let err = HealthChecker::builder(app_registry(calls.clone()))
        .environment(env(&[]))
        .build(&instructions)
        .unwrap_err();

    assert!(matches!(err, Error::MissingSecret { .. }));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unresolvable_check_does_not_affect_siblings() {
    let registry = app_registry(Arc::default());
    let instructions = json!({
        "health_checks": {
            "ok": {"callable": "app.checks.always_pass"},
            "no_module": {"callable": "app.missing.check"},
            "no_symbol": {"callable": "app.checks.nope"},
            "malformed": {"callable": "nodots"}
        }
    });

    let report = check_health(&instructions, &registry).await.unwrap();

    assert_eq!(report.len(), 4);
    assert!(!report.status);
    assert!(report.get("ok").unwrap().status());
    for (name, kind) in [
        ("no_module", "ModuleNotFound"),
        ("no_symbol", "SymbolNotFound"),
        ("malformed", "InvalidReference"),
    ] {
        let result = report.get(name).unwrap();
        assert!(!result.status(), "{name}");
        assert!(result.exception().unwrap().starts_with(kind), "{name}");
        assert!(!result.desc().unwrap().is_empty(), "{name}");
    }
}

#[tokio::test]
async fn test_status_is_conjunction_of_checks() {
    let registry = app_registry(Arc::default());
    for (checks, expected) in [
        (json!({"a": {"callable": "app.checks.always_pass"}}), true),
        (
            json!({
                "a": {"callable": "app.checks.always_pass"},
                "b": {"callable": "checkup.always.pass"}
            }),
            true,
        ),
        (
            json!({
                "a": {"callable": "app.checks.always_pass"},
                "b": {"callable": "checkup.always.fail"}
            }),
            false,
        ),
    ] {
        let instructions = json!({ "health_checks": checks });
        let report = check_health(&instructions, &registry).await.unwrap();
        assert_eq!(report.status, expected);
        assert_eq!(report.status, report.checks.values().all(|c| c.status()));
    }
}

#[test]
fn test_malformed_instructions_rejected_before_running() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    for instructions in [json!({}), json!([]), json!("health.yaml"), json!({"health_checks": {}})] {
        let err = HealthChecker::from_instructions(&instructions, app_registry(calls.clone()))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedInstructions(_)), "{instructions}");
    }
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_timeout_setting_contains_hanging_check() {
    let registry = app_registry(Arc::default());
    registry.register_module(
        "app.slow",
        CheckModule::new().with_check(
            "hang",
            checkup_health::async_check_fn(|_| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<(), CheckFailure>(())
            }),
        ),
    );

    let instructions = json!({
        "settings": {"timeout": "100ms"},
        "health_checks": {
            "slow": {"callable": "app.slow.hang"},
            "ok": {"callable": "app.checks.always_pass"}
        }
    });

    let report = check_health(&instructions, &registry).await.unwrap();
    assert!(report.get("ok").unwrap().status());
    assert_eq!(report.get("slow").unwrap().failure().unwrap().kind, "Timeout");
}

#[test]
fn test_blocking_run_outside_runtime() {
    let checker = HealthChecker::builder(app_registry(Arc::default()))
        .config(CheckerConfig::new().with_mode(ExecutionMode::Sequential))
        .build(&json!({
            "health_checks": {"ok": {"callable": "app.checks.always_pass"}}
        }))
        .unwrap();

    let report = checker.run_blocking().unwrap();
    assert!(report.is_healthy());
    assert_eq!(report.passed(), vec!["ok"]);
}
