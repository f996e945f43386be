//! Built-in checks
//!
//! | reference | parameters |
//! |---|---|
//! | `checkup.net.tcp_connect` | `host`, `port`, optional `timeout_ms` |
//! | `checkup.fs.path_exists` | `path` |
//! | `checkup.env.var_set` | `name` |
//! | `checkup.always.pass` | none |
//! | `checkup.always.fail` | optional `message` |

use crate::check::{async_check_fn, check_fn};
use crate::registry::{CheckModule, CheckRegistry};
use checkup_core::{CheckFailure, Parameters, ParametersExt};
use std::time::Duration;
use tokio::net::TcpStream;

/// Module path of the networking checks
pub const NET_MODULE: &str = "checkup.net";
/// Module path of the filesystem checks
pub const FS_MODULE: &str = "checkup.fs";
/// Module path of the environment checks
pub const ENV_MODULE: &str = "checkup.env";
/// Module path of the fixed-outcome checks
pub const ALWAYS_MODULE: &str = "checkup.always";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Register every built-in module as a lazy loader
pub fn register(registry: &CheckRegistry) {
    registry.register_loader(NET_MODULE, || Ok(net_module()));
    registry.register_loader(FS_MODULE, || Ok(fs_module()));
    registry.register_loader(ENV_MODULE, || Ok(env_module()));
    registry.register_loader(ALWAYS_MODULE, || Ok(always_module()));
}

/// Registry pre-populated with the built-in checks
pub fn registry() -> CheckRegistry {
    let registry = CheckRegistry::new();
    register(&registry);
    registry
}

fn net_module() -> CheckModule {
    CheckModule::new().with_check("tcp_connect", async_check_fn(tcp_connect))
}

fn fs_module() -> CheckModule {
    CheckModule::new().with_check("path_exists", async_check_fn(path_exists))
}

fn env_module() -> CheckModule {
    CheckModule::new().with_check(
        "var_set",
        check_fn(|params| {
            let name = params.get_str("name")?;
            match std::env::var(&name) {
                Ok(value) if !value.is_empty() => Ok(()),
                Ok(_) => Err(CheckFailure::new(
                    "EmptyVariable",
                    format!("environment variable {name} is empty"),
                )),
                Err(_) => Err(CheckFailure::new(
                    "MissingVariable",
                    format!("environment variable {name} is not set"),
                )),
            }
        }),
    )
}

fn always_module() -> CheckModule {
    CheckModule::new()
        .with_check("pass", check_fn(|_| Ok(())))
        .with_check(
            "fail",
            check_fn(|params| {
                let message = params
                    .get_str_opt("message")
                    .unwrap_or_else(|| "check failed".to_string());
                Err(CheckFailure::new("CheckFailed", message))
            }),
        )
}

async fn tcp_connect(params: Parameters) -> Result<(), CheckFailure> {
    let host = params.get_str("host")?;
    let port = params.get_u64("port")?;
    let port = u16::try_from(port).map_err(|e| CheckFailure::invalid_parameter("port", e))?;
    let limit = match params.get("timeout_ms") {
        Some(_) => Duration::from_millis(params.get_u64("timeout_ms")?),
        None => DEFAULT_CONNECT_TIMEOUT,
    };

    match tokio::time::timeout(limit, TcpStream::connect((host.as_str(), port))).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(CheckFailure::from(e).context(format!("{host}:{port}"))),
        Err(_) => Err(CheckFailure::new(
            "Timeout",
            format!("{host}:{port}: no connection within {limit:?}"),
        )),
    }
}

async fn path_exists(params: Parameters) -> Result<(), CheckFailure> {
    let path = params.get_str("path")?;
    tokio::fs::metadata(&path)
        .await
        .map(|_| ())
        .map_err(|e| CheckFailure::from(e).context(&path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, serde_json::Value)]) -> Parameters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_builtin_references() {
        let references = registry().references().unwrap();
        for expected in [
            "checkup.always.fail",
            "checkup.always.pass",
            "checkup.env.var_set",
            "checkup.fs.path_exists",
            "checkup.net.tcp_connect",
        ] {
            assert!(references.contains(&expected.to_string()), "{expected}");
        }
    }

    #[tokio::test]
    async fn test_always_checks() {
        let registry = registry();
        let pass = registry.resolve("checkup.always.pass").unwrap();
        assert!(pass.call(&Parameters::new()).await.is_ok());

        let fail = registry.resolve("checkup.always.fail").unwrap();
        let failure = fail
            .call(&params(&[("message", json!("boom"))]))
            .await
            .unwrap_err();
        assert_eq!(failure.exception(), "CheckFailed boom");
    }

    #[tokio::test]
    async fn test_tcp_connect() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let check = registry().resolve("checkup.net.tcp_connect").unwrap();
        let ok = check
            .call(&params(&[("host", json!("127.0.0.1")), ("port", json!(port))]))
            .await;
        assert!(ok.is_ok());

        drop(listener);
        let refused = check
            .call(&params(&[("host", json!("127.0.0.1")), ("port", json!(port))]))
            .await
            .unwrap_err();
        assert!(refused.message.starts_with(&format!("127.0.0.1:{port}: ")));

        let missing = check.call(&params(&[("host", json!("127.0.0.1"))])).await;
        assert_eq!(missing.unwrap_err().kind, "MissingParameter");

        let bad_port = check
            .call(&params(&[("host", json!("127.0.0.1")), ("port", json!(70000))]))
            .await;
        assert_eq!(bad_port.unwrap_err().kind, "InvalidParameter");
    }

    #[tokio::test]
    async fn test_path_exists() {
        let check = registry().resolve("checkup.fs.path_exists").unwrap();
        let dir = std::env::temp_dir();

        assert!(check
            .call(&params(&[("path", json!(dir.to_string_lossy()))]))
            .await
            .is_ok());

        let failure = check
            .call(&params(&[("path", json!("/definitely/not/here/checkup"))]))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, "NotFound");
        assert!(failure.message.starts_with("/definitely/not/here/checkup: "));
    }

    #[tokio::test]
    async fn test_env_var_set() {
        let check = registry().resolve("checkup.env.var_set").unwrap();
        let failure = check
            .call(&params(&[("name", json!("CHECKUP_SURELY_UNDEFINED_VARIABLE"))]))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, "MissingVariable");
    }
}
