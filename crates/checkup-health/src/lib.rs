//! # Checkup Health Engine
//!
//! Runs a declared set of independent health checks and aggregates them into
//! one composite report:
//! - Check descriptors built from a normalized instruction mapping
//! - Reference resolution through an explicit check registry
//! - `$NAME` environment substitution in parameters
//! - Isolated execution (failures, panics, timeouts stay per check)
//! - Deterministic aggregation keyed by check name
//!
//! ```no_run
//! use checkup_health::{builtin, check_health};
//! use serde_json::json;
//!
//! # async fn example() -> checkup_core::Result<()> {
//! let instructions = json!({
//!     "health_checks": {
//!         "redis": {
//!             "callable": "checkup.net.tcp_connect",
//!             "parameters": {"host": "localhost", "port": 6379}
//!         }
//!     }
//! });
//!
//! let report = check_health(&instructions, &builtin::registry()).await?;
//! println!("healthy: {}", report.status);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod builtin;
pub mod check;
pub mod checker;
pub mod config;
pub mod descriptor;
pub mod executor;
pub mod preprocess;
pub mod registry;
pub mod report;

pub use check::{async_check_fn, check_fn, AsyncFnCheck, Check, FnCheck};
pub use checker::{check_health, HealthChecker, HealthCheckerBuilder, HEALTH_CHECKS_KEY};
pub use config::{CheckerConfig, ExecutionMode};
pub use descriptor::CheckDescriptor;
pub use preprocess::{preprocess_parameters, Environment, ProcessEnvironment, ENV_SENTINEL};
pub use registry::{CheckModule, CheckRegistry, Reference};
pub use report::{CheckResult, HealthReport};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::check::{async_check_fn, check_fn, Check};
    pub use crate::checker::{check_health, HealthChecker};
    pub use crate::config::{CheckerConfig, ExecutionMode};
    pub use crate::registry::{CheckModule, CheckRegistry};
    pub use crate::report::{CheckResult, HealthReport};
    pub use checkup_core::prelude::*;
}
