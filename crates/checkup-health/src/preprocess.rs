//! Parameter preprocessing
//!
//! A parameter whose trimmed string form starts with `$` names an
//! environment variable; its value replaces the parameter. Everything else
//! passes through untouched.

use checkup_core::{value_to_string, Error, Parameters, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::env::VarError;
use std::fmt;
use tracing::debug;

/// Marks a parameter value as an environment variable reference
pub const ENV_SENTINEL: char = '$';

/// Read-only source of environment variables
pub trait Environment: Send + Sync + fmt::Debug {
    /// Look up a variable, with the same error contract as [`std::env::var`]
    fn var(&self, name: &str) -> std::result::Result<String, VarError>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> std::result::Result<String, VarError> {
        std::env::var(name)
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> std::result::Result<String, VarError> {
        self.get(name).cloned().ok_or(VarError::NotPresent)
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, name: &str) -> std::result::Result<String, VarError> {
        self.get(name).cloned().ok_or(VarError::NotPresent)
    }
}

/// Name of the environment variable a value refers to, if any
pub fn env_reference(value: &Value) -> Option<String> {
    let text = value_to_string(value)?;
    text.trim()
        .strip_prefix(ENV_SENTINEL)
        .map(|name| name.to_string())
}

/// Substitute environment references in `params`
///
/// Fails with [`Error::MissingSecret`] on the first undefined variable, or
/// [`Error::InvalidSecret`] when its value is not unicode.
pub fn preprocess_parameters(params: &Parameters, env: &dyn Environment) -> Result<Parameters> {
    params
        .iter()
        .map(|(key, value)| {
            let value = match env_reference(value) {
                Some(variable) => {
                    let resolved = env.var(&variable).map_err(|e| match e {
                        VarError::NotPresent => Error::missing_secret(&variable),
                        VarError::NotUnicode(_) => Error::InvalidSecret {
                            variable: variable.clone(),
                        },
                    })?;
                    debug!(parameter = %key, variable = %variable, "Substituted environment variable");
                    Value::String(resolved)
                }
                None => value.clone(),
            };
            Ok((key.clone(), value))
        })
        .collect()
}
