//! Check descriptors built from instruction attributes

use crate::preprocess::{preprocess_parameters, Environment};
use crate::registry::Reference;
use checkup_core::{Error, Parameters, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Attribute naming the check logic
pub const CALLABLE_KEY: &str = "callable";
/// Accepted alias of [`CALLABLE_KEY`]
pub const REFERENCE_KEY: &str = "reference";
/// Attribute holding the named arguments
pub const PARAMETERS_KEY: &str = "parameters";

/// One declared health check
///
/// Parameters are stored preprocessed; environment references were
/// substituted when the descriptor was built.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckDescriptor {
    name: String,
    reference: Value,
    parameters: Option<Parameters>,
    extra: BTreeMap<String, Value>,
}

impl CheckDescriptor {
    /// Create a descriptor with no parameters
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: Value::String(reference.into()),
            parameters: None,
            extra: BTreeMap::new(),
        }
    }

    /// Attach already preprocessed parameters
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Build a descriptor from one `health_checks` entry
    ///
    /// `strict` turns unrecognized attributes into an error; otherwise they
    /// are kept in [`CheckDescriptor::extra`].
    pub fn from_attributes(
        name: &str,
        attributes: &Value,
        env: &dyn Environment,
        strict: bool,
    ) -> Result<Self> {
        let attributes = attributes.as_object().ok_or_else(|| {
            Error::malformed(format!("check '{name}' must be a mapping of attributes"))
        })?;

        let reference = take_reference(name, attributes)?;

        let parameters = match attributes.get(PARAMETERS_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::Object(raw)) => {
                let raw: Parameters = raw.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                Some(preprocess_parameters(&raw, env)?)
            }
            Some(_) => {
                return Err(Error::malformed(format!(
                    "check '{name}': '{PARAMETERS_KEY}' must be a mapping"
                )))
            }
        };

        let extra: BTreeMap<String, Value> = attributes
            .iter()
            .filter(|(key, _)| !is_known_attribute(key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if !extra.is_empty() {
            let keys: Vec<&str> = extra.keys().map(String::as_str).collect();
            if strict {
                return Err(Error::malformed(format!(
                    "check '{name}' has unrecognized attributes: {}",
                    keys.join(", ")
                )));
            }
            warn!(check = %name, attributes = ?keys, "Ignoring unrecognized check attributes");
        }

        Ok(Self {
            name: name.to_string(),
            reference,
            parameters,
            extra,
        })
    }

    /// Check name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference text, `None` if the instructions carried a non-string
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_str()
    }

    /// Parse the reference; failures belong to this check only
    pub fn parsed_reference(&self) -> Result<Reference> {
        Reference::from_value(&self.reference)
    }

    /// Preprocessed parameters, `None` when none were declared
    pub fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }

    /// Unrecognized attributes kept in tolerant mode
    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }
}

fn is_known_attribute(key: &str) -> bool {
    matches!(key, CALLABLE_KEY | REFERENCE_KEY | PARAMETERS_KEY)
}

fn take_reference(name: &str, attributes: &Map<String, Value>) -> Result<Value> {
    match (attributes.get(CALLABLE_KEY), attributes.get(REFERENCE_KEY)) {
        (Some(callable), Some(reference)) if callable != reference => Err(Error::malformed(
            format!("check '{name}' declares both '{CALLABLE_KEY}' and '{REFERENCE_KEY}'"),
        )),
        (Some(value), _) | (None, Some(value)) => Ok(value.clone()),
        (None, None) => Err(Error::malformed(format!(
            "check '{name}' is missing '{CALLABLE_KEY}'"
        ))),
    }
}
