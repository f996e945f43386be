//! Instruction loading

use crate::InstructionFormat;
use checkup_core::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load instructions from a file, choosing the parser by extension
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();

    let format = InstructionFormat::from_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read instruction file {}: {e}",
            path.display()
        ))
    })?;

    let value = load_from_str(&content, format)?;
    debug!(path = %path.display(), format = ?format, "Instructions loaded");
    Ok(value)
}

/// Parse instructions from a string
pub fn load_from_str(content: &str, format: InstructionFormat) -> Result<Value> {
    let value = match format {
        InstructionFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML: {e}")))?,
        InstructionFormat::Toml => toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {e}")))?,
        InstructionFormat::Json => serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse JSON: {e}")))?,
    };

    Ok(value)
}

/// Load and merge multiple instruction files
///
/// Files are merged in order, with later files overriding earlier ones.
/// This enables layered instructions:
/// - base.yaml (checks every deployment runs)
/// - production.yaml (environment-specific checks and parameters)
pub fn load_and_merge<P: AsRef<Path>>(paths: &[P]) -> Result<Value> {
    if paths.is_empty() {
        return Err(Error::Config("No instruction files provided".to_string()));
    }

    let layers = paths
        .iter()
        .map(|path| load_from_file(path))
        .collect::<Result<Vec<_>>>()?;

    crate::merger::merge_instructions(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const YAML_INSTRUCTIONS: &str = r#"
health_checks:
  check_redis_connection:
    callable: app.checks.check_redis
    parameters:
      server: localhost
      port: 6379
      passwd: $PASSWORD
  a_malfunctioning_example:
    callable: app.checks.raising_exception
"#;

    const JSON_INSTRUCTIONS: &str = r#"
{
  "health_checks": {
    "check_redis_connection": {
      "callable": "app.checks.check_redis",
      "parameters": {"server": "localhost", "port": 6379, "passwd": "$PASSWORD"}
    },
    "a_malfunctioning_example": {"callable": "app.checks.raising_exception"}
  }
}
"#;

    const TOML_INSTRUCTIONS: &str = r#"
[health_checks.check_redis_connection]
callable = "app.checks.check_redis"
parameters = { server = "localhost", port = 6379, passwd = "$PASSWORD" }

[health_checks.a_malfunctioning_example]
callable = "app.checks.raising_exception"
"#;

    #[test]
    fn test_formats_normalize_identically() {
        let yaml = load_from_str(YAML_INSTRUCTIONS, InstructionFormat::Yaml).unwrap();
        let json = load_from_str(JSON_INSTRUCTIONS, InstructionFormat::Json).unwrap();
        let toml = load_from_str(TOML_INSTRUCTIONS, InstructionFormat::Toml).unwrap();

        assert_eq!(yaml, json);
        assert_eq!(json, toml);
        assert_eq!(
            yaml["health_checks"]["check_redis_connection"]["parameters"]["passwd"],
            json!("$PASSWORD")
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let result = load_from_str("invalid: [yaml", InstructionFormat::Yaml);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_json() {
        let result = load_from_str("{\"health_checks\": ", InstructionFormat::Json);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = load_from_str("[health_checks", InstructionFormat::Toml);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_and_merge_requires_paths() {
        let paths: [&str; 0] = [];
        assert!(load_and_merge(&paths).is_err());
    }
}
