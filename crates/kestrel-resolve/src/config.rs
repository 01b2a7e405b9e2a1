//! Resolver configuration.
//!
//! Options are plain serde structs so a host can keep them next to its
//! other build settings in YAML:
//!
//! ```yaml
//! policy: stopAtFirst
//! maxErrors: 20
//! defaultInt: i64
//! defaultFloat: f64
//! ```

use std::path::Path;

use kestrel_ast::foundation::PrimitiveType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading resolver options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the options file.
    #[error("failed to read resolver options: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the options YAML.
    #[error("failed to parse resolver options: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// `maxErrors` must allow at least one diagnostic.
    #[error("maxErrors must be at least 1")]
    InvalidMaxErrors,

    /// A default type has the wrong class (e.g. a float for `defaultInt`).
    #[error("{option} cannot be {ty}")]
    InvalidDefaultType {
        option: &'static str,
        ty: PrimitiveType,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// What the kernel driver does after a statement fails to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticPolicy {
    /// Keep resolving later statements and report every error found
    #[default]
    Accumulate,
    /// Stop at the first failing statement
    StopAtFirst,
}

/// Options for resolving a kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveOptions {
    /// Error propagation policy
    pub policy: DiagnosticPolicy,
    /// Cap on diagnostics recorded for one kernel (None = unlimited)
    pub max_errors: Option<usize>,
    /// Type given to captured host integers
    pub default_int: PrimitiveType,
    /// Type given to captured host floats and integer true division
    pub default_float: PrimitiveType,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            policy: DiagnosticPolicy::Accumulate,
            max_errors: None,
            default_int: PrimitiveType::I32,
            default_float: PrimitiveType::F32,
        }
    }
}

impl ResolveOptions {
    /// Load options from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse options from a YAML string. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let options: ResolveOptions = serde_yaml::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_errors == Some(0) {
            return Err(ConfigError::InvalidMaxErrors);
        }
        if !self.default_int.is_integral() {
            return Err(ConfigError::InvalidDefaultType {
                option: "defaultInt",
                ty: self.default_int,
            });
        }
        if !self.default_float.is_real() {
            return Err(ConfigError::InvalidDefaultType {
                option: "defaultFloat",
                ty: self.default_float,
            });
        }
        Ok(())
    }

    pub fn stop_at_first(mut self) -> Self {
        self.policy = DiagnosticPolicy::StopAtFirst;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = ResolveOptions::default();
        assert_eq!(options.policy, DiagnosticPolicy::Accumulate);
        assert_eq!(options.default_int, PrimitiveType::I32);
        assert_eq!(options.default_float, PrimitiveType::F32);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_partial() {
        let options = ResolveOptions::from_yaml("policy: stopAtFirst\ndefaultFloat: f64\n").unwrap();
        assert_eq!(options.policy, DiagnosticPolicy::StopAtFirst);
        assert_eq!(options.default_float, PrimitiveType::F64);
        assert_eq!(options.default_int, PrimitiveType::I32);
        assert_eq!(options.max_errors, None);
    }

    #[test]
    fn test_from_yaml_rejects_zero_cap() {
        let err = ResolveOptions::from_yaml("maxErrors: 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMaxErrors));
    }

    #[test]
    fn test_from_yaml_rejects_float_default_int() {
        let err = ResolveOptions::from_yaml("defaultInt: f32").unwrap_err();
        assert_eq!(err.to_string(), "defaultInt cannot be f32");
    }

    #[test]
    fn test_from_yaml_unknown_policy() {
        assert!(matches!(
            ResolveOptions::from_yaml("policy: sometimes"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "maxErrors: 3").unwrap();
        let options = ResolveOptions::load(file.path()).unwrap();
        assert_eq!(options.max_errors, Some(3));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ResolveOptions::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
