//! Project configuration (hashbridge.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Project configuration (hashbridge.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    pub bindgen: BindgenConfig,
}

/// `[bindgen]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BindgenConfig {
    /// Reflected metadata documents, relative to the config file
    pub metadata: Vec<PathBuf>,

    /// Emitted Rust source
    pub output: PathBuf,

    /// Root path generated types live under
    #[serde(default = "default_crate_root")]
    pub crate_root: String,

    /// Candidate interfaces under these namespaces are skipped
    #[serde(default)]
    pub exclude_namespaces: Vec<String>,

    /// Whole assemblies skipped
    #[serde(default)]
    pub exclude_assemblies: Vec<String>,

    /// Interfaces the host provides exactly one instance of
    #[serde(default)]
    pub services: Vec<String>,

    /// Descriptor manifest output
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

fn default_crate_root() -> String {
    "crate".to_string()
}

impl ProjectConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ProjectConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bindgen = &self.bindgen;

        if bindgen.metadata.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one metadata document is required".to_string(),
            ));
        }

        if bindgen.output.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "Output path cannot be empty".to_string(),
            ));
        }

        if !is_valid_rust_path(&bindgen.crate_root) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid crate_root: {}. Must be a '::'-separated Rust path such as crate::bindings",
                bindgen.crate_root
            )));
        }

        for service in &bindgen.services {
            if !is_valid_dotted_name(service) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid service name: {}. Must be a dotted type name",
                    service
                )));
            }
        }

        Ok(())
    }
}

impl BindgenConfig {
    /// Metadata documents resolved against `base`.
    pub fn metadata_paths(&self, base: &Path) -> Vec<PathBuf> {
        self.metadata.iter().map(|path| base.join(path)).collect()
    }

    pub fn output_path(&self, base: &Path) -> PathBuf {
        base.join(&self.output)
    }

    pub fn manifest_path(&self, base: &Path) -> Option<PathBuf> {
        self.manifest.as_ref().map(|path| base.join(path))
    }
}

fn is_valid_rust_path(path: &str) -> bool {
    path.split("::").enumerate().all(|(index, segment)| {
        if index == 0 && matches!(segment, "crate" | "self" | "super") {
            return true;
        }
        is_valid_ident(segment) && !matches!(segment, "crate" | "self" | "super" | "Self")
    })
}

fn is_valid_ident(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    ident != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_valid_dotted_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '`'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let toml = r#"
            [bindgen]
            metadata = ["interfaces.json"]
            output = "src/bindings.rs"
        "#;

        let config = ProjectConfig::from_str(toml).unwrap();
        assert_eq!(config.bindgen.crate_root, "crate");
        assert!(config.bindgen.services.is_empty());
        assert!(config.bindgen.manifest.is_none());
    }

    #[test]
    fn test_parse_full() {
        let toml = r#"
            [bindgen]
            metadata = ["host.json", "extensions.json"]
            output = "src/bindings.rs"
            crate_root = "crate::bindings"
            exclude_namespaces = ["System"]
            exclude_assemblies = ["Host.Unloadable"]
            services = ["Host.Services.IModConfig"]
            manifest = "bindings.manifest.json"
        "#;

        let config = ProjectConfig::from_str(toml).unwrap();
        let bindgen = &config.bindgen;
        assert_eq!(bindgen.metadata.len(), 2);
        assert_eq!(bindgen.crate_root, "crate::bindings");
        assert_eq!(bindgen.services, ["Host.Services.IModConfig"]);
        assert_eq!(
            bindgen.manifest_path(Path::new("/project")),
            Some(PathBuf::from("/project/bindings.manifest.json"))
        );
    }

    #[test]
    fn test_missing_metadata() {
        let toml = r#"
            [bindgen]
            metadata = []
            output = "src/bindings.rs"
        "#;
        assert!(matches!(
            ProjectConfig::from_str(toml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_invalid_crate_root() {
        for root in ["", "crate::", "crate::1abc", "my-crate", "crate::self"] {
            let toml = format!(
                "[bindgen]\nmetadata = [\"a.json\"]\noutput = \"out.rs\"\ncrate_root = \"{}\"\n",
                root
            );
            assert!(
                matches!(
                    ProjectConfig::from_str(&toml),
                    Err(ConfigError::ValidationError(_))
                ),
                "accepted crate_root {:?}",
                root
            );
        }
    }

    #[test]
    fn test_invalid_service_name() {
        let toml = r#"
            [bindgen]
            metadata = ["a.json"]
            output = "out.rs"
            services = ["Host..IConfig"]
        "#;
        assert!(ProjectConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_rust_paths() {
        assert!(is_valid_rust_path("crate"));
        assert!(is_valid_rust_path("crate::bindings"));
        assert!(is_valid_rust_path("host_bindings::generated"));
        assert!(!is_valid_rust_path("crate::bindings::"));
    }
}
