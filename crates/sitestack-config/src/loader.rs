//! Layered stack configuration: defaults, then a site file, then overrides.

use crate::site::{ConfigLayer, parse_site_config};
use crate::variables::NameContext;
use crate::{ConfigError, ConfigResult};
use regex::Regex;
use sitestack_core::StackConfig;
use sitestack_core::stack::DEFAULT_REPOSITORY_NAME;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Site file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "site.kdl";

static SHA256_HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{64}$").expect("sha256 pattern is valid"));

/// Collects configuration layers and resolves them into a [`StackConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    layer: ConfigLayer,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay a KDL site file.
    pub fn with_file(self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let layer = parse_site_config(&content)?;
        debug!(path = %path.display(), "loaded site config");
        Ok(self.with_layer(layer))
    }

    /// Overlay a KDL site file if it exists.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            self.with_file(path)
        } else {
            debug!(path = %path.display(), "no site config, using defaults");
            Ok(self)
        }
    }

    /// Overlay a layer; its set fields win over everything loaded so far.
    pub fn with_layer(mut self, layer: ConfigLayer) -> Self {
        self.layer = self.layer.merge(layer);
        self
    }

    /// Resolve every field, filling gaps from the defaults.
    pub fn build(self) -> ConfigResult<StackConfig> {
        let defaults = StackConfig::default();
        let layer = self.layer;

        let domain_name = layer.domain_name.unwrap_or(defaults.domain_name);
        if domain_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "domain".to_string(),
                message: "domain name must not be empty".to_string(),
            });
        }

        let stack_name = layer.stack_name.unwrap_or(defaults.stack_name);
        let hugo_version = layer.hugo_version.unwrap_or(defaults.hugo_version);
        let hugo_sha256 = layer.hugo_sha256.unwrap_or(defaults.hugo_sha256);
        let branch = layer.branch.unwrap_or(defaults.branch);

        if !SHA256_HEX.is_match(&hugo_sha256) {
            // The build's checksum step will reject it; this is only an early hint.
            warn!(hugo_sha256 = %hugo_sha256, "hugo checksum is not a 64 character hex digest");
        }

        let names = NameContext {
            domain: domain_name.clone(),
            stack: stack_name.clone(),
            hugo_version: hugo_version.clone(),
            branch: branch.clone(),
        };
        let template = layer
            .repository_name
            .unwrap_or_else(|| DEFAULT_REPOSITORY_NAME.to_string());
        let unresolved = names.unresolved(&template);
        if !unresolved.is_empty() {
            warn!(
                template = %template,
                variables = %unresolved.join(", "),
                "repository name has unknown variables, keeping them verbatim"
            );
        }
        let repository_name = names.interpolate(&template);

        let config = StackConfig {
            stack_name,
            domain_name,
            hugo_version,
            hugo_sha256,
            certificate_arn: layer.certificate_arn.or(defaults.certificate_arn),
            use_edge_distribution: layer
                .use_edge_distribution
                .unwrap_or(defaults.use_edge_distribution),
            deploy_method: layer.deploy_method.unwrap_or(defaults.deploy_method),
            repository_name,
            repository_description: layer
                .repository_description
                .unwrap_or(defaults.repository_description),
            branch,
            pipeline_name: layer.pipeline_name.unwrap_or(defaults.pipeline_name),
            region: layer.region.filter(|r| !r.is_empty()).or(defaults.region),
        };
        debug!(?config, "resolved stack config");
        Ok(config)
    }
}

/// Load a stack configuration plus overrides.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used when present.
pub fn load_stack_config(
    path: Option<&Path>,
    overrides: ConfigLayer,
) -> ConfigResult<StackConfig> {
    let loader = match path {
        Some(path) => ConfigLoader::new().with_file(path)?,
        None => ConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    loader.with_layer(overrides).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitestack_core::DeployMethod;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_only() {
        let config = ConfigLoader::new().build().unwrap();
        assert_eq!(config, StackConfig::default());
    }

    #[test]
    fn test_file_then_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            domain "from-file.com"
            topology "edge"
            certificate "arn:aws:acm:us-east-1:123456789012:certificate/abc"
            "#
        )
        .unwrap();

        let overrides = ConfigLayer {
            domain_name: Some("from-flag.com".to_string()),
            ..Default::default()
        };
        let config = load_stack_config(Some(file.path()), overrides).unwrap();
        assert_eq!(config.domain_name, "from-flag.com");
        assert_eq!(config.repository_name, "from-flag.com-hugo");
        assert!(config.use_edge_distribution);
        assert_eq!(
            config.certificate(),
            Some("arn:aws:acm:us-east-1:123456789012:certificate/abc")
        );
    }

    #[test]
    fn test_empty_override_certificate_wins() {
        let overrides = ConfigLayer {
            certificate_arn: Some(String::new()),
            ..Default::default()
        };
        let config = ConfigLoader::new()
            .with_layer(ConfigLayer {
                certificate_arn: Some("arn:aws:acm:us-east-1:1:certificate/x".to_string()),
                ..Default::default()
            })
            .with_layer(overrides)
            .build()
            .unwrap();
        assert!(config.certificate().is_none());
    }

    #[test]
    fn test_explicit_missing_path_is_io_error() {
        let result = load_stack_config(
            Some(Path::new("/nonexistent/site.kdl")),
            ConfigLayer::default(),
        );
        assert!(matches!(result.unwrap_err(), ConfigError::Io(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ConfigLoader::new().with_file("/nonexistent/site.kdl");
        assert!(matches!(result.unwrap_err(), ConfigError::Io(_)));
    }

    #[test]
    fn test_optional_file_missing_uses_defaults() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/site.kdl")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.domain_name, "my.static.site");
    }

    #[test]
    fn test_empty_domain_rejected() {
        let result = ConfigLoader::new()
            .with_layer(ConfigLayer {
                domain_name: Some(" ".to_string()),
                ..Default::default()
            })
            .build();
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_unknown_repository_variable_kept_verbatim() {
        let config = ConfigLoader::new()
            .with_layer(ConfigLayer {
                repository_name: Some("${owner}-site".to_string()),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(config.repository_name, "${owner}-site");
    }

    #[test]
    fn test_known_and_unknown_repository_variables_mix() {
        let config = ConfigLoader::new()
            .with_layer(ConfigLayer {
                domain_name: Some("example.com".to_string()),
                repository_name: Some("${owner}-${domain}".to_string()),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(config.repository_name, "${owner}-example.com");
    }

    #[test]
    fn test_sync_deploy_method() {
        let config = ConfigLoader::new()
            .with_layer(ConfigLayer {
                deploy_method: Some(DeployMethod::Sync),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(config.deploy_method, DeployMethod::Sync);
    }
}
