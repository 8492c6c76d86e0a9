//! Site configuration parsing.

use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use serde::{Deserialize, Serialize};
use sitestack_core::DeployMethod;
use std::collections::HashSet;

/// One sparse layer of stack settings. Unset fields defer to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLayer {
    pub stack_name: Option<String>,
    pub domain_name: Option<String>,
    pub hugo_version: Option<String>,
    pub hugo_sha256: Option<String>,
    pub certificate_arn: Option<String>,
    pub use_edge_distribution: Option<bool>,
    pub deploy_method: Option<DeployMethod>,
    pub repository_name: Option<String>,
    pub repository_description: Option<String>,
    pub branch: Option<String>,
    pub pipeline_name: Option<String>,
    pub region: Option<String>,
}

impl ConfigLayer {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            stack_name: other.stack_name.or(self.stack_name),
            domain_name: other.domain_name.or(self.domain_name),
            hugo_version: other.hugo_version.or(self.hugo_version),
            hugo_sha256: other.hugo_sha256.or(self.hugo_sha256),
            certificate_arn: other.certificate_arn.or(self.certificate_arn),
            use_edge_distribution: other.use_edge_distribution.or(self.use_edge_distribution),
            deploy_method: other.deploy_method.or(self.deploy_method),
            repository_name: other.repository_name.or(self.repository_name),
            repository_description: other
                .repository_description
                .or(self.repository_description),
            branch: other.branch.or(self.branch),
            pipeline_name: other.pipeline_name.or(self.pipeline_name),
            region: other.region.or(self.region),
        }
    }
}

/// Parse a site configuration layer from KDL text.
pub fn parse_site_config(kdl: &str) -> ConfigResult<ConfigLayer> {
    let doc: KdlDocument = kdl.parse()?;

    let mut layer = ConfigLayer::default();
    let mut seen = HashSet::new();

    for node in doc.nodes() {
        let name = node.name().value();
        if matches!(
            name,
            "stack" | "domain" | "hugo" | "certificate" | "topology" | "deploy" | "repository"
                | "pipeline" | "region"
        ) && !seen.insert(name.to_string())
        {
            return Err(ConfigError::Duplicate(format!("'{}' node", name)));
        }

        match name {
            "stack" => {
                layer.stack_name = Some(required_arg(node, "stack name")?);
            }
            "domain" => {
                layer.domain_name = Some(required_arg(node, "domain name")?);
            }
            "hugo" => {
                layer.hugo_version =
                    get_string_prop(node, "version").or_else(|| get_first_string_arg(node));
                layer.hugo_sha256 = get_string_prop(node, "sha256");
            }
            "certificate" => {
                // An empty string is kept; the topology selector treats it as absent.
                layer.certificate_arn = Some(get_first_string_arg(node).unwrap_or_default());
            }
            "topology" => {
                let value = required_arg(node, "topology")?;
                layer.use_edge_distribution = Some(parse_topology(&value)?);
            }
            "deploy" => {
                let value = required_arg(node, "deploy method")?;
                let method = value
                    .parse::<DeployMethod>()
                    .map_err(|message| ConfigError::InvalidValue {
                        field: "deploy".to_string(),
                        message,
                    })?;
                layer.deploy_method = Some(method);
            }
            "repository" => {
                layer.repository_name =
                    get_string_prop(node, "name").or_else(|| get_first_string_arg(node));
                layer.repository_description = get_string_prop(node, "description");
                layer.branch = get_string_prop(node, "branch");
            }
            "pipeline" => {
                layer.pipeline_name = Some(required_arg(node, "pipeline name")?);
            }
            "region" => {
                layer.region = Some(required_arg(node, "region")?);
            }
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(layer)
}

fn parse_topology(value: &str) -> ConfigResult<bool> {
    match value.to_lowercase().as_str() {
        "bucket" | "direct" => Ok(false),
        "edge" | "cdn" => Ok(true),
        _ => Err(ConfigError::InvalidValue {
            field: "topology".to_string(),
            message: format!("unknown topology: {}", value),
        }),
    }
}

// Helper functions for extracting values from KDL nodes

fn required_arg(node: &KdlNode, what: &str) -> ConfigResult<String> {
    get_first_string_arg(node)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingField(what.to_string()))
}

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}
