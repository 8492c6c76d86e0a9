//! Stack configuration and hosting topology types.

use serde::{Deserialize, Serialize};

pub const DEFAULT_STACK_NAME: &str = "HugoAwsCdkStack";
pub const DEFAULT_DOMAIN: &str = "my.static.site";
pub const DEFAULT_HUGO_VERSION: &str = "0.54.0";
pub const DEFAULT_HUGO_SHA256: &str =
    "76f90287c12a682c9137b85146c406be410b2b30b0df7367f02ee7c4142bb416";
pub const DEFAULT_REPOSITORY_NAME: &str = "${domain}-hugo";
pub const DEFAULT_REPOSITORY_DESCRIPTION: &str = "My static website project";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_PIPELINE_NAME: &str = "HugoCodePipeline";

/// Cache TTL applied to every path served by the edge distribution.
pub const EDGE_CACHE_TTL_SECONDS: u64 = 600;

/// How built files reach the site bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMethod {
    /// A dedicated Deploy stage extracts the build artifact into the bucket.
    #[default]
    Pipeline,
    /// The build's post-build phase syncs the output directory to the bucket.
    Sync,
}

impl std::fmt::Display for DeployMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployMethod::Pipeline => write!(f, "pipeline"),
            DeployMethod::Sync => write!(f, "sync"),
        }
    }
}

impl std::str::FromStr for DeployMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pipeline" => Ok(DeployMethod::Pipeline),
            "sync" => Ok(DeployMethod::Sync),
            _ => Err(format!("Unknown deploy method: {}", s)),
        }
    }
}

/// Everything the assembler needs, resolved before assembly starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfig {
    /// Template description / stack name.
    pub stack_name: String,
    /// Bare domain the site is served under.
    pub domain_name: String,
    /// Hugo release to install in the build.
    pub hugo_version: String,
    /// Hex SHA-256 of the Hugo release archive.
    pub hugo_sha256: String,
    /// ACM certificate for the distribution. Empty means none.
    pub certificate_arn: Option<String>,
    /// Put a CDN distribution in front of a private bucket.
    pub use_edge_distribution: bool,
    pub deploy_method: DeployMethod,
    /// Repository name, after template interpolation.
    pub repository_name: String,
    pub repository_description: String,
    /// Branch the pipeline tracks.
    pub branch: String,
    pub pipeline_name: String,
    /// Target region; `None` leaves it to the provisioning system.
    pub region: Option<String>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            domain_name: DEFAULT_DOMAIN.to_string(),
            hugo_version: DEFAULT_HUGO_VERSION.to_string(),
            hugo_sha256: DEFAULT_HUGO_SHA256.to_string(),
            certificate_arn: None,
            use_edge_distribution: false,
            deploy_method: DeployMethod::default(),
            repository_name: format!("{}-hugo", DEFAULT_DOMAIN),
            repository_description: DEFAULT_REPOSITORY_DESCRIPTION.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            pipeline_name: DEFAULT_PIPELINE_NAME.to_string(),
            region: None,
        }
    }
}

impl StackConfig {
    /// The certificate ARN, treating an empty string as absent.
    pub fn certificate(&self) -> Option<&str> {
        self.certificate_arn
            .as_deref()
            .map(str::trim)
            .filter(|arn| !arn.is_empty())
    }

    /// Host names served when a certificate is bound.
    pub fn host_names(&self) -> [String; 2] {
        [self.domain_name.clone(), format!("www.{}", self.domain_name)]
    }
}

/// The hosting topology chosen for a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topology {
    /// Publicly readable website bucket, no cache layer.
    DirectBucket { deploy_method: DeployMethod },
    /// Private bucket behind an edge distribution.
    EdgeCached { certificate_arn: Option<String> },
}

impl Topology {
    /// Whether the build itself writes to the site bucket.
    pub fn syncs_from_build(&self) -> bool {
        matches!(
            self,
            Topology::DirectBucket {
                deploy_method: DeployMethod::Sync
            }
        )
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::DirectBucket { deploy_method } => {
                write!(f, "direct bucket ({} deploy)", deploy_method)
            }
            Topology::EdgeCached {
                certificate_arn: Some(_),
            } => write!(f, "edge cached (custom certificate)"),
            Topology::EdgeCached {
                certificate_arn: None,
            } => write!(f, "edge cached (default certificate)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_published_stack() {
        let config = StackConfig::default();
        assert_eq!(config.domain_name, "my.static.site");
        assert_eq!(config.hugo_version, "0.54.0");
        assert_eq!(config.repository_name, "my.static.site-hugo");
        assert_eq!(config.deploy_method, DeployMethod::Pipeline);
        assert!(!config.use_edge_distribution);
        assert!(config.certificate().is_none());
    }

    #[test]
    fn test_empty_certificate_is_absent() {
        let config = StackConfig {
            certificate_arn: Some(String::new()),
            ..Default::default()
        };
        assert!(config.certificate().is_none());

        let config = StackConfig {
            certificate_arn: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.certificate().is_none());
    }

    #[test]
    fn test_host_names() {
        let config = StackConfig {
            domain_name: "example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(config.host_names(), ["example.com", "www.example.com"]);
    }

    #[test]
    fn test_deploy_method_parse() {
        assert_eq!("Sync".parse::<DeployMethod>().unwrap(), DeployMethod::Sync);
        assert_eq!(
            "pipeline".parse::<DeployMethod>().unwrap(),
            DeployMethod::Pipeline
        );
        assert!("rsync".parse::<DeployMethod>().is_err());
    }
}
