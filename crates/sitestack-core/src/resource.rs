//! Resource descriptors and the linked resource graph.
//!
//! Resources are declarations only. Their lifecycle belongs to the
//! provisioning system that receives the synthesized template.

use serde::Serialize;
use std::collections::HashMap;

use crate::buildspec::BuildSpec;
use crate::expr::Expr;
use crate::pipeline::Pipeline;
use crate::policy::PolicyDocument;
use crate::{Error, LogicalId, Result};

/// Source code repository.
#[derive(Debug, Clone)]
pub struct Repository {
    pub name: String,
    pub description: String,
}

/// Execution identity with its trust policy and grants.
#[derive(Debug, Clone)]
pub struct Role {
    pub assumed_by: PolicyDocument,
    pub managed_policy_arns: Vec<Expr>,
    pub policy: PolicyDocument,
}

/// Ephemeral build environment running a build spec.
#[derive(Debug, Clone)]
pub struct BuildProject {
    pub role: LogicalId,
    pub image: String,
    pub compute_type: String,
    /// Project-level variables; values may reference other resources.
    pub environment: Vec<(String, Expr)>,
    pub buildspec: BuildSpec,
}

/// Static website settings for a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Website {
    pub index_document: String,
    pub error_document: String,
}

/// Object storage bucket.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub website: Option<Website>,
    /// Block every form of public access.
    pub block_public_access: bool,
}

/// Resource policy attached to a bucket.
#[derive(Debug, Clone)]
pub struct BucketPolicy {
    pub bucket: LogicalId,
    pub policy: PolicyDocument,
}

/// Credential that lets the distribution read a private bucket.
#[derive(Debug, Clone)]
pub struct OriginAccessIdentity {
    pub comment: String,
}

/// Edge caching distribution in front of a bucket.
#[derive(Debug, Clone)]
pub struct Distribution {
    pub origin_bucket: LogicalId,
    pub access_identity: LogicalId,
    /// Host names bound to `certificate_arn`. Empty without a certificate.
    pub aliases: Vec<String>,
    pub certificate_arn: Option<String>,
    pub default_root_object: String,
    pub ttl_seconds: u64,
    /// Published function version invoked on every origin request.
    pub origin_request_function: Option<LogicalId>,
}

/// Function run at edge locations.
#[derive(Debug, Clone)]
pub struct EdgeFunction {
    pub role: LogicalId,
    pub runtime: String,
    pub handler: String,
    pub code: String,
}

/// An immutable, published version of a function.
#[derive(Debug, Clone)]
pub struct FunctionVersion {
    pub function: LogicalId,
}

/// The delivery pipeline resource.
#[derive(Debug, Clone)]
pub struct PipelineResource {
    pub role: LogicalId,
    pub artifact_bucket: LogicalId,
    pub pipeline: Pipeline,
}

#[derive(Debug, Clone)]
pub enum ResourceKind {
    Repository(Repository),
    Role(Role),
    BuildProject(BuildProject),
    Bucket(Bucket),
    BucketPolicy(BucketPolicy),
    OriginAccessIdentity(OriginAccessIdentity),
    Distribution(Distribution),
    EdgeFunction(EdgeFunction),
    FunctionVersion(FunctionVersion),
    Pipeline(PipelineResource),
}

impl ResourceKind {
    /// Provisioning type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::Repository(_) => "AWS::CodeCommit::Repository",
            ResourceKind::Role(_) => "AWS::IAM::Role",
            ResourceKind::BuildProject(_) => "AWS::CodeBuild::Project",
            ResourceKind::Bucket(_) => "AWS::S3::Bucket",
            ResourceKind::BucketPolicy(_) => "AWS::S3::BucketPolicy",
            ResourceKind::OriginAccessIdentity(_) => {
                "AWS::CloudFront::CloudFrontOriginAccessIdentity"
            }
            ResourceKind::Distribution(_) => "AWS::CloudFront::Distribution",
            ResourceKind::EdgeFunction(_) => "AWS::Lambda::Function",
            ResourceKind::FunctionVersion(_) => "AWS::Lambda::Version",
            ResourceKind::Pipeline(_) => "AWS::CodePipeline::Pipeline",
        }
    }

    /// Every resource this declaration depends on.
    pub fn references(&self) -> Vec<LogicalId> {
        let policy_refs = |doc: &PolicyDocument| -> Vec<LogicalId> {
            doc.statements
                .iter()
                .flat_map(|s| s.resources.iter().flat_map(|r| r.references()))
                .cloned()
                .collect()
        };

        match self {
            ResourceKind::Repository(_) | ResourceKind::OriginAccessIdentity(_) => Vec::new(),
            ResourceKind::Bucket(_) => Vec::new(),
            ResourceKind::Role(role) => {
                let mut refs = policy_refs(&role.policy);
                refs.extend(
                    role.managed_policy_arns
                        .iter()
                        .flat_map(|a| a.references())
                        .cloned(),
                );
                refs
            }
            ResourceKind::BuildProject(project) => {
                let mut refs = vec![project.role.clone()];
                refs.extend(
                    project
                        .environment
                        .iter()
                        .flat_map(|(_, v)| v.references())
                        .cloned(),
                );
                refs
            }
            ResourceKind::BucketPolicy(bp) => {
                let mut refs = vec![bp.bucket.clone()];
                refs.extend(policy_refs(&bp.policy));
                for statement in &bp.policy.statements {
                    if let Some(crate::policy::Principal::CanonicalUser(user)) =
                        &statement.principal
                    {
                        refs.extend(user.references().into_iter().cloned());
                    }
                }
                refs
            }
            ResourceKind::Distribution(dist) => {
                let mut refs = vec![dist.origin_bucket.clone(), dist.access_identity.clone()];
                refs.extend(dist.origin_request_function.iter().cloned());
                refs
            }
            ResourceKind::EdgeFunction(f) => vec![f.role.clone()],
            ResourceKind::FunctionVersion(v) => vec![v.function.clone()],
            ResourceKind::Pipeline(p) => {
                let mut refs = vec![p.role.clone(), p.artifact_bucket.clone()];
                refs.extend(
                    p.pipeline
                        .stages
                        .iter()
                        .flat_map(|s| s.actions.iter().map(|a| a.kind.target().clone())),
                );
                refs
            }
        }
    }
}

/// A declared resource.
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: LogicalId,
    pub kind: ResourceKind,
}

/// Summary line for a resource, used for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub depends_on: Vec<String>,
}

/// Ordered resources keyed by unique logical id.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    resources: Vec<Resource>,
    index: HashMap<LogicalId, usize>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a resource. Logical ids must be unique.
    pub fn add(&mut self, id: LogicalId, kind: ResourceKind) -> Result<LogicalId> {
        if self.index.contains_key(&id) {
            return Err(Error::Conflict(format!("resource '{}' already declared", id)));
        }
        self.index.insert(id.clone(), self.resources.len());
        self.resources.push(Resource {
            id: id.clone(),
            kind,
        });
        Ok(id)
    }

    pub fn contains(&self, id: &LogicalId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Check that every reference names a declared resource.
    pub fn validate_links(&self) -> Result<()> {
        for resource in &self.resources {
            for target in resource.kind.references() {
                if !self.contains(&target) {
                    return Err(Error::NotFound(format!(
                        "resource '{}' references undeclared resource '{}'",
                        resource.id, target
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn summaries(&self) -> Vec<ResourceSummary> {
        self.resources
            .iter()
            .map(|r| {
                let mut depends_on: Vec<String> =
                    r.kind.references().iter().map(|id| id.to_string()).collect();
                depends_on.sort();
                depends_on.dedup();
                ResourceSummary {
                    id: r.id.to_string(),
                    type_name: r.kind.type_name(),
                    depends_on,
                }
            })
            .collect()
    }
}
