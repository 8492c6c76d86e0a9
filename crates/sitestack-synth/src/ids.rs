//! Logical ids of every resource the assembler can declare.

use sitestack_core::{LogicalId, Result};

#[derive(Debug, Clone)]
pub struct StackIds {
    pub repository: LogicalId,
    pub build_role: LogicalId,
    pub build_project: LogicalId,
    pub site_bucket: LogicalId,
    pub site_bucket_policy: LogicalId,
    pub access_identity: LogicalId,
    pub distribution: LogicalId,
    pub edge_role: LogicalId,
    pub edge_function: LogicalId,
    pub edge_function_version: LogicalId,
    pub artifact_bucket: LogicalId,
    pub pipeline_role: LogicalId,
    pub pipeline: LogicalId,
}

impl StackIds {
    pub fn new() -> Result<Self> {
        Ok(Self {
            repository: LogicalId::new("CodeCommitRepository")?,
            build_role: LogicalId::new("CodeBuildProjectRole")?,
            build_project: LogicalId::new("CodeBuildProject")?,
            site_bucket: LogicalId::new("WebsiteBucket")?,
            site_bucket_policy: LogicalId::new("WebsiteBucketPolicy")?,
            access_identity: LogicalId::new("WebsiteOriginAccessIdentity")?,
            distribution: LogicalId::new("WebsiteDistribution")?,
            edge_role: LogicalId::new("CleanUrlFunctionRole")?,
            edge_function: LogicalId::new("CleanUrlFunction")?,
            edge_function_version: LogicalId::new("CleanUrlFunctionVersion")?,
            artifact_bucket: LogicalId::new("CodePipelineArtifactsBucket")?,
            pipeline_role: LogicalId::new("CodePipelineRole")?,
            pipeline: LogicalId::new("CodePipeline")?,
        })
    }
}
