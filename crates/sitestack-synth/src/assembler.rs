//! The stack assembler: one pass from configuration to a linked resource graph.

use serde::Serialize;
use sitestack_core::buildspec::BuildSpec;
use sitestack_core::pipeline::Pipeline;
use sitestack_core::resource::{
    Bucket, BuildProject, PipelineResource, Repository, ResourceGraph, ResourceKind,
    ResourceSummary,
};
use sitestack_core::{Expr, LogicalId, Result, StackConfig, Topology};
use tracing::info;

use crate::buildspec::{self, CLONE_URL_VARIABLE, SITE_BUCKET_VARIABLE};
use crate::ids::StackIds;
use crate::pipeline::{deploys_to_bucket, orchestrate};
use crate::policy::{GrantTargets, build_role, pipeline_role};
use crate::topology::{HostingTarget, declare, declare_hosting, select_topology};

pub const BUILD_IMAGE: &str = "aws/codebuild/standard:7.0";
pub const BUILD_COMPUTE_TYPE: &str = "BUILD_GENERAL1_SMALL";

/// A template output.
#[derive(Debug, Clone)]
pub struct StackOutput {
    pub id: LogicalId,
    pub description: String,
    pub value: Expr,
}

/// Everything produced by one assembly.
#[derive(Debug, Clone)]
pub struct SiteStack {
    pub config: StackConfig,
    pub topology: Topology,
    pub graph: ResourceGraph,
    pub hosting: HostingTarget,
    pub outputs: Vec<StackOutput>,
}

impl SiteStack {
    /// The build project's specification.
    pub fn buildspec(&self) -> Option<&BuildSpec> {
        self.graph.iter().find_map(|r| match &r.kind {
            ResourceKind::BuildProject(project) => Some(&project.buildspec),
            _ => None,
        })
    }

    /// The delivery pipeline's stage graph.
    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.graph.iter().find_map(|r| match &r.kind {
            ResourceKind::Pipeline(p) => Some(&p.pipeline),
            _ => None,
        })
    }

    /// A serializable overview of the stack.
    pub fn summary(&self) -> StackSummary {
        StackSummary {
            stack: self.config.stack_name.clone(),
            domain: self.config.domain_name.clone(),
            topology: self.topology.clone(),
            resources: self.graph.summaries(),
            stages: self
                .pipeline()
                .map(|p| {
                    p.stages
                        .iter()
                        .map(|s| StageSummary {
                            name: s.name.clone(),
                            inputs: s.inputs().map(|a| a.to_string()).collect(),
                            outputs: s.outputs().map(|a| a.to_string()).collect(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StackSummary {
    pub stack: String,
    pub domain: String,
    pub topology: Topology,
    pub resources: Vec<ResourceSummary>,
    pub stages: Vec<StageSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// Assemble the full stack for a configuration.
pub fn assemble(config: &StackConfig) -> Result<SiteStack> {
    let ids = StackIds::new()?;
    let topology = select_topology(config);
    info!(
        stack = %config.stack_name,
        domain = %config.domain_name,
        topology = %topology,
        "assembling stack"
    );

    let mut graph = ResourceGraph::new();

    declare(
        &mut graph,
        &ids.repository,
        ResourceKind::Repository(Repository {
            name: config.repository_name.clone(),
            description: config.repository_description.clone(),
        }),
    )?;

    let hosting = declare_hosting(&mut graph, &ids, config, &topology)?;

    declare(
        &mut graph,
        &ids.artifact_bucket,
        ResourceKind::Bucket(Bucket {
            website: None,
            block_public_access: true,
        }),
    )?;

    let targets = GrantTargets {
        repository: &ids.repository,
        site_bucket: &hosting.bucket,
        artifact_bucket: &ids.artifact_bucket,
    };

    declare(
        &mut graph,
        &ids.build_role,
        ResourceKind::Role(build_role(targets, &topology)),
    )?;

    let mut environment = vec![(
        CLONE_URL_VARIABLE.to_string(),
        Expr::get_att(&ids.repository, "CloneUrlHttp"),
    )];
    if topology.syncs_from_build() {
        environment.push((
            SITE_BUCKET_VARIABLE.to_string(),
            Expr::reference(&hosting.bucket),
        ));
    }
    declare(
        &mut graph,
        &ids.build_project,
        ResourceKind::BuildProject(BuildProject {
            role: ids.build_role.clone(),
            image: BUILD_IMAGE.to_string(),
            compute_type: BUILD_COMPUTE_TYPE.to_string(),
            environment,
            buildspec: buildspec::generate(config, &topology),
        }),
    )?;

    let pipeline = orchestrate(config, &ids, &topology)?;
    declare(
        &mut graph,
        &ids.pipeline_role,
        ResourceKind::Role(pipeline_role(
            targets,
            &ids.build_project,
            deploys_to_bucket(&pipeline),
        )),
    )?;
    declare(
        &mut graph,
        &ids.pipeline,
        ResourceKind::Pipeline(PipelineResource {
            role: ids.pipeline_role.clone(),
            artifact_bucket: ids.artifact_bucket.clone(),
            pipeline,
        }),
    )?;

    graph.validate_links()?;

    let outputs = stack_outputs(&ids, &hosting)?;
    info!(resources = graph.len(), outputs = outputs.len(), "stack assembled");

    Ok(SiteStack {
        config: config.clone(),
        topology,
        graph,
        hosting,
        outputs,
    })
}

fn stack_outputs(ids: &StackIds, hosting: &HostingTarget) -> Result<Vec<StackOutput>> {
    let mut outputs = vec![
        StackOutput {
            id: LogicalId::new("RepositoryCloneUrlHttp")?,
            description: "HTTPS clone URL of the site repository".to_string(),
            value: Expr::get_att(&ids.repository, "CloneUrlHttp"),
        },
        StackOutput {
            id: LogicalId::new("SiteBucketName")?,
            description: "Bucket holding the published site".to_string(),
            value: Expr::reference(&hosting.bucket),
        },
    ];

    match &hosting.distribution {
        Some(distribution) => {
            outputs.push(StackOutput {
                id: LogicalId::new("DistributionDomainName")?,
                description: "Domain name of the edge distribution".to_string(),
                value: Expr::get_att(distribution, "DomainName"),
            });
            outputs.push(StackOutput {
                id: LogicalId::new("DistributionId")?,
                description: "Id of the edge distribution".to_string(),
                value: Expr::reference(distribution),
            });
        }
        None => {
            outputs.push(StackOutput {
                id: LogicalId::new("WebsiteURL")?,
                description: "Public website endpoint of the site bucket".to_string(),
                value: Expr::get_att(&hosting.bucket, "WebsiteURL"),
            });
        }
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitestack_core::DeployMethod;

    #[test]
    fn test_default_stack_resources() {
        let stack = assemble(&StackConfig::default()).unwrap();
        let ids: Vec<&str> = stack.graph.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "CodeCommitRepository",
                "WebsiteBucket",
                "WebsiteBucketPolicy",
                "CodePipelineArtifactsBucket",
                "CodeBuildProjectRole",
                "CodeBuildProject",
                "CodePipelineRole",
                "CodePipeline",
            ]
        );
        assert!(stack.outputs.iter().any(|o| o.id.as_str() == "WebsiteURL"));
    }

    #[test]
    fn test_sync_stack_exposes_bucket_to_build() {
        let config = StackConfig {
            deploy_method: DeployMethod::Sync,
            ..Default::default()
        };
        let stack = assemble(&config).unwrap();
        let project = stack
            .graph
            .iter()
            .find_map(|r| match &r.kind {
                ResourceKind::BuildProject(p) => Some(p),
                _ => None,
            })
            .unwrap();
        assert!(
            project
                .environment
                .iter()
                .any(|(k, _)| k == SITE_BUCKET_VARIABLE)
        );
        assert_eq!(stack.pipeline().unwrap().stages.len(), 2);
    }

    #[test]
    fn test_summary_lists_stages() {
        let stack = assemble(&StackConfig::default()).unwrap();
        let summary = stack.summary();
        let names: Vec<&str> = summary.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Source", "Build", "Deploy"]);
        assert_eq!(summary.stages[2].inputs, vec!["BuildOutput"]);
    }
}
