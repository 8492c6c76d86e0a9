//! Pipeline orchestrator: Source, Build, then Deploy.

use sitestack_core::artifact::Artifact;
use sitestack_core::pipeline::{Action, ActionKind, Pipeline, Stage};
use sitestack_core::{Result, StackConfig, Topology};

use crate::ids::StackIds;

pub const SOURCE_OUTPUT: &str = "SourceOutput";
pub const BUILD_OUTPUT: &str = "BuildOutput";

/// Assemble the stage graph. Stages are strictly sequential with one action
/// each; the build's output artifact is the deploy's input artifact.
///
/// When the build syncs the bucket itself there is nothing left to deploy,
/// so the pipeline stops after the Build stage.
pub fn orchestrate(config: &StackConfig, ids: &StackIds, topology: &Topology) -> Result<Pipeline> {
    let source_output = Artifact::new(SOURCE_OUTPUT);
    let build_output = Artifact::new(BUILD_OUTPUT);

    let mut pipeline = Pipeline::new(&config.pipeline_name)
        .with_stage(Stage::new(
            "Source",
            Action::new(
                "CodeCommit",
                ActionKind::Source {
                    repository: ids.repository.clone(),
                    branch: config.branch.clone(),
                },
            )
            .with_output(source_output.clone()),
        ))
        .with_stage(Stage::new(
            "Build",
            Action::new(
                "CodeBuild",
                ActionKind::Build {
                    project: ids.build_project.clone(),
                },
            )
            .with_input(source_output)
            .with_output(build_output.clone()),
        ));

    if !topology.syncs_from_build() {
        pipeline = pipeline.with_stage(Stage::new(
            "Deploy",
            Action::new(
                "S3Deploy",
                ActionKind::Deploy {
                    bucket: ids.site_bucket.clone(),
                    extract: true,
                },
            )
            .with_input(build_output),
        ));
    }

    pipeline.validate()?;
    Ok(pipeline)
}

/// Whether the pipeline writes to the site bucket itself.
pub fn deploys_to_bucket(pipeline: &Pipeline) -> bool {
    pipeline
        .stages
        .iter()
        .flat_map(|s| s.actions.iter())
        .any(|a| matches!(a.kind, ActionKind::Deploy { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitestack_core::DeployMethod;

    fn direct(method: DeployMethod) -> Topology {
        Topology::DirectBucket {
            deploy_method: method,
        }
    }

    #[test]
    fn test_three_stages_with_handoff() {
        let ids = StackIds::new().unwrap();
        let pipeline =
            orchestrate(&StackConfig::default(), &ids, &direct(DeployMethod::Pipeline)).unwrap();

        assert_eq!(pipeline.name, "HugoCodePipeline");
        assert_eq!(pipeline.stage_names(), vec!["Source", "Build", "Deploy"]);
        for stage in &pipeline.stages {
            assert_eq!(stage.actions.len(), 1);
        }

        let build_out: Vec<_> = pipeline.stage("Build").unwrap().outputs().collect();
        let deploy_in: Vec<_> = pipeline.stage("Deploy").unwrap().inputs().collect();
        assert_eq!(build_out, deploy_in);
        assert!(deploys_to_bucket(&pipeline));
    }

    #[test]
    fn test_source_tracks_branch() {
        let ids = StackIds::new().unwrap();
        let config = StackConfig {
            branch: "main".to_string(),
            ..Default::default()
        };
        let pipeline = orchestrate(&config, &ids, &direct(DeployMethod::Pipeline)).unwrap();
        match &pipeline.stages[0].actions[0].kind {
            ActionKind::Source { branch, .. } => assert_eq!(branch, "main"),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_sync_drops_deploy_stage() {
        let ids = StackIds::new().unwrap();
        let pipeline =
            orchestrate(&StackConfig::default(), &ids, &direct(DeployMethod::Sync)).unwrap();
        assert_eq!(pipeline.stage_names(), vec!["Source", "Build"]);
        assert!(!deploys_to_bucket(&pipeline));
    }

    #[test]
    fn test_edge_deploys_to_private_bucket() {
        let ids = StackIds::new().unwrap();
        let pipeline = orchestrate(
            &StackConfig::default(),
            &ids,
            &Topology::EdgeCached {
                certificate_arn: None,
            },
        )
        .unwrap();
        let deploy = &pipeline.stage("Deploy").unwrap().actions[0];
        assert_eq!(deploy.kind.target(), &ids.site_bucket);
    }
}
