//! Delivery pipeline and stage definitions.

use serde::Serialize;
use std::collections::HashSet;

use crate::artifact::Artifact;
use crate::{Error, LogicalId, Result};

/// A delivery pipeline: a totally ordered list of stages.
#[derive(Debug, Clone, Serialize)]
pub struct Pipeline {
    /// Pipeline name (e.g., "HugoCodePipeline").
    pub name: String,
    /// Stages, in execution order.
    pub stages: Vec<Stage>,
}

/// A stage in a pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Stage {
    /// Stage name.
    pub name: String,
    /// Actions run by this stage.
    pub actions: Vec<Action>,
}

/// A single action inside a stage.
#[derive(Debug, Clone, Serialize)]
pub struct Action {
    pub name: String,
    pub kind: ActionKind,
    pub inputs: Vec<Artifact>,
    pub outputs: Vec<Artifact>,
}

/// What an action does.
#[derive(Debug, Clone, Serialize)]
pub enum ActionKind {
    /// Pull a branch from the source repository.
    Source {
        repository: LogicalId,
        branch: String,
    },
    /// Run the build project.
    Build { project: LogicalId },
    /// Extract an artifact into a bucket.
    Deploy { bucket: LogicalId, extract: bool },
}

impl ActionKind {
    pub fn category(&self) -> &'static str {
        match self {
            ActionKind::Source { .. } => "Source",
            ActionKind::Build { .. } => "Build",
            ActionKind::Deploy { .. } => "Deploy",
        }
    }

    /// Resources the action operates on.
    pub fn target(&self) -> &LogicalId {
        match self {
            ActionKind::Source { repository, .. } => repository,
            ActionKind::Build { project } => project,
            ActionKind::Deploy { bucket, .. } => bucket,
        }
    }
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Check that stages are uniquely named and non-empty, and that every
    /// input artifact is produced by an action in an earlier stage.
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(Error::InvalidInput(format!(
                "pipeline '{}' has no stages",
                self.name
            )));
        }

        let mut stage_names = HashSet::new();
        let mut produced: HashSet<&Artifact> = HashSet::new();

        for stage in &self.stages {
            if !stage_names.insert(stage.name.as_str()) {
                return Err(Error::Conflict(format!(
                    "duplicate stage '{}' in pipeline '{}'",
                    stage.name, self.name
                )));
            }
            if stage.actions.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "stage '{}' has no actions",
                    stage.name
                )));
            }

            // Artifacts become visible to the next stage, not to siblings.
            let mut stage_outputs = Vec::new();
            for action in &stage.actions {
                for input in &action.inputs {
                    if !produced.contains(input) {
                        return Err(Error::NotFound(format!(
                            "action '{}' in stage '{}' consumes artifact '{}' that no earlier stage produces",
                            action.name, stage.name, input
                        )));
                    }
                }
                stage_outputs.extend(action.outputs.iter());
            }
            for output in stage_outputs {
                if !produced.insert(output) {
                    return Err(Error::Conflict(format!(
                        "artifact '{}' is produced more than once",
                        output
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Stage {
    pub fn new(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            actions: vec![action],
        }
    }

    /// Output artifacts of every action in this stage.
    pub fn outputs(&self) -> impl Iterator<Item = &Artifact> {
        self.actions.iter().flat_map(|a| a.outputs.iter())
    }

    /// Input artifacts of every action in this stage.
    pub fn inputs(&self) -> impl Iterator<Item = &Artifact> {
        self.actions.iter().flat_map(|a| a.inputs.iter())
    }
}

impl Action {
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, artifact: Artifact) -> Self {
        self.inputs.push(artifact);
        self
    }

    pub fn with_output(mut self, artifact: Artifact) -> Self {
        self.outputs.push(artifact);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    fn source() -> Stage {
        Stage::new(
            "Source",
            Action::new(
                "CodeCommit",
                ActionKind::Source {
                    repository: id("Repo"),
                    branch: "master".to_string(),
                },
            )
            .with_output(Artifact::new("SourceOutput")),
        )
    }

    #[test]
    fn test_valid_handoff() {
        let pipeline = Pipeline::new("p").with_stage(source()).with_stage(Stage::new(
            "Build",
            Action::new("CodeBuild", ActionKind::Build { project: id("Project") })
                .with_input(Artifact::new("SourceOutput")),
        ));
        assert!(pipeline.validate().is_ok());
        assert_eq!(pipeline.stage_names(), vec!["Source", "Build"]);
    }

    #[test]
    fn test_unknown_input_artifact() {
        let pipeline = Pipeline::new("p").with_stage(source()).with_stage(Stage::new(
            "Deploy",
            Action::new(
                "S3Deploy",
                ActionKind::Deploy {
                    bucket: id("Bucket"),
                    extract: true,
                },
            )
            .with_input(Artifact::new("BuildOutput")),
        ));
        assert!(matches!(pipeline.validate(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_duplicate_stage() {
        let pipeline = Pipeline::new("p").with_stage(source()).with_stage(source());
        assert!(matches!(pipeline.validate(), Err(Error::Conflict(_))));
    }

    #[test]
    fn test_empty_pipeline() {
        assert!(matches!(
            Pipeline::new("p").validate(),
            Err(Error::InvalidInput(_))
        ));
    }
}
