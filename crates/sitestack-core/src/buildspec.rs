//! Build specification documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::artifact::ArtifactSelector;

pub const BUILDSPEC_VERSION: &str = "0.2";

/// A build specification: ordered phases of shell commands and an artifact.
///
/// The build service runs phases in order and stops a phase at the first
/// failing command; nothing here executes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSpec {
    pub version: String,
    pub env: BuildEnv,
    pub phases: Phases,
    pub artifacts: ArtifactSelector,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnv {
    pub variables: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phases {
    pub install: Phase,
    pub build: Phase,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub post_build: Option<Phase>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub commands: Vec<String>,
}

impl Phase {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }
}

impl BuildSpec {
    pub fn new(install: Phase, build: Phase, artifacts: ArtifactSelector) -> Self {
        Self {
            version: BUILDSPEC_VERSION.to_string(),
            env: BuildEnv::default(),
            phases: Phases {
                install,
                build,
                post_build: None,
            },
            artifacts,
        }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_post_build(mut self, phase: Phase) -> Self {
        self.phases.post_build = Some(phase);
        self
    }

    /// Phases in execution order, with their names.
    pub fn ordered_phases(&self) -> Vec<(&'static str, &Phase)> {
        let mut phases = vec![
            ("install", &self.phases.install),
            ("build", &self.phases.build),
        ];
        if let Some(post) = &self.phases.post_build {
            phases.push(("post_build", post));
        }
        phases
    }

    /// All commands across phases, in execution order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.ordered_phases()
            .into_iter()
            .flat_map(|(_, phase)| phase.commands.iter().map(String::as_str))
    }

    /// Compact JSON, as embedded in a build project's source.
    pub fn to_json_string(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> BuildSpec {
        BuildSpec::new(
            Phase::new(["echo install"]),
            Phase::new(["hugo"]),
            ArtifactSelector::site_output("public"),
        )
        .with_variable("HUGO_VERSION", "0.54.0")
    }

    #[test]
    fn test_phase_order() {
        let spec = spec().with_post_build(Phase::new(["echo done"]));
        let names: Vec<&str> = spec.ordered_phases().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["install", "build", "post_build"]);
        let commands: Vec<&str> = spec.commands().collect();
        assert_eq!(commands, vec!["echo install", "hugo", "echo done"]);
    }

    #[test]
    fn test_post_build_omitted_when_absent() {
        let json: serde_json::Value = serde_json::from_str(&spec().to_json_string().unwrap()).unwrap();
        assert_eq!(json["version"], "0.2");
        assert_eq!(json["env"]["variables"]["HUGO_VERSION"], "0.54.0");
        assert!(json["phases"].get("post_build").is_none());
        assert_eq!(json["phases"]["build"]["commands"][0], "hugo");
    }
}
