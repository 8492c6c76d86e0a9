//! Build artifacts handed between pipeline stages.

use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Name template the build uses for its output: region, then build date.
/// Both placeholders are resolved by the build environment at run time.
pub const ARTIFACT_NAME_TEMPLATE: &str = "$(AWS_REGION)-$(date +%Y-%m-%d)";

/// A named artifact flowing from one pipeline action to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct Artifact(String);

impl Artifact {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Which files of the build output make up the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSelector {
    /// Glob patterns, relative to `base_directory`.
    pub files: Vec<String>,
    #[serde(rename = "base-directory")]
    pub base_directory: String,
    /// Name template, see [`ARTIFACT_NAME_TEMPLATE`].
    pub name: String,
}

impl ArtifactSelector {
    /// Everything under the generator's output directory.
    pub fn site_output(base_directory: impl Into<String>) -> Self {
        Self {
            files: vec!["**/*".to_string()],
            base_directory: base_directory.into(),
            name: ARTIFACT_NAME_TEMPLATE.to_string(),
        }
    }

    /// Resolve the name template the way the build environment does.
    pub fn render_name(&self, region: &str, date: NaiveDate) -> String {
        self.name
            .replace("$(AWS_REGION)", region)
            .replace("$(date +%Y-%m-%d)", &date.format("%Y-%m-%d").to_string())
    }
}
