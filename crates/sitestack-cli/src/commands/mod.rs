//! CLI command implementations.

pub mod checksum;

use anyhow::{Context, Result};
use clap::ValueEnum;
use sitestack_config::{ConfigLayer, load_stack_config};
use sitestack_core::StackConfig;
use sitestack_core::resource::ResourceKind;
use sitestack_synth::{SiteStack, assemble, render_string};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Region shown in artifact name previews when none is configured.
const PREVIEW_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuildSpecFormat {
    Yaml,
    Json,
}

/// Resolve the stack configuration once, before any assembly.
pub fn load_config(path: Option<&Path>, overrides: ConfigLayer) -> Result<StackConfig> {
    load_stack_config(path, overrides).context("Failed to load stack configuration")
}

fn assemble_stack(config: &StackConfig) -> Result<SiteStack> {
    assemble(config).with_context(|| format!("Failed to assemble stack '{}'", config.stack_name))
}

pub fn synth(config: &StackConfig, out: Option<&Path>) -> Result<()> {
    let stack = assemble_stack(config)?;
    let template = render_string(&stack).context("Failed to render template")?;

    match out {
        Some(path) => {
            std::fs::write(path, format!("{}\n", template))
                .with_context(|| format!("Failed to write template: {}", path.display()))?;
            info!(path = %path.display(), resources = stack.graph.len(), "template written");
        }
        None => println!("{}", template),
    }
    Ok(())
}

pub fn buildspec(config: &StackConfig, format: BuildSpecFormat) -> Result<()> {
    println!("{}", render_buildspec(config, format)?);
    Ok(())
}

fn render_buildspec(config: &StackConfig, format: BuildSpecFormat) -> Result<String> {
    let stack = assemble_stack(config)?;
    let spec = stack
        .buildspec()
        .context("Assembled stack has no build project")?;

    let rendered = match format {
        BuildSpecFormat::Yaml => serde_yaml::to_string(spec)?,
        BuildSpecFormat::Json => serde_json::to_string_pretty(spec)?,
    };
    Ok(rendered.trim_end().to_string())
}

pub fn graph(config: &StackConfig, json: bool) -> Result<()> {
    println!("{}", render_graph(config, json)?);
    Ok(())
}

fn render_graph(config: &StackConfig, json: bool) -> Result<String> {
    let stack = assemble_stack(config)?;
    let summary = stack.summary();

    if json {
        return Ok(serde_json::to_string_pretty(&summary)?);
    }

    let mut out = String::new();
    writeln!(out, "Stack:    {}", summary.stack)?;
    writeln!(out, "Domain:   {}", summary.domain)?;
    writeln!(out, "Topology: {}", summary.topology)?;

    writeln!(out, "\n--- Resources ---")?;
    for (resource, line) in stack.graph.iter().zip(&summary.resources) {
        write!(out, "  {} ({})", line.id, line.type_name)?;
        if !line.depends_on.is_empty() {
            write!(out, " -> {}", line.depends_on.join(", "))?;
        }
        if let ResourceKind::Role(role) = &resource.kind {
            write!(out, " [{} grants]", role.policy.grants().len())?;
        }
        writeln!(out)?;
    }

    if let Some(pipeline) = stack.pipeline() {
        writeln!(out, "\n--- Pipeline: {} ---", pipeline.stage_names().join(" -> "))?;
    }
    for (index, stage) in summary.stages.iter().enumerate() {
        let inputs = if stage.inputs.is_empty() {
            "-".to_string()
        } else {
            stage.inputs.join(", ")
        };
        let outputs = if stage.outputs.is_empty() {
            "-".to_string()
        } else {
            stage.outputs.join(", ")
        };
        writeln!(
            out,
            "  {}. {} [in: {}] [out: {}]",
            index + 1,
            stage.name,
            inputs,
            outputs
        )?;
    }

    if let Some(spec) = stack.buildspec() {
        writeln!(out, "\n--- Build ({} commands) ---", spec.commands().count())?;
        for (name, phase) in spec.ordered_phases() {
            writeln!(out, "  {}: {} commands", name, phase.commands.len())?;
        }
        let region = config.region.as_deref().unwrap_or(PREVIEW_REGION);
        let today = chrono::Utc::now().date_naive();
        writeln!(
            out,
            "  artifact: {} (e.g. {})",
            spec.artifacts.name,
            spec.artifacts.render_name(region, today)
        )?;
    }
    Ok(out.trim_end().to_string())
}

pub fn validate(path: Option<&Path>, overrides: ConfigLayer) -> Result<()> {
    println!("{}", check_config(path, overrides)?);
    Ok(())
}

fn check_config(path: Option<&Path>, overrides: ConfigLayer) -> Result<String> {
    let config = load_config(path, overrides)?;
    let stack = assemble_stack(&config)?;
    Ok(format!(
        "Configuration is valid: {} resources, topology {}",
        stack.graph.len(),
        stack.topology
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitestack_core::DeployMethod;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn site_file(kdl: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", kdl).unwrap();
        file
    }

    #[test]
    fn test_load_config_applies_overrides_over_file() {
        let file = site_file(r#"domain "file.example""#);
        let overrides = ConfigLayer {
            use_edge_distribution: Some(true),
            ..Default::default()
        };
        let config = load_config(Some(file.path()), overrides).unwrap();
        assert_eq!(config.domain_name, "file.example");
        assert!(config.use_edge_distribution);
    }

    #[test]
    fn test_load_config_reports_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/site.kdl")), ConfigLayer::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load stack configuration"));
    }

    #[test]
    fn test_synth_writes_template_file() {
        let out = NamedTempFile::new().unwrap();
        synth(&StackConfig::default(), Some(out.path())).unwrap();

        let written = std::fs::read_to_string(out.path()).unwrap();
        let template: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    }

    #[test]
    fn test_buildspec_yaml_keys() {
        let yaml = render_buildspec(&StackConfig::default(), BuildSpecFormat::Yaml).unwrap();
        assert!(yaml.contains("base-directory: public"));
        assert!(yaml.contains("install:"));
    }

    #[test]
    fn test_buildspec_json() {
        let json = render_buildspec(&StackConfig::default(), BuildSpecFormat::Json).unwrap();
        let spec: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(spec["version"], "0.2");
        assert_eq!(spec["artifacts"]["base-directory"], "public");
        assert_eq!(spec["phases"]["build"]["commands"][0], "hugo");
    }

    #[test]
    fn test_graph_json_lists_stages() {
        let json = render_graph(&StackConfig::default(), true).unwrap();
        let summary: serde_json::Value = serde_json::from_str(&json).unwrap();
        let stages: Vec<&str> = summary["stages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(stages, vec!["Source", "Build", "Deploy"]);
        assert_eq!(summary["topology"]["kind"], "direct_bucket");
    }

    #[test]
    fn test_graph_text_for_sync_deploy() {
        let config = StackConfig {
            deploy_method: DeployMethod::Sync,
            region: Some("eu-west-1".to_string()),
            ..Default::default()
        };
        let text = render_graph(&config, false).unwrap();
        assert!(text.contains("--- Pipeline: Source -> Build ---"));
        assert!(text.contains("post_build: 1 commands"));
        assert!(text.contains("(e.g. eu-west-1-"));
        assert!(text.contains("CodeBuildProjectRole (AWS::IAM::Role)"));
    }

    #[test]
    fn test_validate_edge_config() {
        let file = site_file(
            r#"
            domain "example.com"
            topology "edge"
            "#,
        );
        let message = check_config(Some(file.path()), ConfigLayer::default()).unwrap();
        assert!(message.contains("topology edge cached (default certificate)"));
    }

    #[test]
    fn test_validate_rejects_empty_domain() {
        let file = site_file(r#"domain "example.com""#);
        let overrides = ConfigLayer {
            domain_name: Some(String::new()),
            ..Default::default()
        };
        assert!(check_config(Some(file.path()), overrides).is_err());
    }
}
