//! sitestack CLI tool.

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use sitestack_config::ConfigLayer;
use sitestack_core::DeployMethod;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::BuildSpecFormat;

#[derive(Parser)]
#[command(name = "sitestack")]
#[command(about = "Synthesize static-site publishing infrastructure", long_about = None)]
struct Cli {
    /// Site configuration file (KDL)
    #[arg(long, env = "SITESTACK_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// Settings that win over the configuration file.
#[derive(Args)]
struct Overrides {
    /// Bare domain the site is served under
    #[arg(long, env = "DOMAIN")]
    domain: Option<String>,

    /// Hugo release installed by the build
    #[arg(long, env = "HUGO_VERSION")]
    hugo_version: Option<String>,

    /// SHA-256 of the Hugo release archive
    #[arg(long, env = "HUGO_SHA256")]
    hugo_sha256: Option<String>,

    /// ACM certificate for the distribution (empty for none)
    #[arg(long, env = "CERTIFICATE_ARN")]
    certificate_arn: Option<String>,

    /// Serve through an edge distribution (accepts true/false, 1/0, yes/no, on/off)
    #[arg(
        long = "edge",
        env = "USE_EDGE_DISTRIBUTION",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    use_edge_distribution: Option<bool>,

    /// How built files reach the bucket (pipeline or sync)
    #[arg(long, env = "DEPLOY_METHOD")]
    deploy_method: Option<DeployMethod>,

    /// Target region
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,
}

impl From<Overrides> for ConfigLayer {
    fn from(o: Overrides) -> Self {
        ConfigLayer {
            domain_name: o.domain,
            hugo_version: o.hugo_version,
            hugo_sha256: o.hugo_sha256,
            certificate_arn: o.certificate_arn,
            use_edge_distribution: o.use_edge_distribution,
            deploy_method: o.deploy_method,
            region: o.region,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write the CloudFormation template
    Synth {
        /// Output file (stdout if omitted)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Print the build specification
    Buildspec {
        #[arg(long, value_enum, default_value_t = BuildSpecFormat::Yaml)]
        format: BuildSpecFormat,
    },
    /// Show the topology, resources and pipeline stages
    Graph {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration and assemble the stack
    Validate,
    /// Print the SHA-256 of a downloaded generator archive
    Checksum {
        /// Path to the archive
        path: PathBuf,
        /// Fail unless the digest matches
        #[arg(long)]
        expect: Option<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so templates on stdout stay clean.
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config_path = cli.config;
    let overrides: ConfigLayer = cli.overrides.into();

    match cli.command {
        Commands::Synth { out } => {
            let config = commands::load_config(config_path.as_deref(), overrides)?;
            commands::synth(&config, out.as_deref())?;
        }
        Commands::Buildspec { format } => {
            let config = commands::load_config(config_path.as_deref(), overrides)?;
            commands::buildspec(&config, format)?;
        }
        Commands::Graph { json } => {
            let config = commands::load_config(config_path.as_deref(), overrides)?;
            commands::graph(&config, json)?;
        }
        Commands::Validate => {
            commands::validate(config_path.as_deref(), overrides)?;
        }
        Commands::Checksum { path, expect } => {
            commands::checksum::run(&path, expect.as_deref())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_flag(args: &[&str]) -> Option<bool> {
        Cli::try_parse_from(args)
            .unwrap()
            .overrides
            .use_edge_distribution
    }

    #[test]
    fn test_bare_edge_flag_before_command() {
        let cli = Cli::try_parse_from(["sitestack", "--edge", "synth"]).unwrap();
        assert_eq!(cli.overrides.use_edge_distribution, Some(true));
        assert!(matches!(cli.command, Commands::Synth { out: None }));
    }

    #[test]
    fn test_edge_flag_accepts_boolish_values() {
        for value in ["1", "yes", "on", "true"] {
            let arg = format!("--edge={}", value);
            assert_eq!(
                edge_flag(&["sitestack", arg.as_str(), "validate"]),
                Some(true),
                "{}",
                value
            );
        }
        for value in ["0", "no", "off", "false"] {
            let arg = format!("--edge={}", value);
            assert_eq!(
                edge_flag(&["sitestack", arg.as_str(), "validate"]),
                Some(false),
                "{}",
                value
            );
        }
    }

    #[test]
    fn test_edge_flag_rejects_garbage() {
        assert!(Cli::try_parse_from(["sitestack", "--edge=maybe", "validate"]).is_err());
    }

    #[test]
    fn test_overrides_become_layer() {
        let cli = Cli::try_parse_from([
            "sitestack",
            "--domain",
            "example.com",
            "--deploy-method",
            "sync",
            "validate",
        ])
        .unwrap();
        let layer: ConfigLayer = cli.overrides.into();
        assert_eq!(layer.domain_name.as_deref(), Some("example.com"));
        assert_eq!(layer.deploy_method, Some(DeployMethod::Sync));
    }
}
