//! Build specification for the site generator.

use sitestack_core::artifact::ArtifactSelector;
use sitestack_core::buildspec::{BuildSpec, Phase};
use sitestack_core::{StackConfig, Topology};

/// Directory the generator writes the rendered site to.
pub const SITE_OUTPUT_DIR: &str = "public";

/// Project variable holding the repository's HTTPS clone URL.
pub const CLONE_URL_VARIABLE: &str = "REPO_CLONE_URL";

/// Project variable holding the site bucket name, set for build-side sync.
pub const SITE_BUCKET_VARIABLE: &str = "SITE_BUCKET";

/// Install phase: fetch and verify the generator, then check out the
/// repository with its submodules (themes live in submodules).
fn install_commands(branch: &str) -> Vec<String> {
    vec![
        "curl -Ls https://github.com/gohugoio/hugo/releases/download/v${HUGO_VERSION}/hugo_${HUGO_VERSION}_Linux-64bit.tar.gz -o /tmp/hugo.tar.gz".to_string(),
        // Fails the phase on mismatch.
        r#"echo "${HUGO_SHA256}  /tmp/hugo.tar.gz" | sha256sum -c -"#.to_string(),
        "mkdir /tmp/hugo_${HUGO_VERSION}".to_string(),
        "tar xf /tmp/hugo.tar.gz -C /tmp/hugo_${HUGO_VERSION}".to_string(),
        "mv /tmp/hugo_${HUGO_VERSION}/hugo /usr/bin/hugo".to_string(),
        "rm -rf /tmp/hugo*".to_string(),
        r#"git config --global credential.helper "!aws codecommit credential-helper $@""#
            .to_string(),
        "git config --global credential.UseHttpPath true".to_string(),
        "git init".to_string(),
        format!("git remote add origin ${{{}}}", CLONE_URL_VARIABLE),
        "git fetch".to_string(),
        format!("git checkout -f -t origin/{}", branch),
        "git submodule init".to_string(),
        "git submodule update --recursive".to_string(),
    ]
}

fn sync_commands() -> Vec<String> {
    vec![format!(
        "aws s3 sync {}/ s3://${{{}}} --delete",
        SITE_OUTPUT_DIR, SITE_BUCKET_VARIABLE
    )]
}

/// Generate the build specification for a stack.
pub fn generate(config: &StackConfig, topology: &Topology) -> BuildSpec {
    let spec = BuildSpec::new(
        Phase::new(install_commands(&config.branch)),
        Phase::new(["hugo"]),
        ArtifactSelector::site_output(SITE_OUTPUT_DIR),
    )
    .with_variable("HUGO_VERSION", config.hugo_version.clone())
    .with_variable("HUGO_SHA256", config.hugo_sha256.clone());

    if topology.syncs_from_build() {
        spec.with_post_build(Phase::new(sync_commands()))
    } else {
        spec
    }
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
    fn test_checksum_verified_before_unpacking() {
        let spec = generate(&StackConfig::default(), &direct(DeployMethod::Pipeline));
        let commands: Vec<&str> = spec.commands().collect();
        let download = commands.iter().position(|c| c.starts_with("curl")).unwrap();
        let verify = commands.iter().position(|c| c.contains("sha256sum -c")).unwrap();
        let unpack = commands.iter().position(|c| c.starts_with("tar xf")).unwrap();
        assert!(download < verify && verify < unpack);
    }

    #[test]
    fn test_variables_carry_generator_pin() {
        let config = StackConfig {
            hugo_version: "0.60.0".to_string(),
            hugo_sha256: "deadbeef".to_string(),
            ..Default::default()
        };
        let spec = generate(&config, &direct(DeployMethod::Pipeline));
        assert_eq!(spec.env.variables["HUGO_VERSION"], "0.60.0");
        assert_eq!(spec.env.variables["HUGO_SHA256"], "deadbeef");
    }

    #[test]
    fn test_checks_out_configured_branch() {
        let config = StackConfig {
            branch: "main".to_string(),
            ..Default::default()
        };
        let spec = generate(&config, &direct(DeployMethod::Pipeline));
        assert!(
            spec.phases
                .install
                .commands
                .contains(&"git checkout -f -t origin/main".to_string())
        );
        assert!(
            spec.phases
                .install
                .commands
                .contains(&"git remote add origin ${REPO_CLONE_URL}".to_string())
        );
    }

    #[test]
    fn test_build_runs_generator_and_selects_public() {
        let spec = generate(&StackConfig::default(), &direct(DeployMethod::Pipeline));
        assert_eq!(spec.phases.build.commands, vec!["hugo"]);
        assert_eq!(spec.artifacts.base_directory, "public");
        assert_eq!(spec.artifacts.name, "$(AWS_REGION)-$(date +%Y-%m-%d)");
        assert!(spec.phases.post_build.is_none());
    }

    #[test]
    fn test_sync_adds_post_build() {
        let spec = generate(&StackConfig::default(), &direct(DeployMethod::Sync));
        let post = spec.phases.post_build.unwrap();
        assert_eq!(
            post.commands,
            vec!["aws s3 sync public/ s3://${SITE_BUCKET} --delete"]
        );
    }

    #[test]
    fn test_edge_topology_has_no_post_build() {
        let spec = generate(
            &StackConfig::default(),
            &Topology::EdgeCached {
                certificate_arn: None,
            },
        );
        assert!(spec.phases.post_build.is_none());
    }
}
