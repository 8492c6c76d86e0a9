//! Access policy binder.
//!
//! Enumerates the minimal grants each execution identity needs. Grants are
//! additive; nothing is revoked or enforced here.

use sitestack_core::policy::{
    PolicyDocument, PolicyStatement, Principal, assume_role_policy,
};
use sitestack_core::resource::Role;
use sitestack_core::{Expr, LogicalId, Topology};

pub const CODEBUILD_SERVICE: &str = "codebuild.amazonaws.com";
pub const CODEPIPELINE_SERVICE: &str = "codepipeline.amazonaws.com";

/// Read access to the source repository, as used by the build.
pub const REPOSITORY_READ_ACTIONS: [&str; 5] = [
    "codecommit:BatchGet*",
    "codecommit:Get*",
    "codecommit:Describe*",
    "codecommit:List*",
    "codecommit:GitPull",
];

/// What the build needs on the site bucket when it syncs output itself.
pub const BUCKET_SYNC_ACTIONS: [&str; 3] = ["s3:PutObject", "s3:DeleteObject", "s3:ListBucket"];

const LOG_ACTIONS: [&str; 3] = [
    "logs:CreateLogGroup",
    "logs:CreateLogStream",
    "logs:PutLogEvents",
];

const ARTIFACT_ACTIONS: [&str; 5] = [
    "s3:GetObject",
    "s3:GetObjectVersion",
    "s3:PutObject",
    "s3:GetBucketAcl",
    "s3:GetBucketLocation",
];

/// The resources grants are bound against.
#[derive(Debug, Clone, Copy)]
pub struct GrantTargets<'a> {
    pub repository: &'a LogicalId,
    pub site_bucket: &'a LogicalId,
    pub artifact_bucket: &'a LogicalId,
}

fn arn(id: &LogicalId) -> Expr {
    Expr::get_att(id, "Arn")
}

fn objects(bucket: &LogicalId) -> Expr {
    Expr::join([arn(bucket), Expr::lit("/*")])
}

fn codebuild_log_groups() -> Expr {
    Expr::join([
        Expr::arn_prefix(),
        Expr::lit("logs:"),
        Expr::Pseudo(sitestack_core::expr::Pseudo::Region),
        Expr::lit(":"),
        Expr::Pseudo(sitestack_core::expr::Pseudo::AccountId),
        Expr::lit(":log-group:/aws/codebuild/*"),
    ])
}

/// Role assumed by the build environment.
pub fn build_role(targets: GrantTargets<'_>, topology: &Topology) -> Role {
    let mut policy = PolicyDocument::new();

    policy.add(
        PolicyStatement::new()
            .with_actions(REPOSITORY_READ_ACTIONS)
            .with_resource(arn(targets.repository)),
    );
    policy.add(
        PolicyStatement::new()
            .with_actions(LOG_ACTIONS)
            .with_resource(codebuild_log_groups()),
    );
    policy.add(
        PolicyStatement::new()
            .with_actions(ARTIFACT_ACTIONS)
            .with_resource(arn(targets.artifact_bucket))
            .with_resource(objects(targets.artifact_bucket)),
    );

    if topology.syncs_from_build() {
        policy.add(
            PolicyStatement::new()
                .with_actions(BUCKET_SYNC_ACTIONS)
                .with_resource(arn(targets.site_bucket))
                .with_resource(objects(targets.site_bucket)),
        );
    }

    Role {
        assumed_by: assume_role_policy([CODEBUILD_SERVICE]),
        managed_policy_arns: Vec::new(),
        policy,
    }
}

/// Role assumed by the pipeline to run its actions.
pub fn pipeline_role(
    targets: GrantTargets<'_>,
    build_project: &LogicalId,
    deploys_to_bucket: bool,
) -> Role {
    let mut policy = PolicyDocument::new();

    policy.add(
        PolicyStatement::new()
            .with_actions([
                "codecommit:GetBranch",
                "codecommit:GetCommit",
                "codecommit:UploadArchive",
                "codecommit:GetUploadArchiveStatus",
                "codecommit:CancelUploadArchive",
            ])
            .with_resource(arn(targets.repository)),
    );
    policy.add(
        PolicyStatement::new()
            .with_actions(["codebuild:BatchGetBuilds", "codebuild:StartBuild"])
            .with_resource(arn(build_project)),
    );
    policy.add(
        PolicyStatement::new()
            .with_actions([
                "s3:GetObject",
                "s3:GetObjectVersion",
                "s3:GetBucketVersioning",
                "s3:PutObject",
            ])
            .with_resource(arn(targets.artifact_bucket))
            .with_resource(objects(targets.artifact_bucket)),
    );

    if deploys_to_bucket {
        policy.add(
            PolicyStatement::new()
                .with_actions(["s3:PutObject", "s3:PutObjectAcl", "s3:ListBucket"])
                .with_resource(arn(targets.site_bucket))
                .with_resource(objects(targets.site_bucket)),
        );
    }

    Role {
        assumed_by: assume_role_policy([CODEPIPELINE_SERVICE]),
        managed_policy_arns: Vec::new(),
        policy,
    }
}

/// Resource policy for the site bucket.
///
/// Direct hosting makes every object public. Edge hosting grants reads to
/// the origin access identity's canonical user and nobody else.
pub fn site_bucket_policy(
    bucket: &LogicalId,
    access_identity: Option<&LogicalId>,
) -> PolicyDocument {
    let principal = match access_identity {
        Some(identity) => {
            Principal::CanonicalUser(Expr::get_att(identity, "S3CanonicalUserId"))
        }
        None => Principal::Anyone,
    };

    let mut policy = PolicyDocument::new();
    policy.add(
        PolicyStatement::new()
            .with_principal(principal)
            .with_action("s3:GetObject")
            .with_resource(objects(bucket)),
    );
    policy
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitestack_core::DeployMethod;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    fn allows(policy: &PolicyDocument, action: &str) -> bool {
        policy.grants().iter().any(|g| g.action == action)
    }

    fn direct(method: DeployMethod) -> Topology {
        Topology::DirectBucket {
            deploy_method: method,
        }
    }

    #[test]
    fn test_build_role_reads_repository() {
        let (repo, site, artifacts) = (id("Repo"), id("Site"), id("Artifacts"));
        let targets = GrantTargets {
            repository: &repo,
            site_bucket: &site,
            artifact_bucket: &artifacts,
        };
        let role = build_role(targets, &direct(DeployMethod::Pipeline));

        for action in REPOSITORY_READ_ACTIONS {
            assert!(allows(&role.policy, action), "missing {}", action);
        }
        assert!(!allows(&role.policy, "s3:DeleteObject"));
        let first = &role.policy.statements[0];
        assert_eq!(first.resources, vec![Expr::get_att(&repo, "Arn")]);
    }

    #[test]
    fn test_build_role_sync_grants_bucket_writes() {
        let (repo, site, artifacts) = (id("Repo"), id("Site"), id("Artifacts"));
        let targets = GrantTargets {
            repository: &repo,
            site_bucket: &site,
            artifact_bucket: &artifacts,
        };
        let role = build_role(targets, &direct(DeployMethod::Sync));
        let sync = role.policy.statements.last().unwrap();
        assert_eq!(sync.actions, BUCKET_SYNC_ACTIONS.to_vec());
        assert!(
            sync.resources
                .iter()
                .all(|r| r.references().contains(&&site))
        );
    }

    #[test]
    fn test_edge_topology_never_grants_build_bucket_writes() {
        let (repo, site, artifacts) = (id("Repo"), id("Site"), id("Artifacts"));
        let targets = GrantTargets {
            repository: &repo,
            site_bucket: &site,
            artifact_bucket: &artifacts,
        };
        let role = build_role(
            targets,
            &Topology::EdgeCached {
                certificate_arn: None,
            },
        );
        assert!(!allows(&role.policy, "s3:DeleteObject"));
        assert!(!allows(&role.policy, "s3:ListBucket"));
    }

    #[test]
    fn test_public_bucket_policy() {
        let policy = site_bucket_policy(&id("Site"), None);
        assert_eq!(policy.statements.len(), 1);
        assert_eq!(policy.statements[0].principal, Some(Principal::Anyone));
        assert_eq!(policy.statements[0].actions, vec!["s3:GetObject"]);
    }

    #[test]
    fn test_private_bucket_policy_uses_canonical_user() {
        let oai = id("Oai");
        let policy = site_bucket_policy(&id("Site"), Some(&oai));
        assert_eq!(
            policy.statements[0].principal,
            Some(Principal::CanonicalUser(Expr::get_att(
                &oai,
                "S3CanonicalUserId"
            )))
        );
    }

    #[test]
    fn test_pipeline_role_deploy_grant_is_optional() {
        let (repo, site, artifacts, project) =
            (id("Repo"), id("Site"), id("Artifacts"), id("Project"));
        let targets = GrantTargets {
            repository: &repo,
            site_bucket: &site,
            artifact_bucket: &artifacts,
        };
        assert!(allows(&pipeline_role(targets, &project, true).policy, "s3:PutObjectAcl"));
        assert!(!allows(&pipeline_role(targets, &project, false).policy, "s3:PutObjectAcl"));
    }
}
