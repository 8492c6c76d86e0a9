//! Hosting topology selection and storage/edge declarations.

use sitestack_core::resource::{
    Bucket, BucketPolicy, Distribution, FunctionVersion, OriginAccessIdentity, ResourceGraph,
    ResourceKind, Website,
};
use sitestack_core::stack::EDGE_CACHE_TTL_SECONDS;
use sitestack_core::{DeployMethod, LogicalId, Result, StackConfig, Topology};
use tracing::{debug, warn};

use crate::edge;
use crate::ids::StackIds;
use crate::policy::site_bucket_policy;

pub const INDEX_DOCUMENT: &str = "index.html";
pub const ERROR_DOCUMENT: &str = "404.html";

/// Choose the hosting topology for a configuration.
///
/// An empty certificate ARN counts as no certificate. The deploy method only
/// applies to direct hosting; edge hosting always deploys through the pipeline.
pub fn select_topology(config: &StackConfig) -> Topology {
    if config.use_edge_distribution {
        if config.deploy_method == DeployMethod::Sync {
            warn!("build-side sync is only available for direct bucket hosting, deploying through the pipeline");
        }
        let certificate_arn = config.certificate().map(str::to_string);
        if let Some(arn) = &certificate_arn {
            if let Some(problem) = certificate_problem(arn) {
                warn!(arn = %arn, "{}", problem);
            }
        }
        if let Some(region) = config.region.as_deref() {
            if let Some(problem) = edge_region_problem(region) {
                warn!(region, "{}", problem);
            }
        }
        Topology::EdgeCached { certificate_arn }
    } else {
        if config.certificate().is_some() {
            warn!("certificate ARN is ignored without an edge distribution");
        }
        Topology::DirectBucket {
            deploy_method: config.deploy_method,
        }
    }
}

/// Why a certificate ARN will not work for a distribution, if it won't.
///
/// Malformed ARNs are rejected by the provisioning system; this only warns early.
pub fn certificate_problem(arn: &str) -> Option<&'static str> {
    if !arn.starts_with("arn:") || !arn.contains(":acm:") {
        Some("certificate does not look like an ACM certificate ARN")
    } else if !arn.contains(":acm:us-east-1:") {
        Some("distribution certificates must be issued in us-east-1")
    } else {
        None
    }
}

/// Why edge hosting cannot be deployed from `region`, if it can't.
pub fn edge_region_problem(region: &str) -> Option<&'static str> {
    (region != edge::EDGE_FUNCTION_REGION)
        .then_some("edge functions must be deployed from us-east-1")
}

/// Resources the deploy stage and the outputs point at.
#[derive(Debug, Clone)]
pub struct HostingTarget {
    pub bucket: LogicalId,
    pub access_identity: Option<LogicalId>,
    pub distribution: Option<LogicalId>,
}

/// Build the distribution declaration for edge hosting.
pub fn distribution(
    config: &StackConfig,
    ids: &StackIds,
    certificate_arn: Option<&str>,
) -> Distribution {
    let (aliases, certificate_arn) = match certificate_arn.filter(|arn| !arn.is_empty()) {
        Some(arn) => (config.host_names().to_vec(), Some(arn.to_string())),
        None => (Vec::new(), None),
    };

    Distribution {
        origin_bucket: ids.site_bucket.clone(),
        access_identity: ids.access_identity.clone(),
        aliases,
        certificate_arn,
        default_root_object: INDEX_DOCUMENT.to_string(),
        ttl_seconds: EDGE_CACHE_TTL_SECONDS,
        origin_request_function: Some(ids.edge_function_version.clone()),
    }
}

pub(crate) fn declare(graph: &mut ResourceGraph, id: &LogicalId, kind: ResourceKind) -> Result<()> {
    debug!(id = %id, kind = kind.type_name(), "declaring resource");
    graph.add(id.clone(), kind)?;
    Ok(())
}

/// Declare the storage (and, for edge hosting, the distribution) for a topology.
pub fn declare_hosting(
    graph: &mut ResourceGraph,
    ids: &StackIds,
    config: &StackConfig,
    topology: &Topology,
) -> Result<HostingTarget> {
    match topology {
        Topology::DirectBucket { .. } => {
            declare(
                graph,
                &ids.site_bucket,
                ResourceKind::Bucket(Bucket {
                    website: Some(Website {
                        index_document: INDEX_DOCUMENT.to_string(),
                        error_document: ERROR_DOCUMENT.to_string(),
                    }),
                    block_public_access: false,
                }),
            )?;
            declare(
                graph,
                &ids.site_bucket_policy,
                ResourceKind::BucketPolicy(BucketPolicy {
                    bucket: ids.site_bucket.clone(),
                    policy: site_bucket_policy(&ids.site_bucket, None),
                }),
            )?;

            Ok(HostingTarget {
                bucket: ids.site_bucket.clone(),
                access_identity: None,
                distribution: None,
            })
        }
        Topology::EdgeCached { certificate_arn } => {
            declare(
                graph,
                &ids.site_bucket,
                ResourceKind::Bucket(Bucket {
                    website: None,
                    block_public_access: true,
                }),
            )?;
            declare(
                graph,
                &ids.access_identity,
                ResourceKind::OriginAccessIdentity(OriginAccessIdentity {
                    comment: format!("Access to the {} site bucket", config.domain_name),
                }),
            )?;
            declare(
                graph,
                &ids.site_bucket_policy,
                ResourceKind::BucketPolicy(BucketPolicy {
                    bucket: ids.site_bucket.clone(),
                    policy: site_bucket_policy(&ids.site_bucket, Some(&ids.access_identity)),
                }),
            )?;

            declare(
                graph,
                &ids.edge_role,
                ResourceKind::Role(edge::edge_function_role()),
            )?;
            declare(
                graph,
                &ids.edge_function,
                ResourceKind::EdgeFunction(edge::edge_function(&ids.edge_role)),
            )?;
            declare(
                graph,
                &ids.edge_function_version,
                ResourceKind::FunctionVersion(FunctionVersion {
                    function: ids.edge_function.clone(),
                }),
            )?;

            declare(
                graph,
                &ids.distribution,
                ResourceKind::Distribution(distribution(
                    config,
                    ids,
                    certificate_arn.as_deref(),
                )),
            )?;

            Ok(HostingTarget {
                bucket: ids.site_bucket.clone(),
                access_identity: Some(ids.access_identity.clone()),
                distribution: Some(ids.distribution.clone()),
            })
        }
    }
}
