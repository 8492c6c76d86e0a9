//! CloudFormation template rendering.

use serde_json::{Map, Value, json};
use sitestack_core::pipeline::{Action, ActionKind};
use sitestack_core::resource::{
    Bucket, BuildProject, Distribution, EdgeFunction, PipelineResource, Resource, ResourceKind,
    Role,
};
use sitestack_core::{Expr, Result};

use crate::assembler::SiteStack;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

const S3_ORIGIN_ID: &str = "S3Origin";

/// Render an assembled stack as a template document.
///
/// Resources keep their declaration order, so the output is stable.
pub fn render(stack: &SiteStack) -> Result<Value> {
    let mut resources = Map::new();
    for resource in stack.graph.iter() {
        resources.insert(resource.id.to_string(), render_resource(resource)?);
    }

    let mut outputs = Map::new();
    for output in &stack.outputs {
        outputs.insert(
            output.id.to_string(),
            json!({
                "Description": output.description,
                "Value": output.value.to_json(),
            }),
        );
    }

    Ok(json!({
        "AWSTemplateFormatVersion": TEMPLATE_FORMAT_VERSION,
        "Description": format!(
            "{}: static site for {} ({})",
            stack.config.stack_name, stack.config.domain_name, stack.topology
        ),
        "Resources": resources,
        "Outputs": outputs,
    }))
}

/// Render as pretty-printed JSON text.
pub fn render_string(stack: &SiteStack) -> Result<String> {
    Ok(serde_json::to_string_pretty(&render(stack)?)?)
}

fn render_resource(resource: &Resource) -> Result<Value> {
    let properties = match &resource.kind {
        ResourceKind::Repository(repo) => json!({
            "RepositoryName": repo.name,
            "RepositoryDescription": repo.description,
        }),
        ResourceKind::Role(role) => role_properties(role, resource.id.as_str()),
        ResourceKind::BuildProject(project) => build_project_properties(project)?,
        ResourceKind::Bucket(bucket) => bucket_properties(bucket),
        ResourceKind::BucketPolicy(bp) => json!({
            "Bucket": Expr::reference(&bp.bucket),
            "PolicyDocument": bp.policy,
        }),
        ResourceKind::OriginAccessIdentity(oai) => json!({
            "CloudFrontOriginAccessIdentityConfig": { "Comment": oai.comment },
        }),
        ResourceKind::Distribution(dist) => distribution_properties(dist),
        ResourceKind::EdgeFunction(function) => edge_function_properties(function),
        ResourceKind::FunctionVersion(version) => json!({
            "FunctionName": Expr::reference(&version.function),
        }),
        ResourceKind::Pipeline(pipeline) => pipeline_properties(pipeline),
    };

    Ok(json!({
        "Type": resource.kind.type_name(),
        "Properties": properties,
    }))
}

fn role_properties(role: &Role, id: &str) -> Value {
    let mut properties = Map::new();
    properties.insert(
        "AssumeRolePolicyDocument".to_string(),
        role.assumed_by.to_json(),
    );
    if !role.managed_policy_arns.is_empty() {
        properties.insert(
            "ManagedPolicyArns".to_string(),
            Value::Array(role.managed_policy_arns.iter().map(Expr::to_json).collect()),
        );
    }
    if !role.policy.is_empty() {
        properties.insert(
            "Policies".to_string(),
            json!([{
                "PolicyName": format!("{}Policy", id),
                "PolicyDocument": role.policy.to_json(),
            }]),
        );
    }
    Value::Object(properties)
}

fn build_project_properties(project: &BuildProject) -> Result<Value> {
    let variables: Vec<Value> = project
        .environment
        .iter()
        .map(|(name, value)| {
            json!({
                "Name": name,
                "Type": "PLAINTEXT",
                "Value": value.to_json(),
            })
        })
        .collect();

    Ok(json!({
        "ServiceRole": Expr::get_att(&project.role, "Arn"),
        "Artifacts": { "Type": "CODEPIPELINE" },
        "Source": {
            "Type": "CODEPIPELINE",
            "BuildSpec": project.buildspec.to_json_string()?,
        },
        "Environment": {
            "Type": "LINUX_CONTAINER",
            "ComputeType": project.compute_type,
            "Image": project.image,
            "EnvironmentVariables": variables,
        },
    }))
}

fn bucket_properties(bucket: &Bucket) -> Value {
    let mut properties = Map::new();
    if let Some(website) = &bucket.website {
        properties.insert(
            "WebsiteConfiguration".to_string(),
            json!({
                "IndexDocument": website.index_document,
                "ErrorDocument": website.error_document,
            }),
        );
    }
    let blocked = bucket.block_public_access;
    properties.insert(
        "PublicAccessBlockConfiguration".to_string(),
        json!({
            "BlockPublicAcls": blocked,
            "BlockPublicPolicy": blocked,
            "IgnorePublicAcls": blocked,
            "RestrictPublicBuckets": blocked,
        }),
    );
    Value::Object(properties)
}

fn distribution_properties(dist: &Distribution) -> Value {
    let mut cache_behavior = json!({
        "TargetOriginId": S3_ORIGIN_ID,
        "ViewerProtocolPolicy": "redirect-to-https",
        "AllowedMethods": ["GET", "HEAD"],
        "CachedMethods": ["GET", "HEAD"],
        "Compress": true,
        "ForwardedValues": { "QueryString": false },
        "DefaultTTL": dist.ttl_seconds,
        "MinTTL": dist.ttl_seconds,
        "MaxTTL": dist.ttl_seconds,
    });
    if let Some(version) = &dist.origin_request_function {
        cache_behavior["LambdaFunctionAssociations"] = json!([{
            "EventType": "origin-request",
            "LambdaFunctionARN": Expr::reference(version),
        }]);
    }

    let viewer_certificate = match &dist.certificate_arn {
        Some(arn) => json!({
            "AcmCertificateArn": arn,
            "SslSupportMethod": "sni-only",
            "MinimumProtocolVersion": "TLSv1.2_2018",
        }),
        None => json!({ "CloudFrontDefaultCertificate": true }),
    };

    let mut config = Map::new();
    config.insert("Enabled".to_string(), json!(true));
    if !dist.aliases.is_empty() {
        config.insert("Aliases".to_string(), json!(dist.aliases));
    }
    config.insert(
        "DefaultRootObject".to_string(),
        json!(dist.default_root_object),
    );
    config.insert("HttpVersion".to_string(), json!("http2"));
    config.insert(
        "Origins".to_string(),
        json!([{
            "Id": S3_ORIGIN_ID,
            "DomainName": Expr::get_att(&dist.origin_bucket, "RegionalDomainName"),
            "S3OriginConfig": {
                "OriginAccessIdentity": Expr::join([
                    Expr::lit("origin-access-identity/cloudfront/"),
                    Expr::reference(&dist.access_identity),
                ]),
            },
        }]),
    );
    config.insert("DefaultCacheBehavior".to_string(), cache_behavior);
    config.insert("ViewerCertificate".to_string(), viewer_certificate);

    json!({ "DistributionConfig": config })
}

fn edge_function_properties(function: &EdgeFunction) -> Value {
    json!({
        "Runtime": function.runtime,
        "Handler": function.handler,
        "Role": Expr::get_att(&function.role, "Arn"),
        "MemorySize": 128,
        "Timeout": 5,
        "Code": { "ZipFile": function.code },
    })
}

fn action_json(action: &Action) -> Value {
    let (owner, provider, configuration) = match &action.kind {
        ActionKind::Source { repository, branch } => (
            "AWS",
            "CodeCommit",
            json!({
                "RepositoryName": Expr::get_att(repository, "Name"),
                "BranchName": branch,
            }),
        ),
        ActionKind::Build { project } => (
            "AWS",
            "CodeBuild",
            json!({ "ProjectName": Expr::reference(project) }),
        ),
        ActionKind::Deploy { bucket, extract } => (
            "AWS",
            "S3",
            json!({
                "BucketName": Expr::reference(bucket),
                "Extract": extract.to_string(),
            }),
        ),
    };

    let artifacts = |list: &[sitestack_core::artifact::Artifact]| -> Value {
        Value::Array(list.iter().map(|a| json!({ "Name": a.name() })).collect())
    };

    json!({
        "Name": action.name,
        "ActionTypeId": {
            "Category": action.kind.category(),
            "Owner": owner,
            "Provider": provider,
            "Version": "1",
        },
        "Configuration": configuration,
        "InputArtifacts": artifacts(&action.inputs),
        "OutputArtifacts": artifacts(&action.outputs),
        "RunOrder": 1,
    })
}

fn pipeline_properties(resource: &PipelineResource) -> Value {
    let stages: Vec<Value> = resource
        .pipeline
        .stages
        .iter()
        .map(|stage| {
            json!({
                "Name": stage.name,
                "Actions": stage.actions.iter().map(action_json).collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "Name": resource.pipeline.name,
        "RoleArn": Expr::get_att(&resource.role, "Arn"),
        "ArtifactStore": {
            "Type": "S3",
            "Location": Expr::reference(&resource.artifact_bucket),
        },
        "Stages": stages,
    })
}
