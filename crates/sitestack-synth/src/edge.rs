//! Clean-URL rewriting at the edge.
//!
//! Every origin request passes through a small function that maps
//! extensionless paths onto the generator's `index.html` layout.

use sitestack_core::policy::{PolicyDocument, assume_role_policy};
use sitestack_core::resource::{EdgeFunction, Role};
use sitestack_core::{Expr, LogicalId};

pub const EDGE_RUNTIME: &str = "nodejs18.x";
pub const EDGE_HANDLER: &str = "index.handler";

/// Edge functions are replicated from this region only.
pub const EDGE_FUNCTION_REGION: &str = "us-east-1";

/// Services that must be able to assume the function's role: the regular
/// function service and the edge replication service.
pub const EDGE_TRUSTED_SERVICES: [&str; 2] = ["lambda.amazonaws.com", "edgelambda.amazonaws.com"];

const INDEX_DOCUMENT: &str = "index.html";

/// Handler source, kept in step with [`rewrite_uri`].
pub const EDGE_HANDLER_SOURCE: &str = r#"'use strict';
exports.handler = (event, context, callback) => {
  const request = event.Records[0].cf.request;
  const uri = request.uri;
  if (uri.endsWith('/')) {
    request.uri = uri + 'index.html';
  } else if (!uri.split('/').pop().includes('.')) {
    request.uri = uri + '/index.html';
  }
  callback(null, request);
};
"#;

/// Map a request path onto the object that serves it.
///
/// `/about/` and `/about` both become `/about/index.html`; paths whose last
/// segment has an extension are left alone.
pub fn rewrite_uri(uri: &str) -> String {
    if uri.ends_with('/') {
        return format!("{}{}", uri, INDEX_DOCUMENT);
    }
    let last_segment = uri.rsplit('/').next().unwrap_or(uri);
    if last_segment.contains('.') {
        uri.to_string()
    } else {
        format!("{}/{}", uri, INDEX_DOCUMENT)
    }
}

/// Execution role for the edge function: basic logging only.
pub fn edge_function_role() -> Role {
    Role {
        assumed_by: assume_role_policy(EDGE_TRUSTED_SERVICES),
        managed_policy_arns: vec![Expr::join([
            Expr::arn_prefix(),
            Expr::lit("iam::aws:policy/service-role/AWSLambdaBasicExecutionRole"),
        ])],
        policy: PolicyDocument::new(),
    }
}

pub fn edge_function(role: &LogicalId) -> EdgeFunction {
    EdgeFunction {
        role: role.clone(),
        runtime: EDGE_RUNTIME.to_string(),
        handler: EDGE_HANDLER.to_string(),
        code: EDGE_HANDLER_SOURCE.to_string(),
    }
}
