//! IAM policy documents and grants.

use serde::Serialize;
use serde_json::{Value, json};

use crate::expr::Expr;

pub const POLICY_VERSION: &str = "2012-10-17";

/// Who a statement applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Anyone (`"*"`).
    Anyone,
    /// One or more service principals, e.g. `codebuild.amazonaws.com`.
    Service(Vec<String>),
    /// A canonical user, used for CDN origin access identities.
    CanonicalUser(Expr),
}

impl Principal {
    pub fn to_json(&self) -> Value {
        match self {
            Principal::Anyone => json!("*"),
            Principal::Service(services) if services.len() == 1 => {
                json!({ "Service": services[0] })
            }
            Principal::Service(services) => json!({ "Service": services }),
            Principal::CanonicalUser(id) => json!({ "CanonicalUser": id.to_json() }),
        }
    }
}

/// A single `Allow` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    pub principal: Option<Principal>,
    pub actions: Vec<String>,
    pub resources: Vec<Expr>,
}

impl PolicyStatement {
    pub fn new() -> Self {
        Self {
            principal: None,
            actions: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.extend(actions.into_iter().map(Into::into));
        self
    }

    pub fn with_resource(mut self, resource: Expr) -> Self {
        self.resources.push(resource);
        self
    }

    /// A statement that grants nothing contributes nothing to a document.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() || (self.resources.is_empty() && self.principal.is_none())
    }

    pub fn to_json(&self) -> Value {
        let mut statement = serde_json::Map::new();
        statement.insert("Effect".to_string(), json!("Allow"));
        if let Some(principal) = &self.principal {
            statement.insert("Principal".to_string(), principal.to_json());
        }
        statement.insert("Action".to_string(), one_or_many(&self.actions));
        if !self.resources.is_empty() {
            let resources: Vec<Value> = self.resources.iter().map(Expr::to_json).collect();
            statement.insert(
                "Resource".to_string(),
                if resources.len() == 1 {
                    resources[0].clone()
                } else {
                    Value::Array(resources)
                },
            );
        }
        Value::Object(statement)
    }
}

impl Default for PolicyStatement {
    fn default() -> Self {
        Self::new()
    }
}

fn one_or_many(actions: &[String]) -> Value {
    if actions.len() == 1 {
        json!(actions[0])
    } else {
        json!(actions)
    }
}

/// An additive list of statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyDocument {
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a statement. Empty statements are dropped.
    pub fn add(&mut self, statement: PolicyStatement) {
        if !statement.is_empty() {
            self.statements.push(statement);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Every (action, resource) pair this document allows, for inspection.
    pub fn grants(&self) -> Vec<PolicyGrant> {
        self.statements
            .iter()
            .flat_map(|s| {
                s.resources.iter().flat_map(move |r| {
                    s.actions.iter().map(move |a| PolicyGrant {
                        principal: s.principal.clone(),
                        resource: r.clone(),
                        action: a.clone(),
                    })
                })
            })
            .collect()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "Version": POLICY_VERSION,
            "Statement": self.statements.iter().map(PolicyStatement::to_json).collect::<Vec<_>>(),
        })
    }
}

impl Serialize for PolicyDocument {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A single (principal, resource, action) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyGrant {
    pub principal: Option<Principal>,
    pub resource: Expr,
    pub action: String,
}

/// Trust policy letting the given services assume a role.
pub fn assume_role_policy<I, S>(services: I) -> PolicyDocument
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut doc = PolicyDocument::new();
    doc.add(
        PolicyStatement::new()
            .with_principal(Principal::Service(
                services.into_iter().map(Into::into).collect(),
            ))
            .with_action("sts:AssumeRole"),
    );
    doc
}
