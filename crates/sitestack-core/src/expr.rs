//! Template values: literals and intrinsic functions.

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::LogicalId;

/// Pseudo parameters supplied by the provisioning system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    Region,
    AccountId,
    Partition,
}

impl Pseudo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pseudo::Region => "AWS::Region",
            Pseudo::AccountId => "AWS::AccountId",
            Pseudo::Partition => "AWS::Partition",
        }
    }
}

/// A string-valued expression resolved by the provisioning system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A plain string.
    Literal(String),
    /// `Ref` to another resource in the same template.
    Ref(LogicalId),
    /// `Fn::GetAtt` on another resource.
    GetAtt(LogicalId, String),
    /// `Ref` to a pseudo parameter.
    Pseudo(Pseudo),
    /// `Fn::Join` with an empty delimiter.
    Join(Vec<Expr>),
}

impl Expr {
    pub fn lit(value: impl Into<String>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn reference(id: &LogicalId) -> Self {
        Expr::Ref(id.clone())
    }

    pub fn get_att(id: &LogicalId, attribute: impl Into<String>) -> Self {
        Expr::GetAtt(id.clone(), attribute.into())
    }

    pub fn join(parts: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Join(parts.into_iter().collect())
    }

    /// `arn:<partition>:` prefix used to build ARNs by hand.
    pub fn arn_prefix() -> Self {
        Expr::join([Expr::lit("arn:"), Expr::Pseudo(Pseudo::Partition), Expr::lit(":")])
    }

    /// Every resource this expression depends on.
    pub fn references(&self) -> Vec<&LogicalId> {
        match self {
            Expr::Literal(_) | Expr::Pseudo(_) => Vec::new(),
            Expr::Ref(id) | Expr::GetAtt(id, _) => vec![id],
            Expr::Join(parts) => parts.iter().flat_map(|p| p.references()).collect(),
        }
    }

    /// Render this expression in template JSON form.
    pub fn to_json(&self) -> Value {
        match self {
            Expr::Literal(s) => Value::String(s.clone()),
            Expr::Ref(id) => json!({ "Ref": id.as_str() }),
            Expr::GetAtt(id, attr) => json!({ "Fn::GetAtt": [id.as_str(), attr] }),
            Expr::Pseudo(p) => json!({ "Ref": p.as_str() }),
            Expr::Join(parts) => {
                // Adjacent literals are merged to keep the output readable.
                let mut rendered: Vec<Value> = Vec::with_capacity(parts.len());
                for part in parts {
                    match (rendered.last_mut(), part) {
                        (Some(Value::String(prev)), Expr::Literal(s)) => prev.push_str(s),
                        _ => rendered.push(part.to_json()),
                    }
                }
                json!({ "Fn::Join": ["", rendered] })
            }
        }
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Literal(value.to_string())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Literal(value)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
