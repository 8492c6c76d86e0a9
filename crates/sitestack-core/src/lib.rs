//! Core domain types for sitestack.
//!
//! This crate contains:
//! - Logical identifiers and template expressions
//! - Stack configuration and hosting topology types
//! - IAM policy documents
//! - Build specification and artifact types
//! - Pipeline and stage definitions
//! - Resource descriptors and the linked resource graph

pub mod artifact;
pub mod buildspec;
pub mod error;
pub mod expr;
pub mod id;
pub mod pipeline;
pub mod policy;
pub mod resource;
pub mod stack;

pub use error::{Error, Result};
pub use expr::Expr;
pub use id::LogicalId;
pub use stack::{DeployMethod, StackConfig, Topology};
