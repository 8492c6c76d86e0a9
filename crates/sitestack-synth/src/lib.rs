//! Stack assembly and template synthesis for sitestack.
//!
//! Turns a resolved [`StackConfig`] into:
//! - a hosting topology (direct bucket or edge cached)
//! - a linked resource graph with minimal IAM grants
//! - a Source → Build → Deploy pipeline
//! - a CloudFormation template and a build specification

pub mod assembler;
pub mod buildspec;
pub mod edge;
pub mod ids;
pub mod pipeline;
pub mod policy;
pub mod template;
pub mod topology;

pub use assembler::{SiteStack, StackOutput, StackSummary, assemble};
pub use sitestack_core::{StackConfig, Topology};
pub use template::{render, render_string};
pub use topology::select_topology;
