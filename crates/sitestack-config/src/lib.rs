//! KDL configuration loading for sitestack.
//!
//! This crate handles:
//! - Site configuration files (site.kdl)
//! - Layering defaults, file values and command-line overrides
//! - Variable interpolation in resource name templates

pub mod error;
pub mod loader;
pub mod site;
pub mod variables;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILE, load_stack_config};
pub use site::{ConfigLayer, parse_site_config};
pub use variables::NameContext;
