//! Variable interpolation for resource name templates.
//!
//! Supports variables like:
//! - `${domain}` - Bare domain name
//! - `${stack}` - Stack name
//! - `${hugo.version}` - Hugo release installed by the build
//! - `${branch}` - Branch the pipeline tracks
//!
//! Unknown variables are left in place.

use regex::Regex;
use std::sync::LazyLock;

// Regex for matching ${...} variables
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)?)\}")
        .expect("variable pattern is valid")
});

/// Values available to name templates.
#[derive(Debug, Clone, Default)]
pub struct NameContext {
    pub domain: String,
    pub stack: String,
    pub hugo_version: String,
    pub branch: String,
}

impl NameContext {
    /// Resolve a variable name to its value.
    pub fn resolve(&self, var_name: &str) -> Option<String> {
        let parts: Vec<&str> = var_name.split('.').collect();

        match parts.as_slice() {
            ["domain"] => Some(self.domain.clone()),
            ["stack"] => Some(self.stack.clone()),
            ["branch"] => Some(self.branch.clone()),
            ["hugo", "version"] => Some(self.hugo_version.clone()),
            _ => None,
        }
    }

    /// Interpolate all variables in a string.
    pub fn interpolate(&self, input: &str) -> String {
        VAR_REGEX
            .replace_all(input, |caps: &regex::Captures| {
                let var_name = &caps[1];
                self.resolve(var_name)
                    .unwrap_or_else(|| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// Variable names in `input` that this context cannot resolve.
    pub fn unresolved(&self, input: &str) -> Vec<String> {
        VAR_REGEX
            .captures_iter(input)
            .map(|caps| caps[1].to_string())
            .filter(|name| self.resolve(name).is_none())
            .collect()
    }
}
