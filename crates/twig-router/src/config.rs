//! Router configuration

use serde::{Deserialize, Serialize};

/// Router configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Host container the routed view is mounted into
    pub mount_point: String,

    /// Route key whose handler renders unmatched paths
    pub not_found_key: String,

    /// Prefix marking a parameter segment
    pub param_marker: char,

    /// Text of the built-in not-found view
    pub fallback_message: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            mount_point: "main".to_string(),
            not_found_key: "404".to_string(),
            param_marker: ':',
            fallback_message: "404 Not Found".to_string(),
        }
    }
}
