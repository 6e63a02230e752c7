//! Provisioning steps resolved from the manifest.

use crate::config::{ExistenceCheck, Settings, StepConfig};
use std::collections::HashMap;
use std::time::Duration;

/// A step with manifest defaults applied.
#[derive(Debug, Clone)]
pub struct Step {
    /// Step name.
    pub name: String,

    /// Description (falls back to the name).
    pub description: String,

    /// Read-only existence check.
    pub check: ExistenceCheck,

    /// Install command.
    pub install: String,

    /// Optional version command.
    pub version: Option<String>,

    /// Failure is logged at error severity.
    pub blocking: bool,

    /// Timeout for every command this step runs.
    pub timeout: Duration,

    /// Step-specific environment.
    pub env: HashMap<String, String>,
}

impl Step {
    /// Resolve a step from its configuration and the global settings.
    pub fn from_config(config: &StepConfig, settings: &Settings) -> Self {
        Self {
            name: config.name.clone(),
            description: config
                .description
                .clone()
                .unwrap_or_else(|| config.name.clone()),
            check: config.check.clone(),
            install: config.install.clone(),
            version: config.version.clone(),
            blocking: config.blocking,
            timeout: Duration::from_secs(config.timeout.unwrap_or(settings.install_timeout)),
            env: config.env.clone(),
        }
    }
}
