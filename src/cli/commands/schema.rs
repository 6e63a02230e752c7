//! Schema command implementation.
//!
//! The `devrig schema` command prints the manifest JSON Schema, for editor
//! completion and validation.

use crate::config::manifest_json_schema;
use crate::error::{DevrigError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The schema command implementation.
pub struct SchemaCommand;

/// The schema as pretty-printed JSON.
pub fn render_schema() -> Result<String> {
    serde_json::to_string_pretty(&manifest_json_schema())
        .map_err(|e| DevrigError::Other(anyhow::anyhow!("Failed to render schema: {}", e)))
}

impl Command for SchemaCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        println!("{}", render_schema()?);
        Ok(CommandResult::success())
    }
}
