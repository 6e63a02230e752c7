//! Manifest loading, merging, and validation.
//!
//! This module handles the manifest that drives both commands:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Layered merging in [`merger`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use devrig::config::{load_manifest, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".devrig");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(
//!     dir.join("config.yml"),
//!     "checks:\n  - { name: sh, description: shell works, probe: 'true' }\n",
//! )
//! .unwrap();
//!
//! let manifest = load_manifest(temp.path(), None).unwrap();
//! validate(&manifest).unwrap();
//! assert_eq!(manifest.checks.len(), 1);
//! ```
//!
//! # Manifest Locations
//!
//! devrig discovers and merges manifests in this order:
//! 1. User global manifest (`~/.devrig/config.yml`)
//! 2. Project manifest (`.devrig/config.yml`)
//! 3. Local overrides (`.devrig/config.local.yml`)

pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use schema::{
    manifest_json_schema, CheckConfig, ExistenceCheck, Manifest, Settings, StepConfig,
};

pub use loader::{
    find_project_root, find_project_root_with_home, load_manifest, load_manifest_file,
    load_manifest_value, load_merged_manifest, parse_manifest, ConfigPaths, DEVRIG_DIR,
};

pub use merger::{deep_merge, merge_manifest, merge_manifests};

pub use validator::{validate, validate_manifest, ValidationError};
