//! Core types and configuration for scriptpack.
//!
//! This crate defines the `scriptpack.toml` schema ([`ScriptpackConfig`]),
//! the dependency manifest model ([`DependencyManifest`]), the fixed
//! entrypoint pair ([`EntrypointDescriptor`]), the provisioning snapshot
//! ([`ProvisionPlan`]), and shared error types.

pub mod config;
pub mod entrypoint;
pub mod error;
pub mod manifest;
pub mod plan;

pub use config::{
    CONFIG_FILE, EngineConfig, EntrypointConfig, ImageConfig, ProjectConfig, ScriptpackConfig,
    StageLayout,
};
pub use entrypoint::{EntrypointDescriptor, VENV_DIR};
pub use error::{Error, Result};
pub use manifest::{DependencyManifest, ManifestError, ManifestWarning, Requirement};
pub use plan::ProvisionPlan;
