//! Ejected build definitions.
//!
//! `scriptpack eject` writes the rendered Dockerfile to `.scriptpack/` so it
//! can be edited by hand; `scriptpack build` then uses that file verbatim.
//! The first line records the version-control toggle the file was rendered
//! with, which is what a later build or verify compares its own toggle to:
//!
//! ```text
//! # scriptpack: ejected with install_vcs_client=false
//! # === Stage 1: Builder (dependency provisioning) ===
//! ...
//! ```

use std::path::{Path, PathBuf};

use scriptpack_core::ProvisionPlan;

use crate::dockerfile::DockerfileGenerator;

/// Directory holding ejected build configuration.
pub const EJECT_DIR: &str = ".scriptpack";

const STAMP_PREFIX: &str = "# scriptpack: ejected with install_vcs_client=";

/// A Dockerfile previously written by [`eject`], possibly edited since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EjectedDefinition {
    pub dockerfile: String,
    /// Toggle recorded at eject time; `None` once the stamp line is removed
    pub vcs_client: Option<bool>,
}

impl EjectedDefinition {
    fn parse(dockerfile: String) -> Self {
        let vcs_client = dockerfile
            .lines()
            .next()
            .and_then(|line| line.strip_prefix(STAMP_PREFIX))
            .and_then(|value| match value.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            });
        Self {
            dockerfile,
            vcs_client,
        }
    }

    /// Whether `plan` asks for a different version-control toggle than the
    /// one this file was rendered with.
    pub fn vcs_client_differs(&self, plan: &ProvisionPlan) -> bool {
        self.vcs_client
            .is_some_and(|recorded| recorded != plan.install_vcs_client)
    }
}

fn ejected_dockerfile_path(project_dir: &Path) -> PathBuf {
    project_dir.join(EJECT_DIR).join("Dockerfile")
}

/// Render `plan` into `.scriptpack/Dockerfile`, stamped with its toggle.
///
/// An existing ejected file is never overwritten.
pub fn eject(project_dir: &Path, plan: &ProvisionPlan) -> Result<PathBuf, EjectError> {
    let dockerfile_path = ejected_dockerfile_path(project_dir);
    if dockerfile_path.exists() {
        return Err(EjectError::AlreadyEjected(dockerfile_path));
    }

    let eject_dir = project_dir.join(EJECT_DIR);
    std::fs::create_dir_all(&eject_dir).map_err(|e| EjectError::CreateDir {
        path: eject_dir,
        source: e,
    })?;

    let content = format!(
        "{STAMP_PREFIX}{}\n{}",
        plan.install_vcs_client,
        DockerfileGenerator::new(plan).render()
    );
    std::fs::write(&dockerfile_path, content).map_err(|e| EjectError::Write {
        path: dockerfile_path.clone(),
        source: e,
    })?;

    tracing::debug!(path = %dockerfile_path.display(), "ejected build definition");
    Ok(dockerfile_path)
}

pub fn is_ejected(project_dir: &Path) -> bool {
    ejected_dockerfile_path(project_dir).exists()
}

/// Read the ejected Dockerfile and the toggle it was rendered with.
pub fn load_ejected(project_dir: &Path) -> Result<EjectedDefinition, EjectError> {
    let path = ejected_dockerfile_path(project_dir);
    let dockerfile =
        std::fs::read_to_string(&path).map_err(|e| EjectError::Read { path, source: e })?;
    Ok(EjectedDefinition::parse(dockerfile))
}

#[derive(Debug, thiserror::Error)]
pub enum EjectError {
    #[error("failed to create {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("build definition already ejected at {0}; edit it directly or delete it to re-eject")]
    AlreadyEjected(PathBuf),
    #[error("failed to write ejected Dockerfile {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read ejected Dockerfile {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
