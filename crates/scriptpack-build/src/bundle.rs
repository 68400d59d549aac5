use std::path::{Path, PathBuf};

use scriptpack_core::ProvisionPlan;

use crate::eject::EJECT_DIR;

/// Directory the build context is assembled in, relative to the project.
pub const CONTEXT_DIR: &str = ".scriptpack-build";

/// Directory names never copied out of an `include`d directory.
const CONTEXT_EXCLUDES: &[&str] = &[CONTEXT_DIR, EJECT_DIR, ".git"];

/// Ignore file written into every context. The context only ever holds
/// declared inputs, so this guards against caches created next to them.
const DOCKERIGNORE: &str = "**/__pycache__\n**/*.pyc\n**/.git\n";

/// Assembles the build context for an engine build.
///
/// The context holds exactly the declared inputs (manifest, script,
/// `manifest_inputs`, `include` paths) at their project-relative paths, plus the rendered
/// Dockerfile and a `.dockerignore`. A previous context is removed first.
pub fn create_context(
    project_dir: &Path,
    plan: &ProvisionPlan,
    dockerfile_content: &str,
) -> Result<PathBuf, BundleError> {
    let context_dir = project_dir.join(CONTEXT_DIR);

    // Clean previous context
    if context_dir.exists() {
        std::fs::remove_dir_all(&context_dir).map_err(|e| BundleError::Cleanup {
            path: context_dir.clone(),
            source: e,
        })?;
    }
    std::fs::create_dir_all(&context_dir).map_err(|e| BundleError::Create {
        path: context_dir.clone(),
        source: e,
    })?;

    let inputs = std::iter::once(&plan.manifest_file)
        .chain(std::iter::once(&plan.script_file))
        .chain(plan.manifest_inputs.iter())
        .chain(plan.include.iter());

    for relative_path in inputs {
        let src = project_dir.join(relative_path);
        if !src.exists() {
            return Err(BundleError::MissingInput(src));
        }
        copy_recursive(&src, &context_dir.join(relative_path))?;
    }

    let dockerfile_path = context_dir.join("Dockerfile");
    std::fs::write(&dockerfile_path, dockerfile_content).map_err(|e| {
        BundleError::WriteDockerfile {
            path: dockerfile_path.clone(),
            source: e,
        }
    })?;

    let ignore_path = context_dir.join(".dockerignore");
    std::fs::write(&ignore_path, DOCKERIGNORE).map_err(|e| BundleError::WriteDockerfile {
        path: ignore_path.clone(),
        source: e,
    })?;

    tracing::debug!(context = %context_dir.display(), "build context assembled");
    Ok(context_dir)
}

/// Copy a file, or a directory tree, creating parent directories as needed.
fn copy_recursive(src: &Path, dst: &Path) -> Result<(), BundleError> {
    if src.is_dir() {
        std::fs::create_dir_all(dst).map_err(|e| BundleError::Create {
            path: dst.to_path_buf(),
            source: e,
        })?;

        let entries = std::fs::read_dir(src).map_err(|e| BundleError::ReadDir {
            path: src.to_path_buf(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| BundleError::ReadDir {
                path: src.to_path_buf(),
                source: e,
            })?;
            if CONTEXT_EXCLUDES.iter().any(|x| entry.file_name() == *x) {
                continue;
            }
            copy_recursive(&entry.path(), &dst.join(entry.file_name()))?;
        }
        return Ok(());
    }

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BundleError::Create {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::copy(src, dst).map_err(|e| BundleError::CopyFile {
        path: src.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("build input not found: {0}")]
    MissingInput(PathBuf),
    #[error("failed to clean up build context {path}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create directory {path}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read directory {path}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy file {path}")]
    CopyFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    WriteDockerfile {
        path: PathBuf,
        source: std::io::Error,
    },
}
