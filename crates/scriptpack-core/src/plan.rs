use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::config::{ScriptpackConfig, StageLayout};
use crate::entrypoint::EntrypointDescriptor;
use crate::manifest::DependencyManifest;

/// Everything the image build needs, resolved once from configuration.
///
/// A plan is a read-only snapshot: the build definition renderer and the
/// build context assembler both consume it, neither mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub base_image: String,
    pub runtime_image: String,
    pub stage_layout: StageLayout,
    /// Manifest path inside the build context
    pub manifest_file: String,
    /// Script path inside the build context, also its path under `workdir`
    pub script_file: String,
    /// Files the installer reads alongside the manifest, copied into the
    /// provisioning stage before the install step
    pub manifest_inputs: Vec<String>,
    /// Extra files, relative paths inside the build context
    pub include: Vec<String>,
    pub workdir: String,
    pub install_vcs_client: bool,
    pub vcs_package: String,
    pub vcs_command: String,
    pub extra_packages: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub entrypoint: EntrypointDescriptor,
}

impl ProvisionPlan {
    pub fn from_config(config: &ScriptpackConfig) -> Self {
        let image = &config.image;
        let entry = &config.entrypoint;

        Self {
            base_image: image.base_image.clone(),
            runtime_image: image.effective_runtime_image().to_owned(),
            stage_layout: image.stage_layout,
            manifest_file: entry.manifest.clone(),
            script_file: entry.script.clone(),
            manifest_inputs: entry.manifest_inputs.clone(),
            include: entry.include.clone(),
            workdir: entry.workdir.clone(),
            install_vcs_client: image.install_vcs_client,
            vcs_package: image.vcs_package.clone(),
            vcs_command: image.vcs_command.clone(),
            extra_packages: image.extra_packages.clone(),
            env: image.env.clone(),
            entrypoint: EntrypointDescriptor::for_image(config),
        }
    }

    /// Same plan with the version-control client toggle overridden.
    pub fn with_vcs_client(self, install: bool) -> Self {
        Self {
            install_vcs_client: install,
            ..self
        }
    }

    /// System packages the final stage installs, in declaration order.
    pub fn system_packages(&self) -> Vec<&str> {
        let mut packages = Vec::new();
        if self.install_vcs_client {
            packages.push(self.vcs_package.as_str());
        }
        for pkg in &self.extra_packages {
            if !packages.contains(&pkg.as_str()) {
                packages.push(pkg.as_str());
            }
        }
        packages
    }

    /// Local files `manifest` refers to that the provisioning stage will not
    /// have, as project-relative paths.
    ///
    /// References resolve against the manifest's directory, the way the
    /// installer resolves them. Absolute references point into the image
    /// and are not checked; neither is the manifest's own directory
    /// (`-e .`), whose contents are declared file by file.
    pub fn undeclared_manifest_inputs(&self, manifest: &DependencyManifest) -> Vec<String> {
        let base = Path::new(&self.manifest_file)
            .parent()
            .unwrap_or(Path::new(""));
        let manifest_dir = normalize(base);
        let declared: Vec<PathBuf> = self
            .manifest_inputs
            .iter()
            .filter_map(|p| normalize(Path::new(p)))
            .collect();

        manifest
            .local_references()
            .into_iter()
            .filter(|r| !Path::new(r).is_absolute())
            .filter_map(|r| match normalize(&base.join(r)) {
                Some(path) if Some(&path) == manifest_dir.as_ref() => None,
                Some(path) if declared.iter().any(|d| path.starts_with(d)) => None,
                Some(path) => Some(path.to_string_lossy().into_owned()),
                None => Some(r.to_owned()),
            })
            .collect()
    }
}

/// Drop `.` components and fold `..`; `None` if the path escapes its root.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            other => out.push(other),
        }
    }
    Some(out)
}
