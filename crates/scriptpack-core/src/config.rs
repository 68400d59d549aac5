use std::collections::BTreeMap;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up in the project directory.
pub const CONFIG_FILE: &str = "scriptpack.toml";

/// scriptpack.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptpackConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub entrypoint: EntrypointConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Image repository name (defaults to the project directory name)
    pub name: Option<String>,
    /// Image tag
    #[serde(default = "default_tag")]
    pub tag: String,
}

/// How the build definition lays out its stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageLayout {
    /// Dependencies are installed in a `builder` stage and only the
    /// provisioned environment is copied into the final stage.
    #[default]
    MultiStage,
    /// A single unlabelled stage does everything.
    SingleStage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Pinned base runtime image
    #[serde(default = "default_base_image")]
    pub base_image: String,
    /// Final-stage image. Defaults to `base_image` because the copied
    /// environment links against the base interpreter.
    #[serde(default)]
    pub runtime_image: Option<String>,
    #[serde(default)]
    pub stage_layout: StageLayout,
    /// Install a version-control client into the final image
    #[serde(default)]
    pub install_vcs_client: bool,
    /// System package providing the version-control client
    #[serde(default = "default_vcs_package")]
    pub vcs_package: String,
    /// Executable the client package puts on `PATH`
    #[serde(default = "default_vcs_command")]
    pub vcs_command: String,
    /// Additional system packages to install via apt-get
    #[serde(default)]
    pub extra_packages: Vec<String>,
    /// Static environment variables baked into the image.
    /// These become ENV directives in the Dockerfile.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrypointConfig {
    /// Interpreter executable name (resolved inside the image's environment)
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Script to run, relative to the project directory
    #[serde(default = "default_script")]
    pub script: String,
    /// Dependency manifest, relative to the project directory
    #[serde(default = "default_manifest")]
    pub manifest: String,
    /// Directory the script lives in inside the image
    #[serde(default = "default_workdir")]
    pub workdir: String,
    /// Files the manifest itself refers to (`-r base.txt`, `./vendor/lib`),
    /// made available to the installer during provisioning
    #[serde(default)]
    pub manifest_inputs: Vec<String>,
    /// Extra files copied next to the script
    #[serde(default)]
    pub include: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Container engine CLI
    #[serde(default = "default_engine_binary")]
    pub binary: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: None,
            tag: default_tag(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_image: default_base_image(),
            runtime_image: None,
            stage_layout: StageLayout::default(),
            install_vcs_client: false,
            vcs_package: default_vcs_package(),
            vcs_command: default_vcs_command(),
            extra_packages: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}

impl Default for EntrypointConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            script: default_script(),
            manifest: default_manifest(),
            workdir: default_workdir(),
            manifest_inputs: Vec::new(),
            include: Vec::new(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: default_engine_binary(),
        }
    }
}

impl ImageConfig {
    /// The image the final stage starts from.
    pub fn effective_runtime_image(&self) -> &str {
        self.runtime_image.as_deref().unwrap_or(&self.base_image)
    }
}

impl ScriptpackConfig {
    /// Load from scriptpack.toml in the given directory, or return defaults if not found.
    ///
    /// The loaded configuration is validated before it is returned.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        let config: Self = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })?
        } else {
            tracing::debug!("no {CONFIG_FILE} found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Check path and interpreter fields for values that cannot be
    /// rendered into a build definition.
    pub fn validate(&self) -> crate::Result<()> {
        let entry = &self.entrypoint;
        validate_relative_path(&entry.script)?;
        validate_relative_path(&entry.manifest)?;
        for path in entry.manifest_inputs.iter().chain(&entry.include) {
            validate_relative_path(path)?;
        }

        if !entry.workdir.starts_with('/') {
            return Err(crate::Error::InvalidWorkdir(entry.workdir.clone()));
        }

        if entry.interpreter.is_empty() || entry.interpreter.contains('/') {
            return Err(crate::Error::InvalidInterpreter(entry.interpreter.clone()));
        }

        Ok(())
    }

    /// Image repository name, falling back to the project directory name.
    pub fn image_name(&self, project_dir: &Path) -> String {
        if let Some(name) = &self.project.name {
            return name.clone();
        }

        std::fs::canonicalize(project_dir)
            // arch-lint: allow(no-silent-result-drop) reason="an unresolvable directory falls back to the default image name"
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_lowercase()))
            .unwrap_or_else(|| "scriptpack-app".to_owned())
    }

    /// `name:tag` reference for the built image.
    pub fn image_ref(&self, project_dir: &Path) -> String {
        format!("{}:{}", self.image_name(project_dir), self.project.tag)
    }
}

/// Build-context paths must stay inside the project directory.
fn validate_relative_path(path: &str) -> crate::Result<()> {
    if path.is_empty() {
        return Err(crate::Error::InvalidPath {
            path: path.to_owned(),
            reason: "path must not be empty",
        });
    }

    if path.chars().any(char::is_whitespace) {
        return Err(crate::Error::InvalidPath {
            path: path.to_owned(),
            reason: "path must not contain whitespace",
        });
    }

    let p = Path::new(path);
    if p.is_absolute() {
        return Err(crate::Error::InvalidPath {
            path: path.to_owned(),
            reason: "path must be relative to the project directory",
        });
    }

    if p.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(crate::Error::InvalidPath {
            path: path.to_owned(),
            reason: "path must not contain '..'",
        });
    }

    if p.components().all(|c| matches!(c, Component::CurDir)) {
        return Err(crate::Error::InvalidPath {
            path: path.to_owned(),
            reason: "path must name a file or directory inside the project",
        });
    }

    Ok(())
}

fn default_tag() -> String {
    "latest".to_owned()
}

fn default_base_image() -> String {
    "python:3.12-slim".to_owned()
}

fn default_vcs_package() -> String {
    "git".to_owned()
}

fn default_vcs_command() -> String {
    "git".to_owned()
}

fn default_interpreter() -> String {
    "python".to_owned()
}

fn default_script() -> String {
    "main.py".to_owned()
}

fn default_manifest() -> String {
    "requirements.txt".to_owned()
}

fn default_workdir() -> String {
    "/app".to_owned()
}

fn default_engine_binary() -> String {
    "docker".to_owned()
}
