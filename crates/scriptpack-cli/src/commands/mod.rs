mod build;
mod doctor;
mod eject;
mod exec;
mod init;
mod lint;
mod render;
mod run;
mod verify;

use scriptpack_core::{ProvisionPlan, ScriptpackConfig};
use std::path::Path;

/// Commented scriptpack.toml written by `scriptpack init`.
pub(crate) const SCRIPTPACK_TOML_TEMPLATE: &str = r#"[project]
# name = "my-tool"                     # defaults to the directory name
# tag = "latest"

[image]
# base_image = "python:3.12-slim"
# runtime_image = "python:3.12-slim"   # defaults to base_image
# stage_layout = "multi-stage"         # or "single-stage"
# install_vcs_client = false
# vcs_package = "git"
# vcs_command = "git"
# extra_packages = []

[image.env]
# LOG_LEVEL = "info"

[entrypoint]
# interpreter = "python"
# script = "main.py"
# manifest = "requirements.txt"
# manifest_inputs = []                 # files the manifest refers to, e.g. "base.txt"
# workdir = "/app"
# include = []                         # extra files copied next to the script

[engine]
# binary = "docker"
"#;

pub use build::build;
pub use doctor::doctor;
pub use eject::eject;
pub use exec::exec;
pub use init::init_project;
pub use lint::lint;
pub use render::render;
pub use run::run;
pub use verify::verify;

/// Load configuration and resolve the provisioning plan, applying a
/// one-off override of the version-control client toggle.
pub(crate) fn load_plan(
    project_dir: &Path,
    vcs_client: Option<bool>,
) -> anyhow::Result<(ScriptpackConfig, ProvisionPlan)> {
    let config = ScriptpackConfig::load(project_dir)?;
    let mut plan = ProvisionPlan::from_config(&config);
    if let Some(install) = vcs_client {
        plan = plan.with_vcs_client(install);
    }
    Ok((config, plan))
}
