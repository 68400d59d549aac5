use scriptpack_build::DockerfileGenerator;
use scriptpack_build::eject as eject_mod;
use std::path::Path;

/// Print the build definition to stdout.
pub async fn render(project_dir: &Path, vcs_client: Option<bool>) -> anyhow::Result<()> {
    let (_, plan) = super::load_plan(project_dir, vcs_client)?;

    if eject_mod::is_ejected(project_dir) {
        eprintln!("note: .scriptpack/Dockerfile exists and is what `scriptpack build` uses");
    }

    print!("{}", DockerfileGenerator::new(&plan).render());
    Ok(())
}
