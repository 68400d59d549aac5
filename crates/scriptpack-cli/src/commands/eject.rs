use std::path::Path;

pub async fn eject(project_dir: &Path, vcs_client: Option<bool>) -> anyhow::Result<()> {
    let (_, plan) = super::load_plan(project_dir, vcs_client)?;
    scriptpack_build::eject::eject(project_dir, &plan)?;

    println!("Ejected build definition to .scriptpack/Dockerfile");
    println!("You can now edit it directly. scriptpack build will use this file.");
    Ok(())
}
