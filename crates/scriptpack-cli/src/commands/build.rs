use scriptpack_build::DockerfileGenerator;
use scriptpack_build::{bundle, eject as eject_mod};
use scriptpack_core::DependencyManifest;
use scriptpack_engine::EngineClient;
use std::path::Path;

/// Execute the build pipeline: lint → Dockerfile → context → engine build.
pub async fn build(
    project_dir: &Path,
    tag: Option<String>,
    vcs_client: Option<bool>,
) -> anyhow::Result<()> {
    let (config, plan) = super::load_plan(project_dir, vcs_client)?;
    let image_ref = tag.unwrap_or_else(|| config.image_ref(project_dir));

    // Malformed manifests stop here, before the engine is involved
    let manifest = DependencyManifest::load(&project_dir.join(&config.entrypoint.manifest))?;
    for warning in manifest.warnings() {
        tracing::warn!("{}: {warning}", config.entrypoint.manifest);
    }
    let undeclared = plan.undeclared_manifest_inputs(&manifest);
    if !undeclared.is_empty() {
        anyhow::bail!(
            "{} refers to {} which the installer will not see; add them to [entrypoint].manifest_inputs",
            config.entrypoint.manifest,
            undeclared.join(", ")
        );
    }

    // Determine Dockerfile content
    let dockerfile_content = if eject_mod::is_ejected(project_dir) {
        let ejected = eject_mod::load_ejected(project_dir)?;
        if ejected.vcs_client_differs(&plan) {
            tracing::warn!(
                "ejected Dockerfile was rendered with install_vcs_client={}; edit it or re-eject to change the version-control client",
                !plan.install_vcs_client
            );
        } else if ejected.vcs_client.is_none() && vcs_client.is_some() {
            tracing::warn!("--vcs-client/--no-vcs-client has no effect on an ejected Dockerfile");
        }
        println!("Using ejected Dockerfile from .scriptpack/Dockerfile");
        ejected.dockerfile
    } else {
        DockerfileGenerator::new(&plan).render()
    };

    // Assemble context
    println!("Assembling build context...");
    let context_dir = bundle::create_context(project_dir, &plan, &dockerfile_content)?;

    // Engine build
    println!("Building {image_ref}...");
    let client = EngineClient::new(&config.engine.binary);
    client.build_image(&context_dir, &image_ref).await?;

    println!();
    println!("Built: {image_ref}");
    Ok(())
}
