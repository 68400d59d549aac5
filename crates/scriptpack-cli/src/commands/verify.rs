use scriptpack_build::eject as eject_mod;
use scriptpack_engine::EngineClient;
use std::path::Path;

/// Check that a built image carries the expected entrypoint and that the
/// version-control client is present exactly when the plan asks for it.
pub async fn verify(
    project_dir: &Path,
    tag: Option<String>,
    vcs_client: Option<bool>,
) -> anyhow::Result<()> {
    let (config, mut plan) = super::load_plan(project_dir, vcs_client)?;
    let image_ref = tag.unwrap_or_else(|| config.image_ref(project_dir));

    // An ejected Dockerfile decides the toggle the image was built with
    if vcs_client.is_none() && eject_mod::is_ejected(project_dir) {
        if let Some(recorded) = eject_mod::load_ejected(project_dir)?.vcs_client {
            plan = plan.with_vcs_client(recorded);
        }
    }

    let client = EngineClient::new(&config.engine.binary);
    if !client.image_exists(&image_ref).await? {
        anyhow::bail!("image {image_ref} not found; run `scriptpack build` first");
    }

    let report = client.verify(&image_ref, &plan).await?;

    println!("Verifying {image_ref}");
    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("image does not match the build plan");
    }

    Ok(())
}
