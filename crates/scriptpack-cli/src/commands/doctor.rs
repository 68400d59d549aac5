use scriptpack_core::{CONFIG_FILE, DependencyManifest, ScriptpackConfig};
use scriptpack_engine::{CheckResult, DoctorReport, EngineClient};
use std::path::Path;

pub async fn doctor(project_dir: &Path) -> anyhow::Result<()> {
    let loaded = ScriptpackConfig::load(project_dir);

    let mut report = DoctorReport::default();

    // Config file check
    report.config_file = match &loaded {
        Ok(_) if project_dir.join(CONFIG_FILE).exists() => CheckResult::ok("Found"),
        Ok(_) => CheckResult::ok("Not found, using defaults"),
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    let config = loaded
        // arch-lint: allow(no-silent-result-drop) reason="the load error is already reported in the config row; remaining checks run against defaults"
        .unwrap_or_default();

    report.engine = EngineClient::new(&config.engine.binary).check_engine().await;

    let manifest_path = project_dir.join(&config.entrypoint.manifest);
    report.manifest = match DependencyManifest::load(&manifest_path) {
        Ok(m) if m.is_empty() => CheckResult::ok("No requirements"),
        Ok(m) => CheckResult::ok(&format!("{} requirement(s)", m.requirements.len())),
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    report.script = if project_dir.join(&config.entrypoint.script).is_file() {
        CheckResult::ok(&config.entrypoint.script)
    } else {
        CheckResult::fail(&format!("{} not found", config.entrypoint.script))
    };

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed, see above for details");
    }

    Ok(())
}
