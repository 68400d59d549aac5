use std::path::Path;

use scriptpack_build::bundle::{CONTEXT_DIR, BundleError, create_context};
use scriptpack_build::dockerfile::DockerfileGenerator;
use scriptpack_build::eject::{EJECT_DIR, EjectError, eject, is_ejected, load_ejected};
use scriptpack_core::{ProvisionPlan, ScriptpackConfig, StageLayout};
use tempfile::TempDir;

fn default_plan() -> ProvisionPlan {
    ProvisionPlan::from_config(&ScriptpackConfig::default())
}

fn render(plan: &ProvisionPlan) -> String {
    DockerfileGenerator::new(plan).render()
}

/// Minimal script project: main.py + requirements.txt.
fn init_script_project(dir: &Path) {
    std::fs::write(dir.join("main.py"), "import sys\nprint(sys.argv[1:])\n").unwrap();
    std::fs::write(dir.join("requirements.txt"), "requests==2.31.0\n").unwrap();
}

/// Parse the `ENTRYPOINT` line's exec-form array.
fn entrypoint_of(dockerfile: &str) -> Vec<String> {
    let line = dockerfile
        .lines()
        .find_map(|l| l.strip_prefix("ENTRYPOINT "))
        .expect("ENTRYPOINT line");
    serde_json::from_str(line).unwrap()
}

// ── Dockerfile Generation Tests ──

#[test]
fn dockerfile_multi_stage_consumes_builder() {
    let output = render(&default_plan());

    assert!(output.contains("Stage 1: Builder"));
    assert!(output.contains("Stage 2: Runtime"));
    assert!(output.contains("FROM python:3.12-slim AS builder"));
    assert!(output.contains("COPY --from=builder /opt/venv /opt/venv"));
    assert_eq!(output.matches("FROM ").count(), 2);
}

#[test]
fn dockerfile_single_stage_has_no_stage_label() {
    let mut config = ScriptpackConfig::default();
    config.image.stage_layout = StageLayout::SingleStage;
    let output = render(&ProvisionPlan::from_config(&config));

    assert_eq!(output.matches("FROM ").count(), 1);
    assert!(!output.contains(" AS "));
    assert!(!output.contains("--from="));
    assert!(output.contains("pip install --no-cache-dir -r requirements.txt"));
}

#[test]
fn dockerfile_installs_manifest_into_venv() {
    let output = render(&default_plan());

    assert!(output.contains("RUN python -m venv /opt/venv"));
    assert!(output.contains("COPY requirements.txt ./requirements.txt"));
    assert!(output.contains("pip install --no-cache-dir -r requirements.txt"));
}

#[test]
fn dockerfile_install_happens_before_entrypoint() {
    let output = render(&default_plan());

    let install = output.find("pip install").unwrap();
    let script = output.find("COPY main.py").unwrap();
    let entry = output.find("ENTRYPOINT").unwrap();
    assert!(install < script);
    assert!(script < entry);
}

#[test]
fn dockerfile_run_steps_fail_fast() {
    let mut config = ScriptpackConfig::default();
    config.image.install_vcs_client = true;
    let output = render(&ProvisionPlan::from_config(&config));

    for line in output.lines().filter(|l| l.starts_with("RUN ")) {
        assert!(!line.contains(';'), "RUN step must chain with &&: {line}");
        assert!(!line.contains("|| true"), "RUN step must not mask failures: {line}");
    }
}

#[test]
fn dockerfile_uses_configured_images() {
    let mut config = ScriptpackConfig::default();
    config.image.base_image = "python:3.8-slim".to_owned();
    config.image.runtime_image = Some("python:3.8-slim-bookworm".to_owned());
    let output = render(&ProvisionPlan::from_config(&config));

    assert!(output.contains("FROM python:3.8-slim AS builder"));
    assert!(output.contains("FROM python:3.8-slim-bookworm\n"));
}

#[test]
fn dockerfile_entrypoint_is_exec_form_descriptor() {
    let output = render(&default_plan());

    assert_eq!(
        entrypoint_of(&output),
        vec!["/opt/venv/bin/python", "/app/main.py"]
    );
    assert!(!output.contains("CMD"));
}

#[test]
fn dockerfile_custom_script_and_workdir() {
    let mut config = ScriptpackConfig::default();
    config.entrypoint.script = "bin/run.py".to_owned();
    config.entrypoint.workdir = "/srv/".to_owned();
    let output = render(&ProvisionPlan::from_config(&config));

    assert!(output.contains("WORKDIR /srv/\n"));
    assert!(output.contains("COPY bin/run.py /srv/bin/run.py"));
    assert_eq!(
        entrypoint_of(&output),
        vec!["/opt/venv/bin/python", "/srv/bin/run.py"]
    );
}

// ── Version-control client toggle ──

#[test]
fn dockerfile_installs_vcs_client_when_enabled() {
    let mut config = ScriptpackConfig::default();
    config.image.install_vcs_client = true;
    let output = render(&ProvisionPlan::from_config(&config));

    assert!(output.contains("apt-get install -y --no-install-recommends git"));
    // Installed in the final stage, after the runtime FROM
    let runtime_from = output.find("Stage 2: Runtime").unwrap();
    let install = output.find("apt-get install").unwrap();
    assert!(install > runtime_from);
}

#[test]
fn dockerfile_omits_vcs_client_when_disabled() {
    let output = render(&default_plan());

    assert!(!output.contains("apt-get install"));
    assert!(!output.contains(" git"));
}

#[test]
fn dockerfile_vcs_client_single_stage() {
    let mut config = ScriptpackConfig::default();
    config.image.stage_layout = StageLayout::SingleStage;
    config.image.install_vcs_client = true;
    let output = render(&ProvisionPlan::from_config(&config));

    assert!(output.contains("apt-get install -y --no-install-recommends git"));
}

#[test]
fn dockerfile_toggle_is_the_only_difference() {
    let without = render(&default_plan());
    let with = render(&default_plan().with_vcs_client(true));

    let extra: Vec<&str> = with
        .lines()
        .filter(|l| !without.lines().any(|w| w == *l))
        .collect();
    assert_eq!(extra.len(), 1);
    assert!(extra[0].contains("apt-get install"));
}

#[test]
fn dockerfile_includes_extra_packages() {
    let mut config = ScriptpackConfig::default();
    config.image.install_vcs_client = true;
    config.image.extra_packages = vec!["ca-certificates".to_owned(), "jq".to_owned()];
    let output = render(&ProvisionPlan::from_config(&config));

    assert!(output.contains("--no-install-recommends git ca-certificates jq &&"));
}

// ── Dockerfile: manifest inputs ──

#[test]
fn dockerfile_copies_manifest_inputs_before_install() {
    let mut config = ScriptpackConfig::default();
    config.entrypoint.manifest_inputs = vec!["base.txt".to_owned(), "vendor/mylib".to_owned()];
    config.entrypoint.include = vec!["base.txt".to_owned()];
    let dockerfile = render(&ProvisionPlan::from_config(&config));

    let runtime_at = dockerfile.find("# === Stage 2: Runtime").unwrap();
    let install_at = dockerfile.find("pip install --no-cache-dir -r").unwrap();
    let base_at = dockerfile.find("COPY base.txt ./base.txt\n").unwrap();
    let vendor_at = dockerfile.find("COPY vendor/mylib ./vendor/mylib\n").unwrap();

    assert!(base_at < install_at && vendor_at < install_at);
    assert!(install_at < runtime_at);
}

#[test]
fn dockerfile_single_stage_copies_manifest_inputs_before_install() {
    let mut config = ScriptpackConfig::default();
    config.image.stage_layout = StageLayout::SingleStage;
    config.entrypoint.manifest_inputs = vec!["constraints.txt".to_owned()];
    let dockerfile = render(&ProvisionPlan::from_config(&config));

    let copy_at = dockerfile.find("COPY constraints.txt ./constraints.txt").unwrap();
    let install_at = dockerfile.find("pip install --no-cache-dir -r").unwrap();
    assert!(copy_at < install_at);
}

#[test]
fn dockerfile_without_manifest_inputs_copies_only_manifest() {
    let dockerfile = render(&default_plan());
    let builder: Vec<&str> = dockerfile
        .lines()
        .take_while(|l| !l.starts_with("# === Stage 2"))
        .filter(|l| l.starts_with("COPY "))
        .collect();
    assert_eq!(builder, vec!["COPY requirements.txt ./requirements.txt"]);
}

// ── Dockerfile: include / env Tests ──

#[test]
fn dockerfile_include_copies_next_to_script() {
    let mut config = ScriptpackConfig::default();
    config.entrypoint.include = vec!["CODEPROS".to_owned(), "templates/".to_owned()];
    let output = render(&ProvisionPlan::from_config(&config));

    assert!(output.contains("COPY CODEPROS /app/CODEPROS"));
    assert!(output.contains("COPY templates/ /app/templates/"));
}

#[test]
fn dockerfile_env_generates_env_directives_in_order() {
    let mut config = ScriptpackConfig::default();
    config
        .image
        .env
        .insert("PYTHONUNBUFFERED".to_owned(), "1".to_owned());
    config
        .image
        .env
        .insert("GREETING".to_owned(), "hello world".to_owned());
    let output = render(&ProvisionPlan::from_config(&config));

    let greeting = output.find("ENV GREETING=\"hello world\"").unwrap();
    let unbuffered = output.find("ENV PYTHONUNBUFFERED=\"1\"").unwrap();
    assert!(greeting < unbuffered);
}

#[test]
fn dockerfile_no_user_env_when_empty() {
    let output = render(&default_plan());
    let env_lines: Vec<&str> = output.lines().filter(|l| l.starts_with("ENV ")).collect();

    assert!(env_lines.iter().all(|l| l.starts_with("ENV PATH=")));
}

#[test]
fn dockerfile_render_is_deterministic() {
    let mut config = ScriptpackConfig::default();
    config.image.install_vcs_client = true;
    for (k, v) in [("B", "2"), ("A", "1"), ("C", "3")] {
        config.image.env.insert(k.to_owned(), v.to_owned());
    }

    let first = render(&ProvisionPlan::from_config(&config));
    let second = render(&ProvisionPlan::from_config(&config.clone()));
    assert_eq!(first, second);
}

// ── Build Context Tests ──

#[test]
fn context_creates_expected_structure() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    init_script_project(project);

    let context = create_context(project, &default_plan(), "FROM python\n").unwrap();

    assert_eq!(context, project.join(CONTEXT_DIR));
    assert!(context.join("main.py").exists());
    assert!(context.join("requirements.txt").exists());
    assert!(context.join(".dockerignore").exists());
    assert_eq!(
        std::fs::read_to_string(context.join("Dockerfile")).unwrap(),
        "FROM python\n"
    );
}

#[test]
fn context_copies_manifest_verbatim() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    init_script_project(project);
    let manifest = "# pinned\n--index-url https://pypi.example/simple\nrequests==2.31.0\n";
    std::fs::write(project.join("requirements.txt"), manifest).unwrap();

    let context = create_context(project, &default_plan(), "FROM python\n").unwrap();

    assert_eq!(
        std::fs::read_to_string(context.join("requirements.txt")).unwrap(),
        manifest
    );
}

#[test]
fn context_contains_only_declared_inputs() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    init_script_project(project);
    std::fs::write(project.join("notes.md"), "not packaged").unwrap();
    std::fs::write(project.join(".env"), "SECRET=1").unwrap();

    let context = create_context(project, &default_plan(), "FROM python\n").unwrap();

    assert!(!context.join("notes.md").exists());
    assert!(!context.join(".env").exists());
}

#[test]
fn context_includes_nested_files_and_dirs() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    init_script_project(project);
    std::fs::create_dir_all(project.join("templates/mail")).unwrap();
    std::fs::write(project.join("templates/mail/body.txt"), "hi").unwrap();
    std::fs::write(project.join("CODEPROS"), "/src @alice\n").unwrap();

    let mut config = ScriptpackConfig::default();
    config.entrypoint.include = vec!["CODEPROS".to_owned(), "templates".to_owned()];
    let plan = ProvisionPlan::from_config(&config);

    let context = create_context(project, &plan, "FROM python\n").unwrap();

    assert!(context.join("CODEPROS").exists());
    assert!(context.join("templates/mail/body.txt").exists());
}

#[test]
fn context_include_of_project_root_skips_own_output() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    init_script_project(project);
    std::fs::create_dir_all(project.join(CONTEXT_DIR).join("old")).unwrap();
    std::fs::create_dir_all(project.join(EJECT_DIR)).unwrap();
    std::fs::write(project.join(".scriptpack/Dockerfile"), "FROM python\n").unwrap();

    let mut config = ScriptpackConfig::default();
    config.entrypoint.include = vec![".".to_owned()];
    let plan = ProvisionPlan::from_config(&config);

    let context = create_context(project, &plan, "FROM python\n").unwrap();

    assert!(context.join("main.py").exists());
    assert!(!context.join(CONTEXT_DIR).exists());
    assert!(!context.join(EJECT_DIR).exists());
}

#[test]
fn context_include_dir_skips_nested_context_dir() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    init_script_project(project);
    std::fs::create_dir_all(project.join("data").join(CONTEXT_DIR)).unwrap();
    std::fs::write(project.join("data").join(CONTEXT_DIR).join("x"), "x").unwrap();
    std::fs::write(project.join("data/input.csv"), "a,b\n").unwrap();

    let mut config = ScriptpackConfig::default();
    config.entrypoint.include = vec!["data".to_owned()];
    let plan = ProvisionPlan::from_config(&config);

    let context = create_context(project, &plan, "FROM python\n").unwrap();

    assert!(context.join("data/input.csv").exists());
    assert!(!context.join("data").join(CONTEXT_DIR).exists());
}

#[test]
fn context_copies_manifest_inputs() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    init_script_project(project);
    std::fs::write(project.join("requirements.txt"), "-r base.txt\n").unwrap();
    std::fs::write(project.join("base.txt"), "requests==2.31.0\n").unwrap();

    let mut config = ScriptpackConfig::default();
    config.entrypoint.manifest_inputs = vec!["base.txt".to_owned()];
    let plan = ProvisionPlan::from_config(&config);

    let context = create_context(project, &plan, "FROM python\n").unwrap();
    assert!(context.join("base.txt").exists());
}

#[test]
fn context_keeps_nested_script_path() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    init_script_project(project);
    std::fs::create_dir_all(project.join("src")).unwrap();
    std::fs::write(project.join("src/app.py"), "print('hi')").unwrap();

    let mut config = ScriptpackConfig::default();
    config.entrypoint.script = "src/app.py".to_owned();
    let plan = ProvisionPlan::from_config(&config);

    let context = create_context(project, &plan, "FROM python\n").unwrap();
    assert!(context.join("src/app.py").exists());
}

#[test]
fn context_fails_on_missing_manifest() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    std::fs::write(project.join("main.py"), "print('hi')").unwrap();

    let result = create_context(project, &default_plan(), "FROM python\n");

    match result {
        Err(BundleError::MissingInput(path)) => {
            assert!(path.ends_with("requirements.txt"));
        }
        other => panic!("expected MissingInput, got {other:?}"),
    }
}

#[test]
fn context_fails_on_missing_script() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    std::fs::write(project.join("requirements.txt"), "requests\n").unwrap();

    let result = create_context(project, &default_plan(), "FROM python\n");
    assert!(matches!(result, Err(BundleError::MissingInput(_))));
}

#[test]
fn context_cleans_previous_context() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path();
    init_script_project(project);

    std::fs::create_dir_all(project.join(CONTEXT_DIR)).unwrap();
    std::fs::write(project.join(CONTEXT_DIR).join("stale.txt"), "old").unwrap();

    let context = create_context(project, &default_plan(), "FROM python\n").unwrap();
    assert!(!context.join("stale.txt").exists());
}

// ── Eject Tests ──

#[test]
fn eject_creates_dir_with_dockerfile() {
    let tmp = TempDir::new().unwrap();

    let path = eject(tmp.path(), &default_plan()).unwrap();

    assert_eq!(path, tmp.path().join(".scriptpack/Dockerfile"));
    assert!(path.exists());
    assert!(is_ejected(tmp.path()));
}

#[test]
fn eject_writes_rendered_dockerfile_after_stamp() {
    let tmp = TempDir::new().unwrap();
    let plan = default_plan();

    eject(tmp.path(), &plan).unwrap();

    let ejected = load_ejected(tmp.path()).unwrap();
    let (stamp, body) = ejected.dockerfile.split_once('\n').unwrap();
    assert_eq!(stamp, "# scriptpack: ejected with install_vcs_client=false");
    assert_eq!(body, render(&plan));
    assert_eq!(ejected.vcs_client, Some(false));
}

#[test]
fn ejected_toggle_is_compared_with_plan() {
    let tmp = TempDir::new().unwrap();
    eject(tmp.path(), &default_plan().with_vcs_client(true)).unwrap();

    let ejected = load_ejected(tmp.path()).unwrap();
    assert_eq!(ejected.vcs_client, Some(true));
    assert!(!ejected.vcs_client_differs(&default_plan().with_vcs_client(true)));
    assert!(ejected.vcs_client_differs(&default_plan()));
}

#[test]
fn ejected_without_stamp_has_unknown_toggle() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join(EJECT_DIR)).unwrap();
    std::fs::write(tmp.path().join(".scriptpack/Dockerfile"), "FROM python\n").unwrap();

    let ejected = load_ejected(tmp.path()).unwrap();
    assert_eq!(ejected.dockerfile, "FROM python\n");
    assert_eq!(ejected.vcs_client, None);
    assert!(!ejected.vcs_client_differs(&default_plan().with_vcs_client(true)));
}

#[test]
fn eject_fails_if_already_ejected() {
    let tmp = TempDir::new().unwrap();
    eject(tmp.path(), &default_plan()).unwrap();

    let result = eject(tmp.path(), &default_plan().with_vcs_client(true));
    assert!(matches!(result, Err(EjectError::AlreadyEjected(_))));
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("already ejected")
    );
    assert_eq!(load_ejected(tmp.path()).unwrap().vcs_client, Some(false));
}

#[test]
fn is_ejected_false_without_dir() {
    let tmp = TempDir::new().unwrap();
    assert!(!is_ejected(tmp.path()));
}

#[test]
fn load_ejected_fails_when_missing() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(
        load_ejected(tmp.path()),
        Err(EjectError::Read { .. })
    ));
}
