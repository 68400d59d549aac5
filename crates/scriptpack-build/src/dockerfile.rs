use scriptpack_core::{ProvisionPlan, StageLayout, VENV_DIR};

/// Renders the single parameterised build definition for a [`ProvisionPlan`].
///
/// Every `RUN` step is an `&&` chain, so a failing install aborts the
/// engine build and no image gets tagged.
pub struct DockerfileGenerator<'a> {
    plan: &'a ProvisionPlan,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(plan: &'a ProvisionPlan) -> Self {
        Self { plan }
    }

    pub fn render(&self) -> String {
        match self.plan.stage_layout {
            StageLayout::MultiStage => self.render_multi_stage(),
            StageLayout::SingleStage => self.render_single_stage(),
        }
    }

    fn render_multi_stage(&self) -> String {
        format!(
            r#"# === Stage 1: Builder (dependency provisioning) ===
FROM {base} AS builder
{provision}
# === Stage 2: Runtime ===
FROM {runtime}
{system_packages}COPY --from=builder {venv} {venv}
{runtime_tail}"#,
            base = self.plan.base_image,
            runtime = self.plan.runtime_image,
            provision = self.provision_steps(),
            system_packages = self.system_packages(),
            venv = VENV_DIR,
            runtime_tail = self.runtime_tail(),
        )
    }

    fn render_single_stage(&self) -> String {
        format!(
            r#"# === Single stage: provisioning and runtime ===
FROM {base}
{system_packages}{provision}
{runtime_tail}"#,
            base = self.plan.base_image,
            system_packages = self.system_packages(),
            provision = self.provision_steps(),
            runtime_tail = self.runtime_tail(),
        )
    }

    /// Isolated environment plus the declared dependency set.
    ///
    /// Files the manifest refers to are copied next to it under `/build`
    /// before the install step, at the same project-relative paths.
    fn provision_steps(&self) -> String {
        let mut inputs = String::new();
        for path in &self.plan.manifest_inputs {
            inputs.push_str(&format!("COPY {path} ./{path}\n"));
        }

        format!(
            r#"RUN python -m venv {venv}
ENV PATH="{venv}/bin:$PATH"
WORKDIR /build
COPY {manifest} ./{manifest}
{inputs}RUN pip install --no-cache-dir --upgrade pip && pip install --no-cache-dir -r {manifest}
"#,
            venv = VENV_DIR,
            manifest = self.plan.manifest_file,
        )
    }

    fn system_packages(&self) -> String {
        let packages = self.plan.system_packages();
        if packages.is_empty() {
            String::new()
        } else {
            format!(
                "RUN apt-get update && apt-get install -y --no-install-recommends {} && rm -rf /var/lib/apt/lists/*\n",
                packages.join(" ")
            )
        }
    }

    /// Environment, script, and entrypoint of the final image.
    fn runtime_tail(&self) -> String {
        let mut out = format!("ENV PATH=\"{VENV_DIR}/bin:$PATH\"\n");
        for (key, value) in &self.plan.env {
            out.push_str(&format!("ENV {key}={}\n", quote_env_value(value)));
        }

        out.push_str(&format!("WORKDIR {}\n", self.plan.workdir));
        out.push_str(&format!(
            "COPY {script} {workdir}/{script}\n",
            script = self.plan.script_file,
            workdir = self.plan.workdir.trim_end_matches('/'),
        ));
        for path in &self.plan.include {
            out.push_str(&format!(
                "COPY {path} {workdir}/{path}\n",
                path = path,
                workdir = self.plan.workdir.trim_end_matches('/'),
            ));
        }

        out.push_str(&format!("ENTRYPOINT {}\n", self.plan.entrypoint.exec_form()));
        out
    }
}

/// Double-quote an ENV value, escaping what the Dockerfile parser treats specially.
fn quote_env_value(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$");
    format!("\"{escaped}\"")
}
