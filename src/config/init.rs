// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates railyard.yml template files.

use std::path::Path;

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

pub fn init_config(dir: &Path, project: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(project.unwrap_or("my-project"));
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(project: &str) -> String {
    format!(
        r#"project: {project}
workspace: my-workspace
environment: production

# Path to the Railway CLI binary (must be on the sandbox PATH or absolute)
# cli_binary: railway

# Services deploy in ascending deploy_order; equal orders deploy concurrently.
# A failure at or below critical_order_max halts the rest of the rollout.
# critical_order_max: 1
services:
  - name: db
    kind: database
    deploy_order: 0
  - name: api
    kind: api
    deploy_order: 1
  - name: web
    kind: web
    deploy_order: 2
"#
    )
}
