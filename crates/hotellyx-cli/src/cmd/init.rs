use std::io::Write;
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::Args;
use hotellyx_core::config::PROJECT_DIR;
use serde::Serialize;

use crate::cmd::Session;
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing `.hotellyx/config.toml`.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[sla]\n\
    threshold_minutes = 25\n\
    \n\
    [dashboard]\n\
    response_window_hours = 24\n\
    rate_window_minutes = 60\n\
    comparison_offset_minutes = 60\n\
    \n\
    [rooms]\n\
    token_length = 14\n\
    \n\
    [catalog]\n\
    unused_view_threshold = 5\n";

const GITIGNORE: &str = "*.db\n*.db-wal\n*.db-shm\n";

#[derive(Debug, Serialize)]
struct InitReport {
    config: String,
    store: String,
    services_seeded: usize,
}

/// Execute `hx init`. Creates the property skeleton:
///
/// ```text
/// .hotellyx/
///   config.toml    (default settings)
///   hotellyx.db    (record store, default services seeded)
///   .gitignore
/// ```
///
/// # Errors
///
/// Returns an error if the config already exists and `--force` is not set,
/// or if any filesystem or store operation fails.
pub fn run_init(
    args: &InitArgs,
    store_flag: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let project_dir = project_root.join(PROJECT_DIR);
    let config_path = project_dir.join("config.toml");

    if config_path.exists() && !args.force {
        anyhow::bail!("{PROJECT_DIR}/config.toml already exists. Use `hx init --force` to overwrite it.");
    }

    std::fs::create_dir_all(&project_dir)
        .with_context(|| format!("Failed to create {}", project_dir.display()))?;
    std::fs::write(&config_path, CONFIG_TOML)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let gitignore_path = project_dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore_path.display()))?;

    let session = Session::open(project_root, store_flag, output)?;
    let services = session.catalog().list();

    let report = InitReport {
        config: config_path.display().to_string(),
        store: session.config.store_path(project_root).display().to_string(),
        services_seeded: services.len(),
    };

    render(output, &report, |report, w| {
        writeln!(w, "✓ Initialized {PROJECT_DIR}/")?;
        writeln!(w)?;
        writeln!(w, "  Config:   {}", report.config)?;
        writeln!(w, "  Store:    {}", report.store)?;
        writeln!(w, "  Services: {}", report.services_seeded)?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  Register a room and print its guest link token:")?;
        writeln!(w, "    hx room add 305")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_init_writes_config_and_store() {
        let dir = tempfile::tempdir().unwrap();
        run_init(&InitArgs { force: false }, None, OutputMode::Json, dir.path()).unwrap();

        let project = dir.path().join(PROJECT_DIR);
        assert!(project.join("config.toml").exists());
        assert!(project.join(".gitignore").exists());
        assert!(project.join("hotellyx.db").exists());

        let config = hotellyx_core::config::load_config(dir.path()).unwrap();
        assert_eq!(config.sla.threshold_minutes, 25);
    }

    #[test]
    fn second_init_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        run_init(&InitArgs { force: false }, None, OutputMode::Json, dir.path()).unwrap();
        assert!(run_init(&InitArgs { force: false }, None, OutputMode::Json, dir.path()).is_err());
        assert!(run_init(&InitArgs { force: true }, None, OutputMode::Json, dir.path()).is_ok());
    }
}
