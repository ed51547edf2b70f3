//! `hashbridge generate`: emit bindings and the descriptor manifest.

use std::path::PathBuf;

use anyhow::Context;
use hashbridge_bindgen::ProjectConfig;

pub fn execute(config_path: PathBuf) -> anyhow::Result<()> {
    let config = ProjectConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let report = hashbridge_bindgen::generate(&config, &super::project_dir(&config_path))?;

    println!(
        "Generated {} types, {} methods -> {}",
        report.types,
        report.methods,
        report.output.display()
    );
    if let Some(manifest) = &report.manifest {
        println!("Manifest: {}", manifest.display());
    }
    if report.exclusions > 0 {
        println!(
            "{} members excluded (see `hashbridge graph`)",
            report.exclusions
        );
    }
    Ok(())
}
