//! `hashbridge graph`: print binding entries and exclusions.

use std::path::PathBuf;

use anyhow::Context;
use hashbridge_bindgen::{EntryKind, ProjectConfig};

pub fn execute(config_path: PathBuf, json: bool) -> anyhow::Result<()> {
    let config = ProjectConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let graph = hashbridge_bindgen::build_graph(&config.bindgen, &super::project_dir(&config_path))?;

    if json {
        println!("{}", graph.manifest().to_json()?);
        return Ok(());
    }

    for entry in graph.entries() {
        let kind = match entry.kind {
            EntryKind::Interface if entry.service => "service",
            EntryKind::Interface => "interface",
            EntryKind::Opaque => "opaque",
        };
        println!("{} {} {} ({})", entry.type_id, kind, entry.reflected_name, entry.path);
        for method in &entry.methods {
            println!(
                "    {} {} -> {}",
                method.method_id,
                method.signature(),
                method.returns.reflected_name
            );
        }
    }

    if !graph.exclusions().is_empty() {
        println!();
        println!("Excluded:");
        for exclusion in graph.exclusions() {
            println!("    {}", exclusion);
        }
    }
    Ok(())
}
