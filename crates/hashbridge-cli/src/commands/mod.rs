pub mod cache;
pub mod generate;
pub mod graph;
pub mod hash;

use std::path::{Path, PathBuf};

/// Directory the config's relative paths are resolved against.
fn project_dir(config: &Path) -> PathBuf {
    config
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
