//! Hashbridge binding generator
//!
//! Turns reflected metadata of a managed host into Rust bindings:
//!
//! 1. [`metadata`] loads the reflected assemblies
//! 2. [`graph`] selects candidate interfaces and builds the merged
//!    [`TypeGraph`](graph::TypeGraph), recording every excluded member
//! 3. [`emit`] renders the graph as Rust source against `hashbridge_abi`
//! 4. the graph's descriptor manifest is written for the managed registry to
//!    verify against
//!
//! ```ignore
//! let config = ProjectConfig::from_file(Path::new("hashbridge.toml"))?;
//! let report = hashbridge_bindgen::generate(&config, Path::new("."))?;
//! println!("{} types bound", report.types);
//! ```

pub mod config;
pub mod emit;
pub mod error;
pub mod graph;
pub mod metadata;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

pub use config::{BindgenConfig, ConfigError, ProjectConfig};
pub use error::{BindgenError, GraphError, MetadataError};
pub use graph::{
    BindingEntry, EntryKind, Exclusion, ExclusionReason, GraphBuilder, GraphOptions,
    MethodBinding, TypeGraph,
};
pub use metadata::Metadata;

/// Summary of a [`generate`] run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub types: usize,
    pub methods: usize,
    pub exclusions: usize,
    pub output: PathBuf,
    pub manifest: Option<PathBuf>,
}

/// Load every metadata document of `config`, resolved against `base`.
pub fn load_metadata(config: &BindgenConfig, base: &Path) -> Result<Metadata, MetadataError> {
    let mut metadata = Metadata::default();
    for path in config.metadata_paths(base) {
        metadata.merge(Metadata::from_file(&path)?);
    }
    Ok(metadata)
}

/// Build the type graph described by `config`.
pub fn build_graph(config: &BindgenConfig, base: &Path) -> Result<TypeGraph, BindgenError> {
    let metadata = load_metadata(config, base)?;
    Ok(GraphBuilder::new(&metadata, GraphOptions::from(config)).build()?)
}

/// Generate bindings, and the manifest when configured.
pub fn generate(config: &ProjectConfig, base: &Path) -> Result<GenerateReport, BindgenError> {
    let bindgen = &config.bindgen;
    let graph = build_graph(bindgen, base)?;

    let output = bindgen.output_path(base);
    write_file(&output, &emit::emit(&graph, &bindgen.crate_root))?;

    let manifest = bindgen.manifest_path(base);
    if let Some(path) = &manifest {
        write_file(path, &graph.manifest().to_json()?)?;
    }

    let report = GenerateReport {
        types: graph.len(),
        methods: graph.entries().iter().map(|entry| entry.methods.len()).sum(),
        exclusions: graph.exclusions().len(),
        output,
        manifest,
    };
    info!(
        types = report.types,
        methods = report.methods,
        exclusions = report.exclusions,
        output = %report.output.display(),
        "bindings generated"
    );
    Ok(report)
}

fn write_file(path: &Path, content: &str) -> Result<(), BindgenError> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
    };
    write().map_err(|source| BindgenError::Write {
        path: path.to_path_buf(),
        source,
    })
}
