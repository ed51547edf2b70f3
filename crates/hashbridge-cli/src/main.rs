//! hashbridge command-line tool
//!
//! Generates bindings from reflected metadata, prints graph diagnostics,
//! computes identities by hand and inspects signature caches.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hashbridge")]
#[command(about = "Hashed-ABI bindings between a managed host and native code", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level (overrides HASHBRIDGE_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate bindings from hashbridge.toml
    Generate {
        /// Project configuration
        #[arg(short, long, default_value = "hashbridge.toml")]
        config: PathBuf,
    },

    /// Print the type graph and excluded members
    Graph {
        /// Project configuration
        #[arg(short, long, default_value = "hashbridge.toml")]
        config: PathBuf,
        /// Print the descriptor manifest as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute identities
    Hash {
        #[command(subcommand)]
        command: HashCommands,
    },

    /// Signature cache tools
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum HashCommands {
    /// TypeId of a native path or a reflected dotted name
    Type {
        /// `crate::host::IConfig`, `Host.IConfig` or `System.Int32`
        name: String,
        /// Root for dotted names
        #[arg(long, default_value = "crate")]
        root: String,
    },

    /// MethodId of a method signature
    Method {
        /// Method name (`get_ModId`)
        name: String,
        /// Reflected parameter type names, in order
        params: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Print a cache file's header and entries
    Inspect {
        /// Cache file
        file: PathBuf,
    },

    /// Check a cache file against the active executable and mods
    Check {
        /// Cache file
        file: PathBuf,
        /// Game executable
        #[arg(long)]
        exe: PathBuf,
        /// Active mod as id@version, in load order
        #[arg(long = "mod", value_name = "ID@VERSION")]
        mods: Vec<String>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("HASHBRIDGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate { config } => commands::generate::execute(config),
        Commands::Graph { config, json } => commands::graph::execute(config, json),
        Commands::Hash { command } => match command {
            HashCommands::Type { name, root } => commands::hash::type_id(name, root),
            HashCommands::Method { name, params } => commands::hash::method_id(name, params),
        },
        Commands::Cache { command } => match command {
            CacheCommands::Inspect { file } => commands::cache::inspect(file),
            CacheCommands::Check { file, exe, mods } => commands::cache::check(file, exe, mods),
        },
    }
}
