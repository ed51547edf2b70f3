//! `hashbridge cache`: inspect and validate signature caches.

use std::path::PathBuf;

use anyhow::{bail, Context};
use hashbridge_runtime::sigcache::{executable_hash, try_check, ActiveSet, CacheStatus, SignatureCache};

pub fn inspect(file: PathBuf) -> anyhow::Result<()> {
    let cache = SignatureCache::read(&file).with_context(|| format!("reading {}", file.display()))?;

    println!("Executable: {:#018x}", cache.executable_hash);
    println!("Format:     {}", cache.format_version);
    println!("Mods:       {}", cache.mods.len());
    for entry in &cache.mods {
        println!("    {:#018x} {:#018x}", entry.id_hash, entry.version_hash);
    }
    println!("Entries:    {}", cache.entries.len());
    for entry in &cache.entries {
        println!("    {:#018x} @ {:#x}", entry.pattern_hash, entry.offset);
    }
    Ok(())
}

pub fn check(file: PathBuf, exe: PathBuf, mods: Vec<String>) -> anyhow::Result<()> {
    let hash = executable_hash(&exe).with_context(|| format!("hashing {}", exe.display()))?;
    let mut active = ActiveSet::new(hash);
    for spec in &mods {
        let Some((id, version)) = spec.rsplit_once('@') else {
            bail!("invalid mod '{}': expected id@version", spec);
        };
        active = active.with_mod(id, version);
    }

    match try_check(&file, &active) {
        CacheStatus::Valid(cache) => {
            println!("valid ({} entries)", cache.entries.len());
            Ok(())
        }
        CacheStatus::Regenerate(reason) => bail!("cache must be regenerated: {}", reason),
    }
}
