//! Integration tests for signature cache validation

use std::fs;

use hashbridge_runtime::sigcache::{
    executable_hash, try_check, ActiveSet, CacheStatus, ModEntry, RegenerateReason, SignatureCache,
    CACHE_FILE_NAME,
};
use tempfile::TempDir;

fn active() -> ActiveSet {
    ActiveSet::new(0x51ab_77c0_ffee_0001)
        .with_mod("p3rpc.framework", "1.4.0")
        .with_mod("sample.mod", "0.2.0")
}

fn write_cache(dir: &TempDir, active: &ActiveSet) -> std::path::PathBuf {
    let mut cache = SignatureCache::new(active);
    cache.push("48 8B C4 48 89 58 08", 0x1a2b30);
    cache.push("E8 ?? ?? ?? ?? 84 C0", 0x44f010);
    let path = dir.path().join(CACHE_FILE_NAME);
    cache.write(&path).unwrap();
    path
}

#[test]
fn test_matching_cache_is_accepted() {
    let dir = TempDir::new().unwrap();
    let path = write_cache(&dir, &active());

    match try_check(&path, &active()) {
        CacheStatus::Valid(cache) => {
            assert_eq!(cache.entries.len(), 2);
            assert_eq!(cache.offset_of("E8 ?? ?? ?? ?? 84 C0"), Some(0x44f010));
        }
        other => panic!("expected a valid cache, got {:?}", other),
    }
}

#[test]
fn test_changed_mod_version_triggers_regeneration() {
    let dir = TempDir::new().unwrap();
    let path = write_cache(&dir, &active());

    let mut updated = active();
    updated.mods[1] = ModEntry::new("sample.mod", "0.2.1");
    assert_eq!(
        try_check(&path, &updated),
        CacheStatus::Regenerate(RegenerateReason::ModsChanged)
    );
}

#[test]
fn test_added_mod_triggers_regeneration() {
    let dir = TempDir::new().unwrap();
    let path = write_cache(&dir, &active());
    let more = active().with_mod("another.mod", "1.0.0");
    assert_eq!(
        try_check(&path, &more),
        CacheStatus::Regenerate(RegenerateReason::ModsChanged)
    );
}

#[test]
fn test_changed_executable_triggers_regeneration() {
    let dir = TempDir::new().unwrap();
    let path = write_cache(&dir, &active());
    let mut patched = active();
    patched.executable_hash ^= 1;
    assert_eq!(
        try_check(&path, &patched),
        CacheStatus::Regenerate(RegenerateReason::ExecutableChanged)
    );
}

#[test]
fn test_missing_cache_triggers_regeneration() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CACHE_FILE_NAME);
    assert_eq!(
        try_check(&path, &active()),
        CacheStatus::Regenerate(RegenerateReason::Missing)
    );
}

#[test]
fn test_corrupt_cache_triggers_regeneration() {
    let dir = TempDir::new().unwrap();
    let path = write_cache(&dir, &active());
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

    assert!(matches!(
        try_check(&path, &active()),
        CacheStatus::Regenerate(RegenerateReason::Corrupt(_))
    ));
}

#[test]
fn test_executable_hash_tracks_contents() {
    let dir = TempDir::new().unwrap();
    let exe = dir.path().join("game.exe");
    fs::write(&exe, b"MZ\x90\x00original").unwrap();
    let before = executable_hash(&exe).unwrap();
    assert_eq!(before, executable_hash(&exe).unwrap());

    fs::write(&exe, b"MZ\x90\x00patched!").unwrap();
    assert_ne!(before, executable_hash(&exe).unwrap());
}
