//! Signature cache
//!
//! A small binary file remembering where byte patterns were found in the
//! host executable. It is only trusted when the executable and the ordered
//! list of active mods are exactly those it was written for; any difference
//! means the whole cache is regenerated.
//!
//! Layout, little-endian:
//!
//! ```text
//! u64 ExecutableHash
//! u32 FormatVersion
//! u32 ModCount
//! ModCount × { u64 ModIdHash, u64 ModVersionHash }
//! u64 EntryCount
//! EntryCount × { u64 PatternHash, u64 Offset }
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use hashbridge_abi::{hash_bytes, hash_str};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Format version written by this crate.
pub const FORMAT_VERSION: u32 = 0;

/// File name of the cache inside a mod directory.
pub const CACHE_FILE_NAME: &str = "signature_cache";

const MOD_RECORD: usize = 16;
const ENTRY_RECORD: usize = 16;

/// Errors reading or writing a cache file
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File ends before the record it announced
    #[error("Unexpected end of signature cache at offset {0}")]
    UnexpectedEnd(usize),

    /// Data left over after the last entry
    #[error("{0} trailing bytes after the last entry")]
    TrailingBytes(usize),
}

/// One active mod, as recorded in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModEntry {
    pub id_hash: u64,
    pub version_hash: u64,
}

impl ModEntry {
    /// Hash a mod id and version string.
    pub fn new(id: &str, version: &str) -> Self {
        Self {
            id_hash: hash_str(id),
            version_hash: hash_str(version),
        }
    }
}

/// The executable and mods currently loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSet {
    pub executable_hash: u64,
    /// Active mods in load order
    pub mods: Vec<ModEntry>,
}

impl ActiveSet {
    pub fn new(executable_hash: u64) -> Self {
        Self {
            executable_hash,
            mods: Vec::new(),
        }
    }

    /// Append a mod in load order.
    pub fn with_mod(mut self, id: &str, version: &str) -> Self {
        self.mods.push(ModEntry::new(id, version));
        self
    }
}

/// One cached pattern location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub pattern_hash: u64,
    pub offset: u64,
}

/// Decoded cache file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCache {
    pub executable_hash: u64,
    pub format_version: u32,
    pub mods: Vec<ModEntry>,
    pub entries: Vec<CacheEntry>,
}

/// Why a cache cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenerateReason {
    /// No cache file yet
    Missing,
    /// The file could not be read or decoded
    Corrupt(String),
    /// Written for a different executable
    ExecutableChanged,
    /// Written by a different format version
    FormatChanged(u32),
    /// Mod list, order or versions differ
    ModsChanged,
}

impl fmt::Display for RegenerateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegenerateReason::Missing => write!(f, "cache does not exist yet"),
            RegenerateReason::Corrupt(message) => write!(f, "cache is unreadable: {}", message),
            RegenerateReason::ExecutableChanged => write!(f, "executable changed"),
            RegenerateReason::FormatChanged(version) => {
                write!(f, "format version {} is not {}", version, FORMAT_VERSION)
            }
            RegenerateReason::ModsChanged => write!(f, "active mods changed"),
        }
    }
}

/// Outcome of [`try_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// The cache matches the active set and can be used as is
    Valid(SignatureCache),
    /// The cache must be rebuilt from scratch
    Regenerate(RegenerateReason),
}

impl CacheStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, CacheStatus::Valid(_))
    }
}

impl SignatureCache {
    /// Empty cache for the active set.
    pub fn new(active: &ActiveSet) -> Self {
        Self {
            executable_hash: active.executable_hash,
            format_version: FORMAT_VERSION,
            mods: active.mods.clone(),
            entries: Vec::new(),
        }
    }

    /// Record where `pattern` was found.
    pub fn push(&mut self, pattern: &str, offset: u64) {
        self.entries.push(CacheEntry {
            pattern_hash: hash_str(pattern),
            offset,
        });
    }

    /// Cached location of `pattern`.
    pub fn offset_of(&self, pattern: &str) -> Option<u64> {
        let pattern_hash = hash_str(pattern);
        self.entries
            .iter()
            .find(|entry| entry.pattern_hash == pattern_hash)
            .map(|entry| entry.offset)
    }

    /// Whether this cache was written for exactly `active`.
    pub fn matches(&self, active: &ActiveSet) -> Result<(), RegenerateReason> {
        if self.executable_hash != active.executable_hash {
            return Err(RegenerateReason::ExecutableChanged);
        }
        if self.format_version != FORMAT_VERSION {
            return Err(RegenerateReason::FormatChanged(self.format_version));
        }
        if self.mods != active.mods {
            return Err(RegenerateReason::ModsChanged);
        }
        Ok(())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut writer = CacheWriter::with_capacity(
            24 + self.mods.len() * MOD_RECORD + self.entries.len() * ENTRY_RECORD,
        );
        writer.emit_u64(self.executable_hash);
        writer.emit_u32(self.format_version);
        writer.emit_u32(self.mods.len() as u32);
        for entry in &self.mods {
            writer.emit_u64(entry.id_hash);
            writer.emit_u64(entry.version_hash);
        }
        writer.emit_u64(self.entries.len() as u64);
        for entry in &self.entries {
            writer.emit_u64(entry.pattern_hash);
            writer.emit_u64(entry.offset);
        }
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CacheError> {
        let mut reader = CacheReader::new(bytes);
        let executable_hash = reader.read_u64()?;
        let format_version = reader.read_u32()?;

        let mod_count = reader.read_u32()? as usize;
        reader.ensure(mod_count, MOD_RECORD)?;
        let mut mods = Vec::with_capacity(mod_count);
        for _ in 0..mod_count {
            mods.push(ModEntry {
                id_hash: reader.read_u64()?,
                version_hash: reader.read_u64()?,
            });
        }

        let entry_count = usize::try_from(reader.read_u64()?)
            .map_err(|_| CacheError::UnexpectedEnd(reader.position()))?;
        reader.ensure(entry_count, ENTRY_RECORD)?;
        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            entries.push(CacheEntry {
                pattern_hash: reader.read_u64()?,
                offset: reader.read_u64()?,
            });
        }

        if reader.remaining() > 0 {
            return Err(CacheError::TrailingBytes(reader.remaining()));
        }
        Ok(Self {
            executable_hash,
            format_version,
            mods,
            entries,
        })
    }

    pub fn read(path: &Path) -> Result<Self, CacheError> {
        let bytes = fs::read(path)?;
        Self::decode(&bytes)
    }

    pub fn write(&self, path: &Path) -> Result<(), CacheError> {
        fs::write(path, self.encode())?;
        debug!(path = %path.display(), entries = self.entries.len(), "signature cache written");
        Ok(())
    }
}

/// Read the cache at `path` and decide whether it can be used for `active`.
///
/// Never fails: unreadable or mismatched caches downgrade to
/// [`CacheStatus::Regenerate`].
pub fn try_check(path: &Path, active: &ActiveSet) -> CacheStatus {
    let cache = match SignatureCache::read(path) {
        Ok(cache) => cache,
        Err(CacheError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "signature cache does not exist yet, generating");
            return CacheStatus::Regenerate(RegenerateReason::Missing);
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "signature cache unreadable, regenerating");
            return CacheStatus::Regenerate(RegenerateReason::Corrupt(err.to_string()));
        }
    };
    match cache.matches(active) {
        Ok(()) => CacheStatus::Valid(cache),
        Err(reason) => {
            warn!(path = %path.display(), %reason, "signature cache stale, regenerating");
            CacheStatus::Regenerate(reason)
        }
    }
}

/// Hash of an executable's contents.
pub fn executable_hash(path: &Path) -> io::Result<u64> {
    Ok(hash_bytes(&fs::read(path)?))
}

// ============================================================================
// Encoding
// ============================================================================

struct CacheWriter {
    buffer: Vec<u8>,
}

impl CacheWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    fn emit_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    fn emit_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

struct CacheReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> CacheReader<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Fail early when `count` records cannot fit in what is left.
    fn ensure(&self, count: usize, record: usize) -> Result<(), CacheError> {
        match count.checked_mul(record) {
            Some(size) if size <= self.remaining() => Ok(()),
            _ => Err(CacheError::UnexpectedEnd(self.position)),
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CacheError> {
        let bytes = self
            .buffer
            .get(self.position..self.position + N)
            .ok_or(CacheError::UnexpectedEnd(self.position))?;
        self.position += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_u32(&mut self) -> Result<u32, CacheError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn read_u64(&mut self) -> Result<u64, CacheError> {
        Ok(u64::from_le_bytes(self.take()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> ActiveSet {
        ActiveSet::new(0xfeed).with_mod("p3rpc.framework", "1.0.2")
    }

    #[test]
    fn test_layout() {
        let mut cache = SignatureCache::new(&active());
        cache.push("48 89 5C 24 ??", 0x1234);
        let bytes = cache.encode();

        assert_eq!(bytes.len(), 8 + 4 + 4 + 16 + 8 + 16);
        assert_eq!(&bytes[..8], &0xfeedu64.to_le_bytes());
        assert_eq!(&bytes[8..12], &FORMAT_VERSION.to_le_bytes());
        assert_eq!(&bytes[12..16], &1u32.to_le_bytes());
        assert_eq!(&bytes[16..24], &hash_str("p3rpc.framework").to_le_bytes());
        assert_eq!(&bytes[32..40], &1u64.to_le_bytes());
        assert_eq!(&bytes[48..56], &0x1234u64.to_le_bytes());
        assert_eq!(SignatureCache::decode(&bytes).unwrap(), cache);
    }

    #[test]
    fn test_truncated_file() {
        let bytes = SignatureCache::new(&active()).encode();
        let err = SignatureCache::decode(&bytes[..20]).unwrap_err();
        assert!(matches!(err, CacheError::UnexpectedEnd(16)));
    }

    #[test]
    fn test_absurd_counts_fail_before_allocating() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            SignatureCache::decode(&bytes),
            Err(CacheError::UnexpectedEnd(16))
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = SignatureCache::new(&active()).encode();
        bytes.push(0);
        assert!(matches!(
            SignatureCache::decode(&bytes),
            Err(CacheError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_mod_order_matters() {
        let loaded = ActiveSet::new(1).with_mod("a", "1").with_mod("b", "1");
        let reordered = ActiveSet::new(1).with_mod("b", "1").with_mod("a", "1");
        let cache = SignatureCache::new(&loaded);
        assert_eq!(cache.matches(&loaded), Ok(()));
        assert_eq!(cache.matches(&reordered), Err(RegenerateReason::ModsChanged));
    }

    #[test]
    fn test_format_version_mismatch() {
        let mut cache = SignatureCache::new(&active());
        cache.format_version = 3;
        assert_eq!(cache.matches(&active()), Err(RegenerateReason::FormatChanged(3)));
    }

    #[test]
    fn test_offset_lookup() {
        let mut cache = SignatureCache::new(&active());
        cache.push("E8 ?? ?? ?? ??", 10);
        assert_eq!(cache.offset_of("E8 ?? ?? ?? ??"), Some(10));
        assert_eq!(cache.offset_of("90 90"), None);
    }
}
