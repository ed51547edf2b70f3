//! Identity hashing
//!
//! Every identity on the wire is XXH3-64 (seed 0) over UTF-8 bytes. A method
//! identity is the name hash plus the wrapping sum of its parameter hashes,
//! so two overloads whose parameter types are a permutation of each other
//! collide. Changing the combination would change every published MethodId.

use twox_hash::XxHash3_64;

/// Hash raw bytes.
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    XxHash3_64::oneshot(bytes)
}

/// Hash a string's UTF-8 bytes.
pub fn hash_str(value: &str) -> u64 {
    hash_bytes(value.as_bytes())
}

/// Hash a fully-qualified native type path such as `crate::host::IConfig`.
pub fn hash_type_path(path: &str) -> u64 {
    hash_str(path)
}

/// Hash a method signature.
///
/// `param_paths` are the reflected full names of the parameter types in
/// declaration order (`System.Int32`, `Host.Services.IConfig`).
pub fn hash_method<I, S>(name: &str, param_paths: I) -> u64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    param_paths
        .into_iter()
        .fold(hash_str(name), |acc, param| {
            acc.wrapping_add(hash_str(param.as_ref()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let first = hash_type_path("crate::host::services::IConfig");
        for _ in 0..8 {
            assert_eq!(hash_type_path("crate::host::services::IConfig"), first);
        }
        assert_eq!(
            hash_method("SetValue", ["System.Object", "System.Int32"]),
            hash_method("SetValue", ["System.Object", "System.Int32"])
        );
    }

    #[test]
    fn test_known_vectors() {
        // Values published by existing generated bindings.
        assert_eq!(
            hash_type_path("riri_mod_tools_rt::system::Int32"),
            0xe0342d8ff9932e02
        );
        assert_eq!(
            hash_type_path("riri_mod_tools_rt::system::String"),
            0xd17d6432bd7c2cc9
        );
        assert_eq!(hash_str("get_Length"), 0x45eb5d69f4b05f30);
        assert_eq!(
            hash_method("GetValue", ["System.Int32"]),
            0x40fb3729a671e7f4
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(hash_str(""), hash_bytes(&[]));
        assert_eq!(hash_method("", Vec::<String>::new()), hash_str(""));
    }

    #[test]
    fn test_method_hash_without_parameters_is_name_hash() {
        assert_eq!(hash_method("get_ModId", [] as [&str; 0]), hash_str("get_ModId"));
    }

    #[test]
    fn test_permuted_parameters_collide() {
        // Known weakness of the additive combination.
        let a = hash_method("Swap", ["System.Int32", "System.String"]);
        let b = hash_method("Swap", ["System.String", "System.Int32"]);
        assert_eq!(a, b);
    }
}
