//! `hashbridge hash`: compute identities by hand.

use hashbridge_abi::{BuiltinKind, MethodId, NativePath};

pub fn type_id(name: String, root: String) -> anyhow::Result<()> {
    let path = resolve(&name, &root);
    println!("{} {}", path.type_id(), path);
    Ok(())
}

pub fn method_id(name: String, params: Vec<String>) -> anyhow::Result<()> {
    let id = MethodId::of_signature(&name, &params);
    println!("{} {}({})", id, name, params.join(", "));
    Ok(())
}

/// A native path as given, a built-in, an array, or a dotted name under `root`.
fn resolve(name: &str, root: &str) -> NativePath {
    if let Some(element) = name.strip_suffix("[]") {
        return NativePath::array(resolve(element, root));
    }
    if let Some(kind) = BuiltinKind::from_reflected(name) {
        return kind.native_path();
    }
    match name.rsplit_once("::") {
        Some((module, type_name)) => NativePath::Type {
            module: module.split("::").map(str::to_string).collect(),
            name: type_name.to_string(),
            args: Vec::new(),
        },
        None => NativePath::from_dotted(name, root, Vec::new()),
    }
}
