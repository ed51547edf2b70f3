//! Native path rendering
//!
//! A reflected dotted name (`Host.Services.IConfig`) becomes a `::` path
//! under a root (`crate::host::services::IConfig`): every namespace segment
//! is snake_cased, the final type name is kept. Generic arguments render
//! recursively in angle brackets. Arrays render as the runtime's
//! `system::Array<element>` wrapper.
//!
//! The hash input is always the plain rendering. Source rendering differs
//! only in escaping segments that collide with Rust keywords.

use std::fmt;

use crate::builtin::{BuiltinKind, RUNTIME_NAMESPACE};
use crate::ids::TypeId;

/// A rendered native type path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativePath {
    /// A named type, optionally with generic arguments.
    Type {
        /// Root followed by snake_cased namespace segments.
        module: Vec<String>,
        /// Final type name, as reflected.
        name: String,
        /// Rendered generic arguments.
        args: Vec<NativePath>,
    },
    /// A runtime-mediated array of `element`.
    Array(Box<NativePath>),
}

impl NativePath {
    /// Render a reflected dotted name under `root`.
    ///
    /// A generic arity suffix (`` List`1 ``) is dropped from the final
    /// segment and nested type separators (`+`) are treated as dots.
    pub fn from_dotted(full_name: &str, root: &str, args: Vec<NativePath>) -> Self {
        let base = full_name.split('`').next().unwrap_or(full_name);
        let mut segments: Vec<&str> = base
            .split(['.', '+'])
            .filter(|segment| !segment.is_empty())
            .collect();
        let name = segments.pop().unwrap_or_default().to_string();

        let mut module: Vec<String> = root.split("::").map(str::to_string).collect();
        module.extend(segments.into_iter().map(to_snake_case));

        NativePath::Type { module, name, args }
    }

    /// Path of a type provided by the runtime's `system` module.
    pub fn runtime(name: &str) -> Self {
        NativePath::Type {
            module: vec![RUNTIME_NAMESPACE.to_string(), "system".to_string()],
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    /// Array of `element`.
    pub fn array(element: NativePath) -> Self {
        NativePath::Array(Box::new(element))
    }

    /// Final type name (`Array` for arrays).
    pub fn name(&self) -> &str {
        match self {
            NativePath::Type { name, .. } => name,
            NativePath::Array(_) => BuiltinKind::Array.reflected_short_name(),
        }
    }

    /// Root and snake_cased namespace segments.
    pub fn module(&self) -> &[String] {
        match self {
            NativePath::Type { module, .. } => module,
            NativePath::Array(_) => &[],
        }
    }

    /// Whether this path carries generic arguments.
    pub fn is_generic(&self) -> bool {
        matches!(self, NativePath::Type { args, .. } if !args.is_empty())
    }

    /// The hash input of this path.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, false);
        out
    }

    /// The path as it appears in generated Rust source.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, true);
        out
    }

    /// Identity of this path.
    ///
    /// Arrays share the identity of the bare runtime `Array` type: the
    /// element type travels in the construction payload, not in the id.
    pub fn type_id(&self) -> TypeId {
        match self {
            NativePath::Type { .. } => TypeId::of_path(&self.render()),
            NativePath::Array(_) => BuiltinKind::Array.type_id(),
        }
    }

    fn write(&self, out: &mut String, source: bool) {
        match self {
            NativePath::Type { module, name, args } => {
                for (index, segment) in module.iter().enumerate() {
                    if source && index > 0 {
                        out.push_str(&escape_ident(segment));
                    } else {
                        out.push_str(segment);
                    }
                    out.push_str("::");
                }
                out.push_str(name);
                write_args(out, args, source);
            }
            NativePath::Array(element) => {
                out.push_str(RUNTIME_NAMESPACE);
                out.push_str("::system::Array");
                write_args(out, std::slice::from_ref(element.as_ref()), source);
            }
        }
    }
}

fn write_args(out: &mut String, args: &[NativePath], source: bool) {
    if args.is_empty() {
        return;
    }
    out.push('<');
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        arg.write(out, source);
    }
    out.push('>');
}

impl fmt::Display for NativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Convert a PascalCase or camelCase identifier to snake_case.
///
/// An underscore is inserted before an uppercase letter that follows a
/// lowercase letter or digit, and before the last capital of an acronym
/// that starts a new word (`IOStream` becomes `io_stream`).
pub fn to_snake_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 4);
    for (index, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            if index > 0 && !out.ends_with('_') {
                let prev = chars[index - 1];
                let next_is_lower = chars.get(index + 1).is_some_and(|c| c.is_lowercase());
                if prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower)
                {
                    out.push('_');
                }
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

/// Make an identifier usable in Rust source.
///
/// Keywords become raw identifiers. The few that cannot be raw get a
/// trailing underscore.
pub fn escape_ident(ident: &str) -> String {
    match ident {
        "self" | "Self" | "super" | "crate" | "_" => format!("{}_", ident),
        _ if KEYWORDS.contains(&ident) => format!("r#{}", ident),
        _ => ident.to_string(),
    }
}
