//! Rust identifier rules for generated items.

/// Keywords that must be written as raw identifiers (`r#type`).
const RAW_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers; these get a trailing underscore.
const RESERVED_PATH_KEYWORDS: &[&str] = &["self", "Self", "super", "crate", "_"];

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Converts a snake case name into a value-namespace identifier (field,
/// argument or module name). Returns `None` if the name cannot be one.
pub(crate) fn value_ident(name: &str) -> Option<String> {
    if RESERVED_PATH_KEYWORDS.contains(&name) {
        return Some(format!("{name}_"));
    }
    if !is_identifier(name) {
        return None;
    }
    if RAW_KEYWORDS.contains(&name) {
        Some(format!("r#{name}"))
    } else {
        Some(name.to_string())
    }
}

/// Converts a Pascal case name into a type-namespace identifier.
pub(crate) fn type_ident(name: &str) -> Option<String> {
    if RESERVED_PATH_KEYWORDS.contains(&name) {
        return Some(format!("{name}_"));
    }
    is_identifier(name).then(|| name.to_string())
}

/// Name of the associated constant holding a relation's selector chain.
pub(crate) fn chain_const(relation: &str) -> String {
    format!("{}_CHAIN", relation.to_ascii_uppercase())
}
