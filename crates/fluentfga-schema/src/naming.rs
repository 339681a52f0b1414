//! Entity naming: qualified references and relation selector resolution.
//!
//! Every entity reference sent to the engine is type-qualified
//! (`crm_company:acme`). Type names are canonicalised to lower snake case so
//! that a Rust type `CrmCompany` and the schema type `crm_company` name the
//! same thing.
//!
//! Relation selectors are static chains of [`Member`]s emitted by the code
//! generator. Resolution always yields the canonical name of the innermost
//! member, so `Perform -> Edit` resolves to `edit`.

use std::borrow::Cow;

/// Converts a type or member name into canonical lower snake case.
///
/// Word boundaries are inserted before an upper-case letter that follows a
/// lower-case letter or digit, and between an acronym and the word after it
/// (`HTTPServer` becomes `http_server`). Hyphens and whitespace become
/// underscores. Input that is already snake case is returned unchanged.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c.is_whitespace() {
            out.push('_');
            continue;
        }

        if !c.is_uppercase() {
            out.push(c);
            continue;
        }

        let prev = i.checked_sub(1).and_then(|p| chars.get(p)).copied();
        let next = chars.get(i + 1).copied();
        let boundary = match prev {
            Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
            Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
            _ => false,
        };

        if boundary && !out.ends_with('_') {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Converts a snake case schema name into an upper camel case Rust type name.
///
/// `crm_company` becomes `CrmCompany`.
pub fn to_pascal_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Builds a qualified entity reference.
///
/// Returns `canonical(type_name):id` when an id is supplied, or the bare
/// canonical type token otherwise (used for type-scoped queries).
pub fn qualify(type_name: &str, id: Option<&str>) -> String {
    let canonical = to_snake_case(type_name);
    match id {
        Some(id) => format!("{canonical}:{id}"),
        None => canonical,
    }
}

/// One step of a relation selector chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    /// A named field, such as `editor` or the `perform` group.
    Named(&'static str),
    /// An element of a grouped field, addressed by position.
    ///
    /// `names` carries the element names declared on the group. When the
    /// position has no declared name the element falls back to its
    /// positional name (`item1`, `item2`, ...).
    Positional {
        index: usize,
        names: &'static [&'static str],
    },
}

impl Member {
    /// The name this member contributes when it terminates a chain.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Member::Named(name) => Cow::Borrowed(name),
            Member::Positional { index, names } => match names.get(*index) {
                Some(name) => Cow::Borrowed(name),
                None => Cow::Owned(format!("item{}", index + 1)),
            },
        }
    }
}

/// Resolves a selector chain to its canonical relation name.
///
/// Only the last member is significant. Returns `None` for an empty chain or
/// one that ends in an unnamed member.
pub fn resolve_relation(chain: &[Member]) -> Option<String> {
    let name = chain.last()?.name();
    if name.is_empty() {
        return None;
    }
    Some(to_snake_case(&name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_from_pascal() {
        assert_eq!(to_snake_case("CrmCompany"), "crm_company");
        assert_eq!(to_snake_case("Form"), "form");
        assert_eq!(to_snake_case("CrmEmailAccount"), "crm_email_account");
    }

    #[test]
    fn test_snake_case_acronyms_and_digits() {
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("Team2Group"), "team2_group");
        assert_eq!(to_snake_case("free-trial"), "free_trial");
    }

    #[test]
    fn test_snake_case_is_identity_on_snake_input() {
        assert_eq!(to_snake_case("crm_company"), "crm_company");
        assert_eq!(to_snake_case("free_trial"), "free_trial");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("crm_company"), "CrmCompany");
        assert_eq!(to_pascal_case("user"), "User");
        assert_eq!(to_pascal_case("free_trial"), "FreeTrial");
    }

    #[test]
    fn test_qualify_with_and_without_id() {
        assert_eq!(qualify("CrmCompany", Some("acme")), "crm_company:acme");
        assert_eq!(qualify("Form", Some("224")), "form:224");
        assert_eq!(qualify("Form", None), "form");
    }

    #[test]
    fn test_resolve_simple_field() {
        let chain = [Member::Named("Editor")];
        assert_eq!(resolve_relation(&chain).as_deref(), Some("editor"));
    }

    #[test]
    fn test_resolve_aliased_group_element() {
        const NAMES: &[&str] = &["Approve", "Edit", "Publish", "Read"];
        let chain = [
            Member::Named("Perform"),
            Member::Positional {
                index: 1,
                names: NAMES,
            },
        ];
        assert_eq!(resolve_relation(&chain).as_deref(), Some("edit"));
    }

    #[test]
    fn test_resolve_unaliased_group_element_uses_position() {
        let chain = [
            Member::Named("perform"),
            Member::Positional {
                index: 2,
                names: &[],
            },
        ];
        assert_eq!(resolve_relation(&chain).as_deref(), Some("item3"));
    }

    #[test]
    fn test_resolve_multi_level_chain_returns_innermost() {
        const INNER: &[&str] = &["owner", "reader"];
        let chain = [
            Member::Named("perform"),
            Member::Named("inherited"),
            Member::Positional {
                index: 0,
                names: INNER,
            },
        ];
        assert_eq!(resolve_relation(&chain).as_deref(), Some("owner"));
    }

    #[test]
    fn test_resolve_empty_chain_fails() {
        assert_eq!(resolve_relation(&[]), None);
        assert_eq!(resolve_relation(&[Member::Named("")]), None);
    }
}
