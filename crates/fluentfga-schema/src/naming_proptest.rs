//! Property-based tests for entity naming.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::naming::{qualify, resolve_relation, to_pascal_case, to_snake_case, Member};

    /// Strategy to generate canonical schema names like "crm_company"
    fn snake_name_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z][a-z0-9]{1,8}", 1..4).prop_map(|parts| parts.join("_"))
    }

    proptest! {
        #[test]
        fn test_qualify_is_canonical_type_colon_id(
            type_name in snake_name_strategy(),
            id in "[a-z0-9_]{1,20}"
        ) {
            let pascal = to_pascal_case(&type_name);
            let qualified = qualify(&pascal, Some(&id));
            prop_assert_eq!(&qualified, &format!("{}:{}", to_snake_case(&pascal), id));
            // Same inputs, same output
            prop_assert_eq!(qualified, qualify(&pascal, Some(&id)));
        }

        #[test]
        fn test_pascal_round_trips_through_snake(type_name in snake_name_strategy()) {
            prop_assert_eq!(to_snake_case(&to_pascal_case(&type_name)), type_name);
        }

        #[test]
        fn test_snake_case_is_idempotent(name in "[A-Za-z][A-Za-z0-9]{0,20}") {
            let once = to_snake_case(&name);
            prop_assert_eq!(to_snake_case(&once), once);
        }

        #[test]
        fn test_positional_resolution_picks_declared_name(
            names in prop::collection::vec(snake_name_strategy(), 1..6),
            pick in 0usize..6
        ) {
            let index = pick % names.len();
            // Leak so the names satisfy the 'static selector tables.
            let leaked: &'static [&'static str] = Box::leak(
                names
                    .iter()
                    .map(|n| &*Box::leak(n.clone().into_boxed_str()))
                    .collect::<Vec<&'static str>>()
                    .into_boxed_slice(),
            );
            let chain = [Member::Named("perform"), Member::Positional { index, names: leaked }];
            let first = resolve_relation(&chain);
            prop_assert_eq!(first.as_deref(), Some(names[index].as_str()));
            prop_assert_eq!(first, resolve_relation(&chain));
        }
    }
}
