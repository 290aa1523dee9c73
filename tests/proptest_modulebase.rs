//! Property-based tests using proptest
//!
//! These tests verify path composition, list result normalization, query
//! encoding and batch fan-out using randomized inputs.

use mcclient::error::Error;
use mcclient::modulebase::{
    batch_do, query_string, BaseManager, ListResult, Manager, ResourceManager,
};
use mcclient::session::split_versioned_url;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;

/// Generate plural keywords, optionally nested with `:`
fn arb_keyword_plural() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z0-9_]{0,15}", 1..4).prop_map(|segs| segs.join(":"))
}

/// Generate list items
fn arb_items() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        ("[a-z0-9-]{1,36}", "[a-z][a-z0-9-]{0,20}")
            .prop_map(|(id, name)| json!({"id": id, "name": name})),
        0..50,
    )
}

mod path_tests {
    use super::*;

    proptest! {
        /// Without contexts or a prefix the path is just the URL path
        #[test]
        fn context_path_without_contexts_is_url_path(plural in arb_keyword_plural()) {
            let mgr = ResourceManager::new(BaseManager::default(), "item", &plural);
            prop_assert_eq!(mgr.context_path(&[]), mgr.url_path());
            prop_assert!(!mgr.url_path().contains(':'));
        }

        /// A trailing version segment is split off and the base is kept
        #[test]
        fn versioned_url_splits(
            host in "[a-z]{1,10}\\.example\\.com",
            prefix in "(/[a-z]{1,8}){0,2}",
            version in 1u32..20,
        ) {
            let base = format!("https://{}{}", host, prefix);
            let url = format!("{}/v{}/", base, version);
            let (split_base, split_version) = split_versioned_url(&url);
            prop_assert_eq!(split_base, base.as_str());
            prop_assert_eq!(split_version.to_string(), format!("v{}", version));
        }
    }
}

mod list_result_tests {
    use super::*;

    proptest! {
        /// Without a marker, a missing total is the number of items
        #[test]
        fn total_inferred_from_items(items in arb_items()) {
            let body = json!({"servers": items.clone()});
            let result = ListResult::from_response(&body, "servers").unwrap();
            prop_assert_eq!(result.total, items.len() as u64);
            prop_assert_eq!(result.data, items);
        }

        /// to_json followed by from_json gives back the same result
        #[test]
        fn json_round_trip(
            items in arb_items(),
            total in 0u64..1000,
            limit in 0u64..100,
            offset in 0u64..1000,
        ) {
            let original = ListResult::new(
                items,
                total,
                limit,
                offset,
                String::new(),
                String::new(),
                String::new(),
            );
            let decoded = ListResult::from_json(&original.to_json());
            prop_assert_eq!(decoded, original);
        }
    }
}

mod query_tests {
    use super::*;

    proptest! {
        /// Any string value survives encoding and decoding
        #[test]
        fn query_values_decode(key in "[a-z_]{1,12}", value in "\\PC{0,40}") {
            let mut params = serde_json::Map::new();
            params.insert(key.clone(), Value::String(value.clone()));
            let qs = query_string(&Value::Object(params));
            let pairs: Vec<(String, String)> = url::form_urlencoded::parse(qs.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            prop_assert_eq!(pairs, vec![(key, value)]);
        }

        /// Arrays repeat the key once per element
        #[test]
        fn query_arrays_repeat_key(values in prop::collection::vec("[a-z0-9]{1,8}", 0..10)) {
            let qs = query_string(&json!({"filter": values.clone()}));
            let count = url::form_urlencoded::parse(qs.as_bytes())
                .filter(|(k, _)| k == "filter")
                .count();
            prop_assert_eq!(count, values.len());
        }
    }
}

mod batch_tests {
    use super::*;

    proptest! {
        /// Every input id appears exactly once in the results
        #[test]
        fn batch_do_reports_every_id(
            ids in prop::collection::hash_set("[a-z0-9]{1,12}", 0..30),
            failing in "[a-z0-9]{1,12}",
        ) {
            let input: Vec<String> = ids.into_iter().collect();
            let results = tokio_test::block_on(batch_do(input.clone(), |id| {
                let failing = failing.clone();
                async move {
                    if id == failing {
                        Err(Error::Filter("rejected".into()))
                    } else {
                        Ok(json!({"id": id}))
                    }
                }
            }));

            prop_assert_eq!(results.len(), input.len());
            let seen: HashSet<String> = results.iter().map(|r| r.id.clone()).collect();
            prop_assert_eq!(seen, input.iter().cloned().collect::<HashSet<_>>());
            for r in &results {
                let expected = if r.id == failing { 400 } else { 200 };
                prop_assert_eq!(r.status, expected);
            }
        }
    }
}
