use std::collections::HashSet;

use serde_json::Value;

/// `primary` followed by `secondary`, keeping the first record per `url`.
///
/// Entries that are not objects or have no string `url` are dropped.
pub fn merge_items(primary: &[Value], secondary: &[Value]) -> Vec<Value> {
    let mut seen = HashSet::new();

    primary
        .iter()
        .chain(secondary)
        .filter(|item| item.is_object())
        .filter(|item| match item.get("url").and_then(Value::as_str) {
            Some(url) if !url.is_empty() => seen.insert(url.to_string()),
            _ => false,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primary_wins_on_duplicate_url() {
        let fetched = vec![json!({"url": "https://t/1", "title": "fresh"})];
        let previous = vec![
            json!({"url": "https://t/1", "title": "stale"}),
            json!({"url": "https://t/0", "title": "old"}),
        ];

        let merged = merge_items(&fetched, &previous);

        assert_eq!(
            merged,
            vec![
                json!({"url": "https://t/1", "title": "fresh"}),
                json!({"url": "https://t/0", "title": "old"}),
            ]
        );
    }

    #[test]
    fn test_skips_invalid_entries() {
        let previous = vec![
            json!("https://t/1"),
            json!({"title": "no url"}),
            json!({"url": 7}),
            json!({"url": ""}),
            json!({"url": "https://t/2", "custom": true}),
        ];

        let merged = merge_items(&[], &previous);

        assert_eq!(merged, vec![json!({"url": "https://t/2", "custom": true})]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let fetched = vec![json!({"url": "a"}), json!({"url": "b"})];
        let previous = vec![json!({"url": "b"}), json!({"url": "c"})];

        let once = merge_items(&fetched, &previous);
        let twice = merge_items(&fetched, &once);

        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn test_duplicates_within_primary() {
        let fetched = vec![json!({"url": "a", "n": 1}), json!({"url": "a", "n": 2})];
        assert_eq!(merge_items(&fetched, &[]), vec![json!({"url": "a", "n": 1})]);
    }
}
