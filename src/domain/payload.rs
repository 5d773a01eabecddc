use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The persisted feed file.
///
/// Lists hold raw JSON records so hand-curated entries round-trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedPayload {
    pub tiktok: Vec<Value>,
    pub instagram: Vec<Value>,
    pub items: Vec<Value>,
}

impl FeedPayload {
    /// Lenient read of a parsed document: anything that is not a list becomes empty
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };

        let mut take_list = |key: &str| match map.remove(key) {
            Some(Value::Array(list)) => list,
            _ => Vec::new(),
        };

        Self {
            tiktok: take_list("tiktok"),
            instagram: take_list("instagram"),
            items: take_list("items"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_reads_lists() {
        let payload = FeedPayload::from_value(json!({
            "items": [{"url": "a"}],
            "tiktok": [{"url": "b"}, {"url": "c"}],
            "instagram": []
        }));

        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.tiktok.len(), 2);
        assert!(payload.instagram.is_empty());
    }

    #[test]
    fn test_from_value_tolerates_wrong_shapes() {
        let payload = FeedPayload::from_value(json!({
            "items": "not a list",
            "tiktok": {"url": "b"}
        }));
        assert_eq!(payload, FeedPayload::default());

        assert_eq!(FeedPayload::from_value(json!([1, 2, 3])), FeedPayload::default());
        assert_eq!(FeedPayload::from_value(Value::Null), FeedPayload::default());
    }

    #[test]
    fn test_serialized_key_order() {
        let text = serde_json::to_string(&FeedPayload::default()).unwrap();
        assert_eq!(text, r#"{"tiktok":[],"instagram":[],"items":[]}"#);
    }
}
