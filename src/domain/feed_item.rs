use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
        }
    }

    /// Title used when a post has no caption
    pub fn default_title(&self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram Post",
            Platform::Tiktok => "TikTok Video",
        }
    }

    /// Cover directory relative to the site root
    pub fn cover_dir(&self) -> &'static str {
        match self {
            Platform::Instagram => "assets/ig-covers",
            Platform::Tiktok => "assets/tiktok-covers",
        }
    }
}

/// A normalized social post whose cover is cached on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub source: Platform,
    pub url: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    /// Milliseconds since epoch, 0 when unknown
    pub published: i64,
}

impl FeedItem {
    pub fn new(source: Platform, url: String, thumbnail: String) -> Self {
        Self {
            source,
            url,
            thumbnail,
            title: source.default_title().to_string(),
            description: String::new(),
            published: 0,
        }
    }

    pub fn with_title(mut self, title: String) -> Self {
        self.title = title;
        self
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    /// Set the publish time from a unix timestamp in seconds
    pub fn with_published_secs(mut self, seconds: i64) -> Self {
        self.published = seconds.saturating_mul(1000);
        self
    }

    /// JSON record in the persisted field order
    pub fn to_record(&self) -> Value {
        json!({
            "source": self.source.as_str(),
            "url": self.url,
            "thumbnail": self.thumbnail,
            "title": self.title,
            "description": self.description,
            "published": self.published,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Platform::Tiktok).unwrap(), json!("tiktok"));
        assert_eq!(
            serde_json::from_value::<Platform>(json!("instagram")).unwrap(),
            Platform::Instagram
        );
    }

    #[test]
    fn test_new_item_uses_platform_defaults() {
        let item = FeedItem::new(
            Platform::Instagram,
            "https://www.instagram.com/p/abc/".to_string(),
            "assets/ig-covers/abc.jpg".to_string(),
        );

        assert_eq!(item.title, "Instagram Post");
        assert_eq!(item.description, "");
        assert_eq!(item.published, 0);
    }

    #[test]
    fn test_record_field_order() {
        let item = FeedItem::new(
            Platform::Tiktok,
            "https://www.tiktok.com/@a/video/1".to_string(),
            "assets/tiktok-covers/1.jpg".to_string(),
        )
        .with_published_secs(1_700_000_000);

        let record = item.to_record();
        let keys: Vec<&String> = record.as_object().unwrap().keys().collect();
        assert_eq!(
            keys,
            ["source", "url", "thumbnail", "title", "description", "published"]
        );
        assert_eq!(record["published"], json!(1_700_000_000_000_i64));
        assert_eq!(record["source"], json!("tiktok"));
    }
}
