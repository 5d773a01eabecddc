use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::{FeedItem, FeedPayload};
use crate::errors::FeedResult;
use crate::http::HttpClient;
use crate::services::merge::merge_items;
use crate::sources::{InstagramSource, TiktokCollector};
use crate::storage::PayloadStore;

/// How the Instagram list was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstagramOutcome {
    Fetched(usize),
    /// Fetch failed; previous entries or cached covers were kept
    Fallback(usize),
}

impl InstagramOutcome {
    pub fn summary_line(&self) -> String {
        match self {
            InstagramOutcome::Fetched(count) => format!("Instagram items: {}", count),
            InstagramOutcome::Fallback(_) => {
                "Instagram items: fetch failed, using cached entries.".to_string()
            }
        }
    }
}

fn tiktok_summary_line(count: usize) -> String {
    format!("TikTok items: {}", count)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub instagram: InstagramOutcome,
    pub tiktok: usize,
}

impl RefreshSummary {
    pub fn instagram_line(&self) -> String {
        self.instagram.summary_line()
    }

    pub fn tiktok_line(&self) -> String {
        tiktok_summary_line(self.tiktok)
    }
}

fn records(items: &[FeedItem]) -> Vec<Value> {
    items.iter().map(FeedItem::to_record).collect()
}

/// One refresh: collect both platforms, merge with the stored payload, save.
pub struct RefreshService<S: PayloadStore> {
    store: S,
    instagram: InstagramSource,
    tiktok: TiktokCollector,
}

impl<S: PayloadStore> RefreshService<S> {
    pub fn new(store: S, instagram: InstagramSource, tiktok: TiktokCollector) -> Self {
        Self {
            store,
            instagram,
            tiktok,
        }
    }

    /// Wire the standard collectors around a shared HTTP client
    pub fn from_config(config: &Config, store: S) -> FeedResult<Self> {
        let http = HttpClient::new(config.timeout_secs)?;
        let tiktok = TiktokCollector::standard(config, &http);
        let instagram = InstagramSource::new(config, http);

        Ok(Self::new(store, instagram, tiktok))
    }

    pub fn run(&self, config: &Config) -> FeedResult<RefreshSummary> {
        self.run_reporting(config, |_| {})
    }

    /// Like `run`, handing each summary line to `report` as soon as its
    /// platform is done, before the payload is written
    pub fn run_reporting<F>(&self, config: &Config, mut report: F) -> FeedResult<RefreshSummary>
    where
        F: FnMut(&str),
    {
        let existing = self.store.load();

        let (instagram, instagram_outcome) = match self.instagram.fetch_items(config) {
            Some(items) => {
                let count = items.len();
                (records(&items), InstagramOutcome::Fetched(count))
            }
            None => {
                let fallback = if existing.instagram.is_empty() {
                    records(&self.instagram.items_from_cached_covers())
                } else {
                    existing.instagram
                };
                warn!(kept = fallback.len(), "instagram fetch failed, keeping cached entries");
                let count = fallback.len();
                (fallback, InstagramOutcome::Fallback(count))
            }
        };
        report(&instagram_outcome.summary_line());

        let fetched_tiktok = self.tiktok.collect(config);
        let tiktok_count = fetched_tiktok.len();
        report(&tiktok_summary_line(tiktok_count));
        let tiktok = merge_items(&records(&fetched_tiktok), &existing.tiktok);

        let payload = FeedPayload {
            tiktok,
            instagram,
            items: existing.items,
        };
        self.store.save(&payload)?;
        info!(
            instagram = payload.instagram.len(),
            tiktok = payload.tiktok.len(),
            items = payload.items.len(),
            "feed saved"
        );

        Ok(RefreshSummary {
            instagram: instagram_outcome,
            tiktok: tiktok_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Platform;
    use crate::errors::FeedError;
    use crate::sources::TiktokStrategy;
    use crate::storage::traits::MockPayloadStore;
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct Stub(Vec<FeedItem>);

    impl TiktokStrategy for Stub {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn collect(&self, _config: &Config) -> FeedResult<Vec<FeedItem>> {
            Ok(self.0.clone())
        }
    }

    type Saved = Arc<Mutex<Option<FeedPayload>>>;

    // nothing listens on port 9, so every request fails fast
    fn offline_config(root: &TempDir) -> Config {
        Config {
            instagram_base_url: "http://127.0.0.1:9".to_string(),
            tiktok_base_url: "http://127.0.0.1:9".to_string(),
            site_root: root.path().to_path_buf(),
            use_extractor: false,
            ..Config::default()
        }
    }

    fn recording_store(previous: FeedPayload) -> (MockPayloadStore, Saved) {
        let saved: Saved = Arc::new(Mutex::new(None));
        let sink = saved.clone();

        let mut store = MockPayloadStore::new();
        store.expect_load().times(1).return_once(move || previous);
        store.expect_save().times(1).returning(move |payload| {
            *sink.lock().unwrap() = Some(payload.clone());
            Ok(())
        });

        (store, saved)
    }

    fn service(
        store: MockPayloadStore,
        config: &Config,
        tiktok_items: Vec<FeedItem>,
    ) -> RefreshService<MockPayloadStore> {
        let mut tiktok = TiktokCollector::new();
        tiktok.register(Box::new(Stub(tiktok_items)));
        RefreshService::new(
            store,
            InstagramSource::new(config, HttpClient::new(5).unwrap()),
            tiktok,
        )
    }

    fn tiktok_item(id: &str) -> FeedItem {
        FeedItem::new(
            Platform::Tiktok,
            format!("https://www.tiktok.com/@synth/video/{}", id),
            format!("assets/tiktok-covers/{}.jpg", id),
        )
        .with_title("clip".to_string())
    }

    #[test]
    fn test_failed_instagram_keeps_previous_entries() {
        let root = TempDir::new().unwrap();
        let config = offline_config(&root);
        let previous = FeedPayload {
            tiktok: vec![
                json!({"url": "https://www.tiktok.com/@synth/video/1", "title": "old"}),
                json!({"url": "https://www.tiktok.com/@synth/video/0"}),
            ],
            instagram: vec![json!({"url": "https://www.instagram.com/p/A/"})],
            items: vec![json!({"url": "https://example.com/manual", "z": 1, "a": 2})],
        };
        let (store, saved) = recording_store(previous);

        let summary = service(store, &config, vec![tiktok_item("1")]).run(&config).unwrap();

        assert_eq!(summary.instagram, InstagramOutcome::Fallback(1));
        assert_eq!(summary.tiktok, 1);

        let payload = saved.lock().unwrap().clone().unwrap();
        assert_eq!(payload.instagram, vec![json!({"url": "https://www.instagram.com/p/A/"})]);
        assert_eq!(
            payload.items,
            vec![json!({"url": "https://example.com/manual", "z": 1, "a": 2})]
        );
        assert_eq!(payload.tiktok.len(), 2);
        assert_eq!(payload.tiktok[0]["title"], "clip");
        assert_eq!(payload.tiktok[1]["url"], "https://www.tiktok.com/@synth/video/0");
    }

    #[test]
    fn test_failed_instagram_without_history_uses_cached_covers() {
        let root = TempDir::new().unwrap();
        let config = offline_config(&root);
        let covers = root.path().join("assets/ig-covers");
        std::fs::create_dir_all(&covers).unwrap();
        std::fs::write(covers.join("Bcd.jpg"), b"jpeg").unwrap();

        let (store, saved) = recording_store(FeedPayload::default());

        let summary = service(store, &config, Vec::new()).run(&config).unwrap();

        assert_eq!(summary.instagram, InstagramOutcome::Fallback(1));
        assert_eq!(summary.tiktok, 0);

        let payload = saved.lock().unwrap().clone().unwrap();
        assert_eq!(payload.instagram[0]["url"], "https://www.instagram.com/p/Bcd/");
        assert_eq!(payload.instagram[0]["thumbnail"], "assets/ig-covers/Bcd.jpg");
        assert!(payload.tiktok.is_empty());
    }

    #[test]
    fn test_successful_instagram_replaces_previous_entries() {
        let mut server = mockito::Server::new();
        let _page = server
            .mock("GET", "/api/v1/feed/user/555/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"items": [], "more_available": false}"#)
            .create();

        let root = TempDir::new().unwrap();
        let config = Config {
            instagram_user_id: Some("555".to_string()),
            instagram_base_url: server.url(),
            ..offline_config(&root)
        };
        let previous = FeedPayload {
            instagram: vec![json!({"url": "https://www.instagram.com/p/A/"})],
            ..FeedPayload::default()
        };
        let (store, saved) = recording_store(previous);

        let summary = service(store, &config, Vec::new()).run(&config).unwrap();

        assert_eq!(summary.instagram, InstagramOutcome::Fetched(0));
        assert!(saved.lock().unwrap().as_ref().unwrap().instagram.is_empty());
    }

    #[test]
    fn test_save_failure_propagates() {
        let root = TempDir::new().unwrap();
        let config = offline_config(&root);

        let mut store = MockPayloadStore::new();
        store.expect_load().returning(FeedPayload::default);
        store.expect_save().returning(|_| {
            Err(FeedError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        });

        let mut lines = Vec::new();
        let result = service(store, &config, vec![tiktok_item("3")])
            .run_reporting(&config, |line| lines.push(line.to_string()));

        assert!(matches!(result, Err(FeedError::Io(_))));
        assert_eq!(
            lines,
            vec![
                "Instagram items: fetch failed, using cached entries.".to_string(),
                "TikTok items: 1".to_string(),
            ]
        );
    }

    #[test]
    fn test_summary_lines() {
        let summary = RefreshSummary {
            instagram: InstagramOutcome::Fetched(12),
            tiktok: 3,
        };
        assert_eq!(summary.instagram_line(), "Instagram items: 12");
        assert_eq!(summary.tiktok_line(), "TikTok items: 3");

        let summary = RefreshSummary {
            instagram: InstagramOutcome::Fallback(4),
            tiktok: 0,
        };
        assert_eq!(
            summary.instagram_line(),
            "Instagram items: fetch failed, using cached entries."
        );
        assert_eq!(summary.tiktok_line(), "TikTok items: 0");
    }
}
