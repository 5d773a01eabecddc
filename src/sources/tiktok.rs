use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::{Config, TIKTOK_BASE_URL};
use crate::domain::text::{collapse_whitespace, title_from};
use crate::domain::{FeedItem, Platform};
use crate::errors::FeedResult;
use crate::http::HttpClient;
use crate::sources::tiktok_extractor::{ExtractorStrategy, YtDlp};
use crate::sources::tiktok_html::ProfilePageStrategy;
use crate::sources::traits::TiktokStrategy;
use crate::storage::{cover_file_name, CoverCache};

/// A video candidate before its cover is cached
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TiktokVideo {
    pub id: Option<String>,
    pub url: String,
    pub cover_url: String,
    pub description: String,
    /// Used for the title when the description is empty
    pub title_hint: Option<String>,
    pub published_secs: i64,
}

/// Canonical profile URL on tiktok.com
pub fn profile_url(username: &str) -> String {
    format!("{}/@{}", TIKTOK_BASE_URL, username)
}

/// Turn candidates into feed items, caching each cover as `<id>.jpg`.
///
/// Duplicate permalinks are skipped, the configured cap is honored, and a
/// candidate whose cover cannot be stored is dropped.
pub fn materialize_videos(
    videos: Vec<TiktokVideo>,
    config: &Config,
    http: &HttpClient,
    cache: &CoverCache,
) -> FeedResult<Vec<FeedItem>> {
    cache.ensure_dir()?;

    let referer = format!("{}/@{}", config.tiktok_base_url, config.tiktok_username);
    let headers = [("Referer", referer.as_str())];

    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for video in videos {
        if config.limit_reached(items.len()) {
            break;
        }
        if video.url.is_empty() || !seen.insert(video.url.clone()) {
            continue;
        }

        let stem = video.id.clone().unwrap_or_else(|| seen.len().to_string());
        let Some(name) = cover_file_name(&stem) else {
            debug!(id = %stem, "skipping video with unusable id");
            continue;
        };
        let Some(thumbnail) = cache.materialize(http, &name, &video.cover_url, &headers) else {
            continue;
        };

        let description = collapse_whitespace(&video.description);
        let title_source = if description.is_empty() {
            collapse_whitespace(video.title_hint.as_deref().unwrap_or_default())
        } else {
            description.clone()
        };

        items.push(
            FeedItem::new(Platform::Tiktok, video.url, thumbnail)
                .with_title(title_from(&title_source, Platform::Tiktok.default_title()))
                .with_description(description)
                .with_published_secs(video.published_secs),
        );
    }

    Ok(items)
}

/// Ordered fallback chain; the first strategy with results wins.
pub struct TiktokCollector {
    strategies: Vec<Box<dyn TiktokStrategy>>,
}

impl TiktokCollector {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Extractor first (when enabled), then the profile page scrape
    pub fn standard(config: &Config, http: &HttpClient) -> Self {
        let cache = CoverCache::new(&config.site_root, Platform::Tiktok);
        let mut collector = Self::new();

        if config.use_extractor {
            collector.register(Box::new(ExtractorStrategy::new(
                Box::new(YtDlp::new(config.extractor_path.clone(), config.timeout_secs)),
                http.clone(),
                cache.clone(),
            )));
        }
        collector.register(Box::new(ProfilePageStrategy::new(http.clone(), cache)));
        debug!(strategies = ?collector.strategy_names(), "tiktok strategies registered");

        collector
    }

    pub fn register(&mut self, strategy: Box<dyn TiktokStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Never fails; a run where every strategy comes up empty yields no items
    pub fn collect(&self, config: &Config) -> Vec<FeedItem> {
        for strategy in &self.strategies {
            match strategy.collect(config) {
                Ok(items) if !items.is_empty() => {
                    info!(strategy = strategy.name(), count = items.len(), "tiktok items collected");
                    return items;
                }
                Ok(_) => {
                    debug!(strategy = strategy.name(), "no tiktok items");
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "tiktok strategy failed");
                }
            }
        }

        Vec::new()
    }
}

impl Default for TiktokCollector {
    fn default() -> Self {
        Self::new()
    }
}
