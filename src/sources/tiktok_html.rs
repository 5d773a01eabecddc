//! Scrapes the embedded state JSON out of a TikTok profile page.

use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{Config, TIKTOK_BASE_URL};
use crate::domain::FeedItem;
use crate::errors::FeedResult;
use crate::http::HttpClient;
use crate::sources::fields::{id_from, non_empty_str, seconds_from};
use crate::sources::tiktok::{materialize_videos, TiktokVideo};
use crate::sources::traits::TiktokStrategy;
use crate::storage::CoverCache;

/// Script elements known to carry the page state
const STATE_SCRIPTS: &[&str] = &[
    r#"script[id="SIGI_STATE"]"#,
    r#"script[id="__UNIVERSAL_DATA_FOR_REHYDRATION__"]"#,
];

const ITEM_MODULE_KEYS: &[&str] = &["ItemModule", "itemModule"];
const COVER_KEYS: &[&str] = &["cover", "originCover", "dynamicCover"];

pub struct ProfilePageStrategy {
    http: HttpClient,
    cache: CoverCache,
}

impl ProfilePageStrategy {
    pub fn new(http: HttpClient, cache: CoverCache) -> Self {
        Self { http, cache }
    }
}

impl TiktokStrategy for ProfilePageStrategy {
    fn name(&self) -> &'static str {
        "profile_page"
    }

    fn collect(&self, config: &Config) -> FeedResult<Vec<FeedItem>> {
        let base = &config.tiktok_base_url;
        let page_url = format!("{}/@{}", base, config.tiktok_username);
        let referer = format!("{}/", base);

        let html = self
            .http
            .fetch_text(&page_url, &[("Referer", referer.as_str())])?;

        let videos = extract_videos(&html, &config.tiktok_username);
        debug!(candidates = videos.len(), "profile page parsed");
        if videos.is_empty() {
            return Ok(Vec::new());
        }

        materialize_videos(videos, config, &self.http, &self.cache)
    }
}

/// Candidates authored by `target` found in the page's state scripts
pub fn extract_videos(html: &str, target: &str) -> Vec<TiktokVideo> {
    let document = Html::parse_document(html);
    let mut videos = Vec::new();

    for selector in STATE_SCRIPTS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        let Some(script) = document.select(&selector).next() else {
            continue;
        };

        let payload: String = script.text().collect();
        let state: Value = match serde_json::from_str(payload.trim()) {
            Ok(state) => state,
            Err(e) => {
                debug!(error = %e, "state script is not JSON");
                continue;
            }
        };

        let mut modules = Vec::new();
        collect_item_modules(&state, &mut modules);
        videos.extend(
            modules
                .into_iter()
                .flat_map(Map::values)
                .filter_map(|candidate| video_from_candidate(candidate, target)),
        );
    }

    videos
}

/// Every object stored under an item-module key, at any depth
fn collect_item_modules<'a>(node: &'a Value, modules: &mut Vec<&'a Map<String, Value>>) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Object(module) if ITEM_MODULE_KEYS.contains(&key.as_str()) => {
                        modules.push(module)
                    }
                    _ => collect_item_modules(value, modules),
                }
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                collect_item_modules(entry, modules);
            }
        }
        _ => {}
    }
}

fn author_of(data: &Value) -> Option<&str> {
    non_empty_str(data.get("authorUniqueId"))
        .or_else(|| non_empty_str(data.get("authorName")))
        .or_else(|| match data.get("author") {
            Some(author @ Value::String(_)) => non_empty_str(Some(author)),
            Some(author) => non_empty_str(author.get("uniqueId")),
            None => None,
        })
}

fn cover_of(data: &Value) -> Option<String> {
    let video = data.get("video").filter(|v| v.is_object())?;
    let cover = COVER_KEYS
        .iter()
        .find_map(|key| non_empty_str(video.get(*key)))?;

    Some(match cover.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => cover.to_string(),
    })
}

/// Normalize one item-module entry; `None` for other authors or missing fields
pub fn video_from_candidate(candidate: &Value, target: &str) -> Option<TiktokVideo> {
    let data = candidate
        .get("itemStruct")
        .filter(|inner| inner.is_object())
        .unwrap_or(candidate);
    if !data.is_object() {
        return None;
    }

    let author = author_of(data);
    if author.is_some_and(|author| !author.eq_ignore_ascii_case(target)) {
        return None;
    }

    let id = id_from(data.get("id")).or_else(|| id_from(data.get("itemId")));
    let url = match (non_empty_str(data.get("shareUrl")), &id) {
        (Some(share_url), _) => share_url.to_string(),
        (None, Some(id)) => format!(
            "{}/@{}/video/{}",
            TIKTOK_BASE_URL,
            author.unwrap_or(target),
            id
        ),
        (None, None) => return None,
    };
    let cover_url = cover_of(data)?;

    Some(TiktokVideo {
        id,
        url,
        cover_url,
        description: non_empty_str(data.get("desc")).unwrap_or_default().to_string(),
        title_hint: None,
        published_secs: seconds_from(data.get("createTime")),
    })
}
