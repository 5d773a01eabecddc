use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::domain::text::{collapse_whitespace, title_from};
use crate::domain::{FeedItem, Platform};
use crate::errors::FeedResult;
use crate::http::HttpClient;
use crate::sources::fields::{id_from, non_empty_str, seconds_from};
use crate::storage::{cover_file_name, CoverCache};

/// App id the web client sends; the private API rejects requests without it
pub const IG_APP_ID: &str = "936619743392459";

const PAGE_SIZE: &str = "50";
const CAROUSEL_MEDIA_TYPE: i64 = 8;
const COVER_REFERER: &str = "https://www.instagram.com/";

/// One feed entry reduced to the fields the site needs
#[derive(Debug, Clone, PartialEq)]
pub struct InstagramPost {
    pub shortcode: String,
    pub caption: String,
    pub published_secs: i64,
    pub cover_url: String,
}

impl InstagramPost {
    /// Parse a raw feed entry; `None` without a shortcode or a cover image
    pub fn from_entry(entry: &Value) -> Option<Self> {
        let shortcode = non_empty_str(entry.get("code"))
            .or_else(|| non_empty_str(entry.get("shortcode")))?
            .to_string();

        let caption = entry
            .get("caption")
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .map(collapse_whitespace)
            .unwrap_or_default();

        let published_secs = match seconds_from(entry.get("taken_at")) {
            0 => seconds_from(entry.get("taken_at_timestamp")),
            secs => secs,
        };

        // carousels carry their real cover on the first child
        let carousel_cover = if entry.get("media_type").and_then(Value::as_i64)
            == Some(CAROUSEL_MEDIA_TYPE)
        {
            entry
                .get("carousel_media")
                .and_then(Value::as_array)
                .and_then(|media| media.first())
                .and_then(cover_url_of)
        } else {
            None
        };
        let cover_url = carousel_cover.or_else(|| cover_url_of(entry))?;

        Some(Self {
            shortcode,
            caption,
            published_secs,
            cover_url,
        })
    }

    pub fn permalink(&self) -> String {
        permalink(&self.shortcode)
    }
}

fn permalink(shortcode: &str) -> String {
    format!("https://www.instagram.com/p/{}/", shortcode)
}

fn cover_url_of(media: &Value) -> Option<String> {
    media
        .get("image_versions2")
        .and_then(|v| v.get("candidates"))
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| non_empty_str(candidate.get("url")))
        .or_else(|| non_empty_str(media.get("thumbnail_url")))
        .map(str::to_string)
}

pub struct InstagramSource {
    http: HttpClient,
    cache: CoverCache,
}

impl InstagramSource {
    pub fn new(config: &Config, http: HttpClient) -> Self {
        Self {
            http,
            cache: CoverCache::new(&config.site_root, Platform::Instagram),
        }
    }

    fn profile_referer(config: &Config) -> String {
        format!("https://www.instagram.com/{}/", config.instagram_username)
    }

    /// Numeric profile id, from configuration or the profile-info endpoint
    pub fn resolve_user_id(&self, config: &Config) -> Option<String> {
        if let Some(id) = &config.instagram_user_id {
            return Some(id.clone());
        }

        let url = match Url::parse_with_params(
            &format!("{}/api/v1/users/web_profile_info/", config.instagram_base_url),
            &[("username", config.instagram_username.as_str())],
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "invalid instagram base url");
                return None;
            }
        };

        let referer = Self::profile_referer(config);
        let data = self
            .http
            .fetch_json(url.as_str(), &[("X-IG-App-ID", IG_APP_ID), ("Referer", referer.as_str())])?;

        let id = id_from(data.get("data").and_then(|d| d.get("user")).and_then(|u| u.get("id")));
        if id.is_none() {
            warn!(user = %config.instagram_username, "profile info has no user id");
        }
        id
    }

    fn page_url(config: &Config, user_id: &str, max_id: Option<&str>) -> FeedResult<Url> {
        let mut url = Url::parse(&format!(
            "{}/api/v1/feed/user/{}/",
            config.instagram_base_url, user_id
        ))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("count", PAGE_SIZE);
            if let Some(max_id) = max_id {
                query.append_pair("max_id", max_id);
            }
        }
        Ok(url)
    }

    /// Fetch recent posts.
    ///
    /// `None` means nothing could be collected at all; a failure part way
    /// through pagination keeps what was already gathered.
    pub fn fetch_items(&self, config: &Config) -> Option<Vec<FeedItem>> {
        let user_id = self.resolve_user_id(config)?;

        if let Err(e) = self.cache.ensure_dir() {
            warn!(error = %e, "could not create instagram cover directory");
            return None;
        }

        let referer = Self::profile_referer(config);
        let headers = [("X-IG-App-ID", IG_APP_ID), ("Referer", referer.as_str())];

        let mut items: Vec<FeedItem> = Vec::new();
        let mut seen = HashSet::new();
        let mut max_id: Option<String> = None;
        let mut page_number = 0;

        loop {
            page_number += 1;
            let page = Self::page_url(config, &user_id, max_id.as_deref())
                .map_err(|e| e.to_string())
                .and_then(|url| {
                    self.http
                        .fetch_page(url.as_str(), &headers)
                        .map_err(|reason| reason.to_string())
                });

            let page = match page {
                Ok(page) => page,
                Err(reason) => {
                    warn!(page = page_number, %reason, collected = items.len(), "instagram page fetch failed");
                    return (!items.is_empty()).then_some(items);
                }
            };

            let entries = page.get("items").and_then(Value::as_array);
            for entry in entries.into_iter().flatten() {
                let Some(post) = InstagramPost::from_entry(entry) else {
                    continue;
                };
                if seen.contains(&post.permalink()) {
                    continue;
                }
                let Some(item) = self.materialize(&post) else {
                    continue;
                };

                seen.insert(item.url.clone());
                items.push(item);
                if config.limit_reached(items.len()) {
                    break;
                }
            }

            if config.limit_reached(items.len()) {
                break;
            }
            if !page.get("more_available").and_then(Value::as_bool).unwrap_or(false) {
                break;
            }
            let Some(next_max_id) = id_from(page.get("next_max_id")) else {
                break;
            };
            // cursor did not advance
            if max_id.as_deref() == Some(next_max_id.as_str()) {
                break;
            }
            max_id = Some(next_max_id);
        }

        info!(count = items.len(), pages = page_number, "instagram items collected");
        Some(items)
    }

    fn materialize(&self, post: &InstagramPost) -> Option<FeedItem> {
        let name = cover_file_name(&post.shortcode)?;
        let thumbnail =
            self.cache
                .materialize(&self.http, &name, &post.cover_url, &[("Referer", COVER_REFERER)]);

        let Some(thumbnail) = thumbnail else {
            debug!(shortcode = %post.shortcode, "dropping post without cover");
            return None;
        };

        Some(
            FeedItem::new(Platform::Instagram, post.permalink(), thumbnail)
                .with_title(title_from(&post.caption, Platform::Instagram.default_title()))
                .with_description(post.caption.clone())
                .with_published_secs(post.published_secs),
        )
    }

    /// Minimal entries rebuilt from covers already on disk
    pub fn items_from_cached_covers(&self) -> Vec<FeedItem> {
        self.cache
            .cached_names()
            .into_iter()
            .filter_map(|name| {
                let shortcode = name.strip_suffix(".jpg")?.to_string();
                Some(FeedItem::new(
                    Platform::Instagram,
                    permalink(&shortcode),
                    self.cache.thumbnail_path(&name),
                ))
            })
            .collect()
    }
}
