use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::{FeedError, FeedResult};

const DEFAULT_USERNAME: &str = "iamb.synthmusic";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

pub const INSTAGRAM_BASE_URL: &str = "https://www.instagram.com";
pub const TIKTOK_BASE_URL: &str = "https://www.tiktok.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub instagram_username: String,
    pub instagram_user_id: Option<String>,
    pub tiktok_username: String,
    /// Per-platform item cap, 0 means unlimited
    pub max_items: usize,
    pub timeout_secs: u64,
    /// Site root holding the `assets/` directory
    pub site_root: PathBuf,
    pub use_extractor: bool,
    pub extractor_path: Option<String>,
    pub instagram_base_url: String,
    pub tiktok_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instagram_username: DEFAULT_USERNAME.to_string(),
            instagram_user_id: None,
            tiktok_username: DEFAULT_USERNAME.to_string(),
            max_items: 0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            site_root: PathBuf::from("."),
            use_extractor: true,
            extractor_path: None,
            instagram_base_url: INSTAGRAM_BASE_URL.to_string(),
            tiktok_base_url: TIKTOK_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> FeedResult<Self> {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source
    pub fn from_lookup<F>(lookup: F) -> FeedResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            instagram_username: get("INSTAGRAM_USERNAME").unwrap_or(defaults.instagram_username),
            instagram_user_id: get("INSTAGRAM_USER_ID"),
            tiktok_username: get("TIKTOK_USERNAME").unwrap_or(defaults.tiktok_username),
            // zero or negative means unlimited
            max_items: parse_var::<i64>("SOCIAL_FEED_LIMIT", get("SOCIAL_FEED_LIMIT"))?
                .map(|n| usize::try_from(n).unwrap_or(0))
                .unwrap_or(defaults.max_items),
            timeout_secs: parse_var("SOCIAL_FEED_TIMEOUT", get("SOCIAL_FEED_TIMEOUT"))?
                .unwrap_or(defaults.timeout_secs),
            site_root: get("SOCIAL_FEED_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.site_root),
            use_extractor: parse_flag("SOCIAL_FEED_USE_YTDLP", get("SOCIAL_FEED_USE_YTDLP"))?
                .unwrap_or(defaults.use_extractor),
            extractor_path: get("YT_DLP_PATH"),
            instagram_base_url: get("INSTAGRAM_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.instagram_base_url),
            tiktok_base_url: get("TIKTOK_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.tiktok_base_url),
        })
    }

    pub fn output_path(&self) -> PathBuf {
        self.site_root.join("assets").join("social-feed.json")
    }

    /// True once `count` items satisfy a non-zero cap
    pub fn limit_reached(&self, count: usize) -> bool {
        self.max_items > 0 && count >= self.max_items
    }
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>) -> FeedResult<Option<T>> {
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|_| FeedError::InvalidEnvVar {
                name: name.to_string(),
                value: v.clone(),
            })
        })
        .transpose()
}

fn parse_flag(name: &str, value: Option<String>) -> FeedResult<Option<bool>> {
    value
        .map(|v| match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(FeedError::InvalidEnvVar {
                name: name.to_string(),
                value: v.clone(),
            }),
        })
        .transpose()
}
