use std::io::ErrorKind;
use std::process::{Command, Output};

use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::domain::FeedItem;
use crate::errors::{FeedError, FeedResult};
use crate::http::HttpClient;
use crate::sources::fields::{id_from, non_empty_str, seconds_from};
use crate::sources::tiktok::{materialize_videos, profile_url, TiktokVideo};
use crate::sources::traits::TiktokStrategy;
use crate::storage::CoverCache;

/// Thumbnail ids in order of preference
const PREFERRED_THUMBNAILS: &[&str] = &["originCover", "cover", "dynamicCover"];

/// Lists a profile's entries without downloading media
#[cfg_attr(test, mockall::automock)]
pub trait PlaylistExtractor {
    /// Raw playlist entries, at most `limit` of them when `limit` is non-zero
    fn flat_playlist(&self, url: &str, limit: usize) -> FeedResult<Vec<Value>>;
}

/// `yt-dlp` run as a subprocess in flat-playlist mode
pub struct YtDlp {
    program: Option<String>,
    socket_timeout_secs: u64,
}

impl YtDlp {
    pub fn new(program: Option<String>, socket_timeout_secs: u64) -> Self {
        Self {
            program,
            socket_timeout_secs,
        }
    }

    /// Executables to try, in order, with their leading arguments
    fn candidates(&self) -> Vec<(String, Vec<String>)> {
        let module = || vec!["-m".to_string(), "yt_dlp".to_string()];
        let mut candidates = Vec::new();

        if let Some(program) = &self.program {
            candidates.push((program.clone(), Vec::new()));
        }
        candidates.push(("yt-dlp".to_string(), Vec::new()));
        candidates.push(("python3".to_string(), module()));
        candidates.push(("python".to_string(), module()));

        candidates
    }

    fn args(&self, url: &str, limit: usize) -> Vec<String> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "--skip-download".to_string(),
            "--dump-single-json".to_string(),
            "--ignore-errors".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.socket_timeout_secs.to_string(),
        ];
        if limit > 0 {
            args.push("--playlist-end".to_string());
            args.push(limit.to_string());
        }
        args.push(url.to_string());

        args
    }

    fn run(&self, args: &[String]) -> FeedResult<Output> {
        let mut failures: Vec<String> = Vec::new();

        for (program, prefix) in self.candidates() {
            match Command::new(&program).args(&prefix).args(args).output() {
                Ok(output) if output.status.success() => return Ok(output),
                Ok(output) => {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    failures.push(format!(
                        "{} failed (code={:?}): {}",
                        program,
                        output.status.code(),
                        if stderr.is_empty() { "unknown error" } else { stderr.as_str() }
                    ));
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => failures.push(format!("{} could not start: {}", program, e)),
            }
        }

        if failures.is_empty() {
            return Err(FeedError::Extractor("yt-dlp is not installed".to_string()));
        }

        Err(FeedError::Extractor(format!(
            "yt-dlp failed with all available executables: {}",
            failures.join(" | ")
        )))
    }
}

impl PlaylistExtractor for YtDlp {
    fn flat_playlist(&self, url: &str, limit: usize) -> FeedResult<Vec<Value>> {
        let output = self.run(&self.args(url, limit))?;
        let info: Value = serde_json::from_slice(&output.stdout)?;

        Ok(info
            .get("entries")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

/// Best cover for a playlist entry
pub fn pick_thumbnail(entry: &Value) -> Option<String> {
    if let Some(thumbnail) = non_empty_str(entry.get("thumbnail")) {
        return Some(thumbnail.to_string());
    }

    let thumbnails = entry.get("thumbnails").and_then(Value::as_array)?;
    let url_of = |thumb: &Value| non_empty_str(thumb.get("url")).map(str::to_string);

    PREFERRED_THUMBNAILS
        .iter()
        .find_map(|id| {
            thumbnails
                .iter()
                .filter(|thumb| thumb.get("id").and_then(Value::as_str) == Some(*id))
                .find_map(url_of)
        })
        .or_else(|| thumbnails.iter().find_map(url_of))
}

/// Candidate from a flat-playlist entry; `None` without a URL or cover
pub fn video_from_entry(entry: &Value) -> Option<TiktokVideo> {
    let url = non_empty_str(entry.get("url"))
        .or_else(|| non_empty_str(entry.get("webpage_url")))?
        .to_string();
    let cover_url = pick_thumbnail(entry)?;

    Some(TiktokVideo {
        id: id_from(entry.get("id")),
        url,
        cover_url,
        description: non_empty_str(entry.get("description"))
            .unwrap_or_default()
            .to_string(),
        title_hint: non_empty_str(entry.get("title")).map(str::to_string),
        published_secs: seconds_from(entry.get("timestamp")),
    })
}

pub struct ExtractorStrategy {
    extractor: Box<dyn PlaylistExtractor>,
    http: HttpClient,
    cache: CoverCache,
}

impl ExtractorStrategy {
    pub fn new(extractor: Box<dyn PlaylistExtractor>, http: HttpClient, cache: CoverCache) -> Self {
        Self {
            extractor,
            http,
            cache,
        }
    }
}

impl TiktokStrategy for ExtractorStrategy {
    fn name(&self) -> &'static str {
        "extractor"
    }

    fn collect(&self, config: &Config) -> FeedResult<Vec<FeedItem>> {
        let entries = self
            .extractor
            .flat_playlist(&profile_url(&config.tiktok_username), config.max_items)?;
        debug!(entries = entries.len(), "extractor listed entries");

        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let videos = entries.iter().filter_map(video_from_entry).collect();
        materialize_videos(videos, config, &self.http, &self.cache)
    }
}
