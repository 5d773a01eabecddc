use crate::config::Config;
use crate::domain::FeedItem;
use crate::errors::FeedResult;

/// One way of listing a TikTok profile's videos
pub trait TiktokStrategy {
    /// Short label used in logs
    fn name(&self) -> &'static str;

    /// Collect normalized items; an empty list lets the next strategy run
    fn collect(&self, config: &Config) -> FeedResult<Vec<FeedItem>>;
}
