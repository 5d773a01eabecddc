pub mod merge;
pub mod refresh_service;

pub use merge::merge_items;
pub use refresh_service::{InstagramOutcome, RefreshService, RefreshSummary};
