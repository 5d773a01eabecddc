pub mod feed_item;
pub mod payload;
pub mod text;

pub use feed_item::{FeedItem, Platform};
pub use payload::FeedPayload;
