pub mod fields;
pub mod instagram;
pub mod tiktok;
pub mod tiktok_extractor;
pub mod tiktok_html;
pub mod traits;

pub use instagram::InstagramSource;
pub use tiktok::{TiktokCollector, TiktokVideo};
pub use traits::TiktokStrategy;
