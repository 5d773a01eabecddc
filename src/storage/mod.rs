pub mod cover_cache;
pub mod json_file;
pub mod traits;

pub use cover_cache::{cover_file_name, CoverCache};
pub use json_file::JsonFileStore;
pub use traits::PayloadStore;
