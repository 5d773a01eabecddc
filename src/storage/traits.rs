use crate::domain::FeedPayload;
use crate::errors::FeedResult;

#[cfg_attr(test, mockall::automock)]
pub trait PayloadStore {
    /// Previously written payload; never fails, unreadable state is empty
    fn load(&self) -> FeedPayload;
    fn save(&self, payload: &FeedPayload) -> FeedResult<()>;
}
