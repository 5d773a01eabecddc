use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{FeedError, FeedResult, FetchFailure};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Copy buffer for image downloads
const CHUNK_SIZE: usize = 10240;

/// Extra request headers as (name, value) pairs
pub type Headers<'a> = [(&'a str, &'a str)];

/// Blocking client shared by every collector during a run.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    /// GET that only accepts HTTP 200
    fn get(&self, url: &str, headers: &Headers) -> Result<Response, FetchFailure> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().map_err(|e| {
            debug!(url, error = %e, "request failed");
            FetchFailure::from_reqwest(&e)
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(url, status = status.as_u16(), "unexpected status");
            return Err(FetchFailure::Status(status.as_u16()));
        }

        Ok(response)
    }

    /// Fetch and parse a JSON body, reporting why it failed
    pub fn fetch_page(&self, url: &str, headers: &Headers) -> Result<Value, FetchFailure> {
        let response = self.get(url, headers)?;
        let bytes = response.bytes().map_err(|e| FetchFailure::from_reqwest(&e))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            debug!(url, error = %e, "response is not JSON");
            FetchFailure::Json
        })
    }

    /// Fetch and parse a JSON body, `None` on any failure
    pub fn fetch_json(&self, url: &str, headers: &Headers) -> Option<Value> {
        self.fetch_page(url, headers).ok()
    }

    pub fn fetch_text(&self, url: &str, headers: &Headers) -> Result<String, FetchFailure> {
        let response = self.get(url, headers)?;
        response.text().map_err(|e| FetchFailure::from_reqwest(&e))
    }

    /// Stream an image to `dest`.
    ///
    /// Returns false on transport errors, non-200 responses, or a content type
    /// that is not an image. A failed copy may leave a partial file behind;
    /// removing it is up to the caller.
    pub fn download_image(&self, url: &str, dest: &Path, headers: &Headers) -> bool {
        match self.copy_image(url, dest, headers) {
            Ok(bytes) => {
                debug!(url, bytes, dest = %dest.display(), "downloaded image");
                true
            }
            Err(e) => {
                warn!(url, error = %e, "image download failed");
                false
            }
        }
    }

    fn copy_image(&self, url: &str, dest: &Path, headers: &Headers) -> FeedResult<usize> {
        let mut response = self.get(url, headers)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("image") {
            return Err(FeedError::UnexpectedContentType(content_type));
        }

        let mut file = File::create(dest)?;
        let mut buffer = [0u8; CHUNK_SIZE];
        let mut total = 0;
        loop {
            let read = response.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])?;
            total += read;
        }
        file.flush()?;

        Ok(total)
    }
}
