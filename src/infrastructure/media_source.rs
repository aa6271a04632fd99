// src/infrastructure/media_source.rs
//
// Remote media access.
//
// RULES:
// - Sources only hand out bytes; where they land is the downloader's concern
// - `content_length` may be unknown; callers must cope

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// An open response body read chunk by chunk
#[async_trait]
pub trait MediaBody: Send {
    fn content_length(&self) -> Option<u64>;

    /// Next chunk, or `None` at the end of the body
    async fn next_chunk(&mut self) -> AppResult<Option<Vec<u8>>>;
}

#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn open(&self, url: &str) -> AppResult<Box<dyn MediaBody>>;
}

// ============================================================================
// HTTP
// ============================================================================

pub struct HttpMediaSource {
    http_client: Client,
}

impl HttpMediaSource {
    pub fn new(connect_timeout: Duration) -> AppResult<Self> {
        let http_client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("artgallery/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http_client })
    }
}

struct HttpBody {
    response: reqwest::Response,
}

#[async_trait]
impl MediaBody for HttpBody {
    fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    async fn next_chunk(&mut self) -> AppResult<Option<Vec<u8>>> {
        let chunk = self.response.chunk().await?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

#[async_trait]
impl MediaSource for HttpMediaSource {
    async fn open(&self, url: &str) -> AppResult<Box<dyn MediaBody>> {
        log::debug!("GET {}", url);
        let response = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?;
        Ok(Box::new(HttpBody { response }))
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Serves fixed byte blobs by URL, in small chunks. Unknown URLs fail.
#[derive(Default)]
pub struct InMemoryMediaSource {
    blobs: HashMap<String, Vec<u8>>,
    chunk_size: usize,
    /// URLs whose body fails after the first chunk
    broken: Vec<String>,
}

impl InMemoryMediaSource {
    pub fn new() -> Self {
        Self {
            blobs: HashMap::new(),
            chunk_size: 4,
            broken: Vec::new(),
        }
    }

    pub fn with_blob(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.blobs.insert(url.into(), bytes.into());
        self
    }

    pub fn with_broken_blob(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let url = url.into();
        self.broken.push(url.clone());
        self.blobs.insert(url, bytes.into());
        self
    }
}

struct MemoryBody {
    remaining: Vec<Vec<u8>>,
    total: u64,
    fail_after_first: bool,
    served: usize,
}

#[async_trait]
impl MediaBody for MemoryBody {
    fn content_length(&self) -> Option<u64> {
        Some(self.total)
    }

    async fn next_chunk(&mut self) -> AppResult<Option<Vec<u8>>> {
        if self.fail_after_first && self.served >= 1 {
            return Err(AppError::Other("Connection reset".to_string()));
        }
        if self.remaining.is_empty() {
            return Ok(None);
        }
        self.served += 1;
        Ok(Some(self.remaining.remove(0)))
    }
}

#[async_trait]
impl MediaSource for InMemoryMediaSource {
    async fn open(&self, url: &str) -> AppResult<Box<dyn MediaBody>> {
        let bytes = self
            .blobs
            .get(url)
            .ok_or_else(|| AppError::Other(format!("No media at {}", url)))?;
        let chunk_size = self.chunk_size.max(1);
        Ok(Box::new(MemoryBody {
            remaining: bytes.chunks(chunk_size).map(|c| c.to_vec()).collect(),
            total: bytes.len() as u64,
            fail_after_first: self.broken.iter().any(|b| b == url),
            served: 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_source_serves_chunks() {
        let source = InMemoryMediaSource::new().with_blob("mem://a", b"0123456789".to_vec());
        let mut body = source.open("mem://a").await.unwrap();
        assert_eq!(body.content_length(), Some(10));

        let mut collected = Vec::new();
        while let Some(chunk) = body.next_chunk().await.unwrap() {
            collected.extend(chunk);
        }
        assert_eq!(collected, b"0123456789");
        assert!(source.open("mem://missing").await.is_err());
    }
}
