//! Page source trait and common types for chapter page providers.
//!
//! This module defines the interface the reader uses to resolve a chapter
//! into its ordered pages and the chapter that follows it.

mod mangadex;

pub use mangadex::{ChapterSummary, MangaDexSource, extract_chapter_id};

use crate::config::SourceConfig;
use crate::error::SourceError;
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;

/// A single displayable page within a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    /// Position in reading order (0-based).
    pub index: usize,

    /// Opaque asset locator.
    pub url: String,
}

/// Reference to another chapter, used to continue reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterReference {
    /// Chapter identifier understood by the source.
    pub id: String,

    /// Chapter number as displayed by the catalog, e.g. "12" or "10.5".
    pub display_number: Option<String>,

    /// Chapter title, if any.
    pub title: Option<String>,
}

/// Result of a successful chapter load.
#[derive(Debug, Clone, Default)]
pub struct LoadedChapter {
    /// Pages in reading order, index 0 first.
    pub pages: Vec<PageDescriptor>,

    /// The chapter that follows, if one could be resolved.
    pub next_chapter: Option<ChapterReference>,
}

impl LoadedChapter {
    /// Builds a chapter from asset URLs in reading order.
    pub fn from_urls<I, S>(urls: I, next_chapter: Option<ChapterReference>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| PageDescriptor {
                index,
                url: url.into(),
            })
            .collect();

        Self {
            pages,
            next_chapter,
        }
    }
}

/// Options passed to the source on every load.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Fallback translated-language filter for successor lookup.
    pub language: Option<String>,
}

/// Trait for chapter page providers.
///
/// Each implementation handles a specific catalog and resolves chapter
/// identifiers into ordered pages plus the next chapter in reading order.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns the human-readable name of this source.
    fn name(&self) -> &'static str;

    /// Loads the pages of a chapter and resolves its successor.
    ///
    /// Failing to resolve the successor is not an error; it yields
    /// `next_chapter: None`.
    async fn load_chapter(
        &self,
        chapter_id: &str,
        options: &LoadOptions,
    ) -> Result<LoadedChapter, SourceError>;
}

/// Common HTTP client configuration for sources.
pub fn create_http_client(config: &SourceConfig) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(concat!("yomikomi/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.request_timeout_sec))
        .build()
        .map_err(|e| SourceError::Unavailable(e.to_string()))
}

/// Applies rate limiting delay.
///
/// Delays that cannot be represented as a `Duration` are skipped.
pub async fn rate_limit(delay_sec: f64) {
    if delay_sec > 0.0
        && let Ok(delay) = Duration::try_from_secs_f64(delay_sec)
    {
        tokio::time::sleep(delay).await;
    }
}

/// Downloads a page asset and returns its size in bytes.
///
/// Used by front ends to confirm that the visible page finished loading.
pub async fn fetch_asset(client: &reqwest::Client, url: &str) -> Result<usize, SourceError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(SourceError::Unavailable(format!(
            "HTTP {} for {}",
            response.status(),
            url
        )));
    }

    let mut stream = response.bytes_stream();
    let mut total = 0;
    while let Some(chunk) = stream.next().await {
        total += chunk?.len();
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_urls_assigns_indices() {
        let chapter = LoadedChapter::from_urls(["a.png", "b.png", "c.png"], None);
        assert_eq!(chapter.pages.len(), 3);
        assert_eq!(chapter.pages[0].index, 0);
        assert_eq!(chapter.pages[2].index, 2);
        assert_eq!(chapter.pages[1].url, "b.png");
        assert!(chapter.next_chapter.is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_skips_unrepresentable_delay() {
        rate_limit(f64::INFINITY).await;
        rate_limit(f64::NAN).await;
        rate_limit(-2.0).await;
    }

    #[test]
    fn test_from_urls_empty() {
        let chapter = LoadedChapter::from_urls(Vec::<String>::new(), None);
        assert!(chapter.pages.is_empty());
    }
}
