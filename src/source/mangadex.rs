//! MangaDex (api.mangadex.org) page source implementation.
//!
//! Pages come from the at-home server manifest; the next chapter is found
//! with a numeric successor lookup in the same manga and language.

use super::{
    ChapterReference, LoadOptions, LoadedChapter, PageDescriptor, PageSource, create_http_client,
    rate_limit,
};
use crate::config::{ChapterOrder, SourceConfig};
use crate::error::SourceError;
use async_trait::async_trait;
use log::debug;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::sync::LazyLock;
use url::Url;

/// Regex for chapter reader URLs on the MangaDex site.
static CHAPTER_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?mangadex\.org/chapter/([0-9A-Za-z-]+)(?:/\d+)?/?$").unwrap()
});

/// Regex for bare identifiers that are safe to place in a path segment.
static BARE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z][0-9A-Za-z-]*$").unwrap());

/// Chapter numbers closer than this are considered equal.
const NUMBER_EPSILON: f64 = 1e-6;

/// Maximum candidates fetched when looking for a successor.
const SUCCESSOR_CANDIDATES: &str = "10";

/// Page size for chapter listings.
const LISTING_LIMIT: &str = "100";

/// At-home server manifest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AtHomeResponse {
    base_url: String,
    chapter: AtHomeChapter,
}

/// File listing for a chapter on the at-home server.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AtHomeChapter {
    hash: String,
    #[serde(default)]
    data: Vec<String>,
    #[serde(default)]
    data_saver: Vec<String>,
}

/// Single-entity response wrapper.
#[derive(Debug, Deserialize)]
struct EntityResponse<T> {
    data: T,
}

/// Collection response wrapper.
#[derive(Debug, Deserialize)]
struct CollectionResponse<T> {
    data: Vec<T>,
}

/// Chapter entity.
#[derive(Debug, Clone, Deserialize)]
struct ChapterRecord {
    id: String,
    attributes: ChapterAttributes,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterAttributes {
    #[serde(default)]
    volume: Option<String>,
    #[serde(default)]
    chapter: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    translated_language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Relationship {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: Option<RelationshipAttributes>,
}

#[derive(Debug, Clone, Deserialize)]
struct RelationshipAttributes {
    #[serde(default)]
    name: Option<String>,
}

impl ChapterRecord {
    /// Numeric chapter value, if the chapter has one.
    fn number(&self) -> Option<f64> {
        self.attributes
            .chapter
            .as_deref()
            .and_then(|n| n.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
    }

    /// Id of the manga this chapter belongs to.
    fn manga_id(&self) -> Option<&str> {
        self.related("manga").map(|rel| rel.id.as_str())
    }

    fn related(&self, kind: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|rel| rel.kind == kind)
    }

    fn to_reference(&self) -> ChapterReference {
        ChapterReference {
            id: self.id.clone(),
            display_number: self.attributes.chapter.clone(),
            title: self.attributes.title.clone(),
        }
    }
}

/// A chapter entry in a manga's chapter listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSummary {
    pub id: String,
    pub number: Option<String>,
    pub volume: Option<String>,
    pub title: Option<String>,
    pub language: Option<String>,
    /// Name of the scanlation group, when included in the response.
    pub group: Option<String>,
}

impl From<ChapterRecord> for ChapterSummary {
    fn from(record: ChapterRecord) -> Self {
        let group = record
            .related("scanlation_group")
            .and_then(|rel| rel.attributes.as_ref())
            .and_then(|attrs| attrs.name.clone());

        Self {
            id: record.id,
            number: record.attributes.chapter,
            volume: record.attributes.volume,
            title: record.attributes.title,
            language: record.attributes.translated_language,
            group,
        }
    }
}

/// Extracts a chapter id from a bare id or a MangaDex chapter URL.
pub fn extract_chapter_id(input: &str) -> Option<String> {
    let input = input.trim();

    if let Some(caps) = CHAPTER_URL_REGEX.captures(input) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    BARE_ID_REGEX
        .is_match(input)
        .then(|| input.to_string())
}

/// Formats a chapter number the way the catalog stores it ("12", "10.5").
fn format_chapter_number(number: f64) -> String {
    format!("{}", number)
}

/// Picks the successor among candidate chapters.
///
/// The lowest-numbered candidate strictly after `current` wins; equal
/// numbers are ordered by id so the choice is deterministic.
fn pick_successor(current: f64, candidates: &[ChapterRecord]) -> Option<ChapterReference> {
    candidates
        .iter()
        .filter_map(|record| record.number().map(|n| (n, record)))
        .filter(|(n, _)| *n > current + NUMBER_EPSILON)
        .min_by(|(a, ra), (b, rb)| {
            a.partial_cmp(b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| ra.id.cmp(&rb.id))
        })
        .map(|(_, record)| record.to_reference())
}

/// Maps a non-success HTTP status to the matching failure.
///
/// 404 and 400 mean the id does not name a chapter; anything else that is
/// not a success means the catalog could not serve the request.
fn classify_status(status: StatusCode, what: &str) -> Option<SourceError> {
    if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
        return Some(SourceError::ChapterNotFound(format!(
            "{}: HTTP {}",
            what, status
        )));
    }

    if !status.is_success() {
        return Some(SourceError::Unavailable(format!("{}: HTTP {}", what, status)));
    }

    None
}

fn decode_body<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::Malformed(format!("{}: {}", what, e)))
}

/// Joins the page listing with the successor lookup.
///
/// A failed lookup only costs the chapter its `next_chapter`.
fn combine_load(
    chapter_id: &str,
    pages: Result<Vec<PageDescriptor>, SourceError>,
    next_chapter: Result<Option<ChapterReference>, SourceError>,
) -> Result<LoadedChapter, SourceError> {
    let pages = pages?;
    let next_chapter = next_chapter.unwrap_or_else(|err| {
        debug!("Next chapter lookup for {} failed: {}", chapter_id, err);
        None
    });

    Ok(LoadedChapter {
        pages,
        next_chapter,
    })
}

/// MangaDex page source.
pub struct MangaDexSource {
    client: reqwest::Client,
    config: SourceConfig,
}

impl MangaDexSource {
    /// Creates a new MangaDex source with the given configuration.
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let client = create_http_client(&config)?;
        Ok(Self { client, config })
    }

    /// Returns the HTTP client, for fetching page assets.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Builds an API URL from path segments and query parameters.
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, SourceError> {
        let base = self.config.api_url.trim_end_matches('/');
        Url::parse_with_params(&format!("{}/{}", base, path), params)
            .map_err(|e| SourceError::Unavailable(format!("invalid API URL: {}", e)))
    }

    /// Fetches a URL and decodes its JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, SourceError> {
        rate_limit(self.config.delay_between_requests_sec).await;
        debug!("GET {} ({})", url, what);

        let response = self.client.get(url).send().await?;
        if let Some(err) = classify_status(response.status(), what) {
            return Err(err);
        }

        let body = response.text().await?;
        decode_body(&body, what)
    }

    /// Resolves the ordered page URLs of a chapter.
    async fn fetch_pages(&self, chapter_id: &str) -> Result<Vec<PageDescriptor>, SourceError> {
        let url = self.endpoint(&format!("at-home/server/{}", chapter_id), &[])?;
        let manifest: AtHomeResponse = self.get_json(url, "page manifest").await?;
        Ok(self.page_descriptors(manifest))
    }

    fn page_descriptors(&self, manifest: AtHomeResponse) -> Vec<PageDescriptor> {
        let AtHomeResponse { base_url, chapter } = manifest;
        let (quality, files) = if self.config.data_saver && !chapter.data_saver.is_empty() {
            ("data-saver", chapter.data_saver)
        } else {
            ("data", chapter.data)
        };
        let base = base_url.trim_end_matches('/');

        files
            .into_iter()
            .enumerate()
            .map(|(index, file)| PageDescriptor {
                index,
                url: format!("{}/{}/{}/{}", base, quality, chapter.hash, file),
            })
            .collect()
    }

    /// Fetches a chapter's metadata.
    async fn fetch_chapter(&self, chapter_id: &str) -> Result<ChapterRecord, SourceError> {
        let url = self.endpoint(&format!("chapter/{}", chapter_id), &[])?;
        let response: EntityResponse<ChapterRecord> =
            self.get_json(url, "chapter metadata").await?;
        Ok(response.data)
    }

    /// Looks up chapter N+1 in the same manga and language.
    async fn resolve_next_chapter(
        &self,
        chapter_id: &str,
        options: &LoadOptions,
    ) -> Result<Option<ChapterReference>, SourceError> {
        let current = self.fetch_chapter(chapter_id).await?;

        let manga_id = current
            .manga_id()
            .ok_or_else(|| SourceError::Malformed("chapter has no manga relationship".into()))?;

        let Some(number) = current.number() else {
            debug!("Chapter {} has no numeric value; no successor", chapter_id);
            return Ok(None);
        };

        let target = format_chapter_number(number + 1.0);
        let language = current
            .attributes
            .translated_language
            .as_deref()
            .or(options.language.as_deref());

        let mut params = vec![
            ("manga", manga_id),
            ("chapter[]", target.as_str()),
            ("order[chapter]", "asc"),
            ("offset", "0"),
            ("limit", SUCCESSOR_CANDIDATES),
        ];
        if let Some(lang) = language {
            params.push(("translatedLanguage[]", lang));
        }

        let url = self.endpoint("chapter", &params)?;
        let candidates: CollectionResponse<ChapterRecord> =
            self.get_json(url, "successor lookup").await?;

        Ok(pick_successor(number, &candidates.data))
    }

    /// Lists the chapters of a manga.
    pub async fn list_chapters(
        &self,
        manga_id: &str,
        language: Option<&str>,
        order: ChapterOrder,
    ) -> Result<Vec<ChapterSummary>, SourceError> {
        let mut params = vec![
            ("manga", manga_id),
            ("limit", LISTING_LIMIT),
            ("order[chapter]", order.as_str()),
            ("includes[]", "scanlation_group"),
        ];
        if let Some(lang) = language {
            params.push(("translatedLanguage[]", lang));
        }

        let url = self.endpoint("chapter", &params)?;
        let response: CollectionResponse<ChapterRecord> =
            self.get_json(url, "chapter listing").await?;

        Ok(response.data.into_iter().map(ChapterSummary::from).collect())
    }
}

#[async_trait]
impl PageSource for MangaDexSource {
    fn name(&self) -> &'static str {
        "MangaDex"
    }

    async fn load_chapter(
        &self,
        chapter_id: &str,
        options: &LoadOptions,
    ) -> Result<LoadedChapter, SourceError> {
        let id = extract_chapter_id(chapter_id)
            .ok_or_else(|| SourceError::ChapterNotFound(format!("invalid id '{}'", chapter_id)))?;

        let (pages, next_chapter) = futures::join!(
            self.fetch_pages(&id),
            self.resolve_next_chapter(&id, options)
        );

        combine_load(&id, pages, next_chapter)
    }
}
