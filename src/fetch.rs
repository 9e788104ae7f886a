//! reqwest-backed transport adapter for the extraction core.
//!
//! Implements [`ChapterFeed`] and the side-channel lookups against the
//! observed endpoint families: a proxy envelope endpoint tunneling paged
//! listing requests through a single POST, a windowed listing endpoint, a
//! reader endpoint for chapter bodies, and a glossary endpoint. Everything
//! here is wire plumbing; iteration and fallback logic live in
//! [`crate::paginate`] and [`crate::pipeline`].

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

use crate::extract::envelope::{self, Envelope};
use crate::extract::{content, ExtractError};
use crate::models::{Chapter, SerialId};
use crate::paginate::{ChapterFeed, ChapterPage, FeedCapabilities};
use crate::text::glossary::{self, GlossaryTerm};
use crate::utils::{transport_retry_config, with_retry, HttpClient, RetryConfig};

/// Proxy endpoint tunneling listing requests.
const PROXY_ENDPOINT: &str = "api/__api_party/api-v1";

/// Reader endpoint serving chapter bodies.
const READER_ENDPOINT: &str = "api/reader/get";

/// Request body for the proxy endpoint: a logical sub-path, a query
/// object, and a method.
#[derive(Debug, Serialize)]
struct ProxyRequest {
    path: String,
    query: Value,
    headers: Value,
    method: String,
}

impl ProxyRequest {
    fn chapter_listing(serial_id: &str, page: u32) -> Self {
        Self {
            path: format!("/chapter/all/{}", serial_id),
            query: json!({ "page": page }),
            headers: json!({ "content-type": "application/json" }),
            method: "get".to_string(),
        }
    }
}

/// HTTP adapter for one site of the supported family.
#[derive(Debug, Clone)]
pub struct ApiFeed {
    http: HttpClient,
    site: Url,
    retry: RetryConfig,
}

impl ApiFeed {
    /// Create an adapter rooted at the site's base URL.
    pub fn new(site: Url) -> Self {
        Self {
            http: HttpClient::new(),
            site,
            retry: transport_retry_config(),
        }
    }

    /// Use a pre-configured HTTP client.
    pub fn with_client(site: Url, http: HttpClient) -> Self {
        Self {
            http,
            site,
            retry: transport_retry_config(),
        }
    }

    /// Override the retry configuration.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Resolve a site-relative record path to an absolute URL.
    pub fn absolute_url(&self, path: &str) -> Result<Url, ExtractError> {
        self.site
            .join(path.trim_start_matches('/'))
            .map_err(|err| ExtractError::Parse(format!("invalid path {}: {}", path, err)))
    }

    /// Catalog listing URL for a page.
    pub fn catalog_url(&self, page: u32) -> Result<Url, ExtractError> {
        self.absolute_url(&format!("library?page={}", page))
    }

    /// Search listing URL for a term and page.
    pub fn search_url(&self, term: &str, page: u32) -> Result<Url, ExtractError> {
        self.absolute_url(&format!(
            "library?query={}&page={}&sort=views-all",
            urlencoding::encode(term),
            page
        ))
    }

    async fn get_json(&self, url: Url) -> Result<Value, ExtractError> {
        let http = self.http.clone();

        with_retry(self.retry, || {
            let http = http.clone();
            let url = url.clone();
            async move {
                let response = http
                    .get(url.as_str())
                    .header("Accept", "application/json")
                    .send()
                    .await
                    .map_err(|err| ExtractError::Network(err.to_string()))?;

                if !response.status().is_success() {
                    return Err(ExtractError::Api(format!(
                        "{} returned status {}",
                        url,
                        response.status()
                    )));
                }

                response
                    .json::<Value>()
                    .await
                    .map_err(|err| ExtractError::Parse(format!("response body: {}", err)))
            }
        })
        .await
    }

    async fn post_json(&self, url: Url, body: Value) -> Result<Value, ExtractError> {
        let http = self.http.clone();

        with_retry(self.retry, || {
            let http = http.clone();
            let url = url.clone();
            let body = body.clone();
            async move {
                let response = http
                    .post(url.as_str())
                    .json(&body)
                    .send()
                    .await
                    .map_err(|err| ExtractError::Network(err.to_string()))?;

                if !response.status().is_success() {
                    return Err(ExtractError::Api(format!(
                        "{} returned status {}",
                        url,
                        response.status()
                    )));
                }

                response
                    .json::<Value>()
                    .await
                    .map_err(|err| ExtractError::Parse(format!("response body: {}", err)))
            }
        })
        .await
    }

    /// Fetch a chapter body through the reader endpoint and post-process it.
    ///
    /// The chapter path must embed the serial reference. Glossary terms are
    /// resolved through the side channel; a failed lookup leaves the
    /// placeholders unresolved rather than failing the chapter.
    pub async fn chapter_text(&self, chapter_path: &str) -> Result<String, ExtractError> {
        let (serial_id, chapter_no) = parse_chapter_ref(chapter_path).ok_or_else(|| {
            ExtractError::Parse(format!("path {} carries no chapter reference", chapter_path))
        })?;

        let url = self.absolute_url(READER_ENDPOINT)?;
        let request = json!({
            "translate": "ai",
            "language": "en",
            "raw_id": serial_id.parse::<u64>().unwrap_or_default(),
            "chapter_no": chapter_no,
            "retry": false,
            "force_retry": false,
        });

        let payload = self.post_json(url, request).await?;
        let reader = match envelope::classify(payload)? {
            Envelope::Reader(reader) => reader,
            other => {
                return Err(ExtractError::Parse(format!(
                    "reader endpoint answered with a different envelope: {:?}",
                    other
                )));
            }
        };

        if !reader.success {
            let reason = reader.error.unwrap_or_else(|| "reader endpoint reported failure".to_string());
            return Err(ExtractError::Api(reason));
        }
        let Some(paragraphs) = reader.body() else {
            return Err(ExtractError::EmptyContent);
        };

        let body = content::from_paragraphs(paragraphs)?;

        match self.glossary_terms(&serial_id).await {
            Ok(terms) => Ok(glossary::substitute(&body, &terms)),
            Err(err) => {
                tracing::warn!("glossary resolution failed for serial {}: {}", serial_id, err);
                Ok(body)
            }
        }
    }

    /// Fetch the side-channel glossary for a serial.
    pub async fn glossary_terms(&self, serial_id: &str) -> Result<Vec<GlossaryTerm>, ExtractError> {
        let url = self.absolute_url(&format!("api/reader/terms/{}.json", serial_id))?;
        let payload = self.get_json(url).await?;

        let glossary_payload = match envelope::classify(payload)? {
            Envelope::Glossary(payload) => payload,
            _ => {
                return Err(ExtractError::Glossary(
                    "glossary endpoint answered with a different envelope".to_string(),
                ));
            }
        };

        if !glossary_payload.success {
            return Err(ExtractError::Glossary("glossary endpoint reported failure".to_string()));
        }
        let Some(raw_terms) = glossary_payload.terms() else {
            return Err(ExtractError::Glossary("glossary payload carried no terms".to_string()));
        };

        glossary::parse_terms(raw_terms)
    }
}

#[async_trait]
impl ChapterFeed for ApiFeed {
    fn capabilities(&self) -> FeedCapabilities {
        FeedCapabilities::PAGED | FeedCapabilities::WINDOWED
    }

    async fn fetch_page(&self, serial: &SerialId, page: u32) -> Result<ChapterPage, ExtractError> {
        let url = self.absolute_url(PROXY_ENDPOINT)?;
        let request = serde_json::to_value(ProxyRequest::chapter_listing(&serial.id, page))?;

        let payload = self.post_json(url, request).await?;
        let proxy = match envelope::classify(payload)? {
            Envelope::Proxy(proxy) => proxy,
            _ => {
                return Err(ExtractError::Parse(
                    "proxy endpoint answered with a different envelope".to_string(),
                ));
            }
        };

        if !proxy.success {
            return Err(ExtractError::Api(format!("listing request failed for page {}", page)));
        }

        let last_page = proxy.last_page();
        let base = serial.path.trim_matches('/');
        let chapters = proxy
            .data
            .into_iter()
            .map(|chapter| Chapter {
                name: chapter.title,
                path: format!("{}/{}", base, chapter.slug),
                release_time: chapter.created_at.as_deref().and_then(envelope::parse_timestamp),
                chapter_number: None,
            })
            .collect();

        Ok(ChapterPage { chapters, last_page })
    }

    async fn fetch_window(
        &self,
        serial: &SerialId,
        start: u32,
        end: u32,
    ) -> Result<Vec<Chapter>, ExtractError> {
        let mut url = self.absolute_url(&format!("api/chapters/{}", serial.id))?;
        url.query_pairs_mut()
            .append_pair("start", &start.to_string())
            .append_pair("end", &end.to_string());

        let payload = self.get_json(url).await?;
        let listing = match envelope::classify(payload)? {
            Envelope::Windowed(listing) => listing,
            _ => {
                return Err(ExtractError::Parse(
                    "listing endpoint answered with a different envelope".to_string(),
                ));
            }
        };

        let base = serial.path.trim_matches('/');
        Ok(listing
            .chapters
            .into_iter()
            .map(|chapter| Chapter {
                name: chapter.title,
                path: format!("{}/chapter-{}", base, chapter.order),
                release_time: chapter.updated_at.as_deref().and_then(envelope::parse_timestamp),
                chapter_number: Some(chapter.order),
            })
            .collect())
    }
}

/// Pull the serial id and chapter ordinal out of a chapter path of the
/// form `…serie-<id>/<slug>/chapter-<n>`.
pub fn parse_chapter_ref(path: &str) -> Option<(String, u32)> {
    let pattern = Regex::new(r"serie-(\d+)/[^/]+/chapter-(\d+)").ok()?;
    let captures = pattern.captures(path)?;
    let serial_id = captures.get(1)?.as_str().to_string();
    let chapter_no = captures.get(2)?.as_str().parse().ok()?;
    Some((serial_id, chapter_no))
}
