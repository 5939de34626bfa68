//! Provider clients that turn an identity into a portrait image URL.
//!
//! Three sources are supported: the Wikipedia REST summary endpoint, the Baidu
//! Baike lemma card API, and plain HTML scraping of any page that carries an
//! `og:image` or `image_src` tag.

use log::debug;
use serde_json::Value;

use crate::error::ResolutionError;
use crate::http_client::{request_url_with_params, HttpClient, HttpResponse};
use crate::page_image::{extract_page_image, PageImageScan};
use crate::source_url::{ensure_https, host_of, wikipedia_article_url, wikipedia_summary_url};

const WIKIPEDIA_NOT_FOUND_TYPE: &str = "https://mediawiki.org/wiki/HyperSwitch/errors/not_found";
const BAIKE_CARD_API_URL: &str = "https://baike.baidu.com/api/openapi/BaikeLemmaCardApi";
const BAIKE_ITEM_BASE_URL: &str = "https://baike.baidu.com/item/";
const BAIKE_HOST_MARKER: &str = "baike.baidu.com";
pub const BAIKE_SOURCE_NAME: &str = "Baidu Baike";

/// Successful resolution: where the image lives and which page vouched for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub image_url: String,
    pub source_page_url: String,
    pub provider: String,
}

fn json_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn parse_json(response: &HttpResponse, subject: &str) -> Result<Value, ResolutionError> {
    response
        .json()
        .map_err(|error| ResolutionError::InvalidPayload {
            subject: subject.to_string(),
            message: error.to_string(),
        })
}

pub fn wikipedia_provider_label(lang: &str) -> String {
    format!("{} Wikipedia", lang.to_uppercase())
}

pub fn generic_page_provider_label(page_url: &str) -> String {
    match host_of(page_url) {
        Some(host) if host.contains(BAIKE_HOST_MARKER) => BAIKE_SOURCE_NAME.to_string(),
        Some(host) => host,
        None => page_url.to_string(),
    }
}

pub fn baike_card_url(name: &str) -> String {
    request_url_with_params(
        BAIKE_CARD_API_URL,
        &[
            ("scope", "103"),
            ("format", "json"),
            ("appid", "379020"),
            ("bk_key", name),
            ("bk_length", "600"),
        ],
    )
}

/// Stateless provider clients over one shared HTTP capability.
pub struct SourceProviders<'a> {
    http: &'a dyn HttpClient,
}

impl<'a> SourceProviders<'a> {
    pub fn new(http: &'a dyn HttpClient) -> Self {
        Self { http }
    }

    fn fetch_wikipedia_payload(&self, lang: &str, title: &str) -> Result<Value, ResolutionError> {
        let response = self.http.get(&wikipedia_summary_url(lang, title))?;
        if !response.is_ok() {
            return Err(ResolutionError::SummaryStatus {
                title: title.to_string(),
                status: response.status,
            });
        }
        let data = parse_json(&response, "Wikipedia summary")?;
        if data["type"].as_str() == Some(WIKIPEDIA_NOT_FOUND_TYPE) {
            return Err(ResolutionError::NotFound);
        }
        Ok(data)
    }

    /// Image from a Wikipedia summary, falling back to the article's `og:image`.
    pub fn wikipedia_summary(
        &self,
        lang: &str,
        title: &str,
    ) -> Result<ResolvedSource, ResolutionError> {
        let data = self.fetch_wikipedia_payload(lang, title)?;
        let image = json_string(&data["originalimage"]["source"])
            .or_else(|| json_string(&data["thumbnail"]["source"]));
        let page_url = json_string(&data["content_urls"]["desktop"]["page"])
            .or_else(|| json_string(&data["content_urls"]["mobile"]["page"]))
            .unwrap_or_else(|| wikipedia_article_url(lang, title));
        let provider = wikipedia_provider_label(lang);

        if let Some(image) = image {
            return Ok(ResolvedSource {
                image_url: ensure_https(&image),
                source_page_url: page_url,
                provider,
            });
        }

        debug!(
            "Wikipedia summary for '{}' has no image fields, scanning article HTML",
            title
        );
        match self.fetch_wikipedia_page_image(&page_url) {
            Some(image_url) => Ok(ResolvedSource {
                image_url,
                source_page_url: page_url,
                provider,
            }),
            None => Err(ResolutionError::missing_image(
                "Wikipedia summary missing images",
            )),
        }
    }

    fn fetch_wikipedia_page_image(&self, page_url: &str) -> Option<String> {
        let response = match self.http.get(page_url) {
            Ok(response) => response,
            Err(error) => {
                debug!("Wikipedia article fetch failed: {}", error);
                return None;
            }
        };
        if !response.is_ok() {
            return None;
        }
        extract_page_image(&response.text(), PageImageScan::OpenGraph)
    }

    /// Scrapes `og:image` / `image_src` from an arbitrary page.
    pub fn generic_page(&self, page_url: &str) -> Result<ResolvedSource, ResolutionError> {
        let response = self.http.get(page_url)?;
        if !response.is_ok() {
            return Err(ResolutionError::http_status("Fallback page", response.status));
        }
        let image_url = extract_page_image(&response.text(), PageImageScan::OpenGraphOrImageSrc)
            .ok_or_else(|| ResolutionError::missing_image("Fallback page missing og:image"))?;
        Ok(ResolvedSource {
            image_url,
            source_page_url: page_url.to_string(),
            provider: generic_page_provider_label(page_url),
        })
    }

    /// Baidu Baike lemma card lookup by display name.
    pub fn baike_api(&self, name: &str) -> Result<ResolvedSource, ResolutionError> {
        let response = self.http.get(&baike_card_url(name))?;
        if !response.is_ok() {
            return Err(ResolutionError::http_status("Baidu Baike API", response.status));
        }
        let data = parse_json(&response, "Baidu Baike API")?;

        let Some(page_url) = json_string(&data["url"]).or_else(|| json_string(&data["wapUrl"]))
        else {
            let guessed = format!("{}{}", BAIKE_ITEM_BASE_URL, urlencoding::encode(name));
            debug!("Baidu Baike card for '{}' has no page url, guessing {}", name, guessed);
            return self.generic_page(&guessed);
        };
        let page_url = ensure_https(&page_url);

        match json_string(&data["image"]) {
            Some(image) => Ok(ResolvedSource {
                image_url: ensure_https(&image),
                source_page_url: page_url,
                provider: BAIKE_SOURCE_NAME.to_string(),
            }),
            None => self.generic_page(&page_url),
        }
    }
}
