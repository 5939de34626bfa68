//! Open Graph / `image_src` lookup in raw page HTML.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::source_url::ensure_https;

static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[property][content]").expect("meta selector is valid"));

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel][href]").expect("link selector is valid"));

/// Which tags a page scan may fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageImageScan {
    OpenGraph,
    OpenGraphOrImageSrc,
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn open_graph_image(document: &Html) -> Option<String> {
    document.select(&META_SELECTOR).find_map(|element| {
        let meta = element.value();
        let is_og_image = meta
            .attr("property")
            .is_some_and(|property| property.trim().eq_ignore_ascii_case("og:image"));
        if !is_og_image {
            return None;
        }
        meta.attr("content").and_then(non_empty).map(str::to_string)
    })
}

fn image_src_link(document: &Html) -> Option<String> {
    document.select(&LINK_SELECTOR).find_map(|element| {
        let link = element.value();
        let is_image_src = link.attr("rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("image_src"))
        });
        if !is_image_src {
            return None;
        }
        link.attr("href").and_then(non_empty).map(str::to_string)
    })
}

/// First image URL found in `html`, https-normalized.
///
/// Any `og:image` meta tag beats an `image_src` link, wherever they sit in the
/// document. Attribute values come back entity-decoded.
pub fn extract_page_image(html: &str, scan: PageImageScan) -> Option<String> {
    let document = Html::parse_document(html);
    let found = match scan {
        PageImageScan::OpenGraph => open_graph_image(&document),
        PageImageScan::OpenGraphOrImageSrc => {
            open_graph_image(&document).or_else(|| image_src_link(&document))
        }
    };
    found.map(|url| ensure_https(&url))
}
