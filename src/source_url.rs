//! URL helpers for image sources, Wikipedia article links and asset filenames.

use std::path::Path;

use url::Url;

use crate::people_page::WikiIdentity;

const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
const DEFAULT_IMAGE_EXTENSION: &str = ".jpg";
const UNSAFE_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Rewrites scheme-relative and plain-http URLs to https.
pub fn ensure_https(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        return format!("https://{rest}");
    }
    if let Some(rest) = url.strip_prefix("http://") {
        return format!("https://{rest}");
    }
    url.to_string()
}

/// Host of `url`, or `None` when it does not parse as an absolute URL.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

pub fn wikipedia_summary_url(lang: &str, title: &str) -> String {
    format!(
        "https://{}.wikipedia.org/api/rest_v1/page/summary/{}",
        lang,
        urlencoding::encode(title)
    )
}

pub fn wikipedia_article_url(lang: &str, title: &str) -> String {
    format!(
        "https://{}.wikipedia.org/wiki/{}",
        lang,
        urlencoding::encode(title)
    )
}

/// Reads `(lang, title)` back out of a Wikipedia article link.
///
/// Returns `None` for non-Wikipedia hosts. The language is the first host
/// label; the title is the percent-decoded last path segment, or
/// `default_title` when that segment is empty.
pub fn wikipedia_identity_from_url(url: &str, default_title: &str) -> Option<WikiIdentity> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if !host.contains("wikipedia.org") {
        return None;
    }
    let lang = host.split('.').next().unwrap_or_default().to_string();
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let title = match urlencoding::decode(segment) {
        Ok(decoded) if !decoded.is_empty() => decoded.into_owned(),
        Ok(_) => default_title.to_string(),
        Err(_) if !segment.is_empty() => segment.to_string(),
        Err(_) => default_title.to_string(),
    };
    Some(WikiIdentity { lang, title })
}

/// File extension (with the dot) to store an image under, derived from its URL path.
pub fn extension_for_image_url(image_url: &str) -> String {
    let path = match Url::parse(image_url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => image_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let Some(extension) = Path::new(&path)
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
    else {
        return DEFAULT_IMAGE_EXTENSION.to_string();
    };
    if !SUPPORTED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return DEFAULT_IMAGE_EXTENSION.to_string();
    }
    if extension == "jpeg" {
        return DEFAULT_IMAGE_EXTENSION.to_string();
    }
    format!(".{extension}")
}

/// Drops filesystem-unsafe characters and spaces from `name`, then appends `extension`.
pub fn sanitize_filename(name: &str, extension: &str) -> String {
    let mut safe: String = name
        .chars()
        .filter(|ch| !UNSAFE_FILENAME_CHARS.contains(ch) && *ch != ' ')
        .collect();
    safe.push_str(extension);
    safe
}

#[cfg(test)]
mod tests {
    use super::{
        ensure_https, extension_for_image_url, host_of, sanitize_filename,
        wikipedia_article_url, wikipedia_identity_from_url, wikipedia_summary_url,
    };

    #[test]
    fn test_ensure_https_prefixes_scheme_relative_urls() {
        assert_eq!(ensure_https("//x.com/a.jpg"), "https://x.com/a.jpg");
    }

    #[test]
    fn test_ensure_https_upgrades_plain_http() {
        assert_eq!(ensure_https("http://x.com/a.jpg"), "https://x.com/a.jpg");
    }

    #[test]
    fn test_ensure_https_keeps_https_and_relative_paths() {
        assert_eq!(ensure_https("https://x.com/a.jpg"), "https://x.com/a.jpg");
        assert_eq!(ensure_https("/local/a.jpg"), "/local/a.jpg");
    }

    #[test]
    fn test_sanitize_filename_strips_unsafe_characters() {
        assert_eq!(sanitize_filename("A/B:C", ".png"), "ABC.png");
        assert_eq!(sanitize_filename("Lee Jeno", ".jpg"), "LeeJeno.jpg");
        assert_eq!(sanitize_filename("周柯宇", ".jpg"), "周柯宇.jpg");
    }

    #[test]
    fn test_extension_for_image_url_normalizes_known_extensions() {
        assert_eq!(
            extension_for_image_url("https://upload.test/a/Photo.JPEG"),
            ".jpg"
        );
        assert_eq!(extension_for_image_url("https://upload.test/a/b.png?w=300"), ".png");
        assert_eq!(extension_for_image_url("https://upload.test/a/b.webp"), ".webp");
    }

    #[test]
    fn test_extension_for_image_url_defaults_to_jpg() {
        assert_eq!(extension_for_image_url("https://upload.test/a/b.svg"), ".jpg");
        assert_eq!(extension_for_image_url("https://upload.test/a/b"), ".jpg");
        assert_eq!(extension_for_image_url("not a url"), ".jpg");
    }

    #[test]
    fn test_wikipedia_identity_from_url_decodes_title() {
        let identity =
            wikipedia_identity_from_url("https://zh.wikipedia.org/wiki/%E5%91%A8%E6%9F%AF%E5%AE%87", "x")
                .expect("wikipedia link should be recognized");
        assert_eq!(identity.lang, "zh");
        assert_eq!(identity.title, "周柯宇");
    }

    #[test]
    fn test_wikipedia_identity_from_url_defaults_empty_title() {
        let identity = wikipedia_identity_from_url("https://en.wikipedia.org/wiki/", "Lee_Jeno")
            .expect("wikipedia link should be recognized");
        assert_eq!(identity.lang, "en");
        assert_eq!(identity.title, "Lee_Jeno");
    }

    #[test]
    fn test_wikipedia_identity_from_url_ignores_other_hosts() {
        assert!(wikipedia_identity_from_url("https://baike.baidu.com/item/x", "x").is_none());
        assert!(wikipedia_identity_from_url("garbage", "x").is_none());
    }

    #[test]
    fn test_wikipedia_urls_percent_encode_titles() {
        assert_eq!(
            wikipedia_summary_url("en", "Lee Jeno/x"),
            "https://en.wikipedia.org/api/rest_v1/page/summary/Lee%20Jeno%2Fx"
        );
        assert_eq!(
            wikipedia_article_url("en", "X_Y"),
            "https://en.wikipedia.org/wiki/X_Y"
        );
    }

    #[test]
    fn test_host_of_returns_host_only() {
        assert_eq!(
            host_of("https://www.example.com:8080/a"),
            Some("www.example.com".to_string())
        );
        assert_eq!(host_of("nope"), None);
    }
}
