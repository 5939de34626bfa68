//! Loading the people list from `people.html` and the optional fallback list.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::error::RunError;

const DEFAULT_WIKI_LANG: &str = "zh";

static PERSON_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)"displayName"\s*:\s*"([^"]+)"\s*,\s*"wiki"\s*:\s*\{\s*"lang"\s*:\s*"([^"]+)"\s*,\s*"title"\s*:\s*"([^"]+)""#,
    )
    .expect("person fragment pattern is valid")
});

static FALLBACK_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("fallback url pattern is valid"));

/// Wikipedia language edition plus article title.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct WikiIdentity {
    pub lang: String,
    pub title: String,
}

impl WikiIdentity {
    pub fn new(lang: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            title: title.into(),
        }
    }
}

/// One person listed on the source page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub wiki_lang: String,
    pub wiki_title: String,
}

impl Entity {
    pub fn new(name: &str, wiki_lang: &str, wiki_title: &str) -> Self {
        let wiki_lang = wiki_lang.trim();
        let wiki_title = wiki_title.trim();
        Self {
            name: name.to_string(),
            wiki_lang: if wiki_lang.is_empty() {
                DEFAULT_WIKI_LANG.to_string()
            } else {
                wiki_lang.to_string()
            },
            wiki_title: if wiki_title.is_empty() {
                name.to_string()
            } else {
                wiki_title.to_string()
            },
        }
    }
}

/// Extracts entities in page order; the first fragment seen for a name wins.
pub fn parse_entities(html: &str) -> Vec<Entity> {
    let mut seen = HashSet::new();
    let mut entities = Vec::new();
    for captures in PERSON_FRAGMENT.captures_iter(html) {
        let name = &captures[1];
        if !seen.insert(name.to_string()) {
            debug!("Skipping duplicate person entry for '{}'", name);
            continue;
        }
        entities.push(Entity::new(name, &captures[2], &captures[3]));
    }
    entities
}

/// Reads the source page; a page without any people is an error.
pub fn load_entities(path: &Path) -> Result<Vec<Entity>, RunError> {
    let text = fs::read_to_string(path).map_err(|source| RunError::SourcePage {
        path: path.to_path_buf(),
        source,
    })?;
    let entities = parse_entities(&text);
    if entities.is_empty() {
        return Err(RunError::NoEntities {
            path: path.to_path_buf(),
        });
    }
    Ok(entities)
}

/// Parses `name, ...text with a URL` lines into a name -> URL map.
pub fn parse_fallback_sources(text: &str) -> HashMap<String, String> {
    let mut fallback = HashMap::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (name_part, rest) = line.split_once(',').unwrap_or((line, ""));
        let name = name_part.trim();
        if name.is_empty() {
            continue;
        }
        if let Some(found) = FALLBACK_URL.find(rest) {
            fallback.insert(name.to_string(), found.as_str().to_string());
        }
    }
    fallback
}

/// Missing or unreadable lists yield an empty map.
pub fn load_fallback_sources(path: Option<&Path>) -> HashMap<String, String> {
    let Some(path) = path else {
        return HashMap::new();
    };
    if !path.exists() {
        debug!("Fallback list not found. path={}", path.display());
        return HashMap::new();
    }
    match fs::read_to_string(path) {
        Ok(text) => parse_fallback_sources(&text),
        Err(err) => {
            warn!(
                "Failed to read fallback list. path={} error={}",
                path.display(),
                err
            );
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::{
        load_entities, load_fallback_sources, parse_entities, parse_fallback_sources, Entity,
    };
    use crate::error::RunError;

    #[test]
    fn test_parse_entities_keeps_first_occurrence_and_order() {
        let html = r#"
            {"displayName": "B", "wiki": {"lang": "en", "title": " B_(singer) "}},
            {"displayName":"A","wiki":{"lang":"zh","title":"A"}},
            {"displayName": "B", "wiki": {"lang": "ko", "title": "Other"}}
        "#;
        let entities = parse_entities(html);
        assert_eq!(
            entities,
            vec![Entity::new("B", "en", "B_(singer)"), Entity::new("A", "zh", "A")]
        );
    }

    #[test]
    fn test_parse_entities_spans_line_breaks_inside_fragment() {
        let html = "{\"displayName\": \"周柯宇\",\n  \"wiki\": {\n    \"lang\": \"zh\",\n    \"title\": \"周柯宇\"\n  }}";
        let entities = parse_entities(html);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "周柯宇");
    }

    #[test]
    fn test_load_entities_rejects_page_without_people() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("people.html");
        fs::write(&path, "<html><body>nobody here</body></html>").expect("write page");
        let error = load_entities(&path).expect_err("empty page should fail");
        assert!(matches!(error, RunError::NoEntities { .. }));

        fs::write(
            &path,
            r#"{"displayName": "A", "wiki": {"lang": "zh", "title": "A"}}"#,
        )
        .expect("write page");
        let entities = load_entities(&path).expect("page with one person");
        assert_eq!(entities, vec![Entity::new("A", "zh", "A")]);
    }

    #[test]
    fn test_entity_new_defaults_blank_fields() {
        let entity = Entity::new("X", " ", " ");
        assert_eq!(entity.wiki_lang, "zh");
        assert_eq!(entity.wiki_title, "X");
    }

    #[test]
    fn test_parse_fallback_sources_ignores_lines_without_urls() {
        let text = "周柯宇, 百度百科 https://baike.baidu.com/item/x 备注\n\
                    \n\
                    Nobody, no link here\n\
                    , https://orphan.test/\n\
                    Lee Jeno,see http://en.wikipedia.org/wiki/Lee_Jeno";
        let fallback = parse_fallback_sources(text);
        assert_eq!(fallback.len(), 2);
        assert_eq!(fallback["周柯宇"], "https://baike.baidu.com/item/x");
        assert_eq!(fallback["Lee Jeno"], "http://en.wikipedia.org/wiki/Lee_Jeno");
    }

    #[test]
    fn test_load_fallback_sources_missing_file_is_empty() {
        assert!(load_fallback_sources(Some(Path::new("/definitely/missing/list.txt"))).is_empty());
        assert!(load_fallback_sources(None).is_empty());
    }
}
