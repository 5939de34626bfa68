//! Persisted run state: `manifest.json`, `catalog.csv` and `download_failures.json`.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde_json::{Map, Value};

use crate::error::RunError;
use crate::providers::ResolvedSource;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const CATALOG_FILE_NAME: &str = "catalog.csv";
pub const FAILURES_FILE_NAME: &str = "download_failures.json";
const CATALOG_COLUMNS: [&str; 5] = ["name", "path", "sourceUrl", "imageUrl", "provider"];

/// One downloaded portrait, keyed by `name`.
///
/// Entries loaded from a previous run keep every key they were written with,
/// in their original order, so cached entries are re-emitted unchanged.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct ManifestEntry {
    fields: Map<String, Value>,
}

impl ManifestEntry {
    pub fn from_resolved(name: &str, path: String, resolved: ResolvedSource) -> Self {
        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::String(name.to_string()));
        fields.insert("path".to_string(), Value::String(path));
        fields.insert("sourceUrl".to_string(), Value::String(resolved.source_page_url));
        fields.insert("imageUrl".to_string(), Value::String(resolved.image_url));
        fields.insert("provider".to_string(), Value::String(resolved.provider));
        Self { fields }
    }

    /// String value of `key`, if present and a string.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.field("name")
    }

    /// Relative to the project root; empty when the entry has no path.
    pub fn path(&self) -> &str {
        self.field("path").unwrap_or_default()
    }

    fn csv_value(&self, column: &str) -> String {
        match self.fields.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct FailureRecord {
    pub name: String,
    pub error: String,
}

/// Names the asset directory's bookkeeping files.
#[derive(Debug, Clone)]
pub struct ManifestFiles {
    pub manifest: PathBuf,
    pub catalog: PathBuf,
    pub failures: PathBuf,
}

impl ManifestFiles {
    pub fn in_dir(asset_dir: &Path) -> Self {
        Self {
            manifest: asset_dir.join(MANIFEST_FILE_NAME),
            catalog: asset_dir.join(CATALOG_FILE_NAME),
            failures: asset_dir.join(FAILURES_FILE_NAME),
        }
    }
}

/// Previous run's entries. Missing or malformed manifests are an empty cache;
/// individual items without a string `name` are skipped.
pub fn load_manifest(path: &Path) -> Vec<ManifestEntry> {
    if !path.exists() {
        return Vec::new();
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(
                "Failed to read manifest, ignoring cache. path={} error={}",
                path.display(),
                err
            );
            return Vec::new();
        }
    };
    let items = match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("Manifest is not a list, ignoring cache. path={}", path.display());
            return Vec::new();
        }
        Err(err) => {
            warn!(
                "Malformed manifest, ignoring cache. path={} error={}",
                path.display(),
                err
            );
            return Vec::new();
        }
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(fields) if fields.get("name").is_some_and(Value::is_string) => {
                Some(ManifestEntry { fields })
            }
            other => {
                warn!("Skipping manifest item without a name: {}", other);
                None
            }
        })
        .collect()
}

fn persist_error(path: &Path, source: std::io::Error) -> RunError {
    RunError::Persist {
        path: path.to_path_buf(),
        source,
    }
}

fn write_pretty_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), RunError> {
    let mut text = serde_json::to_string_pretty(value)
        .map_err(|err| persist_error(path, std::io::Error::other(err)))?;
    text.push('\n');
    fs::write(path, text).map_err(|source| persist_error(path, source))
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn render_catalog_csv(entries: &[ManifestEntry]) -> String {
    let mut out = CATALOG_COLUMNS.join(",");
    out.push_str("\r\n");
    for entry in entries {
        let row = CATALOG_COLUMNS
            .iter()
            .map(|column| csv_field(&entry.csv_value(column)))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&row);
        out.push_str("\r\n");
    }
    out
}

/// Overwrites both the catalog and the manifest with `entries`.
pub fn write_results(files: &ManifestFiles, entries: &[ManifestEntry]) -> Result<(), RunError> {
    fs::write(&files.catalog, render_catalog_csv(entries))
        .map_err(|source| persist_error(&files.catalog, source))?;
    write_pretty_json(&files.manifest, &entries)
}

/// Writes the failure log, or removes a stale one when `failures` is empty.
pub fn write_failures(files: &ManifestFiles, failures: &[FailureRecord]) -> Result<(), RunError> {
    if !failures.is_empty() {
        return write_pretty_json(&files.failures, &failures);
    }
    if files.failures.exists() {
        fs::remove_file(&files.failures).map_err(|source| persist_error(&files.failures, source))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{
        load_manifest, render_catalog_csv, write_failures, write_results, FailureRecord,
        ManifestEntry, ManifestFiles,
    };
    use crate::providers::ResolvedSource;

    fn resolved(provider: &str) -> ResolvedSource {
        ResolvedSource {
            image_url: "https://upload.test/x.jpg".to_string(),
            source_page_url: "https://en.wikipedia.org/wiki/X".to_string(),
            provider: provider.to_string(),
        }
    }

    fn entry(name: &str) -> ManifestEntry {
        ManifestEntry::from_resolved(
            name,
            format!("assets/people/{name}.jpg"),
            resolved("EN Wikipedia"),
        )
    }

    #[test]
    fn test_load_manifest_treats_malformed_json_as_empty() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("manifest.json");
        fs::write(&path, "{ not json").expect("write manifest");
        assert!(load_manifest(&path).is_empty());
        assert!(load_manifest(&temp_dir.path().join("missing.json")).is_empty());
    }

    #[test]
    fn test_load_manifest_keeps_unknown_keys_and_skips_unnamed_items() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("manifest.json");
        fs::write(
            &path,
            r#"[{"credit": "CC-BY", "name": "A", "path": "assets/people/A.jpg"}, {"path": "x.jpg"}, {"name": "B"}]"#,
        )
        .expect("write manifest");

        let entries = load_manifest(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].field("credit"), Some("CC-BY"));
        assert_eq!(entries[0].path(), "assets/people/A.jpg");
        assert_eq!(entries[1].name(), Some("B"));
        assert_eq!(entries[1].path(), "");

        let text = serde_json::to_string(&entries[0]).expect("serialize entry");
        assert_eq!(
            text,
            r#"{"credit":"CC-BY","name":"A","path":"assets/people/A.jpg"}"#
        );
    }

    #[test]
    fn test_manifest_json_uses_camel_case_and_keeps_non_ascii() {
        let temp_dir = TempDir::new().expect("temp dir");
        let files = ManifestFiles::in_dir(temp_dir.path());
        write_results(&files, &[entry("周柯宇")]).expect("write results");

        let text = fs::read_to_string(&files.manifest).expect("read manifest");
        assert!(text.contains("\"sourceUrl\": \"https://en.wikipedia.org/wiki/X\""));
        assert!(text.contains("周柯宇"));
        assert!(text.starts_with("[\n  {\n    \"name\""));
        assert_eq!(load_manifest(&files.manifest), vec![entry("周柯宇")]);
    }

    #[test]
    fn test_render_catalog_csv_quotes_special_fields() {
        let tricky = ManifestEntry::from_resolved(
            "A",
            "assets/people/A.jpg".to_string(),
            resolved("Host, \"quoted\""),
        );
        let csv = render_catalog_csv(&[tricky]);
        let mut lines = csv.split("\r\n");
        assert_eq!(lines.next(), Some("name,path,sourceUrl,imageUrl,provider"));
        assert_eq!(
            lines.next(),
            Some(
                "A,assets/people/A.jpg,https://en.wikipedia.org/wiki/X,https://upload.test/x.jpg,\"Host, \"\"quoted\"\"\""
            )
        );
    }

    #[test]
    fn test_write_failures_removes_stale_log() {
        let temp_dir = TempDir::new().expect("temp dir");
        let files = ManifestFiles::in_dir(temp_dir.path());
        let failures = vec![FailureRecord {
            name: "X".to_string(),
            error: "Baidu Baike API HTTP 502".to_string(),
        }];
        write_failures(&files, &failures).expect("write failures");
        assert!(files.failures.exists());

        write_failures(&files, &[]).expect("clear failures");
        assert!(!files.failures.exists());
    }
}
