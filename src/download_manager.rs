//! Sequential download run with manifest-backed skip logic.
//!
//! People whose previous manifest entry still points at a file on disk are
//! reused without touching the network. Everyone else goes through the
//! resolution chain once, gets their image downloaded, and lands in either the
//! new manifest or the failure log. A single failure never stops the run.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};

use crate::error::{ResolutionError, RunError};
use crate::http_client::HttpClient;
use crate::manifest::{self, FailureRecord, ManifestEntry, ManifestFiles};
use crate::people_page::Entity;
use crate::resolution_chain::ResolutionChain;
use crate::source_url::{extension_for_image_url, sanitize_filename};

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Project root; manifest paths are relative to it.
    pub root: PathBuf,
    /// Asset directory relative to `root`.
    pub asset_dir: PathBuf,
    pub force_download: bool,
    pub throttle: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cached: usize,
    pub downloaded: usize,
    pub failures: Vec<FailureRecord>,
    pub failures_path: PathBuf,
}

enum EntityOutcome {
    Cached(ManifestEntry),
    Downloaded(ManifestEntry),
    Failed(ResolutionError),
}

/// Manifest path string for a file in the asset directory, always `/`-separated.
pub fn relative_asset_path(asset_dir: &Path, filename: &str) -> String {
    let mut parts: Vec<String> = asset_dir
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .filter(|part| !part.is_empty() && part != ".")
        .collect();
    parts.push(filename.to_string());
    parts.join("/")
}

pub struct DownloadManager<'a> {
    http: &'a dyn HttpClient,
    chain: ResolutionChain<'a>,
    settings: DownloadSettings,
}

impl<'a> DownloadManager<'a> {
    pub fn new(
        http: &'a dyn HttpClient,
        chain: ResolutionChain<'a>,
        settings: DownloadSettings,
    ) -> Self {
        Self {
            http,
            chain,
            settings,
        }
    }

    fn asset_dir_abs(&self) -> PathBuf {
        self.settings.root.join(&self.settings.asset_dir)
    }

    fn cached_entry<'m>(
        &self,
        entity: &Entity,
        existing: &'m HashMap<String, ManifestEntry>,
    ) -> Option<&'m ManifestEntry> {
        if self.settings.force_download {
            return None;
        }
        let entry = existing.get(&entity.name)?;
        if entry.path().is_empty() || !self.settings.root.join(entry.path()).exists() {
            debug!(
                "Manifest entry for '{}' has no file on disk, redownloading",
                entity.name
            );
            return None;
        }
        Some(entry)
    }

    fn download_image(&self, image_url: &str, destination: &Path) -> Result<(), ResolutionError> {
        let response = self.http.get(image_url)?;
        if !response.is_ok() {
            return Err(ResolutionError::http_status("Image", response.status));
        }
        fs::write(destination, &response.body).map_err(|err| ResolutionError::Io {
            path: destination.to_path_buf(),
            message: err.to_string(),
        })
    }

    fn fetch_entity(&self, entity: &Entity) -> Result<ManifestEntry, ResolutionError> {
        let resolved = self.chain.resolve(entity)?;
        let filename = sanitize_filename(&entity.name, &extension_for_image_url(&resolved.image_url));
        let destination = self.asset_dir_abs().join(&filename);
        self.download_image(&resolved.image_url, &destination)?;
        Ok(ManifestEntry::from_resolved(
            &entity.name,
            relative_asset_path(&self.settings.asset_dir, &filename),
            resolved,
        ))
    }

    fn process_entity(
        &self,
        entity: &Entity,
        existing: &HashMap<String, ManifestEntry>,
    ) -> EntityOutcome {
        if let Some(entry) = self.cached_entry(entity, existing) {
            return EntityOutcome::Cached(entry.clone());
        }
        let outcome = match self.fetch_entity(entity) {
            Ok(entry) => EntityOutcome::Downloaded(entry),
            Err(error) => EntityOutcome::Failed(error),
        };
        if !self.settings.throttle.is_zero() {
            std::thread::sleep(self.settings.throttle);
        }
        outcome
    }

    /// Processes `entities` in order, then persists the manifest, catalog and failure log.
    pub fn run(&self, entities: &[Entity]) -> Result<RunSummary, RunError> {
        let asset_dir = self.asset_dir_abs();
        fs::create_dir_all(&asset_dir).map_err(|source| RunError::AssetDir {
            path: asset_dir.clone(),
            source,
        })?;
        let files = ManifestFiles::in_dir(&asset_dir);
        let existing: HashMap<String, ManifestEntry> = manifest::load_manifest(&files.manifest)
            .into_iter()
            .filter_map(|entry| Some((entry.name()?.to_string(), entry)))
            .collect();
        info!(
            "Processing {} people, {} cached manifest entries, force_download={}",
            entities.len(),
            existing.len(),
            self.settings.force_download
        );

        let mut results = Vec::new();
        let mut summary = RunSummary {
            failures_path: files.failures.clone(),
            ..RunSummary::default()
        };
        let mut stdout = std::io::stdout();
        for (index, entity) in entities.iter().enumerate() {
            let prefix = format!("[{}/{}] {}", index + 1, entities.len(), entity.name);
            let _ = write!(stdout, "{prefix} ... ");
            let _ = stdout.flush();
            match self.process_entity(entity, &existing) {
                EntityOutcome::Cached(entry) => {
                    let _ = writeln!(stdout, "skip (cached)");
                    summary.cached += 1;
                    results.push(entry);
                }
                EntityOutcome::Downloaded(entry) => {
                    let _ = writeln!(stdout, "done");
                    summary.downloaded += 1;
                    results.push(entry);
                }
                EntityOutcome::Failed(error) => {
                    let _ = writeln!(stdout, "failed ({error})");
                    summary.failures.push(FailureRecord {
                        name: entity.name.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        if !results.is_empty() {
            manifest::write_results(&files, &results)?;
        }
        manifest::write_failures(&files, &summary.failures)?;
        Ok(summary)
    }
}
