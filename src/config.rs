//! Downloader configuration model and defaults.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;

use crate::error::RunError;
use crate::http_client::DEFAULT_USER_AGENT;
use crate::people_page::WikiIdentity;
use crate::resolution_chain::ChainConfig;

pub const CONFIG_ENV_VAR: &str = "PEOPLE_ASSETS_CONFIG";
pub const FORCE_DOWNLOAD_ENV_VAR: &str = "FORCE_DOWNLOAD_ASSETS";
const ROOT_CONFIG_FILE_NAME: &str = "people_assets.toml";
const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;
const MAX_THROTTLE_MS: u64 = 10_000;

/// Root configuration, optionally read from `people_assets.toml`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Config {
    /// Source page listing every person, relative to the project root.
    #[serde(default = "default_people_html")]
    pub people_html: PathBuf,
    /// Download directory, relative to the project root. Manifest paths use it verbatim.
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,
    /// Optional `name, ... url` list consulted when Wikipedia has nothing.
    #[serde(default)]
    pub fallback_list: Option<PathBuf>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Pause after every entity that hit the network.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Names that resolve better through Baidu Baike than Wikipedia.
    #[serde(default = "default_baike_preferred")]
    pub baike_preferred: Vec<String>,
    /// Names whose page title is ambiguous; mapped to a specific article.
    #[serde(default = "default_wiki_overrides")]
    pub wiki_overrides: BTreeMap<String, WikiIdentity>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            people_html: default_people_html(),
            asset_dir: default_asset_dir(),
            fallback_list: None,
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            throttle_ms: default_throttle_ms(),
            baike_preferred: default_baike_preferred(),
            wiki_overrides: default_wiki_overrides(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Chain settings; fallback sources are loaded separately and passed in.
    pub fn chain_config(&self, fallback_sources: HashMap<String, String>) -> ChainConfig {
        ChainConfig {
            wiki_overrides: self
                .wiki_overrides
                .iter()
                .map(|(name, identity)| (name.clone(), identity.clone()))
                .collect(),
            baike_preferred: self.baike_preferred.iter().cloned().collect::<HashSet<_>>(),
            fallback_sources,
        }
    }
}

fn default_people_html() -> PathBuf {
    PathBuf::from("people.html")
}

fn default_asset_dir() -> PathBuf {
    PathBuf::from("assets").join("people")
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    25
}

fn default_throttle_ms() -> u64 {
    50
}

fn default_baike_preferred() -> Vec<String> {
    ["周柯宇", "姚明明", "张耀", "李马克", "王皓轩", "赖冠霖", "魏子越"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_wiki_overrides() -> BTreeMap<String, WikiIdentity> {
    BTreeMap::from([("李在玟".to_string(), WikiIdentity::new("en", "Lee_Jeno"))])
}

pub fn sanitize_config(mut config: Config) -> Config {
    config.request_timeout_secs = config.request_timeout_secs.max(MIN_REQUEST_TIMEOUT_SECS);
    config.throttle_ms = config.throttle_ms.min(MAX_THROTTLE_MS);
    if config.people_html.as_os_str().is_empty() {
        config.people_html = default_people_html();
    }
    if config.asset_dir.as_os_str().is_empty() {
        config.asset_dir = default_asset_dir();
    }
    config.user_agent = config.user_agent.trim().to_string();
    if config.user_agent.is_empty() {
        config.user_agent = default_user_agent();
    }
    config
}

/// Any non-empty value enables forced redownload.
pub fn force_download_from_env() -> bool {
    std::env::var_os(FORCE_DOWNLOAD_ENV_VAR).is_some_and(|value| !value.is_empty())
}

fn candidate_config_files(root: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
        candidates.push(PathBuf::from(explicit));
    }
    candidates.push(root.join(ROOT_CONFIG_FILE_NAME));
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("people_assets").join("config.toml"));
    }
    candidates
}

pub fn parse_config(path: &Path, content: &str) -> Result<Config, RunError> {
    toml::from_str::<Config>(content)
        .map(sanitize_config)
        .map_err(|err| RunError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

/// First existing config file wins; with none present the built-in defaults apply.
pub fn load_config(root: &Path) -> Result<Config, RunError> {
    for path in candidate_config_files(root) {
        if !path.exists() {
            continue;
        }
        let content = std::fs::read_to_string(&path).map_err(|err| RunError::Config {
            path: path.clone(),
            message: err.to_string(),
        })?;
        info!("Loading config. path={}", path.display());
        return parse_config(&path, &content);
    }
    info!("Config file not found. Using defaults");
    Ok(sanitize_config(Config::default()))
}
