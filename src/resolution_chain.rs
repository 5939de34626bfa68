//! Ordered provider fallback for one person.
//!
//! Each entity gets an explicit plan of strategies. The plan is walked in order
//! and the first success wins. When every step fails the error of the last step
//! attempted is reported, not the first one.

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::debug;

use crate::error::ResolutionError;
use crate::people_page::{Entity, WikiIdentity};
use crate::providers::{ResolvedSource, SourceProviders};
use crate::source_url::wikipedia_identity_from_url;

/// Curated per-name knowledge the chain consults before the generic lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainConfig {
    pub wiki_overrides: HashMap<String, WikiIdentity>,
    pub baike_preferred: HashSet<String>,
    pub fallback_sources: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    BaikeApi,
    WikipediaSummary(WikiIdentity),
    GenericPage(String),
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaikeApi => write!(f, "baike-api"),
            Self::WikipediaSummary(identity) => {
                write!(f, "wikipedia:{}/{}", identity.lang, identity.title)
            }
            Self::GenericPage(url) => write!(f, "page:{url}"),
        }
    }
}

pub struct ResolutionChain<'a> {
    providers: SourceProviders<'a>,
    config: ChainConfig,
}

impl<'a> ResolutionChain<'a> {
    pub fn new(providers: SourceProviders<'a>, config: ChainConfig) -> Self {
        Self { providers, config }
    }

    /// Strategies for `entity`, in the order they will be attempted.
    pub fn plan(&self, entity: &Entity) -> Vec<Strategy> {
        let mut strategies = Vec::new();
        if self.config.baike_preferred.contains(&entity.name) {
            strategies.push(Strategy::BaikeApi);
        }
        if let Some(identity) = self.config.wiki_overrides.get(&entity.name) {
            strategies.push(Strategy::WikipediaSummary(identity.clone()));
        }
        strategies.push(Strategy::WikipediaSummary(WikiIdentity::new(
            entity.wiki_lang.clone(),
            entity.wiki_title.clone(),
        )));
        if let Some(fallback_url) = self.config.fallback_sources.get(&entity.name) {
            match wikipedia_identity_from_url(fallback_url, &entity.wiki_title) {
                Some(identity) => strategies.push(Strategy::WikipediaSummary(identity)),
                None => strategies.push(Strategy::GenericPage(fallback_url.clone())),
            }
        }
        strategies.push(Strategy::BaikeApi);
        strategies
    }

    fn attempt(&self, entity: &Entity, strategy: &Strategy) -> Result<ResolvedSource, ResolutionError> {
        match strategy {
            Strategy::BaikeApi => self.providers.baike_api(&entity.name),
            Strategy::WikipediaSummary(identity) => self
                .providers
                .wikipedia_summary(&identity.lang, &identity.title),
            Strategy::GenericPage(url) => self.providers.generic_page(url),
        }
    }

    pub fn resolve(&self, entity: &Entity) -> Result<ResolvedSource, ResolutionError> {
        let mut last_error = None;
        for strategy in self.plan(entity) {
            match self.attempt(entity, &strategy) {
                Ok(resolved) => {
                    debug!(
                        "Resolved '{}' via {} ({})",
                        entity.name, strategy, resolved.provider
                    );
                    return Ok(resolved);
                }
                Err(error) => {
                    debug!("'{}': {} failed: {}", entity.name, strategy, error);
                    last_error = Some(error);
                }
            }
        }
        // plan() always ends with BaikeApi, so at least one error was recorded.
        Err(last_error.unwrap_or_else(|| {
            ResolutionError::missing_image(format!("No sources configured for {}", entity.name))
        }))
    }
}
