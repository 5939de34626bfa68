//! Downloads portrait images for every person listed on the people page.
//!
//! Fatal errors (no people parsed, unreadable config) end the process with exit status 1.

mod config;
mod download_manager;
mod error;
mod http_client;
mod manifest;
mod page_image;
mod people_page;
mod providers;
mod resolution_chain;
mod source_url;

use log::info;

use crate::config::{force_download_from_env, load_config};
use crate::download_manager::{DownloadManager, DownloadSettings};
use crate::http_client::UreqHttpClient;
use crate::people_page::{load_entities, load_fallback_sources};
use crate::providers::SourceProviders;
use crate::resolution_chain::ResolutionChain;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.parse_default_env();
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let root = std::env::current_dir()?;
    let config = load_config(&root)?;

    let entities = load_entities(&root.join(&config.people_html))?;

    let fallback_path = config.fallback_list.as_ref().map(|path| root.join(path));
    let fallback_sources = load_fallback_sources(fallback_path.as_deref());
    info!(
        "Loaded {} people and {} fallback sources",
        entities.len(),
        fallback_sources.len()
    );

    let http = UreqHttpClient::new(config.user_agent.clone(), config.request_timeout());
    let chain = ResolutionChain::new(
        SourceProviders::new(&http),
        config.chain_config(fallback_sources),
    );
    let settings = DownloadSettings {
        root: root.clone(),
        asset_dir: config.asset_dir.clone(),
        force_download: force_download_from_env(),
        throttle: config.throttle(),
    };
    let summary = DownloadManager::new(&http, chain, settings).run(&entities)?;
    info!(
        "Run finished. cached={} downloaded={} failed={}",
        summary.cached,
        summary.downloaded,
        summary.failures.len()
    );

    if summary.failures.is_empty() {
        println!("\nAll downloads succeeded.");
    } else {
        println!(
            "\n{} downloads failed. See {}",
            summary.failures.len(),
            summary.failures_path.display()
        );
    }
    Ok(())
}
