use std::{env, process::ExitCode, sync::Arc};

use tracing::{error, info};
use vitrine_core::{Config, ListingPhase, ProjectListing, ProjectsClient, Storage, init_telemetry};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::load(&config_path)?;

    init_telemetry(&config.app)?;

    let storage = Storage::open(&config.paths.storage).await?;
    let client = ProjectsClient::new(reqwest::Client::new(), Arc::new(storage))
        .with_base_url(config.api.base_url.clone());

    let mut listing = ProjectListing::new(client);
    listing.activate().await;

    if let ListingPhase::Error(message) = listing.phase() {
        error!(%message, "project listing failed to load");
        return Ok(ExitCode::FAILURE);
    }

    info!(
        total = listing.records().len(),
        pages = listing.total_pages(),
        "project listing ready"
    );

    for record in listing.visible_page() {
        let category = record.category.as_deref().unwrap_or("-");
        let status = record.status.map(|status| status.label()).unwrap_or("-");
        println!("{:<24} {:<12} {:<10} {}", record.id, category, status, record.title);
    }

    Ok(ExitCode::SUCCESS)
}
