use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfare_ledger::{RoundTripLinker, TripRepository};
use wayfare_store::app_config::Config;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare_app=debug,wayfare_ledger=debug,wayfare_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        "Starting with {:?} storage, {} day link window",
        config.storage.backend,
        config.linking.window_days
    );

    let store = wayfare_store::open_store(&config.storage).context("Failed to open storage")?;
    let mut repo = TripRepository::new(store).with_linker(RoundTripLinker::new(config.linking.window_days));

    repo.ensure_loaded();
    if repo.repaired_on_load() {
        tracing::warn!("Duplicate trip ids were repaired during load");
    }

    let webdav = config.sync.webdav();
    if webdav.is_usable() {
        tracing::info!("Remote sync enabled via {}", webdav.effective_url());
    }

    let stats = repo.stats();
    tracing::info!(
        "{} trip(s): {} round trip(s), {} single(s), {:.2} spent",
        stats.total_trips,
        stats.round_trips,
        stats.single_trips,
        stats.total_spent
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    for entry in repo.merged_chronological() {
        tracing::debug!("{} {}", entry.date(), entry_label(&entry));
    }

    Ok(())
}

fn entry_label(entry: &wayfare_ledger::TimelineEntry) -> String {
    match entry {
        wayfare_ledger::TimelineEntry::Single(trip) => {
            format!("{} → {}", trip.departure.city, trip.arrival.city)
        }
        wayfare_ledger::TimelineEntry::RoundTrip(pair) => {
            format!("{} ({:.2})", pair.route, pair.total_price)
        }
    }
}
