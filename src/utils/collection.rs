use clap::Parser;
use gameshelf::{
    api::{CollectionApi, TokenSession},
    documents::{CollectionStatus, OwnedGame},
    library::CollectionCache,
    traits::CollectionBackend,
    util::config::Config,
    Tracing,
};
use itertools::Itertools;
use std::sync::Arc;

/// Collection inspection utility.
#[derive(Parser)]
struct Opts {
    /// JSON file with client settings.
    #[clap(long)]
    config: Option<String>,

    /// Only list games with this status, e.g. "playing".
    #[clap(long)]
    status: Option<CollectionStatus>,

    /// Print catalog details for a game id instead of listing the collection.
    #[clap(long)]
    details: Option<u64>,
}

/// Lists the owned games of the signed-in user or shows one game in detail.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    Tracing::setup("utils/collection")?;

    let opts: Opts = Opts::parse();
    let config = match &opts.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let session = Arc::new(TokenSession::new(config.access_token.clone()));
    let api = Arc::new(CollectionApi::new(
        &config.api_url,
        session.clone(),
        config.request_timeout(),
    )?);

    match opts.details {
        Some(id) => {
            let details = api.fetch_game_details(id).await?;
            println!("{} ({})", details.name, details.id);
            if let Some(release) = details.earliest_release() {
                println!(
                    "Released: {}",
                    release.human.as_deref().unwrap_or("unknown")
                );
            }
            if let Some(developer) = details.developer() {
                println!("Developer: {developer}");
            }
            println!("Genres: {}", details.genre_names().iter().join(", "));
            println!("Platforms: {}", details.platform_names().iter().join(", "));
            if let Some(summary) = &details.summary {
                println!("\n{summary}");
            }
        }
        None => {
            let cache = CollectionCache::new(api, session.clone());
            let owned = cache.owned_games_with_status(opts.status).await;
            if session.is_expired() {
                return Err("session expired, sign in again".into());
            }

            println!(
                "Found {} games.\n{}",
                owned.len(),
                owned.iter().map(describe).join("\n")
            );
        }
    }

    Ok(())
}

fn describe(owned: &OwnedGame) -> String {
    let mut line = owned.game.name.clone();
    if let Some(status) = owned.status {
        line.push_str(&format!(" [{}]", status.label()));
    }
    if let Some(rating) = owned.rating {
        line.push_str(&format!(" {rating}/10"));
    }
    line
}
