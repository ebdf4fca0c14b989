use async_trait::async_trait;

use crate::{
    documents::{CatalogGame, ClassifiedIntent, CollectionEntry, GameDetails},
    Status,
};

/// Remote services backing the collection: chat classifier, game catalog and
/// collection store. Implementations are stateless and never retry.
#[async_trait]
pub trait CollectionBackend: Send + Sync {
    /// Classifies free-form user text into a structured intent.
    async fn classify_message(&self, text: &str) -> Result<ClassifiedIntent, Status>;

    /// Searches the catalog by name. Results are ranked, best match first.
    async fn search_catalog(&self, name: &str) -> Result<Vec<CatalogGame>, Status>;

    /// Returns the user's collection entries.
    async fn fetch_collection(&self) -> Result<Vec<CollectionEntry>, Status>;

    /// Returns catalog metadata for `ids`. An empty `ids` yields an empty
    /// result without contacting the service.
    async fn fetch_catalog_by_ids(&self, ids: &[u64]) -> Result<Vec<CatalogGame>, Status>;

    async fn fetch_game_details(&self, id: u64) -> Result<GameDetails, Status>;

    async fn add_entry(&self, entry: &CollectionEntry) -> Result<(), Status>;
    async fn update_entry(&self, entry: &CollectionEntry) -> Result<(), Status>;
    async fn remove_entry(&self, game_id: u64) -> Result<(), Status>;
}

/// The signed-in user's session as seen by the collection client.
pub trait Session: Send + Sync {
    /// Bearer token attached to every request, if signed in.
    fn access_token(&self) -> Option<String>;

    /// Called when the remote service rejects the session (HTTP 401).
    fn on_unauthorized(&self);
}
