use itertools::Itertools;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, PoisonError, RwLock,
};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::{
    documents::{
        CatalogGame, CollectionAction, CollectionEntry, CollectionStatus, OwnedGame, Rating,
    },
    logging::CollectionEvent,
    traits::{CollectionBackend, Session},
    Status,
};

/// Local view of the user's collection joined with catalog metadata.
///
/// The view only ever reflects state confirmed by the collection store.
/// Mutations go to the store first and then bump the cache generation; a read
/// that finds its view older than the current generation refetches.
pub struct CollectionCache {
    backend: Arc<dyn CollectionBackend>,
    session: Arc<dyn Session>,

    generation: AtomicU64,
    view: RwLock<CollectionView>,

    // Serializes refreshes so concurrent readers share one fetch.
    refresh_lock: Mutex<()>,
}

#[derive(Default)]
struct CollectionView {
    /// Generation the view was fetched at. None until the first fetch.
    generation: Option<u64>,

    entries: Vec<CollectionEntry>,

    /// Sorted owned ids that `catalog` was fetched for.
    catalog_key: Vec<u64>,
    catalog: Vec<CatalogGame>,

    owned: Vec<OwnedGame>,
}

impl CollectionCache {
    pub fn new(backend: Arc<dyn CollectionBackend>, session: Arc<dyn Session>) -> Self {
        CollectionCache {
            backend,
            session,
            generation: AtomicU64::new(0),
            view: RwLock::new(CollectionView::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current cache generation. Every confirmed mutation increments it.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Marks the view stale and returns the new generation.
    pub fn invalidate(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        CollectionEvent::invalidate(generation);
        generation
    }

    /// True if the view has never been fetched or predates the current
    /// generation.
    pub fn is_stale(&self) -> bool {
        let generation = self.generation();
        self.read_view().generation != Some(generation)
    }

    /// Returns the last committed view without contacting the store.
    pub fn snapshot(&self) -> Vec<OwnedGame> {
        self.read_view().owned.clone()
    }

    /// Returns the owned games, refreshing first if the view is stale.
    ///
    /// Never fails: refresh errors are logged and the last committed view is
    /// returned. An expired session is reported to the session collaborator.
    pub async fn owned_games(&self) -> Vec<OwnedGame> {
        if let Err(status) = self.refresh().await {
            match status {
                Status::Unauthorized(_) => info!("Collection read rejected, session expired"),
                status => error!("Failed to refresh collection: {status}"),
            }
        }
        self.snapshot()
    }

    /// Owned games filtered by status. `None` returns every owned game.
    pub async fn owned_games_with_status(
        &self,
        status: Option<CollectionStatus>,
    ) -> Vec<OwnedGame> {
        let owned = self.owned_games().await;
        match status {
            Some(status) => owned
                .into_iter()
                .filter(|game| game.status == Some(status))
                .collect(),
            None => owned,
        }
    }

    /// Brings the view up to date with the store if it is stale.
    ///
    /// Reads the collection list first and then the catalog metadata for the
    /// owned ids. Metadata is keyed by the owned id set: it is reused while
    /// the set is unchanged and never requested for an empty set.
    #[instrument(level = "trace", skip(self))]
    pub async fn refresh(&self) -> Result<(), Status> {
        let _guard = self.refresh_lock.lock().await;

        let generation = self.generation();
        if self.read_view().generation == Some(generation) {
            return Ok(());
        }

        let entries = self.check_session(self.backend.fetch_collection().await)?;
        let key = catalog_key(&entries);

        let cached_catalog = {
            let view = self.read_view();
            match view.generation.is_some() && view.catalog_key == key {
                true => Some(view.catalog.clone()),
                false => None,
            }
        };
        let catalog = match cached_catalog {
            Some(catalog) => catalog,
            None => self.fetch_catalog(&key).await?,
        };

        self.commit(generation, entries, key, catalog);
        Ok(())
    }

    /// Applies a mutation to the collection store and invalidates the view.
    ///
    /// Issues exactly one store call. Nothing is applied locally. The view is
    /// invalidated even when the call fails, since the store may have applied
    /// the change before the error.
    #[instrument(
        level = "trace",
        skip(self, game),
        fields(
            game_id = game.id,
            name = %game.name,
        )
    )]
    pub async fn mutate(
        &self,
        action: CollectionAction,
        game: &CatalogGame,
        rating: Option<Rating>,
        status: Option<CollectionStatus>,
    ) -> Result<(), Status> {
        let entry = CollectionEntry {
            game_id: game.id,
            rating,
            status,
        };

        let response = match action {
            CollectionAction::Add => self.backend.add_entry(&entry).await,
            CollectionAction::Update => self.backend.update_entry(&entry).await,
            CollectionAction::Remove => self.backend.remove_entry(game.id).await,
        };
        let generation = self.invalidate();
        self.check_session(response)?;

        info!("{} {game}, collection generation {generation}", action.past_tense());
        Ok(())
    }

    async fn fetch_catalog(&self, ids: &[u64]) -> Result<Vec<CatalogGame>, Status> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.check_session(self.backend.fetch_catalog_by_ids(ids).await)
    }

    fn commit(
        &self,
        generation: u64,
        entries: Vec<CollectionEntry>,
        catalog_key: Vec<u64>,
        catalog: Vec<CatalogGame>,
    ) {
        let mut view = self.view.write().unwrap_or_else(PoisonError::into_inner);
        if view.generation.is_some_and(|current| current > generation) {
            warn!("Dropping collection fetched at generation {generation}");
            return;
        }

        view.owned = OwnedGame::join(&entries, &catalog);
        view.generation = Some(generation);
        view.entries = entries;
        view.catalog_key = catalog_key;
        view.catalog = catalog;
    }

    /// Routes an expired session to the session collaborator.
    fn check_session<T>(&self, result: Result<T, Status>) -> Result<T, Status> {
        if let Err(status) = &result {
            if status.is_unauthorized() {
                warn!("Collection store rejected session: {status}");
                self.session.on_unauthorized();
            }
        }
        result
    }

    fn read_view(&self) -> std::sync::RwLockReadGuard<'_, CollectionView> {
        self.view.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn catalog_key(entries: &[CollectionEntry]) -> Vec<u64> {
    entries
        .iter()
        .map(|entry| entry.game_id)
        .sorted()
        .dedup()
        .collect_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{game, Call, FakeBackend, FakeSession};

    fn entry(game_id: u64) -> CollectionEntry {
        CollectionEntry {
            game_id,
            ..Default::default()
        }
    }

    fn setup() -> (Arc<FakeBackend>, Arc<FakeSession>, CollectionCache) {
        let backend = Arc::new(FakeBackend::new());
        let session = Arc::new(FakeSession::default());
        let cache = CollectionCache::new(backend.clone(), session.clone());
        (backend, session, cache)
    }

    fn ids(games: &[OwnedGame]) -> Vec<u64> {
        games.iter().map(|g| g.id()).collect()
    }

    #[tokio::test]
    async fn empty_until_first_fetch() {
        let (backend, _, cache) = setup();
        backend
            .catalog_game(game(1, "Celeste"))
            .collection_entry(entry(1));

        assert!(cache.snapshot().is_empty());
        assert!(cache.is_stale());

        assert_eq!(ids(&cache.owned_games().await), vec![1]);
        assert!(!cache.is_stale());
        assert_eq!(ids(&cache.snapshot()), vec![1]);
    }

    #[tokio::test]
    async fn empty_collection_skips_catalog_read() {
        let (backend, _, cache) = setup();
        backend.catalog_game(game(1, "Celeste"));

        assert!(cache.owned_games().await.is_empty());
        assert_eq!(backend.calls(), vec![Call::FetchCollection]);
    }

    #[tokio::test]
    async fn unauthorized_read_signs_out() {
        let (backend, session, cache) = setup();
        backend.fail_collection(Some(Status::unauthorized("401")));

        assert!(cache.owned_games().await.is_empty());
        assert_eq!(session.logouts(), 1);
        assert_eq!(
            backend.count(|c| matches!(c, Call::FetchCatalog(_))),
            0
        );
    }

    #[tokio::test]
    async fn failed_read_keeps_last_view() {
        let (backend, session, cache) = setup();
        backend
            .catalog_game(game(1, "Celeste"))
            .collection_entry(entry(1));
        assert_eq!(ids(&cache.owned_games().await), vec![1]);

        cache.invalidate();
        backend.fail_collection(Some(Status::internal("boom")));
        assert_eq!(ids(&cache.owned_games().await), vec![1]);
        assert_eq!(session.logouts(), 0);
        assert!(cache.is_stale());
    }

    #[tokio::test]
    async fn fresh_view_is_not_refetched() {
        let (backend, _, cache) = setup();
        backend
            .catalog_game(game(1, "Celeste"))
            .collection_entry(entry(1));

        cache.owned_games().await;
        cache.owned_games().await;
        assert_eq!(backend.count(|c| *c == Call::FetchCollection), 1);
    }

    #[tokio::test]
    async fn mutation_invalidates_and_refetches() {
        let (backend, _, cache) = setup();
        backend
            .catalog_game(game(1, "Celeste"))
            .catalog_game(game(2, "Hades"))
            .collection_entry(entry(1));
        assert_eq!(ids(&cache.owned_games().await), vec![1]);

        let generation = cache.generation();
        cache
            .mutate(CollectionAction::Add, &game(2, "Hades"), None, None)
            .await
            .unwrap();
        assert_eq!(cache.generation(), generation + 1);

        // Not applied locally until the next read.
        assert_eq!(ids(&cache.snapshot()), vec![1]);
        assert_eq!(ids(&cache.owned_games().await), vec![1, 2]);
        assert_eq!(
            backend.calls().last(),
            Some(&Call::FetchCatalog(vec![1, 2]))
        );
    }

    #[tokio::test]
    async fn catalog_reused_while_ids_unchanged() {
        let (backend, _, cache) = setup();
        backend
            .catalog_game(game(1, "Celeste"))
            .collection_entry(entry(1));
        cache.owned_games().await;
        backend.clear_calls();

        let rating = Rating::try_from(7).unwrap();
        cache
            .mutate(
                CollectionAction::Update,
                &game(1, "Celeste"),
                Some(rating),
                Some(CollectionStatus::Playing),
            )
            .await
            .unwrap();

        let owned = cache.owned_games().await;
        assert_eq!(owned[0].rating, Some(rating));
        assert_eq!(owned[0].status, Some(CollectionStatus::Playing));
        assert_eq!(
            backend.count(|c| matches!(c, Call::FetchCatalog(_))),
            0
        );
    }

    #[tokio::test]
    async fn removing_last_game_empties_view() {
        let (backend, _, cache) = setup();
        backend
            .catalog_game(game(1, "Celeste"))
            .collection_entry(entry(1));
        cache.owned_games().await;

        cache
            .mutate(CollectionAction::Remove, &game(1, "Celeste"), None, None)
            .await
            .unwrap();
        assert!(cache.owned_games().await.is_empty());
        assert_eq!(
            backend.calls().last(),
            Some(&Call::FetchCollection)
        );
    }

    #[tokio::test]
    async fn failed_mutation_invalidates_view() {
        let (backend, _, cache) = setup();
        backend
            .catalog_game(game(1, "Celeste"))
            .collection_entry(entry(1));
        cache.owned_games().await;
        backend.fail_mutations(Some(Status::internal("500")));

        let result = cache
            .mutate(CollectionAction::Add, &game(2, "Hades"), None, None)
            .await;
        assert!(result.is_err());
        assert_eq!(cache.generation(), 1);
        assert!(cache.is_stale());
        assert_eq!(backend.mutations().len(), 1);

        // Nothing was applied locally.
        assert_eq!(ids(&cache.snapshot()), vec![1]);
    }

    #[tokio::test]
    async fn mutation_applied_before_error_is_refetched() {
        let (backend, _, cache) = setup();
        backend
            .catalog_game(game(1, "Celeste"))
            .catalog_game(game(2, "Hades"))
            .collection_entry(entry(1));
        cache.owned_games().await;
        backend.fail_after_apply(Some(Status::internal("connection reset")));

        let result = cache
            .mutate(CollectionAction::Add, &game(2, "Hades"), None, None)
            .await;
        assert!(result.is_err());
        assert_eq!(backend.stored_collection().len(), 2);

        assert!(cache.is_stale());
        assert_eq!(ids(&cache.owned_games().await), vec![1, 2]);
    }

    #[tokio::test]
    async fn unauthorized_mutation_signs_out() {
        let (backend, session, cache) = setup();
        backend.fail_mutations(Some(Status::unauthorized("401")));

        let result = cache
            .mutate(CollectionAction::Remove, &game(1, "Celeste"), None, None)
            .await;
        assert!(matches!(result, Err(Status::Unauthorized(_))));
        assert_eq!(session.logouts(), 1);
    }

    #[tokio::test]
    async fn status_filter() {
        let (backend, _, cache) = setup();
        backend
            .catalog_game(game(1, "Celeste"))
            .catalog_game(game(2, "Hades"))
            .collection_entry(CollectionEntry {
                game_id: 1,
                status: Some(CollectionStatus::Completed),
                ..Default::default()
            })
            .collection_entry(CollectionEntry {
                game_id: 2,
                status: Some(CollectionStatus::Playing),
                ..Default::default()
            });

        let completed = cache
            .owned_games_with_status(Some(CollectionStatus::Completed))
            .await;
        assert_eq!(ids(&completed), vec![1]);
        assert_eq!(ids(&cache.owned_games_with_status(None).await), vec![1, 2]);
        assert!(cache
            .owned_games_with_status(Some(CollectionStatus::Wishlist))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_fetch() {
        let (backend, _, cache) = setup();
        backend
            .catalog_game(game(1, "Celeste"))
            .collection_entry(entry(1));
        let cache = Arc::new(cache);

        let (a, b) = tokio::join!(cache.owned_games(), cache.owned_games());
        assert_eq!(a, b);
        assert_eq!(backend.count(|c| *c == Call::FetchCollection), 1);
    }

    #[test]
    fn stale_commit_is_dropped() {
        let (_, _, cache) = setup();
        cache.commit(3, vec![entry(1)], vec![1], vec![game(1, "Celeste")]);
        cache.commit(2, vec![], vec![], vec![]);
        assert_eq!(ids(&cache.snapshot()), vec![1]);
    }
}
