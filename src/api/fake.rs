//! In-memory backend and session used by unit tests.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use crate::{
    documents::{CatalogGame, ChatResponse, ClassifiedIntent, CollectionEntry, GameDetails},
    traits::{CollectionBackend, Session},
    Status,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Classify(String),
    Search(String),
    FetchCollection,
    FetchCatalog(Vec<u64>),
    Details(u64),
    Add(CollectionEntry),
    Update(CollectionEntry),
    Remove(u64),
}

#[derive(Default)]
struct State {
    intents: HashMap<String, ChatResponse>,
    search: HashMap<String, Vec<CatalogGame>>,
    catalog: Vec<CatalogGame>,
    collection: Vec<CollectionEntry>,
    classify_error: Option<Status>,
    search_error: Option<Status>,
    collection_error: Option<Status>,
    mutation_error: Option<Status>,
    applied_error: Option<Status>,
    calls: Vec<Call>,
}

/// Backend that answers from canned data and behaves like a collection store
/// for mutations.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the classifier response for an exact message text.
    pub fn classify(&self, text: &str, json: &str) -> &Self {
        let response = serde_json::from_str::<ChatResponse>(json).unwrap();
        self.state
            .lock()
            .unwrap()
            .intents
            .insert(text.to_owned(), response);
        self
    }

    /// Registers search results and adds the games to the catalog.
    pub fn search_results(&self, name: &str, games: Vec<CatalogGame>) -> &Self {
        let mut state = self.state.lock().unwrap();
        for game in &games {
            if state.catalog.iter().all(|g| g.id != game.id) {
                state.catalog.push(game.clone());
            }
        }
        state.search.insert(name.to_owned(), games);
        self
    }

    pub fn catalog_game(&self, game: CatalogGame) -> &Self {
        self.state.lock().unwrap().catalog.push(game);
        self
    }

    pub fn collection_entry(&self, entry: CollectionEntry) -> &Self {
        self.state.lock().unwrap().collection.push(entry);
        self
    }

    pub fn fail_classify(&self, status: Status) -> &Self {
        self.state.lock().unwrap().classify_error = Some(status);
        self
    }

    pub fn fail_search(&self, status: Status) -> &Self {
        self.state.lock().unwrap().search_error = Some(status);
        self
    }

    pub fn fail_collection(&self, status: Option<Status>) -> &Self {
        self.state.lock().unwrap().collection_error = status;
        self
    }

    pub fn fail_mutations(&self, status: Option<Status>) -> &Self {
        self.state.lock().unwrap().mutation_error = status;
        self
    }

    /// Mutations are applied to the store and then reported as failed.
    pub fn fail_after_apply(&self, status: Option<Status>) -> &Self {
        self.state.lock().unwrap().applied_error = status;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Calls that change the collection store.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Add(_) | Call::Update(_) | Call::Remove(_)))
            .collect()
    }

    pub fn count(&self, matcher: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matcher(call)).count()
    }

    pub fn stored_collection(&self) -> Vec<CollectionEntry> {
        self.state.lock().unwrap().collection.clone()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl CollectionBackend for FakeBackend {
    async fn classify_message(&self, text: &str) -> Result<ClassifiedIntent, Status> {
        self.record(Call::Classify(text.to_owned()));
        let state = self.state.lock().unwrap();
        if let Some(status) = &state.classify_error {
            return Err(status.clone());
        }
        match state.intents.get(text) {
            Some(response) => Ok(ClassifiedIntent::from(response.clone())),
            None => Ok(ClassifiedIntent::from(ChatResponse {
                category: Some("query".to_owned()),
                ..Default::default()
            })),
        }
    }

    async fn search_catalog(&self, name: &str) -> Result<Vec<CatalogGame>, Status> {
        self.record(Call::Search(name.to_owned()));
        let state = self.state.lock().unwrap();
        if let Some(status) = &state.search_error {
            return Err(status.clone());
        }
        Ok(state.search.get(name).cloned().unwrap_or_default())
    }

    async fn fetch_collection(&self) -> Result<Vec<CollectionEntry>, Status> {
        self.record(Call::FetchCollection);
        let state = self.state.lock().unwrap();
        match &state.collection_error {
            Some(status) => Err(status.clone()),
            None => Ok(state.collection.clone()),
        }
    }

    async fn fetch_catalog_by_ids(&self, ids: &[u64]) -> Result<Vec<CatalogGame>, Status> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.record(Call::FetchCatalog(ids.to_vec()));
        let state = self.state.lock().unwrap();
        Ok(state
            .catalog
            .iter()
            .filter(|game| ids.contains(&game.id))
            .cloned()
            .collect())
    }

    async fn fetch_game_details(&self, id: u64) -> Result<GameDetails, Status> {
        self.record(Call::Details(id));
        let state = self.state.lock().unwrap();
        match state.catalog.iter().find(|game| game.id == id) {
            Some(game) => Ok(GameDetails {
                id,
                name: game.name.clone(),
                ..Default::default()
            }),
            None => Err(Status::not_found(format!("game {id}"))),
        }
    }

    async fn add_entry(&self, entry: &CollectionEntry) -> Result<(), Status> {
        self.record(Call::Add(entry.clone()));
        let mut state = self.state.lock().unwrap();
        if let Some(status) = &state.mutation_error {
            return Err(status.clone());
        }
        state.collection.retain(|e| e.game_id != entry.game_id);
        state.collection.push(entry.clone());
        applied(&state)
    }

    async fn update_entry(&self, entry: &CollectionEntry) -> Result<(), Status> {
        self.record(Call::Update(entry.clone()));
        let mut state = self.state.lock().unwrap();
        if let Some(status) = &state.mutation_error {
            return Err(status.clone());
        }
        let existing = state
            .collection
            .iter_mut()
            .find(|e| e.game_id == entry.game_id)
            .ok_or_else(|| Status::not_found(format!("entry {}", entry.game_id)))?;
        if entry.rating.is_some() {
            existing.rating = entry.rating;
        }
        if entry.status.is_some() {
            existing.status = entry.status;
        }
        applied(&state)
    }

    async fn remove_entry(&self, game_id: u64) -> Result<(), Status> {
        self.record(Call::Remove(game_id));
        let mut state = self.state.lock().unwrap();
        if let Some(status) = &state.mutation_error {
            return Err(status.clone());
        }
        state.collection.retain(|e| e.game_id != game_id);
        applied(&state)
    }
}

fn applied(state: &State) -> Result<(), Status> {
    match &state.applied_error {
        Some(status) => Err(status.clone()),
        None => Ok(()),
    }
}

/// Session that counts logouts.
#[derive(Default)]
pub struct FakeSession {
    unauthorized: AtomicUsize,
}

impl FakeSession {
    pub fn logouts(&self) -> usize {
        self.unauthorized.load(Ordering::SeqCst)
    }
}

impl Session for FakeSession {
    fn access_token(&self) -> Option<String> {
        Some("test-token".to_owned())
    }

    fn on_unauthorized(&self) {
        self.unauthorized.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn game(id: u64, name: &str) -> CatalogGame {
    CatalogGame {
        id,
        name: name.to_owned(),
        slug: name.to_lowercase().replace(' ', "-"),
        ..Default::default()
    }
}
