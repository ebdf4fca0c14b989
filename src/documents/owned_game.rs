use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use super::{CatalogGame, CollectionEntry, CollectionStatus, Rating};

/// A catalog game joined with the user's collection entry for it.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct OwnedGame {
    pub game: CatalogGame,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CollectionStatus>,
}

impl OwnedGame {
    pub fn id(&self) -> u64 {
        self.game.id
    }

    /// Joins collection entries with catalog metadata on `game_id == id`.
    ///
    /// Output follows collection order. Entries without metadata and games
    /// without an entry are dropped. Repeated entries for the same game keep
    /// only the first occurrence.
    pub fn join(entries: &[CollectionEntry], games: &[CatalogGame]) -> Vec<OwnedGame> {
        let games = HashMap::<u64, &CatalogGame>::from_iter(games.iter().map(|g| (g.id, g)));
        let mut seen = HashSet::new();

        entries
            .iter()
            .filter(|entry| seen.insert(entry.game_id))
            .filter_map(|entry| {
                games.get(&entry.game_id).map(|game| OwnedGame {
                    game: (*game).clone(),
                    rating: entry.rating,
                    status: entry.status,
                })
            })
            .collect()
    }
}

impl fmt::Display for OwnedGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnedGame({}): '{}'", &self.game.id, &self.game.name)
    }
}
