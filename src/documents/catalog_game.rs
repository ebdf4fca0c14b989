use serde::{Deserialize, Serialize};
use std::fmt;

use crate::util::images::{game_image_url, ImageSize};

/// A game as returned by the catalog search and lookup endpoints. Identity is
/// the catalog assigned `id`.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct CatalogGame {
    pub id: u64,
    pub name: String,

    #[serde(default)]
    pub slug: String,

    #[serde(default)]
    pub rating_count: u64,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<Image>,
}

impl CatalogGame {
    /// Returns the URL of the game's cover thumbnail, if it has a cover.
    pub fn cover_url(&self) -> Option<String> {
        self.cover
            .as_ref()
            .map(|cover| game_image_url(&cover.image_id, ImageSize::CoverSmall))
    }
}

impl fmt::Display for CatalogGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CatalogGame({}): '{}'", &self.id, &self.name)
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Image {
    pub image_id: String,
}
