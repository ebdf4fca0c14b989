use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::Status;

/// A row of the user's collection. There is at most one entry per game.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub game_id: u64,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CollectionStatus>,
}

impl fmt::Display for CollectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionEntry({})", &self.game_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    Playing,
    Paused,
    Completed,
    Abandoned,
    Wishlist,
}

impl CollectionStatus {
    pub const ALL: [CollectionStatus; 5] = [
        CollectionStatus::Playing,
        CollectionStatus::Paused,
        CollectionStatus::Completed,
        CollectionStatus::Abandoned,
        CollectionStatus::Wishlist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Playing => "playing",
            CollectionStatus::Paused => "paused",
            CollectionStatus::Completed => "completed",
            CollectionStatus::Abandoned => "abandoned",
            CollectionStatus::Wishlist => "wishlist",
        }
    }

    /// Capitalized name used in chat replies.
    pub fn label(&self) -> &'static str {
        match self {
            CollectionStatus::Playing => "Playing",
            CollectionStatus::Paused => "Paused",
            CollectionStatus::Completed => "Completed",
            CollectionStatus::Abandoned => "Abandoned",
            CollectionStatus::Wishlist => "Wishlist",
        }
    }
}

impl FromStr for CollectionStatus {
    type Err = Status;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        CollectionStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Status::invalid_argument(format!("Unknown collection status '{s}'")))
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User rating of a game on a 1 to 10 scale.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Converts a loosely typed number, e.g. from the chat classifier. Only
    /// whole numbers within range are accepted.
    pub fn from_f64(value: f64) -> Result<Self, Status> {
        if value.fract() != 0.0 || value < Self::MIN as f64 || value > Self::MAX as f64 {
            return Err(Status::invalid_argument(format!(
                "Rating must be a whole number between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )));
        }
        Rating::try_from(value as u8)
    }
}

impl TryFrom<u8> for Rating {
    type Error = Status;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match (Self::MIN..=Self::MAX).contains(&value) {
            true => Ok(Rating(value)),
            false => Err(Status::invalid_argument(format!(
                "Rating must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            ))),
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
