use serde::{Deserialize, Serialize};

use super::Image;

/// Full catalog record of a single game.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct GameDetails {
    pub id: u64,
    pub name: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<Image>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<Image>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<Named>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Named>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub release_dates: Vec<ReleaseDate>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub involved_companies: Vec<InvolvedCompany>,
}

impl GameDetails {
    /// Returns the release date with the smallest timestamp.
    pub fn earliest_release(&self) -> Option<&ReleaseDate> {
        self.release_dates
            .iter()
            .filter(|release| release.date.is_some())
            .min_by_key(|release| release.date)
    }

    /// Returns the name of the first company credited as developer.
    pub fn developer(&self) -> Option<&str> {
        self.involved_companies
            .iter()
            .find(|involved| involved.developer)
            .map(|involved| involved.company.name.as_str())
    }

    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().map(|genre| genre.name.as_str()).collect()
    }

    pub fn platform_names(&self) -> Vec<&str> {
        self.platforms
            .iter()
            .map(|platform| platform.name.as_str())
            .collect()
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Named {
    pub name: String,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct ReleaseDate {
    #[serde(default)]
    pub date: Option<i64>,

    #[serde(default)]
    pub human: Option<String>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct InvolvedCompany {
    pub company: Named,

    #[serde(default)]
    pub developer: bool,

    #[serde(default)]
    pub publisher: bool,
}
