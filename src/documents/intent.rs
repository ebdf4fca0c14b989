use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

use super::{CollectionStatus, Rating};
use crate::Status;

/// Response body of the chat classifier endpoint. Fields are kept loosely
/// typed so that unexpected classifier output can be rejected per field
/// instead of failing the whole turn.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct ChatResponse {
    #[serde(default, deserialize_with = "string_or_none")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "string_or_none")]
    pub action: Option<String>,

    #[serde(default, deserialize_with = "string_or_none")]
    pub game: Option<String>,

    #[serde(default, deserialize_with = "string_or_none")]
    pub status: Option<String>,

    /// A number or a numeric string.
    #[serde(default)]
    pub rating: Option<Value>,
}

/// Accepts any JSON value; only strings are kept.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        Value::Null => Ok(None),
        other => {
            warn!("Ignoring non-string classifier field: {other}");
            Ok(None)
        }
    }
}

fn parse_rating(value: &Value) -> Result<Rating, Status> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(number) => Rating::from_f64(number),
        None => Err(Status::invalid_argument(format!(
            "Rating is not a number: {value}"
        ))),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CollectionAction {
    Add,
    Remove,
    Update,
}

impl CollectionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionAction::Add => "add",
            CollectionAction::Remove => "remove",
            CollectionAction::Update => "update",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            CollectionAction::Add => "Added",
            CollectionAction::Remove => "Removed",
            CollectionAction::Update => "Updated",
        }
    }
}

impl fmt::Display for CollectionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentCategory {
    Collection,
    Query,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentAction {
    Collection(CollectionAction),
    Unknown(String),
}

/// Structured intent derived from free-form user text.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedIntent {
    pub category: IntentCategory,
    pub action: Option<IntentAction>,
    pub game_name: Option<String>,
    pub rating: Option<Rating>,
    pub status: Option<CollectionStatus>,
}

impl ClassifiedIntent {
    /// Returns the trimmed game name, or None if the classifier did not
    /// identify one.
    pub fn game_name(&self) -> Option<&str> {
        self.game_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Returns the collection action only for `collection` intents with a
    /// recognised action.
    pub fn collection_action(&self) -> Option<CollectionAction> {
        match (&self.category, &self.action) {
            (IntentCategory::Collection, Some(IntentAction::Collection(action))) => Some(*action),
            _ => None,
        }
    }
}

impl From<ChatResponse> for ClassifiedIntent {
    fn from(response: ChatResponse) -> Self {
        let category = match response.category {
            Some(category) => match category.trim().to_lowercase().as_str() {
                "collection" => IntentCategory::Collection,
                "query" => IntentCategory::Query,
                _ => IntentCategory::Unknown(category),
            },
            None => IntentCategory::Unknown(String::default()),
        };

        let action = response
            .action
            .as_deref()
            .map(str::trim)
            .filter(|action| !action.is_empty())
            .map(|action| match action.to_lowercase().as_str() {
                "add" => IntentAction::Collection(CollectionAction::Add),
                "remove" => IntentAction::Collection(CollectionAction::Remove),
                "update" => IntentAction::Collection(CollectionAction::Update),
                _ => IntentAction::Unknown(action.to_owned()),
            });

        let rating = response.rating.and_then(|rating| match parse_rating(&rating) {
            Ok(rating) => Some(rating),
            Err(status) => {
                warn!("Dropping classifier rating: {status}");
                None
            }
        });

        let status = response
            .status
            .as_deref()
            .filter(|status| !status.trim().is_empty())
            .and_then(|status| match status.parse::<CollectionStatus>() {
                Ok(status) => Some(status),
                Err(status) => {
                    warn!("Dropping classifier status: {status}");
                    None
                }
            });

        ClassifiedIntent {
            category,
            action,
            game_name: response.game,
            rating,
            status,
        }
    }
}
