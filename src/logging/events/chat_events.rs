use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use valuable::Valuable;

use crate::{
    documents::{CatalogGame, ClassifiedIntent},
    log_event,
    logging::LogEvent,
    Status,
};

#[derive(Serialize, Deserialize, Valuable, Clone, Debug)]
pub enum ChatEvent {
    Classify(ClassifyRequest),
    Search(SearchRequest),
    Turn(TurnRecord),
}

impl ChatEvent {
    pub fn classify(text: &str, response: &Result<ClassifiedIntent, Status>) {
        log_event!(LogEvent::Chat(ChatEvent::Classify(ClassifyRequest {
            text: text.to_owned(),
            result: match response {
                Ok(intent) => Response::Success(format!("{intent:?}")),
                Err(status) => Response::Error(status.to_string()),
            },
        })))
    }

    pub fn search(name: &str, response: &Result<Vec<CatalogGame>, Status>) {
        log_event!(LogEvent::Chat(ChatEvent::Search(SearchRequest {
            name: name.to_owned(),
            result: match response {
                Ok(games) => SearchResponse::Success(games.len()),
                Err(status) => SearchResponse::Error(status.to_string()),
            },
        })))
    }

    pub fn turn(outcome: &str, game: Option<&CatalogGame>) {
        log_event!(LogEvent::Chat(ChatEvent::Turn(TurnRecord {
            outcome: outcome.to_owned(),
            game_id: game.map(|game| game.id),
        })))
    }
}

#[derive(Serialize, Deserialize, Valuable, Clone, Debug)]
pub struct ClassifyRequest {
    text: String,
    result: Response,
}

#[derive(Serialize, Deserialize, Valuable, Clone, Debug)]
pub struct SearchRequest {
    name: String,
    result: SearchResponse,
}

#[derive(Serialize, Deserialize, Valuable, Clone, Debug)]
pub struct TurnRecord {
    outcome: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    game_id: Option<u64>,
}

#[derive(Serialize, Deserialize, Valuable, Clone, Debug)]
enum Response {
    Success(String),
    Error(String),
}

#[derive(Serialize, Deserialize, Valuable, Clone, Debug)]
enum SearchResponse {
    Success(usize),
    Error(String),
}
