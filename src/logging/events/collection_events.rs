use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use valuable::Valuable;

use crate::{
    documents::{CatalogGame, CollectionAction, CollectionEntry},
    log_event,
    logging::LogEvent,
    Status,
};

#[derive(Serialize, Deserialize, Valuable, Clone, Debug)]
pub enum CollectionEvent {
    Fetch(FetchRequest),
    Catalog(FetchRequest),
    Mutation(MutationRequest),
    Invalidate(u64),
}

impl CollectionEvent {
    pub fn fetch(response: &Result<Vec<CollectionEntry>, Status>) {
        log_event!(LogEvent::Collection(CollectionEvent::Fetch(FetchRequest {
            requested: 0,
            result: match response {
                Ok(entries) => Response::Success(entries.len()),
                Err(status) => Response::Error(status.to_string()),
            },
        })))
    }

    pub fn catalog(ids: &[u64], response: &Result<Vec<CatalogGame>, Status>) {
        log_event!(LogEvent::Collection(CollectionEvent::Catalog(
            FetchRequest {
                requested: ids.len(),
                result: match response {
                    Ok(games) => Response::Success(games.len()),
                    Err(status) => Response::Error(status.to_string()),
                },
            }
        )))
    }

    pub fn mutation(action: CollectionAction, game_id: u64, response: &Result<(), Status>) {
        log_event!(LogEvent::Collection(CollectionEvent::Mutation(
            MutationRequest {
                action: action.to_string(),
                game_id,
                error: match response {
                    Ok(()) => None,
                    Err(status) => Some(status.to_string()),
                },
            }
        )))
    }

    pub fn invalidate(generation: u64) {
        log_event!(LogEvent::Collection(CollectionEvent::Invalidate(
            generation
        )))
    }
}

#[derive(Serialize, Deserialize, Valuable, Clone, Debug)]
pub struct FetchRequest {
    requested: usize,
    result: Response,
}

#[derive(Serialize, Deserialize, Valuable, Clone, Debug)]
pub struct MutationRequest {
    action: String,
    game_id: u64,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize, Deserialize, Valuable, Clone, Debug)]
enum Response {
    Success(usize),
    Error(String),
}
