use crate::{
    documents::{CatalogGame, CollectionAction},
    Status,
};

use super::counters::*;

pub struct ChatCounters;

impl ChatCounters {
    pub fn mutation(action: CollectionAction, game: &CatalogGame) {
        counter(
            &format!("chat_{action}"),
            &format!("Chat {action}: {}", game_description(game)),
        )
    }

    pub fn confirmation_requested(game: &CatalogGame) {
        counter(
            "chat_confirmation_requested",
            &format!("Chat asked to add first: {}", game_description(game)),
        )
    }

    pub fn no_match(name: &str) {
        counter(
            "chat_no_match",
            &format!("Chat found no catalog match for '{name}'"),
        )
    }

    pub fn session_expired() {
        counter("chat_session_expired", "Chat turn ended by expired session")
    }

    pub fn turn_fail(status: &Status) {
        error_counter("chat_turn_fail", "Chat turn failed", status)
    }
}
