use crate::documents::{CatalogGame, CollectionAction, CollectionStatus, Rating};

pub const FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

pub fn greeting(user_name: Option<&str>) -> String {
    match user_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("Hello, {name}!"),
        None => String::from("Hello!"),
    }
}

/// Summary of an applied collection change, e.g.
/// "Updated Hades with a status of Completed and with a rating of 9/10".
pub fn collection_summary(
    action: CollectionAction,
    game: &CatalogGame,
    rating: Option<Rating>,
    status: Option<CollectionStatus>,
) -> String {
    let mut text = format!("{} {}", action.past_tense(), game.name);

    if let Some(status) = status {
        text.push_str(&format!(" with a status of {}", status.label()));
    }

    if let Some(rating) = rating {
        if status.is_some() {
            text.push_str(" and");
        }
        text.push_str(&format!(" with a rating of {rating}/10"));
    }

    text
}

pub fn not_in_collection(game: &CatalogGame) -> String {
    format!(
        "{} is not in your collection. Would you like to add it first?",
        game.name
    )
}
