mod catalog_game;
mod collection_entry;
mod game_details;
mod intent;
mod message;
mod owned_game;

pub use catalog_game::*;
pub use collection_entry::*;
pub use game_details::*;
pub use intent::*;
pub use message::*;
pub use owned_game::*;
