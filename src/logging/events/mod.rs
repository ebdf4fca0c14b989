mod chat_events;
mod collection_events;

pub use chat_events::*;
pub use collection_events::*;
