mod conversation;
pub mod replies;
mod resolver;
mod session;

pub use conversation::{Conversation, ConversationEvent};
pub use resolver::{IntentResolver, PendingConfirmation, ResolverState, TurnOutcome};
pub use session::ChatSession;
