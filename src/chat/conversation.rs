use tokio::sync::broadcast;

use crate::documents::ConversationMessage;

/// Buffer for UI subscribers. Slow subscribers observe a lag error instead
/// of blocking the conversation.
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    MessageAppended(ConversationMessage),
    Typing(bool),
}

/// Append-only message log plus the typing indicator.
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    typing: bool,

    // Turns sent but not yet finished, queued ones included.
    turns: usize,
    events: broadcast::Sender<ConversationEvent>,
}

impl Conversation {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Conversation {
            messages: vec![],
            typing: false,
            turns: 0,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn append(&mut self, message: ConversationMessage) {
        self.messages.push(message.clone());
        self.publish(ConversationEvent::MessageAppended(message));
    }

    /// Sets the typing indicator. Only actual changes are published.
    pub fn set_typing(&mut self, typing: bool) {
        if self.typing == typing {
            return;
        }
        self.typing = typing;
        self.publish(ConversationEvent::Typing(typing));
    }

    /// Marks a turn as started. Typing shows from the first started turn
    /// until the last one ends.
    pub fn begin_turn(&mut self) {
        self.turns += 1;
        self.set_typing(true);
    }

    pub fn end_turn(&mut self) {
        self.turns = self.turns.saturating_sub(1);
        if self.turns == 0 {
            self.set_typing(false);
        }
    }

    fn publish(&self, event: ConversationEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_keeps_creation_order() {
        let mut conversation = Conversation::new();
        conversation.append(ConversationMessage::bot("Hello!"));
        conversation.append(ConversationMessage::human("add celeste"));
        conversation.append(ConversationMessage::bot("Added Celeste"));

        let texts = conversation
            .messages()
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["Hello!", "add celeste", "Added Celeste"]);
    }

    #[test]
    fn typing_publishes_changes_only() {
        let mut conversation = Conversation::new();
        let mut events = conversation.subscribe();

        conversation.set_typing(true);
        conversation.set_typing(true);
        conversation.set_typing(false);
        conversation.set_typing(false);

        assert_eq!(events.try_recv().unwrap(), ConversationEvent::Typing(true));
        assert_eq!(events.try_recv().unwrap(), ConversationEvent::Typing(false));
        assert!(events.try_recv().is_err());
        assert!(!conversation.is_typing());
    }

    #[test]
    fn typing_spans_queued_turns() {
        let mut conversation = Conversation::new();
        let mut events = conversation.subscribe();

        conversation.begin_turn();
        conversation.begin_turn();
        conversation.end_turn();
        assert!(conversation.is_typing());
        conversation.end_turn();
        assert!(!conversation.is_typing());

        // Unbalanced end is ignored.
        conversation.end_turn();

        assert_eq!(events.try_recv().unwrap(), ConversationEvent::Typing(true));
        assert_eq!(events.try_recv().unwrap(), ConversationEvent::Typing(false));
        assert!(events.try_recv().is_err());
    }
}
