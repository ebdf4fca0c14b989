use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{sync::broadcast, time::timeout};
use tracing::{instrument, warn};

use crate::{
    documents::{ConversationMessage, QuickReply},
    library::CollectionCache,
    logging::{ChatCounters, ChatEvent},
    traits::{CollectionBackend, Session},
    util::config::Config,
    Status,
};

use super::{
    replies, Conversation, ConversationEvent, IntentResolver, PendingConfirmation, TurnOutcome,
};

/// A single conversation: the message log in front of an intent resolver.
///
/// Turns are serialized by a per-conversation lock around the resolver. The
/// human message is appended before the lock is taken, so input shows up in
/// the log right away even while an earlier turn is still running.
pub struct ChatSession {
    conversation: Mutex<Conversation>,
    resolver: tokio::sync::Mutex<IntentResolver>,
    turn_timeout: Duration,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn CollectionBackend>,
        cache: Arc<CollectionCache>,
        session: Arc<dyn Session>,
        config: &Config,
    ) -> Self {
        let mut conversation = Conversation::new();
        conversation.append(ConversationMessage::bot(replies::greeting(
            config.user_name.as_deref(),
        )));

        ChatSession {
            conversation: Mutex::new(conversation),
            resolver: tokio::sync::Mutex::new(IntentResolver::new(backend, cache, session)),
            turn_timeout: config.turn_timeout(),
        }
    }

    pub fn with_turn_timeout(mut self, turn_timeout: Duration) -> Self {
        self.turn_timeout = turn_timeout;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.conversation().subscribe()
    }

    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.conversation().messages().to_vec()
    }

    pub fn is_typing(&self) -> bool {
        self.conversation().is_typing()
    }

    /// The confirmation waiting for a quick reply, if any. Waits for an
    /// in-flight turn to finish.
    pub async fn pending_confirmation(&self) -> Option<PendingConfirmation> {
        self.resolver.lock().await.pending().cloned()
    }

    /// Handles a message typed by the user.
    #[instrument(level = "trace", skip(self))]
    pub async fn on_send(&self, text: &str) -> TurnOutcome {
        if text.trim().is_empty() {
            return TurnOutcome::NoAction;
        }
        self.conversation().append(ConversationMessage::human(text));
        let _turn = TurnGuard::begin(self);

        let mut resolver = self.resolver.lock().await;
        let outcome = match timeout(self.turn_timeout, resolver.handle_message(text)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                resolver.reset();
                self.timed_out()
            }
        };

        self.respond(&outcome);
        outcome
    }

    /// Handles the selection of a quick reply. The reply title is echoed into
    /// the log as a human message before the resolver acts on it.
    #[instrument(level = "trace", skip(self))]
    pub async fn on_quick_reply(&self, reply: QuickReply) -> TurnOutcome {
        self.conversation()
            .append(ConversationMessage::human(reply.title.clone()));
        let _turn = TurnGuard::begin(self);

        let mut resolver = self.resolver.lock().await;
        let outcome = match timeout(self.turn_timeout, resolver.handle_reply(&reply)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                resolver.reset();
                self.timed_out()
            }
        };

        self.respond(&outcome);
        outcome
    }

    fn timed_out(&self) -> TurnOutcome {
        warn!("Chat turn timed out after {:?}", self.turn_timeout);
        TurnOutcome::Failed(Status::internal(format!(
            "Chat turn timed out after {:?}",
            self.turn_timeout
        )))
    }

    /// Appends the bot response for `outcome`.
    fn respond(&self, outcome: &TurnOutcome) {
        let response = match outcome {
            TurnOutcome::Applied {
                action,
                game,
                rating,
                status,
            } => {
                ChatCounters::mutation(*action, game);
                ChatEvent::turn(outcome.label(), Some(game));
                Some(
                    ConversationMessage::bot(replies::collection_summary(
                        *action, game, *rating, *status,
                    ))
                    .with_image(game.cover_url()),
                )
            }
            TurnOutcome::ConfirmationRequested(pending) => {
                ChatCounters::confirmation_requested(&pending.candidate);
                ChatEvent::turn(outcome.label(), Some(&pending.candidate));
                Some(
                    ConversationMessage::bot(replies::not_in_collection(&pending.candidate))
                        .with_quick_replies(QuickReply::confirmation()),
                )
            }
            TurnOutcome::Failed(status) => {
                ChatCounters::turn_fail(status);
                ChatEvent::turn(outcome.label(), None);
                Some(ConversationMessage::bot(replies::FAILURE_MESSAGE))
            }
            TurnOutcome::NoMatch(name) => {
                ChatCounters::no_match(name);
                ChatEvent::turn(outcome.label(), None);
                None
            }
            TurnOutcome::SessionExpired => {
                ChatCounters::session_expired();
                ChatEvent::turn(outcome.label(), None);
                None
            }
            TurnOutcome::Declined | TurnOutcome::NoAction => {
                ChatEvent::turn(outcome.label(), None);
                None
            }
        };

        if let Some(message) = response {
            self.conversation().append(message);
        }
    }

    fn conversation(&self) -> MutexGuard<'_, Conversation> {
        self.conversation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a turn counted in the conversation until it ends, including when
/// the turn future is dropped before completing.
struct TurnGuard<'a> {
    session: &'a ChatSession,
}

impl<'a> TurnGuard<'a> {
    fn begin(session: &'a ChatSession) -> Self {
        session.conversation().begin_turn();
        TurnGuard { session }
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.session.conversation().end_turn();
    }
}
