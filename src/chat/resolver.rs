use std::{fmt, sync::Arc};
use tracing::{debug, info, instrument, warn};

use crate::{
    documents::{
        CatalogGame, ClassifiedIntent, CollectionAction, CollectionStatus, IntentAction,
        IntentCategory, QuickReply, Rating,
    },
    library::CollectionCache,
    traits::{CollectionBackend, Session},
    Status,
};

/// An add offered to the user for a game they tried to update without owning
/// it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirmation {
    pub candidate: CatalogGame,
    pub rating: Option<Rating>,
    pub status: Option<CollectionStatus>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResolverState {
    #[default]
    Idle,
    Classifying,
    Resolving,
    Mutating(CollectionAction),

    /// Waiting for a yes/no quick reply. Holding the pending confirmation in
    /// the state itself keeps it to at most one.
    AwaitingConfirmation(PendingConfirmation),
}

impl fmt::Display for ResolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverState::Idle => write!(f, "Idle"),
            ResolverState::Classifying => write!(f, "Classifying"),
            ResolverState::Resolving => write!(f, "Resolving"),
            ResolverState::Mutating(action) => write!(f, "Mutating({action})"),
            ResolverState::AwaitingConfirmation(pending) => {
                write!(f, "AwaitingConfirmation({})", pending.candidate.name)
            }
        }
    }
}

/// How a chat turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// A mutation was acknowledged by the collection store.
    Applied {
        action: CollectionAction,
        game: CatalogGame,
        rating: Option<Rating>,
        status: Option<CollectionStatus>,
    },

    /// The user must confirm adding the game before it can be updated.
    ConfirmationRequested(PendingConfirmation),

    /// The user answered a confirmation with anything but yes.
    Declined,

    /// The catalog search returned nothing for the game name.
    NoMatch(String),

    /// Nothing actionable: a query, no game name, no or unknown action, or a
    /// quick reply with no confirmation pending.
    NoAction,

    /// The session was rejected and the session collaborator notified.
    SessionExpired,

    Failed(Status),
}

impl TurnOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TurnOutcome::Applied { .. } => "applied",
            TurnOutcome::ConfirmationRequested(_) => "confirmation_requested",
            TurnOutcome::Declined => "declined",
            TurnOutcome::NoMatch(_) => "no_match",
            TurnOutcome::NoAction => "no_action",
            TurnOutcome::SessionExpired => "session_expired",
            TurnOutcome::Failed(_) => "failed",
        }
    }
}

/// Turns classified chat messages into collection mutations.
///
/// The resolver handles one turn at a time and is `Idle` between turns unless
/// it is waiting for a confirmation reply. Callers that share a resolver
/// across tasks must serialize access to it.
pub struct IntentResolver {
    backend: Arc<dyn CollectionBackend>,
    cache: Arc<CollectionCache>,
    session: Arc<dyn Session>,
    state: ResolverState,
}

impl IntentResolver {
    pub fn new(
        backend: Arc<dyn CollectionBackend>,
        cache: Arc<CollectionCache>,
        session: Arc<dyn Session>,
    ) -> Self {
        IntentResolver {
            backend,
            cache,
            session,
            state: ResolverState::Idle,
        }
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingConfirmation> {
        match &self.state {
            ResolverState::AwaitingConfirmation(pending) => Some(pending),
            _ => None,
        }
    }

    /// Returns to `Idle`, dropping any pending confirmation. Used when a turn
    /// is abandoned, e.g. on timeout.
    pub fn reset(&mut self) {
        if self.state != ResolverState::Idle {
            warn!("Resetting resolver from {}", self.state);
        }
        self.state = ResolverState::Idle;
    }

    /// Processes a new human message. Any pending confirmation is discarded
    /// first, a new message always starts a fresh turn.
    #[instrument(level = "trace", skip(self))]
    pub async fn handle_message(&mut self, text: &str) -> TurnOutcome {
        if let Some(pending) = self.pending() {
            info!(
                "Discarding pending confirmation for '{}'",
                pending.candidate.name
            );
        }
        self.state = ResolverState::Idle;

        let outcome = self.run_turn(text).await;
        self.settle(outcome)
    }

    /// Processes a quick reply to the pending confirmation.
    #[instrument(level = "trace", skip(self))]
    pub async fn handle_reply(&mut self, reply: &QuickReply) -> TurnOutcome {
        let pending = match std::mem::take(&mut self.state) {
            ResolverState::AwaitingConfirmation(pending) => pending,
            _ => {
                debug!("Ignoring quick reply '{}', nothing pending", reply.value);
                return self.settle(TurnOutcome::NoAction);
            }
        };

        if !reply.is_affirmative() {
            info!("Add of '{}' declined", pending.candidate.name);
            return self.settle(TurnOutcome::Declined);
        }

        let outcome = self
            .mutate(
                CollectionAction::Add,
                pending.candidate,
                pending.rating,
                pending.status,
            )
            .await;
        self.settle(outcome)
    }

    async fn run_turn(&mut self, text: &str) -> TurnOutcome {
        self.transition(ResolverState::Classifying);
        let intent = match self.backend.classify_message(text).await {
            Ok(intent) => intent,
            Err(status) => return self.failure(status),
        };

        self.resolve(intent).await
    }

    async fn resolve(&mut self, intent: ClassifiedIntent) -> TurnOutcome {
        let name = match intent.game_name() {
            Some(name) => name.to_owned(),
            None => {
                debug!("No game in classification, nothing to do");
                return TurnOutcome::NoAction;
            }
        };

        let action = match intent.collection_action() {
            Some(action) => action,
            None => {
                match (&intent.category, &intent.action) {
                    (IntentCategory::Collection, Some(IntentAction::Unknown(action))) => {
                        warn!("Unhandled collection action '{action}' for '{name}'")
                    }
                    (IntentCategory::Unknown(category), _) => {
                        warn!("Unhandled intent category '{category}'")
                    }
                    _ => debug!("No collection action for '{name}', nothing to execute"),
                }
                return TurnOutcome::NoAction;
            }
        };

        self.transition(ResolverState::Resolving);
        let response = self.backend.search_catalog(&name).await;
        let candidate = match response {
            Ok(candidates) => match candidates.into_iter().next() {
                Some(candidate) => candidate,
                None => {
                    info!("No catalog match for '{name}'");
                    return TurnOutcome::NoMatch(name);
                }
            },
            Err(status) => return self.failure(status),
        };

        match action {
            CollectionAction::Add | CollectionAction::Remove => {
                self.mutate(action, candidate, intent.rating, intent.status)
                    .await
            }
            CollectionAction::Update => {
                match self.cache.refresh().await {
                    Ok(()) => {}
                    // The cache already notified the session.
                    Err(Status::Unauthorized(_)) => return TurnOutcome::SessionExpired,
                    Err(status) => return TurnOutcome::Failed(status),
                }

                let owned = self
                    .cache
                    .snapshot()
                    .iter()
                    .any(|game| game.id() == candidate.id);
                match owned {
                    true => {
                        self.mutate(action, candidate, intent.rating, intent.status)
                            .await
                    }
                    false => {
                        info!("'{}' is not owned, asking to add it first", candidate.name);
                        TurnOutcome::ConfirmationRequested(PendingConfirmation {
                            candidate,
                            rating: intent.rating,
                            status: intent.status,
                        })
                    }
                }
            }
        }
    }

    async fn mutate(
        &mut self,
        action: CollectionAction,
        game: CatalogGame,
        rating: Option<Rating>,
        status: Option<CollectionStatus>,
    ) -> TurnOutcome {
        self.transition(ResolverState::Mutating(action));
        let response = self.cache.mutate(action, &game, rating, status).await;
        match response {
            Ok(()) => TurnOutcome::Applied {
                action,
                game,
                rating,
                status,
            },
            // The cache already notified the session.
            Err(Status::Unauthorized(_)) => TurnOutcome::SessionExpired,
            Err(status) => TurnOutcome::Failed(status),
        }
    }

    fn failure(&self, status: Status) -> TurnOutcome {
        match status {
            Status::Unauthorized(msg) => {
                warn!("Session rejected: {msg}");
                self.session.on_unauthorized();
                TurnOutcome::SessionExpired
            }
            status => {
                warn!("Chat turn failed: {status}");
                TurnOutcome::Failed(status)
            }
        }
    }

    /// Ends a turn: a confirmation request parks the resolver in
    /// `AwaitingConfirmation`, every other outcome returns it to `Idle`.
    fn settle(&mut self, outcome: TurnOutcome) -> TurnOutcome {
        let next = match &outcome {
            TurnOutcome::ConfirmationRequested(pending) => {
                ResolverState::AwaitingConfirmation(pending.clone())
            }
            _ => ResolverState::Idle,
        };
        self.transition(next);
        outcome
    }

    fn transition(&mut self, next: ResolverState) {
        debug!("resolver {} -> {next}", self.state);
        self.state = next;
    }
}
