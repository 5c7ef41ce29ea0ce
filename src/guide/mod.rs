pub mod classifier;
pub mod conversation_state;
pub mod dynamic;
pub mod error;
pub mod knowledge;
pub mod pathway;
pub mod ports;
pub mod session;

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use classifier::Tone;
use conversation_state::ConversationState;
use error::{GenerationError, GuideError, SessionError};
use pathway::QuestionStrategy;
use ports::{DeliveryChannel, TextGenerator};
use session::SessionStore;

pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(8);

/// The outcome of a turn that was also pushed through the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub delivered: bool,
}

/// Turns inbound messages into first-aid replies, one sender at a time.
pub struct TurnOrchestrator {
    sessions: SessionStore,
    generator: Option<Arc<dyn TextGenerator>>,
    delivery: Option<Arc<dyn DeliveryChannel>>,
    strategy: QuestionStrategy,
    generation_timeout: Duration,
    rng: Mutex<StdRng>,
}

impl TurnOrchestrator {
    pub fn new(sessions: SessionStore) -> Self {
        Self {
            sessions,
            generator: None,
            delivery: None,
            strategy: QuestionStrategy::Pathway,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_delivery(mut self, delivery: Arc<dyn DeliveryChannel>) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn with_strategy(mut self, strategy: QuestionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Strategy in effect. Dynamic questions need a generator.
    pub fn strategy(&self) -> QuestionStrategy {
        match (self.strategy, &self.generator) {
            (QuestionStrategy::Dynamic, Some(_)) => QuestionStrategy::Dynamic,
            _ => QuestionStrategy::Pathway,
        }
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handles one inbound message and returns the reply text.
    ///
    /// Never fails: anything that goes wrong inside the turn is logged and
    /// replaced by `knowledge::SAFE_DEFAULT_REPLY`.
    pub async fn handle_inbound_message(
        &self,
        sender_id: &str,
        body: &str,
        is_first_contact: bool,
    ) -> String {
        let handle = self.sessions.get_or_create(sender_id);
        let mut state = handle.lock().await;
        state.touch();

        if let Err(e) = state.validate() {
            warn!(sender = %sender_id, error = %e, "Resetting corrupted conversation state");
            state.reset();
        }

        let turn = AssertUnwindSafe(self.run_turn(&mut *state, body, is_first_contact))
            .catch_unwind()
            .await;

        match turn {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!(sender = %sender_id, error = %e, "Turn failed, resetting state");
                state.reset();
                knowledge::SAFE_DEFAULT_REPLY.to_string()
            }
            Err(_) => {
                error!(sender = %sender_id, "Turn panicked, sending safe default reply");
                knowledge::SAFE_DEFAULT_REPLY.to_string()
            }
        }
    }

    /// Handles a message and delivers the reply through the configured channel.
    ///
    /// The reply text is returned even when delivery fails so the transport
    /// can still hand it back to the sender.
    pub async fn respond(&self, sender_id: &str, body: &str, is_first_contact: bool) -> Reply {
        let text = self.handle_inbound_message(sender_id, body, is_first_contact).await;

        let delivered = match &self.delivery {
            Some(channel) => match channel.deliver(sender_id, &text).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        sender = %sender_id,
                        error = %e,
                        "Delivery failed, returning reply to caller"
                    );
                    false
                }
            },
            None => false,
        };

        Reply { text, delivered }
    }

    pub fn reset_session(&self, sender_id: &str) -> Result<(), SessionError> {
        self.sessions.reset(sender_id)
    }

    async fn run_turn(
        &self,
        state: &mut ConversationState,
        body: &str,
        is_first_contact: bool,
    ) -> Result<String, GuideError> {
        if is_first_contact && !state.has_shown_initial_message {
            return Ok(self.initial_turn(state, body).await);
        }
        self.dialogue_turn(state, body).await
    }

    async fn initial_turn(&self, state: &mut ConversationState, body: &str) -> String {
        info!("Sending initial guidance to {}", state.sender_id);
        let guidance = self.initial_guidance(body).await;
        let question = pathway::cold_start_question(state, &mut *self.rng());
        state.mark_initial_shown();
        format!("{}\n\n{}", guidance, question)
    }

    async fn initial_guidance(&self, body: &str) -> String {
        if let (QuestionStrategy::Dynamic, Some(generator)) = (self.strategy(), &self.generator) {
            let prompt = dynamic::guidance_prompt(body);
            match self.bounded(generator.generate(&prompt)).await {
                Ok(text) if !text.trim().is_empty() => return text.trim().to_string(),
                Ok(_) => warn!("Generated guidance was empty, using fixed guidance"),
                Err(e) => warn!(error = %e, "Guidance generation failed, using fixed guidance"),
            }
        }
        knowledge::INITIAL_GUIDANCE
            .choose(&mut *self.rng())
            .copied()
            .unwrap_or(knowledge::INITIAL_GUIDANCE[0])
            .to_string()
    }

    async fn dialogue_turn(
        &self,
        state: &mut ConversationState,
        body: &str,
    ) -> Result<String, GuideError> {
        let signals = classifier::classify(body);
        debug!(sender = %state.sender_id, ?signals, "Classified reply");
        classifier::apply_context(body, state);

        let acknowledgment = self.acknowledgment(signals.tone(), state.last_question.as_deref());
        let question = self.next_question(state, body).await?;
        state.replies_received += 1;

        Ok(format!("{}\n\n{}", acknowledgment, question))
    }

    fn acknowledgment(&self, tone: Tone, last_question: Option<&str>) -> String {
        let pool: &[&str] = match tone {
            Tone::Positive => &knowledge::POSITIVE_ACKNOWLEDGMENTS,
            Tone::Negative => &knowledge::NEGATIVE_ACKNOWLEDGMENTS,
            Tone::NeedsHelp => &knowledge::HELP_ACKNOWLEDGMENTS,
            Tone::Neutral => &knowledge::NEUTRAL_ACKNOWLEDGMENTS,
        };
        let ack = pool.choose(&mut *self.rng()).copied().unwrap_or(pool[0]);

        match (tone, last_question.and_then(knowledge::help_for)) {
            (Tone::NeedsHelp, Some(detail)) => format!("{} {}", ack, detail),
            _ => ack.to_string(),
        }
    }

    async fn next_question(
        &self,
        state: &mut ConversationState,
        body: &str,
    ) -> Result<String, GuideError> {
        let generator = match (self.strategy(), &self.generator) {
            (QuestionStrategy::Dynamic, Some(generator)) if !state.needs_cold_start() => generator,
            _ => return pathway::next_question(state, &mut *self.rng()),
        };

        let generated = self
            .bounded(dynamic::generate_dynamic_question(generator.as_ref(), body, state))
            .await;
        match generated {
            Ok(question) => {
                state.record_question(&question);
                Ok(question)
            }
            Err(e) => {
                warn!(sender = %state.sender_id, error = %e, "Falling back to opening questions");
                Ok(pathway::cold_start_question(state, &mut *self.rng()))
            }
        }
    }

    /// Runs a generation call under the configured time limit.
    async fn bounded<F>(&self, call: F) -> Result<String, GenerationError>
    where
        F: std::future::Future<Output = Result<String, GenerationError>>,
    {
        tokio::time::timeout(self.generation_timeout, call)
            .await
            .unwrap_or(Err(GenerationError::Timeout(self.generation_timeout)))
    }
}
