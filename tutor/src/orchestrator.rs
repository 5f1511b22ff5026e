use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, instrument, warn};

use crate::errors::TutorError;
use crate::gateway::GatewayRef;
use crate::message::{ChatMessage, MessagePatch};
use crate::settings::UserSettings;
use crate::store::MessageStore;

/// Shown when generation succeeds without producing any text
pub const FALLBACK_TEXT: &str = "I couldn't generate a response.";

/// Shown when the lesson text could not be generated
pub const ERROR_TEXT: &str = "Sorry, I encountered an error connecting to the AI tutor.";

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Text stage succeeded; flags tell which assets were attached
    Completed { image: bool, audio: bool },
    /// Text stage failed and the error text was shown instead
    TextFailed,
}

/// Identifiers and outcome of a finished turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub user_message_id: String,
    pub model_message_id: String,
    pub outcome: TurnOutcome,
}

/// A turn running in the background
#[derive(Debug)]
pub struct TurnHandle {
    pub user_message_id: String,
    pub model_message_id: String,
    pub join: JoinHandle<TurnReport>,
}

impl TurnHandle {
    /// Waits for the turn to settle. Errors only if the turn panicked.
    pub async fn wait(self) -> Result<TurnReport, JoinError> {
        self.join.await
    }
}

/// Holds the busy flag for one turn.
///
/// Dropping it clears the flag and, if the placeholder never left the
/// loading state, replaces it with the error text. This also runs when the
/// turn unwinds from a panic.
struct TurnGuard {
    busy: Arc<AtomicBool>,
    store: MessageStore,
    placeholder_id: String,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        let still_loading = self
            .store
            .get(&self.placeholder_id)
            .is_some_and(|message| message.is_loading);
        if still_loading {
            warn!(id = %self.placeholder_id, "Turn ended with placeholder still loading");
            self.store
                .update_by_id(&self.placeholder_id, MessagePatch::finished(ERROR_TEXT));
        }
        self.busy.store(false, Ordering::Release);
    }
}

/// A turn whose messages are in the store and whose generation has not run yet
struct PendingTurn {
    utterance: String,
    user_message_id: String,
    guard: TurnGuard,
}

/// Drives a learner's message through text, image and audio generation.
#[derive(Clone)]
pub struct Tutor {
    store: MessageStore,
    gateway: GatewayRef,
    busy: Arc<AtomicBool>,
}

impl Tutor {
    pub fn new(store: MessageStore, gateway: GatewayRef) -> Self {
        Self {
            store,
            gateway,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// True while a turn is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Starts a turn in the background.
    ///
    /// The learner's message and the placeholder are in the store when this
    /// returns; progress is observed through the store. The handle resolves
    /// once the turn has fully settled.
    pub fn send_message(
        &self,
        utterance: impl Into<String>,
        settings: UserSettings,
    ) -> Result<TurnHandle, TutorError> {
        let turn = self.begin_turn(utterance.into())?;
        let user_message_id = turn.user_message_id.clone();
        let model_message_id = turn.guard.placeholder_id.clone();

        let tutor = self.clone();
        let join = tokio::spawn(async move { tutor.run_turn(turn, settings).await });

        Ok(TurnHandle {
            user_message_id,
            model_message_id,
            join,
        })
    }

    /// Runs a full turn and waits for it to settle.
    pub async fn handle_send_message(
        &self,
        utterance: impl Into<String>,
        settings: UserSettings,
    ) -> Result<TurnReport, TutorError> {
        let turn = self.begin_turn(utterance.into())?;
        Ok(self.run_turn(turn, settings).await)
    }

    fn begin_turn(&self, utterance: String) -> Result<PendingTurn, TutorError> {
        if utterance.trim().is_empty() {
            return Err(TutorError::EmptyUtterance);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TutorError::Busy);
        }

        let user_message = ChatMessage::user(utterance.clone());
        let placeholder = ChatMessage::placeholder();
        let user_message_id = user_message.id.clone();
        let placeholder_id = placeholder.id.clone();

        self.store.append(user_message);
        self.store.append(placeholder);

        Ok(PendingTurn {
            utterance,
            user_message_id,
            guard: TurnGuard {
                busy: Arc::clone(&self.busy),
                store: self.store.clone(),
                placeholder_id,
            },
        })
    }

    #[instrument(skip_all, fields(model_message_id = %turn.guard.placeholder_id, style = %settings.learning_style))]
    async fn run_turn(&self, turn: PendingTurn, settings: UserSettings) -> TurnReport {
        let PendingTurn {
            utterance,
            user_message_id,
            guard,
        } = turn;
        let model_message_id = guard.placeholder_id.clone();

        let outcome = match self
            .gateway
            .generate_text(&utterance, settings.learning_style)
            .await
        {
            Ok(text) => {
                let text = text.filter(|text| !text.is_empty());
                let shown = text.as_deref().unwrap_or(FALLBACK_TEXT);
                self.store
                    .update_by_id(&model_message_id, MessagePatch::finished(shown));
                debug!(has_text = text.is_some(), "Lesson text stored");

                self.attach_assets(&model_message_id, &utterance, text.as_deref(), &settings)
                    .await
            }
            Err(e) => {
                error!(error = %e, "Interaction failed");
                self.store
                    .update_by_id(&model_message_id, MessagePatch::finished(ERROR_TEXT));
                TurnOutcome::TextFailed
            }
        };

        drop(guard);
        info!(?outcome, "Turn finished");

        TurnReport {
            user_message_id,
            model_message_id,
            outcome,
        }
    }

    /// Fetches the selected assets concurrently and merges the ones that arrived.
    async fn attach_assets(
        &self,
        model_message_id: &str,
        utterance: &str,
        text: Option<&str>,
        settings: &UserSettings,
    ) -> TurnOutcome {
        let want_image = settings.wants_visual();
        let audio_source = text.filter(|_| settings.wants_audio());

        let image = async {
            if !want_image {
                return None;
            }
            match self.gateway.generate_image(utterance).await {
                Ok(image) => image,
                Err(e) => {
                    warn!(error = %e, "Image generation failed");
                    None
                }
            }
        };

        let audio = async {
            let source = audio_source?;
            match self.gateway.generate_audio(source).await {
                Ok(audio) => audio,
                Err(e) => {
                    warn!(error = %e, "Audio generation failed");
                    None
                }
            }
        };

        let (image, audio) = tokio::join!(image, audio);
        let outcome = TurnOutcome::Completed {
            image: image.is_some(),
            audio: audio.is_some(),
        };

        let patch = MessagePatch::assets(image, audio);
        if !patch.is_empty() {
            self.store.update_by_id(model_message_id, patch);
        }

        outcome
    }
}
