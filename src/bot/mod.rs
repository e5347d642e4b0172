//! Conversation state machine.
//!
//! A submission is answered with one selection control per operation. A
//! selection is acknowledged inline by replacing the prompt text, and the
//! analysis itself runs on a detached task so slow vision calls never hold up
//! the update loop.

pub mod analysis;
pub mod messages;
pub mod transport;
pub mod vision;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::annotation::{AnnotationEngine, AnnotationOutcome};
use crate::config::BotConfig;
use crate::dispatch::{DispatchProtocol, Selection};
use crate::error::{DispatchError, RenderError};
use crate::operation::OperationKind;

use messages::{
    CANCEL_LABEL, IMAGE_CONTEXT_MARKER, MESSAGE_ACTION_IMAGE, MESSAGE_CANCELED,
    MESSAGE_FAILED_TO_GET_FILE, MESSAGE_UNPROCESSABLE,
};
use transport::{
    ChatAction, ChatId, IncomingMessage, MessageId, Messenger, PromptMessage, SelectionControl,
    SelectionEvent, SendOptions, Update,
};
use vision::{FACE_ATTRIBUTES, Vision};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    AwaitingSubmission,
    OperationOffered,
    Processing(OperationKind),
    Completed,
    Canceled,
    Failed,
}

/// State reached by a selection, plus the spawned analysis job if one started.
///
/// The job resolves to `Completed` or `Failed`. Dropping the handle detaches
/// the job; it is never canceled.
#[derive(Debug)]
pub struct SelectionOutcome {
    pub state: InteractionState,
    pub job: Option<JoinHandle<InteractionState>>,
}

impl SelectionOutcome {
    fn settled(state: InteractionState) -> Self {
        Self { state, job: None }
    }
}

#[derive(Debug, Clone)]
pub struct BotOptions {
    pub max_concurrent_jobs: Option<usize>,
    pub poll_interval: Duration,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: None,
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl From<&BotConfig> for BotOptions {
    fn from(config: &BotConfig) -> Self {
        Self {
            max_concurrent_jobs: config.max_concurrent_jobs,
            poll_interval: config.poll_interval(),
        }
    }
}

struct Shared<M, V> {
    messenger: M,
    vision: V,
    protocol: DispatchProtocol,
    engine: AnnotationEngine,
    jobs: Option<Semaphore>,
    poll_interval: Duration,
}

pub struct Bot<M, V> {
    shared: Arc<Shared<M, V>>,
}

impl<M, V> Clone for Bot<M, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<M: Messenger, V: Vision> Bot<M, V> {
    pub fn new(
        messenger: M,
        vision: V,
        protocol: DispatchProtocol,
        engine: AnnotationEngine,
        options: BotOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                messenger,
                vision,
                protocol,
                engine,
                jobs: options.max_concurrent_jobs.map(|n| Semaphore::new(n.max(1))),
                poll_interval: options.poll_interval,
            }),
        }
    }

    pub fn messenger(&self) -> &M {
        &self.shared.messenger
    }

    pub fn vision(&self) -> &V {
        &self.shared.vision
    }

    /// Polls and handles updates one batch at a time until `shutdown` resolves.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        info!("Waiting for updates");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                polled = self.shared.messenger.poll_updates() => match polled {
                    Ok(updates) => {
                        for update in updates {
                            self.handle_update(update).await;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Error while receiving updates");
                        tokio::select! {
                            _ = &mut shutdown => break,
                            _ = tokio::time::sleep(self.shared.poll_interval) => {}
                        }
                    }
                },
            }
        }

        info!("Stopped receiving updates");
    }

    pub async fn handle_update(&self, update: Update) -> Option<JoinHandle<InteractionState>> {
        match update {
            Update::Message(message) => {
                self.handle_submission(&message).await;
                None
            }
            Update::Selection(event) => self.handle_selection(&event).await.job,
            Update::Unsupported => {
                warn!("Update not processable");
                None
            }
        }
    }

    /// Offers the operations for an image, or sends the help text otherwise.
    pub async fn handle_submission(&self, message: &IncomingMessage) -> InteractionState {
        let reply = SendOptions::reply_to(message.message_id);
        let (text, options, state) = match message.image_reference() {
            Some(reference) => match self.prompt_controls(reference) {
                Ok(controls) => (
                    MESSAGE_ACTION_IMAGE.to_string(),
                    reply.with_controls(controls),
                    InteractionState::OperationOffered,
                ),
                Err(e) => {
                    warn!(error = %e, chat = message.chat, "Cannot offer operations for this file");
                    (
                        MESSAGE_UNPROCESSABLE.to_string(),
                        reply,
                        InteractionState::Failed,
                    )
                }
            },
            None => (
                messages::help(self.shared.protocol.table().operations()),
                reply,
                InteractionState::AwaitingSubmission,
            ),
        };

        match self.shared.messenger.send_text(message.chat, &text, options).await {
            Ok(_) => state,
            Err(e) => {
                error!(error = %e, chat = message.chat, "Failed to send message");
                InteractionState::Failed
            }
        }
    }

    /// One row per registered operation, then a cancel row.
    pub fn prompt_controls(
        &self,
        reference: &str,
    ) -> Result<Vec<Vec<SelectionControl>>, DispatchError> {
        let protocol = &self.shared.protocol;
        let mut rows = protocol
            .table()
            .operations()
            .iter()
            .map(|op| -> Result<_, DispatchError> {
                Ok(vec![SelectionControl {
                    label: op.label().to_string(),
                    token: protocol.encode(*op, reference)?,
                }])
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(vec![SelectionControl {
            label: CANCEL_LABEL.to_string(),
            token: protocol.cancel_token().to_string(),
        }]);
        Ok(rows)
    }

    pub async fn handle_selection(&self, event: &SelectionEvent) -> SelectionOutcome {
        let messenger = &self.shared.messenger;

        let Some(prompt) = &event.message else {
            warn!(selection = %event.id, "Selection without a prompt message");
            if let Err(e) = messenger.answer_selection(&event.id).await {
                error!(error = %e, "Failed to answer selection");
            }
            return SelectionOutcome::settled(InteractionState::Failed);
        };

        let data = event.data.as_deref().unwrap_or_default();
        let (notice, state, job) = match self.shared.protocol.parse(data) {
            Ok(Selection::Cancel) => (
                MESSAGE_CANCELED.to_string(),
                InteractionState::Canceled,
                None,
            ),
            Ok(Selection::Operation {
                operation,
                reference,
            }) if has_image_context(prompt) => (
                messages::processing(operation),
                InteractionState::Processing(operation),
                Some(Job {
                    chat: prompt.chat,
                    prompt_id: prompt.message_id,
                    operation,
                    reference,
                }),
            ),
            Ok(Selection::Operation { operation, .. }) => {
                warn!(
                    %operation,
                    chat = prompt.chat,
                    "Selection on a prompt without image context"
                );
                (
                    MESSAGE_UNPROCESSABLE.to_string(),
                    InteractionState::Failed,
                    None,
                )
            }
            Err(e) => {
                warn!(error = %e, token = data, "Undecodable selection");
                (
                    MESSAGE_UNPROCESSABLE.to_string(),
                    InteractionState::Failed,
                    None,
                )
            }
        };

        if let Err(e) = messenger.answer_selection(&event.id).await {
            error!(error = %e, selection = %event.id, "Failed to answer selection");
            return SelectionOutcome::settled(InteractionState::Failed);
        }
        if let Err(e) = messenger.edit_text(prompt.chat, prompt.message_id, &notice).await {
            error!(error = %e, chat = prompt.chat, "Failed to edit message text");
            return SelectionOutcome::settled(InteractionState::Failed);
        }

        let Some(job) = job else {
            return SelectionOutcome::settled(state);
        };

        let span = info_span!(
            "request",
            id = %Uuid::new_v4(),
            chat = job.chat,
            user = event.from.display_name(),
            operation = %job.operation,
        );
        let handle = tokio::spawn(run_job(Arc::clone(&self.shared), job).instrument(span));
        SelectionOutcome {
            state,
            job: Some(handle),
        }
    }
}

fn has_image_context(prompt: &PromptMessage) -> bool {
    prompt
        .text
        .as_deref()
        .is_some_and(|t| t.contains(IMAGE_CONTEXT_MARKER))
}

struct Job {
    chat: ChatId,
    prompt_id: MessageId,
    operation: OperationKind,
    reference: String,
}

enum JobFailure {
    /// Analysis succeeded with nothing to show
    Empty(&'static str),
    Failed(String),
}

async fn run_job<M: Messenger, V: Vision>(shared: Arc<Shared<M, V>>, job: Job) -> InteractionState {
    let _permit = match &shared.jobs {
        Some(jobs) => jobs.acquire().await.ok(),
        None => None,
    };

    shared.chat_action(job.chat, ChatAction::Typing).await;
    let result = shared.process(&job).await;

    if let Err(e) = shared.messenger.delete_message(job.chat, job.prompt_id).await {
        warn!(error = %e, "Failed to delete prompt message");
    }

    let (notice, state) = match result {
        Ok(()) => {
            info!("Request completed");
            return InteractionState::Completed;
        }
        Err(JobFailure::Empty(notice)) => {
            info!(notice, "Nothing to report");
            (notice.to_string(), InteractionState::Completed)
        }
        Err(JobFailure::Failed(message)) => {
            error!(%message, "Request failed");
            (message, InteractionState::Failed)
        }
    };

    if let Err(e) = shared
        .messenger
        .send_text(job.chat, &notice, SendOptions::default())
        .await
    {
        error!(error = %e, "Failed to send notice");
    }
    state
}

impl<M: Messenger, V: Vision> Shared<M, V> {
    async fn chat_action(&self, chat: ChatId, action: ChatAction) {
        if let Err(e) = self.messenger.send_chat_action(chat, action).await {
            debug!(error = %e, ?action, "Failed to send chat action");
        }
    }

    async fn process(&self, job: &Job) -> Result<(), JobFailure> {
        let url = self
            .messenger
            .fetch_file_url(&job.reference)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to get file url");
                JobFailure::Failed(MESSAGE_FAILED_TO_GET_FILE.to_string())
            })?;
        info!(%url, "Processing request");

        if job.operation.renders_image() {
            self.process_image(job, &url).await
        } else {
            self.process_text(job, &url).await
        }
    }

    async fn process_image(&self, job: &Job, url: &str) -> Result<(), JobFailure> {
        let operation = job.operation;
        let detected = match operation {
            OperationKind::EmotionRecognition => self.vision.recognize_emotions(url).await,
            _ => self.vision.detect_faces(url, &FACE_ATTRIBUTES).await,
        };
        let instances = detected
            .map_err(|e| JobFailure::Failed(messages::remote_failure(operation, &e.0)))?;
        if instances.is_empty() {
            return Err(JobFailure::Empty(messages::empty_result(operation)));
        }
        debug!(count = instances.len(), "Faces detected");

        self.chat_action(job.chat, ChatAction::UploadPhoto).await;
        let bytes = self
            .messenger
            .download(url)
            .await
            .map_err(|e| JobFailure::Failed(format!("Failed to open image: {}", e)))?;

        let engine = self.engine.clone();
        let rendered = tokio::task::spawn_blocking(
            move || -> Result<Option<(Vec<u8>, Option<String>)>, RenderError> {
                match engine.annotate_bytes(&bytes, &instances, operation)? {
                    AnnotationOutcome::Empty => Ok(None),
                    AnnotationOutcome::Rendered(result) => {
                        Ok(Some((engine.encode(&result.image)?, result.report)))
                    }
                }
            },
        )
        .await
        .map_err(|e| JobFailure::Failed(format!("Failed to render image: {}", e)))?
        .map_err(|e| JobFailure::Failed(e.to_string()))?;

        let Some((jpeg, report)) = rendered else {
            return Err(JobFailure::Empty(messages::empty_result(operation)));
        };

        let sent = self
            .messenger
            .send_image(
                job.chat,
                jpeg,
                SendOptions::caption(messages::result_caption(operation)),
            )
            .await
            .map_err(|e| JobFailure::Failed(format!("Failed to send image: {}", e)))?;

        if let Some(report) = report.filter(|r| !r.is_empty()) {
            self.messenger
                .send_text(job.chat, &report, SendOptions::reply_to(sent.message_id))
                .await
                .map_err(|e| JobFailure::Failed(format!("Failed to send report: {}", e)))?;
        }
        Ok(())
    }

    async fn process_text(&self, job: &Job, url: &str) -> Result<(), JobFailure> {
        let operation = job.operation;
        let analyzed = match operation {
            OperationKind::Describe => self
                .vision
                .describe(url)
                .await
                .map(|d| analysis::describe(&d)),
            OperationKind::PlainTextRecognition => self
                .vision
                .recognize_text(url)
                .await
                .map(|r| analysis::plain_text(&r)),
            OperationKind::HandwritingRecognition => self
                .vision
                .recognize_handwriting(url)
                .await
                .map(|l| analysis::handwriting(&l)),
            OperationKind::TagImage => self.vision.tag(url).await.map(|t| analysis::tags(&t)),
            _ => {
                return Err(JobFailure::Failed(format!(
                    "Command not supported: {}",
                    operation
                )));
            }
        };

        let text = analyzed
            .map_err(|e| JobFailure::Failed(messages::remote_failure(operation, &e.0)))?
            .ok_or(JobFailure::Empty(messages::empty_result(operation)))?;

        self.messenger
            .send_text(job.chat, &text, SendOptions::default())
            .await
            .map_err(|e| JobFailure::Failed(format!("Failed to send result: {}", e)))?;
        Ok(())
    }
}
