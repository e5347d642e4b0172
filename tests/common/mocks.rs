use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use vision_bot::bot::transport::{
    ChatAction, ChatId, MessageId, Messenger, SendOptions, SentMessage, Update,
};
use vision_bot::bot::vision::{EmotionRecognizer, FaceDetector, ImageAnalyzer};
use vision_bot::models::{ImageDescription, Tag, TextRegion};
use vision_bot::{DetectionInstance, RemoteError, TransportError};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SendText {
        chat: ChatId,
        text: String,
        options: SendOptions,
    },
    SendImage {
        chat: ChatId,
        bytes: usize,
        options: SendOptions,
    },
    EditText {
        chat: ChatId,
        message_id: MessageId,
        text: String,
    },
    DeleteMessage {
        chat: ChatId,
        message_id: MessageId,
    },
    AnswerSelection(String),
    ChatAction(ChatAction),
    FetchFileUrl(String),
    Download(String),
}

/// Which messenger calls should fail.
#[derive(Debug, Clone, Default)]
pub struct Failures {
    pub send_text: bool,
    pub answer_selection: bool,
    pub edit_text: bool,
    pub fetch_file_url: bool,
    pub download: bool,
    pub send_image: bool,
}

/// Messenger that records every call and serves queued update batches.
pub struct RecordingMessenger {
    calls: Mutex<Vec<Call>>,
    updates: Mutex<VecDeque<Result<Vec<Update>, TransportError>>>,
    image: Vec<u8>,
    failures: Failures,
    next_id: AtomicI64,
}

impl RecordingMessenger {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            updates: Mutex::new(VecDeque::new()),
            image,
            failures: Failures::default(),
            next_id: AtomicI64::new(1000),
        }
    }

    pub fn with_failures(mut self, failures: Failures) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_updates(self, batches: Vec<Result<Vec<Update>, TransportError>>) -> Self {
        self.updates.lock().unwrap().extend(batches);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendText { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::EditText { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn images_sent(&self) -> Vec<SendOptions> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendImage { options, .. } => Some(options),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn outcome(&self, fail: bool, what: &str) -> Result<(), TransportError> {
        if fail {
            Err(TransportError(format!("{} unavailable", what)))
        } else {
            Ok(())
        }
    }

    fn sent(&self) -> SentMessage {
        SentMessage {
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
        }
    }
}

impl Messenger for RecordingMessenger {
    async fn poll_updates(&self) -> Result<Vec<Update>, TransportError> {
        let next = self.updates.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => std::future::pending().await,
        }
    }

    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        options: SendOptions,
    ) -> Result<SentMessage, TransportError> {
        self.record(Call::SendText {
            chat,
            text: text.to_string(),
            options,
        });
        self.outcome(self.failures.send_text, "sendMessage")?;
        Ok(self.sent())
    }

    async fn send_image(
        &self,
        chat: ChatId,
        bytes: Vec<u8>,
        options: SendOptions,
    ) -> Result<SentMessage, TransportError> {
        self.record(Call::SendImage {
            chat,
            bytes: bytes.len(),
            options,
        });
        self.outcome(self.failures.send_image, "sendPhoto")?;
        Ok(self.sent())
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), TransportError> {
        self.record(Call::EditText {
            chat,
            message_id,
            text: text.to_string(),
        });
        self.outcome(self.failures.edit_text, "editMessageText")
    }

    async fn delete_message(
        &self,
        chat: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        self.record(Call::DeleteMessage { chat, message_id });
        Ok(())
    }

    async fn answer_selection(&self, selection_id: &str) -> Result<(), TransportError> {
        self.record(Call::AnswerSelection(selection_id.to_string()));
        self.outcome(self.failures.answer_selection, "answerCallbackQuery")
    }

    async fn send_chat_action(
        &self,
        _chat: ChatId,
        action: ChatAction,
    ) -> Result<(), TransportError> {
        self.record(Call::ChatAction(action));
        Ok(())
    }

    async fn fetch_file_url(&self, reference: &str) -> Result<String, TransportError> {
        self.record(Call::FetchFileUrl(reference.to_string()));
        self.outcome(self.failures.fetch_file_url, "getFile")?;
        Ok(format!("https://files.test/{}", reference))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.record(Call::Download(url.to_string()));
        self.outcome(self.failures.download, "download")?;
        Ok(self.image.clone())
    }
}

/// Vision services answering with canned results.
pub struct ScriptedVision {
    faces: Result<Vec<DetectionInstance>, RemoteError>,
    emotions: Result<Vec<DetectionInstance>, RemoteError>,
    description: Result<ImageDescription, RemoteError>,
    text: Result<Vec<TextRegion>, RemoteError>,
    handwriting: Result<Vec<String>, RemoteError>,
    tags: Result<Vec<Tag>, RemoteError>,
    calls: AtomicUsize,
    requested_attributes: Mutex<Vec<String>>,
}

impl Default for ScriptedVision {
    fn default() -> Self {
        Self {
            faces: Ok(Vec::new()),
            emotions: Ok(Vec::new()),
            description: Ok(ImageDescription::default()),
            text: Ok(Vec::new()),
            handwriting: Ok(Vec::new()),
            tags: Ok(Vec::new()),
            calls: AtomicUsize::new(0),
            requested_attributes: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedVision {
    pub fn with_faces(mut self, faces: Vec<DetectionInstance>) -> Self {
        self.faces = Ok(faces);
        self
    }

    pub fn with_emotions(mut self, emotions: Vec<DetectionInstance>) -> Self {
        self.emotions = Ok(emotions);
        self
    }

    pub fn with_description(mut self, description: ImageDescription) -> Self {
        self.description = Ok(description);
        self
    }

    pub fn with_text(mut self, regions: Vec<TextRegion>) -> Self {
        self.text = Ok(regions);
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = Ok(tags);
        self
    }

    /// Every service call fails with `cause`.
    pub fn failing(cause: &str) -> Self {
        let err = RemoteError(cause.to_string());
        Self {
            faces: Err(err.clone()),
            emotions: Err(err.clone()),
            description: Err(err.clone()),
            text: Err(err.clone()),
            handwriting: Err(err.clone()),
            tags: Err(err),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_attributes(&self) -> Vec<String> {
        self.requested_attributes.lock().unwrap().clone()
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl EmotionRecognizer for ScriptedVision {
    async fn recognize_emotions(
        &self,
        _image_url: &str,
    ) -> Result<Vec<DetectionInstance>, RemoteError> {
        self.hit();
        self.emotions.clone()
    }
}

impl FaceDetector for ScriptedVision {
    async fn detect_faces(
        &self,
        _image_url: &str,
        attributes: &[&str],
    ) -> Result<Vec<DetectionInstance>, RemoteError> {
        self.hit();
        *self.requested_attributes.lock().unwrap() =
            attributes.iter().map(|a| a.to_string()).collect();
        self.faces.clone()
    }
}

impl ImageAnalyzer for ScriptedVision {
    async fn describe(&self, _image_url: &str) -> Result<ImageDescription, RemoteError> {
        self.hit();
        self.description.clone()
    }

    async fn recognize_text(&self, _image_url: &str) -> Result<Vec<TextRegion>, RemoteError> {
        self.hit();
        self.text.clone()
    }

    async fn recognize_handwriting(&self, _image_url: &str) -> Result<Vec<String>, RemoteError> {
        self.hit();
        self.handwriting.clone()
    }

    async fn tag(&self, _image_url: &str) -> Result<Vec<Tag>, RemoteError> {
        self.hit();
        self.tags.clone()
    }
}
