use std::future::Future;

use crate::error::TransportError;

pub type ChatId = i64;
pub type MessageId = i64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub first_name: String,
    pub username: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.first_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_id: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat: ChatId,
    pub message_id: MessageId,
    pub from: Option<User>,
    pub text: Option<String>,
    /// Sizes of one photo, smallest first
    pub photo: Vec<PhotoSize>,
    pub document: Option<Document>,
}

impl IncomingMessage {
    /// File reference of the image carried by this message, if any: the
    /// largest photo size, or a document with an `image/*` MIME type.
    pub fn image_reference(&self) -> Option<&str> {
        if let Some(largest) = self.photo.last() {
            return Some(&largest.file_id);
        }
        self.document
            .as_ref()
            .filter(|d| d.mime_type.as_deref().is_some_and(|m| m.starts_with("image/")))
            .map(|d| d.file_id.as_str())
    }
}

/// The bot message a selection control was attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub chat: ChatId,
    pub message_id: MessageId,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    pub id: String,
    pub from: User,
    pub message: Option<PromptMessage>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Message(IncomingMessage),
    Selection(SelectionEvent),
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionControl {
    pub label: String,
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub reply_to: Option<MessageId>,
    pub caption: Option<String>,
    /// Rows of selection controls
    pub controls: Vec<Vec<SelectionControl>>,
}

impl SendOptions {
    pub fn reply_to(message_id: MessageId) -> Self {
        Self {
            reply_to: Some(message_id),
            ..Default::default()
        }
    }

    pub fn caption(caption: impl Into<String>) -> Self {
        Self {
            caption: Some(caption.into()),
            ..Default::default()
        }
    }

    pub fn with_controls(mut self, controls: Vec<Vec<SelectionControl>>) -> Self {
        self.controls = controls;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadPhoto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: MessageId,
}

/// Messaging platform operations the bot depends on.
pub trait Messenger: Send + Sync + 'static {
    /// Long-polls for the next batch of updates.
    fn poll_updates(&self) -> impl Future<Output = Result<Vec<Update>, TransportError>> + Send;

    fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        options: SendOptions,
    ) -> impl Future<Output = Result<SentMessage, TransportError>> + Send;

    fn send_image(
        &self,
        chat: ChatId,
        bytes: Vec<u8>,
        options: SendOptions,
    ) -> impl Future<Output = Result<SentMessage, TransportError>> + Send;

    fn edit_text(
        &self,
        chat: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn delete_message(
        &self,
        chat: ChatId,
        message_id: MessageId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn answer_selection(
        &self,
        selection_id: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn send_chat_action(
        &self,
        chat: ChatId,
        action: ChatAction,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Resolves an opaque file reference to a downloadable URL.
    fn fetch_file_url(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;

    fn download(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}
