//! Draft state for in-flight promotion posts.
//!
//! A `Draft` exists in the [`DraftStore`] exactly while its review workflow
//! is still open: it is created when a forwarded product post is recognized
//! and removed when the operator publishes or cancels it. The store is the
//! sole owner of workflow state; handlers clone drafts out, decide, and
//! write back through `update`.

use log::{debug, warn};
use std::collections::HashMap;
use teloxide::types::{ChatId, FileId, InputFile, MessageId};
use tokio::sync::Mutex;

use crate::errors::WorkflowError;

/// A reference to an image usable both in chat messages and as a feed
/// enclosure source.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRef {
    /// A photo already on Telegram servers, addressed by file id.
    Telegram(FileId),
    /// A remote image URL from the product API.
    Remote(String),
}

impl ImageRef {
    /// Convert into an `InputFile` for sending. Returns `None` when a
    /// remote reference does not hold a parseable URL.
    pub fn to_input_file(&self) -> Option<InputFile> {
        match self {
            ImageRef::Telegram(file_id) => Some(InputFile::file_id(file_id.clone())),
            ImageRef::Remote(url) => reqwest::Url::parse(url).ok().map(InputFile::url),
        }
    }
}

/// One in-flight candidate post awaiting operator review.
#[derive(Debug, Clone)]
pub struct Draft {
    /// Origin message id, unique per physical message.
    pub key: i32,
    /// Destination chat.
    pub chat_id: ChatId,
    /// Text of the forwarded post as received.
    pub original_content: String,
    /// Text with affiliate links substituted; mutable while editing.
    pub converted_content: String,
    pub product_id: String,
    pub product_title: String,
    /// Promotion link generated for the post's first product URL.
    pub affiliate_link: String,
    /// Candidate replacement images, in API order.
    pub candidate_images: Vec<ImageRef>,
    /// Image currently attached to the post, if any.
    pub selected_image: Option<ImageRef>,
    /// Every chat message belonging to this draft's UI, in send order.
    /// All of them are deleted together on publish, cancel, or refresh.
    pub tracked_message_ids: Vec<MessageId>,
    /// The review render currently carrying the action keyboard.
    pub review_message_id: Option<MessageId>,
}

impl Draft {
    /// Record a message as part of this draft's UI.
    pub fn track(&mut self, id: MessageId) {
        self.tracked_message_ids.push(id);
    }

    /// Forget a message that has already been deleted individually.
    pub fn untrack(&mut self, id: MessageId) {
        self.tracked_message_ids.retain(|tracked| *tracked != id);
    }

    /// After a refresh, the new review render is the only UI message left.
    pub fn reset_tracking(&mut self, id: MessageId) {
        self.tracked_message_ids = vec![id];
        self.review_message_id = Some(id);
    }

    /// Candidates offered by "Replace Image": every candidate image
    /// except the one currently attached, with its index for the
    /// selection buttons.
    pub fn replaceable_images(&self) -> Vec<(usize, &ImageRef)> {
        self.candidate_images
            .iter()
            .enumerate()
            .filter(|(_, image)| self.selected_image.as_ref() != Some(*image))
            .collect()
    }
}

/// Process-wide table of open drafts keyed by origin message id.
#[derive(Default)]
pub struct DraftStore {
    drafts: Mutex<HashMap<i32, Draft>>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a draft. A colliding key is overwritten with a warning: the
    /// key is the origin message id and should be unique per message.
    pub async fn create(&self, draft: Draft) {
        let mut drafts = self.drafts.lock().await;
        if let Some(previous) = drafts.insert(draft.key, draft) {
            warn!(
                "Draft key {} already existed; overwriting previous draft",
                previous.key
            );
        }
    }

    pub async fn get(&self, key: i32) -> Option<Draft> {
        self.drafts.lock().await.get(&key).cloned()
    }

    pub async fn contains(&self, key: i32) -> bool {
        self.drafts.lock().await.contains_key(&key)
    }

    /// Apply a mutation to the stored draft in place.
    pub async fn update<F>(&self, key: i32, mutate: F) -> Result<(), WorkflowError>
    where
        F: FnOnce(&mut Draft),
    {
        let mut drafts = self.drafts.lock().await;
        match drafts.get_mut(&key) {
            Some(draft) => {
                mutate(draft);
                Ok(())
            }
            None => Err(WorkflowError::StateNotFound(key)),
        }
    }

    /// Remove and return a draft once its workflow reaches a terminal
    /// state.
    pub async fn remove(&self, key: i32) -> Option<Draft> {
        self.drafts.lock().await.remove(&key)
    }

    /// Keys of every open draft belonging to the given chat.
    pub async fn keys_for_chat(&self, chat_id: ChatId) -> Vec<i32> {
        self.drafts
            .lock()
            .await
            .values()
            .filter(|draft| draft.chat_id == chat_id)
            .map(|draft| draft.key)
            .collect()
    }
}

/// The single pending-edit slot per operator: when an operator presses
/// "Edit Text", their next plain-text message is bound to that draft.
/// A second edit request before the text arrives overwrites the first
/// (last request wins).
#[derive(Default)]
pub struct PendingEdits {
    bindings: Mutex<HashMap<u64, i32>>,
}

impl PendingEdits {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn bind(&self, operator_id: u64, draft_key: i32) {
        let mut bindings = self.bindings.lock().await;
        if let Some(previous) = bindings.insert(operator_id, draft_key) {
            debug!(
                "Operator {operator_id} re-requested edit; binding moved from {previous} to {draft_key}"
            );
        }
    }

    /// Consume the binding for an operator, if one exists.
    pub async fn take(&self, operator_id: u64) -> Option<i32> {
        self.bindings.lock().await.remove(&operator_id)
    }
}
