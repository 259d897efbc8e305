//! Message handler module for incoming Telegram messages.
//!
//! Three kinds of messages matter: commands (`/start`, `/clear`), forwarded
//! posts that open a new draft, and plain text that completes a pending
//! "Edit Text" request.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, MessageId};

use crate::affiliate::{convert_affiliate_links, find_urls};
use crate::aliexpress::{extract_product_id, resolve_shortened_url};
use crate::draft::{Draft, ImageRef};
use crate::errors::WorkflowError;
use crate::state::AppState;

use super::ui_builder::review_keyboard;

pub async fn message_handler(bot: Bot, msg: Message, state: Arc<AppState>) -> Result<()> {
    if msg.text() == Some("/start") {
        bot.send_message(msg.chat.id, "Hello! I am your promotion bot.")
            .await?;
        return Ok(());
    }
    if msg.text() == Some("/clear") {
        clear_chat_drafts(&bot, &msg, &state).await;
        return Ok(());
    }

    if msg.forward_origin().is_some() {
        if let Some(content) = msg.caption().or(msg.text()) {
            handle_forwarded_message(&bot, &msg, content, &state).await?;
        }
        return Ok(());
    }

    if let Some(text) = msg.text() {
        apply_pending_edit(&bot, &msg, text, &state).await?;
    }
    Ok(())
}

/// Create a draft from a forwarded post and render its review UI.
///
/// Any resolution, extraction or fetch failure drops the event: the reason
/// is logged, the operator gets a short summary, and no draft is created.
async fn handle_forwarded_message(
    bot: &Bot,
    msg: &Message,
    content: &str,
    state: &AppState,
) -> Result<()> {
    info!("Received forwarded message: {content}");

    let urls = find_urls(content);
    let Some(url) = urls.first().copied() else {
        warn!("No URL found in the message");
        notify_operator(bot, msg.chat.id, "No product link found in the forwarded post.").await;
        return Ok(());
    };

    let affiliate_link = match state.aliexpress.get_affiliate_link(url).await {
        Ok(link) => link,
        Err(e) => {
            error!("Failed to generate affiliate link: {e}");
            notify_operator(bot, msg.chat.id, "Could not generate an affiliate link.").await;
            return Ok(());
        }
    };

    let resolved_url = match resolve_shortened_url(&state.http, url).await {
        Ok(resolved) => resolved,
        Err(e) => {
            error!("{e}");
            notify_operator(bot, msg.chat.id, "Could not resolve the product link.").await;
            return Ok(());
        }
    };

    let Some(product_id) = extract_product_id(&resolved_url) else {
        error!(
            "{}",
            WorkflowError::ExtractionFailed(format!("no product id in {resolved_url}"))
        );
        notify_operator(bot, msg.chat.id, "No product id found in the link.").await;
        return Ok(());
    };

    let details = match state.aliexpress.get_product_details(&product_id).await {
        Ok(details) => details,
        Err(e) => {
            error!("{e}");
            notify_operator(bot, msg.chat.id, "Could not fetch product details.").await;
            return Ok(());
        }
    };

    info!("Product ID: {}", details.product_id);
    info!("Product Title: {}", details.product_title);
    info!("Affiliate Link: {affiliate_link}");

    let converted_content = convert_affiliate_links(&state.aliexpress, content).await;
    let selected_image = msg
        .photo()
        .and_then(|photos| photos.last())
        .map(|photo| ImageRef::Telegram(photo.file.id.clone()));
    let mut candidate_images: Vec<ImageRef> = details
        .small_image_urls
        .iter()
        .map(|image_url| ImageRef::Remote(image_url.clone()))
        .collect();
    // The forwarded photo is a candidate too: once another image replaces
    // it, it must remain selectable through "Replace Image". While it is
    // the current selection the listing hides it anyway.
    if let Some(photo) = selected_image.clone() {
        candidate_images.push(photo);
    }

    let mut draft = Draft {
        key: msg.id.0,
        chat_id: msg.chat.id,
        original_content: content.to_string(),
        converted_content,
        product_id: details.product_id,
        product_title: details.product_title,
        affiliate_link,
        candidate_images,
        selected_image,
        tracked_message_ids: vec![msg.id],
        review_message_id: None,
    };

    let sent = send_review(bot, &draft).await?;
    draft.track(sent.id);
    draft.review_message_id = Some(sent.id);
    state.drafts.create(draft).await;
    Ok(())
}

/// Render the main review message for a draft: photo with caption when an
/// image is attached, plain text otherwise, always with the action
/// keyboard.
pub async fn send_review(bot: &Bot, draft: &Draft) -> Result<Message> {
    let keyboard = review_keyboard(draft.key);
    let sent = match draft
        .selected_image
        .as_ref()
        .and_then(|image| image.to_input_file())
    {
        Some(input_file) => {
            bot.send_photo(draft.chat_id, input_file)
                .caption(draft.converted_content.clone())
                .reply_markup(keyboard)
                .await?
        }
        None => {
            bot.send_message(draft.chat_id, draft.converted_content.clone())
                .reply_markup(keyboard)
                .await?
        }
    };
    Ok(sent)
}

fn is_command(text: &str) -> bool {
    text.starts_with('/')
}

/// Plain text while an edit binding exists overwrites the bound draft's
/// converted content. Without a binding the text is ignored. Commands are
/// never treated as edit text and leave the binding in place.
async fn apply_pending_edit(
    bot: &Bot,
    msg: &Message,
    text: &str,
    state: &AppState,
) -> Result<()> {
    if is_command(text) {
        debug!("Ignoring command {text} as edit text");
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(draft_key) = state.pending_edits.take(user.id.0).await else {
        debug!("Ignoring text message without a pending edit binding");
        return Ok(());
    };

    let update = state
        .drafts
        .update(draft_key, |draft| {
            draft.converted_content = text.to_string();
            draft.track(msg.id);
        })
        .await;
    match update {
        Ok(()) => {
            let sent = bot
                .send_message(
                    msg.chat.id,
                    "Text updated. Use Publish to publish the final message or Cancel to cancel it.",
                )
                .await?;
            let _ = state
                .drafts
                .update(draft_key, |draft| draft.track(sent.id))
                .await;
        }
        Err(e) => warn!("Discarding edit for closed draft: {e}"),
    }
    Ok(())
}

/// `/clear` removes every open draft of the chat together with all its
/// tracked messages, plus the command message itself.
async fn clear_chat_drafts(bot: &Bot, msg: &Message, state: &AppState) {
    let keys = state.drafts.keys_for_chat(msg.chat.id).await;
    info!("Clearing {} draft(s) in chat {}", keys.len(), msg.chat.id);
    for key in keys {
        if let Some(draft) = state.drafts.remove(key).await {
            delete_tracked_messages(bot, draft.chat_id, &draft.tracked_message_ids).await;
        }
    }
    if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
        warn!("Failed to delete /clear command message: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that commands are never mistaken for pending edit text.
    #[test]
    fn test_is_command_matches_slash_prefixed_text() {
        assert!(is_command("/start"));
        assert!(is_command("/help"));
        assert!(!is_command("new caption text"));
        assert!(!is_command("price / availability"));
        assert!(!is_command(""));
    }
}

/// Tell the operator why a forwarded post produced no draft. Failures to
/// notify are only logged.
async fn notify_operator(bot: &Bot, chat_id: ChatId, summary: &str) {
    if let Err(e) = bot.send_message(chat_id, summary).await {
        error!("Failed to notify operator: {e}");
    }
}

/// Best-effort deletion of a draft's tracked messages. Individual failures
/// are logged and do not stop the remaining deletions. Returns the number
/// of failures.
pub async fn delete_tracked_messages(bot: &Bot, chat_id: ChatId, ids: &[MessageId]) -> usize {
    let mut failures = 0;
    for id in ids {
        match bot.delete_message(chat_id, *id).await {
            Ok(_) => debug!("Deleted message {}", id.0),
            Err(e) => {
                error!("Failed to delete message {}: {e}", id.0);
                failures += 1;
            }
        }
    }
    failures
}

/// Download a Telegram photo into the local cache.
pub async fn download_file(bot: &Bot, file_id: FileId, dest: &Path) -> Result<()> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url).await?;
    let bytes = response.bytes().await?;
    fs::write(dest, &bytes)?;
    info!("Photo downloaded to {}", dest.display());
    Ok(())
}
