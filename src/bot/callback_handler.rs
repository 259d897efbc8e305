//! Callback handler module for inline keyboard button presses.
//!
//! Button payloads are parsed into [`CallbackAction`] once, here, and the
//! workflow transitions are dispatched on the typed action. A press whose
//! draft key is no longer in the store (stale button after a publish,
//! cancel or restart) is answered with a short notice and otherwise
//! ignored.

use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;

use crate::callback::CallbackAction;
use crate::errors::WorkflowError;
use crate::publisher;
use crate::state::AppState;

use super::message_handler::{delete_tracked_messages, send_review};
use super::ui_builder::{
    cancel_confirm_keyboard, image_option_keyboard, publish_confirm_keyboard, review_keyboard,
};

pub async fn callback_handler(bot: Bot, q: CallbackQuery, state: Arc<AppState>) -> Result<()> {
    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        warn!("Ignoring unrecognized callback payload: {:?}", q.data);
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    info!("Button press: {action:?}");

    if !state.drafts.contains(action.key()).await {
        warn!("{}", WorkflowError::StateNotFound(action.key()));
        bot.answer_callback_query(q.id)
            .text("This draft is no longer active.")
            .await?;
        return Ok(());
    }

    match action {
        CallbackAction::ReplaceImage { key } => {
            handle_replace_image(&bot, &q, &state, key).await?;
        }
        CallbackAction::EditText { key } => {
            handle_edit_text(&bot, &q, &state, key).await?;
        }
        CallbackAction::Publish { key } => {
            prompt_confirmation(
                &bot,
                &q,
                &state,
                key,
                "Are you sure you want to publish this message?",
                publish_confirm_keyboard(key),
            )
            .await?;
        }
        CallbackAction::Cancel { key } => {
            prompt_confirmation(
                &bot,
                &q,
                &state,
                key,
                "Are you sure you want to cancel? This will delete all related messages.",
                cancel_confirm_keyboard(key),
            )
            .await?;
        }
        CallbackAction::ConfirmPublish { key } => {
            if let Err(e) = publisher::publish_draft(&bot, &state, key).await {
                error!("Publish of draft {key} failed: {e}");
            }
        }
        CallbackAction::DenyPublish { key } | CallbackAction::DenyCancel { key } => {
            handle_deny(&bot, &q, &state, key).await?;
        }
        CallbackAction::ConfirmCancel { key } => {
            handle_confirm_cancel(&bot, &state, key).await?;
        }
        CallbackAction::SelectImage { key, index } => {
            handle_select_image(&bot, &state, key, index).await?;
        }
        CallbackAction::RejectImage { key, .. } => {
            handle_reject_image(&bot, &q, &state, key).await;
        }
    }

    // Answer the callback query to remove the loading state.
    bot.answer_callback_query(q.id).await?;
    Ok(())
}

/// List every candidate image except the one currently attached, each with
/// accept/reject controls.
async fn handle_replace_image(
    bot: &Bot,
    q: &CallbackQuery,
    state: &AppState,
    key: i32,
) -> Result<()> {
    let (Some(draft), Some(msg)) = (state.drafts.get(key).await, q.message.as_ref()) else {
        return Ok(());
    };

    for (index, image) in draft.replaceable_images() {
        let Some(input_file) = image.to_input_file() else {
            warn!("Skipping candidate image {index} with unusable reference");
            continue;
        };
        match bot
            .send_photo(msg.chat().id, input_file)
            .reply_markup(image_option_keyboard(key, index))
            .await
        {
            Ok(sent) => {
                let _ = state
                    .drafts
                    .update(key, |draft| draft.track(sent.id))
                    .await;
            }
            Err(e) => error!("Error displaying image option {index}: {e}"),
        }
    }
    Ok(())
}

/// Prompt for replacement text and bind the operator's next message to
/// this draft.
async fn handle_edit_text(bot: &Bot, q: &CallbackQuery, state: &AppState, key: i32) -> Result<()> {
    if let Some(msg) = q.message.as_ref() {
        let sent = bot
            .send_message(msg.chat().id, "Please send the new text for the message.")
            .await?;
        let _ = state
            .drafts
            .update(key, |draft| draft.track(sent.id))
            .await;
    }
    state.pending_edits.bind(q.from.id.0, key).await;
    Ok(())
}

/// Render a yes/no confirmation prompt and track it.
async fn prompt_confirmation(
    bot: &Bot,
    q: &CallbackQuery,
    state: &AppState,
    key: i32,
    text: &str,
    keyboard: teloxide::types::InlineKeyboardMarkup,
) -> Result<()> {
    if let Some(msg) = q.message.as_ref() {
        let sent = bot
            .send_message(msg.chat().id, text)
            .reply_markup(keyboard)
            .await?;
        let _ = state
            .drafts
            .update(key, |draft| draft.track(sent.id))
            .await;
    }
    Ok(())
}

/// Denying either confirmation removes the prompt and puts the action
/// keyboard back on the review render.
async fn handle_deny(bot: &Bot, q: &CallbackQuery, state: &AppState, key: i32) -> Result<()> {
    let Some(msg) = q.message.as_ref() else {
        return Ok(());
    };
    let prompt_id = msg.id();
    if let Err(e) = bot.delete_message(msg.chat().id, prompt_id).await {
        error!("Failed to delete confirmation prompt {}: {e}", prompt_id.0);
    }
    let _ = state
        .drafts
        .update(key, |draft| draft.untrack(prompt_id))
        .await;

    if let Some(draft) = state.drafts.get(key).await {
        if let Some(review_id) = draft.review_message_id {
            if let Err(e) = bot
                .edit_message_reply_markup(draft.chat_id, review_id)
                .reply_markup(review_keyboard(key))
                .await
            {
                error!("Failed to restore review keyboard: {e}");
            }
        }
    }
    Ok(())
}

/// Cancel confirmed: delete every tracked message and drop the draft.
async fn handle_confirm_cancel(bot: &Bot, state: &AppState, key: i32) -> Result<()> {
    let Some(draft) = state.drafts.remove(key).await else {
        return Ok(());
    };
    let failures =
        delete_tracked_messages(bot, draft.chat_id, &draft.tracked_message_ids).await;
    if failures > 0 {
        warn!("Cancel of draft {key} left {failures} message(s) undeleted");
    }
    bot.send_message(draft.chat_id, "All related messages have been deleted.")
        .await?;
    Ok(())
}

/// Make the chosen candidate the draft's image, then refresh: render the
/// review message anew, delete the old UI, and track only the new render.
async fn handle_select_image(bot: &Bot, state: &AppState, key: i32, index: usize) -> Result<()> {
    let updated = state
        .drafts
        .update(key, |draft| {
            if let Some(image) = draft.candidate_images.get(index).cloned() {
                draft.selected_image = Some(image);
            } else {
                warn!("Draft {key} has no candidate image at index {index}");
            }
        })
        .await;
    if updated.is_err() {
        return Ok(());
    }
    refresh_review(bot, state, key).await
}

async fn refresh_review(bot: &Bot, state: &AppState, key: i32) -> Result<()> {
    let Some(draft) = state.drafts.get(key).await else {
        return Ok(());
    };
    let previous_ids = draft.tracked_message_ids.clone();

    let sent = send_review(bot, &draft).await?;
    delete_tracked_messages(bot, draft.chat_id, &previous_ids).await;
    let _ = state
        .drafts
        .update(key, |draft| draft.reset_tracking(sent.id))
        .await;
    Ok(())
}

/// Rejecting a candidate only removes its listing message.
async fn handle_reject_image(bot: &Bot, q: &CallbackQuery, state: &AppState, key: i32) {
    let Some(msg) = q.message.as_ref() else {
        return;
    };
    let listing_id = msg.id();
    match bot.delete_message(msg.chat().id, listing_id).await {
        Ok(_) => {
            let _ = state
                .drafts
                .update(key, |draft| draft.untrack(listing_id))
                .await;
        }
        Err(e) => error!("Failed to remove image message {}: {e}", listing_id.0),
    }
}
