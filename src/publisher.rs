//! Publish sequence: feed update, remote sync, final post, cleanup.
//!
//! Publishes are serialized by the process-wide publish lock because the
//! feed document is read, modified and rewritten whole each time. Once the
//! feed is pushed there is no rollback: later failures (final send, chat
//! cleanup) are logged and the sequence continues.

use log::{error, info};
use std::fs;
use std::path::Path;
use teloxide::prelude::*;

use crate::bot::{delete_tracked_messages, download_file};
use crate::draft::ImageRef;
use crate::errors::WorkflowError;
use crate::rss::{entry_title, Feed, FeedItem, TITLE_PREFIX_CHARS};
use crate::state::AppState;

/// Run the confirmed publish for a draft: upload the image (if any),
/// append a feed entry and push it, post the final message, delete all
/// tracked UI messages, and drop the draft.
pub async fn publish_draft(bot: &Bot, state: &AppState, key: i32) -> Result<(), WorkflowError> {
    let _guard = state.publish_lock.lock().await;

    let Some(draft) = state.drafts.get(key).await else {
        return Err(WorkflowError::StateNotFound(key));
    };
    info!("Publishing draft {key} for product {}", draft.product_id);

    let image_url = resolve_enclosure_url(bot, state, &draft.selected_image, &draft.product_id).await;

    // Feed read-modify-write, local first, then pushed whole.
    let feed_path = Path::new(&state.config.rss_feed_path);
    let mut feed = Feed::load(feed_path);
    let explicit_title = (draft.original_content.chars().count() > TITLE_PREFIX_CHARS)
        .then(|| entry_title(&draft.original_content));
    feed.add_item(FeedItem::new(
        explicit_title,
        &draft.converted_content,
        image_url,
    ));
    feed.save(feed_path)
        .map_err(|e| WorkflowError::PublishPartialFailure(format!("feed write failed: {e}")))?;
    state
        .github
        .update_feed_file(&state.config.rss_feed_path, &feed.to_xml())
        .await?;

    // Final post to the destination chat. The feed is already updated, so
    // a send failure does not abort the cleanup.
    let send_result = match draft
        .selected_image
        .as_ref()
        .and_then(|image| image.to_input_file())
    {
        Some(input_file) => bot
            .send_photo(draft.chat_id, input_file)
            .caption(draft.converted_content.clone())
            .await
            .map(|_| ()),
        None => bot
            .send_message(draft.chat_id, draft.converted_content.clone())
            .await
            .map(|_| ()),
    };
    if let Err(e) = send_result {
        error!("Failed to send final post for draft {key}: {e}");
    }

    let failures = delete_tracked_messages(bot, draft.chat_id, &draft.tracked_message_ids).await;
    state.drafts.remove(key).await;
    if failures > 0 {
        error!(
            "{}",
            WorkflowError::PublishPartialFailure(format!(
                "{failures} tracked message(s) of draft {key} could not be deleted"
            ))
        );
    }

    if let Err(e) = bot
        .send_message(
            draft.chat_id,
            "Message published and all related messages have been deleted.",
        )
        .await
    {
        error!("Failed to send publish notice: {e}");
    }
    Ok(())
}

/// Public URL for the feed enclosure. A Telegram photo is downloaded into
/// the cache and uploaded to the asset store; a remote candidate URL is
/// used as is. Failures degrade to publishing without an image.
async fn resolve_enclosure_url(
    bot: &Bot,
    state: &AppState,
    selected_image: &Option<ImageRef>,
    product_id: &str,
) -> Option<String> {
    match selected_image {
        Some(ImageRef::Telegram(file_id)) => {
            let file_name = format!("{product_id}-01.jpg");
            let dest = state.config.cache_dir.join(&file_name);
            if let Err(e) = download_file(bot, file_id.clone(), &dest).await {
                error!("Failed to download photo for upload: {e}");
                return None;
            }
            let bytes = match fs::read(&dest) {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!("Failed to read cached photo {}: {e}", dest.display());
                    return None;
                }
            };
            match state.github.upload_asset(&bytes, &file_name).await {
                Ok(url) => Some(url),
                Err(e) => {
                    error!("{e}");
                    None
                }
            }
        }
        Some(ImageRef::Remote(url)) => Some(url.clone()),
        None => None,
    }
}
