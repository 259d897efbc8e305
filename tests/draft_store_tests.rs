//! Tests for the draft store and the workflow state it owns.

use promobot::draft::{Draft, DraftStore, ImageRef, PendingEdits};
use teloxide::types::{ChatId, MessageId};

fn draft_with_candidates(key: i32, candidates: usize) -> Draft {
    Draft {
        key,
        chat_id: ChatId(500),
        original_content: "Check this great deal https://aliexpress.com/item/1.html".to_string(),
        converted_content: "Check this great deal https://s.click.aliexpress.com/e/_a".to_string(),
        product_id: "1005006109476639".to_string(),
        product_title: "USB-C cable".to_string(),
        affiliate_link: "https://s.click.aliexpress.com/e/_a".to_string(),
        candidate_images: (0..candidates)
            .map(|i| ImageRef::Remote(format!("https://img.example/{i}.jpg")))
            .collect(),
        selected_image: None,
        tracked_message_ids: vec![MessageId(key)],
        review_message_id: Some(MessageId(key + 1)),
    }
}

/// A draft is present in the store exactly while its workflow is open:
/// created on recognition, gone after the terminal transitions.
#[tokio::test]
async fn test_draft_present_iff_not_terminal() {
    let store = DraftStore::new();
    assert!(!store.contains(1).await);

    store.create(draft_with_candidates(1, 3)).await;
    assert!(store.contains(1).await);

    // Edit and image-selection cycles keep the draft alive.
    store
        .update(1, |draft| {
            draft.converted_content = "new text".to_string();
            draft.track(MessageId(10));
        })
        .await
        .unwrap();
    assert!(store.contains(1).await);

    // Publish or cancel removes it.
    let removed = store.remove(1).await.unwrap();
    assert_eq!(removed.converted_content, "new text");
    assert!(!store.contains(1).await);
}

#[tokio::test]
async fn test_duplicate_key_overwrites() {
    let store = DraftStore::new();
    store.create(draft_with_candidates(5, 1)).await;

    let mut replacement = draft_with_candidates(5, 1);
    replacement.converted_content = "replacement".to_string();
    store.create(replacement).await;

    // Exactly one draft occupies the key, the newer one.
    let draft = store.get(5).await.unwrap();
    assert_eq!(draft.converted_content, "replacement");
}

/// Selecting an image and refreshing the review UI must leave exactly one
/// tracked message: the new render.
#[tokio::test]
async fn test_select_image_then_refresh_tracks_single_render() {
    let store = DraftStore::new();
    let mut draft = draft_with_candidates(2, 4);
    // A few review cycles have accumulated UI messages.
    for id in 20..25 {
        draft.track(MessageId(id));
    }
    store.create(draft).await;

    store
        .update(2, |draft| {
            draft.selected_image = Some(draft.candidate_images[1].clone());
            draft.reset_tracking(MessageId(99));
        })
        .await
        .unwrap();

    let draft = store.get(2).await.unwrap();
    assert_eq!(draft.tracked_message_ids, vec![MessageId(99)]);
    assert_eq!(draft.review_message_id, Some(MessageId(99)));
    assert_eq!(
        draft.selected_image,
        Some(ImageRef::Remote("https://img.example/1.jpg".to_string()))
    );
}

/// The forwarded photo rides along as a candidate, so after another image
/// replaces it the operator can still switch back to it.
#[tokio::test]
async fn test_original_photo_stays_replaceable_after_selection() {
    let store = DraftStore::new();
    let mut draft = draft_with_candidates(4, 2);
    let photo = ImageRef::Remote("https://img.example/original.jpg".to_string());
    draft.candidate_images.push(photo.clone());
    draft.selected_image = Some(photo.clone());
    store.create(draft).await;

    // While the photo is the current selection it is not offered again.
    let draft = store.get(4).await.unwrap();
    let offered: Vec<usize> = draft.replaceable_images().iter().map(|(i, _)| *i).collect();
    assert_eq!(offered, vec![0, 1]);

    // Swap to an API candidate: the photo comes back into the listing.
    store
        .update(4, |draft| {
            draft.selected_image = Some(draft.candidate_images[0].clone());
        })
        .await
        .unwrap();

    let draft = store.get(4).await.unwrap();
    let offered = draft.replaceable_images();
    assert_eq!(offered.len(), 2);
    assert!(offered.iter().any(|(_, image)| **image == photo));
}

/// Denying a confirmation only removes the prompt from tracking; the draft
/// content is untouched.
#[tokio::test]
async fn test_deny_keeps_draft_unchanged() {
    let store = DraftStore::new();
    let mut draft = draft_with_candidates(3, 2);
    draft.track(MessageId(30)); // confirmation prompt
    let before_content = draft.converted_content.clone();
    store.create(draft).await;

    store.update(3, |draft| draft.untrack(MessageId(30))).await.unwrap();

    let draft = store.get(3).await.unwrap();
    assert_eq!(draft.converted_content, before_content);
    assert_eq!(draft.tracked_message_ids, vec![MessageId(3)]);
    assert!(store.contains(3).await);
}

#[tokio::test]
async fn test_keys_for_chat_scopes_to_chat() {
    let store = DraftStore::new();
    store.create(draft_with_candidates(1, 0)).await;
    let mut other_chat = draft_with_candidates(2, 0);
    other_chat.chat_id = ChatId(900);
    store.create(other_chat).await;

    let keys = store.keys_for_chat(ChatId(500)).await;
    assert_eq!(keys, vec![1]);
}

#[tokio::test]
async fn test_pending_edit_binding_semantics() {
    let edits = PendingEdits::new();

    // No binding: nothing to take.
    assert_eq!(edits.take(1).await, None);

    // Last edit request wins, and applying consumes the binding.
    edits.bind(1, 10).await;
    edits.bind(1, 11).await;
    assert_eq!(edits.take(1).await, Some(11));
    assert_eq!(edits.take(1).await, None);

    // Bindings are per operator.
    edits.bind(1, 10).await;
    edits.bind(2, 20).await;
    assert_eq!(edits.take(2).await, Some(20));
    assert_eq!(edits.take(1).await, Some(10));
}
