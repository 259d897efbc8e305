//! UI builder module for the inline keyboards of the review workflow.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::callback::CallbackAction;

/// Action keyboard attached to a draft's review render.
pub fn review_keyboard(key: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "Replace Image",
            CallbackAction::ReplaceImage { key }.encode(),
        )],
        vec![InlineKeyboardButton::callback(
            "Edit Text",
            CallbackAction::EditText { key }.encode(),
        )],
        vec![InlineKeyboardButton::callback(
            "Publish",
            CallbackAction::Publish { key }.encode(),
        )],
        vec![InlineKeyboardButton::callback(
            "Cancel",
            CallbackAction::Cancel { key }.encode(),
        )],
    ])
}

/// Yes/no keyboard for the publish confirmation prompt.
pub fn publish_confirm_keyboard(key: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "Yes",
            CallbackAction::ConfirmPublish { key }.encode(),
        )],
        vec![InlineKeyboardButton::callback(
            "No",
            CallbackAction::DenyPublish { key }.encode(),
        )],
    ])
}

/// Yes/no keyboard for the cancel confirmation prompt.
pub fn cancel_confirm_keyboard(key: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "Yes",
            CallbackAction::ConfirmCancel { key }.encode(),
        )],
        vec![InlineKeyboardButton::callback(
            "No",
            CallbackAction::DenyCancel { key }.encode(),
        )],
    ])
}

/// Accept/reject keyboard attached to one candidate image listing.
pub fn image_option_keyboard(key: i32, index: usize) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅", CallbackAction::SelectImage { key, index }.encode()),
        InlineKeyboardButton::callback("❌", CallbackAction::RejectImage { key, index }.encode()),
    ]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button_payloads(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
        keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                    Some(data.clone())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_review_keyboard_actions() {
        let payloads = button_payloads(&review_keyboard(42));
        assert_eq!(
            payloads,
            vec!["replace_image:42", "edit_text:42", "publish:42", "cancel:42"]
        );
        for payload in payloads {
            assert!(CallbackAction::parse(&payload).is_some());
        }
    }

    #[test]
    fn test_confirmation_keyboards() {
        assert_eq!(
            button_payloads(&publish_confirm_keyboard(7)),
            vec!["confirm_publish:7", "deny_publish:7"]
        );
        assert_eq!(
            button_payloads(&cancel_confirm_keyboard(7)),
            vec!["confirm_cancel:7", "deny_cancel:7"]
        );
    }

    #[test]
    fn test_image_option_keyboard() {
        assert_eq!(
            button_payloads(&image_option_keyboard(7, 2)),
            vec!["select_image:7:2", "remove_image:7:2"]
        );
    }
}
