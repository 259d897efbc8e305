//! Tests for callback payload encoding/parsing and keyboard wiring.

use promobot::bot::ui_builder::{
    cancel_confirm_keyboard, image_option_keyboard, publish_confirm_keyboard, review_keyboard,
};
use promobot::callback::CallbackAction;
use teloxide::types::InlineKeyboardButtonKind;

fn payloads_of(keyboard: &teloxide::types::InlineKeyboardMarkup) -> Vec<String> {
    keyboard
        .inline_keyboard
        .iter()
        .flatten()
        .filter_map(|button| match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
            _ => None,
        })
        .collect()
}

/// Every button the bot ever renders must parse back into a typed action
/// carrying the draft key it was built with.
#[test]
fn test_every_rendered_button_parses() {
    let key = 31337;
    let keyboards = [
        review_keyboard(key),
        publish_confirm_keyboard(key),
        cancel_confirm_keyboard(key),
        image_option_keyboard(key, 4),
    ];
    for keyboard in &keyboards {
        for payload in payloads_of(keyboard) {
            let action = CallbackAction::parse(&payload)
                .unwrap_or_else(|| panic!("unparseable payload {payload}"));
            assert_eq!(action.key(), key);
        }
    }
}

#[test]
fn test_image_actions_carry_index() {
    assert_eq!(
        CallbackAction::parse("select_image:9:2"),
        Some(CallbackAction::SelectImage { key: 9, index: 2 })
    );
    assert_eq!(
        CallbackAction::parse("remove_image:9:0"),
        Some(CallbackAction::RejectImage { key: 9, index: 0 })
    );
}

#[test]
fn test_extreme_keys_survive_round_trip() {
    // Forwarded-from-channel message ids can be large; keys are plain i32.
    for key in [i32::MAX, i32::MIN, 0] {
        let action = CallbackAction::ConfirmPublish { key };
        assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
    }
}

#[test]
fn test_garbage_payloads_rejected() {
    for payload in [
        "",
        ":",
        "publish",
        "publish:",
        "publish:12:extra",
        "select_image:5:3:junk",
        "1:2:3",
    ] {
        assert_eq!(CallbackAction::parse(payload), None, "payload {payload:?}");
    }
}
