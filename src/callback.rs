//! Typed callback actions for inline keyboard buttons.
//!
//! Button payloads travel through Telegram as opaque strings. They are
//! encoded from [`CallbackAction`] when a keyboard is built and parsed back
//! exactly once at the transport boundary, so the workflow engine only ever
//! dispatches on a tagged enum.

/// An operator action carried by an inline keyboard button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// List candidate replacement images for the draft.
    ReplaceImage { key: i32 },
    /// Bind the operator's next text message to the draft.
    EditText { key: i32 },
    /// Ask for publish confirmation.
    Publish { key: i32 },
    /// Ask for cancel confirmation.
    Cancel { key: i32 },
    ConfirmPublish { key: i32 },
    DenyPublish { key: i32 },
    ConfirmCancel { key: i32 },
    DenyCancel { key: i32 },
    /// Make candidate `index` the draft's attached image.
    SelectImage { key: i32, index: usize },
    /// Dismiss the listing message for candidate `index`.
    RejectImage { key: i32, index: usize },
}

impl CallbackAction {
    /// The draft key this action refers to.
    pub fn key(&self) -> i32 {
        match *self {
            CallbackAction::ReplaceImage { key }
            | CallbackAction::EditText { key }
            | CallbackAction::Publish { key }
            | CallbackAction::Cancel { key }
            | CallbackAction::ConfirmPublish { key }
            | CallbackAction::DenyPublish { key }
            | CallbackAction::ConfirmCancel { key }
            | CallbackAction::DenyCancel { key }
            | CallbackAction::SelectImage { key, .. }
            | CallbackAction::RejectImage { key, .. } => key,
        }
    }

    /// Render as a callback-data payload.
    pub fn encode(&self) -> String {
        match *self {
            CallbackAction::ReplaceImage { key } => format!("replace_image:{key}"),
            CallbackAction::EditText { key } => format!("edit_text:{key}"),
            CallbackAction::Publish { key } => format!("publish:{key}"),
            CallbackAction::Cancel { key } => format!("cancel:{key}"),
            CallbackAction::ConfirmPublish { key } => format!("confirm_publish:{key}"),
            CallbackAction::DenyPublish { key } => format!("deny_publish:{key}"),
            CallbackAction::ConfirmCancel { key } => format!("confirm_cancel:{key}"),
            CallbackAction::DenyCancel { key } => format!("deny_cancel:{key}"),
            CallbackAction::SelectImage { key, index } => format!("select_image:{key}:{index}"),
            CallbackAction::RejectImage { key, index } => format!("remove_image:{key}:{index}"),
        }
    }

    /// Parse a callback-data payload. Unknown or malformed payloads yield
    /// `None` and are ignored by the dispatcher.
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split(':');
        let command = parts.next()?;
        let key: i32 = parts.next()?.parse().ok()?;

        let action = match command {
            "replace_image" => CallbackAction::ReplaceImage { key },
            "edit_text" => CallbackAction::EditText { key },
            "publish" => CallbackAction::Publish { key },
            "cancel" => CallbackAction::Cancel { key },
            "confirm_publish" => CallbackAction::ConfirmPublish { key },
            "deny_publish" => CallbackAction::DenyPublish { key },
            "confirm_cancel" => CallbackAction::ConfirmCancel { key },
            "deny_cancel" => CallbackAction::DenyCancel { key },
            "select_image" => {
                let index: usize = parts.next()?.parse().ok()?;
                CallbackAction::SelectImage { key, index }
            }
            "remove_image" => {
                let index: usize = parts.next()?.parse().ok()?;
                CallbackAction::RejectImage { key, index }
            }
            _ => return None,
        };

        // Every action has consumed its segments by now; anything left over
        // makes the payload malformed.
        if parts.next().is_some() {
            return None;
        }

        Some(action)
    }
}
