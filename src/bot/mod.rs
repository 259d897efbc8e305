//! Bot module for handling Telegram interactions
//!
//! Split into submodules:
//! - `message_handler`: commands, forwarded posts, pending-edit text
//! - `callback_handler`: inline keyboard button presses
//! - `ui_builder`: inline keyboard construction

pub mod callback_handler;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

// Re-export helpers used by the publish sequence
pub use message_handler::{delete_tracked_messages, download_file, send_review};
