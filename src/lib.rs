//! # Promo Bot
//!
//! A Telegram bot that converts forwarded AliExpress product links into
//! affiliate links, fetches product metadata, walks the operator through a
//! button-driven review workflow, and publishes approved posts to an RSS
//! feed hosted in a GitHub repository.

pub mod affiliate;
pub mod aliexpress;
pub mod bot;
pub mod callback;
pub mod config;
pub mod draft;
pub mod errors;
pub mod github;
pub mod publisher;
pub mod rss;
pub mod state;
