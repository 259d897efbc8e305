//! Shared application state for the dispatcher handlers.

use tokio::sync::Mutex;

use crate::aliexpress::AliexpressClient;
use crate::config::Config;
use crate::draft::{DraftStore, PendingEdits};
use crate::github::GithubClient;

/// Everything the handlers share, passed around as one `Arc`.
pub struct AppState {
    pub config: Config,
    pub aliexpress: AliexpressClient,
    pub github: GithubClient,
    /// Shared client for redirect resolution and photo downloads.
    pub http: reqwest::Client,
    pub drafts: DraftStore,
    pub pending_edits: PendingEdits,
    /// Serializes publishes: the feed file is read-modify-write and two
    /// concurrent publishes would race on it.
    pub publish_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let aliexpress = AliexpressClient::new(&config);
        let github = GithubClient::new(&config);
        Self {
            config,
            aliexpress,
            github,
            http: reqwest::Client::new(),
            drafts: DraftStore::new(),
            pending_edits: PendingEdits::new(),
            publish_lock: Mutex::new(()),
        }
    }
}
