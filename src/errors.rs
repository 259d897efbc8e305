//! Workflow error types.
//!
//! Failures from external collaborators are caught at the boundary where
//! they occur, logged with context, and either abandon the current event or
//! degrade to best-effort continuation. None of them are fatal to the
//! process.

/// Errors raised by the review/publish workflow and its collaborators.
#[derive(Debug, Clone)]
pub enum WorkflowError {
    /// A shortened URL could not be resolved to its final form.
    ResolutionFailed(String),
    /// No product id could be extracted from a resolved URL.
    ExtractionFailed(String),
    /// The product detail request failed or returned no product.
    DetailFetchFailed(String),
    /// The affiliate API returned no promotion link.
    AffiliateLinkUnavailable(String),
    /// A chat send/edit/delete operation failed.
    TransportFailed(String),
    /// Publish completed the feed update but some chat cleanup failed.
    PublishPartialFailure(String),
    /// An operation referenced a draft key no longer in the store.
    StateNotFound(i32),
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowError::ResolutionFailed(msg) => write!(f, "URL resolution failed: {msg}"),
            WorkflowError::ExtractionFailed(msg) => {
                write!(f, "Product id extraction failed: {msg}")
            }
            WorkflowError::DetailFetchFailed(msg) => {
                write!(f, "Product detail fetch failed: {msg}")
            }
            WorkflowError::AffiliateLinkUnavailable(msg) => {
                write!(f, "Affiliate link unavailable: {msg}")
            }
            WorkflowError::TransportFailed(msg) => write!(f, "Chat transport failed: {msg}"),
            WorkflowError::PublishPartialFailure(msg) => {
                write!(f, "Publish partially failed: {msg}")
            }
            WorkflowError::StateNotFound(key) => {
                write!(f, "No draft found for key {key}")
            }
        }
    }
}

impl std::error::Error for WorkflowError {}

impl From<teloxide::RequestError> for WorkflowError {
    fn from(err: teloxide::RequestError) -> Self {
        WorkflowError::TransportFailed(err.to_string())
    }
}
