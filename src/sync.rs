// File: ./src/sync.rs
//! Comment submission and refresh for a single task.
//!
//! Writes are never appended locally: after a submission the caller reloads
//! the task's comments from the provider with [`CommentSynchronizer::refresh_comments`].
use crate::client::ProviderApi;
use crate::error::{Result, TimelineError};
use crate::model::adapter::Normalizer;
use crate::model::item::{APPROVAL_AUTHOR, APPROVAL_TEXT, Comment, CommentKind};

/// Attribution is embedded in the body because the provider's comment
/// model has a single free-text field.
pub fn format_comment_body(author: &str, text: &str) -> String {
    format!("[From {}]: {}", author, text)
}

/// What was sent for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub task_id: String,
    pub author: String,
    pub text: String,
    /// Exact text transmitted to the provider.
    pub body: String,
    pub kind: CommentKind,
    /// Provider-assigned id, when the response carried one.
    pub remote_id: Option<String>,
}

#[derive(Debug)]
pub struct CommentSynchronizer<'a, P> {
    provider: &'a P,
    normalizer: &'a Normalizer,
}

impl<'a, P: ProviderApi> CommentSynchronizer<'a, P> {
    pub fn new(provider: &'a P, normalizer: &'a Normalizer) -> Self {
        Self {
            provider,
            normalizer,
        }
    }

    /// No idempotency key: submitting twice creates two remote comments.
    pub async fn submit_comment(
        &self,
        credential: &str,
        task_id: &str,
        text: &str,
        author: &str,
    ) -> Result<Submission> {
        let text = text.trim();
        let author = author.trim();
        if author.is_empty() {
            return Err(TimelineError::Validation("author name".to_string()));
        }
        if text.is_empty() {
            return Err(TimelineError::Validation("comment text".to_string()));
        }

        let body = format_comment_body(author, text);
        let posted = self.provider.post_comment(credential, task_id, &body).await?;
        Ok(Submission {
            task_id: task_id.to_string(),
            author: author.to_string(),
            text: text.to_string(),
            kind: CommentKind::detect(&body),
            body,
            remote_id: posted.id,
        })
    }

    pub async fn submit_approval(&self, credential: &str, task_id: &str) -> Result<Submission> {
        self.submit_comment(credential, task_id, APPROVAL_TEXT, APPROVAL_AUTHOR)
            .await
    }

    pub async fn refresh_comments(&self, credential: &str, task_id: &str) -> Result<Vec<Comment>> {
        let raw = self.provider.list_comments(credential, task_id).await?;
        log::debug!("Refreshed {} comment(s) for task {}", raw.len(), task_id);
        Ok(self.normalizer.map_comments(&raw))
    }
}
