// File: ./src/model/item.rs
use crate::model::status::{CanonicalStatus, DisplayClass};
use serde::{Deserialize, Serialize};

/// Sentinel text of a client approval. Detected by substring in the
/// provider's plain-text comment stream, so the literal must not change.
pub const APPROVAL_TEXT: &str = "Etapa aprovada pelo cliente";
pub const APPROVAL_AUTHOR: &str = "Cliente";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    #[default]
    Normal,
    Approval,
}

impl CommentKind {
    pub fn detect(text: &str) -> Self {
        if text.contains(APPROVAL_TEXT) {
            CommentKind::Approval
        } else {
            CommentKind::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    /// Already formatted for display.
    pub date: String,
    pub kind: CommentKind,
}

impl Comment {
    pub fn is_approval(&self) -> bool {
        self.kind == CommentKind::Approval
    }
}

/// One stage of the client timeline, rebuilt from scratch on every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: CanonicalStatus,
    pub display_class: DisplayClass,
    /// Provider label, verbatim.
    pub raw_status: String,
    /// Due date, or creation date when no due date is set.
    pub date: String,
    pub comments: Vec<Comment>,
    pub visible: bool,
}

impl TimelineItem {
    pub fn approvals(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(|c| c.is_approval())
    }

    pub fn is_approved(&self) -> bool {
        self.approvals().next().is_some()
    }
}
