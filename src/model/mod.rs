pub mod adapter;
pub mod display;
pub mod item;
pub mod raw;
pub mod status;

pub use adapter::{DateStyle, Normalizer, order_tasks, resolve_visibility};
pub use item::{APPROVAL_AUTHOR, APPROVAL_TEXT, Comment, CommentKind, TimelineItem};
pub use raw::{ListMetadata, RawComment, RawTask};
pub use status::{CanonicalStatus, Classification, DisplayClass, StatusRules, classify};
