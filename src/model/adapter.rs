// File: src/model/adapter.rs
// Raw provider records -> timeline items.
use crate::model::item::{Comment, CommentKind, TimelineItem};
use crate::model::raw::{RawComment, RawTask, parse_millis};
use crate::model::status::{Classification, StatusRules};
use crate::visibility::VisibilitySet;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Utc};
use std::cmp::Ordering;

pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// How epoch-millisecond timestamps are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateStyle {
    format: String,
    /// `None` renders in the machine's local time zone.
    offset: Option<FixedOffset>,
}

impl Default for DateStyle {
    fn default() -> Self {
        Self {
            format: DEFAULT_DATE_FORMAT.to_string(),
            offset: None,
        }
    }
}

impl DateStyle {
    /// An invalid strftime pattern or offset falls back to the default
    /// instead of failing later at render time.
    pub fn new(format: &str, utc_offset_minutes: Option<i32>) -> Self {
        let valid = !format.is_empty()
            && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
        let format = if valid {
            format.to_string()
        } else {
            log::warn!(
                "Invalid date format '{}', using '{}'",
                format,
                DEFAULT_DATE_FORMAT
            );
            DEFAULT_DATE_FORMAT.to_string()
        };
        let offset = utc_offset_minutes.and_then(|m| {
            let offset = m.checked_mul(60).and_then(FixedOffset::east_opt);
            if offset.is_none() {
                log::warn!("Ignoring out-of-range UTC offset of {} minutes", m);
            }
            offset
        });
        Self { format, offset }
    }

    pub fn utc(format: &str) -> Self {
        Self::new(format, Some(0))
    }

    pub fn format_millis(&self, millis: i64) -> String {
        let Some(utc) = DateTime::<Utc>::from_timestamp_millis(millis) else {
            return String::new();
        };
        match self.offset {
            Some(offset) => utc.with_timezone(&offset).format(&self.format).to_string(),
            None => utc.with_timezone(&Local).format(&self.format).to_string(),
        }
    }

    /// Formats a raw epoch-milliseconds string; unparseable input renders empty.
    pub fn format_raw(&self, raw: &str) -> String {
        parse_millis(raw)
            .map(|ms| self.format_millis(ms))
            .unwrap_or_default()
    }
}

fn compare_order_index(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Due date ascending with undated tasks last, then provider order index.
pub fn compare_tasks(a: &RawTask, b: &RawTask) -> Ordering {
    let due = match (a.due_millis(), b.due_millis()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    due.then_with(|| compare_order_index(a.orderindex, b.orderindex))
}

/// Stable: tasks that compare equal keep the provider's order.
pub fn order_tasks(tasks: &[RawTask]) -> Vec<&RawTask> {
    let mut ordered: Vec<&RawTask> = tasks.iter().collect();
    ordered.sort_by(|a, b| compare_tasks(a, b));
    ordered
}

/// Empty allow-list shows everything; otherwise membership decides.
pub fn resolve_visibility(task_id: &str, set: &VisibilitySet) -> bool {
    set.is_empty() || set.contains(task_id)
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: StatusRules,
    dates: DateStyle,
}

impl Normalizer {
    pub fn new(rules: StatusRules, dates: DateStyle) -> Self {
        Self { rules, dates }
    }

    pub fn rules(&self) -> &StatusRules {
        &self.rules
    }

    pub fn dates(&self) -> &DateStyle {
        &self.dates
    }

    pub fn classify(&self, raw_label: &str) -> Classification {
        self.rules.classify(raw_label)
    }

    pub fn order<'a>(&self, tasks: &'a [RawTask]) -> Vec<&'a RawTask> {
        order_tasks(tasks)
    }

    pub fn map_comment(&self, raw: &RawComment) -> Comment {
        Comment {
            id: raw.id.clone(),
            author: raw.user.username.clone(),
            text: raw.comment_text.clone(),
            date: self.dates.format_raw(&raw.date),
            kind: CommentKind::detect(&raw.comment_text),
        }
    }

    /// Keeps the provider's comment order.
    pub fn map_comments(&self, raw: &[RawComment]) -> Vec<Comment> {
        raw.iter().map(|c| self.map_comment(c)).collect()
    }

    pub fn to_item(&self, task: &RawTask, visible: &VisibilitySet) -> TimelineItem {
        let classification = self.classify(task.status_label());
        let date = task
            .due_millis()
            .or_else(|| task.created_millis())
            .map(|ms| self.dates.format_millis(ms))
            .unwrap_or_default();

        TimelineItem {
            id: task.id.clone(),
            title: task.name.clone(),
            description: task.description.clone(),
            status: classification.canonical,
            display_class: classification.display,
            raw_status: task.status.status.clone(),
            date,
            comments: self.map_comments(&task.comments),
            visible: resolve_visibility(&task.id, visible),
        }
    }

    /// Orders, classifies and resolves visibility. Pure: same input, same output.
    pub fn normalize(&self, tasks: &[RawTask], visible: &VisibilitySet) -> Vec<TimelineItem> {
        self.order(tasks)
            .into_iter()
            .map(|task| self.to_item(task, visible))
            .collect()
    }
}
