// File: ./src/model/display.rs
use crate::model::item::{Comment, TimelineItem};
use crate::model::status::{CanonicalStatus, DisplayClass};

pub fn status_label(status: CanonicalStatus) -> &'static str {
    match status {
        CanonicalStatus::Completed => "Concluído",
        CanonicalStatus::Active => "Em Progresso",
        CanonicalStatus::Pending => "Pendente",
    }
}

pub fn display_class_label(class: DisplayClass) -> &'static str {
    match class {
        DisplayClass::Completed => "Concluído",
        DisplayClass::WaitingOnClient => "Aguardando Cliente",
        DisplayClass::InProgress => "Em Andamento",
        DisplayClass::Pending => "Pendente",
        DisplayClass::Urgent => "Urgente",
        DisplayClass::Review => "Em Revisão",
        DisplayClass::Default => "Pendente",
    }
}

pub trait TimelineDisplay {
    fn status_symbol(&self) -> &'static str;
    fn badge(&self) -> String;
}

impl TimelineDisplay for TimelineItem {
    fn status_symbol(&self) -> &'static str {
        match (self.status, self.display_class) {
            (CanonicalStatus::Completed, _) => "[✔]",
            (_, DisplayClass::WaitingOnClient) => "[?]",
            (CanonicalStatus::Active, _) => "[▶]",
            (_, DisplayClass::Urgent) => "[!]",
            _ => "[ ]",
        }
    }

    /// Canonical label, plus the finer class when it says something more.
    fn badge(&self) -> String {
        let base = status_label(self.status);
        let finer = display_class_label(self.display_class);
        if base == finer
            || matches!(
                self.display_class,
                DisplayClass::Default | DisplayClass::InProgress
            )
        {
            base.to_string()
        } else {
            format!("{} · {}", base, finer)
        }
    }
}

impl TimelineDisplay for Comment {
    fn status_symbol(&self) -> &'static str {
        if self.is_approval() { "✔" } else { "»" }
    }

    fn badge(&self) -> String {
        if self.is_approval() {
            "Aprovação".to_string()
        } else {
            String::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveStage {
    pub id: String,
    pub title: String,
    pub date: String,
    pub display_class: DisplayClass,
}

/// Dashboard figures over a set of timeline items.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimelineSummary {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub active: Vec<ActiveStage>,
    /// Rounded half-up, 0 for an empty timeline.
    pub completion_percentage: u8,
}

impl TimelineSummary {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a TimelineItem>) -> Self {
        let mut summary = TimelineSummary::default();
        for item in items {
            summary.total += 1;
            match item.status {
                CanonicalStatus::Completed => summary.completed += 1,
                CanonicalStatus::Pending => summary.pending += 1,
                CanonicalStatus::Active => summary.active.push(ActiveStage {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    date: item.date.clone(),
                    display_class: item.display_class,
                }),
            }
        }
        if summary.total > 0 {
            let pct = (summary.completed * 100 + summary.total / 2) / summary.total;
            summary.completion_percentage = pct.min(100) as u8;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, status: CanonicalStatus, class: DisplayClass) -> TimelineItem {
        TimelineItem {
            id: id.to_string(),
            title: format!("Stage {id}"),
            description: String::new(),
            status,
            display_class: class,
            raw_status: String::new(),
            date: "01/02/2024 10:00:00".to_string(),
            comments: vec![],
            visible: true,
        }
    }

    #[test]
    fn test_summary_counts_and_rounding() {
        let items = vec![
            item("1", CanonicalStatus::Completed, DisplayClass::Completed),
            item("2", CanonicalStatus::Active, DisplayClass::WaitingOnClient),
            item("3", CanonicalStatus::Pending, DisplayClass::Default),
        ];
        let s = TimelineSummary::from_items(&items);
        assert_eq!(s.total, 3);
        assert_eq!(s.completed, 1);
        assert_eq!(s.pending, 1);
        assert_eq!(s.active.len(), 1);
        assert_eq!(s.active[0].display_class, DisplayClass::WaitingOnClient);
        // 33.3 -> 33
        assert_eq!(s.completion_percentage, 33);

        let two = vec![
            item("1", CanonicalStatus::Completed, DisplayClass::Completed),
            item("2", CanonicalStatus::Completed, DisplayClass::Completed),
            item("3", CanonicalStatus::Pending, DisplayClass::Default),
        ];
        // 66.6 -> 67
        assert_eq!(TimelineSummary::from_items(&two).completion_percentage, 67);
    }

    #[test]
    fn test_summary_empty() {
        let s = TimelineSummary::from_items(Vec::<TimelineItem>::new().iter());
        assert_eq!(s, TimelineSummary::default());
    }

    #[test]
    fn test_badge_mentions_finer_class() {
        let waiting = item("1", CanonicalStatus::Active, DisplayClass::WaitingOnClient);
        assert_eq!(waiting.badge(), "Em Progresso · Aguardando Cliente");
        assert_eq!(waiting.status_symbol(), "[?]");

        let plain = item("2", CanonicalStatus::Pending, DisplayClass::Default);
        assert_eq!(plain.badge(), "Pendente");

        let done = item("3", CanonicalStatus::Completed, DisplayClass::Completed);
        assert_eq!(done.badge(), "Concluído");
        assert_eq!(done.status_symbol(), "[✔]");
    }
}
