// File: ./src/model/status.rs
//! Status classification: provider free-text label -> canonical status + display class.
//!
//! The rule table is data. The first rule whose terms match the lowercased
//! label wins, so the order of [`StatusRules::rules`] is the precedence.
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CanonicalStatus {
    Pending,
    Active,
    Completed,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DisplayClass {
    Completed,
    WaitingOnClient,
    InProgress,
    Pending,
    Urgent,
    Review,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// The lowercased label contains the term anywhere.
    #[default]
    Contains,
    /// The lowercased, trimmed label equals the term.
    Equals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRule {
    pub name: String,
    pub terms: Vec<String>,
    #[serde(default)]
    pub matching: MatchMode,
    /// `None` leaves the canonical status at the `pending` fallback.
    #[serde(default)]
    pub canonical: Option<CanonicalStatus>,
    pub display: DisplayClass,
}

impl StatusRule {
    fn new(
        name: &str,
        terms: &[&str],
        canonical: Option<CanonicalStatus>,
        display: DisplayClass,
    ) -> Self {
        Self {
            name: name.to_string(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
            matching: MatchMode::Contains,
            canonical,
            display,
        }
    }

    fn exact(mut self) -> Self {
        self.matching = MatchMode::Equals;
        self
    }

    pub fn matches(&self, lowered: &str) -> bool {
        self.terms.iter().any(|term| {
            let term = term.to_lowercase();
            match self.matching {
                MatchMode::Contains => lowered.contains(&term),
                MatchMode::Equals => lowered.trim() == term,
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub canonical: CanonicalStatus,
    pub display: DisplayClass,
}

impl Classification {
    pub const FALLBACK: Classification = Classification {
        canonical: CanonicalStatus::Pending,
        display: DisplayClass::Default,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusRules {
    pub rules: Vec<StatusRule>,
}

impl Default for StatusRules {
    fn default() -> Self {
        use CanonicalStatus as C;
        use DisplayClass as D;
        Self {
            rules: vec![
                StatusRule::new(
                    "completion",
                    &[
                        "complete",
                        "done",
                        "completed",
                        "finalizado",
                        "feito",
                        "concluído",
                        "concluido",
                    ],
                    Some(C::Completed),
                    D::Completed,
                ),
                StatusRule::new(
                    "waiting-on-client",
                    &["aguardando cliente"],
                    Some(C::Active),
                    D::WaitingOnClient,
                )
                .exact(),
                StatusRule::new(
                    "progress",
                    &[
                        "progress",
                        "andamento",
                        "active",
                        "ongoing",
                        "em análise",
                        "em execução",
                        "fazendo",
                    ],
                    Some(C::Active),
                    D::InProgress,
                ),
                StatusRule::new(
                    "pending",
                    &["pending", "pendente", "inactive", "aguardando"],
                    Some(C::Pending),
                    D::Pending,
                ),
                StatusRule::new(
                    "urgency",
                    &["urgent", "urgente", "critical", "crítico", "alta prioridade"],
                    None,
                    D::Urgent,
                ),
                StatusRule::new(
                    "review",
                    &["review", "revisão", "testing", "teste", "revisando"],
                    None,
                    D::Review,
                ),
            ],
        }
    }
}

impl StatusRules {
    pub fn classify(&self, raw_label: &str) -> Classification {
        let lowered = raw_label.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| Classification {
                canonical: rule.canonical.unwrap_or(CanonicalStatus::Pending),
                display: rule.display,
            })
            .unwrap_or(Classification::FALLBACK)
    }
}

static DEFAULT_RULES: OnceLock<StatusRules> = OnceLock::new();

/// Classifies with the built-in rule table.
pub fn classify(raw_label: &str) -> Classification {
    DEFAULT_RULES
        .get_or_init(StatusRules::default)
        .classify(raw_label)
}
