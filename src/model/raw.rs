// File: ./src/model/raw.rs
// Wire records as returned by the ClickUp v2 API. Read-only to this crate.
use serde::{Deserialize, Deserializer, Serialize};

/// `null` and missing both map to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
        }
    }
}

/// ClickUp mixes numeric and string encodings for ids and timestamps.
fn flexible_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_string)
        .unwrap_or_default())
}

fn flexible_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_string)
        .filter(|s| !s.trim().is_empty()))
}

/// `orderindex` arrives as a number or as a decimal string ("1.00000000").
fn flexible_order_index<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<Scalar>::deserialize(deserializer)?.and_then(|v| match v {
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
            Scalar::Int(i) => Some(i as f64),
            Scalar::Float(f) => Some(f),
        }),
    )
}

/// Parses an epoch-milliseconds string. Empty or garbage yields `None`.
pub fn parse_millis(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "flexible_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawComment {
    #[serde(deserialize_with = "flexible_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: RawUser,
    /// Epoch milliseconds.
    #[serde(default, deserialize_with = "flexible_string")]
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTask {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RawStatus,
    /// Epoch milliseconds.
    #[serde(default, deserialize_with = "flexible_opt_string")]
    pub date_created: Option<String>,
    /// Epoch milliseconds.
    #[serde(default, deserialize_with = "flexible_opt_string")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "flexible_order_index")]
    pub orderindex: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<RawComment>,
}

impl RawTask {
    pub fn due_millis(&self) -> Option<i64> {
        self.due_date.as_deref().and_then(parse_millis)
    }

    pub fn created_millis(&self) -> Option<i64> {
        self.date_created.as_deref().and_then(parse_millis)
    }

    pub fn status_label(&self) -> &str {
        &self.status.status
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTaskList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<RawTask>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCommentList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<RawComment>,
}

/// Display name and free-text content of the containing list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "flexible_opt_string")]
    pub content: Option<String>,
}

/// Body returned by comment creation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PostedComment {
    #[serde(default, deserialize_with = "flexible_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "flexible_opt_string")]
    pub date: Option<String>,
}
