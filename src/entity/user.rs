use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::snapshot::Metrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub name: String,
    #[serde(default)]
    pub password_hash: String,
    #[serde(default)]
    pub hashing_algorithm: String,
    /// Comma-separated string before 3.9, a list afterwards
    #[serde(default, deserialize_with = "tags")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// A broker user. Immutable; holds no reference to the adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    data: UserData,
}

impl User {
    pub fn new(data: UserData) -> Self {
        Self { data }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn password_hash(&self) -> &str {
        &self.data.password_hash
    }

    pub fn hashing_algorithm(&self) -> &str {
        &self.data.hashing_algorithm
    }

    pub fn tags(&self) -> &[String] {
        &self.data.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.data.tags.iter().any(|t| t == tag)
    }

    pub fn metrics(&self) -> &Metrics {
        &self.data.metrics
    }

    pub fn data(&self) -> &UserData {
        &self.data
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<User {}>", self.data.name)
    }
}

fn tags<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    Ok(tags)
}
