use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::empty_as_none;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub category: String,
    pub is_public: bool,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for creating or replacing a template
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateInput {
    pub name: String,
    #[serde(default)]
    pub content: String,
    pub category: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TemplateQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<String>,
}
