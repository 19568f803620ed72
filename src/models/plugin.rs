use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A script-like extension record. Official plugins have no owner.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Plugin {
    pub id: i64,
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    pub code: String,
    pub is_enabled: bool,
    pub is_official: bool,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginInput {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Hotkey {
    pub id: i64,
    pub command: String,
    pub key: String,
    pub modifiers: String,
    pub description: String,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HotkeyInput {
    pub command: String,
    pub key: String,
    #[serde(default)]
    pub modifiers: String,
    #[serde(default)]
    pub description: String,
}
