use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::note::Note;

/// Capability granting access to one note through an opaque token
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Share {
    pub id: i64,
    pub share_token: String,
    pub permission: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub note_id: i64,
    pub owner_id: i64,
    pub shared_with: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Share {
    /// A share with an expiry at or before `now` can no longer be redeemed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateShare {
    pub permission: String,
    #[serde(default)]
    pub shared_with: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CreateShareResponse {
    pub share_token: String,
    pub share: Share,
}

#[derive(Debug, Serialize)]
pub struct SharedNoteResponse {
    pub note: Note,
    pub permission: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn share_expiring(expires_at: Option<DateTime<Utc>>) -> Share {
        let now = Utc::now();
        Share {
            id: 1,
            share_token: "t".to_string(),
            permission: "read".to_string(),
            expires_at,
            is_active: true,
            note_id: 1,
            owner_id: 1,
            shared_with: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_share_expiry() {
        let now = Utc::now();
        assert!(!share_expiring(None).is_expired(now));
        assert!(!share_expiring(Some(now + Duration::hours(1))).is_expired(now));
        assert!(share_expiring(Some(now - Duration::seconds(1))).is_expired(now));
    }
}
