use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::routes::validation::start_of_day;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_notes: i64,
    pub total_categories: i64,
    pub total_tags: i64,
    pub total_files: i64,
    pub total_reminders: i64,
    pub notes_today: i64,
    pub notes_this_week: i64,
    pub notes_this_month: i64,
    pub storage_used: i64,
}

/// Lower bounds for the today/week/month counters, all in UTC
fn period_starts(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>, DateTime<Utc>) {
    let today = start_of_day(now.date_naive());
    let week_ago = today - Duration::days(7);
    let month_ago = today.checked_sub_months(Months::new(1)).unwrap_or(week_ago);
    (today, week_ago, month_ago)
}

async fn count(state: &AppState, table: &str, user_id: i64) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE user_id = ?", table);
    Ok(sqlx::query_scalar(&sql)
        .bind(user_id)
        .fetch_one(&state.db)
        .await?)
}

async fn notes_since(state: &AppState, user_id: i64, since: DateTime<Utc>) -> Result<i64> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE user_id = ? AND created_at >= ?")
            .bind(user_id)
            .bind(since)
            .fetch_one(&state.db)
            .await?,
    )
}

pub async fn get_stats(State(state): State<AppState>, auth: AuthUser) -> Result<Json<StatsResponse>> {
    let user_id = auth.user_id;
    let (today, week_ago, month_ago) = period_starts(Utc::now());

    let storage_used: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(size), 0) FROM files WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&state.db)
            .await?;

    Ok(Json(StatsResponse {
        total_notes: count(&state, "notes", user_id).await?,
        total_categories: count(&state, "categories", user_id).await?,
        total_tags: count(&state, "tags", user_id).await?,
        total_files: count(&state, "files", user_id).await?,
        total_reminders: count(&state, "reminders", user_id).await?,
        notes_today: notes_since(&state, user_id, today).await?,
        notes_this_week: notes_since(&state, user_id, week_ago).await?,
        notes_this_month: notes_since(&state, user_id, month_ago).await?,
        storage_used,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_starts() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 15, 30, 0).unwrap();
        let (today, week_ago, month_ago) = period_starts(now);

        assert_eq!(today, Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap());
        assert_eq!(week_ago, Utc.with_ymd_and_hms(2025, 3, 24, 0, 0, 0).unwrap());
        // Clamped to the last day of February
        assert_eq!(month_ago, Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap());
    }
}
