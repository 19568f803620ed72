use axum::{extract::State, Json};
use chrono::Utc;

use crate::auth::AuthUser;
use crate::constants::DEFAULT_NOTE_COLOR;
use crate::db::notes::{fetch_note, record_history};
use crate::error::Result;
use crate::extract::ApiQuery;
use crate::models::note::HistoryAction;
use crate::models::workspace::DailyNoteQuery;
use crate::models::{DailyNote, Note};
use crate::routes::validation::parse_date;
use crate::AppState;

/// Get or create the daily note for `date` (default: today, UTC)
///
/// Creation writes the note, its `created` history row and the binding in one
/// transaction.
pub async fn get_daily_note(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<DailyNoteQuery>,
) -> Result<Json<DailyNote>> {
    let date = match &query.date {
        Some(raw) => parse_date(raw)?,
        None => Utc::now().date_naive(),
    }
    .format("%Y-%m-%d")
    .to_string();

    let mut tx = state.db.begin().await?;

    let existing = sqlx::query_as::<_, DailyNote>(
        "SELECT * FROM daily_notes WHERE user_id = ? AND date = ?",
    )
    .bind(auth.user_id)
    .bind(&date)
    .fetch_optional(&mut *tx)
    .await?;

    let mut daily = match existing {
        Some(daily) => daily,
        None => {
            let now = Utc::now();
            let note = sqlx::query_as::<_, Note>(
                "INSERT INTO notes (title, content, color, user_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)
                 RETURNING *",
            )
            .bind(DailyNote::title_for(&date))
            .bind(DailyNote::body_for(&date))
            .bind(DEFAULT_NOTE_COLOR)
            .bind(auth.user_id)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            record_history(&mut tx, &note, HistoryAction::Created).await?;

            tracing::info!("Created daily note {} for user {}", date, auth.user_id);

            sqlx::query_as::<_, DailyNote>(
                "INSERT INTO daily_notes (date, note_id, user_id, created_at)
                 VALUES (?, ?, ?, ?)
                 RETURNING *",
            )
            .bind(&date)
            .bind(note.id)
            .bind(auth.user_id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?
        }
    };

    daily.note = Some(fetch_note(&mut tx, auth.user_id, daily.note_id).await?);
    tx.commit().await?;

    Ok(Json(daily))
}
