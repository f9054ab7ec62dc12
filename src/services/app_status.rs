// The single app status row

use sqlx::PgPool;

use crate::models::AppStatus;

pub struct AppStatusService;

/// Result of a versioned status update.
#[derive(Debug)]
pub enum CasOutcome {
    Updated(AppStatus),
    /// Someone else wrote first; carries the row as it is now.
    Stale(AppStatus),
    NotFound,
}

impl AppStatusService {
    /// The row with the lowest id.
    pub async fn current(pool: &PgPool) -> Result<Option<AppStatus>, sqlx::Error> {
        sqlx::query_as::<_, AppStatus>(
            "SELECT id, is_available, status_message, version, updated_at FROM app_status ORDER BY id ASC LIMIT 1"
        )
        .fetch_optional(pool)
        .await
    }

    /// Writes only if the stored version still equals `expected_version`.
    pub async fn compare_and_set(
        pool: &PgPool,
        id: i64,
        expected_version: i64,
        is_available: Option<bool>,
        status_message: Option<&str>,
    ) -> Result<CasOutcome, sqlx::Error> {
        let updated = sqlx::query_as::<_, AppStatus>(
            r#"
            UPDATE app_status
            SET is_available = COALESCE($3, is_available),
                status_message = COALESCE($4, status_message),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING id, is_available, status_message, version, updated_at
            "#
        )
        .bind(id)
        .bind(expected_version)
        .bind(is_available)
        .bind(status_message)
        .fetch_optional(pool)
        .await?;

        if let Some(status) = updated {
            tracing::info!("App status {} updated to version {} (available: {})", status.id, status.version, status.is_available);
            return Ok(CasOutcome::Updated(status));
        }

        let existing = sqlx::query_as::<_, AppStatus>(
            "SELECT id, is_available, status_message, version, updated_at FROM app_status WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(match existing {
            Some(current) => {
                tracing::warn!("Stale app status update for {}: expected version {}, found {}", id, expected_version, current.version);
                CasOutcome::Stale(current)
            }
            None => CasOutcome::NotFound,
        })
    }
}
