// Canned replies

use sqlx::PgPool;

use crate::models::Template;

pub struct TemplateService;

impl TemplateService {
    /// Ordered by name; `enabled_only` hides disabled templates.
    pub async fn list(pool: &PgPool, enabled_only: bool) -> Result<Vec<Template>, sqlx::Error> {
        sqlx::query_as::<_, Template>(
            "SELECT id, name, content, is_enabled, created_at FROM templates WHERE ($1 = FALSE OR is_enabled) ORDER BY name ASC"
        )
        .bind(enabled_only)
        .fetch_all(pool)
        .await
    }
}
