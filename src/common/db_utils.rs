// src/common/db_utils.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;

/// Builds an ILIKE pattern for a free-text search.
///
/// A blank query yields `None`, which callers treat as "no filter".
/// `%`, `_` and `\` are escaped so they match literally.
pub fn like_pattern(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut pattern = String::with_capacity(trimmed.len() + 2);
    pattern.push('%');
    for c in trimmed.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

/// Translates constraint violations on INSERT/UPDATE into client errors.
pub fn map_write_error(e: sqlx::Error, conflict_message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(conflict_message.to_string());
        }
        if db_err.is_foreign_key_violation() {
            let constraint = db_err.constraint().unwrap_or("foreign key");
            return AppError::BadRequest(format!(
                "Referenced record does not exist ({}).",
                constraint
            ));
        }
    }
    e.into()
}

/// Takes a row lock on `table` for `id` that lasts until the surrounding
/// transaction ends. `false` when there is no such row.
///
/// Partial updates call this before reading the row they merge into, so
/// a second writer waits and then merges into the committed result.
pub async fn lock_row<'e, E>(executor: E, table: &'static str, id: Uuid) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT 1 FROM {} WHERE id = $1 FOR UPDATE", table);
    let locked = sqlx::query_scalar::<_, i32>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(locked.is_some())
}
