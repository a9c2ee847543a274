use sqlx::SqliteConnection;

use super::{now, Db};
use crate::error::{AppError, Result};
use crate::models::{AuditReport, DriftEntry, User};

const USER_COLUMNS: &str = "id, username, eco_points, green_tier, carbon_footprint, created_at";

/// Register a user with an empty balance
pub async fn create_user(db: &Db, id: &str, username: &str) -> Result<User> {
    let sql = format!(
        "INSERT INTO users (id, username, eco_points, green_tier, created_at) \
         VALUES (?, ?, 0, 'Bronze', ?) RETURNING {USER_COLUMNS}"
    );

    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(username)
        .bind(now())
        .fetch_one(db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("User")
            }
            other => AppError::Database(other),
        })?;

    tracing::info!("New user registered: {}", user.id);

    Ok(user)
}

pub async fn get_user(db: &Db, id: &str) -> Result<User> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");

    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("User"))
}

/// Read a user on an open connection, e.g. inside a ledger transaction
pub(crate) async fn fetch_user(conn: &mut SqliteConnection, id: &str) -> Result<User> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");

    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::NotFound("User"))
}

/// Compare every user's balance against the sum of their transactions
pub async fn audit(db: &Db) -> Result<AuditReport> {
    let (user_count, transaction_count, redemption_count): (i64, i64, i64) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM users), \
                (SELECT COUNT(*) FROM eco_points_transactions), \
                (SELECT COUNT(*) FROM user_rewards)",
    )
    .fetch_one(db)
    .await?;

    let drift = sqlx::query_as::<_, DriftEntry>(
        "SELECT u.id AS user_id, u.eco_points AS balance, \
                COALESCE(SUM(t.amount), 0) AS ledger_sum \
         FROM users u \
         LEFT JOIN eco_points_transactions t ON t.user_id = u.id \
         GROUP BY u.id, u.eco_points \
         HAVING u.eco_points <> COALESCE(SUM(t.amount), 0) \
         ORDER BY u.id",
    )
    .fetch_all(db)
    .await?;

    if !drift.is_empty() {
        tracing::error!("Ledger drift detected for {} user(s)", drift.len());
    }

    Ok(AuditReport {
        user_count,
        transaction_count,
        redemption_count,
        drift,
    })
}
