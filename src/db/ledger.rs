//! EcoPoints ledger: an append-only transaction log plus the cached balance
//! on `users.eco_points`.
//!
//! Every write runs inside one database transaction whose first statement is
//! itself a write, so the writer lock is held before any value that feeds a
//! decision is read. Balance changes are conditional updates
//! (`eco_points + amount >= 0`) checked by returned row, never a read
//! followed by a separate write.

use sqlx::SqliteConnection;

use super::users::fetch_user;
use super::{now, Db};
use crate::constants::{DEFAULT_TRANSACTION_LIMIT, MAX_TRANSACTION_LIMIT};
use crate::error::{AppError, Result};
use crate::models::{
    EcoPointsTransaction, GreenTier, NewTransaction, PointsSource, PointsSummary, User,
};

pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, user_id, amount, source, description, reference_id, created_at";

/// Append a transaction and move the user's balance by its amount
///
/// If `reference_id` is set and a transaction with the same user, source
/// and reference already exists, nothing is written and the existing row is
/// returned. Redemptions are exempt from this since one reward may be
/// redeemed many times.
pub async fn record_transaction(
    db: &Db,
    user_id: &str,
    new: &NewTransaction,
) -> Result<EcoPointsTransaction> {
    let mut tx = db.begin().await?;
    let transaction = record_in(&mut *tx, user_id, new).await?;
    tx.commit().await?;

    Ok(transaction)
}

/// Like [`record_transaction`], also returning the user row as it stands
/// when the transaction commits
pub async fn record_award(
    db: &Db,
    user_id: &str,
    new: &NewTransaction,
) -> Result<(EcoPointsTransaction, User)> {
    let mut tx = db.begin().await?;
    let transaction = record_in(&mut *tx, user_id, new).await?;
    let user = fetch_user(&mut *tx, user_id).await?;
    tx.commit().await?;

    Ok((transaction, user))
}

async fn record_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    new: &NewTransaction,
) -> Result<EcoPointsTransaction> {
    new.validate()?;

    let sql = format!(
        "INSERT INTO eco_points_transactions \
             (user_id, amount, source, description, reference_id, created_at) \
         SELECT ?, ?, ?, ?, ?, ? \
         WHERE EXISTS (SELECT 1 FROM users WHERE id = ?) \
         ON CONFLICT DO NOTHING \
         RETURNING {TRANSACTION_COLUMNS}"
    );

    let inserted = sqlx::query_as::<_, EcoPointsTransaction>(&sql)
        .bind(user_id)
        .bind(new.amount)
        .bind(new.source.as_str())
        .bind(new.description.trim())
        .bind(new.reference_id.as_deref())
        .bind(now())
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(transaction) = inserted else {
        // Either the user is missing or this is a replay of a recorded event
        return match find_by_reference(&mut *conn, user_id, new).await? {
            Some(transaction) => {
                tracing::info!(
                    "Replayed {} transaction for user {} (reference {:?})",
                    new.source.as_str(),
                    user_id,
                    new.reference_id
                );
                Ok(transaction)
            }
            None => Err(AppError::NotFound("User")),
        };
    };

    apply_to_balance(&mut *conn, user_id, new.amount).await?;

    if new.amount > 0 {
        refresh_green_tier(&mut *conn, user_id).await?;
    }

    tracing::info!(
        "Recorded {} points ({}) for user {}",
        transaction.amount,
        transaction.source.as_str(),
        user_id
    );

    Ok(transaction)
}

async fn find_by_reference(
    conn: &mut SqliteConnection,
    user_id: &str,
    new: &NewTransaction,
) -> Result<Option<EcoPointsTransaction>> {
    let Some(reference_id) = new.reference_id.as_deref() else {
        return Ok(None);
    };

    if new.source == PointsSource::RewardRedemption {
        return Ok(None);
    }

    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM eco_points_transactions \
         WHERE user_id = ? AND source = ? AND reference_id = ?"
    );

    Ok(sqlx::query_as::<_, EcoPointsTransaction>(&sql)
        .bind(user_id)
        .bind(new.source.as_str())
        .bind(reference_id)
        .fetch_optional(conn)
        .await?)
}

/// Conditionally move the balance; never lets it drop below zero
pub(crate) async fn apply_to_balance(
    conn: &mut SqliteConnection,
    user_id: &str,
    amount: i64,
) -> Result<i64> {
    let updated: Option<i64> = sqlx::query_scalar(
        "UPDATE users SET eco_points = eco_points + ? \
         WHERE id = ? AND eco_points + ? >= 0 \
         RETURNING eco_points",
    )
    .bind(amount)
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(balance) = updated {
        return Ok(balance);
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT eco_points FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        Some(available) => {
            let required = amount.saturating_neg();
            tracing::warn!(
                "Rejected debit of {} points for user {}: balance {}",
                required,
                user_id,
                available
            );
            Err(AppError::InsufficientBalance {
                required,
                available,
            })
        }
        None => Err(AppError::NotFound("User")),
    }
}

async fn refresh_green_tier(conn: &mut SqliteConnection, user_id: &str) -> Result<GreenTier> {
    let earned = lifetime_earned(&mut *conn, user_id).await?;
    let tier = GreenTier::for_lifetime_points(earned);

    sqlx::query("UPDATE users SET green_tier = ? WHERE id = ?")
        .bind(tier)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(tier)
}

async fn lifetime_earned(conn: &mut SqliteConnection, user_id: &str) -> Result<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM eco_points_transactions \
         WHERE user_id = ? AND amount > 0",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?)
}

/// Current cached balance
pub async fn get_balance(db: &Db, user_id: &str) -> Result<i64> {
    sqlx::query_scalar("SELECT eco_points FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("User"))
}

/// Sum of the user's transaction amounts, straight from the log
pub async fn ledger_sum(db: &Db, user_id: &str) -> Result<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM eco_points_transactions WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(db)
    .await?)
}

/// Clamp a caller-supplied page size into `[1, MAX_TRANSACTION_LIMIT]`
pub fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    limit
        .unwrap_or(default)
        .clamp(1, MAX_TRANSACTION_LIMIT)
}

/// Transaction history, newest first
///
/// `before` is a transaction id cursor: only older rows are returned, so a
/// reader can page through or restart from any point.
pub async fn list_transactions(
    db: &Db,
    user_id: &str,
    limit: Option<i64>,
    before: Option<i64>,
) -> Result<Vec<EcoPointsTransaction>> {
    get_balance(db, user_id).await?;

    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM eco_points_transactions \
         WHERE user_id = ? AND (? IS NULL OR id < ?) \
         ORDER BY id DESC \
         LIMIT ?"
    );

    Ok(sqlx::query_as::<_, EcoPointsTransaction>(&sql)
        .bind(user_id)
        .bind(before)
        .bind(before)
        .bind(clamp_limit(limit, DEFAULT_TRANSACTION_LIMIT))
        .fetch_all(db)
        .await?)
}

/// Balance, tier and lifetime totals for one user
pub async fn summary(db: &Db, user_id: &str) -> Result<PointsSummary> {
    let row: Option<(i64, GreenTier, i64, i64, i64)> = sqlx::query_as(
        "SELECT u.eco_points, u.green_tier, \
                (SELECT COALESCE(SUM(amount), 0) FROM eco_points_transactions \
                 WHERE user_id = u.id AND amount > 0), \
                (SELECT COALESCE(-SUM(amount), 0) FROM eco_points_transactions \
                 WHERE user_id = u.id AND amount < 0), \
                (SELECT COUNT(*) FROM eco_points_transactions WHERE user_id = u.id) \
         FROM users u WHERE u.id = ?",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    let (balance, green_tier, lifetime_earned, lifetime_spent, transaction_count) =
        row.ok_or(AppError::NotFound("User"))?;

    Ok(PointsSummary {
        balance,
        green_tier,
        lifetime_earned,
        lifetime_spent,
        transaction_count,
        next_tier_at: green_tier.next_threshold(),
    })
}
