//! Reward catalog and redemption.

use super::ledger::{apply_to_balance, get_balance, TRANSACTION_COLUMNS};
use super::{now, Db};
use crate::constants::REDEMPTION_CODE_ATTEMPTS;
use crate::error::{AppError, Result};
use crate::models::{EcoPointsTransaction, NewReward, PointsSource, Reward, UserReward};
use crate::security::generate_redemption_code;

const REWARD_COLUMNS: &str = "id, title, description, reward_type, value, eco_points_cost, \
     category, valid_until, is_active, stock_quantity, created_at";

const USER_REWARD_COLUMNS: &str =
    "id, user_id, reward_id, redemption_code, redeemed_at, used_at, is_used, expires_at";

/// Redeemable rewards (active, unexpired, in stock), cheapest first
pub async fn list_active_rewards(db: &Db) -> Result<Vec<Reward>> {
    let sql = format!(
        "SELECT {REWARD_COLUMNS} FROM rewards \
         WHERE is_active = 1 \
           AND (valid_until IS NULL OR valid_until >= ?) \
           AND (stock_quantity IS NULL OR stock_quantity > 0) \
         ORDER BY eco_points_cost ASC, id ASC"
    );

    Ok(sqlx::query_as::<_, Reward>(&sql)
        .bind(now())
        .fetch_all(db)
        .await?)
}

pub async fn get_reward(db: &Db, reward_id: i64) -> Result<Reward> {
    let sql = format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE id = ?");

    sqlx::query_as::<_, Reward>(&sql)
        .bind(reward_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("Reward"))
}

pub async fn create_reward(db: &Db, new: &NewReward) -> Result<Reward> {
    new.validate()?;

    let sql = format!(
        "INSERT INTO rewards \
             (title, description, reward_type, value, eco_points_cost, category, \
              valid_until, is_active, stock_quantity, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?) \
         RETURNING {REWARD_COLUMNS}"
    );

    let reward = sqlx::query_as::<_, Reward>(&sql)
        .bind(new.title.trim())
        .bind(new.description.as_deref())
        .bind(new.reward_type.as_str())
        .bind(new.value)
        .bind(new.eco_points_cost)
        .bind(new.category.as_deref())
        .bind(new.valid_until)
        .bind(new.stock_quantity)
        .bind(now())
        .fetch_one(db)
        .await?;

    tracing::info!(
        "Reward {} created: '{}' for {} points",
        reward.id,
        reward.title,
        reward.eco_points_cost
    );

    Ok(reward)
}

pub async fn set_reward_active(db: &Db, reward_id: i64, active: bool) -> Result<Reward> {
    let sql = format!("UPDATE rewards SET is_active = ? WHERE id = ? RETURNING {REWARD_COLUMNS}");

    let reward = sqlx::query_as::<_, Reward>(&sql)
        .bind(active)
        .bind(reward_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("Reward"))?;

    tracing::info!("Reward {} active set to {}", reward.id, reward.is_active);

    Ok(reward)
}

/// Exchange part of a user's balance for a catalog reward
///
/// Claims a unit of stock, debits the balance, appends the redemption to the
/// ledger and issues a redemption code, all in one database transaction.
/// Every check is a conditional update, so concurrent redemptions can never
/// spend more than the balance or stock holds. Any error rolls back all of it.
pub async fn redeem_reward(db: &Db, user_id: &str, reward_id: i64) -> Result<UserReward> {
    let redeemed_at = now();
    let mut tx = db.begin().await?;

    // 1. Claim the reward (and one unit of stock when stock is tracked)
    let claimed: Option<(String, i64, Option<i64>)> = sqlx::query_as(
        "UPDATE rewards SET stock_quantity = stock_quantity - 1 \
         WHERE id = ? \
           AND is_active = 1 \
           AND (valid_until IS NULL OR valid_until >= ?) \
           AND (stock_quantity IS NULL OR stock_quantity > 0) \
         RETURNING title, eco_points_cost, valid_until",
    )
    .bind(reward_id)
    .bind(redeemed_at)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((title, cost, valid_until)) = claimed else {
        let sql = format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE id = ?");
        let reward = sqlx::query_as::<_, Reward>(&sql)
            .bind(reward_id)
            .fetch_optional(&mut *tx)
            .await?;

        let err = match reward {
            None => AppError::NotFound("Reward"),
            Some(reward) if !reward.is_active || reward.is_expired(redeemed_at) => {
                AppError::Inactive
            }
            Some(_) => AppError::OutOfStock,
        };
        tracing::warn!(
            "Redemption of reward {} by user {} rejected: {}",
            reward_id,
            user_id,
            err
        );
        return Err(err);
    };

    // 2. Debit the balance only if it covers the cost
    apply_to_balance(&mut *tx, user_id, -cost).await?;

    // 3. Append the redemption to the ledger
    let sql = format!(
        "INSERT INTO eco_points_transactions \
             (user_id, amount, source, description, reference_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?) \
         RETURNING {TRANSACTION_COLUMNS}"
    );
    let transaction = sqlx::query_as::<_, EcoPointsTransaction>(&sql)
        .bind(user_id)
        .bind(-cost)
        .bind(PointsSource::RewardRedemption.as_str())
        .bind(format!("Redeemed reward: {}", title))
        .bind(reward_id.to_string())
        .bind(redeemed_at)
        .fetch_one(&mut *tx)
        .await?;

    // 4. Issue the redemption record with a fresh code
    let sql = format!(
        "INSERT INTO user_rewards \
             (user_id, reward_id, redemption_code, redeemed_at, is_used, expires_at) \
         VALUES (?, ?, ?, ?, 0, ?) \
         RETURNING {USER_REWARD_COLUMNS}"
    );

    for attempt in 1..=REDEMPTION_CODE_ATTEMPTS {
        let inserted = sqlx::query_as::<_, UserReward>(&sql)
            .bind(user_id)
            .bind(reward_id)
            .bind(generate_redemption_code())
            .bind(redeemed_at)
            .bind(valid_until)
            .fetch_one(&mut *tx)
            .await;

        match inserted {
            Ok(user_reward) => {
                tx.commit().await?;
                tracing::info!(
                    "User {} redeemed reward {} for {} points (transaction {})",
                    user_id,
                    reward_id,
                    cost,
                    transaction.id
                );
                return Ok(user_reward);
            }
            Err(sqlx::Error::Database(ref e)) if e.is_unique_violation() => {
                tracing::warn!("Redemption code collision on attempt {}", attempt);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::CodeExhausted)
}

/// Redemption history, newest first
pub async fn list_user_rewards(db: &Db, user_id: &str) -> Result<Vec<UserReward>> {
    get_balance(db, user_id).await?;

    let sql = format!(
        "SELECT {USER_REWARD_COLUMNS} FROM user_rewards \
         WHERE user_id = ? \
         ORDER BY id DESC"
    );

    Ok(sqlx::query_as::<_, UserReward>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await?)
}

/// Mark a redemption as consumed; a code can be used once, before it expires
pub async fn use_reward(db: &Db, user_id: &str, user_reward_id: i64) -> Result<UserReward> {
    let used_at = now();

    let sql = format!(
        "UPDATE user_rewards SET is_used = 1, used_at = ? \
         WHERE id = ? AND user_id = ? AND is_used = 0 \
           AND (expires_at IS NULL OR expires_at >= ?) \
         RETURNING {USER_REWARD_COLUMNS}"
    );

    let updated = sqlx::query_as::<_, UserReward>(&sql)
        .bind(used_at)
        .bind(user_reward_id)
        .bind(user_id)
        .bind(used_at)
        .fetch_optional(db)
        .await?;

    if let Some(user_reward) = updated {
        tracing::info!("Redemption {} used by user {}", user_reward.id, user_id);
        return Ok(user_reward);
    }

    let sql = format!("SELECT {USER_REWARD_COLUMNS} FROM user_rewards WHERE id = ? AND user_id = ?");
    let existing = sqlx::query_as::<_, UserReward>(&sql)
        .bind(user_reward_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;

    match existing {
        None => Err(AppError::NotFound("Redemption")),
        Some(user_reward) if user_reward.is_used => Err(AppError::AlreadyUsed),
        Some(_) => Err(AppError::Expired),
    }
}
