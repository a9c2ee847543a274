use serde::Serialize;

/// A user whose cached balance disagrees with their ledger
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DriftEntry {
    pub user_id: String,
    pub balance: i64,
    pub ledger_sum: i64,
}

/// Ledger health snapshot for operators
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub user_count: i64,
    pub transaction_count: i64,
    pub redemption_count: i64,
    pub drift: Vec<DriftEntry>,
}
