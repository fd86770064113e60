// ── Wallet domain type ──

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entity_id::UserId;

/// Read-only snapshot of a user's wallet. Credited by the backend when
/// tracking records complete.
///
/// Invariant (checked on conversion): `0 <= locked <= balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: Option<UserId>,
    pub balance: Decimal,
    pub locked: Decimal,
    pub currency: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Wallet {
    /// Amount available to spend: `balance - locked`.
    pub fn available(&self) -> Decimal {
        self.balance - self.locked
    }
}
