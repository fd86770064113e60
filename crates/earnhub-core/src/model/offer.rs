// ── Offer domain type ──

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use super::entity_id::OfferId;

/// A partner promotion. Server-owned; read-only to end users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub name: String,
    /// Reward credited on completion, in currency units.
    pub amount: Decimal,
    pub description: Option<String>,
    pub logo: Option<String>,
    /// Static provider link configured on the offer. Used only when the
    /// backend does not return a per-click redirect.
    pub static_url: Option<Url>,
    pub active: bool,
    pub order: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl Offer {
    /// Short text for a logo placeholder: the first character of the name.
    pub fn initial(&self) -> char {
        self.name.chars().next().unwrap_or('O')
    }
}
