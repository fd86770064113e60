// Wire types for the EarnHub backend.
//
// Every response is wrapped in `Envelope<T>`; the payload structs below
// model the `data` member per endpoint. Decoding is strict about the
// envelope and the fields the client acts on, lenient about display-only
// extras.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ── Envelope ─────────────────────────────────────────────────────────

/// Standard response envelope:
/// ```json
/// { "status": "success", "data": { ... } }
/// ```
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: T,
}

/// Body shape for error responses. The message usually lives under
/// `data.message`; some routes put it at the top level instead.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub data: Option<ErrorData>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorData {
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.data.and_then(|d| d.message).or(self.message)
    }
}

// ── References ───────────────────────────────────────────────────────

/// A foreign key that the backend either sends as a bare id or populates
/// with the referenced document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Id(String),
    Populated(T),
}

impl<T: HasId> Reference<T> {
    /// The referenced id, whichever shape arrived.
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Populated(doc) => doc.id(),
        }
    }

    pub fn populated(&self) -> Option<&T> {
        match self {
            Self::Id(_) => None,
            Self::Populated(doc) => Some(doc),
        }
    }
}

pub trait HasId {
    fn id(&self) -> &str;
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl HasId for UserDto {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Deserialize)]
pub struct UserData {
    pub user: UserDto,
}

#[derive(Debug, Deserialize)]
pub struct UsersData {
    pub users: Vec<UserDto>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserDto>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterData {
    #[serde(default)]
    pub token: Option<String>,
    pub user: UserDto,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAdminRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

// ── Offers ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub logo_color: Option<String>,
    #[serde(default)]
    pub logo_text: Option<String>,
    #[serde(default)]
    pub provider_url: Option<String>,
    #[serde(default)]
    pub posthook_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl HasId for OfferDto {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Deserialize)]
pub struct OffersData {
    pub offers: Vec<OfferDto>,
}

#[derive(Debug, Deserialize)]
pub struct OfferData {
    pub offer: OfferDto,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    pub name: String,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posthook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
    pub is_active: bool,
    pub order: i64,
}

/// Populated subset of an offer embedded in a tracking record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferSummaryDto {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl HasId for OfferSummaryDto {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Populated subset of a user embedded in a tracking record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummaryDto {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl HasId for UserSummaryDto {
    fn id(&self) -> &str {
        &self.id
    }
}

// ── Trackings ────────────────────────────────────────────────────────

/// Tracking status as it appears on the wire. Unknown values are a
/// decode error rather than a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingStatusDto {
    Clicked,
    Started,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: Reference<UserSummaryDto>,
    pub offer_id: Reference<OfferSummaryDto>,
    pub status: TrackingStatusDto,
    #[serde(default)]
    pub click_id: Option<String>,
    #[serde(default)]
    pub clicked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct TrackingsData {
    pub trackings: Vec<TrackingDto>,
}

#[derive(Debug, Deserialize)]
pub struct TrackingData<T> {
    pub tracking: T,
}

/// Result of registering a click.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickDto {
    #[serde(alias = "_id")]
    pub tracking_id: String,
    #[serde(default)]
    pub click_id: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRequest<'a> {
    pub offer_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest<'a> {
    pub offer_id: &'a str,
    pub metadata: &'a serde_json::Value,
}

// ── Wallet ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDto {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub balance: Decimal,
    #[serde(default)]
    pub locked_amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "INR".into()
}

#[derive(Debug, Deserialize)]
pub struct WalletData {
    pub wallet: WalletDto,
}

// ── Misc ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct MessageData {
    #[serde(default)]
    pub message: Option<String>,
}
