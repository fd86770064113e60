// ── Tracking domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use url::Url;

use super::entity_id::{ClickId, OfferId, TrackingId, UserId};

/// Status of one tracking record.
///
/// Variants are declared in advancement order, so the derived `Ord`
/// gives `Completed > Failed > Started > Clicked`. When several records
/// exist for the same offer, the maximum wins.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrackingStatus {
    Clicked,
    Started,
    Failed,
    Completed,
}

impl TrackingStatus {
    /// No transition leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// The further along of two statuses.
    pub fn most_advanced(self, other: Self) -> Self {
        self.max(other)
    }
}

/// Client-side snapshot of a server-owned tracking record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub id: TrackingId,
    pub user_id: UserId,
    pub offer_id: OfferId,
    /// Offer name, when the backend populated the reference.
    pub offer_name: Option<String>,
    /// User name, when the backend populated the reference (admin views).
    pub user_name: Option<String>,
    pub status: TrackingStatus,
    pub click_id: Option<ClickId>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Outcome of registering a click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickRegistration {
    pub tracking_id: TrackingId,
    /// Present when the backend can correlate a provider webhook.
    pub click_id: Option<ClickId>,
    /// Per-click provider URL; embeds the click id when one was issued.
    pub redirect_url: Option<Url>,
}

impl ClickRegistration {
    /// `true` when a provider webhook can complete this click on its own.
    pub fn is_correlated(&self) -> bool {
        self.click_id.as_ref().is_some_and(|c| !c.is_blank())
    }
}

/// Context sent with a fallback completion report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionMetadata {
    pub source: String,
    pub tracking_id: Option<TrackingId>,
    pub redirect_url: Option<Url>,
    pub navigated_at: DateTime<Utc>,
    pub delay_secs: u64,
}

impl CompletionMetadata {
    pub(crate) const CLIENT_FALLBACK: &'static str = "client-fallback";

    pub fn client_fallback(
        tracking_id: Option<TrackingId>,
        redirect_url: Option<Url>,
        navigated_at: DateTime<Utc>,
        delay_secs: u64,
    ) -> Self {
        Self {
            source: Self::CLIENT_FALLBACK.into(),
            tracking_id,
            redirect_url,
            navigated_at,
            delay_secs,
        }
    }
}
