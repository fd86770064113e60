// ── Backend seam ──
//
// The network calls the tracking flow depends on, behind a trait so the
// state machine can be driven against an in-memory fake. The production
// implementation is the API gateway.

use std::future::Future;

use earnhub_api::ApiClient;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{
    ClickRegistration, CompletionMetadata, Offer, OfferId, TrackingRecord, UserId, Wallet,
};

/// Backend operations consumed by the tracking client, offer board, and
/// wallet view. The acting user is implied by the session the backend was
/// built with.
pub trait TrackingBackend: Send + Sync + 'static {
    /// Create one tracking record for a click on `offer_id`.
    fn register_click(
        &self,
        offer_id: &OfferId,
    ) -> impl Future<Output = Result<ClickRegistration, CoreError>> + Send;

    /// Client-side completion report for uncorrelated clicks.
    fn report_completion(
        &self,
        offer_id: &OfferId,
        metadata: &CompletionMetadata,
    ) -> impl Future<Output = Result<TrackingRecord, CoreError>> + Send;

    /// Tracking history of `user_id`.
    fn user_trackings(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<TrackingRecord>, CoreError>> + Send;

    /// Offers currently shown to end users.
    fn active_offers(&self) -> impl Future<Output = Result<Vec<Offer>, CoreError>> + Send;

    /// Wallet snapshot of `user_id`.
    fn wallet(&self, user_id: &UserId) -> impl Future<Output = Result<Wallet, CoreError>> + Send;
}

impl TrackingBackend for ApiClient {
    async fn register_click(&self, offer_id: &OfferId) -> Result<ClickRegistration, CoreError> {
        let dto = self.track_click(offer_id.as_str()).await?;
        ClickRegistration::try_from(dto)
    }

    async fn report_completion(
        &self,
        offer_id: &OfferId,
        metadata: &CompletionMetadata,
    ) -> Result<TrackingRecord, CoreError> {
        let metadata = serde_json::to_value(metadata)
            .map_err(|e| CoreError::Internal(format!("failed to encode metadata: {e}")))?;
        let dto = ApiClient::report_completion(self, offer_id.as_str(), &metadata).await?;
        Ok(dto.into())
    }

    async fn user_trackings(&self, user_id: &UserId) -> Result<Vec<TrackingRecord>, CoreError> {
        // The endpoint is scoped by the bearer token. A mismatch means the
        // identity changed underneath the caller.
        match self.session().user_id() {
            Some(current) if current == user_id.as_str() => {}
            Some(current) => {
                debug!(requested = %user_id, %current, "tracking fetch for a different user");
                return Err(CoreError::validation(format!(
                    "cannot fetch trackings of {user_id} while logged in as {current}"
                )));
            }
            None => return Err(CoreError::AuthExpired),
        }

        let trackings = self.my_trackings().await?;
        Ok(trackings.into_iter().map(TrackingRecord::from).collect())
    }

    async fn active_offers(&self) -> Result<Vec<Offer>, CoreError> {
        let offers = self.list_offers(true).await?;
        let mut offers: Vec<Offer> = offers.into_iter().map(Offer::from).collect();
        offers.sort_by_key(|o| o.order);
        Ok(offers)
    }

    async fn wallet(&self, user_id: &UserId) -> Result<Wallet, CoreError> {
        let dto = self.wallet_by_user_id(user_id.as_str()).await?;
        Wallet::try_from(dto)
    }
}
